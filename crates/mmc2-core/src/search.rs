use tracing::{debug, info};

use crate::conversation::{Conversation, Message};
use crate::member::Consciousness;
use crate::privacy::can_view_message;
use crate::system::SystemConfig;

pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit<'a> {
    pub conversation_id: &'a str,
    pub conversation_name: &'a str,
    pub message: &'a Message,
}

/// Case-insensitive full-text search over message content, newest first.
///
/// Queries shorter than `MIN_QUERY_CHARS` after trimming match nothing. When
/// a viewer is given, messages hidden from them by privacy rules are skipped.
pub fn search_messages<'a>(
    conversations: &'a [Conversation],
    query: &str,
    viewer: Option<(&Consciousness, &SystemConfig)>,
) -> Vec<SearchHit<'a>> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    info!(query, conversations = conversations.len(), "searching messages");

    let mut hits = Vec::new();
    for conversation in conversations {
        for message in &conversation.messages {
            if message.content.trim().is_empty() {
                continue;
            }
            if let Some((who, system)) = viewer {
                if !can_view_message(who, message, system) {
                    continue;
                }
            }
            if message.content.to_lowercase().contains(&needle) {
                hits.push(SearchHit {
                    conversation_id: &conversation.id,
                    conversation_name: &conversation.name,
                    message,
                });
            }
        }
    }
    hits.sort_by(|a, b| b.message.timestamp.cmp(&a.message.timestamp));
    debug!(matches = hits.len(), "search finished");
    hits
}
