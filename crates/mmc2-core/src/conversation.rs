use chrono::{DateTime, Utc};
use mmc2_common::settings::MAX_CONVERSATION_MESSAGES;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::CoreError;
use crate::member::{Consciousness, validate_name};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub sender: Consciousness,
    pub content: String,
    /// Ids of earlier messages this one quotes.
    #[serde(default)]
    pub references: Vec<String>,
}

impl Message {
    pub fn new(sender: Consciousness, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            sender,
            content: content.into(),
            references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = references;
        self
    }

    /// First `max_chars` characters, with `...` appended when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        truncate_chars(&self.content, max_chars)
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}...")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        Self::with_id(Uuid::new_v4().to_string(), name)
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            id: id.into(),
            name,
            created_at: Utc::now(),
            messages: Vec::new(),
        })
    }

    /// Returns false when the name is unchanged.
    pub fn rename(&mut self, name: &str) -> Result<bool, CoreError> {
        if self.name == name {
            return Ok(false);
        }
        validate_name(name)?;
        self.name = name.to_string();
        Ok(true)
    }

    /// Appends a message, dropping the oldest once the history is full.
    pub fn push_message(&mut self, message: Message) -> Result<&Message, CoreError> {
        if message.content.trim().is_empty() {
            return Err(CoreError::EmptyMessage);
        }
        if self.messages.len() >= MAX_CONVERSATION_MESSAGES {
            let overflow = self.messages.len() + 1 - MAX_CONVERSATION_MESSAGES;
            self.messages.drain(..overflow);
            debug!(conversation_id = %self.id, dropped = overflow, "history trimmed");
        }
        self.messages.push(message);
        Ok(&self.messages[self.messages.len() - 1])
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }
}

/// All conversations plus the one currently open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationBook {
    conversations: Vec<Conversation>,
    current_conversation_id: String,
}

impl ConversationBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(conversations: Vec<Conversation>, current_conversation_id: String) -> Self {
        let mut book = Self {
            conversations,
            current_conversation_id,
        };
        if book.get(&book.current_conversation_id).is_none() {
            book.current_conversation_id.clear();
        }
        book
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn current_conversation_id(&self) -> &str {
        &self.current_conversation_id
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Conversation, CoreError> {
        self.conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CoreError::UnknownConversation(id.to_string()))
    }

    pub fn current(&self) -> Option<&Conversation> {
        self.get(&self.current_conversation_id)
    }

    /// Creates a conversation and makes it current.
    pub fn create(&mut self, name: &str) -> Result<&Conversation, CoreError> {
        let conversation = Conversation::new(name)?;
        self.insert(conversation)
    }

    pub fn insert(&mut self, conversation: Conversation) -> Result<&Conversation, CoreError> {
        if self.get(&conversation.id).is_some() {
            return Err(CoreError::DuplicateConversationId(conversation.id));
        }
        self.current_conversation_id = conversation.id.clone();
        self.conversations.push(conversation);
        Ok(&self.conversations[self.conversations.len() - 1])
    }

    /// Inserts or replaces by id; returns true when an existing entry was replaced.
    pub fn upsert(&mut self, conversation: Conversation) -> bool {
        match self.conversations.iter_mut().find(|c| c.id == conversation.id) {
            Some(slot) => {
                *slot = conversation;
                true
            }
            None => {
                self.conversations.push(conversation);
                false
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Result<Conversation, CoreError> {
        let idx = self
            .conversations
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CoreError::UnknownConversation(id.to_string()))?;
        if self.current_conversation_id == id {
            self.current_conversation_id.clear();
        }
        Ok(self.conversations.remove(idx))
    }

    pub fn select(&mut self, id: &str) -> Result<&Conversation, CoreError> {
        let idx = self
            .conversations
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CoreError::UnknownConversation(id.to_string()))?;
        self.current_conversation_id = id.to_string();
        Ok(&self.conversations[idx])
    }

    pub fn clear(&mut self) {
        self.conversations.clear();
        self.current_conversation_id.clear();
    }
}
