//! Domain model for a multi-conscious system: members, the system record,
//! conversations, and the services that operate on them.

pub mod conversation;
mod error;
pub mod member;
pub mod notification;
pub mod privacy;
pub mod search;
pub mod system;

pub use conversation::{Conversation, ConversationBook, Message};
pub use error::CoreError;
pub use member::{Consciousness, PrivacyLevel, parse_tags};
pub use notification::{LogSink, NotificationService, NotificationSink};
pub use search::{SearchHit, search_messages};
pub use system::SystemConfig;
