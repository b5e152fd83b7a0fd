use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("member limit of {limit} reached")]
    TooManyMembers { limit: usize },
    #[error("member id already exists: {0}")]
    DuplicateMemberId(String),
    #[error("member name already used by another member: {0}")]
    DuplicateMemberName(String),
    #[error("no member with id {0}")]
    UnknownMember(String),
    #[error("no conversation with id {0}")]
    UnknownConversation(String),
    #[error("conversation id already exists: {0}")]
    DuplicateConversationId(String),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("message content cannot be empty")]
    EmptyMessage,
    #[error("current member id {0} does not name a member")]
    DanglingCurrentMember(String),
    #[error("member {0} has an is_current flag that disagrees with the current member id")]
    CurrentFlagMismatch(String),
}
