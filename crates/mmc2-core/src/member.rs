use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

pub const MAX_NAME_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrivacyLevel {
    /// Visible to everyone.
    #[default]
    Public,
    /// Visible inside the system.
    Shared,
    /// Visible to the owning member only.
    Private,
}

impl PrivacyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Shared => "shared",
            Self::Private => "private",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "public" => Some(Self::Public),
            "shared" => Some(Self::Shared),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

/// One member of a multi-conscious system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consciousness {
    pub id: String,
    pub name: String,
    /// Resource path of the avatar image.
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub personality_tags: Vec<String>,
    #[serde(default)]
    pub background_memory: String,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub privacy_level: PrivacyLevel,
}

impl Consciousness {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name)
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: String::new(),
            personality_tags: Vec::new(),
            background_memory: String::new(),
            is_current: false,
            privacy_level: PrivacyLevel::Public,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.personality_tags = tags;
        self
    }

    pub fn with_background_memory(mut self, memory: impl Into<String>) -> Self {
        self.background_memory = memory.into();
        self
    }

    pub fn with_privacy(mut self, level: PrivacyLevel) -> Self {
        self.privacy_level = level;
        self
    }
}

/// Splits a comma-separated tag list, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Display names must be non-blank and at most `MAX_NAME_CHARS` characters.
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::InvalidName("name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(CoreError::InvalidName(format!(
            "name cannot exceed {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_tags(" calm, ,curious ,, night owl "),
            vec!["calm", "curious", "night owl"]
        );
        assert!(parse_tags("  ").is_empty());
    }

    #[test]
    fn name_length_counts_characters_not_bytes() {
        let fifty = "星".repeat(50);
        assert!(validate_name(&fifty).is_ok());
        assert!(validate_name(&format!("{fifty}星")).is_err());
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn json_shape_uses_camel_case_and_upper_privacy() {
        let member = Consciousness::with_id("123", "Test Consciousness 1")
            .with_tags(vec!["test".into(), "first".into()])
            .with_privacy(PrivacyLevel::Shared);
        let value = serde_json::to_value(&member).expect("serialize");
        assert_eq!(value["personalityTags"][1], "first");
        assert_eq!(value["privacyLevel"], "SHARED");
        assert_eq!(value["isCurrent"], false);

        let minimal: Consciousness =
            serde_json::from_str(r#"{"id":"456","name":"Two"}"#).expect("deserialize");
        assert_eq!(minimal.privacy_level, PrivacyLevel::Public);
        assert!(minimal.personality_tags.is_empty());
    }

    #[test]
    fn new_members_get_distinct_ids() {
        assert_ne!(Consciousness::new("a").id, Consciousness::new("a").id);
    }
}
