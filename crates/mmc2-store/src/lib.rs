//! File-backed persistence for the system record and conversations.
//!
//! Layout under the data directory:
//!
//! ```text
//! system.yaml                   members and current member
//! conversations/<id>.json       conversation header
//! messages/<conversation>/<n>.json
//! current_conversation.txt
//! exports/
//! ```
//!
//! `system.yaml` is written as pretty-printed JSON, which every YAML 1.2
//! parser accepts.

pub mod exchange;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mmc2_common::paths::{entity_dir, entity_file};
use mmc2_common::registry::CONFIG_FILE;
use mmc2_core::{Conversation, ConversationBook, Message, SystemConfig};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

pub use exchange::{ExportBundle, ExportScope, ImportMode, ImportSummary};

/// How `system.yaml` is actually encoded.
pub const SYSTEM_FILE_FORMAT: &str = "JSON (valid YAML 1.2)";

const CONVERSATIONS_DIR: &str = "conversations";
const MESSAGES_DIR: &str = "messages";
const EXPORTS_DIR: &str = "exports";
const CURRENT_CONVERSATION_FILE: &str = "current_conversation.txt";
const DEFAULT_EXPORT_FILE: &str = "mmc2_export.json";

/// Everything the application keeps in memory between saves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    pub system: SystemConfig,
    pub book: ConversationBook,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConversationHeader {
    id: String,
    name: String,
    /// Absent in headers written before creation times were recorded.
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl ConversationHeader {
    fn into_conversation(self, messages: Vec<Message>) -> Conversation {
        let created_at = self
            .created_at
            .or_else(|| messages.first().map(|m| m.timestamp))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Conversation {
            id: self.id,
            name: self.name,
            created_at,
            messages,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataRepository {
    root: PathBuf,
}

impl DataRepository {
    pub fn open(root: &Path) -> Result<Self> {
        for dir in [
            root.to_path_buf(),
            root.join(CONVERSATIONS_DIR),
            root.join(MESSAGES_DIR),
            root.join(EXPORTS_DIR),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create data directory {}", dir.display()))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn system_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn default_export_path(&self) -> PathBuf {
        self.root.join(EXPORTS_DIR).join(DEFAULT_EXPORT_FILE)
    }

    pub fn save_system(&self, system: &SystemConfig) -> Result<()> {
        write_json(&self.system_path(), system)?;
        debug!(members = system.members().len(), "system saved");
        Ok(())
    }

    /// Missing file yields an empty system; a present file must validate.
    pub fn load_system(&self) -> Result<SystemConfig> {
        let path = self.system_path();
        if !path.exists() {
            return Ok(SystemConfig::new());
        }
        let system: SystemConfig = read_json(&path)?;
        system
            .validate()
            .with_context(|| format!("invalid system record in {}", path.display()))?;
        Ok(system)
    }

    /// Writes the conversation header only; messages go through `save_messages`.
    pub fn save_conversation(&self, conversation: &Conversation) -> Result<()> {
        let path = entity_file(&self.conversations_dir(), &conversation.id, "json")?;
        write_json(
            &path,
            &ConversationHeader {
                id: conversation.id.clone(),
                name: conversation.name.clone(),
                created_at: Some(conversation.created_at),
            },
        )
    }

    pub fn load_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        let path = entity_file(&self.conversations_dir(), id, "json")?;
        if !path.exists() {
            return Ok(None);
        }
        let header: ConversationHeader = read_json(&path)?;
        let messages = self.load_messages(&header.id)?;
        Ok(Some(header.into_conversation(messages)))
    }

    /// Returns false when nothing was stored under `id`.
    pub fn delete_conversation(&self, id: &str) -> Result<bool> {
        let path = entity_file(&self.conversations_dir(), id, "json")?;
        let existed = path.exists();
        if existed {
            fs::remove_file(&path)
                .with_context(|| format!("failed to delete {}", path.display()))?;
        }
        let messages = entity_dir(&self.messages_dir(), id)?;
        if messages.exists() {
            fs::remove_dir_all(&messages)
                .with_context(|| format!("failed to delete {}", messages.display()))?;
        }
        Ok(existed)
    }

    /// Replaces the stored messages of a conversation, one file per message.
    pub fn save_messages(&self, conversation_id: &str, messages: &[Message]) -> Result<()> {
        let dir = entity_dir(&self.messages_dir(), conversation_id)?;
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("failed to clear {}", dir.display()))?;
        }
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
        for (idx, message) in messages.iter().enumerate() {
            write_json(&dir.join(format!("{idx}.json")), message)?;
        }
        Ok(())
    }

    /// Loads messages in file-number order; unreadable files are skipped.
    pub fn load_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let dir = entity_dir(&self.messages_dir(), conversation_id)?;
        let mut files = json_files(&dir)?;
        files.sort_by_key(|path| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u64>().ok())
                .unwrap_or(0)
        });
        let mut messages = Vec::with_capacity(files.len());
        for path in files {
            match read_json::<Message>(&path) {
                Ok(message) => messages.push(message),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable message"),
            }
        }
        Ok(messages)
    }

    /// Writes every conversation and prunes files of conversations no longer in the book.
    pub fn save_book(&self, book: &ConversationBook) -> Result<()> {
        for conversation in book.conversations() {
            self.save_conversation(conversation)?;
            self.save_messages(&conversation.id, &conversation.messages)?;
        }
        for path in json_files(&self.conversations_dir())? {
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if book.get(id).is_none() {
                debug!(conversation_id = id, "pruning deleted conversation");
                self.delete_conversation(id)?;
            }
        }
        let current = self.root.join(CURRENT_CONVERSATION_FILE);
        fs::write(&current, book.current_conversation_id())
            .with_context(|| format!("failed to write {}", current.display()))?;
        Ok(())
    }

    pub fn load_book(&self) -> Result<ConversationBook> {
        let mut conversations = Vec::new();
        for path in json_files(&self.conversations_dir())? {
            let header: ConversationHeader = match read_json(&path) {
                Ok(header) => header,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable conversation");
                    continue;
                }
            };
            let messages = self.load_messages(&header.id)?;
            conversations.push(header.into_conversation(messages));
        }
        conversations.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });

        let current_path = self.root.join(CURRENT_CONVERSATION_FILE);
        let current = if current_path.exists() {
            fs::read_to_string(&current_path)
                .with_context(|| format!("failed to read {}", current_path.display()))?
                .trim()
                .to_string()
        } else {
            String::new()
        };
        Ok(ConversationBook::from_parts(conversations, current))
    }

    /// Conversations are written before `system.yaml`, so a failed book save
    /// leaves the stored members untouched.
    pub fn save_all(&self, workspace: &Workspace) -> Result<()> {
        self.save_book(&workspace.book)?;
        self.save_system(&workspace.system)?;
        info!(
            members = workspace.system.members().len(),
            conversations = workspace.book.conversations().len(),
            "workspace saved"
        );
        Ok(())
    }

    pub fn load_all(&self) -> Result<Workspace> {
        Ok(Workspace {
            system: self.load_system()?,
            book: self.load_book()?,
        })
    }

    /// Deletes every stored conversation and message.
    pub fn clear_conversations(&self) -> Result<()> {
        for dir in [self.conversations_dir(), self.messages_dir()] {
            if dir.exists() {
                fs::remove_dir_all(&dir)
                    .with_context(|| format!("failed to clear {}", dir.display()))?;
            }
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let current = self.root.join(CURRENT_CONVERSATION_FILE);
        if current.exists() {
            fs::remove_file(&current)
                .with_context(|| format!("failed to delete {}", current.display()))?;
        }
        info!("all conversations cleared");
        Ok(())
    }

    fn conversations_dir(&self) -> PathBuf {
        self.root.join(CONVERSATIONS_DIR)
    }

    fn messages_dir(&self) -> PathBuf {
        self.root.join(MESSAGES_DIR)
    }
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(files)
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let serialized = serde_json::to_vec_pretty(value)?;
    fs::write(path, serialized).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
