use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use mmc2_common::paths::{checked_id, with_json_extension};
use mmc2_common::registry::{DATA_EXPORT_FORMAT, DATA_IMPORT_FORMAT, NAME, VERSION};
use mmc2_common::settings::MAX_CONVERSATION_MESSAGES;
use mmc2_common::{AppConfig, AppearanceConfig, NotificationConfig, StorageConfig};
use mmc2_core::member::validate_name;
use mmc2_core::{Consciousness, Conversation, ConversationBook, SystemConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Workspace, read_json, write_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    Conversations {
        include_members: bool,
        include_settings: bool,
    },
    Members,
    Settings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Keep existing data; add what is new.
    #[default]
    Merge,
    /// Discard existing members and conversations.
    Replace,
}

impl ImportMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "merge" => Some(Self::Merge),
            "replace" => Some(Self::Replace),
            _ => None,
        }
    }
}

/// User-facing preferences carried in an export; machine paths stay behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedSettings {
    pub storage: StorageConfig,
    pub appearance: AppearanceConfig,
    pub notifications: NotificationConfig,
}

impl From<&AppConfig> for ExportedSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            storage: config.storage.clone(),
            appearance: config.appearance.clone(),
            notifications: config.notifications.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub format: String,
    pub app: String,
    pub version: String,
    pub exported_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversations: Option<Vec<Conversation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<Consciousness>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_member_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ExportedSettings>,
}

impl ExportBundle {
    pub fn build(workspace: &Workspace, config: &AppConfig, scope: ExportScope) -> Self {
        let (conversations, members, settings) = match scope {
            ExportScope::Conversations {
                include_members,
                include_settings,
            } => (true, include_members, include_settings),
            ExportScope::Members => (false, true, false),
            ExportScope::Settings => (false, false, true),
        };
        Self {
            format: DATA_EXPORT_FORMAT.to_string(),
            app: NAME.to_string(),
            version: VERSION.to_string(),
            exported_at: Utc::now(),
            conversations: conversations.then(|| workspace.book.conversations().to_vec()),
            members: members.then(|| workspace.system.members().to_vec()),
            current_member_id: members
                .then(|| workspace.system.current_member_id().to_string()),
            settings: settings.then(|| ExportedSettings::from(config)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub members_added: usize,
    pub members_skipped: usize,
    pub conversations_added: usize,
    pub conversations_replaced: usize,
    pub conversations_skipped: usize,
    pub settings_applied: bool,
}

/// Writes the bundle for `scope`, appending `.json` to the path when missing.
pub fn export(
    workspace: &Workspace,
    config: &AppConfig,
    scope: ExportScope,
    path: &Path,
) -> Result<PathBuf> {
    let target = with_json_extension(path);
    let bundle = ExportBundle::build(workspace, config, scope);
    write_json(&target, &bundle)?;
    info!(path = %target.display(), ?scope, "export written");
    Ok(target)
}

pub fn read_bundle(path: &Path) -> Result<ExportBundle> {
    let bundle: ExportBundle = read_json(path)?;
    if !bundle.format.eq_ignore_ascii_case(DATA_IMPORT_FORMAT) {
        bail!(
            "unsupported import format {:?}, expected {DATA_IMPORT_FORMAT}",
            bundle.format
        );
    }
    Ok(bundle)
}

/// Applies a bundle to the in-memory workspace and config; the caller persists both.
///
/// Bundle settings that fail validation refuse the whole bundle before anything
/// changes. Conversations whose id cannot be stored or whose name is invalid
/// are skipped.
pub fn import(
    bundle: ExportBundle,
    workspace: &mut Workspace,
    config: &mut AppConfig,
    mode: ImportMode,
) -> Result<ImportSummary> {
    let settings = match bundle.settings {
        Some(settings) => {
            let mut candidate = config.clone();
            candidate.storage = settings.storage;
            candidate.appearance = settings.appearance;
            candidate.notifications = settings.notifications;
            candidate
                .validate()
                .context("bundle settings rejected")?;
            Some(candidate)
        }
        None => None,
    };

    let mut summary = ImportSummary::default();

    if let Some(members) = bundle.members {
        if mode == ImportMode::Replace {
            workspace.system = SystemConfig::new();
        }
        for mut member in members {
            member.is_current = false;
            if workspace.system.contains(&member.id) {
                summary.members_skipped += 1;
                continue;
            }
            match workspace.system.add_member(member) {
                Ok(()) => summary.members_added += 1,
                Err(err) => {
                    warn!(error = %err, "member not imported");
                    summary.members_skipped += 1;
                }
            }
        }
        if mode == ImportMode::Replace {
            let current = bundle.current_member_id.unwrap_or_default();
            if !current.is_empty() {
                if let Err(err) = workspace.system.switch_to(&current) {
                    warn!(error = %err, "imported current member not restored");
                }
            }
        }
    }

    if let Some(conversations) = bundle.conversations {
        if mode == ImportMode::Replace {
            workspace.book = ConversationBook::new();
        }
        for mut conversation in conversations {
            if let Err(err) = checked_id(&conversation.id) {
                warn!(error = %err, "conversation not imported");
                summary.conversations_skipped += 1;
                continue;
            }
            if let Err(err) = validate_name(&conversation.name) {
                warn!(conversation_id = %conversation.id, error = %err, "conversation not imported");
                summary.conversations_skipped += 1;
                continue;
            }
            let len = conversation.messages.len();
            if len > MAX_CONVERSATION_MESSAGES {
                conversation.messages.drain(..len - MAX_CONVERSATION_MESSAGES);
            }
            if workspace.book.upsert(conversation) {
                summary.conversations_replaced += 1;
            } else {
                summary.conversations_added += 1;
            }
        }
    }

    if let Some(settings) = settings {
        *config = settings;
        summary.settings_applied = true;
    }

    info!(?mode, ?summary, "import applied");
    Ok(summary)
}
