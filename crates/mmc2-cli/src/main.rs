use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use mmc2_common::config::AppConfig;
use mmc2_common::paths::expand_tilde;
use mmc2_common::registry::{self, settings, theme};
use mmc2_common::{APP_NAME, logging};
use mmc2_core::{
    Consciousness, Message, NotificationService, PrivacyLevel, parse_tags, search_messages,
};
use mmc2_store::exchange::{self, ExportScope, ImportMode};
use mmc2_store::{DataRepository, SYSTEM_FILE_FORMAT, Workspace};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "mmc2", about = "Multi-ConsciousChat 2 CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate local setup and generate default config if missing.
    Doctor,
    /// Show application identity.
    About,
    /// List the built-in constants, or show one by qualified name.
    Constants { name: Option<String> },
    /// Member operations.
    Member {
        #[command(subcommand)]
        command: MemberCommand,
    },
    /// Conversation and message operations.
    Conversation {
        #[command(subcommand)]
        command: ConversationCommand,
    },
    /// Full-text search over messages visible to the current member.
    Search { query: String },
    /// Export data to a JSON bundle.
    Export {
        #[arg(long, default_value = "conversations")]
        scope: String,
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        no_members: bool,
        #[arg(long)]
        no_settings: bool,
    },
    /// Import a JSON bundle.
    Import {
        path: PathBuf,
        #[arg(long, default_value = "merge")]
        mode: String,
    },
    /// Application settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Theme selection.
    Theme {
        #[command(subcommand)]
        command: ThemeCommand,
    },
    /// Permanently delete every conversation and message.
    ClearChats {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum MemberCommand {
    /// List members; the current one is marked with `*`.
    List,
    /// Add a member.
    Add {
        name: String,
        #[arg(long)]
        avatar: Option<String>,
        /// Comma-separated personality tags.
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        memory: Option<String>,
        #[arg(long, default_value = "public")]
        privacy: String,
    },
    /// Edit several fields of a member at once.
    Edit {
        member_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        memory: Option<String>,
        #[arg(long)]
        privacy: Option<String>,
    },
    /// Rename a member.
    Rename { member_id: String, name: String },
    /// Replace a member's background memory note.
    Comment { member_id: String, text: String },
    /// Remove a member.
    Remove { member_id: String },
    /// Switch the current member.
    Switch { member_id: String },
    /// Show the current member.
    Current,
}

#[derive(Debug, Subcommand)]
enum ConversationCommand {
    /// List conversations; the open one is marked with `*`.
    List,
    /// Create a conversation and open it.
    Create { name: String },
    /// Rename a conversation.
    Rename { conversation_id: String, name: String },
    /// Delete a conversation and its messages.
    Delete { conversation_id: String },
    /// Open a conversation.
    Select { conversation_id: String },
    /// Print messages of a conversation (defaults to the open one).
    Show {
        conversation_id: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Send a message as the current member.
    Send {
        text: String,
        #[arg(long)]
        conversation: Option<String>,
        #[arg(long = "reference")]
        references: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    /// Print the active settings.
    Show,
    /// Change one setting.
    Set { key: String, value: String },
}

#[derive(Debug, Subcommand)]
enum ThemeCommand {
    /// List available themes.
    List,
    /// Select a theme by name or 1-based position.
    Set { theme: String },
}

struct App {
    config: AppConfig,
    config_path: PathBuf,
    repo: DataRepository,
    workspace: Workspace,
    notifications: NotificationService,
}

impl App {
    fn load() -> Result<Self> {
        let (config, config_path, _) = AppConfig::load_or_create()?;
        config.validate_and_prepare()?;
        init_logging(&config);

        let repo = DataRepository::open(&config.data_dir)?;
        let workspace = repo.load_all()?;
        let mut notifications = NotificationService::default();
        notifications.set_enabled(config.notifications.enabled);
        Ok(Self {
            config,
            config_path,
            repo,
            workspace,
            notifications,
        })
    }

    fn persist(&self) -> Result<()> {
        self.repo.save_all(&self.workspace)
    }

    fn save_config(&self) -> Result<()> {
        self.config.validate_and_prepare()?;
        self.config.save(&self.config_path)?;
        Ok(())
    }
}

fn init_logging(config: &AppConfig) {
    if !config.logging.enabled {
        return;
    }
    if let Err(err) = logging::init_with_file(
        &config.log_level,
        &config.logs_dir(),
        config.logging.max_log_size,
    ) {
        logging::init(&config.log_level);
        tracing::warn!(error = %err, "file logging unavailable, using stderr");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Some(Command::Doctor) => doctor(),
        Some(Command::About) => about(),
        Some(Command::Constants { name }) => constants(name),
        Some(Command::Member { command }) => member(command),
        Some(Command::Conversation { command }) => conversation(command),
        Some(Command::Search { query }) => search(&query),
        Some(Command::Export {
            scope,
            path,
            no_members,
            no_settings,
        }) => export(&scope, path, !no_members, !no_settings),
        Some(Command::Import { path, mode }) => import(path, &mode),
        Some(Command::Settings { command }) => settings_cmd(command),
        Some(Command::Theme { command }) => theme_cmd(command),
        Some(Command::ClearChats { yes }) => clear_chats(yes),
        None => {
            println!("{} {}", registry::FULL_NAME, registry::VERSION);
            println!("Run `mmc2 doctor` to generate and validate local config.");
            Ok(())
        }
    }
}

fn doctor() -> Result<()> {
    let (config, path, created) = AppConfig::load_or_create()?;
    config.validate_and_prepare()?;
    init_logging(&config);
    let repo = DataRepository::open(&config.data_dir)?;
    let workspace = repo.load_all()?;

    println!("{} doctor: OK", APP_NAME);
    println!("config: {}", path.display());
    println!("created_config: {created}");
    println!("data_dir: {}", config.data_dir.display());
    println!("system_file: {}", repo.system_path().display());
    println!("system_format: {SYSTEM_FILE_FORMAT}");
    println!(
        "members: {}/{}",
        workspace.system.members().len(),
        settings::MAX_MEMBERS
    );
    println!("conversations: {}", workspace.book.conversations().len());
    println!("logging_enabled: {}", config.logging.enabled);
    Ok(())
}

fn about() -> Result<()> {
    println!("name: {}", registry::NAME);
    println!("full_name: {}", registry::FULL_NAME);
    println!("version: {}", registry::VERSION);
    println!("description: {}", registry::DESCRIPTION);
    println!("authors: {}", registry::ANOTHER_NAME);
    println!("website: {}", registry::WEBSITE);
    println!("{}", registry::COPYRIGHT);
    Ok(())
}

fn constants(name: Option<String>) -> Result<()> {
    match name {
        Some(name) => {
            let constant =
                registry::lookup(&name).ok_or_else(|| anyhow!("unknown constant: {name}"))?;
            println!("{}: {}", constant.name, constant.value);
        }
        None => {
            for constant in registry::entries() {
                println!("{}: {}", constant.name, constant.value);
            }
        }
    }
    Ok(())
}

fn member(command: MemberCommand) -> Result<()> {
    let mut app = App::load()?;
    let system = &mut app.workspace.system;

    match command {
        MemberCommand::List => {
            println!(
                "members: {}/{}",
                system.members().len(),
                settings::MAX_MEMBERS
            );
            for m in system.members() {
                let marker = if m.id == system.current_member_id() {
                    "*"
                } else {
                    "-"
                };
                println!(
                    "{marker} {} | {} | {} | {}",
                    m.id,
                    m.name,
                    m.privacy_level.as_str(),
                    m.personality_tags.join(",")
                );
            }
            return Ok(());
        }
        MemberCommand::Add {
            name,
            avatar,
            tags,
            memory,
            privacy,
        } => {
            let mut new_member = Consciousness::new(name.trim())
                .with_tags(tags.as_deref().map(parse_tags).unwrap_or_default())
                .with_background_memory(memory.unwrap_or_default())
                .with_privacy(parse_privacy(&privacy)?);
            new_member.avatar = avatar.unwrap_or_default();
            let id = new_member.id.clone();
            system.add_member(new_member)?;
            if system.current_member_id().is_empty() {
                system.switch_to(&id)?;
            }
            println!("member_added: {id}");
        }
        MemberCommand::Edit {
            member_id,
            name,
            avatar,
            tags,
            memory,
            privacy,
        } => {
            let mut updated = system
                .member(&member_id)
                .cloned()
                .ok_or_else(|| anyhow!("member not found: {member_id}"))?;
            if let Some(name) = name {
                updated.name = name.trim().to_string();
            }
            if let Some(avatar) = avatar {
                updated.avatar = avatar;
            }
            if let Some(tags) = tags {
                updated.personality_tags = parse_tags(&tags);
            }
            if let Some(memory) = memory {
                updated.background_memory = memory;
            }
            if let Some(privacy) = privacy {
                updated.privacy_level = parse_privacy(&privacy)?;
            }
            system.update_member(updated)?;
            println!("member_updated: {member_id}");
        }
        MemberCommand::Rename { member_id, name } => {
            let changed = system.rename_member(&member_id, name.trim())?;
            println!("member_renamed: {changed}");
            if !changed {
                return Ok(());
            }
        }
        MemberCommand::Comment { member_id, text } => {
            system.set_background_memory(&member_id, &text)?;
            println!("member_commented: {member_id}");
        }
        MemberCommand::Remove { member_id } => {
            let removed = system.remove_member(&member_id)?;
            println!("member_removed: {} ({})", removed.id, removed.name);
        }
        MemberCommand::Switch { member_id } => {
            let current = system.switch_to(&member_id)?;
            println!("current_member: {} ({})", current.id, current.name);
        }
        MemberCommand::Current => {
            match system.current_member() {
                Some(m) => {
                    println!("current_member: {} ({})", m.id, m.name);
                    println!("tags: {}", m.personality_tags.join(","));
                    println!("privacy: {}", m.privacy_level.as_str());
                    println!("background_memory: {}", m.background_memory);
                }
                None => println!("current_member: <none>"),
            }
            return Ok(());
        }
    }

    app.persist()
}

fn conversation(command: ConversationCommand) -> Result<()> {
    let mut app = App::load()?;

    match command {
        ConversationCommand::List => {
            let book = &app.workspace.book;
            println!("conversations: {}", book.conversations().len());
            for conv in book.conversations() {
                let marker = if conv.id == book.current_conversation_id() {
                    "*"
                } else {
                    "-"
                };
                println!(
                    "{marker} {} | {} | {} messages",
                    conv.id,
                    conv.name,
                    conv.messages.len()
                );
            }
            return Ok(());
        }
        ConversationCommand::Create { name } => {
            let created = app.workspace.book.create(name.trim())?;
            println!("conversation_created: {}", created.id);
        }
        ConversationCommand::Rename {
            conversation_id,
            name,
        } => {
            let changed = app
                .workspace
                .book
                .get_mut(&conversation_id)?
                .rename(name.trim())?;
            println!("conversation_renamed: {changed}");
            if !changed {
                return Ok(());
            }
        }
        ConversationCommand::Delete { conversation_id } => {
            let removed = app.workspace.book.remove(&conversation_id)?;
            app.repo.delete_conversation(&removed.id)?;
            println!("conversation_deleted: {}", removed.id);
        }
        ConversationCommand::Select { conversation_id } => {
            let selected = app.workspace.book.select(&conversation_id)?;
            println!("current_conversation: {} ({})", selected.id, selected.name);
        }
        ConversationCommand::Show {
            conversation_id,
            limit,
        } => {
            let book = &app.workspace.book;
            let conv = match conversation_id.as_deref() {
                Some(id) => book.get(id),
                None => book.current(),
            }
            .ok_or_else(|| anyhow!("no such conversation (or none open)"))?;
            println!("conversation: {} ({})", conv.id, conv.name);
            let skip = conv.messages.len().saturating_sub(limit);
            for msg in conv.messages.iter().skip(skip) {
                println!(
                    "[{}] {}: {}",
                    msg.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    msg.sender.name,
                    msg.content
                );
            }
            return Ok(());
        }
        ConversationCommand::Send {
            text,
            conversation,
            references,
        } => {
            let sender = app
                .workspace
                .system
                .current_member()
                .cloned()
                .ok_or_else(|| anyhow!("no current member; run `mmc2 member switch <id>`"))?;
            let target = match conversation {
                Some(id) => id,
                None => app.workspace.book.current_conversation_id().to_string(),
            };
            if target.is_empty() {
                bail!("no conversation open; run `mmc2 conversation create <name>`");
            }
            let conv = app.workspace.book.get_mut(&target)?;
            if let Some(missing) = references.iter().find(|id| conv.message(id).is_none()) {
                bail!("referenced message not found in conversation: {missing}");
            }
            let sender_name = sender.name.clone();
            let message = Message::new(sender, text).with_references(references);
            let sent = conv.push_message(message)?;
            println!("message_sent: {}", sent.id);
            app.notifications
                .show_new_message(&sender_name, &sent.content);
            info!(conversation_id = %target, "message sent");
        }
    }

    app.persist()
}

fn search(query: &str) -> Result<()> {
    let app = App::load()?;
    let system = &app.workspace.system;
    let viewer = system.current_member().map(|m| (m, system));
    let hits = search_messages(app.workspace.book.conversations(), query, viewer);

    println!("matches: {}", hits.len());
    for hit in hits {
        println!(
            "- {} | {} | {}: {}",
            hit.conversation_name,
            hit.message.timestamp.format("%Y-%m-%d %H:%M"),
            hit.message.sender.name,
            hit.message.preview(80)
        );
    }
    Ok(())
}

fn export(
    scope: &str,
    path: Option<PathBuf>,
    include_members: bool,
    include_settings: bool,
) -> Result<()> {
    let app = App::load()?;
    let scope = parse_export_scope(scope, include_members, include_settings)?;
    let target = match path {
        Some(path) => PathBuf::from(expand_tilde(&path.to_string_lossy())),
        None => app.repo.default_export_path(),
    };
    let written = exchange::export(&app.workspace, &app.config, scope, &target)?;
    println!("export_written: {}", written.display());
    Ok(())
}

fn import(path: PathBuf, mode: &str) -> Result<()> {
    let mut app = App::load()?;
    let mode = ImportMode::parse(mode).ok_or_else(|| anyhow!("unsupported import mode: {mode}"))?;
    let path = PathBuf::from(expand_tilde(&path.to_string_lossy()));
    let bundle = exchange::read_bundle(&path)
        .with_context(|| format!("failed to import {}", path.display()))?;

    let summary = exchange::import(bundle, &mut app.workspace, &mut app.config, mode)?;
    if summary.settings_applied {
        app.save_config()?;
    }
    app.persist()?;
    println!("members_added: {}", summary.members_added);
    println!("members_skipped: {}", summary.members_skipped);
    println!("conversations_added: {}", summary.conversations_added);
    println!("conversations_replaced: {}", summary.conversations_replaced);
    println!("conversations_skipped: {}", summary.conversations_skipped);
    println!("settings_applied: {}", summary.settings_applied);
    app.notifications.show_system("import finished");
    Ok(())
}

fn settings_cmd(command: SettingsCommand) -> Result<()> {
    let mut app = App::load()?;

    match command {
        SettingsCommand::Show => {
            let cfg = &app.config;
            println!("config: {}", app.config_path.display());
            println!("data_dir: {}", cfg.data_dir.display());
            println!("log_level: {}", cfg.log_level);
            println!("auto_save: {}", cfg.storage.auto_save);
            println!("auto_save_interval_ms: {}", cfg.storage.auto_save_interval_ms);
            println!("logging: {}", cfg.logging.enabled);
            println!("max_log_size: {}", cfg.logging.max_log_size);
            println!("theme: {}", cfg.appearance.theme);
            println!("font_size: {}", cfg.appearance.font_size);
            println!("animations: {}", cfg.appearance.enable_animations);
            println!("notifications: {}", cfg.notifications.enabled);
            println!("sound_effects: {}", cfg.notifications.sound_effects);
        }
        SettingsCommand::Set { key, value } => {
            apply_setting(&mut app.config, &key, &value)?;
            app.save_config()?;
            println!("setting_saved: {key} = {value}");
        }
    }
    Ok(())
}

fn theme_cmd(command: ThemeCommand) -> Result<()> {
    let mut app = App::load()?;

    match command {
        ThemeCommand::List => {
            let current = app.config.theme_index();
            for (idx, name) in theme::AVAILABLE_THEMES.iter().enumerate() {
                let marker = if Some(idx) == current { "*" } else { "-" };
                println!("{marker} {}. {name}", idx + 1);
            }
        }
        ThemeCommand::Set { theme } => {
            let name = resolve_theme(&theme)?;
            app.config.appearance.theme = name.to_string();
            app.save_config()?;
            println!("theme: {name}");
        }
    }
    Ok(())
}

fn clear_chats(confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!("this deletes every conversation permanently; re-run with --yes");
    }
    let mut app = App::load()?;
    app.workspace.book.clear();
    app.repo.clear_conversations()?;
    println!("conversations_cleared: true");
    Ok(())
}

fn parse_privacy(input: &str) -> Result<PrivacyLevel> {
    PrivacyLevel::parse(input).ok_or_else(|| anyhow!("unsupported privacy level: {input}"))
}

fn parse_export_scope(
    input: &str,
    include_members: bool,
    include_settings: bool,
) -> Result<ExportScope> {
    match input.trim().to_lowercase().as_str() {
        "conversations" | "all" => Ok(ExportScope::Conversations {
            include_members,
            include_settings,
        }),
        "members" => Ok(ExportScope::Members),
        "settings" => Ok(ExportScope::Settings),
        _ => bail!("unsupported export scope: {input}"),
    }
}

fn resolve_theme(input: &str) -> Result<&'static str> {
    if let Ok(position) = input.trim().parse::<usize>() {
        return position
            .checked_sub(1)
            .and_then(registry::theme_name)
            .ok_or_else(|| anyhow!("theme position out of range: {position}"));
    }
    registry::theme_index(input)
        .and_then(registry::theme_name)
        .ok_or_else(|| anyhow!("unknown theme: {input}"))
}

fn apply_setting(config: &mut AppConfig, key: &str, value: &str) -> Result<()> {
    match key.trim() {
        "log_level" => config.log_level = value.trim().to_string(),
        "auto_save" => config.storage.auto_save = parse_bool(value)?,
        "auto_save_interval_ms" => config.storage.auto_save_interval_ms = parse_number(value)?,
        "logging" => config.logging.enabled = parse_bool(value)?,
        "max_log_size" => config.logging.max_log_size = parse_number(value)?,
        "font_size" => config.appearance.font_size = parse_number(value)?,
        "animations" => config.appearance.enable_animations = parse_bool(value)?,
        "notifications" => config.notifications.enabled = parse_bool(value)?,
        "sound_effects" => config.notifications.sound_effects = parse_bool(value)?,
        "theme" => config.appearance.theme = resolve_theme(value)?.to_string(),
        other => bail!("unknown setting: {other}"),
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => bail!("expected a boolean, got {other}"),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow!("expected a number, got {value}"))
}
