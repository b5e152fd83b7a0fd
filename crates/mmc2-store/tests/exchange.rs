use std::fs;

use mmc2_common::AppConfig;
use mmc2_common::settings::MAX_MEMBERS;
use chrono::Utc;
use mmc2_core::{Consciousness, Conversation, ConversationBook, Message, SystemConfig};
use mmc2_store::exchange::{self, ExportBundle, ExportScope, ExportedSettings, ImportMode};
use mmc2_store::{DataRepository, Workspace};
use tempfile::tempdir;

fn workspace_with(member_ids: &[&str]) -> Workspace {
    let mut system = SystemConfig::new();
    for id in member_ids {
        system
            .add_member(Consciousness::with_id(*id, format!("member-{id}")))
            .expect("add member");
    }
    if let Some(first) = member_ids.first() {
        system.switch_to(first).expect("switch");
    }
    let mut book = ConversationBook::new();
    let conv_id = book.create("chat").expect("create").id.clone();
    if let Some(sender) = system.current_member().cloned() {
        book.get_mut(&conv_id)
            .expect("conversation")
            .push_message(Message::new(sender, "exported text"))
            .expect("push");
    }
    Workspace { system, book }
}

#[test]
fn export_appends_json_extension_and_honours_scope() {
    let tmp = tempdir().expect("tempdir");
    let workspace = workspace_with(&["a", "b"]);
    let config = AppConfig::default();

    let written = exchange::export(
        &workspace,
        &config,
        ExportScope::Conversations {
            include_members: false,
            include_settings: true,
        },
        &tmp.path().join("out").join("backup"),
    )
    .expect("export");
    assert_eq!(written, tmp.path().join("out").join("backup.json"));

    let raw = fs::read_to_string(&written).expect("read export");
    assert!(raw.contains("\"format\": \"JSON\""));
    assert!(raw.contains("exported text"));
    assert!(!raw.contains("\"members\""));
    assert!(!raw.contains("data_dir"));

    let bundle = exchange::read_bundle(&written).expect("read bundle");
    assert_eq!(bundle.conversations.as_ref().map(Vec::len), Some(1));
    assert!(bundle.members.is_none());
    assert!(bundle.settings.is_some());
}

#[test]
fn read_bundle_rejects_foreign_format() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("other.json");
    fs::write(
        &path,
        r#"{"format":"XML","app":"MMC2","version":"2.0-new","exportedAt":"2025-01-01T00:00:00Z"}"#,
    )
    .expect("write");
    let err = exchange::read_bundle(&path).expect_err("must reject");
    assert!(err.to_string().contains("unsupported import format"));
}

#[test]
fn merge_keeps_existing_and_skips_known_members() {
    let tmp = tempdir().expect("tempdir");
    let source = workspace_with(&["a", "b"]);
    let mut config = AppConfig::default();
    config.appearance.theme = "温暖橙".to_string();
    let path = exchange::export(&source, &config, ExportScope::Members, &tmp.path().join("m"))
        .expect("export");

    let mut target = workspace_with(&["b", "c"]);
    let mut target_config = AppConfig::default();
    let summary = exchange::import(
        exchange::read_bundle(&path).expect("bundle"),
        &mut target,
        &mut target_config,
        ImportMode::Merge,
    )
    .expect("import");
    assert_eq!(summary.members_added, 1);
    assert_eq!(summary.members_skipped, 1);
    assert!(!summary.settings_applied);
    assert_eq!(target.system.members().len(), 3);
    assert_eq!(target.system.current_member_id(), "b");
    assert_eq!(
        target.system.members().iter().filter(|m| m.is_current).count(),
        1
    );
    assert_eq!(target_config.appearance.theme, "默认蓝");
}

#[test]
fn replace_swaps_members_conversations_and_settings() {
    let tmp = tempdir().expect("tempdir");
    let source = workspace_with(&["x", "y"]);
    let mut config = AppConfig::default();
    config.notifications.enabled = false;
    let path = exchange::export(
        &source,
        &config,
        ExportScope::Conversations {
            include_members: true,
            include_settings: true,
        },
        &tmp.path().join("all.json"),
    )
    .expect("export");

    let mut target = workspace_with(&["a"]);
    let mut target_config = AppConfig::default();
    let summary = exchange::import(
        exchange::read_bundle(&path).expect("bundle"),
        &mut target,
        &mut target_config,
        ImportMode::Replace,
    )
    .expect("import");
    assert_eq!(summary.members_added, 2);
    assert_eq!(summary.conversations_added, 1);
    assert!(summary.settings_applied);
    assert!(!target.system.contains("a"));
    assert_eq!(target.system.current_member_id(), "x");
    assert_eq!(target.book.conversations().len(), 1);
    assert!(!target_config.notifications.enabled);
}

#[test]
fn merge_respects_member_limit() {
    let tmp = tempdir().expect("tempdir");
    let ids: Vec<String> = (0..MAX_MEMBERS).map(|i| format!("s{i}")).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let source = workspace_with(&id_refs);
    let path = exchange::export(
        &source,
        &AppConfig::default(),
        ExportScope::Members,
        &tmp.path().join("many.json"),
    )
    .expect("export");

    let mut target = workspace_with(&["local"]);
    let summary = exchange::import(
        exchange::read_bundle(&path).expect("bundle"),
        &mut target,
        &mut AppConfig::default(),
        ImportMode::Merge,
    )
    .expect("import");
    assert_eq!(target.system.members().len(), MAX_MEMBERS);
    assert_eq!(summary.members_added, MAX_MEMBERS - 1);
    assert_eq!(summary.members_skipped, 1);
}

fn bare_bundle() -> ExportBundle {
    ExportBundle {
        format: "JSON".to_string(),
        app: "MMC2".to_string(),
        version: "2.0-new".to_string(),
        exported_at: Utc::now(),
        conversations: None,
        members: None,
        current_member_id: None,
        settings: None,
    }
}

#[test]
fn replace_skips_conversations_that_cannot_be_stored() {
    let tmp = tempdir().expect("tempdir");
    let repo = DataRepository::open(tmp.path()).expect("open");
    let mut workspace = workspace_with(&["old"]);
    repo.save_all(&workspace).expect("initial save");

    let mut bundle = bare_bundle();
    bundle.members = Some(vec![Consciousness::with_id("new", "New")]);
    bundle.conversations = Some(vec![
        Conversation {
            id: "../evil".to_string(),
            name: "escape".to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        },
        Conversation {
            id: "blank".to_string(),
            name: "   ".to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        },
        Conversation {
            id: "kept".to_string(),
            name: "kept".to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        },
    ]);

    let summary = exchange::import(
        bundle,
        &mut workspace,
        &mut AppConfig::default(),
        ImportMode::Replace,
    )
    .expect("import");
    assert_eq!(summary.members_added, 1);
    assert_eq!(summary.conversations_added, 1);
    assert_eq!(summary.conversations_skipped, 2);
    let ids: Vec<&str> = workspace
        .book
        .conversations()
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(ids, vec!["kept"]);

    repo.save_all(&workspace).expect("save after import");
    let reloaded = repo.load_all().expect("reload");
    assert!(reloaded.system.contains("new"));
    assert_eq!(reloaded.book.conversations().len(), 1);
}

#[test]
fn invalid_settings_refuse_the_whole_bundle() {
    let mut workspace = workspace_with(&["a"]);
    let before = workspace.clone();
    let mut config = AppConfig::default();

    let mut settings = ExportedSettings::from(&config);
    settings.appearance.theme = "米白".to_string();
    let mut bundle = bare_bundle();
    bundle.members = Some(vec![Consciousness::with_id("b", "Bo")]);
    bundle.settings = Some(settings);

    let err = exchange::import(bundle, &mut workspace, &mut config, ImportMode::Replace)
        .expect_err("unknown theme");
    assert!(err.to_string().contains("bundle settings rejected"));
    assert_eq!(workspace, before);
    assert_eq!(config, AppConfig::default());
}
