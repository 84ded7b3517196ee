//! Batch execution, classification and progress reporting

mod common;

use common::{Harness, has_notification, notifications, progress};
use rcon_admin::executor::{CommandParam, CommandRequest, NotificationTemplates, ResponsePattern, ResponseRules};
use rcon_admin::rcon::{MAX_COMMAND_LEN, RconError};
use rcon_admin::roster::AccessLevel;
use rcon_admin::session::{SessionEvent, Severity};
use rcon_admin::storage::presets::{ItemRecord, ServerMessage, save_items};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_partial_batch_counts_successes() {
    let mut h = Harness::new();
    h.server.set_online(&["Alice", "Bob"]);
    let mut h = h.connected().await;
    h.server.set_missing(&["Ghost"]);

    let successes = h
        .manager
        .ban_users(&names(&["Alice", "Ghost", "Bob"]), Some("griefing"), false)
        .await;
    assert_eq!(successes, 2);
    assert_eq!(
        h.connector.executed(),
        vec![
            "banuser \"Alice\" -r \"griefing\"",
            "banuser \"Ghost\" -r \"griefing\"",
            "banuser \"Bob\" -r \"griefing\"",
        ]
    );

    let players = h.manager.players().await;
    assert!(players.iter().filter(|p| p.name != "Ghost").all(|p| p.banned));

    let events = h.drain();
    let summary = notifications(&events)
        .into_iter()
        .find(|n| n.severity == Severity::Warning)
        .expect("partial batches end in a warning");
    assert_eq!(summary.rendered_title(), "Banned 2 of 3 players");
    assert_eq!(summary.message, "User Ghost doesn't exist.");
    assert!(events.iter().any(|e| matches!(e, SessionEvent::PlayersUpdated { .. })));

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_single_target_summary() {
    let mut h = Harness::new().connected().await;

    assert_eq!(h.manager.kick_users(&names(&["Bob"]), None).await, 1);
    assert_eq!(h.connector.executed(), vec!["kickuser \"Bob\""]);

    let events = h.drain();
    let summary = notifications(&events).pop().unwrap();
    assert_eq!(summary.severity, Severity::Success);
    assert_eq!(summary.rendered_title(), "Kicked Bob");

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_oversized_command_never_reaches_transport() {
    let mut h = Harness::new().connected().await;

    let text = "x".repeat(MAX_COMMAND_LEN + 1);
    assert_eq!(h.manager.server_message(&text).await, 0);
    assert!(h.connector.executed().is_empty());

    let events = h.drain();
    assert!(has_notification(&events, Severity::Error, "Failed to send message"));
    assert!(h.manager.is_connected().await);

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_missing_required_parameter_aborts_batch() {
    let mut h = Harness::new().connected().await;

    assert_eq!(h.manager.teleport_to_player(&names(&["Bob"]), "  ").await, 0);
    assert!(h.connector.executed().is_empty());

    let events = h.drain();
    assert!(has_notification(&events, Severity::Error, "Invalid command"));
    assert!(progress(&events).is_empty());

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_empty_target_list_warns() {
    let mut h = Harness::new().connected().await;

    assert_eq!(h.manager.unban_users(&[]).await, 0);
    assert!(h.connector.executed().is_empty());
    assert!(has_notification(&h.drain(), Severity::Warning, "No players selected"));

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_post_process_runs_before_classification() {
    let mut h = Harness::new().connected().await;
    let server = h.server.clone();
    h.connector.set_handler(move |command| {
        if command.starts_with("checkzone") {
            Ok("[srv] zone clear\n".to_string())
        } else {
            server.answer(command)
        }
    });

    fn strip_tag(reply: &str) -> String {
        reply.trim_start_matches("[srv] ").to_string()
    }

    let request = CommandRequest::new("checkzone {zone}")
        .param(CommandParam::required("zone", "north"))
        .rules(ResponseRules::new(vec![ResponsePattern::exact("zone clear")]))
        .post_process(strip_tag)
        .notifications(NotificationTemplates::untargeted("Zone clear", "Zone busy"));

    assert_eq!(h.manager.execute(&request).await, 1);
    assert_eq!(h.connector.executed(), vec!["checkzone north"]);
    assert!(has_notification(&h.drain(), Severity::Success, "Zone clear"));

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_transport_error_is_not_fatal() {
    let h = Harness::new().connected().await;
    let server = h.server.clone();
    h.connector.set_handler(move |command| {
        if command.contains("\"Ghost\"") {
            Err(RconError::Timeout(std::time::Duration::from_secs(10)))
        } else {
            server.answer(command)
        }
    });

    let successes = h.manager.kick_users(&names(&["Ghost", "Bob"]), None).await;
    assert_eq!(successes, 1);
    assert_eq!(h.connector.executed().len(), 2);
    assert!(h.manager.is_connected().await);

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_progress_reaches_full_then_resets() {
    let mut h = Harness::new().connected().await;

    h.manager
        .set_access_level(&names(&["Alice", "Bob"]), AccessLevel::Moderator)
        .await;

    assert_eq!(progress(&h.drain()), vec![50, 100, 0]);

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_access_level_updates_roster() {
    let mut h = Harness::new();
    h.server.set_online(&["Alice"]);
    let mut h = h.connected().await;
    let server = h.server.clone();
    h.connector.set_handler(move |command| {
        if command.starts_with("setaccesslevel") {
            Ok("User Alice is now moderator".to_string())
        } else {
            server.answer(command)
        }
    });

    assert_eq!(
        h.manager
            .set_access_level(&names(&["Alice"]), AccessLevel::Moderator)
            .await,
        1
    );
    assert_eq!(
        h.connector.executed(),
        vec!["setaccesslevel \"Alice\" moderator"]
    );

    let alice = h.manager.players().await.remove(0);
    assert_eq!(alice.access_level, AccessLevel::Moderator);
    assert!(alice.elevated);
    assert!(h.drain().iter().any(|e| matches!(e, SessionEvent::PlayersUpdated { .. })));

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_execute_without_connection() {
    let mut h = Harness::new();

    assert_eq!(h.manager.save_world().await, 0);
    assert_eq!(h.connector.dial_count(), 0);
    assert!(has_notification(&h.drain(), Severity::Error, "RCON is not connected"));
}

#[tokio::test]
async fn test_lenient_commands_reject_known_errors() {
    let mut h = Harness::new().connected().await;
    let server = h.server.clone();
    h.connector.set_handler(move |command| {
        if command.starts_with("lightning") {
            Ok("User Ghost not found".to_string())
        } else {
            server.answer(command)
        }
    });

    assert_eq!(h.manager.lightning(&names(&["Ghost"])).await, 0);
    assert_eq!(h.manager.chopper().await, 1);
    assert_eq!(h.connector.executed(), vec!["lightning \"Ghost\"", "chopper"]);

    let events = h.drain();
    assert!(notifications(&events)
        .iter()
        .any(|n| n.severity == Severity::Error && n.rendered_title() == "Failed to trigger lightning for Ghost"));

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_god_mode_reply_must_match_direction() {
    let h = Harness::new().connected().await;

    assert_eq!(h.manager.set_god_mode(&names(&["Bob"]), true).await, 1);
    assert_eq!(h.manager.set_god_mode(&names(&["Bob"]), false).await, 1);
    assert_eq!(
        h.connector.executed(),
        vec!["godmod \"Bob\" -true", "godmod \"Bob\" -false"]
    );

    // A server that ignores the flag only satisfies the enabling request
    h.connector
        .set_handler(|_| Ok("User Bob is now invincible.".to_string()));
    assert_eq!(h.manager.set_god_mode(&names(&["Bob"]), true).await, 1);
    assert_eq!(h.manager.set_god_mode(&names(&["Bob"]), false).await, 0);

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_saved_item_list_gives_every_entry() {
    let mut h = Harness::new().connected().await;
    let path = h.paths.saved_items_dir().join("starter.json");
    save_items(&path, &[ItemRecord::new("Base.Axe", 1), ItemRecord::new("Base.Nails", 50)]).unwrap();

    assert_eq!(h.manager.add_items_from_file(&names(&["Bob"]), &path).await, 2);
    assert_eq!(
        h.connector.executed(),
        vec!["additem \"Bob\" \"Base.Axe\" 1", "additem \"Bob\" \"Base.Nails\" 50"]
    );
    h.drain();

    let missing = h.paths.saved_items_dir().join("missing.json");
    assert_eq!(h.manager.add_items_from_file(&names(&["Bob"]), &missing).await, 0);
    let failure = notifications(&h.drain()).pop().unwrap();
    assert_eq!(failure.title, "Failed to load item list");
    assert_eq!(failure.path, Some(missing.display().to_string()));
    assert_eq!(h.connector.executed().len(), 2);

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_saved_message_is_broadcast_with_colors() {
    let mut h = Harness::new().connected().await;
    let path = h.paths.saved_messages_dir().join("motd.json");
    let mut message = ServerMessage::new("Restart\nin 5 minutes");
    message.line_colors.insert(0, "255,0,0".into());
    message.save(&path).unwrap();

    assert_eq!(h.manager.server_message_from_file(&path).await, 1);
    assert_eq!(
        h.connector.executed(),
        vec!["servermsg \"<RGB:1.00,0.00,0.00>Restart<LINE><RGB:1,1,1>in 5 minutes\""]
    );
    h.drain();

    ServerMessage::new("\n  \n").save(&path).unwrap();
    assert_eq!(h.manager.server_message_from_file(&path).await, 0);
    assert!(has_notification(&h.drain(), Severity::Warning, "Message is empty"));
    assert_eq!(h.connector.executed().len(), 1);

    h.manager.disconnect().await;
}
