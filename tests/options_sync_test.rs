//! Options refresh gating and change push

mod common;

use common::{Harness, has_notification, notifications};
use ordered_float::OrderedFloat;
use rcon_admin::options::{OptionValue, OptionsError, ServerOptions};
use rcon_admin::session::{SessionEvent, Severity};

fn options_events(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SessionEvent::OptionsUpdated { .. }))
        .count()
}

#[tokio::test]
async fn test_identical_reply_is_not_reparsed() {
    let mut h = Harness::new().connected().await;

    assert!(!h.manager.refresh_options().await.unwrap());
    assert_eq!(options_events(&h.drain()), 0);
    assert_eq!(h.connector.executed(), vec!["showoptions"]);

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_apply_pushes_only_changed_fields() {
    let mut h = Harness::new().connected().await;

    let current = h.manager.options().await.unwrap();
    assert_eq!(current.get("MaxPlayers"), Some(&OptionValue::Int(16)));

    let mut desired = current.clone();
    desired.set("MaxPlayers", OptionValue::Int(32)).unwrap();

    assert!(h.manager.apply_options(&desired, false).await);
    assert_eq!(
        h.connector.executed(),
        vec!["changeoption MaxPlayers \"32\"", "showoptions"]
    );
    assert_eq!(h.server.option("MaxPlayers").as_deref(), Some("32"));

    let synced = h.manager.options().await.unwrap();
    assert_eq!(synced.get("MaxPlayers"), Some(&OptionValue::Int(32)));

    let events = h.drain();
    assert_eq!(options_events(&events), 1);
    assert!(has_notification(&events, Severity::Success, "Options updated successfully"));

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_float_echo_with_one_decimal_counts_as_success() {
    let mut h = Harness::new().connected().await;

    let mut desired = h.manager.options().await.unwrap();
    desired
        .set("MinutesPerPage", OptionValue::Float(OrderedFloat(2.0)))
        .unwrap();

    assert!(h.manager.apply_options(&desired, false).await);
    assert_eq!(
        h.connector.executed(),
        vec!["changeoption MinutesPerPage \"2\"", "showoptions"]
    );
    assert_eq!(h.server.option("MinutesPerPage").as_deref(), Some("2.0"));
    assert!(has_notification(&h.drain(), Severity::Success, "Options updated successfully"));

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_malformed_reply_keeps_cache() {
    let mut h = Harness::new().connected().await;
    let before = h.manager.options().await.unwrap();

    let server = h.server.clone();
    h.connector.set_handler(move |command| {
        if command == "showoptions" {
            Ok("List of Server Options:\n* MaxPlayers=lots\n".to_string())
        } else {
            server.answer(command)
        }
    });

    assert!(matches!(
        h.manager.refresh_options().await,
        Err(OptionsError::Parse { .. })
    ));
    assert_eq!(h.manager.options().await.unwrap(), before);
    assert_eq!(options_events(&h.drain()), 0);

    // The last good reply is still the reference for change detection
    h.server.install(&h.connector);
    assert!(!h.manager.refresh_options().await.unwrap());

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_apply_without_changes_warns_and_resyncs() {
    let mut h = Harness::new().connected().await;
    let current = h.manager.options().await.unwrap();

    assert!(!h.manager.apply_options(&current, false).await);
    assert_eq!(h.connector.executed(), vec!["showoptions"]);
    assert!(has_notification(&h.drain(), Severity::Warning, "No options to update"));

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_rejected_echo_reports_failures() {
    let mut h = Harness::new().connected().await;
    let server = h.server.clone();
    h.connector.set_handler(move |command| {
        if command.starts_with("changeoption PVP") {
            Ok("Option PVP is read-only".to_string())
        } else {
            server.answer(command)
        }
    });

    let mut desired = h.manager.options().await.unwrap();
    desired.set("PVP", OptionValue::Bool(false)).unwrap();
    desired.set("MaxPlayers", OptionValue::Int(8)).unwrap();

    assert!(!h.manager.apply_options(&desired, false).await);
    assert_eq!(h.connector.executed().last().map(String::as_str), Some("showoptions"));

    let failure = notifications(&h.drain())
        .into_iter()
        .find(|n| n.severity == Severity::Error)
        .unwrap();
    assert_eq!(failure.rendered_title(), "Failed to update 1 options");

    let synced = h.manager.options().await.unwrap();
    assert_eq!(synced.get("PVP"), Some(&OptionValue::Bool(true)));
    assert_eq!(synced.get("MaxPlayers"), Some(&OptionValue::Int(8)));

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_apply_with_reload() {
    let mut h = Harness::new().connected().await;

    let mut desired = h.manager.options().await.unwrap();
    desired
        .set("PublicName", OptionValue::Text("Night Shift".into()))
        .unwrap();

    assert!(h.manager.apply_options(&desired, true).await);
    assert_eq!(
        h.connector.executed(),
        vec![
            "changeoption PublicName \"Night Shift\"",
            "showoptions",
            "reloadoptions"
        ]
    );
    assert!(has_notification(
        &h.drain(),
        Severity::Success,
        "Options saved and applied successfully"
    ));

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_apply_requires_connection() {
    let mut h = Harness::new();

    assert!(!h.manager.apply_options(&ServerOptions::default(), false).await);
    assert_eq!(h.connector.dial_count(), 0);
    assert!(has_notification(&h.drain(), Severity::Error, "RCON is not connected"));
}

#[tokio::test]
async fn test_set_option_validates_input() {
    let mut h = Harness::new().connected().await;

    assert!(!h.manager.set_option("NoSuchOption", "1").await);
    assert!(!h.manager.set_option("PVP", "maybe").await);
    assert!(h.connector.executed().is_empty());
    assert_eq!(
        notifications(&h.drain())
            .iter()
            .filter(|n| n.title == "Invalid option value")
            .count(),
        2
    );

    assert!(h.manager.set_option("PauseEmpty", "false").await);
    assert_eq!(h.server.option("PauseEmpty").as_deref(), Some("false"));

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_preset_export_and_import() {
    let h = Harness::new().connected().await;
    let path = h.paths.saved_options_dir().join("night.json");

    h.manager.export_options(&path).await.unwrap();
    let mut preset = ServerOptions::load(&path).unwrap();
    assert_eq!(preset, h.manager.options().await.unwrap());

    preset.set("MaxPlayers", OptionValue::Int(24)).unwrap();
    preset.save(&path).unwrap();
    h.connector.clear_executed();

    assert!(h.manager.import_options(&path, false).await);
    assert_eq!(
        h.connector.executed(),
        vec!["changeoption MaxPlayers \"24\"", "showoptions"]
    );

    h.manager.disconnect().await;
}

#[tokio::test]
async fn test_import_reports_unreadable_preset() {
    let mut h = Harness::new().connected().await;
    let path = h.dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(!h.manager.import_options(&path, false).await);
    assert!(h.connector.executed().is_empty());
    let failure = notifications(&h.drain()).pop().unwrap();
    assert_eq!(failure.title, "Failed to load options preset");
    assert_eq!(failure.path.as_deref(), path.to_str());

    h.manager.disconnect().await;
}
