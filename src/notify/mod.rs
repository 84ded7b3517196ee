//! Desktop notifications for session warnings and errors.
//!
//! macOS: Notification Center via `mac-notification-sys`.
//! Windows: WinRT Toast via `winrt-notification`.
//! Linux: Freedesktop notifications via `notify-rust`.
//! Other platforms: no-op.

use crate::session::{Notification, Severity};

/// Raises session notifications on the desktop.
#[derive(Clone)]
pub struct SystemNotifier {
    app_name: String,
    min_severity: Severity,
}

impl SystemNotifier {
    /// Create a notifier raising warnings and errors under `app_name`.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            min_severity: Severity::Warning,
        }
    }

    pub fn with_min_severity(mut self, min_severity: Severity) -> Self {
        self.min_severity = min_severity;
        self
    }

    /// Raise a session notification if it is severe enough.
    /// Returns whether it was handed to the platform.
    pub fn raise(&self, notification: &Notification) -> bool {
        if !should_raise(notification.severity, self.min_severity) {
            return false;
        }
        let app_name = self.app_name.clone();
        let severity = notification.severity;
        let title = notification.rendered_title();
        tracing::debug!(kind = subtitle(severity), %title, "Raising desktop notification");
        let body = body(notification);
        // Platform calls block, keep them off the runtime
        std::thread::spawn(move || {
            if let Err(err) = send(&app_name, &title, severity, &body) {
                tracing::warn!(?err, "Failed to raise desktop notification");
            }
        });
        true
    }
}

fn rank(severity: Severity) -> u8 {
    match severity {
        Severity::Info => 0,
        Severity::Success => 1,
        Severity::Warning => 2,
        Severity::Error => 3,
    }
}

fn should_raise(severity: Severity, min_severity: Severity) -> bool {
    rank(severity) >= rank(min_severity)
}

fn subtitle(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "Info",
        Severity::Success => "Done",
        Severity::Warning => "Warning",
        Severity::Error => "Error",
    }
}

/// Message, then the file it concerns
fn body(notification: &Notification) -> String {
    match &notification.path {
        Some(path) if notification.message.is_empty() => path.clone(),
        Some(path) => format!("{}\n{}", notification.message, path),
        None => notification.message.clone(),
    }
}

#[cfg(target_os = "macos")]
fn send(app_name: &str, title: &str, severity: Severity, body: &str) -> anyhow::Result<()> {
    use mac_notification_sys::{Notification, send_notification, set_application};

    if let Err(err) = set_application(app_name) {
        tracing::debug!(?err, "Failed to set macOS notification application");
    }
    send_notification(title, Some(subtitle(severity)), body, None::<&Notification>)?;
    Ok(())
}

#[cfg(target_os = "windows")]
fn send(app_name: &str, title: &str, severity: Severity, body: &str) -> anyhow::Result<()> {
    use winrt_notification::{Duration, Toast};

    Toast::new(app_name)
        .title(title)
        .text1(subtitle(severity))
        .text2(body)
        .duration(Duration::Short)
        .show()?;
    Ok(())
}

#[cfg(target_os = "linux")]
fn send(app_name: &str, title: &str, severity: Severity, body: &str) -> anyhow::Result<()> {
    use notify_rust::{Notification, Urgency};

    let urgency = match severity {
        Severity::Error => Urgency::Critical,
        _ => Urgency::Normal,
    };
    Notification::new()
        .appname(app_name)
        .summary(title)
        .body(body)
        .urgency(urgency)
        .show()?;
    Ok(())
}

#[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
fn send(_app_name: &str, title: &str, _severity: Severity, _body: &str) -> anyhow::Result<()> {
    tracing::debug!(%title, "Desktop notifications are not supported on this platform");
    Ok(())
}
