//! Action Channel for asynchronous event processing

use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::options::ServerOptions;
use crate::roster::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// User-facing message raised by an operation.
///
/// `title` may contain `{key}` placeholders filled from `parameters`; the raw
/// pair is kept so a presentation layer can localize the title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub path: Option<String>,
    pub severity: Severity,
    pub parameters: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(severity: Severity, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: String::new(),
            path: None,
            severity,
            parameters: BTreeMap::new(),
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(Severity::Info, title)
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(Severity::Success, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(Severity::Error, title)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.parameters.insert(key.into(), value.to_string());
        self
    }

    /// Title with parameters substituted
    pub fn rendered_title(&self) -> String {
        self.parameters
            .iter()
            .fold(self.title.clone(), |title, (key, value)| {
                title.replace(&format!("{{{}}}", key), value)
            })
    }
}

/// Session events for the presentation layer
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Cached roster changed
    PlayersUpdated { players: Vec<Player> },
    /// A fresh options snapshot was parsed
    OptionsUpdated { options: ServerOptions },
    /// Watchdog found the connection dead
    ConnectionLost,
    /// Batch progress, 0 to 100
    Progress { percent: u8 },
    Notification(Notification),
}

/// Action channel for event processing
pub struct ActionChannel {
    /// Event sender
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    /// Event receiver
    event_rx: Option<mpsc::UnboundedReceiver<SessionEvent>>,
}

impl Clone for ActionChannel {
    fn clone(&self) -> Self {
        Self {
            event_tx: self.event_tx.clone(),
            event_rx: None, // Receivers cannot be cloned
        }
    }
}

impl ActionChannel {
    /// Create a new ActionChannel
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Send event to channel
    pub fn send_event(&self, event: SessionEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .map_err(|e| anyhow::anyhow!("Failed to send event: {}", e))
    }

    /// Send event, logging instead of failing when nobody listens
    pub fn emit(&self, event: SessionEvent) {
        if let Err(err) = self.send_event(event) {
            debug!("Dropping session event: {}", err);
        }
    }

    /// Log and emit a notification
    pub fn notify(&self, notification: Notification) {
        let title = notification.rendered_title();
        match notification.severity {
            Severity::Error => error!("{}: {}", title, notification.message),
            Severity::Warning => warn!("{}: {}", title, notification.message),
            Severity::Info | Severity::Success => info!("{}", title),
        }
        self.emit(SessionEvent::Notification(notification));
    }

    pub fn progress(&self, percent: u8) {
        self.emit(SessionEvent::Progress {
            percent: percent.min(100),
        });
    }

    /// Get next event from channel
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        if let Some(event_rx) = &mut self.event_rx {
            event_rx.recv().await
        } else {
            None
        }
    }

    /// Get event sender for external use
    pub fn event_tx(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.event_tx.clone()
    }

    /// Get event receiver for external use
    pub fn event_rx(&mut self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.event_rx.take()
    }

    /// Check if channel is closed
    pub fn is_closed(&self) -> bool {
        self.event_tx.is_closed()
    }
}

impl Default for ActionChannel {
    fn default() -> Self {
        Self::new()
    }
}
