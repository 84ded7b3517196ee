//! Session Manager for the remote console connection lifecycle

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::executor::compat::{self, AdminAction};
use crate::executor::{CommandRequest, ServerRelease};
use crate::metrics::{ConnectionStatus, ExchangeMetrics};
use crate::options::{OptionsError, ServerOptions};
use crate::rcon::{Connector, Credentials, RconError};
use crate::roster::{Player, RosterError, RosterUpdate};
use crate::storage::AppPaths;

use super::action_channel::{ActionChannel, Notification, SessionEvent};
use super::state::{Session, Watchdog};

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Watchdog tick
    pub check_interval: Duration,
    pub paths: AppPaths,
    pub server_release: ServerRelease,
}

impl SessionConfig {
    pub fn new(paths: AppPaths) -> Self {
        Self {
            check_interval: Duration::from_secs(5),
            paths,
            server_release: ServerRelease::default(),
        }
    }
}

/// Point-in-time view of the session for status displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub status: ConnectionStatus,
    pub server: Option<String>,
    pub players_known: usize,
    pub players_online: usize,
    pub watchdog_active: bool,
    pub metrics: ExchangeMetrics,
}

/// Owns the single connection and serializes every exchange on it.
#[derive(Clone)]
pub struct SessionManager {
    config: SessionConfig,
    session: Arc<Mutex<Session>>,
    connector: Arc<dyn Connector>,
    events: ActionChannel,
}

impl SessionManager {
    pub fn new(config: SessionConfig, connector: Arc<dyn Connector>) -> Self {
        let events = ActionChannel::new();
        let session = Session::new(events.clone());

        Self {
            config,
            session: Arc::new(Mutex::new(session)),
            connector,
            events,
        }
    }

    /// Take the event receiver. Only the first call on the original handle
    /// returns `Some`; clones never do.
    pub fn subscribe(&mut self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.events.event_rx()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn release(&self) -> ServerRelease {
        self.config.server_release
    }

    pub fn events(&self) -> &ActionChannel {
        &self.events
    }

    /// Dial, authenticate and prime the caches.
    ///
    /// Any existing connection is closed first.
    pub async fn connect(&self, credentials: Credentials) -> bool {
        if !credentials.is_complete() {
            self.events.notify(
                Notification::error("RCON connection failed")
                    .with_message("Host, port and password are required"),
            );
            return false;
        }

        let address = credentials.address();
        let mut session = self.session.lock().await;

        // Teardown, dial and attach all happen under this one guard
        let previous = if session.is_connected() {
            let previous = session.shutdown().await;
            debug!("Closed previous connection before reconnecting");
            self.events.notify(Notification::info("RCON connection closed"));
            previous
        } else {
            None
        };

        info!("Connecting to RCON server {}", address);
        let connection = match self
            .connector
            .connect(&address, &credentials.password)
            .await
        {
            Ok(connection) => connection,
            Err(err) => {
                drop(session);
                join_watchdog(previous).await;
                error!("Failed to connect to {}: {}", address, err);
                self.events.notify(
                    Notification::error("RCON connection failed")
                        .with_message(err.to_string())
                        .with_param("address", &address),
                );
                return false;
            }
        };

        let roster_path = self.config.paths.roster_file(&credentials);
        session.attach(connection, credentials, roster_path).await;

        if session.watchdog.is_none() {
            session.watchdog = Some(self.spawn_watchdog());
        }

        if let Err(err) = session.init_roster() {
            error!("Error initializing roster: {}", err);
        }
        if let Err(err) = session.refresh_roster().await {
            error!("Error refreshing roster: {}", err);
        }
        if let Err(err) = session.refresh_options().await {
            error!("Error refreshing options: {}", err);
        }
        drop(session);
        join_watchdog(previous).await;

        self.events.notify(
            Notification::success("RCON connection established").with_param("address", &address),
        );
        true
    }

    /// Stop the watchdog and close the connection.
    /// Returns false when nothing was connected.
    pub async fn disconnect(&self) -> bool {
        let watchdog = {
            let mut session = self.session.lock().await;
            if !session.is_connected() {
                return false;
            }
            session.shutdown().await
        };
        join_watchdog(watchdog).await;

        info!("Disconnected from RCON server");
        self.events.notify(Notification::info("RCON connection closed"));
        true
    }

    fn spawn_watchdog(&self) -> Watchdog {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_watchdog(
            Arc::clone(&self.session),
            self.events.clone(),
            cancel.clone(),
            self.config.check_interval,
        ));
        Watchdog { cancel, handle }
    }

    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.is_connected()
    }

    pub async fn watchdog_active(&self) -> bool {
        self.session.lock().await.watchdog.is_some()
    }

    /// Send a command verbatim.
    ///
    /// A successful `banuser`/`unbanuser` updates the cached ban flag.
    pub async fn raw_execute(&self, command: &str) -> Result<String, RconError> {
        let mut session = self.session.lock().await;
        let reply = session.round_trip(command).await?;

        if let Some((name, update)) = passthrough_roster_update(self.release(), command, &reply) {
            if session.roster.apply_update(&name, update) {
                session.events.emit(SessionEvent::PlayersUpdated {
                    players: session.roster.players().to_vec(),
                });
            }
        }

        Ok(reply)
    }

    pub async fn execute(&self, request: &CommandRequest) -> usize {
        self.session.lock().await.execute(request).await
    }

    pub async fn players(&self) -> Vec<Player> {
        self.session.lock().await.roster.players().to_vec()
    }

    pub async fn options(&self) -> Option<ServerOptions> {
        self.session.lock().await.options.snapshot.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        let session = self.session.lock().await;
        SessionStatus {
            status: session.status,
            server: session.credentials.as_ref().map(Credentials::address),
            players_known: session.roster.len(),
            players_online: session.roster.online_count(),
            watchdog_active: session.watchdog.is_some(),
            metrics: session.metrics.snapshot(),
        }
    }

    pub async fn add_player(&self, name: &str) -> bool {
        self.session.lock().await.add_player(name)
    }

    pub async fn init_roster(&self) -> Result<(), RosterError> {
        self.session.lock().await.init_roster()
    }

    pub async fn refresh_roster(&self) -> Result<(), RosterError> {
        self.session.lock().await.refresh_roster().await
    }

    pub async fn persist_roster(&self) -> Result<(), RosterError> {
        self.session.lock().await.persist_roster()
    }

    /// Returns whether a new snapshot was parsed
    pub async fn refresh_options(&self) -> Result<bool, OptionsError> {
        self.session.lock().await.refresh_options().await
    }

    /// Push `desired`, optionally asking the server to reload afterwards
    pub async fn apply_options(&self, desired: &ServerOptions, reload: bool) -> bool {
        let reload_request = reload.then(|| crate::executor::actions::reload_options(self.release()));
        self.session
            .lock()
            .await
            .apply_options(desired, reload_request.as_ref())
            .await
    }

    /// Change one option from text
    pub async fn set_option(&self, name: &str, value: &str) -> bool {
        let Some(mut desired) = self.options().await else {
            self.events.notify(
                Notification::error("Failed to update options")
                    .with_message(OptionsError::NotSynced.to_string()),
            );
            return false;
        };
        if let Err(err) = desired.set_raw(name, value) {
            self.events
                .notify(Notification::error("Invalid option value").with_message(err.to_string()));
            return false;
        }
        self.apply_options(&desired, false).await
    }

    /// Write the cached snapshot to a preset file
    pub async fn export_options(&self, path: &Path) -> Result<PathBuf, OptionsError> {
        let options = self.options().await.ok_or(OptionsError::NotSynced)?;
        options.save(path)?;
        info!("Exported options to {}", path.display());
        Ok(path.to_path_buf())
    }

    /// Apply a preset file
    pub async fn import_options(&self, path: &Path, reload: bool) -> bool {
        match ServerOptions::load(path) {
            Ok(desired) => self.apply_options(&desired, reload).await,
            Err(err) => {
                self.events.notify(
                    Notification::error("Failed to load options preset")
                        .with_message(err.to_string())
                        .with_path(path.display().to_string()),
                );
                false
            }
        }
    }
}

/// Ban state implied by a raw `banuser`/`unbanuser` and its reply
fn passthrough_roster_update(
    release: ServerRelease,
    command: &str,
    reply: &str,
) -> Option<(String, RosterUpdate)> {
    let mut parts = command.trim().splitn(2, char::is_whitespace);
    let verb = parts.next()?.to_lowercase();
    let name = leading_argument(parts.next()?)?;

    let (action, update) = match verb.as_str() {
        "banuser" => (AdminAction::BanUser, RosterUpdate::SetBanned(true)),
        "unbanuser" => (AdminAction::UnbanUser, RosterUpdate::SetBanned(false)),
        _ => return None,
    };

    compat::rules(release, action)
        .classify(reply, Some(&name))
        .is_success()
        .then_some((name, update))
}

/// First argument, honouring double quotes
fn leading_argument(args: &str) -> Option<String> {
    let args = args.trim_start();
    let name = match args.strip_prefix('"') {
        Some(rest) => rest.split('"').next()?,
        None => args.split_whitespace().next()?,
    };
    (!name.is_empty()).then(|| name.to_string())
}

/// Wait for a stopped watchdog; must not be called with the session locked
async fn join_watchdog(watchdog: Option<Watchdog>) {
    if let Some(watchdog) = watchdog {
        if let Err(err) = watchdog.handle.await {
            warn!("Watchdog task ended abnormally: {}", err);
        }
    }
}

async fn run_watchdog(
    session: Arc<Mutex<Session>>,
    events: ActionChannel,
    cancel: CancellationToken,
    interval: Duration,
) {
    debug!("Connection watchdog started ({:?})", interval);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Connection watchdog stopped");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        let mut guard = session.lock().await;
        if cancel.is_cancelled() {
            // Stopped by shutdown while waiting for the lock
            continue;
        }

        if !guard.is_connected() {
            guard.watchdog = None;
            guard.status = ConnectionStatus::Lost;
            events.emit(SessionEvent::ConnectionLost);
            warn!("Connection watchdog found no connection, exiting");
            return;
        }

        if let Err(err) = guard.refresh_roster().await {
            error!("RCON liveness check failed: {}", err);
            guard.close_connection().await;
            guard.status = ConnectionStatus::Lost;
            if let Err(err) = guard.persist_roster() {
                warn!("Failed to save roster after connection loss: {}", err);
            }
            guard.watchdog = None;
            events.emit(SessionEvent::ConnectionLost);
            events.notify(Notification::error("RCON connection lost").with_message(err.to_string()));
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_ban_detection() {
        let release = ServerRelease::B41;
        assert_eq!(
            passthrough_roster_update(release, "banuser Bob -ip", "User Bob is now banned"),
            Some(("Bob".to_string(), RosterUpdate::SetBanned(true)))
        );
        assert_eq!(
            passthrough_roster_update(release, "unbanuser \"Bob Smith\"", "User Bob Smith is now un-banned"),
            Some(("Bob Smith".to_string(), RosterUpdate::SetBanned(false)))
        );
        assert_eq!(
            passthrough_roster_update(release, "banuser Bob", "User Bob doesn't exist."),
            None
        );
        assert_eq!(passthrough_roster_update(release, "players", ""), None);
        assert_eq!(passthrough_roster_update(release, "banuser", "x"), None);
    }
}
