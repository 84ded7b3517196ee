//! Locked per-server session state.
//!
//! Everything that touches the connection lives here and is reached only
//! through the [`SessionManager`](super::SessionManager) mutex, so at most one
//! exchange is ever in flight.

use std::path::PathBuf;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::metrics::{ConnectionStatus, MetricsCollector};
use crate::options::OptionsCache;
use crate::rcon::types::check_command_len;
use crate::rcon::{Credentials, RconConnection, RconError};
use crate::roster::Roster;

use super::action_channel::ActionChannel;

/// Background liveness task and the token that stops it.
pub(crate) struct Watchdog {
    pub(crate) cancel: CancellationToken,
    pub(crate) handle: JoinHandle<()>,
}

pub struct Session {
    pub(crate) connection: Option<Box<dyn RconConnection>>,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) roster_path: Option<PathBuf>,
    pub(crate) roster: Roster,
    /// Set when the saved roster could not be read; the file is left alone
    pub(crate) roster_readonly: bool,
    pub(crate) options: OptionsCache,
    pub(crate) watchdog: Option<Watchdog>,
    pub(crate) status: ConnectionStatus,
    pub(crate) metrics: MetricsCollector,
    pub(crate) events: ActionChannel,
}

impl Session {
    pub fn new(events: ActionChannel) -> Self {
        Self {
            connection: None,
            credentials: None,
            roster_path: None,
            roster: Roster::new(),
            roster_readonly: false,
            options: OptionsCache::default(),
            watchdog: None,
            status: ConnectionStatus::Disconnected,
            metrics: MetricsCollector::default(),
            events,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Install a freshly dialed connection. A connection still attached is
    /// closed first.
    pub(crate) async fn attach(
        &mut self,
        connection: Box<dyn RconConnection>,
        credentials: Credentials,
        roster_path: PathBuf,
    ) {
        if self.close_connection().await {
            warn!("Replaced a live connection without shutdown");
        }
        self.connection = Some(connection);
        self.credentials = Some(credentials);
        self.roster_path = Some(roster_path);
        self.status = ConnectionStatus::Connected;
        self.metrics.reset();
    }

    /// One command, one reply
    pub async fn round_trip(&mut self, command: &str) -> Result<String, RconError> {
        check_command_len(command)?;
        let connection = self.connection.as_mut().ok_or(RconError::NotConnected)?;

        let started = Instant::now();
        let result = connection.execute(command).await;
        self.metrics.record_exchange(started.elapsed(), result.is_ok());

        match &result {
            Ok(reply) => trace!("> {} < {}", command, reply.trim_end()),
            Err(err) => debug!("> {} failed: {}", command, err),
        }
        result
    }

    /// Close and drop the connection; returns whether one was open
    pub(crate) async fn close_connection(&mut self) -> bool {
        match self.connection.take() {
            Some(mut connection) => {
                connection.close().await;
                if self.status == ConnectionStatus::Connected {
                    self.status = ConnectionStatus::Disconnected;
                }
                true
            }
            None => false,
        }
    }

    /// Stop the watchdog, close the connection and release server state.
    ///
    /// The stopped watchdog is handed back so the caller can join it once the
    /// lock is dropped.
    pub(crate) async fn shutdown(&mut self) -> Option<Watchdog> {
        let watchdog = self.watchdog.take();
        if let Some(watchdog) = &watchdog {
            watchdog.cancel.cancel();
        }
        self.close_connection().await;
        self.release();
        watchdog
    }

    /// Clean-stop teardown: flush the roster and forget server state
    pub(crate) fn release(&mut self) {
        if let Err(err) = self.persist_roster() {
            warn!("Failed to save roster on shutdown: {}", err);
        }
        self.roster.clear();
        self.roster_readonly = false;
        self.options.clear();
        self.credentials = None;
        self.roster_path = None;
        self.status = ConnectionStatus::Disconnected;
    }
}
