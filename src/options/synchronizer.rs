//! Options polling and push for a live session.

use tracing::{debug, error, info, warn};

use super::{OptionChange, OptionsError, ServerOptions, reply_digest};
use crate::executor::CommandRequest;
use crate::session::action_channel::{Notification, SessionEvent};
use crate::session::state::Session;

const SHOW_OPTIONS_COMMAND: &str = "showoptions";

impl Session {
    /// Pull the full option list.
    ///
    /// Returns `Ok(false)` when the reply is byte-identical to the last synced
    /// one. A reply that fails to parse leaves the cache untouched.
    pub async fn refresh_options(&mut self) -> Result<bool, OptionsError> {
        let reply = self.round_trip(SHOW_OPTIONS_COMMAND).await?;
        let hash = reply_digest(&reply);

        if self.options.last_hash.as_deref() == Some(hash.as_str()) {
            debug!("Options unchanged, skipping parse");
            return Ok(false);
        }

        let snapshot = ServerOptions::parse(&reply)?;
        self.options.snapshot = Some(snapshot.clone());
        self.options.last_hash = Some(hash);

        debug!("Options synced");
        self.events
            .emit(SessionEvent::OptionsUpdated { options: snapshot });
        Ok(true)
    }

    /// Push each change and count the ones the server echoed back
    async fn push_option_changes(&mut self, changes: &[OptionChange]) -> usize {
        let total = changes.len();
        let mut successes = 0;

        for (idx, change) in changes.iter().enumerate() {
            let command = change.command();
            match self.round_trip(&command).await {
                Ok(reply) if change.echo_matches(&reply) => {
                    debug!("{} = {}", change.name, change.value);
                    successes += 1;
                }
                Ok(reply) => warn!("Unexpected echo for {}: {}", change.name, reply.trim()),
                Err(err) => warn!("Failed to update {}: {}", change.name, err),
            }
            self.events.progress(((idx + 1) * 100 / total) as u8);
        }
        self.events.progress(0);

        successes
    }

    /// Push every field of `desired` that differs from the cached snapshot.
    ///
    /// The cache is always rebuilt from a fresh `showoptions` afterwards.
    /// `reload` runs once every push and the re-sync succeeded.
    pub async fn apply_options(
        &mut self,
        desired: &ServerOptions,
        reload: Option<&CommandRequest>,
    ) -> bool {
        if !self.is_connected() {
            self.events.notify(Notification::error("RCON is not connected"));
            return false;
        }

        let Some(current) = self.options.snapshot.as_ref() else {
            self.events.notify(
                Notification::error("Failed to update options")
                    .with_message(OptionsError::NotSynced.to_string()),
            );
            self.resync_options().await;
            return false;
        };

        let changes = current.diff(desired);
        if changes.is_empty() {
            self.events.notify(Notification::warning("No options to update"));
            self.resync_options().await;
            return false;
        }

        info!("Pushing {} option changes", changes.len());
        let successes = self.push_option_changes(&changes).await;
        let failed = changes.len() - successes;

        let resync = self.refresh_options().await;

        if failed > 0 {
            if let Err(err) = resync {
                warn!("Error syncing options after failed update: {}", err);
            }
            self.events.notify(
                Notification::error("Failed to update {count} options").with_param("count", failed),
            );
            return false;
        }

        if let Err(err) = resync {
            error!("Error syncing options after update: {}", err);
            self.events.notify(
                Notification::error("Options updated but sync failed").with_message(err.to_string()),
            );
            return false;
        }

        match reload {
            Some(request) => self.execute(request).await == 1,
            None => {
                self.events.notify(Notification::success("Options updated successfully"));
                true
            }
        }
    }

    async fn resync_options(&mut self) {
        if let Err(err) = self.refresh_options().await {
            warn!("Options refresh failed: {}", err);
        }
    }
}
