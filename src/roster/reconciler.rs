//! Roster polling and persistence for a live session.

use tracing::{debug, info, warn};

use super::{Roster, RosterError, parse_online_players};
use crate::session::action_channel::{Notification, SessionEvent};
use crate::session::state::Session;

const LIST_PLAYERS_COMMAND: &str = "players";

impl Session {
    fn emit_roster(&self) {
        self.events.emit(SessionEvent::PlayersUpdated {
            players: self.roster.players().to_vec(),
        });
    }

    /// Load the saved roster for the current server, creating an empty file
    /// on first contact.
    ///
    /// An unreadable file is left untouched for the rest of the session.
    pub fn init_roster(&mut self) -> Result<(), RosterError> {
        self.roster.clear();
        self.roster_readonly = false;
        let Some(path) = self.roster_path.clone() else {
            return Ok(());
        };

        if !path.exists() {
            info!("Creating roster file {}", path.display());
            return Roster::new().save(&path);
        }

        self.roster = match Roster::load(&path) {
            Ok(roster) => roster,
            Err(err) => {
                self.roster_readonly = true;
                warn!("Roster file {} is unreadable, not saving over it", path.display());
                self.events.notify(
                    Notification::error("Failed to load player list")
                        .with_message(err.to_string())
                        .with_path(path.display().to_string()),
                );
                return Err(err);
            }
        };
        debug!("Loaded {} players from {}", self.roster.len(), path.display());
        self.emit_roster();
        Ok(())
    }

    /// Poll the online list and merge it into the cache.
    /// Emits a roster event only when presence actually changed.
    pub async fn refresh_roster(&mut self) -> Result<(), RosterError> {
        let reply = self.round_trip(LIST_PLAYERS_COMMAND).await?;
        let online = parse_online_players(&reply);

        if self.roster.reconcile(&online) {
            debug!(
                "Roster changed: {} online of {} known",
                self.roster.online_count(),
                self.roster.len()
            );
            self.emit_roster();
        } else {
            debug!("No roster changes");
        }
        Ok(())
    }

    pub fn persist_roster(&self) -> Result<(), RosterError> {
        match &self.roster_path {
            Some(path) if self.roster_readonly => {
                debug!("Skipping save of unreadable roster {}", path.display());
                Ok(())
            }
            Some(path) => self.roster.save(path),
            None => Ok(()),
        }
    }

    /// Track a player by hand; duplicates raise a warning
    pub fn add_player(&mut self, name: &str) -> bool {
        match self.roster.add_player(name) {
            Ok(()) => {
                self.events
                    .notify(Notification::success("Added player {name}").with_param("name", name.trim()));
                self.emit_roster();
                true
            }
            Err(err @ RosterError::Duplicate(_)) => {
                self.events.notify(
                    Notification::warning("Player {name} already exists")
                        .with_param("name", name.trim())
                        .with_message(err.to_string()),
                );
                false
            }
            Err(err) => {
                self.events
                    .notify(Notification::error("Could not add player").with_message(err.to_string()));
                false
            }
        }
    }
}
