//! Player roster cache
//!
//! Keeps every player ever seen on the server, merges each online-player poll
//! into it and persists it per server between sessions.

pub mod reconciler;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::storage::{StorageError, read_json, write_json};

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("Player name must not be empty")]
    EmptyName,
    #[error("Player {0} is already in the roster")]
    Duplicate(String),
    #[error("Unknown access level: {0}")]
    UnknownAccessLevel(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Failed to query online players: {0}")]
    Query(#[from] crate::rcon::RconError),
}

/// Server-side permission tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Unknown,
    Player,
    Observer,
    Gm,
    Overseer,
    Moderator,
    Admin,
}

impl AccessLevel {
    pub const ASSIGNABLE: [AccessLevel; 6] = [
        AccessLevel::Player,
        AccessLevel::Observer,
        AccessLevel::Gm,
        AccessLevel::Overseer,
        AccessLevel::Moderator,
        AccessLevel::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Unknown => "unknown",
            AccessLevel::Player => "player",
            AccessLevel::Observer => "observer",
            AccessLevel::Gm => "gm",
            AccessLevel::Overseer => "overseer",
            AccessLevel::Moderator => "moderator",
            AccessLevel::Admin => "admin",
        }
    }

    /// Anything above a regular player
    pub fn is_elevated(&self) -> bool {
        *self > AccessLevel::Player
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ASSIGNABLE
            .into_iter()
            .chain(std::iter::once(AccessLevel::Unknown))
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| RosterError::UnknownAccessLevel(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub online: bool,
    pub banned: bool,
    #[serde(default)]
    pub access_level: AccessLevel,
    #[serde(default)]
    pub elevated: bool,
}

impl Player {
    /// Offline, not banned, access level unknown
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            online: false,
            banned: false,
            access_level: AccessLevel::Unknown,
            elevated: false,
        }
    }

    fn sighted(name: &str) -> Self {
        Self {
            online: true,
            ..Self::new(name)
        }
    }

    fn presence(&self) -> (&str, bool, bool) {
        (&self.name, self.online, self.banned)
    }
}

/// Cached roster mutation triggered by a successful command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterUpdate {
    SetBanned(bool),
    SetAccessLevel(AccessLevel),
    MarkOffline,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_players(players: Vec<Player>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn online_count(&self) -> usize {
        self.players.iter().filter(|p| p.online).count()
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }

    pub fn add_player(&mut self, name: &str) -> Result<(), RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::EmptyName);
        }
        if self.get(name).is_some() {
            return Err(RosterError::Duplicate(name.to_string()));
        }
        self.players.push(Player::new(name));
        Ok(())
    }

    /// Merge a poll of online names into the cache.
    ///
    /// Known players keep their position, new names are appended in poll
    /// order. Returns whether name, online or banned state changed for anyone.
    pub fn reconcile(&mut self, online: &[String]) -> bool {
        let online_set: HashSet<&str> = online.iter().map(String::as_str).collect();

        let mut updated = Vec::with_capacity(self.players.len() + online.len());
        for player in &self.players {
            let mut player = player.clone();
            player.online = online_set.contains(player.name.as_str());
            if player.online {
                player.banned = false;
            }
            player.elevated = player.access_level.is_elevated();
            updated.push(player);
        }

        let mut appended: HashSet<&str> = HashSet::new();
        for name in online {
            if self.get(name).is_none() && appended.insert(name.as_str()) {
                updated.push(Player::sighted(name));
            }
        }

        let changed = updated.len() != self.players.len()
            || updated
                .iter()
                .zip(&self.players)
                .any(|(new, old)| new.presence() != old.presence());

        self.players = updated;
        changed
    }

    /// Apply a command side effect to a cached player.
    /// Returns whether the player existed and changed.
    pub fn apply_update(&mut self, name: &str, update: RosterUpdate) -> bool {
        let Some(player) = self.players.iter_mut().find(|p| p.name == name) else {
            return false;
        };
        let before = player.clone();

        match update {
            RosterUpdate::SetBanned(banned) => {
                player.banned = banned;
                if banned {
                    player.online = false;
                }
            }
            RosterUpdate::SetAccessLevel(level) => {
                player.access_level = level;
                player.elevated = level.is_elevated();
            }
            RosterUpdate::MarkOffline => player.online = false,
        }

        *player != before
    }

    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let mut roster: Roster = read_json(path)?;
        for player in &mut roster.players {
            player.elevated = player.access_level.is_elevated();
        }
        Ok(roster)
    }

    pub fn save(&self, path: &Path) -> Result<(), RosterError> {
        write_json(path, self)?;
        Ok(())
    }
}

/// Names from a `players` reply: a header line followed by marker-prefixed names.
pub fn parse_online_players(reply: &str) -> Vec<String> {
    reply
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| line.chars().count() > 1)
        .filter_map(|line| {
            let mut chars = line.chars();
            chars.next();
            let name = chars.as_str().trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}
