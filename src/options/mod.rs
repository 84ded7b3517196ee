//! Server options snapshot
//!
//! A typed copy of every tunable server option, parsed from the `showoptions`
//! reply and diffed against an edited copy to find what needs pushing.

pub mod fields;
pub mod synchronizer;

use ordered_float::OrderedFloat;
use ring::digest::{SHA256, digest};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, trace};

use crate::storage::{StorageError, read_json, write_json};
use fields::{OPTION_FIELDS, field_index};

/// Token the server uses for boolean true, compared case-insensitively.
const TRUTHY: &str = "true";
const OPTION_LINE_PREFIX: &str = "* ";

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("Option {name} has invalid {kind} value {value:?}")]
    Parse {
        name: String,
        kind: OptionKind,
        value: String,
    },
    #[error("Unknown option: {0}")]
    UnknownOption(String),
    #[error("Option {name} expects a {expected} value")]
    KindMismatch { name: String, expected: OptionKind },
    #[error("Options have not been loaded from the server yet")]
    NotSynced,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Failed to query options: {0}")]
    Query(#[from] crate::rcon::RconError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    Bool,
    Int,
    Float,
    Text,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionKind::Bool => "boolean",
            OptionKind::Int => "integer",
            OptionKind::Float => "float",
            OptionKind::Text => "string",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
}

impl OptionValue {
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionValue::Bool(_) => OptionKind::Bool,
            OptionValue::Int(_) => OptionKind::Int,
            OptionValue::Float(_) => OptionKind::Float,
            OptionValue::Text(_) => OptionKind::Text,
        }
    }

    pub fn default_for(kind: OptionKind) -> Self {
        match kind {
            OptionKind::Bool => OptionValue::Bool(false),
            OptionKind::Int => OptionValue::Int(0),
            OptionKind::Float => OptionValue::Float(OrderedFloat(0.0)),
            OptionKind::Text => OptionValue::Text(String::new()),
        }
    }

    /// Parse server text for a field of `kind`
    pub fn parse(name: &str, kind: OptionKind, raw: &str) -> Result<Self, OptionsError> {
        let invalid = || OptionsError::Parse {
            name: name.to_string(),
            kind,
            value: raw.to_string(),
        };

        match kind {
            OptionKind::Bool => Ok(OptionValue::Bool(raw.eq_ignore_ascii_case(TRUTHY))),
            OptionKind::Int => raw.parse::<i64>().map(OptionValue::Int).map_err(|_| invalid()),
            OptionKind::Float => {
                let value = raw.parse::<f64>().map_err(|_| invalid())?;
                if !value.is_finite() {
                    return Err(invalid());
                }
                Ok(OptionValue::Float(OrderedFloat(value)))
            }
            OptionKind::Text => Ok(OptionValue::Text(raw.to_string())),
        }
    }

    /// Convert to `kind`, widening integers to floats
    fn coerce(self, name: &str, kind: OptionKind) -> Result<Self, OptionsError> {
        match (self, kind) {
            (value, kind) if value.kind() == kind => Ok(value),
            (OptionValue::Int(i), OptionKind::Float) => Ok(OptionValue::Float(OrderedFloat(i as f64))),
            _ => Err(OptionsError::KindMismatch {
                name: name.to_string(),
                expected: kind,
            }),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(i) => write!(f, "{}", i),
            OptionValue::Float(v) => write!(f, "{}", v),
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}

/// One value per entry of [`OPTION_FIELDS`], positionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    values: Vec<OptionValue>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            values: OPTION_FIELDS
                .iter()
                .map(|(_, kind)| OptionValue::default_for(*kind))
                .collect(),
        }
    }
}

impl ServerOptions {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        field_index(name).map(|idx| &self.values[idx])
    }

    pub fn set(&mut self, name: &str, value: OptionValue) -> Result<(), OptionsError> {
        let idx = field_index(name).ok_or_else(|| OptionsError::UnknownOption(name.to_string()))?;
        self.values[idx] = value.coerce(name, OPTION_FIELDS[idx].1)?;
        Ok(())
    }

    /// Set a field from user-typed text
    pub fn set_raw(&mut self, name: &str, raw: &str) -> Result<(), OptionsError> {
        let idx = field_index(name).ok_or_else(|| OptionsError::UnknownOption(name.to_string()))?;
        let kind = OPTION_FIELDS[idx].1;
        let raw = raw.trim();
        if kind == OptionKind::Bool
            && !raw.eq_ignore_ascii_case("true")
            && !raw.eq_ignore_ascii_case("false")
        {
            return Err(OptionsError::Parse {
                name: name.to_string(),
                kind,
                value: raw.to_string(),
            });
        }
        self.values[idx] = OptionValue::parse(name, kind, raw)?;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &OptionValue)> + '_ {
        OPTION_FIELDS
            .iter()
            .map(|(name, _)| *name)
            .zip(self.values.iter())
    }

    /// Build a snapshot from a `showoptions` reply.
    ///
    /// Fields absent from the reply keep their defaults, unknown names are
    /// skipped and any malformed numeric value fails the whole parse.
    pub fn parse(reply: &str) -> Result<Self, OptionsError> {
        let mut options = Self::default();

        for line in reply.lines() {
            let Some(entry) = line.trim().strip_prefix(OPTION_LINE_PREFIX) else {
                continue;
            };
            let Some((name, raw)) = entry.split_once('=') else {
                trace!("Skipping malformed option line: {}", line);
                continue;
            };
            let (name, raw) = (name.trim(), raw.trim());

            match field_index(name) {
                Some(idx) => {
                    options.values[idx] = OptionValue::parse(name, OPTION_FIELDS[idx].1, raw)?;
                }
                None => debug!("Ignoring unknown option {}", name),
            }
        }

        Ok(options)
    }

    /// Fields whose value in `desired` differs from `self`
    pub fn diff(&self, desired: &ServerOptions) -> Vec<OptionChange> {
        OPTION_FIELDS
            .iter()
            .zip(self.values.iter().zip(desired.values.iter()))
            .filter(|(_, (current, wanted))| current != wanted)
            .map(|((name, _), (_, wanted))| OptionChange {
                name: *name,
                value: wanted.clone(),
            })
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<(), OptionsError> {
        write_json(path, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        Ok(read_json(path)?)
    }
}

impl Serialize for ServerOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ServerOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = HashMap::<String, OptionValue>::deserialize(deserializer)?;
        let mut options = ServerOptions::default();
        for (name, value) in entries {
            match options.set(&name, value) {
                Ok(()) => {}
                Err(OptionsError::UnknownOption(name)) => debug!("Ignoring unknown option {}", name),
                Err(err) => return Err(D::Error::custom(err)),
            }
        }
        Ok(options)
    }
}

/// A single field to push to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionChange {
    pub name: &'static str,
    pub value: OptionValue,
}

impl OptionChange {
    fn value_text(&self) -> String {
        self.value.to_string().replace('"', "'")
    }

    pub fn command(&self) -> String {
        format!("changeoption {} \"{}\"", self.name, self.value_text())
    }

    /// The server echoes `Option : Name is now : Value`; floats may come back
    /// with one decimal place.
    pub fn echo_matches(&self, reply: &str) -> bool {
        let reply = reply.trim_end();
        if reply == format!("Option : {} is now : {}", self.name, self.value_text()) {
            return true;
        }

        match self.value {
            OptionValue::Float(v) => reply == format!("Option : {} is now : {:.1}", self.name, v.0),
            _ => false,
        }
    }
}

/// Hex SHA-256 of a raw reply
pub fn reply_digest(reply: &str) -> String {
    digest(&SHA256, reply.as_bytes())
        .as_ref()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Last synced snapshot and the digest of the reply it came from.
#[derive(Debug, Clone, Default)]
pub struct OptionsCache {
    pub snapshot: Option<ServerOptions>,
    pub last_hash: Option<String>,
}

impl OptionsCache {
    pub fn clear(&mut self) {
        self.snapshot = None;
        self.last_hash = None;
    }
}
