//! Shared types for the remote console transport.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Longest command body accepted by the transport, in bytes.
pub const MAX_COMMAND_LEN: usize = 1000;

/// Address and secret of a remote console endpoint.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "ip", alias = "host")]
    pub host: String,
    pub port: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        host: impl Into<String>,
        port: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            password: password.into(),
        }
    }

    /// All three fields are present
    pub fn is_complete(&self) -> bool {
        !self.host.trim().is_empty() && !self.port.trim().is_empty() && !self.password.is_empty()
    }

    /// `host:port` dial address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host.trim(), self.port.trim())
    }

    /// Directory-safe key identifying the server, `host-port`
    pub fn server_key(&self) -> String {
        format!("{}-{}", self.host.trim(), self.port.trim())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RconError {
    #[error("RCON connection error: {0}")]
    Connection(String),
    #[error("RCON authentication rejected")]
    Authentication,
    #[error("Not connected to an RCON server")]
    NotConnected,
    #[error("Command is {len} bytes, limit is {limit}")]
    CommandTooLong { len: usize, limit: usize },
    #[error("RCON protocol error: {0}")]
    Protocol(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("RCON exchange timed out after {0:?}")]
    Timeout(Duration),
}

impl From<std::io::Error> for RconError {
    fn from(err: std::io::Error) -> Self {
        RconError::Io(err.to_string())
    }
}

/// Reject commands the transport would refuse to frame
pub fn check_command_len(command: &str) -> Result<(), RconError> {
    if command.len() > MAX_COMMAND_LEN {
        return Err(RconError::CommandTooLong {
            len: command.len(),
            limit: MAX_COMMAND_LEN,
        });
    }
    Ok(())
}
