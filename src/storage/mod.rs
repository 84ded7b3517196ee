//! Application data directory and JSON file helpers.

pub mod credentials;
pub mod presets;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::rcon::Credentials;

pub use credentials::CredentialStore;
pub use presets::{ItemRecord, ServerMessage};

const APP_DIR_NAME: &str = "rcon-admin";
const ROSTER_FILE_NAME: &str = "players.json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Could not locate the user configuration directory")]
    NoConfigDir,
    #[error("Credential encryption error: {0}")]
    Crypto(String),
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        StorageError::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Layout of the on-disk data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<user config dir>/rcon-admin`
    pub fn from_system() -> Result<Self, StorageError> {
        dirs::config_dir()
            .map(|dir| Self::new(dir.join(APP_DIR_NAME)))
            .ok_or(StorageError::NoConfigDir)
    }

    /// Explicit directory when configured, system default otherwise
    pub fn resolve(data_dir: Option<&Path>) -> Result<Self, StorageError> {
        match data_dir {
            Some(dir) => Ok(Self::new(dir)),
            None => Self::from_system(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn saved_options_dir(&self) -> PathBuf {
        self.root.join("savedoptions")
    }

    pub fn saved_items_dir(&self) -> PathBuf {
        self.root.join("saveditems")
    }

    pub fn saved_messages_dir(&self) -> PathBuf {
        self.root.join("savedmessages")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.root.join("credentials.json")
    }

    pub fn server_dir(&self, credentials: &Credentials) -> PathBuf {
        self.root.join(credentials.server_key())
    }

    pub fn roster_file(&self, credentials: &Credentials) -> PathBuf {
        self.server_dir(credentials).join(ROSTER_FILE_NAME)
    }

    /// Create the fixed sub-directories
    pub fn ensure(&self) -> Result<(), StorageError> {
        for dir in [
            self.root.clone(),
            self.logs_dir(),
            self.saved_options_dir(),
            self.saved_items_dir(),
            self.saved_messages_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        }
        Ok(())
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let content = std::fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| StorageError::json(path, e))
}

/// Pretty-print `value` to `path`, creating parent directories as needed
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }
    let content = serde_json::to_string_pretty(value).map_err(|e| StorageError::json(path, e))?;
    std::fs::write(path, content).map_err(|e| StorageError::io(path, e))
}
