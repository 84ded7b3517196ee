//! Saved item lists and broadcast messages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::{StorageError, read_json, write_json};

/// Lines the in-game chat shows for one broadcast
pub const MAX_MESSAGE_LINES: usize = 15;

const WHITE: &str = "1,1,1";

/// One entry of a saved item list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub item_id: String,
    pub count: u32,
}

impl ItemRecord {
    pub fn new(item_id: impl Into<String>, count: u32) -> Self {
        Self {
            item_id: item_id.into(),
            count,
        }
    }
}

pub fn load_items(path: &Path) -> Result<Vec<ItemRecord>, StorageError> {
    read_json(path)
}

pub fn save_items(path: &Path, items: &[ItemRecord]) -> Result<(), StorageError> {
    write_json(path, items)
}

/// A multi-line server message with optional per-line colors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    pub message: String,
    /// Line index to `r,g,b` with components in 0..=255
    #[serde(default)]
    pub line_colors: BTreeMap<usize, String>,
}

impl ServerMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line_colors: BTreeMap::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, StorageError> {
        read_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        write_json(path, self)
    }

    /// Nothing left to show once quotes and backslashes are dropped
    pub fn is_blank(&self) -> bool {
        self.message
            .chars()
            .all(|c| c.is_whitespace() || matches!(c, '\\' | '"'))
    }

    /// Chat markup for `servermsg`.
    ///
    /// Quotes and backslashes are dropped, lines past the chat limit are cut
    /// and every non-blank line gets an `<RGB:r,g,b>` prefix in 0..1 floats.
    /// Lines are joined with `<LINE>`.
    pub fn render(&self) -> String {
        let cleaned: String = self
            .message
            .chars()
            .filter(|c| !matches!(c, '\\' | '"'))
            .collect();

        cleaned
            .lines()
            .take(MAX_MESSAGE_LINES)
            .enumerate()
            .map(|(index, line)| {
                if line.trim().is_empty() {
                    return line.to_string();
                }
                let color = self
                    .line_colors
                    .get(&index)
                    .and_then(|rgb| float_color(rgb))
                    .unwrap_or_else(|| WHITE.to_string());
                format!("<RGB:{}>{}", color, line)
            })
            .collect::<Vec<_>>()
            .join("<LINE>")
    }
}

/// `255,128,0` -> `1.00,0.50,0.00`; None unless exactly three byte values
fn float_color(rgb: &str) -> Option<String> {
    let parts = rgb
        .split(',')
        .map(|part| part.trim().parse::<u8>().ok())
        .collect::<Option<Vec<_>>>()?;
    if parts.len() != 3 {
        return None;
    }
    Some(
        parts
            .iter()
            .map(|c| format!("{:.2}", f64::from(*c) / 255.0))
            .collect::<Vec<_>>()
            .join(","),
    )
}
