//! Runtime configuration for the notes core.
//!
//! # Invariants
//! - Slot keys are non-empty and distinct.
//! - The autosave delay is positive.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Slot holding the serialized note array.
pub const DEFAULT_NOTES_KEY: &str = "notes.v1";
/// Slot holding the serialized selected id (or `null`).
pub const DEFAULT_SELECTED_KEY: &str = "notes.selectedId.v1";
/// Idle time before buffered edits are committed.
pub const DEFAULT_AUTOSAVE_DELAY_MS: i64 = 350;
/// Maximum characters shown in a list-row preview.
pub const DEFAULT_PREVIEW_CHARS: usize = 120;

/// Configuration validation/parse failures.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    EmptyKey(&'static str),
    DuplicateKeys(String),
    NonPositiveDelay(i64),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid notes config: {err}"),
            Self::EmptyKey(field) => write!(f, "config field `{field}` cannot be empty"),
            Self::DuplicateKeys(key) => {
                write!(f, "notes and selection slots must differ, both are `{key}`")
            }
            Self::NonPositiveDelay(value) => {
                write!(f, "autosave_delay_ms must be positive, got {value}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Tunables for slot naming, autosave and list previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    pub notes_key: String,
    pub selected_key: String,
    pub autosave_delay_ms: i64,
    pub preview_chars: usize,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            notes_key: DEFAULT_NOTES_KEY.to_string(),
            selected_key: DEFAULT_SELECTED_KEY.to_string(),
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl NotesConfig {
    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notes_key.trim().is_empty() {
            return Err(ConfigError::EmptyKey("notes_key"));
        }
        if self.selected_key.trim().is_empty() {
            return Err(ConfigError::EmptyKey("selected_key"));
        }
        if self.notes_key == self.selected_key {
            return Err(ConfigError::DuplicateKeys(self.notes_key.clone()));
        }
        if self.autosave_delay_ms <= 0 {
            return Err(ConfigError::NonPositiveDelay(self.autosave_delay_ms));
        }
        Ok(())
    }
}
