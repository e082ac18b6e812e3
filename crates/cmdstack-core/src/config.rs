//! Manager configuration
//!
//! ```toml
//! debug_mode = "verbose"
//! first_merge_id = 100
//! ```

use crate::command::NO_MERGE_ID;
use crate::errors::{CommandError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Stack dump emitted after every do/undo/redo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugMode {
    #[default]
    NoDebug,
    /// Command names only
    Debug,
    /// Names plus argument descriptions
    Verbose,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    pub debug_mode: DebugMode,
    /// Value the merge id counter starts from; the first id handed out is
    /// one above it.
    pub first_merge_id: i32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            debug_mode: DebugMode::NoDebug,
            first_merge_id: NO_MERGE_ID,
        }
    }
}

impl ManagerConfig {
    /// # Errors
    ///
    /// Fails with `ERR_CONFIG` on malformed TOML, unknown keys, or a
    /// counter start below the never-merge sentinel.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ManagerConfig = toml::from_str(text).map_err(|e| CommandError::Config {
            message: e.to_string(),
        })?;
        if config.first_merge_id < NO_MERGE_ID {
            return Err(CommandError::Config {
                message: format!(
                    "first_merge_id must be at least {}, got {}",
                    NO_MERGE_ID, config.first_merge_id
                ),
            }
            .into());
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// Fails with `ERR_CONFIG` if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CommandError::Config {
            message: format!("cannot read '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&text)
    }
}
