use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Base ids and switches the hook shims use to route host events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Opcodes at or above this value are custom instructions.
    pub first_custom_opcode: i32,
    /// Script menu ids at or above this value are custom menus.
    pub first_custom_menu: i32,
    /// Special process ids at or above this value never reach the host.
    pub special_process_threshold: u32,
    /// Keyboard mode shown for custom menus; the unused partner nickname
    /// keyboard is repurposed for them.
    pub keyboard_fallback_mode: i32,
    /// Keep log entries in memory in addition to forwarding them.
    pub journal: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            first_custom_opcode: 0x1000,
            first_custom_menu: 80,
            special_process_threshold: 100,
            keyboard_fallback_mode: 3,
            journal: true,
        }
    }
}

impl RuntimeConfig {
    /// Loads a JSON config, falling back to defaults when no path is given.
    /// Fields missing from the file keep their default values.
    pub fn from_json_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::RuntimeConfig;
    use crate::error::ConfigError;

    #[test]
    fn missing_path_yields_defaults() {
        let config = RuntimeConfig::from_json_file(None).expect("defaults");
        assert_eq!(config.first_custom_opcode, 0x1000);
        assert_eq!(config.first_custom_menu, 80);
        assert_eq!(config.special_process_threshold, 100);
        assert_eq!(config.keyboard_fallback_mode, 3);
        assert!(config.journal);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("hooks.json");
        fs::write(&path, r#"{ "first_custom_menu": 90, "journal": false }"#).expect("write");

        let config = RuntimeConfig::from_json_file(Some(&path)).expect("parsed");
        assert_eq!(config.first_custom_menu, 90);
        assert!(!config.journal);
        assert_eq!(config.first_custom_opcode, 0x1000);
    }

    #[test]
    fn unreadable_and_malformed_files_are_reported() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            RuntimeConfig::from_json_file(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ first_custom_menu: ").expect("write");
        assert!(matches!(
            RuntimeConfig::from_json_file(Some(&broken)),
            Err(ConfigError::Parse { .. })
        ));
    }
}
