//! Application configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/hyprws/config.json`.  Every field is
//! optional; a missing file or an empty `{}` yields the compiled-in
//! defaults.
//!
//! # Example
//!
//! ```json
//! {
//!   "ipc": {
//!     "event_chunk_size": 4096,
//!     "instance_signature": "v0.45.0_1731000000_1234",
//!     "runtime_dir": "/run/user/1000"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Compositor connection settings.
    #[serde(default)]
    pub ipc: IpcConfig,
}

/// Compositor connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    /// Bytes requested per read from the event socket.
    pub event_chunk_size: usize,
    /// Use this instance instead of `$HYPRLAND_INSTANCE_SIGNATURE`.
    pub instance_signature: Option<String>,
    /// Use this directory instead of `$XDG_RUNTIME_DIR`.
    pub runtime_dir: Option<String>,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            event_chunk_size: 1024,
            instance_signature: None,
            runtime_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "ipc": {
                "event_chunk_size": 4096,
                "instance_signature": "abc",
                "runtime_dir": "/run/user/1000"
            }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.ipc.event_chunk_size, 4096);
        assert_eq!(cfg.ipc.instance_signature.as_deref(), Some("abc"));
        assert_eq!(cfg.ipc.runtime_dir.as_deref(), Some("/run/user/1000"));
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.ipc, IpcConfig::default());
        assert_eq!(cfg.ipc.event_chunk_size, 1024);
    }

    #[test]
    fn deserialize_partial_ipc() {
        let cfg: Config = serde_json::from_str(r#"{ "ipc": { "runtime_dir": "/tmp/x" } }"#).unwrap();
        assert_eq!(cfg.ipc.runtime_dir.as_deref(), Some("/tmp/x"));
        assert_eq!(cfg.ipc.event_chunk_size, 1024);
        assert!(cfg.ipc.instance_signature.is_none());
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "ipc": {}, "panel": { "height": 24 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("hyprws-no-such-{}.json", std::process::id()));
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().starts_with("config error: failed to read"));
    }
}
