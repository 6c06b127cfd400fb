//! Hyprland IPC plumbing.
//!
//! Hyprland exposes two Unix sockets per running instance, both under
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/`:
//!
//! | Socket          | Direction          | Used by                          |
//! |-----------------|--------------------|----------------------------------|
//! | `.socket.sock`  | request / response | [`control::HyprlandControl`]     |
//! | `.socket2.sock` | events, one-way    | [`listener::EventListener`]      |
//!
//! Nothing outside this module opens a socket directly.

pub mod codec;
pub mod control;
pub mod listener;

use crate::config::IpcConfig;
use std::path::PathBuf;

/// Errors produced while talking to the compositor.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Socket could not be created, connected, written or read.
    #[error("transport error: {context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: std::io::Error,
    },
    /// The peer answered with something we could not make sense of.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// A workspace, client or rule referenced by an event does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl IpcError {
    pub(crate) fn transport(context: impl Into<String>, source: std::io::Error) -> Self {
        IpcError::Transport {
            context: context.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for IpcError {
    fn from(e: serde_json::Error) -> Self {
        IpcError::Protocol(format!("json: {}", e))
    }
}

/// Resolved socket locations of one Hyprland instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketPaths {
    pub control: PathBuf,
    pub events: PathBuf,
}

impl SocketPaths {
    /// Build both paths from an instance directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            control: dir.join(".socket.sock"),
            events: dir.join(".socket2.sock"),
        }
    }

    /// Resolve the socket paths from the environment, honouring overrides
    /// in `config`.
    ///
    /// Returns `None` when no instance signature is known, i.e. Hyprland is
    /// not running in this session.
    pub fn resolve(config: &IpcConfig) -> Option<Self> {
        let signature = config
            .instance_signature
            .clone()
            .or_else(|| std::env::var("HYPRLAND_INSTANCE_SIGNATURE").ok())
            .filter(|s| !s.is_empty())?;
        let runtime_dir = config
            .runtime_dir
            .clone()
            .or_else(|| std::env::var("XDG_RUNTIME_DIR").ok())
            .unwrap_or_else(|| "/tmp".into());
        Some(Self::in_dir(
            PathBuf::from(runtime_dir).join("hypr").join(signature),
        ))
    }
}
