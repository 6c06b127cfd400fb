//! [`ControlChannel`] backed by Hyprland's request socket (`.socket.sock`).
//!
//! Every request opens a fresh connection: Hyprland answers exactly one
//! command per connection and then hangs up.

use super::IpcError;
use crate::traits::ControlChannel;
use log::debug;
use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

/// Short-lived-connection client for the control socket.
#[derive(Debug, Clone)]
pub struct HyprlandControl {
    path: PathBuf,
}

impl HyprlandControl {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ControlChannel for HyprlandControl {
    fn send(&self, request: &str) -> Result<Vec<u8>, IpcError> {
        debug!("ipc request: {}", request);
        let mut stream = UnixStream::connect(&self.path)
            .map_err(|e| IpcError::transport(format!("connect to {}", self.path.display()), e))?;

        stream
            .write_all(request.as_bytes())
            .map_err(|e| IpcError::transport("write", e))?;
        // Half-close: the request has no terminator of its own.
        if let Err(e) = stream.shutdown(Shutdown::Write) {
            debug!("ipc half-close failed: {}", e);
        }

        let mut response = Vec::new();
        stream
            .read_to_end(&mut response)
            .map_err(|e| IpcError::transport("read", e))?;
        Ok(response)
    }
}
