//! Background reader for Hyprland's event socket (`.socket2.sock`).
//!
//! [`EventListener::start`] connects once and spawns a thread that reads the
//! socket in fixed-size chunks, reassembles records with a
//! [`LineDecoder`], and hands each one to a [`Dispatcher`].  The thread never
//! touches workspace state itself.
//!
//! The connection is not re-established if it drops.
//!
//! # Shutdown
//!
//! [`EventListener::stop`] raises a cancellation flag, shuts the socket down
//! (which wakes the blocked `read`), and joins the thread.  Once `stop`
//! returns, no further [`PendingEvent`](crate::dispatch::PendingEvent)s are
//! produced.

use super::codec::LineDecoder;
use super::IpcError;
use crate::dispatch::{Dispatched, Dispatcher};
use log::{debug, error, info, warn};
use std::io::{ErrorKind, Read};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Why the read loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The compositor closed the connection.
    Eof,
    /// A read failed.
    Error,
    /// [`EventListener::stop`] was called.
    Cancelled,
    /// The dispatcher's receiving side is gone.
    Closed,
}

/// Handle to the running listener thread.
pub struct EventListener {
    stream: UnixStream,
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<LoopExit>>,
}

impl EventListener {
    /// Connect to the event socket at `path` and start the reader thread.
    pub fn start(
        path: impl AsRef<Path>,
        chunk_size: usize,
        dispatcher: Dispatcher,
    ) -> Result<Self, IpcError> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path)
            .map_err(|e| IpcError::transport(format!("connect to {}", path.display()), e))?;
        let reader = stream
            .try_clone()
            .map_err(|e| IpcError::transport("clone event socket", e))?;
        info!("event listener connected to {}", path.display());

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let handle = std::thread::Builder::new()
            .name("hyprws-events".into())
            .spawn(move || read_loop(reader, chunk_size.max(1), &dispatcher, &flag))
            .map_err(|e| IpcError::transport("spawn listener thread", e))?;

        Ok(Self {
            stream,
            cancelled,
            handle: Some(handle),
        })
    }

    /// `true` while the reader thread is still alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the blocking read and wait for the thread to exit.
    ///
    /// Idempotent.  Returns how the loop ended, or `None` if the listener was
    /// already stopped.
    pub fn stop(&mut self) -> Option<LoopExit> {
        let handle = self.handle.take()?;
        self.cancelled.store(true, Ordering::SeqCst);
        let _ = self.stream.shutdown(Shutdown::Both);
        match handle.join() {
            Ok(exit) => {
                debug!("event listener stopped ({:?})", exit);
                Some(exit)
            }
            Err(_) => {
                error!("event listener thread panicked");
                None
            }
        }
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read `source` until EOF, error, cancellation or a closed dispatcher.
///
/// Generic over [`Read`] so the chunking logic can be driven without a
/// socket.
pub(crate) fn read_loop(
    mut source: impl Read,
    chunk_size: usize,
    dispatcher: &Dispatcher,
    cancelled: &AtomicBool,
) -> LoopExit {
    let mut decoder = LineDecoder::new();
    let mut buf = vec![0u8; chunk_size];

    loop {
        let n = match source.read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                if cancelled.load(Ordering::SeqCst) {
                    return LoopExit::Cancelled;
                }
                error!("event socket read error: {}", e);
                return LoopExit::Error;
            }
        };
        if cancelled.load(Ordering::SeqCst) {
            return LoopExit::Cancelled;
        }
        if n == 0 {
            warn!("event socket closed, workspace updates stop here");
            return LoopExit::Eof;
        }

        for record in decoder.feed(&buf[..n]) {
            if dispatcher.dispatch(&record) == Dispatched::Closed {
                info!("event consumer gone, listener exiting");
                return LoopExit::Closed;
            }
        }
    }
}
