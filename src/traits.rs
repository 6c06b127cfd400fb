//! The seam between the reconciliation logic and the compositor transport.
//!
//! [`ControlChannel`] abstracts the request/response socket so that the
//! [`Reconciler`](crate::reconciler::Reconciler) and
//! [`WorkspaceService`](crate::service::WorkspaceService) are not coupled to a
//! live Hyprland instance.  [`HyprlandControl`](crate::ipc::control::HyprlandControl)
//! is the real implementation; tests provide canned replies.

use crate::ipc::codec::{dispatch_request, parse_structured, parse_typed};
use crate::ipc::IpcError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A request/response channel to the compositor.
///
/// Only [`send`](ControlChannel::send) must be implemented; everything else
/// is layered on top of it.
pub trait ControlChannel {
    /// Send `request` and return the complete raw reply.
    fn send(&self, request: &str) -> Result<Vec<u8>, IpcError>;

    /// Send `request` and parse the reply as a JSON tree.
    fn send_structured(&self, request: &str) -> Result<Value, IpcError> {
        parse_structured(&self.send(request)?)
    }

    /// Send `request` and deserialize the reply into `T`.
    fn query<T: DeserializeOwned>(&self, request: &str) -> Result<T, IpcError>
    where
        Self: Sized,
    {
        parse_typed(&self.send(request)?)
    }

    /// Invoke a dispatcher and check for Hyprland's `ok` acknowledgement.
    fn dispatch(&self, args: &str) -> Result<(), IpcError> {
        let reply = self.send(&dispatch_request(args))?;
        let reply = String::from_utf8_lossy(&reply);
        if reply.trim() == "ok" {
            Ok(())
        } else {
            Err(IpcError::Protocol(format!(
                "dispatch {:?} rejected: {}",
                args,
                reply.trim()
            )))
        }
    }
}

impl<C: ControlChannel + ?Sized> ControlChannel for &C {
    fn send(&self, request: &str) -> Result<Vec<u8>, IpcError> {
        (**self).send(request)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory [`ControlChannel`] used across the crate's tests.

    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Replies with canned bytes per request and records every request.
    #[derive(Debug, Default)]
    pub struct MockControl {
        replies: RefCell<HashMap<String, Vec<u8>>>,
        pub log: RefCell<Vec<String>>,
    }

    impl MockControl {
        pub fn new() -> Self {
            Self::default()
        }

        /// Set (or replace) the reply for `request`.
        pub fn reply(&self, request: &str, body: impl Into<Vec<u8>>) {
            self.replies
                .borrow_mut()
                .insert(request.to_string(), body.into());
        }

        pub fn requests(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    impl ControlChannel for MockControl {
        fn send(&self, request: &str) -> Result<Vec<u8>, IpcError> {
            self.log.borrow_mut().push(request.to_string());
            if request.starts_with("dispatch ") {
                return Ok(b"ok".to_vec());
            }
            self.replies
                .borrow()
                .get(request)
                .cloned()
                .ok_or_else(|| {
                    IpcError::transport(
                        request,
                        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "no reply"),
                    )
                })
        }
    }
}
