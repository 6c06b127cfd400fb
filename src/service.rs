//! The public face of the crate: lifecycle, event pumping and activation.
//!
//! ```ignore
//! let mut service = WorkspaceService::from_config(&config.ipc);
//! service.start()?;
//! let changes = service.subscribe();
//! loop {
//!     service.process_pending();
//!     // read service.collection(), react to `changes` …
//! }
//! ```
//!
//! All methods must be called from the thread that owns the service.  The
//! only other thread is the event listener, which communicates exclusively
//! through the [`PendingEvent`] channel.

use crate::collection::{CollectionEvent, WorkspaceCollection};
use crate::config::IpcConfig;
use crate::dispatch::{Dispatcher, PendingEvent};
use crate::ipc::control::HyprlandControl;
use crate::ipc::listener::EventListener;
use crate::ipc::{IpcError, SocketPaths};
use crate::reconciler::Reconciler;
use crate::traits::ControlChannel;
use crate::workspace::Workspace;
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// No compositor session; the collection stays empty forever.
    Disabled,
    /// Constructed, [`start`](WorkspaceService::start) not called yet.
    Idle,
    Running,
    Stopped,
}

pub struct WorkspaceService<C: ControlChannel> {
    reconciler: Option<Reconciler<C>>,
    /// Returned by [`collection`](WorkspaceService::collection) when disabled.
    empty: WorkspaceCollection,
    events_path: Option<PathBuf>,
    chunk_size: usize,
    events: Option<mpsc::Receiver<PendingEvent>>,
    listener: Option<EventListener>,
    state: ServiceState,
}

impl WorkspaceService<HyprlandControl> {
    /// Locate the running Hyprland instance and prepare a service for it.
    ///
    /// Without an instance signature the service is
    /// [`Disabled`](ServiceState::Disabled).
    pub fn from_config(config: &IpcConfig) -> Self {
        match SocketPaths::resolve(config) {
            Some(paths) => {
                debug!("hyprland sockets: {:?}", paths);
                Self::new(
                    HyprlandControl::new(&paths.control),
                    Some(paths.events),
                    config.event_chunk_size,
                )
            }
            None => {
                warn!("HYPRLAND_INSTANCE_SIGNATURE not set, workspace service disabled");
                Self::disabled()
            }
        }
    }
}

impl<C: ControlChannel> WorkspaceService<C> {
    /// A service talking through `control`, listening on `events_path` once
    /// started.  With `events_path == None` only the initial refresh runs.
    pub fn new(control: C, events_path: Option<PathBuf>, chunk_size: usize) -> Self {
        Self {
            reconciler: Some(Reconciler::new(control)),
            empty: WorkspaceCollection::new(),
            events_path,
            chunk_size,
            events: None,
            listener: None,
            state: ServiceState::Idle,
        }
    }

    pub fn disabled() -> Self {
        Self {
            reconciler: None,
            empty: WorkspaceCollection::new(),
            events_path: None,
            chunk_size: 0,
            events: None,
            listener: None,
            state: ServiceState::Disabled,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// The workspace list.  Empty while disabled.
    pub fn collection(&self) -> &WorkspaceCollection {
        match &self.reconciler {
            Some(r) => r.collection(),
            None => &self.empty,
        }
    }

    pub fn subscribe(&self) -> mpsc::Receiver<CollectionEvent> {
        self.collection().subscribe()
    }

    /// Populate the collection and connect the event listener.
    ///
    /// A failing initial refresh is logged and the service keeps running;
    /// the next event that triggers a refresh may recover.  Failing to
    /// connect the event socket is returned.
    pub fn start(&mut self) -> Result<(), IpcError> {
        if self.state != ServiceState::Idle {
            return Ok(());
        }
        let Some(reconciler) = self.reconciler.as_mut() else {
            return Ok(());
        };
        if let Err(e) = reconciler.full_refresh() {
            error!("initial workspace refresh failed: {}", e);
        }
        if let Some(path) = &self.events_path {
            let (dispatcher, rx) = Dispatcher::channel();
            self.listener = Some(EventListener::start(path, self.chunk_size, dispatcher)?);
            self.events = Some(rx);
        }
        info!("workspace service running ({} workspaces)", self.collection().len());
        self.state = ServiceState::Running;
        Ok(())
    }

    /// Handle every event queued so far without blocking.  Returns how many
    /// were handled.
    pub fn process_pending(&mut self) -> usize {
        let (Some(rx), Some(reconciler)) = (&self.events, self.reconciler.as_mut()) else {
            return 0;
        };
        let mut handled = 0;
        for event in rx.try_iter() {
            reconciler.handle(&event);
            handled += 1;
        }
        handled
    }

    /// Block up to `timeout` for the next event, then handle it together
    /// with anything queued behind it.
    ///
    /// Returns `false` once the listener has gone away and nothing more will
    /// arrive.
    pub fn wait_and_process(&mut self, timeout: Duration) -> bool {
        let (Some(rx), Some(reconciler)) = (&self.events, self.reconciler.as_mut()) else {
            return false;
        };
        match rx.recv_timeout(timeout) {
            Ok(event) => {
                reconciler.handle(&event);
                for event in rx.try_iter() {
                    reconciler.handle(&event);
                }
                true
            }
            Err(mpsc::RecvTimeoutError::Timeout) => true,
            Err(mpsc::RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Switch to (or toggle) `workspace`.
    ///
    /// A no-op when `workspace` is no longer the collection's current entry
    /// (destroyed, re-created or replaced by a refresh since it was read) or
    /// the service is not running.  Transport failures are logged.
    pub fn activate(&self, workspace: &Workspace) {
        if self.state != ServiceState::Running {
            debug!("activate {}: service not running", workspace.label());
            return;
        }
        let Some(reconciler) = &self.reconciler else {
            return;
        };
        if !reconciler.collection().is_attached(workspace) {
            debug!("activate {}: workspace is detached", workspace.label());
            return;
        }
        let args = workspace.activation_args();
        info!("activating workspace: dispatch {}", args);
        if let Err(e) = reconciler.control().dispatch(&args) {
            error!("failed to activate workspace {}: {}", workspace.label(), e);
        }
    }

    /// Cancel the listener, wait for it, then drop the remaining state.
    pub fn stop(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            listener.stop();
        }
        self.events = None;
        if let Some(reconciler) = self.reconciler.as_mut() {
            reconciler.detach_all();
        }
        if self.state != ServiceState::Disabled {
            self.state = ServiceState::Stopped;
        }
    }
}

impl<C: ControlChannel> Drop for WorkspaceService<C> {
    fn drop(&mut self) {
        self.stop();
    }
}
