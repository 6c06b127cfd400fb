//! Routes decoded socket2 records to the owning thread.
//!
//! The listener thread never touches workspace state.  It hands each record
//! to a [`Dispatcher`], which looks the event name up in a static table
//! ([`EventKind::from_name`]) and forwards matching events as
//! [`PendingEvent`]s over an [`mpsc`] channel.  The owner drains that channel
//! and runs the [`Reconciler`](crate::reconciler::Reconciler) for each one.

use crate::ipc::codec::parse_event_record;
use log::{debug, warn};
use std::fmt;
use std::sync::mpsc;

/// The socket2 events this service reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `createworkspacev2>>ID,NAME`
    Created,
    /// `destroyworkspacev2>>ID,NAME`
    Destroyed,
    /// `moveworkspacev2>>ID,NAME,MONITOR`
    Moved,
    /// `renameworkspace>>ID,NEWNAME`
    Renamed,
    /// `workspace>>NAME`
    Activated,
    /// `activespecial>>NAME,MONITOR`
    SpecialActivated,
    /// `focusedmon>>MONITOR,WORKSPACE`
    MonitorFocused,
    /// `monitoradded>>MONITOR`
    MonitorAdded,
    /// `monitorremoved>>MONITOR`
    MonitorRemoved,
    /// `urgent>>ADDRESS`
    Urgent,
    /// `configreloaded>>`
    ConfigReloaded,
}

impl EventKind {
    /// Look up an event by its exact wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "createworkspacev2" => Some(EventKind::Created),
            "destroyworkspacev2" => Some(EventKind::Destroyed),
            "moveworkspacev2" => Some(EventKind::Moved),
            "renameworkspace" => Some(EventKind::Renamed),
            "workspace" => Some(EventKind::Activated),
            "activespecial" => Some(EventKind::SpecialActivated),
            "focusedmon" => Some(EventKind::MonitorFocused),
            "monitoradded" => Some(EventKind::MonitorAdded),
            "monitorremoved" => Some(EventKind::MonitorRemoved),
            "urgent" => Some(EventKind::Urgent),
            "configreloaded" => Some(EventKind::ConfigReloaded),
            _ => None,
        }
    }

    /// The wire name, inverse of [`from_name`](EventKind::from_name).
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Created => "createworkspacev2",
            EventKind::Destroyed => "destroyworkspacev2",
            EventKind::Moved => "moveworkspacev2",
            EventKind::Renamed => "renameworkspace",
            EventKind::Activated => "workspace",
            EventKind::SpecialActivated => "activespecial",
            EventKind::MonitorFocused => "focusedmon",
            EventKind::MonitorAdded => "monitoradded",
            EventKind::MonitorRemoved => "monitorremoved",
            EventKind::Urgent => "urgent",
            EventKind::ConfigReloaded => "configreloaded",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One event waiting to be handled on the owning thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvent {
    pub kind: EventKind,
    pub payload: String,
}

impl PendingEvent {
    pub fn new(kind: EventKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }
}

/// What happened to a record handed to [`Dispatcher::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// Scheduled on the owning thread.
    Scheduled,
    /// Not an event we handle.
    Ignored,
    /// No `>>` delimiter; dropped.
    Malformed,
    /// The owning side hung up; the caller should stop producing.
    Closed,
}

/// Sending half of the listener → owner hand-off.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sink: mpsc::Sender<PendingEvent>,
}

impl Dispatcher {
    pub fn new(sink: mpsc::Sender<PendingEvent>) -> Self {
        Self { sink }
    }

    /// Build a dispatcher together with the receiver the owner drains.
    pub fn channel() -> (Self, mpsc::Receiver<PendingEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }

    /// Decode one complete record and schedule it if it is of interest.
    pub fn dispatch(&self, record: &str) -> Dispatched {
        let Some((name, payload)) = parse_event_record(record) else {
            warn!("dropping malformed event record: {:?}", record);
            return Dispatched::Malformed;
        };
        let Some(kind) = EventKind::from_name(name) else {
            return Dispatched::Ignored;
        };
        debug!("event {}>>{}", kind, payload);
        match self.sink.send(PendingEvent::new(kind, payload)) {
            Ok(()) => Dispatched::Scheduled,
            Err(_) => Dispatched::Closed,
        }
    }
}
