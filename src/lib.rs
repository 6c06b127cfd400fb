//! **hyprws**: a live model of Hyprland's workspaces.
//!
//! The crate keeps an ordered, observable list of workspaces in sync with
//! the compositor and lets callers switch to one of them.
//!
//! # Architecture
//!
//! ```text
//! socket2 ──► ipc::listener (own thread) ──► dispatch ──mpsc──►
//!     service (owning thread) ──► reconciler ──► collection ──► observers
//!                                     │
//!                                     └──► ipc::control (j/workspaces, …)
//! ```
//!
//! * [`ipc`] owns both Hyprland sockets and the wire format.
//! * [`dispatch`] turns decoded records into [`dispatch::PendingEvent`]s and
//!   is the only hand-off between the listener thread and the owner.
//! * [`reconciler`] applies events using control-socket queries.
//! * [`collection`] and [`workspace`] hold the state and its presentation
//!   order.
//! * [`service`] ties the lifecycle together (`start` / `stop`).
//!
//! [`traits::ControlChannel`] is the seam that lets the reconciliation
//! logic run without a compositor.

pub mod collection;
pub mod config;
pub mod dispatch;
pub mod ipc;
pub mod reconciler;
pub mod service;
pub mod traits;
pub mod workspace;
