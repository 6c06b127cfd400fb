//! Applies compositor events to the [`WorkspaceCollection`].
//!
//! Events only say *that* something changed; the authoritative details are
//! fetched from the control socket:
//!
//! | Query              | Used for                                         |
//! |--------------------|--------------------------------------------------|
//! | `j/workspaces`     | live workspaces (id, name, monitor)              |
//! | `j/workspacerules` | which workspaces are persistent                  |
//! | `j/monitors`       | active / visible workspace per output            |
//! | `j/clients`        | which workspace an urgent window lives on        |
//!
//! Every handler runs on the owning thread.  A failed query abandons the
//! handler and is logged; nothing is retried.

use crate::collection::{CollectionEvent, WorkspaceCollection};
use crate::dispatch::{EventKind, PendingEvent};
use crate::ipc::codec::{json_request, ValueExt};
use crate::ipc::IpcError;
use crate::traits::ControlChannel;
use crate::workspace::{
    display_name, is_bogus_name, parse_id, Workspace, WorkspaceField, ANONYMOUS_SPECIAL_ID,
};
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::Value;

//  Minimal serde structs for the JSON we care about

/// Subset of an entry of `j/workspaces`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WorkspaceJson {
    id: i64,
    name: String,
    monitor: String,
}

/// Subset of an entry of `j/workspacerules`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WorkspaceRuleJson {
    workspace_string: String,
    monitor: String,
    persistent: bool,
}

impl WorkspaceRuleJson {
    /// Does this rule describe the workspace `id` / `name`?
    ///
    /// Numeric rules match by id; `name:`/`special:` rules match by display
    /// name since the compositor picks their ids.  `special:term` and
    /// `name:term` are different workspaces.
    fn matches(&self, id: i64, name: Option<&str>, special: bool) -> bool {
        let rule_id = parse_id(&self.workspace_string);
        if rule_id != 0 {
            return rule_id == id;
        }
        let (rule_name, rule_special) = display_name(&self.workspace_string);
        rule_special == special && name == Some(rule_name)
    }
}

/// Which workspaces the outputs currently show.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FocusState {
    /// Sorted ids shown on any output.
    visible: Vec<i64>,
    active: i64,
    active_special: i64,
}

impl FocusState {
    /// Derive the state from a `j/monitors` reply.
    pub fn from_monitors(monitors: &Value) -> Self {
        let mut state = FocusState::default();
        for monitor in monitors.as_array().into_iter().flatten() {
            let active = workspace_ref_id(monitor, "activeWorkspace");
            let special = workspace_ref_id(monitor, "specialWorkspace");
            state.visible.extend([active, special].into_iter().filter(|&id| id != 0));
            if monitor.get_bool("focused", false) {
                state.active = active;
                state.active_special = special;
            }
        }
        state.visible.sort_unstable();
        state.visible.dedup();
        state
    }

    pub fn is_active(&self, id: i64) -> bool {
        id != 0 && (id == self.active || id == self.active_special)
    }

    pub fn is_visible(&self, id: i64) -> bool {
        self.visible.binary_search(&id).is_ok()
    }
}

fn workspace_ref_id(monitor: &Value, field: &str) -> i64 {
    monitor
        .get_path(&[field, "id"])
        .and_then(Value::as_i64)
        .unwrap_or(0)
}

/// Build a fresh entry from a `j/workspaces` record.
fn workspace_from_record(record: &WorkspaceJson, persistent: bool) -> Workspace {
    let (name, special) = display_name(&record.name);
    let mut ws = Workspace::new(record.id)
        .with_name(name)
        .special(special || record.id == ANONYMOUS_SPECIAL_ID)
        .persistent(persistent);
    if !record.monitor.is_empty() {
        ws = ws.with_monitor(record.monitor.as_str());
    }
    ws
}

/// Split `ID,REST` payloads.
fn split_id(payload: &str) -> (i64, &str) {
    match payload.split_once(',') {
        Some((id, rest)) => (parse_id(id), rest),
        None => (parse_id(payload), ""),
    }
}

/// Owns the collection and keeps it in line with the compositor.
pub struct Reconciler<C: ControlChannel> {
    control: C,
    collection: WorkspaceCollection,
}

impl<C: ControlChannel> Reconciler<C> {
    pub fn new(control: C) -> Self {
        Self {
            control,
            collection: WorkspaceCollection::new(),
        }
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn collection(&self) -> &WorkspaceCollection {
        &self.collection
    }

    /// Run the handler for one event, logging any failure.
    pub fn handle(&mut self, event: &PendingEvent) {
        let payload = event.payload.as_str();
        let result = match event.kind {
            EventKind::Created => self.on_created(payload),
            EventKind::Destroyed => self.on_destroyed(payload),
            EventKind::Moved => self.on_moved(payload),
            EventKind::Renamed => self.on_renamed(payload),
            EventKind::Activated | EventKind::SpecialActivated | EventKind::MonitorFocused => {
                self.recompute_flags()
            }
            EventKind::MonitorAdded | EventKind::MonitorRemoved => {
                self.collection.emit(CollectionEvent::MonitorsChanged);
                self.recompute_flags()
            }
            EventKind::Urgent => self.on_urgent(payload),
            EventKind::ConfigReloaded => self.full_refresh(),
        };
        match result {
            Ok(()) => {}
            Err(e @ IpcError::NotFound(_)) => warn!("{} handler: {}", event.kind, e),
            Err(e) => error!("{} handler failed: {}", event.kind, e),
        }
    }

    fn on_created(&mut self, payload: &str) -> Result<(), IpcError> {
        let (id, raw_name) = split_id(payload);
        if is_bogus_name(raw_name) {
            debug!("ignoring creation of bogus workspace {:?}", raw_name);
            return Ok(());
        }

        let live: Vec<WorkspaceJson> = self.control.query(&json_request("workspaces"))?;
        let record = live
            .iter()
            .find(|w| w.id == id)
            .ok_or_else(|| IpcError::NotFound(format!("created workspace {} is not live", id)))?;

        let rules: Vec<WorkspaceRuleJson> = self.control.query(&json_request("workspacerules"))?;
        let (name, special) = display_name(&record.name);
        let special = special || id == ANONYMOUS_SPECIAL_ID;
        let persistent = rules
            .iter()
            .find(|r| r.matches(id, Some(name), special))
            .is_some_and(|r| r.persistent);

        self.merge(record, persistent);
        self.recompute_flags()
    }

    /// Add a workspace, or only refresh its persistent flag if it exists.
    fn merge(&mut self, record: &WorkspaceJson, persistent: bool) {
        if self.collection.contains(record.id) {
            self.collection
                .set_flag(record.id, WorkspaceField::Persistent, persistent);
        } else {
            let ws = workspace_from_record(record, persistent);
            info!("workspace added: {}", ws);
            self.collection.insert(ws);
        }
    }

    fn on_destroyed(&mut self, payload: &str) -> Result<(), IpcError> {
        let (id, raw_name) = split_id(payload);
        if is_bogus_name(raw_name) {
            debug!("ignoring destruction of bogus workspace {:?}", raw_name);
            return Ok(());
        }
        if let Some(ws) = self.collection.remove(id) {
            info!("workspace removed: {}", ws.label());
        }
        Ok(())
    }

    fn on_moved(&mut self, payload: &str) -> Result<(), IpcError> {
        let (id, rest) = split_id(payload);
        // The monitor name never contains a comma; the workspace name may.
        let monitor = rest.rsplit_once(',').map_or(rest, |(_, m)| m);
        if self.collection.set_monitor(id, Some(monitor.to_string())) {
            debug!("workspace {} moved to {}", id, monitor);
            self.collection.emit(CollectionEvent::MonitorsChanged);
        }
        self.recompute_flags()
    }

    fn on_renamed(&mut self, payload: &str) -> Result<(), IpcError> {
        let (id, new_name) = split_id(payload);
        if self.collection.set_name(id, Some(new_name.to_string())) {
            debug!("workspace {} renamed to {:?}", id, new_name);
        }
        Ok(())
    }

    fn on_urgent(&mut self, address: &str) -> Result<(), IpcError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(IpcError::Protocol("urgent event without address".into()));
        }
        let clients = self.control.send_structured(&json_request("clients"))?;
        let client = clients
            .as_array()
            .into_iter()
            .flatten()
            .find(|c| c.get_str("address", "").ends_with(address))
            .ok_or_else(|| IpcError::NotFound(format!("client {}", address)))?;
        let id = workspace_ref_id(client, "workspace");
        if !self.collection.contains(id) {
            return Err(IpcError::NotFound(format!("workspace {} of client {}", id, address)));
        }
        self.collection.set_flag(id, WorkspaceField::Urgent, true);
        Ok(())
    }

    /// Query the outputs and update every workspace's active/visible flags.
    pub fn recompute_flags(&mut self) -> Result<(), IpcError> {
        let monitors = self.control.send_structured(&json_request("monitors"))?;
        let focus = FocusState::from_monitors(&monitors);
        let ids: Vec<i64> = self.collection.iter().map(Workspace::id).collect();
        for id in ids {
            let active = focus.is_active(id);
            self.collection.set_flag(id, WorkspaceField::Active, active);
            self.collection
                .set_flag(id, WorkspaceField::Visible, focus.is_visible(id));
            if active {
                self.collection.set_flag(id, WorkspaceField::Urgent, false);
            }
        }
        Ok(())
    }

    /// Drop every workspace; activation of any of them becomes a no-op.
    pub(crate) fn detach_all(&mut self) {
        if !self.collection.is_empty() {
            self.collection.replace_all(Vec::new());
        }
    }

    /// Rebuild the collection from scratch and publish it in one batch.
    ///
    /// On failure the previous contents are left untouched.
    pub fn full_refresh(&mut self) -> Result<(), IpcError> {
        let live: Vec<WorkspaceJson> = self.control.query(&json_request("workspaces"))?;
        let rules: Vec<WorkspaceRuleJson> = self.control.query(&json_request("workspacerules"))?;
        let monitors = self.control.send_structured(&json_request("monitors"))?;

        let mut next: Vec<Workspace> = Vec::with_capacity(live.len());
        for record in &live {
            if next.iter().any(|w| w.id() == record.id) {
                continue;
            }
            next.push(workspace_from_record(record, false));
        }

        for rule in rules.iter().filter(|r| r.persistent) {
            if let Some(ws) = next
                .iter_mut()
                .find(|w| rule.matches(w.id(), w.name.as_deref(), w.special))
            {
                ws.persistent = true;
                continue;
            }
            let id = parse_id(&rule.workspace_string);
            if id == 0 {
                debug!(
                    "persistent rule {:?} has no live workspace yet, skipping",
                    rule.workspace_string
                );
                continue;
            }
            let synthetic = WorkspaceJson {
                id,
                name: rule.workspace_string.clone(),
                monitor: rule.monitor.clone(),
            };
            next.push(workspace_from_record(&synthetic, true));
        }

        let focus = FocusState::from_monitors(&monitors);
        for ws in &mut next {
            ws.active = focus.is_active(ws.id());
            ws.visible = focus.is_visible(ws.id());
            ws.urgent = false;
        }

        let dropped = self.collection.replace_all(next);
        debug!(
            "full refresh: {} workspace(s), {} detached",
            self.collection.len(),
            dropped.len()
        );
        Ok(())
    }
}
