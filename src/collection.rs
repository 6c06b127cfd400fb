//! The observable workspace list.
//!
//! Collaborators get read access and a stream of [`CollectionEvent`]s via
//! [`WorkspaceCollection::subscribe`].  Mutation is `pub(crate)`: only the
//! [`Reconciler`](crate::reconciler::Reconciler) changes the list, always on
//! the owning thread.
//!
//! Every setter publishes an `Updated` event only when the value actually
//! changes, so observers can redraw a single field.

use crate::workspace::{presentation_cmp, Workspace, WorkspaceField};
use std::cell::{Cell, RefCell};
use std::sync::mpsc;

/// Change notification for collection observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    Inserted(i64),
    Removed(i64),
    Updated { id: i64, field: WorkspaceField },
    /// The whole contents were replaced in one batch.
    Reset,
    /// A workspace moved between outputs; monitor-keyed filters must
    /// re-evaluate.
    MonitorsChanged,
}

#[derive(Debug, Default)]
pub struct WorkspaceCollection {
    items: Vec<Workspace>,
    order: RefCell<Vec<i64>>,
    order_dirty: Cell<bool>,
    subscribers: RefCell<Vec<mpsc::Sender<CollectionEvent>>>,
    last_generation: u64,
}

impl WorkspaceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer.  Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> mpsc::Receiver<CollectionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Workspace> {
        self.items.iter().find(|w| w.id() == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }

    /// `true` if `ws` is the entry currently held for its id, not a copy of
    /// one that was removed or replaced since.
    pub fn is_attached(&self, ws: &Workspace) -> bool {
        ws.generation() != 0
            && self
                .get(ws.id())
                .is_some_and(|live| live.generation() == ws.generation())
    }

    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    /// Find a workspace by its display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Workspace> {
        self.items
            .iter()
            .find(|w| w.name.as_deref() == Some(name))
    }

    /// Workspaces in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Workspace> {
        self.items.iter()
    }

    /// Workspaces in presentation order.
    ///
    /// The order is recomputed only after membership or a name changed.
    pub fn ordered(&self) -> Vec<&Workspace> {
        if self.order_dirty.replace(false) {
            let mut sorted: Vec<&Workspace> = self.items.iter().collect();
            sorted.sort_by(|a, b| presentation_cmp(a, b));
            *self.order.borrow_mut() = sorted.iter().map(|w| w.id()).collect();
        }
        self.order
            .borrow()
            .iter()
            .filter_map(|&id| self.get(id))
            .collect()
    }

    pub(crate) fn emit(&self, event: CollectionEvent) {
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub(crate) fn mark_order_dirty(&self) {
        self.order_dirty.set(true);
    }

    /// Add a workspace.  Returns `false` (and changes nothing) if the id is
    /// already present.
    pub(crate) fn insert(&mut self, mut ws: Workspace) -> bool {
        let id = ws.id();
        if self.contains(id) {
            return false;
        }
        ws.stamp(self.next_generation());
        self.items.push(ws);
        self.mark_order_dirty();
        self.emit(CollectionEvent::Inserted(id));
        true
    }

    pub(crate) fn remove(&mut self, id: i64) -> Option<Workspace> {
        let index = self.items.iter().position(|w| w.id() == id)?;
        let ws = self.items.remove(index);
        self.mark_order_dirty();
        self.emit(CollectionEvent::Removed(id));
        Some(ws)
    }

    /// Swap in a fully built set.  Returns the previous contents.
    pub(crate) fn replace_all(&mut self, mut items: Vec<Workspace>) -> Vec<Workspace> {
        for ws in &mut items {
            ws.stamp(self.next_generation());
        }
        let old = std::mem::replace(&mut self.items, items);
        self.mark_order_dirty();
        self.emit(CollectionEvent::Reset);
        old
    }

    pub(crate) fn set_name(&mut self, id: i64, name: Option<String>) -> bool {
        let Some(ws) = self.items.iter_mut().find(|w| w.id() == id) else {
            return false;
        };
        if ws.name == name {
            return false;
        }
        ws.name = name;
        self.mark_order_dirty();
        self.emit(CollectionEvent::Updated {
            id,
            field: WorkspaceField::Name,
        });
        true
    }

    pub(crate) fn set_monitor(&mut self, id: i64, monitor: Option<String>) -> bool {
        let Some(ws) = self.items.iter_mut().find(|w| w.id() == id) else {
            return false;
        };
        if ws.monitor == monitor {
            return false;
        }
        ws.monitor = monitor;
        self.emit(CollectionEvent::Updated {
            id,
            field: WorkspaceField::Monitor,
        });
        true
    }

    /// Set one of the boolean flags.  `field` must be a flag, not
    /// `Name`/`Monitor`.
    pub(crate) fn set_flag(&mut self, id: i64, field: WorkspaceField, value: bool) -> bool {
        let Some(ws) = self.items.iter_mut().find(|w| w.id() == id) else {
            return false;
        };
        let slot = match field {
            WorkspaceField::Active => &mut ws.active,
            WorkspaceField::Visible => &mut ws.visible,
            WorkspaceField::Special => &mut ws.special,
            WorkspaceField::Persistent => &mut ws.persistent,
            WorkspaceField::Urgent => &mut ws.urgent,
            WorkspaceField::Name | WorkspaceField::Monitor => return false,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        if field == WorkspaceField::Special {
            self.mark_order_dirty();
        }
        self.emit(CollectionEvent::Updated { id, field });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> WorkspaceCollection {
        let mut c = WorkspaceCollection::new();
        c.insert(Workspace::new(2).with_name("2"));
        c.insert(Workspace::new(-1).with_name("b").special(true));
        c.insert(Workspace::new(1).with_name("1"));
        c
    }

    fn ids(c: &WorkspaceCollection) -> Vec<i64> {
        c.ordered().iter().map(|w| w.id()).collect()
    }

    #[test]
    fn ordered_view_follows_presentation_order() {
        let c = collection();
        assert_eq!(ids(&c), vec![1, 2, -1]);
    }

    #[test]
    fn duplicate_insert_rejected() {
        let mut c = collection();
        assert!(!c.insert(Workspace::new(1).with_name("other")));
        assert_eq!(c.len(), 3);
        assert_eq!(c.get(1).unwrap().name.as_deref(), Some("1"));
    }

    #[test]
    fn rename_reorders() {
        let mut c = collection();
        c.insert(Workspace::new(-3).with_name("c").special(true));
        assert_eq!(ids(&c), vec![1, 2, -1, -3]);
        c.set_name(-3, Some("a".into()));
        assert_eq!(ids(&c), vec![1, 2, -3, -1]);
    }

    #[test]
    fn observers_see_field_changes_only_when_values_change() {
        let mut c = collection();
        let rx = c.subscribe();
        assert!(c.set_flag(1, WorkspaceField::Active, true));
        assert!(!c.set_flag(1, WorkspaceField::Active, true));
        assert!(c.set_monitor(1, Some("DP-1".into())));
        assert!(!c.set_name(99, Some("x".into())));
        c.remove(2);
        let events: Vec<CollectionEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                CollectionEvent::Updated {
                    id: 1,
                    field: WorkspaceField::Active
                },
                CollectionEvent::Updated {
                    id: 1,
                    field: WorkspaceField::Monitor
                },
                CollectionEvent::Removed(2),
            ]
        );
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let mut c = collection();
        let rx = c.subscribe();
        drop(rx);
        c.insert(Workspace::new(5));
        assert!(c.subscribers.borrow().is_empty());
    }

    #[test]
    fn replace_all_emits_single_reset() {
        let mut c = collection();
        let rx = c.subscribe();
        let old = c.replace_all(vec![Workspace::new(9)]);
        assert_eq!(old.len(), 3);
        assert_eq!(ids(&c), vec![9]);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![CollectionEvent::Reset]);
    }

    #[test]
    fn reinserted_id_is_a_new_entry() {
        let mut c = collection();
        let old = c.get(2).cloned().unwrap();
        assert!(c.is_attached(&old));
        c.remove(2);
        assert!(!c.is_attached(&old));
        c.insert(Workspace::new(2).with_name("2"));
        assert!(c.contains(2));
        assert!(!c.is_attached(&old));
        assert!(c.is_attached(c.get(2).unwrap()));
    }

    #[test]
    fn replace_all_detaches_previous_entries() {
        let mut c = collection();
        let old = c.get(1).cloned().unwrap();
        c.replace_all(vec![Workspace::new(1).with_name("1")]);
        assert!(!c.is_attached(&old));
        assert!(c.is_attached(c.get(1).unwrap()));
    }

    #[test]
    fn never_inserted_workspace_is_not_attached() {
        let c = collection();
        assert!(!c.is_attached(&Workspace::new(1).with_name("1")));
    }

    #[test]
    fn find_by_name() {
        let c = collection();
        assert_eq!(c.find_by_name("b").map(Workspace::id), Some(-1));
        assert!(c.find_by_name("nope").is_none());
    }
}
