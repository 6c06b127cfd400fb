//! The workspace entity, id parsing, presentation order and activation
//! commands.
//!
//! Hyprland ids follow a few conventions this module encodes:
//!
//! * positive ids are ordinary numbered workspaces,
//! * negative ids are named workspaces or named special workspaces,
//! * [`ANONYMOUS_SPECIAL_ID`] (`-99`) is the plain `special` workspace.

use std::cmp::Ordering;
use std::fmt;

/// Id Hyprland assigns to the unnamed special workspace.
pub const ANONYMOUS_SPECIAL_ID: i64 = -99;

/// Parse a workspace id as it appears in event payloads and rules.
///
/// `"special"` maps to [`ANONYMOUS_SPECIAL_ID`]; anything that is not a
/// base-10 integer maps to `0`, which no real workspace uses.
pub fn parse_id(s: &str) -> i64 {
    let s = s.trim();
    if s == "special" {
        ANONYMOUS_SPECIAL_ID
    } else {
        s.parse().unwrap_or(0)
    }
}

/// Split a raw compositor name into `(display_name, is_special)`.
///
/// `special:term` → `("term", true)`, `name:code` → `("code", false)`,
/// `special` → `("special", true)`, `3` → `("3", false)`.
pub fn display_name(raw: &str) -> (&str, bool) {
    let special = raw.starts_with("special");
    let name = raw
        .strip_prefix("special:")
        .or_else(|| raw.strip_prefix("name:"))
        .unwrap_or(raw);
    (name, special)
}

/// Hyprland occasionally reports a doubled prefix for special workspaces;
/// such events refer to nothing real.
pub fn is_bogus_name(raw: &str) -> bool {
    raw.starts_with("special:special:")
}

/// Fields of a [`Workspace`] that can change after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkspaceField {
    Name,
    Monitor,
    Active,
    Visible,
    Special,
    Persistent,
    Urgent,
}

/// A compositor workspace as seen by this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    id: i64,
    /// Which insertion into the collection this entry belongs to.  `0` means
    /// the entry was never attached.
    generation: u64,
    pub name: Option<String>,
    pub monitor: Option<String>,
    pub active: bool,
    pub visible: bool,
    pub special: bool,
    pub persistent: bool,
    pub urgent: bool,
}

impl Workspace {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            generation: 0,
            name: None,
            monitor: None,
            active: false,
            visible: false,
            special: id == ANONYMOUS_SPECIAL_ID,
            persistent: false,
            urgent: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_monitor(mut self, monitor: impl Into<String>) -> Self {
        self.monitor = Some(monitor.into());
        self
    }

    pub fn special(mut self, special: bool) -> Self {
        self.special = special;
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn stamp(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn is_anonymous_special(&self) -> bool {
        self.id == ANONYMOUS_SPECIAL_ID
    }

    /// Ordinary numbered workspace.
    pub fn is_numbered(&self) -> bool {
        self.id >= 0
    }

    /// Negative id that is not a special workspace.
    pub fn is_named(&self) -> bool {
        self.id < 0 && !self.special
    }

    /// Label to show the user: the name if set, the id otherwise.
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }

    /// The dispatcher arguments that switch to (or toggle) this workspace.
    pub fn activation_args(&self) -> String {
        let name = self.name.as_deref().unwrap_or("");
        if self.is_anonymous_special() {
            "togglespecialworkspace".to_string()
        } else if self.special {
            format!("togglespecialworkspace {}", name)
        } else if self.id < 0 {
            format!("workspace name:{}", name)
        } else {
            format!("workspace {}", self.id)
        }
    }

    /// Rank of the group this workspace is presented in:
    /// numbered, then named, then special.
    fn group(&self) -> u8 {
        if self.is_numbered() {
            0
        } else if self.special {
            2
        } else {
            1
        }
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())?;
        let mut flags = Vec::new();
        if self.active {
            flags.push("active");
        }
        if self.visible {
            flags.push("visible");
        }
        if self.special {
            flags.push("special");
        }
        if self.persistent {
            flags.push("persistent");
        }
        if self.urgent {
            flags.push("urgent");
        }
        if let Some(monitor) = &self.monitor {
            write!(f, " @ {}", monitor)?;
        }
        if !flags.is_empty() {
            write!(f, " [{}]", flags.join(","))?;
        }
        Ok(())
    }
}

/// Presentation order.
///
/// Numbered workspaces ascending by id, then named workspaces by name, then
/// special workspaces by name with the anonymous one last.
pub fn presentation_cmp(a: &Workspace, b: &Workspace) -> Ordering {
    a.group().cmp(&b.group()).then_with(|| match (a.group(), b.group()) {
        (0, 0) => a.id.cmp(&b.id),
        _ => a
            .is_anonymous_special()
            .cmp(&b.is_anonymous_special())
            .then_with(|| {
                let an = a.name.as_deref().unwrap_or("");
                let bn = b.name.as_deref().unwrap_or("");
                an.cmp(bn)
            })
            .then_with(|| a.id.cmp(&b.id)),
    })
}
