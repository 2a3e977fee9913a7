//! Server-side object registry: maps local accessibles to remote-visible
//! paths, dispatches incoming method calls, and tracks top-level windows
//! and default labels (§4.C). Grounded on
//! `original_source/accessibility/internal/bridge/bridge-base.cpp`'s
//! `BridgeBase::Find`, `AddTopLevelWindow`/`RemoveTopLevelWindow`, and
//! `RegisterDefaultLabel`/`GetDefaultLabel`.

use std::collections::HashMap;

use crate::address::{Address, ACCESSIBLE_PATH_PREFIX, ROOT_PATH};
use crate::error::{Error, Result};
use crate::state::State;

/// A locally-owned accessible: the registry's unit of bookkeeping. Real
/// capability data (name, role, states, ...) lives with the owning
/// component (toolkit glue); the registry only tracks tree shape and
/// visibility, matching `ApplicationAccessible`'s invariants (§3).
#[derive(Debug, Clone, Default)]
pub struct ObjectRecord {
    pub hidden: bool,
    pub parent: Option<u32>,
    pub children: Vec<u32>,
    pub is_top_level: bool,
}

/// Maps integer object-ids to owned accessible records, resolves incoming
/// object-paths, and tracks the application's top-level windows and
/// default-label table (§4.C).
pub struct Registry {
    bus_name: String,
    objects: HashMap<u32, ObjectRecord>,
    next_id: u32,
    application_children: Vec<u32>,
    include_hidden: bool,
    default_labels: Vec<(u32, u32)>,
}

impl Registry {
    pub fn new(bus_name: impl Into<String>) -> Self {
        Self {
            bus_name: bus_name.into(),
            objects: HashMap::new(),
            next_id: 1,
            application_children: Vec::new(),
            include_hidden: false,
            default_labels: Vec::new(),
        }
    }

    pub fn set_include_hidden(&mut self, include_hidden: bool) {
        self.include_hidden = include_hidden;
    }

    pub fn include_hidden(&self) -> bool {
        self.include_hidden
    }

    /// Allocates and inserts a new object record, returning its address.
    pub fn insert(&mut self, record: ObjectRecord) -> Address {
        let id = self.next_id;
        self.next_id += 1;
        self.objects.insert(id, record);
        Address::for_object_id(&self.bus_name, id)
    }

    pub fn remove(&mut self, address: &Address) {
        if let Some(id) = address.object_id() {
            self.objects.remove(&id);
            self.application_children.retain(|c| *c != id);
        }
    }

    /// Resolves an incoming object-path by stripping the fixed prefix and
    /// parsing the remainder as the id; `root` addresses the application
    /// object. Fails with `UnknownObject` when hidden and the global
    /// include-hidden flag is false (§4.C).
    pub fn find_by_path(&self, path: &str) -> Result<u32> {
        if path == "root" || path == ROOT_PATH {
            return Ok(0);
        }
        let id: u32 = path
            .strip_prefix(ACCESSIBLE_PATH_PREFIX)
            .and_then(|rest| rest.parse().ok())
            .ok_or_else(|| Error::UnknownObject(path.to_string()))?;

        let record = self.objects.get(&id).ok_or_else(|| Error::UnknownObject(path.to_string()))?;
        if record.hidden && !self.include_hidden {
            return Err(Error::UnknownObject(path.to_string()));
        }
        Ok(id)
    }

    pub fn find_by_address(&self, address: &Address) -> Result<u32> {
        self.find_by_path(&address.path)
    }

    pub fn get(&self, id: u32) -> Option<&ObjectRecord> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut ObjectRecord> {
        self.objects.get_mut(&id)
    }

    /// Appends `window` to the application's children if not already
    /// present and marks it as a root-level node.
    pub fn add_top_level(&mut self, window: u32) {
        if self.application_children.contains(&window) {
            return;
        }
        self.application_children.push(window);
        if let Some(record) = self.objects.get_mut(&window) {
            record.is_top_level = true;
        }
    }

    /// Removes `window` from the application's children, returning `true`
    /// (the caller should then emit `WINDOW::DESTROY`) iff it was present.
    pub fn remove_top_level(&mut self, window: u32) -> bool {
        let before = self.application_children.len();
        self.application_children.retain(|c| *c != window);
        self.application_children.len() != before
    }

    pub fn top_level_windows(&self) -> &[u32] {
        &self.application_children
    }

    /// Application SHOWING invariant: equals the logical-or of top-level
    /// windows' SHOWING states (§3, §8).
    pub fn application_showing(&self, states_of: impl Fn(u32) -> Option<crate::state::StateSet>) -> bool {
        self.application_children
            .iter()
            .filter_map(|id| states_of(*id))
            .any(|states| states.contains(State::Showing))
    }

    /// Walks up `accessible`'s ancestor chain to find the window root: the
    /// topmost ancestor whose parent is the application (§4.C).
    fn window_root_of(&self, accessible: u32) -> Option<u32> {
        let mut current = accessible;
        loop {
            match self.objects.get(&current).and_then(|r| r.parent) {
                Some(parent) if self.objects.contains_key(&parent) => current = parent,
                _ => return Some(current),
            }
        }
    }

    /// Registers `accessible` as the default label for its window root.
    /// Re-registration under the same window is idempotent; registering
    /// under a different window overwrites silently (§9 open question:
    /// preserved verbatim from the source, including its own acknowledged
    /// TODO about this ambiguity).
    pub fn register_default_label(&mut self, accessible: u32) {
        let Some(window_root) = self.window_root_of(accessible) else { return };
        match self.default_labels.iter_mut().find(|(_, a)| *a == accessible) {
            Some((root, _)) if *root != window_root => *root = window_root,
            Some(_) => {}
            None => self.default_labels.push((window_root, accessible)),
        }
    }

    pub fn unregister_default_label(&mut self, accessible: u32) {
        self.default_labels.retain(|(_, a)| *a != accessible);
    }

    /// Returns the most recently registered label for `root`, else `root`
    /// itself (§4.C).
    pub fn default_label_for(&self, root: u32) -> u32 {
        self.default_labels
            .iter()
            .rev()
            .find(|(r, _)| *r == root)
            .map(|(_, label)| *label)
            .unwrap_or(root)
    }
}
