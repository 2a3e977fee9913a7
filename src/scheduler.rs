//! Coalescable-message scheduler: dedupes bursty per-object events with a
//! per-(kind, target) countdown on a single 100 ms tick (§4.I). Grounded on
//! `original_source/accessibility/internal/bridge/bridge-base.cpp`'s
//! coalescable message table.

use std::collections::HashMap;

use crate::address::Address;

const TICK_MS: u64 = 100;

/// Coalescable message kinds (§3). STATE_CHANGED and PROPERTY_CHANGED carry
/// a detail tag (which state/property) to disambiguate entries sharing the
/// same target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    BoundsChanged,
    SetOffset,
    PostRender,
    StateChanged(u32),
    PropertyChanged(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    kind: MessageKind,
    target: Address,
}

type Action = Box<dyn FnMut() + 'static>;

struct Entry {
    countdown_base: u32,
    current: u32,
    pending: Option<Action>,
}

/// A single 100 ms tick drives a table of pending deferred actions (§4.I).
/// The scheduler itself does not own a thread or timer; [`Scheduler::tick`]
/// is expected to be called by the platform shim's repeating timer (§4.J)
/// once the table is non-empty.
#[derive(Default)]
pub struct Scheduler {
    entries: HashMap<Key, Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while any entry remains; callers use this to decide whether the
    /// 100 ms timer needs to keep running.
    pub fn is_active(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Quantizes `delay_ms` to 100 ms ticks, floored at 0 (§4.I).
    fn quantize(delay_ms: u32) -> u32 {
        ((delay_ms as f64 / 10.0).ceil()).max(0.0) as u32
    }

    /// Upserts the entry for `(kind, target)`. New entries execute `action`
    /// immediately (leading edge) before entering cooldown; existing
    /// entries have their pending action replaced and their cooldown reset
    /// (trailing-edge refresh) without re-executing.
    pub fn add(&mut self, kind: MessageKind, target: Address, delay_ms: u32, mut action: Action) {
        let countdown_base = Self::quantize(delay_ms);
        let key = Key { kind, target };

        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.current = countdown_base;
                entry.pending = Some(action);
            }
            None => {
                action();
                self.entries.insert(
                    key,
                    Entry { countdown_base, current: countdown_base, pending: None },
                );
            }
        }
    }

    /// Advances every entry by one 100 ms tick. On reaching zero: if a
    /// pending action exists, runs it and resets the countdown; otherwise
    /// the entry is dropped.
    pub fn tick(&mut self) {
        let mut to_remove = Vec::new();
        let mut to_reset = Vec::new();

        for (key, entry) in self.entries.iter_mut() {
            if entry.current == 0 {
                continue;
            }
            entry.current -= 1;
            if entry.current == 0 {
                if let Some(mut action) = entry.pending.take() {
                    action();
                    to_reset.push(key.clone());
                } else {
                    to_remove.push(key.clone());
                }
            }
        }

        for key in to_reset {
            if let Some(entry) = self.entries.get_mut(&key) {
                entry.current = entry.countdown_base;
            }
        }
        for key in to_remove {
            self.entries.remove(&key);
        }
    }

    pub fn tick_interval_ms() -> u64 {
        TICK_MS
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn addr(id: u32) -> Address {
        Address::for_object_id(":1.1", id)
    }

    #[test]
    fn first_add_executes_immediately() {
        let mut sched = Scheduler::new();
        let ran = Rc::new(RefCell::new(false));
        let ran2 = ran.clone();
        sched.add(MessageKind::BoundsChanged, addr(1), 200, Box::new(move || *ran2.borrow_mut() = true));
        assert!(*ran.borrow());
        assert_eq!(sched.entry_count(), 1);
    }

    #[test]
    fn burst_within_cooldown_coalesces_to_one_more_invocation() {
        let mut sched = Scheduler::new();
        let count = Rc::new(RefCell::new(0));
        let c1 = count.clone();
        sched.add(MessageKind::BoundsChanged, addr(1), 200, Box::new(move || *c1.borrow_mut() += 1));
        assert_eq!(*count.borrow(), 1);

        // Two more arrivals within the cooldown window just refresh pending action.
        let c2 = count.clone();
        sched.add(MessageKind::BoundsChanged, addr(1), 200, Box::new(move || *c2.borrow_mut() += 1));
        let c3 = count.clone();
        sched.add(MessageKind::BoundsChanged, addr(1), 200, Box::new(move || *c3.borrow_mut() += 1));
        assert_eq!(*count.borrow(), 1, "refreshes must not re-execute immediately");

        for _ in 0..20 {
            sched.tick();
        }
        assert_eq!(*count.borrow(), 2, "exactly one further invocation after cooldown");
    }

    #[test]
    fn entry_is_dropped_once_table_drains() {
        let mut sched = Scheduler::new();
        sched.add(MessageKind::PostRender, addr(2), 100, Box::new(|| {}));
        assert!(sched.is_active());
        for _ in 0..20 {
            sched.tick();
        }
        assert!(!sched.is_active());
    }

    #[test]
    fn distinct_kinds_for_same_target_do_not_collide() {
        let mut sched = Scheduler::new();
        sched.add(MessageKind::BoundsChanged, addr(1), 100, Box::new(|| {}));
        sched.add(MessageKind::SetOffset, addr(1), 100, Box::new(|| {}));
        assert_eq!(sched.entry_count(), 2);
    }
}
