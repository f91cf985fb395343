#![forbid(unsafe_code)]

//! Dialog stack for managing concurrently open overlays with proper z-ordering.
//!
//! The `DialogStack` keeps every open overlay (message dialogs, loading
//! indicators, modal window layers) in insertion order. The most recently
//! pushed entry is topmost and holds input focus.
//!
//! # Invariants
//!
//! - Z-order is strictly increasing: later entries are always on top.
//! - Insertion order is the only ordering key. Two entries pushed in the same
//!   event-loop turn are ordered by push call order.
//! - The slot counter behind z-indexes only grows; removed slots are never
//!   reused.
//! - A new entry's z-index is above every z-index handed out before it, even
//!   after `configure` lowers the base or the increment.
//! - Only the topmost entry is focused.
//! - The stack is mutated only through `push` and `remove`.
//!
//! # Failure Modes
//!
//! - `remove()` for an id that is not on the stack returns `false` (no panic).
//! - `z_index()` for an unknown id returns `None`.
//! - When the slot arithmetic overflows `u32`, the next z-index is one above
//!   the previous one. When that is exhausted too, the live entries are
//!   renumbered from the bottom and re-applied (logged at `warn`).
//!
//! # Example
//!
//! ```ignore
//! let stack = DialogStack::new(StackConfig::default());
//!
//! let first = stack.push(entry1);
//! let second = stack.push(entry2);
//! assert_eq!(stack.top(), Some(second));
//!
//! stack.remove(second);
//! assert_eq!(stack.top(), Some(first));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use spmodal_core::DialogId;
use tracing::{debug, warn};

thread_local! {
    static GLOBAL_STACK: DialogStack = DialogStack::new(StackConfig::default());
}

/// Stacking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StackConfig {
    /// Z-index of the first slot.
    pub base_z_index: u32,
    /// Gap between consecutive slots (leaves room for internal layers).
    pub z_increment: u32,
    /// Hide entries covered by the topmost one, re-showing them when they
    /// become topmost again.
    pub hide_covered: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            base_z_index: 1000,
            z_increment: 10,
            hide_covered: false,
        }
    }
}

/// An overlay that can live on the [`DialogStack`].
///
/// The stack calls these hooks only while it holds no borrow of its own
/// state, so implementations may query the stack.
pub trait StackModal {
    /// Identity of this entry; doubles as its stack handle.
    fn id(&self) -> DialogId;

    /// Apply the assigned stacking order.
    fn apply_z_index(&self, z_index: u32);

    /// Gain or lose input focus.
    fn set_focused(&self, focused: bool);

    /// Covered by a newer entry (only called when `hide_covered` is on).
    fn set_covered(&self, covered: bool) {
        let _ = covered;
    }
}

struct StackEntry {
    id: DialogId,
    z_index: u32,
    modal: Rc<dyn StackModal>,
}

struct StackInner {
    entries: Vec<StackEntry>,
    next_slot: u32,
    /// Highest z-index handed out so far; never decreases.
    last_z: Option<u32>,
    config: StackConfig,
}

impl StackInner {
    /// Next z-index above `last_z`, or `None` when `u32` is exhausted.
    fn next_z_index(&self) -> Option<u32> {
        let config = self.config;
        let slotted = self
            .next_slot
            .checked_mul(config.z_increment)
            .and_then(|offset| config.base_z_index.checked_add(offset));
        let floor = match self.last_z {
            Some(last) => last.checked_add(1)?,
            None => 0,
        };
        match slotted {
            Some(z) => Some(z.max(floor)),
            None => {
                warn!(
                    slot = self.next_slot,
                    floor, "z-index slot overflows, stacking one above the previous entry"
                );
                Some(floor)
            }
        }
    }

    /// Reassign z-indexes to the live entries from the bottom up, leaving
    /// room for one more entry above them. Returns the index for that entry.
    fn renumber(&mut self) -> u32 {
        let count = u32::try_from(self.entries.len()).unwrap_or(u32::MAX - 1);
        let mut start = self.config.base_z_index;
        let mut step = self.config.z_increment.max(1);
        if count
            .checked_mul(step)
            .and_then(|span| start.checked_add(span))
            .is_none()
        {
            start = 0;
            step = 1;
        }
        let mut z = start;
        for entry in &mut self.entries {
            entry.z_index = z;
            z = z.saturating_add(step);
        }
        warn!(
            depth = self.entries.len(),
            start, step, "z-index space exhausted, renumbered stack entries"
        );
        z
    }
}

/// Process-wide ordered set of open overlays.
///
/// Cloning yields another handle to the same stack. The stack owns its
/// entries until they are removed.
#[derive(Clone)]
pub struct DialogStack {
    inner: Rc<RefCell<StackInner>>,
}

impl Default for DialogStack {
    fn default() -> Self {
        Self::new(StackConfig::default())
    }
}

impl fmt::Debug for DialogStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("DialogStack")
            .field("depth", &inner.entries.len())
            .field("next_slot", &inner.next_slot)
            .field("config", &inner.config)
            .finish()
    }
}

impl DialogStack {
    pub fn new(config: StackConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StackInner {
                entries: Vec::new(),
                next_slot: 0,
                last_z: None,
                config,
            })),
        }
    }

    /// The stack shared by everything on this thread.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_STACK.with(Clone::clone)
    }

    /// Replace the stacking parameters.
    ///
    /// Existing entries keep their z-indexes, and entries pushed afterwards
    /// still land above them whatever the new base and increment are.
    pub fn configure(&self, config: StackConfig) {
        self.inner.borrow_mut().config = config;
    }

    #[must_use]
    pub fn config(&self) -> StackConfig {
        self.inner.borrow().config
    }

    // --- Stack Operations ---

    /// Push an entry above everything currently on the stack.
    ///
    /// Returns the entry's handle. Pushing an id that is already on the
    /// stack is a no-op.
    pub fn push(&self, modal: Rc<dyn StackModal>) -> DialogId {
        let id = modal.id();
        let (z_index, renumbered, previous, hide_covered, depth) = {
            let mut inner = self.inner.borrow_mut();
            if inner.entries.iter().any(|e| e.id == id) {
                debug!(dialog = %id, "entry already on stack");
                return id;
            }
            let (z_index, renumbered) = match inner.next_z_index() {
                Some(z) => (z, Vec::new()),
                None => {
                    let z = inner.renumber();
                    let live: Vec<_> = inner
                        .entries
                        .iter()
                        .map(|e| (Rc::clone(&e.modal), e.z_index))
                        .collect();
                    (z, live)
                }
            };
            inner.next_slot = inner.next_slot.saturating_add(1);
            inner.last_z = Some(z_index);
            let previous = inner.entries.last().map(|e| Rc::clone(&e.modal));
            inner.entries.push(StackEntry {
                id,
                z_index,
                modal: Rc::clone(&modal),
            });
            (
                z_index,
                renumbered,
                previous,
                inner.config.hide_covered,
                inner.entries.len(),
            )
        };

        for (entry, z) in renumbered {
            entry.apply_z_index(z);
        }
        modal.apply_z_index(z_index);
        if let Some(previous) = previous {
            previous.set_focused(false);
            if hide_covered {
                previous.set_covered(true);
            }
        }
        modal.set_focused(true);

        debug!(dialog = %id, z_index, depth, "pushed stack entry");
        id
    }

    /// Remove an entry. Returns whether it was on the stack.
    ///
    /// When the removed entry was topmost, it loses focus and the
    /// next-topmost entry regains it (and visibility, under `hide_covered`).
    pub fn remove(&self, id: DialogId) -> bool {
        let (removed, was_top, new_top, hide_covered, depth) = {
            let mut inner = self.inner.borrow_mut();
            let Some(idx) = inner.entries.iter().position(|e| e.id == id) else {
                return false;
            };
            let was_top = idx + 1 == inner.entries.len();
            let removed = inner.entries.remove(idx);
            let new_top = if was_top {
                inner.entries.last().map(|e| Rc::clone(&e.modal))
            } else {
                None
            };
            (
                removed,
                was_top,
                new_top,
                inner.config.hide_covered,
                inner.entries.len(),
            )
        };

        if was_top {
            removed.modal.set_focused(false);
        }
        if let Some(top) = new_top {
            if hide_covered {
                top.set_covered(false);
            }
            top.set_focused(true);
        }

        debug!(dialog = %id, depth, "removed stack entry");
        // The stack's ownership ends here, outside the borrow.
        drop(removed);
        true
    }

    // --- State Queries ---

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    #[must_use]
    pub fn contains(&self, id: DialogId) -> bool {
        self.inner.borrow().entries.iter().any(|e| e.id == id)
    }

    /// Handle of the topmost entry.
    #[must_use]
    pub fn top(&self) -> Option<DialogId> {
        self.inner.borrow().entries.last().map(|e| e.id)
    }

    #[must_use]
    pub fn z_index(&self, id: DialogId) -> Option<u32> {
        self.inner
            .borrow()
            .entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.z_index)
    }

    /// Handles from bottom to top.
    #[must_use]
    pub fn order(&self) -> Vec<DialogId> {
        self.inner.borrow().entries.iter().map(|e| e.id).collect()
    }
}
