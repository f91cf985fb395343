#![forbid(unsafe_code)]

//! Single-threaded cooperative task queue.
//!
//! Every operation in spmodal returns immediately. Work that needs a round
//! trip (embedded document readiness, upload completion, dialog display) is
//! deferred onto an [`EventLoop`] and runs on a later turn.
//!
//! # Invariants
//!
//! 1. Tasks run in the order they were deferred (FIFO).
//! 2. A task deferred while a turn is running lands in the next turn.
//! 3. [`EventSource`]s are polled at the start of every turn, before queued
//!    tasks run.
//! 4. Sources are held weakly; a dropped source is pruned on the next poll.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

/// Upper bound on turns in one [`EventLoop::run_until_idle`] call.
const MAX_TURNS_PER_RUN: usize = 10_000;

type Task = Box<dyn FnOnce()>;

thread_local! {
    static GLOBAL_LOOP: EventLoop = EventLoop::new();
}

/// Something completed outside the loop (e.g. on a worker thread) that must
/// be delivered on the loop.
pub trait EventSource {
    /// Deliver everything that completed since the last poll.
    ///
    /// Returns the number of items delivered.
    fn poll(&self) -> usize;
}

#[derive(Default)]
struct LoopInner {
    queue: RefCell<VecDeque<Task>>,
    sources: RefCell<Vec<Weak<dyn EventSource>>>,
    turns: Cell<u64>,
}

/// Cloneable handle to a FIFO task queue. Clones share the same queue.
#[derive(Clone, Default)]
pub struct EventLoop {
    inner: Rc<LoopInner>,
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("pending", &self.pending())
            .field("turns", &self.turns())
            .finish()
    }
}

impl EventLoop {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The loop shared by everything on this thread.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_LOOP.with(Clone::clone)
    }

    /// Schedule `task` for a later turn.
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.inner.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Register a source to be polled each turn.
    pub fn add_source(&self, source: &Rc<dyn EventSource>) {
        self.inner.sources.borrow_mut().push(Rc::downgrade(source));
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Number of turns run so far.
    #[must_use]
    pub fn turns(&self) -> u64 {
        self.inner.turns.get()
    }

    /// Run one turn: poll sources, then run the tasks queued before the turn
    /// began. Returns the number of source items and tasks processed.
    pub fn run_once(&self) -> usize {
        let mut processed = self.poll_sources();

        let batch: Vec<Task> = self.inner.queue.borrow_mut().drain(..).collect();
        processed += batch.len();
        for task in batch {
            task();
        }

        self.inner.turns.set(self.inner.turns.get() + 1);
        processed
    }

    /// Run turns until nothing is left to do.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        for _ in 0..MAX_TURNS_PER_RUN {
            let processed = self.run_once();
            if processed == 0 {
                return total;
            }
            total += processed;
        }
        warn!(
            turns = MAX_TURNS_PER_RUN,
            pending = self.pending(),
            "event loop did not settle"
        );
        total
    }

    fn poll_sources(&self) -> usize {
        let live: Vec<Rc<dyn EventSource>> = {
            let mut sources = self.inner.sources.borrow_mut();
            sources.retain(|weak| weak.strong_count() > 0);
            sources.iter().filter_map(Weak::upgrade).collect()
        };
        let delivered: usize = live.iter().map(|source| source.poll()).sum();
        if delivered > 0 {
            trace!(delivered, "event sources delivered");
        }
        delivered
    }
}
