#![forbid(unsafe_code)]

//! Exactly-once pending results.
//!
//! A [`Deferred`] starts pending and settles at most once, either resolved
//! with a value or rejected with a [`ModalError`]. Every later settle
//! attempt is discarded and reported as `false`.
//!
//! Callbacks registered with [`Deferred::done`], [`Deferred::fail`], and
//! [`Deferred::always`] run once, in registration order. Registering after
//! settlement runs the callback immediately.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::ModalError;

type Outcome<T> = Rc<Result<T, ModalError>>;
type Callback<T> = Box<dyn FnOnce(Result<&T, &ModalError>)>;

/// Lifecycle of a [`Deferred`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredState {
    Pending,
    Resolved,
    Rejected,
}

struct DeferredInner<T> {
    outcome: Option<Outcome<T>>,
    callbacks: Vec<Callback<T>>,
}

/// Shared handle to a pending result. Clones observe the same result.
pub struct Deferred<T> {
    inner: Rc<RefCell<DeferredInner<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &self.state())
            .finish()
    }
}

impl<T> Deferred<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(DeferredInner {
                outcome: None,
                callbacks: Vec::new(),
            })),
        }
    }

    /// Resolve with `value`. Returns false if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Reject with `err`. Returns false if already settled.
    pub fn reject(&self, err: ModalError) -> bool {
        self.settle(Err(err))
    }

    /// Settle with `result`. Returns false (and drops `result`) if already
    /// settled.
    pub fn settle(&self, result: Result<T, ModalError>) -> bool {
        let (outcome, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            if inner.outcome.is_some() {
                debug!(
                    rejected = result.is_err(),
                    "discarding settlement of an already settled result"
                );
                return false;
            }
            let outcome = Rc::new(result);
            inner.outcome = Some(Rc::clone(&outcome));
            (outcome, std::mem::take(&mut inner.callbacks))
        };
        for callback in callbacks {
            callback((*outcome).as_ref());
        }
        true
    }

    #[must_use]
    pub fn state(&self) -> DeferredState {
        match self.inner.borrow().outcome.as_deref() {
            None => DeferredState::Pending,
            Some(Ok(_)) => DeferredState::Resolved,
            Some(Err(_)) => DeferredState::Rejected,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state() == DeferredState::Pending
    }

    /// Run `f` with the value once resolved.
    pub fn done(&self, f: impl FnOnce(&T) + 'static) -> &Self {
        self.always(move |result| {
            if let Ok(value) = result {
                f(value);
            }
        })
    }

    /// Run `f` with the error once rejected.
    pub fn fail(&self, f: impl FnOnce(&ModalError) + 'static) -> &Self {
        self.always(move |result| {
            if let Err(err) = result {
                f(err);
            }
        })
    }

    /// Run `f` with the outcome once settled, whichever way.
    pub fn always(&self, f: impl FnOnce(Result<&T, &ModalError>) + 'static) -> &Self {
        let settled = self.inner.borrow().outcome.clone();
        match settled {
            Some(outcome) => f((*outcome).as_ref()),
            None => self.inner.borrow_mut().callbacks.push(Box::new(f)),
        }
        self
    }
}

impl<T: Clone> Deferred<T> {
    /// Snapshot of the outcome, if settled.
    #[must_use]
    pub fn result(&self) -> Option<Result<T, ModalError>> {
        self.inner.borrow().outcome.as_deref().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;

    #[test]
    fn resolves_exactly_once() {
        let d: Deferred<String> = Deferred::new();
        assert!(d.is_pending());
        assert!(d.resolve("first".into()));
        assert!(!d.resolve("second".into()));
        assert!(!d.reject(ModalError::transport("late")));
        assert_eq!(d.state(), DeferredState::Resolved);
        assert_eq!(d.result(), Some(Ok("first".to_string())));
    }

    #[test]
    fn callbacks_run_once_in_order() {
        let d: Deferred<u32> = Deferred::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = Rc::clone(&log);
            d.done(move |v| log.borrow_mut().push(format!("done {v}")));
        }
        {
            let log = Rc::clone(&log);
            d.fail(move |_| log.borrow_mut().push("fail".into()));
        }
        {
            let log = Rc::clone(&log);
            d.always(move |_| log.borrow_mut().push("always".into()));
        }

        d.resolve(7);
        d.resolve(8);
        assert_eq!(*log.borrow(), vec!["done 7", "always"]);
    }

    #[test]
    fn late_registration_runs_immediately() {
        let d: Deferred<u32> = Deferred::new();
        d.reject(ModalError::transport("down"));

        let seen = Rc::new(Cell::new(false));
        let seen2 = Rc::clone(&seen);
        d.fail(move |err| {
            assert_eq!(err, &ModalError::transport("down"));
            seen2.set(true);
        });
        assert!(seen.get());
    }

    #[test]
    fn callback_may_reenter_the_deferred() {
        let d: Deferred<u32> = Deferred::new();
        let inner = d.clone();
        let state = Rc::new(Cell::new(DeferredState::Pending));
        let state2 = Rc::clone(&state);
        d.done(move |_| state2.set(inner.state()));
        d.resolve(1);
        assert_eq!(state.get(), DeferredState::Resolved);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Resolve(u32),
        Reject,
        Watch,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            any::<u32>().prop_map(Step::Resolve),
            Just(Step::Reject),
            Just(Step::Watch),
        ]
    }

    proptest! {
        #[test]
        fn first_settle_wins_and_callbacks_run_once(
            steps in proptest::collection::vec(step(), 1..32)
        ) {
            let d: Deferred<u32> = Deferred::new();
            let mut expected: Option<Result<u32, ModalError>> = None;
            let mut counters: Vec<Rc<Cell<u32>>> = Vec::new();

            for step in steps {
                match step {
                    Step::Resolve(v) => {
                        prop_assert_eq!(d.resolve(v), expected.is_none());
                        expected.get_or_insert(Ok(v));
                    }
                    Step::Reject => {
                        let err = ModalError::transport("down");
                        prop_assert_eq!(d.reject(err.clone()), expected.is_none());
                        expected.get_or_insert(Err(err));
                    }
                    Step::Watch => {
                        let count = Rc::new(Cell::new(0));
                        let seen = Rc::clone(&count);
                        d.always(move |_| seen.set(seen.get() + 1));
                        counters.push(count);
                    }
                }
            }

            let settled = expected.is_some();
            for count in &counters {
                prop_assert_eq!(count.get(), u32::from(settled));
            }
            prop_assert_eq!(d.result(), expected);
        }
    }
}
