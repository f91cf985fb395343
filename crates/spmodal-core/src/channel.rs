#![forbid(unsafe_code)]

//! Message channel between the host page and embedded documents.
//!
//! The host owns a [`ChannelHub`]; each open modal registers a route keyed
//! by its [`ModalId`]. The embedded document only ever holds a [`Port`],
//! which keeps a weak reference to the hub and posts serialized
//! [`Envelope`]s. Delivery is deferred to a later [`EventLoop`] turn.
//!
//! # Invariants
//!
//! 1. Envelopes posted through ports are delivered in post order.
//! 2. A route that has not seen `ready` buffers `event` envelopes and
//!    flushes them, in order, immediately after the `ready` envelope.
//! 3. The hub never holds a borrow while a route handler runs, so handlers
//!    may register, unregister, or post.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Malformed wire text | Dropped, `warn!` |
//! | Target unknown or closed | Dropped, `warn!` |
//! | Hub dropped before delivery | `Port::post` returns false |

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::envelope::{Bootstrap, Envelope, EnvelopeKind};
use crate::error::Result;
use crate::event_loop::EventLoop;
use crate::ids::ModalId;
use crate::params::Params;

type RouteHandler = Rc<dyn Fn(Envelope)>;

struct Route {
    ready: bool,
    backlog: VecDeque<Envelope>,
    handler: RouteHandler,
}

#[derive(Default)]
struct HubInner {
    routes: HashMap<ModalId, Route>,
}

/// Host-side registry of routes, one per open modal.
#[derive(Clone)]
pub struct ChannelHub {
    inner: Rc<RefCell<HubInner>>,
    event_loop: EventLoop,
}

impl fmt::Debug for ChannelHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelHub")
            .field("routes", &self.inner.borrow().routes.len())
            .finish()
    }
}

impl ChannelHub {
    pub fn new(event_loop: EventLoop) -> Self {
        Self {
            inner: Rc::new(RefCell::new(HubInner::default())),
            event_loop,
        }
    }

    /// Route envelopes addressed to `target` into `handler`.
    ///
    /// Re-registering an id replaces the previous route and its backlog.
    pub fn register(&self, target: ModalId, handler: impl Fn(Envelope) + 'static) {
        let route = Route {
            ready: false,
            backlog: VecDeque::new(),
            handler: Rc::new(handler),
        };
        if self.inner.borrow_mut().routes.insert(target, route).is_some() {
            debug!(modal = %target, "replaced existing route");
        }
    }

    /// Remove the route for `target`. Returns whether one existed.
    ///
    /// Buffered envelopes are discarded with the route.
    pub fn unregister(&self, target: ModalId) -> bool {
        let removed = self.inner.borrow_mut().routes.remove(&target);
        if let Some(route) = &removed
            && !route.backlog.is_empty()
        {
            debug!(
                modal = %target,
                discarded = route.backlog.len(),
                "discarding buffered envelopes"
            );
        }
        removed.is_some()
    }

    #[must_use]
    pub fn is_registered(&self, target: ModalId) -> bool {
        self.inner.borrow().routes.contains_key(&target)
    }

    /// Whether `target` has signaled readiness.
    #[must_use]
    pub fn is_ready(&self, target: ModalId) -> bool {
        self.inner
            .borrow()
            .routes
            .get(&target)
            .is_some_and(|route| route.ready)
    }

    /// Envelopes buffered for `target` while it is not ready yet.
    #[must_use]
    pub fn backlog_len(&self, target: ModalId) -> usize {
        self.inner
            .borrow()
            .routes
            .get(&target)
            .map_or(0, |route| route.backlog.len())
    }

    /// A port that posts into this hub.
    #[must_use]
    pub fn port(&self) -> Port {
        Port {
            hub: Rc::downgrade(&self.inner),
            event_loop: self.event_loop.clone(),
        }
    }

    /// Serialize `params` for `target` and package them with a port.
    ///
    /// The result is what the document runtime hands to the embedded
    /// document when it loads.
    pub fn bind(&self, target: ModalId, params: &Params) -> Result<FrameBinding> {
        let bootstrap = Bootstrap {
            modal: target,
            params: params.clone(),
        }
        .to_wire()?;
        Ok(FrameBinding {
            modal: target,
            bootstrap,
            port: self.port(),
        })
    }
}

/// The embedded document's way back to the host.
///
/// Holds the hub weakly: a document never keeps the host alive.
#[derive(Clone)]
pub struct Port {
    hub: Weak<RefCell<HubInner>>,
    event_loop: EventLoop,
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Port {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.hub.strong_count() > 0
    }

    /// Post serialized envelope text. Delivery happens on a later turn.
    ///
    /// Returns false when the host side is gone.
    pub fn post(&self, wire: String) -> bool {
        if !self.is_connected() {
            warn!("host channel is gone; dropping envelope");
            return false;
        }
        let hub = self.hub.clone();
        self.event_loop.defer(move || deliver(&hub, &wire));
        true
    }

    /// Serialize and post an envelope.
    pub fn send(&self, envelope: &Envelope) -> Result<bool> {
        Ok(self.post(envelope.to_wire()?))
    }
}

fn deliver(hub: &Weak<RefCell<HubInner>>, wire: &str) {
    let Some(hub) = hub.upgrade() else {
        warn!("host channel dropped before delivery");
        return;
    };
    let envelope = match Envelope::from_wire(wire) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "dropping malformed envelope");
            return;
        }
    };

    let target = envelope.target;
    let (handler, batch) = {
        let mut inner = hub.borrow_mut();
        let Some(route) = inner.routes.get_mut(&target) else {
            warn!(modal = %target, kind = ?envelope.kind, "dropping envelope for unknown or closed modal");
            return;
        };
        let batch: Vec<Envelope> = match envelope.kind {
            EnvelopeKind::Ready => {
                route.ready = true;
                std::iter::once(envelope)
                    .chain(route.backlog.drain(..))
                    .collect()
            }
            EnvelopeKind::Event if !route.ready => {
                trace!(modal = %target, event = %envelope.event, "buffering event until ready");
                route.backlog.push_back(envelope);
                return;
            }
            _ => vec![envelope],
        };
        (Rc::clone(&route.handler), batch)
    };

    for envelope in batch {
        handler(envelope);
    }
}

/// What the host hands an embedded document at load time.
#[derive(Clone)]
pub struct FrameBinding {
    modal: ModalId,
    bootstrap: String,
    port: Port,
}

impl fmt::Debug for FrameBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBinding")
            .field("modal", &self.modal)
            .field("bootstrap", &self.bootstrap)
            .finish()
    }
}

impl FrameBinding {
    /// Assemble a binding by hand (e.g. a runtime re-creating it from a
    /// stored bootstrap string).
    pub fn new(modal: ModalId, bootstrap: impl Into<String>, port: Port) -> Self {
        Self {
            modal,
            bootstrap: bootstrap.into(),
            port,
        }
    }

    #[must_use]
    pub fn modal(&self) -> ModalId {
        self.modal
    }

    /// Serialized [`Bootstrap`] text.
    #[must_use]
    pub fn bootstrap(&self) -> &str {
        &self.bootstrap
    }

    #[must_use]
    pub fn port(&self) -> &Port {
        &self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    fn recording_hub() -> (EventLoop, ChannelHub, ModalId, Rc<RefCell<Vec<Envelope>>>) {
        let ev = EventLoop::new();
        let hub = ChannelHub::new(ev.clone());
        let id = ModalId::next();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        hub.register(id, move |env| sink.borrow_mut().push(env));
        (ev, hub, id, seen)
    }

    #[test]
    fn delivery_is_deferred_and_ordered() {
        let (ev, hub, id, seen) = recording_hub();
        let port = hub.port();
        port.send(&Envelope::ready(id)).unwrap();
        for name in ["a", "b", "c"] {
            port.send(&Envelope::event(id, name, None)).unwrap();
        }
        assert!(seen.borrow().is_empty());

        ev.run_until_idle();
        let names: Vec<_> = seen.borrow().iter().map(|e| e.event.clone()).collect();
        assert_eq!(names, vec!["", "a", "b", "c"]);
        assert!(hub.is_ready(id));
    }

    #[test]
    fn events_before_ready_are_buffered() {
        let (ev, hub, id, seen) = recording_hub();
        let port = hub.port();
        port.send(&Envelope::event(id, "early", Some(json!(1)))).unwrap();
        port.send(&Envelope::event(id, "second", None)).unwrap();
        ev.run_until_idle();
        assert!(seen.borrow().is_empty());
        assert_eq!(hub.backlog_len(id), 2);

        port.send(&Envelope::ready(id)).unwrap();
        ev.run_until_idle();
        let kinds: Vec<_> = seen.borrow().iter().map(|e| (e.kind, e.event.clone())).collect();
        assert_eq!(
            kinds,
            vec![
                (EnvelopeKind::Ready, String::new()),
                (EnvelopeKind::Event, "early".into()),
                (EnvelopeKind::Event, "second".into()),
            ]
        );
        assert_eq!(hub.backlog_len(id), 0);
    }

    #[test]
    fn close_requests_bypass_the_backlog() {
        let (ev, hub, id, seen) = recording_hub();
        hub.port().send(&Envelope::close(id)).unwrap();
        ev.run_until_idle();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].kind, EnvelopeKind::Close);
    }

    #[test]
    #[traced_test]
    fn unregistered_target_is_dropped() {
        let (ev, hub, id, seen) = recording_hub();
        assert!(hub.unregister(id));
        assert!(!hub.unregister(id));

        hub.port().send(&Envelope::ready(id)).unwrap();
        ev.run_until_idle();
        assert!(seen.borrow().is_empty());
        assert!(logs_contain("dropping envelope for unknown or closed modal"));
    }

    #[test]
    #[traced_test]
    fn malformed_wire_is_dropped() {
        let (ev, hub, _id, seen) = recording_hub();
        assert!(hub.port().post("{\"target\":".into()));
        ev.run_until_idle();
        assert!(seen.borrow().is_empty());
        assert!(logs_contain("dropping malformed envelope"));
    }

    #[test]
    fn port_outliving_hub_reports_disconnect() {
        let ev = EventLoop::new();
        let hub = ChannelHub::new(ev.clone());
        let port = hub.port();
        assert!(port.is_connected());
        drop(hub);
        assert!(!port.is_connected());
        assert!(!port.post("{}".into()));
        assert_eq!(ev.pending(), 0);
    }

    #[test]
    fn handler_may_unregister_itself() {
        let ev = EventLoop::new();
        let hub = ChannelHub::new(ev.clone());
        let id = ModalId::next();
        let count = Rc::new(RefCell::new(0));
        {
            let hub2 = hub.clone();
            let count = Rc::clone(&count);
            hub.register(id, move |_| {
                *count.borrow_mut() += 1;
                hub2.unregister(id);
            });
        }
        let port = hub.port();
        port.send(&Envelope::ready(id)).unwrap();
        port.send(&Envelope::event(id, "after", None)).unwrap();
        ev.run_until_idle();
        assert_eq!(*count.borrow(), 1);
        assert!(!hub.is_registered(id));
    }

    #[test]
    fn bind_carries_params_as_text() {
        let ev = EventLoop::new();
        let hub = ChannelHub::new(ev);
        let id = ModalId::next();
        let binding = hub
            .bind(id, &Params::new().with("param1", "one"))
            .unwrap();
        assert_eq!(binding.modal(), id);
        let boot = Bootstrap::from_wire(binding.bootstrap()).unwrap();
        assert_eq!(boot.modal, id);
        assert_eq!(boot.params.get_str("param1"), Some("one"));
    }
}
