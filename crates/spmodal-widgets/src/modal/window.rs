#![forbid(unsafe_code)]

//! Modal windows backed by an embedded document.
//!
//! A [`ModalWindow`] owns a backdrop and a frame element, one route on the
//! [`ChannelHub`], and one layer on the [`DialogStack`]. The embedded
//! document talks back through the port it was loaded with; see
//! [`UserInterface`] for that side.
//!
//! # State Machine
//!
//! ```text
//! Loading ──ready──▶ Ready ──close──▶ Closed
//!    │                                  ▲
//!    └───────────────close──────────────┘
//! ```
//!
//! # Invariants
//!
//! - At most one embedded document is associated with a window; it is
//!   unloaded on close and never reloaded.
//! - Listeners for one event run in registration order; events from the
//!   document arrive in the order it fired them.
//! - An open window keeps itself alive through its channel route, so
//!   dropping every handle does not close it.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Empty or malformed url | `InvalidArgument`, nothing created |
//! | Document runtime refuses the load | window closed, `Configuration` |
//! | Event for a closed window | dropped silently |
//! | `close()` twice | second call is a no-op |
//!
//! [`ChannelHub`]: spmodal_core::ChannelHub
//! [`UserInterface`]: crate::modal::UserInterface

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use spmodal_core::{
    DialogId, ElementId, ElementSpec, Envelope, EnvelopeKind, LoadRequest, ModalError, ModalId,
    Params, Result, Toolkit, Value, validate_url,
};
use tracing::{debug, trace};

use crate::context::ModalContext;
use crate::modal::stack::StackModal;

/// Host-side event listener.
pub type ModalListener = Rc<dyn Fn(&ModalWindow, Option<&Value>)>;

type ClosedObserver = Box<dyn FnOnce(&ModalWindow)>;

/// Host-side notification dispatched when the document signals readiness.
pub const READY_EVENT: &str = "ready";

/// Lifecycle of a modal window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    /// Embedded document is loading.
    Loading,
    /// Embedded document signaled readiness.
    Ready,
    Closed,
}

/// Stack entry for the backdrop/frame pair.
struct WindowLayer {
    id: DialogId,
    backdrop: ElementId,
    frame: ElementId,
    toolkit: Rc<dyn Toolkit>,
}

impl StackModal for WindowLayer {
    fn id(&self) -> DialogId {
        self.id
    }

    fn apply_z_index(&self, z_index: u32) {
        self.toolkit.set_z_index(self.backdrop, z_index);
        self.toolkit.set_z_index(self.frame, z_index.saturating_add(1));
    }

    fn set_focused(&self, focused: bool) {
        if focused {
            self.toolkit.focus(self.frame);
        } else {
            self.toolkit.blur(self.frame);
        }
    }

    fn set_covered(&self, covered: bool) {
        self.toolkit.set_visible(self.backdrop, !covered);
        self.toolkit.set_visible(self.frame, !covered);
    }
}

struct WindowState {
    state: ModalState,
    listeners: AHashMap<String, Vec<ModalListener>>,
    observers: Vec<ClosedObserver>,
}

struct WindowShared {
    id: ModalId,
    layer: DialogId,
    url: String,
    params: Params,
    backdrop: ElementId,
    frame: ElementId,
    ctx: ModalContext,
    state: RefCell<WindowState>,
}

/// Handle to an open (or closed) modal window. Clones share the window.
#[derive(Clone)]
pub struct ModalWindow {
    inner: Rc<WindowShared>,
}

impl fmt::Debug for ModalWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalWindow")
            .field("id", &self.inner.id)
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .finish()
    }
}

impl PartialEq for ModalWindow {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl ModalWindow {
    /// Open `url` in a new modal window, handing `params` to the document.
    ///
    /// Returns immediately; the document loads in the background and the
    /// handle accepts listeners right away.
    pub fn open(ctx: &ModalContext, url: &str, params: Params) -> Result<Self> {
        let url = validate_url(url)?.to_string();
        let id = ModalId::next();
        let binding = ctx.hub().bind(id, &params)?;

        let toolkit = ctx.toolkit();
        let backdrop = toolkit.create(ElementSpec::Backdrop);
        toolkit.attach(backdrop, None);
        let frame = toolkit.create(ElementSpec::Frame { src: url.clone() });
        toolkit.attach(frame, None);

        let layer = DialogId::next();
        ctx.stack().push(Rc::new(WindowLayer {
            id: layer,
            backdrop,
            frame,
            toolkit: Rc::clone(toolkit),
        }));

        let window = Self {
            inner: Rc::new(WindowShared {
                id,
                layer,
                url: url.clone(),
                params,
                backdrop,
                frame,
                ctx: ctx.clone(),
                state: RefCell::new(WindowState {
                    state: ModalState::Loading,
                    listeners: AHashMap::new(),
                    observers: Vec::new(),
                }),
            }),
        };

        let stack = ctx.stack().clone();
        window.on_closed(move |_| {
            stack.remove(layer);
        });

        let route = window.clone();
        ctx.hub().register(id, move |envelope| route.receive(envelope));

        let request = LoadRequest {
            frame,
            url: url.clone(),
            binding,
        };
        if let Err(err) = ctx.documents().load(request) {
            window.close();
            return Err(ModalError::configuration(format!(
                "could not load {url}: {err}"
            )));
        }

        debug!(modal = %id, url = %url, "opened modal window");
        Ok(window)
    }

    // --- Accessors ---

    #[must_use]
    pub fn id(&self) -> ModalId {
        self.inner.id
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Parameters handed to the embedded document.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.inner.params
    }

    #[must_use]
    pub fn state(&self) -> ModalState {
        self.inner.state.borrow().state
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == ModalState::Ready
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state() == ModalState::Closed
    }

    /// Frame element holding the embedded document.
    #[must_use]
    pub fn frame(&self) -> ElementId {
        self.inner.frame
    }

    #[must_use]
    pub fn backdrop(&self) -> ElementId {
        self.inner.backdrop
    }

    /// Stack entry of the window layer.
    #[must_use]
    pub fn layer(&self) -> DialogId {
        self.inner.layer
    }

    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .state
            .borrow()
            .listeners
            .get(event)
            .map_or(0, Vec::len)
    }

    // --- Listeners ---

    /// Register a listener for `event`. Ignored once the window is closed.
    pub fn on(
        &self,
        event: impl Into<String>,
        listener: impl Fn(&ModalWindow, Option<&Value>) + 'static,
    ) -> &Self {
        let mut state = self.inner.state.borrow_mut();
        if state.state != ModalState::Closed {
            state
                .listeners
                .entry(event.into())
                .or_default()
                .push(Rc::new(listener));
        }
        self
    }

    /// Run `observer` once when the window closes (immediately if it
    /// already has).
    pub fn on_closed(&self, observer: impl FnOnce(&ModalWindow) + 'static) -> &Self {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.state != ModalState::Closed {
                state.observers.push(Box::new(observer));
                return self;
            }
        }
        observer(self);
        self
    }

    /// Dispatch `event` to host listeners. No-op once closed.
    pub fn emit(&self, event: &str, payload: Option<&Value>) {
        let listeners = {
            let state = self.inner.state.borrow();
            if state.state == ModalState::Closed {
                trace!(modal = %self.inner.id, event, "ignoring event for closed modal");
                return;
            }
            match state.listeners.get(event) {
                Some(listeners) => listeners.clone(),
                None => return,
            }
        };
        for listener in listeners {
            if self.is_closed() {
                break;
            }
            listener(self, payload);
        }
    }

    fn receive(&self, envelope: Envelope) {
        match envelope.kind {
            EnvelopeKind::Ready => {
                {
                    let mut state = self.inner.state.borrow_mut();
                    if state.state != ModalState::Loading {
                        return;
                    }
                    state.state = ModalState::Ready;
                }
                debug!(modal = %self.inner.id, "modal document ready");
                self.emit(READY_EVENT, None);
            }
            EnvelopeKind::Event => self.emit(&envelope.event, envelope.payload.as_ref()),
            EnvelopeKind::Close => {
                debug!(modal = %self.inner.id, "close requested by document");
                self.close();
            }
        }
    }

    /// Tear down the embedded document and release every listener.
    ///
    /// Idempotent.
    pub fn close(&self) {
        let (listeners, observers) = {
            let mut state = self.inner.state.borrow_mut();
            if state.state == ModalState::Closed {
                return;
            }
            state.state = ModalState::Closed;
            (
                std::mem::take(&mut state.listeners),
                std::mem::take(&mut state.observers),
            )
        };

        let ctx = &self.inner.ctx;
        ctx.hub().unregister(self.inner.id);
        ctx.documents().unload(self.inner.frame);
        ctx.toolkit().detach(self.inner.frame);
        ctx.toolkit().detach(self.inner.backdrop);
        drop(listeners);

        debug!(modal = %self.inner.id, "closed modal window");
        for observer in observers {
            observer(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::stack::StackConfig;
    use serde_json::json;
    use spmodal_core::Port;
    use spmodal_harness::{HeadlessDocuments, HeadlessToolkit};
    use std::cell::{Cell, RefCell};

    fn setup() -> (Rc<HeadlessToolkit>, Rc<HeadlessDocuments>, ModalContext) {
        let toolkit = HeadlessToolkit::new();
        let documents = HeadlessDocuments::new();
        let ctx = ModalContext::isolated(toolkit.clone(), documents.clone(), StackConfig::default());
        (toolkit, documents, ctx)
    }

    fn port_of(documents: &HeadlessDocuments, window: &ModalWindow) -> Port {
        documents
            .binding_for(window.id())
            .expect("document loaded")
            .port()
            .clone()
    }

    #[test]
    fn rejects_bad_urls_without_side_effects() {
        let (toolkit, documents, ctx) = setup();
        for url in ["", "   ", "a b.html"] {
            let err = ModalWindow::open(&ctx, url, Params::new()).unwrap_err();
            assert!(matches!(err, ModalError::InvalidArgument(_)), "{url:?}");
        }
        assert_eq!(toolkit.element_count(), 0);
        assert_eq!(documents.loaded_count(), 0);
        assert!(ctx.stack().is_empty());
    }

    #[test]
    fn open_loads_document_with_params() {
        let (toolkit, documents, ctx) = setup();
        let window = ModalWindow::open(
            &ctx,
            "user-interface.html",
            Params::new().with("param1", "one"),
        )
        .unwrap();

        assert_eq!(window.state(), ModalState::Loading);
        assert_eq!(window.url(), "user-interface.html");
        assert!(toolkit.exists(window.frame()));
        assert!(documents.is_loaded(window.frame()));
        assert_eq!(ctx.stack().top(), Some(window.layer()));
        assert_eq!(toolkit.focused(), Some(window.frame()));

        let doc = documents.document_for(window.id()).unwrap();
        assert_eq!(doc.url(), "user-interface.html");
    }

    #[test]
    fn ready_then_events_in_order() {
        let (_toolkit, documents, ctx) = setup();
        let window = ModalWindow::open(&ctx, "ui.html", Params::new()).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for name in ["ready", "pick"] {
            let seen = Rc::clone(&seen);
            window.on(name, move |_, payload| {
                seen.borrow_mut().push((name, payload.cloned()));
            });
        }

        let port = port_of(&documents, &window);
        port.send(&Envelope::event(window.id(), "pick", Some(json!(1)))).unwrap();
        port.send(&Envelope::ready(window.id())).unwrap();
        port.send(&Envelope::event(window.id(), "pick", Some(json!(2)))).unwrap();
        ctx.event_loop().run_until_idle();

        assert!(window.is_ready());
        assert_eq!(
            *seen.borrow(),
            vec![
                ("ready", None),
                ("pick", Some(json!(1))),
                ("pick", Some(json!(2))),
            ]
        );
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let (_toolkit, _documents, ctx) = setup();
        let window = ModalWindow::open(&ctx, "ui.html", Params::new()).unwrap();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let order = Rc::clone(&order);
            window.on("x", move |_, _| order.borrow_mut().push(i));
        }
        window.emit("x", None);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        assert_eq!(window.listener_count("x"), 3);
    }

    #[test]
    fn listener_closing_stops_dispatch() {
        let (_toolkit, _documents, ctx) = setup();
        let window = ModalWindow::open(&ctx, "ui.html", Params::new()).unwrap();
        let later = Rc::new(Cell::new(false));
        window.on("x", |w, _| w.close());
        {
            let later = Rc::clone(&later);
            window.on("x", move |_, _| later.set(true));
        }
        window.emit("x", None);
        assert!(window.is_closed());
        assert!(!later.get());
    }

    #[test]
    fn close_is_idempotent_and_tears_down() {
        let (toolkit, documents, ctx) = setup();
        let window = ModalWindow::open(&ctx, "ui.html", Params::new()).unwrap();
        let closed = Rc::new(Cell::new(0));
        {
            let closed = Rc::clone(&closed);
            window.on_closed(move |_| closed.set(closed.get() + 1));
        }
        window.on("x", |_, _| {});

        window.close();
        window.close();

        assert_eq!(closed.get(), 1);
        assert!(!toolkit.exists(window.frame()));
        assert!(!toolkit.exists(window.backdrop()));
        assert!(!documents.is_loaded(window.frame()));
        assert!(!ctx.hub().is_registered(window.id()));
        assert!(ctx.stack().is_empty());
        assert_eq!(window.listener_count("x"), 0);
    }

    #[test]
    fn events_after_close_are_dropped() {
        let (_toolkit, documents, ctx) = setup();
        let window = ModalWindow::open(&ctx, "ui.html", Params::new()).unwrap();
        let fired = Rc::new(Cell::new(false));
        {
            let fired = Rc::clone(&fired);
            window.on("x", move |_, _| fired.set(true));
        }
        let port = port_of(&documents, &window);
        window.close();

        port.send(&Envelope::event(window.id(), "x", None)).unwrap();
        ctx.event_loop().run_until_idle();
        window.emit("x", None);
        window.on("x", |_, _| {});
        assert!(!fired.get());
        assert_eq!(window.listener_count("x"), 0);
    }

    #[test]
    fn on_closed_after_close_runs_immediately() {
        let (_toolkit, _documents, ctx) = setup();
        let window = ModalWindow::open(&ctx, "ui.html", Params::new()).unwrap();
        window.close();
        let ran = Rc::new(Cell::new(false));
        {
            let ran = Rc::clone(&ran);
            window.on_closed(move |_| ran.set(true));
        }
        assert!(ran.get());
    }

    #[test]
    fn close_request_from_document() {
        let (_toolkit, documents, ctx) = setup();
        let window = ModalWindow::open(&ctx, "ui.html", Params::new()).unwrap();
        let port = port_of(&documents, &window);
        port.send(&Envelope::close(window.id())).unwrap();
        ctx.event_loop().run_until_idle();
        assert!(window.is_closed());
    }

    #[test]
    fn refused_load_closes_and_reports_configuration() {
        let (toolkit, documents, ctx) = setup();
        documents.refuse("missing.html");
        let err = ModalWindow::open(&ctx, "missing.html", Params::new()).unwrap_err();
        assert!(matches!(err, ModalError::Configuration(_)));
        assert_eq!(toolkit.element_count(), 0);
        assert!(ctx.stack().is_empty());
    }

    #[test]
    fn window_survives_dropped_handle() {
        let (_toolkit, documents, ctx) = setup();
        let id = ModalWindow::open(&ctx, "ui.html", Params::new()).unwrap().id();
        assert!(ctx.hub().is_registered(id));
        let port = documents.binding_for(id).unwrap().port().clone();
        port.send(&Envelope::close(id)).unwrap();
        ctx.event_loop().run_until_idle();
        assert!(!ctx.hub().is_registered(id));
        assert!(ctx.stack().is_empty());
    }
}
