#![forbid(unsafe_code)]

//! Shared host context for modal windows and dialogs.

use std::fmt;
use std::rc::Rc;

use spmodal_core::{ChannelHub, DocumentRuntime, EventLoop, Toolkit};

use crate::modal::{DialogDefaults, DialogStack, StackConfig};

/// Everything a modal window or dialog needs from the host page.
///
/// Cheap to clone; clones share the same toolkit, event loop, channel hub,
/// and dialog stack.
#[derive(Clone)]
pub struct ModalContext {
    toolkit: Rc<dyn Toolkit>,
    documents: Rc<dyn DocumentRuntime>,
    event_loop: EventLoop,
    hub: ChannelHub,
    stack: DialogStack,
    defaults: Rc<DialogDefaults>,
}

impl fmt::Debug for ModalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalContext")
            .field("event_loop", &self.event_loop)
            .field("hub", &self.hub)
            .field("stack", &self.stack)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl ModalContext {
    /// Context bound to this thread's event loop and dialog stack.
    pub fn new(toolkit: Rc<dyn Toolkit>, documents: Rc<dyn DocumentRuntime>) -> Self {
        Self::with_parts(
            toolkit,
            documents,
            EventLoop::global(),
            DialogStack::global(),
        )
    }

    /// Context with its own event loop and dialog stack.
    pub fn isolated(
        toolkit: Rc<dyn Toolkit>,
        documents: Rc<dyn DocumentRuntime>,
        stack: StackConfig,
    ) -> Self {
        Self::with_parts(toolkit, documents, EventLoop::new(), DialogStack::new(stack))
    }

    pub fn with_parts(
        toolkit: Rc<dyn Toolkit>,
        documents: Rc<dyn DocumentRuntime>,
        event_loop: EventLoop,
        stack: DialogStack,
    ) -> Self {
        let hub = ChannelHub::new(event_loop.clone());
        Self {
            toolkit,
            documents,
            event_loop,
            hub,
            stack,
            defaults: Rc::new(DialogDefaults::default()),
        }
    }

    /// Replace the default titles and labels used by dialog presets.
    #[must_use]
    pub fn with_defaults(mut self, defaults: DialogDefaults) -> Self {
        self.defaults = Rc::new(defaults);
        self
    }

    pub fn toolkit(&self) -> &Rc<dyn Toolkit> {
        &self.toolkit
    }

    pub fn documents(&self) -> &Rc<dyn DocumentRuntime> {
        &self.documents
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    pub fn hub(&self) -> &ChannelHub {
        &self.hub
    }

    pub fn stack(&self) -> &DialogStack {
        &self.stack
    }

    pub fn defaults(&self) -> &DialogDefaults {
        &self.defaults
    }
}
