#![forbid(unsafe_code)]

//! Core primitives for spmodal.
//!
//! This crate holds everything the modal, dialog, and upload layers share:
//!
//! - [`ModalError`]: the error taxonomy surfaced to callers.
//! - [`ChannelHub`] / [`Port`]: message passing between the host page and an
//!   embedded document, keyed by [`ModalId`]. Only serialized text crosses
//!   the boundary.
//! - [`EventLoop`]: the single-threaded task queue that defers delivery to a
//!   later turn.
//! - [`Deferred`]: an exactly-once pending result.
//! - [`Toolkit`] / [`DocumentRuntime`]: the host capabilities the core
//!   consumes (element creation, event binding, embedded document loading).

pub mod channel;
pub mod deferred;
pub mod envelope;
pub mod error;
pub mod event_loop;
pub mod host;
pub mod ids;
pub mod params;

pub use channel::{ChannelHub, FrameBinding, Port};
pub use deferred::{Deferred, DeferredState};
pub use envelope::{Bootstrap, Envelope, EnvelopeKind};
pub use error::{ModalError, Result};
pub use event_loop::{EventLoop, EventSource};
pub use host::{
    DocumentRuntime, ElementSpec, EmbeddedDocument, LoadRequest, TextAlign, Toolkit, validate_url,
};
pub use ids::{BindingId, DialogId, ElementId, ModalId};
pub use params::{Params, Value};
