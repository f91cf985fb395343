#![forbid(unsafe_code)]

//! Headless stand-ins for the host capabilities spmodal consumes.
//!
//! - [`HeadlessToolkit`]: an in-memory element tree with click bindings and
//!   focus tracking, plus query helpers for assertions.
//! - [`HeadlessDocuments`]: records load requests and hands out the
//!   [`EmbeddedDocument`](spmodal_core::EmbeddedDocument) an embedded page
//!   would see.
//! - [`ScriptedChannel`]: an upload channel whose replies are driven by the
//!   test.

mod documents;
mod toolkit;
mod upload;

pub use documents::HeadlessDocuments;
pub use toolkit::{HeadlessToolkit, Node};
pub use upload::{ScriptedChannel, Submission};
