#![forbid(unsafe_code)]

//! Modal windows, message dialogs, and asynchronous uploads.
//!
//! [`SpModal`] is the entry point: one typed method per operation
//! (`window`, `ui`, `message`, `alert`, `confirm`, `error`, `loading`,
//! `upload`). [`SpModal::invoke`] keeps the string-keyed call surface for
//! callers that dispatch by method name.
//!
//! # Example
//!
//! ```ignore
//! let modal = SpModal::new(toolkit, documents);
//!
//! let window = modal.window("user-interface.html", Some(Params::new().with("param1", "one")))?;
//! window.on("event", |w, _| w.close());
//!
//! modal.confirm(ConfirmCall::message("Are you sure?", |_| println!("Oh yes!")));
//! modal.tick();
//! ```

pub mod config;
pub mod dispatcher;
pub mod logging;
mod modal;

pub use config::{CONFIG_ENV, Config, ConfigError};
pub use dispatcher::{Arg, Method, Outcome};
pub use logging::{DEFAULT_FILTER, LogFormat};
pub use modal::SpModal;

pub use spmodal_core::{
    DeferredState, DialogId, DocumentRuntime, ElementId, ElementSpec, EmbeddedDocument, EventLoop,
    FrameBinding, LoadRequest, ModalError, ModalId, Params, Result, TextAlign, Toolkit, Value,
};
#[cfg(feature = "http")]
pub use spmodal_upload::HttpChannel;
pub use spmodal_upload::{
    FileInputRef, FileSet, PendingUpload, SelectedFile, SubmissionChannel, UploadConfig,
    UploadInput,
};
pub use spmodal_widgets::{
    AlertCall, ConfirmCall, DialogCallback, DialogDefaults, DialogKind, DialogStack, ErrorCall,
    MessageDialog, ModalContext, ModalState, ModalWindow, StackConfig, UserInterface, Visibility,
};
