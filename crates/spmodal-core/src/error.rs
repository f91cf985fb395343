#![forbid(unsafe_code)]

//! Error taxonomy shared by every spmodal crate.
//!
//! Argument-normalization quirks of the dialog presets are resolved where
//! they occur and never show up here.

use thiserror::Error;

use crate::ids::DialogId;

/// Convenience alias used throughout the workspace.
pub type Result<T, E = ModalError> = std::result::Result<T, E>;

/// Errors surfaced by modal, dialog, and upload operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModalError {
    /// A caller-supplied argument was rejected (bad URL, bad input reference).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The dispatcher has no method registered under this name.
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    /// A handle was built without a valid host binding.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// An upload failed in transit, returned a non-success status, or its
    /// channel was torn down before a response arrived.
    #[error("transport failure: {0}")]
    Transport(String),
    /// Deliberate failure raised by the `error` dialog after it was shown.
    #[error("{message}")]
    UserRaised {
        /// Message text, identical to the dialog body.
        message: String,
        /// The dialog that was displayed before the failure was signaled.
        dialog: Option<DialogId>,
    },
}

impl ModalError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// True for the `error` dialog's deliberate signal.
    #[must_use]
    pub fn is_user_raised(&self) -> bool {
        matches!(self, Self::UserRaised { .. })
    }
}
