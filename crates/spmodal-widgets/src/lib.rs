#![forbid(unsafe_code)]

//! Modal windows and overlay dialogs for spmodal.

pub mod context;
pub mod modal;

pub use context::ModalContext;
pub use modal::{
    AlertCall, ConfirmCall, DialogArg, DialogButton, DialogCallback, DialogDefaults, DialogKind,
    DialogSpec, DialogStack, ErrorCall, MessageDialog, ModalListener, ModalState, ModalWindow,
    StackConfig, StackModal, UserInterface, Visibility,
};
