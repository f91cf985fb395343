#![forbid(unsafe_code)]

//! Modal windows, overlay dialogs, and their stacking.
//!
//! - [`ModalWindow`]: an embedded document shown over the host page.
//! - [`UserInterface`]: the embedded document's handle back to its window.
//! - [`MessageDialog`]: in-page overlay with a title, a body, and buttons;
//!   [`presets`] builds the alert, confirm, error, and loading variants.
//! - [`DialogStack`]: z-ordering and focus for everything above.

pub mod dialog;
pub mod presets;
pub mod stack;
pub mod ui;
pub mod window;

pub use dialog::{DialogButton, DialogCallback, DialogKind, MessageDialog, Visibility};
pub use presets::{
    AlertCall, ConfirmCall, DialogArg, DialogDefaults, DialogSpec, ErrorCall, normalize_alert,
    normalize_confirm, normalize_error, sniff_alert, sniff_confirm, sniff_error,
};
pub use stack::{DialogStack, StackConfig, StackModal};
pub use ui::UserInterface;
pub use window::{ModalListener, ModalState, ModalWindow, READY_EVENT};
