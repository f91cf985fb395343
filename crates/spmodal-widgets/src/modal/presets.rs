#![forbid(unsafe_code)]

//! Alert, confirm, error, and loading dialogs.
//!
//! Each variant has a typed call shape ([`AlertCall`], [`ConfirmCall`],
//! [`ErrorCall`]) that a pure `normalize_*` function turns into a
//! [`DialogSpec`]. The `sniff_*` functions resolve loosely typed argument
//! lists (as received by the string-keyed dispatcher) into those shapes:
//!
//! | Variant | Title is missing when |
//! |---------|-----------------------|
//! | alert   | fewer than 2 arguments |
//! | confirm | fewer than 3 arguments |
//! | error   | argument 0 or argument 1 is not a string |
//!
//! When the title is missing the first argument becomes the message and
//! the argument after it fills the callback slot. Sniffing never fails: a
//! non-callback value in a callback slot is logged and ignored, a
//! non-string message is rendered as JSON text.

use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

use spmodal_core::{ModalError, Value};
use tracing::{debug, warn};

use crate::context::ModalContext;
use crate::modal::dialog::{DialogCallback, DialogKind, MessageDialog};

/// Default titles and button labels.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DialogDefaults {
    pub alert_title: String,
    pub confirm_title: String,
    pub error_title: String,
    pub ok_label: String,
    pub cancel_label: String,
    /// Message shown by a loading dialog created without one.
    pub loading_message: Option<String>,
}

impl Default for DialogDefaults {
    fn default() -> Self {
        Self {
            alert_title: "Alert".into(),
            confirm_title: "Confirm".into(),
            error_title: "Error".into(),
            ok_label: "Ok".into(),
            cancel_label: "Cancel".into(),
            loading_message: None,
        }
    }
}

/// Canonical `{title, message, callback}` record a variant is built from.
#[derive(Clone)]
pub struct DialogSpec {
    pub title: String,
    pub message: String,
    pub callback: Option<DialogCallback>,
}

impl fmt::Debug for DialogSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogSpec")
            .field("title", &self.title)
            .field("message", &self.message)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Call shapes of `alert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertCall {
    Message(String),
    Titled { title: String, message: String },
}

impl From<&str> for AlertCall {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<(&str, &str)> for AlertCall {
    fn from((title, message): (&str, &str)) -> Self {
        Self::Titled {
            title: title.to_string(),
            message: message.to_string(),
        }
    }
}

/// Call shapes of `confirm`.
#[derive(Clone)]
pub enum ConfirmCall {
    Message {
        message: String,
        on_accept: Option<DialogCallback>,
    },
    Titled {
        title: String,
        message: String,
        on_accept: Option<DialogCallback>,
    },
}

impl ConfirmCall {
    /// Default title, `on_accept` after "Ok".
    pub fn message(message: impl Into<String>, on_accept: impl Fn(&MessageDialog) + 'static) -> Self {
        Self::Message {
            message: message.into(),
            on_accept: Some(Rc::new(on_accept)),
        }
    }

    pub fn titled(
        title: impl Into<String>,
        message: impl Into<String>,
        on_accept: impl Fn(&MessageDialog) + 'static,
    ) -> Self {
        Self::Titled {
            title: title.into(),
            message: message.into(),
            on_accept: Some(Rc::new(on_accept)),
        }
    }
}

/// Call shapes of `error`.
#[derive(Clone)]
pub enum ErrorCall {
    Message {
        message: String,
        on_ready: Option<DialogCallback>,
    },
    Titled {
        title: String,
        message: String,
        on_ready: Option<DialogCallback>,
    },
}

impl ErrorCall {
    /// Default title, no customization.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
            on_ready: None,
        }
    }

    pub fn titled(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Titled {
            title: title.into(),
            message: message.into(),
            on_ready: None,
        }
    }

    /// Run `on_ready` against the dialog before it is shown.
    #[must_use]
    pub fn on_ready(mut self, f: impl Fn(&MessageDialog) + 'static) -> Self {
        let callback: DialogCallback = Rc::new(f);
        match &mut self {
            Self::Message { on_ready, .. } | Self::Titled { on_ready, .. } => {
                *on_ready = Some(callback);
            }
        }
        self
    }
}

impl fmt::Debug for ConfirmCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message { message, on_accept } => f
                .debug_struct("Message")
                .field("message", message)
                .field("on_accept", &on_accept.is_some())
                .finish(),
            Self::Titled {
                title,
                message,
                on_accept,
            } => f
                .debug_struct("Titled")
                .field("title", title)
                .field("message", message)
                .field("on_accept", &on_accept.is_some())
                .finish(),
        }
    }
}

impl fmt::Debug for ErrorCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message { message, on_ready } => f
                .debug_struct("Message")
                .field("message", message)
                .field("on_ready", &on_ready.is_some())
                .finish(),
            Self::Titled {
                title,
                message,
                on_ready,
            } => f
                .debug_struct("Titled")
                .field("title", title)
                .field("message", message)
                .field("on_ready", &on_ready.is_some())
                .finish(),
        }
    }
}

/// One loosely typed argument.
#[derive(Clone)]
pub enum DialogArg {
    Str(String),
    Callback(DialogCallback),
    Value(Value),
}

impl fmt::Debug for DialogArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
        }
    }
}

impl From<&str> for DialogArg {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for DialogArg {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Value> for DialogArg {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Str(s),
            other => Self::Value(other),
        }
    }
}

impl From<DialogCallback> for DialogArg {
    fn from(callback: DialogCallback) -> Self {
        Self::Callback(callback)
    }
}

impl DialogArg {
    #[must_use]
    pub fn is_str(&self) -> bool {
        matches!(self, Self::Str(_))
    }

    /// Text of a message or title slot.
    fn into_text(self) -> String {
        match self {
            Self::Str(s) => s,
            Self::Value(Value::Null) => String::new(),
            Self::Value(v) => v.to_string(),
            Self::Callback(_) => {
                warn!("callback passed where text was expected; using empty text");
                String::new()
            }
        }
    }

    fn into_callback(self, slot: &str) -> Option<DialogCallback> {
        match self {
            Self::Callback(cb) => Some(cb),
            Self::Value(Value::Null) => None,
            other => {
                warn!(slot, arg = ?other, "ignoring non-callback argument");
                None
            }
        }
    }
}

fn text_at(args: &mut [Option<DialogArg>], index: usize) -> String {
    args.get_mut(index)
        .and_then(Option::take)
        .map(DialogArg::into_text)
        .unwrap_or_default()
}

fn callback_at(args: &mut [Option<DialogArg>], index: usize, slot: &str) -> Option<DialogCallback> {
    args.get_mut(index)
        .and_then(Option::take)
        .and_then(|arg| arg.into_callback(slot))
}

fn slots(args: Vec<DialogArg>) -> Vec<Option<DialogArg>> {
    args.into_iter().map(Some).collect()
}

// --- Sniffing ---

/// `alert(title, message?)`.
pub fn sniff_alert(args: Vec<DialogArg>) -> AlertCall {
    let count = args.len();
    let mut args = slots(args);
    if count < 2 {
        AlertCall::Message(text_at(&mut args, 0))
    } else {
        AlertCall::Titled {
            title: text_at(&mut args, 0),
            message: text_at(&mut args, 1),
        }
    }
}

/// `confirm(title, message?, on_accept?)`.
pub fn sniff_confirm(args: Vec<DialogArg>) -> ConfirmCall {
    let count = args.len();
    let mut args = slots(args);
    if count < 3 {
        ConfirmCall::Message {
            message: text_at(&mut args, 0),
            on_accept: callback_at(&mut args, 1, "on_accept"),
        }
    } else {
        ConfirmCall::Titled {
            title: text_at(&mut args, 0),
            message: text_at(&mut args, 1),
            on_accept: callback_at(&mut args, 2, "on_accept"),
        }
    }
}

/// `error(title, message?, on_ready?)`.
///
/// Decided by type, not count: `error("a", cb, x)` is the message form and
/// `x` is dropped.
pub fn sniff_error(args: Vec<DialogArg>) -> ErrorCall {
    let titled = args.first().is_some_and(DialogArg::is_str)
        && args.get(1).is_some_and(DialogArg::is_str);
    let mut args = slots(args);
    if titled {
        ErrorCall::Titled {
            title: text_at(&mut args, 0),
            message: text_at(&mut args, 1),
            on_ready: callback_at(&mut args, 2, "on_ready"),
        }
    } else {
        ErrorCall::Message {
            message: text_at(&mut args, 0),
            on_ready: callback_at(&mut args, 1, "on_ready"),
        }
    }
}

// --- Normalization ---

#[must_use]
pub fn normalize_alert(call: AlertCall, defaults: &DialogDefaults) -> DialogSpec {
    match call {
        AlertCall::Message(message) => DialogSpec {
            title: defaults.alert_title.clone(),
            message,
            callback: None,
        },
        AlertCall::Titled { title, message } => DialogSpec {
            title,
            message,
            callback: None,
        },
    }
}

#[must_use]
pub fn normalize_confirm(call: ConfirmCall, defaults: &DialogDefaults) -> DialogSpec {
    match call {
        ConfirmCall::Message { message, on_accept } => DialogSpec {
            title: defaults.confirm_title.clone(),
            message,
            callback: on_accept,
        },
        ConfirmCall::Titled {
            title,
            message,
            on_accept,
        } => DialogSpec {
            title,
            message,
            callback: on_accept,
        },
    }
}

#[must_use]
pub fn normalize_error(call: ErrorCall, defaults: &DialogDefaults) -> DialogSpec {
    match call {
        ErrorCall::Message { message, on_ready } => DialogSpec {
            title: defaults.error_title.clone(),
            message,
            callback: on_ready,
        },
        ErrorCall::Titled {
            title,
            message,
            on_ready,
        } => DialogSpec {
            title,
            message,
            callback: on_ready,
        },
    }
}

// --- Builders ---

/// Dialog with a single "Ok" button that closes it.
pub fn alert(ctx: &ModalContext, call: AlertCall) -> MessageDialog {
    let defaults = ctx.defaults();
    let spec = normalize_alert(call, defaults);
    let dialog = MessageDialog::with_kind(ctx, DialogKind::Alert, spec.title, spec.message);
    dialog.add_button(defaults.ok_label.clone(), MessageDialog::close);
    dialog
}

/// Dialog with "Ok" (closes, then runs `on_accept`) and "Cancel" (closes).
pub fn confirm(ctx: &ModalContext, call: ConfirmCall) -> MessageDialog {
    let defaults = ctx.defaults();
    let spec = normalize_confirm(call, defaults);
    let dialog = MessageDialog::with_kind(ctx, DialogKind::Confirm, spec.title, spec.message);
    let on_accept = spec.callback;
    dialog.add_button(defaults.ok_label.clone(), move |d| {
        d.close();
        if let Some(cb) = &on_accept {
            cb(d);
        }
    });
    dialog.add_button(defaults.cancel_label.clone(), MessageDialog::close);
    dialog
}

/// Show an error dialog, then signal failure.
///
/// `on_ready` runs against the dialog before it is shown, so it can
/// customize alignment or markup. The dialog is visible by the time this
/// returns, and this always returns [`ModalError::UserRaised`].
pub fn error(ctx: &ModalContext, call: ErrorCall) -> Result<Infallible, ModalError> {
    let defaults = ctx.defaults();
    let spec = normalize_error(call, defaults);
    let message = spec.message.clone();
    let dialog = MessageDialog::with_kind(ctx, DialogKind::Error, spec.title, spec.message);
    dialog.add_button(defaults.ok_label.clone(), MessageDialog::close);
    if let Some(on_ready) = spec.callback {
        on_ready(&dialog);
    }
    dialog.show();
    debug!(dialog = %dialog.id(), "raising user error");
    Err(ModalError::UserRaised {
        message,
        dialog: Some(dialog.id()),
    })
}

/// Busy indicator without buttons.
pub fn loading(ctx: &ModalContext, message: Option<String>) -> MessageDialog {
    let message = message
        .or_else(|| ctx.defaults().loading_message.clone())
        .unwrap_or_default();
    MessageDialog::with_kind(ctx, DialogKind::Loading, String::new(), message)
}
