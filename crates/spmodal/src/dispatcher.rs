#![forbid(unsafe_code)]

//! String-keyed adapter over [`SpModal`].
//!
//! [`SpModal::invoke`] resolves a method name to a [`Method`] before doing
//! anything else, so an unknown name fails with `MethodNotFound` and
//! creates nothing. Remaining arguments are forwarded positionally; the
//! dialog presets sniff them by count and type, everything else requires
//! the argument kinds listed on each [`Method`].

use std::fmt;
use std::str::FromStr;

use spmodal_core::{EmbeddedDocument, FrameBinding, ModalError, Params, Result, Value};
use spmodal_upload::{PendingUpload, UploadInput};
use spmodal_widgets::modal::presets::{self, DialogArg};
use spmodal_widgets::{DialogCallback, MessageDialog, ModalWindow, UserInterface};
use tracing::debug;

use crate::modal::SpModal;

/// Operations reachable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `window(url, params?)`
    Window,
    /// `ui(document, binding?)`
    Ui,
    /// `message(title, message?)`
    Message,
    /// `alert(title, message?)`
    Alert,
    /// `confirm(title, message?, on_accept?)`
    Confirm,
    /// `error(title, message?, on_ready?)`
    Error,
    /// `loading(message?)`
    Loading,
    /// `upload(input, url, data?)`
    Upload,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::Window,
        Method::Ui,
        Method::Message,
        Method::Alert,
        Method::Confirm,
        Method::Error,
        Method::Loading,
        Method::Upload,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Ui => "ui",
            Self::Message => "message",
            Self::Alert => "alert",
            Self::Confirm => "confirm",
            Self::Error => "error",
            Self::Loading => "loading",
            Self::Upload => "upload",
        }
    }

    /// Exact, case-sensitive lookup.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.name() == name)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = ModalError;

    fn from_str(name: &str) -> Result<Self> {
        Self::from_name(name).ok_or_else(|| ModalError::MethodNotFound(name.to_string()))
    }
}

/// One positional argument.
#[derive(Clone)]
pub enum Arg {
    Str(String),
    Value(Value),
    Callback(DialogCallback),
    Params(Params),
    Document(EmbeddedDocument),
    Binding(FrameBinding),
    Input(UploadInput),
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Params(p) => f.debug_tuple("Params").field(p).finish(),
            Self::Document(d) => f.debug_tuple("Document").field(d).finish(),
            Self::Binding(b) => f.debug_tuple("Binding").field(b).finish(),
            Self::Input(i) => f.debug_tuple("Input").field(i).finish(),
        }
    }
}

impl Arg {
    /// Wrap a dialog callback.
    pub fn callback(f: impl Fn(&MessageDialog) + 'static) -> Self {
        Self::Callback(std::rc::Rc::new(f))
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Value(_) => "value",
            Self::Callback(_) => "callback",
            Self::Params(_) => "params",
            Self::Document(_) => "document",
            Self::Binding(_) => "binding",
            Self::Input(_) => "input",
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Params> for Arg {
    fn from(params: Params) -> Self {
        Self::Params(params)
    }
}

impl From<EmbeddedDocument> for Arg {
    fn from(document: EmbeddedDocument) -> Self {
        Self::Document(document)
    }
}

impl From<FrameBinding> for Arg {
    fn from(binding: FrameBinding) -> Self {
        Self::Binding(binding)
    }
}

impl From<UploadInput> for Arg {
    fn from(input: UploadInput) -> Self {
        Self::Input(input)
    }
}

/// What an invoked method returned.
#[derive(Debug)]
pub enum Outcome {
    Window(ModalWindow),
    Ui(UserInterface),
    Dialog(MessageDialog),
    Upload(PendingUpload),
}

impl Outcome {
    #[must_use]
    pub fn into_window(self) -> Option<ModalWindow> {
        match self {
            Self::Window(window) => Some(window),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_ui(self) -> Option<UserInterface> {
        match self {
            Self::Ui(ui) => Some(ui),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_dialog(self) -> Option<MessageDialog> {
        match self {
            Self::Dialog(dialog) => Some(dialog),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_upload(self) -> Option<PendingUpload> {
        match self {
            Self::Upload(upload) => Some(upload),
            _ => None,
        }
    }
}

fn wrong_kind(method: Method, position: usize, expected: &str, got: &Arg) -> ModalError {
    ModalError::invalid_argument(format!(
        "{method}: argument {position} must be {expected}, got {}",
        got.kind()
    ))
}

/// Required string argument.
fn string_at(method: Method, args: &[Arg], position: usize) -> Result<String> {
    match args.get(position) {
        Some(Arg::Str(s)) => Ok(s.clone()),
        Some(Arg::Value(Value::String(s))) => Ok(s.clone()),
        Some(other) => Err(wrong_kind(method, position, "a string", other)),
        None => Err(ModalError::invalid_argument(format!(
            "{method}: missing argument {position}"
        ))),
    }
}

/// Optional text argument; non-string values render as JSON text.
fn text_at(method: Method, args: &[Arg], position: usize) -> Result<Option<String>> {
    match args.get(position) {
        None | Some(Arg::Value(Value::Null)) => Ok(None),
        Some(Arg::Str(s)) => Ok(Some(s.clone())),
        Some(Arg::Value(Value::String(s))) => Ok(Some(s.clone())),
        Some(Arg::Value(v)) => Ok(Some(v.to_string())),
        Some(other) => Err(wrong_kind(method, position, "text", other)),
    }
}

/// Optional parameter bag.
fn params_at(method: Method, args: &[Arg], position: usize) -> Result<Option<Params>> {
    match args.get(position) {
        None => Ok(None),
        Some(Arg::Params(p)) => Ok(Some(p.clone())),
        Some(Arg::Value(v)) => Params::from_value(v.clone()).map(Some),
        Some(other) => Err(wrong_kind(method, position, "params", other)),
    }
}

fn dialog_args(method: Method, args: Vec<Arg>) -> Result<Vec<DialogArg>> {
    args.into_iter()
        .enumerate()
        .map(|(position, arg)| match arg {
            Arg::Str(s) => Ok(DialogArg::Str(s)),
            Arg::Value(v) => Ok(DialogArg::from(v)),
            Arg::Callback(cb) => Ok(DialogArg::Callback(cb)),
            Arg::Params(p) => Ok(DialogArg::Value(p.into_value())),
            other => Err(wrong_kind(method, position, "text or a callback", &other)),
        })
        .collect()
}

impl SpModal {
    /// Call an operation by name.
    ///
    /// `error` never produces an outcome: it shows its dialog and returns
    /// `UserRaised`.
    pub fn invoke(&self, name: &str, args: Vec<Arg>) -> Result<Outcome> {
        let method = Method::from_str(name)?;
        debug!(method = %method, args = args.len(), "invoking");
        let ctx = self.context();
        match method {
            Method::Window => {
                let url = string_at(method, &args, 0)?;
                let params = params_at(method, &args, 1)?;
                self.window(&url, params).map(Outcome::Window)
            }
            Method::Ui => {
                let document = match args.first() {
                    Some(Arg::Document(document)) => document,
                    Some(other) => return Err(wrong_kind(method, 0, "a document", other)),
                    None => {
                        return Err(ModalError::configuration(
                            "ui: no target document to attach to",
                        ));
                    }
                };
                let binding = match args.get(1) {
                    None | Some(Arg::Value(Value::Null)) => None,
                    Some(Arg::Binding(binding)) => Some(binding),
                    Some(other) => return Err(wrong_kind(method, 1, "a binding", other)),
                };
                self.ui(document, binding).map(Outcome::Ui)
            }
            Method::Message => {
                let title = text_at(method, &args, 0)?.unwrap_or_default();
                let message = text_at(method, &args, 1)?;
                Ok(Outcome::Dialog(self.message(&title, message.as_deref())))
            }
            Method::Alert => {
                let call = presets::sniff_alert(dialog_args(method, args)?);
                Ok(Outcome::Dialog(presets::alert(ctx, call)))
            }
            Method::Confirm => {
                let call = presets::sniff_confirm(dialog_args(method, args)?);
                Ok(Outcome::Dialog(presets::confirm(ctx, call)))
            }
            Method::Error => {
                let call = presets::sniff_error(dialog_args(method, args)?);
                match presets::error(ctx, call) {
                    Err(err) => Err(err),
                    Ok(never) => match never {},
                }
            }
            Method::Loading => {
                let message = text_at(method, &args, 0)?;
                Ok(Outcome::Dialog(self.loading(message.as_deref())))
            }
            Method::Upload => {
                let input = match args.first() {
                    Some(Arg::Input(input)) => input.clone(),
                    Some(other) => return Err(wrong_kind(method, 0, "a file input", other)),
                    None => {
                        return Err(ModalError::invalid_argument("upload: missing file input"));
                    }
                };
                let url = string_at(method, &args, 1)?;
                let data = params_at(method, &args, 2)?;
                self.upload(input, &url, data).map(Outcome::Upload)
            }
        }
    }
}
