#![forbid(unsafe_code)]

//! Host capabilities consumed by spmodal.
//!
//! The core never touches markup directly. It asks a [`Toolkit`] to create,
//! attach, detach, show, and hide elements and to bind click callbacks, and
//! it asks a [`DocumentRuntime`] to load isolated embedded documents. How
//! those requests turn into pixels is the host's business.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::channel::FrameBinding;
use crate::error::{ModalError, Result};
use crate::ids::{BindingId, ElementId};

/// Horizontal alignment of a dialog body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
    Justify,
}

impl TextAlign {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }
}

impl fmt::Display for TextAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextAlign {
    type Err = ModalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            "justify" => Ok(Self::Justify),
            other => Err(ModalError::invalid_argument(format!(
                "unknown text alignment: {other}"
            ))),
        }
    }
}

/// Structural description of an element to create or update.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementSpec {
    /// Full-window layer behind a modal.
    Backdrop,
    /// Embedded document container.
    Frame { src: String },
    /// Dialog box container.
    Dialog,
    Title { text: String },
    /// Dialog body; `html` selects markup over plain text.
    Body {
        content: String,
        html: bool,
        align: TextAlign,
    },
    Button { label: String },
    /// Busy indicator of a loading dialog.
    Spinner,
}

/// Element and event primitives of the host UI toolkit.
///
/// Implementations own element storage; ids they return are opaque to the
/// core. Calls with an unknown id must be ignored, never panic.
pub trait Toolkit {
    fn create(&self, spec: ElementSpec) -> ElementId;

    /// Replace the description of an existing element (re-render).
    fn update(&self, element: ElementId, spec: ElementSpec);

    /// Attach under `parent`, or at the top level when `None`.
    fn attach(&self, element: ElementId, parent: Option<ElementId>);

    /// Detach and discard the element and its children.
    fn detach(&self, element: ElementId);

    fn set_visible(&self, element: ElementId, visible: bool);

    fn set_z_index(&self, element: ElementId, z_index: u32);

    /// Explicit position; `None` leaves that axis to the toolkit (centered).
    fn set_position(&self, element: ElementId, x: Option<i32>, y: Option<i32>);

    fn focus(&self, element: ElementId);

    fn blur(&self, element: ElementId);

    fn bind(&self, element: ElementId, event: &str, callback: Rc<dyn Fn()>) -> BindingId;

    fn unbind(&self, binding: BindingId);
}

/// Request to load an embedded document into a frame element.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub frame: ElementId,
    pub url: String,
    pub binding: FrameBinding,
}

/// Creates isolated document contexts.
pub trait DocumentRuntime {
    /// Begin loading. Must not block; the document signals readiness through
    /// its port.
    fn load(&self, request: LoadRequest) -> Result<()>;

    /// Tear down whatever was loaded into `frame`.
    fn unload(&self, frame: ElementId);
}

/// The embedded document's view of the context it runs in.
///
/// A document loaded by a modal window carries the [`FrameBinding`] it was
/// handed; one opened any other way does not.
#[derive(Debug, Clone)]
pub struct EmbeddedDocument {
    url: String,
    binding: Option<FrameBinding>,
}

impl EmbeddedDocument {
    /// A document loaded into a modal window frame.
    pub fn framed(url: impl Into<String>, binding: FrameBinding) -> Self {
        Self {
            url: url.into(),
            binding: Some(binding),
        }
    }

    /// A document that was not opened by a modal window.
    pub fn standalone(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            binding: None,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn binding(&self) -> Option<&FrameBinding> {
        self.binding.as_ref()
    }
}

/// Check a document or endpoint URL and return it trimmed.
///
/// Relative URLs are fine; empty ones, or ones containing whitespace or
/// control characters, are rejected.
pub fn validate_url(url: &str) -> Result<&str> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ModalError::invalid_argument("url must not be empty"));
    }
    if trimmed
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(ModalError::invalid_argument(format!(
            "url contains whitespace or control characters: {trimmed:?}"
        )));
    }
    Ok(trimmed)
}
