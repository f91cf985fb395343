#![forbid(unsafe_code)]

//! Wire format for messages crossing the host / embedded document boundary.
//!
//! Both sides run in isolated contexts, so an [`Envelope`] is always turned
//! into JSON text before it crosses and parsed back on the other side. No
//! object identity survives the trip.

use serde::{Deserialize, Serialize};

use crate::error::{ModalError, Result};
use crate::ids::ModalId;
use crate::params::{Params, Value};

/// What an envelope asks the host to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    /// The embedded document finished initializing.
    Ready,
    /// A named user event, dispatched to host listeners.
    Event,
    /// The embedded document asks the host to close the modal.
    Close,
}

/// `{target, kind, event, payload}` message addressed to one modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub target: ModalId,
    pub kind: EnvelopeKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Envelope {
    pub fn ready(target: ModalId) -> Self {
        Self {
            target,
            kind: EnvelopeKind::Ready,
            event: String::new(),
            payload: None,
        }
    }

    pub fn event(target: ModalId, event: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            target,
            kind: EnvelopeKind::Event,
            event: event.into(),
            payload,
        }
    }

    pub fn close(target: ModalId) -> Self {
        Self {
            target,
            kind: EnvelopeKind::Close,
            event: String::new(),
            payload: None,
        }
    }

    pub fn to_wire(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|err| ModalError::invalid_argument(format!("unserializable envelope: {err}")))
    }

    pub fn from_wire(wire: &str) -> serde_json::Result<Self> {
        serde_json::from_str(wire)
    }
}

/// Parameters handed to an embedded document when it is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bootstrap {
    pub modal: ModalId,
    #[serde(default)]
    pub params: Params,
}

impl Bootstrap {
    pub fn to_wire(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|err| ModalError::invalid_argument(format!("unserializable parameters: {err}")))
    }

    pub fn from_wire(wire: &str) -> serde_json::Result<Self> {
        serde_json::from_str(wire)
    }
}
