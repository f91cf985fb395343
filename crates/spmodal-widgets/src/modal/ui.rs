#![forbid(unsafe_code)]

//! The embedded document's side of a modal window.
//!
//! A [`UserInterface`] reads the parameters the host passed at load time and
//! sends events back through the document's [`Port`]. It never holds the
//! host's [`ModalWindow`]; every request travels as an envelope addressed
//! by [`ModalId`].
//!
//! [`ModalWindow`]: crate::modal::ModalWindow

use spmodal_core::{
    Bootstrap, EmbeddedDocument, Envelope, FrameBinding, ModalError, ModalId, Params, Port,
    Result, Value,
};
use tracing::{debug, trace};

/// Handle an embedded document uses to talk to the modal window hosting it.
#[derive(Debug, Clone)]
pub struct UserInterface {
    modal: ModalId,
    url: String,
    params: Params,
    port: Port,
}

impl UserInterface {
    /// Attach to the modal window that loaded `target`.
    ///
    /// `binding` overrides the binding `target` was loaded with. Fails with
    /// `Configuration` when there is no binding (the document was not
    /// opened by a modal window), when the bootstrap cannot be read or is
    /// addressed to another modal, or when the host is gone.
    ///
    /// Signals readiness to the host on success.
    pub fn attach(target: &EmbeddedDocument, binding: Option<&FrameBinding>) -> Result<Self> {
        let binding = binding.or_else(|| target.binding()).ok_or_else(|| {
            ModalError::configuration(format!(
                "{} was not opened by a modal window",
                target.url()
            ))
        })?;

        let bootstrap = Bootstrap::from_wire(binding.bootstrap())
            .map_err(|err| ModalError::configuration(format!("unreadable bootstrap: {err}")))?;
        if bootstrap.modal != binding.modal() {
            return Err(ModalError::configuration(format!(
                "bootstrap is addressed to {}, binding to {}",
                bootstrap.modal,
                binding.modal()
            )));
        }
        if !binding.port().is_connected() {
            return Err(ModalError::configuration("host channel is gone"));
        }

        let ui = Self {
            modal: bootstrap.modal,
            url: target.url().to_string(),
            params: bootstrap.params,
            port: binding.port().clone(),
        };
        ui.port.send(&Envelope::ready(ui.modal))?;
        debug!(modal = %ui.modal, url = %ui.url, "user interface attached");
        Ok(ui)
    }

    /// The modal window this document belongs to.
    #[must_use]
    pub fn modal(&self) -> ModalId {
        self.modal
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// A parameter passed by the host, `None` when absent.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Fire `event` at the host's listeners. Fire-and-forget.
    pub fn trigger(&self, event: &str, payload: Option<Value>) -> Result<()> {
        if event.is_empty() {
            return Err(ModalError::invalid_argument("event name must not be empty"));
        }
        trace!(modal = %self.modal, event, "triggering event");
        self.port.send(&Envelope::event(self.modal, event, payload))?;
        Ok(())
    }

    /// Ask the host to close the modal window.
    pub fn close(&self) -> Result<()> {
        self.port.send(&Envelope::close(self.modal))?;
        Ok(())
    }
}
