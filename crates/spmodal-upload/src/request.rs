#![forbid(unsafe_code)]

//! Upload requests and their pending results.
//!
//! # Lifecycle
//!
//! `UploadRequest::new` validates; `send` snapshots the input's current
//! files, hands the form to the channel, and returns a [`PendingUpload`]. The pending upload settles exactly once:
//!
//! | Outcome | Result |
//! |---------|--------|
//! | channel replies `Ok(body)` | resolved with `body` |
//! | channel replies `Err(e)` | rejected with `e` |
//! | channel refuses to submit | rejected with the refusal |
//! | channel drops the reply | rejected, `Transport` |
//! | `abort()` | rejected, `Transport("aborted")` |

use std::fmt;
use std::rc::Rc;

use spmodal_core::{Deferred, DeferredState, EventLoop, ModalError, Params, Result, validate_url};
use tracing::debug;

use crate::channel::{ChannelReply, SubmissionChannel, SubmissionId};
use crate::config::UploadConfig;
use crate::form::{UploadForm, fields_from};
use crate::input::UploadInput;

/// One upload, validated and ready to send.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    input: UploadInput,
    url: String,
    fields: Vec<(String, String)>,
    file_field: String,
}

impl UploadRequest {
    /// Build a request with the default field name for unnamed inputs.
    pub fn new(input: impl Into<UploadInput>, url: &str, data: Params) -> Result<Self> {
        Self::configured(input, url, data, &UploadConfig::default())
    }

    /// Build a request, naming unnamed inputs after `config.field_name`.
    ///
    /// Fails with `InvalidArgument` for a bad url or a blank field name.
    pub fn configured(
        input: impl Into<UploadInput>,
        url: &str,
        data: Params,
        config: &UploadConfig,
    ) -> Result<Self> {
        let url = validate_url(url)?.to_string();
        let input = input.into();
        let file_field = input
            .field_name()
            .unwrap_or_else(|| config.field_name.clone());
        if file_field.trim().is_empty() {
            return Err(ModalError::invalid_argument("file input has a blank field name"));
        }
        Ok(Self {
            input,
            url,
            fields: fields_from(&data),
            file_field,
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The form as it would be submitted right now.
    #[must_use]
    pub fn form(&self) -> UploadForm {
        UploadForm {
            url: self.url.clone(),
            fields: self.fields.clone(),
            file_field: self.file_field.clone(),
            files: self.input.snapshot().into_files(),
        }
    }

    /// Submit through `channel`. Settlement is always reported through the
    /// returned upload, never as an error here.
    pub fn send(self, channel: Rc<dyn SubmissionChannel>, event_loop: &EventLoop) -> PendingUpload {
        let form = self.form();
        let id = SubmissionId::next();
        let deferred = Deferred::new();
        let reply = ChannelReply::new(id, deferred.clone(), event_loop.clone());
        debug!(
            upload = %id,
            url = %form.url,
            files = form.files.len(),
            "submitting upload"
        );
        if let Err(err) = channel.submit(id, form, reply) {
            debug!(upload = %id, error = %err, "submission refused");
            deferred.reject(err);
        }
        PendingUpload {
            id,
            deferred,
            channel,
        }
    }
}

/// Result of an upload in flight.
#[derive(Clone)]
pub struct PendingUpload {
    id: SubmissionId,
    deferred: Deferred<String>,
    channel: Rc<dyn SubmissionChannel>,
}

impl fmt::Debug for PendingUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingUpload")
            .field("id", &self.id)
            .field("state", &self.deferred.state())
            .finish()
    }
}

impl PendingUpload {
    #[must_use]
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> DeferredState {
        self.deferred.state()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deferred.is_pending()
    }

    /// The underlying deferred result.
    #[must_use]
    pub fn deferred(&self) -> &Deferred<String> {
        &self.deferred
    }

    /// Settled outcome, if any.
    #[must_use]
    pub fn result(&self) -> Option<Result<String>> {
        self.deferred.result()
    }

    /// Run `f` with the response body on success.
    pub fn done(&self, f: impl FnOnce(&String) + 'static) -> &Self {
        self.deferred.done(f);
        self
    }

    /// Run `f` with the failure.
    pub fn fail(&self, f: impl FnOnce(&ModalError) + 'static) -> &Self {
        self.deferred.fail(f);
        self
    }

    /// Run `f` on either outcome.
    pub fn always(&self, f: impl FnOnce(std::result::Result<&String, &ModalError>) + 'static) -> &Self {
        self.deferred.always(f);
        self
    }

    /// Tear the channel down and reject. Returns false when the upload had
    /// already settled.
    pub fn abort(&self) -> bool {
        if !self.deferred.is_pending() {
            return false;
        }
        self.channel.cancel(self.id);
        debug!(upload = %self.id, "upload aborted");
        self.deferred.reject(ModalError::transport("aborted"))
    }
}
