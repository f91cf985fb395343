#![forbid(unsafe_code)]

//! Submission channels and their one-shot replies.
//!
//! # Invariants
//!
//! - A [`ChannelReply`] completes its upload at most once; it is consumed by
//!   [`ChannelReply::complete`].
//! - A reply dropped without completing rejects the upload with a transport
//!   failure on the next event-loop turn, unless the upload already settled.
//! - A reply arriving after the upload settled (aborted, or failed on drop)
//!   is discarded and logged.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use spmodal_core::{Deferred, EventLoop, ModalError, Result};
use tracing::{debug, warn};

use crate::form::UploadForm;

static SUBMISSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of one submission on its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionId(u64);

impl SubmissionId {
    pub fn next() -> Self {
        Self(SUBMISSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upload-{}", self.0)
    }
}

/// Transport that delivers an [`UploadForm`] somewhere and reports back.
pub trait SubmissionChannel {
    /// Start submitting `form`. Must not block; the outcome goes to `reply`.
    ///
    /// An `Err` means nothing was started.
    fn submit(&self, id: SubmissionId, form: UploadForm, reply: ChannelReply) -> Result<()>;

    /// Best-effort teardown of a submission in flight.
    fn cancel(&self, id: SubmissionId);
}

/// One-shot completion handle for a submission.
pub struct ChannelReply {
    id: SubmissionId,
    deferred: Deferred<String>,
    event_loop: EventLoop,
    completed: bool,
}

impl fmt::Debug for ChannelReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelReply")
            .field("id", &self.id)
            .field("completed", &self.completed)
            .finish()
    }
}

impl ChannelReply {
    pub(crate) fn new(id: SubmissionId, deferred: Deferred<String>, event_loop: EventLoop) -> Self {
        Self {
            id,
            deferred,
            event_loop,
            completed: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    /// Whether the upload is still waiting for this reply.
    #[must_use]
    pub fn is_wanted(&self) -> bool {
        self.deferred.is_pending()
    }

    /// Settle the upload. Returns false when it had already settled, in
    /// which case `result` is discarded.
    pub fn complete(mut self, result: Result<String>) -> bool {
        self.completed = true;
        let ok = result.is_ok();
        let settled = self.deferred.settle(result);
        if settled {
            debug!(upload = %self.id, ok, "upload settled");
        } else {
            warn!(upload = %self.id, "discarding late upload reply");
        }
        settled
    }
}

impl Drop for ChannelReply {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let id = self.id;
        let deferred = self.deferred.clone();
        self.event_loop.defer(move || {
            if deferred.reject(ModalError::transport("channel closed before a response")) {
                warn!(upload = %id, "submission channel dropped its reply");
            }
        });
    }
}
