#![forbid(unsafe_code)]

//! Upload channel driven by the test.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use spmodal_core::{ModalError, Result};
use spmodal_upload::{ChannelReply, SubmissionChannel, SubmissionId, UploadForm};

/// A submission waiting for the test to answer it.
#[derive(Debug)]
pub struct Submission {
    pub id: SubmissionId,
    pub form: UploadForm,
    reply: ChannelReply,
}

#[derive(Default)]
struct ScriptState {
    queue: VecDeque<Submission>,
    forms: Vec<UploadForm>,
    cancelled: Vec<SubmissionId>,
    offline: Option<String>,
}

/// Queues submissions; the test answers them in order.
#[derive(Default)]
pub struct ScriptedChannel {
    state: RefCell<ScriptState>,
}

impl ScriptedChannel {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Refuse every future submission with `Transport(reason)`.
    pub fn go_offline(&self, reason: impl Into<String>) {
        self.state.borrow_mut().offline = Some(reason.into());
    }

    /// Submissions not yet answered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Every form ever submitted, in order.
    #[must_use]
    pub fn forms(&self) -> Vec<UploadForm> {
        self.state.borrow().forms.clone()
    }

    #[must_use]
    pub fn cancelled(&self) -> Vec<SubmissionId> {
        self.state.borrow().cancelled.clone()
    }

    /// Take the oldest unanswered submission.
    pub fn next(&self) -> Option<Submission> {
        self.state.borrow_mut().queue.pop_front()
    }

    /// Answer the oldest submission with a response body.
    pub fn respond(&self, body: impl Into<String>) -> bool {
        self.next()
            .is_some_and(|sub| sub.reply.complete(Ok(body.into())))
    }

    /// Fail the oldest submission with a transport error.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.next()
            .is_some_and(|sub| sub.reply.complete(Err(ModalError::transport(reason))))
    }

    /// Drop the oldest submission's reply unanswered.
    pub fn drop_reply(&self) -> bool {
        self.next().is_some()
    }
}

impl Submission {
    /// Answer this submission.
    pub fn complete(self, result: Result<String>) -> bool {
        self.reply.complete(result)
    }
}

impl SubmissionChannel for ScriptedChannel {
    fn submit(&self, id: SubmissionId, form: UploadForm, reply: ChannelReply) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(reason) = &state.offline {
            return Err(ModalError::transport(reason.clone()));
        }
        state.forms.push(form.clone());
        state.queue.push_back(Submission { id, form, reply });
        Ok(())
    }

    /// Records the cancellation but keeps the submission queued, so tests
    /// can deliver a late reply.
    fn cancel(&self, id: SubmissionId) {
        self.state.borrow_mut().cancelled.push(id);
    }
}
