#![forbid(unsafe_code)]

//! Typed entry surface.

use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

use spmodal_core::{
    DocumentRuntime, EmbeddedDocument, FrameBinding, ModalError, Params, Result, Toolkit,
};
use spmodal_upload::{PendingUpload, SubmissionChannel, UploadConfig, UploadInput, UploadRequest};
use spmodal_widgets::modal::presets;
use spmodal_widgets::{
    AlertCall, ConfirmCall, ErrorCall, MessageDialog, ModalContext, ModalWindow, UserInterface,
};

use crate::config::Config;

/// One method per operation, bound to a host toolkit and document runtime.
///
/// Cheap to clone; clones share the context and upload channel.
#[derive(Clone)]
pub struct SpModal {
    ctx: ModalContext,
    upload: UploadConfig,
    channel: Option<Rc<dyn SubmissionChannel>>,
}

impl fmt::Debug for SpModal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpModal")
            .field("ctx", &self.ctx)
            .field("upload", &self.upload)
            .field("channel", &self.channel.is_some())
            .finish()
    }
}

impl SpModal {
    /// Bound to this thread's event loop and dialog stack, default settings.
    pub fn new(toolkit: Rc<dyn Toolkit>, documents: Rc<dyn DocumentRuntime>) -> Self {
        Self::from_context(ModalContext::new(toolkit, documents))
    }

    /// Bound to this thread's event loop and dialog stack, configured by
    /// `config`. The stack settings apply to the shared stack.
    pub fn with_config(
        toolkit: Rc<dyn Toolkit>,
        documents: Rc<dyn DocumentRuntime>,
        config: &Config,
    ) -> Self {
        let ctx = ModalContext::new(toolkit, documents);
        ctx.stack().configure(config.stack);
        Self::configured(ctx, config)
    }

    /// With its own event loop and dialog stack.
    pub fn isolated(
        toolkit: Rc<dyn Toolkit>,
        documents: Rc<dyn DocumentRuntime>,
        config: &Config,
    ) -> Self {
        Self::configured(ModalContext::isolated(toolkit, documents, config.stack), config)
    }

    pub fn from_context(ctx: ModalContext) -> Self {
        Self {
            ctx,
            upload: UploadConfig::default(),
            channel: None,
        }
    }

    fn configured(ctx: ModalContext, config: &Config) -> Self {
        Self {
            ctx: ctx.with_defaults(config.dialogs.clone()),
            upload: config.upload.clone(),
            channel: None,
        }
    }

    /// Route uploads through `channel`.
    #[must_use]
    pub fn with_upload_channel(mut self, channel: Rc<dyn SubmissionChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Route uploads over HTTP using the configured timeout and base url.
    #[cfg(feature = "http")]
    pub fn with_http(self) -> Result<Self> {
        let channel = spmodal_upload::HttpChannel::new(&self.upload, self.ctx.event_loop())?;
        Ok(self.with_upload_channel(channel))
    }

    #[must_use]
    pub fn context(&self) -> &ModalContext {
        &self.ctx
    }

    // --- Operations ---

    /// Open `url` in a modal window.
    pub fn window(&self, url: &str, params: Option<Params>) -> Result<ModalWindow> {
        ModalWindow::open(&self.ctx, url, params.unwrap_or_default())
    }

    /// Attach an embedded document to the modal window that loaded it.
    pub fn ui(&self, target: &EmbeddedDocument, binding: Option<&FrameBinding>) -> Result<UserInterface> {
        UserInterface::attach(target, binding)
    }

    /// Plain dialog; buttons are up to the caller.
    pub fn message(&self, title: &str, message: Option<&str>) -> MessageDialog {
        MessageDialog::new(&self.ctx, title, message.unwrap_or_default())
    }

    pub fn alert(&self, call: impl Into<AlertCall>) -> MessageDialog {
        presets::alert(&self.ctx, call.into())
    }

    pub fn confirm(&self, call: ConfirmCall) -> MessageDialog {
        presets::confirm(&self.ctx, call)
    }

    /// Show an error dialog and fail with [`ModalError::UserRaised`].
    pub fn error(&self, call: ErrorCall) -> Result<Infallible> {
        presets::error(&self.ctx, call)
    }

    pub fn loading(&self, message: Option<&str>) -> MessageDialog {
        presets::loading(&self.ctx, message.map(str::to_string))
    }

    /// Submit `input` and `data` to `url`.
    ///
    /// Fails with `Configuration` when no upload channel is set, and with
    /// `InvalidArgument` for a bad url or input. Transport failures reject
    /// the returned upload instead.
    pub fn upload(
        &self,
        input: impl Into<UploadInput>,
        url: &str,
        data: Option<Params>,
    ) -> Result<PendingUpload> {
        let channel = self
            .channel
            .clone()
            .ok_or_else(|| ModalError::configuration("no upload channel configured"))?;
        let request = UploadRequest::configured(input, url, data.unwrap_or_default(), &self.upload)?;
        Ok(request.send(channel, self.ctx.event_loop()))
    }

    /// Run deferred work until none is left. Returns the number of tasks run.
    pub fn tick(&self) -> usize {
        self.ctx.event_loop().run_until_idle()
    }
}
