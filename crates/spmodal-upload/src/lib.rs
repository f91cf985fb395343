#![forbid(unsafe_code)]

//! File uploads for spmodal.
//!
//! An [`UploadRequest`] snapshots a file input, assembles an [`UploadForm`]
//! and hands it to a [`SubmissionChannel`] together with a one-shot
//! [`ChannelReply`]. The caller gets a [`PendingUpload`] that settles exactly
//! once, on a later event-loop turn, with the raw response text or a
//! transport failure.
//!
//! With the `http` feature (on by default) [`HttpChannel`] posts the form as
//! `multipart/form-data`.

pub mod channel;
pub mod config;
pub mod form;
#[cfg(feature = "http")]
pub mod http;
pub mod input;
pub mod request;

pub use channel::{ChannelReply, SubmissionChannel, SubmissionId};
pub use config::UploadConfig;
pub use form::UploadForm;
#[cfg(feature = "http")]
pub use http::HttpChannel;
pub use input::{FileInputRef, FileSet, FileSource, SelectedFile, UploadInput};
pub use request::{PendingUpload, UploadRequest};
