#![forbid(unsafe_code)]

//! Multipart upload over HTTP.
//!
//! Each submission runs reqwest's blocking client on its own worker thread.
//! Results come back through an mpsc queue that the event loop drains by
//! polling the channel as an [`EventSource`], so replies are always
//! completed on the UI thread.
//!
//! # Failure Modes
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | Relative url without `base_url` | `submit` fails, `Transport` |
//! | Connect error, timeout | rejected, `Transport` |
//! | Non-2xx status | rejected, `Transport` carrying the status |
//! | Result for a cancelled submission | discarded, `warn!` |

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use spmodal_core::{EventLoop, EventSource, ModalError, Result};
use tracing::{debug, warn};
use url::Url;

use crate::channel::{ChannelReply, SubmissionChannel, SubmissionId};
use crate::config::UploadConfig;
use crate::form::UploadForm;
use crate::input::{FileSource, SelectedFile};

type Completion = (SubmissionId, Result<String>);

/// Submission channel posting `multipart/form-data` with reqwest.
pub struct HttpChannel {
    client: Client,
    base_url: Option<Url>,
    inflight: RefCell<HashMap<SubmissionId, ChannelReply>>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl fmt::Debug for HttpChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpChannel")
            .field("base_url", &self.base_url)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl HttpChannel {
    /// Build a channel and register it with `event_loop`.
    ///
    /// The loop holds the channel weakly; keep the returned `Rc` alive for
    /// as long as uploads may be in flight.
    pub fn new(config: &UploadConfig, event_loop: &EventLoop) -> Result<Rc<Self>> {
        let base_url = config
            .base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|err| ModalError::configuration(format!("invalid upload base url: {err}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ModalError::configuration(format!("build upload http client: {err}")))?;
        let (tx, rx) = mpsc::channel();

        let channel = Rc::new(Self {
            client,
            base_url,
            inflight: RefCell::new(HashMap::new()),
            tx,
            rx,
        });
        let source: Rc<dyn EventSource> = channel.clone();
        event_loop.add_source(&source);
        Ok(channel)
    }

    /// Submissions still waiting for a response.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inflight.borrow().len()
    }

    /// Block up to `timeout` for one worker to finish, then complete every
    /// reply that is ready. Returns how many were completed.
    ///
    /// For command-line hosts without a UI event loop of their own.
    pub fn wait(&self, timeout: Duration) -> usize {
        if self.in_flight() == 0 {
            return 0;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => {
                self.finish(completion);
                1 + self.drain()
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => 0,
        }
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| {
                    ModalError::transport(format!("relative upload url {url:?} needs a base url"))
                })?;
                base.join(url)
                    .map_err(|err| ModalError::transport(format!("invalid upload url {url:?}: {err}")))
            }
            Err(err) => Err(ModalError::transport(format!("invalid upload url {url:?}: {err}"))),
        }
    }

    fn finish(&self, (id, result): Completion) {
        let reply = self.inflight.borrow_mut().remove(&id);
        match reply {
            Some(reply) => {
                reply.complete(result);
            }
            None => warn!(upload = %id, "discarding late upload reply"),
        }
    }

    fn drain(&self) -> usize {
        let mut count = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.finish(completion);
            count += 1;
        }
        count
    }
}

impl SubmissionChannel for HttpChannel {
    fn submit(&self, id: SubmissionId, form: UploadForm, reply: ChannelReply) -> Result<()> {
        let url = self.resolve(&form.url)?;
        self.inflight.borrow_mut().insert(id, reply);

        let client = self.client.clone();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = post(&client, url, form);
            // The receiver is gone only when the channel itself was dropped.
            let _ = tx.send((id, result));
        });
        debug!(upload = %id, "upload worker started");
        Ok(())
    }

    fn cancel(&self, id: SubmissionId) {
        if self.inflight.borrow_mut().remove(&id).is_some() {
            debug!(upload = %id, "upload cancelled; worker result will be discarded");
        }
    }
}

impl EventSource for HttpChannel {
    fn poll(&self) -> usize {
        self.drain()
    }
}

fn post(client: &Client, url: Url, form: UploadForm) -> Result<String> {
    let multipart = build_multipart(form)?;
    let response = client
        .post(url)
        .multipart(multipart)
        .send()
        .map_err(|err| ModalError::transport(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ModalError::transport(format!("server responded {status}")));
    }
    response
        .text()
        .map_err(|err| ModalError::transport(format!("read response body: {err}")))
}

fn build_multipart(form: UploadForm) -> Result<Form> {
    let mut multipart = Form::new();
    for (name, value) in form.fields {
        multipart = multipart.text(name, value);
    }
    for file in form.files {
        multipart = multipart.part(form.file_field.clone(), file_part(file)?);
    }
    Ok(multipart)
}

fn file_part(file: SelectedFile) -> Result<Part> {
    let part = match file.source {
        FileSource::Bytes(bytes) => Part::bytes(bytes),
        FileSource::Path(path) => Part::file(&path).map_err(|err| {
            ModalError::transport(format!("read {}: {err}", path.display()))
        })?,
    };
    let part = part.file_name(file.file_name);
    match file.content_type {
        Some(mime) => part
            .mime_str(&mime)
            .map_err(|err| ModalError::transport(format!("bad content type {mime:?}: {err}"))),
        None => Ok(part),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FileSet;
    use crate::request::UploadRequest;
    use spmodal_core::Params;

    #[test]
    fn relative_url_without_base_is_a_transport_failure() {
        let ev = EventLoop::new();
        let channel = HttpChannel::new(&UploadConfig::default(), &ev).unwrap();
        let pending = UploadRequest::new(FileSet::new(), "upload.php", Params::new())
            .unwrap()
            .send(channel.clone(), &ev);
        ev.run_until_idle();
        assert!(matches!(pending.result(), Some(Err(ModalError::Transport(_)))));
        assert_eq!(channel.in_flight(), 0);
    }

    #[test]
    fn relative_url_joins_base() {
        let ev = EventLoop::new();
        let config = UploadConfig {
            base_url: Some("http://127.0.0.1:9/app/".into()),
            ..UploadConfig::default()
        };
        let channel = HttpChannel::new(&config, &ev).unwrap();
        let url = channel.resolve("upload.php").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9/app/upload.php");
        let url = channel.resolve("https://example.org/u").unwrap();
        assert_eq!(url.as_str(), "https://example.org/u");
    }

    #[test]
    fn invalid_base_url_is_a_configuration_error() {
        let config = UploadConfig {
            base_url: Some("not a url".into()),
            ..UploadConfig::default()
        };
        let err = HttpChannel::new(&config, &EventLoop::new()).unwrap_err();
        assert!(matches!(err, ModalError::Configuration(_)));
    }

    #[test]
    fn multipart_carries_fields_and_files() {
        let form = UploadForm {
            url: "http://localhost/u".into(),
            fields: vec![("one".into(), "1".into())],
            file_field: "file".into(),
            files: vec![SelectedFile::from_bytes("a.txt", "hi").with_content_type("text/plain")],
        };
        let multipart = build_multipart(form).unwrap();
        assert!(!multipart.boundary().is_empty());
    }

    #[test]
    fn bad_content_type_fails() {
        let file = SelectedFile::from_bytes("a", "x").with_content_type("not a mime\n");
        assert!(matches!(file_part(file), Err(ModalError::Transport(_))));
    }
}
