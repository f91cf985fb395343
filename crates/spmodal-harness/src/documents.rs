#![forbid(unsafe_code)]

//! Headless embedded-document runtime.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use spmodal_core::{
    DocumentRuntime, ElementId, EmbeddedDocument, FrameBinding, LoadRequest, ModalError, ModalId,
    Result,
};
use tracing::debug;

#[derive(Default)]
struct DocumentsState {
    loaded: BTreeMap<ElementId, LoadRequest>,
    refused: HashSet<String>,
    history: Vec<String>,
}

/// Records load requests instead of running documents.
///
/// Tests play the embedded page by taking [`document_for`] and attaching a
/// `UserInterface` to it.
///
/// [`document_for`]: HeadlessDocuments::document_for
#[derive(Default)]
pub struct HeadlessDocuments {
    state: RefCell<DocumentsState>,
}

impl HeadlessDocuments {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Make every future load of `url` fail.
    pub fn refuse(&self, url: impl Into<String>) {
        self.state.borrow_mut().refused.insert(url.into());
    }

    #[must_use]
    pub fn is_loaded(&self, frame: ElementId) -> bool {
        self.state.borrow().loaded.contains_key(&frame)
    }

    /// Documents currently loaded.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.state.borrow().loaded.len()
    }

    /// Every url ever loaded, in order.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.borrow().history.clone()
    }

    /// Binding handed to the document of `modal`, while it is loaded.
    #[must_use]
    pub fn binding_for(&self, modal: ModalId) -> Option<FrameBinding> {
        self.state
            .borrow()
            .loaded
            .values()
            .find(|req| req.binding.modal() == modal)
            .map(|req| req.binding.clone())
    }

    /// What the embedded page of `modal` sees of itself.
    #[must_use]
    pub fn document_for(&self, modal: ModalId) -> Option<EmbeddedDocument> {
        self.state
            .borrow()
            .loaded
            .values()
            .find(|req| req.binding.modal() == modal)
            .map(|req| EmbeddedDocument::framed(req.url.clone(), req.binding.clone()))
    }
}

impl DocumentRuntime for HeadlessDocuments {
    fn load(&self, request: LoadRequest) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.refused.contains(&request.url) {
            return Err(ModalError::configuration(format!(
                "no document at {}",
                request.url
            )));
        }
        debug!(url = %request.url, modal = %request.binding.modal(), "loading document");
        state.history.push(request.url.clone());
        state.loaded.insert(request.frame, request);
        Ok(())
    }

    fn unload(&self, frame: ElementId) {
        self.state.borrow_mut().loaded.remove(&frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spmodal_core::{ChannelHub, EventLoop, Params};

    #[test]
    fn load_and_unload() {
        let docs = HeadlessDocuments::new();
        let hub = ChannelHub::new(EventLoop::new());
        let modal = ModalId::next();
        let frame = ElementId::from_raw(7);
        let binding = hub
            .bind(modal, &Params::new().with("k", "v"))
            .unwrap();

        docs.load(LoadRequest {
            frame,
            url: "ui.html".into(),
            binding,
        })
        .unwrap();
        assert!(docs.is_loaded(frame));
        let doc = docs.document_for(modal).unwrap();
        assert_eq!(doc.url(), "ui.html");
        assert_eq!(doc.binding().map(FrameBinding::modal), Some(modal));

        docs.unload(frame);
        assert!(docs.document_for(modal).is_none());
        assert_eq!(docs.history(), vec!["ui.html"]);
    }

    #[test]
    fn refused_url_fails() {
        let docs = HeadlessDocuments::new();
        docs.refuse("gone.html");
        let hub = ChannelHub::new(EventLoop::new());
        let binding = hub.bind(ModalId::next(), &Params::new()).unwrap();
        let err = docs
            .load(LoadRequest {
                frame: ElementId::from_raw(1),
                url: "gone.html".into(),
                binding,
            })
            .unwrap_err();
        assert!(matches!(err, ModalError::Configuration(_)));
        assert_eq!(docs.loaded_count(), 0);
    }
}
