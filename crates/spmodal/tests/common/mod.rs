#![allow(dead_code)]

use std::rc::Rc;

use spmodal::{Config, SpModal};
use spmodal_harness::{HeadlessDocuments, HeadlessToolkit, ScriptedChannel};

pub struct Host {
    pub toolkit: Rc<HeadlessToolkit>,
    pub documents: Rc<HeadlessDocuments>,
    pub channel: Rc<ScriptedChannel>,
    pub modal: SpModal,
}

pub fn host() -> Host {
    host_with(&Config::default())
}

pub fn host_with(config: &Config) -> Host {
    let toolkit = HeadlessToolkit::new();
    let documents = HeadlessDocuments::new();
    let channel = ScriptedChannel::new();
    let modal = SpModal::isolated(toolkit.clone(), documents.clone(), config)
        .with_upload_channel(channel.clone());
    Host {
        toolkit,
        documents,
        channel,
        modal,
    }
}
