mod common;

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::json;
use spmodal::{
    Arg, Config, DeferredState, FileInputRef, FileSet, ModalError, Params, SelectedFile, SpModal,
    UploadInput,
};
use spmodal_harness::{HeadlessDocuments, HeadlessToolkit};
use tracing_test::traced_test;

use common::host;

fn input() -> FileInputRef {
    let input = FileInputRef::named("file");
    input.select([SelectedFile::from_bytes("a.txt", "alpha")]);
    input
}

#[test]
fn resolves_with_raw_response() {
    let h = host();
    let pending = h
        .modal
        .upload(input(), "test.php", Some(Params::new().with("one", 1).with("two", 2)))
        .unwrap();

    let seen = Rc::new(RefCell::new(None));
    {
        let seen = Rc::clone(&seen);
        pending.done(move |body| *seen.borrow_mut() = Some(body.clone()));
    }

    let forms = h.channel.forms();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].url, "test.php");
    assert_eq!(forms[0].field("one"), Some("1"));
    assert_eq!(forms[0].field("two"), Some("2"));
    assert_eq!(forms[0].file_field, "file");
    assert_eq!(forms[0].files[0].file_name, "a.txt");

    assert!(h.channel.respond("{\"ok\":true}"));
    assert_eq!(seen.borrow().as_deref(), Some("{\"ok\":true}"));
    assert_eq!(pending.state(), DeferredState::Resolved);
}

#[test]
fn failure_is_delivered_once_and_late_reply_ignored() {
    let h = host();
    let pending = h.modal.upload(input(), "test.php", None).unwrap();
    let failures = Rc::new(RefCell::new(Vec::new()));
    {
        let failures = Rc::clone(&failures);
        pending.fail(move |err| failures.borrow_mut().push(err.clone()));
    }

    let submission = h.channel.next().unwrap();
    pending.deferred().reject(ModalError::transport("connection reset"));
    assert!(!submission.complete(Ok("late".into())));
    h.modal.tick();

    assert_eq!(
        *failures.borrow(),
        vec![ModalError::transport("connection reset")]
    );
    assert_eq!(pending.state(), DeferredState::Rejected);
}

#[test]
#[traced_test]
fn late_reply_is_logged() {
    let h = host();
    let pending = h.modal.upload(input(), "test.php", None).unwrap();
    let submission = h.channel.next().unwrap();
    assert!(pending.abort());
    assert!(!submission.complete(Ok("late".into())));
    assert!(logs_contain("discarding late upload reply"));
}

#[test]
#[traced_test]
fn dropped_reply_is_logged() {
    let h = host();
    let _pending = h.modal.upload(input(), "test.php", None).unwrap();
    assert!(h.channel.drop_reply());
    h.modal.tick();
    assert!(logs_contain("submission channel dropped its reply"));
}

#[test]
fn server_failure_rejects() {
    let h = host();
    let pending = h.modal.upload(input(), "test.php", None).unwrap();
    assert!(h.channel.fail("server responded 500 Internal Server Error"));
    assert!(matches!(pending.result(), Some(Err(ModalError::Transport(_)))));
}

#[test]
fn channel_teardown_rejects() {
    let h = host();
    let pending = h.modal.upload(input(), "test.php", None).unwrap();
    assert!(h.channel.drop_reply());
    h.modal.tick();
    assert!(matches!(pending.result(), Some(Err(ModalError::Transport(_)))));
}

#[test]
fn abort_discards_late_response() {
    let h = host();
    let pending = h.modal.upload(input(), "test.php", None).unwrap();
    assert!(pending.abort());
    assert_eq!(h.channel.cancelled(), vec![pending.id()]);
    assert!(!h.channel.respond("too late"));
    assert_eq!(pending.result(), Some(Err(ModalError::transport("aborted"))));
}

#[test]
fn pre_selected_files_and_invoke() {
    let h = host();
    let files = FileSet::new()
        .with_file(SelectedFile::from_bytes("x.csv", "1,2").with_content_type("text/csv"))
        .with_file(SelectedFile::from_bytes("y.csv", "3,4"));
    let pending = h
        .modal
        .invoke(
            "upload",
            vec![
                Arg::from(UploadInput::from(files)),
                Arg::from("import.php"),
                Arg::from(json!({"tags": ["a", "b"], "dry": true})),
            ],
        )
        .unwrap()
        .into_upload()
        .unwrap();

    let forms = h.channel.forms();
    let form = &forms[0];
    assert_eq!(form.files.len(), 2);
    assert_eq!(form.file_field, "file");
    assert_eq!(form.field("tags"), Some(r#"["a","b"]"#));
    assert_eq!(form.field("dry"), Some("true"));
    h.channel.respond("imported");
    assert_eq!(pending.result(), Some(Ok("imported".to_string())));
}

#[test]
fn offline_channel_rejects_immediately() {
    let h = host();
    h.channel.go_offline("no network");
    let pending = h.modal.upload(input(), "test.php", None).unwrap();
    h.modal.tick();
    assert_eq!(pending.result(), Some(Err(ModalError::transport("no network"))));
}

#[test]
fn bad_arguments_fail_before_submission() {
    let h = host();
    assert!(matches!(
        h.modal.upload(input(), "", None),
        Err(ModalError::InvalidArgument(_))
    ));
    assert!(matches!(
        h.modal.invoke("upload", vec![Arg::from("not an input"), Arg::from("u.php")]),
        Err(ModalError::InvalidArgument(_))
    ));
    assert!(h.channel.forms().is_empty());
}

#[test]
fn upload_without_channel_is_a_configuration_error() {
    let modal = SpModal::isolated(
        HeadlessToolkit::new(),
        HeadlessDocuments::new(),
        &Config::default(),
    );
    assert!(matches!(
        modal.upload(input(), "test.php", None),
        Err(ModalError::Configuration(_))
    ));
}
