use std::io::Write;

use pretty_assertions::assert_eq;
use spmodal::{Config, ConfigError, SpModal};
use spmodal_harness::{HeadlessDocuments, HeadlessToolkit};

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[dialogs]
confirm_title = "Confirmar"
cancel_label = "Cancelar"

[stack]
base_z_index = 5000
z_increment = 2
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.dialogs.confirm_title, "Confirmar");
    assert_eq!(config.stack.base_z_index, 5000);

    let modal = SpModal::isolated(HeadlessToolkit::new(), HeadlessDocuments::new(), &config);
    let first = modal.message("a", None);
    let second = modal.message("b", None);
    assert_eq!(first.z_index(), Some(5000));
    assert_eq!(second.z_index(), Some(5002));
}

#[test]
fn unknown_value_types_fail_to_parse() {
    let err = Config::from_toml_str("[upload]\ntimeout_secs = \"soon\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
