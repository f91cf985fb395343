#![forbid(unsafe_code)]

//! TOML configuration.
//!
//! Every field has a default, so an empty document is a valid config:
//!
//! ```toml
//! [dialogs]
//! alert_title = "Alert"
//! confirm_title = "Confirm"
//! error_title = "Error"
//! ok_label = "Ok"
//! cancel_label = "Cancel"
//! # loading_message = "Please wait..."
//!
//! [stack]
//! base_z_index = 1000
//! z_increment = 10
//! hide_covered = false
//!
//! [upload]
//! timeout_secs = 30
//! field_name = "file"
//! # base_url = "https://example.org/app/"
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use spmodal_upload::UploadConfig;
use spmodal_widgets::{DialogDefaults, StackConfig};
use thiserror::Error;
use tracing::debug;

/// Environment variable holding the path of the config file.
pub const CONFIG_ENV: &str = "SPMODAL_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for dialogs, stacking, and uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dialogs: DialogDefaults,
    pub stack: StackConfig,
    pub upload: UploadConfig,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Self::from_toml_str(&text)
    }

    /// Load the file named by `SPMODAL_CONFIG`, or defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(PathBuf::from(path)),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn defaults_match_dialog_conventions() {
        let config = Config::default();
        assert_eq!(config.dialogs.alert_title, "Alert");
        assert_eq!(config.dialogs.confirm_title, "Confirm");
        assert_eq!(config.dialogs.error_title, "Error");
        assert_eq!(config.dialogs.ok_label, "Ok");
        assert_eq!(config.dialogs.cancel_label, "Cancel");
        assert_eq!(config.dialogs.loading_message, None);
        assert_eq!(config.stack.base_z_index, 1000);
        assert_eq!(config.stack.z_increment, 10);
        assert!(!config.stack.hide_covered);
        assert_eq!(config.upload.timeout_secs, 30);
        assert_eq!(config.upload.field_name, "file");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [dialogs]
            alert_title = "Aviso"

            [stack]
            hide_covered = true

            [upload]
            base_url = "https://example.org/"
            "#,
        )
        .unwrap();
        assert_eq!(config.dialogs.alert_title, "Aviso");
        assert_eq!(config.dialogs.ok_label, "Ok");
        assert!(config.stack.hide_covered);
        assert_eq!(config.stack.base_z_index, 1000);
        assert_eq!(config.upload.base_url.as_deref(), Some("https://example.org/"));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(matches!(
            Config::from_toml_str("[stack]\nz_increment = \"ten\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
