#![forbid(unsafe_code)]

//! Upload settings.

/// Field name used when the input carries none.
pub const DEFAULT_FIELD_NAME: &str = "file";

/// Upload settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UploadConfig {
    /// Whole-request timeout of the HTTP channel.
    pub timeout_secs: u64,
    /// Form field for files whose input has no name.
    pub field_name: String,
    /// Base that relative upload URLs are resolved against.
    pub base_url: Option<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            field_name: DEFAULT_FIELD_NAME.to_string(),
            base_url: None,
        }
    }
}
