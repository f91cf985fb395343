#![forbid(unsafe_code)]

//! Multipart form assembled for one upload.

use spmodal_core::{Params, Value};

use crate::input::SelectedFile;

/// Everything a submission channel needs to post one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    /// Target endpoint, possibly relative.
    pub url: String,
    /// Text fields in insertion order.
    pub fields: Vec<(String, String)>,
    /// Form field the files are posted under.
    pub file_field: String,
    pub files: Vec<SelectedFile>,
}

impl UploadForm {
    /// Value of the first text field named `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Text of a form field: strings as-is, scalars as their text, arrays and
/// objects as JSON, null as empty.
pub(crate) fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

pub(crate) fn fields_from(data: &Params) -> Vec<(String, String)> {
    data.iter()
        .map(|(key, value)| (key.clone(), field_text(value)))
        .collect()
}
