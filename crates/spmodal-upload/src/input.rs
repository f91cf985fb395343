#![forbid(unsafe_code)]

//! File inputs and selected files.

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Where the bytes of a selected file come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// Read from disk when the form is submitted.
    Path(PathBuf),
    /// Already in memory.
    Bytes(Vec<u8>),
}

/// One file chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub source: FileSource,
}

impl SelectedFile {
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            source: FileSource::Bytes(bytes.into()),
        }
    }

    /// A file on disk; the file name is the last path component.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file_name,
            content_type: None,
            source: FileSource::Path(path.to_path_buf()),
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Files selected ahead of time, optionally under a field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    field_name: Option<String>,
    files: Vec<SelectedFile>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: SelectedFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn push(&mut self, file: SelectedFile) {
        self.files.push(file);
    }

    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }

    #[must_use]
    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub(crate) fn into_files(self) -> Vec<SelectedFile> {
        self.files
    }
}

impl FromIterator<SelectedFile> for FileSet {
    fn from_iter<I: IntoIterator<Item = SelectedFile>>(iter: I) -> Self {
        Self {
            field_name: None,
            files: iter.into_iter().collect(),
        }
    }
}

/// A live file input whose selection can change until it is submitted.
///
/// Clones refer to the same input.
#[derive(Clone, Default)]
pub struct FileInputRef {
    inner: Rc<RefCell<FileSet>>,
}

impl fmt::Debug for FileInputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FileInputRef")
            .field(&*self.inner.borrow())
            .finish()
    }
}

impl FileInputRef {
    /// An input named `name` (the form field its files are posted under).
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FileSet::new().with_field_name(name))),
        }
    }

    /// An input without a name.
    pub fn unnamed() -> Self {
        Self::default()
    }

    /// Replace the current selection.
    pub fn select(&self, files: impl IntoIterator<Item = SelectedFile>) {
        let mut set = self.inner.borrow_mut();
        set.files = files.into_iter().collect();
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().files.clear();
    }

    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.inner.borrow().field_name.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Copy of the current selection.
    #[must_use]
    pub fn snapshot(&self) -> FileSet {
        self.inner.borrow().clone()
    }
}

/// What an upload reads its files from.
#[derive(Debug, Clone)]
pub enum UploadInput {
    /// A live input; its selection is read when the request is built.
    Element(FileInputRef),
    /// Files selected ahead of time.
    Files(FileSet),
}

impl UploadInput {
    /// Form field the files are posted under, if the input names one.
    #[must_use]
    pub fn field_name(&self) -> Option<String> {
        match self {
            Self::Element(input) => input.name(),
            Self::Files(set) => set.field_name.clone(),
        }
    }

    /// Current files, snapshotting a live input.
    #[must_use]
    pub fn snapshot(&self) -> FileSet {
        match self {
            Self::Element(input) => input.snapshot(),
            Self::Files(set) => set.clone(),
        }
    }
}

impl From<FileInputRef> for UploadInput {
    fn from(input: FileInputRef) -> Self {
        Self::Element(input)
    }
}

impl From<FileSet> for UploadInput {
    fn from(set: FileSet) -> Self {
        Self::Files(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_file_takes_last_component() {
        let file = SelectedFile::from_path("/tmp/reports/q1.pdf").with_content_type("application/pdf");
        assert_eq!(file.file_name, "q1.pdf");
        assert_eq!(file.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(file.source, FileSource::Path(PathBuf::from("/tmp/reports/q1.pdf")));
    }

    #[test]
    fn live_input_snapshot_is_detached() {
        let input = FileInputRef::named("attachment");
        input.select([SelectedFile::from_bytes("a.txt", "a")]);
        let upload = UploadInput::from(input.clone());

        let snap = upload.snapshot();
        input.clear();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.field_name(), Some("attachment"));
        assert!(upload.snapshot().is_empty());
    }

    #[test]
    fn file_set_collects() {
        let set: FileSet = ["a", "b"]
            .into_iter()
            .map(|n| SelectedFile::from_bytes(n, Vec::<u8>::new()))
            .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.field_name(), None);
    }
}
