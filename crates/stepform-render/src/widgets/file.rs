//! File drop zone

use crate::binding::FieldHandle;
use crate::error::RenderResult;
use crate::view::WidgetView;
use stepform_schema::{FieldValue, FileProps, FileValue};

/// Lists the files of a file field
///
/// Files enter the value through an upload session; the widget only lists and
/// removes them, by id.
#[derive(Debug, Clone)]
pub struct FileList {
    handle: FieldHandle,
    props: FileProps,
}

impl FileList {
    pub(crate) fn new(handle: FieldHandle, props: FileProps) -> Self {
        Self { handle, props }
    }

    /// Files currently in the value
    #[must_use]
    pub fn files(&self) -> Vec<FileValue> {
        self.handle.value().as_files().map(<[FileValue]>::to_vec).unwrap_or_default()
    }

    /// Remove a file by id; returns whether it was present
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn remove(&mut self, id: &str) -> RenderResult<bool> {
        let mut files = self.files();
        let before = files.len();
        files.retain(|f| f.id != id);
        if files.len() == before {
            return Ok(false);
        }
        self.handle.set(FieldValue::Files(files))?;
        Ok(true)
    }

    /// Accept attribute, e.g. `.csv,.json`
    #[must_use]
    pub fn accept_attr(&self) -> String {
        self.props
            .accept
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub(crate) fn handle(&self) -> &FieldHandle {
        &self.handle
    }

    pub(crate) fn view(&self) -> WidgetView {
        WidgetView::Files {
            files: self.files(),
            accept: self.props.accept.clone(),
            multiple: self.props.multiple,
        }
    }
}
