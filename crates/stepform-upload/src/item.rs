//! Tracked upload items

use serde::Serialize;
use std::fmt;
use stepform_schema::FileValue;
use uuid::Uuid;

/// Opaque, process-local item identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UploadId(Uuid);

impl UploadId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle: queued → uploading → completed | error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    /// Accepted, waiting to be read
    Queued,
    /// Reading and encoding
    Uploading,
    /// Payload available
    Completed,
    /// Rejected or failed to read
    Error,
}

impl UploadStatus {
    /// Completed or error
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Uploading => "uploading",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One file in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileUploadItem {
    /// Identity, never derived from the name
    pub id: UploadId,
    /// File name as selected
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Lower-case extension without the dot
    pub extension: String,
    /// Lifecycle status
    pub status: UploadStatus,
    /// 0..=100, never decreases
    pub progress: u8,
    /// `data:` URL, set once completed
    pub payload: Option<String>,
    /// Failure message, set on error
    pub error: Option<String>,
}

impl FileUploadItem {
    pub(crate) fn new(name: &str, size: u64) -> Self {
        Self {
            id: UploadId::new(),
            name: name.to_string(),
            size,
            extension: stepform_schema::extension_of(name),
            status: UploadStatus::Queued,
            progress: 0,
            payload: None,
            error: None,
        }
    }

    /// Move forward in the lifecycle; regressions and post-terminal changes are ignored
    pub(crate) fn advance(&mut self, status: UploadStatus, progress: u8) -> bool {
        if self.status.is_terminal() || status < self.status {
            return false;
        }
        self.status = status;
        self.progress = self.progress.max(progress.min(100));
        true
    }

    pub(crate) fn fail(&mut self, message: String) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = UploadStatus::Error;
        self.error = Some(message);
        true
    }

    pub(crate) fn complete(&mut self, payload: String) -> bool {
        if !self.advance(UploadStatus::Completed, 100) {
            return false;
        }
        self.payload = Some(payload);
        true
    }

    /// Form value of a completed item
    #[must_use]
    pub fn to_file_value(&self) -> Option<FileValue> {
        let payload = self.payload.as_ref().filter(|_| self.status == UploadStatus::Completed)?;
        Some(FileValue {
            id: self.id.to_string(),
            name: self.name.clone(),
            size: self.size,
            data_url: payload.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_never_regresses() {
        let mut item = FileUploadItem::new("data.csv", 10);
        assert!(item.advance(UploadStatus::Uploading, 40));
        assert!(!item.advance(UploadStatus::Queued, 0));
        assert!(item.advance(UploadStatus::Uploading, 20));
        assert_eq!(item.progress, 40);

        assert!(item.complete("data:text/csv;base64,".into()));
        assert!(!item.fail("late failure".into()));
        assert_eq!(item.status, UploadStatus::Completed);
        assert!(item.to_file_value().is_some());
    }

    #[test]
    fn ids_distinct_for_same_name() {
        let a = FileUploadItem::new("data.csv", 1);
        let b = FileUploadItem::new("data.csv", 1);
        assert_ne!(a.id, b.id);
        assert_eq!(a.extension, "csv");
    }
}
