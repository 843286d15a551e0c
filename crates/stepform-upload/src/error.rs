//! Error types for upload sessions

/// Why a file was not accepted, or why its encode failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// Extension not in the allow-list
    #[error("file type .{extension} is not allowed (allowed: {allowed})")]
    TypeNotAllowed { extension: String, allowed: String },

    /// File larger than the ceiling
    #[error("file exceeds maximum size of {limit}")]
    TooLarge { size: u64, limit: String },

    /// Reading the file failed
    #[error(transparent)]
    Read(#[from] ReadError),

    /// Size string could not be parsed
    #[error("invalid size '{0}' (expected e.g. 512KB, 10MB, 1.5GB)")]
    InvalidSize(String),
}

/// File read failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// Underlying I/O failure
    #[error("failed to read '{name}': {reason}")]
    Io { name: String, reason: String },

    /// File vanished between selection and read
    #[error("file '{0}' no longer exists")]
    NotFound(String),
}

impl ReadError {
    /// Map an I/O error for a named file
    #[must_use]
    pub fn from_io(name: &str, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(name.to_string())
        } else {
            Self::Io {
                name: name.to_string(),
                reason: err.to_string(),
            }
        }
    }
}
