//! Selected file handles
//!
//! A [`FileSource`] is what a file picker or drop event hands the session: a
//! name, a size known up front, and an async read that returns the bytes or a
//! [`ReadError`].

use crate::error::ReadError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// A file chosen by the user
#[async_trait]
pub trait FileSource: Send + Sync {
    /// File name including extension
    fn name(&self) -> &str;

    /// Size in bytes as reported at selection
    fn size(&self) -> u64;

    /// Read the whole file
    async fn read(&self) -> Result<Vec<u8>, ReadError>;
}

/// File held in memory
#[derive(Debug, Clone)]
pub struct InMemoryFile {
    name: String,
    bytes: Arc<[u8]>,
    reported_size: Option<u64>,
    delay: Duration,
    failure: Option<String>,
}

impl InMemoryFile {
    /// Create from bytes
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            bytes: Arc::from(bytes),
            reported_size: None,
            delay: Duration::ZERO,
            failure: None,
        }
    }

    /// Report a size different from the byte count (large files without the bytes)
    #[must_use]
    pub fn with_reported_size(mut self, size: u64) -> Self {
        self.reported_size = Some(size);
        self
    }

    /// Delay the read
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make the read fail with a message
    #[must_use]
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Share as a trait object
    #[must_use]
    pub fn shared(self) -> Arc<dyn FileSource> {
        Arc::new(self)
    }
}

#[async_trait]
impl FileSource for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.reported_size.unwrap_or(self.bytes.len() as u64)
    }

    async fn read(&self) -> Result<Vec<u8>, ReadError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.failure {
            Some(reason) => Err(ReadError::Io {
                name: self.name.clone(),
                reason: reason.clone(),
            }),
            None => Ok(self.bytes.to_vec()),
        }
    }
}

/// File on the local file system
#[derive(Debug, Clone)]
pub struct PathFile {
    path: PathBuf,
    name: String,
    size: u64,
}

impl PathFile {
    /// Stat a file
    ///
    /// # Errors
    /// Returns `ReadError` if the metadata cannot be read
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| ReadError::from_io(&name, &e))?;
        Ok(Self {
            path,
            name,
            size: meta.len(),
        })
    }

    /// Location on disk
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FileSource for PathFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read(&self) -> Result<Vec<u8>, ReadError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| ReadError::from_io(&self.name, &e))
    }
}
