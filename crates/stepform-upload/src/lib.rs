//! Stepform Upload
//!
//! Client-side file selection: validation against an allow-list and size
//! ceiling, concurrent data-URL encoding with progress, and race-free removal.
//!
//! # Example
//!
//! ```rust
//! use stepform_upload::{InMemoryFile, UploadConfig, UploadSession, UploadStatus};
//!
//! # tokio_test::block_on(async {
//! let session = UploadSession::new(
//!     UploadConfig::new()
//!         .with_allowed_extensions(["csv", "json"])
//!         .with_max_size(10 * 1024 * 1024),
//! );
//! let ids = session.select_files([InMemoryFile::new("rain.csv", "mm\n12\n").shared()]);
//! session.wait_idle().await;
//! assert_eq!(session.item(ids[0]).unwrap().status, UploadStatus::Completed);
//! # });
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod encode;
pub mod error;
pub mod item;
pub mod session;
pub mod size;
pub mod source;

// Re-exports
pub use config::{UploadConfig, UploadMode, DEFAULT_CHUNK_SIZE};
pub use encode::{mime_for, to_data_url, DataUrlEncoder};
pub use error::{ReadError, UploadError};
pub use item::{FileUploadItem, UploadId, UploadStatus};
pub use session::{AcceptedCallback, UploadSession};
pub use size::{format_file_size, parse_file_size};
pub use source::{FileSource, InMemoryFile, PathFile};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for upload sessions
    pub use crate::{
        FileSource, FileUploadItem, InMemoryFile, UploadConfig, UploadId, UploadMode, UploadSession,
        UploadStatus,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
