//! Upload session configuration

use serde::{Deserialize, Serialize};
use stepform_schema::FileProps;

/// Default encode chunk size (48 KiB, a multiple of 3 so base64 chunks concatenate)
pub const DEFAULT_CHUNK_SIZE: usize = 48 * 1024;

/// How many files a session holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadMode {
    /// One file; a new selection replaces the list
    Single,
    /// Any number of files
    #[default]
    Multiple,
}

/// Immutable session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Single or multiple
    pub mode: UploadMode,
    /// Lower-case extensions without the dot; empty allows everything
    pub allowed_extensions: Vec<String>,
    /// Size ceiling in bytes
    pub max_size_bytes: Option<u64>,
    /// Bytes encoded between progress reports
    pub chunk_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            mode: UploadMode::Multiple,
            allowed_extensions: Vec::new(),
            max_size_bytes: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl UploadConfig {
    /// Multiple-file session with no restrictions
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session matching a file field: same allow-list, ceiling and multiplicity
    #[must_use]
    pub fn for_field(props: &FileProps) -> Self {
        let mode = if props.multiple {
            UploadMode::Multiple
        } else {
            UploadMode::Single
        };
        let config = Self::new()
            .with_mode(mode)
            .with_allowed_extensions(&props.accept);
        match props.max_size_bytes {
            Some(bytes) => config.with_max_size(bytes),
            None => config,
        }
    }

    /// Set the mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: UploadMode) -> Self {
        self.mode = mode;
        self
    }

    /// Restrict extensions (case-insensitive, leading dot optional)
    #[must_use]
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Set the size ceiling
    #[inline]
    #[must_use]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size_bytes = Some(bytes);
        self
    }

    /// Set the encode chunk size, rounded down to a multiple of 3 (at least 3)
    #[must_use]
    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = (bytes / 3).max(1) * 3;
        self
    }

    /// Chunk size actually used by the encoder; also normalizes deserialized values
    #[must_use]
    pub fn effective_chunk_size(&self) -> usize {
        (self.chunk_size / 3).max(1) * 3
    }

    /// Whether an extension passes the allow-list
    #[must_use]
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions.is_empty()
            || self
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_normalized() {
        let config = UploadConfig::new().with_allowed_extensions([".CSV", "json"]);
        assert_eq!(config.allowed_extensions, vec!["csv", "json"]);
        assert!(config.allows_extension("Csv"));
        assert!(!config.allows_extension("xls"));
        assert!(UploadConfig::new().allows_extension("anything"));
    }

    #[test]
    fn field_props_carry_over() {
        let props = FileProps {
            accept: vec![".CSV".into(), "json".into()],
            max_size_bytes: Some(10 * 1024 * 1024),
            multiple: false,
        };
        let config = UploadConfig::for_field(&props);
        assert_eq!(config.mode, UploadMode::Single);
        assert_eq!(config.allowed_extensions, vec!["csv", "json"]);
        assert_eq!(config.max_size_bytes, Some(10 * 1024 * 1024));

        let open = UploadConfig::for_field(&FileProps {
            multiple: true,
            ..FileProps::default()
        });
        assert_eq!(open, UploadConfig::new());
    }

    #[test]
    fn chunk_size_is_multiple_of_three() {
        assert_eq!(UploadConfig::new().with_chunk_size(10).chunk_size, 9);
        assert_eq!(UploadConfig::new().with_chunk_size(1).chunk_size, 3);
        assert_eq!(UploadConfig::new().with_chunk_size(10).effective_chunk_size(), 9);
        assert_eq!(UploadConfig::new().with_chunk_size(0).effective_chunk_size(), 3);
        assert_eq!(UploadConfig::new().effective_chunk_size(), DEFAULT_CHUNK_SIZE);
    }
}
