//! Data-URL encoding

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// MIME type guessed from an extension
#[must_use]
pub fn mime_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "txt" => "text/plain",
        "json" => "application/json",
        "xml" => "application/xml",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "parquet" => "application/vnd.apache.parquet",
        "zip" => "application/zip",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Incremental base64 data-URL builder
///
/// Chunks must be a multiple of 3 bytes except the last, so the partial
/// encodings concatenate without padding in the middle.
#[derive(Debug)]
pub struct DataUrlEncoder {
    out: String,
}

impl DataUrlEncoder {
    /// Start a URL for the given MIME type
    #[must_use]
    pub fn new(mime: &str, total_len: usize) -> Self {
        let mut out = String::with_capacity(mime.len() + 13 + total_len.div_ceil(3) * 4);
        out.push_str("data:");
        out.push_str(mime);
        out.push_str(";base64,");
        Self { out }
    }

    /// Append one chunk
    pub fn push(&mut self, chunk: &[u8]) {
        STANDARD.encode_string(chunk, &mut self.out);
    }

    /// Finished URL
    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }
}

/// Encode a whole buffer at once
#[must_use]
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    let mut encoder = DataUrlEncoder::new(mime, bytes.len());
    encoder.push(bytes);
    encoder.finish()
}
