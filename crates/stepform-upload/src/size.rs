//! Human-readable file sizes

use crate::error::UploadError;

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count with 1024-based units
///
/// At most two decimals, trailing zeros dropped: `1536` → `1.5 KB`.
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let mut number = format!("{value:.2}");
    if number.contains('.') {
        let trimmed = number.trim_end_matches('0').trim_end_matches('.').len();
        number.truncate(trimmed);
    }
    format!("{number} {}", UNITS[unit])
}

/// Parse `512`, `512B`, `64KB`, `10MB`, `1.5GB` (case-insensitive, 1024-based)
///
/// # Errors
/// Returns `UploadError::InvalidSize` for anything else
pub fn parse_file_size(input: &str) -> Result<u64, UploadError> {
    let invalid = || UploadError::InvalidSize(input.to_string());
    let s = input.trim().to_ascii_uppercase();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);

    let factor: u64 = match unit.trim() {
        "" | "B" | "BYTES" => 1,
        "K" | "KB" => 1 << 10,
        "M" | "MB" => 1 << 20,
        "G" | "GB" => 1 << 30,
        _ => return Err(invalid()),
    };
    let n: f64 = number.parse().map_err(|_| invalid())?;
    if !n.is_finite() || n < 0.0 {
        return Err(invalid());
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let bytes = (n * factor as f64).round() as u64;
    Ok(bytes)
}
