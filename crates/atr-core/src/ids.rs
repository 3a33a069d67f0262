//! Prefixed ID generation.
//!
//! IDs look like `err-a3f8b2c1`: a short entity prefix, a dash, and eight
//! lowercase hex characters drawn from the OS random source.

use crate::errors::CoreError;

/// Prefix for error record IDs.
pub const PREFIX_ERROR: &str = "err";

/// Generate a random prefixed ID, e.g. `"err-a3f8b2c1"`.
///
/// # Errors
///
/// Returns `CoreError::Entropy` if the OS random source is unavailable.
pub fn generate_id(prefix: &str) -> Result<String, CoreError> {
    let mut bytes = [0u8; 4];
    getrandom::fill(&mut bytes).map_err(|e| CoreError::Entropy(e.to_string()))?;
    Ok(format_id(prefix, u32::from_be_bytes(bytes)))
}

/// Format a prefixed ID from a raw 32-bit value.
#[must_use]
pub fn format_id(prefix: &str, raw: u32) -> String {
    format!("{prefix}-{raw:08x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_has_prefix_and_hex_suffix() {
        let id = generate_id(PREFIX_ERROR).unwrap();
        let (prefix, suffix) = id.split_once('-').unwrap();
        assert_eq!(prefix, "err");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn format_id_pads_to_eight_chars() {
        assert_eq!(format_id("err", 0x2a), "err-0000002a");
        assert_eq!(format_id("err", u32::MAX), "err-ffffffff");
    }
}
