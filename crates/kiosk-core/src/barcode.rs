//! # Barcode Generation
//!
//! Candidate generator for product barcodes.
//!
//! A barcode is `KSK` + the trailing 7 digits of a unix-millis timestamp
//! + 4 random digits: 14 characters, scanner-friendly, unique enough that
//! the catalog's generate-and-check loop almost never retries. Uniqueness
//! itself is enforced by the catalog store against its unique index; this
//! module only produces candidates.

/// Prefix for every generated barcode.
pub const BARCODE_PREFIX: &str = "KSK";

/// Total length of a generated barcode: prefix + 7 timestamp digits + 4
/// random digits.
pub const BARCODE_LEN: usize = 14;

/// Builds one barcode candidate from a timestamp and a random value.
///
/// Pure on purpose: the caller supplies the clock reading and the
/// randomness, so candidates are reproducible in tests.
///
/// ## Example
/// ```rust
/// use kiosk_core::barcode::candidate;
///
/// let code = candidate(1_760_000_123_456, 42);
/// assert_eq!(code, "KSK01234560042");
/// ```
pub fn candidate(timestamp_millis: i64, random: u16) -> String {
    // Trailing 7 digits of the millisecond clock; rem_euclid keeps the
    // result non-negative even for pre-epoch clocks.
    let ts_tail = timestamp_millis.rem_euclid(10_000_000);
    let rand_tail = (random % 10_000) as i64;
    format!("{}{:07}{:04}", BARCODE_PREFIX, ts_tail, rand_tail)
}

/// Checks whether a string has the shape of a generated barcode.
///
/// Manually entered barcodes (EAN-13 from a real scanner, say) will not
/// match; that is fine — this is only used to recognize our own output.
pub fn is_generated(code: &str) -> bool {
    code.len() == BARCODE_LEN
        && code.starts_with(BARCODE_PREFIX)
        && code[BARCODE_PREFIX.len()..].chars().all(|c| c.is_ascii_digit())
}

// =============================================================================
// Unit Tests
// =============================================================================
