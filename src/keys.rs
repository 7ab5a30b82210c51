//! Patient key normalization.
//!
//! The same function is applied to identifiers coming out of document
//! filenames and out of the CSV export. Both sides must agree exactly or
//! the reconciliation join silently produces empty path lists.

/// Normalize a raw patient identifier into its canonical key form.
///
/// Trims surrounding whitespace, then strips leading `'0'` characters so
/// `"00123"` and `"123"` map to the same key. An identifier that is
/// entirely zeros normalizes to the empty string; empty keys are never
/// stored in the file index, so such rows simply never gain file paths.
/// Alphabetic input passes through unchanged apart from trimming.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().trim_start_matches('0').to_string()
}
