//! Character encoding integrity.

/// Character substituted by decoders for bytes they could not read.
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

/// Whether `text` went through a failed decoding at some point.
pub fn has_unsupported_character(text: &str) -> bool {
    text.contains(REPLACEMENT_CHARACTER)
}
