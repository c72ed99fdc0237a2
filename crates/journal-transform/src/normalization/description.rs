//! Free-text description cleaning.

pub use journal_model::DEFAULT_MAX_DESCRIPTION_LENGTH;

/// Clean a description: trim surrounding whitespace and cap its length.
///
/// Missing or empty input gives an empty string; this never fails. Interior
/// whitespace, newlines included, is kept. Length is counted in characters
/// after trimming and the cut is a plain prefix, not word-aware; whitespace
/// the cut leaves at the end is trimmed as well.
pub fn clean_description(value: Option<&str>, max_length: usize) -> String {
    let Some(value) = value else {
        return String::new();
    };
    truncate_chars(value.trim(), max_length)
        .trim_end()
        .to_string()
}

/// Longest prefix of `value` holding at most `max_chars` characters.
pub fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &value[..byte_idx],
        None => value,
    }
}
