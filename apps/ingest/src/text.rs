//! Text post-processing shared by acquisition and extraction.

/// Collapses every run of whitespace (including newlines and NBSP) to a single
/// space and trims both ends.
pub fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for word in input.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Truncates to at most `max_chars` characters by dropping the suffix.
/// Counts `char`s, never splits a code point. Returns `true` if anything was cut.
pub fn truncate_chars(text: &mut String, max_chars: usize) -> bool {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            text.truncate(byte_idx);
            true
        }
        None => false,
    }
}

/// Returns the first `max_chars` characters with `...` appended when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out = text.to_string();
    if truncate_chars(&mut out, max_chars) {
        out.push_str("...");
    }
    out
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
