/// Lexical context of the byte currently being scanned.
#[derive(Clone)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// Digits starting at `start`, returned with the index one past the last digit.
pub(super) fn scan_digits(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let end = bytes[start.min(bytes.len())..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map_or(bytes.len(), |offset| start + offset);
    if end <= start {
        return None;
    }
    std::str::from_utf8(&bytes[start..end])
        .ok()
        .map(|digits| (end, digits))
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// If `text` ends with the keyword `word` (ignoring trailing whitespace and case, and on a word
/// boundary), return the byte offset where the keyword starts.
pub(super) fn trailing_keyword(text: &str, word: &str) -> Option<usize> {
    let trimmed = text.trim_end();
    if trimmed.len() < word.len() {
        return None;
    }
    let start = trimmed.len() - word.len();
    if !trimmed.is_char_boundary(start) || !trimmed[start..].eq_ignore_ascii_case(word) {
        return None;
    }
    if start > 0 && is_ident_byte(trimmed.as_bytes()[start - 1]) {
        None
    } else {
        Some(start)
    }
}
