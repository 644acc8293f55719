// Balanced-block extraction
//
// Callers pass the text that follows an opening delimiter; the balance starts
// at one. Input is expected to be normalized so delimiters inside strings and
// comments are already gone.

/// Byte offset of the delimiter that closes the block, if it is closed
pub fn find_balanced_end(text: &str, open: char, close: char) -> Option<usize> {
    let mut balance = 1usize;
    for (idx, c) in text.char_indices() {
        if c == open {
            balance += 1;
        } else if c == close {
            balance -= 1;
            if balance == 0 {
                return Some(idx);
            }
        }
    }
    None
}

/// Content of the block up to its closing delimiter, or the whole remainder
pub fn extract_balanced(text: &str, open: char, close: char) -> &str {
    match find_balanced_end(text, open, close) {
        Some(end) => &text[..end],
        None => text,
    }
}

/// Content between the first `open` at or after `from` and its matching close.
///
/// Returns the content and the byte offset just past the closing delimiter.
pub fn block_after(text: &str, from: usize, open: char, close: char) -> Option<(&str, usize)> {
    let rest = text.get(from..)?;
    let start = from + rest.find(open)? + open.len_utf8();
    let inner = &text[start..];
    match find_balanced_end(inner, open, close) {
        Some(end) => Some((&inner[..end], start + end + close.len_utf8())),
        None => Some((inner, text.len())),
    }
}
