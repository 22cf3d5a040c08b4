//! Recovers a structured JSON payload from free-form provider output.
//!
//! Generation backends routinely wrap the requested JSON in conversational
//! prose or markdown fences. The scan below recovers the payload without
//! relying on the backend honouring a "no extra text" instruction.

/// Returns the first balanced JSON object embedded in `text`, or, failing
/// that, the first balanced top-level array. Unbalanced input yields `None`
/// rather than a truncated fragment.
pub fn extract_payload(text: &str) -> Option<&str> {
    extract_balanced(text, '{', '}').or_else(|| extract_balanced(text, '[', ']'))
}

fn extract_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    for (idx, ch) in text[start..].char_indices() {
        match ch {
            c if c == open => depth += 1,
            c if c == close => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + idx + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
