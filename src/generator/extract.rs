//! Pulls the `"messages"` array out of free-form model output.
//!
//! Models wrap the JSON they were asked for in prose or code fences, so the
//! reply is scanned for the first `"messages": [` and the array is cut at its
//! matching closing bracket. Brackets inside JSON strings are ignored.

use crate::models::Dialogue;

const MESSAGES_KEY: &str = "\"messages\"";

/// Best-effort extraction. Returns `None` when no array is found or when the
/// captured text is not valid JSON. Any JSON array is accepted as-is; the
/// elements are not checked for `role` or `content`.
pub fn extract_dialogue(text: &str) -> Option<Dialogue> {
    let Some(array) = find_messages_array(text) else {
        tracing::debug!("No \"messages\" array found in model reply");
        return None;
    };

    match serde_json::from_str::<Dialogue>(array) {
        Ok(dialogue) => Some(dialogue),
        Err(e) => {
            tracing::debug!("Failed to parse \"messages\" array: {}", e);
            None
        }
    }
}

/// Raw text of the first `"messages"` array value, brackets included.
pub fn find_messages_array(text: &str) -> Option<&str> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find(MESSAGES_KEY) {
        let key_end = search_from + offset + MESSAGES_KEY.len();
        if let Some(start) = array_start(text, key_end) {
            return matching_bracket(text, start).map(|end| &text[start..=end]);
        }
        search_from = key_end;
    }

    None
}

/// Index of the `[` opening the value that follows a key ending at `key_end`.
fn array_start(text: &str, key_end: usize) -> Option<usize> {
    let value = text[key_end..].trim_start().strip_prefix(':')?.trim_start();
    value.starts_with('[').then(|| text.len() - value.len())
}

fn matching_bracket(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, byte) in text.bytes().enumerate().skip(start) {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }

    None
}
