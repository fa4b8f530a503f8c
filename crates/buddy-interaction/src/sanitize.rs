//! Reply post-processing.
//!
//! Two transformations run after the generation API returns:
//!
//! - `truncate_reply` caps the text at [`OUTPUT_CHAR_LIMIT`] characters.
//!   The truncated text is the single stored value: display and speech are
//!   both derived from it, so what is shown always matches what is spoken.
//! - `clean_for_speech` strips markup that reads badly aloud. The cleaned
//!   copy is used only for the speech request, never for display.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum stored reply length in characters, before the truncation marker.
pub const OUTPUT_CHAR_LIMIT: usize = 1000;

const TRUNCATION_MARKER: &str = "...";

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_+-]*").unwrap());
static HEADING_MARKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}[ \t]*").unwrap());
static LINK_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(https?://[^)]*\)").unwrap());
static INLINE_MARKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*_`\[\]]").unwrap());

/// Caps `text` at `limit` characters, appending `...` when it was cut.
///
/// The cap counts characters, not bytes, so multibyte replies are never
/// split inside a code point.
pub fn truncate_reply(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Strips markup unsuited for speech synthesis: bold/italic markers, code
/// fences, inline code delimiters, heading marks, brackets, and link-URL
/// parentheses.
pub fn clean_for_speech(text: &str) -> String {
    let text = CODE_FENCE.replace_all(text, "");
    let text = HEADING_MARKS.replace_all(&text, "");
    let text = LINK_URL.replace_all(&text, "");
    let text = INLINE_MARKS.replace_all(&text, "");
    text.trim().to_string()
}
