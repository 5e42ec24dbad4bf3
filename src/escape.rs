//! Escaping of text content.
//!
//! Backslashes are escaped first, then double quotes, newlines, carriage
//! returns and tabs. Every character is visited once, so a backslash inserted
//! by one substitution is never escaped again by another.

use alloc::string::String;

/// Appends `text` to `out` with control characters escaped.
pub fn escape_into(text: &str, out: &mut String) {
    out.reserve(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
}

/// Returns `text` with control characters escaped.
///
/// ```
/// assert_eq!(diagnote::escape_text("a \"b\"\n"), r#"a \"b\"\n"#);
/// ```
#[must_use]
pub fn escape_text(text: &str) -> String {
    let mut out = String::new();
    escape_into(text, &mut out);
    out
}

/// Renders `text` as a quoted, escaped literal.
pub(crate) fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    escape_into(text, &mut out);
    out.push('"');
    out
}
