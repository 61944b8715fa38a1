use std::fmt::Write;

use crate::macros::marker_index;

/// Escape text for XHTML element content and attribute values.
///
/// Private-use characters that double as macro placeholders are written as
/// character references so user text never aliases a placeholder.
pub fn escape_xhtml(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c if marker_index(c).is_some() => {
                write!(out, "&#x{:X};", u32::from(c)).unwrap();
            }
            c => out.push(c),
        }
    }
}

/// Escape into a fresh string.
pub(crate) fn escaped(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_xhtml(text, &mut out);
    out
}
