//! Logging helpers that keep message text on a single log line.

/// Longest text preview written to logs; one GSM 7-bit SMS worth of characters.
pub const MAX_PREVIEW: usize = 160;

/// Escape `s` for single-line logging, truncated to [`MAX_PREVIEW`] characters.
pub fn escape_log(s: &str) -> String {
    preview(s, MAX_PREVIEW)
}

/// Escape control characters (`\n`, `\r`, `\t`, backslash, others as `\xNN`)
/// and cut the result after `max_chars` source characters with an ellipsis.
pub fn preview(s: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max_chars) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= max_chars {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_line_breaks() {
        assert_eq!(escape_log("Alert\nDisk full\r\t!"), "Alert\\nDisk full\\r\\t!");
    }

    #[test]
    fn escapes_other_controls() {
        assert_eq!(escape_log("a\u{1A}b"), "a\\x1Ab");
    }

    #[test]
    fn truncates_long_text() {
        let s = "x".repeat(MAX_PREVIEW + 10);
        let out = escape_log(&s);
        assert!(out.ends_with('…'));
        assert_eq!(out.chars().count(), MAX_PREVIEW + 1);
        assert_eq!(preview("hello", 2), "he…");
    }
}
