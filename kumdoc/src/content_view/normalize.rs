//! Text normalization for rendered prose

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape text and apply typographic replacements
///
/// `---` becomes an em dash, `--` an en dash, and straight double quotes
/// alternate between opening and closing angle quotes.
pub fn normalize_text(text: &str) -> String {
    let text = escape_html(text)
        .replace("---", "&mdash;")
        .replace("--", "&ndash;");

    let mut result = String::with_capacity(text.len() + 16);
    let mut in_quote = false;
    for c in text.chars() {
        if c == '"' {
            result.push_str(if in_quote { "&raquo;" } else { "&laquo;" });
            in_quote = !in_quote;
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashes_and_quotes() {
        assert_eq!(
            normalize_text(r#"He said --- "hi""#),
            "He said &mdash; &laquo;hi&raquo;"
        );
        assert_eq!(normalize_text("1--2"), "1&ndash;2");
    }

    #[test]
    fn test_quotes_toggle_left_to_right() {
        assert_eq!(
            normalize_text(r#""a" and "b" and "c"#),
            "&laquo;a&raquo; and &laquo;b&raquo; and &laquo;c"
        );
    }

    #[test]
    fn test_markup_is_escaped() {
        assert_eq!(normalize_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=\"x\"&gt;&amp;&lt;/a&gt;");
    }
}
