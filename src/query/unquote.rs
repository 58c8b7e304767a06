//! `unquote`: reconstructs the logical string value of a tree-sitter
//! `string` node, inverting the grammar's lexing of raw/byte/triple-quoted
//! prefixes and backslash escapes.

use tree_sitter::Node;

/// Strips the quote delimiters and prefix letters, then resolves escape
/// sequences unless the literal carries an `r`/`R` raw prefix.
pub fn unquote(input: &[u8], string_node: Node<'_>) -> String {
    let text = match string_node.utf8_text(input) {
        Ok(t) => t,
        Err(_) => return String::new(),
    };
    unquote_str(text)
}

pub fn unquote_str(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut i = 0;
    let mut raw = false;
    // Consume the prefix (any combination of r/R/b/B/u/U, at most 2 chars).
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        let c = bytes[i].to_ascii_lowercase();
        if c == b'r' {
            raw = true;
        }
        i += 1;
    }
    let rest = &text[i..];

    let (quote, body) = if let Some(b) = rest.strip_prefix("\"\"\"") {
        ("\"\"\"", b.strip_suffix("\"\"\"").unwrap_or(b))
    } else if let Some(b) = rest.strip_prefix("'''") {
        ("'''", b.strip_suffix("'''").unwrap_or(b))
    } else if let Some(b) = rest.strip_prefix('"') {
        ("\"", b.strip_suffix('"').unwrap_or(b))
    } else if let Some(b) = rest.strip_prefix('\'') {
        ("'", b.strip_suffix('\'').unwrap_or(b))
    } else {
        ("", rest)
    };
    let _ = quote;

    if raw {
        return body.to_string();
    }

    unescape(body)
}

fn unescape(body: &str) -> String {
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' || i + 1 >= chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let esc = chars[i + 1];
        match esc {
            'n' => {
                out.push('\n');
                i += 2;
            }
            't' => {
                out.push('\t');
                i += 2;
            }
            'r' => {
                out.push('\r');
                i += 2;
            }
            '\\' => {
                out.push('\\');
                i += 2;
            }
            '\'' => {
                out.push('\'');
                i += 2;
            }
            '"' => {
                out.push('"');
                i += 2;
            }
            '\n' => {
                // line continuation: collapses to nothing.
                i += 2;
            }
            'x' => {
                let hex: String = chars[i + 2..].iter().take(2).collect();
                if let Ok(v) = u32::from_str_radix(&hex, 16) {
                    if let Some(c) = char::from_u32(v) {
                        out.push(c);
                    }
                    i += 2 + hex.len();
                } else {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            'u' => {
                let hex: String = chars[i + 2..].iter().take(4).collect();
                if let Ok(v) = u32::from_str_radix(&hex, 16) {
                    if let Some(c) = char::from_u32(v) {
                        out.push(c);
                    }
                    i += 2 + hex.len();
                } else {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            c if c.is_digit(8) => {
                let octal: String = chars[i + 1..]
                    .iter()
                    .take_while(|c| c.is_digit(8))
                    .take(3)
                    .collect();
                if let Ok(v) = u32::from_str_radix(&octal, 8) {
                    if let Some(ch) = char::from_u32(v) {
                        out.push(ch);
                    }
                    i += 1 + octal.len();
                } else {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            other => {
                out.push('\\');
                out.push(other);
                i += 2;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_round_trips() {
        assert_eq!(unquote_str("\"hello\""), "hello");
        assert_eq!(unquote_str("'hello'"), "hello");
    }

    #[test]
    fn handles_standard_escapes() {
        assert_eq!(unquote_str("\"a\\nb\\tc\\r\""), "a\nb\tc\r");
        assert_eq!(unquote_str("\"quote: \\\"\""), "quote: \"");
        assert_eq!(unquote_str("\"back\\\\slash\""), "back\\slash");
    }

    #[test]
    fn handles_hex_and_unicode_escapes() {
        assert_eq!(unquote_str("\"\\x41\""), "A");
        assert_eq!(unquote_str("\"\\u0041\""), "A");
        assert_eq!(unquote_str("\"\\101\""), "A");
    }

    #[test]
    fn line_continuation_collapses_to_empty() {
        assert_eq!(unquote_str("\"a\\\nb\""), "ab");
    }

    #[test]
    fn raw_prefix_disables_escaping() {
        assert_eq!(unquote_str("r\"a\\nb\""), "a\\nb");
    }

    #[test]
    fn triple_quoted_strings_strip_all_three_delimiters() {
        assert_eq!(unquote_str("\"\"\"hi\"\"\""), "hi");
    }
}
