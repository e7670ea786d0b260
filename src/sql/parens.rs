//! Parenthesis and argument scanning for call-style rules.
//!
//! Single-quoted literals are skipped (with `''` as an escaped quote) so a
//! `)` or `,` inside a string never closes a call or splits an argument.

/// Returns the byte index just past the single-quoted literal that opens
/// at `start`. An unterminated literal runs to the end of the input.
pub fn skip_literal(sql: &str, start: usize) -> usize {
    let bytes = sql.as_bytes();
    let mut i = start + 1;

    while i < bytes.len() {
        if bytes[i] == b'\'' {
            // '' 為跳脫的單引號
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }

    bytes.len()
}

/// Splits call arguments at top-level commas. Each argument is trimmed.
pub fn split_args(args: &str) -> Vec<&str> {
    let bytes = args.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quote {
            if b == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 1;
                } else {
                    in_quote = false;
                }
            }
        } else {
            match b {
                b'\'' => in_quote = true,
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => {
                    parts.push(args[last..i].trim());
                    last = i + 1;
                }
                _ => {}
            }
        }
        i += 1;
    }

    parts.push(args[last..].trim());
    parts
}

/// Every top-level comma with the end of the whitespace run after it.
/// Returned as `(comma_index, whitespace_end)` pairs; `whitespace_end` is
/// `comma_index + 1` when nothing follows the comma but the next token.
pub fn top_level_comma_breaks(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut breaks = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quote {
            if b == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 1;
                } else {
                    in_quote = false;
                }
            }
        } else {
            match b {
                b'\'' => in_quote = true,
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => {
                    let ws_end = text[i + 1..]
                        .find(|c: char| !c.is_whitespace())
                        .map(|n| i + 1 + n)
                        .unwrap_or(text.len());
                    breaks.push((i, ws_end));
                }
                _ => {}
            }
        }
        i += 1;
    }

    breaks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_literal() {
        assert_eq!(skip_literal("'a)b' || x", 0), 5);
        assert_eq!(skip_literal("x = 'it''s' AND y", 4), 11);
        assert_eq!(skip_literal("'open", 0), 5);
    }

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("amount, 10, 2"), vec!["amount", "10", "2"]);
        assert_eq!(split_args("COALESCE(a, b), 'x,y'"), vec!["COALESCE(a, b)", "'x,y'"]);
        assert_eq!(split_args(" x "), vec!["x"]);
    }

    #[test]
    fn test_top_level_comma_breaks() {
        let text = " a, f(b, c),d,  e";
        assert_eq!(top_level_comma_breaks(text), vec![(2, 4), (11, 12), (13, 16)]);
    }
}
