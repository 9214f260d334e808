//! CTCP quoting stages.
//!
//! Two independent escape layers protect tagged data in transit. The
//! low-level stage (escape `\x10`) hides the bytes the IRC line codec
//! cannot carry; the CTCP stage (escape `\`) hides the `\x01`
//! delimiter. Dequoting keeps the escaped character literally when the
//! escape sequence is unknown.

/// Low-level quoting escape character.
pub const LOW_LEVEL_ESCAPE: char = '\x10';

/// CTCP quoting escape character.
pub const CTCP_ESCAPE: char = '\\';

/// Apply low-level quoting: `NUL LF CR \x10` become escape sequences.
pub fn low_level_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\0' => {
                out.push(LOW_LEVEL_ESCAPE);
                out.push('0');
            }
            '\n' => {
                out.push(LOW_LEVEL_ESCAPE);
                out.push('n');
            }
            '\r' => {
                out.push(LOW_LEVEL_ESCAPE);
                out.push('r');
            }
            LOW_LEVEL_ESCAPE => {
                out.push(LOW_LEVEL_ESCAPE);
                out.push(LOW_LEVEL_ESCAPE);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Invert [`low_level_quote`].
pub fn low_level_dequote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == LOW_LEVEL_ESCAPE {
            match chars.next() {
                Some('0') => out.push('\0'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some(LOW_LEVEL_ESCAPE) => out.push(LOW_LEVEL_ESCAPE),
                // Unknown escape: keep the escaped character literally.
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Apply CTCP quoting: `\x01` and the escape itself become sequences.
pub fn ctcp_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\x01' => {
                out.push(CTCP_ESCAPE);
                out.push('a');
            }
            CTCP_ESCAPE => {
                out.push(CTCP_ESCAPE);
                out.push(CTCP_ESCAPE);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Invert [`ctcp_quote`].
pub fn ctcp_dequote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == CTCP_ESCAPE {
            match chars.next() {
                Some('a') => out.push('\x01'),
                Some(CTCP_ESCAPE) => out.push(CTCP_ESCAPE),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_level_quote() {
        assert_eq!(low_level_quote("a\r\nb"), "a\x10r\x10nb");
        assert_eq!(low_level_quote("x\0y"), "x\x100y");
        assert_eq!(low_level_quote("\x10"), "\x10\x10");
        assert_eq!(low_level_quote("plain"), "plain");
    }

    #[test]
    fn test_low_level_round_trip() {
        for input in ["", "plain", "a\r\nb\0c\x10d", "\x10\x10\x10"] {
            assert_eq!(low_level_dequote(&low_level_quote(input)), input);
        }
    }

    #[test]
    fn test_low_level_unknown_escape_kept_literally() {
        assert_eq!(low_level_dequote("a\x10zb"), "azb");
    }

    #[test]
    fn test_low_level_trailing_escape_dropped() {
        assert_eq!(low_level_dequote("ab\x10"), "ab");
    }

    #[test]
    fn test_ctcp_quote() {
        assert_eq!(ctcp_quote("a\x01b"), "a\\ab");
        assert_eq!(ctcp_quote("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_ctcp_round_trip() {
        for input in ["", "plain", "a\x01b\\c", "\\\\\x01"] {
            assert_eq!(ctcp_dequote(&ctcp_quote(input)), input);
        }
    }

    #[test]
    fn test_ctcp_unknown_escape_kept_literally() {
        assert_eq!(ctcp_dequote("a\\qb"), "aqb");
    }

    #[test]
    fn test_stacked_round_trip() {
        // Both stages applied in encode order, inverted in decode order.
        for input in ["ACTION waves\x01", "data \\ with \r\n controls", "\x10\x01"] {
            let encoded = low_level_quote(&ctcp_quote(input));
            assert_eq!(ctcp_dequote(&low_level_dequote(&encoded)), input);
        }
    }
}
