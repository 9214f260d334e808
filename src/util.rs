//! Helpers for working within IRC line limits.

/// Maximum length of a line the client will send, including `\r\n`.
pub const MAX_OUTBOUND_LINE_LEN: usize = 512;

/// Maximum length of a line accepted on receive. Deliberately lenient;
/// real servers exceed the RFC limit.
pub const MAX_INBOUND_LINE_LEN: usize = 8191;

/// Cut a string down to at most `limit` bytes, backing up to the
/// nearest character boundary so multi-byte UTF-8 sequences stay
/// intact.
///
/// # Examples
///
/// ```
/// use slirc_client::util::truncate_to_fit;
///
/// assert_eq!(truncate_to_fit("límite", 3), "lí");
/// assert_eq!(truncate_to_fit("límite", 2), "l");
/// assert_eq!(truncate_to_fit("short", 99), "short");
/// ```
pub fn truncate_to_fit(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }

    // Character start offsets are exactly the legal cut points.
    let cut = s
        .char_indices()
        .map(|(at, _)| at)
        .take_while(|&at| at <= limit)
        .last()
        .unwrap_or(0);

    &s[..cut]
}

/// Break a message body into pieces of at most `limit` bytes, cut on
/// character boundaries, so each piece fits one wire line.
///
/// A single character wider than `limit` is yielded whole rather than
/// split; callers with sane limits never see that case.
///
/// # Examples
///
/// ```
/// use slirc_client::util::split_to_fit;
///
/// let pieces: Vec<_> = split_to_fit("pack my box with jugs", 8).collect();
/// assert_eq!(pieces, vec!["pack my ", "box with", " jugs"]);
/// ```
pub fn split_to_fit(s: &str, limit: usize) -> impl Iterator<Item = &str> {
    let mut tail = s;
    std::iter::from_fn(move || {
        if tail.is_empty() {
            return None;
        }

        let mut piece = truncate_to_fit(tail, limit);
        if piece.is_empty() {
            let width = tail.chars().next().map_or(0, char::len_utf8);
            piece = &tail[..width];
        }

        tail = &tail[piece.len()..];
        Some(piece)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_within_limit_is_identity() {
        assert_eq!(truncate_to_fit("topic text", 64), "topic text");
        assert_eq!(truncate_to_fit("", 4), "");
    }

    #[test]
    fn test_truncate_never_splits_codepoints() {
        // Ω is 2 bytes, 🦀 is 4.
        assert_eq!(truncate_to_fit("aΩb", 2), "a");
        assert_eq!(truncate_to_fit("aΩb", 3), "aΩ");
        assert_eq!(truncate_to_fit("🦀🦀", 7), "🦀");
        assert_eq!(truncate_to_fit("🦀🦀", 3), "");
    }

    #[test]
    fn test_truncate_to_zero() {
        assert_eq!(truncate_to_fit("anything", 0), "");
    }

    #[test]
    fn test_split_reassembles_to_original() {
        let text = "the quick brown fox jumps over the lazy dog";
        let pieces: Vec<_> = split_to_fit(text, 10).collect();
        assert!(pieces.iter().all(|p| p.len() <= 10));
        assert_eq!(pieces.concat(), text);
    }

    #[test]
    fn test_split_exact_multiple() {
        let pieces: Vec<_> = split_to_fit("abcdef", 3).collect();
        assert_eq!(pieces, vec!["abc", "def"]);
    }

    #[test]
    fn test_split_multibyte_boundaries() {
        // Each Greek letter is 2 bytes; a 3-byte limit fits one per piece.
        let pieces: Vec<_> = split_to_fit("αβγδ", 3).collect();
        assert_eq!(pieces, vec!["α", "β", "γ", "δ"]);
    }

    #[test]
    fn test_split_oversized_char_yielded_whole() {
        let pieces: Vec<_> = split_to_fit("🦀ab", 1).collect();
        assert_eq!(pieces, vec!["🦀", "a", "b"]);
    }

    #[test]
    fn test_split_empty_yields_nothing() {
        assert_eq!(split_to_fit("", 5).count(), 0);
    }
}
