//! ISUPPORT (numeric 005) feature accumulation.
//!
//! Servers advertise their features and limits as `KEY` or `KEY=VALUE`
//! tokens, possibly across several 005 replies. The client accumulates
//! them into one map; later tokens replace earlier ones.

use std::collections::HashMap;

use crate::casemap::CaseMapping;

/// Accumulated ISUPPORT features for a connection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Isupport {
    entries: HashMap<String, Option<String>>,
}

impl Isupport {
    /// Create an empty feature map.
    pub fn new() -> Isupport {
        Isupport::default()
    }

    /// Absorb the tokens of one 005 reply.
    ///
    /// `params` are the reply parameters *after* the leading client
    /// nick; the trailing "are supported by this server" text is
    /// skipped by the caller passing only the token parameters.
    pub fn absorb<'a, I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for token in tokens {
            if token.is_empty() {
                continue;
            }
            let (key, value) = match token.find('=') {
                Some(eq) => (&token[..eq], Some(token[eq + 1..].to_string())),
                None => (token, None),
            };
            if key.is_empty() {
                continue;
            }
            self.entries.insert(key.to_ascii_uppercase(), value);
        }
    }

    /// Look up a feature. The outer `Option` is presence, the inner is
    /// the value (`KEY` tokens have no value).
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .get(&key.to_ascii_uppercase())
            .map(|v| v.as_deref())
    }

    /// Whether a feature key is present at all.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of accumulated features.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no features have been seen.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all `(key, value)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// The advertised case mapping, if any.
    pub fn casemapping(&self) -> Option<CaseMapping> {
        self.get("CASEMAPPING")
            .flatten()
            .and_then(CaseMapping::from_token)
    }

    /// The advertised channel-type prefix characters.
    pub fn chantypes(&self) -> Option<&str> {
        self.get("CHANTYPES").flatten()
    }

    /// The advertised network name.
    pub fn network(&self) -> Option<&str> {
        self.get("NETWORK").flatten()
    }

    /// The advertised channel-user-mode prefix table.
    pub fn prefix(&self) -> Option<PrefixSpec> {
        self.get("PREFIX").flatten().and_then(PrefixSpec::parse)
    }
}

/// Parsed `PREFIX=(modes)prefixes` token.
///
/// Maps channel-user-mode letters (e.g. `o`, `v`) to the nick prefix
/// characters shown in NAMES replies (e.g. `@`, `+`), in rank order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrefixSpec {
    /// Mode letters, highest rank first.
    pub modes: Vec<char>,
    /// Prefix characters, parallel to `modes`.
    pub prefixes: Vec<char>,
}

impl PrefixSpec {
    /// The default table: `(ov)@+`.
    pub fn default_table() -> PrefixSpec {
        PrefixSpec {
            modes: vec!['o', 'v'],
            prefixes: vec!['@', '+'],
        }
    }

    /// Parse a `(modes)prefixes` value. Both sides must be non-empty
    /// and of equal length.
    pub fn parse(s: &str) -> Option<PrefixSpec> {
        let rest = s.strip_prefix('(')?;
        let close = rest.find(')')?;
        let modes: Vec<char> = rest[..close].chars().collect();
        let prefixes: Vec<char> = rest[close + 1..].chars().collect();
        if modes.is_empty() || modes.len() != prefixes.len() {
            return None;
        }
        Some(PrefixSpec { modes, prefixes })
    }

    /// The mode letter displayed as `prefix`, if any.
    pub fn mode_for(&self, prefix: char) -> Option<char> {
        self.prefixes
            .iter()
            .position(|&p| p == prefix)
            .map(|i| self.modes[i])
    }

    /// The prefix character for a mode letter, if any.
    pub fn prefix_for(&self, mode: char) -> Option<char> {
        self.modes
            .iter()
            .position(|&m| m == mode)
            .map(|i| self.prefixes[i])
    }

    /// Whether `mode` is a channel-user mode under this table.
    pub fn is_member_mode(&self, mode: char) -> bool {
        self.modes.contains(&mode)
    }

    /// Whether `c` is a nick prefix character under this table.
    pub fn is_prefix(&self, c: char) -> bool {
        self.prefixes.contains(&c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_and_get() {
        let mut isupport = Isupport::new();
        isupport.absorb(["PREFIX=(ov)@+", "CHANTYPES=#&", "EXCEPTS"]);

        assert_eq!(isupport.get("prefix"), Some(Some("(ov)@+")));
        assert_eq!(isupport.get("CHANTYPES"), Some(Some("#&")));
        assert_eq!(isupport.get("EXCEPTS"), Some(None));
        assert_eq!(isupport.get("INVEX"), None);
        assert_eq!(isupport.len(), 3);
    }

    #[test]
    fn test_accumulates_across_replies() {
        let mut isupport = Isupport::new();
        isupport.absorb(["NETWORK=TestNet"]);
        isupport.absorb(["CASEMAPPING=ascii", "NETWORK=OtherNet"]);

        assert_eq!(isupport.network(), Some("OtherNet"));
        assert_eq!(isupport.casemapping(), Some(CaseMapping::Ascii));
    }

    #[test]
    fn test_prefix_spec_parse() {
        let spec = PrefixSpec::parse("(qaohv)~&@%+").unwrap();
        assert_eq!(spec.modes, vec!['q', 'a', 'o', 'h', 'v']);
        assert_eq!(spec.prefixes, vec!['~', '&', '@', '%', '+']);
        assert_eq!(spec.mode_for('%'), Some('h'));
        assert_eq!(spec.prefix_for('q'), Some('~'));
        assert!(spec.is_member_mode('a'));
        assert!(!spec.is_member_mode('b'));
    }

    #[test]
    fn test_prefix_spec_rejects_mismatched_lengths() {
        assert!(PrefixSpec::parse("(ov)@").is_none());
        assert!(PrefixSpec::parse("()").is_none());
        assert!(PrefixSpec::parse("@+").is_none());
    }

    #[test]
    fn test_default_table() {
        let spec = PrefixSpec::default_table();
        assert_eq!(spec.mode_for('@'), Some('o'));
        assert_eq!(spec.mode_for('+'), Some('v'));
    }
}
