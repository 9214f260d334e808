//! Message source (prefix) types.
//!
//! The optional prefix of an IRC line identifies where the message came
//! from: either a server name or a `nick[!user][@host]` mask.
//!
//! # Reference
//! - RFC 2812 Section 2.3.1: Message format

use std::fmt;

use crate::error::MessageParseError;

/// The origin of a message.
///
/// A prefix containing a dot and neither `!` nor `@` is classified as a
/// server name; anything else is a user mask, with a bare word treated
/// as a nick name.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Source {
    /// Server name (e.g., "irc.example.com").
    Server(String),
    /// User mask.
    User {
        /// Nick name.
        nick: String,
        /// User name (ident), if present.
        user: Option<String>,
        /// Host name, if present.
        host: Option<String>,
    },
}

impl Source {
    /// Parse a prefix string. This is a lenient classifier and never
    /// fails; garbage ends up as a bare-nick user source.
    pub fn parse(s: &str) -> Source {
        SourceRef::parse(s).to_owned()
    }

    /// Parse with validation, returning an error for prefixes that
    /// could not legally appear on the wire.
    pub fn try_from_str(s: &str) -> Result<Source, MessageParseError> {
        if s.is_empty() || s.chars().any(|c| c == ' ' || c == '\0' || c == '\r' || c == '\n') {
            return Err(MessageParseError::InvalidPrefix(s.to_owned()));
        }
        Ok(Source::parse(s))
    }

    /// Create a user source from just a nick name.
    pub fn user(nick: impl Into<String>) -> Source {
        Source::User {
            nick: nick.into(),
            user: None,
            host: None,
        }
    }

    /// Get the nick name if this is a user source.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Source::User { nick, .. } if !nick.is_empty() => Some(nick),
            _ => None,
        }
    }

    /// Get the host name, for either variant.
    pub fn host(&self) -> Option<&str> {
        match self {
            Source::Server(name) => Some(name),
            Source::User { host, .. } => host.as_deref(),
        }
    }

    /// Whether this source is a server name.
    pub fn is_server(&self) -> bool {
        matches!(self, Source::Server(_))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Server(name) => f.write_str(name),
            Source::User { nick, user, host } => {
                f.write_str(nick)?;
                if let Some(user) = user {
                    write!(f, "!{}", user)?;
                }
                if let Some(host) = host {
                    write!(f, "@{}", host)?;
                }
                Ok(())
            }
        }
    }
}

/// A borrowed view of a parsed prefix.
///
/// Used for zero-copy parsing of incoming lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceRef<'a> {
    /// Nick name, absent for server prefixes.
    pub nick: Option<&'a str>,
    /// User name (ident).
    pub user: Option<&'a str>,
    /// Host name; for a server prefix this is the server name.
    pub host: Option<&'a str>,
    /// Original raw prefix string.
    pub raw: &'a str,
}

impl<'a> SourceRef<'a> {
    /// Split a prefix string into components without allocation.
    pub fn parse(s: &'a str) -> SourceRef<'a> {
        if let Some(at_pos) = s.find('@') {
            let before = &s[..at_pos];
            let host = &s[at_pos + 1..];

            let (nick, user) = match before.find('!') {
                Some(bang) => {
                    let n = &before[..bang];
                    let u = &before[bang + 1..];
                    (
                        if n.is_empty() { None } else { Some(n) },
                        if u.is_empty() { None } else { Some(u) },
                    )
                }
                None => (
                    if before.is_empty() { None } else { Some(before) },
                    None,
                ),
            };

            SourceRef {
                nick,
                user,
                host: if host.is_empty() { None } else { Some(host) },
                raw: s,
            }
        } else if let Some(bang) = s.find('!') {
            // nick!user without @host
            let nick = &s[..bang];
            let user = &s[bang + 1..];

            SourceRef {
                nick: if nick.is_empty() { None } else { Some(nick) },
                user: if user.is_empty() { None } else { Some(user) },
                host: None,
                raw: s,
            }
        } else if s.contains('.') {
            // A dot with no user separators means a server name.
            SourceRef {
                nick: None,
                user: None,
                host: Some(s),
                raw: s,
            }
        } else {
            SourceRef {
                nick: Some(s),
                user: None,
                host: None,
                raw: s,
            }
        }
    }

    /// Whether this prefix is a server name.
    pub fn is_server(&self) -> bool {
        self.nick.is_none() && self.user.is_none() && self.host.is_some()
    }

    /// Get the nick name if this is a user prefix.
    #[inline]
    pub fn nickname(&self) -> Option<&'a str> {
        self.nick
    }

    /// Convert to an owned [`Source`].
    pub fn to_owned(&self) -> Source {
        if self.is_server() {
            Source::Server(self.host.unwrap_or_default().to_string())
        } else {
            Source::User {
                nick: self.nick.unwrap_or_default().to_string(),
                user: self.user.map(str::to_string),
                host: self.host.map(str::to_string),
            }
        }
    }
}

/// Check a nick name against the RFC 2812 grammar.
///
/// The first character must be a letter or one of ``[]\`_^{|}``; the
/// rest may also be digits or `-`.
pub fn is_valid_nickname(nick: &str) -> bool {
    let mut chars = nick.chars();

    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };

    let is_special = |c: char| {
        let code = c as u32;
        (0x5B..=0x60).contains(&code) || (0x7B..=0x7D).contains(&code)
    };

    if !(first.is_ascii_alphabetic() || is_special(first)) {
        return false;
    }

    for c in chars {
        if !(c.is_ascii_alphanumeric() || is_special(c) || c == '-') {
            return false;
        }
    }

    nick.len() <= 50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_name() {
        let s = Source::parse("irc.example.com");
        assert_eq!(s, Source::Server("irc.example.com".into()));
        assert!(s.is_server());
        assert_eq!(s.host(), Some("irc.example.com"));
    }

    #[test]
    fn test_parse_nick_user_host() {
        let s = Source::parse("nick!user@host.com");
        assert_eq!(
            s,
            Source::User {
                nick: "nick".into(),
                user: Some("user".into()),
                host: Some("host.com".into()),
            }
        );
        assert_eq!(s.nick(), Some("nick"));
    }

    #[test]
    fn test_parse_nick_host_without_user() {
        let s = Source::parse("nick@host.com");
        assert_eq!(
            s,
            Source::User {
                nick: "nick".into(),
                user: None,
                host: Some("host.com".into()),
            }
        );
    }

    #[test]
    fn test_parse_bare_nick_fallback() {
        let s = Source::parse("somenick");
        assert_eq!(s.nick(), Some("somenick"));
        assert!(!s.is_server());
    }

    #[test]
    fn test_dotted_nick_with_host_is_user() {
        // The dot rule only applies when no user separators are present.
        let s = Source::parse("we.ird!u@h");
        assert_eq!(s.nick(), Some("we.ird"));
    }

    #[test]
    fn test_source_ref_round_trip() {
        for raw in ["irc.example.com", "nick!user@host", "nick@host", "nick"] {
            let parsed = SourceRef::parse(raw);
            assert_eq!(parsed.to_owned().to_string(), raw);
        }
    }

    #[test]
    fn test_try_from_str_rejects_garbage() {
        assert!(Source::try_from_str("").is_err());
        assert!(Source::try_from_str("nick with space").is_err());
        assert!(Source::try_from_str("nick\r\n").is_err());
        assert!(Source::try_from_str("nick!user@host").is_ok());
    }

    #[test]
    fn test_valid_nicknames() {
        assert!(is_valid_nickname("nick"));
        assert!(is_valid_nickname("[away]"));
        assert!(is_valid_nickname("a-b_c"));
        assert!(!is_valid_nickname(""));
        assert!(!is_valid_nickname("1digitfirst"));
        assert!(!is_valid_nickname("has space"));
    }
}
