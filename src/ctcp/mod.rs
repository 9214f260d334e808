//! CTCP (Client-to-Client Protocol) tagged data.
//!
//! CTCP payloads ride inside PRIVMSG and NOTICE texts between `\x01`
//! delimiters. A payload carried by PRIVMSG is a request; the same
//! payload in a NOTICE is a response.
//!
//! This implementation handles one payload per carrier message (the
//! common wire form); plain text surrounding the delimiters is
//! discarded.
//!
//! # Example
//!
//! ```
//! use slirc_client::ctcp::{Ctcp, CtcpKind};
//!
//! let ctcp = Ctcp::extract("\x01ACTION waves hello\x01").unwrap();
//! assert_eq!(ctcp.kind, CtcpKind::Action);
//! assert_eq!(ctcp.data.as_deref(), Some("waves hello"));
//!
//! let action = Ctcp::action("dances");
//! assert_eq!(action.encode(), "\x01ACTION dances\x01");
//! ```

pub mod quote;

use std::fmt;

use self::quote::{ctcp_dequote, ctcp_quote, low_level_dequote, low_level_quote};

/// The CTCP delimiter character (`\x01`).
pub const CTCP_DELIMITER: char = '\x01';

/// Known CTCP tags.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CtcpKind {
    /// ACTION - describes an action performed by the user (`/me`).
    Action,
    /// VERSION - requests client version information.
    Version,
    /// TIME - requests local time from the client.
    Time,
    /// PING - measures round-trip latency.
    Ping,
    /// ERRMSG - error echo and error reports.
    ErrMsg,
    /// Unknown or custom CTCP tag.
    Unknown(String),
}

impl CtcpKind {
    /// Parse a tag name into a `CtcpKind`. Names are canonicalized to
    /// upper case.
    pub fn parse(name: &str) -> CtcpKind {
        match name.to_ascii_uppercase().as_str() {
            "ACTION" => CtcpKind::Action,
            "VERSION" => CtcpKind::Version,
            "TIME" => CtcpKind::Time,
            "PING" => CtcpKind::Ping,
            "ERRMSG" => CtcpKind::ErrMsg,
            other => CtcpKind::Unknown(other.to_owned()),
        }
    }

    /// The canonical upper-case name of this tag.
    pub fn as_str(&self) -> &str {
        match self {
            CtcpKind::Action => "ACTION",
            CtcpKind::Version => "VERSION",
            CtcpKind::Time => "TIME",
            CtcpKind::Ping => "PING",
            CtcpKind::ErrMsg => "ERRMSG",
            CtcpKind::Unknown(s) => s,
        }
    }
}

impl fmt::Display for CtcpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded CTCP payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp {
    /// The tag.
    pub kind: CtcpKind,
    /// Data following the tag, if any.
    pub data: Option<String>,
}

impl Ctcp {
    /// Create a payload from a tag and optional data.
    pub fn new(kind: CtcpKind, data: Option<String>) -> Ctcp {
        Ctcp { kind, data }
    }

    /// Create an ACTION payload.
    pub fn action(text: impl Into<String>) -> Ctcp {
        Ctcp::new(CtcpKind::Action, Some(text.into()))
    }

    /// Create a VERSION request.
    pub fn version() -> Ctcp {
        Ctcp::new(CtcpKind::Version, None)
    }

    /// Create a VERSION reply.
    pub fn version_reply(version: impl Into<String>) -> Ctcp {
        Ctcp::new(CtcpKind::Version, Some(version.into()))
    }

    /// Create a TIME request.
    pub fn time() -> Ctcp {
        Ctcp::new(CtcpKind::Time, None)
    }

    /// Create a PING payload carrying a tick token.
    pub fn ping(token: impl Into<String>) -> Ctcp {
        Ctcp::new(CtcpKind::Ping, Some(token.into()))
    }

    /// Whether a carrier text holds a tagged payload.
    #[inline]
    pub fn is_tagged(text: &str) -> bool {
        text.starts_with(CTCP_DELIMITER)
    }

    /// Extract the tagged payload from a PRIVMSG/NOTICE text.
    ///
    /// Strips the delimiters, applies low-level dequoting then CTCP
    /// dequoting, and splits the tag from the data on the first space.
    /// A leading `:` on the data is stripped. Returns `None` when the
    /// text carries no payload.
    pub fn extract(text: &str) -> Option<Ctcp> {
        let inner = text.strip_prefix(CTCP_DELIMITER)?;
        // Lenient about a missing closing delimiter; some clients omit it.
        let inner = inner.strip_suffix(CTCP_DELIMITER).unwrap_or(inner);
        if inner.is_empty() {
            return None;
        }

        let decoded = ctcp_dequote(&low_level_dequote(inner));

        let (tag, data) = match decoded.find(' ') {
            Some(pos) => {
                let data = decoded[pos + 1..].strip_prefix(':').map(str::to_string).unwrap_or_else(
                    || decoded[pos + 1..].to_string(),
                );
                (
                    decoded[..pos].to_string(),
                    if data.is_empty() { None } else { Some(data) },
                )
            }
            None => (decoded, None),
        };

        if tag.is_empty() {
            return None;
        }

        Some(Ctcp {
            kind: CtcpKind::parse(&tag),
            data,
        })
    }

    /// Encode this payload into a carrier text: quote both stages and
    /// wrap in delimiters.
    pub fn encode(&self) -> String {
        let body = match &self.data {
            Some(data) => format!("{} {}", self.kind, data),
            None => self.kind.to_string(),
        };
        format!(
            "{}{}{}",
            CTCP_DELIMITER,
            low_level_quote(&ctcp_quote(&body)),
            CTCP_DELIMITER
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_action() {
        let ctcp = Ctcp::extract("\x01ACTION waves hello\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Action);
        assert_eq!(ctcp.data.as_deref(), Some("waves hello"));
    }

    #[test]
    fn test_extract_bare_version() {
        let ctcp = Ctcp::extract("\x01VERSION\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Version);
        assert_eq!(ctcp.data, None);
    }

    #[test]
    fn test_extract_strips_data_colon() {
        let ctcp = Ctcp::extract("\x01PING :12345\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Ping);
        assert_eq!(ctcp.data.as_deref(), Some("12345"));
    }

    #[test]
    fn test_extract_case_insensitive_tag() {
        let ctcp = Ctcp::extract("\x01action waves\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Action);
    }

    #[test]
    fn test_extract_missing_trailing_delimiter() {
        let ctcp = Ctcp::extract("\x01ACTION waves").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Action);
        assert_eq!(ctcp.data.as_deref(), Some("waves"));
    }

    #[test]
    fn test_extract_not_tagged() {
        assert!(Ctcp::extract("hello world").is_none());
        assert!(Ctcp::extract("").is_none());
        assert!(Ctcp::extract("\x01\x01").is_none());
    }

    #[test]
    fn test_extract_unknown_tag() {
        let ctcp = Ctcp::extract("\x01CUSTOM foo bar\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Unknown("CUSTOM".to_owned()));
        assert_eq!(ctcp.data.as_deref(), Some("foo bar"));
    }

    #[test]
    fn test_extract_dequotes_payload() {
        // Encoded newline inside the data survives both stages.
        let encoded = Ctcp::new(CtcpKind::ErrMsg, Some("line1\nline2".into())).encode();
        let ctcp = Ctcp::extract(&encoded).unwrap();
        assert_eq!(ctcp.data.as_deref(), Some("line1\nline2"));
    }

    #[test]
    fn test_encode_action() {
        assert_eq!(Ctcp::action("dances").encode(), "\x01ACTION dances\x01");
    }

    #[test]
    fn test_encode_bare_tag() {
        assert_eq!(Ctcp::version().encode(), "\x01VERSION\x01");
    }

    #[test]
    fn test_is_tagged() {
        assert!(Ctcp::is_tagged("\x01VERSION\x01"));
        assert!(!Ctcp::is_tagged("plain text"));
    }

    #[test]
    fn test_round_trip() {
        for payload in [
            Ctcp::action("does something"),
            Ctcp::version_reply("slirc-client 0.3"),
            Ctcp::ping("1234567890"),
            Ctcp::new(CtcpKind::ErrMsg, Some("query :no error".into())),
        ] {
            assert_eq!(Ctcp::extract(&payload.encode()), Some(payload));
        }
    }
}
