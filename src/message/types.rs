//! Owned IRC message and target types.

use std::str::FromStr;

use crate::error::MessageParseError;
use crate::source::Source;

use super::borrowed::MessageRef;

/// An owned IRC message.
///
/// Contains the optional source prefix and the command with its
/// parameters. Messages are immutable once parsed; construction goes
/// through [`Message::new`] or the convenience constructors.
///
/// # Example
///
/// ```
/// use slirc_client::Message;
///
/// // Parse a message
/// let msg: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
/// assert_eq!(msg.command, "PRIVMSG");
///
/// // Construct a message
/// let msg = Message::privmsg("#channel", "Hello!");
/// assert_eq!(msg.to_wire().unwrap(), "PRIVMSG #channel :Hello!\r\n");
/// ```
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Message source, if it carried a prefix.
    pub prefix: Option<Source>,
    /// The command name (alphabetic) or 3-digit numeric.
    pub command: String,
    /// Command parameters; only the last may contain spaces.
    pub params: Vec<String>,
}

impl Message {
    /// Create a new message from raw components.
    pub fn new<C, P>(command: C, params: P) -> Message
    where
        C: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Message {
            prefix: None,
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Attach a source prefix to this message.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Source) -> Message {
        self.prefix = Some(prefix);
        self
    }

    /// Get the nick name from the message prefix, if present.
    pub fn source_nickname(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Source::nick)
    }

    /// Interpret the command as a numeric reply code.
    pub fn numeric(&self) -> Option<u16> {
        if self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit()) {
            self.command.parse().ok()
        } else {
            None
        }
    }

    /// Create a PRIVMSG to a target.
    #[must_use]
    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Message {
        let params: [String; 2] = [target.into(), text.into()];
        Message::new("PRIVMSG", params)
    }

    /// Create a NOTICE to a target.
    #[must_use]
    pub fn notice(target: impl Into<String>, text: impl Into<String>) -> Message {
        let params: [String; 2] = [target.into(), text.into()];
        Message::new("NOTICE", params)
    }

    /// Create a JOIN for a comma-separated channel list, optionally
    /// with a matching key list.
    #[must_use]
    pub fn join(channels: impl Into<String>, keys: Option<String>) -> Message {
        let channels: String = channels.into();
        match keys {
            Some(keys) => Message::new("JOIN", [channels, keys]),
            None => Message::new("JOIN", [channels]),
        }
    }

    /// Create a PART, optionally with a comment.
    #[must_use]
    pub fn part(channels: impl Into<String>, comment: Option<String>) -> Message {
        let channels: String = channels.into();
        match comment {
            Some(comment) => Message::new("PART", [channels, comment]),
            None => Message::new("PART", [channels]),
        }
    }

    /// Create a NICK change request.
    #[must_use]
    pub fn nick(nickname: impl Into<String>) -> Message {
        let params: [String; 1] = [nickname.into()];
        Message::new("NICK", params)
    }

    /// Create a PASS for registration.
    #[must_use]
    pub fn pass(password: impl Into<String>) -> Message {
        let params: [String; 1] = [password.into()];
        Message::new("PASS", params)
    }

    /// Create a USER registration message.
    ///
    /// `mode_bits` encodes the initial user modes (`w` = 0x02,
    /// `i` = 0x04).
    #[must_use]
    pub fn user(username: impl Into<String>, mode_bits: u8, realname: impl Into<String>) -> Message {
        Message::new(
            "USER",
            [
                username.into(),
                mode_bits.to_string(),
                "*".to_string(),
                realname.into(),
            ],
        )
    }

    /// Create a SERVICE registration message.
    #[must_use]
    pub fn service(
        nickname: impl Into<String>,
        distribution: impl Into<String>,
        info: impl Into<String>,
    ) -> Message {
        Message::new(
            "SERVICE",
            [
                nickname.into(),
                "*".to_string(),
                distribution.into(),
                "0".to_string(),
                "0".to_string(),
                info.into(),
            ],
        )
    }

    /// Create a PING.
    #[must_use]
    pub fn ping(token: impl Into<String>) -> Message {
        let params: [String; 1] = [token.into()];
        Message::new("PING", params)
    }

    /// Create a PONG answering a PING token.
    #[must_use]
    pub fn pong(token: impl Into<String>) -> Message {
        let params: [String; 1] = [token.into()];
        Message::new("PONG", params)
    }

    /// Create a QUIT, optionally with a reason.
    #[must_use]
    pub fn quit(reason: Option<String>) -> Message {
        match reason {
            Some(reason) => Message::new("QUIT", [reason]),
            None => Message::new("QUIT", Vec::<String>::new()),
        }
    }

    /// Create a KICK, optionally with a comment.
    #[must_use]
    pub fn kick(
        channel: impl Into<String>,
        nicknames: impl Into<String>,
        comment: Option<String>,
    ) -> Message {
        let (channel, nicknames): (String, String) = (channel.into(), nicknames.into());
        match comment {
            Some(comment) => Message::new("KICK", [channel, nicknames, comment]),
            None => Message::new("KICK", [channel, nicknames]),
        }
    }

    /// Create an INVITE. Parameter order is `nick channel` per RFC 2812.
    #[must_use]
    pub fn invite(nickname: impl Into<String>, channel: impl Into<String>) -> Message {
        let params: [String; 2] = [nickname.into(), channel.into()];
        Message::new("INVITE", params)
    }

    /// Create a TOPIC query or change.
    #[must_use]
    pub fn topic(channel: impl Into<String>, topic: Option<String>) -> Message {
        let channel: String = channel.into();
        match topic {
            Some(topic) => Message::new("TOPIC", [channel, topic]),
            None => Message::new("TOPIC", [channel]),
        }
    }

    /// Create an AWAY message; `None` clears away status.
    #[must_use]
    pub fn away(text: Option<String>) -> Message {
        match text {
            Some(text) => Message::new("AWAY", [text]),
            None => Message::new("AWAY", Vec::<String>::new()),
        }
    }
}

impl FromStr for Message {
    type Err = MessageParseError;

    fn from_str(s: &str) -> Result<Message, MessageParseError> {
        MessageRef::parse(s).map(|m| m.to_owned())
    }
}

/// Target of a PRIVMSG or NOTICE.
///
/// Classification follows RFC 2812: `$mask` is a server mask, a
/// `#mask` containing a dot is a host mask, other channel-type prefixes
/// name a channel, and anything else is a nick name.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageTarget {
    /// A channel name.
    Channel(String),
    /// A user nick name.
    User(String),
    /// A server or host mask (operators only).
    TargetMask {
        /// Which kind of mask.
        kind: TargetMaskKind,
        /// The mask pattern, without its sigil.
        mask: String,
    },
}

/// Kind of a `$`/`#` message target mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetMaskKind {
    /// `$mask` — matches server names.
    Server,
    /// `#mask` — matches host names.
    Host,
}

impl MessageTarget {
    /// Classify a wire-form target using the given channel-type prefix
    /// characters (ISUPPORT `CHANTYPES`, default `#&+!`).
    pub fn parse(s: &str, chantypes: &str) -> MessageTarget {
        if let Some(mask) = s.strip_prefix('$') {
            return MessageTarget::TargetMask {
                kind: TargetMaskKind::Server,
                mask: mask.to_string(),
            };
        }
        if let Some(mask) = s.strip_prefix('#') {
            // Host masks must contain a dot; everything else starting
            // with '#' is a channel.
            if mask.contains('.') && mask.contains('*') {
                return MessageTarget::TargetMask {
                    kind: TargetMaskKind::Host,
                    mask: mask.to_string(),
                };
            }
        }
        if s.starts_with(|c| chantypes.contains(c)) {
            MessageTarget::Channel(s.to_string())
        } else {
            MessageTarget::User(s.to_string())
        }
    }

    /// The wire form of this target.
    pub fn to_wire(&self) -> String {
        match self {
            MessageTarget::Channel(name) => name.clone(),
            MessageTarget::User(nick) => nick.clone(),
            MessageTarget::TargetMask {
                kind: TargetMaskKind::Server,
                mask,
            } => format!("${}", mask),
            MessageTarget::TargetMask {
                kind: TargetMaskKind::Host,
                mask,
            } => format!("#{}", mask),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANTYPES: &str = "#&+!";

    #[test]
    fn test_privmsg_constructor() {
        let msg = Message::privmsg("#channel", "Hello, world!");
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#channel", "Hello, world!"]);
        assert!(msg.prefix.is_none());
    }

    #[test]
    fn test_join_with_keys() {
        let msg = Message::join("#a,#b".to_string(), Some("k1,k2".to_string()));
        assert_eq!(msg.params, vec!["#a,#b", "k1,k2"]);
    }

    #[test]
    fn test_user_mode_bits() {
        let msg = Message::user("guest", 8, "Real Name");
        assert_eq!(msg.params, vec!["guest", "8", "*", "Real Name"]);
    }

    #[test]
    fn test_quit_without_reason() {
        let msg = Message::quit(None);
        assert_eq!(msg.command, "QUIT");
        assert!(msg.params.is_empty());
    }

    #[test]
    fn test_parse_from_str() {
        let msg: Message = ":irc.host 372 me :- line".parse().unwrap();
        assert_eq!(msg.numeric(), Some(372));
        assert_eq!(msg.source_nickname(), None);
    }

    #[test]
    fn test_target_channel() {
        assert_eq!(
            MessageTarget::parse("#chan", CHANTYPES),
            MessageTarget::Channel("#chan".into())
        );
        assert_eq!(
            MessageTarget::parse("&local", CHANTYPES),
            MessageTarget::Channel("&local".into())
        );
    }

    #[test]
    fn test_target_user() {
        assert_eq!(
            MessageTarget::parse("alice", CHANTYPES),
            MessageTarget::User("alice".into())
        );
    }

    #[test]
    fn test_target_server_mask() {
        assert_eq!(
            MessageTarget::parse("$*.example.com", CHANTYPES),
            MessageTarget::TargetMask {
                kind: TargetMaskKind::Server,
                mask: "*.example.com".into(),
            }
        );
    }

    #[test]
    fn test_target_host_mask_needs_dot_and_wildcard() {
        assert_eq!(
            MessageTarget::parse("#*.example.com", CHANTYPES),
            MessageTarget::TargetMask {
                kind: TargetMaskKind::Host,
                mask: "*.example.com".into(),
            }
        );
        // A dotted channel without wildcards stays a channel.
        assert_eq!(
            MessageTarget::parse("#dotted.name", CHANTYPES),
            MessageTarget::Channel("#dotted.name".into())
        );
    }

    #[test]
    fn test_target_round_trip() {
        for raw in ["#chan", "alice", "$*.net", "#*.fi"] {
            assert_eq!(MessageTarget::parse(raw, CHANTYPES).to_wire(), raw);
        }
    }
}
