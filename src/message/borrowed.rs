//! Borrowed message view.

use crate::error::MessageParseError;
use crate::source::SourceRef;

use super::parse::split_line;
use super::types::Message;

/// A parsed IRC message holding references into the original line.
///
/// This is the zero-copy counterpart of [`Message`], used on the
/// receive path where most lines are inspected once and discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRef<'a> {
    /// Raw prefix string (without the leading `:`), if present.
    pub prefix: Option<&'a str>,
    /// The command name or numeric, as it appeared on the wire.
    pub command: &'a str,
    /// Command parameters, including the trailing parameter.
    pub params: Vec<&'a str>,
}

impl<'a> MessageRef<'a> {
    /// Parse an IRC line into a `MessageRef`.
    ///
    /// Accepts lines with or without the `\r\n` terminator. Empty lines
    /// are rejected with [`MessageParseError::EmptyMessage`]; the caller
    /// is expected to skip them.
    pub fn parse(input: &'a str) -> Result<MessageRef<'a>, MessageParseError> {
        let trimmed = input.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let raw = split_line(trimmed)?;

        Ok(MessageRef {
            prefix: raw.prefix,
            command: raw.command,
            params: raw.params,
        })
    }

    /// Get the parsed source of this message, if it carried a prefix.
    pub fn source(&self) -> Option<SourceRef<'a>> {
        self.prefix.map(SourceRef::parse)
    }

    /// Get parameter `i`, if present.
    #[inline]
    pub fn arg(&self, i: usize) -> Option<&'a str> {
        self.params.get(i).copied()
    }

    /// Interpret the command as a numeric reply code.
    pub fn numeric(&self) -> Option<u16> {
        if self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit()) {
            self.command.parse().ok()
        } else {
            None
        }
    }

    /// Convert to an owned [`Message`].
    pub fn to_owned(&self) -> Message {
        Message {
            prefix: self.source().map(|s| s.to_owned()),
            command: self.command.to_string(),
            params: self.params.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ref() {
        let msg = MessageRef::parse(":alice!a@host PRIVMSG #chan :hello world\r\n").unwrap();
        assert_eq!(msg.prefix, Some("alice!a@host"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#chan", "hello world"]);

        let source = msg.source().unwrap();
        assert_eq!(source.nick, Some("alice"));
        assert_eq!(source.user, Some("a"));
        assert_eq!(source.host, Some("host"));
    }

    #[test]
    fn test_numeric() {
        let msg = MessageRef::parse(":server 001 nick :Welcome").unwrap();
        assert_eq!(msg.numeric(), Some(1));

        let msg = MessageRef::parse("PING :x").unwrap();
        assert_eq!(msg.numeric(), None);
    }

    #[test]
    fn test_empty_line_rejected() {
        assert_eq!(
            MessageRef::parse("\r\n").unwrap_err(),
            MessageParseError::EmptyMessage
        );
    }

    #[test]
    fn test_to_owned() {
        let msg = MessageRef::parse(":irc.example.com 372 nick :- motd line").unwrap();
        let owned = msg.to_owned();
        assert_eq!(owned.command, "372");
        assert_eq!(owned.params, vec!["nick", "- motd line"]);
        assert!(owned.prefix.as_ref().is_some_and(|s| s.is_server()));
    }
}
