//! IRC line splitting.
//!
//! Splits one raw line into prefix, command, and parameters. The
//! splitter is lenient about input: it accepts either line terminator,
//! collapses space runs between parameters, and leaves all wire
//! validation to the outbound serializer.

use nom::{
    bytes::complete::{take_till1, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::MessageParseError;

use super::MAX_PARAMS;

/// A split IRC line holding references into the original input.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct RawMessage<'a> {
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub params: Vec<&'a str>,
}

/// Split a complete IRC line into its components.
///
/// Line format:
/// ```text
/// [:prefix] <command> [params...] [:trailing]
/// ```
pub(super) fn split_line(input: &str) -> Result<RawMessage<'_>, MessageParseError> {
    let line = input.trim_end_matches(['\r', '\n']);

    let head: IResult<&str, (Option<&str>, &str, &str)> = tuple((
        opt(preceded(char(':'), take_till1(|c| c == ' '))),
        space0,
        take_while1(char::is_alphanumeric),
    ))(line);

    match head {
        Ok((after_command, (prefix, _, command))) => Ok(RawMessage {
            prefix,
            command,
            params: gather_params(after_command),
        }),
        Err(_) => Err(MessageParseError::InvalidCommand(line.to_owned())),
    }
}

/// Split the text after the command into parameters.
///
/// Middle parameters are separated by runs of spaces. A parameter
/// introduced by `:` is trailing and takes the rest of the line
/// verbatim; the fifteenth parameter is trailing whether or not it
/// carries the colon sigil.
fn gather_params(mut text: &str) -> Vec<&str> {
    let mut params = Vec::new();

    loop {
        text = text.trim_start_matches(' ');
        if text.is_empty() {
            return params;
        }

        if text.starts_with(':') || params.len() + 1 == MAX_PARAMS {
            params.push(text.strip_prefix(':').unwrap_or(text));
            return params;
        }

        match text.split_once(' ') {
            Some((param, tail)) => {
                params.push(param);
                text = tail;
            }
            None => {
                params.push(text);
                return params;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(line: &str) -> RawMessage<'_> {
        split_line(line).expect("line should split")
    }

    #[test]
    fn test_command_alone() {
        let msg = split("LIST");
        assert_eq!(
            msg,
            RawMessage {
                prefix: None,
                command: "LIST",
                params: vec![],
            }
        );
    }

    #[test]
    fn test_kick_with_comment() {
        let msg = split(":op!o@host.net KICK #room guest :flooding");
        assert_eq!(msg.prefix, Some("op!o@host.net"));
        assert_eq!(msg.command, "KICK");
        assert_eq!(msg.params, vec!["#room", "guest", "flooding"]);
    }

    #[test]
    fn test_isupport_reply_shape() {
        let msg =
            split(":hub.net 005 me CHANTYPES=#& PREFIX=(ov)@+ :are supported by this server");
        assert_eq!(msg.prefix, Some("hub.net"));
        assert_eq!(msg.command, "005");
        assert_eq!(
            msg.params,
            vec![
                "me",
                "CHANTYPES=#&",
                "PREFIX=(ov)@+",
                "are supported by this server"
            ]
        );
    }

    #[test]
    fn test_space_runs_between_params() {
        let msg = split("MODE   #room  +nt");
        assert_eq!(msg.params, vec!["#room", "+nt"]);
    }

    #[test]
    fn test_terminators_are_stripped() {
        assert_eq!(split("AWAY :brb\r\n").params, vec!["brb"]);
        assert_eq!(split("AWAY :brb\n").params, vec!["brb"]);
    }

    #[test]
    fn test_trailing_takes_everything_verbatim() {
        let msg = split("TOPIC #room ::: spaced : out :::");
        assert_eq!(msg.params, vec!["#room", ":: spaced : out :::"]);
    }

    #[test]
    fn test_empty_trailing_is_a_parameter() {
        assert_eq!(split("TOPIC #room :").params, vec!["#room", ""]);
    }

    #[test]
    fn test_missing_command_is_an_error() {
        assert!(split_line(":prefix.only").is_err());
        assert!(split_line("").is_err());
        assert!(split_line("   ").is_err());
    }

    #[test]
    fn test_fifteenth_parameter_takes_the_rest() {
        let mut line = String::from("CMD");
        for n in 1..15 {
            line.push_str(&format!(" p{}", n));
        }
        line.push_str(" last one untouched");

        let msg = split(&line);
        assert_eq!(msg.params.len(), 15);
        assert_eq!(msg.params[0], "p1");
        assert_eq!(msg.params[14], "last one untouched");
    }

    #[test]
    fn test_fifteenth_parameter_colon_is_optional() {
        let mut line = String::from("CMD");
        for n in 1..15 {
            line.push_str(&format!(" p{}", n));
        }
        line.push_str(" :with sigil");

        let msg = split(&line);
        assert_eq!(msg.params.len(), 15);
        assert_eq!(msg.params[14], "with sigil");
    }
}
