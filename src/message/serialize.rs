//! Wire serialization of outbound messages.

use crate::error::MessageParseError;

use super::types::Message;
use super::MAX_PARAMS;

impl Message {
    /// Serialize this message to its wire form, including the trailing
    /// `\r\n`.
    ///
    /// The command is upper-cased on emit. Middle parameters must be
    /// non-empty, contain no space, NUL, CR, or LF, and must not begin
    /// with `:`; the final parameter may contain spaces and is always
    /// emitted with a `:` sigil (even when empty). Fails with
    /// [`MessageParseError::InvalidCommand`],
    /// [`MessageParseError::InvalidParameter`], or
    /// [`MessageParseError::TooManyParameters`].
    pub fn to_wire(&self) -> Result<String, MessageParseError> {
        validate_command(&self.command)?;
        if self.params.len() > MAX_PARAMS {
            return Err(MessageParseError::TooManyParameters(self.params.len()));
        }

        let mut out = String::with_capacity(64);

        if let Some(ref prefix) = self.prefix {
            out.push(':');
            out.push_str(&prefix.to_string());
            out.push(' ');
        }

        for c in self.command.chars() {
            out.push(c.to_ascii_uppercase());
        }

        if let Some((last, middle)) = self.params.split_last() {
            for param in middle {
                validate_middle_param(param)?;
                out.push(' ');
                out.push_str(param);
            }
            validate_trailing_param(last)?;
            out.push_str(" :");
            out.push_str(last);
        }

        out.push_str("\r\n");
        Ok(out)
    }
}

fn validate_command(command: &str) -> Result<(), MessageParseError> {
    let valid = !command.is_empty()
        && !command.chars().any(|c| c == '\0' || c == '\r' || c == '\n')
        && (command.chars().all(|c| c.is_ascii_alphabetic())
            || (command.len() == 3 && command.bytes().all(|b| b.is_ascii_digit())));
    if valid {
        Ok(())
    } else {
        Err(MessageParseError::InvalidCommand(command.to_owned()))
    }
}

fn validate_middle_param(param: &str) -> Result<(), MessageParseError> {
    if param.is_empty()
        || param.starts_with(':')
        || param
            .chars()
            .any(|c| c == ' ' || c == '\0' || c == '\r' || c == '\n')
    {
        return Err(MessageParseError::InvalidParameter(param.to_owned()));
    }
    Ok(())
}

fn validate_trailing_param(param: &str) -> Result<(), MessageParseError> {
    if param.chars().any(|c| c == '\0' || c == '\r' || c == '\n') {
        return Err(MessageParseError::InvalidParameter(param.to_owned()));
    }
    Ok(())
}
