//! Error types for the IRC client library.
//!
//! This module defines error types for codec-level failures, message
//! parsing and assembly, mode parsing, and local command-builder
//! precondition checks.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors surfaced at the codec boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Message exceeded maximum allowed length.
    #[error("message too long: {actual} bytes (limit {limit})")]
    MessageTooLong {
        /// Observed line length in bytes.
        actual: usize,
        /// The configured limit.
        limit: usize,
    },

    /// Failed to parse an IRC message.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The raw message string.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },

    /// Unknown character encoding label.
    #[cfg(feature = "encoding")]
    #[error("unknown encoding label: {0}")]
    UnknownEncoding(String),
}

/// Errors encountered when parsing or assembling IRC messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Message was empty.
    #[error("empty message")]
    EmptyMessage,

    /// Command was missing, empty, or contained illegal characters.
    #[error("invalid command: {0:?}")]
    InvalidCommand(String),

    /// A middle parameter contained a space, NUL, CR, LF, or a leading
    /// colon; or a trailing parameter contained NUL, CR, or LF.
    #[error("invalid parameter: {0:?}")]
    InvalidParameter(String),

    /// More than 15 parameters were supplied.
    #[error("too many parameters: {0} (limit 15)")]
    TooManyParameters(usize),

    /// Invalid message prefix.
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    /// Failed to parse a mode string.
    #[error("invalid mode string: {string}")]
    InvalidModeString {
        /// The raw mode string.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: ModeParseError,
    },
}

/// Errors encountered when parsing mode strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModeParseError {
    /// A mode letter that requires an argument had none.
    #[error("mode '{mode}' requires an argument but none was provided")]
    MissingModeArgument {
        /// The mode letter.
        mode: char,
    },

    /// Arguments were left over after all mode letters were consumed.
    #[error("unused arguments after mode parsing: {0}")]
    UnusedModeArguments(usize),
}

/// Local precondition failures raised synchronously by command builders.
///
/// These never affect the connection; the offending command is simply
/// not sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArgumentError {
    /// A target list was empty.
    #[error("empty target list")]
    EmptyTargetList,

    /// A nickname failed RFC 2812 validation.
    #[error("invalid nickname: {0:?}")]
    InvalidNickName(String),

    /// A channel name failed validation.
    #[error("invalid channel name: {0:?}")]
    InvalidChannelName(String),

    /// Message text contained CR or LF.
    #[error("text contains a line break")]
    TextContainsLineBreak,

    /// More targets than the command permits.
    #[error("too many targets: {count} (limit {limit})")]
    TooManyTargets {
        /// Number of targets supplied.
        count: usize,
        /// Maximum the command accepts.
        limit: usize,
    },

    /// The command is not valid in the current registration state.
    #[error("client is not registered")]
    NotRegistered,

    /// The assembled message failed wire validation.
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] MessageParseError),
}

/// Errors raised while establishing a connection.
#[cfg(feature = "tokio")]
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectError {
    /// The endpoint string could not be parsed.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// DNS resolution or TCP connect failed.
    #[error("connect failed: {0}")]
    Io(#[from] std::io::Error),

    /// TLS configuration or handshake failed.
    #[error("tls error: {0}")]
    Tls(#[from] tokio_rustls::rustls::Error),

    /// The server name was not valid for TLS.
    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    /// The connect attempt exceeded the configured timeout.
    #[error("connect timed out")]
    TimedOut,

    /// A connection is already established or in progress.
    #[error("already connected")]
    AlreadyConnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::MessageTooLong {
            actual: 9000,
            limit: 8191,
        };
        assert_eq!(
            format!("{}", err),
            "message too long: 9000 bytes (limit 8191)"
        );

        let err = MessageParseError::TooManyParameters(16);
        assert_eq!(format!("{}", err), "too many parameters: 16 (limit 15)");
    }

    #[test]
    fn test_error_source_chaining() {
        let mode_err = ModeParseError::MissingModeArgument { mode: 'k' };
        let parse_err = MessageParseError::InvalidModeString {
            string: "+k".to_string(),
            cause: mode_err.clone(),
        };

        let source = std::error::Error::source(&parse_err);
        assert!(source.is_some());
        assert_eq!(source.unwrap().to_string(), mode_err.to_string());
    }

    #[test]
    fn test_protocol_error_chaining() {
        let parse_err = MessageParseError::EmptyMessage;
        let protocol_err = ProtocolError::InvalidMessage {
            string: String::new(),
            cause: parse_err.clone(),
        };

        let source = std::error::Error::source(&protocol_err);
        assert!(source.is_some());
        assert_eq!(source.unwrap().to_string(), parse_err.to_string());
    }

    #[test]
    fn test_argument_error_from_parse_error() {
        let err: ArgumentError = MessageParseError::TooManyParameters(20).into();
        assert!(matches!(
            err,
            ArgumentError::InvalidMessage(MessageParseError::TooManyParameters(20))
        ));
    }
}
