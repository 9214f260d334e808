//! Property-based tests for message parsing and CTCP quoting.
//!
//! Uses proptest to generate random IRC components and verify that:
//! 1. Serialization never produces a line the parser rejects
//! 2. Serialize → parse is the identity on valid messages
//! 3. The stacked CTCP quoting stages invert cleanly

use proptest::prelude::*;
use slirc_client::ctcp::quote::{ctcp_dequote, ctcp_quote, low_level_dequote, low_level_quote};
use slirc_client::{Message, Source};

// =============================================================================
// STRATEGIES - Generators for valid IRC components
// =============================================================================

/// Valid IRC nickname: starts with letter or special char, followed by
/// letters, digits, or special chars.
fn nickname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z\\[\\]\\\\^_`{|}][a-zA-Z0-9\\-\\[\\]\\\\^_`{|}]{0,8}")
        .expect("valid regex")
}

/// Valid IRC username (ident): alphanumeric, no spaces or @ or !
fn username_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9]{0,9}").expect("valid regex")
}

/// Valid hostname: simplified, always dotted so it parses as a server
/// when used alone.
fn hostname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]+(\\.[a-z0-9]+)+").expect("valid regex")
}

/// Valid IRC channel name.
fn channel_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[#&][a-zA-Z0-9_\\-]{1,49}").expect("valid regex")
}

/// Middle parameter: non-empty, no space/colon lead, no controls.
fn middle_param_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9#&@+_\\-]{1,30}").expect("valid regex")
}

/// Trailing text: anything but CR/LF/NUL.
fn trailing_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^\r\n\0]{0,400}").expect("valid regex")
}

/// Alphabetic command or 3-digit numeric.
fn command_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[A-Z]{2,10}").expect("valid regex"),
        prop::string::string_regex("[0-9]{3}").expect("valid regex"),
    ]
}

/// Generate a valid Source.
fn source_strategy() -> impl Strategy<Value = Source> {
    prop_oneof![
        hostname_strategy().prop_map(Source::Server),
        (nickname_strategy(), username_strategy(), hostname_strategy()).prop_map(
            |(nick, user, host)| Source::User {
                nick,
                user: Some(user),
                host: Some(host),
            }
        ),
        nickname_strategy().prop_map(Source::user),
    ]
}

/// Generate a complete valid Message.
fn message_strategy() -> impl Strategy<Value = Message> {
    (
        prop::option::of(source_strategy()),
        command_strategy(),
        prop::collection::vec(middle_param_strategy(), 0..4),
        prop::option::of(trailing_strategy()),
    )
        .prop_map(|(prefix, command, mut params, trailing)| {
            if let Some(trailing) = trailing {
                params.push(trailing);
            }
            let mut msg = Message::new(command, params);
            msg.prefix = prefix;
            msg
        })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// The fundamental roundtrip property: serialize → parse = identity
    /// (modulo trailing-parameter normalization, which [`Message`]
    /// equality does not observe).
    #[test]
    fn message_roundtrip(msg in message_strategy()) {
        let serialized = msg.to_wire().expect("generated message should serialize");

        let parsed: Message = serialized.parse()
            .expect("serialized message should be parseable");

        let mut expected = msg.clone();
        expected.command = expected.command.to_ascii_uppercase();
        prop_assert_eq!(&expected, &parsed,
            "roundtrip failed for serialized: {}", serialized);
    }

    /// Source roundtrip: any valid source can be shown and re-parsed.
    #[test]
    fn source_roundtrip(source in source_strategy()) {
        let serialized = source.to_string();
        let parsed = Source::parse(&serialized);
        prop_assert_eq!(&source, &parsed,
            "source roundtrip failed for: {}", serialized);
    }

    /// Parsing never panics on arbitrary short inputs.
    #[test]
    fn parse_never_panics(line in "[^\r\n]{0,600}") {
        let _ = line.parse::<Message>();
    }

    /// Serialized wire form always ends in CRLF and never embeds one.
    #[test]
    fn wire_form_is_one_line(msg in message_strategy()) {
        let serialized = msg.to_wire().expect("should serialize");
        prop_assert!(serialized.ends_with("\r\n"));
        let body = &serialized[..serialized.len() - 2];
        prop_assert!(!body.contains('\r'));
        prop_assert!(!body.contains('\n'));
    }

    /// The stacked quoting stages are the identity for any text free of
    /// NUL, CR, and LF at the wire layer.
    #[test]
    fn ctcp_quoting_roundtrip(text in "[^\u{0}]{0,300}") {
        let encoded = low_level_quote(&ctcp_quote(&text));
        prop_assert!(!encoded.contains('\r'));
        prop_assert!(!encoded.contains('\n'));
        prop_assert!(!encoded.contains('\x01'));
        let decoded = ctcp_dequote(&low_level_dequote(&encoded));
        prop_assert_eq!(text, decoded);
    }

    /// Low-level quoting alone also inverts cleanly.
    #[test]
    fn low_level_quoting_roundtrip(text in ".{0,300}") {
        prop_assert_eq!(&low_level_dequote(&low_level_quote(&text)), &text);
    }
}
