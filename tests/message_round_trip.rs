//! Integration tests for message parsing and serialization.
//!
//! These verify that messages parsed from wire lines serialize back to
//! equivalent lines, and that constructed messages survive the trip.

use slirc_client::{Message, Source};

fn round_trip(original: &str) -> Message {
    let message: Message = original
        .parse()
        .unwrap_or_else(|e| panic!("failed to parse '{}': {}", original, e));
    let serialized = message.to_wire().expect("failed to serialize");
    let reparsed: Message = serialized
        .parse()
        .unwrap_or_else(|e| panic!("failed to reparse '{}': {}", serialized, e));
    assert_eq!(message, reparsed, "round-trip failed for '{}'", original);
    reparsed
}

#[test]
fn test_round_trip_simple() {
    let msg = round_trip("PING :irc.example.com");
    assert_eq!(msg.command, "PING");
    assert_eq!(msg.params, vec!["irc.example.com"]);
}

#[test]
fn test_round_trip_with_prefix() {
    let msg = round_trip(":nick!user@host PRIVMSG #channel :Hello, world!");
    assert_eq!(msg.source_nickname(), Some("nick"));
    assert_eq!(msg.params, vec!["#channel", "Hello, world!"]);
}

#[test]
fn test_round_trip_numeric_response() {
    let msg = round_trip(":server.example.org 001 nickname :Welcome to the IRC Network");
    assert_eq!(msg.numeric(), Some(1));
    assert!(msg.prefix.as_ref().is_some_and(Source::is_server));
}

#[test]
fn test_round_trip_empty_trailing() {
    let msg = round_trip("PRIVMSG #channel :");
    assert_eq!(msg.params, vec!["#channel", ""]);
}

#[test]
fn test_round_trip_unicode_text() {
    let msg = round_trip(":nick!user@host PRIVMSG #channel :üñíçødé and émøjí 🎉");
    assert_eq!(msg.params[1], "üñíçødé and émøjí 🎉");
}

#[test]
fn test_round_trip_mode_with_args() {
    let msg = round_trip(":server.example.org MODE #channel +o nick");
    assert_eq!(msg.params, vec!["#channel", "+o", "nick"]);
}

#[test]
fn test_join_command_variations() {
    for original in [
        "JOIN #channel",
        "JOIN #channel key",
        ":nick!user@host JOIN #channel",
        "JOIN #channel1,#channel2 key1,key2",
    ] {
        round_trip(original);
    }
}

#[test]
fn test_kick_variations() {
    for original in [
        "KICK #channel baduser",
        "KICK #channel baduser :Spamming",
        "KICK #a,#b user1,user2 :gone",
    ] {
        round_trip(original);
    }
}

#[test]
fn test_construction_and_parsing() {
    let message = Message::privmsg("#test", "Integration test message")
        .with_prefix(Source::parse("testbot!test@example.com"));

    let serialized = message.to_wire().expect("should serialize");
    assert_eq!(
        serialized,
        ":testbot!test@example.com PRIVMSG #test :Integration test message\r\n"
    );

    let parsed: Message = serialized.parse().expect("should reparse");
    assert_eq!(message, parsed);
}

#[test]
fn test_trailing_with_colons_and_spaces() {
    let msg = round_trip("PRIVMSG #c :: odd :: text ::");
    assert_eq!(msg.params[1], ": odd :: text ::");
}

#[test]
fn test_ctcp_carrier_round_trip() {
    let msg = round_trip(":peer!p@h PRIVMSG target :\x01PING 1234567890\x01");
    assert_eq!(msg.params[1], "\x01PING 1234567890\x01");
}

#[test]
fn test_bare_newline_terminator_accepted() {
    let msg: Message = "PING :token\n".parse().expect("bare LF should parse");
    assert_eq!(msg.params, vec!["token"]);
}
