//! Typed observation points for host applications.
//!
//! Every externally observable change has a named event. Events derived
//! from a single inbound message are emitted in a deterministic order,
//! after the entity graph has been updated by the message's handler.

use std::time::Duration;

use crate::mode::ModeChange;
use crate::message::MessageTarget;
use crate::source::Source;

/// One entry of a LIST (321/322/323) reply sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelListItem {
    /// Channel name.
    pub name: String,
    /// Number of visible members.
    pub visible_users: Option<u32>,
    /// Channel topic.
    pub topic: String,
}

/// One entry of a LINKS (364/365) reply sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerLink {
    /// Mask the entry matched.
    pub mask: String,
    /// Server host name.
    pub server: String,
    /// Hop count and server info text.
    pub info: String,
}

/// Network statistics accumulated from the LUSERS group (251-255).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Welcome text of 251 (client/server totals in prose).
    pub client_info: Option<String>,
    /// Operators online (252).
    pub operators: Option<u32>,
    /// Unknown connections (253).
    pub unknown_connections: Option<u32>,
    /// Channels formed (254).
    pub channels: Option<u32>,
    /// Local server prose of 255.
    pub server_info: Option<String>,
}

/// One `nick=...` entry of a USERHOST (302) reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserHostEntry {
    /// Nick name.
    pub nick: String,
    /// Whether the user is a server operator.
    pub is_operator: bool,
    /// Whether the user is away.
    pub is_away: bool,
    /// The `user@host` part.
    pub host_mask: String,
}

/// Client events delivered to the host application.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Event {
    /// A connect attempt has started.
    Connecting,
    /// The socket is established; registration is being sent.
    Connected,
    /// The connect attempt failed before the socket was usable.
    ConnectFailed {
        /// Human-readable failure description.
        reason: String,
    },
    /// Registration completed (numeric 001).
    Registered {
        /// The nick name the server accepted.
        nick: String,
    },
    /// The connection is gone. Emitted exactly once per connection.
    Disconnected,
    /// A transport-level error. The connection is usually about to
    /// collapse to [`Event::Disconnected`].
    Error {
        /// Human-readable error description.
        message: String,
    },
    /// A numeric error reply (400-599) from the server. Not fatal by
    /// default; the host decides.
    ProtocolError {
        /// The numeric code.
        code: u16,
        /// Reply parameters after the client nick.
        params: Vec<String>,
        /// The human-readable trailing text.
        message: String,
    },
    /// An unsolicited ERROR command; expect a disconnect to follow.
    ServerErrorMessage {
        /// The error text.
        message: String,
    },

    /// A PING was received (and answered automatically).
    PingReceived {
        /// The ping token.
        token: String,
    },
    /// A PONG was received.
    PongReceived {
        /// The responding server.
        server: String,
        /// The echoed token, if present.
        token: Option<String>,
    },
    /// A queued raw line was handed to the transport.
    RawMessageSent {
        /// Token assigned when the line was enqueued.
        token: u64,
    },

    /// The local user joined a channel.
    ChannelJoined {
        /// Channel name.
        channel: String,
    },
    /// The local user left (or was removed from) a channel.
    ChannelLeft {
        /// Channel name.
        channel: String,
        /// Part comment, if any.
        comment: Option<String>,
    },
    /// A remote user joined a channel we track.
    UserJoined {
        /// Channel name.
        channel: String,
        /// Joining nick.
        nick: String,
    },
    /// A user left a channel we track.
    UserLeft {
        /// Channel name.
        channel: String,
        /// Leaving nick.
        nick: String,
        /// Part/quit comment, if any.
        comment: Option<String>,
    },
    /// A user was kicked from a channel we track.
    UserKicked {
        /// Channel name.
        channel: String,
        /// Kicked nick.
        nick: String,
        /// Who issued the kick, when known.
        kicked_by: Option<String>,
        /// Kick comment, if any.
        comment: Option<String>,
    },
    /// A user quit the network.
    UserQuit {
        /// Quitting nick.
        nick: String,
        /// Quit comment, if any.
        comment: Option<String>,
    },
    /// A user was invited to a channel.
    UserInvited {
        /// Channel name.
        channel: String,
        /// Invited nick.
        nick: String,
    },
    /// A user changed nick.
    NickNameChanged {
        /// Previous nick.
        old_nick: String,
        /// New nick.
        new_nick: String,
    },
    /// A channel topic changed (or was reported).
    TopicChanged {
        /// Channel name.
        channel: String,
        /// New topic; `None` means cleared/unset.
        topic: Option<String>,
        /// Who set it, when known.
        set_by: Option<String>,
    },
    /// Channel modes changed (or were reported by 324).
    ChannelModesChanged {
        /// Channel name.
        channel: String,
        /// Who changed them, when known.
        changed_by: Option<String>,
        /// The parsed changes, in wire order.
        changes: Vec<ModeChange>,
    },
    /// The local user's modes changed.
    LocalUserModesChanged {
        /// The parsed changes, in wire order.
        changes: Vec<ModeChange>,
    },
    /// The local user's away state changed (305/306).
    LocalAwayChanged {
        /// New away state.
        is_away: bool,
    },

    /// A PRIVMSG reached us and was not consumed by a preview filter.
    MessageReceived {
        /// Message origin, absent when the line carried no prefix.
        source: Option<Source>,
        /// Parsed targets of the message.
        targets: Vec<MessageTarget>,
        /// Message text.
        text: String,
    },
    /// A NOTICE reached us and was not consumed by a preview filter.
    NoticeReceived {
        /// Message origin, absent when the line carried no prefix.
        source: Option<Source>,
        /// Parsed targets of the notice.
        targets: Vec<MessageTarget>,
        /// Notice text.
        text: String,
    },
    /// A PRIVMSG we sent was handed to the send queue.
    MessageSent {
        /// Targets as given.
        targets: Vec<String>,
        /// Message text.
        text: String,
    },
    /// A NOTICE we sent was handed to the send queue.
    NoticeSent {
        /// Targets as given.
        targets: Vec<String>,
        /// Notice text.
        text: String,
    },

    /// A NAMES reply sequence for a channel completed (353/366).
    UsersListReceived {
        /// Channel name.
        channel: String,
    },
    /// A LIST reply sequence completed (323).
    ChannelListReceived {
        /// Collected entries.
        channels: Vec<ChannelListItem>,
    },
    /// The MOTD finished (376); the full text is attached.
    MotdReceived {
        /// Accumulated MOTD text, one line per `\n`.
        text: String,
    },
    /// LUSERS statistics were updated (251-255).
    NetworkInfoReceived {
        /// Snapshot of everything learned so far.
        info: NetworkInfo,
    },
    /// A WHO reply sequence completed (315).
    WhoCompleted {
        /// The mask the query was for.
        mask: String,
    },
    /// A WHOIS reply sequence completed (318).
    WhoIsReplyReceived {
        /// The nick the query was for.
        nick: String,
    },
    /// A WHOWAS reply sequence completed (369).
    WhoWasReplyReceived {
        /// The nick the query was for.
        nick: String,
    },
    /// A USERHOST reply arrived (302).
    UserHostReceived {
        /// Parsed entries.
        entries: Vec<UserHostEntry>,
    },
    /// An ISON reply arrived (303).
    IsOnReceived {
        /// Nicks confirmed online.
        nicks: Vec<String>,
    },
    /// A user's away text was reported (301).
    UserAwayReceived {
        /// The away user's nick.
        nick: String,
        /// The away text.
        message: String,
    },
    /// A server version reply arrived (351).
    ServerVersionReceived {
        /// Responding server.
        server: String,
        /// Version string.
        version: String,
    },
    /// A server time reply arrived (391).
    ServerTimeReceived {
        /// Responding server.
        server: String,
        /// The server's local time, as sent.
        time: String,
    },
    /// A LINKS reply sequence completed (365).
    ServerLinksReceived {
        /// Collected entries.
        links: Vec<ServerLink>,
    },

    /// A CTCP ACTION arrived.
    ActionReceived {
        /// Acting user.
        source: Source,
        /// Carrier targets.
        targets: Vec<MessageTarget>,
        /// Action text.
        text: String,
    },
    /// A CTCP VERSION response arrived.
    VersionResponseReceived {
        /// Responding user's nick.
        source: String,
        /// Their version string.
        version: String,
    },
    /// A CTCP TIME response arrived.
    TimeResponseReceived {
        /// Responding user's nick.
        source: String,
        /// Their local time text.
        time: String,
    },
    /// A CTCP PING response arrived.
    PingResponseReceived {
        /// Responding user's nick.
        source: String,
        /// Measured round trip.
        round_trip: Duration,
    },
    /// A CTCP ERRMSG response arrived.
    ErrorMessageReceived {
        /// Responding user's nick.
        source: String,
        /// The query that failed.
        failed_query: String,
        /// The error text.
        message: String,
    },
    /// A CTCP request with an unknown tag arrived.
    CtcpRequestReceived {
        /// Requesting user's nick.
        source: String,
        /// The raw tag.
        tag: String,
        /// The raw data, if any.
        data: Option<String>,
    },
}
