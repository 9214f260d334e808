//! # slirc-client
//!
//! An IRC client library implementing RFC 1459/2812 plus the
//! widely-deployed ISUPPORT and channel-user-prefix extensions, with a
//! CTCP sublayer riding on top.
//!
//! ## Features
//!
//! - Wire codec: line framing, prefix/command/parameter splitting,
//!   trailing-parameter rules, strict serialization
//! - Sans-IO protocol engine: registration state machine, handlers for
//!   every command and numeric the client consumes, a mutable entity
//!   graph of users, channels, and memberships
//! - Leaky-bucket flood prevention in front of an ordered send queue
//! - Tokio TCP/TLS transport with a certificate accept hook
//! - CTCP quoting, tagged-data extraction, and request/response routing
//!
//! ## Quick Start
//!
//! ### Parsing and building messages
//!
//! ```rust
//! use slirc_client::Message;
//!
//! let msg: Message = ":alice!a@host PRIVMSG #chan :hello world".parse().unwrap();
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.params, vec!["#chan", "hello world"]);
//!
//! let pong = Message::pong("irc.example.com");
//! assert_eq!(pong.to_wire().unwrap(), "PONG :irc.example.com\r\n");
//! ```
//!
//! ### Driving the engine without a socket
//!
//! The protocol engine is sans-IO: feed it lines, collect the actions.
//!
//! ```rust
//! use slirc_client::session::{Session, SessionConfig, SessionOutput};
//! use slirc_client::session::registration::{RegistrationInfo, UserRegistration};
//!
//! let mut session = Session::new(SessionConfig {
//!     registration: RegistrationInfo::User(UserRegistration::simple("tester")),
//!     ctcp_version: Some("slirc-client".to_string()),
//! });
//! session.start();
//! session.receive_line(":server 001 tester :Welcome to the network");
//! assert_eq!(session.local_nick(), "tester");
//! ```
//!
//! ### Connecting
//!
//! With the default `tokio` feature, [`Client`] owns the connection:
//! events arrive on a channel, commands go through the handle.
//!
//! ```rust,no_run
//! use slirc_client::client::{Client, ClientConfig};
//! use slirc_client::session::registration::{RegistrationInfo, UserRegistration};
//! use slirc_client::transport::TlsOptions;
//!
//! # async fn run() {
//! let config = ClientConfig::new(RegistrationInfo::User(UserRegistration::simple("tester")));
//! let (client, mut events) = Client::new(config);
//! client.connect("ircs://irc.example.com".parse().unwrap(), TlsOptions::default()).unwrap();
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # }
//! ```

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod casemap;
pub mod ctcp;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod flood;
pub mod isupport;
pub mod message;
pub mod mode;
pub mod network;
pub mod response;
pub mod session;
pub mod source;
pub mod util;

#[cfg(feature = "tokio")]
pub mod client;
#[cfg(feature = "tokio")]
pub mod endpoint;
#[cfg(feature = "tokio")]
pub mod line;
#[cfg(feature = "tokio")]
pub mod transport;

pub use self::casemap::{irc_eq, irc_to_lower, CaseMapping};
pub use self::ctcp::{Ctcp, CtcpKind};
pub use self::error::{ArgumentError, MessageParseError, ModeParseError, ProtocolError};
pub use self::event::Event;
pub use self::flood::{FloodConfig, FloodPreventer};
pub use self::isupport::{Isupport, PrefixSpec};
pub use self::message::{Message, MessageRef, MessageTarget, TargetMaskKind};
pub use self::mode::ModeChange;
pub use self::response::Response;
pub use self::session::{Session, SessionConfig, SessionOutput};
pub use self::source::{Source, SourceRef};

#[cfg(feature = "tokio")]
pub use self::client::{Client, ClientConfig, EventReceiver};
#[cfg(feature = "tokio")]
pub use self::endpoint::ServerEndpoint;
#[cfg(feature = "tokio")]
pub use self::error::ConnectError;
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
#[cfg(feature = "tokio")]
pub use self::transport::{IrcStream, TlsOptions};
