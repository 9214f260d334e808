//! Sans-IO protocol engine.
//!
//! [`Session`] consumes inbound lines and produces actions: messages to
//! send, events for the host, and disconnect requests. It performs no
//! I/O itself, which keeps the whole protocol surface testable without
//! a network.
//!
//! # Example
//!
//! ```
//! use slirc_client::session::{Session, SessionConfig, SessionOutput};
//! use slirc_client::session::registration::{RegistrationInfo, UserRegistration};
//!
//! let config = SessionConfig {
//!     registration: RegistrationInfo::User(UserRegistration::simple("tester")),
//!     ctcp_version: None,
//! };
//! let mut session = Session::new(config);
//!
//! // Socket established: this yields the registration burst.
//! let outputs = session.start();
//! assert!(outputs
//!     .iter()
//!     .any(|o| matches!(o, SessionOutput::Send(_))));
//!
//! // Feed server lines as they arrive.
//! let outputs = session.receive_line(":server 001 tester :Welcome");
//! assert!(outputs
//!     .iter()
//!     .any(|o| matches!(o, SessionOutput::Event(_))));
//! ```

mod commands;
mod ctcp_filter;
mod handlers;
pub mod registration;

use std::collections::BTreeSet;

use tracing::warn;

use crate::casemap::CaseMapping;
use crate::dispatch::Dispatcher;
use crate::event::{ChannelListItem, Event, NetworkInfo, ServerLink};
use crate::isupport::{Isupport, PrefixSpec};
use crate::message::{Message, MessageRef, MessageTarget};
use crate::network::Network;
use crate::source::Source;

pub use self::ctcp_filter::CtcpFilter;
pub use self::registration::{RegistrationInfo, RegistrationState};

/// Channel-type prefixes assumed until ISUPPORT says otherwise.
pub const DEFAULT_CHANTYPES: &str = "#&+!";

/// An action produced by the session in response to input.
#[derive(Debug)]
pub enum SessionOutput {
    /// Hand this message to the send scheduler.
    Send(Message),
    /// Deliver this event to the host application.
    Event(Event),
    /// Close the transport; the session considers the connection dead.
    Disconnect,
}

/// Session parameters fixed at construction.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// What to register as.
    pub registration: RegistrationInfo,
    /// CTCP VERSION reply text; `None` never volunteers one.
    pub ctcp_version: Option<String>,
}

/// Verdict of a preview filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterAction {
    /// Let the message continue to the regular event.
    Pass,
    /// Suppress the regular event; the filter handled the message.
    Consume,
}

/// Which carrier command a previewed message arrived in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CarrierKind {
    /// PRIVMSG — CTCP payloads here are requests.
    Message,
    /// NOTICE — CTCP payloads here are responses.
    Notice,
}

/// A message offered to preview filters before the regular
/// `MessageReceived`/`NoticeReceived` event fires.
#[derive(Debug)]
pub struct Preview<'a> {
    /// The carrier command.
    pub carrier: CarrierKind,
    /// Message origin.
    pub source: &'a Source,
    /// Parsed targets.
    pub targets: &'a [MessageTarget],
    /// Message text.
    pub text: &'a str,
}

/// A preview hook over incoming PRIVMSG/NOTICE.
///
/// Filters run in registration order; if any filter consumes the
/// message, the regular received event is suppressed. The CTCP
/// sublayer is installed as the first filter.
pub trait MessageFilter: Send {
    /// Inspect a message before the regular event fires. Outputs pushed
    /// here are emitted in place of it when consuming.
    fn preview(&mut self, preview: &Preview<'_>, out: &mut Vec<SessionOutput>) -> FilterAction;
}

type Handler = fn(&mut Session, &MessageRef<'_>, &mut Vec<SessionOutput>);

/// Server identity learned from numeric 004.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerAttributes {
    /// Server name.
    pub server_name: String,
    /// Server software version.
    pub version: String,
    /// Supported user mode letters.
    pub user_modes: String,
    /// Supported channel mode letters.
    pub channel_modes: String,
}

/// The protocol engine for one connection.
pub struct Session {
    config: SessionConfig,
    state: RegistrationState,
    network: Network,
    isupport: Isupport,
    member_modes: PrefixSpec,
    chantypes: String,
    local_nick: String,
    local_modes: BTreeSet<char>,
    server_attrs: Option<ServerAttributes>,
    network_info: NetworkInfo,
    motd: String,
    channel_list: Vec<ChannelListItem>,
    links: Vec<ServerLink>,
    dispatcher: Dispatcher<Handler>,
    filters: Vec<Box<dyn MessageFilter>>,
}

impl Session {
    /// Create a session for one connection attempt.
    pub fn new(config: SessionConfig) -> Session {
        let mut dispatcher = Dispatcher::new();
        handlers::install(&mut dispatcher);

        let ctcp = CtcpFilter::new(config.ctcp_version.clone());
        let local_nick = config.registration.nick_name().to_string();

        Session {
            config,
            state: RegistrationState::Disconnected,
            network: Network::new(),
            isupport: Isupport::new(),
            member_modes: PrefixSpec::default_table(),
            chantypes: DEFAULT_CHANTYPES.to_string(),
            local_nick,
            local_modes: BTreeSet::new(),
            server_attrs: None,
            network_info: NetworkInfo::default(),
            motd: String::new(),
            channel_list: Vec::new(),
            links: Vec::new(),
            dispatcher,
            filters: vec![Box::new(ctcp)],
        }
    }

    /// Register an additional preview filter, behind the CTCP one.
    pub fn add_message_filter(&mut self, filter: Box<dyn MessageFilter>) {
        self.filters.push(filter);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RegistrationState {
        self.state
    }

    /// The entity graph.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Accumulated ISUPPORT features.
    pub fn isupport(&self) -> &Isupport {
        &self.isupport
    }

    /// The channel-user-mode table in effect (ISUPPORT `PREFIX`).
    pub fn member_modes(&self) -> &PrefixSpec {
        &self.member_modes
    }

    /// The local user's current nick name.
    pub fn local_nick(&self) -> &str {
        &self.local_nick
    }

    /// The local user's mode letters.
    pub fn local_modes(&self) -> &BTreeSet<char> {
        &self.local_modes
    }

    /// Server identity from numeric 004, once seen.
    pub fn server_attributes(&self) -> Option<&ServerAttributes> {
        self.server_attrs.as_ref()
    }

    /// Mark that a connect attempt has begun.
    pub fn begin_connect(&mut self) {
        self.state = RegistrationState::Connecting;
    }

    /// Mark the socket established and produce the registration burst.
    ///
    /// The session moves through `Connected` into `Registering`, per
    /// the lifecycle: the burst is the only traffic permitted before
    /// 001 arrives.
    pub fn start(&mut self) -> Vec<SessionOutput> {
        self.state = RegistrationState::Connected;
        let mut out: Vec<SessionOutput> = self
            .config
            .registration
            .burst()
            .into_iter()
            .map(SessionOutput::Send)
            .collect();
        out.insert(0, SessionOutput::Event(Event::Connected));
        self.state = RegistrationState::Registering;
        out
    }

    /// Mark a connect attempt as failed before the socket was usable.
    ///
    /// Unlike [`Session::connection_closed`] this produces no
    /// `Disconnected` event; the caller reports `ConnectFailed`.
    pub fn abort_connect(&mut self) {
        self.state = RegistrationState::Disconnected;
    }

    /// Mark the transport closed.
    ///
    /// Returns the `Disconnected` event output when the session was not
    /// already down, so the caller can forward it exactly once.
    pub fn connection_closed(&mut self) -> Vec<SessionOutput> {
        if self.state == RegistrationState::Disconnected {
            return Vec::new();
        }
        self.state = RegistrationState::Disconnected;
        vec![SessionOutput::Event(Event::Disconnected)]
    }

    /// Consume one inbound line and produce the resulting actions.
    ///
    /// Messages are handled in arrival order; events for a given line
    /// appear in `out` after the entity graph has been updated.
    pub fn receive_line(&mut self, line: &str) -> Vec<SessionOutput> {
        let mut out = Vec::new();
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            return out;
        }

        let msg = match MessageRef::parse(trimmed) {
            Ok(msg) => msg,
            Err(err) => {
                warn!(line = trimmed, %err, "discarding unparseable line");
                return out;
            }
        };

        // Pre-dispatch: learn the server behind any server prefix.
        if let Some(source) = msg.source() {
            if source.is_server() {
                if let Some(host) = source.host {
                    self.network.ensure_server(host);
                }
            }
        }

        if let Some(handler) = self.dispatcher.lookup_or_log(msg.command) {
            handler(self, &msg, &mut out);
        }

        out
    }

    /// The channel-type prefixes in effect.
    pub fn chantypes(&self) -> &str {
        &self.chantypes
    }

    /// Whether `nick` names the local user under the current case
    /// mapping.
    pub fn is_local_nick(&self, nick: &str) -> bool {
        self.network.casemapping().eq(nick, &self.local_nick)
    }

    /// Run the preview filters over a message; `true` means consumed.
    fn run_filters(
        &mut self,
        carrier: CarrierKind,
        source: &Source,
        targets: &[MessageTarget],
        text: &str,
        out: &mut Vec<SessionOutput>,
    ) -> bool {
        let preview = Preview {
            carrier,
            source,
            targets,
            text,
        };
        // Filters are detached while running so they cannot alias the
        // session; they only see the preview and the output sink.
        let mut filters = std::mem::take(&mut self.filters);
        let mut consumed = false;
        for filter in &mut filters {
            if filter.preview(&preview, out) == FilterAction::Consume {
                consumed = true;
            }
        }
        self.filters = filters;
        consumed
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("local_nick", &self.local_nick)
            .field("isupport", &self.isupport.len())
            .finish_non_exhaustive()
    }
}

/// Derive the case mapping the network should use.
pub(crate) fn effective_casemapping(isupport: &Isupport) -> CaseMapping {
    isupport.casemapping().unwrap_or_default()
}
