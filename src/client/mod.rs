//! The tokio IRC client.
//!
//! One I/O task per connection reads lines and feeds the sans-IO
//! [`Session`]; one paced sender task drains the outbound queue through
//! the flood preventer. Events reach the host over an unbounded
//! channel; command methods validate synchronously and enqueue wire
//! lines.
//!
//! Handlers and event delivery run on the I/O task, so state observed
//! through [`Client::with_session`] is always post-update.

mod sender;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::ctcp::Ctcp;
use crate::endpoint::ServerEndpoint;
use crate::error::{ArgumentError, ConnectError, ProtocolError};
use crate::event::Event;
use crate::flood::FloodConfig;
use crate::line::LineCodec;
use crate::session::registration::RegistrationInfo;
use crate::session::{
    MessageFilter, RegistrationState, Session, SessionConfig, SessionOutput,
};
use crate::transport::{self, TlsOptions};

use self::sender::{sender_task, Outgoing};

/// Receiving end of the client's event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// What to register as.
    pub registration: RegistrationInfo,
    /// CTCP VERSION reply text; `None` never volunteers one.
    pub ctcp_version: Option<String>,
    /// Flood prevention; `None` sends without pacing.
    pub flood: Option<FloodConfig>,
    /// Character encoding label for both directions (default `utf-8`;
    /// requires the `encoding` feature for anything else).
    pub encoding: String,
    /// Cap on socket establishment, including TLS.
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Configuration with library defaults for everything but the
    /// registration payload.
    pub fn new(registration: RegistrationInfo) -> ClientConfig {
        ClientConfig {
            registration,
            ctcp_version: None,
            flood: None,
            encoding: "utf-8".to_string(),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

struct Conn {
    out_tx: mpsc::UnboundedSender<Outgoing>,
    shutdown: watch::Sender<bool>,
}

pub(crate) struct Shared {
    config: ClientConfig,
    session: Mutex<Session>,
    events: mpsc::UnboundedSender<Event>,
    conn: Mutex<Option<Conn>>,
    connected: watch::Sender<bool>,
    next_token: AtomicU64,
}

impl Shared {
    pub(crate) fn emit(&self, event: Event) {
        let _ = self.events.send(event);
    }

    pub(crate) fn force_disconnect(&self) {
        if let Some(conn) = self.conn.lock().as_ref() {
            let _ = conn.shutdown.send(true);
        }
    }

    fn enqueue_line(&self, line: String) -> Option<u64> {
        let conn = self.conn.lock();
        let conn = conn.as_ref()?;
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        if conn.out_tx.send(Outgoing { line, token }).is_err() {
            return None;
        }
        Some(token)
    }

    fn dispatch_outputs(&self, outputs: Vec<SessionOutput>) {
        for output in outputs {
            match output {
                SessionOutput::Send(msg) => match msg.to_wire() {
                    Ok(line) => {
                        self.enqueue_line(line);
                    }
                    Err(err) => warn!(%err, "dropping unserializable message"),
                },
                SessionOutput::Event(event) => self.emit(event),
                SessionOutput::Disconnect => self.force_disconnect(),
            }
        }
    }
}

/// Handle to one IRC connection.
///
/// Cheap to clone; all clones drive the same connection.
#[derive(Clone)]
pub struct Client {
    shared: Arc<Shared>,
}

impl Client {
    /// Create a client and the event stream it reports through.
    ///
    /// No connection is made until [`Client::connect`].
    pub fn new(config: ClientConfig) -> (Client, EventReceiver) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (connected_tx, _) = watch::channel(false);
        let session = Session::new(SessionConfig {
            registration: config.registration.clone(),
            ctcp_version: config.ctcp_version.clone(),
        });

        let client = Client {
            shared: Arc::new(Shared {
                config,
                session: Mutex::new(session),
                events: events_tx,
                conn: Mutex::new(None),
                connected: connected_tx,
                next_token: AtomicU64::new(0),
            }),
        };
        (client, events_rx)
    }

    /// Start connecting. Progress and failure are reported through the
    /// event stream (`Connecting`, `Connected`, `ConnectFailed`,
    /// `Registered`).
    ///
    /// Must be called inside a tokio runtime. Fails synchronously only
    /// when a connection already exists.
    pub fn connect(
        &self,
        endpoint: ServerEndpoint,
        tls_options: TlsOptions,
    ) -> Result<(), ConnectError> {
        {
            let mut session = self.shared.session.lock();
            if session.state() != RegistrationState::Disconnected {
                return Err(ConnectError::AlreadyConnected);
            }
            session.begin_connect();
        }

        let shared = self.shared.clone();
        tokio::spawn(run_connection(shared, endpoint, tls_options));
        Ok(())
    }

    /// Send QUIT and wait up to `timeout` for the connection to close,
    /// forcing a disconnect if the server does not hang up in time.
    pub async fn quit(
        &self,
        reason: Option<&str>,
        timeout: Duration,
    ) -> Result<(), ArgumentError> {
        let outputs = self.shared.session.lock().quit(reason)?;
        self.shared.dispatch_outputs(outputs);

        let mut connected = self.shared.connected.subscribe();
        let drained = tokio::time::timeout(timeout, async move {
            while *connected.borrow_and_update() {
                if connected.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;

        if drained.is_err() {
            debug!("quit timed out; forcing disconnect");
            self.shared.force_disconnect();
        }
        Ok(())
    }

    /// Enqueue a raw line. The terminator is appended when missing.
    /// Returns the token later echoed in [`Event::RawMessageSent`].
    pub fn send_raw(&self, line: &str) -> Result<u64, ArgumentError> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.chars().any(|c| c == '\r' || c == '\n' || c == '\0') {
            return Err(ArgumentError::TextContainsLineBreak);
        }
        let mut line = trimmed.to_string();
        line.push_str("\r\n");
        self.shared
            .enqueue_line(line)
            .ok_or(ArgumentError::NotRegistered)
    }

    /// Run a closure against the session for snapshot reads.
    ///
    /// Keep the closure short; the I/O task shares this lock.
    pub fn with_session<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.shared.session.lock())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RegistrationState {
        self.shared.session.lock().state()
    }

    /// The local user's current nick name.
    pub fn local_nick(&self) -> String {
        self.shared.session.lock().local_nick().to_string()
    }

    /// Register a preview filter on incoming PRIVMSG/NOTICE.
    pub fn add_message_filter(&self, filter: Box<dyn MessageFilter>) {
        self.shared.session.lock().add_message_filter(filter);
    }

    fn run_builder(
        &self,
        build: impl FnOnce(&mut Session) -> Result<Vec<SessionOutput>, ArgumentError>,
    ) -> Result<(), ArgumentError> {
        let outputs = build(&mut self.shared.session.lock())?;
        self.shared.dispatch_outputs(outputs);
        Ok(())
    }

    /// Join channels, with optional keys matched positionally.
    pub fn join(&self, channels: &[&str], keys: &[&str]) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.join(channels, keys))
    }

    /// Leave channels, with an optional comment.
    pub fn leave(&self, channels: &[&str], comment: Option<&str>) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.leave(channels, comment))
    }

    /// Invite a user to a channel.
    pub fn invite(&self, channel: &str, nick: &str) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.invite(channel, nick))
    }

    /// Kick users from a channel.
    pub fn kick(
        &self,
        channel: &str,
        nicks: &[&str],
        comment: Option<&str>,
    ) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.kick(channel, nicks, comment))
    }

    /// Query or change a channel topic.
    pub fn set_topic(&self, channel: &str, topic: Option<&str>) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.set_topic(channel, topic))
    }

    /// Request a nick change.
    pub fn set_nick(&self, nick: &str) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.set_nick(nick))
    }

    /// Change the local user's modes.
    pub fn set_user_modes(&self, modes: &str) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.set_user_modes(modes))
    }

    /// Change channel modes.
    pub fn set_channel_modes(
        &self,
        channel: &str,
        modes: &str,
        params: &[&str],
    ) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.set_channel_modes(channel, modes, params))
    }

    /// Query WHO.
    pub fn who(&self, mask: Option<&str>, ops_only: bool) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.who(mask, ops_only))
    }

    /// Query WHOIS.
    pub fn whois(&self, masks: &[&str]) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.whois(masks))
    }

    /// Query WHOWAS.
    pub fn whowas(&self, nicks: &[&str], max_entries: Option<u32>) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.whowas(nicks, max_entries))
    }

    /// Query the channel list.
    pub fn list(&self, channels: &[&str]) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.list(channels))
    }

    /// Query NAMES.
    pub fn names(&self, channels: &[&str]) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.names(channels))
    }

    /// Request the MOTD.
    pub fn motd(&self, target: Option<&str>) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.motd(target))
    }

    /// Request network statistics.
    pub fn lusers(&self, mask: Option<&str>, target: Option<&str>) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.lusers(mask, target))
    }

    /// Request server statistics.
    pub fn stats(&self, query: Option<&str>, target: Option<&str>) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.stats(query, target))
    }

    /// Request the server-links list.
    pub fn links(
        &self,
        remote_server: Option<&str>,
        mask: Option<&str>,
    ) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.links(remote_server, mask))
    }

    /// Request the server's local time.
    pub fn time(&self, target: Option<&str>) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.time(target))
    }

    /// Request the server's version.
    pub fn version(&self, target: Option<&str>) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.version(target))
    }

    /// Ping a server.
    pub fn ping(&self, target: Option<&str>) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.ping(target))
    }

    /// Set or clear away status.
    pub fn away(&self, text: Option<&str>) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.away(text))
    }

    /// Query USERHOST for up to five nicks.
    pub fn userhost(&self, nicks: &[&str]) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.userhost(nicks))
    }

    /// Query ISON.
    pub fn ison(&self, nicks: &[&str]) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.ison(nicks))
    }

    /// Send a PRIVMSG.
    pub fn send_private_message(&self, targets: &[&str], text: &str) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.send_private_message(targets, text))
    }

    /// Send a NOTICE.
    pub fn send_notice(&self, targets: &[&str], text: &str) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.send_notice(targets, text))
    }

    /// Send a CTCP request (PRIVMSG carrier).
    pub fn send_ctcp_request(&self, targets: &[&str], ctcp: Ctcp) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.send_ctcp_request(targets, ctcp))
    }

    /// Send a CTCP response (NOTICE carrier).
    pub fn send_ctcp_response(&self, targets: &[&str], ctcp: Ctcp) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.send_ctcp_response(targets, ctcp))
    }

    /// Send a CTCP ACTION (`/me`).
    pub fn ctcp_action(&self, targets: &[&str], text: &str) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.ctcp_action(targets, text))
    }

    /// Ask peers for their client version.
    pub fn ctcp_version_query(&self, targets: &[&str]) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.ctcp_version_query(targets))
    }

    /// Ask peers for their local time.
    pub fn ctcp_time_query(&self, targets: &[&str]) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.ctcp_time_query(targets))
    }

    /// Measure round-trip time to peers.
    pub fn ctcp_ping_query(&self, targets: &[&str]) -> Result<(), ArgumentError> {
        self.run_builder(|s| s.ctcp_ping_query(targets))
    }
}

async fn run_connection(shared: Arc<Shared>, endpoint: ServerEndpoint, tls_options: TlsOptions) {
    shared.emit(Event::Connecting);

    let framed = async {
        let codec = LineCodec::new(&shared.config.encoding).map_err(|err| {
            ConnectError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                err.to_string(),
            ))
        })?;
        match tokio::time::timeout(
            shared.config.connect_timeout,
            transport::connect(&endpoint, tls_options, codec),
        )
        .await
        {
            Ok(result) => result,
            Err(_elapsed) => Err(ConnectError::TimedOut),
        }
    }
    .await;

    let framed = match framed {
        Ok(framed) => framed,
        Err(err) => {
            shared.session.lock().abort_connect();
            shared.emit(Event::ConnectFailed {
                reason: err.to_string(),
            });
            return;
        }
    };

    let (writer, mut reader) = framed.split();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    *shared.conn.lock() = Some(Conn {
        out_tx,
        shutdown: shutdown_tx.clone(),
    });
    shared.connected.send_replace(true);

    let sender = tokio::spawn(sender_task(
        writer,
        out_rx,
        shared.config.flood,
        shared.clone(),
        shutdown_rx.clone(),
    ));

    // Registration burst goes through the same queue as everything
    // else; ordering is preserved.
    let outputs = shared.session.lock().start();
    shared.dispatch_outputs(outputs);

    let mut shutdown = shutdown_rx;
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            line = reader.next() => match line {
                Some(Ok(line)) => {
                    let outputs = shared.session.lock().receive_line(&line);
                    shared.dispatch_outputs(outputs);
                }
                Some(Err(err)) => {
                    if !is_expected_close(&err) {
                        shared.emit(Event::Error {
                            message: err.to_string(),
                        });
                    }
                    break;
                }
                None => break,
            },
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = sender.await;

    *shared.conn.lock() = None;
    let outputs = shared.session.lock().connection_closed();
    shared.dispatch_outputs(outputs);
    shared.connected.send_replace(false);
}

/// Peer-close shapes that collapse silently into `Disconnected`.
fn is_expected_close(err: &ProtocolError) -> bool {
    match err {
        ProtocolError::Io(io_err) => matches!(
            io_err.kind(),
            std::io::ErrorKind::NotConnected
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::UnexpectedEof
        ),
        _ => false,
    }
}
