//! Outbound command builders.
//!
//! Builders validate their arguments synchronously and produce
//! [`SessionOutput`] actions; they never touch the entity graph, which
//! is only mutated on the inbound handler path. The exception is the
//! spec'd local bookkeeping for sent messages and notices, which is an
//! event, not graph state.

use chrono::Utc;

use crate::ctcp::Ctcp;
use crate::error::ArgumentError;
use crate::event::Event;
use crate::message::Message;
use crate::source::is_valid_nickname;

use super::{RegistrationState, Session, SessionOutput};

/// RFC 2812 limit on USERHOST arguments.
const MAX_USERHOST_TARGETS: usize = 5;

impl Session {
    fn require_registered(&self) -> Result<(), ArgumentError> {
        if self.state == RegistrationState::Registered {
            Ok(())
        } else {
            Err(ArgumentError::NotRegistered)
        }
    }

    fn validate_channel_name(&self, name: &str) -> Result<(), ArgumentError> {
        let mut chars = name.chars();
        let prefixed = chars
            .next()
            .map(|c| self.chantypes.contains(c))
            .unwrap_or(false);
        let rest = chars.as_str();
        let valid = prefixed
            && !rest.is_empty()
            && name.chars().count() <= 50
            && !rest
                .chars()
                .any(|c| c == ' ' || c == ',' || c == '\x07' || c == '\0' || c.is_control());
        if valid {
            Ok(())
        } else {
            Err(ArgumentError::InvalidChannelName(name.to_string()))
        }
    }

    fn validate_nick(&self, nick: &str) -> Result<(), ArgumentError> {
        if is_valid_nickname(nick) {
            Ok(())
        } else {
            Err(ArgumentError::InvalidNickName(nick.to_string()))
        }
    }

    fn validate_text(&self, text: &str) -> Result<(), ArgumentError> {
        if text.chars().any(|c| c == '\r' || c == '\n' || c == '\0') {
            Err(ArgumentError::TextContainsLineBreak)
        } else {
            Ok(())
        }
    }

    /// Final wire check shared by every builder.
    fn emit(&self, msg: Message) -> Result<SessionOutput, ArgumentError> {
        msg.to_wire()?;
        Ok(SessionOutput::Send(msg))
    }

    /// Enqueue a QUIT and enter the `Quitting` state.
    pub fn quit(&mut self, reason: Option<&str>) -> Result<Vec<SessionOutput>, ArgumentError> {
        if matches!(
            self.state,
            RegistrationState::Disconnected | RegistrationState::Connecting
        ) {
            return Err(ArgumentError::NotRegistered);
        }
        if let Some(reason) = reason {
            self.validate_text(reason)?;
        }
        let output = self.emit(Message::quit(reason.map(str::to_string)))?;
        self.state = RegistrationState::Quitting;
        Ok(vec![output])
    }

    /// Join channels, with optional keys matched positionally.
    pub fn join(
        &mut self,
        channels: &[&str],
        keys: &[&str],
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        if channels.is_empty() {
            return Err(ArgumentError::EmptyTargetList);
        }
        if keys.len() > channels.len() {
            return Err(ArgumentError::TooManyTargets {
                count: keys.len(),
                limit: channels.len(),
            });
        }
        for channel in channels {
            self.validate_channel_name(channel)?;
        }

        let keys = if keys.is_empty() {
            None
        } else {
            Some(keys.join(","))
        };
        Ok(vec![self.emit(Message::join(channels.join(","), keys))?])
    }

    /// Leave channels, with an optional comment.
    pub fn leave(
        &mut self,
        channels: &[&str],
        comment: Option<&str>,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        if channels.is_empty() {
            return Err(ArgumentError::EmptyTargetList);
        }
        for channel in channels {
            self.validate_channel_name(channel)?;
        }
        Ok(vec![self.emit(Message::part(
            channels.join(","),
            comment.map(str::to_string),
        ))?])
    }

    /// Invite a user to a channel.
    pub fn invite(
        &mut self,
        channel: &str,
        nick: &str,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        self.validate_channel_name(channel)?;
        self.validate_nick(nick)?;
        Ok(vec![self.emit(Message::invite(nick, channel))?])
    }

    /// Kick users from a channel, with an optional comment.
    pub fn kick(
        &mut self,
        channel: &str,
        nicks: &[&str],
        comment: Option<&str>,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        self.validate_channel_name(channel)?;
        if nicks.is_empty() {
            return Err(ArgumentError::EmptyTargetList);
        }
        for nick in nicks {
            self.validate_nick(nick)?;
        }
        Ok(vec![self.emit(Message::kick(
            channel,
            nicks.join(","),
            comment.map(str::to_string),
        ))?])
    }

    /// Query (`None`) or change (`Some`) a channel topic.
    pub fn set_topic(
        &mut self,
        channel: &str,
        topic: Option<&str>,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        self.validate_channel_name(channel)?;
        if let Some(topic) = topic {
            self.validate_text(topic)?;
        }
        Ok(vec![self.emit(Message::topic(channel, topic.map(str::to_string)))?])
    }

    /// Request a nick change. Permitted from the moment credentials can
    /// be sent, not only once registered.
    pub fn set_nick(&mut self, nick: &str) -> Result<Vec<SessionOutput>, ArgumentError> {
        if matches!(
            self.state,
            RegistrationState::Disconnected | RegistrationState::Connecting
        ) {
            return Err(ArgumentError::NotRegistered);
        }
        self.validate_nick(nick)?;
        Ok(vec![self.emit(Message::nick(nick))?])
    }

    /// Change the local user's modes (e.g. `"+iw-o"`).
    pub fn set_user_modes(&mut self, modes: &str) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        let nick = self.local_nick.clone();
        Ok(vec![self.emit(Message::new("MODE", [nick, modes.to_string()]))?])
    }

    /// Change channel modes, with mode arguments.
    pub fn set_channel_modes(
        &mut self,
        channel: &str,
        modes: &str,
        params: &[&str],
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        self.validate_channel_name(channel)?;
        let mut args = vec![channel.to_string(), modes.to_string()];
        args.extend(params.iter().map(|p| p.to_string()));
        Ok(vec![self.emit(Message::new("MODE", args))?])
    }

    /// Query WHO, optionally restricted to operators.
    pub fn who(
        &mut self,
        mask: Option<&str>,
        ops_only: bool,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        let mut params: Vec<String> = Vec::new();
        if let Some(mask) = mask {
            params.push(mask.to_string());
            if ops_only {
                params.push("o".to_string());
            }
        }
        Ok(vec![self.emit(Message::new("WHO", params))?])
    }

    /// Query WHOIS for one or more masks.
    pub fn whois(&mut self, masks: &[&str]) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        if masks.is_empty() {
            return Err(ArgumentError::EmptyTargetList);
        }
        Ok(vec![self.emit(Message::new("WHOIS", [masks.join(",")]))?])
    }

    /// Query WHOWAS for nick history.
    pub fn whowas(
        &mut self,
        nicks: &[&str],
        max_entries: Option<u32>,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        if nicks.is_empty() {
            return Err(ArgumentError::EmptyTargetList);
        }
        let mut params = vec![nicks.join(",")];
        if let Some(max) = max_entries {
            params.push(max.to_string());
        }
        Ok(vec![self.emit(Message::new("WHOWAS", params))?])
    }

    /// Query the channel list, optionally restricted to given channels.
    pub fn list(&mut self, channels: &[&str]) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        for channel in channels {
            self.validate_channel_name(channel)?;
        }
        let params: Vec<String> = if channels.is_empty() {
            Vec::new()
        } else {
            vec![channels.join(",")]
        };
        Ok(vec![self.emit(Message::new("LIST", params))?])
    }

    /// Query NAMES, optionally restricted to given channels.
    pub fn names(&mut self, channels: &[&str]) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        for channel in channels {
            self.validate_channel_name(channel)?;
        }
        let params: Vec<String> = if channels.is_empty() {
            Vec::new()
        } else {
            vec![channels.join(",")]
        };
        Ok(vec![self.emit(Message::new("NAMES", params))?])
    }

    /// Request the MOTD, optionally from another server.
    pub fn motd(&mut self, target: Option<&str>) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        Ok(vec![self.emit(Message::new(
            "MOTD",
            target.map(str::to_string).into_iter().collect::<Vec<_>>(),
        ))?])
    }

    /// Request network statistics (LUSERS).
    pub fn lusers(
        &mut self,
        mask: Option<&str>,
        target: Option<&str>,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        let mut params: Vec<String> = Vec::new();
        if let Some(mask) = mask {
            params.push(mask.to_string());
            if let Some(target) = target {
                params.push(target.to_string());
            }
        }
        Ok(vec![self.emit(Message::new("LUSERS", params))?])
    }

    /// Request server statistics.
    pub fn stats(
        &mut self,
        query: Option<&str>,
        target: Option<&str>,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        let mut params: Vec<String> = Vec::new();
        if let Some(query) = query {
            params.push(query.to_string());
            if let Some(target) = target {
                params.push(target.to_string());
            }
        }
        Ok(vec![self.emit(Message::new("STATS", params))?])
    }

    /// Request the server-links list.
    pub fn links(
        &mut self,
        remote_server: Option<&str>,
        mask: Option<&str>,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        let mut params: Vec<String> = Vec::new();
        if let Some(remote) = remote_server {
            params.push(remote.to_string());
        }
        if let Some(mask) = mask {
            params.push(mask.to_string());
        }
        Ok(vec![self.emit(Message::new("LINKS", params))?])
    }

    /// Request the server's local time.
    pub fn time(&mut self, target: Option<&str>) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        Ok(vec![self.emit(Message::new(
            "TIME",
            target.map(str::to_string).into_iter().collect::<Vec<_>>(),
        ))?])
    }

    /// Request the server's version.
    pub fn version(&mut self, target: Option<&str>) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        Ok(vec![self.emit(Message::new(
            "VERSION",
            target.map(str::to_string).into_iter().collect::<Vec<_>>(),
        ))?])
    }

    /// Ping a server. Without a target, pings the server we registered
    /// with.
    pub fn ping(&mut self, target: Option<&str>) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        let token = target
            .map(str::to_string)
            .or_else(|| {
                self.server_attrs
                    .as_ref()
                    .map(|attrs| attrs.server_name.clone())
            })
            .unwrap_or_else(|| self.local_nick.clone());
        Ok(vec![self.emit(Message::ping(token))?])
    }

    /// Set (`Some`) or clear (`None`) away status.
    pub fn away(&mut self, text: Option<&str>) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        if let Some(text) = text {
            self.validate_text(text)?;
        }
        Ok(vec![self.emit(Message::away(text.map(str::to_string)))?])
    }

    /// Query USERHOST for up to five nicks.
    pub fn userhost(&mut self, nicks: &[&str]) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        if nicks.is_empty() {
            return Err(ArgumentError::EmptyTargetList);
        }
        if nicks.len() > MAX_USERHOST_TARGETS {
            return Err(ArgumentError::TooManyTargets {
                count: nicks.len(),
                limit: MAX_USERHOST_TARGETS,
            });
        }
        for nick in nicks {
            self.validate_nick(nick)?;
        }
        let params: Vec<String> = nicks.iter().map(|n| n.to_string()).collect();
        Ok(vec![self.emit(Message::new("USERHOST", params))?])
    }

    /// Query ISON for a list of nicks.
    pub fn ison(&mut self, nicks: &[&str]) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        if nicks.is_empty() {
            return Err(ArgumentError::EmptyTargetList);
        }
        for nick in nicks {
            self.validate_nick(nick)?;
        }
        let params: Vec<String> = nicks.iter().map(|n| n.to_string()).collect();
        Ok(vec![self.emit(Message::new("ISON", params))?])
    }

    /// Send a PRIVMSG to one or more targets.
    ///
    /// Updates the local outbound bookkeeping (a `MessageSent` event)
    /// before the line reaches the queue.
    pub fn send_private_message(
        &mut self,
        targets: &[&str],
        text: &str,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        self.validate_targets(targets)?;
        self.validate_text(text)?;
        let output = self.emit(Message::privmsg(targets.join(","), text))?;
        Ok(vec![
            SessionOutput::Event(Event::MessageSent {
                targets: targets.iter().map(|t| t.to_string()).collect(),
                text: text.to_string(),
            }),
            output,
        ])
    }

    /// Send a NOTICE to one or more targets.
    pub fn send_notice(
        &mut self,
        targets: &[&str],
        text: &str,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        self.validate_targets(targets)?;
        self.validate_text(text)?;
        let output = self.emit(Message::notice(targets.join(","), text))?;
        Ok(vec![
            SessionOutput::Event(Event::NoticeSent {
                targets: targets.iter().map(|t| t.to_string()).collect(),
                text: text.to_string(),
            }),
            output,
        ])
    }

    fn validate_targets(&self, targets: &[&str]) -> Result<(), ArgumentError> {
        if targets.is_empty() {
            return Err(ArgumentError::EmptyTargetList);
        }
        for target in targets {
            if target.is_empty() || target.contains([' ', ',']) {
                return Err(ArgumentError::InvalidNickName(target.to_string()));
            }
        }
        Ok(())
    }

    /// Send a CTCP request (carried in PRIVMSG).
    pub fn send_ctcp_request(
        &mut self,
        targets: &[&str],
        ctcp: Ctcp,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        self.validate_targets(targets)?;
        Ok(vec![self.emit(Message::privmsg(targets.join(","), ctcp.encode()))?])
    }

    /// Send a CTCP response (carried in NOTICE).
    pub fn send_ctcp_response(
        &mut self,
        targets: &[&str],
        ctcp: Ctcp,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.require_registered()?;
        self.validate_targets(targets)?;
        Ok(vec![self.emit(Message::notice(targets.join(","), ctcp.encode()))?])
    }

    /// Send a CTCP ACTION (`/me`).
    pub fn ctcp_action(
        &mut self,
        targets: &[&str],
        text: &str,
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.validate_text(text)?;
        self.send_ctcp_request(targets, Ctcp::action(text))
    }

    /// Ask peers for their client version.
    pub fn ctcp_version_query(
        &mut self,
        targets: &[&str],
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.send_ctcp_request(targets, Ctcp::version())
    }

    /// Ask peers for their local time.
    pub fn ctcp_time_query(
        &mut self,
        targets: &[&str],
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        self.send_ctcp_request(targets, Ctcp::time())
    }

    /// Measure round-trip time to peers. The reply surfaces as
    /// [`Event::PingResponseReceived`].
    pub fn ctcp_ping_query(
        &mut self,
        targets: &[&str],
    ) -> Result<Vec<SessionOutput>, ArgumentError> {
        let token = Utc::now().timestamp_millis().to_string();
        self.send_ctcp_request(targets, Ctcp::ping(token))
    }
}
