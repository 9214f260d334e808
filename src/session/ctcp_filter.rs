//! The CTCP sublayer as a preview filter.
//!
//! Rides on the preview hooks over incoming PRIVMSG/NOTICE: tagged
//! carriers are consumed here so the regular message path never sees
//! them. Requests arrive in PRIVMSG and may produce NOTICE responses;
//! responses arrive in NOTICE and produce events.

use std::time::Duration;

use chrono::{Local, Utc};
use tracing::debug;

use crate::ctcp::{Ctcp, CtcpKind};
use crate::event::Event;
use crate::message::Message;

use super::{CarrierKind, FilterAction, MessageFilter, Preview, SessionOutput};

/// Built-in handler for the CTCP tags the client understands.
#[derive(Debug)]
pub struct CtcpFilter {
    version: Option<String>,
}

impl CtcpFilter {
    /// Create the filter. `version` is the CTCP VERSION reply text;
    /// `None` never volunteers one.
    pub fn new(version: Option<String>) -> CtcpFilter {
        CtcpFilter { version }
    }

    fn respond(&self, nick: &str, payload: Ctcp, out: &mut Vec<SessionOutput>) {
        out.push(SessionOutput::Send(Message::notice(nick, payload.encode())));
    }

    fn handle_request(
        &mut self,
        nick: &str,
        ctcp: Ctcp,
        preview: &Preview<'_>,
        out: &mut Vec<SessionOutput>,
    ) {
        match ctcp.kind {
            CtcpKind::Action => {
                out.push(SessionOutput::Event(Event::ActionReceived {
                    source: preview.source.clone(),
                    targets: preview.targets.to_vec(),
                    text: ctcp.data.unwrap_or_default(),
                }));
            }
            CtcpKind::Version => {
                if let Some(ref version) = self.version {
                    self.respond(nick, Ctcp::version_reply(version.clone()), out);
                }
            }
            CtcpKind::Time => {
                let now = Local::now().to_rfc3339();
                self.respond(nick, Ctcp::new(CtcpKind::Time, Some(now)), out);
            }
            CtcpKind::Ping => {
                // Echo the tick back untouched.
                self.respond(nick, Ctcp::new(CtcpKind::Ping, ctcp.data), out);
            }
            CtcpKind::ErrMsg => {
                let query = ctcp.data.unwrap_or_default();
                self.respond(
                    nick,
                    Ctcp::new(CtcpKind::ErrMsg, Some(format!("{} :no error", query))),
                    out,
                );
            }
            CtcpKind::Unknown(tag) => {
                out.push(SessionOutput::Event(Event::CtcpRequestReceived {
                    source: nick.to_string(),
                    tag,
                    data: ctcp.data,
                }));
            }
        }
    }

    fn handle_response(&mut self, nick: &str, ctcp: Ctcp, preview: &Preview<'_>, out: &mut Vec<SessionOutput>) {
        match ctcp.kind {
            // ACTION has no request/response distinction.
            CtcpKind::Action => {
                out.push(SessionOutput::Event(Event::ActionReceived {
                    source: preview.source.clone(),
                    targets: preview.targets.to_vec(),
                    text: ctcp.data.unwrap_or_default(),
                }));
            }
            CtcpKind::Version => {
                out.push(SessionOutput::Event(Event::VersionResponseReceived {
                    source: nick.to_string(),
                    version: ctcp.data.unwrap_or_default(),
                }));
            }
            CtcpKind::Time => {
                out.push(SessionOutput::Event(Event::TimeResponseReceived {
                    source: nick.to_string(),
                    time: ctcp.data.unwrap_or_default(),
                }));
            }
            CtcpKind::Ping => {
                let sent = ctcp
                    .data
                    .as_deref()
                    .and_then(|tick| tick.parse::<i64>().ok());
                match sent {
                    Some(sent) => {
                        let elapsed_ms = Utc::now().timestamp_millis().saturating_sub(sent).max(0);
                        out.push(SessionOutput::Event(Event::PingResponseReceived {
                            source: nick.to_string(),
                            round_trip: Duration::from_millis(elapsed_ms as u64),
                        }));
                    }
                    None => debug!(data = ?ctcp.data, "discarding CTCP PING response with bad tick"),
                }
            }
            CtcpKind::ErrMsg => {
                let data = ctcp.data.unwrap_or_default();
                let (failed_query, message) = match data.split_once(" :") {
                    Some((query, message)) => (query.to_string(), message.to_string()),
                    None => (data, String::new()),
                };
                out.push(SessionOutput::Event(Event::ErrorMessageReceived {
                    source: nick.to_string(),
                    failed_query,
                    message,
                }));
            }
            CtcpKind::Unknown(tag) => {
                out.push(SessionOutput::Event(Event::CtcpRequestReceived {
                    source: nick.to_string(),
                    tag,
                    data: ctcp.data,
                }));
            }
        }
    }
}

impl MessageFilter for CtcpFilter {
    fn preview(&mut self, preview: &Preview<'_>, out: &mut Vec<SessionOutput>) -> FilterAction {
        if !Ctcp::is_tagged(preview.text) {
            return FilterAction::Pass;
        }
        let ctcp = match Ctcp::extract(preview.text) {
            Some(ctcp) => ctcp,
            None => return FilterAction::Pass,
        };
        let nick = match preview.source.nick() {
            Some(nick) => nick.to_string(),
            // Tagged data from a server has no reply path; swallow it.
            None => return FilterAction::Consume,
        };

        match preview.carrier {
            CarrierKind::Message => self.handle_request(&nick, ctcp, preview, out),
            CarrierKind::Notice => self.handle_response(&nick, ctcp, preview, out),
        }
        FilterAction::Consume
    }
}
