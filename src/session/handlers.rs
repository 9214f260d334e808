//! Inbound command and numeric handlers.
//!
//! Each handler mutates the entity graph first and then pushes its
//! events, so subscribers always observe post-update state.

use std::time::Duration;

use chrono::DateTime;
use tracing::{debug, warn};

use crate::dispatch::Dispatcher;
use crate::event::{ChannelListItem, Event, ServerLink, UserHostEntry};
use crate::message::{Message, MessageRef, MessageTarget};
use crate::mode::{parse_channel_modes, parse_user_modes};
use crate::network::{ChannelType, UserId};
use crate::response::Response::{self, *};
use crate::source::SourceRef;

use super::{effective_casemapping, CarrierKind, Handler, RegistrationState, Session, SessionOutput};

fn num(response: Response) -> String {
    format!("{:03}", response.code())
}

/// Fill the dispatch table. The error range goes in first so specific
/// codes can override it.
pub(super) fn install(d: &mut Dispatcher<Handler>) {
    d.register("PING", on_ping);
    d.register("PONG", on_pong);
    d.register("NICK", on_nick);
    d.register("QUIT", on_quit);
    d.register("JOIN", on_join);
    d.register("PART", on_part);
    d.register("KICK", on_kick);
    d.register("MODE", on_mode);
    d.register("TOPIC", on_topic);
    d.register("INVITE", on_invite);
    d.register("PRIVMSG", on_privmsg);
    d.register("NOTICE", on_notice);
    d.register("ERROR", on_server_error);

    d.register("400-599", on_error_reply);

    d.register(&num(RPL_WELCOME), on_welcome);
    d.register("002-003", on_server_greeting);
    d.register(&num(RPL_MYINFO), on_myinfo);
    d.register(&num(RPL_ISUPPORT), on_isupport);
    d.register("251-255", on_lusers);
    d.register(&num(RPL_AWAY), on_away_reply);
    d.register(&num(RPL_USERHOST), on_userhost_reply);
    d.register(&num(RPL_ISON), on_ison_reply);
    d.register(&num(RPL_UNAWAY), on_unaway);
    d.register(&num(RPL_NOWAWAY), on_nowaway);
    d.register(&num(RPL_WHOISUSER), on_whois_user);
    d.register(&num(RPL_WHOISSERVER), on_whois_server);
    d.register(&num(RPL_WHOISOPERATOR), on_whois_operator);
    d.register(&num(RPL_WHOISIDLE), on_whois_idle);
    d.register(&num(RPL_ENDOFWHOIS), on_whois_end);
    d.register(&num(RPL_WHOISCHANNELS), on_whois_channels);
    d.register(&num(RPL_WHOWASUSER), on_whowas_user);
    d.register(&num(RPL_ENDOFWHOWAS), on_whowas_end);
    d.register(&num(RPL_WHOREPLY), on_who_reply);
    d.register(&num(RPL_ENDOFWHO), on_who_end);
    d.register(&num(RPL_LISTSTART), on_list_start);
    d.register(&num(RPL_LIST), on_list_item);
    d.register(&num(RPL_LISTEND), on_list_end);
    d.register(&num(RPL_CHANNELMODEIS), on_channel_modes_reply);
    d.register(&num(RPL_NOTOPIC), on_no_topic);
    d.register(&num(RPL_TOPIC), on_topic_reply);
    d.register(&num(RPL_INVITING), on_inviting);
    d.register(&num(RPL_VERSION), on_version_reply);
    d.register(&num(RPL_NAMREPLY), on_names_reply);
    d.register(&num(RPL_ENDOFNAMES), on_names_end);
    d.register(&num(RPL_LINKS), on_links_item);
    d.register(&num(RPL_ENDOFLINKS), on_links_end);
    d.register(&num(RPL_MOTD), on_motd_line);
    d.register(&num(RPL_MOTDSTART), on_motd_start);
    d.register(&num(RPL_ENDOFMOTD), on_motd_end);
    d.register(&num(RPL_TIME), on_time_reply);
}

/// Create or refresh a user from a message source, returning its id.
fn user_from_source(session: &mut Session, source: &SourceRef<'_>) -> Option<UserId> {
    let nick = source.nick?;
    let (id, _) = session.network.ensure_user(nick);
    if let Some(user) = session.network.user_mut(id) {
        user.is_online = true;
        if let Some(ident) = source.user {
            user.user_name = Some(ident.to_string());
        }
        if let Some(host) = source.host {
            user.host_name = Some(host.to_string());
        }
    }
    Some(id)
}

fn event(out: &mut Vec<SessionOutput>, event: Event) {
    out.push(SessionOutput::Event(event));
}

// === Connection upkeep ===

fn on_ping(_session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let token = msg.params.last().copied().unwrap_or_default();
    out.push(SessionOutput::Send(Message::pong(token)));
    event(
        out,
        Event::PingReceived {
            token: token.to_string(),
        },
    );
}

fn on_pong(_session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    event(
        out,
        Event::PongReceived {
            server: msg.arg(0).unwrap_or_default().to_string(),
            token: msg.arg(1).map(str::to_string),
        },
    );
}

fn on_server_error(_session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    event(
        out,
        Event::ServerErrorMessage {
            message: msg.arg(0).unwrap_or_default().to_string(),
        },
    );
    // The server closes after ERROR; beat it to the socket.
    out.push(SessionOutput::Disconnect);
}

// === Membership and identity ===

fn on_join(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let source = match msg.source() {
        Some(source) => source,
        None => return,
    };
    let channels = msg.arg(0).unwrap_or_default();

    let local = source
        .nick
        .map(|nick| session.is_local_nick(nick))
        .unwrap_or(false);
    let user_id = match user_from_source(session, &source) {
        Some(id) => id,
        None => return,
    };
    if local && session.network.local_user_id().is_none() {
        session.network.set_local_user(user_id);
    }

    for name in channels.split(',').filter(|c| !c.is_empty()) {
        let (channel_id, _) = session.network.ensure_channel(name);
        session.network.join(user_id, channel_id);
        if local {
            event(
                out,
                Event::ChannelJoined {
                    channel: name.to_string(),
                },
            );
        } else {
            event(
                out,
                Event::UserJoined {
                    channel: name.to_string(),
                    nick: source.nick.unwrap_or_default().to_string(),
                },
            );
        }
    }
}

fn on_part(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let source = match msg.source() {
        Some(source) => source,
        None => return,
    };
    let nick = match source.nick {
        Some(nick) => nick,
        None => return,
    };
    let comment = msg.arg(1).map(str::to_string);
    let local = session.is_local_nick(nick);
    let user_id = session.network.find_user(nick);

    for name in msg.arg(0).unwrap_or_default().split(',').filter(|c| !c.is_empty()) {
        let channel_id = match session.network.find_channel(name) {
            Some(id) => id,
            None => continue,
        };
        if local {
            // Leaving a channel drops our whole view of it.
            session.network.remove_channel(channel_id);
            event(
                out,
                Event::ChannelLeft {
                    channel: name.to_string(),
                    comment: comment.clone(),
                },
            );
        } else {
            if let Some(user_id) = user_id {
                session.network.leave(user_id, channel_id);
            }
            event(
                out,
                Event::UserLeft {
                    channel: name.to_string(),
                    nick: nick.to_string(),
                    comment: comment.clone(),
                },
            );
        }
    }
}

fn on_kick(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let channels: Vec<&str> = msg
        .arg(0)
        .unwrap_or_default()
        .split(',')
        .filter(|c| !c.is_empty())
        .collect();
    let targets: Vec<&str> = msg
        .arg(1)
        .unwrap_or_default()
        .split(',')
        .filter(|c| !c.is_empty())
        .collect();
    if channels.is_empty() || targets.is_empty() {
        return;
    }
    let comment = msg.arg(2).map(str::to_string);
    let kicked_by = msg.source().and_then(|s| s.nick).map(str::to_string);

    // Either one channel with many targets, or pairwise lists.
    let pairs: Vec<(&str, &str)> = if channels.len() == 1 {
        targets.iter().map(|&t| (channels[0], t)).collect()
    } else {
        channels.iter().copied().zip(targets.iter().copied()).collect()
    };

    for (channel_name, nick) in pairs {
        if let Some(channel_id) = session.network.find_channel(channel_name) {
            if session.is_local_nick(nick) {
                session.network.remove_channel(channel_id);
            } else if let Some(user_id) = session.network.find_user(nick) {
                session.network.leave(user_id, channel_id);
            }
        }
        event(
            out,
            Event::UserKicked {
                channel: channel_name.to_string(),
                nick: nick.to_string(),
                kicked_by: kicked_by.clone(),
                comment: comment.clone(),
            },
        );
    }
}

fn on_quit(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let nick = match msg.source().and_then(|s| s.nick) {
        Some(nick) => nick.to_string(),
        None => return,
    };
    let comment = msg.arg(0).map(str::to_string);

    let channels = match session.network.find_user(&nick) {
        Some(user_id) => session.network.quit_user(user_id),
        None => Vec::new(),
    };

    event(
        out,
        Event::UserQuit {
            nick: nick.clone(),
            comment: comment.clone(),
        },
    );
    for channel in channels {
        event(
            out,
            Event::UserLeft {
                channel,
                nick: nick.clone(),
                comment: comment.clone(),
            },
        );
    }
}

fn on_nick(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let source = match msg.source() {
        Some(source) => source,
        None => return,
    };
    let old_nick = match source.nick {
        Some(nick) => nick.to_string(),
        None => return,
    };
    let new_nick = match msg.arg(0) {
        Some(nick) => nick.to_string(),
        None => return,
    };

    if let Some(user_id) = user_from_source(session, &source) {
        session.network.rename_user(user_id, &new_nick);
    }
    if session.is_local_nick(&old_nick) {
        session.local_nick = new_nick.clone();
    }

    event(
        out,
        Event::NickNameChanged { old_nick, new_nick },
    );
}

// === Modes and topic ===

fn on_mode(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let target = match msg.arg(0) {
        Some(target) => target.to_string(),
        None => return,
    };
    let pieces: Vec<&str> = msg.params.iter().skip(1).copied().collect();

    if target.starts_with(|c| session.chantypes.contains(c)) {
        apply_channel_modes(session, &target, &pieces, msg.source().and_then(|s| s.nick), out);
    } else if session.is_local_nick(&target) {
        match parse_user_modes(&pieces) {
            Ok(changes) => {
                for change in &changes {
                    if change.add {
                        session.local_modes.insert(change.mode);
                    } else {
                        session.local_modes.remove(&change.mode);
                    }
                }
                event(out, Event::LocalUserModesChanged { changes });
            }
            Err(err) => warn!(%err, target, "discarding unparseable user mode string"),
        }
    } else {
        debug!(target, "ignoring MODE for a user other than ourselves");
    }
}

fn apply_channel_modes(
    session: &mut Session,
    channel_name: &str,
    pieces: &[&str],
    changed_by: Option<&str>,
    out: &mut Vec<SessionOutput>,
) {
    let changes = match parse_channel_modes(pieces, &session.member_modes) {
        Ok(changes) => changes,
        Err(err) => {
            warn!(%err, channel = channel_name, "discarding unparseable channel mode string");
            return;
        }
    };

    let (channel_id, _) = session.network.ensure_channel(channel_name);
    for change in &changes {
        if session.member_modes.is_member_mode(change.mode) {
            let nick = match change.param.as_deref() {
                Some(nick) => nick,
                None => continue,
            };
            let membership = session
                .network
                .find_user(nick)
                .and_then(|user_id| session.network.membership_of(channel_id, user_id))
                .and_then(|mid| session.network.membership_mut(mid));
            if let Some(membership) = membership {
                if change.add {
                    membership.modes.insert(change.mode);
                } else {
                    membership.modes.remove(&change.mode);
                }
            }
        } else if !matches!(change.mode, 'b' | 'e' | 'I') {
            // List modes track entries, not channel state.
            if let Some(channel) = session.network.channel_mut(channel_id) {
                if change.add {
                    channel.modes.insert(change.mode);
                } else {
                    channel.modes.remove(&change.mode);
                }
            }
        }
    }

    event(
        out,
        Event::ChannelModesChanged {
            channel: channel_name.to_string(),
            changed_by: changed_by.map(str::to_string),
            changes,
        },
    );
}

fn on_topic(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let channel_name = match msg.arg(0) {
        Some(name) => name.to_string(),
        None => return,
    };
    let text = msg.arg(1).unwrap_or_default();
    let topic = if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    };

    let (channel_id, _) = session.network.ensure_channel(&channel_name);
    if let Some(channel) = session.network.channel_mut(channel_id) {
        channel.topic = topic.clone();
    }

    event(
        out,
        Event::TopicChanged {
            channel: channel_name,
            topic,
            set_by: msg.source().and_then(|s| s.nick).map(str::to_string),
        },
    );
}

fn on_invite(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let (a, b) = match (msg.arg(0), msg.arg(1)) {
        (Some(a), Some(b)) => (a, b),
        _ => return,
    };
    let (nick, channel) = split_nick_channel(a, b, &session.chantypes);
    event(
        out,
        Event::UserInvited {
            channel: channel.to_string(),
            nick: nick.to_string(),
        },
    );
}

/// INVITE and 341 carry a nick and a channel whose order has drifted
/// between RFC revisions; classify by the channel-type prefix.
fn split_nick_channel<'a>(a: &'a str, b: &'a str, chantypes: &str) -> (&'a str, &'a str) {
    if a.starts_with(|c| chantypes.contains(c)) {
        (b, a)
    } else {
        (a, b)
    }
}

// === PRIVMSG / NOTICE ===

fn on_privmsg(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    deliver_text(session, msg, CarrierKind::Message, out);
}

fn on_notice(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    deliver_text(session, msg, CarrierKind::Notice, out);
}

fn deliver_text(
    session: &mut Session,
    msg: &MessageRef<'_>,
    carrier: CarrierKind,
    out: &mut Vec<SessionOutput>,
) {
    let target_list = match msg.arg(0) {
        Some(targets) => targets,
        None => return,
    };
    let text = msg.arg(1).unwrap_or_default().to_string();

    let source_ref = msg.source();
    if let Some(ref source) = source_ref {
        user_from_source(session, source);
    }
    let source = source_ref.map(|s| s.to_owned());

    let targets: Vec<MessageTarget> = target_list
        .split(',')
        .filter(|t| !t.is_empty())
        .map(|t| MessageTarget::parse(t, &session.chantypes))
        .collect();

    if let Some(ref source) = source {
        if session.run_filters(carrier, source, &targets, &text, out) {
            return;
        }
    }

    let ev = match carrier {
        CarrierKind::Message => Event::MessageReceived {
            source,
            targets,
            text,
        },
        CarrierKind::Notice => Event::NoticeReceived {
            source,
            targets,
            text,
        },
    };
    event(out, ev);
}

// === Registration numerics ===

fn on_welcome(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    // The server has the last word on our nick.
    let nick = msg.arg(0).unwrap_or(&session.local_nick).to_string();
    session.local_nick = nick.clone();

    let (user_id, _) = session.network.ensure_user(&nick);
    session.network.set_local_user(user_id);
    session.state = RegistrationState::Registered;

    event(out, Event::Registered { nick });
}

fn on_server_greeting(_session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    // 002/003 are prose about the server; nothing to track.
    debug!(text = msg.params.last().copied().unwrap_or_default(), "server greeting");
}

fn on_myinfo(session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    let server_name = msg.arg(1).unwrap_or_default().to_string();
    if !server_name.is_empty() {
        session.network.ensure_server(&server_name);
    }
    session.server_attrs = Some(super::ServerAttributes {
        server_name,
        version: msg.arg(2).unwrap_or_default().to_string(),
        user_modes: msg.arg(3).unwrap_or_default().to_string(),
        channel_modes: msg.arg(4).unwrap_or_default().to_string(),
    });
}

fn on_isupport(session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    let mut tokens: &[&str] = match msg.params.split_first() {
        Some((_client_nick, rest)) => rest,
        None => return,
    };
    // The trailing "are supported by this server" is prose, not a token.
    if let Some(last) = tokens.last() {
        if last.contains(' ') {
            tokens = &tokens[..tokens.len() - 1];
        }
    }
    session.isupport.absorb(tokens.iter().copied());

    if let Some(prefix) = session.isupport.prefix() {
        session.member_modes = prefix;
    }
    if let Some(chantypes) = session.isupport.chantypes() {
        session.chantypes = chantypes.to_string();
    }
    let casemapping = effective_casemapping(&session.isupport);
    if casemapping != session.network.casemapping() {
        session.network.set_casemapping(casemapping);
    }
}

fn on_lusers(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let code = msg.numeric().unwrap_or_default();
    let info = &mut session.network_info;
    match code {
        251 => info.client_info = msg.params.last().map(|s| s.to_string()),
        252 => info.operators = msg.arg(1).and_then(|n| n.parse().ok()),
        253 => info.unknown_connections = msg.arg(1).and_then(|n| n.parse().ok()),
        254 => info.channels = msg.arg(1).and_then(|n| n.parse().ok()),
        255 => info.server_info = msg.params.last().map(|s| s.to_string()),
        _ => return,
    }
    event(
        out,
        Event::NetworkInfoReceived {
            info: session.network_info.clone(),
        },
    );
}

// === Away and presence ===

fn on_away_reply(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let nick = match msg.arg(1) {
        Some(nick) => nick.to_string(),
        None => return,
    };
    let message = msg.arg(2).unwrap_or_default().to_string();

    let (user_id, _) = session.network.ensure_user(&nick);
    if let Some(user) = session.network.user_mut(user_id) {
        user.is_away = true;
        user.away_message = Some(message.clone());
    }

    event(out, Event::UserAwayReceived { nick, message });
}

fn on_unaway(session: &mut Session, _msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    set_local_away(session, false);
    event(out, Event::LocalAwayChanged { is_away: false });
}

fn on_nowaway(session: &mut Session, _msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    set_local_away(session, true);
    event(out, Event::LocalAwayChanged { is_away: true });
}

fn set_local_away(session: &mut Session, is_away: bool) {
    if let Some(user) = session
        .network
        .local_user_id()
        .and_then(|id| session.network.user_mut(id))
    {
        user.is_away = is_away;
        if !is_away {
            user.away_message = None;
        }
    }
}

fn on_userhost_reply(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let mut entries = Vec::new();
    for token in msg.arg(1).unwrap_or_default().split_whitespace() {
        let (nick_part, rest) = match token.split_once('=') {
            Some(split) => split,
            None => continue,
        };
        let is_operator = nick_part.ends_with('*');
        let nick = nick_part.trim_end_matches('*').to_string();
        let is_away = rest.starts_with('-');
        let host_mask = rest.trim_start_matches(['+', '-']).to_string();

        let (user_id, _) = session.network.ensure_user(&nick);
        if let Some(user) = session.network.user_mut(user_id) {
            user.is_operator = is_operator;
            user.is_away = is_away;
            user.is_online = true;
        }

        entries.push(UserHostEntry {
            nick,
            is_operator,
            is_away,
            host_mask,
        });
    }
    event(out, Event::UserHostReceived { entries });
}

fn on_ison_reply(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let mut nicks = Vec::new();
    for nick in msg.arg(1).unwrap_or_default().split_whitespace() {
        let (user_id, _) = session.network.ensure_user(nick);
        if let Some(user) = session.network.user_mut(user_id) {
            user.is_online = true;
        }
        nicks.push(nick.to_string());
    }
    event(out, Event::IsOnReceived { nicks });
}

// === WHO / WHOIS / WHOWAS ===

fn on_who_reply(session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    // <client> <channel> <user> <host> <server> <nick> <flags> :<hop> <realname>
    let nick = match msg.arg(5) {
        Some(nick) => nick.to_string(),
        None => return,
    };
    let flags = msg.arg(6).unwrap_or_default().to_string();
    let trailing = msg.arg(7).unwrap_or_default();
    let (hop, real_name) = match trailing.split_once(' ') {
        Some((hop, real)) => (hop.parse().ok(), Some(real.to_string())),
        None => (trailing.parse().ok(), None),
    };

    let (user_id, _) = session.network.ensure_user(&nick);
    if let Some(user) = session.network.user_mut(user_id) {
        user.user_name = msg.arg(2).map(str::to_string);
        user.host_name = msg.arg(3).map(str::to_string);
        user.server_name = msg.arg(4).map(str::to_string);
        user.is_away = flags.contains('G');
        user.is_operator = flags.contains('*');
        user.is_online = true;
        user.hop_count = hop;
        if real_name.is_some() {
            user.real_name = real_name;
        }
    }

    // The channel column binds the user when we track that channel.
    if let Some(channel_id) = msg.arg(1).and_then(|c| session.network.find_channel(c)) {
        let (membership_id, _) = session.network.join(user_id, channel_id);
        let modes: Vec<char> = flags
            .chars()
            .filter_map(|c| session.member_modes.mode_for(c))
            .collect();
        if let Some(membership) = session.network.membership_mut(membership_id) {
            for mode in modes {
                membership.modes.insert(mode);
            }
        }
    }
}

fn on_who_end(_session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    event(
        out,
        Event::WhoCompleted {
            mask: msg.arg(1).unwrap_or_default().to_string(),
        },
    );
}

fn on_whois_user(session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    let nick = match msg.arg(1) {
        Some(nick) => nick.to_string(),
        None => return,
    };
    let (user_id, _) = session.network.ensure_user(&nick);
    if let Some(user) = session.network.user_mut(user_id) {
        user.user_name = msg.arg(2).map(str::to_string);
        user.host_name = msg.arg(3).map(str::to_string);
        user.real_name = msg.arg(5).map(str::to_string);
        user.is_online = true;
    }
}

fn on_whois_server(session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    let nick = match msg.arg(1) {
        Some(nick) => nick.to_string(),
        None => return,
    };
    let server = msg.arg(2).unwrap_or_default().to_string();
    if !server.is_empty() {
        session.network.ensure_server(&server);
    }
    let (user_id, _) = session.network.ensure_user(&nick);
    if let Some(user) = session.network.user_mut(user_id) {
        user.server_name = Some(server);
    }
}

fn on_whois_operator(session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    if let Some(nick) = msg.arg(1) {
        let (user_id, _) = session.network.ensure_user(nick);
        if let Some(user) = session.network.user_mut(user_id) {
            user.is_operator = true;
        }
    }
}

fn on_whois_idle(session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    let nick = match msg.arg(1) {
        Some(nick) => nick,
        None => return,
    };
    let idle = msg.arg(2).and_then(|s| s.parse::<u64>().ok());
    let signon = msg.arg(3).and_then(|s| s.parse::<i64>().ok());

    let (user_id, _) = session.network.ensure_user(nick);
    if let Some(user) = session.network.user_mut(user_id) {
        user.idle_duration = idle.map(Duration::from_secs);
        if let Some(signon) = signon {
            user.login_time = DateTime::from_timestamp(signon, 0);
        }
    }
}

fn on_whois_channels(session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    let nick = match msg.arg(1) {
        Some(nick) => nick,
        None => return,
    };
    let (user_id, _) = session.network.ensure_user(nick);

    for token in msg.arg(2).unwrap_or_default().split_whitespace() {
        let (modes, name) = strip_member_prefixes(session, token);
        // Only bind channels the client already tracks.
        if let Some(channel_id) = session.network.find_channel(name) {
            let (membership_id, _) = session.network.join(user_id, channel_id);
            if let Some(membership) = session.network.membership_mut(membership_id) {
                for mode in modes {
                    membership.modes.insert(mode);
                }
            }
        }
    }
}

fn on_whois_end(_session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    event(
        out,
        Event::WhoIsReplyReceived {
            nick: msg.arg(1).unwrap_or_default().to_string(),
        },
    );
}

fn on_whowas_user(session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    let nick = match msg.arg(1) {
        Some(nick) => nick,
        None => return,
    };
    // WHOWAS describes a departed user; do not resurrect one we still
    // believe is online.
    let known = session.network.find_user(nick);
    let (user_id, created) = session.network.ensure_user(nick);
    if let Some(user) = session.network.user_mut(user_id) {
        user.user_name = msg.arg(2).map(str::to_string);
        user.host_name = msg.arg(3).map(str::to_string);
        user.real_name = msg.arg(5).map(str::to_string);
        if created && known.is_none() {
            user.is_online = false;
        }
    }
}

fn on_whowas_end(_session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    event(
        out,
        Event::WhoWasReplyReceived {
            nick: msg.arg(1).unwrap_or_default().to_string(),
        },
    );
}

// === LIST / NAMES / LINKS ===

fn on_list_start(session: &mut Session, _msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    session.channel_list.clear();
}

fn on_list_item(session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    let name = match msg.arg(1) {
        Some(name) => name.to_string(),
        None => return,
    };
    session.channel_list.push(ChannelListItem {
        name,
        visible_users: msg.arg(2).and_then(|n| n.parse().ok()),
        topic: msg.arg(3).unwrap_or_default().to_string(),
    });
}

fn on_list_end(session: &mut Session, _msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    event(
        out,
        Event::ChannelListReceived {
            channels: std::mem::take(&mut session.channel_list),
        },
    );
}

fn on_names_reply(session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    // RFC 2812: <client> <symbol> <channel> :<names>
    // RFC 1459 servers omit the symbol.
    let (kind, channel_name, names) = if msg.params.len() >= 4 {
        (
            ChannelType::from_names_indicator(msg.arg(1).unwrap_or_default()),
            msg.arg(2).unwrap_or_default(),
            msg.arg(3).unwrap_or_default(),
        )
    } else {
        (
            ChannelType::Unspecified,
            msg.arg(1).unwrap_or_default(),
            msg.arg(2).unwrap_or_default(),
        )
    };
    if channel_name.is_empty() {
        return;
    }

    let channel_name = channel_name.to_string();
    let names = names.to_string();
    let (channel_id, _) = session.network.ensure_channel(&channel_name);
    if kind != ChannelType::Unspecified {
        if let Some(channel) = session.network.channel_mut(channel_id) {
            channel.kind = kind;
        }
    }

    for token in names.split_whitespace() {
        let (modes, nick) = strip_member_prefixes(session, token);
        if nick.is_empty() {
            continue;
        }
        let (user_id, _) = session.network.ensure_user(nick);
        if session.is_local_nick(nick) && session.network.local_user_id().is_none() {
            session.network.set_local_user(user_id);
        }
        let (membership_id, _) = session.network.join(user_id, channel_id);
        if let Some(membership) = session.network.membership_mut(membership_id) {
            for mode in modes {
                membership.modes.insert(mode);
            }
        }
    }
}

/// Split leading nick-prefix characters (e.g. `@+`) off a NAMES token,
/// mapping them to their mode letters.
fn strip_member_prefixes<'a>(session: &Session, token: &'a str) -> (Vec<char>, &'a str) {
    let mut modes = Vec::new();
    let mut rest = token;
    while let Some(c) = rest.chars().next() {
        match session.member_modes.mode_for(c) {
            Some(mode) => {
                modes.push(mode);
                rest = &rest[c.len_utf8()..];
            }
            None => break,
        }
    }
    (modes, rest)
}

fn on_names_end(_session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    event(
        out,
        Event::UsersListReceived {
            channel: msg.arg(1).unwrap_or_default().to_string(),
        },
    );
}

fn on_links_item(session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    session.links.push(ServerLink {
        mask: msg.arg(1).unwrap_or_default().to_string(),
        server: msg.arg(2).unwrap_or_default().to_string(),
        info: msg.arg(3).unwrap_or_default().to_string(),
    });
}

fn on_links_end(session: &mut Session, _msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    event(
        out,
        Event::ServerLinksReceived {
            links: std::mem::take(&mut session.links),
        },
    );
}

// === Channel state numerics ===

fn on_channel_modes_reply(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let channel_name = match msg.arg(1) {
        Some(name) => name.to_string(),
        None => return,
    };
    let pieces: Vec<&str> = msg.params.iter().skip(2).copied().collect();
    apply_channel_modes(session, &channel_name, &pieces, None, out);
}

fn on_no_topic(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    set_topic_from_reply(session, msg, None, out);
}

fn on_topic_reply(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let topic = msg.arg(2).map(str::to_string);
    set_topic_from_reply(session, msg, topic, out);
}

fn set_topic_from_reply(
    session: &mut Session,
    msg: &MessageRef<'_>,
    topic: Option<String>,
    out: &mut Vec<SessionOutput>,
) {
    let channel_name = match msg.arg(1) {
        Some(name) => name.to_string(),
        None => return,
    };
    let (channel_id, _) = session.network.ensure_channel(&channel_name);
    if let Some(channel) = session.network.channel_mut(channel_id) {
        channel.topic = topic.clone();
    }
    event(
        out,
        Event::TopicChanged {
            channel: channel_name,
            topic,
            set_by: None,
        },
    );
}

fn on_inviting(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let (a, b) = match (msg.arg(1), msg.arg(2)) {
        (Some(a), Some(b)) => (a, b),
        _ => return,
    };
    let (nick, channel) = split_nick_channel(a, b, &session.chantypes);
    event(
        out,
        Event::UserInvited {
            channel: channel.to_string(),
            nick: nick.to_string(),
        },
    );
}

// === Server queries ===

fn on_version_reply(_session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    event(
        out,
        Event::ServerVersionReceived {
            server: msg.arg(2).unwrap_or_default().to_string(),
            version: msg.arg(1).unwrap_or_default().to_string(),
        },
    );
}

fn on_time_reply(_session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    event(
        out,
        Event::ServerTimeReceived {
            server: msg.arg(1).unwrap_or_default().to_string(),
            time: msg.arg(2).unwrap_or_default().to_string(),
        },
    );
}

// === MOTD ===

fn on_motd_start(session: &mut Session, _msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    session.motd.clear();
}

fn on_motd_line(session: &mut Session, msg: &MessageRef<'_>, _out: &mut Vec<SessionOutput>) {
    if let Some(line) = msg.params.last() {
        session.motd.push_str(line);
        session.motd.push('\n');
    }
}

fn on_motd_end(session: &mut Session, _msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    event(
        out,
        Event::MotdReceived {
            text: session.motd.clone(),
        },
    );
}

// === Error replies ===

fn on_error_reply(session: &mut Session, msg: &MessageRef<'_>, out: &mut Vec<SessionOutput>) {
    let code = msg.numeric().unwrap_or_default();
    // The first parameter is our own nick on every 4xx/5xx; drop it.
    let params: Vec<String> = msg
        .params
        .iter()
        .skip(1)
        .map(|p| p.to_string())
        .collect();
    let message = params.last().cloned().unwrap_or_default();
    let params = if params.is_empty() {
        params
    } else {
        params[..params.len() - 1].to_vec()
    };

    if let Some(response) = Response::from_code(code) {
        debug!(code, name = ?response, "protocol error reply");
    }

    event(
        out,
        Event::ProtocolError {
            code,
            params,
            message,
        },
    );

    // A rejected nick during registration is fatal: there is no retry.
    if session.state == RegistrationState::Registering
        && matches!(code, 431 | 432 | 433 | 436 | 464 | 465)
    {
        out.push(SessionOutput::Disconnect);
    }
}
