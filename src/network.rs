//! The entity graph: users, channels, memberships, servers.
//!
//! Entities live in one arena keyed by stable ids; channels hold
//! membership ids, users hold back-links to the same memberships, and
//! deletion is explicit. Only the protocol engine mutates this graph;
//! everything else observes it through events or snapshots.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::casemap::CaseMapping;

/// Stable id of a known user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(u64);

/// Stable id of a tracked channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

/// Stable id of a channel membership (a user/channel pair).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MembershipId(u64);

/// Stable id of a known server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerId(u64);

/// A user somewhere on the network.
///
/// Users are created lazily on first appearance (source prefix,
/// WHO/WHOIS reply, NAMES, JOIN) and destroyed once a QUIT has been
/// observed and no membership references them.
#[derive(Clone, Debug)]
pub struct User {
    /// Current nick name, unique per network at any instant.
    pub nick_name: String,
    /// User name (ident), when learned.
    pub user_name: Option<String>,
    /// Real name / GECOS, when learned.
    pub real_name: Option<String>,
    /// Host name, when learned.
    pub host_name: Option<String>,
    /// Name of the server the user is attached to.
    pub server_name: Option<String>,
    /// Whether the user is a network operator.
    pub is_operator: bool,
    /// Whether the user is marked away.
    pub is_away: bool,
    /// Away text, when away.
    pub away_message: Option<String>,
    /// Whether the user is believed online.
    pub is_online: bool,
    /// Idle time from WHOIS, when queried.
    pub idle_duration: Option<Duration>,
    /// Hop count from WHO, when queried.
    pub hop_count: Option<u32>,
    /// Sign-on time from WHOIS, when queried.
    pub login_time: Option<DateTime<Utc>>,
    memberships: Vec<MembershipId>,
}

impl User {
    fn new(nick: &str) -> User {
        User {
            nick_name: nick.to_string(),
            user_name: None,
            real_name: None,
            host_name: None,
            server_name: None,
            is_operator: false,
            is_away: false,
            away_message: None,
            is_online: true,
            idle_duration: None,
            hop_count: None,
            login_time: None,
            memberships: Vec::new(),
        }
    }

    /// Memberships this user participates in.
    pub fn memberships(&self) -> &[MembershipId] {
        &self.memberships
    }
}

/// Channel visibility derived from the NAMES reply indicator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelType {
    /// Not yet learned.
    #[default]
    Unspecified,
    /// `=` — public channel.
    Public,
    /// `*` — private channel.
    Private,
    /// `@` — secret channel.
    Secret,
}

impl ChannelType {
    /// Map a RPL_NAMREPLY leading indicator character.
    pub fn from_names_indicator(c: &str) -> ChannelType {
        match c {
            "=" => ChannelType::Public,
            "*" => ChannelType::Private,
            "@" => ChannelType::Secret,
            _ => ChannelType::Unspecified,
        }
    }
}

/// A channel the client currently tracks.
#[derive(Clone, Debug)]
pub struct Channel {
    /// Channel name including its type prefix.
    pub name: String,
    /// Visibility, when learned from NAMES.
    pub kind: ChannelType,
    /// Current topic; `None` when unknown or unset.
    pub topic: Option<String>,
    /// Channel modes without arguments (e.g. `n`, `t`).
    pub modes: BTreeSet<char>,
    members: Vec<MembershipId>,
}

impl Channel {
    fn new(name: &str) -> Channel {
        Channel {
            name: name.to_string(),
            kind: ChannelType::Unspecified,
            topic: None,
            modes: BTreeSet::new(),
            members: Vec::new(),
        }
    }

    /// Memberships in this channel.
    pub fn members(&self) -> &[MembershipId] {
        &self.members
    }
}

/// A user's presence in one channel, with per-channel modes.
#[derive(Clone, Debug)]
pub struct Membership {
    /// The user side of the pair.
    pub user: UserId,
    /// The channel side of the pair.
    pub channel: ChannelId,
    /// Channel-user modes held (subset of the PREFIX table, e.g. `o`).
    pub modes: BTreeSet<char>,
}

/// A server mentioned on the network. Never removed while connected.
#[derive(Clone, Debug)]
pub struct Server {
    /// Server host name.
    pub host_name: String,
}

/// The client's view of the network.
#[derive(Debug, Default)]
pub struct Network {
    users: HashMap<UserId, User>,
    channels: HashMap<ChannelId, Channel>,
    memberships: HashMap<MembershipId, Membership>,
    servers: HashMap<ServerId, Server>,
    nick_index: HashMap<String, UserId>,
    channel_index: HashMap<String, ChannelId>,
    server_index: HashMap<String, ServerId>,
    next_id: u64,
    casemapping: CaseMapping,
    local_user: Option<UserId>,
}

impl Network {
    /// Create an empty graph.
    pub fn new() -> Network {
        Network::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// The case mapping used for nick lookups.
    pub fn casemapping(&self) -> CaseMapping {
        self.casemapping
    }

    /// Change the nick case mapping (ISUPPORT `CASEMAPPING`) and
    /// rebuild the nick index under it.
    pub fn set_casemapping(&mut self, casemapping: CaseMapping) {
        self.casemapping = casemapping;
        self.nick_index = self
            .users
            .iter()
            .map(|(&id, user)| (casemapping.lower(&user.nick_name), id))
            .collect();
    }

    /// The local user, once registration has established one.
    pub fn local_user_id(&self) -> Option<UserId> {
        self.local_user
    }

    /// Whether `id` is the local user.
    pub fn is_local(&self, id: UserId) -> bool {
        self.local_user == Some(id)
    }

    /// Mark a user as the local user.
    pub fn set_local_user(&mut self, id: UserId) {
        self.local_user = Some(id);
    }

    /// Look up a user record.
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    /// Look up a user record mutably.
    pub fn user_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users.get_mut(&id)
    }

    /// Look up a channel record.
    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    /// Look up a channel record mutably.
    pub fn channel_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.get_mut(&id)
    }

    /// Look up a membership record.
    pub fn membership(&self, id: MembershipId) -> Option<&Membership> {
        self.memberships.get(&id)
    }

    /// Look up a membership record mutably.
    pub fn membership_mut(&mut self, id: MembershipId) -> Option<&mut Membership> {
        self.memberships.get_mut(&id)
    }

    /// Look up a server record.
    pub fn server(&self, id: ServerId) -> Option<&Server> {
        self.servers.get(&id)
    }

    /// Find a user by nick under the current case mapping.
    pub fn find_user(&self, nick: &str) -> Option<UserId> {
        self.nick_index.get(&self.casemapping.lower(nick)).copied()
    }

    /// Find a user by user name (ident). Unindexed; scans the arena.
    pub fn find_user_by_name(&self, user_name: &str) -> Option<UserId> {
        self.users
            .iter()
            .find(|(_, user)| user.user_name.as_deref() == Some(user_name))
            .map(|(&id, _)| id)
    }

    /// Find a user by nick, creating an online placeholder on miss.
    /// The flag reports whether creation occurred.
    pub fn ensure_user(&mut self, nick: &str) -> (UserId, bool) {
        if let Some(id) = self.find_user(nick) {
            return (id, false);
        }
        let id = UserId(self.next_id());
        self.users.insert(id, User::new(nick));
        self.nick_index.insert(self.casemapping.lower(nick), id);
        (id, true)
    }

    /// Rename a user, keeping the nick index coherent.
    pub fn rename_user(&mut self, id: UserId, new_nick: &str) {
        if let Some(user) = self.users.get_mut(&id) {
            let old_key = self.casemapping.lower(&user.nick_name);
            self.nick_index.remove(&old_key);
            user.nick_name = new_nick.to_string();
            self.nick_index.insert(self.casemapping.lower(new_nick), id);
        }
    }

    /// Find a channel by exact name.
    pub fn find_channel(&self, name: &str) -> Option<ChannelId> {
        self.channel_index.get(name).copied()
    }

    /// Find a channel by name, creating it on miss.
    pub fn ensure_channel(&mut self, name: &str) -> (ChannelId, bool) {
        if let Some(id) = self.find_channel(name) {
            return (id, false);
        }
        let id = ChannelId(self.next_id());
        self.channels.insert(id, Channel::new(name));
        self.channel_index.insert(name.to_string(), id);
        (id, true)
    }

    /// Find a server by host name, creating it on miss.
    pub fn ensure_server(&mut self, host: &str) -> (ServerId, bool) {
        if let Some(&id) = self.server_index.get(host) {
            return (id, false);
        }
        let id = ServerId(self.next_id());
        self.servers.insert(
            id,
            Server {
                host_name: host.to_string(),
            },
        );
        self.server_index.insert(host.to_string(), id);
        (id, true)
    }

    /// The membership binding `user` to `channel`, if any.
    pub fn membership_of(&self, channel: ChannelId, user: UserId) -> Option<MembershipId> {
        self.channels.get(&channel).and_then(|chan| {
            chan.members
                .iter()
                .copied()
                .find(|mid| self.memberships.get(mid).map(|m| m.user) == Some(user))
        })
    }

    /// Bind a user to a channel. Idempotent: a user appears at most
    /// once per channel. The flag reports whether a new membership was
    /// created.
    pub fn join(&mut self, user: UserId, channel: ChannelId) -> (MembershipId, bool) {
        if let Some(existing) = self.membership_of(channel, user) {
            return (existing, false);
        }
        let id = MembershipId(self.next_id());
        self.memberships.insert(
            id,
            Membership {
                user,
                channel,
                modes: BTreeSet::new(),
            },
        );
        if let Some(chan) = self.channels.get_mut(&channel) {
            chan.members.push(id);
        }
        if let Some(user) = self.users.get_mut(&user) {
            user.memberships.push(id);
        }
        (id, true)
    }

    /// Unbind a user from a channel. Returns whether a membership was
    /// removed.
    pub fn leave(&mut self, user: UserId, channel: ChannelId) -> bool {
        match self.membership_of(channel, user) {
            Some(mid) => {
                self.remove_membership(mid);
                true
            }
            None => false,
        }
    }

    fn remove_membership(&mut self, id: MembershipId) {
        if let Some(membership) = self.memberships.remove(&id) {
            if let Some(chan) = self.channels.get_mut(&membership.channel) {
                chan.members.retain(|&m| m != id);
            }
            if let Some(user) = self.users.get_mut(&membership.user) {
                user.memberships.retain(|&m| m != id);
            }
        }
    }

    /// Drop a channel and all its memberships. Used when the local
    /// user leaves or is kicked; remote observers go with it.
    pub fn remove_channel(&mut self, id: ChannelId) {
        if let Some(chan) = self.channels.remove(&id) {
            self.channel_index.remove(&chan.name);
            for mid in chan.members {
                if let Some(membership) = self.memberships.remove(&mid) {
                    if let Some(user) = self.users.get_mut(&membership.user) {
                        user.memberships.retain(|&m| m != mid);
                    }
                }
            }
        }
    }

    /// Process an observed QUIT: unbind the user everywhere and, for a
    /// remote user, destroy the record. Returns the names of channels
    /// the user was removed from.
    pub fn quit_user(&mut self, id: UserId) -> Vec<String> {
        let memberships: Vec<MembershipId> = self
            .users
            .get(&id)
            .map(|u| u.memberships.clone())
            .unwrap_or_default();

        let mut channels = Vec::new();
        for mid in memberships {
            if let Some(channel) = self
                .memberships
                .get(&mid)
                .and_then(|m| self.channels.get(&m.channel))
            {
                channels.push(channel.name.clone());
            }
            self.remove_membership(mid);
        }

        if let Some(user) = self.users.get_mut(&id) {
            user.is_online = false;
        }
        if !self.is_local(id) {
            if let Some(user) = self.users.remove(&id) {
                self.nick_index.remove(&self.casemapping.lower(&user.nick_name));
            }
        }

        channels
    }

    /// Nick names of a channel's members, in join order.
    pub fn member_nicks(&self, channel: ChannelId) -> Vec<String> {
        self.channels
            .get(&channel)
            .map(|chan| {
                chan.members
                    .iter()
                    .filter_map(|mid| self.memberships.get(mid))
                    .filter_map(|m| self.users.get(&m.user))
                    .map(|u| u.nick_name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Iterate over all known users.
    pub fn users(&self) -> impl Iterator<Item = (UserId, &User)> {
        self.users.iter().map(|(&id, user)| (id, user))
    }

    /// Iterate over all tracked channels.
    pub fn channels(&self) -> impl Iterator<Item = (ChannelId, &Channel)> {
        self.channels.iter().map(|(&id, chan)| (id, chan))
    }

    /// Iterate over all known servers.
    pub fn servers(&self) -> impl Iterator<Item = (ServerId, &Server)> {
        self.servers.iter().map(|(&id, server)| (id, server))
    }

    /// Check the structural invariants; used by tests.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        use std::collections::HashSet;

        for (id, chan) in &self.channels {
            let mut seen_users = HashSet::new();
            for mid in &chan.members {
                let membership = self.memberships.get(mid).expect("dangling membership id");
                assert_eq!(membership.channel, *id);
                assert!(
                    seen_users.insert(membership.user),
                    "duplicate user in channel {}",
                    chan.name
                );
                assert!(self.users.contains_key(&membership.user));
                let user = &self.users[&membership.user];
                assert!(user.memberships.contains(mid));
            }
        }

        let mut online_nicks = HashSet::new();
        for user in self.users.values() {
            if user.is_online {
                assert!(
                    online_nicks.insert(self.casemapping.lower(&user.nick_name)),
                    "duplicate online nick {}",
                    user.nick_name
                );
            }
        }

        if let Some(local) = self.local_user {
            assert!(self.users.contains_key(&local), "local user not in users");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_user_is_idempotent() {
        let mut net = Network::new();
        let (id, created) = net.ensure_user("Alice");
        assert!(created);
        // Nick comparison is case-insensitive under RFC 1459 folding.
        let (again, created) = net.ensure_user("alice");
        assert!(!created);
        assert_eq!(id, again);
        net.check_invariants();
    }

    #[test]
    fn test_channel_lookup_is_case_sensitive() {
        let mut net = Network::new();
        let (a, _) = net.ensure_channel("#Chan");
        let (b, created) = net.ensure_channel("#chan");
        assert!(created);
        assert_ne!(a, b);
    }

    #[test]
    fn test_join_no_duplicates() {
        let mut net = Network::new();
        let (user, _) = net.ensure_user("bob");
        let (chan, _) = net.ensure_channel("#chan");
        let (m1, created1) = net.join(user, chan);
        let (m2, created2) = net.join(user, chan);
        assert!(created1);
        assert!(!created2);
        assert_eq!(m1, m2);
        assert_eq!(net.channel(chan).unwrap().members().len(), 1);
        net.check_invariants();
    }

    #[test]
    fn test_leave_unbinds_both_sides() {
        let mut net = Network::new();
        let (user, _) = net.ensure_user("bob");
        let (chan, _) = net.ensure_channel("#chan");
        net.join(user, chan);
        assert!(net.leave(user, chan));
        assert!(!net.leave(user, chan));
        assert!(net.channel(chan).unwrap().members().is_empty());
        assert!(net.user(user).unwrap().memberships().is_empty());
        net.check_invariants();
    }

    #[test]
    fn test_rename_updates_index() {
        let mut net = Network::new();
        let (id, _) = net.ensure_user("old");
        net.rename_user(id, "new");
        assert_eq!(net.find_user("NEW"), Some(id));
        assert_eq!(net.find_user("old"), None);
        net.check_invariants();
    }

    #[test]
    fn test_quit_removes_remote_user() {
        let mut net = Network::new();
        let (local, _) = net.ensure_user("me");
        net.set_local_user(local);
        let (bob, _) = net.ensure_user("bob");
        let (chan, _) = net.ensure_channel("#a");
        let (chan2, _) = net.ensure_channel("#b");
        net.join(bob, chan);
        net.join(bob, chan2);

        let mut affected = net.quit_user(bob);
        affected.sort();
        assert_eq!(affected, vec!["#a", "#b"]);
        assert!(net.find_user("bob").is_none());
        net.check_invariants();
    }

    #[test]
    fn test_quit_keeps_local_user() {
        let mut net = Network::new();
        let (local, _) = net.ensure_user("me");
        net.set_local_user(local);
        net.quit_user(local);
        assert!(net.user(local).is_some());
        assert!(!net.user(local).unwrap().is_online);
    }

    #[test]
    fn test_remove_channel_cleans_memberships() {
        let mut net = Network::new();
        let (a, _) = net.ensure_user("a");
        let (b, _) = net.ensure_user("b");
        let (chan, _) = net.ensure_channel("#chan");
        net.join(a, chan);
        net.join(b, chan);

        net.remove_channel(chan);
        assert!(net.find_channel("#chan").is_none());
        assert!(net.user(a).unwrap().memberships().is_empty());
        assert!(net.user(b).unwrap().memberships().is_empty());
        net.check_invariants();
    }

    #[test]
    fn test_casemapping_switch_rebuilds_index() {
        let mut net = Network::new();
        let (id, _) = net.ensure_user("nick[a]");
        // Under RFC 1459 folding, {a} and [a] are the same nick.
        assert_eq!(net.find_user("NICK{a}"), Some(id));
        net.set_casemapping(CaseMapping::Ascii);
        assert_eq!(net.find_user("NICK{a}"), None);
        assert_eq!(net.find_user("NICK[A]"), Some(id));
    }

    #[test]
    fn test_find_user_by_name() {
        let mut net = Network::new();
        let (id, _) = net.ensure_user("nick");
        assert_eq!(net.find_user_by_name("ident"), None);
        if let Some(user) = net.user_mut(id) {
            user.user_name = Some("ident".to_string());
        }
        assert_eq!(net.find_user_by_name("ident"), Some(id));
    }

    #[test]
    fn test_server_created_once() {
        let mut net = Network::new();
        let (a, created_a) = net.ensure_server("irc.example.com");
        let (b, created_b) = net.ensure_server("irc.example.com");
        assert!(created_a);
        assert!(!created_b);
        assert_eq!(a, b);
    }
}
