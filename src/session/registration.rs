//! Registration payloads and connection lifecycle states.
//!
//! The registration burst is PASS (when configured) followed by either
//! NICK + USER for a user session or SERVICE for a service session.

use crate::message::Message;

/// Connection lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegistrationState {
    /// Initial state, and the terminal state after any close.
    #[default]
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The socket is established; nothing sent yet.
    Connected,
    /// Credentials were sent; awaiting 001.
    Registering,
    /// 001 received; the full command surface is available.
    Registered,
    /// QUIT sent; awaiting the close.
    Quitting,
}

/// What to register as.
#[derive(Clone, Debug)]
pub enum RegistrationInfo {
    /// A normal user connection.
    User(UserRegistration),
    /// A service connection (RFC 2812 SERVICE).
    Service(ServiceRegistration),
}

impl RegistrationInfo {
    /// The nick name this registration asks for.
    pub fn nick_name(&self) -> &str {
        match self {
            RegistrationInfo::User(user) => &user.nick_name,
            RegistrationInfo::Service(service) => &service.nick_name,
        }
    }

    /// The messages of the registration burst, in send order.
    pub(crate) fn burst(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(3);
        match self {
            RegistrationInfo::User(user) => {
                if let Some(ref password) = user.password {
                    messages.push(Message::pass(password.clone()));
                }
                messages.push(Message::nick(user.nick_name.clone()));
                messages.push(Message::user(
                    user.user_name.clone(),
                    user.initial_modes.mode_bits(),
                    user.real_name.clone(),
                ));
            }
            RegistrationInfo::Service(service) => {
                if let Some(ref password) = service.password {
                    messages.push(Message::pass(password.clone()));
                }
                messages.push(Message::service(
                    service.nick_name.clone(),
                    service.distribution.clone(),
                    service.description.clone(),
                ));
            }
        }
        messages
    }
}

/// User registration credentials.
#[derive(Clone, Debug)]
pub struct UserRegistration {
    /// Requested nick name.
    pub nick_name: String,
    /// User name (ident).
    pub user_name: String,
    /// Real name / GECOS.
    pub real_name: String,
    /// Connection password, if the server requires one.
    pub password: Option<String>,
    /// Initial user modes encoded in the USER mode bits.
    pub initial_modes: InitialUserModes,
}

impl UserRegistration {
    /// Registration with the same nick, user, and real name.
    pub fn simple(nick: impl Into<String>) -> UserRegistration {
        let nick = nick.into();
        UserRegistration {
            user_name: nick.clone(),
            real_name: nick.clone(),
            nick_name: nick,
            password: None,
            initial_modes: InitialUserModes::default(),
        }
    }
}

/// Initial user modes requested at registration.
///
/// Encoded in the USER command's mode bits: `w` is 0x02 and `i` is
/// 0x04.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InitialUserModes {
    /// Receive wallops (`w`).
    pub receive_wallops: bool,
    /// Invisible (`i`).
    pub invisible: bool,
}

impl InitialUserModes {
    pub(crate) fn mode_bits(self) -> u8 {
        let mut bits = 0;
        if self.receive_wallops {
            bits |= 0x02;
        }
        if self.invisible {
            bits |= 0x04;
        }
        bits
    }
}

/// Service registration credentials.
#[derive(Clone, Debug)]
pub struct ServiceRegistration {
    /// Requested service nick name.
    pub nick_name: String,
    /// Visibility distribution mask.
    pub distribution: String,
    /// Service description text.
    pub description: String,
    /// Connection password, if the server requires one.
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_burst_without_password() {
        let info = RegistrationInfo::User(UserRegistration::simple("tester"));
        let burst = info.burst();
        assert_eq!(burst.len(), 2);
        assert_eq!(burst[0].to_wire().unwrap(), "NICK :tester\r\n");
        assert_eq!(burst[1].to_wire().unwrap(), "USER tester 0 * :tester\r\n");
    }

    #[test]
    fn test_user_burst_with_password_and_modes() {
        let info = RegistrationInfo::User(UserRegistration {
            nick_name: "nick".into(),
            user_name: "user".into(),
            real_name: "Real Name".into(),
            password: Some("hunter2".into()),
            initial_modes: InitialUserModes {
                receive_wallops: true,
                invisible: true,
            },
        });
        let burst = info.burst();
        assert_eq!(burst.len(), 3);
        assert_eq!(burst[0].to_wire().unwrap(), "PASS :hunter2\r\n");
        assert_eq!(burst[1].to_wire().unwrap(), "NICK :nick\r\n");
        assert_eq!(burst[2].to_wire().unwrap(), "USER user 6 * :Real Name\r\n");
    }

    #[test]
    fn test_service_burst() {
        let info = RegistrationInfo::Service(ServiceRegistration {
            nick_name: "statserv".into(),
            distribution: "*.example.net".into(),
            description: "Statistics".into(),
            password: None,
        });
        let burst = info.burst();
        assert_eq!(burst.len(), 1);
        assert_eq!(
            burst[0].to_wire().unwrap(),
            "SERVICE statserv * *.example.net 0 0 :Statistics\r\n"
        );
    }

    #[test]
    fn test_mode_bits() {
        assert_eq!(InitialUserModes::default().mode_bits(), 0);
        assert_eq!(
            InitialUserModes {
                receive_wallops: true,
                invisible: false
            }
            .mode_bits(),
            2
        );
        assert_eq!(
            InitialUserModes {
                receive_wallops: false,
                invisible: true
            }
            .mode_bits(),
            4
        );
    }
}
