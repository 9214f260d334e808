//! IRC numeric reply codes consumed by the client.
//!
//! Response codes are three-digit numbers sent by servers to indicate
//! the result of commands or to provide information.
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol

#![allow(non_camel_case_types)]

use std::str::FromStr;

/// IRC server response code.
///
/// Response codes are categorized as:
/// - 001-099: Connection/registration
/// - 200-399: Command replies
/// - 400-599: Error replies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    // === Connection Registration (001-099) ===
    /// 001 - Welcome to the IRC network
    RPL_WELCOME = 1,
    /// 002 - Your host is running version
    RPL_YOURHOST = 2,
    /// 003 - Server creation date
    RPL_CREATED = 3,
    /// 004 - Server info (name, version, user modes, channel modes)
    RPL_MYINFO = 4,
    /// 005 - Server supported features (ISUPPORT)
    RPL_ISUPPORT = 5,

    // === Command Responses (200-399) ===
    /// 221 - User mode string
    RPL_UMODEIS = 221,
    /// 251 - Luser client count
    RPL_LUSERCLIENT = 251,
    /// 252 - Luser operator count
    RPL_LUSEROP = 252,
    /// 253 - Luser unknown connections
    RPL_LUSERUNKNOWN = 253,
    /// 254 - Luser channel count
    RPL_LUSERCHANNELS = 254,
    /// 255 - Luser local info
    RPL_LUSERME = 255,
    /// 301 - User is away
    RPL_AWAY = 301,
    /// 302 - USERHOST reply
    RPL_USERHOST = 302,
    /// 303 - ISON reply
    RPL_ISON = 303,
    /// 305 - You are no longer marked as away
    RPL_UNAWAY = 305,
    /// 306 - You have been marked as away
    RPL_NOWAWAY = 306,
    /// 311 - WHOIS user info
    RPL_WHOISUSER = 311,
    /// 312 - WHOIS server
    RPL_WHOISSERVER = 312,
    /// 313 - WHOIS operator status
    RPL_WHOISOPERATOR = 313,
    /// 314 - WHOWAS user info
    RPL_WHOWASUSER = 314,
    /// 315 - End of WHO
    RPL_ENDOFWHO = 315,
    /// 317 - WHOIS idle time
    RPL_WHOISIDLE = 317,
    /// 318 - End of WHOIS
    RPL_ENDOFWHOIS = 318,
    /// 319 - WHOIS channels
    RPL_WHOISCHANNELS = 319,
    /// 321 - List start
    RPL_LISTSTART = 321,
    /// 322 - List entry
    RPL_LIST = 322,
    /// 323 - List end
    RPL_LISTEND = 323,
    /// 324 - Channel mode
    RPL_CHANNELMODEIS = 324,
    /// 331 - No topic set
    RPL_NOTOPIC = 331,
    /// 332 - Channel topic
    RPL_TOPIC = 332,
    /// 341 - Inviting user to channel
    RPL_INVITING = 341,
    /// 351 - Server version reply
    RPL_VERSION = 351,
    /// 352 - WHO reply
    RPL_WHOREPLY = 352,
    /// 353 - NAMES reply
    RPL_NAMREPLY = 353,
    /// 364 - LINKS entry
    RPL_LINKS = 364,
    /// 365 - End of LINKS
    RPL_ENDOFLINKS = 365,
    /// 366 - End of NAMES
    RPL_ENDOFNAMES = 366,
    /// 369 - End of WHOWAS
    RPL_ENDOFWHOWAS = 369,
    /// 372 - MOTD body line
    RPL_MOTD = 372,
    /// 375 - MOTD start
    RPL_MOTDSTART = 375,
    /// 376 - End of MOTD
    RPL_ENDOFMOTD = 376,
    /// 391 - Server local time
    RPL_TIME = 391,

    // === Error Replies (400-599) ===
    /// 401 - No such nick/channel
    ERR_NOSUCHNICK = 401,
    /// 402 - No such server
    ERR_NOSUCHSERVER = 402,
    /// 403 - No such channel
    ERR_NOSUCHCHANNEL = 403,
    /// 404 - Cannot send to channel
    ERR_CANNOTSENDTOCHAN = 404,
    /// 405 - Too many channels
    ERR_TOOMANYCHANNELS = 405,
    /// 406 - There was no such nickname
    ERR_WASNOSUCHNICK = 406,
    /// 407 - Too many targets
    ERR_TOOMANYTARGETS = 407,
    /// 409 - No origin specified
    ERR_NOORIGIN = 409,
    /// 411 - No recipient given
    ERR_NORECIPIENT = 411,
    /// 412 - No text to send
    ERR_NOTEXTTOSEND = 412,
    /// 421 - Unknown command
    ERR_UNKNOWNCOMMAND = 421,
    /// 422 - No MOTD
    ERR_NOMOTD = 422,
    /// 431 - No nickname given
    ERR_NONICKNAMEGIVEN = 431,
    /// 432 - Erroneous nickname
    ERR_ERRONEUSNICKNAME = 432,
    /// 433 - Nickname already in use
    ERR_NICKNAMEINUSE = 433,
    /// 436 - Nickname collision
    ERR_NICKCOLLISION = 436,
    /// 441 - User not in channel
    ERR_USERNOTINCHANNEL = 441,
    /// 442 - You are not on that channel
    ERR_NOTONCHANNEL = 442,
    /// 443 - User already on channel
    ERR_USERONCHANNEL = 443,
    /// 451 - You have not registered
    ERR_NOTREGISTERED = 451,
    /// 461 - Not enough parameters
    ERR_NEEDMOREPARAMS = 461,
    /// 462 - Already registered
    ERR_ALREADYREGISTRED = 462,
    /// 464 - Password incorrect
    ERR_PASSWDMISMATCH = 464,
    /// 465 - You are banned from this server
    ERR_YOUREBANNEDCREEP = 465,
    /// 471 - Channel is full
    ERR_CHANNELISFULL = 471,
    /// 472 - Unknown mode character
    ERR_UNKNOWNMODE = 472,
    /// 473 - Invite-only channel
    ERR_INVITEONLYCHAN = 473,
    /// 474 - Banned from channel
    ERR_BANNEDFROMCHAN = 474,
    /// 475 - Bad channel key
    ERR_BADCHANNELKEY = 475,
    /// 481 - Permission denied (not operator)
    ERR_NOPRIVILEGES = 481,
    /// 482 - Channel operator privileges needed
    ERR_CHANOPRIVSNEEDED = 482,
    /// 501 - Unknown user mode flag
    ERR_UMODEUNKNOWNFLAG = 501,
    /// 502 - Cannot change mode for other users
    ERR_USERSDONTMATCH = 502,
}

impl Response {
    /// The numeric code of this response.
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Look up a response by numeric code.
    pub fn from_code(code: u16) -> Option<Response> {
        use Response::*;
        let resp = match code {
            1 => RPL_WELCOME,
            2 => RPL_YOURHOST,
            3 => RPL_CREATED,
            4 => RPL_MYINFO,
            5 => RPL_ISUPPORT,
            221 => RPL_UMODEIS,
            251 => RPL_LUSERCLIENT,
            252 => RPL_LUSEROP,
            253 => RPL_LUSERUNKNOWN,
            254 => RPL_LUSERCHANNELS,
            255 => RPL_LUSERME,
            301 => RPL_AWAY,
            302 => RPL_USERHOST,
            303 => RPL_ISON,
            305 => RPL_UNAWAY,
            306 => RPL_NOWAWAY,
            311 => RPL_WHOISUSER,
            312 => RPL_WHOISSERVER,
            313 => RPL_WHOISOPERATOR,
            314 => RPL_WHOWASUSER,
            315 => RPL_ENDOFWHO,
            317 => RPL_WHOISIDLE,
            318 => RPL_ENDOFWHOIS,
            319 => RPL_WHOISCHANNELS,
            321 => RPL_LISTSTART,
            322 => RPL_LIST,
            323 => RPL_LISTEND,
            324 => RPL_CHANNELMODEIS,
            331 => RPL_NOTOPIC,
            332 => RPL_TOPIC,
            341 => RPL_INVITING,
            351 => RPL_VERSION,
            352 => RPL_WHOREPLY,
            353 => RPL_NAMREPLY,
            364 => RPL_LINKS,
            365 => RPL_ENDOFLINKS,
            366 => RPL_ENDOFNAMES,
            369 => RPL_ENDOFWHOWAS,
            372 => RPL_MOTD,
            375 => RPL_MOTDSTART,
            376 => RPL_ENDOFMOTD,
            391 => RPL_TIME,
            401 => ERR_NOSUCHNICK,
            402 => ERR_NOSUCHSERVER,
            403 => ERR_NOSUCHCHANNEL,
            404 => ERR_CANNOTSENDTOCHAN,
            405 => ERR_TOOMANYCHANNELS,
            406 => ERR_WASNOSUCHNICK,
            407 => ERR_TOOMANYTARGETS,
            409 => ERR_NOORIGIN,
            411 => ERR_NORECIPIENT,
            412 => ERR_NOTEXTTOSEND,
            421 => ERR_UNKNOWNCOMMAND,
            422 => ERR_NOMOTD,
            431 => ERR_NONICKNAMEGIVEN,
            432 => ERR_ERRONEUSNICKNAME,
            433 => ERR_NICKNAMEINUSE,
            436 => ERR_NICKCOLLISION,
            441 => ERR_USERNOTINCHANNEL,
            442 => ERR_NOTONCHANNEL,
            443 => ERR_USERONCHANNEL,
            451 => ERR_NOTREGISTERED,
            461 => ERR_NEEDMOREPARAMS,
            462 => ERR_ALREADYREGISTRED,
            464 => ERR_PASSWDMISMATCH,
            465 => ERR_YOUREBANNEDCREEP,
            471 => ERR_CHANNELISFULL,
            472 => ERR_UNKNOWNMODE,
            473 => ERR_INVITEONLYCHAN,
            474 => ERR_BANNEDFROMCHAN,
            475 => ERR_BADCHANNELKEY,
            481 => ERR_NOPRIVILEGES,
            482 => ERR_CHANOPRIVSNEEDED,
            501 => ERR_UMODEUNKNOWNFLAG,
            502 => ERR_USERSDONTMATCH,
            _ => return None,
        };
        Some(resp)
    }

    /// Whether this code is an error reply (400-599).
    pub fn is_error(self) -> bool {
        (400..600).contains(&self.code())
    }
}

impl FromStr for Response {
    type Err = ();

    fn from_str(s: &str) -> Result<Response, ()> {
        if s.len() == 3 && s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse::<u16>()
                .ok()
                .and_then(Response::from_code)
                .ok_or(())
        } else {
            Err(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for code in [1, 5, 301, 353, 366, 376, 433, 502] {
            let resp = Response::from_code(code).unwrap();
            assert_eq!(resp.code(), code);
        }
        assert!(Response::from_code(999).is_none());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("001".parse::<Response>(), Ok(Response::RPL_WELCOME));
        assert_eq!("433".parse::<Response>(), Ok(Response::ERR_NICKNAMEINUSE));
        assert!("1".parse::<Response>().is_err());
        assert!("PING".parse::<Response>().is_err());
    }

    #[test]
    fn test_is_error() {
        assert!(Response::ERR_NOSUCHNICK.is_error());
        assert!(!Response::RPL_WELCOME.is_error());
        assert!(!Response::RPL_TIME.is_error());
    }
}
