//! Command and numeric dispatch registry.
//!
//! Handlers are registered under a command name (case-insensitive), a
//! numeric code, or an inclusive numeric range written `start-end`. The
//! engine fills this table explicitly at construction; there is no
//! scanning or discovery involved.

use std::collections::HashMap;

use tracing::warn;

/// Registry mapping commands to handlers.
///
/// `H` is the handler representation; the session engine instantiates
/// it with a plain function pointer.
#[derive(Debug)]
pub struct Dispatcher<H> {
    by_name: HashMap<String, H>,
    by_code: HashMap<u16, H>,
}

impl<H: Copy> Dispatcher<H> {
    /// Create an empty registry.
    pub fn new() -> Dispatcher<H> {
        Dispatcher {
            by_name: HashMap::new(),
            by_code: HashMap::new(),
        }
    }

    /// Register a handler under a key.
    ///
    /// Keys may be a command name (`"PRIVMSG"`), a single numeric
    /// (`"001"`), or an inclusive range of numerics (`"400-599"`); for
    /// a range the same handler is registered for each code. Later
    /// registrations replace earlier ones, which lets a broad range be
    /// installed first and specific codes layered on top.
    pub fn register(&mut self, key: &str, handler: H) {
        if let Some((start, end)) = parse_range(key) {
            for code in start..=end {
                self.by_code.insert(code, handler);
            }
        } else if let Ok(code) = key.parse::<u16>() {
            self.by_code.insert(code, handler);
        } else {
            self.by_name.insert(key.to_ascii_uppercase(), handler);
        }
    }

    /// Look up the handler for a received command, which is either an
    /// alphabetic name or a numeric code.
    pub fn lookup(&self, command: &str) -> Option<H> {
        if command.bytes().all(|b| b.is_ascii_digit()) {
            command
                .parse::<u16>()
                .ok()
                .and_then(|code| self.by_code.get(&code).copied())
        } else {
            self.by_name.get(&command.to_ascii_uppercase()).copied()
        }
    }

    /// Look up a handler, logging unknown commands.
    pub fn lookup_or_log(&self, command: &str) -> Option<H> {
        let handler = self.lookup(command);
        if handler.is_none() {
            warn!(command, "ignoring unknown command");
        }
        handler
    }
}

impl<H: Copy> Default for Dispatcher<H> {
    fn default() -> Dispatcher<H> {
        Dispatcher::new()
    }
}

fn parse_range(key: &str) -> Option<(u16, u16)> {
    let (start, end) = key.split_once('-')?;
    let start: u16 = start.parse().ok()?;
    let end: u16 = end.parse().ok()?;
    if start <= end && end <= 999 {
        Some((start, end))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup_case_insensitive() {
        let mut d: Dispatcher<&str> = Dispatcher::new();
        d.register("PRIVMSG", "privmsg");
        assert_eq!(d.lookup("privmsg"), Some("privmsg"));
        assert_eq!(d.lookup("PrivMsg"), Some("privmsg"));
        assert_eq!(d.lookup("NOTICE"), None);
    }

    #[test]
    fn test_numeric_lookup() {
        let mut d: Dispatcher<&str> = Dispatcher::new();
        d.register("001", "welcome");
        assert_eq!(d.lookup("001"), Some("welcome"));
        assert_eq!(d.lookup("002"), None);
    }

    #[test]
    fn test_range_registration() {
        let mut d: Dispatcher<&str> = Dispatcher::new();
        d.register("400-599", "error");
        assert_eq!(d.lookup("400"), Some("error"));
        assert_eq!(d.lookup("433"), Some("error"));
        assert_eq!(d.lookup("599"), Some("error"));
        assert_eq!(d.lookup("399"), None);
        assert_eq!(d.lookup("600"), None);
    }

    #[test]
    fn test_specific_code_overrides_range() {
        let mut d: Dispatcher<&str> = Dispatcher::new();
        d.register("400-599", "generic");
        d.register("433", "nick-in-use");
        assert_eq!(d.lookup("433"), Some("nick-in-use"));
        assert_eq!(d.lookup("434"), Some("generic"));
    }

    #[test]
    fn test_invalid_range_treated_as_name() {
        let mut d: Dispatcher<&str> = Dispatcher::new();
        // Not a numeric range; lands in the name table untouched.
        d.register("FOO-BAR", "x");
        assert_eq!(d.lookup("foo-bar"), Some("x"));
    }
}
