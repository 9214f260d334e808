//! Connection endpoints.
//!
//! Accepts plain `host`/`host:port` pairs or `irc://` / `ircs://` URIs.
//! The default ports are 6667 for plaintext and 6697 for TLS.

use std::fmt;
use std::str::FromStr;

use crate::error::ConnectError;

/// Default port for plaintext connections.
pub const DEFAULT_PORT: u16 = 6667;

/// Default port for TLS connections.
pub const DEFAULT_TLS_PORT: u16 = 6697;

/// Where to connect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerEndpoint {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Whether to wrap the connection in TLS.
    pub use_tls: bool,
}

impl ServerEndpoint {
    /// An explicit endpoint.
    pub fn new(host: impl Into<String>, port: u16, use_tls: bool) -> ServerEndpoint {
        ServerEndpoint {
            host: host.into(),
            port,
            use_tls,
        }
    }

    /// A plaintext endpoint on the default port.
    pub fn plain(host: impl Into<String>) -> ServerEndpoint {
        ServerEndpoint::new(host, DEFAULT_PORT, false)
    }

    /// A TLS endpoint on the default TLS port.
    pub fn tls(host: impl Into<String>) -> ServerEndpoint {
        ServerEndpoint::new(host, DEFAULT_TLS_PORT, true)
    }
}

impl FromStr for ServerEndpoint {
    type Err = ConnectError;

    fn from_str(s: &str) -> Result<ServerEndpoint, ConnectError> {
        let (use_tls, rest) = if let Some(rest) = s.strip_prefix("ircs://") {
            (true, rest)
        } else if let Some(rest) = s.strip_prefix("irc://") {
            (false, rest)
        } else if s.contains("://") {
            return Err(ConnectError::InvalidEndpoint(s.to_string()));
        } else {
            (false, s)
        };

        let rest = rest.trim_end_matches('/');
        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| ConnectError::InvalidEndpoint(s.to_string()))?;
                (host, Some(port))
            }
            None => (rest, None),
        };

        if host.is_empty() || host.contains(['/', ' ', '@']) {
            return Err(ConnectError::InvalidEndpoint(s.to_string()));
        }

        let port = port.unwrap_or(if use_tls { DEFAULT_TLS_PORT } else { DEFAULT_PORT });
        Ok(ServerEndpoint::new(host, port, use_tls))
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.use_tls { "ircs" } else { "irc" };
        write!(f, "{}://{}:{}", scheme, self.host, self.port)
    }
}
