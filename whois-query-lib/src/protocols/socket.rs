//! Direct socket WHOIS transport.
//!
//! Speaks the plain WHOIS protocol: connect to port 43, send the query
//! followed by CRLF, read until the server closes the connection.
//!
//! When no server is configured, the authoritative server is discovered by
//! asking `whois.iana.org` about the TLD (or about the address, for IP
//! literals). Unless [`flags::QUICK`] is set, one registrar referral found in
//! the response is followed and its answer appended.

use super::WhoisTransport;
use crate::error::WhoisQueryError;
use crate::types::ResolvedDomain;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Well-known WHOIS port.
pub const WHOIS_PORT: u16 = 43;

/// Server asked for TLD referrals.
pub const IANA_WHOIS_SERVER: &str = "whois.iana.org";

/// Flag bits accepted by [`SocketClient`].
pub mod flags {
    /// Follow registrar referrals. This is already the default; the bit is
    /// accepted so callers can pass it explicitly.
    pub const RECURSE: u32 = 0x01;

    /// Return the first server's answer without following referrals.
    pub const QUICK: u32 = 0x02;
}

/// Response keys that name a more specific WHOIS server.
const REFERRAL_KEYS: &[&str] = &[
    "registrar whois server:",
    "whois server:",
    "referralserver:",
];

/// WHOIS client over a raw TCP connection.
#[derive(Debug, Clone)]
pub struct SocketClient {
    /// Fixed server; skips IANA discovery when set
    server: Option<String>,
    /// Referral source for discovery
    iana_server: String,
    /// Port used when a server name carries none
    port: u16,
    /// [`flags`] bits
    flags: u32,
    /// Log connection failures at debug instead of warn
    quiet: bool,
    /// Budget for each connection
    timeout: Duration,
}

impl SocketClient {
    /// Create a client with default settings.
    pub fn new() -> Self {
        Self {
            server: None,
            iana_server: IANA_WHOIS_SERVER.to_string(),
            port: WHOIS_PORT,
            flags: 0,
            quiet: false,
            timeout: Duration::from_secs(10),
        }
    }

    /// Always query `server` (`host` or `host:port`).
    pub fn with_server<S: Into<String>>(mut self, server: S) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Ask `server` instead of `whois.iana.org` during discovery.
    pub fn with_iana_server<S: Into<String>>(mut self, server: S) -> Self {
        self.iana_server = server.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Look up `query` (already ASCII) and return the raw response.
    ///
    /// `server` overrides the configured server for this call only.
    /// `discovery_key` is what IANA is asked about when no server is known.
    pub async fn whois_lookup(
        &self,
        server: Option<&str>,
        query: &str,
        discovery_key: &str,
    ) -> Result<String, WhoisQueryError> {
        let server = match server.or(self.server.as_deref()) {
            Some(server) => server.to_string(),
            None => self.discover_server(query, discovery_key).await?,
        };

        let response = self.raw_query(&server, query).await?;

        if self.flags & flags::QUICK != 0 {
            return Ok(response);
        }

        match find_referral(&response) {
            Some(referral) if !referral.eq_ignore_ascii_case(&server) => {
                debug!(%server, %referral, "Following WHOIS referral");
                match self.raw_query(&referral, query).await {
                    Ok(referred) => Ok(format!("{}\n{}", response, referred)),
                    Err(e) => {
                        // The first answer is still a usable response
                        self.log_failure(&referral, &e);
                        Ok(response)
                    }
                }
            }
            _ => Ok(response),
        }
    }

    /// Ask the IANA server which WHOIS server is authoritative.
    async fn discover_server(&self, query: &str, key: &str) -> Result<String, WhoisQueryError> {
        let response = self.raw_query(&self.iana_server, key).await?;
        parse_iana_refer_response(&response).ok_or_else(|| {
            WhoisQueryError::transport(
                self.name(),
                query,
                format!("No WHOIS server known for '{}'", key),
            )
        })
    }

    /// One request/response exchange with `server`.
    async fn raw_query(&self, server: &str, query: &str) -> Result<String, WhoisQueryError> {
        let (host, port) = split_server_address(server, self.port);
        debug!(%host, port, query, "Connecting to WHOIS server");

        let exchange = async {
            let mut stream = TcpStream::connect((host, port)).await?;
            stream.write_all(format!("{}\r\n", query).as_bytes()).await?;

            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).await?;
            Ok::<_, std::io::Error>(buf)
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(buf)) => Ok(String::from_utf8_lossy(&buf).into_owned()),
            Ok(Err(e)) => {
                let err = WhoisQueryError::transport(
                    self.name(),
                    query,
                    format!("{}:{}: {}", host, port, e),
                );
                self.log_failure(server, &err);
                Err(err)
            }
            Err(_) => Err(WhoisQueryError::timeout(
                format!("WHOIS query to {}:{}", host, port),
                self.timeout,
            )),
        }
    }

    fn log_failure(&self, server: &str, err: &WhoisQueryError) {
        if self.quiet {
            debug!(%server, error = %err, "WHOIS connection failed");
        } else {
            warn!(%server, error = %err, "WHOIS connection failed");
        }
    }
}

impl Default for SocketClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WhoisTransport for SocketClient {
    fn name(&self) -> &'static str {
        "socket"
    }

    async fn query(&self, domain: &ResolvedDomain) -> Result<String, WhoisQueryError> {
        let query = domain.to_ascii()?;
        let discovery_key = if domain.is_ip_literal() {
            query.clone()
        } else {
            query.rsplit('.').next().unwrap_or(&query).to_string()
        };

        info!(domain = %domain, query = %query, "Querying WHOIS via socket");
        self.whois_lookup(None, &query, &discovery_key).await
    }
}

/// Split `host:port`, keeping bare hosts and IPv6 literals on `default_port`.
fn split_server_address(server: &str, default_port: u16) -> (&str, u16) {
    if let Some((host, port)) = server.rsplit_once(':') {
        if !host.contains(':') {
            if let Ok(port) = port.parse::<u16>() {
                return (host, port);
            }
        }
    }
    (server, default_port)
}

/// Find a referral to another WHOIS server in a response.
fn find_referral(response: &str) -> Option<String> {
    response.lines().find_map(|line| {
        let line = line.trim();
        let lower = line.to_ascii_lowercase();
        REFERRAL_KEYS.iter().find_map(|key| {
            if !lower.starts_with(key) {
                return None;
            }
            let value = line[key.len()..].trim();
            let value = value.strip_prefix("whois://").unwrap_or(value);
            let value = value.trim_end_matches('/');
            // rwhois and http referrals are not WHOIS servers
            if value.is_empty() || value.contains("://") {
                None
            } else {
                Some(value.to_string())
            }
        })
    })
}

/// Parse an IANA WHOIS response for the authoritative WHOIS server.
///
/// The IANA WHOIS response may use either `refer:` or `whois:` to indicate
/// the authoritative WHOIS server for a TLD. We check both fields, preferring
/// `refer:` when present.
///
/// ```text
/// whois:        whois.verisign-grs.com
/// refer:        whois.verisign-grs.com
/// ```
pub fn parse_iana_refer_response(response: &str) -> Option<String> {
    let mut whois_server = None;

    for line in response.lines() {
        let line_trimmed = line.trim();
        if let Some(server) = line_trimmed.strip_prefix("refer:") {
            let server = server.trim();
            if !server.is_empty() {
                return Some(server.to_string());
            }
        } else if let Some(server) = line_trimmed.strip_prefix("whois:") {
            let server = server.trim();
            if !server.is_empty() {
                whois_server = Some(server.to_string());
            }
        }
    }

    whois_server
}
