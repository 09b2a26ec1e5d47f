//! Core data types for WHOIS queries.
//!
//! This module defines the resolved domain handed to transports, the parsed
//! record handed back to callers, and the options that drive a query.

use crate::error::WhoisQueryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Reserved record field that carries the raw response text.
pub const RAW_FIELD: &str = "raw";

/// Registrable domain produced by the resolver.
///
/// Either the public suffix plus one label (`google.com.au`), the whole
/// hostname when nothing matched, or an IP literal whose reverse lookup
/// failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedDomain {
    name: String,
    ip_literal: bool,
}

impl ResolvedDomain {
    /// A domain produced by suffix matching.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ip_literal: false,
        }
    }

    /// An IP literal kept verbatim because reverse resolution failed.
    pub fn ip_literal<S: Into<String>>(address: S) -> Self {
        Self {
            name: address.into(),
            ip_literal: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn is_ip_literal(&self) -> bool {
        self.ip_literal
    }

    /// Labels from left to right (`["google", "com", "au"]`).
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.name.split('.')
    }

    /// The rightmost label, used to pick a WHOIS server.
    pub fn tld(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// IDNA (punycode) form for transports that need ASCII on the wire.
    ///
    /// IP literals are returned unchanged.
    pub fn to_ascii(&self) -> Result<String, WhoisQueryError> {
        if self.ip_literal || self.name.is_ascii() {
            return Ok(self.name.clone());
        }
        idna::domain_to_ascii(&self.name).map_err(|e| {
            WhoisQueryError::invalid_domain(&self.name, format!("IDNA encoding failed: {:?}", e))
        })
    }
}

impl std::fmt::Display for ResolvedDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for ResolvedDomain {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// One value in a [`WhoisRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A normalized date (serialized as RFC 3339)
    Date(DateTime<Utc>),
    /// A single text value
    Text(String),
    /// A repeated field, e.g. name servers
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            FieldValue::Date(date) => Some(date),
            _ => None,
        }
    }
}

/// Parsed WHOIS record keyed by field name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhoisRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl WhoisRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn insert<K: Into<String>>(&mut self, field: K, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(field.into(), value)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// The raw response, when the query asked for it.
    pub fn raw(&self) -> Option<&str> {
        self.get(RAW_FIELD).and_then(FieldValue::as_text)
    }

    /// Serialize the record as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, WhoisQueryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Which transport carries the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportKind {
    /// External `whois` program
    #[serde(rename = "native")]
    Native,
    /// Direct TCP connection to port 43
    #[serde(rename = "socket")]
    Socket,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Native => write!(f, "native"),
            TransportKind::Socket => write!(f, "socket"),
        }
    }
}

/// Options for a single WHOIS query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Run the external executable instead of the socket client
    /// Default: false
    pub use_native_executable: bool,

    /// Socket client flag bits (see [`crate::flags`])
    /// Default: 0
    pub flags: u32,

    /// Program spawned by the native transport
    /// Default: "whois"
    pub executable: String,

    /// Attach the raw response under the `raw` field
    /// Default: false
    pub include_raw: bool,

    /// Silence connection warnings from the socket client
    /// Default: false
    pub quiet: bool,

    /// Budget for the reverse lookup and for the transport, each
    /// Default: 10 seconds
    pub timeout: Duration,

    /// Fixed WHOIS server for the socket client (skips IANA discovery)
    pub server: Option<String>,

    /// Suffix list file replacing the bundled list
    pub suffix_list: Option<PathBuf>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            use_native_executable: false,
            flags: 0,
            executable: "whois".to_string(),
            include_raw: false,
            quiet: false,
            timeout: Duration::from_secs(10),
            server: None,
            suffix_list: None,
        }
    }
}

impl QueryOptions {
    /// Select the native executable transport.
    pub fn with_native_executable(mut self, enabled: bool) -> Self {
        self.use_native_executable = enabled;
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_executable<S: Into<String>>(mut self, executable: S) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_raw(mut self, include_raw: bool) -> Self {
        self.include_raw = include_raw;
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

    pub fn with_server<S: Into<String>>(mut self, server: S) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn with_suffix_list<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.suffix_list = Some(path.into());
        self
    }

    /// The transport these options select.
    pub fn transport_kind(&self) -> TransportKind {
        if self.use_native_executable {
            TransportKind::Native
        } else {
            TransportKind::Socket
        }
    }
}
