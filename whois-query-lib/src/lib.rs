//! # WHOIS Query Library
//!
//! Resolves URLs, hostnames and IP addresses to their registrable domain
//! using the public suffix list, queries WHOIS for that domain and parses
//! the response into a JSON-serializable record.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whois_query_lib::{whois, QueryOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let record = whois("https://www.google.com.au/tos.html", QueryOptions::default()).await?;
//!
//!     println!("{}", record.to_json_pretty()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Suffix-aware resolution**: `www.google.com.au` becomes `google.com.au`
//! - **IP literals**: reverse DNS first, the address itself as a fallback
//! - **Two transports**: an external `whois` program or a direct port 43 client
//! - **Date normalization**: registry date formats become UTC timestamps
//! - **Configurable**: TOML files and `WQ_*` environment variables

// Re-export main public API types and functions
// This makes them available as whois_query_lib::TypeName
pub use config::{
    load_env_config, load_env_config_from, parse_flags, parse_timeout_string, ConfigManager,
    DefaultsConfig, EnvConfig, FileConfig,
};
pub use dates::{parse_date, DateOrString};
pub use error::WhoisQueryError;
pub use parser::{GenericParser, RecordParser};
pub use protocols::{
    flags, parse_iana_refer_response, NativeExecutable, SocketClient, Transport, WhoisTransport,
};
pub use query::{whois, WhoisQuery};
pub use resolver::{registrable_domain, DomainResolver, ReverseLookup, SystemReverseLookup};
pub use suffix::{SuffixSet, SuffixSource, SuffixStore};
pub use types::{
    FieldValue, QueryOptions, ResolvedDomain, TransportKind, WhoisRecord, RAW_FIELD,
};
pub use utils::{normalize_hostname, parse_ip_literal};

// Internal modules - these are not part of the public API
mod config;
mod dates;
mod error;
mod parser;
mod protocols;
mod query;
mod resolver;
mod suffix;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, WhoisQueryError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
