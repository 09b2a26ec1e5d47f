//! WHOIS transports.
//!
//! A transport turns a resolved domain into raw WHOIS text. Two
//! implementations ship with the library: [`NativeExecutable`] runs an
//! external `whois` program and [`SocketClient`] talks to port 43 directly.

/// External `whois` program transport
pub mod native;

/// Direct TCP (port 43) transport
pub mod socket;

pub use native::NativeExecutable;
pub use socket::{flags, parse_iana_refer_response, SocketClient};

use crate::error::WhoisQueryError;
use crate::types::{QueryOptions, ResolvedDomain, TransportKind};

/// Anything that can fetch raw WHOIS text for a domain.
///
/// The orchestrator only depends on this trait, so a test double can stand
/// in for either real transport.
#[allow(async_fn_in_trait)]
pub trait WhoisTransport: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Fetch the raw response for `domain`.
    async fn query(&self, domain: &ResolvedDomain) -> Result<String, WhoisQueryError>;
}

/// The transport picked from [`QueryOptions`].
///
/// There is no fallback between variants: whichever is selected either
/// answers or its error reaches the caller.
#[derive(Debug, Clone)]
pub enum Transport {
    Native(NativeExecutable),
    Socket(SocketClient),
}

impl Transport {
    /// Build the transport selected by `options.use_native_executable`.
    pub fn from_options(options: &QueryOptions) -> Self {
        match options.transport_kind() {
            TransportKind::Native => {
                Transport::Native(NativeExecutable::with_executable(&options.executable))
            }
            TransportKind::Socket => {
                let mut client = SocketClient::new()
                    .with_flags(options.flags)
                    .with_quiet(options.quiet)
                    .with_timeout(options.timeout);
                if let Some(server) = &options.server {
                    client = client.with_server(server);
                }
                Transport::Socket(client)
            }
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            Transport::Native(_) => TransportKind::Native,
            Transport::Socket(_) => TransportKind::Socket,
        }
    }
}

impl WhoisTransport for Transport {
    fn name(&self) -> &'static str {
        match self {
            Transport::Native(native) => native.name(),
            Transport::Socket(socket) => socket.name(),
        }
    }

    async fn query(&self, domain: &ResolvedDomain) -> Result<String, WhoisQueryError> {
        match self {
            Transport::Native(native) => native.query(domain).await,
            Transport::Socket(socket) => socket.query(domain).await,
        }
    }
}
