//! Query orchestration.
//!
//! [`WhoisQuery`] is the main entry point of the library. A query runs in
//! three steps: resolve the input to a registrable domain, fetch raw WHOIS
//! text through the selected transport, and hand that text unmodified to a
//! [`RecordParser`].

use crate::error::WhoisQueryError;
use crate::parser::{GenericParser, RecordParser};
use crate::protocols::{Transport, WhoisTransport};
use crate::resolver::{DomainResolver, ReverseLookup, SystemReverseLookup};
use crate::suffix::{SuffixSource, SuffixStore};
use crate::types::{FieldValue, QueryOptions, ResolvedDomain, WhoisRecord, RAW_FIELD};
use std::sync::Arc;
use tracing::{debug, info};

/// Runs WHOIS queries with a fixed set of options.
///
/// ```rust,no_run
/// use whois_query_lib::{QueryOptions, WhoisQuery};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let query = WhoisQuery::new(QueryOptions::default().with_raw(true));
///     let record = query.run("https://www.google.com.au/tos.html").await?;
///     println!("{}", record.to_json_pretty()?);
///     Ok(())
/// }
/// ```
pub struct WhoisQuery<R = SystemReverseLookup, P = GenericParser> {
    options: QueryOptions,
    resolver: DomainResolver<R>,
    parser: P,
}

impl WhoisQuery<SystemReverseLookup, GenericParser> {
    /// Create a query runner.
    ///
    /// Uses the process-wide bundled suffix list unless
    /// `options.suffix_list` names a file, in which case that file gets its
    /// own store.
    pub fn new(options: QueryOptions) -> Self {
        let store = match &options.suffix_list {
            Some(path) => Arc::new(SuffixStore::new(SuffixSource::File(path.clone()))),
            None => SuffixStore::global(),
        };
        let resolver = DomainResolver::with_store(store).with_timeout(options.timeout);

        Self {
            options,
            resolver,
            parser: GenericParser,
        }
    }
}

impl Default for WhoisQuery<SystemReverseLookup, GenericParser> {
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}

impl<R: ReverseLookup, P: RecordParser> WhoisQuery<R, P> {
    /// Assemble a runner from explicit parts.
    pub fn with_parts(options: QueryOptions, resolver: DomainResolver<R>, parser: P) -> Self {
        Self {
            options,
            resolver,
            parser,
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Resolve `input` without querying anything.
    pub async fn resolve(&self, input: &str) -> Result<ResolvedDomain, WhoisQueryError> {
        self.resolver.resolve(input).await
    }

    /// Resolve `input` and query it through the transport the options select.
    pub async fn run(&self, input: &str) -> Result<WhoisRecord, WhoisQueryError> {
        let transport = Transport::from_options(&self.options);
        self.run_with(input, &transport).await
    }

    /// Resolve `input` and query it through `transport`.
    ///
    /// # Errors
    ///
    /// Resolution errors pass through. The transport call is bounded by the
    /// configured timeout and fails with `Timeout` when it elapses. Parser
    /// errors pass through. Nothing is retried.
    pub async fn run_with<T: WhoisTransport>(
        &self,
        input: &str,
        transport: &T,
    ) -> Result<WhoisRecord, WhoisQueryError> {
        let domain = self.resolver.resolve(input).await?;
        info!(input, domain = %domain, transport = transport.name(), "Running WHOIS query");

        let raw = match tokio::time::timeout(self.options.timeout, transport.query(&domain)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(WhoisQueryError::timeout(
                    format!("{} query for '{}'", transport.name(), domain),
                    self.options.timeout,
                ))
            }
        };
        debug!(domain = %domain, bytes = raw.len(), "Received WHOIS response");

        let mut record = self.parser.parse(&domain, &raw)?;
        if self.options.include_raw {
            record.insert(RAW_FIELD, FieldValue::Text(raw));
        }
        Ok(record)
    }
}

/// Query WHOIS for `url` with `options`.
///
/// Convenience wrapper around [`WhoisQuery::run`].
pub async fn whois(url: &str, options: QueryOptions) -> Result<WhoisRecord, WhoisQueryError> {
    WhoisQuery::new(options).run(url).await
}
