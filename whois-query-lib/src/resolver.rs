//! Registrable domain resolution.
//!
//! Maps a URL, hostname or IP literal to the domain a WHOIS server knows
//! about: the longest matching public suffix plus one more label.

use crate::error::WhoisQueryError;
use crate::suffix::{SuffixSet, SuffixStore};
use crate::types::ResolvedDomain;
use crate::utils::{normalize_hostname, parse_ip_literal};
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Reverse DNS (PTR) lookup for IP literal inputs.
///
/// The resolver only needs the first host name; implementations decide how
/// to get it. Tests substitute fixed answers.
#[allow(async_fn_in_trait)]
pub trait ReverseLookup: Send + Sync {
    /// Return the host name registered for `address`.
    async fn reverse(&self, address: IpAddr) -> Result<String, WhoisQueryError>;
}

/// Shared system resolver, built on first reverse lookup.
static SYSTEM_RESOLVER: OnceCell<Arc<TokioAsyncResolver>> = OnceCell::const_new();

async fn system_resolver() -> Arc<TokioAsyncResolver> {
    SYSTEM_RESOLVER
        .get_or_init(|| async {
            Arc::new(TokioAsyncResolver::tokio(
                ResolverConfig::default(),
                ResolverOpts::default(),
            ))
        })
        .await
        .clone()
}

/// Reverse lookup through hickory-resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemReverseLookup;

impl ReverseLookup for SystemReverseLookup {
    async fn reverse(&self, address: IpAddr) -> Result<String, WhoisQueryError> {
        let resolver = system_resolver().await;
        let lookup = resolver
            .reverse_lookup(address)
            .await
            .map_err(|e| WhoisQueryError::reverse_resolution(address.to_string(), e.to_string()))?;

        lookup
            .iter()
            .next()
            .map(|name| name.to_utf8())
            .ok_or_else(|| {
                WhoisQueryError::reverse_resolution(address.to_string(), "No PTR records returned")
            })
    }
}

/// Resolves inputs to registrable domains.
///
/// The suffix set is loaded from the store on the first resolution, not at
/// construction.
pub struct DomainResolver<R = SystemReverseLookup> {
    store: Arc<SuffixStore>,
    reverse: R,
    timeout: Duration,
}

impl DomainResolver<SystemReverseLookup> {
    /// Resolver over the bundled suffix list and the system DNS resolver.
    pub fn new() -> Self {
        Self::with_store(SuffixStore::global())
    }

    /// Resolver over a specific suffix store.
    pub fn with_store(store: Arc<SuffixStore>) -> Self {
        Self::with_reverse_lookup(store, SystemReverseLookup)
    }
}

impl Default for DomainResolver<SystemReverseLookup> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ReverseLookup> DomainResolver<R> {
    pub fn with_reverse_lookup(store: Arc<SuffixStore>, reverse: R) -> Self {
        Self {
            store,
            reverse,
            timeout: Duration::from_secs(10),
        }
    }

    /// Bound reverse lookups by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve a URL, hostname or IP literal.
    ///
    /// IP literals are reverse-resolved first. When that fails (or times
    /// out) the literal itself is returned, without suffix matching.
    ///
    /// # Errors
    ///
    /// `ResourceUnavailable` if the suffix list cannot be loaded,
    /// `InvalidDomain` for input that normalizes to nothing.
    pub async fn resolve(&self, input: &str) -> Result<ResolvedDomain, WhoisQueryError> {
        let Some(address) = parse_ip_literal(input) else {
            return self.resolve_hostname(input);
        };

        match tokio::time::timeout(self.timeout, self.reverse.reverse(address)).await {
            Ok(Ok(hostname)) => {
                debug!(%address, %hostname, "Reverse lookup succeeded");
                self.resolve_hostname(&hostname)
            }
            Ok(Err(e)) => {
                warn!(%address, error = %e, "Reverse lookup failed, querying the address itself");
                Ok(ResolvedDomain::ip_literal(input.trim()))
            }
            Err(_) => {
                warn!(%address, timeout = ?self.timeout, "Reverse lookup timed out, querying the address itself");
                Ok(ResolvedDomain::ip_literal(input.trim()))
            }
        }
    }

    /// Resolve a URL or hostname without the IP literal handling.
    pub fn resolve_hostname(&self, input: &str) -> Result<ResolvedDomain, WhoisQueryError> {
        let hostname = normalize_hostname(input);
        if hostname.is_empty() {
            return Err(WhoisQueryError::invalid_domain(input, "No host name in input"));
        }
        if hostname.split('.').any(str::is_empty) {
            return Err(WhoisQueryError::invalid_domain(input, "Host name has an empty label"));
        }

        let suffixes = self.store.load()?;
        let domain = registrable_domain(&hostname, &suffixes);
        debug!(input, %hostname, %domain, "Resolved registrable domain");

        Ok(ResolvedDomain::new(domain))
    }
}

/// Longest-suffix match of a normalized `hostname` against `suffixes`.
///
/// Labels are added from the right while the accumulated tail is a known
/// suffix. The first label that makes the tail unknown is kept and the walk
/// stops. One exception: if the rightmost label alone is unknown, the last
/// two labels are tried together before giving up. Only two labels are
/// looked at, never a longer tail.
///
/// ```rust
/// use whois_query_lib::{registrable_domain, SuffixSet};
///
/// let suffixes = SuffixSet::parse("com\nau\ncom.au\n");
/// assert_eq!(registrable_domain("www.google.com.au", &suffixes), "google.com.au");
/// assert_eq!(registrable_domain("abc.def.com", &suffixes), "def.com");
/// ```
pub fn registrable_domain(hostname: &str, suffixes: &SuffixSet) -> String {
    let labels: Vec<&str> = hostname.split('.').collect();
    let last = labels.len() - 1;
    let mut start = labels.len();

    while start > 0 {
        start -= 1;
        let candidate = labels[start..].join(".");
        if suffixes.contains_str(&candidate) {
            continue;
        }

        // Unknown TLD: a listed two-label suffix still lets the walk go on
        if start == last && labels.len() >= 2 {
            let second_order = labels[last - 1..].join(".");
            if suffixes.contains_str(&second_order) {
                continue;
            }
        }
        break;
    }

    labels[start..].join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suffix::SuffixSource;

    fn suffixes(list: &str) -> SuffixSet {
        SuffixSet::parse(list)
    }

    fn bundled() -> Arc<SuffixSet> {
        SuffixStore::global().load().unwrap()
    }

    /// Reverse lookup with a fixed answer per address family.
    struct FixedReverse {
        v4: Option<&'static str>,
        v6: Option<&'static str>,
    }

    impl ReverseLookup for FixedReverse {
        async fn reverse(&self, address: IpAddr) -> Result<String, WhoisQueryError> {
            let answer = match address {
                IpAddr::V4(_) => self.v4,
                IpAddr::V6(_) => self.v6,
            };
            answer
                .map(str::to_string)
                .ok_or_else(|| WhoisQueryError::reverse_resolution(address.to_string(), "NXDOMAIN"))
        }
    }

    /// Reverse lookup that never answers.
    struct HangingReverse;

    impl ReverseLookup for HangingReverse {
        async fn reverse(&self, _address: IpAddr) -> Result<String, WhoisQueryError> {
            std::future::pending().await
        }
    }

    fn resolver_with(reverse: FixedReverse) -> DomainResolver<FixedReverse> {
        DomainResolver::with_reverse_lookup(SuffixStore::global(), reverse)
    }

    #[test]
    fn test_known_domains() {
        let set = bundled();
        assert_eq!(registrable_domain("www.google.com.au", &set), "google.com.au");
        assert_eq!(registrable_domain("abc.def.com", &set), "def.com");
        assert_eq!(registrable_domain("chambagri.fr", &set), "chambagri.fr");
        assert_eq!(registrable_domain("www.webscraping.com", &set), "webscraping.com");
        assert_eq!(registrable_domain("102.112.2o7.net", &set), "2o7.net");
        assert_eq!(registrable_domain("globoesporte.globo.com", &set), "globo.com");
        assert_eq!(registrable_domain("news.bbc.co.uk", &set), "bbc.co.uk");
    }

    #[test]
    fn test_bundled_list_covers_every_tld() {
        let set = bundled();
        assert_eq!(registrable_domain("www.example.ai", &set), "example.ai");
        assert_eq!(registrable_domain("shop.example.top", &set), "example.top");
        assert_eq!(registrable_domain("www.bit.ly", &set), "bit.ly");
        assert_eq!(registrable_domain("a.b.example.club", &set), "example.club");
        assert_eq!(registrable_domain("www.example.gg", &set), "example.gg");
    }

    #[test]
    fn test_bundled_list_includes_private_section() {
        let set = bundled();
        assert!(set.contains_str("github.io"));
        assert_eq!(
            registrable_domain("docs.octocat.github.io", &set),
            "octocat.github.io"
        );
    }

    #[test]
    fn test_many_numeric_labels_under_info() {
        let set = bundled();
        let host = "1-0-1-1-1-0-1-1-1-1-1-1-1-.0-0-0-0-0-0-0-0-0-0-0-0-0-10-0-0-0-0-0-0-0-0-0-0-0-0-0.info";
        assert_eq!(
            registrable_domain(host, &set),
            "0-0-0-0-0-0-0-0-0-0-0-0-0-10-0-0-0-0-0-0-0-0-0-0-0-0-0.info"
        );
    }

    #[test]
    fn test_multi_label_suffix_adds_exactly_one_label() {
        let set = suffixes("uk\nco.uk\nexample\nsub.example\ndeep.sub.example\n");
        for prefix in ["", "a.", "a.b.", "a.b.c.d."] {
            assert_eq!(
                registrable_domain(&format!("{}shop.co.uk", prefix), &set),
                "shop.co.uk"
            );
            assert_eq!(
                registrable_domain(&format!("{}shop.deep.sub.example", prefix), &set),
                "shop.deep.sub.example"
            );
        }
    }

    #[test]
    fn test_second_order_lookahead_recovers_domain() {
        // "bar" is not listed but "foo.bar" is
        let set = suffixes("com\nfoo.bar\n");
        assert_eq!(registrable_domain("x.y.name.foo.bar", &set), "name.foo.bar");
        assert_eq!(registrable_domain("name.foo.bar", &set), "name.foo.bar");
    }

    #[test]
    fn test_lookahead_only_inspects_two_labels() {
        // A three-label suffix behind an unlisted TLD is not found
        let set = suffixes("a.b.zz\n");
        assert_eq!(registrable_domain("www.site.a.b.zz", &set), "zz");
    }

    #[test]
    fn test_unknown_tld_stops_at_tld() {
        let set = suffixes("com\n");
        assert_eq!(registrable_domain("www.example.unknowntld", &set), "unknowntld");
    }

    #[test]
    fn test_single_label_is_unchanged() {
        let set = bundled();
        assert_eq!(registrable_domain("com", &set), "com");
        assert_eq!(registrable_domain("localhost", &set), "localhost");
    }

    #[test]
    fn test_whole_hostname_when_every_tail_is_a_suffix() {
        let set = suffixes("uk\nco.uk\n");
        assert_eq!(registrable_domain("co.uk", &set), "co.uk");
    }

    #[test]
    fn test_internationalized_labels_compare_as_bytes() {
        let set = suffixes("hk\ncom.hk\n");
        assert_eq!(registrable_domain("www.例子.hk", &set), "例子.hk");

        // A punycode entry does not match the Unicode label
        let set = suffixes("xn--55qx5d.hk\n");
        assert_eq!(registrable_domain("www.公司.hk", &set), "hk");
    }

    #[tokio::test]
    async fn test_resolve_strips_scheme_and_path() {
        let resolver = resolver_with(FixedReverse { v4: None, v6: None });
        let domain = resolver.resolve("http://www.google.com.au/tos.html").await.unwrap();
        assert_eq!(domain.as_str(), "google.com.au");

        let domain = resolver.resolve("www.google.com.au/tos.html").await.unwrap();
        assert_eq!(domain.as_str(), "google.com.au");

        let domain = resolver.resolve("102.112.2O7.net").await.unwrap();
        assert_eq!(domain.as_str(), "2o7.net");
    }

    #[tokio::test]
    async fn test_resolve_reverse_resolves_ip_literals() {
        let resolver = resolver_with(FixedReverse {
            v4: Some("lga25s62-in-f14.1e100.net."),
            v6: Some("lga25s62-in-x0e.1e100.net"),
        });

        let v4 = resolver.resolve("172.217.3.110").await.unwrap();
        assert_eq!(v4.as_str(), "1e100.net");
        assert!(!v4.is_ip_literal());

        let v6 = resolver.resolve("2607:f8b0:4006:802::200e").await.unwrap();
        assert_eq!(v6.as_str(), "1e100.net");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_ip_literal() {
        let resolver = resolver_with(FixedReverse { v4: None, v6: None });

        let domain = resolver.resolve("198.51.100.7").await.unwrap();
        assert_eq!(domain.as_str(), "198.51.100.7");
        assert!(domain.is_ip_literal());
    }

    #[tokio::test]
    async fn test_resolve_reverse_timeout_falls_back() {
        let resolver = DomainResolver::with_reverse_lookup(SuffixStore::global(), HangingReverse)
            .with_timeout(Duration::from_millis(50));

        let domain = resolver.resolve("203.0.113.9").await.unwrap();
        assert_eq!(domain, ResolvedDomain::ip_literal("203.0.113.9"));
    }

    #[tokio::test]
    async fn test_resolve_empty_input_is_invalid() {
        let resolver = resolver_with(FixedReverse { v4: None, v6: None });
        assert!(matches!(
            resolver.resolve("   ").await,
            Err(WhoisQueryError::InvalidDomain { .. })
        ));
        assert!(matches!(
            resolver.resolve("https:///path").await,
            Err(WhoisQueryError::InvalidDomain { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_empty_label_is_invalid() {
        let resolver = resolver_with(FixedReverse { v4: None, v6: None });
        for input in [".", "..", "example..com", ".example.com", "http://a..b/"] {
            assert!(
                matches!(
                    resolver.resolve(input).await,
                    Err(WhoisQueryError::InvalidDomain { .. })
                ),
                "expected InvalidDomain for {:?}",
                input
            );
        }
    }

    #[tokio::test]
    async fn test_resolve_with_unreadable_store_fails() {
        let store = Arc::new(SuffixStore::new(SuffixSource::File(
            "/nonexistent/suffixes.dat".into(),
        )));
        let resolver = DomainResolver::with_reverse_lookup(store, FixedReverse { v4: None, v6: None });
        assert!(matches!(
            resolver.resolve("example.com").await,
            Err(WhoisQueryError::ResourceUnavailable { .. })
        ));
    }
}
