//! Utility functions for input normalization.
//!
//! Turns arbitrary user input (URLs, bare hosts, IP literals) into the
//! shapes the resolver works on.

use regex::Regex;
use std::net::IpAddr;

lazy_static::lazy_static! {
    // Greedy: everything up to the last "://" is treated as scheme.
    static ref SCHEME_PREFIX: Regex = Regex::new("^.*://").expect("scheme pattern is valid");
}

/// Parse `input` as an IPv4 or IPv6 literal.
///
/// Surrounding whitespace and IPv6 brackets (`[::1]`) are accepted.
pub fn parse_ip_literal(input: &str) -> Option<IpAddr> {
    let trimmed = input.trim();
    let unbracketed = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    unbracketed.parse::<IpAddr>().ok()
}

/// Reduce a URL or host to a lowercase hostname.
///
/// Strips any `scheme://` prefix, drops everything from the first `/`, and
/// lowercases the rest. A single trailing root dot is removed.
///
/// ```rust
/// use whois_query_lib::normalize_hostname;
///
/// assert_eq!(normalize_hostname("http://www.Google.com.au/tos.html"), "www.google.com.au");
/// assert_eq!(normalize_hostname("example.com."), "example.com");
/// ```
pub fn normalize_hostname(input: &str) -> String {
    let without_scheme = SCHEME_PREFIX.replace(input.trim(), "");
    let host = without_scheme.split('/').next().unwrap_or_default();
    let host = host.to_lowercase();

    match host.strip_suffix('.') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => host,
    }
}

/// Parse a boolean flag value the way the environment variables accept it.
pub(crate) fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ip_literal() {
        assert!(parse_ip_literal("198.252.206.140").is_some());
        assert!(parse_ip_literal("2607:f8b0:4006:802::200e").is_some());
        assert!(parse_ip_literal(" [::1] ").is_some());

        assert!(parse_ip_literal("102.112.2O7.net").is_none());
        assert!(parse_ip_literal("example.com").is_none());
        assert!(parse_ip_literal("").is_none());
    }

    #[test]
    fn test_normalize_hostname_strips_scheme_and_path() {
        assert_eq!(
            normalize_hostname("http://www.google.com.au/tos.html"),
            "www.google.com.au"
        );
        assert_eq!(normalize_hostname("www.google.com.au/tos.html"), "www.google.com.au");
        assert_eq!(normalize_hostname("HTTPS://Example.COM/"), "example.com");
        assert_eq!(normalize_hostname("ftp://files.example.org"), "files.example.org");
    }

    #[test]
    fn test_normalize_hostname_scheme_is_greedy() {
        // Only the text after the last "://" survives
        assert_eq!(
            normalize_hostname("view-source:http://example.com/index"),
            "example.com"
        );
    }

    #[test]
    fn test_normalize_hostname_trailing_dot() {
        assert_eq!(normalize_hostname("example.com."), "example.com");
        assert_eq!(normalize_hostname("."), ".");
    }

    #[test]
    fn test_normalize_hostname_keeps_unicode() {
        assert_eq!(normalize_hostname("www.公司.HK"), "www.公司.hk");
    }

    #[test]
    fn test_parse_bool_flag() {
        assert_eq!(parse_bool_flag("true"), Some(true));
        assert_eq!(parse_bool_flag("YES"), Some(true));
        assert_eq!(parse_bool_flag("0"), Some(false));
        assert_eq!(parse_bool_flag("off"), Some(false));
        assert_eq!(parse_bool_flag("maybe"), None);
    }
}
