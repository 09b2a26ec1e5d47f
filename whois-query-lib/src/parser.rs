//! Raw WHOIS text to [`WhoisRecord`].
//!
//! The orchestrator hands the untouched transport output to a
//! [`RecordParser`]. [`GenericParser`] understands the `key: value` layout
//! most registries use and maps well-known keys onto canonical field names.

use crate::dates::{parse_date, DateOrString};
use crate::error::WhoisQueryError;
use crate::types::{FieldValue, ResolvedDomain, WhoisRecord};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// Turns raw WHOIS text into a record for `domain`.
pub trait RecordParser: Send + Sync {
    fn parse(&self, domain: &ResolvedDomain, text: &str) -> Result<WhoisRecord, WhoisQueryError>;
}

lazy_static! {
    static ref KEY_VALUE: Regex =
        Regex::new(r"^\s*([A-Za-z][A-Za-z0-9 /_.()-]*?)\s*:\s*(.*?)\s*$")
            .expect("key/value pattern is valid");
}

/// Fields that hold dates.
const DATE_FIELDS: &[&str] = &["creation_date", "updated_date", "expiration_date"];

/// Fields that are always emitted as lists.
const LIST_FIELDS: &[&str] = &["name_servers", "status", "emails"];

/// A response line starting with one of these means the registry has no
/// record. Matched after comment markers are stripped, so AFNIC style
/// `%% No entries found` lines still count.
const NOT_FOUND_MARKERS: &[&str] = &[
    "no match for",
    "not found",
    "no data found",
    "no entries found",
    "no matching record",
    "domain not found",
    "object does not exist",
    "the queried object does not exist",
];

/// The not-found marker a response opens a line with, if any.
///
/// Markers inside field values or in the middle of legal notices do not
/// count.
fn not_found_marker(text: &str) -> Option<&'static str> {
    text.lines().find_map(|line| {
        let line = line
            .trim_start_matches(|c: char| c == '%' || c == '#' || c.is_whitespace())
            .to_lowercase();
        NOT_FOUND_MARKERS
            .iter()
            .copied()
            .find(|marker| line.starts_with(marker))
    })
}

/// Map a lowercased response key to its canonical field name.
fn canonical_field(key: &str) -> Option<&'static str> {
    let field = match key {
        "domain name" | "domain" | "domain_name" => "domain_name",
        "registrar" | "registrar name" | "sponsoring registrar" | "registrar organization" => {
            "registrar"
        }
        "registrar whois server" | "whois server" | "whois" => "whois_server",
        "creation date" | "created" | "created on" | "registered" | "registered on"
        | "registration time" | "domain registration date" | "created date" => "creation_date",
        "updated date" | "last updated" | "last-update" | "last modified" | "changed"
        | "modified" | "updated" | "last updated on" => "updated_date",
        "registry expiry date" | "registrar registration expiration date" | "expiration date"
        | "expiry date" | "expires" | "expires on" | "expire date" | "paid-till"
        | "expiration time" | "domain expiration date" => "expiration_date",
        "name server" | "nameserver" | "nameservers" | "nserver" | "name servers" | "dns" => {
            "name_servers"
        }
        "domain status" | "status" | "state" => "status",
        "registrant email" | "admin email" | "tech email" | "registrar abuse contact email"
        | "e-mail" | "email" => "emails",
        "registrant organization" | "registrant organisation" | "org" | "organization"
        | "org-name" => "org",
        "registrant country" | "country" => "country",
        _ => return None,
    };
    Some(field)
}

/// Parser for the common `key: value` response layout.
///
/// Comment lines (`%`, `#`, `>>>`) are skipped. Repeated keys collect into
/// deduplicated lists; name servers compare case-insensitively and are
/// lowercased. Date fields go through [`parse_date`]. When the response
/// carries no domain name, the resolved domain is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericParser;

impl GenericParser {
    pub fn new() -> Self {
        Self
    }
}

impl RecordParser for GenericParser {
    fn parse(&self, domain: &ResolvedDomain, text: &str) -> Result<WhoisRecord, WhoisQueryError> {
        if text.trim().is_empty() {
            return Err(WhoisQueryError::parse(domain.as_str(), "Empty WHOIS response"));
        }

        if let Some(marker) = not_found_marker(text) {
            return Err(WhoisQueryError::parse(
                domain.as_str(),
                format!("No record found (response line starts with '{}')", marker),
            ));
        }

        let mut collected: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();

        for line in text.lines() {
            let trimmed = line.trim_start();
            if trimmed.starts_with('%') || trimmed.starts_with('#') || trimmed.starts_with(">>>")
            {
                continue;
            }

            let Some(caps) = KEY_VALUE.captures(line) else {
                continue;
            };
            let key = caps[1].to_lowercase();
            let value = caps[2].trim();
            if value.is_empty() {
                continue;
            }
            let Some(field) = canonical_field(&key) else {
                continue;
            };

            let value = if field == "name_servers" {
                // "ns1.example.com 192.0.2.1" style lines keep only the host
                value
                    .split_whitespace()
                    .next()
                    .unwrap_or(value)
                    .trim_end_matches('.')
                    .to_lowercase()
            } else {
                value.to_string()
            };

            let values = collected.entry(field).or_default();
            if !values.iter().any(|existing| existing.eq_ignore_ascii_case(&value)) {
                values.push(value);
            }
        }

        let mut record = WhoisRecord::new();
        for (field, mut values) in collected {
            let value = if DATE_FIELDS.contains(&field) {
                // First occurrence is the registry's answer
                match parse_date(&values[0]) {
                    DateOrString::Date(date) => FieldValue::Date(date),
                    DateOrString::Text(text) => FieldValue::Text(text),
                }
            } else if LIST_FIELDS.contains(&field) || values.len() > 1 {
                FieldValue::List(values)
            } else {
                FieldValue::Text(values.remove(0))
            };
            record.insert(field, value);
        }

        if !record.contains("domain_name") {
            record.insert("domain_name", FieldValue::Text(domain.to_string()));
        }

        debug!(domain = %domain, fields = record.len(), "Parsed WHOIS response");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const VERISIGN_STYLE: &str = "   Domain Name: GOOGLE.COM
   Registry Domain ID: 2138514_DOMAIN_COM-VRSN
   Registrar WHOIS Server: whois.markmonitor.com
   Updated Date: 2019-09-09T15:39:04Z
   Creation Date: 1997-09-15T04:00:00Z
   Registry Expiry Date: 2028-09-14T04:00:00Z
   Registrar: MarkMonitor Inc.
   Domain Status: clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited
   Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited
   Name Server: NS1.GOOGLE.COM
   Name Server: NS2.GOOGLE.COM
   Name Server: ns1.google.com
>>> Last update of whois database: 2024-01-01T00:00:00Z <<<
";

    #[test]
    fn test_parses_common_fields() {
        let record = GenericParser
            .parse(&ResolvedDomain::new("google.com"), VERISIGN_STYLE)
            .unwrap();

        assert_eq!(
            record.get("domain_name").and_then(FieldValue::as_text),
            Some("GOOGLE.COM")
        );
        assert_eq!(
            record.get("registrar").and_then(FieldValue::as_text),
            Some("MarkMonitor Inc.")
        );
        assert_eq!(
            record.get("whois_server").and_then(FieldValue::as_text),
            Some("whois.markmonitor.com")
        );
        assert_eq!(
            record.get("creation_date").and_then(FieldValue::as_date),
            Some(&Utc.with_ymd_and_hms(1997, 9, 15, 4, 0, 0).unwrap())
        );
        assert_eq!(
            record.get("expiration_date").and_then(FieldValue::as_date),
            Some(&Utc.with_ymd_and_hms(2028, 9, 14, 4, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_repeated_fields_are_deduplicated_lists() {
        let record = GenericParser
            .parse(&ResolvedDomain::new("google.com"), VERISIGN_STYLE)
            .unwrap();

        assert_eq!(
            record.get("name_servers").and_then(FieldValue::as_list),
            Some(&["ns1.google.com".to_string(), "ns2.google.com".to_string()][..])
        );
        assert_eq!(
            record.get("status").and_then(FieldValue::as_list).map(|s| s.len()),
            Some(2)
        );
    }

    #[test]
    fn test_comment_lines_are_ignored() {
        let text = "% Registry comment: ignored\n# Created: 2000-01-01\ndomain: example.fr\n";
        let record = GenericParser
            .parse(&ResolvedDomain::new("example.fr"), text)
            .unwrap();
        assert!(!record.contains("creation_date"));
        assert_eq!(
            record.get("domain_name").and_then(FieldValue::as_text),
            Some("example.fr")
        );
    }

    #[test]
    fn test_unparseable_date_is_kept_as_text() {
        let text = "Domain Name: example.com\nCreation Date: before the dawn of time\n";
        let record = GenericParser
            .parse(&ResolvedDomain::new("example.com"), text)
            .unwrap();
        assert_eq!(
            record.get("creation_date").and_then(FieldValue::as_text),
            Some("before the dawn of time")
        );
    }

    #[test]
    fn test_domain_name_defaults_to_resolved_domain() {
        let text = "Registrar: Example Registrar\n";
        let record = GenericParser
            .parse(&ResolvedDomain::new("example.net"), text)
            .unwrap();
        assert_eq!(
            record.get("domain_name").and_then(FieldValue::as_text),
            Some("example.net")
        );
    }

    #[test]
    fn test_not_found_is_parse_failure() {
        let err = GenericParser
            .parse(
                &ResolvedDomain::new("unregistered-name.com"),
                "No match for \"UNREGISTERED-NAME.COM\".\n",
            )
            .unwrap_err();

        match err {
            WhoisQueryError::ParseFailure { domain, .. } => {
                assert_eq!(domain, "unregistered-name.com")
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_not_found_wording_inside_record_is_ignored() {
        let text = "Domain Name: example.com
Registrant Organization: Not Found Records Ltd
% Terms: if the object is not found, the registry returns no data.
# Queries for objects that are not found are still logged.
";
        let record = GenericParser
            .parse(&ResolvedDomain::new("example.com"), text)
            .unwrap();
        assert_eq!(
            record.get("org").and_then(FieldValue::as_text),
            Some("Not Found Records Ltd")
        );
    }

    #[test]
    fn test_not_found_line_variants() {
        for text in [
            "NOT FOUND\n",
            "%% No entries found in the AFNIC Database.\n",
            "   Domain not found.\n",
            "The queried object does not exist: example.se\n",
        ] {
            let err = GenericParser
                .parse(&ResolvedDomain::new("example.com"), text)
                .unwrap_err();
            assert!(
                matches!(err, WhoisQueryError::ParseFailure { .. }),
                "expected ParseFailure for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_empty_response_is_parse_failure() {
        let err = GenericParser
            .parse(&ResolvedDomain::new("example.com"), "  \n\n")
            .unwrap_err();
        assert!(matches!(err, WhoisQueryError::ParseFailure { .. }));
    }
}
