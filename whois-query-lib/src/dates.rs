//! Normalization of WHOIS date strings.
//!
//! Registries print dates in dozens of formats. [`parse_date`] tries a fixed
//! list of formats in order and stops at the first one that parses; text
//! matching none of them comes back unchanged.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parsed date, or the original text when no known format matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateOrString {
    Date(DateTime<Utc>),
    Text(String),
}

impl DateOrString {
    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            DateOrString::Date(date) => Some(date),
            DateOrString::Text(_) => None,
        }
    }
}

/// Formats carrying an explicit UTC offset.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z", // 2011-09-08T14:44:51.622265+03:00
    "%Y-%m-%dT%H:%M:%S%z",    // 2013-12-06T08:17:22-0800
    "%Y-%m-%dt%H:%M:%S%.f%z", // 2011-09-08t14:44:51.622265+03:00
    "%Y-%m-%dt%H:%M:%S%z",    // 2011-03-30t19:36:27+0200
    "%Y/%m/%d %H:%M:%S (%z)", // 2011/06/01 01:05:01 (+0900)
    "%Y-%m-%d %H:%M:%S%z",    // 2000-08-22 18:55:20+0000
];

/// Date-time formats without an offset; interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ", // 2018-12-01T16:17:30.568Z
    "%Y-%m-%dT%H:%M:%SZ",    // 2007-01-26T19:10:31Z
    "%Y-%m-%dT%H:%M:%S",     // 2007-01-26T19:10:31
    "%Y-%m-%dt%H:%M:%S%.fz", // 2007-01-26t19:10:31.00z
    "%Y-%m-%dt%H:%M:%Sz",    // 2007-01-26t19:10:31z
    "%Y-%m-%dt%H:%M:%S%.f",  // 2011-09-08t14:44:51.622265
    "%Y-%m-%dt%H:%M:%S",     // 2007-01-26t19:10:31
    "%Y-%m-%d %H:%M:%SZ",    // 2000-08-22 18:55:20Z
    "%Y-%m-%d %H:%M:%S",     // 2000-08-22 18:55:20
    "%Y/%m/%d %H:%M:%S",     // 2011/06/01 01:05:01
    "%Y%m%d %H:%M:%S",       // 20110908 14:44:51
    "%Y.%m.%d %H:%M:%S",     // 2014.03.08 10:28:24
    "%d.%m.%Y %H:%M:%S",     // 08.03.2014 10:28:24
    "%d/%m/%Y %H:%M:%S%.f",  // 23/04/2015 12:00:07.619546
    "%d/%m/%Y %H:%M:%S",     // 23/04/2015 12:00:07
    "%d %b %Y %H:%M:%S",     // 08 Apr 2013 05:44:00
    "%d-%b-%Y %H:%M:%S",     // 24-Jul-2009 13:20:03
    "%a %b %d %H:%M:%S %Y",  // Tue Jun 21 23:59:59 2011
];

/// Date-only formats; midnight UTC.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",    // 2000-01-02
    "%d-%b-%Y",    // 02-jan-2000
    "%d-%B-%Y",    // 11-February-2000
    "%d-%m-%Y",    // 20-10-2000
    "%d.%m.%Y",    // 2.1.2000
    "%Y.%m.%d",    // 2000.01.02
    "%Y/%m/%d",    // 2000/01/02
    "%Y%m%d",      // 20170209
    "%d/%m/%Y",    // 02/01/2013
    "%Y. %m. %d.", // 2000. 01. 02.
    "%B %d %Y",    // August 14 2017
    "%a %b %d %Y", // Tue Dec 12 2000
    "%Y-%b-%d.",   // 2024-Apr-02.
    "before %Y-%m-%d",
    "before %Y%m%d",
];

/// Zone abbreviations stripped before the naive attempts.
const UTC_SUFFIXES: &[&str] = &[" UTC", " GMT", " (UTC)", " (GMT)", "[UTC]"];

/// Convert a WHOIS date string to a UTC date-time.
///
/// ```rust
/// use whois_query_lib::{parse_date, DateOrString};
///
/// assert!(matches!(parse_date("2000-01-02"), DateOrString::Date(_)));
/// assert_eq!(parse_date("unknown"), DateOrString::Text("unknown".to_string()));
/// ```
pub fn parse_date(text: &str) -> DateOrString {
    let trimmed = text.trim();

    parse_rfc3339(trimmed)
        .or_else(|| parse_zoned(trimmed))
        .or_else(|| {
            let bare = strip_utc_suffix(trimmed);
            parse_naive_datetime(bare).or_else(|| parse_naive_date(bare))
        })
        .map(DateOrString::Date)
        .unwrap_or_else(|| DateOrString::Text(trimmed.to_string()))
}

fn parse_rfc3339(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

fn parse_zoned(text: &str) -> Option<DateTime<Utc>> {
    ZONED_FORMATS.iter().find_map(|format| {
        DateTime::parse_from_str(text, format)
            .ok()
            .map(|date| date.with_timezone(&Utc))
    })
}

fn parse_naive_datetime(text: &str) -> Option<DateTime<Utc>> {
    NAIVE_DATETIME_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(text, format)
            .ok()
            .map(|date| date.and_utc())
    })
}

fn parse_naive_date(text: &str) -> Option<DateTime<Utc>> {
    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|date| date.and_utc())
    })
}

fn strip_utc_suffix(text: &str) -> &str {
    UTC_SUFFIXES
        .iter()
        .find_map(|suffix| text.strip_suffix(suffix))
        .map(str::trim_end)
        .unwrap_or(text)
}
