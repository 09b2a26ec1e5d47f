//! Error handling for WHOIS query operations.
//!
//! This module defines one error type that covers every stage of a lookup:
//! loading the suffix list, resolving the registrable domain, running the
//! selected transport and parsing the response.

use std::fmt;

/// Main error type for WHOIS query operations.
///
/// Transport and parser failures carry the domain (and transport name) they
/// happened for, so a caller can diagnose them without retrying.
#[derive(Debug, Clone)]
pub enum WhoisQueryError {
    /// The public suffix data source is missing, unreadable or empty.
    ResourceUnavailable {
        resource: String,
        message: String,
    },

    /// Reverse DNS for an IP literal failed. The resolver absorbs this and
    /// falls back to the literal address.
    ReverseResolutionFailure {
        address: String,
        message: String,
    },

    /// The selected transport could not be started or reached its server.
    TransportUnavailable {
        transport: String,
        domain: String,
        message: String,
    },

    /// The response could not be turned into a record.
    ParseFailure {
        domain: String,
        message: String,
    },

    /// Input that cannot be queried (empty, or not IDNA-encodable)
    InvalidDomain {
        domain: String,
        reason: String,
    },

    /// An operation exceeded its time budget
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// Configuration errors (invalid settings, etc.)
    ConfigError {
        message: String,
    },

    /// File I/O errors when reading configuration or suffix lists
    FileError {
        path: String,
        message: String,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl WhoisQueryError {
    /// Create a new resource-unavailable error.
    pub fn resource_unavailable<R: Into<String>, M: Into<String>>(resource: R, message: M) -> Self {
        Self::ResourceUnavailable {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create a new reverse-resolution error.
    pub fn reverse_resolution<A: Into<String>, M: Into<String>>(address: A, message: M) -> Self {
        Self::ReverseResolutionFailure {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a new transport error.
    pub fn transport<T: Into<String>, D: Into<String>, M: Into<String>>(
        transport: T,
        domain: D,
        message: M,
    ) -> Self {
        Self::TransportUnavailable {
            transport: transport.into(),
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new parse error.
    pub fn parse<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::ParseFailure {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether no resolution can succeed in this process after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ResourceUnavailable { .. })
    }
}

impl fmt::Display for WhoisQueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceUnavailable { resource, message } => {
                write!(f, "Resource '{}' unavailable: {}", resource, message)
            }
            Self::ReverseResolutionFailure { address, message } => {
                write!(f, "Reverse lookup failed for '{}': {}", address, message)
            }
            Self::TransportUnavailable {
                transport,
                domain,
                message,
            } => {
                write!(
                    f,
                    "{} transport failed for '{}': {}",
                    transport, domain, message
                )
            }
            Self::ParseFailure { domain, message } => {
                write!(f, "Failed to parse WHOIS response for '{}': {}", domain, message)
            }
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for WhoisQueryError {}

impl From<serde_json::Error> for WhoisQueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON serialization failed: {}", err),
        }
    }
}

impl From<std::io::Error> for WhoisQueryError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<regex::Error> for WhoisQueryError {
    fn from(err: regex::Error) -> Self {
        Self::Internal {
            message: format!("Regex error: {}", err),
        }
    }
}

impl From<idna::Errors> for WhoisQueryError {
    fn from(err: idna::Errors) -> Self {
        Self::InvalidDomain {
            domain: String::new(),
            reason: format!("IDNA encoding failed: {:?}", err),
        }
    }
}

impl From<toml::de::Error> for WhoisQueryError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}
