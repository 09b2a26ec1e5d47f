//! Configuration file parsing and management.
//!
//! This module loads `[defaults]` from TOML files, merges them with
//! precedence rules, reads `WQ_*` environment variables, and applies the
//! result onto [`QueryOptions`].

use crate::error::WhoisQueryError;
use crate::types::QueryOptions;
use crate::utils::parse_bool_flag;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for query options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default values that map to [`QueryOptions`] fields.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Use the native executable transport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native: Option<bool>,

    /// Executable for the native transport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,

    /// Socket client flag bits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,

    /// Attach the raw response to records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_raw: Option<bool>,

    /// Silence connection warnings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet: Option<bool>,

    /// Timeout (as string, e.g., "5s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Fixed WHOIS server for the socket transport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Suffix list file replacing the bundled list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix_list: Option<PathBuf>,
}

impl FileConfig {
    /// Overlay the file's defaults onto `options`.
    pub fn apply(&self, mut options: QueryOptions) -> QueryOptions {
        let Some(defaults) = &self.defaults else {
            return options;
        };

        if let Some(native) = defaults.native {
            options.use_native_executable = native;
        }
        if let Some(executable) = &defaults.executable {
            options.executable = executable.clone();
        }
        if let Some(flags) = defaults.flags {
            options.flags = flags;
        }
        if let Some(include_raw) = defaults.include_raw {
            options.include_raw = include_raw;
        }
        if let Some(quiet) = defaults.quiet {
            options.quiet = quiet;
        }
        if let Some(secs) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
            options.timeout = Duration::from_secs(secs);
        }
        if let Some(server) = &defaults.server {
            options.server = Some(server.clone());
        }
        if let Some(path) = &defaults.suffix_list {
            options.suffix_list = Some(path.clone());
        }
        options
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which files were loaded
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// `FileError` when the file is missing or unreadable, `ConfigError`
    /// when it is not valid TOML or fails validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, WhoisQueryError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(WhoisQueryError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            WhoisQueryError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is lowest, then the home directory, then the current
    /// directory. A file that exists but fails to load is an error.
    pub fn discover_and_load(&self) -> Result<FileConfig, WhoisQueryError> {
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        let mut merged_config = FileConfig::default();
        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            merged_config = self.merge_configs(merged_config, config);
            if self.verbose {
                debug!(path = %path.display(), "Loaded configuration file");
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./whois-query.toml", "./.whois-query.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Get the global configuration file path.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".whois-query.toml", "whois-query.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("whois-query").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win per field.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower), Some(higher)) => Some(DefaultsConfig {
                    native: higher.native.or(lower.native),
                    executable: higher.executable.or(lower.executable),
                    flags: higher.flags.or(lower.flags),
                    include_raw: higher.include_raw.or(lower.include_raw),
                    quiet: higher.quiet.or(lower.quiet),
                    timeout: higher.timeout.or(lower.timeout),
                    server: higher.server.or(lower.server),
                    suffix_list: higher.suffix_list.or(lower.suffix_list),
                }),
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), WhoisQueryError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if let Some(timeout_str) = &defaults.timeout {
            match parse_timeout_string(timeout_str) {
                Some(secs) if secs > 0 => {}
                _ => {
                    return Err(WhoisQueryError::config(format!(
                        "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                        timeout_str
                    )))
                }
            }
        }

        if let Some(executable) = &defaults.executable {
            if executable.trim().is_empty() {
                return Err(WhoisQueryError::config("'executable' cannot be empty"));
            }
        }

        if let Some(server) = &defaults.server {
            if server.trim().is_empty() {
                return Err(WhoisQueryError::config("'server' cannot be empty"));
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via `WQ_*`
/// environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub native: Option<bool>,
    pub executable: Option<String>,
    pub flags: Option<u32>,
    pub include_raw: Option<bool>,
    pub quiet: Option<bool>,
    pub timeout: Option<Duration>,
    pub server: Option<String>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Overlay the environment values onto `options`.
    pub fn apply(&self, mut options: QueryOptions) -> QueryOptions {
        if let Some(native) = self.native {
            options.use_native_executable = native;
        }
        if let Some(executable) = &self.executable {
            options.executable = executable.clone();
        }
        if let Some(flags) = self.flags {
            options.flags = flags;
        }
        if let Some(include_raw) = self.include_raw {
            options.include_raw = include_raw;
        }
        if let Some(quiet) = self.quiet {
            options.quiet = quiet;
        }
        if let Some(timeout) = self.timeout {
            options.timeout = timeout;
        }
        if let Some(server) = &self.server {
            options.server = Some(server.clone());
        }
        options
    }
}

/// Load configuration from environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok(), verbose)
}

/// Load `WQ_*` values through `lookup` instead of the process environment.
pub fn load_env_config_from<F>(lookup: F, verbose: bool) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    let bool_var = |key: &str| -> Option<bool> {
        let val = lookup(key)?;
        let parsed = parse_bool_flag(&val);
        if parsed.is_none() {
            warn!("Invalid {}='{}', use true/false", key, val);
        }
        parsed
    };
    let string_var = |key: &str| -> Option<String> {
        lookup(key).filter(|val| !val.trim().is_empty())
    };

    env_config.native = bool_var("WQ_NATIVE");
    env_config.include_raw = bool_var("WQ_INCLUDE_RAW");
    env_config.quiet = bool_var("WQ_QUIET");
    env_config.executable = string_var("WQ_EXECUTABLE");
    env_config.server = string_var("WQ_SERVER");
    env_config.config = string_var("WQ_CONFIG");

    // WQ_FLAGS - decimal or 0x-prefixed hex
    if let Some(val) = lookup("WQ_FLAGS") {
        match parse_flags(&val) {
            Some(flags) => env_config.flags = Some(flags),
            None => warn!("Invalid WQ_FLAGS='{}', expected a number", val),
        }
    }

    // WQ_TIMEOUT - timeout setting
    if let Some(val) = lookup("WQ_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(secs) if secs > 0 => env_config.timeout = Some(Duration::from_secs(secs)),
            _ => warn!(
                "Invalid WQ_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                val
            ),
        }
    }

    if verbose && env_config != EnvConfig::default() {
        debug!(?env_config, "Using environment configuration");
    }

    env_config
}

/// Parse flag bits written as decimal (`2`) or hex (`0x02`).
pub fn parse_flags(value: &str) -> Option<u32> {
    let value = value.trim();
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is taken as seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }
}
