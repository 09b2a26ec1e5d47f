//! Native executable transport.
//!
//! Runs an external WHOIS program as `<executable> <domain>` and returns its
//! standard output. Only a failure to start the process is an error; the
//! exit status is not inspected.

use super::WhoisTransport;
use crate::error::WhoisQueryError;
use crate::types::ResolvedDomain;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Transport that shells out to a `whois` executable.
#[derive(Debug, Clone)]
pub struct NativeExecutable {
    /// Program name or path
    executable: String,
}

impl NativeExecutable {
    /// Use the `whois` program found on `PATH`.
    pub fn new() -> Self {
        Self::with_executable("whois")
    }

    /// Use a specific program name or path.
    pub fn with_executable<S: Into<String>>(executable: S) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Run the executable for `domain` and capture stdout.
    async fn execute(&self, domain: &str) -> Result<String, WhoisQueryError> {
        let output = Command::new(&self.executable)
            .arg(domain)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                WhoisQueryError::transport(
                    self.name(),
                    domain,
                    format!(
                        "Failed to execute '{}': {}. Make sure it is installed.",
                        self.executable, e
                    ),
                )
            })?;

        debug!(
            executable = %self.executable,
            status = ?output.status.code(),
            bytes = output.stdout.len(),
            "WHOIS executable finished"
        );

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for NativeExecutable {
    fn default() -> Self {
        Self::new()
    }
}

impl WhoisTransport for NativeExecutable {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn query(&self, domain: &ResolvedDomain) -> Result<String, WhoisQueryError> {
        info!(domain = %domain, executable = %self.executable, "Querying WHOIS via executable");
        self.execute(domain.as_str()).await
    }
}
