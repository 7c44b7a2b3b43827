//! Acceptance Test Options
//!
//! Per-test settings shared by every managed instance and collector

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AcceptanceOpts {
    /// Symmetric slack applied when matching observations to expectations
    pub tolerance: Duration,
    /// Alertmanager binary to launch for every managed instance
    pub binary: PathBuf,
    pub log_level: String,
    /// Grace period after launch before the instance is considered listening
    pub warmup: Duration,
    /// Additional command-line arguments appended for every instance
    pub extra_args: Vec<String>,
    /// Timeout of a single API request against an instance
    pub request_timeout: Duration,
    /// Whether notifications nobody expected fail the collector's report
    pub fail_on_unexpected: bool,
}

impl Default for AcceptanceOpts {
    fn default() -> Self {
        Self {
            tolerance: Duration::from_millis(150),
            binary: PathBuf::from("alertmanager"),
            log_level: "debug".to_string(),
            warmup: Duration::from_millis(100),
            extra_args: Vec::new(),
            request_timeout: Duration::from_secs(10),
            fail_on_unexpected: false,
        }
    }
}

impl AcceptanceOpts {
    /// Create a new builder
    pub fn builder() -> crate::config::builder::AcceptanceOptsBuilder {
        crate::config::builder::AcceptanceOptsBuilder::new()
    }

    /// Tolerance as a signed delta for timestamp comparison
    pub fn tolerance_delta(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::from_std(self.tolerance).unwrap_or(chrono::TimeDelta::MAX)
    }

    /// Tolerance in (relative) seconds for interval widening
    pub fn tolerance_secs(&self) -> f64 {
        self.tolerance.as_secs_f64()
    }

    /// Convert to command-line arguments for one instance
    pub fn to_args(&self, config_path: &Path, listen_address: SocketAddr) -> Vec<String> {
        let mut args = vec![
            format!("--config.file={}", config_path.display()),
            format!("--log.level={}", self.log_level),
            format!("--web.listen-address={listen_address}"),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}
