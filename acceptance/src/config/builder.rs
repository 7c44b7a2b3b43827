//! Acceptance Options Builder
//!
//! Provides a fluent builder for constructing per-test options

use super::AcceptanceOpts;
use std::path::PathBuf;
use std::time::Duration;

pub struct AcceptanceOptsBuilder {
    opts: AcceptanceOpts,
}

impl AcceptanceOptsBuilder {
    pub fn new() -> Self {
        Self {
            opts: AcceptanceOpts::default(),
        }
    }

    /// Set matching tolerance
    pub fn tolerance(mut self, tolerance: Duration) -> Self {
        self.opts.tolerance = tolerance;
        self
    }

    /// Set the binary launched for every instance
    pub fn binary<P: Into<PathBuf>>(mut self, binary: P) -> Self {
        self.opts.binary = binary.into();
        self
    }

    /// Set log level passed to instances (debug, info, warn, error)
    pub fn log_level<S: Into<String>>(mut self, level: S) -> Self {
        self.opts.log_level = level.into();
        self
    }

    /// Set the post-launch grace period
    pub fn warmup(mut self, warmup: Duration) -> Self {
        self.opts.warmup = warmup;
        self
    }

    /// Append an argument passed to every instance
    pub fn extra_arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.opts.extra_args.push(arg.into());
        self
    }

    /// Set per-request API timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.opts.request_timeout = timeout;
        self
    }

    /// Fail reports that contain notifications nobody expected
    pub fn fail_on_unexpected(mut self, fail: bool) -> Self {
        self.opts.fail_on_unexpected = fail;
        self
    }

    /// Build the options
    pub fn build(self) -> AcceptanceOpts {
        self.opts
    }
}

impl Default for AcceptanceOptsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
