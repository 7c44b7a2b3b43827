//! Shared logging utilities for consistent tracing across the harness

use chrono::{DateTime, Utc};

/// Build the filter directive used by [`init_tracing`]
pub fn filter_directive(log_level: Option<&str>, verbose: bool) -> String {
    let base_level = match (log_level, verbose) {
        (Some(level), _) => level,
        (None, true) => "debug",
        (None, false) => "info",
    };

    format!("acceptance={base_level},shared={base_level},reqwest=warn,hyper=warn,axum=warn")
}

/// Initialize a stdout tracing subscriber for the harness
///
/// Safe to call more than once; later calls are ignored, which lets tests
/// and the binary share the same entry point.
pub fn init_tracing(log_level: Option<&str>, verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let directive = filter_directive(log_level, verbose);

    let _ = fmt()
        .with_env_filter(EnvFilter::new(&directive))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for instance-aware info logging
#[macro_export]
macro_rules! instance_info {
    ($instance:expr, $($arg:tt)*) => {
        tracing::info!(
            instance = %$instance,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for instance-aware warning logging
#[macro_export]
macro_rules! instance_warn {
    ($instance:expr, $($arg:tt)*) => {
        tracing::warn!(
            instance = %$instance,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for instance-aware error logging
#[macro_export]
macro_rules! instance_error {
    ($instance:expr, $($arg:tt)*) => {
        tracing::error!(
            instance = %$instance,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for instance-aware debug logging
#[macro_export]
macro_rules! instance_debug {
    ($instance:expr, $($arg:tt)*) => {
        tracing::debug!(
            instance = %$instance,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_levels() {
        assert!(filter_directive(None, false).starts_with("acceptance=info,shared=info"));
        assert!(filter_directive(None, true).starts_with("acceptance=debug,shared=debug"));
        assert!(filter_directive(Some("trace"), false).starts_with("acceptance=trace"));
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing(Some("debug"), false);
        init_tracing(None, true);
        instance_debug!("am0", "logging after repeated init");
    }
}
