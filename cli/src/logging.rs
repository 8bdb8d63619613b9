//! # Structured Logging
//!
//! Initializes the `tracing` subscriber with configurable format (JSON
//! or pretty-printed) and environment-based filtering via `RUST_LOG`.
//!
//! All log output goes to stderr; stdout is reserved for the composed
//! JSON results so the binary pipes cleanly.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output for local use.
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

impl LogFormat {
    /// Parse a format string. Accepts "json" or "pretty"
    /// (case-insensitive); anything unrecognized falls back to `Pretty`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Call this exactly once, early in `main()`. The `RUST_LOG`
/// environment variable overrides `default_level` when set, using
/// `tracing_subscriber::EnvFilter` directive syntax, e.g.:
///
/// ```text
/// RUST_LOG=payflow=debug,payflow_engine=debug
/// ```
pub fn init_logging(default_level: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
    }

    tracing::debug!("logging initialized (format={:?})", format);
}
