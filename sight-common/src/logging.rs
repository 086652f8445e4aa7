//! Logging utilities for StockSight services.
//!
//! Provides structured logging (pretty or JSON) on top of `tracing`.
//!
//! # Noise Filtering
//!
//! By default, noisy library modules (hyper, reqwest, h2, rustls, the HTML
//! parser stack) are set to `warn` level to reduce log clutter while keeping
//! business logs at the specified level.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Default noisy modules that should be filtered to warn level.
pub const NOISY_MODULES: &[&str] = &[
    "hyper",
    "hyper_util",
    "reqwest",
    "h2",
    "rustls",
    "html5ever",
    "selectors",
    "tower_http",
];

/// Build the directive string for the given base level.
fn build_directives(log_level: &str) -> String {
    let mut directives = String::from(log_level);

    for module in NOISY_MODULES {
        directives.push_str(&format!(",{}=warn", module));
    }

    directives
}

/// Build the default EnvFilter with noise suppression.
///
/// `RUST_LOG` takes precedence when set.
fn build_filter(log_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::new(build_directives(log_level))
}

/// Initialize logging with the given configuration.
///
/// # Arguments
///
/// * `log_level` - Base log level (trace, debug, info, warn, error)
/// * `log_format` - Output format: "json" for structured JSON, "pretty" for human-readable
///
/// Events are written to stderr so CLI output on stdout stays clean.
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging(log_level: &str, log_format: &str) {
    let filter = build_filter(log_level);

    let subscriber = tracing_subscriber::registry().with(filter);

    if log_format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);
        let _ = subscriber.with(fmt_layer).try_init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);
        let _ = subscriber.with(fmt_layer).try_init();
    }

    tracing::info!(
        log_level = %log_level,
        log_format = %log_format,
        noise_filtered = NOISY_MODULES.len(),
        "Logging initialized"
    );
}
