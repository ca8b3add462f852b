use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre with a project-standard configuration.
///
/// Call this early in main() before any fallible operations to ensure
/// colored error output. Safe to call multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Resolve the log filter directive.
///
/// Precedence: `RUST_LOG`, then the service-level `LOG_LEVEL` (e.g. `INFO`,
/// `debug`), then an environment default (`info` in development, `warn` in
/// production).
pub fn filter_directive(environment: &Environment, log_level: Option<&str>) -> String {
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        if !rust_log.trim().is_empty() {
            return rust_log;
        }
    }

    match log_level.map(str::trim).filter(|l| !l.is_empty()) {
        // CRITICAL/FATAL/WARNING map onto the closest tracing level
        Some(level) => match level.to_ascii_lowercase().as_str() {
            "critical" | "fatal" => "error".to_string(),
            "warning" => "warn".to_string(),
            other => other.to_string(),
        },
        None if environment.is_production() => "warn".to_string(),
        None => "info".to_string(),
    }
}

/// Initialize tracing with environment-aware configuration and error span capture.
///
/// - **Production** (`APP_ENV=production`): JSON format for log aggregation,
///   module targets hidden.
/// - **Development** (default): pretty-printed, human-readable.
///
/// Both include `tracing_error::ErrorLayer` so color-eyre reports carry span
/// traces. Safe to call multiple times; later calls are no-ops.
pub fn init_tracing(environment: &Environment, log_level: Option<&str>) {
    let directive = filter_directive(environment, log_level);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if environment.is_production() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => {
            info!(
                filter = %directive,
                "Tracing initialized with ErrorLayer. Environment: {:?}",
                environment
            );
        }
        Err(_) => {
            // Already initialized (common in tests)
            debug!("Tracing already initialized, skipping re-initialization");
        }
    }
}
