//! Subscriber initialization

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize console logging.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Later calls are
/// no-ops, as is a call made after another global subscriber was installed.
///
/// # Example
/// ```
/// use benchjudge_telemetry::init_telemetry;
/// init_telemetry("benchjudge").expect("Failed to initialize telemetry");
/// ```
pub fn init_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    INIT.call_once(|| {
        let installed = tracing_subscriber::registry()
            .with(env_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .try_init();

        if installed.is_ok() {
            tracing::info!(service.name = service_name, "Telemetry initialized");
        }
    });

    Ok(())
}

/// Initialize newline-delimited JSON logging, for log shippers.
pub fn init_json_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    INIT.call_once(|| {
        let installed = tracing_subscriber::registry()
            .with(env_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_line_number(true),
            )
            .try_init();

        if installed.is_ok() {
            tracing::info!(service.name = service_name, "Telemetry initialized (json)");
        }
    });

    Ok(())
}
