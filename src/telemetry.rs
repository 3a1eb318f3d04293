//! Tracing subscriber initialization.
//!
//! Sets up console logging with an environment-driven filter. The verbosity is
//! controlled via the standard `RUST_LOG` variable and defaults to `info`:
//!
//! ```bash
//! RUST_LOG=warden=debug,tower_http=debug warden -f config.yaml
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize tracing with console output (fmt layer)
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");

    Ok(())
}
