//! Tracing initialization for the `publisher` binary.
//!
//! Log output goes to stderr so that stdout carries nothing but the request ids printed by
//! the CLI. Verbosity follows `RUST_LOG` and defaults to `info`, e.g.
//!
//! ```bash
//! RUST_LOG=publisher=debug publisher add-external-file --metadata meta.json
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    tracing::debug!("Telemetry initialized");

    Ok(())
}
