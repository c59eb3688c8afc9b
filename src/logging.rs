//! Integration with the `tracing` ecosystem.
//!
//! The library itself only emits events: `debug!` for per-container detail,
//! `info!` for selections, `warn!` for skipped containers and title sets,
//! `error!` for skipped discs. Binaries embedding the crate install a
//! subscriber with [`init_tracing`].

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level` (e.g. `"info"` or
/// `"discparse=debug"`). Output goes to stderr.
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
