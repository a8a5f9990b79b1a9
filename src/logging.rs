// SPDX-License-Identifier: GPL-3.0-only

//! Logging setup

/// Install the global `tracing` subscriber
///
/// The level comes from `RUST_LOG` (e.g. `RUST_LOG=debug`,
/// `RUST_LOG=tritan_camera=debug`) and defaults to `warn`. Calling this more
/// than once is harmless; later calls leave the first subscriber in place.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .try_init();
}
