//! Logging setup for the benchlink CLI
//!
//! Structured logging via `tracing`; the filter honors `RUST_LOG` when set
//! and otherwise defaults to workspace-crate debug output in verbose mode.

use std::io::IsTerminal;

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the tracing subscriber. Call once, before any pipeline runs.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("benchlink=debug,info")
            } else {
                EnvFilter::try_new("benchlink=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_ansi(use_color())
                .compact(),
        )
        .try_init()?;

    Ok(())
}
