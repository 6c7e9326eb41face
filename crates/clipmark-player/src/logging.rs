#![forbid(unsafe_code)]

//! Structured logging setup.
//!
//! Every crate in the workspace logs through `tracing` macros. Installing a
//! subscriber is the embedder's call; with the `tracing-json` feature this
//! module offers the production one: JSON lines filtered by `RUST_LOG`
//! (falling back to the given directive).

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "clipmark_player=info,clipmark_core=warn";

/// Install a global JSON subscriber.
///
/// Returns `false` if a global subscriber was already set.
pub fn init_json(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_current_span(false))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_subscriber() {
        let _ = init_json(DEFAULT_DIRECTIVE);
        assert!(!init_json(DEFAULT_DIRECTIVE));
    }
}
