//! Logging setup.
//!
//! Every crate logs through `tracing`; this installs the subscriber that
//! prints it. `RUST_LOG` wins over the default filter passed in.

use tracing_subscriber::EnvFilter;

/// Install a formatted subscriber filtered by `RUST_LOG` or `default_filter`.
///
/// Returns `false` if a global subscriber was already set.
pub fn init(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
