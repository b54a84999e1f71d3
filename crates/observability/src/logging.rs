//! Structured logging initialization.
//!
//! Logs are JSON lines on stderr so that stdout stays free for command
//! output. The filter comes from `RUST_LOG` when set.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is absent or unparsable.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Initialize logging with [`DEFAULT_DIRECTIVE`] as the fallback filter.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with_default(DEFAULT_DIRECTIVE);
}

/// Initialize logging, falling back to `directive` when `RUST_LOG` is unusable.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_with_default(directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(fallback = directive, "logging initialized");
    }
    installed
}
