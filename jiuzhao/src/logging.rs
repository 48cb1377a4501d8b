//! Developer tracing.
//!
//! Tracing goes to stderr and is controlled by `RUST_LOG`. The session
//! transcript shown to the user is rendered separately through
//! [`crate::render::ConsoleObserver`].

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Defaults to `warn` when `RUST_LOG` is unset.
///
/// ```bash
/// RUST_LOG=jiuzhao=debug jiuzhao prove "1 + 1 = 2"
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
