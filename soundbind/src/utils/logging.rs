use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize logging with tracing
///
/// This function sets up the tracing subscriber with the following configuration:
/// - Reads filter from RUST_LOG environment variable if available
/// - Falls back to "soundbind=debug,warn" if RUST_LOG is not set
/// - Uses a formatted output layer
///
/// Calling it more than once is harmless; only the first call installs the subscriber.
///
/// # Example
///
/// ```no_run
/// use soundbind_lib::utils::logging::init_logging;
///
/// init_logging();
/// ```
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("soundbind=debug,warn"));

    let installed = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Soundbind logging initialized");
    }
}
