// Logging setup for binaries and tests that embed the client

use tracing::debug;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "home_services_client=info";

// RUST_LOG wins over `default_filter`. Safe to call more than once.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
    {
        debug!(error = %e, "tracing subscriber already installed");
    }
}
