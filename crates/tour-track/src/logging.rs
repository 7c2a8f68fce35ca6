use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Default filter when RUST_LOG is not set
fn default_directives() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Initialize logging to stderr
///
/// Standard output is kept free for the JSON document.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives()));

    let result = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {e}");
    }
}
