//! Logging - inizializzazione del subscriber tracing

use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_level`. A subscriber that is already installed is kept, so it is
/// safe to call from every test.
pub fn init_tracing(default_level: &str) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .try_init();

    if result.is_err() {
        tracing::trace!("tracing subscriber already installed");
    }
}
