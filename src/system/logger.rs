use tracing_subscriber::{EnvFilter, FmtSubscriber};

const LOG_ENV: &str = "WIREBENCH_LOG";
const FALLBACK_ENV: &str = "RUST_LOG";

/// Installs the global `tracing` subscriber. Logs go to stderr so the
/// report on stdout stays machine-readable.
pub fn init_logging(verbose: bool, no_color: bool) {
    let configured = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var(FALLBACK_ENV))
        .ok();
    let filter = resolve_filter(configured.as_deref(), verbose);

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(!no_color)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

fn resolve_filter(configured: Option<&str>, verbose: bool) -> EnvFilter {
    match configured {
        Some(value) => EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        None if verbose => EnvFilter::new("debug"),
        None => EnvFilter::new("info"),
    }
}
