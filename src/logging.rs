// ABOUTME: Structured logging setup on top of tracing-subscriber
// ABOUTME: Filter comes from NOTION2MD_LOG or RUST_LOG, else the -v count

use tracing::Level;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "NOTION2MD_LOG";

pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Dependencies stay at `warn` unless a filter is given explicitly.
pub fn env_filter(verbosity: u8) -> EnvFilter {
    std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| {
            let level = level_for(verbosity).as_str().to_ascii_lowercase();
            EnvFilter::new(format!("warn,notion2md={}", level))
        })
}

/// Install the global subscriber, writing to stderr. Safe to call twice.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
