pub mod config;
pub mod firmware;
pub mod hand;
pub mod host;
pub mod link;
pub mod serial;

/// Install the log subscriber used by both binaries.
///
/// Library code logs through the `log` facade; the subscriber's `log` bridge picks it up.
pub fn init_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    if let Err(e) = tracing_subscriber::fmt().with_max_level(level).with_target(false).try_init() {
        eprintln!("Logging already initialized: {}", e);
    }
}
