// Diagnostics go to stderr through `tracing` so they never mix with the
// command output on stdout.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins when set; otherwise
/// `warn`, or `debug` for this crate with `--verbose`.
pub fn init(verbose: bool) {
    let fallback = if verbose { "warn,imap_shell=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
