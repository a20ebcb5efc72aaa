// Tracing setup.
// Logs go to stderr so stdout carries nothing but the cloned path.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set: ghsel at the level picked by `-v`,
/// dependencies at `warn`.
fn default_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    format!("warn,ghsel={}", level)
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `verbosity`.
pub fn init(verbosity: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .try_init();
}
