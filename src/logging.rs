use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber. `RUST_LOG` wins when set; otherwise
/// the verbose flag picks between operational events and warnings only.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "smmpanel=debug,info" } else { "warn" };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}
