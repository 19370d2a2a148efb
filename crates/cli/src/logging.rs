//! Logging initialization.
//!
//! Everything goes to stderr so stdout stays clean for `--json`. `RUST_LOG`
//! takes precedence over `-v` when set.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Default directive for a `-v` count: warnings only, then info, debug, trace.
pub fn level_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn init_logging(verbosity: u8, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(verbosity)));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2);

    // A second init (tests embedding the CLI) is harmless; ignore it.
    let _ = match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_directive(0), "warn");
        assert_eq!(level_directive(1), "info");
        assert_eq!(level_directive(2), "debug");
        assert_eq!(level_directive(9), "trace");
    }
}
