//! Structured logging setup, adapted from the teacher's
//! `observability::logging`: a `LogFormat` choice plus a verbosity count
//! mapped to a `tracing` directive, with an environment override.

use tracing_subscriber::EnvFilter;

/// Output format for the process logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

/// Initializes the global `tracing` subscriber.
///
/// `verbosity` maps 0 → warn, 1 → info, 2 → debug, 3+ → trace, unless the
/// `FAULTLINE_LOG_LEVEL` environment variable is set, in which case it wins.
/// Uses `try_init` so repeated calls (e.g. across integration tests that
/// each spin up a server) don't panic on a second global subscriber install.
pub fn init_logging(format: LogFormat, verbosity: u8) {
    let default_directive = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_env("FAULTLINE_LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let ansi = std::io::IsTerminal::is_terminal(&std::io::stderr());

    // Logs go to stderr, not stdout: faultline is a long-running server, not
    // a pipe-friendly CLI tool, but keeping stdout free of log noise matches
    // what the integration-test harness (and any operator piping stdout)
    // expects.
    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Human => tracing_subscriber::fmt()
            .with_ansi(ansi)
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_default_is_human() {
        assert_eq!(LogFormat::default(), LogFormat::Human);
    }

    #[test]
    fn init_logging_does_not_panic() {
        init_logging(LogFormat::Human, 1);
        init_logging(LogFormat::Json, 0);
    }
}
