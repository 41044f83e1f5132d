//! CLI argument definitions: clap derive structs for `faultline`.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::observability::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "faultline", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format.
    #[arg(long, value_enum, default_value = "human", global = true, env = "FAULTLINE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the fault-injection server.
    Serve(ServeArgs),

    /// Validate a scenario file without starting the server.
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// TCP port to listen on.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Path to a YAML scenario file, preloaded at startup.
    #[arg(long, env = "FAULTLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to expose a standalone Prometheus listener on, in addition to `/metrics`.
    #[arg(long, env = "FAULTLINE_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the YAML scenario file to validate.
    #[arg(long, short)]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_with_no_args_parses() {
        let cli = Cli::try_parse_from(["faultline", "serve"]);
        assert!(cli.is_ok(), "{cli:?}");
    }

    #[test]
    fn serve_with_port_and_config_parses() {
        let cli = Cli::try_parse_from([
            "faultline", "serve", "--port", "9090", "--config", "scenarios.yaml",
        ])
        .unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(9090));
                assert_eq!(args.config, Some(PathBuf::from("scenarios.yaml")));
            }
            _ => panic!("expected Serve"),
        }
    }

    #[test]
    fn validate_requires_config() {
        let cli = Cli::try_parse_from(["faultline", "validate"]);
        assert!(cli.is_err());
    }

    #[test]
    fn verbose_count_accumulates() {
        let cli = Cli::try_parse_from(["faultline", "-vvv", "serve"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }
}
