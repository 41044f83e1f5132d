//! `faultline validate`: parses and validates a scenario file without
//! starting the server.

use crate::cli::args::ValidateArgs;
use crate::config;
use crate::error::Result;

pub fn run(args: &ValidateArgs) -> Result<()> {
    let scenarios = config::load_scenarios(&args.config)?;
    println!("{} scenario(s) valid in {}", scenarios.len(), args.config.display());
    Ok(())
}
