#![deny(missing_docs)]

//! # modreg CLI
//!
//! Command Line Interface for registering generated units with their module.
//!
//! Supported Commands:
//! - `register`: Adds a unit's import, declaration and (optionally) export to a module descriptor.
//! - `schema`: Prints the registration option schema as JSON.

use clap::{Parser, Subcommand};

use crate::error::CliResult;

mod error;
mod logging;
mod register;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Module registration CLI")]
struct Cli {
    /// Enable debug logging.
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a generated unit with its module descriptor.
    Register(register::RegisterArgs),
    /// Print the option schema.
    Schema,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    match &cli.command {
        Commands::Register(args) => register::execute(args)?,
        Commands::Schema => {
            let schema = serde_json::to_string_pretty(&modreg_core::options_schema())
                .map_err(|e| error::CliError::General(format!("Failed to render schema: {}", e)))?;
            println!("{}", schema);
        }
    }

    Ok(())
}
