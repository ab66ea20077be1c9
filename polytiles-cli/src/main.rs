//! Polytiles CLI - Command-line interface
//!
//! Runs the conversion HTTP server or a single local conversion, and
//! manages the configuration file.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;

use commands::config::ConfigCommands;
use commands::convert::ConvertArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "polytiles")]
#[command(version, about = "Turn polygon geometry into tile containers", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to listen on, overrides server.listen
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
    },

    /// Convert a polygon file into a tile container
    Convert {
        /// Polygon geometry file
        #[arg(short, long)]
        input: String,

        /// Tile container to write
        #[arg(short, long)]
        output: String,
    },

    /// Create a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { listen } => {
            let runner = CliRunner::new(config_path, cli.verbose)?;
            commands::serve::run(&runner, listen)
        }
        Commands::Convert { input, output } => {
            let runner = CliRunner::new(config_path, cli.verbose)?;
            commands::convert::run(&runner, ConvertArgs { input, output })
        }
        Commands::Init { force } => commands::init::run(config_path, force),
        Commands::Config { command } => commands::config::run(command, config_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::parse_from([
            "polytiles",
            "--verbose",
            "convert",
            "--input",
            "a.geojson",
            "--output",
            "b.versatiles",
        ]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Convert { ref input, ref output } if input == "a.geojson" && output == "b.versatiles"
        ));
    }

    #[test]
    fn test_parse_serve_with_config() {
        let cli = Cli::parse_from(["polytiles", "serve", "--listen", "0.0.0.0:9000", "--config", "/tmp/p.ini"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.ini")));
        assert!(matches!(cli.command, Commands::Serve { listen: Some(ref l) } if l == "0.0.0.0:9000"));
    }
}
