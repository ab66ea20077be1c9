//! Configuration CLI commands.
//!
//! Provides `config list` and `config path` for inspecting settings.

use std::path::Path;

use clap::Subcommand;
use polytiles::config::ConfigFile;

use crate::error::CliError;
use crate::runner::resolve_config_path;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::List => run_list(config_path),
        ConfigCommands::Path => run_path(config_path),
    }
}

/// List all configuration settings, grouped by section.
fn run_list(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = ConfigFile::load_from(&resolve_config_path(config_path)?)?;

    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = "";
    for (key, value) in config.entries() {
        let (section, name) = key.split_once('.').unwrap_or(("", key));

        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }

        if value.is_empty() {
            println!("  {} = (not set)", name);
        } else {
            println!("  {} = {}", name, value);
        }
    }

    Ok(())
}

/// Show the configuration file path.
fn run_path(config_path: Option<&Path>) -> Result<(), CliError> {
    println!("{}", resolve_config_path(config_path)?.display());
    Ok(())
}
