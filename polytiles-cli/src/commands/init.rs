//! Init command - write a default configuration file.

use std::path::Path;

use polytiles::config::ConfigFile;

use crate::error::CliError;
use crate::runner::resolve_config_path;

/// Run the init command.
///
/// An existing file is left alone unless `force` is set.
pub fn run(config_path: Option<&Path>, force: bool) -> Result<(), CliError> {
    let path = resolve_config_path(config_path)?;

    if path.exists() && !force {
        println!("Configuration file already exists:");
        println!("  {}", path.display());
        println!();
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to point at your tippecanoe and versatiles binaries.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
