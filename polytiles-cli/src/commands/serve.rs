//! Serve command - run the HTTP API.

use console::style;
use polytiles::server::{self, AppState};
use tokio_util::sync::CancellationToken;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the serve command. Blocks until Ctrl+C.
pub fn run(runner: &CliRunner, listen: Option<String>) -> Result<(), CliError> {
    runner.log_startup("serve");
    let config = runner.config();
    let listen = listen.unwrap_or_else(|| config.server.listen.clone());

    println!("{}", style(format!("Polytiles v{}", polytiles::VERSION)).bold());
    println!();
    println!("Listening:  http://{}", listen);
    println!("Tippecanoe: {}", config.tools.tippecanoe);
    println!("VersaTiles: {}", config.tools.versatiles);
    println!("Temp dir:   {}", config.tools.temp_dir().display());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping server...");
        signal.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let state = AppState::with_process_runner(config.tools.clone());
    runner
        .runtime()?
        .block_on(server::serve(&listen, state, shutdown))?;

    println!("Server stopped.");
    Ok(())
}
