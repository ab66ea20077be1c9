//! Convert command - run the pipeline locally with a progress spinner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use polytiles::convert::{convert_polygons, ConvertRequest};
use polytiles::progress::Progress;
use polytiles::tools::ProcessRunner;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the convert command.
pub struct ConvertArgs {
    pub input: String,
    pub output: String,
}

/// Run the convert command.
pub fn run(runner: &CliRunner, args: ConvertArgs) -> Result<(), CliError> {
    runner.log_startup("convert");
    let tools = runner.config().tools.clone();
    let request = ConvertRequest::new(args.input, args.output);

    runner.runtime()?.block_on(async move {
        let progress = convert_polygons(&request, &tools, Arc::new(ProcessRunner::new()))?;

        let bar = spinner();
        let on_progress = bar.clone();
        progress.on_progress(move |value| on_progress.set_position(value.max(0) as u64));
        let on_message = bar.clone();
        progress.on_message(move |text, is_error| {
            if is_error {
                on_message.set_message(style(text).red().to_string());
            } else {
                on_message.set_message(text.to_string());
            }
        });

        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupted);
        let handle = progress.clone();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
            handle.abort();
        })
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

        let outcome = progress.done().await;

        if interrupted.load(Ordering::SeqCst) {
            bar.abandon_with_message(style("Interrupted").yellow().to_string());
            return Err(CliError::Interrupted);
        }

        match outcome {
            Ok(()) => {
                bar.finish_with_message(style("Done").green().to_string());
                println!("Wrote {}", request.output);
                Ok(())
            }
            Err(e) => {
                bar.abandon();
                Err(CliError::Conversion(e.to_string()))
            }
        }
    })
}

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} [{elapsed_precise}] step {pos} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
