//! Polygon → tile container pipeline.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use super::request::{ConvertError, ConvertRequest};
use crate::progress::{producer, step, ConcatenatedProgress, SimpleProgress, Step, StepError};
use crate::tools::{tool_step, ToolInvocation, ToolRunner, ToolsConfig};

/// Message shown while the tile generator runs.
pub const STAGE_GENERATE: &str = "Generating tiles";

/// Message shown while the container converter runs.
pub const STAGE_CONVERT: &str = "Converting tile container";

/// Message shown while intermediate files are removed.
pub const STAGE_CLEANUP: &str = "Removing temporary files";

/// Layer name written into the generated tiles.
pub const LAYER_NAME: &str = "polygons";

static INTERMEDIATE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Builds the conversion pipeline for `request`.
///
/// The returned progress runs three children in order:
///
/// 1. `tippecanoe` writes an intermediate `.mbtiles` file
/// 2. `versatiles convert` turns it into the requested output
/// 3. the intermediate file is deleted
///
/// The request is validated first; nothing is started if it is invalid.
/// Must be called within a tokio runtime.
pub fn convert_polygons(
    request: &ConvertRequest,
    tools: &ToolsConfig,
    runner: Arc<dyn ToolRunner>,
) -> Result<ConcatenatedProgress, ConvertError> {
    request.validate()?;

    let intermediate = intermediate_path(&tools.temp_dir());
    info!(
        input = %request.input,
        output = %request.output,
        intermediate = %intermediate.display(),
        "Starting polygon conversion"
    );

    let generate = tippecanoe_invocation(tools, &request.input, &intermediate);
    let convert = versatiles_invocation(tools, &intermediate, &request.output);
    let generate_runner = Arc::clone(&runner);

    Ok(ConcatenatedProgress::new(vec![
        producer(move || {
            SimpleProgress::new(STAGE_GENERATE, vec![tool_step(generate_runner, generate)])
        }),
        producer(move || SimpleProgress::new(STAGE_CONVERT, vec![tool_step(runner, convert)])),
        producer(move || SimpleProgress::new(STAGE_CLEANUP, vec![remove_file_step(intermediate)])),
    ]))
}

/// Returns a fresh path for an intermediate tile file inside `dir`.
pub fn intermediate_path(dir: &Path) -> PathBuf {
    let sequence = INTERMEDIATE_COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(
        "polytiles-{}-{}.mbtiles",
        std::process::id(),
        sequence
    ))
}

/// Tile generator invocation: `input` → `intermediate` (mbtiles).
pub fn tippecanoe_invocation(tools: &ToolsConfig, input: &str, intermediate: &Path) -> ToolInvocation {
    ToolInvocation::new(&tools.tippecanoe)
        .arg("-o")
        .arg(intermediate.to_string_lossy())
        .args([
            "--force",
            "--quiet",
            "-zg",
            "--drop-densest-as-needed",
            "--extend-zooms-if-still-dropping",
        ])
        .arg(format!("--layer={}", LAYER_NAME))
        .arg(input)
}

/// Container converter invocation: `intermediate` → `output`.
pub fn versatiles_invocation(tools: &ToolsConfig, intermediate: &Path, output: &str) -> ToolInvocation {
    ToolInvocation::new(&tools.versatiles)
        .arg("convert")
        .arg(intermediate.to_string_lossy())
        .arg(output)
}

/// Step that deletes `path`. A file that is already gone is not an error.
pub fn remove_file_step(path: PathBuf) -> Step {
    step(move |_| async move {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed intermediate file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Intermediate file already removed");
                Ok(())
            }
            Err(e) => Err(StepError::new(format!(
                "failed to remove {}: {}",
                path.display(),
                e
            ))
            .with_source(e)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{Progress, ProgressError};
    use crate::tools::ToolError;
    use parking_lot::Mutex;
    use std::future::Future;
    use std::pin::Pin;
    use tokio_util::sync::CancellationToken;

    /// Records invocations; fails when the program matches `fail_program`.
    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<ToolInvocation>>,
        fail_program: Option<String>,
    }

    impl ToolRunner for RecordingRunner {
        fn run(
            &self,
            invocation: ToolInvocation,
            _cancel: CancellationToken,
        ) -> Pin<Box<dyn Future<Output = Result<(), ToolError>> + Send>> {
            let fail = self.fail_program.as_deref() == Some(invocation.program.as_str());
            self.calls.lock().push(invocation.clone());
            Box::pin(async move {
                if fail {
                    Err(ToolError::Failed {
                        program: invocation.program,
                        status: "exit status: 1".to_string(),
                        detail: "bad geometry".to_string(),
                    })
                } else {
                    Ok(())
                }
            })
        }
    }

    fn tools_in(dir: &Path) -> ToolsConfig {
        ToolsConfig {
            temp_dir: Some(dir.to_path_buf()),
            ..ToolsConfig::default()
        }
    }

    #[tokio::test]
    async fn test_runs_tools_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let request = ConvertRequest::new("in.geojson", "out.versatiles");

        let progress = convert_polygons(&request, &tools_in(temp.path()), runner.clone()).unwrap();
        assert_eq!(progress.done().await, Ok(()));

        let calls = runner.calls.lock();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, "tippecanoe");
        assert_eq!(calls[0].args.last().map(String::as_str), Some("in.geojson"));
        assert_eq!(calls[1].program, "versatiles");
        assert_eq!(calls[1].args[0], "convert");
        assert_eq!(calls[1].args[2], "out.versatiles");
        // Generator output feeds the converter.
        assert_eq!(calls[0].args[1], calls[1].args[1]);
        assert_eq!(progress.state().message(), STAGE_CLEANUP);
    }

    #[tokio::test]
    async fn test_invalid_request_starts_nothing() {
        let runner = Arc::new(RecordingRunner::default());
        let request = ConvertRequest::new("", "out.versatiles");

        let result = convert_polygons(&request, &ToolsConfig::default(), runner.clone());
        assert!(matches!(result, Err(ConvertError::EmptyPath { field: "input" })));
        assert!(runner.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_generator_failure_stops_pipeline() {
        let temp = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner {
            fail_program: Some("tippecanoe".to_string()),
            ..RecordingRunner::default()
        });
        let request = ConvertRequest::new("in.geojson", "out.versatiles");

        let progress = convert_polygons(&request, &tools_in(temp.path()), runner.clone()).unwrap();
        let outcome = progress.done().await;

        assert_eq!(
            outcome,
            Err(ProgressError::Failed(
                "tippecanoe exited with exit status: 1: bad geometry".to_string()
            ))
        );
        assert_eq!(runner.calls.lock().len(), 1);
        assert!(progress.state().is_error());
    }

    #[tokio::test]
    async fn test_remove_file_step_deletes_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("intermediate.mbtiles");
        std::fs::write(&path, b"tiles").unwrap();

        let progress = SimpleProgress::new("cleanup", vec![remove_file_step(path.clone())]);
        assert_eq!(progress.done().await, Ok(()));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_file_step_tolerates_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("never-created.mbtiles");

        let progress = SimpleProgress::new("cleanup", vec![remove_file_step(path)]);
        assert_eq!(progress.done().await, Ok(()));
    }

    #[test]
    fn test_intermediate_paths_are_unique() {
        let dir = Path::new("/tmp");
        let first = intermediate_path(dir);
        let second = intermediate_path(dir);
        assert_ne!(first, second);
        assert_eq!(first.extension().and_then(|e| e.to_str()), Some("mbtiles"));
    }
}
