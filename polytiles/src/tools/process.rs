//! Tool runner backed by real child processes.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ToolError, ToolInvocation, ToolRunner};

/// Runs tools as child processes using `tokio::process`.
///
/// - stdin and stdout are discarded
/// - stderr is read line by line and logged at debug level under the
///   program name; the last non-empty line is kept for error reports
/// - the child is killed when the cancellation token fires or the run
///   future is dropped
#[derive(Clone, Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Creates a new process runner.
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for ProcessRunner {
    fn run(
        &self,
        invocation: ToolInvocation,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), ToolError>> + Send>> {
        Box::pin(run_process(invocation, cancel))
    }
}

async fn run_process(invocation: ToolInvocation, cancel: CancellationToken) -> Result<(), ToolError> {
    let program = invocation.program.clone();
    info!(command = %invocation, "Starting external tool");

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?;

    let stderr = child.stderr.take();
    let log_name = program.clone();
    let stderr_task = tokio::spawn(async move {
        let mut last_line = None;
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(tool = %log_name, "{}", line);
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    last_line = Some(trimmed.to_string());
                }
            }
        }
        last_line
    });

    let status = tokio::select! {
        status = child.wait() => status?,
        _ = cancel.cancelled() => {
            warn!(tool = %program, "Cancelling external tool");
            if let Err(e) = child.kill().await {
                warn!(tool = %program, error = %e, "Failed to kill external tool");
            }
            stderr_task.abort();
            return Err(ToolError::Cancelled { program });
        }
    };

    let detail = stderr_task.await.ok().flatten().unwrap_or_default();

    if status.success() {
        info!(tool = %program, "External tool finished");
        Ok(())
    } else {
        warn!(tool = %program, status = %status, "External tool failed");
        Err(ToolError::Failed {
            program,
            status: status.to_string(),
            detail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let runner = ProcessRunner::new();
        let result = runner
            .run(
                ToolInvocation::new("polytiles-definitely-not-installed"),
                CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(ToolError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_exit() {
        let runner = ProcessRunner::new();
        let result = runner
            .run(
                ToolInvocation::new("sh").args(["-c", "exit 0"]),
                CancellationToken::new(),
            )
            .await;

        assert!(result.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_exit_reports_last_stderr_line() {
        let runner = ProcessRunner::new();
        let result = runner
            .run(
                ToolInvocation::new("sh").args(["-c", "echo first >&2; echo 'bad input' >&2; exit 3"]),
                CancellationToken::new(),
            )
            .await;

        match result {
            Err(ToolError::Failed { program, detail, .. }) => {
                assert_eq!(program, "sh");
                assert_eq!(detail, "bad input");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_kills_process() {
        let runner = ProcessRunner::new();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            runner.run(ToolInvocation::new("sleep").arg("30"), cancel),
        )
        .await
        .expect("cancellation should stop the process quickly");

        assert!(matches!(result, Err(ToolError::Cancelled { .. })));
    }
}
