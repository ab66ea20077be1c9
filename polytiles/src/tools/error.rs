//! Error types for external tool execution.

use thiserror::Error;

use crate::progress::StepError;

/// Errors that can occur while running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The program could not be started (not installed, not executable, ...).
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("{program} exited with {status}{}", detail_suffix(.detail))]
    Failed {
        program: String,
        status: String,
        detail: String,
    },

    /// The run was cancelled and the process killed.
    #[error("{program} was cancelled")]
    Cancelled { program: String },

    /// I/O error while waiting on the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {}", detail)
    }
}

impl From<ToolError> for StepError {
    fn from(error: ToolError) -> Self {
        match error {
            ToolError::Cancelled { .. } => StepError::cancelled(),
            other => StepError::new(other.to_string()).with_source(other),
        }
    }
}
