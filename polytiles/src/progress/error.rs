//! Error types for the progress module.

use std::fmt;

use thiserror::Error;

/// Terminal failure of a progress tree.
///
/// This is what [`done()`](super::Progress::done) resolves to when a step or
/// producer fails. The display text is the original failure message without
/// any prefix, so it can be shown to users as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    /// A step or producer failed.
    #[error("{0}")]
    Failed(String),

    /// Every handle to the progress was dropped before it finished.
    #[error("progress was dropped before completion")]
    Dropped,
}

impl From<&StepError> for ProgressError {
    fn from(error: &StepError) -> Self {
        ProgressError::Failed(error.message().to_string())
    }
}

impl From<StepError> for ProgressError {
    fn from(error: StepError) -> Self {
        ProgressError::from(&error)
    }
}

/// Error returned by a step or a producer.
#[derive(Debug)]
pub struct StepError {
    /// Human-readable error message.
    message: String,
    /// Whether the step stopped because it was cancelled.
    cancelled: bool,
    /// Optional source error.
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StepError {
    /// Creates a new step error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cancelled: false,
            source: None,
        }
    }

    /// Creates an error for a step that observed its cancellation token.
    pub fn cancelled() -> Self {
        Self {
            message: "cancelled".to_string(),
            cancelled: true,
            source: None,
        }
    }

    /// Attaches a source error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates an error from a caught panic payload.
    pub fn panicked(payload: Box<dyn std::any::Any + Send>) -> Self {
        let detail = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::new(format!("panicked: {}", detail))
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if the step was cancelled rather than failing on its own.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &_)
    }
}

impl From<std::io::Error> for StepError {
    fn from(error: std::io::Error) -> Self {
        StepError::new(error.to_string()).with_source(error)
    }
}
