//! Shared server state.

use std::sync::Arc;

use crate::tools::{ProcessRunner, ToolRunner, ToolsConfig};

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Tool locations and intermediate file directory.
    pub tools: ToolsConfig,
    /// Runs the external tools.
    pub runner: Arc<dyn ToolRunner>,
}

impl AppState {
    /// Creates state with a custom tool runner.
    pub fn new(tools: ToolsConfig, runner: Arc<dyn ToolRunner>) -> Self {
        Self { tools, runner }
    }

    /// Creates state that runs tools as real child processes.
    pub fn with_process_runner(tools: ToolsConfig) -> Self {
        Self::new(tools, Arc::new(ProcessRunner::new()))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}
