//! External tool execution.
//!
//! The conversion pipeline shells out to two programs: a tile generator
//! (`tippecanoe`) and a tile container converter (`versatiles`). This module
//! wraps "run program X with these arguments" behind the [`ToolRunner`]
//! trait so the pipeline can be exercised without the real binaries.
//!
//! [`ProcessRunner`] is the production implementation. It forwards the
//! child's stderr to `tracing` and kills the child when the step is
//! cancelled.

mod error;
mod process;

pub use error::ToolError;
pub use process::ProcessRunner;

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::progress::{step, Step};

/// Default tile generator executable.
pub const DEFAULT_TIPPECANOE: &str = "tippecanoe";

/// Default tile container converter executable.
pub const DEFAULT_VERSATILES: &str = "versatiles";

/// Where to find the external tools and where to put intermediate files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolsConfig {
    /// Tile generator executable (name on `PATH` or absolute path).
    pub tippecanoe: String,

    /// Tile container converter executable.
    pub versatiles: String,

    /// Directory for intermediate files. `None` uses the system temp dir.
    pub temp_dir: Option<PathBuf>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            tippecanoe: DEFAULT_TIPPECANOE.to_string(),
            versatiles: DEFAULT_VERSATILES.to_string(),
            temp_dir: None,
        }
    }
}

impl ToolsConfig {
    /// Returns the directory for intermediate files.
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// One program invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Executable name or path.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
}

impl ToolInvocation {
    /// Creates an invocation with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs external programs to completion.
///
/// Uses `Pin<Box<dyn Future>>` so runners can be shared as trait objects.
pub trait ToolRunner: Send + Sync + 'static {
    /// Runs `invocation`, resolving once the program exits.
    ///
    /// Implementations must stop the program and return
    /// [`ToolError::Cancelled`] when `cancel` fires.
    fn run(
        &self,
        invocation: ToolInvocation,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), ToolError>> + Send>>;
}

/// Wraps one tool run as a progress [`Step`].
pub fn tool_step(runner: Arc<dyn ToolRunner>, invocation: ToolInvocation) -> Step {
    step(move |cancel| async move {
        runner.run(invocation, cancel).await?;
        Ok(())
    })
}
