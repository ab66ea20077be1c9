//! Composable, observable, cancelable units of work.
//!
//! A progress reports three things: an integer value, a status message with a
//! sticky error flag, and completion. Long-running pipelines are built by
//! composing the two variants:
//!
//! - [`SimpleProgress`] runs a queue of async [`Step`]s, counting up by one
//!   per finished step.
//! - [`ConcatenatedProgress`] runs lazily produced children strictly in
//!   sequence, forwarding their events.
//!
//! Both implement the [`Progress`] capability trait and are gathered in the
//! closed [`AnyProgress`] union, which is what producers return.
//!
//! # Example
//!
//! ```ignore
//! use polytiles::progress::{producer, step, ConcatenatedProgress, Progress, SimpleProgress};
//!
//! let pipeline = ConcatenatedProgress::new(vec![
//!     producer(|| SimpleProgress::new("Generating tiles", vec![step(|_| async { Ok(()) })])),
//!     producer(|| SimpleProgress::new("Converting", vec![step(|_| async { Ok(()) })])),
//! ]);
//!
//! pipeline.on_progress(|value| println!("progress {}", value));
//! pipeline.done().await?;
//! ```
//!
//! # Concurrency
//!
//! Each composite spawns one runner task on the current tokio runtime. The
//! runner waits until [`Progress::start`] (or [`Progress::done`]) is called,
//! so subscribers registered before that see every event, whichever worker
//! thread the runner lands on. A concatenation starts each child only after
//! subscribing to it. Within one tree exactly one step or child is in flight
//! at any time. Subscribers are called synchronously from the setter that
//! emitted the event.
//!
//! A panicking step or producer fails the progress like a returned error.
//!
//! # Cancellation
//!
//! [`Progress::abort`] stops all future work and completes the progress. The
//! step in flight receives a cancelled [`CancellationToken`] and is expected
//! to stop whatever it is waiting on (the external tool step kills its child
//! process).
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod concatenated;
mod error;
mod simple;
mod state;
mod step;

use futures::future::BoxFuture;

pub use concatenated::ConcatenatedProgress;
pub use error::{ProgressError, StepError};
pub use simple::SimpleProgress;
pub use state::{Outcome, ProgressState};
pub use step::{producer, producer_async, step, Producer, Step, StepResult};

/// Capability interface shared by every progress variant.
///
/// Implementors provide the shared [`ProgressState`], a `start` gate and an
/// `aborting` hook; everything else is provided.
pub trait Progress: Send + Sync {
    /// Returns the shared observable state.
    fn state(&self) -> &ProgressState;

    /// Lets the runner begin. Idempotent.
    fn start(&self);

    /// Cancels queued and in-flight work. Called by [`abort`](Self::abort)
    /// before the progress is completed.
    fn aborting(&self);

    /// Returns the current value.
    fn value(&self) -> i64 {
        self.state().value()
    }

    /// See [`ProgressState::set_progress`].
    fn set_progress(&self, value: f64) {
        self.state().set_progress(value);
    }

    /// See [`ProgressState::set_message`].
    fn set_message(&self, text: impl Into<String>, is_error: bool)
    where
        Self: Sized,
    {
        self.state().set_message(text, is_error);
    }

    /// See [`ProgressState::set_complete`].
    fn set_complete(&self) {
        self.state().set_complete();
    }

    /// See [`ProgressState::on_progress`].
    fn on_progress<F>(&self, callback: F)
    where
        F: Fn(i64) + Send + Sync + 'static,
        Self: Sized,
    {
        self.state().on_progress(callback);
    }

    /// See [`ProgressState::on_message`].
    fn on_message<F>(&self, callback: F)
    where
        F: Fn(&str, bool) + Send + Sync + 'static,
        Self: Sized,
    {
        self.state().on_message(callback);
    }

    /// See [`ProgressState::on_complete`].
    fn on_complete<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
        Self: Sized,
    {
        self.state().on_complete(callback);
    }

    /// Stops future work, then completes.
    ///
    /// Abort always ends in a completed state, never a failed one. Callers
    /// that want to report an error should set an error message first.
    fn abort(&self) {
        self.aborting();
        self.set_complete();
    }

    /// Starts the progress if needed and resolves once it has completed or
    /// failed.
    fn done(&self) -> BoxFuture<'static, Outcome> {
        self.start();
        Box::pin(self.state().done())
    }
}

/// The closed set of progress variants.
#[derive(Clone, Debug)]
pub enum AnyProgress {
    /// A queue of steps.
    Simple(SimpleProgress),
    /// A chain of children.
    Concatenated(ConcatenatedProgress),
}

impl Progress for AnyProgress {
    fn state(&self) -> &ProgressState {
        match self {
            AnyProgress::Simple(progress) => progress.state(),
            AnyProgress::Concatenated(progress) => progress.state(),
        }
    }

    fn start(&self) {
        match self {
            AnyProgress::Simple(progress) => progress.start(),
            AnyProgress::Concatenated(progress) => progress.start(),
        }
    }

    fn aborting(&self) {
        match self {
            AnyProgress::Simple(progress) => progress.aborting(),
            AnyProgress::Concatenated(progress) => progress.aborting(),
        }
    }
}

impl From<SimpleProgress> for AnyProgress {
    fn from(progress: SimpleProgress) -> Self {
        AnyProgress::Simple(progress)
    }
}

impl From<ConcatenatedProgress> for AnyProgress {
    fn from(progress: ConcatenatedProgress) -> Self {
        AnyProgress::Concatenated(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    #[tokio::test]
    async fn test_nested_concatenation() {
        let inner = || {
            ConcatenatedProgress::new(vec![producer(|| {
                SimpleProgress::new("inner", vec![step(|_| async { Ok(()) })])
            })])
        };
        let outer = ConcatenatedProgress::new(vec![producer(inner), producer(inner)]);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        outer.on_progress(move |value| sink.lock().push(value));

        assert_eq!(outer.done().await, Ok(()));
        assert_eq!(*seen.lock(), vec![0, 1, 0, 1]);
    }

    #[tokio::test]
    async fn test_any_progress_dispatches_abort() {
        let progress: AnyProgress = SimpleProgress::new(
            "waiting",
            vec![step(|cancel| async move {
                cancel.cancelled().await;
                Err(StepError::cancelled())
            })],
        )
        .into();

        progress.abort();
        assert_eq!(progress.done().await, Ok(()));
        assert!(progress.state().is_finished());
    }
}
