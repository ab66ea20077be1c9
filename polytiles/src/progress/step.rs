//! Units of work driven by the composite progress types.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use super::error::StepError;
use super::AnyProgress;

/// Result of running one step.
pub type StepResult = Result<(), StepError>;

/// One asynchronous unit of work run by a [`SimpleProgress`](super::SimpleProgress).
///
/// The token is cancelled when the owning progress is aborted. Steps that
/// wrap long-running work should watch it and stop early.
pub type Step = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, StepResult> + Send>;

/// Lazily creates the next child of a [`ConcatenatedProgress`](super::ConcatenatedProgress).
pub type Producer =
    Box<dyn FnOnce() -> BoxFuture<'static, Result<AnyProgress, StepError>> + Send>;

/// Boxes an async closure into a [`Step`].
pub fn step<F, Fut>(f: F) -> Step
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = StepResult> + Send + 'static,
{
    Box::new(move |cancel| Box::pin(f(cancel)))
}

/// Boxes a synchronous constructor into a [`Producer`].
pub fn producer<F, P>(f: F) -> Producer
where
    F: FnOnce() -> P + Send + 'static,
    P: Into<AnyProgress>,
{
    Box::new(move || {
        let progress = f().into();
        Box::pin(async move { Ok(progress) })
    })
}

/// Boxes an asynchronous, fallible constructor into a [`Producer`].
pub fn producer_async<F, Fut, P>(f: F) -> Producer
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<P, StepError>> + Send + 'static,
    P: Into<AnyProgress> + 'static,
{
    Box::new(move || Box::pin(async move { f().await.map(Into::into) }))
}

/// Runs `step`, turning a panic into a [`StepError`].
pub(crate) async fn run_step(step: Step, cancel: CancellationToken) -> StepResult {
    AssertUnwindSafe(async move { step(cancel).await })
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(StepError::panicked(payload)))
}

/// Runs `producer`, turning a panic into a [`StepError`].
pub(crate) async fn run_producer(producer: Producer) -> Result<AnyProgress, StepError> {
    AssertUnwindSafe(async move { producer().await })
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(StepError::panicked(payload)))
}
