//! Progress over a fixed queue of steps.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::ProgressError;
use super::state::ProgressState;
use super::step::{run_step, Step};
use super::Progress;

/// Runs a queue of steps one after another, counting up by one per step.
///
/// The runner is spawned on the current tokio runtime at construction but
/// does not run a step until [`start`](Progress::start) or
/// [`done`](Progress::done) is called, so subscribers registered right after
/// `new` observe the initial state first. When the queue is empty the
/// progress completes.
///
/// A failing or panicking step ends the run: its message is reported with
/// the error flag, [`done()`](Progress::done) resolves to the error, and no
/// further steps run.
///
/// # Panics
///
/// `new` must be called from within a tokio runtime.
#[derive(Clone)]
pub struct SimpleProgress {
    state: ProgressState,
    shared: Arc<Shared>,
}

struct Shared {
    steps: Mutex<VecDeque<Step>>,
    cancel: CancellationToken,
    aborted: AtomicBool,
    started: AtomicBool,
    gate: Notify,
}

impl SimpleProgress {
    /// Creates the progress. Steps run in order once it is started.
    pub fn new(message: impl Into<String>, steps: impl IntoIterator<Item = Step>) -> Self {
        let progress = Self {
            state: ProgressState::new(message),
            shared: Arc::new(Shared {
                steps: Mutex::new(steps.into_iter().collect()),
                cancel: CancellationToken::new(),
                aborted: AtomicBool::new(false),
                started: AtomicBool::new(false),
                gate: Notify::new(),
            }),
        };

        let runner = progress.clone();
        tokio::spawn(runner.run());
        progress
    }

    /// Returns the number of steps not yet started.
    pub fn remaining(&self) -> usize {
        self.shared.steps.lock().len()
    }

    fn is_aborted(&self) -> bool {
        self.shared.aborted.load(Ordering::SeqCst)
    }

    async fn run(self) {
        self.shared.gate.notified().await;

        loop {
            if self.is_aborted() {
                return;
            }

            let next = self.shared.steps.lock().pop_front();
            let Some(step) = next else {
                self.state.set_complete();
                return;
            };

            let result = run_step(step, self.shared.cancel.child_token()).await;
            if self.is_aborted() {
                debug!(message = %self.state.message(), "Step finished after abort");
                return;
            }

            match result {
                Ok(()) => self.state.set_progress((self.state.value() + 1) as f64),
                Err(error) => {
                    warn!(message = %self.state.message(), error = %error, "Step failed");
                    self.shared.steps.lock().clear();
                    self.state.set_message(error.message(), true);
                    self.state.fail(ProgressError::from(&error));
                    return;
                }
            }
        }
    }
}

impl Progress for SimpleProgress {
    fn state(&self) -> &ProgressState {
        &self.state
    }

    fn start(&self) {
        if !self.shared.started.swap(true, Ordering::SeqCst) {
            self.shared.gate.notify_one();
        }
    }

    fn aborting(&self) {
        self.shared.aborted.store(true, Ordering::SeqCst);
        self.shared.steps.lock().clear();
        self.shared.cancel.cancel();
        // Let a runner that was never started exit.
        self.start();
    }
}

impl std::fmt::Debug for SimpleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleProgress")
            .field("state", &self.state)
            .field("remaining", &self.remaining())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{step, StepError};
    use std::sync::atomic::AtomicUsize;

    fn ok_step() -> Step {
        step(|_| async { Ok(()) })
    }

    fn panicking_step(message: &'static str) -> Step {
        step(move |_| async move {
            if !message.is_empty() {
                panic!("{}", message);
            }
            Ok(())
        })
    }

    fn record_progress(progress: &SimpleProgress) -> Arc<Mutex<Vec<i64>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        progress.on_progress(move |value| sink.lock().push(value));
        seen
    }

    #[tokio::test]
    async fn test_counts_one_per_step() {
        let progress = SimpleProgress::new("counting", vec![ok_step(), ok_step(), ok_step()]);
        let seen = record_progress(&progress);

        assert_eq!(progress.done().await, Ok(()));
        assert_eq!(*seen.lock(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_queue_completes_immediately() {
        let progress = SimpleProgress::new("nothing to do", Vec::new());
        let seen = record_progress(&progress);
        let completed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completed);
        progress.on_complete(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(progress.done().await, Ok(()));
        assert_eq!(*seen.lock(), vec![0]);
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_initial_state_observed_before_first_step() {
        let progress = SimpleProgress::new("starting", vec![ok_step()]);
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        progress.on_message(move |text, _| sink.lock().push(text.to_string()));

        assert_eq!(progress.value(), 0);
        progress.done().await.unwrap();
        assert_eq!(*messages.lock(), vec!["starting".to_string()]);
    }

    #[tokio::test]
    async fn test_steps_run_sequentially() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let steps: Vec<Step> = (0..3)
            .map(|index| {
                let order = Arc::clone(&order);
                step(move |_| async move {
                    order.lock().push(format!("start {}", index));
                    tokio::task::yield_now().await;
                    order.lock().push(format!("end {}", index));
                    Ok(())
                })
            })
            .collect();

        let progress = SimpleProgress::new("ordered", steps);
        progress.done().await.unwrap();

        assert_eq!(
            *order.lock(),
            vec!["start 0", "end 0", "start 1", "end 1", "start 2", "end 2"]
        );
    }

    #[tokio::test]
    async fn test_failing_step_stops_the_run() {
        let ran_after = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran_after);
        let progress = SimpleProgress::new(
            "converting",
            vec![
                ok_step(),
                step(|_| async { Err(StepError::new("boom")) }),
                step(move |_| async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }),
            ],
        );

        assert_eq!(
            progress.done().await,
            Err(ProgressError::Failed("boom".to_string()))
        );
        assert_eq!(progress.value(), 1);
        assert_eq!(progress.state().message(), "boom");
        assert!(progress.state().is_error());
        assert!(!ran_after.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_abort_clears_queue_and_cancels_running_step() {
        let started = Arc::new(AtomicBool::new(false));
        let observed_cancel = Arc::new(AtomicBool::new(false));
        let (started_flag, cancel_flag) = (Arc::clone(&started), Arc::clone(&observed_cancel));
        let progress = SimpleProgress::new(
            "long job",
            vec![
                step(move |cancel| async move {
                    started_flag.store(true, Ordering::SeqCst);
                    cancel.cancelled().await;
                    cancel_flag.store(true, Ordering::SeqCst);
                    Err(StepError::cancelled())
                }),
                ok_step(),
            ],
        );

        progress.start();
        while !started.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        assert_eq!(progress.remaining(), 1);

        progress.abort();
        assert_eq!(progress.remaining(), 0);
        assert_eq!(progress.done().await, Ok(()));

        for _ in 0..10 {
            if observed_cancel.load(Ordering::SeqCst) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(observed_cancel.load(Ordering::SeqCst));
        assert_eq!(progress.value(), 0);
        assert!(!progress.state().is_error());
    }

    #[tokio::test]
    async fn test_caller_list_is_copied() {
        let mut steps = vec![ok_step()];
        let progress = SimpleProgress::new("copied", steps.drain(..));
        steps.push(ok_step());

        progress.done().await.unwrap();
        assert_eq!(progress.value(), 1);
    }

    #[tokio::test]
    async fn test_nothing_runs_before_start() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let progress = SimpleProgress::new(
            "gated",
            vec![step(move |_| async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })],
        );

        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(progress.remaining(), 1);

        progress.start();
        progress.start();
        progress.done().await.unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_subscriber_sees_every_value_on_multi_thread_runtime() {
        for _ in 0..200 {
            let progress = SimpleProgress::new("racing", vec![ok_step(), ok_step()]);
            let seen = record_progress(&progress);

            assert_eq!(progress.done().await, Ok(()));
            assert_eq!(*seen.lock(), vec![0, 1, 2]);
        }
    }

    #[tokio::test]
    async fn test_panicking_step_fails_the_run() {
        let progress = SimpleProgress::new(
            "converting",
            vec![
                ok_step(),
                panicking_step("tool wrapper bug"),
                ok_step(),
            ],
        );

        let outcome = tokio::time::timeout(std::time::Duration::from_secs(5), progress.done())
            .await
            .expect("a panicking step must still finish the progress");

        assert_eq!(
            outcome,
            Err(ProgressError::Failed("panicked: tool wrapper bug".to_string()))
        );
        assert_eq!(progress.value(), 1);
        assert!(progress.state().is_error());
        assert_eq!(progress.remaining(), 0);
    }

    #[tokio::test]
    async fn test_abort_before_start_completes() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let progress = SimpleProgress::new(
            "never started",
            vec![step(move |_| async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })],
        );

        progress.abort();
        assert_eq!(progress.done().await, Ok(()));
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!ran.load(Ordering::SeqCst));
    }
}
