//! Sequential composition of child progress values.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

use super::error::ProgressError;
use super::state::ProgressState;
use super::step::{run_producer, Producer};
use super::{AnyProgress, Progress};

/// Chains lazily produced children into one logical progress.
///
/// Producers are invoked one at a time, in order, once the progress is
/// started. Each child is subscribed to before it is started, and its
/// progress and message channels are forwarded verbatim to the parent, so
/// the parent value restarts with every child. The next producer is not
/// invoked until the current child has finished. When the queue is empty the
/// parent completes.
///
/// A failing or panicking producer, or a failing child, fails the parent
/// with the same error and no later producer is invoked.
///
/// # Panics
///
/// `new` must be called from within a tokio runtime.
#[derive(Clone)]
pub struct ConcatenatedProgress {
    state: ProgressState,
    shared: Arc<Shared>,
}

struct Shared {
    queue: Mutex<Queue>,
    started: AtomicBool,
    gate: Notify,
}

/// Pending producers and at most one running child. `aborted` lives under
/// the same lock so no producer is taken and no child installed after an
/// abort.
#[derive(Default)]
struct Queue {
    producers: VecDeque<Producer>,
    child: Option<AnyProgress>,
    aborted: bool,
}

impl ConcatenatedProgress {
    /// Creates the progress. Producers are invoked in order once it is
    /// started.
    pub fn new(producers: impl IntoIterator<Item = Producer>) -> Self {
        let progress = Self {
            state: ProgressState::new(""),
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue {
                    producers: producers.into_iter().collect(),
                    ..Queue::default()
                }),
                started: AtomicBool::new(false),
                gate: Notify::new(),
            }),
        };

        let runner = progress.clone();
        tokio::spawn(runner.run());
        progress
    }

    /// Returns the child currently running, if any.
    pub fn active(&self) -> Option<AnyProgress> {
        self.shared.queue.lock().child.clone()
    }

    /// Returns the number of producers not yet invoked.
    pub fn remaining(&self) -> usize {
        self.shared.queue.lock().producers.len()
    }

    fn is_aborted(&self) -> bool {
        self.shared.queue.lock().aborted
    }

    async fn run(self) {
        self.shared.gate.notified().await;

        loop {
            let next = {
                let mut queue = self.shared.queue.lock();
                if queue.aborted {
                    return;
                }
                queue.producers.pop_front()
            };
            let Some(producer) = next else {
                self.state.set_complete();
                return;
            };

            let child = match run_producer(producer).await {
                Ok(child) => child,
                Err(error) => {
                    if self.is_aborted() {
                        return;
                    }
                    warn!(error = %error, "Producer failed");
                    self.shared.queue.lock().producers.clear();
                    self.state.set_message(error.message(), true);
                    self.state.fail(ProgressError::from(&error));
                    return;
                }
            };

            {
                let mut queue = self.shared.queue.lock();
                if queue.aborted {
                    drop(queue);
                    debug!("Child produced after abort");
                    child.abort();
                    return;
                }
                queue.child = Some(child.clone());
            }

            let parent = self.state.clone();
            child.on_progress(move |value| parent.set_progress(value as f64));
            let parent = self.state.clone();
            child.on_message(move |text, is_error| parent.set_message(text, is_error));

            let outcome = child.done().await;
            self.shared.queue.lock().child = None;

            if self.is_aborted() {
                return;
            }
            if let Err(error) = outcome {
                warn!(error = %error, "Child progress failed");
                self.shared.queue.lock().producers.clear();
                self.state.fail(error);
                return;
            }
        }
    }
}

impl Progress for ConcatenatedProgress {
    fn state(&self) -> &ProgressState {
        &self.state
    }

    fn start(&self) {
        if !self.shared.started.swap(true, Ordering::SeqCst) {
            self.shared.gate.notify_one();
        }
    }

    fn aborting(&self) {
        let child = {
            let mut queue = self.shared.queue.lock();
            queue.aborted = true;
            queue.producers.clear();
            queue.child.take()
        };
        if let Some(child) = child {
            child.abort();
        }
        // Let a runner that was never started exit.
        self.start();
    }
}

impl std::fmt::Debug for ConcatenatedProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcatenatedProgress")
            .field("state", &self.state)
            .field("remaining", &self.remaining())
            .finish()
    }
}
