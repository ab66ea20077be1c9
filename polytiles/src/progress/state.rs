//! Observable state shared by every progress variant.
//!
//! [`ProgressState`] holds the current value, the status message with its
//! sticky error flag, one subscriber per channel, and the final outcome.
//! Handles are cheap to clone; all clones observe the same state.
//!
//! # Subscribers
//!
//! Each channel has a single slot. Registering a new callback replaces the
//! previous one. Progress and message subscribers are called once with the
//! current state on registration, so a late subscriber never misses the
//! latest known value.
//!
//! Callbacks run synchronously inside the setter that triggered them, after
//! the internal lock has been released. A callback may therefore call back
//! into the same state.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::error::ProgressError;

/// Callback for the progress channel.
pub type ProgressCallback = Arc<dyn Fn(i64) + Send + Sync>;

/// Callback for the message channel: `(text, is_error)`.
pub type MessageCallback = Arc<dyn Fn(&str, bool) + Send + Sync>;

/// Callback for the completion channel.
pub type CompleteCallback = Arc<dyn Fn() + Send + Sync>;

/// Final outcome of a progress tree.
pub type Outcome = Result<(), ProgressError>;

/// Shared observable state behind a progress handle.
#[derive(Clone)]
pub struct ProgressState {
    inner: Arc<Inner>,
}

struct Inner {
    fields: Mutex<Fields>,
    outcome: watch::Sender<Option<Outcome>>,
}

struct Fields {
    value: i64,
    message: String,
    is_error: bool,
    on_progress: Option<ProgressCallback>,
    on_message: Option<MessageCallback>,
    on_complete: Option<CompleteCallback>,
}

impl ProgressState {
    /// Creates a state with the given initial message and a value of zero.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_value(message, 0)
    }

    /// Creates a state with an initial message and value.
    pub fn with_value(message: impl Into<String>, value: i64) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                fields: Mutex::new(Fields {
                    value,
                    message: message.into(),
                    is_error: false,
                    on_progress: None,
                    on_message: None,
                    on_complete: None,
                }),
                outcome,
            }),
        }
    }

    /// Returns the current progress value.
    pub fn value(&self) -> i64 {
        self.inner.fields.lock().value
    }

    /// Returns the current status message.
    pub fn message(&self) -> String {
        self.inner.fields.lock().message.clone()
    }

    /// Returns true once any message has been reported as an error.
    pub fn is_error(&self) -> bool {
        self.inner.fields.lock().is_error
    }

    /// Returns true once the outcome has been decided.
    pub fn is_finished(&self) -> bool {
        self.inner.outcome.borrow().is_some()
    }

    /// Sets the progress value, rounded to the nearest integer.
    ///
    /// Does nothing if the rounded value equals the current one. No bounds
    /// checking is done: negative or decreasing values are accepted.
    pub fn set_progress(&self, value: f64) {
        let rounded = value.round() as i64;
        let callback = {
            let mut fields = self.inner.fields.lock();
            if fields.value == rounded {
                return;
            }
            fields.value = rounded;
            fields.on_progress.clone()
        };
        if let Some(callback) = callback {
            callback(rounded);
        }
    }

    /// Sets the status message.
    ///
    /// Does nothing if both the text and the flag equal the current ones.
    /// The error flag is sticky: once set it is never cleared, and every
    /// later notification reports it.
    pub fn set_message(&self, text: impl Into<String>, is_error: bool) {
        let text = text.into();
        let (callback, text, is_error) = {
            let mut fields = self.inner.fields.lock();
            if fields.message == text && fields.is_error == is_error {
                return;
            }
            fields.message = text;
            fields.is_error |= is_error;
            (
                fields.on_message.clone(),
                fields.message.clone(),
                fields.is_error,
            )
        };
        if let Some(callback) = callback {
            callback(&text, is_error);
        }
    }

    /// Marks the work as complete and notifies the completion subscriber.
    ///
    /// A failure recorded earlier is kept; completion never overwrites it.
    pub fn set_complete(&self) {
        self.inner.outcome.send_if_modified(|outcome| {
            if outcome.is_none() {
                *outcome = Some(Ok(()));
                true
            } else {
                false
            }
        });
        let callback = self.inner.fields.lock().on_complete.clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Records a terminal failure. The completion subscriber is not called.
    pub(crate) fn fail(&self, error: ProgressError) {
        self.inner.outcome.send_if_modified(|outcome| {
            if outcome.is_none() {
                *outcome = Some(Err(error));
                true
            } else {
                false
            }
        });
    }

    /// Registers the progress subscriber and replays the current value.
    pub fn on_progress<F>(&self, callback: F)
    where
        F: Fn(i64) + Send + Sync + 'static,
    {
        let callback: ProgressCallback = Arc::new(callback);
        let value = {
            let mut fields = self.inner.fields.lock();
            fields.on_progress = Some(Arc::clone(&callback));
            fields.value
        };
        callback(value);
    }

    /// Registers the message subscriber and replays the current message.
    pub fn on_message<F>(&self, callback: F)
    where
        F: Fn(&str, bool) + Send + Sync + 'static,
    {
        let callback: MessageCallback = Arc::new(callback);
        let (message, is_error) = {
            let mut fields = self.inner.fields.lock();
            fields.on_message = Some(Arc::clone(&callback));
            (fields.message.clone(), fields.is_error)
        };
        callback(&message, is_error);
    }

    /// Registers the completion subscriber. There is no replay.
    pub fn on_complete<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.fields.lock().on_complete = Some(Arc::new(callback));
    }

    /// Returns a future that resolves once the outcome is decided.
    ///
    /// Resolves to `Ok(())` after completion (including abort) and to the
    /// recorded error after a failure.
    pub fn done(&self) -> impl Future<Output = Outcome> + Send + 'static {
        let mut rx = self.inner.outcome.subscribe();
        async move {
            let outcome = rx
                .wait_for(Option::is_some)
                .await
                .map(|outcome| (*outcome).clone());
            match outcome {
                Ok(Some(outcome)) => outcome,
                Ok(None) => Ok(()),
                Err(_) => Err(ProgressError::Dropped),
            }
        }
    }
}

impl std::fmt::Debug for ProgressState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields = self.inner.fields.lock();
        f.debug_struct("ProgressState")
            .field("value", &fields.value)
            .field("message", &fields.message)
            .field("is_error", &fields.is_error)
            .finish()
    }
}
