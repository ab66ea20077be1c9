//! Newline-delimited JSON view of a progress.
//!
//! [`progress_to_stream`] subscribes to a progress and yields one JSON object
//! per line, suitable for a chunked HTTP response body. Clients can parse the
//! body incrementally, one line at a time.
//!
//! ```text
//! Progress ──► callbacks ──► channel ──► ProgressEvent ──► Bytes ("...\n")
//!    └── done() ──────────────┘            (ends after done / error)
//! ```

mod event;

pub use event::ProgressEvent;

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::progress::Progress;

/// Content type of the stream produced by [`progress_to_stream`].
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Turns a progress into a stream of ndjson lines.
///
/// - Progress updates are sent only when the value differs from the last one
///   sent.
/// - Message updates are always sent.
/// - The stream ends after exactly one `done` or `error` line.
/// - If `cancel` fires first, nothing more is sent and the stream ends. The
///   progress itself is not aborted; wire that up separately if needed.
///
/// The adapter registers the progress and message subscribers, so it must be
/// the only subscriber of `progress`. Must be called within a tokio runtime.
pub fn progress_to_stream<P>(
    progress: P,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static
where
    P: Progress + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    let last_sent = Arc::new(Mutex::new(None::<i64>));
    let progress_tx = tx.clone();
    progress.on_progress(move |value| {
        let mut last_sent = last_sent.lock();
        if *last_sent == Some(value) {
            return;
        }
        *last_sent = Some(value);
        let _ = progress_tx.send(ProgressEvent::Progress { progress: value });
    });

    let message_tx = tx.clone();
    progress.on_message(move |text, _is_error| {
        let _ = message_tx.send(ProgressEvent::Message {
            message: text.to_string(),
        });
    });

    let done = progress.done();
    tokio::spawn(async move {
        let event = match done.await {
            Ok(()) => ProgressEvent::Done,
            Err(error) => ProgressEvent::Error {
                error: error.to_string(),
            },
        };
        debug!(event = ?event, "Progress finished");
        let _ = tx.send(event);
    });

    events_until_terminal(rx)
        .take_until(cancel.cancelled_owned())
        .filter_map(|event| async move {
            match event.to_line() {
                Ok(line) => Some(Ok(line)),
                Err(error) => {
                    warn!(error = %error, "Failed to encode progress event");
                    None
                }
            }
        })
}

/// Yields events up to and including the first terminal one.
fn events_until_terminal(
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
) -> impl Stream<Item = ProgressEvent> + Send + 'static {
    stream::unfold((rx, false), |(mut rx, finished)| async move {
        if finished {
            return None;
        }
        let event = rx.recv().await?;
        let finished = event.is_terminal();
        Some((event, (rx, finished)))
    })
}
