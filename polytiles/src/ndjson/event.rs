//! Wire events emitted by the stream adapter.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One line of the ndjson progress stream.
///
/// Serialized with an `event` tag:
///
/// ```text
/// {"event":"progress","progress":3}
/// {"event":"message","message":"Generating tiles"}
/// {"event":"done"}
/// {"event":"error","error":"tippecanoe exited with exit status: 1"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// The progress value changed.
    Progress { progress: i64 },
    /// The status message changed.
    Message { message: String },
    /// The work completed successfully. Always the last line.
    Done,
    /// The work failed. Always the last line.
    Error { error: String },
}

impl ProgressEvent {
    /// Returns true for `done` and `error`, after which nothing else is sent.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }

    /// Encodes the event as one JSON object followed by a newline.
    pub fn to_line(&self) -> Result<Bytes, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(Bytes::from(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let cases = [
            (
                ProgressEvent::Progress { progress: 2 },
                "{\"event\":\"progress\",\"progress\":2}\n",
            ),
            (
                ProgressEvent::Message {
                    message: "Generating tiles".to_string(),
                },
                "{\"event\":\"message\",\"message\":\"Generating tiles\"}\n",
            ),
            (ProgressEvent::Done, "{\"event\":\"done\"}\n"),
            (
                ProgressEvent::Error {
                    error: "boom".to_string(),
                },
                "{\"event\":\"error\",\"error\":\"boom\"}\n",
            ),
        ];

        for (event, expected) in cases {
            assert_eq!(event.to_line().unwrap(), Bytes::from(expected));
        }
    }

    #[test]
    fn test_terminal_events() {
        assert!(ProgressEvent::Done.is_terminal());
        assert!(ProgressEvent::Error {
            error: String::new()
        }
        .is_terminal());
        assert!(!ProgressEvent::Progress { progress: 0 }.is_terminal());
    }

    #[test]
    fn test_parses_client_side() {
        let event: ProgressEvent = serde_json::from_str("{\"event\":\"progress\",\"progress\":5}").unwrap();
        assert_eq!(event, ProgressEvent::Progress { progress: 5 });
    }
}
