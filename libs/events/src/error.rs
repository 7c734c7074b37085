//! Decode and parse failures for dispatch events.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EventError {
    #[error("unknown event type `{0}`")]
    UnknownEventType(String),

    #[error("{event_type} has no schema for version {version}")]
    UnsupportedVersion { event_type: String, version: i32 },

    /// A status string outside the shared vocabulary.
    #[error("unknown {kind} status `{value}`")]
    UnknownStatus { kind: &'static str, value: String },

    /// An envelope header field disagrees with what the payload implies.
    #[error("envelope {field} is `{header}` but the payload says `{payload}`")]
    HeaderMismatch {
        field: &'static str,
        header: String,
        payload: String,
    },

    #[error("malformed event json: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::Decode(err.to_string())
    }
}
