//! Errors raised at the history and stream boundaries.
//!
//! None of these reach the user as a dialog: the components log them and the
//! dashboard simply stops updating (with the stream marked disconnected).

use thiserror::Error;

/// Failure talking to the vitals server.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Connection, TLS or body read failed
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Payload was not the expected JSON
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The event stream ended or failed mid-way
    #[error("stream terminated: {0}")]
    StreamTerminated(String),
}

pub type DashboardResult<T> = Result<T, DashboardError>;
