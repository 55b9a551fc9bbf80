//! Dispatch failure causes
//!
//! Every variant surfaces to the user as the same server error entry. The
//! cause is kept only for logging.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("backend panicked while handling the request")]
    Panicked,
}

/// Why a dispatch operation returned without contacting the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The question was empty after trimming
    EmptyInput,
    /// Another request was already in flight
    Busy,
}

/// The path a dispatch operation took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Skipped(SkipReason),
    Answered,
    Diagnosed,
    Failed,
}
