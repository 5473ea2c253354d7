//! Client-side error type for backend calls.

use thiserror::Error;

/// Errors from talking to the persistence/generation backend.
///
/// There is no retry policy: a failed call is reported once and the caller
/// decides whether to resubmit.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connection, DNS, timeout).
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The record is missing an id required for this call.
    #[error("Record has no id: {0}")]
    MissingId(&'static str),

    /// A local file could not be read for upload.
    #[error("Upload failed: {0}")]
    Upload(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}
