//! Shared error and result types for Gradeway

use thiserror::Error;

use crate::lti::launch::LaunchRejection;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, GradewayError>;

/// Top-level error type
///
/// Launch rejections are terminal for the request and surface as a
/// "cannot load records" state. Transport failures against the LRS block
/// the whole report; transport failures during grade passback do not
/// (they render as a "grade sync failed" note instead).
#[derive(Debug, Error)]
pub enum GradewayError {
    /// Inbound LTI launch failed verification
    #[error("launch rejected: {0}")]
    Launch(#[from] LaunchRejection),

    /// LRS or LMS returned a transport-level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration missing or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error (listener setup, key material)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP protocol error
    #[error("http error: {0}")]
    Http(#[from] hyper::Error),

    /// JSON encode/decode error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GradewayError {
    fn from(e: reqwest::Error) -> Self {
        GradewayError::Transport(e.to_string())
    }
}
