use thiserror::Error;

/// Result type alias for client operations
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Errors surfaced by the analysis client.
///
/// Variants carry owned strings rather than source errors so one outcome can
/// be cloned to every caller joined on an in-flight request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("invalid request: {0}")]
    InvalidArgument(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Authentication challenge from the backend. Handled inside the retry
    /// policy; callers only ever observe `SessionExpired`.
    #[error("authentication required")]
    AuthRequired,

    #[error("session expired, sign in again")]
    SessionExpired,

    #[error("server error {status}: {detail}")]
    ServerError { status: u16, detail: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidArgument(format!("bad endpoint path: {err}"))
    }
}
