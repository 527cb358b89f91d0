use thiserror::Error;

/// Error taxonomy for everything the client core can surface.
///
/// `Network` and `Session` are deliberately payload-free: the UI renders a
/// fixed message for each, the distinction is what matters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Transport could not reach the server (connect failure, broken body,
    /// unparseable response on a 2xx).
    #[error("cannot connect to server")]
    Network,

    /// Server answered 403: token invalid or expired.
    #[error("invalid session")]
    Session,

    /// Server rejected the request with a structured error body.
    #[error("API error: {detail}")]
    Api { detail: String },

    /// Client-detected inconsistency, never sent over the wire.
    #[error("{0}")]
    Validation(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(_: reqwest::Error) -> Self {
        // Anything reqwest itself fails on (DNS, connect, reading the body)
        // is a transport problem as far as the UI is concerned.
        ClientError::Network
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
