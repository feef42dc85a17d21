use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote-side failure worth retrying (connection drop, 5xx, rate limit).
    #[error("remote service error: {0}")]
    Remote(String),

    /// The subject does not exist on the remote service. Never retried.
    #[error("subject not found: {0}")]
    SubjectNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Expected end-of-feed signal, not a fault. Always caught by the
    /// direct caller and turned into user messaging.
    #[error("this is the last page")]
    LastPage,

    #[error("downloaded file did not decode as an image: {0}")]
    CorruptImage(PathBuf),

    #[error("config error: {0}")]
    Config(String),

    /// Invariant violation in local state, e.g. a previous page missing
    /// from the session cache. Not expected to occur.
    #[error("invalid local state: {0}")]
    State(String),
}

impl Error {
    /// Whether a failed operation may succeed if simply re-issued.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Remote(_) => true,
            Error::Http(e) => {
                e.is_connect()
                    || e.is_timeout()
                    || e.status().is_some_and(|s| {
                        s.is_server_error() || s == reqwest::StatusCode::TOO_MANY_REQUESTS
                    })
            }
            _ => false,
        }
    }
}
