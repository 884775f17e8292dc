/// Failures reported by a [`crate::SearchClient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("request aborted")]
    Aborted,
    #[error("already fetching timeline")]
    AlreadyFetching,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("cannot decode timeline page: {0}")]
    Decode(String),
}

impl SearchError {
    /// Cancellations and overlapping fetches: expected while polling, never shown.
    pub fn is_expected_race(&self) -> bool {
        matches!(self, SearchError::Aborted | SearchError::AlreadyFetching)
    }
}
