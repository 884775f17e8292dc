use timeline_search::{CorrelationTag, SearchError, SearchFilter};
use tokio_util::sync::CancellationToken;

/// One activation of the poller: every request it issues carries `tag`, and
/// cancelling `token` stops the session from committing anything further.
#[derive(Debug, Clone)]
pub struct PollSession {
    tag: CorrelationTag,
    filter: SearchFilter,
    token: CancellationToken,
}

impl PollSession {
    pub fn new(filter: SearchFilter) -> Self {
        Self {
            tag: CorrelationTag::generate(),
            filter,
            token: CancellationToken::new(),
        }
    }

    pub fn tag(&self) -> &CorrelationTag {
        &self.tag
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

/// Result of one fetch cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// All pages arrived and replaced the resources.
    Merged { pages: usize, records: usize },
    /// A real failure, recorded in the state's `error`.
    Failed(SearchError),
    /// Another cycle under the same tag was running, or the client reported an
    /// expected race. Nothing changed.
    Skipped,
    /// The session was cancelled before results could be committed.
    Cancelled,
}
