//! Contract of the paginated timeline search service, plus its wire format and an
//! in-process implementation.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use timeline_core::DailyRecord;
use uuid::Uuid;

mod error;
mod filter;
mod memory;
mod wire;

pub use error::SearchError;
pub use filter::{SearchFilter, DATE_RANGE_KEY};
pub use memory::MemorySearchClient;
pub use wire::{parse_page_str, parse_page_value, parse_records_str};

/// Records per page requested from the service.
pub const PAGE_LIMIT: u32 = 250;

/// Opaque identifier shared by every request of one polling session, so they can
/// be aborted together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationTag(String);

impl CorrelationTag {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Page window of a search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub limit: u32,
    /// Zero-based page index.
    pub offset: u32,
}

/// One page request sent to the search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Filter with the date-range sub-filter already removed.
    pub filter: SearchFilter,
    pub paging: Paging,
}

/// Per-request metadata; `tags` group requests for bulk abort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    pub tags: Vec<CorrelationTag>,
}

/// One page as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePage {
    /// `None` when the service sends `null` for an empty page.
    #[serde(default)]
    pub data: Option<Vec<DailyRecord>>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub earliest_date: Option<String>,
    #[serde(default)]
    pub latest_date: Option<String>,
}

/// Remote search service feeding the timeline.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search_timeline(
        &self,
        request: SearchRequest,
        options: RequestOptions,
    ) -> Result<TimelinePage, SearchError>;

    /// Whether any request carrying one of `tags` is still in flight.
    fn is_searching_timeline(&self, tags: &[CorrelationTag]) -> bool;

    /// Cancels every in-flight request carrying one of `tags`. Cancelled requests
    /// resolve to [`SearchError::Aborted`].
    fn abort_requests(&self, tags: &[CorrelationTag]);
}
