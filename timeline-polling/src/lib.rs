//! Polling driver for the timeline search: repeated fan-out fetch cycles merged
//! into one resource bundle, with on-demand page growth and tag-scoped cancellation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use timeline_core::{ResourceBundle, TimelineInput};
use timeline_search::{SearchError, TimelinePage, PAGE_LIMIT};

mod session;
mod source;

pub use session::{CycleOutcome, PollSession};
pub use source::PollingDataSource;

/// Floor for the re-poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Page size and refresh rate of the poller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollingConfig {
    /// Records per page.
    pub page_size: u32,
    /// Re-poll interval in milliseconds.
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_LIMIT,
            interval_ms: 3000,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Mutable state owned by [`PollingDataSource`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollingState {
    /// Last non-race failure; cleared by the next successful cycle.
    pub error: Option<SearchError>,
    pub initialized: bool,
    pub resources: Option<ResourceBundle>,
    /// Highest page index requested.
    pub offsets: u32,
    /// Highest page index merged into `resources`.
    pub loaded_offsets: u32,
    pub total: u64,
}

impl PollingState {
    pub fn has_more_data(&self, page_size: u32) -> bool {
        let requested = (u64::from(self.offsets) + 1) * u64::from(page_size);
        self.total > requested
    }

    pub fn next_offset(&self, page_size: u32) -> Option<u32> {
        self.has_more_data(page_size)
            .then(|| self.loaded_offsets + 1)
    }
}

/// Read-only copy of [`PollingState`] with the derived pagination flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollingSnapshot {
    pub error: Option<SearchError>,
    pub initialized: bool,
    pub resources: Option<ResourceBundle>,
    pub offsets: u32,
    pub loaded_offsets: u32,
    pub total: u64,
    pub has_more_data: bool,
    pub next_offset: Option<u32>,
}

impl PollingSnapshot {
    pub fn of(state: &PollingState, page_size: u32) -> Self {
        Self {
            error: state.error.clone(),
            initialized: state.initialized,
            resources: state.resources.clone(),
            offsets: state.offsets,
            loaded_offsets: state.loaded_offsets,
            total: state.total,
            has_more_data: state.has_more_data(page_size),
            next_offset: state.next_offset(page_size),
        }
    }
}

impl From<PollingSnapshot> for TimelineInput {
    fn from(snapshot: PollingSnapshot) -> Self {
        Self {
            error: snapshot.error.map(|err| err.to_string()),
            initialized: snapshot.initialized,
            has_more_data: snapshot.has_more_data,
            next_offset: snapshot.next_offset,
            resources: snapshot.resources,
        }
    }
}

/// Concatenates pages in the order given; the last page's totals and dates win.
pub fn merge_pages(pages: impl IntoIterator<Item = TimelinePage>) -> ResourceBundle {
    pages
        .into_iter()
        .fold(ResourceBundle::default(), |mut bundle, page| {
            if let Some(records) = page.data {
                bundle.records.extend(records);
            }
            bundle.total = page.total;
            bundle.earliest_date = page.earliest_date;
            bundle.latest_date = page.latest_date;
            bundle
        })
}
