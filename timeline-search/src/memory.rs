use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use timeline_core::DailyRecord;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    CorrelationTag, RequestOptions, SearchClient, SearchError, SearchRequest, TimelinePage,
};

/// Serves a fixed record set page by page, newest day first, the way the remote
/// service does. Used by the demo CLI and the polling tests.
#[derive(Debug, Default)]
pub struct MemorySearchClient {
    records: Mutex<Vec<DailyRecord>>,
    latency: Duration,
    page_latency: HashMap<u32, Duration>,
    failures: Mutex<VecDeque<SearchError>>,
    in_flight: Mutex<HashMap<CorrelationTag, Vec<(u64, CancellationToken)>>>,
    next_request_id: AtomicU64,
    requests: Mutex<Vec<(SearchRequest, RequestOptions)>>,
}

impl MemorySearchClient {
    pub fn new(records: Vec<DailyRecord>) -> Self {
        let client = Self::default();
        client.set_records(records);
        client
    }

    /// Delay applied to every request before it answers.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Delay for one page index, overriding the default latency.
    pub fn with_page_latency(mut self, offset: u32, latency: Duration) -> Self {
        self.page_latency.insert(offset, latency);
        self
    }

    pub fn set_records(&self, mut records: Vec<DailyRecord>) {
        records.sort_by(|a, b| b.day_key().cmp(a.day_key()));
        *self.records.lock() = records;
    }

    /// The next request to finish answers with `error` instead of a page.
    pub fn fail_next(&self, error: SearchError) {
        self.failures.lock().push_back(error);
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<(SearchRequest, RequestOptions)> {
        self.requests.lock().clone()
    }

    fn register(&self, tags: &[CorrelationTag]) -> (u64, CancellationToken) {
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let mut in_flight = self.in_flight.lock();
        for tag in tags {
            in_flight
                .entry(tag.clone())
                .or_default()
                .push((id, token.clone()));
        }
        (id, token)
    }

    fn release(&self, id: u64, tags: &[CorrelationTag]) {
        let mut in_flight = self.in_flight.lock();
        for tag in tags {
            if let Some(requests) = in_flight.get_mut(tag) {
                requests.retain(|(request_id, _)| *request_id != id);
                if requests.is_empty() {
                    in_flight.remove(tag);
                }
            }
        }
    }

    fn answer(&self, request: &SearchRequest) -> Result<TimelinePage, SearchError> {
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }

        let records = self.records.lock();
        let limit = request.paging.limit.max(1) as usize;
        let start = (request.paging.offset as usize).saturating_mul(limit);
        let page: Vec<DailyRecord> = records.iter().skip(start).take(limit).cloned().collect();

        Ok(TimelinePage {
            data: (!page.is_empty()).then_some(page),
            total: records.len() as u64,
            earliest_date: records.last().map(|record| record.date.clone()),
            latest_date: records.first().map(|record| record.date.clone()),
        })
    }
}

/// Unregisters a request however its future ends, including being dropped.
struct InFlightGuard<'a> {
    client: &'a MemorySearchClient,
    id: u64,
    tags: &'a [CorrelationTag],
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.client.release(self.id, self.tags);
    }
}

#[async_trait]
impl SearchClient for MemorySearchClient {
    async fn search_timeline(
        &self,
        request: SearchRequest,
        options: RequestOptions,
    ) -> Result<TimelinePage, SearchError> {
        self.requests.lock().push((request.clone(), options.clone()));
        let (id, token) = self.register(&options.tags);
        let _in_flight = InFlightGuard {
            client: self,
            id,
            tags: &options.tags,
        };
        let delay = self
            .page_latency
            .get(&request.paging.offset)
            .copied()
            .unwrap_or(self.latency);

        tokio::select! {
            _ = token.cancelled() => Err(SearchError::Aborted),
            _ = tokio::time::sleep(delay) => self.answer(&request),
        }
    }

    fn is_searching_timeline(&self, tags: &[CorrelationTag]) -> bool {
        let in_flight = self.in_flight.lock();
        tags.iter().any(|tag| in_flight.contains_key(tag))
    }

    fn abort_requests(&self, tags: &[CorrelationTag]) {
        let mut in_flight = self.in_flight.lock();
        for tag in tags {
            if let Some(requests) = in_flight.remove(tag) {
                debug!(%tag, count = requests.len(), "aborting in-flight searches");
                for (_, token) in requests {
                    token.cancel();
                }
            }
        }
    }
}
