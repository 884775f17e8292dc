use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::Mutex;
use timeline_search::{
    Paging, RequestOptions, SearchClient, SearchError, SearchFilter, SearchRequest, TimelinePage,
};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn, Span};

use crate::{
    merge_pages, CycleOutcome, PollSession, PollingConfig, PollingSnapshot, PollingState,
    MIN_POLL_INTERVAL,
};

/// Keeps a merged, periodically refreshed mirror of the paginated timeline search.
///
/// All methods take `&self`, so the source can sit behind an `Arc` shared with the
/// renderer that calls [`PollingDataSource::add_page`].
pub struct PollingDataSource {
    inner: Arc<Inner>,
    active: Mutex<Option<ActiveSession>>,
}

struct Inner {
    client: Arc<dyn SearchClient>,
    config: PollingConfig,
    state: Mutex<PollingState>,
    updates: watch::Sender<PollingSnapshot>,
    wake: Notify,
}

struct ActiveSession {
    session: PollSession,
    interval: Duration,
    task: JoinHandle<()>,
}

impl PollingDataSource {
    pub fn new(client: Arc<dyn SearchClient>, config: PollingConfig) -> Self {
        let state = PollingState::default();
        let (updates, _) = watch::channel(PollingSnapshot::of(&state, config.page_size));
        Self {
            inner: Arc::new(Inner {
                client,
                config,
                state: Mutex::new(state),
                updates,
                wake: Notify::new(),
            }),
            active: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &PollingConfig {
        &self.inner.config
    }

    /// Starts polling: one cycle immediately, then one per `interval`.
    ///
    /// Re-activating with the same filter and interval keeps the running session.
    /// Anything else replaces it, cancelling the old session's requests. Must be
    /// called from inside a Tokio runtime.
    pub fn activate(&self, filter: SearchFilter, interval: Duration) {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let mut active = self.active.lock();
        if let Some(current) = active.as_ref() {
            if current.session.filter() == &filter
                && current.interval == interval
                && !current.task.is_finished()
            {
                return;
            }
        }
        if let Some(previous) = active.take() {
            self.inner.stop(previous);
        }

        let session = PollSession::new(filter);
        info!(
            tag = %session.tag(),
            interval_ms = interval.as_millis() as u64,
            "timeline polling activated"
        );
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.inner),
            session.clone(),
            interval,
        ));
        *active = Some(ActiveSession {
            session,
            interval,
            task,
        });
    }

    /// Stops the timer and cancels every request of the current session. Safe to
    /// call any number of times.
    pub fn deactivate(&self) {
        if let Some(previous) = self.active.lock().take() {
            self.inner.stop(previous);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }

    /// The running session, if any.
    pub fn session(&self) -> Option<PollSession> {
        self.active
            .lock()
            .as_ref()
            .map(|active| active.session.clone())
    }

    /// Asks for pages up to `page`. Ignored when `page` is absent, already
    /// requested, or the server has nothing more. Returns whether the window grew.
    pub fn add_page(&self, page: Option<u32>) -> bool {
        let Some(page) = page else {
            return false;
        };
        let mut state = self.inner.state.lock();
        if state.offsets >= page || !state.has_more_data(self.inner.config.page_size) {
            return false;
        }
        state.offsets = page;
        self.inner.publish(&state);
        drop(state);

        debug!(page, "page window grown");
        self.inner.wake.notify_one();
        true
    }

    pub fn snapshot(&self) -> PollingSnapshot {
        PollingSnapshot::of(&self.inner.state.lock(), self.inner.config.page_size)
    }

    /// Receives a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<PollingSnapshot> {
        self.inner.updates.subscribe()
    }

    /// Runs one fetch cycle for `session` outside the timer.
    pub async fn run_cycle(&self, session: &PollSession) -> CycleOutcome {
        self.inner.run_cycle(session).await
    }
}

impl Drop for PollingDataSource {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl Inner {
    fn stop(&self, previous: ActiveSession) {
        let tag = previous.session.tag().clone();
        previous.session.cancel();
        self.client.abort_requests(std::slice::from_ref(&tag));
        previous.task.abort();
        info!(%tag, "timeline polling deactivated");
    }

    fn publish(&self, state: &PollingState) {
        self.updates
            .send_replace(PollingSnapshot::of(state, self.config.page_size));
    }

    #[instrument(skip_all, fields(tag = %session.tag(), pages = tracing::field::Empty))]
    async fn run_cycle(&self, session: &PollSession) -> CycleOutcome {
        let tags = vec![session.tag().clone()];
        if self.client.is_searching_timeline(&tags) {
            debug!("previous cycle still in flight");
            return CycleOutcome::Skipped;
        }

        let offsets = self.state.lock().offsets;
        Span::current().record("pages", offsets + 1);

        let filter = session.filter().without_date_range();
        let requests = (0..=offsets).map(|offset| {
            self.client.search_timeline(
                SearchRequest {
                    filter: filter.clone(),
                    paging: Paging {
                        limit: self.config.page_size,
                        offset,
                    },
                },
                RequestOptions { tags: tags.clone() },
            )
        });

        // join_all keeps request order, so pages stay in index order whatever
        // order they complete in.
        let results = tokio::select! {
            _ = session.cancelled() => return CycleOutcome::Cancelled,
            results = join_all(requests) => results,
        };

        match results.into_iter().collect::<Result<Vec<_>, _>>() {
            Ok(pages) => self.commit_pages(session, offsets, pages),
            Err(err) if err.is_expected_race() => {
                debug!(%err, "cycle dropped");
                CycleOutcome::Skipped
            }
            Err(err) => self.commit_failure(session, err),
        }
    }

    fn commit_pages(
        &self,
        session: &PollSession,
        offsets: u32,
        pages: Vec<TimelinePage>,
    ) -> CycleOutcome {
        let page_count = pages.len();
        let bundle = merge_pages(pages);
        let records = bundle.records.len();

        let mut state = self.state.lock();
        if session.is_cancelled() {
            return CycleOutcome::Cancelled;
        }
        state.total = bundle.total;
        state.resources = Some(bundle);
        state.error = None;
        state.initialized = true;
        state.loaded_offsets = offsets;
        self.publish(&state);

        debug!(records, total = state.total, "cycle merged");
        CycleOutcome::Merged {
            pages: page_count,
            records,
        }
    }

    fn commit_failure(&self, session: &PollSession, err: SearchError) -> CycleOutcome {
        let mut state = self.state.lock();
        if session.is_cancelled() {
            return CycleOutcome::Cancelled;
        }
        state.error = Some(err.clone());
        self.publish(&state);

        warn!(%err, "timeline fetch failed; keeping last resources");
        CycleOutcome::Failed(err)
    }
}

async fn poll_loop(inner: Arc<Inner>, session: PollSession, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = session.cancelled() => break,
            _ = ticker.tick() => {}
            _ = inner.wake.notified() => ticker.reset(),
        }
        inner.run_cycle(&session).await;
    }

    debug!(tag = %session.tag(), "polling loop stopped");
}
