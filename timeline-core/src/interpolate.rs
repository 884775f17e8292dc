use std::collections::HashMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    parse_day, DailyRecord, EntryKind, ResourceBundle, TimelineConfig, TimelineEntry,
    TimelineError, DAY_FORMAT,
};

/// Snapshot of the polling state read by the interpolator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineInput {
    pub error: Option<String>,
    pub initialized: bool,
    pub has_more_data: bool,
    pub next_offset: Option<u32>,
    pub resources: Option<ResourceBundle>,
}

/// Inclusive calendar-day range covered by the dense timeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DayWindow {
    pub fn len(&self) -> usize {
        usize::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Summary of the loaded records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineMeta {
    /// Day key of the middle loaded record.
    pub center: Option<String>,
    pub total: u64,
}

/// Gap-free timeline for one interpolation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DenseTimeline {
    pub window: DayWindow,
    pub meta: TimelineMeta,
    /// Loaded records, untouched.
    pub raw: Vec<DailyRecord>,
    /// One entry per day of `window`, ascending.
    pub entries: Vec<TimelineEntry>,
}

impl DenseTimeline {
    /// Page the renderer should request through `add_page`, if this pass signalled one.
    pub fn page_request(&self) -> Option<u32> {
        self.entries.iter().find_map(|entry| match entry.kind {
            EntryKind::Loading {
                trigger_fetch: true,
                next_offset,
            } => next_offset,
            _ => None,
        })
    }

    pub fn loading_days(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_loading()).count()
    }
}

/// Interpolator output: the input flags plus the dense timeline, when there is one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineView {
    pub error: Option<String>,
    pub initialized: bool,
    /// `None` until the first bundle arrives; renderers show a spinner instead.
    pub timeline: Option<DenseTimeline>,
}

/// Interpolates against the current wall clock.
pub fn interpolate(
    input: &TimelineInput,
    config: &TimelineConfig,
) -> Result<TimelineView, TimelineError> {
    interpolate_at(input, config, Utc::now())
}

/// Expands the sparse bundle in `input` into one entry per day of the visible window.
///
/// Days with a record become bars. Days older than the last loaded record become
/// loading placeholders while the server still has pages; the newest of them is the
/// only one that asks for the next page. Every other day is a zero bar.
pub fn interpolate_at(
    input: &TimelineInput,
    config: &TimelineConfig,
    now: DateTime<Utc>,
) -> Result<TimelineView, TimelineError> {
    let Some(resources) = input.resources.as_ref() else {
        return Ok(TimelineView {
            error: input.error.clone(),
            initialized: input.initialized,
            timeline: None,
        });
    };

    let window = visible_window(resources, config, now)?;
    let records = &resources.records;

    let mut by_day: HashMap<&str, &DailyRecord> = HashMap::with_capacity(records.len());
    for record in records {
        by_day.entry(record.day_key()).or_insert(record);
    }

    // Page order, so the last record marks where loaded history stops.
    let loaded_from = records.last().map(DailyRecord::day).transpose()?;

    let mut entries = Vec::with_capacity(window.len());
    let mut trigger_pending = true;
    let mut day = window.end;
    loop {
        let key = day.format(DAY_FORMAT).to_string();
        let kind = if let Some(record) = by_day.get(key.as_str()) {
            EntryKind::Bar(record.counts)
        } else if input.has_more_data && loaded_from.is_some_and(|boundary| day < boundary) {
            EntryKind::Loading {
                trigger_fetch: std::mem::replace(&mut trigger_pending, false),
                next_offset: input.next_offset,
            }
        } else {
            EntryKind::Zero
        };
        entries.push(TimelineEntry { date: day, kind });

        if day <= window.start {
            break;
        }
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    entries.reverse();

    let meta = TimelineMeta {
        center: records
            .get(records.len() / 2)
            .map(|record| record.day_key().to_string()),
        total: resources.total,
    };

    Ok(TimelineView {
        error: input.error.clone(),
        initialized: input.initialized,
        timeline: Some(DenseTimeline {
            window,
            meta,
            raw: records.clone(),
            entries,
        }),
    })
}

fn visible_window(
    resources: &ResourceBundle,
    config: &TimelineConfig,
    now: DateTime<Utc>,
) -> Result<DayWindow, TimelineError> {
    let today = now.date_naive();
    let minimum_start = today
        .checked_sub_days(Days::new(u64::from(config.look_back_days)))
        .ok_or(TimelineError::WindowOutOfRange {
            days: config.look_back_days,
        })?;
    let end = today
        .checked_add_days(Days::new(u64::from(config.look_ahead_days)))
        .ok_or(TimelineError::WindowOutOfRange {
            days: config.look_ahead_days,
        })?;

    let earliest = match resources.known_earliest_date() {
        Some(value) => parse_day(value)?,
        None => minimum_start,
    };

    // History widens the window only past the threshold; younger data keeps the
    // fixed look-back.
    let age_days = now
        .signed_duration_since(earliest.and_time(NaiveTime::MIN).and_utc())
        .num_days();
    let start = if age_days >= i64::from(config.extended_history_days) {
        earliest
    } else {
        minimum_start
    };

    Ok(DayWindow { start, end })
}
