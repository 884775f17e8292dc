//! Core model for the daily activity timeline: fetched records, merged bundles
//! and the dense per-day entries handed to renderers.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

mod interpolate;
pub mod presentation;
mod scale;

pub use interpolate::{
    interpolate, interpolate_at, DayWindow, DenseTimeline, TimelineInput, TimelineMeta,
    TimelineView,
};
pub use scale::Scale;

/// Format of the day prefix shared by every wire date.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Window and layout tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineConfig {
    /// Minimum number of days shown before today.
    pub look_back_days: u32,
    /// Age in days the earliest record must reach before the window follows it back.
    pub extended_history_days: u32,
    /// Days shown after today.
    pub look_ahead_days: u32,
    /// Pixels kept free under the bars for the axis.
    pub axis_reserve: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            look_back_days: 90,
            extended_history_days: 120,
            look_ahead_days: 30,
            axis_reserve: 30.0,
        }
    }
}

/// Event-status counters for a single day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusCounts {
    pub accepted: u64,
    pub negotiation_in_progress: u64,
    pub requires_user_intervention: u64,
    pub user_intervened: u64,
    pub wait_first_response: u64,
}

impl StatusCounts {
    /// Height of the whole stacked bar, in events. Saturates at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.accepted
            .saturating_add(self.negotiation_in_progress)
            .saturating_add(self.requires_user_intervention)
            .saturating_add(self.user_intervened)
            .saturating_add(self.wait_first_response)
    }
}

/// One day returned by the search service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyRecord {
    /// ISO-8601 date or timestamp. Only the `YYYY-MM-DD` prefix matters.
    pub date: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

impl DailyRecord {
    pub fn new(date: impl Into<String>, counts: StatusCounts) -> Self {
        Self {
            date: date.into(),
            counts,
        }
    }

    /// The `YYYY-MM-DD` prefix used to match records to calendar days.
    pub fn day_key(&self) -> &str {
        self.date.get(..10).unwrap_or(&self.date)
    }

    pub fn day(&self) -> Result<NaiveDate, TimelineError> {
        parse_day(&self.date)
    }
}

/// Records merged from every fetched page, in page order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceBundle {
    #[serde(rename = "data", default)]
    pub records: Vec<DailyRecord>,
    #[serde(default)]
    pub earliest_date: Option<String>,
    #[serde(default)]
    pub latest_date: Option<String>,
    /// Matching days reported by the server; may exceed `records.len()`.
    #[serde(default)]
    pub total: u64,
}

impl ResourceBundle {
    /// Earliest date, ignoring the empty string some servers send for "unknown".
    pub fn known_earliest_date(&self) -> Option<&str> {
        self.earliest_date
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }
}

/// One calendar day of the dense timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    /// Counters copied from a fetched record.
    Bar(StatusCounts),
    /// No record for the day, and the day is not part of an unloaded gap.
    Zero,
    /// Day older than everything loaded while more pages exist.
    #[serde(rename_all = "camelCase")]
    Loading {
        trigger_fetch: bool,
        next_offset: Option<u32>,
    },
}

impl TimelineEntry {
    pub fn counts(&self) -> StatusCounts {
        match self.kind {
            EntryKind::Bar(counts) => counts,
            EntryKind::Zero | EntryKind::Loading { .. } => StatusCounts::default(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.kind, EntryKind::Loading { .. })
    }

    pub fn triggers_fetch(&self) -> bool {
        matches!(
            self.kind,
            EntryKind::Loading {
                trigger_fetch: true,
                ..
            }
        )
    }

    /// Stable list key: Unix seconds of the day at midnight UTC.
    pub fn key(&self) -> i64 {
        self.date.and_time(NaiveTime::MIN).and_utc().timestamp()
    }
}

/// Reads the calendar day from the first ten characters of an ISO-8601 string.
pub fn parse_day(value: &str) -> Result<NaiveDate, TimelineError> {
    value
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, DAY_FORMAT).ok())
        .ok_or_else(|| TimelineError::InvalidDate(value.to_string()))
}

/// Errors raised by the pure timeline functions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimelineError {
    #[error("cannot build a scale from an empty timeline")]
    EmptyTimeline,
    #[error("invalid calendar date: {0:?}")]
    InvalidDate(String),
    #[error("a {days}-day window reaches past the supported calendar")]
    WindowOutOfRange { days: u32 },
}
