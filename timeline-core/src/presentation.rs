//! Per-day view model for renderers.
//!
//! Everything a bar strip needs to draw a day (segment heights, tooltip rows,
//! calendar flags) computed from a [`DenseTimeline`] and a [`Scale`]. Colors and
//! labels come in through [`StatusLegend`] so hosts can localize them.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{DenseTimeline, EntryKind, Scale, StatusCounts, TimelineEntry};

const FALLBACK_COLOR: &str = "gray";

/// The five counters tracked per day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    Accepted,
    NegotiationInProgress,
    RequiresUserIntervention,
    UserIntervened,
    WaitFirstResponse,
}

impl Status {
    /// Tooltip order.
    pub const ALL: [Status; 5] = [
        Status::Accepted,
        Status::NegotiationInProgress,
        Status::RequiresUserIntervention,
        Status::UserIntervened,
        Status::WaitFirstResponse,
    ];

    /// Bottom-to-top order of the stacked bar.
    pub const STACK_ORDER: [Status; 5] = [
        Status::Accepted,
        Status::RequiresUserIntervention,
        Status::NegotiationInProgress,
        Status::UserIntervened,
        Status::WaitFirstResponse,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Status::Accepted => "accepted",
            Status::NegotiationInProgress => "negotiationInProgress",
            Status::RequiresUserIntervention => "requiresUserIntervention",
            Status::UserIntervened => "userIntervened",
            Status::WaitFirstResponse => "waitFirstResponse",
        }
    }

    pub fn count(self, counts: &StatusCounts) -> u64 {
        match self {
            Status::Accepted => counts.accepted,
            Status::NegotiationInProgress => counts.negotiation_in_progress,
            Status::RequiresUserIntervention => counts.requires_user_intervention,
            Status::UserIntervened => counts.user_intervened,
            Status::WaitFirstResponse => counts.wait_first_response,
        }
    }
}

/// Host-supplied colors and labels. Missing entries fall back to gray and the status key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatusLegend {
    pub colors: HashMap<Status, String>,
    pub labels: HashMap<Status, String>,
}

impl StatusLegend {
    pub fn color_of(&self, status: Status) -> &str {
        self.colors
            .get(&status)
            .map(String::as_str)
            .unwrap_or(FALLBACK_COLOR)
    }

    pub fn label_of(&self, status: Status) -> &str {
        self.labels
            .get(&status)
            .map(String::as_str)
            .unwrap_or_else(|| status.key())
    }
}

/// Date range to highlight, taken from the filter's date sub-filter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// A range with neither bound highlights nothing.
    pub fn contains(&self, day: NaiveDate) -> bool {
        match (self.start, self.end) {
            (None, None) => false,
            (Some(start), None) => day >= start,
            (None, Some(end)) => day <= end,
            (Some(start), Some(end)) => start <= day && day <= end,
        }
    }
}

/// Calendar markers drawn around one day's bar.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayFlags {
    pub start_of_month: bool,
    pub end_of_month: bool,
    pub today: bool,
    pub before_today: bool,
    pub highlighted: bool,
}

pub fn day_flags(day: NaiveDate, today: NaiveDate, highlight: Option<&DateRange>) -> DayFlags {
    DayFlags {
        start_of_month: day.day() == 1,
        end_of_month: day.succ_opt().map_or(true, |next| next.month() != day.month()),
        today: day == today,
        before_today: day < today,
        highlighted: highlight.is_some_and(|range| range.contains(day)),
    }
}

/// Two-letter weekday shown under each bar.
pub fn weekday_label(day: NaiveDate) -> &'static str {
    match day.weekday() {
        Weekday::Mon => "Mo",
        Weekday::Tue => "Tu",
        Weekday::Wed => "We",
        Weekday::Thu => "Th",
        Weekday::Fri => "Fr",
        Weekday::Sat => "Sa",
        Weekday::Sun => "Su",
    }
}

/// `Mon 3/05`, with the year appended outside the current year.
pub fn tooltip_date(day: NaiveDate, today: NaiveDate) -> String {
    if day.year() == today.year() {
        day.format("%a %-m/%d").to_string()
    } else {
        day.format("%a %-m/%d/%Y").to_string()
    }
}

/// One status line of a bar's tooltip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TooltipRow {
    pub status: Status,
    pub label: String,
    pub color: String,
    pub count: u64,
}

pub fn tooltip_rows(counts: &StatusCounts, legend: &StatusLegend) -> Vec<TooltipRow> {
    Status::ALL
        .into_iter()
        .map(|status| TooltipRow {
            status,
            label: legend.label_of(status).to_string(),
            color: legend.color_of(status).to_string(),
            count: status.count(counts),
        })
        .collect()
}

/// One status slice of a stacked bar, in pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub status: Status,
    pub count: u64,
    pub height: f64,
}

pub fn stacked_segments(counts: &StatusCounts, scale: &Scale) -> Vec<Segment> {
    Status::STACK_ORDER
        .into_iter()
        .map(|status| {
            let count = status.count(counts);
            Segment {
                status,
                count,
                height: scale.map_count(count),
            }
        })
        .collect()
}

/// What fills a day's column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CellBody {
    Stacked {
        segments: Vec<Segment>,
    },
    /// Placeholder drawn at full track height.
    #[serde(rename_all = "camelCase")]
    Loading {
        height: f64,
        trigger_fetch: bool,
        next_offset: Option<u32>,
    },
}

/// Render-ready column for one day of the strip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub key: i64,
    pub date: NaiveDate,
    pub weekday: String,
    pub flags: DayFlags,
    pub body: CellBody,
}

pub fn day_cell(
    entry: &TimelineEntry,
    scale: &Scale,
    today: NaiveDate,
    highlight: Option<&DateRange>,
) -> DayCell {
    let body = match entry.kind {
        EntryKind::Loading {
            trigger_fetch,
            next_offset,
        } => CellBody::Loading {
            height: scale.range().1,
            trigger_fetch,
            next_offset,
        },
        EntryKind::Bar(_) | EntryKind::Zero => CellBody::Stacked {
            segments: stacked_segments(&entry.counts(), scale),
        },
    };

    DayCell {
        key: entry.key(),
        date: entry.date,
        weekday: weekday_label(entry.date).to_string(),
        flags: day_flags(entry.date, today, highlight),
        body,
    }
}

pub fn build_cells(
    timeline: &DenseTimeline,
    scale: &Scale,
    today: NaiveDate,
    highlight: Option<&DateRange>,
) -> Vec<DayCell> {
    timeline
        .entries
        .iter()
        .map(|entry| day_cell(entry, scale, today, highlight))
        .collect()
}

/// Index of today's entry, used to scroll the strip on first render.
pub fn current_day_index(entries: &[TimelineEntry], today: NaiveDate) -> Option<usize> {
    entries.binary_search_by_key(&today, |entry| entry.date).ok()
}
