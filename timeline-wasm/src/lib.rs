//! Framework-neutral WASM <-> JavaScript bridge for the timeline strip.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use timeline_core::presentation::{
    build_cells, current_day_index, tooltip_date, tooltip_rows, DateRange, DayCell,
    StatusLegend, TooltipRow,
};
use timeline_core::{
    interpolate, interpolate_at, Scale, StatusCounts, TimelineConfig, TimelineError,
    TimelineInput, TimelineMeta, TimelineView,
};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsTimelineConfig {
    #[serde(default)]
    pub look_back_days: Option<u32>,
    #[serde(default)]
    pub extended_history_days: Option<u32>,
    #[serde(default)]
    pub look_ahead_days: Option<u32>,
    #[serde(default)]
    pub axis_reserve: Option<f64>,
    /// Days to highlight, usually the filter's date range.
    #[serde(default)]
    pub highlight: Option<DateRange>,
}

impl From<&JsTimelineConfig> for TimelineConfig {
    fn from(cfg: &JsTimelineConfig) -> Self {
        let mut base = TimelineConfig::default();
        if let Some(days) = cfg.look_back_days {
            base.look_back_days = days;
        }
        if let Some(days) = cfg.extended_history_days {
            base.extended_history_days = days;
        }
        if let Some(days) = cfg.look_ahead_days {
            base.look_ahead_days = days;
        }
        if let Some(pixels) = cfg.axis_reserve {
            base.axis_reserve = pixels;
        }
        base
    }
}

/// Everything a renderer needs to draw one frame of the strip.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StripLayout {
    pub error: Option<String>,
    pub initialized: bool,
    /// `None` until the first bundle arrives.
    pub meta: Option<TimelineMeta>,
    pub cells: Vec<DayCell>,
    pub current_day_index: Option<usize>,
    /// Page the host should pass to `add_page` once the trigger cell is visible.
    pub page_request: Option<u32>,
}

/// Lays out the strip for `today`; shared by [`timeline_strip`] and native callers.
pub fn layout_strip(
    view: TimelineView,
    track_height: f64,
    cfg: &JsTimelineConfig,
    today: NaiveDate,
) -> Result<StripLayout, TimelineError> {
    let TimelineView {
        error,
        initialized,
        timeline,
    } = view;

    let Some(timeline) = timeline else {
        return Ok(StripLayout {
            error,
            initialized,
            meta: None,
            cells: Vec::new(),
            current_day_index: None,
            page_request: None,
        });
    };

    let config = TimelineConfig::from(cfg);
    let scale = Scale::from_timeline(&timeline.entries, track_height, &config)?;

    Ok(StripLayout {
        error,
        initialized,
        cells: build_cells(&timeline, &scale, today, cfg.highlight.as_ref()),
        current_day_index: current_day_index(&timeline.entries, today),
        page_request: timeline.page_request(),
        meta: Some(timeline.meta),
    })
}

#[wasm_bindgen]
pub fn interpolate_timeline(input: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let input = read_input(input)?;
    let cfg = read_config(config)?;
    let view = interpolate(&input, &TimelineConfig::from(&cfg))
        .map_err(|err| JsValue::from_str(&format_timeline_error(err)))?;

    to_value(&view).map_err(|err| JsValue::from_str(&format!("Cannot serialize timeline: {err}")))
}

#[wasm_bindgen]
pub fn timeline_strip(
    input: JsValue,
    track_height: f64,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let input = read_input(input)?;
    let cfg = read_config(config)?;
    let now = Utc::now();
    let layout = interpolate_at(&input, &TimelineConfig::from(&cfg), now)
        .and_then(|view| layout_strip(view, track_height, &cfg, now.date_naive()))
        .map_err(|err| JsValue::from_str(&format_timeline_error(err)))?;

    to_value(&layout).map_err(|err| JsValue::from_str(&format!("Cannot serialize strip: {err}")))
}

#[derive(Serialize)]
struct DayTooltip {
    title: String,
    rows: Vec<TooltipRow>,
}

/// Tooltip title and per-status rows for one bar.
#[wasm_bindgen]
pub fn day_tooltip(day: JsValue, counts: JsValue, legend: Option<JsValue>) -> Result<JsValue, JsValue> {
    let day: NaiveDate = from_value(day)
        .map_err(|err| JsValue::from_str(&format!("Cannot read day: {err}")))?;
    let counts: StatusCounts = from_value(counts)
        .map_err(|err| JsValue::from_str(&format!("Cannot read counts: {err}")))?;
    let legend = match legend {
        Some(js_legend) => from_value::<StatusLegend>(js_legend)
            .map_err(|err| JsValue::from_str(&format!("Cannot read legend: {err}")))?,
        None => StatusLegend::default(),
    };

    let tooltip = DayTooltip {
        title: tooltip_date(day, Utc::now().date_naive()),
        rows: tooltip_rows(&counts, &legend),
    };
    to_value(&tooltip).map_err(|err| JsValue::from_str(&format!("Cannot serialize tooltip: {err}")))
}

fn read_input(input: JsValue) -> Result<TimelineInput, JsValue> {
    from_value(input).map_err(|err| JsValue::from_str(&format!("Cannot read polling state: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<JsTimelineConfig, JsValue> {
    match config {
        Some(js_cfg) => from_value(js_cfg)
            .map_err(|err| JsValue::from_str(&format!("Cannot read config: {err}"))),
        None => Ok(JsTimelineConfig::default()),
    }
}

fn format_timeline_error(err: TimelineError) -> String {
    format!("Timeline error: {err}")
}
