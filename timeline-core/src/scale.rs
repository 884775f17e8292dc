use serde::{Deserialize, Serialize};

use crate::{TimelineConfig, TimelineEntry, TimelineError};

/// Clamped linear mapping from daily event counts to bar pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Scale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl Scale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Domain `[0, largest daily total]`, range `[0, track_height - axis_reserve]`.
    pub fn from_timeline(
        entries: &[TimelineEntry],
        track_height: f64,
        config: &TimelineConfig,
    ) -> Result<Self, TimelineError> {
        let busiest = entries
            .iter()
            .map(|entry| entry.counts().total())
            .max()
            .ok_or(TimelineError::EmptyTimeline)?;
        let top = (track_height - config.axis_reserve).max(0.0);
        Ok(Self::new((0.0, busiest as f64), (0.0, top)))
    }

    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    #[must_use]
    pub fn map(&self, value: f64) -> f64 {
        let (domain_min, domain_max) = self.domain;
        let (range_min, range_max) = self.range;

        if value.is_nan() || value <= domain_min {
            return range_min;
        }
        if value >= domain_max {
            return range_max;
        }

        let span = domain_max - domain_min;
        if span <= 0.0 {
            return range_min;
        }
        range_min + (range_max - range_min) * (value - domain_min) / span
    }

    #[must_use]
    pub fn map_count(&self, count: u64) -> f64 {
        self.map(count as f64)
    }
}
