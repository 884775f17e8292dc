use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use timeline_core::{parse_day, presentation::DateRange};

use crate::SearchError;

/// Field holding the date-range sub-filter. The timeline owns date windowing, so
/// this field never reaches the service.
pub const DATE_RANGE_KEY: &str = "dateFilter";

/// Search filter forwarded verbatim to the service, minus [`DATE_RANGE_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchFilter(Map<String, Value>);

impl SearchFilter {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn from_value(value: Value) -> Result<Self, SearchError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            Value::Null => Ok(Self::default()),
            other => Err(SearchError::Decode(format!(
                "filter must be an object, received {other}"
            ))),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Copy of the filter as sent to the service.
    pub fn without_date_range(&self) -> Self {
        let mut fields = self.0.clone();
        fields.remove(DATE_RANGE_KEY);
        Self(fields)
    }

    /// Date range to highlight on the strip. Null or unreadable bounds count as open.
    pub fn date_range(&self) -> Option<DateRange> {
        let range = self.0.get(DATE_RANGE_KEY)?.as_object()?;
        let bound = |name: &str| {
            range
                .get(name)
                .and_then(Value::as_str)
                .and_then(|text| parse_day(text).ok())
        };
        Some(DateRange {
            start: bound("start"),
            end: bound("end"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn date_range_is_stripped_but_everything_else_survives() {
        let filter = SearchFilter::default()
            .with("status", json!(["accepted"]))
            .with(DATE_RANGE_KEY, json!({"start": "2024-05-01T00:00:00Z", "end": null}));

        let sent = filter.without_date_range();
        assert_eq!(sent.get(DATE_RANGE_KEY), None);
        assert_eq!(sent.get("status"), Some(&json!(["accepted"])));
        assert!(filter.get(DATE_RANGE_KEY).is_some());

        let range = filter.date_range().expect("range present");
        assert_eq!(range.start.map(|d| d.to_string()), Some("2024-05-01".to_string()));
        assert_eq!(range.end, None);
    }

    #[test]
    fn non_object_filter_is_rejected() {
        assert!(SearchFilter::from_value(json!([1, 2])).is_err());
        assert_eq!(SearchFilter::from_value(Value::Null), Ok(SearchFilter::default()));
    }
}
