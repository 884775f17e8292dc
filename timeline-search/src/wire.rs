use serde::Deserialize;
use serde_json::Value;
use timeline_core::DailyRecord;

use crate::{SearchError, TimelinePage};

/// Decode a timeline page from a JSON string.
pub fn parse_page_str(page_json: &str) -> Result<TimelinePage, SearchError> {
    let value: Value =
        serde_json::from_str(page_json).map_err(|err| SearchError::Decode(err.to_string()))?;
    parse_page_value(&value)
}

/// Decode a timeline page from a `serde_json::Value`, rejecting records whose date
/// has no readable `YYYY-MM-DD` prefix.
pub fn parse_page_value(page: &Value) -> Result<TimelinePage, SearchError> {
    if !page.is_object() {
        return Err(SearchError::Decode(
            "expected a page object with `data` and `total`".to_string(),
        ));
    }

    let page =
        TimelinePage::deserialize(page).map_err(|err| SearchError::Decode(err.to_string()))?;

    if let Some(records) = &page.data {
        validate_records(records)?;
    }

    Ok(page)
}

/// Records from either a bare JSON array or a page object.
pub fn parse_records_str(json: &str) -> Result<Vec<DailyRecord>, SearchError> {
    let value: Value =
        serde_json::from_str(json).map_err(|err| SearchError::Decode(err.to_string()))?;

    match value {
        Value::Array(_) => {
            let records = Vec::<DailyRecord>::deserialize(&value)
                .map_err(|err| SearchError::Decode(err.to_string()))?;
            validate_records(&records)?;
            Ok(records)
        }
        other => Ok(parse_page_value(&other)?.data.unwrap_or_default()),
    }
}

fn validate_records(records: &[DailyRecord]) -> Result<(), SearchError> {
    for (index, record) in records.iter().enumerate() {
        record
            .day()
            .map_err(|err| SearchError::Decode(format!("record {index}: {err}")))?;
    }
    Ok(())
}
