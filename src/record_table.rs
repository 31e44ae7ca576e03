//! Record listing and per-record details

use crate::record::{CanonicalRecord, ErrorTime};
use crate::view_result::ViewResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::io;

/// One line of the error table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRow {
    /// Position in the loaded record set, for fetching details
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub game: Option<String>,
    pub error: Option<String>,
    pub platform: Option<String>,
    pub browser: Option<String>,
}

impl RecordRow {
    pub fn from_record(index: usize, record: &CanonicalRecord) -> Self {
        Self {
            index,
            timestamp: record.timestamp,
            game: record.game_name.clone(),
            error: record.error_message.clone(),
            platform: record.platform().map(str::to_string),
            browser: record.primary_brand_name().map(str::to_string),
        }
    }
}

/// Rows for `(index, record)` pairs, in the given order
pub fn record_rows<'a, I>(records: I) -> ViewResult<Vec<RecordRow>>
where
    I: IntoIterator<Item = (usize, &'a CanonicalRecord)>,
{
    let rows: Vec<RecordRow> = records
        .into_iter()
        .map(|(index, record)| RecordRow::from_record(index, record))
        .collect();
    ViewResult::from_data(rows, Vec::is_empty)
}

/// Write rows as CSV with a header line; absent values are empty cells
pub fn write_csv<W: io::Write>(rows: &[RecordRow], writer: W) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandEntry {
    pub brand: Option<String>,
    pub version: Option<String>,
}

/// Everything known about one record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDetails {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub game_name: Option<String>,
    pub game_id: Option<String>,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub silent_error: Option<bool>,
    pub platform: Option<String>,
    pub platform_version: Option<String>,
    pub mobile: Option<bool>,
    pub brands: Vec<BrandEntry>,
    /// `YYYY-MM-DD hh:mm:ss` as reported by the client; absent when the
    /// reported fields are not a real calendar time
    pub error_time: Option<String>,
    /// `WIDTHxHEIGHT`
    pub viewport: Option<String>,
    pub raw: Value,
}

impl RecordDetails {
    pub fn from_record(index: usize, record: &CanonicalRecord) -> Self {
        let ua = record.user_agent.as_ref();
        Self {
            index,
            timestamp: record.timestamp,
            game_name: record.game_name.clone(),
            game_id: record.game_id.clone(),
            error_type: record.error_type.clone(),
            error_message: record.error_message.clone(),
            silent_error: record.silent_error,
            platform: record.platform().map(str::to_string),
            platform_version: ua.and_then(|ua| ua.platform_version.clone()),
            mobile: ua.and_then(|ua| ua.mobile),
            brands: record
                .brands()
                .iter()
                .map(|b| BrandEntry {
                    brand: b.brand.clone(),
                    version: b.version.clone(),
                })
                .collect(),
            error_time: record
                .error_time()
                .and_then(ErrorTime::to_naive)
                .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string()),
            viewport: record
                .viewport()
                .map(|(width, height)| format!("{}x{}", width, height)),
            raw: record.raw.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use serde_json::json;

    fn records() -> Vec<CanonicalRecord> {
        normalize(&json!([
            {"@timestamp": "2024-01-01T00:00:00Z", "bluescreen": {
                "gameName": "Bingo", "gameid": "b-1", "error": "boom, bang", "type": "fatal",
                "ua": {"platform": "Windows", "platformVersion": "10", "mobile": false,
                       "brands": [{"brand": "Chrome", "version": "120"}, {"brand": "Not_A Brand", "version": "8"}]},
                "sessionInfo": {"errorTime": {"day": 1, "month": 1, "year": 2024, "hour": 0, "min": 0, "sec": 0},
                                "initialWidth": 1280, "initialHeight": 720}
            }},
            {"@timestamp": "2024-01-01T00:05:00Z"},
        ]))
        .unwrap()
        .records
    }

    #[test]
    fn test_rows() {
        let records = records();
        let rows = record_rows(records.iter().enumerate()).into_data().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].browser.as_deref(), Some("Chrome"));
        assert_eq!(rows[1].game, None);
        assert!(record_rows(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_csv_export() {
        let records = records();
        let rows = record_rows(records.iter().enumerate()).into_data().unwrap();

        let mut out = Vec::new();
        write_csv(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "index,timestamp,game,error,platform,browser");
        assert!(lines[1].contains("\"boom, bang\""));
        assert!(lines[2].ends_with(",,,,"));
    }

    #[test]
    fn test_details() {
        let records = records();
        let details = RecordDetails::from_record(0, &records[0]);

        assert_eq!(details.game_id.as_deref(), Some("b-1"));
        assert_eq!(details.platform_version.as_deref(), Some("10"));
        assert_eq!(details.mobile, Some(false));
        assert_eq!(details.brands.len(), 2);
        assert_eq!(details.error_time.as_deref(), Some("2024-01-01 00:00:00"));
        assert_eq!(details.viewport.as_deref(), Some("1280x720"));
        assert_eq!(details.raw["bluescreen"]["type"], "fatal");
    }

    #[test]
    fn test_details_skip_impossible_error_time() {
        let records = normalize(&json!([
            {"@timestamp": "2024-01-01T00:00:00Z", "sessionInfo": {
                "errorTime": {"day": 31, "month": 2, "year": 2024, "hour": 0, "min": 0, "sec": 0}}}
        ]))
        .unwrap()
        .records;

        assert!(records[0].error_time().is_some());
        assert_eq!(RecordDetails::from_record(0, &records[0]).error_time, None);
    }
}
