//! Format normalizer
//!
//! Converts either export encoding into canonical records:
//! - Tabular export (`aws logs get-query-results`): `{"results": [[{"field", "value"}, ...], ...]}`
//! - Flat array (Logs Insights "Export as JSON"): `[{"@timestamp": ..., ...}, ...]`
//!
//! A malformed row is dropped and counted; only a payload that matches
//! neither shape is an error.

use crate::error::FormatError;
use crate::record::{parse_timestamp, CanonicalRecord};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Logs Insights query whose results this crate consumes
pub const INSIGHTS_QUERY: &str = "fields @timestamp, message, msg, @logStream, @log,
  jsonParse(msg) as jObj,
  jObj.bluescreen as bluescreen,
  jObj.bluescreen.error
| filter msg like /bluescreen/
| limit 10000";

const TIMESTAMP_FIELDS: [&str; 2] = ["@timestamp", "timestamp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    TabularExport,
    FlatArray,
}

/// Where to look for the embedded event inside a tabular row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// `jObj`: already parsed by the query, or its JSON text
    JObj,
    /// `bluescreen`: parsed object or JSON text
    Bluescreen,
    /// `msg`: the raw log message, always JSON text
    Msg,
}

/// Strategies are tried in this order; the first non-empty object wins.
pub const EXTRACTION_POLICY: [ExtractionStrategy; 3] = [
    ExtractionStrategy::JObj,
    ExtractionStrategy::Bluescreen,
    ExtractionStrategy::Msg,
];

impl ExtractionStrategy {
    pub fn field(&self) -> &'static str {
        match self {
            ExtractionStrategy::JObj => "jObj",
            ExtractionStrategy::Bluescreen => "bluescreen",
            ExtractionStrategy::Msg => "msg",
        }
    }

    pub fn extract(&self, fields: &Map<String, Value>) -> Option<Map<String, Value>> {
        let parsed = match (self, fields.get(self.field())?) {
            (_, Value::String(text)) => serde_json::from_str::<Value>(text).ok()?,
            (ExtractionStrategy::Msg, _) => return None,
            (_, value) => value.clone(),
        };

        match parsed {
            Value::Object(map) if !map.is_empty() => Some(map),
            _ => None,
        }
    }
}

/// Run `policy` over a folded row, stopping at the first success
pub fn extract_event(
    fields: &Map<String, Value>,
    policy: &[ExtractionStrategy],
) -> Option<(ExtractionStrategy, Map<String, Value>)> {
    policy
        .iter()
        .find_map(|strategy| strategy.extract(fields).map(|event| (*strategy, event)))
}

/// Per-batch diagnostics; dropped rows are otherwise silent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeReport {
    pub rows_seen: usize,
    pub accepted: usize,
    /// Row or item that is not an object, or carries no parsable event
    pub dropped_malformed: usize,
    /// Timestamp missing or not parsable
    pub dropped_bad_timestamp: usize,
}

impl NormalizeReport {
    pub fn dropped(&self) -> usize {
        self.dropped_malformed + self.dropped_bad_timestamp
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub shape: PayloadShape,
    pub records: Vec<CanonicalRecord>,
    pub report: NormalizeReport,
}

pub fn detect_shape(payload: &Value) -> Result<PayloadShape, FormatError> {
    match payload {
        Value::Object(map) if matches!(map.get("results"), Some(Value::Array(_))) => {
            Ok(PayloadShape::TabularExport)
        }
        Value::Array(_) => Ok(PayloadShape::FlatArray),
        _ => Err(FormatError::UnrecognizedShape),
    }
}

/// Parse payload text, then normalize it
pub fn normalize_str(text: &str) -> Result<Normalized, FormatError> {
    let payload: Value = serde_json::from_str(text)?;
    normalize(&payload)
}

pub fn normalize(payload: &Value) -> Result<Normalized, FormatError> {
    let shape = detect_shape(payload)?;
    let mut builder = BatchBuilder::default();

    match (shape, payload) {
        (PayloadShape::TabularExport, Value::Object(map)) => {
            if let Some(Value::Array(rows)) = map.get("results") {
                for (index, row) in rows.iter().enumerate() {
                    builder.push_row(index, row);
                }
            }
        }
        (PayloadShape::FlatArray, Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                builder.push_item(index, item);
            }
        }
        _ => return Err(FormatError::UnrecognizedShape),
    }

    let BatchBuilder { records, report } = builder;
    info!(
        "Normalized {:?} payload: {} of {} rows accepted ({} malformed, {} bad timestamp)",
        shape,
        report.accepted,
        report.rows_seen,
        report.dropped_malformed,
        report.dropped_bad_timestamp
    );

    Ok(Normalized {
        shape,
        records,
        report,
    })
}

#[derive(Default)]
struct BatchBuilder {
    records: Vec<CanonicalRecord>,
    report: NormalizeReport,
}

impl BatchBuilder {
    fn push_row(&mut self, index: usize, row: &Value) {
        self.report.rows_seen += 1;

        let Some(fields) = fold_row(row) else {
            debug!("Dropping row {}: not a list of field/value pairs", index);
            self.report.dropped_malformed += 1;
            return;
        };

        let Some((strategy, mut event)) = extract_event(&fields, &EXTRACTION_POLICY) else {
            debug!("Dropping row {}: no parsable event payload", index);
            self.report.dropped_malformed += 1;
            return;
        };

        // The record is the row timestamp overlaid with the event, so an
        // `@timestamp` carried inside the event takes precedence
        let timestamp_text = event
            .get("@timestamp")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| timestamp_text(&fields))
            .or_else(|| timestamp_text(&event));
        let Some(timestamp) = timestamp_text.as_deref().and_then(parse_timestamp) else {
            debug!("Dropping row {}: bad timestamp {:?}", index, timestamp_text);
            self.report.dropped_bad_timestamp += 1;
            return;
        };

        debug!("Row {} decoded via {}", index, strategy.field());
        if let Some(text) = timestamp_text {
            event
                .entry("@timestamp")
                .or_insert_with(|| Value::String(text));
        }
        self.accept(CanonicalRecord::from_event(timestamp, &event));
    }

    fn push_item(&mut self, index: usize, item: &Value) {
        self.report.rows_seen += 1;

        let Value::Object(event) = item else {
            debug!("Dropping item {}: not an object", index);
            self.report.dropped_malformed += 1;
            return;
        };

        let timestamp_text = timestamp_text(event);
        let Some(timestamp) = timestamp_text.as_deref().and_then(parse_timestamp) else {
            debug!("Dropping item {}: bad timestamp {:?}", index, timestamp_text);
            self.report.dropped_bad_timestamp += 1;
            return;
        };

        self.accept(CanonicalRecord::from_event(timestamp, event));
    }

    fn accept(&mut self, record: CanonicalRecord) {
        self.report.accepted += 1;
        self.records.push(record);
    }
}

/// Fold `[{"field": k, "value": v}, ...]` into one map; later pairs win
fn fold_row(row: &Value) -> Option<Map<String, Value>> {
    let Value::Array(pairs) = row else {
        return None;
    };

    Some(
        pairs
            .iter()
            .filter_map(|pair| {
                let name = pair.get("field")?.as_str()?;
                let value = pair.get("value").cloned().unwrap_or(Value::Null);
                Some((name.to_string(), value))
            })
            .collect(),
    )
}

fn timestamp_text(fields: &Map<String, Value>) -> Option<String> {
    TIMESTAMP_FIELDS
        .iter()
        .find_map(|name| fields.get(*name)?.as_str())
        .map(str::to_string)
}
