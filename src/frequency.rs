//! Flat categorical breakdowns: the frequency table and single-dimension pies
//!
//! Records missing the grouped field are left out of both the counts and the
//! total the percentages are taken against.

use crate::histogram::Histogram;
use crate::record::{CanonicalRecord, CategoryField};
use crate::view_result::ViewResult;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyRow {
    pub key: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyTable {
    pub field: CategoryField,
    /// Records that had the field
    pub total: usize,
    /// First-seen order until sorted
    pub rows: Vec<FrequencyRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Key,
    Count,
    Percentage,
}

impl FrequencyTable {
    /// Sort rows by `key`; ties fall back to ascending key text
    pub fn sort_rows(&mut self, key: SortKey, descending: bool) {
        self.rows.sort_by(|a, b| {
            let primary = match key {
                SortKey::Key => a.key.cmp(&b.key),
                SortKey::Count => a.count.cmp(&b.count),
                SortKey::Percentage => a
                    .percentage
                    .partial_cmp(&b.percentage)
                    .unwrap_or(Ordering::Equal),
            };
            let primary = if descending { primary.reverse() } else { primary };
            primary.then_with(|| a.key.cmp(&b.key))
        });
    }

    pub fn row(&self, key: &str) -> Option<&FrequencyRow> {
        self.rows.iter().find(|row| row.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieSlice {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieChart {
    pub field: CategoryField,
    pub total: usize,
    /// First-seen order, so colors stay stable as data grows
    pub slices: Vec<PieSlice>,
}

/// Slices in the histogram's first-seen order
pub fn slices(hist: &Histogram) -> Vec<PieSlice> {
    hist.iter()
        .map(|(key, count)| PieSlice {
            key: key.to_string(),
            count,
        })
        .collect()
}

/// Count records per value of `field`
pub fn category_histogram<R: AsRef<CanonicalRecord>>(
    records: &[R],
    field: CategoryField,
) -> Histogram {
    records
        .iter()
        .filter_map(|record| record.as_ref().category(field))
        .collect()
}

pub fn frequency_table<R: AsRef<CanonicalRecord>>(
    records: &[R],
    field: CategoryField,
) -> ViewResult<FrequencyTable> {
    let hist = category_histogram(records, field);
    if hist.is_empty() {
        return ViewResult::Empty;
    }

    let rows = hist
        .percentages()
        .into_iter()
        .map(|(key, count, percentage)| FrequencyRow {
            key: key.to_string(),
            count,
            percentage,
        })
        .collect();

    ViewResult::NonEmpty(FrequencyTable {
        field,
        total: hist.total(),
        rows,
    })
}

pub fn pie_chart<R: AsRef<CanonicalRecord>>(
    records: &[R],
    field: CategoryField,
) -> ViewResult<PieChart> {
    let hist = category_histogram(records, field);
    ViewResult::from_data(
        PieChart {
            field,
            total: hist.total(),
            slices: slices(&hist),
        },
        |pie| pie.slices.is_empty(),
    )
}
