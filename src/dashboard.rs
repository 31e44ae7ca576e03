//! All views for one filter state
//!
//! Views are recomputed from the full record set on every filter change.
//! They only read the filtered records, so they run side by side on the
//! rayon pool.

use crate::crosstab::{cross_tab, CrossTab};
use crate::filter::{apply, FilterSpec};
use crate::frequency::{frequency_table, pie_chart, FrequencyTable, PieChart, SortKey};
use crate::hierarchy::{browser_hierarchy, BrowserHierarchy};
use crate::record::{CanonicalRecord, CategoryField};
use crate::time_buckets::{adaptive_series, timeline, TimeSeries};
use crate::view_result::ViewResult;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOptions {
    /// Field the error breakdown table groups by
    #[serde(default)]
    pub error_field: CategoryField,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardViews {
    /// Records that passed the filter
    pub record_count: usize,
    pub timeline: ViewResult<TimeSeries>,
    pub time_series: ViewResult<TimeSeries>,
    pub browsers: ViewResult<BrowserHierarchy>,
    /// Sorted by count, highest first
    pub error_types: ViewResult<FrequencyTable>,
    pub platforms: ViewResult<PieChart>,
    pub heatmap: ViewResult<CrossTab>,
}

impl DashboardViews {
    pub fn compute<R>(records: &[R], spec: &FilterSpec, options: ViewOptions) -> Self
    where
        R: AsRef<CanonicalRecord>,
    {
        let filtered = apply(records, spec);
        Self::from_filtered(&filtered, options)
    }

    pub fn from_filtered(filtered: &[&CanonicalRecord], options: ViewOptions) -> Self {
        let started = Instant::now();

        let ((timeline, time_series), ((browsers, error_types), (platforms, heatmap))) =
            rayon::join(
                || rayon::join(|| timeline(filtered), || adaptive_series(filtered)),
                || {
                    rayon::join(
                        || {
                            rayon::join(
                                || browser_hierarchy(filtered),
                                || sorted_breakdown(filtered, options.error_field),
                            )
                        },
                        || {
                            rayon::join(
                                || pie_chart(filtered, CategoryField::Platform),
                                || cross_tab(filtered),
                            )
                        },
                    )
                },
            );

        debug!(
            "Computed views for {} records in {:?}",
            filtered.len(),
            started.elapsed()
        );

        Self {
            record_count: filtered.len(),
            timeline,
            time_series,
            browsers,
            error_types,
            platforms,
            heatmap,
        }
    }
}

fn sorted_breakdown(records: &[&CanonicalRecord], field: CategoryField) -> ViewResult<FrequencyTable> {
    let mut table = frequency_table(records, field);
    if let Some(table) = table.data_mut() {
        table.sort_rows(SortKey::Count, true);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Dimension;
    use crate::normalizer::normalize;
    use serde_json::json;

    #[test]
    fn test_compute_matches_individual_views() {
        let records = normalize(&json!([
            {"@timestamp": "2024-01-01T00:00:00Z", "gameName": "A", "error": "x",
             "ua": {"platform": "Windows", "brands": [{"brand": "Chrome", "version": "120"}]}},
            {"@timestamp": "2024-01-01T00:10:00Z", "gameName": "B", "error": "y",
             "ua": {"platform": "Linux", "brands": [{"brand": "Firefox", "version": "121"}]}},
            {"@timestamp": "2024-01-01T00:20:00Z", "gameName": "A", "error": "y"},
        ]))
        .unwrap()
        .records;

        let spec = FilterSpec::all_time(&records).with_selection(Dimension::Game, ["A"]);
        let views = DashboardViews::compute(&records, &spec, ViewOptions::default());
        let filtered = apply(&records, &spec);

        assert_eq!(views.record_count, 2);
        assert_eq!(views.timeline, timeline(&filtered));
        assert_eq!(views.heatmap, cross_tab(&filtered));
        assert_eq!(
            views.error_types.data().unwrap().field,
            CategoryField::ErrorMessage
        );
    }

    #[test]
    fn test_breakdown_sorted_by_count() {
        let records = normalize(&json!([
            {"@timestamp": "2024-01-01T00:00:00Z", "error": "rare"},
            {"@timestamp": "2024-01-01T00:00:00Z", "error": "common"},
            {"@timestamp": "2024-01-01T00:00:00Z", "error": "common"},
        ]))
        .unwrap()
        .records;

        let views = DashboardViews::compute(
            &records,
            &FilterSpec::all_time(&records),
            ViewOptions::default(),
        );
        let table = views.error_types.data().unwrap();
        assert_eq!(table.rows[0].key, "common");
        assert!(views.timeline.is_empty());
        assert!(views.heatmap.is_empty());
    }
}
