/// Aggregation scenarios over normalized records
use crash_insights::crosstab::cross_tab;
use crash_insights::frequency::{frequency_table, pie_chart};
use crash_insights::hierarchy::browser_hierarchy;
use crash_insights::normalizer::normalize;
use crash_insights::time_buckets::{adaptive_series, timeline, Resolution};
use crash_insights::{CanonicalRecord, CategoryField, DashboardViews, FilterSpec, ViewOptions};
use serde_json::{json, Value};

fn records(events: Value) -> Vec<CanonicalRecord> {
    normalize(&events).unwrap().records
}

fn mixed() -> Vec<CanonicalRecord> {
    records(json!([
        {"@timestamp": "2024-01-01T00:00:00Z", "gameName": "Bingo", "type": "fatal",
         "ua": {"platform": "Windows", "brands": [{"brand": "Chrome", "version": "120"}]}},
        {"@timestamp": "2024-01-01T00:05:00Z", "gameName": "Bingo", "type": "fatal",
         "ua": {"platform": "Android", "brands": [{"brand": "Chrome", "version": "119"}]}},
        {"@timestamp": "2024-01-01T01:10:00Z", "gameName": "Aces", "type": "warning",
         "ua": {"platform": "Windows", "brands": [{"brand": "Edge", "version": "120"}]}},
        {"@timestamp": "2024-01-01T01:15:00Z", "type": "silent",
         "ua": {"platform": "iOS"}},
        {"@timestamp": "2024-01-01T02:20:00Z", "gameName": "Clover"},
    ]))
}

#[test]
fn test_two_records_same_hour() {
    let records = records(json!([
        {"@timestamp": "2024-01-01T00:00:00Z", "gameName": "A"},
        {"@timestamp": "2024-01-01T00:30:00Z", "gameName": "A"},
    ]));

    let minutes = timeline(&records).into_data().unwrap();
    assert_eq!(minutes.resolution, Resolution::Minute);
    assert_eq!(minutes.games, vec!["A"]);
    assert_eq!(minutes.series("A"), vec![1, 1]);
    assert_eq!(minutes.buckets[0].label, "2024-01-01 00:00");
    assert_eq!(minutes.buckets[1].label, "2024-01-01 00:30");

    let hours = adaptive_series(&records).into_data().unwrap();
    assert_eq!(hours.resolution, Resolution::Hour);
    assert_eq!(hours.buckets.len(), 1);
    assert_eq!(hours.series("A"), vec![2]);
}

#[test]
fn test_far_future_records_share_buckets() {
    let records = records(json!([
        {"@timestamp": "2300-01-01T00:00:10Z", "gameName": "A"},
        {"@timestamp": "2300-01-01T00:00:40Z", "gameName": "A"},
    ]));

    let minutes = timeline(&records).into_data().unwrap();
    assert_eq!(minutes.buckets.len(), 1);
    assert_eq!(minutes.buckets[0].label, "2300-01-01 00:00");
    assert_eq!(minutes.series("A"), vec![2]);

    let hours = adaptive_series(&records).into_data().unwrap();
    assert_eq!(hours.buckets.len(), 1);
    assert_eq!(hours.total(), 2);
}

#[test]
fn test_adaptive_boundary_bucket_counts() {
    let seven_days = records(json!([
        {"@timestamp": "2024-01-01T00:00:00Z", "gameName": "A"},
        {"@timestamp": "2024-01-08T00:00:00Z", "gameName": "B"},
    ]));
    let series = adaptive_series(&seven_days).into_data().unwrap();
    assert_eq!(series.resolution, Resolution::Hour);
    assert_eq!(series.buckets.len(), 7 * 24 + 1);
    assert_eq!(series.total(), 2);

    let eight_days = records(json!([
        {"@timestamp": "2024-01-01T00:00:00Z", "gameName": "A"},
        {"@timestamp": "2024-01-09T00:00:00Z", "gameName": "B"},
    ]));
    let series = adaptive_series(&eight_days).into_data().unwrap();
    assert_eq!(series.resolution, Resolution::Day);
    assert_eq!(series.buckets.len(), 9);
    assert_eq!(series.buckets[4].total, 0);
    assert_eq!(series.buckets[4].counts.len(), 2);
}

#[test]
fn test_series_align_across_games() {
    let series = timeline(&mixed()).into_data().unwrap();

    assert_eq!(series.games, vec!["Bingo", "Aces", "Clover"]);
    for bucket in &series.buckets {
        assert_eq!(bucket.counts.len(), 3);
        assert_eq!(bucket.counts.values().sum::<usize>(), bucket.total);
    }
    assert_eq!(series.total(), 4);
}

#[test]
fn test_cross_tab_sum_matches_eligible_records() {
    let records = mixed();
    let tab = cross_tab(&records).into_data().unwrap();

    let eligible = records
        .iter()
        .filter(|r| r.game_name().is_some() && r.platform().is_some())
        .count();
    let cell_sum: usize = tab.cells.iter().flatten().sum();

    assert_eq!(cell_sum, eligible);
    assert_eq!(tab.total, eligible);
    assert_eq!(tab.count("Aces", "Android"), 0);
}

#[test]
fn test_frequency_percentages_sum_to_hundred() {
    let table = frequency_table(&mixed(), CategoryField::ErrorType)
        .into_data()
        .unwrap();

    assert_eq!(table.total, 4);
    let sum: f64 = table.rows.iter().map(|row| row.percentage).sum();
    assert!((sum - 100.0).abs() < 1e-9);
    assert_eq!(table.row("fatal").unwrap().count, 2);
}

#[test]
fn test_pie_first_seen_order() {
    let pie = pie_chart(&mixed(), CategoryField::Platform).into_data().unwrap();
    let keys: Vec<_> = pie.slices.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["Windows", "Android", "iOS"]);
}

#[test]
fn test_zero_records_give_empty_views() {
    let none: Vec<CanonicalRecord> = Vec::new();

    assert!(frequency_table(&none, CategoryField::ErrorType).is_empty());
    assert!(pie_chart(&none, CategoryField::Platform).is_empty());
    assert!(browser_hierarchy(&none).is_empty());
    assert!(timeline(&none).is_empty());
    assert!(adaptive_series(&none).is_empty());
    assert!(cross_tab(&none).is_empty());

    let views = DashboardViews::compute(&none, &FilterSpec::all_time(&none), ViewOptions::default());
    assert_eq!(views.record_count, 0);
    assert_eq!(
        serde_json::to_value(&views.heatmap).unwrap(),
        json!({"status": "empty"})
    );
}
