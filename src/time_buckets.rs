//! Per-game time series
//!
//! - `timeline`: sparse one-minute buckets, only minutes that saw a record
//! - `adaptive_series`: dense hour or day buckets covering the whole span
//!
//! Records without a game name are left out of both. Every bucket carries a
//! count for every game so stacked series line up.

use crate::histogram::Histogram;
use crate::record::CanonicalRecord;
use crate::view_result::ViewResult;
use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Spans strictly longer than this many days switch to day buckets
pub const DAY_MODE_THRESHOLD_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Minute,
    Hour,
    Day,
}

impl Resolution {
    pub fn step(&self) -> Duration {
        match self {
            Resolution::Minute => Duration::minutes(1),
            Resolution::Hour => Duration::hours(1),
            Resolution::Day => Duration::days(1),
        }
    }

    /// Start of the bucket containing `ts` (UTC)
    ///
    /// Works on calendar fields, so it holds for every year chrono can
    /// represent, not only the nanosecond-epoch range.
    pub fn truncate(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let naive = ts.naive_utc();
        let date = naive.date();
        let start = match self {
            Resolution::Minute => date.and_hms_opt(naive.hour(), naive.minute(), 0),
            Resolution::Hour => date.and_hms_opt(naive.hour(), 0, 0),
            Resolution::Day => date.and_hms_opt(0, 0, 0),
        };
        start.map_or(ts, |start| Utc.from_utc_datetime(&start))
    }

    pub fn label(&self, start: DateTime<Utc>) -> String {
        let pattern = match self {
            Resolution::Minute => "%Y-%m-%d %H:%M",
            Resolution::Hour => "%Y-%m-%d %H:00",
            Resolution::Day => "%Y-%m-%d",
        };
        start.format(pattern).to_string()
    }

    /// Hour buckets unless the span exceeds the day-mode threshold
    pub fn for_span(earliest: DateTime<Utc>, latest: DateTime<Utc>) -> Self {
        if latest - earliest > Duration::days(DAY_MODE_THRESHOLD_DAYS) {
            Resolution::Day
        } else {
            Resolution::Hour
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucket {
    pub start: DateTime<Utc>,
    pub label: String,
    /// One entry per game of the series, zero included
    pub counts: BTreeMap<String, usize>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub resolution: Resolution,
    /// Series keys in first-seen chronological order
    pub games: Vec<String>,
    /// Chronological
    pub buckets: Vec<TimeBucket>,
}

impl TimeSeries {
    /// One game's counts, aligned with `buckets`
    pub fn series(&self, game: &str) -> Vec<usize> {
        self.buckets
            .iter()
            .map(|bucket| bucket.counts.get(game).copied().unwrap_or(0))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.total).sum()
    }
}

/// Sparse one-minute histogram per game
pub fn timeline<R: AsRef<CanonicalRecord>>(records: &[R]) -> ViewResult<TimeSeries> {
    let events = game_events(records);
    if events.is_empty() {
        return ViewResult::Empty;
    }

    let resolution = Resolution::Minute;
    let starts: BTreeSet<_> = events
        .iter()
        .map(|(ts, _)| resolution.truncate(*ts))
        .collect();

    ViewResult::NonEmpty(assemble(resolution, starts.into_iter().collect(), &events))
}

/// Gap-free hour or day series from the earliest to the latest record
pub fn adaptive_series<R: AsRef<CanonicalRecord>>(records: &[R]) -> ViewResult<TimeSeries> {
    // The span covers every record, with or without a game
    let mut stamps = records.iter().map(|r| r.as_ref().timestamp);
    let Some(first) = stamps.next() else {
        return ViewResult::Empty;
    };
    let (earliest, latest) = stamps.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));

    let events = game_events(records);
    if events.is_empty() {
        return ViewResult::Empty;
    }

    let resolution = Resolution::for_span(earliest, latest);
    let step = resolution.step();
    let end = resolution.truncate(latest);

    let mut starts = Vec::new();
    let mut current = resolution.truncate(earliest);
    while current <= end {
        starts.push(current);
        current = current + step;
    }

    ViewResult::NonEmpty(assemble(resolution, starts, &events))
}

/// `(timestamp, game)` for records with a game, chronologically (stable)
fn game_events<R: AsRef<CanonicalRecord>>(records: &[R]) -> Vec<(DateTime<Utc>, &str)> {
    let mut events: Vec<_> = records
        .iter()
        .filter_map(|r| {
            let record = r.as_ref();
            Some((record.timestamp, record.game_name()?))
        })
        .collect();
    events.sort_by_key(|(ts, _)| *ts);
    events
}

fn assemble(
    resolution: Resolution,
    starts: Vec<DateTime<Utc>>,
    events: &[(DateTime<Utc>, &str)],
) -> TimeSeries {
    let games: Histogram = events.iter().map(|(_, game)| *game).collect();
    let zeroed: BTreeMap<String, usize> = games.keys().map(|game| (game.to_string(), 0)).collect();

    let mut buckets: Vec<TimeBucket> = starts
        .into_iter()
        .map(|start| TimeBucket {
            start,
            label: resolution.label(start),
            counts: zeroed.clone(),
            total: 0,
        })
        .collect();

    let slots: FxHashMap<DateTime<Utc>, usize> = buckets
        .iter()
        .enumerate()
        .map(|(slot, bucket)| (bucket.start, slot))
        .collect();

    for (ts, game) in events {
        let Some(&slot) = slots.get(&resolution.truncate(*ts)) else {
            continue;
        };
        let bucket = &mut buckets[slot];
        if let Some(count) = bucket.counts.get_mut(*game) {
            *count += 1;
        }
        bucket.total += 1;
    }

    TimeSeries {
        resolution,
        games: games.keys().map(str::to_string).collect(),
        buckets,
    }
}
