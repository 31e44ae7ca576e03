//! Filter engine
//!
//! A record passes when its timestamp is inside the (inclusive) time range
//! and it matches every dimension that has a non-empty selection. A record
//! missing the field a restricted dimension needs never matches it.

use crate::record::CanonicalRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Game,
    Browser,
    Platform,
}

impl Dimension {
    /// Case-sensitive exact match against `allowed`
    pub fn matches(&self, record: &CanonicalRecord, allowed: &BTreeSet<String>) -> bool {
        match self {
            Dimension::Game => record.game_name().is_some_and(|game| allowed.contains(game)),
            Dimension::Platform => record
                .platform()
                .is_some_and(|platform| allowed.contains(platform)),
            Dimension::Browser => record.brands().iter().any(|entry| {
                entry
                    .brand
                    .as_deref()
                    .is_some_and(|brand| allowed.contains(brand))
            }),
        }
    }
}

/// Inclusive `[start, end]`; serialized as a two-element array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange(pub DateTime<Utc>, pub DateTime<Utc>);

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self(start, end)
    }

    /// Always false when start > end
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.0 <= instant && instant <= self.1
    }

    /// Span from the earliest to the latest record, `None` without records
    pub fn covering<R: AsRef<CanonicalRecord>>(records: &[R]) -> Option<Self> {
        let mut stamps = records.iter().map(|r| r.as_ref().timestamp);
        let first = stamps.next()?;
        let (start, end) = stamps.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));
        Some(Self(start, end))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub time_range: TimeRange,
    #[serde(default)]
    pub selected: BTreeMap<Dimension, BTreeSet<String>>,
}

impl FilterSpec {
    pub fn new(time_range: TimeRange) -> Self {
        Self {
            time_range,
            selected: BTreeMap::new(),
        }
    }

    /// The initial dashboard state: every record's time, no restrictions
    pub fn all_time<R: AsRef<CanonicalRecord>>(records: &[R]) -> Self {
        let range = TimeRange::covering(records)
            .unwrap_or(TimeRange(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC));
        Self::new(range)
    }

    /// Builder-style selection; values accumulate per dimension
    pub fn with_selection<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected
            .entry(dimension)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Dimensions with a non-empty selection
    pub fn restricted(&self) -> impl Iterator<Item = (Dimension, &BTreeSet<String>)> + '_ {
        self.selected
            .iter()
            .filter(|(_, allowed)| !allowed.is_empty())
            .map(|(dimension, allowed)| (*dimension, allowed))
    }

    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        self.time_range.contains(record.timestamp)
            && self
                .restricted()
                .all(|(dimension, allowed)| dimension.matches(record, allowed))
    }
}

/// Matching records, in input order
pub fn apply<'a, R: AsRef<CanonicalRecord>>(
    records: &'a [R],
    spec: &FilterSpec,
) -> Vec<&'a CanonicalRecord> {
    records
        .iter()
        .map(|record| record.as_ref())
        .filter(|record| spec.matches(record))
        .collect()
}

/// Values a user can pick from, per dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub games: Vec<String>,
    /// Every brand of every record, not only the primary one
    pub browsers: Vec<String>,
    pub platforms: Vec<String>,
    pub time_range: Option<TimeRange>,
}

impl FilterOptions {
    pub fn from_records<R: AsRef<CanonicalRecord>>(records: &[R]) -> Self {
        let mut games = BTreeSet::new();
        let mut browsers = BTreeSet::new();
        let mut platforms = BTreeSet::new();

        for record in records.iter().map(|record| record.as_ref()) {
            games.extend(record.game_name());
            platforms.extend(record.platform());
            browsers.extend(record.brands().iter().filter_map(|b| b.brand.as_deref()));
        }

        Self {
            games: games.into_iter().map(str::to_string).collect(),
            browsers: browsers.into_iter().map(str::to_string).collect(),
            platforms: platforms.into_iter().map(str::to_string).collect(),
            time_range: TimeRange::covering(records),
        }
    }
}
