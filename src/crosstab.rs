//! Game × platform cross-tabulation (heatmap)

use crate::record::CanonicalRecord;
use crate::view_result::ViewResult;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossTab {
    /// Sorted; games seen together with a platform
    pub games: Vec<String>,
    /// Sorted; every platform seen in the record set
    pub platforms: Vec<String>,
    /// `cells[g][p]`, zero for pairs never observed
    pub cells: Vec<Vec<usize>>,
    pub max_count: usize,
    /// Records that had both a game and a platform
    pub total: usize,
}

impl CrossTab {
    /// Zero for labels outside either axis
    pub fn count(&self, game: &str, platform: &str) -> usize {
        let row = self.games.binary_search_by(|g| g.as_str().cmp(game));
        let col = self.platforms.binary_search_by(|p| p.as_str().cmp(platform));
        match (row, col) {
            (Ok(row), Ok(col)) => self.cells[row][col],
            _ => 0,
        }
    }

    /// Cell count scaled by the matrix maximum, in `[0, 1]`
    pub fn intensity(&self, game: &str, platform: &str) -> f64 {
        if self.max_count == 0 {
            return 0.0;
        }
        self.count(game, platform) as f64 / self.max_count as f64
    }
}

pub fn cross_tab<R: AsRef<CanonicalRecord>>(records: &[R]) -> ViewResult<CrossTab> {
    let mut pairs: FxHashMap<(&str, &str), usize> = FxHashMap::default();
    let mut platforms = BTreeSet::new();

    for record in records.iter().map(|r| r.as_ref()) {
        let Some(platform) = record.platform() else {
            continue;
        };
        platforms.insert(platform);

        if let Some(game) = record.game_name() {
            *pairs.entry((game, platform)).or_insert(0) += 1;
        }
    }

    let games: BTreeSet<&str> = pairs.keys().map(|(game, _)| *game).collect();
    if games.is_empty() || platforms.is_empty() {
        return ViewResult::Empty;
    }

    let cells: Vec<Vec<usize>> = games
        .iter()
        .map(|game| {
            platforms
                .iter()
                .map(|platform| pairs.get(&(*game, *platform)).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    let max_count = cells.iter().flatten().copied().max().unwrap_or(0);

    ViewResult::NonEmpty(CrossTab {
        games: games.into_iter().map(str::to_string).collect(),
        platforms: platforms.into_iter().map(str::to_string).collect(),
        cells,
        max_count,
        total: pairs.values().sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use serde_json::json;

    fn records() -> Vec<CanonicalRecord> {
        normalize(&json!([
            {"@timestamp": "2024-01-01T00:00:00Z", "gameName": "Bingo", "ua": {"platform": "Windows"}},
            {"@timestamp": "2024-01-01T00:01:00Z", "gameName": "Bingo", "ua": {"platform": "Windows"}},
            {"@timestamp": "2024-01-01T00:02:00Z", "gameName": "Aces", "ua": {"platform": "Android"}},
            {"@timestamp": "2024-01-01T00:03:00Z", "ua": {"platform": "iOS"}},
            {"@timestamp": "2024-01-01T00:04:00Z", "gameName": "Clover"},
        ]))
        .unwrap()
        .records
    }

    #[test]
    fn test_axes_and_cells() {
        let tab = cross_tab(&records()).into_data().unwrap();

        assert_eq!(tab.games, vec!["Aces", "Bingo"]);
        assert_eq!(tab.platforms, vec!["Android", "Windows", "iOS"]);
        assert_eq!(tab.cells, vec![vec![1, 0, 0], vec![0, 2, 0]]);
        assert_eq!(tab.max_count, 2);
        assert_eq!(tab.total, 3);
    }

    #[test]
    fn test_lookup_and_intensity() {
        let tab = cross_tab(&records()).into_data().unwrap();

        assert_eq!(tab.count("Bingo", "Windows"), 2);
        assert_eq!(tab.count("Bingo", "iOS"), 0);
        assert_eq!(tab.count("Clover", "Windows"), 0);
        assert_eq!(tab.intensity("Bingo", "Windows"), 1.0);
        assert_eq!(tab.intensity("Aces", "Android"), 0.5);
    }

    #[test]
    fn test_empty_without_pairs() {
        let records = normalize(&json!([
            {"@timestamp": "2024-01-01T00:00:00Z", "gameName": "Bingo"},
            {"@timestamp": "2024-01-01T00:00:00Z", "ua": {"platform": "Windows"}},
        ]))
        .unwrap()
        .records;

        assert!(cross_tab(&records).is_empty());
    }
}
