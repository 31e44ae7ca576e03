//! Browser → version breakdown
//!
//! Only the primary brand (index 0 of the brand list) of each record is
//! counted. A primary brand without a version counts at the browser level
//! but contributes no version slice.

use crate::frequency::{slices, PieSlice};
use crate::histogram::Histogram;
use crate::record::CanonicalRecord;
use crate::view_result::ViewResult;
use rustc_hash::FxHashMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserNode {
    pub name: String,
    pub count: usize,
    pub versions: Vec<PieSlice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserHierarchy {
    pub total: usize,
    /// First-seen order
    pub browsers: Vec<BrowserNode>,
    #[serde(skip)]
    index: FxHashMap<String, usize>,
}

impl BrowserHierarchy {
    pub fn browser(&self, name: &str) -> Option<&BrowserNode> {
        self.index.get(name).map(|&slot| &self.browsers[slot])
    }

    /// Version counts for one browser, for drill-down without recomputing
    pub fn versions(&self, name: &str) -> Option<&[PieSlice]> {
        self.browser(name).map(|node| node.versions.as_slice())
    }

    /// Level-one slices, as rendered before drilling down
    pub fn browser_slices(&self) -> Vec<PieSlice> {
        self.browsers
            .iter()
            .map(|node| PieSlice {
                key: node.name.clone(),
                count: node.count,
            })
            .collect()
    }
}

pub fn browser_hierarchy<R: AsRef<CanonicalRecord>>(records: &[R]) -> ViewResult<BrowserHierarchy> {
    let mut browsers = Histogram::new();
    let mut versions: FxHashMap<&str, Histogram> = FxHashMap::default();

    for brand in records.iter().filter_map(|r| r.as_ref().primary_brand()) {
        let Some(name) = brand.brand.as_deref() else {
            continue;
        };
        browsers.add(name);

        let per_browser = versions.entry(name).or_default();
        if let Some(version) = brand.version.as_deref() {
            per_browser.add(version);
        }
    }

    if browsers.is_empty() {
        return ViewResult::Empty;
    }

    let nodes: Vec<BrowserNode> = browsers
        .iter()
        .map(|(name, count)| BrowserNode {
            name: name.to_string(),
            count,
            versions: versions.get(name).map(slices).unwrap_or_default(),
        })
        .collect();

    let index = nodes
        .iter()
        .enumerate()
        .map(|(slot, node)| (node.name.clone(), slot))
        .collect();

    ViewResult::NonEmpty(BrowserHierarchy {
        total: browsers.total(),
        browsers: nodes,
        index,
    })
}
