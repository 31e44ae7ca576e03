use rustc_hash::FxHashMap;

/// Occurrence counts keyed by category, remembering first-seen order.
///
/// Pie slices and series colors are assigned by position, so iteration
/// order must not depend on hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    entries: Vec<(String, usize)>,
    index: FxHashMap<String, usize>,
    total: usize,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence of `key`
    pub fn add(&mut self, key: &str) {
        self.add_n(key, 1);
    }

    pub fn add_n(&mut self, key: &str, n: usize) {
        match self.index.get(key) {
            Some(&slot) => self.entries[slot].1 += n,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), n));
            }
        }
        self.total += n;
    }

    /// Count for `key`; unseen keys count zero
    pub fn get_count(&self, key: &str) -> usize {
        self.index
            .get(key)
            .map_or(0, |&slot| self.entries[slot].1)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.entries.iter().map(|(key, count)| (key.as_str(), *count))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Share of the total per key, as a percentage, in first-seen order
    pub fn percentages(&self) -> Vec<(&str, usize, f64)> {
        if self.total == 0 {
            return Vec::new();
        }

        let scale = 100.0 / self.total as f64;
        self.iter()
            .map(|(key, count)| (key, count, count as f64 * scale))
            .collect()
    }
}

impl<'a> FromIterator<&'a str> for Histogram {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().fold(Histogram::new(), |mut hist, key| {
            hist.add(key);
            hist
        })
    }
}
