//! Group-count and top-N primitives shared by every report.

use std::collections::HashMap;

/// Occurrence counts that remember the order keys were first seen.
///
/// [`Tally::top`] sorts stably, so entities with equal counts keep that
/// first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str) {
        self.add_n(key, 1);
    }

    pub fn add_n(&mut self, key: &str, n: usize) {
        match self.index.get(key) {
            Some(&pos) => self.entries[pos].1 += n,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), n));
            }
        }
    }

    /// Adds `other`'s counts into this tally. Keys new to `self` are appended
    /// in `other`'s order.
    pub fn merge(&mut self, other: &Tally) {
        for (key, count) in &other.entries {
            self.add_n(key, *count);
        }
    }

    pub fn get(&self, key: &str) -> usize {
        self.index.get(key).map_or(0, |&pos| self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    /// The `n` highest counts, descending.
    pub fn top(&self, n: usize) -> Vec<(String, usize)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tally {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tally = Tally::new();
        for key in iter {
            tally.add(key.as_ref());
        }
        tally
    }
}
