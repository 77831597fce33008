use std::collections::HashSet;

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Canonical form used to compare stems: lowercase, no diacritics, every run
/// of characters other than letters and digits collapsed to one space.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let mut out = String::with_capacity(folded.len());
    let mut pending_space = false;
    for c in folded.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Working set of normalized stems for one generation run.
///
/// Seeded from the history snapshot; every accepted candidate is added so a
/// later candidate in the same batch that repeats it is rejected too.
#[derive(Debug, Clone, Default)]
pub struct DuplicateIndex {
    exact: HashSet<String>,
    entries: Vec<String>,
    containment_threshold: usize,
}

impl DuplicateIndex {
    pub fn new(containment_threshold: usize) -> Self {
        Self {
            exact: HashSet::new(),
            entries: Vec::new(),
            containment_threshold,
        }
    }

    pub fn from_history<I, S>(history: I, containment_threshold: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::new(containment_threshold);
        for stem in history {
            index.insert(stem.as_ref());
        }
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, text: &str) {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return;
        }
        if self.exact.insert(normalized.clone()) {
            self.entries.push(normalized);
        }
    }

    /// Exact match on the normalized form, or, for candidates longer than the
    /// containment threshold, substring containment in either direction.
    pub fn is_duplicate(&self, candidate: &str) -> bool {
        let normalized = normalize(candidate);
        if self.exact.contains(&normalized) {
            return true;
        }
        if normalized.chars().count() <= self.containment_threshold {
            return false;
        }
        self.entries
            .iter()
            .any(|seen| seen.contains(normalized.as_str()) || normalized.contains(seen.as_str()))
    }

    /// Adds the candidate when it is new. Returns whether it was accepted.
    pub fn accept(&mut self, candidate: &str) -> bool {
        if self.is_duplicate(candidate) {
            return false;
        }
        self.insert(candidate);
        true
    }
}
