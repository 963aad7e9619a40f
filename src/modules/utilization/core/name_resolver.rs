// Name resolution across datasets that share no numeric identifier.
//
// Purpose
// - `normalize` is the one canonical form for person names: lowercase, diacritics
//   stripped, punctuation dropped, whitespace collapsed.
// - `NameIndex` maps normalized names to a value (hours) and resolves lookups by exact
//   key, then by unique containment.
//
// Rules
// - Several candidates containing (or contained in) the query resolve to the default
//   value. Ambiguous joins are never guessed.
// - Records that normalize to the same key are summed.

use std::collections::HashMap;
use std::ops::AddAssign;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

pub fn normalize(name: &str) -> String {
    let stripped: String = name
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Exact,
    Contained,
    Ambiguous(usize),
    Missing,
}

#[derive(Debug, Clone)]
pub struct NameIndex<V> {
    entries: HashMap<String, V>,
}

impl<V> NameIndex<V>
where
    V: Copy + Default + AddAssign,
{
    pub fn build<'a, T: 'a>(
        records: impl IntoIterator<Item = &'a T>,
        name: impl Fn(&T) -> &str,
        value: impl Fn(&T) -> V,
    ) -> Self {
        let mut entries: HashMap<String, V> = HashMap::new();
        for record in records {
            let key = normalize(name(record));
            if key.is_empty() {
                continue;
            }
            *entries.entry(key).or_default() += value(record);
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, name: &str) -> V {
        self.resolve_with_outcome(name).0
    }

    pub fn resolve_with_outcome(&self, name: &str) -> (V, Resolution) {
        let query = normalize(name);
        if query.is_empty() {
            return (V::default(), Resolution::Missing);
        }
        if let Some(value) = self.entries.get(&query) {
            return (*value, Resolution::Exact);
        }

        let candidates: Vec<&V> = self
            .entries
            .iter()
            .filter(|(key, _)| {
                key.contains(query.as_str()) || query.contains(key.as_str())
            })
            .map(|(_, value)| value)
            .collect();

        match candidates.as_slice() {
            [] => (V::default(), Resolution::Missing),
            [only] => (**only, Resolution::Contained),
            many => (V::default(), Resolution::Ambiguous(many.len())),
        }
    }
}
