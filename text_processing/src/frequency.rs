//Copyright 2024 Felix Engl
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use crate::error::PersistenceError;
use crate::persistence::{load_binary, save_binary};

const FREQUENCY_DISTRIBUTION_KIND: &str = "FrequencyDistribution";

/// Counts how often a feature key was seen.
/// The keys are kept ordered, iteration is reproducible.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FrequencyDistribution {
    counts: BTreeMap<String, u64>,
    total: u64,
}

impl FrequencyDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    delegate::delegate! {
        to self.counts {
            /// The number of distinct keys
            pub fn len(&self) -> usize;
            pub fn is_empty(&self) -> bool;
            #[call(contains_key)]
            pub fn contains(&self, key: &str) -> bool;
        }
    }

    /// Counts a single occurrence of [key].
    #[inline]
    pub fn increment(&mut self, key: impl Into<String>) {
        self.add_sample(key, 1)
    }

    /// Counts [count] occurrences of [key] at once.
    pub fn add_sample(&mut self, key: impl Into<String>, count: u64) {
        if count == 0 {
            return
        }
        let value = self.counts.entry(key.into()).or_insert(0);
        *value = value.saturating_add(count);
        self.total = self.total.saturating_add(count);
    }

    /// The count of [key], 0 if it was never seen.
    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// The number of samples, the sum over all counts.
    pub fn total_samples(&self) -> u64 {
        self.total
    }

    /// The keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item=&str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item=(&str, u64)> {
        self.counts.iter().map(|(key, count)| (key.as_str(), *count))
    }

    /// Adds all counts of [other] to this distribution.
    pub fn merge(&mut self, other: FrequencyDistribution) {
        if self.counts.is_empty() {
            *self = other;
            return
        }
        for (key, count) in other.counts {
            self.add_sample(key, count);
        }
    }

    pub fn save(&self, path: impl AsRef<Utf8Path>) -> Result<(), PersistenceError> {
        save_binary(path.as_ref(), FREQUENCY_DISTRIBUTION_KIND, self)
    }

    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let loaded: Self = load_binary(path, FREQUENCY_DISTRIBUTION_KIND)?;
        loaded.validate().map_err(|message| PersistenceError::corrupt(path, message))?;
        Ok(loaded)
    }

    /// Checks the invariants a freshly loaded distribution has to fulfill.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.counts.values().any(|count| *count == 0) {
            return Err("The distribution contains keys with a count of 0!".to_string())
        }
        let sum = self.counts.values().fold(0u64, |acc, value| acc.saturating_add(*value));
        if sum != self.total {
            return Err(format!("The total of {} does not match the sum of all counts {sum}!", self.total))
        }
        Ok(())
    }
}

impl<S> Extend<S> for FrequencyDistribution where S: Into<String> {
    fn extend<T: IntoIterator<Item=S>>(&mut self, iter: T) {
        for key in iter {
            self.increment(key);
        }
    }
}

impl<S> FromIterator<S> for FrequencyDistribution where S: Into<String> {
    fn from_iter<T: IntoIterator<Item=S>>(iter: T) -> Self {
        let mut new = Self::new();
        new.extend(iter);
        new
    }
}

impl Display for FrequencyDistribution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Total Samples: {}\n", self.total)?;
        write!(f, "Unique Keys: {}\n", self.len())?;
        write!(f, "Keys:")?;
        for (key, count) in &self.counts {
            write!(f, "\n  {key}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;
    use camino_tempfile::tempdir;
    use lipsum::lipsum_words_with_rng;
    use rand::SeedableRng;
    use unicode_segmentation::UnicodeSegmentation;
    use crate::frequency::FrequencyDistribution;

    #[test]
    fn counts_and_totals() {
        let mut fd = FrequencyDistribution::new();
        fd.increment("a");
        fd.increment("a");
        fd.add_sample("b", 3);
        fd.add_sample("c", 0);
        assert_eq!(2, fd.count("a"));
        assert_eq!(3, fd.count("b"));
        assert_eq!(0, fd.count("c"));
        assert!(!fd.contains("c"));
        assert_eq!(5, fd.total_samples());
        assert_eq!(vec!["a", "b"], fd.keys().collect::<Vec<_>>());
    }

    #[test]
    fn merge_adds_counts() {
        let mut a: FrequencyDistribution = ["x", "y", "x"].into_iter().collect();
        let b: FrequencyDistribution = ["y", "z"].into_iter().collect();
        a.merge(b);
        assert_eq!(2, a.count("x"));
        assert_eq!(2, a.count("y"));
        assert_eq!(1, a.count("z"));
        assert_eq!(5, a.total_samples());

        let mut empty = FrequencyDistribution::new();
        empty.merge(a.clone());
        assert_eq!(a, empty);
    }

    #[test]
    fn save_and_load_is_symmetric() {
        let words = lipsum_words_with_rng(rand::rngs::StdRng::seed_from_u64(42), 200);
        let fd: FrequencyDistribution = words.unicode_words().map(str::to_lowercase).collect();
        let dir = tempdir().unwrap();
        let path = dir.path().join("fd.bin");
        fd.save(&path).unwrap();
        let loaded = FrequencyDistribution::load(&path).unwrap();
        assert_eq!(fd, loaded);
    }

    #[test]
    fn empty_distribution_survives_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        FrequencyDistribution::new().save(&path).unwrap();
        assert!(FrequencyDistribution::load(&path).unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_fails_with_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.bin");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"\x03\x00\x00\x00\x00\x00\x00\x00abc").unwrap();
        drop(file);
        let err = FrequencyDistribution::load(&path).expect_err("A corrupt file must not load!");
        assert_eq!(path, err.path);

        let missing = dir.path().join("missing.bin");
        let err = FrequencyDistribution::load(&missing).expect_err("A missing file must not load!");
        assert_eq!(missing, err.path);
    }
}
