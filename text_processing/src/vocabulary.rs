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


use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use camino::Utf8Path;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use crate::corpus::CorpusStatistics;
use crate::error::{ConfigurationError, PersistenceError};
use crate::fingerprint::ExtractorFingerprint;
use crate::frequency::FrequencyDistribution;
use crate::persistence::{load_json, save_json};
use crate::NGRAM_GLUE;

/// How the keys of a vocabulary are selected from the corpus statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SelectionPolicy {
    /// The [k] most frequent keys. Keys with less than [min_key_length] chars are ignored.
    /// Equal counts are ordered lexicographically.
    TopK {
        k: usize,
        #[serde(default)]
        min_key_length: usize,
    },
    /// Every key with `count / total_samples >= ratio`, in lexicographic order.
    Threshold {
        ratio: f64
    },
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::TopK { k: 500, min_key_length: 0 }
    }
}

impl SelectionPolicy {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            SelectionPolicy::Threshold { ratio } if !(0.0..=1.0).contains(ratio) => {
                Err(ConfigurationError::InvalidThreshold(*ratio))
            }
            _ => Ok(())
        }
    }
}

/// A candidate in the top k heap, greater means less frequent.
#[derive(Debug, Eq, PartialEq)]
struct Candidate<'a> {
    count: u64,
    key: &'a str,
}

impl Ord for Candidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.count.cmp(&self.count).then_with(|| self.key.cmp(other.key))
    }
}

impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Selects the keys of a [FeatureVocabulary].
#[derive(Debug, Clone)]
pub struct VocabularySelector {
    policy: SelectionPolicy,
    name: Option<String>,
}

impl VocabularySelector {
    pub fn new(policy: SelectionPolicy) -> Result<Self, ConfigurationError> {
        policy.validate()?;
        Ok(Self { policy, name: None })
    }

    /// Overrides the name of the vocabulary, defaults to the name of the extractor.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    pub fn select(&self, statistics: &CorpusStatistics) -> FeatureVocabulary {
        let keys = self.select_keys(statistics.frequencies());
        let name = self.name.as_deref().unwrap_or(statistics.vocabulary_name());
        log::info!("Selected {} of {} keys for the vocabulary {name}.", keys.len(), statistics.frequencies().len());
        FeatureVocabulary::new(name, statistics.fingerprint(), keys)
    }

    /// Applies the policy to [distribution].
    pub fn select_keys(&self, distribution: &FrequencyDistribution) -> Vec<String> {
        match &self.policy {
            SelectionPolicy::TopK { k, min_key_length } => {
                top_k(distribution, *k, *min_key_length)
            }
            SelectionPolicy::Threshold { ratio } => {
                threshold(distribution, *ratio)
            }
        }
    }
}

fn top_k(distribution: &FrequencyDistribution, k: usize, min_key_length: usize) -> Vec<String> {
    if k == 0 {
        return Vec::new()
    }
    let mut heap = BinaryHeap::with_capacity(k.min(distribution.len()) + 1);
    for (key, count) in distribution.iter() {
        if key.chars().count() < min_key_length {
            continue
        }
        let candidate = Candidate { count, key };
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }
    }
    heap.into_sorted_vec()
        .into_iter()
        .map(|candidate| candidate.key.to_string())
        .collect_vec()
}

fn threshold(distribution: &FrequencyDistribution, ratio: f64) -> Vec<String> {
    let total = distribution.total_samples();
    if total == 0 {
        return Vec::new()
    }
    distribution
        .iter()
        .filter(|(_, count)| *count as f64 / total as f64 >= ratio)
        .map(|(key, _)| key.to_string())
        .collect_vec()
}

/// The ordered keys the feature vectors are aligned to.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FeatureVocabulary {
    name: String,
    fingerprint: ExtractorFingerprint,
    keys: Vec<String>,
}

impl FeatureVocabulary {
    /// Creates a vocabulary, repeated keys are only kept at their first position.
    pub fn new(name: impl Into<String>, fingerprint: ExtractorFingerprint, keys: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fingerprint,
            keys: keys.into_iter().unique().collect_vec(),
        }
    }

    /// The prefix of the feature names.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fingerprint of the extractor the keys were collected with.
    pub fn fingerprint(&self) -> ExtractorFingerprint {
        self.fingerprint
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The column names of a feature matrix, `<name>_<key>`.
    pub fn feature_names(&self) -> Vec<String> {
        self.keys
            .iter()
            .map(|key| format!("{}{NGRAM_GLUE}{key}", self.name))
            .collect_vec()
    }

    pub fn save(&self, path: impl AsRef<Utf8Path>) -> Result<(), PersistenceError> {
        save_json(path.as_ref(), self)
    }

    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let loaded: Self = load_json(path)?;
        let mut seen = HashSet::with_capacity(loaded.keys.len());
        if let Some(duplicate) = loaded.keys.iter().find(|key| !seen.insert(key.as_str())) {
            return Err(PersistenceError::corrupt(path, format!("The key {duplicate} is contained twice!")))
        }
        Ok(loaded)
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;
    use camino_tempfile::tempdir;
    use crate::error::ConfigurationError;
    use crate::fingerprint::ExtractorFingerprint;
    use crate::frequency::FrequencyDistribution;
    use crate::vocabulary::{FeatureVocabulary, SelectionPolicy, VocabularySelector};

    fn distribution() -> FrequencyDistribution {
        let mut fd = FrequencyDistribution::new();
        fd.add_sample("a", 5);
        fd.add_sample("bb", 3);
        fd.add_sample("cc", 3);
        fd.add_sample("d", 1);
        fd.add_sample("eee", 8);
        fd
    }

    fn many_keys() -> FrequencyDistribution {
        let mut fd = FrequencyDistribution::new();
        for idx in 0..5000u64 {
            fd.add_sample(format!("key{idx}"), idx % 97 + 1);
        }
        fd
    }

    #[test]
    fn top_k_orders_by_count_then_key() {
        let selector = VocabularySelector::new(SelectionPolicy::TopK { k: 3, min_key_length: 0 }).unwrap();
        assert_eq!(vec!["eee", "a", "bb"], selector.select_keys(&distribution()));
    }

    #[test]
    fn top_k_respects_the_minimal_key_length() {
        let selector = VocabularySelector::new(SelectionPolicy::TopK { k: 10, min_key_length: 2 }).unwrap();
        assert_eq!(vec!["eee", "bb", "cc"], selector.select_keys(&distribution()));
    }

    #[test]
    fn top_k_never_exceeds_k() {
        let selector = VocabularySelector::new(SelectionPolicy::TopK { k: 5, min_key_length: 0 }).unwrap();
        let keys = selector.select_keys(&many_keys());
        assert_eq!(5, keys.len());
        let fd = many_keys();
        assert!(keys.iter().all(|key| fd.count(key) == 97));
    }

    #[test]
    fn threshold_is_monotone() {
        let fd = many_keys();
        let mut last = usize::MAX;
        for step in 0..=20 {
            let ratio = step as f64 * 0.00005;
            let selector = VocabularySelector::new(SelectionPolicy::Threshold { ratio }).unwrap();
            let size = selector.select_keys(&fd).len();
            assert!(size <= last, "The vocabulary grew from {last} to {size} at {ratio}!");
            last = size;
        }
    }

    #[test]
    fn threshold_selects_lexicographically() {
        let selector = VocabularySelector::new(SelectionPolicy::Threshold { ratio: 0.15 }).unwrap();
        // total is 20, 0.15 requires a count of at least 3
        assert_eq!(vec!["a", "bb", "cc", "eee"], selector.select_keys(&distribution()));
    }

    #[test]
    fn rejects_thresholds_outside_of_the_unit_interval() {
        assert_eq!(
            ConfigurationError::InvalidThreshold(1.5),
            VocabularySelector::new(SelectionPolicy::Threshold { ratio: 1.5 }).unwrap_err()
        );
        assert!(VocabularySelector::new(SelectionPolicy::Threshold { ratio: f64::NAN }).is_err());
    }

    #[test]
    fn empty_distribution_gives_empty_vocabulary() {
        let empty = FrequencyDistribution::new();
        for policy in [
            SelectionPolicy::TopK { k: 5, min_key_length: 0 },
            SelectionPolicy::Threshold { ratio: 0.0 },
        ] {
            let selector = VocabularySelector::new(policy).unwrap();
            assert!(selector.select_keys(&empty).is_empty());
        }
    }

    #[test]
    fn feature_names_use_the_prefix() {
        let fingerprint = ExtractorFingerprint::builder().finish();
        let vocabulary = FeatureVocabulary::new(
            "ngram",
            fingerprint,
            vec!["a_b".to_string(), "c".to_string(), "a_b".to_string()]
        );
        assert_eq!(2, vocabulary.len());
        assert_eq!(vec!["ngram_a_b", "ngram_c"], vocabulary.feature_names());
    }

    #[test]
    fn can_be_saved_and_loaded() {
        let vocabulary = FeatureVocabulary::new(
            "ngram",
            ExtractorFingerprint::builder().add("x").finish(),
            vec!["b".to_string(), "a".to_string()]
        );
        let dir = tempdir().unwrap();
        let path = dir.path().join("vocabulary.json");
        vocabulary.save(&path).unwrap();
        assert_eq!(vocabulary, FeatureVocabulary::load(&path).unwrap());
    }

    #[test]
    fn duplicates_in_a_file_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vocabulary.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"name":"ngram","fingerprint":"0000000000000001","keys":["a","a"]}}"#).unwrap();
        drop(file);
        let err = FeatureVocabulary::load(&path).expect_err("Duplicates must not load!");
        assert_eq!(path, err.path);
    }
}
