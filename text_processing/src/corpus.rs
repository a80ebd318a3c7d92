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


use std::fmt::{Display, Formatter};
use camino::Utf8Path;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::document::Document;
use crate::error::PersistenceError;
use crate::extractor::FeatureExtractor;
use crate::fingerprint::ExtractorFingerprint;
use crate::frequency::FrequencyDistribution;
use crate::persistence::{load_binary, save_binary};

const CORPUS_STATISTICS_KIND: &str = "CorpusStatistics";

/// Runs an extractor over every document of a corpus and counts the keys.
///
/// The collected counts are only accessible after [CorpusStatisticsCollector::finish],
/// a vocabulary can not be selected from a corpus that is still being collected.
pub struct CorpusStatisticsCollector<'a, E: ?Sized> {
    extractor: &'a E,
    document_count: u64,
    frequencies: FrequencyDistribution,
    document_frequencies: FrequencyDistribution,
}

impl<'a, E> CorpusStatisticsCollector<'a, E> where E: FeatureExtractor + ?Sized {
    pub fn new(extractor: &'a E) -> Self {
        Self {
            extractor,
            document_count: 0,
            frequencies: FrequencyDistribution::new(),
            document_frequencies: FrequencyDistribution::new(),
        }
    }

    /// Collects the keys of a single [document].
    pub fn add(&mut self, document: &Document) {
        let keys = self.extractor.document_keys(document);
        log::debug!("Collected {} distinct keys from {}.", keys.len(), document.id());
        self.document_count = self.document_count.saturating_add(1);
        self.document_frequencies.extend(keys.keys());
        self.frequencies.merge(keys);
    }

    pub fn add_all<'d, I>(&mut self, documents: I) where I: IntoIterator<Item=&'d Document> {
        for document in documents {
            self.add(document);
        }
    }

    /// Adds the counts of a collector that ran with the same extractor.
    pub fn merge(&mut self, other: Self) {
        self.document_count = self.document_count.saturating_add(other.document_count);
        self.frequencies.merge(other.frequencies);
        self.document_frequencies.merge(other.document_frequencies);
    }

    pub fn document_count(&self) -> u64 {
        self.document_count
    }

    /// Ends the collection.
    pub fn finish(self) -> CorpusStatistics {
        let statistics = CorpusStatistics {
            vocabulary_name: self.extractor.vocabulary_name().to_string(),
            fingerprint: self.extractor.fingerprint(),
            document_count: self.document_count,
            frequencies: self.frequencies,
            document_frequencies: self.document_frequencies,
        };
        log::info!(
            "Collected {} distinct keys with {} samples from {} documents.",
            statistics.frequencies.len(),
            statistics.frequencies.total_samples(),
            statistics.document_count
        );
        statistics
    }
}

impl<'a, E> CorpusStatisticsCollector<'a, E> where E: FeatureExtractor + Sync + ?Sized {
    /// Collects [documents] with the rayon thread pool.
    /// Every worker counts into its own collector, the collectors are merged at the end.
    pub fn collect_parallel(extractor: &'a E, documents: &[Document]) -> CorpusStatistics {
        documents
            .par_iter()
            .fold(
                || Self::new(extractor),
                |mut collector, document| {
                    collector.add(document);
                    collector
                }
            )
            .reduce(
                || Self::new(extractor),
                |mut a, b| {
                    a.merge(b);
                    a
                }
            )
            .finish()
    }
}

/// The finished statistics over a corpus.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CorpusStatistics {
    vocabulary_name: String,
    fingerprint: ExtractorFingerprint,
    document_count: u64,
    frequencies: FrequencyDistribution,
    document_frequencies: FrequencyDistribution,
}

impl CorpusStatistics {
    /// The name of the extractor the statistics were collected with.
    pub fn vocabulary_name(&self) -> &str {
        &self.vocabulary_name
    }

    pub fn fingerprint(&self) -> ExtractorFingerprint {
        self.fingerprint
    }

    pub fn document_count(&self) -> u64 {
        self.document_count
    }

    /// How often every key occurred in the corpus.
    pub fn frequencies(&self) -> &FrequencyDistribution {
        &self.frequencies
    }

    /// In how many documents every key occurred.
    pub fn document_frequencies(&self) -> &FrequencyDistribution {
        &self.document_frequencies
    }

    pub fn document_frequency(&self, key: &str) -> u64 {
        self.document_frequencies.count(key)
    }

    pub fn save(&self, path: impl AsRef<Utf8Path>) -> Result<(), PersistenceError> {
        save_binary(path.as_ref(), CORPUS_STATISTICS_KIND, self)
    }

    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let loaded: Self = load_binary(path, CORPUS_STATISTICS_KIND)?;
        loaded.validate().map_err(|message| PersistenceError::corrupt(path, message))?;
        log::info!("Loaded the statistics of {} documents from {path}.", loaded.document_count);
        Ok(loaded)
    }

    fn validate(&self) -> Result<(), String> {
        self.frequencies.validate()?;
        self.document_frequencies.validate()?;
        if self.frequencies.len() != self.document_frequencies.len() {
            return Err("The document frequencies do not match the frequencies!".to_string())
        }
        for (key, count) in self.document_frequencies.iter() {
            if count > self.document_count {
                return Err(format!("The key {key} occurs in more documents than the corpus has!"))
            }
            if count > self.frequencies.count(key) {
                return Err(format!("The key {key} occurs in more documents than it was counted!"))
            }
        }
        Ok(())
    }
}

impl Display for CorpusStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Extractor: {} ({})\n", self.vocabulary_name, self.fingerprint)?;
        write!(f, "Document Count: {}\n", self.document_count)?;
        write!(f, "Key Count: {}\n", self.frequencies.total_samples())?;
        write!(f, "Unique Key Count: {}", self.frequencies.len())
    }
}

#[cfg(test)]
mod test {
    use camino_tempfile::tempdir;
    use itertools::Itertools;
    use lipsum::lipsum_words_with_rng;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use crate::corpus::{CorpusStatistics, CorpusStatisticsCollector};
    use crate::document::Document;
    use crate::extractor::{ExtractorConfig, FeatureExtractor};
    use crate::ngrams::NGramConfig;
    use crate::tokenizer::Tokenizer;

    fn create_corpus(size: usize) -> Vec<Document> {
        let mut rng = StdRng::seed_from_u64(1234);
        let tokenizer = Tokenizer::new(false, true, None);
        (0..size)
            .map(|idx| {
                let words = rng.gen_range(5..40);
                let text = lipsum_words_with_rng(StdRng::seed_from_u64(rng.gen()), words);
                tokenizer.to_document(idx.to_string(), &text)
            })
            .collect_vec()
    }

    #[test]
    fn counts_frequencies_and_document_frequencies() {
        let extractor = ExtractorConfig::NGram(NGramConfig::new(1, 1)).build(None).unwrap();
        let mut collector = CorpusStatisticsCollector::new(&extractor);
        collector.add(&Document::from_tokens("1", ["a", "b", "a"]));
        collector.add(&Document::from_tokens("2", ["a", "c"]));
        assert_eq!(2, collector.document_count());
        let statistics = collector.finish();
        assert_eq!(3, statistics.frequencies().count("a"));
        assert_eq!(2, statistics.document_frequency("a"));
        assert_eq!(1, statistics.document_frequency("b"));
        assert_eq!(5, statistics.frequencies().total_samples());
        assert_eq!("ngram", statistics.vocabulary_name());
        assert_eq!(extractor.fingerprint(), statistics.fingerprint());
    }

    #[test]
    fn parallel_collection_equals_sequential_collection() {
        let documents = create_corpus(64);
        let extractor = ExtractorConfig::NGram(NGramConfig::new(1, 3)).build(None).unwrap();
        let mut collector = CorpusStatisticsCollector::new(&extractor);
        collector.add_all(&documents);
        let sequential = collector.finish();
        let parallel = CorpusStatisticsCollector::collect_parallel(&extractor, &documents);
        assert_eq!(sequential, parallel);
        assert_eq!(64, parallel.document_count());
    }

    #[test]
    fn empty_corpus_yields_empty_statistics() {
        let extractor = ExtractorConfig::default().build(None).unwrap();
        let statistics = CorpusStatisticsCollector::collect_parallel(&extractor, &[]);
        assert_eq!(0, statistics.document_count());
        assert!(statistics.frequencies().is_empty());
    }

    #[test]
    fn can_be_saved_and_loaded() {
        let documents = create_corpus(16);
        let extractor = ExtractorConfig::default().build(None).unwrap();
        let statistics = CorpusStatisticsCollector::collect_parallel(&extractor, &documents);
        let dir = tempdir().unwrap();
        let path = dir.path().join("statistics.bin");
        statistics.save(&path).unwrap();
        assert_eq!(statistics, CorpusStatistics::load(&path).unwrap());
    }

    #[test]
    fn a_frequency_file_is_not_a_statistics_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fd.bin");
        crate::frequency::FrequencyDistribution::new().save(&path).unwrap();
        let err = CorpusStatistics::load(&path).expect_err("The kind has to be checked!");
        assert_eq!(path, err.path);
    }
}
