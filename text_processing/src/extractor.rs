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


use std::sync::Arc;
use serde::{Deserialize, Serialize};
use crate::char_ngrams::{CharacterNGramConfig, CharacterNGramGenerator, CharacterSkipGramConfig, CharacterSkipGramGenerator};
use crate::document::Document;
use crate::error::ConfigurationError;
use crate::fingerprint::ExtractorFingerprint;
use crate::frequency::FrequencyDistribution;
use crate::ngrams::{NGramConfig, NGramGenerator};
use crate::skipgrams::{SkipGramConfig, SkipGramGenerator};
use crate::stopword_registry::StopWordList;
use crate::tokenizer::Tokenizer;

/// Something that turns the sentences of a document into feature keys.
pub trait FeatureExtractor {
    /// The keys of a single sentence, may contain duplicates.
    fn sentence_keys(&self, sentence: &[String]) -> Vec<String>;

    /// The keys of all sentences of [document] with their counts.
    fn document_keys(&self, document: &Document) -> FrequencyDistribution {
        let mut keys = FrequencyDistribution::new();
        for sentence in document.sentences() {
            keys.extend(self.sentence_keys(sentence));
        }
        keys
    }

    /// Identifies the configuration of this extractor.
    /// A vocabulary can only be used with an extractor of the same fingerprint.
    fn fingerprint(&self) -> ExtractorFingerprint;

    /// The name of the vocabulary this extractor depends on.
    fn vocabulary_name(&self) -> &'static str;
}

impl FeatureExtractor for NGramGenerator {
    fn sentence_keys(&self, sentence: &[String]) -> Vec<String> {
        self.ngrams(sentence)
    }

    fn fingerprint(&self) -> ExtractorFingerprint {
        ExtractorFingerprint::builder()
            .add(self.vocabulary_name())
            .add(self.config())
            .add_words(self.stopwords().sorted_words())
            .finish()
    }

    fn vocabulary_name(&self) -> &'static str {
        "ngram"
    }
}

impl FeatureExtractor for SkipGramGenerator {
    fn sentence_keys(&self, sentence: &[String]) -> Vec<String> {
        self.skip_grams(sentence).into_iter().collect()
    }

    fn fingerprint(&self) -> ExtractorFingerprint {
        ExtractorFingerprint::builder()
            .add(self.vocabulary_name())
            .add(self.config())
            .add_words(self.stopwords().sorted_words())
            .finish()
    }

    fn vocabulary_name(&self) -> &'static str {
        "skip_ngram"
    }
}

impl FeatureExtractor for CharacterNGramGenerator {
    fn sentence_keys(&self, sentence: &[String]) -> Vec<String> {
        self.char_ngrams(sentence)
    }

    fn fingerprint(&self) -> ExtractorFingerprint {
        ExtractorFingerprint::builder()
            .add(self.vocabulary_name())
            .add(self.config())
            .finish()
    }

    fn vocabulary_name(&self) -> &'static str {
        "char_ngram"
    }
}

impl FeatureExtractor for CharacterSkipGramGenerator {
    fn sentence_keys(&self, sentence: &[String]) -> Vec<String> {
        self.char_skip_grams(sentence)
    }

    fn fingerprint(&self) -> ExtractorFingerprint {
        ExtractorFingerprint::builder()
            .add(self.vocabulary_name())
            .add(self.config())
            .finish()
    }

    fn vocabulary_name(&self) -> &'static str {
        "char_skip_ngram"
    }
}

/// The configuration of one of the known extractors.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ExtractorConfig {
    NGram(NGramConfig),
    SkipGram(SkipGramConfig),
    CharacterNGram(CharacterNGramConfig),
    CharacterSkipGram(CharacterSkipGramConfig),
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::NGram(NGramConfig::default())
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            ExtractorConfig::NGram(config) => config.validate(),
            ExtractorConfig::SkipGram(config) => config.validate(),
            ExtractorConfig::CharacterNGram(config) => config.validate(),
            ExtractorConfig::CharacterSkipGram(config) => config.validate(),
        }
    }

    /// Builds the extractor, fails before any document is seen if the parameters are invalid.
    /// Character n-grams and character skip-grams ignore the stopwords.
    pub fn build(&self, stopwords: Option<Arc<StopWordList>>) -> Result<Extractor, ConfigurationError> {
        Ok(
            match self {
                ExtractorConfig::NGram(config) => {
                    Extractor::NGram(NGramGenerator::new(config.clone(), stopwords)?)
                }
                ExtractorConfig::SkipGram(config) => {
                    Extractor::SkipGram(SkipGramGenerator::new(config.clone(), stopwords)?)
                }
                ExtractorConfig::CharacterNGram(config) => {
                    Extractor::CharacterNGram(CharacterNGramGenerator::new(config.clone())?)
                }
                ExtractorConfig::CharacterSkipGram(config) => {
                    Extractor::CharacterSkipGram(CharacterSkipGramGenerator::new(config.clone())?)
                }
            }
        )
    }
}

/// A validated extractor.
#[derive(Debug, Clone)]
pub enum Extractor {
    NGram(NGramGenerator),
    SkipGram(SkipGramGenerator),
    CharacterNGram(CharacterNGramGenerator),
    CharacterSkipGram(CharacterSkipGramGenerator),
}

impl FeatureExtractor for Extractor {
    fn sentence_keys(&self, sentence: &[String]) -> Vec<String> {
        match self {
            Extractor::NGram(value) => value.sentence_keys(sentence),
            Extractor::SkipGram(value) => value.sentence_keys(sentence),
            Extractor::CharacterNGram(value) => value.sentence_keys(sentence),
            Extractor::CharacterSkipGram(value) => value.sentence_keys(sentence),
        }
    }

    fn fingerprint(&self) -> ExtractorFingerprint {
        match self {
            Extractor::NGram(value) => value.fingerprint(),
            Extractor::SkipGram(value) => value.fingerprint(),
            Extractor::CharacterNGram(value) => value.fingerprint(),
            Extractor::CharacterSkipGram(value) => value.fingerprint(),
        }
    }

    fn vocabulary_name(&self) -> &'static str {
        match self {
            Extractor::NGram(value) => value.vocabulary_name(),
            Extractor::SkipGram(value) => value.vocabulary_name(),
            Extractor::CharacterNGram(value) => value.vocabulary_name(),
            Extractor::CharacterSkipGram(value) => value.vocabulary_name(),
        }
    }
}

/// An [Extractor] bound to the [Tokenizer] producing its tokens.
/// The fingerprint covers both, a vocabulary collected with a stemming tokenizer
/// does not fit to tokens that were never stemmed.
#[derive(Debug, Clone)]
pub struct TokenizedExtractor {
    tokenizer: Tokenizer,
    extractor: Extractor,
    fingerprint: ExtractorFingerprint,
}

impl TokenizedExtractor {
    pub fn new(tokenizer: Tokenizer, extractor: Extractor) -> Self {
        let fingerprint = tokenizer
            .add_to_fingerprint(ExtractorFingerprint::builder().add(&extractor.fingerprint()))
            .finish();
        Self { tokenizer, extractor, fingerprint }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }
}

impl FeatureExtractor for TokenizedExtractor {
    fn sentence_keys(&self, sentence: &[String]) -> Vec<String> {
        self.extractor.sentence_keys(sentence)
    }

    fn document_keys(&self, document: &Document) -> FrequencyDistribution {
        self.extractor.document_keys(document)
    }

    fn fingerprint(&self) -> ExtractorFingerprint {
        self.fingerprint
    }

    fn vocabulary_name(&self) -> &'static str {
        self.extractor.vocabulary_name()
    }
}
