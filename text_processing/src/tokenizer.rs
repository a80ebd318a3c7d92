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

use std::borrow::Cow;
use std::fmt::Debug;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;
use unicode_normalization::UnicodeNormalization;
use crate::configs::TokenizerConfig;
use crate::document::{Document, Sentence};
use crate::fingerprint::FingerprintBuilder;

/// A primitive tokenizer.
/// Splits a text into sentences and the sentences into words.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokenizer {
    normalize: bool,
    lowercase: bool,
    stemmer: Option<rust_stemmers::Algorithm>,
}

impl Tokenizer {

    pub fn new(
        normalize: bool,
        lowercase: bool,
        stemmer: Option<rust_stemmers::Algorithm>
    ) -> Self {
        Self {
            normalize,
            lowercase,
            stemmer
        }
    }

    pub fn from_config(cfg: &TokenizerConfig) -> Self {
        Self::new(cfg.normalize_text, cfg.lowercase, cfg.stemmer)
    }

    fn prepare<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.normalize {
            Cow::Owned(text.nfc().to_string())
        } else {
            Cow::Borrowed(text)
        }
    }

    fn finish_words<'a>(&self, words: impl Iterator<Item=&'a str>) -> Sentence {
        let words = if let Some(stemmer) = self.stemmer {
            let stemmer = rust_stemmers::Stemmer::create(stemmer);
            words.map(|value| stemmer.stem(value).into_owned()).collect_vec()
        } else {
            words.map(str::to_string).collect_vec()
        };
        if self.lowercase {
            words.into_iter().map(|value| value.to_lowercase()).collect_vec()
        } else {
            words
        }
    }

    /// Tokenizes a text, ignoring sentence boundaries.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = self.prepare(text);
        self.finish_words(text.unicode_words())
    }

    /// Splits the text into sentences of tokens. Sentences without any word are dropped.
    pub fn tokenize_sentences(&self, text: &str) -> Vec<Sentence> {
        let text = self.prepare(text);
        text.unicode_sentences()
            .map(|sentence| self.finish_words(sentence.unicode_words()))
            .filter(|sentence| !sentence.is_empty())
            .collect_vec()
    }

    /// Adds every setting that changes the produced tokens to [builder].
    pub(crate) fn add_to_fingerprint(&self, builder: FingerprintBuilder) -> FingerprintBuilder {
        builder
            .add(&self.normalize)
            .add(&self.lowercase)
            .add(&self.stemmer.map(|stemmer| format!("{stemmer:?}")))
    }

    /// Creates an annotated document from a raw text.
    pub fn to_document(&self, id: impl Into<String>, text: &str) -> Document {
        Document::new(id, self.tokenize_sentences(text))
    }
}
