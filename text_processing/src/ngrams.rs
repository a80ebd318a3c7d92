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
use std::sync::Arc;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use crate::error::ConfigurationError;
use crate::stopword_registry::StopWordList;
use crate::NGRAM_GLUE;

/// The parameters of a contiguous n-gram generator.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NGramConfig {
    #[serde(default = "_default_min_n")]
    pub min_n: usize,
    #[serde(default = "_default_max_n")]
    pub max_n: usize,
    /// Lowercase every token before filtering and joining.
    #[serde(default = "_default_lowercase")]
    pub lowercase: bool,
    /// If true an n-gram is dropped as soon as one token is a stopword,
    /// otherwise only if all of its tokens are stopwords.
    #[serde(default)]
    pub filter_partial_matches: bool,
}

const fn _default_min_n() -> usize {
    1
}
const fn _default_max_n() -> usize {
    3
}
const fn _default_lowercase() -> bool {
    true
}

impl Default for NGramConfig {
    fn default() -> Self {
        Self {
            min_n: _default_min_n(),
            max_n: _default_max_n(),
            lowercase: _default_lowercase(),
            filter_partial_matches: false,
        }
    }
}

impl NGramConfig {
    pub fn new(min_n: usize, max_n: usize) -> Self {
        Self {
            min_n,
            max_n,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.min_n < 1 {
            return Err(ConfigurationError::MinimalNTooSmall { min_n: self.min_n, required: 1 })
        }
        if self.min_n > self.max_n {
            return Err(ConfigurationError::InvalidRange { min_n: self.min_n, max_n: self.max_n })
        }
        Ok(())
    }
}

/// Returns true if the n-gram made of [tokens] survives the stopword filter.
pub fn passes_ngram_filter<S: AsRef<str>>(tokens: &[S], stopwords: &StopWordList, filter_partial_matches: bool) -> bool {
    let stopword_count = tokens
        .iter()
        .filter(|token| stopwords.contains_raw(token.as_ref()))
        .count();
    if filter_partial_matches {
        stopword_count == 0
    } else {
        stopword_count < tokens.len()
    }
}

/// Lowercases the stopwords when the generator lowercases its tokens.
pub(crate) fn prepare_stopwords(stopwords: Option<Arc<StopWordList>>, lowercase: bool) -> Arc<StopWordList> {
    match stopwords {
        None => Arc::new(StopWordList::default()),
        Some(list) if lowercase => Arc::new(list.to_lowercase()),
        Some(list) => list,
    }
}

pub(crate) fn prepare_tokens<S: AsRef<str>>(tokens: &[S], lowercase: bool) -> Vec<Cow<str>> {
    tokens
        .iter()
        .map(|token| {
            if lowercase {
                Cow::Owned(token.as_ref().to_lowercase())
            } else {
                Cow::Borrowed(token.as_ref())
            }
        })
        .collect_vec()
}

/// Generates the contiguous n-grams of a token sequence.
#[derive(Debug, Clone)]
pub struct NGramGenerator {
    config: NGramConfig,
    stopwords: Arc<StopWordList>,
}

impl NGramGenerator {
    pub fn new(config: NGramConfig, stopwords: Option<Arc<StopWordList>>) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let stopwords = prepare_stopwords(stopwords, config.lowercase);
        Ok(Self { config, stopwords })
    }

    pub fn config(&self) -> &NGramConfig {
        &self.config
    }

    pub fn stopwords(&self) -> &StopWordList {
        &self.stopwords
    }

    /// All n-grams of [tokens] with `min_n <= n <= max_n`, ordered by n and then by position.
    /// Contains duplicates if the sequence repeats itself.
    pub fn ngrams<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        let tokens = prepare_tokens(tokens, self.config.lowercase);
        let mut result = Vec::new();
        for n in self.config.min_n..=self.config.max_n {
            if n > tokens.len() {
                break
            }
            for window in tokens.windows(n) {
                if passes_ngram_filter(window, &self.stopwords, self.config.filter_partial_matches) {
                    result.push(window.join(NGRAM_GLUE));
                }
            }
        }
        result
    }
}
