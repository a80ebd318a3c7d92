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


use std::collections::BTreeSet;
use std::sync::Arc;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use crate::error::ConfigurationError;
use crate::ngrams::{passes_ngram_filter, prepare_stopwords, prepare_tokens};
use crate::stopword_registry::StopWordList;
use crate::NGRAM_GLUE;

/// The parameters of a skip-gram generator.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SkipGramConfig {
    #[serde(default = "_default_min_n")]
    pub min_n: usize,
    #[serde(default = "_default_max_n")]
    pub max_n: usize,
    /// The number of tokens a window may skip.
    #[serde(default = "_default_skip")]
    pub skip: usize,
    #[serde(default = "_default_lowercase")]
    pub lowercase: bool,
    #[serde(default)]
    pub filter_partial_matches: bool,
}

const fn _default_min_n() -> usize {
    2
}
const fn _default_max_n() -> usize {
    3
}
const fn _default_skip() -> usize {
    2
}
const fn _default_lowercase() -> bool {
    true
}

impl Default for SkipGramConfig {
    fn default() -> Self {
        Self {
            min_n: _default_min_n(),
            max_n: _default_max_n(),
            skip: _default_skip(),
            lowercase: _default_lowercase(),
            filter_partial_matches: false,
        }
    }
}

impl SkipGramConfig {
    pub fn new(min_n: usize, max_n: usize, skip: usize) -> Self {
        Self {
            min_n,
            max_n,
            skip,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.min_n < 2 {
            return Err(ConfigurationError::MinimalNTooSmall { min_n: self.min_n, required: 2 })
        }
        if self.min_n > self.max_n {
            return Err(ConfigurationError::InvalidRange { min_n: self.min_n, max_n: self.max_n })
        }
        if self.skip < 1 {
            return Err(ConfigurationError::InvalidSkip(self.skip))
        }
        Ok(())
    }
}

/// Generates the gapped subsequences of a token sequence.
///
/// For every n and every start index the window `[start, start + n + skip)` is
/// searched for all index subsets of size n. Subsets without a gap are the plain
/// n-grams and are left out. The same pattern can be found through multiple
/// overlapping windows, therefore the result is a set.
#[derive(Debug, Clone)]
pub struct SkipGramGenerator {
    config: SkipGramConfig,
    stopwords: Arc<StopWordList>,
}

impl SkipGramGenerator {
    pub fn new(config: SkipGramConfig, stopwords: Option<Arc<StopWordList>>) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let stopwords = prepare_stopwords(stopwords, config.lowercase);
        Ok(Self { config, stopwords })
    }

    pub fn config(&self) -> &SkipGramConfig {
        &self.config
    }

    pub fn stopwords(&self) -> &StopWordList {
        &self.stopwords
    }

    /// The distinct skip-grams of [tokens] in lexicographic order.
    ///
    /// The set is built per call, a document with multiple sentences counts
    /// a skip-gram once for every sentence containing it.
    pub fn skip_grams<S: AsRef<str>>(&self, tokens: &[S]) -> BTreeSet<String> {
        let tokens = prepare_tokens(tokens, self.config.lowercase);
        let mut result = BTreeSet::new();
        for_each_gapped_selection(&tokens, self.config.min_n, self.config.max_n, self.config.skip, |gram| {
            if passes_ngram_filter(&gram, &self.stopwords, self.config.filter_partial_matches) {
                result.insert(gram.into_iter().join(NGRAM_GLUE));
            }
        });
        result
    }
}

/// Calls [visit] with every gapped selection of `min_n..=max_n` items,
/// each taken from a window of at most `n + skip` items.
pub(crate) fn for_each_gapped_selection<'a, T, F>(items: &'a [T], min_n: usize, max_n: usize, skip: usize, mut visit: F)
where
    F: FnMut(Vec<&'a T>)
{
    for n in min_n..=max_n {
        if n > items.len() {
            break
        }
        for start in 0..=(items.len() - n) {
            let end = (start + n + skip).min(items.len());
            let window = &items[start..end];
            for selection in (0..window.len()).combinations(n) {
                // contiguous selections are ordinary n-grams
                if selection[n - 1] - selection[0] == n - 1 {
                    continue
                }
                visit(selection.iter().map(|idx| &window[*idx]).collect_vec());
            }
        }
    }
}
