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
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use crate::error::ConfigurationError;
use crate::skipgrams::for_each_gapped_selection;
use crate::NGRAM_GLUE;

/// Marks the start of a token in a character skip-gram.
pub const TOKEN_START: char = '^';
/// Marks the end of a token in a character skip-gram.
pub const TOKEN_END: char = '$';

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CharacterNGramConfig {
    #[serde(default = "_default_min_n")]
    pub min_n: usize,
    #[serde(default = "_default_max_n")]
    pub max_n: usize,
    #[serde(default = "_default_lowercase")]
    pub lowercase: bool,
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

impl Default for CharacterNGramConfig {
    fn default() -> Self {
        Self {
            min_n: _default_min_n(),
            max_n: _default_max_n(),
            lowercase: _default_lowercase(),
        }
    }
}

impl CharacterNGramConfig {
    pub fn new(min_n: usize, max_n: usize) -> Self {
        Self { min_n, max_n, ..Self::default() }
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

/// Generates the character n-grams of a sentence.
/// The tokens are joined by a single space, the windows run over chars, not bytes.
#[derive(Debug, Clone)]
pub struct CharacterNGramGenerator {
    config: CharacterNGramConfig,
}

impl CharacterNGramGenerator {
    pub fn new(config: CharacterNGramConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CharacterNGramConfig {
        &self.config
    }

    pub fn char_ngrams<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        let text = tokens.iter().map(|token| token.as_ref()).join(" ");
        let text = if self.config.lowercase {
            text.to_lowercase()
        } else {
            text
        };
        let chars = text.chars().collect_vec();
        let mut result = Vec::new();
        for n in self.config.min_n..=self.config.max_n {
            if n > chars.len() {
                break
            }
            result.extend(chars.windows(n).map(|window| window.iter().collect::<String>()));
        }
        result
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CharacterSkipGramConfig {
    #[serde(default = "_default_skip_min_n")]
    pub min_n: usize,
    #[serde(default = "_default_max_n")]
    pub max_n: usize,
    #[serde(default = "_default_skip")]
    pub skip: usize,
    #[serde(default = "_default_lowercase")]
    pub lowercase: bool,
}

const fn _default_skip_min_n() -> usize {
    2
}
const fn _default_skip() -> usize {
    2
}

impl Default for CharacterSkipGramConfig {
    fn default() -> Self {
        Self {
            min_n: _default_skip_min_n(),
            max_n: _default_max_n(),
            skip: _default_skip(),
            lowercase: _default_lowercase(),
        }
    }
}

impl CharacterSkipGramConfig {
    pub fn new(min_n: usize, max_n: usize, skip: usize) -> Self {
        Self { min_n, max_n, skip, ..Self::default() }
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

/// Generates the gapped character subsequences of every single token.
/// The chars of a token are framed by [TOKEN_START] and [TOKEN_END] and the
/// selected chars are joined like word n-grams, `"ab"` yields `^_b` for a skip of one.
#[derive(Debug, Clone)]
pub struct CharacterSkipGramGenerator {
    config: CharacterSkipGramConfig,
}

impl CharacterSkipGramGenerator {
    pub fn new(config: CharacterSkipGramConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CharacterSkipGramConfig {
        &self.config
    }

    /// The distinct skip-grams of every token, one set per token in token order.
    pub fn char_skip_grams<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        let mut result = Vec::new();
        for token in tokens {
            let token = token.as_ref();
            let token = if self.config.lowercase {
                token.to_lowercase()
            } else {
                token.to_string()
            };
            let chars = std::iter::once(TOKEN_START)
                .chain(token.chars())
                .chain(std::iter::once(TOKEN_END))
                .collect_vec();
            let mut grams = BTreeSet::new();
            for_each_gapped_selection(&chars, self.config.min_n, self.config.max_n, self.config.skip, |selection| {
                grams.insert(selection.into_iter().join(NGRAM_GLUE));
            });
            result.extend(grams);
        }
        result
    }
}

#[cfg(test)]
mod test {
    use crate::char_ngrams::{CharacterNGramConfig, CharacterNGramGenerator, CharacterSkipGramConfig, CharacterSkipGramGenerator};
    use crate::error::ConfigurationError;

    #[test]
    fn windows_over_the_joined_sentence() {
        let generator = CharacterNGramGenerator::new(CharacterNGramConfig::new(2, 3)).unwrap();
        assert_eq!(
            vec!["ab", "b ", " c", "ab ", "b c"],
            generator.char_ngrams(&["AB", "c"])
        );
    }

    #[test]
    fn counts_chars_not_bytes() {
        let generator = CharacterNGramGenerator::new(CharacterNGramConfig::new(2, 2)).unwrap();
        assert_eq!(vec!["äö", "öü"], generator.char_ngrams(&["äöü"]));
    }

    #[test]
    fn rejects_invalid_ranges() {
        assert_eq!(
            ConfigurationError::InvalidRange { min_n: 4, max_n: 1 },
            CharacterNGramGenerator::new(CharacterNGramConfig::new(4, 1)).unwrap_err()
        );
    }

    #[test]
    fn char_skip_grams_frame_every_token() {
        let generator = CharacterSkipGramGenerator::new(CharacterSkipGramConfig::new(2, 2, 1)).unwrap();
        assert_eq!(vec!["^_b", "a_$"], generator.char_skip_grams(&["AB"]));
        assert_eq!(vec!["^_b", "a_$", "^_$"], generator.char_skip_grams(&["ab", "x"]));
        assert!(generator.char_skip_grams::<&str>(&[]).is_empty());
    }

    #[test]
    fn char_skip_grams_keep_case_if_configured() {
        let mut config = CharacterSkipGramConfig::new(2, 3, 1);
        config.lowercase = false;
        let generator = CharacterSkipGramGenerator::new(config).unwrap();
        let grams = generator.char_skip_grams(&["Ab"]);
        assert!(grams.contains(&"^_b".to_string()));
        assert!(grams.contains(&"^_A_$".to_string()));
        assert!(!grams.iter().any(|gram| gram.contains('a')));
    }

    #[test]
    fn char_skip_grams_validate_like_skip_grams() {
        assert_eq!(
            ConfigurationError::MinimalNTooSmall { min_n: 1, required: 2 },
            CharacterSkipGramGenerator::new(CharacterSkipGramConfig::new(1, 2, 1)).unwrap_err()
        );
        assert_eq!(
            ConfigurationError::InvalidSkip(0),
            CharacterSkipGramGenerator::new(CharacterSkipGramConfig::new(2, 2, 0)).unwrap_err()
        );
        assert_eq!(
            ConfigurationError::InvalidRange { min_n: 3, max_n: 2 },
            CharacterSkipGramGenerator::new(CharacterSkipGramConfig::new(3, 2, 1)).unwrap_err()
        );
    }
}
