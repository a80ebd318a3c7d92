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
use std::hash::{Hash, Hasher};
use std::num::ParseIntError;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

/// Identifies the exact generator configuration a vocabulary was built with.
/// Stored alongside the vocabulary and compared before any vector is built.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtractorFingerprint(u64);

impl ExtractorFingerprint {
    pub fn builder() -> FingerprintBuilder {
        FingerprintBuilder::default()
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Display for ExtractorFingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for ExtractorFingerprint {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16).map(Self)
    }
}

impl TryFrom<String> for ExtractorFingerprint {
    type Error = ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExtractorFingerprint> for String {
    fn from(value: ExtractorFingerprint) -> Self {
        value.to_string()
    }
}

/// Feeds the parts of an extractor configuration into a seeded XxHash64.
/// The order of the calls matters.
pub struct FingerprintBuilder {
    hasher: XxHash64,
}

impl Default for FingerprintBuilder {
    fn default() -> Self {
        Self { hasher: XxHash64::with_seed(0) }
    }
}

impl FingerprintBuilder {
    pub fn add<H: Hash + ?Sized>(mut self, value: &H) -> Self {
        value.hash(&mut self.hasher);
        self
    }

    /// Adds a set of words, independent of their iteration order.
    pub fn add_words<'a, I>(mut self, words: I) -> Self where I: IntoIterator<Item=&'a str> {
        let mut words = words.into_iter().collect::<Vec<_>>();
        words.sort_unstable();
        words.dedup();
        self.hasher.write_usize(words.len());
        for word in words {
            word.hash(&mut self.hasher);
        }
        self
    }

    pub fn finish(self) -> ExtractorFingerprint {
        ExtractorFingerprint(self.hasher.finish())
    }
}
