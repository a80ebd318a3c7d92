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

use camino::Utf8PathBuf;
use thiserror::Error;
use crate::fingerprint::ExtractorFingerprint;

/// An invalid generator or selector configuration.
/// Always raised at construction time, before any document is processed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("The minimal n ({min_n}) is greater than the maximal n ({max_n})!")]
    InvalidRange { min_n: usize, max_n: usize },
    #[error("The minimal n has to be at least {required} but was {min_n}!")]
    MinimalNTooSmall { min_n: usize, required: usize },
    #[error("A skip-gram needs to skip at least 1 token but skip was {0}!")]
    InvalidSkip(usize),
    #[error("The frequency threshold has to be in [0, 1] but was {0}!")]
    InvalidThreshold(f64),
}

/// What went wrong while reading or writing a persisted structure.
#[derive(Debug, Error)]
pub enum PersistenceErrorKind {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Binary(#[from] bincode::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Corrupt(String),
}

/// Failed to load or save a distribution, statistics or vocabulary file.
#[derive(Debug, Error)]
#[error("Failed to persist or load {path}: {kind}")]
pub struct PersistenceError {
    pub path: Utf8PathBuf,
    #[source]
    pub kind: PersistenceErrorKind,
}

impl PersistenceError {
    pub fn new(path: impl Into<Utf8PathBuf>, kind: impl Into<PersistenceErrorKind>) -> Self {
        Self { path: path.into(), kind: kind.into() }
    }

    pub fn corrupt(path: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        Self::new(path, PersistenceErrorKind::Corrupt(message.into()))
    }
}

/// The generator used for extraction differs from the one the vocabulary was built with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("The vocabulary {vocabulary} was built with the extractor {expected} but the extractor in use is {actual}!")]
pub struct AlignmentError {
    pub vocabulary: String,
    pub expected: ExtractorFingerprint,
    pub actual: ExtractorFingerprint,
}
