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


use std::collections::HashMap;
use std::ops::Deref;
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::document::Document;
use crate::error::AlignmentError;
use crate::extractor::FeatureExtractor;
use crate::vocabulary::FeatureVocabulary;

/// The feature values of a single document, one slot per vocabulary key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// The non-zero entries with 1-based indices, as consumed by liblinear and libsvm.
    pub fn sparse_features(&self) -> Vec<(u32, f64)> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0.0)
            .map(|(idx, value)| (idx as u32 + 1, *value))
            .collect_vec()
    }
}

impl PartialEq for FeatureVector {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip_eq(other.0.iter()).all(|(a, b)| float_cmp::approx_eq!(f64, *a, *b))
    }
}

impl Deref for FeatureVector {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(value: Vec<f64>) -> Self {
        Self(value)
    }
}

/// Builds presence vectors aligned to a [FeatureVocabulary].
///
/// Only accepts an extractor with the fingerprint the vocabulary was collected with,
/// otherwise the vectors would silently be misaligned.
pub struct FeatureVectorBuilder<'a, E: ?Sized> {
    vocabulary: &'a FeatureVocabulary,
    extractor: &'a E,
    index: HashMap<&'a str, usize>,
}

impl<'a, E> FeatureVectorBuilder<'a, E> where E: FeatureExtractor + ?Sized {
    pub fn new(vocabulary: &'a FeatureVocabulary, extractor: &'a E) -> Result<Self, AlignmentError> {
        let actual = extractor.fingerprint();
        if actual != vocabulary.fingerprint() {
            return Err(
                AlignmentError {
                    vocabulary: vocabulary.name().to_string(),
                    expected: vocabulary.fingerprint(),
                    actual,
                }
            )
        }
        let index = vocabulary
            .keys()
            .iter()
            .enumerate()
            .map(|(idx, key)| (key.as_str(), idx))
            .collect();
        Ok(Self { vocabulary, extractor, index })
    }

    pub fn vocabulary(&self) -> &FeatureVocabulary {
        self.vocabulary
    }

    /// The vector of [document], 1 for every vocabulary key the document contains, 0 otherwise.
    pub fn build(&self, document: &Document) -> FeatureVector {
        let mut vector = FeatureVector::zeros(self.vocabulary.len());
        for key in self.extractor.document_keys(document).keys() {
            if let Some(idx) = self.index.get(key) {
                vector.0[*idx] = 1.0;
            }
        }
        vector
    }
}

impl<'a, E> FeatureVectorBuilder<'a, E> where E: FeatureExtractor + Sync + ?Sized {
    /// Builds the vectors of all [documents] in parallel, in the order of the documents.
    pub fn build_all(&self, documents: &[Document]) -> Vec<FeatureVector> {
        let vectors: Vec<_> = documents.par_iter().map(|document| self.build(document)).collect();
        log::info!("Built {} feature vectors of length {}.", vectors.len(), self.vocabulary.len());
        vectors
    }
}
