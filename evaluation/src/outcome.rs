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
use camino::Utf8Path;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use crate::error::{ModeMismatchError, OutcomeParseError};

/// The value marking a label that is missing in the original label space of a record.
pub const MISSING_LABEL: f64 = -1.0;

/// How the values of an outcome are interpreted.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, EnumString, AsRefStr, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum LearningMode {
    SingleLabel,
    MultiLabel,
    Regression,
}

/// The outcome for a single instance.
///
/// For single- and multi-label outcomes the gold and prediction vectors have one
/// entry per label, a regression outcome has exactly one value on each side.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRecord {
    id: String,
    gold: Vec<f64>,
    prediction: Vec<f64>,
    labels: Arc<[String]>,
    bipartition_threshold: Option<f64>,
}

/// The labels assigned by a bipartition threshold.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Bipartition<'a> {
    pub predicted: Vec<&'a str>,
    pub gold: Vec<&'a str>,
}

impl OutcomeRecord {
    pub fn new(
        id: impl Into<String>,
        gold: Vec<f64>,
        prediction: Vec<f64>,
        labels: Arc<[String]>,
        bipartition_threshold: Option<f64>,
    ) -> Self {
        Self {
            id: id.into(),
            gold,
            prediction,
            labels,
            bipartition_threshold,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn gold(&self) -> &[f64] {
        &self.gold
    }

    pub fn prediction(&self) -> &[f64] {
        &self.prediction
    }

    /// The local label list, index i names entry i of the vectors.
    pub fn labels(&self) -> &Arc<[String]> {
        &self.labels
    }

    pub fn bipartition_threshold(&self) -> Option<f64> {
        self.bipartition_threshold
    }

    /// Assigns every label with a value of at least the threshold.
    /// Returns None if the record has no threshold.
    pub fn bipartition(&self) -> Option<Bipartition<'_>> {
        let threshold = self.bipartition_threshold?;
        let select = |values: &[f64]| {
            self.labels
                .iter()
                .zip(values.iter())
                .filter(|(_, value)| **value != MISSING_LABEL && **value >= threshold)
                .map(|(label, _)| label.as_str())
                .collect_vec()
        };
        Some(
            Bipartition {
                predicted: select(&self.prediction),
                gold: select(&self.gold),
            }
        )
    }
}

/// The outcomes of one or more runs in the same learning mode.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeSet {
    mode: LearningMode,
    records: Vec<OutcomeRecord>,
}

impl OutcomeSet {
    pub fn new(mode: LearningMode) -> Self {
        Self { mode, records: Vec::new() }
    }

    pub fn with_records(mode: LearningMode, records: Vec<OutcomeRecord>) -> Self {
        Self { mode, records }
    }

    /// Reads an outcome file, see [crate::format].
    pub fn load(path: impl AsRef<Utf8Path>, mode: LearningMode) -> Result<Self, OutcomeParseError> {
        crate::format::load_outcomes(path, mode)
    }

    pub fn mode(&self) -> LearningMode {
        self.mode
    }

    pub fn records(&self) -> &[OutcomeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<OutcomeRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: OutcomeRecord) {
        self.records.push(record)
    }

    /// Adds all records of [other], the learning modes have to match.
    pub fn add(&mut self, other: OutcomeSet) -> Result<(), ModeMismatchError> {
        if self.mode != other.mode {
            return Err(ModeMismatchError { expected: self.mode, actual: other.mode })
        }
        self.records.extend(other.records);
        Ok(())
    }

    /// The first prediction value of every record.
    pub fn predictions(&self) -> Vec<f64> {
        self.records
            .iter()
            .map(|record| record.prediction.first().copied().unwrap_or(f64::NAN))
            .collect_vec()
    }

    /// The first gold value of every record.
    pub fn gold_values(&self) -> Vec<f64> {
        self.records
            .iter()
            .map(|record| record.gold.first().copied().unwrap_or(f64::NAN))
            .collect_vec()
    }
}
