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


use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use crate::error::{HomogenizationError, ModeMismatchError};
use crate::format::save_outcomes;
use crate::outcome::{LearningMode, OutcomeRecord, OutcomeSet, MISSING_LABEL};

/// Collects the outcomes of runs with possibly different label lists.
///
/// Homogenizing works in three steps:
/// [LabelSpaceHomogenizer::aggregate] unions the labels of all collected records,
/// [AggregatedLabelSpace::remap] moves every value to the index of its label in the
/// union and writes [MISSING_LABEL] for labels the record does not know.
/// The result can then be written with [crate::format::save_outcomes].
#[derive(Debug, Clone)]
pub struct LabelSpaceHomogenizer {
    mode: LearningMode,
    records: Vec<OutcomeRecord>,
}

impl LabelSpaceHomogenizer {
    pub fn new(mode: LearningMode) -> Self {
        Self { mode, records: Vec::new() }
    }

    pub fn mode(&self) -> LearningMode {
        self.mode
    }

    /// Adds the records of [set].
    pub fn collect(&mut self, set: OutcomeSet) -> Result<(), ModeMismatchError> {
        if set.mode() != self.mode {
            return Err(ModeMismatchError { expected: self.mode, actual: set.mode() })
        }
        self.records.extend(set.into_records());
        Ok(())
    }

    pub fn collect_record(&mut self, record: OutcomeRecord) {
        self.records.push(record);
    }

    /// Ends the collection and builds the sorted union of all labels.
    pub fn aggregate(self) -> Result<AggregatedLabelSpace, HomogenizationError> {
        if self.mode == LearningMode::Regression {
            return Ok(
                AggregatedLabelSpace {
                    mode: self.mode,
                    labels: Arc::from(Vec::new()),
                    records: self.records,
                }
            )
        }
        for record in &self.records {
            for values in [record.gold(), record.prediction()] {
                if values.len() != record.labels().len() {
                    return Err(
                        HomogenizationError::WrongValueCount {
                            id: record.id().to_string(),
                            values: values.len(),
                            labels: record.labels().len(),
                        }
                    )
                }
            }
        }
        let labels: Arc<[String]> = self.records
            .iter()
            .flat_map(|record| record.labels().iter())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        log::debug!("Aggregated {} labels from {} records.", labels.len(), self.records.len());
        Ok(AggregatedLabelSpace { mode: self.mode, labels, records: self.records })
    }
}

/// The union of the labels of all collected records, sorted lexicographically.
#[derive(Debug, Clone)]
pub struct AggregatedLabelSpace {
    mode: LearningMode,
    labels: Arc<[String]>,
    records: Vec<OutcomeRecord>,
}

impl AggregatedLabelSpace {
    /// The aggregated labels, empty for regression.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Re-indexes every record against the aggregated labels.
    /// Regression records are returned unchanged.
    pub fn remap(self) -> OutcomeSet {
        if self.mode == LearningMode::Regression {
            return OutcomeSet::with_records(self.mode, self.records)
        }
        let records = self.records
            .into_iter()
            .map(|record| remap_record(&record, &self.labels))
            .collect_vec();
        log::info!("Homogenized {} records over {} labels.", records.len(), self.labels.len());
        OutcomeSet::with_records(self.mode, records)
    }
}

fn remap_record(record: &OutcomeRecord, labels: &Arc<[String]>) -> OutcomeRecord {
    let local = record.labels()
        .iter()
        .enumerate()
        .map(|(idx, label)| (label.as_str(), idx))
        .collect::<HashMap<_, _>>();
    let mut gold = Vec::with_capacity(labels.len());
    let mut prediction = Vec::with_capacity(labels.len());
    for label in labels.iter() {
        match local.get(label.as_str()) {
            Some(idx) => {
                gold.push(record.gold()[*idx]);
                prediction.push(record.prediction()[*idx]);
            }
            None => {
                gold.push(MISSING_LABEL);
                prediction.push(MISSING_LABEL);
            }
        }
    }
    OutcomeRecord::new(record.id(), gold, prediction, labels.clone(), record.bipartition_threshold())
}

/// Homogenizes already loaded sets of the same learning mode.
pub fn homogenize(mode: LearningMode, sets: impl IntoIterator<Item=OutcomeSet>) -> Result<OutcomeSet, HomogenizationError> {
    let mut homogenizer = LabelSpaceHomogenizer::new(mode);
    for set in sets {
        homogenizer.collect(set)?;
    }
    Ok(homogenizer.aggregate()?.remap())
}

/// Loads every input file, homogenizes them and writes the result to [output].
/// Nothing is written if any input fails.
pub fn homogenize_files(
    inputs: &[Utf8PathBuf],
    mode: LearningMode,
    output: impl AsRef<Utf8Path>,
) -> Result<OutcomeSet, HomogenizationError> {
    let sets = inputs
        .iter()
        .map(|path| OutcomeSet::load(path, mode))
        .collect::<Result<Vec<_>, _>>()?;
    let homogenized = homogenize(mode, sets)?;
    save_outcomes(output, &homogenized)?;
    Ok(homogenized)
}
