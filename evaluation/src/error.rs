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


use std::io;
use camino::Utf8PathBuf;
use thiserror::Error;
use crate::outcome::LearningMode;

/// Two outcome sets of different learning modes can not be combined.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
#[error("The learning modes do not match: expected {expected} but got {actual}!")]
pub struct ModeMismatchError {
    pub expected: LearningMode,
    pub actual: LearningMode,
}

/// What is wrong with an outcome file.
#[derive(Debug, Error)]
pub enum OutcomeParseErrorKind {
    #[error(transparent)]
    IO(#[from] io::Error),
    #[error("Found a data line before the #labels header!")]
    MissingLabels,
    #[error("The file contains no outcomes!")]
    NoOutcomes,
    #[error("Malformed #labels header: {0}")]
    MalformedLabels(String),
    #[error("Malformed data line: {0}")]
    MalformedLine(String),
    #[error("The label index {index} is out of bounds for {labels} labels!")]
    IndexOutOfBounds { index: String, labels: usize },
    #[error("Expected {expected} values but found {actual}!")]
    WrongValueCount { expected: usize, actual: usize },
}

/// Failed to parse an outcome file, carries the location of the problem.
#[derive(Debug, Error)]
#[error("Failed to parse the outcomes in {path}{}: {kind}", format_line(.line))]
pub struct OutcomeParseError {
    pub path: Utf8PathBuf,
    /// The 1-based line, if the problem is bound to a single line.
    pub line: Option<usize>,
    #[source]
    pub kind: OutcomeParseErrorKind,
}

fn format_line(line: &Option<usize>) -> String {
    match line {
        None => String::new(),
        Some(line) => format!(" at line {line}"),
    }
}

impl OutcomeParseError {
    pub fn new(path: impl Into<Utf8PathBuf>, line: Option<usize>, kind: impl Into<OutcomeParseErrorKind>) -> Self {
        Self { path: path.into(), line, kind: kind.into() }
    }
}

/// Why an outcome set can not be written.
#[derive(Debug, Error)]
pub enum OutcomeFormatError {
    #[error(transparent)]
    IO(#[from] io::Error),
    #[error("The record {id} does not share the label list of the other records!")]
    InconsistentLabels { id: String },
    #[error("The record {id} has {values} values for {labels} labels!")]
    WrongValueCount { id: String, values: usize, labels: usize },
    #[error("The id {id:?} can not be written, ids may not start with # or contain line breaks!")]
    InvalidId { id: String },
}

/// Failed to write an outcome file.
#[derive(Debug, Error)]
#[error("Failed to write the outcomes to {path}: {kind}")]
pub struct OutcomeWriteError {
    pub path: Utf8PathBuf,
    #[source]
    pub kind: OutcomeFormatError,
}

impl OutcomeWriteError {
    pub fn new(path: impl Into<Utf8PathBuf>, kind: impl Into<OutcomeFormatError>) -> Self {
        Self { path: path.into(), kind: kind.into() }
    }
}

/// Everything that can fail while homogenizing label spaces.
#[derive(Debug, Error)]
pub enum HomogenizationError {
    #[error(transparent)]
    ModeMismatch(#[from] ModeMismatchError),
    #[error(transparent)]
    Parse(#[from] OutcomeParseError),
    #[error(transparent)]
    Write(#[from] OutcomeWriteError),
    #[error("The record {id} has {values} values for {labels} labels!")]
    WrongValueCount { id: String, values: usize, labels: usize },
}
