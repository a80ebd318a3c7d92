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


//! The line based text format of outcome files.
//!
//! ```text
//! #ID=PREDICTION;GOLDSTANDARD;THRESHOLD
//! #labels 0=A 1=B%2CC
//! some=id=0.700,0.200;1.000,0.000;0.5
//! ```
//!
//! The id ends at the last `=` of a data line and may not start with `#`.
//! Labels are url encoded. Single-label lines with more than one label may
//! hold the index of the label instead of a vector.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::str::FromStr;
use std::sync::Arc;
use camino::Utf8Path;
use camino_tempfile::NamedUtf8TempFile;
use itertools::Itertools;
use nom::bytes::complete::{tag, take_till};
use nom::character::complete::{char, digit1, space0, space1};
use nom::combinator::{all_consuming, map_res};
use nom::multi::{many0, separated_list1};
use nom::number::complete::double;
use nom::sequence::{preceded, separated_pair, terminated};
use nom::IResult;
use url::form_urlencoded;
use crate::error::{OutcomeFormatError, OutcomeParseError, OutcomeParseErrorKind, OutcomeWriteError};
use crate::outcome::{LearningMode, OutcomeRecord, OutcomeSet};

pub const HEADER: &str = "#ID=PREDICTION;GOLDSTANDARD;THRESHOLD";
pub const LABELS_PREFIX: &str = "#labels";
pub const FIELD_SEPARATOR: char = ';';
pub const VALUE_SEPARATOR: char = ',';
/// Written instead of a threshold if a record has none.
const NO_THRESHOLD: f64 = -1.0;

fn labels_header(input: &str) -> IResult<&str, Vec<(usize, &str)>> {
    preceded(
        tag(LABELS_PREFIX),
        many0(
            preceded(
                space1,
                separated_pair(
                    map_res(digit1, usize::from_str),
                    char('='),
                    take_till(|c: char| c.is_whitespace())
                )
            )
        )
    )(input)
}

fn value_list(input: &str) -> IResult<&str, Vec<f64>> {
    separated_list1(char(VALUE_SEPARATOR), double)(input)
}

fn encode_label(label: &str) -> String {
    form_urlencoded::byte_serialize(label.as_bytes()).collect()
}

fn decode_label(raw: &str) -> Option<String> {
    if raw.contains(['&', '=']) {
        return None
    }
    Some(
        form_urlencoded::parse(raw.as_bytes())
            .map(|(key, _)| key.into_owned())
            .next()
            .unwrap_or_default()
    )
}

fn parse_labels(line: &str) -> Result<Arc<[String]>, OutcomeParseErrorKind> {
    let (_, entries) = all_consuming(terminated(labels_header, space0))(line)
        .map_err(|_| OutcomeParseErrorKind::MalformedLabels(line.to_string()))?;
    entries
        .into_iter()
        .enumerate()
        .map(|(position, (index, raw))| {
            if position != index {
                return Err(
                    OutcomeParseErrorKind::MalformedLabels(
                        format!("Expected the label index {position} but found {index}!")
                    )
                )
            }
            decode_label(raw).ok_or_else(|| {
                OutcomeParseErrorKind::MalformedLabels(format!("The label {raw} is not url encoded!"))
            })
        })
        .collect()
}

fn parse_values(field: &str, line: &str) -> Result<Vec<f64>, OutcomeParseErrorKind> {
    all_consuming(value_list)(field.trim())
        .map(|(_, values)| values)
        .map_err(|_| OutcomeParseErrorKind::MalformedLine(line.to_string()))
}

fn one_hot(index: f64, len: usize) -> Result<Vec<f64>, OutcomeParseErrorKind> {
    if index < 0.0 || index.fract() != 0.0 || index >= len as f64 {
        return Err(OutcomeParseErrorKind::IndexOutOfBounds { index: index.to_string(), labels: len })
    }
    let mut values = vec![0.0; len];
    values[index as usize] = 1.0;
    Ok(values)
}

fn parse_record(line: &str, labels: &Arc<[String]>, mode: LearningMode) -> Result<OutcomeRecord, OutcomeParseErrorKind> {
    let malformed = || OutcomeParseErrorKind::MalformedLine(line.to_string());
    let (id, data) = line.rsplit_once('=').ok_or_else(malformed)?;
    let mut fields = data.split(FIELD_SEPARATOR);
    let prediction = parse_values(fields.next().ok_or_else(malformed)?, line)?;
    let gold = parse_values(fields.next().ok_or_else(malformed)?, line)?;
    let threshold = match fields.next() {
        None => None,
        Some(field) => {
            let value = f64::from_str(field.trim()).map_err(|_| malformed())?;
            (value != NO_THRESHOLD).then_some(value)
        }
    };
    if fields.next().is_some() {
        return Err(malformed())
    }

    let (gold, prediction) = match mode {
        LearningMode::Regression => {
            (vec![gold[0]], vec![prediction[0]])
        }
        LearningMode::SingleLabel if labels.len() > 1 && gold.len() == 1 && prediction.len() == 1 => {
            (one_hot(gold[0], labels.len())?, one_hot(prediction[0], labels.len())?)
        }
        _ => {
            for values in [&gold, &prediction] {
                if values.len() != labels.len() {
                    return Err(
                        OutcomeParseErrorKind::WrongValueCount { expected: labels.len(), actual: values.len() }
                    )
                }
            }
            (gold, prediction)
        }
    };
    Ok(OutcomeRecord::new(id, gold, prediction, labels.clone(), threshold))
}

/// Parses the outcomes from [reader], [source] names the origin in errors.
pub fn read_outcomes<R: BufRead>(reader: R, source: &Utf8Path, mode: LearningMode) -> Result<OutcomeSet, OutcomeParseError> {
    let mut labels: Option<Arc<[String]>> = None;
    let mut set = OutcomeSet::new(mode);
    for (idx, line) in reader.lines().enumerate() {
        let line_number = Some(idx + 1);
        let line = line.map_err(|err| OutcomeParseError::new(source, line_number, err))?;
        let line = line.trim_end_matches('\r');
        if line.starts_with(LABELS_PREFIX) {
            let parsed = parse_labels(line)
                .map_err(|kind| OutcomeParseError::new(source, line_number, kind))?;
            labels = Some(parsed);
        } else if line.starts_with('#') || line.trim().is_empty() {
            continue
        } else {
            let Some(labels) = &labels else {
                return Err(OutcomeParseError::new(source, line_number, OutcomeParseErrorKind::MissingLabels))
            };
            let record = parse_record(line, labels, mode)
                .map_err(|kind| OutcomeParseError::new(source, line_number, kind))?;
            set.push(record);
        }
    }
    if set.is_empty() {
        return Err(OutcomeParseError::new(source, None, OutcomeParseErrorKind::NoOutcomes))
    }
    log::debug!("Read {} outcomes from {source}.", set.len());
    Ok(set)
}

pub fn load_outcomes(path: impl AsRef<Utf8Path>, mode: LearningMode) -> Result<OutcomeSet, OutcomeParseError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| OutcomeParseError::new(path, None, err))?;
    read_outcomes(BufReader::new(file), path, mode)
}

/// The index of the single 1 in an otherwise zero vector.
fn one_hot_index(values: &[f64]) -> Option<usize> {
    let mut found = None;
    for (idx, value) in values.iter().enumerate() {
        if *value == 1.0 && found.is_none() {
            found = Some(idx);
        } else if *value != 0.0 {
            return None
        }
    }
    found
}

fn format_vector(values: &[f64], precision: usize) -> String {
    values
        .iter()
        .map(|value| format!("{value:.precision$}"))
        .join(&VALUE_SEPARATOR.to_string())
}

/// The labels shared by all records, checks that the ids and vectors fit to them.
fn shared_labels(set: &OutcomeSet) -> Result<Option<&Arc<[String]>>, OutcomeFormatError> {
    let Some(first) = set.records().first() else {
        return Ok(None)
    };
    for record in set.records() {
        if record.id().starts_with('#') || record.id().contains(['\n', '\r']) {
            return Err(OutcomeFormatError::InvalidId { id: record.id().to_string() })
        }
        if set.mode() == LearningMode::Regression {
            let values = record.gold().len().min(record.prediction().len());
            if values == 0 {
                return Err(OutcomeFormatError::WrongValueCount { id: record.id().to_string(), values, labels: 1 })
            }
            continue
        }
        if !Arc::ptr_eq(record.labels(), first.labels()) && record.labels() != first.labels() {
            return Err(OutcomeFormatError::InconsistentLabels { id: record.id().to_string() })
        }
        for values in [record.gold(), record.prediction()] {
            if values.len() != first.labels().len() {
                return Err(
                    OutcomeFormatError::WrongValueCount {
                        id: record.id().to_string(),
                        values: values.len(),
                        labels: first.labels().len(),
                    }
                )
            }
        }
    }
    Ok(Some(first.labels()))
}

fn write_record<W: Write>(writer: &mut W, record: &OutcomeRecord, mode: LearningMode) -> Result<(), OutcomeFormatError> {
    let (prediction, gold) = match mode {
        LearningMode::SingleLabel if record.labels().len() > 1 => {
            match (one_hot_index(record.prediction()), one_hot_index(record.gold())) {
                (Some(prediction), Some(gold)) => (prediction.to_string(), gold.to_string()),
                _ => (format_vector(record.prediction(), 0), format_vector(record.gold(), 0)),
            }
        }
        LearningMode::SingleLabel => {
            (format_vector(record.prediction(), 0), format_vector(record.gold(), 0))
        }
        LearningMode::MultiLabel => {
            (format_vector(record.prediction(), 3), format_vector(record.gold(), 3))
        }
        LearningMode::Regression => {
            (record.prediction()[0].to_string(), record.gold()[0].to_string())
        }
    };
    let threshold = record.bipartition_threshold().unwrap_or(NO_THRESHOLD);
    writeln!(writer, "{}={prediction}{FIELD_SEPARATOR}{gold}{FIELD_SEPARATOR}{threshold:?}", record.id())?;
    Ok(())
}

/// Writes [set] in the outcome format. All records have to share the same label list.
pub fn write_outcomes<W: Write>(mut writer: W, set: &OutcomeSet) -> Result<(), OutcomeFormatError> {
    let labels = shared_labels(set)?;
    writeln!(writer, "{HEADER}")?;
    write!(writer, "{LABELS_PREFIX}")?;
    if let Some(labels) = labels {
        for (idx, label) in labels.iter().enumerate() {
            write!(writer, " {idx}={}", encode_label(label))?;
        }
    }
    writeln!(writer)?;
    for record in set.records() {
        write_record(&mut writer, record, set.mode())?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes [set] to a temp file next to [path] and moves it into place,
/// either the complete file is written or nothing.
pub fn save_outcomes(path: impl AsRef<Utf8Path>, set: &OutcomeSet) -> Result<(), OutcomeWriteError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let temp = NamedUtf8TempFile::new_in(parent).map_err(|err| OutcomeWriteError::new(path, err))?;
    write_outcomes(BufWriter::new(temp.as_file()), set).map_err(|err| OutcomeWriteError::new(path, err))?;
    temp.persist(path).map_err(|err| OutcomeWriteError::new(path, err.error))?;
    log::info!("Wrote {} outcomes to {path}.", set.len());
    Ok(())
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use camino::Utf8Path;
    use camino_tempfile::tempdir;
    use float_cmp::approx_eq;
    use crate::error::{OutcomeFormatError, OutcomeParseErrorKind};
    use crate::format::{load_outcomes, read_outcomes, save_outcomes, write_outcomes};
    use crate::outcome::{LearningMode, OutcomeRecord, OutcomeSet};

    fn read(text: &str, mode: LearningMode) -> Result<OutcomeSet, crate::error::OutcomeParseError> {
        read_outcomes(text.as_bytes(), Utf8Path::new("test.txt"), mode)
    }

    fn write(set: &OutcomeSet) -> String {
        let mut out = Vec::new();
        write_outcomes(&mut out, set).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn labels(values: &[&str]) -> Arc<[String]> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_single_label_indices() {
        let set = read(
            "#ID=PREDICTION;GOLDSTANDARD;THRESHOLD\n#labels 0=A 1=B 2=C\nx=y=2;1;-1.0\n",
            LearningMode::SingleLabel
        ).unwrap();
        let record = &set.records()[0];
        assert_eq!("x=y", record.id());
        assert_eq!(&[0.0, 0.0, 1.0], record.prediction());
        assert_eq!(&[0.0, 1.0, 0.0], record.gold());
        assert_eq!(None, record.bipartition_threshold());
    }

    #[test]
    fn parses_multi_label_vectors_and_missing_thresholds() {
        let set = read(
            "#labels 0=A 1=B\n\n# comment\n1=0.700,0.200;1,0;0.5\n2=0.1,0.9;0,1\n",
            LearningMode::MultiLabel
        ).unwrap();
        assert_eq!(2, set.len());
        assert_eq!(Some(0.5), set.records()[0].bipartition_threshold());
        assert_eq!(&[0.1, 0.9], set.records()[1].prediction());
        assert_eq!(None, set.records()[1].bipartition_threshold());
    }

    #[test]
    fn regression_uses_scalars() {
        let set = read("#labels\n1=2.5;3.0;-1\n", LearningMode::Regression).unwrap();
        assert_eq!(vec![2.5], set.predictions());
        assert_eq!(vec![3.0], set.gold_values());
        assert_eq!("#ID=PREDICTION;GOLDSTANDARD;THRESHOLD\n#labels\n1=2.5;3;-1.0\n", write(&set));
    }

    #[test]
    fn data_before_labels_is_an_error() {
        let err = read("#ID=PREDICTION;GOLDSTANDARD;THRESHOLD\n1=0;0;-1\n#labels 0=A\n", LearningMode::SingleLabel)
            .unwrap_err();
        assert_eq!(Some(2), err.line);
        assert_eq!("test.txt", err.path.as_str());
        assert!(matches!(err.kind, OutcomeParseErrorKind::MissingLabels));
    }

    #[test]
    fn a_file_without_outcomes_is_an_error() {
        let err = read("#ID=PREDICTION;GOLDSTANDARD;THRESHOLD\n#labels 0=A\n", LearningMode::SingleLabel)
            .unwrap_err();
        assert!(matches!(err.kind, OutcomeParseErrorKind::NoOutcomes));
        let err = read("", LearningMode::SingleLabel).unwrap_err();
        assert!(matches!(err.kind, OutcomeParseErrorKind::NoOutcomes));
    }

    #[test]
    fn malformed_lines_are_reported() {
        let err = read("#labels 0=A 1=B\n1=0.5,x;1,0\n", LearningMode::MultiLabel).unwrap_err();
        assert_eq!(Some(2), err.line);
        assert!(matches!(err.kind, OutcomeParseErrorKind::MalformedLine(_)));

        let err = read("#labels 0=A 1=B\n1=0.5,0.5,0.5;1,0,0\n", LearningMode::MultiLabel).unwrap_err();
        assert!(matches!(err.kind, OutcomeParseErrorKind::WrongValueCount { expected: 2, actual: 3 }));

        let err = read("#labels 0=A 1=B\n1=5;0\n", LearningMode::SingleLabel).unwrap_err();
        assert!(matches!(err.kind, OutcomeParseErrorKind::IndexOutOfBounds { labels: 2, .. }));

        let err = read("#labels 1=A\n1=0;0\n", LearningMode::SingleLabel).unwrap_err();
        assert_eq!(Some(1), err.line);
        assert!(matches!(err.kind, OutcomeParseErrorKind::MalformedLabels(_)));
    }

    #[test]
    fn labels_are_url_encoded() {
        let set = OutcomeSet::with_records(
            LearningMode::SingleLabel,
            vec![
                OutcomeRecord::new(
                    "1",
                    vec![1.0, 0.0, 0.0],
                    vec![0.0, 0.0, 1.0],
                    labels(&["a b", "c,d;e", "ü=&"]),
                    None
                ),
            ]
        );
        let text = write(&set);
        assert_eq!(
            "#ID=PREDICTION;GOLDSTANDARD;THRESHOLD\n#labels 0=a+b 1=c%2Cd%3Be 2=%C3%BC%3D%26\n1=2;0;-1.0\n",
            text
        );
        let parsed = read(&text, LearningMode::SingleLabel).unwrap();
        assert_eq!(set, parsed);
    }

    #[test]
    fn homogenized_records_round_trip() {
        let shared = labels(&["A", "B", "C"]);
        let set = OutcomeSet::with_records(
            LearningMode::MultiLabel,
            vec![
                OutcomeRecord::new("1", vec![1.0, 0.0, -1.0], vec![0.8123, 0.25, -1.0], shared.clone(), Some(0.5)),
                OutcomeRecord::new("2", vec![-1.0, 1.0, 1.0], vec![-1.0, 0.6, 0.4], shared.clone(), None),
            ]
        );
        let parsed = read(&write(&set), LearningMode::MultiLabel).unwrap();
        assert_eq!(set.len(), parsed.len());
        for (expected, actual) in set.records().iter().zip(parsed.records()) {
            assert_eq!(expected.id(), actual.id());
            assert_eq!(expected.labels(), actual.labels());
            assert_eq!(expected.bipartition_threshold(), actual.bipartition_threshold());
            for (a, b) in expected.prediction().iter().zip(actual.prediction()) {
                assert!(approx_eq!(f64, *a, *b, epsilon = 0.0005), "{a} != {b}");
            }
            assert_eq!(expected.gold(), actual.gold());
        }

        let single = OutcomeSet::with_records(
            LearningMode::SingleLabel,
            vec![
                OutcomeRecord::new("1", vec![1.0, 0.0, -1.0], vec![0.0, 1.0, -1.0], shared.clone(), None),
                OutcomeRecord::new("2", vec![0.0, 0.0, 1.0], vec![0.0, 0.0, 1.0], shared, None),
            ]
        );
        let text = write(&single);
        assert!(text.contains("\n1=0,1,-1;1,0,-1;-1.0\n"));
        assert!(text.contains("\n2=2;2;-1.0\n"));
        assert_eq!(single, read(&text, LearningMode::SingleLabel).unwrap());
    }

    #[test]
    fn rejects_mixed_label_lists() {
        let set = OutcomeSet::with_records(
            LearningMode::MultiLabel,
            vec![
                OutcomeRecord::new("1", vec![1.0], vec![1.0], labels(&["A"]), None),
                OutcomeRecord::new("2", vec![1.0], vec![1.0], labels(&["B"]), None),
            ]
        );
        let err = write_outcomes(Vec::new(), &set).unwrap_err();
        assert!(matches!(err, OutcomeFormatError::InconsistentLabels { id } if id == "2"));
    }

    #[test]
    fn multi_label_with_one_label_keeps_its_vectors() {
        let set = OutcomeSet::with_records(
            LearningMode::MultiLabel,
            vec![
                OutcomeRecord::new("1", vec![1.0], vec![0.7], labels(&["A"]), Some(0.5)),
                OutcomeRecord::new("2", vec![0.0], vec![0.0], labels(&["A"]), Some(0.5)),
            ]
        );
        let text = write(&set);
        assert!(text.contains("\n1=0.700;1.000;0.5\n"));
        assert_eq!(set, read(&text, LearningMode::MultiLabel).unwrap());

        let set = read("#labels 0=A\n1=0.000;0.000;0.5\n", LearningMode::MultiLabel).unwrap();
        assert_eq!(&[0.0], set.records()[0].gold());
        assert_eq!(&[0.0], set.records()[0].prediction());
    }

    #[test]
    fn single_label_with_one_label_keeps_its_vectors() {
        let shared = labels(&["A"]);
        let set = OutcomeSet::with_records(
            LearningMode::SingleLabel,
            vec![
                OutcomeRecord::new("1", vec![0.0], vec![1.0], shared.clone(), None),
                OutcomeRecord::new("2", vec![1.0], vec![1.0], shared, None),
            ]
        );
        let text = write(&set);
        assert!(text.contains("\n1=1;0;-1.0\n"));
        assert!(text.contains("\n2=1;1;-1.0\n"));
        assert_eq!(set, read(&text, LearningMode::SingleLabel).unwrap());
    }

    #[test]
    fn ids_looking_like_comments_are_rejected() {
        let record = |id: &str| OutcomeRecord::new(id, vec![0.0, 1.0], vec![0.0, 1.0], labels(&["A", "B"]), None);
        for id in ["#7", "#labels", "a\nb"] {
            let set = OutcomeSet::with_records(LearningMode::SingleLabel, vec![record("1"), record(id)]);
            let err = write_outcomes(Vec::new(), &set).unwrap_err();
            assert!(matches!(err, OutcomeFormatError::InvalidId { id: found } if found == id));
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("id2outcome.txt");
        let set = OutcomeSet::with_records(LearningMode::SingleLabel, vec![record("#7")]);
        assert!(save_outcomes(&path, &set).is_err());
        assert!(!path.exists());

        let set = OutcomeSet::with_records(LearningMode::SingleLabel, vec![record("7#"), record("a#b=c")]);
        assert_eq!(set, read(&write(&set), LearningMode::SingleLabel).unwrap());
    }

    #[test]
    fn saves_atomically_and_loads_again() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("id2outcome.txt");
        let set = OutcomeSet::with_records(
            LearningMode::SingleLabel,
            vec![OutcomeRecord::new("1", vec![0.0, 1.0], vec![0.0, 1.0], labels(&["A", "B"]), Some(0.5))]
        );
        save_outcomes(&path, &set).unwrap();
        assert_eq!(set, load_outcomes(&path, LearningMode::SingleLabel).unwrap());

        let missing = dir.path().join("missing.txt");
        let err = load_outcomes(&missing, LearningMode::SingleLabel).unwrap_err();
        assert_eq!(missing, err.path);
    }
}
