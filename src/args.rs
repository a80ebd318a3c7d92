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

use std::str::FromStr;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use evaluation::outcome::LearningMode;
use crate::config::Configs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// Builds n-gram vocabularies and feature matrices, homogenizes outcome files.
pub struct FeaturizerArgs {
    /// The config file, if not set ./featurizer or ./featurizer_data/config is used.
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,
    /// overrides the log level from the config.
    #[arg(long, global = true)]
    pub override_log_level: Option<log::LevelFilter>,
    /// Log to file
    #[arg(long, global = true)]
    pub log_to_file: bool,
    /// The step to execute
    #[command(subcommand)]
    pub mode: RunMode,
}

#[derive(Subcommand, Debug)]
pub enum RunMode {
    /// Collects the n-gram statistics of a csv corpus with the columns id and text.
    Collect {
        /// The corpus
        corpus: Utf8PathBuf,
        /// Where to save the statistics, defaults to the statistics file of the config.
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
        /// Collect on a single thread.
        #[arg(long)]
        sequential: bool,
    },
    /// Selects the vocabulary from collected statistics.
    Select {
        /// The statistics, defaults to the statistics file of the config.
        #[arg(short, long)]
        statistics: Option<Utf8PathBuf>,
        /// Where to save the vocabulary, defaults to the vocabulary file of the config.
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },
    /// Writes the feature vectors of a csv corpus.
    Extract {
        /// The corpus
        corpus: Utf8PathBuf,
        /// The vocabulary, defaults to the vocabulary file of the config.
        #[arg(short, long)]
        vocabulary: Option<Utf8PathBuf>,
        /// The feature matrix
        #[arg(short, long)]
        output: Utf8PathBuf,
        /// Write `<id> <index>:<value>` lines instead of a csv.
        #[arg(long)]
        sparse: bool,
        /// Extract on a single thread.
        #[arg(long)]
        sequential: bool,
    },
    /// Merges outcome files into one label space.
    Homogenize {
        /// The learning mode of the outcomes (singleLabel, multiLabel or regression)
        #[arg(short, long, value_parser = LearningMode::from_str)]
        mode: LearningMode,
        /// The homogenized outcome file
        #[arg(short, long)]
        output: Utf8PathBuf,
        /// The outcome files
        #[arg(required = true)]
        inputs: Vec<Utf8PathBuf>,
    },
    /// Writes the default config.
    Init {
        #[arg(default_value = "featurizer.json")]
        output: Utf8PathBuf,
    },
}

/// A step of the pipeline, the parallelism is moved into the config.
#[derive(Debug)]
pub enum Step {
    Collect { corpus: Utf8PathBuf, output: Option<Utf8PathBuf> },
    Select { statistics: Option<Utf8PathBuf>, output: Option<Utf8PathBuf> },
    Extract { corpus: Utf8PathBuf, vocabulary: Option<Utf8PathBuf>, output: Utf8PathBuf, sparse: bool },
    Homogenize { mode: LearningMode, output: Utf8PathBuf, inputs: Vec<Utf8PathBuf> },
}

#[derive(Debug)]
pub enum ConsumedArgs {
    RunConfig(Step, Configs),
    Init(Utf8PathBuf),
}

/// Consumes the args and returns everything necessary to execute the featurizer
pub(crate) fn consume_args(args: FeaturizerArgs) -> Result<ConsumedArgs, config::ConfigError> {
    let (step, sequential) = match args.mode {
        RunMode::Init { output } => return Ok(ConsumedArgs::Init(output)),
        RunMode::Collect { corpus, output, sequential } => {
            (Step::Collect { corpus, output }, sequential)
        }
        RunMode::Select { statistics, output } => {
            (Step::Select { statistics, output }, false)
        }
        RunMode::Extract { corpus, vocabulary, output, sparse, sequential } => {
            (Step::Extract { corpus, vocabulary, output, sparse }, sequential)
        }
        RunMode::Homogenize { mode, output, inputs } => {
            (Step::Homogenize { mode, output, inputs }, false)
        }
    };

    let mut configs = match &args.config {
        None => Configs::discover_or_default()?,
        Some(path) => Configs::load_from(path)?,
    };

    if let Some(log_level) = args.override_log_level {
        configs.system.log_level = log_level;
    }

    if args.log_to_file {
        configs.system.log_to_file = true;
    }

    if sequential {
        configs.system.parallel = false;
    }

    Ok(ConsumedArgs::RunConfig(step, configs))
}

#[cfg(test)]
mod test {
    use clap::Parser;
    use evaluation::outcome::LearningMode;
    use crate::args::{consume_args, ConsumedArgs, FeaturizerArgs, RunMode, Step};

    #[test]
    fn parses_homogenize() {
        let args = FeaturizerArgs::try_parse_from([
            "featurizer", "homogenize", "--mode", "multiLabel", "-o", "out.txt", "a.txt", "b.txt"
        ]).unwrap();
        match args.mode {
            RunMode::Homogenize { mode, output, inputs } => {
                assert_eq!(LearningMode::MultiLabel, mode);
                assert_eq!("out.txt", output.as_str());
                assert_eq!(2, inputs.len());
            }
            other => panic!("Expected homogenize but got {other:?}"),
        }

        assert!(FeaturizerArgs::try_parse_from(["featurizer", "homogenize", "--mode", "multiLabel", "-o", "out.txt"]).is_err());
        assert!(FeaturizerArgs::try_parse_from(["featurizer", "homogenize", "--mode", "unknown", "-o", "out.txt", "a.txt"]).is_err());
    }

    #[test]
    fn overrides_are_applied() {
        let dir = camino_tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"system": {"log_level": "Warn"}}"#).unwrap();
        let args = FeaturizerArgs::try_parse_from([
            "featurizer", "--config", path.as_str(), "--override-log-level", "debug",
            "extract", "corpus.csv", "-o", "matrix.csv", "--sequential"
        ]).unwrap();
        match consume_args(args).unwrap() {
            ConsumedArgs::RunConfig(Step::Extract { sparse, .. }, configs) => {
                assert!(!sparse);
                assert!(!configs.system.parallel);
                assert_eq!(log::LevelFilter::Debug, configs.system.log_level);
            }
            other => panic!("Expected extract but got {other:?}"),
        }
    }

    #[test]
    fn steps_without_sequential_flag_stay_parallel() {
        let dir = camino_tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, "{}").unwrap();
        let args = FeaturizerArgs::try_parse_from([
            "featurizer", "--config", path.as_str(), "collect", "corpus.csv"
        ]).unwrap();
        match consume_args(args).unwrap() {
            ConsumedArgs::RunConfig(Step::Collect { corpus, output }, configs) => {
                assert_eq!("corpus.csv", corpus.as_str());
                assert_eq!(None, output);
                assert!(configs.system.parallel);
            }
            other => panic!("Expected collect but got {other:?}"),
        }
    }

    #[test]
    fn init_does_not_need_a_config() {
        let args = FeaturizerArgs::try_parse_from(["featurizer", "--config", "missing.json", "init"]).unwrap();
        match consume_args(args).unwrap() {
            ConsumedArgs::Init(path) => assert_eq!("featurizer.json", path.as_str()),
            other => panic!("Expected init but got {other:?}"),
        }
    }
}
