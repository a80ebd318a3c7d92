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

use std::num::NonZeroUsize;
use camino::{Utf8Path, Utf8PathBuf};
use config::Config;
use serde::{Deserialize, Serialize};
use text_processing::configs::{StopwordRegistryConfig, TokenizerConfig};
use text_processing::extractor::ExtractorConfig;
use text_processing::vocabulary::SelectionPolicy;

/// The name of the statistics file in the root folder if not configured otherwise.
pub const DEFAULT_STATISTICS_FILE: &str = "statistics.bin";
/// The name of the vocabulary file in the root folder if not configured otherwise.
pub const DEFAULT_VOCABULARY_FILE: &str = "vocabulary.json";

/// All configs used by a run of the featurizer.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configs {
    pub system: SystemConfig,
    pub paths: PathsConfig,
    pub tokenizer: TokenizerConfig,
    pub stopwords: StopwordRegistryConfig,
    pub extractor: ExtractorConfig,
    pub selection: SelectionConfig,
}

impl Configs {
    /// Loads the config from [file], environment variables with the
    /// prefix `FEATURIZER` override the values of the file.
    pub fn load_from<P: AsRef<Utf8Path>>(file: P) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(config::File::with_name(file.as_ref().as_str()))
            .add_source(config::Environment::with_prefix("FEATURIZER").separator("."))
            .build()?
            .try_deserialize()
    }

    /// Looks for `./featurizer` and `./featurizer_data/config`, falls back to the defaults
    /// if neither exists.
    pub fn discover_or_default() -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("./featurizer").required(false))
            .add_source(config::File::with_name("./featurizer_data/config").required(false))
            .add_source(config::Environment::with_prefix("FEATURIZER").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Config of the system
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    /// The log level of the featurizer
    #[serde(default = "_default_log_level")]
    pub log_level: log::LevelFilter,

    /// Log to a file?
    #[serde(default)]
    pub log_to_file: bool,

    /// Collect statistics and build vectors with multiple threads.
    #[serde(default = "_default_parallel")]
    pub parallel: bool,

    /// The number of threads used if parallel, uses every core if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<NonZeroUsize>,
}

const fn _default_log_level() -> log::LevelFilter {
    log::LevelFilter::Info
}

const fn _default_parallel() -> bool {
    true
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: _default_log_level(),
            log_to_file: false,
            parallel: _default_parallel(),
            threads: None,
        }
    }
}

/// Where the artifacts of the featurizer are stored.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    #[serde(default = "_default_root_folder")]
    pub root_folder: Utf8PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary_file_name: Option<String>,
}

fn _default_root_folder() -> Utf8PathBuf {
    Utf8PathBuf::from("featurizer_data")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root_folder: _default_root_folder(),
            statistics_file_name: None,
            vocabulary_file_name: None,
        }
    }
}

impl PathsConfig {
    pub fn root_path(&self) -> &Utf8Path {
        &self.root_folder
    }

    pub fn file_statistics(&self) -> Utf8PathBuf {
        self.root_folder.join(self.statistics_file_name.as_deref().unwrap_or(DEFAULT_STATISTICS_FILE))
    }

    pub fn file_vocabulary(&self) -> Utf8PathBuf {
        self.root_folder.join(self.vocabulary_file_name.as_deref().unwrap_or(DEFAULT_VOCABULARY_FILE))
    }

    pub fn file_log(&self) -> Utf8PathBuf {
        self.root_folder.join("out.log")
    }
}

/// How the vocabulary is selected.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct SelectionConfig {
    /// The prefix of the feature names, the name of the extractor if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub policy: SelectionPolicy,
}
