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

//! The steps of the featurizer, every step reads the artifacts of the previous one.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use anyhow::{bail, Context};
use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use evaluation::homogenizer::homogenize_files;
use evaluation::outcome::LearningMode;
use text_processing::corpus::{CorpusStatistics, CorpusStatisticsCollector};
use text_processing::extractor::TokenizedExtractor;
use text_processing::stopword_registry::{StopWordList, StopWordRegistry};
use text_processing::tokenizer::Tokenizer;
use text_processing::vectorizer::FeatureVectorBuilder;
use text_processing::vocabulary::{FeatureVocabulary, VocabularySelector};
use crate::config::Configs;
use crate::corpus_io::{read_corpus, write_feature_matrix, write_sparse_features};

/// Loads the stopwords of the configured language, if any.
pub fn load_stopwords(configs: &Configs) -> Option<Arc<StopWordList>> {
    let language = configs.tokenizer.stopword_language?;
    let registry = StopWordRegistry::initialize(&configs.stopwords);
    let stopwords = registry.get_or_load(&language);
    if stopwords.is_none() {
        log::warn!("No stopwords found for {}, continuing without.", language.to_name());
    }
    stopwords
}

/// Builds the configured extractor with its stopwords, bound to the configured tokenizer.
pub fn build_extractor(configs: &Configs) -> anyhow::Result<TokenizedExtractor> {
    let extractor = configs.extractor
        .build(load_stopwords(configs))
        .context("The extractor is misconfigured")?;
    Ok(TokenizedExtractor::new(Tokenizer::from_config(&configs.tokenizer), extractor))
}

fn ensure_parent(path: &Utf8Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create the directory {parent}"))?;
    }
    Ok(())
}

/// Collects the statistics of [corpus] and saves them to [output]
/// or the statistics file of the config.
pub fn collect(configs: &Configs, corpus: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<CorpusStatistics> {
    let extractor = build_extractor(configs)?;
    let documents = read_corpus(corpus, extractor.tokenizer())?;
    let statistics = if configs.system.parallel {
        CorpusStatisticsCollector::collect_parallel(&extractor, &documents)
    } else {
        let mut collector = CorpusStatisticsCollector::new(&extractor);
        collector.add_all(&documents);
        collector.finish()
    };
    let output = output.map_or_else(|| configs.paths.file_statistics(), Utf8Path::to_path_buf);
    ensure_parent(&output)?;
    statistics.save(&output)?;
    log::info!(
        "Saved the statistics of {} documents with {} distinct keys to {output}.",
        statistics.document_count(),
        statistics.frequencies().len()
    );
    Ok(statistics)
}

/// Selects the vocabulary from the saved statistics.
pub fn select(configs: &Configs, statistics: Option<&Utf8Path>, output: Option<&Utf8Path>) -> anyhow::Result<FeatureVocabulary> {
    let statistics = statistics.map_or_else(|| configs.paths.file_statistics(), Utf8Path::to_path_buf);
    let statistics = CorpusStatistics::load(&statistics)?;
    let mut selector = VocabularySelector::new(configs.selection.policy.clone())
        .context("The selection policy is misconfigured")?;
    if let Some(name) = &configs.selection.name {
        selector = selector.with_name(name.as_str());
    }
    let vocabulary = selector.select(&statistics);
    if vocabulary.is_empty() {
        log::warn!("The vocabulary {} is empty, every feature vector will be empty.", vocabulary.name());
    }
    let output = output.map_or_else(|| configs.paths.file_vocabulary(), Utf8Path::to_path_buf);
    ensure_parent(&output)?;
    vocabulary.save(&output)?;
    log::info!("Saved the vocabulary with {} keys to {output}.", vocabulary.len());
    Ok(vocabulary)
}

/// Builds the feature vectors of [corpus] and writes them to [output].
/// Returns the number of written vectors.
pub fn extract(
    configs: &Configs,
    corpus: &Utf8Path,
    vocabulary: Option<&Utf8Path>,
    output: &Utf8Path,
    sparse: bool,
) -> anyhow::Result<usize> {
    let vocabulary = vocabulary.map_or_else(|| configs.paths.file_vocabulary(), Utf8Path::to_path_buf);
    let vocabulary = FeatureVocabulary::load(&vocabulary)?;
    let extractor = build_extractor(configs)?;
    let builder = FeatureVectorBuilder::new(&vocabulary, &extractor)?;
    let documents = read_corpus(corpus, extractor.tokenizer())?;
    let vectors = if configs.system.parallel {
        builder.build_all(&documents)
    } else {
        documents.iter().map(|document| builder.build(document)).collect_vec()
    };
    ensure_parent(output)?;
    if sparse {
        write_sparse_features(output, &documents, &vectors)?;
    } else {
        write_feature_matrix(output, &vocabulary, &documents, &vectors)?;
    }
    log::info!("Wrote {} feature vectors to {output}.", vectors.len());
    Ok(vectors.len())
}

/// Homogenizes the label spaces of [inputs] into [output].
/// Returns the number of written records.
pub fn homogenize(inputs: &[Utf8PathBuf], mode: LearningMode, output: &Utf8Path) -> anyhow::Result<usize> {
    if inputs.is_empty() {
        bail!("Nothing to homogenize, no input file was given!")
    }
    ensure_parent(output)?;
    let homogenized = homogenize_files(inputs, mode, output)?;
    log::info!("Wrote {} {mode} records from {} files to {output}.", homogenized.len(), inputs.len());
    Ok(homogenized.len())
}

/// Writes the default config as pretty json, never overwrites an existing file.
pub fn init(output: &Utf8Path) -> anyhow::Result<()> {
    if output.exists() {
        bail!("The file {output} already exists!")
    }
    ensure_parent(output)?;
    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("Failed to create {output}"))?
    );
    serde_json::to_writer_pretty(&mut writer, &Configs::default())?;
    writer.flush()?;
    Ok(())
}
