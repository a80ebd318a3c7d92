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

//! Reading corpora and writing feature matrices.

use std::fs::File;
use std::io::{BufWriter, Write};
use anyhow::{bail, Context};
use camino::Utf8Path;
use serde::Deserialize;
use text_processing::document::Document;
use text_processing::tokenizer::Tokenizer;
use text_processing::vectorizer::FeatureVector;
use text_processing::vocabulary::FeatureVocabulary;

/// A row of a corpus csv.
#[derive(Debug, Deserialize)]
struct CorpusRow {
    id: String,
    text: String,
}

/// Reads a csv with the columns `id` and `text` and tokenizes every text.
pub fn read_corpus(path: &Utf8Path, tokenizer: &Tokenizer) -> anyhow::Result<Vec<Document>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open the corpus {path}"))?;
    let mut documents = Vec::new();
    for (idx, row) in reader.deserialize::<CorpusRow>().enumerate() {
        let row = row.with_context(|| format!("Failed to read record {} of {path}", idx + 1))?;
        let document = tokenizer.to_document(row.id, &row.text);
        if document.is_empty() {
            log::warn!("The document {} does not contain any token.", document.id());
        } else {
            log::debug!("Read {} with {} tokens.", document.id(), document.token_count());
        }
        documents.push(document);
    }
    log::info!("Read {} documents from {path}.", documents.len());
    Ok(documents)
}

/// Writes the vectors as csv, the header is `id` followed by the feature names of [vocabulary].
pub fn write_feature_matrix(
    path: &Utf8Path,
    vocabulary: &FeatureVocabulary,
    documents: &[Document],
    vectors: &[FeatureVector],
) -> anyhow::Result<()> {
    if documents.len() != vectors.len() {
        bail!("Got {} documents but {} vectors!", documents.len(), vectors.len())
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create the feature matrix {path}"))?;
    writer.write_record(std::iter::once("id".to_string()).chain(vocabulary.feature_names()))?;
    for (document, vector) in documents.iter().zip(vectors) {
        writer.write_record(
            std::iter::once(document.id().to_string())
                .chain(vector.iter().map(|value| value.to_string()))
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one line per document in the sparse `<id> <index>:<value> ...` layout,
/// indices start at 1 and zeros are left out.
pub fn write_sparse_features(
    path: &Utf8Path,
    documents: &[Document],
    vectors: &[FeatureVector],
) -> anyhow::Result<()> {
    if documents.len() != vectors.len() {
        bail!("Got {} documents but {} vectors!", documents.len(), vectors.len())
    }
    let file = File::create(path).with_context(|| format!("Failed to create {path}"))?;
    let mut writer = BufWriter::new(file);
    for (document, vector) in documents.iter().zip(vectors) {
        write!(writer, "{}", document.id())?;
        for (idx, value) in vector.sparse_features() {
            write!(writer, " {idx}:{value}")?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use camino_tempfile::tempdir;
    use text_processing::document::Document;
    use text_processing::fingerprint::ExtractorFingerprint;
    use text_processing::tokenizer::Tokenizer;
    use text_processing::vectorizer::FeatureVector;
    use text_processing::vocabulary::FeatureVocabulary;
    use crate::corpus_io::{read_corpus, write_feature_matrix, write_sparse_features};

    #[test]
    fn reads_quoted_texts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.csv");
        std::fs::write(
            &path,
            "id,text\n1,\"The cat sat. The dog, too.\"\n2,nothing here\n3,\n"
        ).unwrap();
        let documents = read_corpus(&path, &Tokenizer::new(false, true, None)).unwrap();
        assert_eq!(3, documents.len());
        assert_eq!("1", documents[0].id());
        assert_eq!(2, documents[0].sentences().len());
        assert_eq!(vec!["the", "dog", "too"], documents[0].sentences()[1]);
        assert!(documents[2].is_empty());
    }

    #[test]
    fn missing_text_column_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.csv");
        std::fs::write(&path, "id,content\n1,abc\n").unwrap();
        assert!(read_corpus(&path, &Tokenizer::new(false, true, None)).is_err());
    }

    #[test]
    fn writes_dense_and_sparse_rows() {
        let dir = tempdir().unwrap();
        let vocabulary = FeatureVocabulary::new(
            "ngram",
            ExtractorFingerprint::builder().add("test").finish(),
            vec!["a".to_string(), "a_b".to_string()]
        );
        let documents = vec![
            Document::from_tokens("d1", ["a", "b"]),
            Document::from_tokens("d2", ["c"]),
        ];
        let vectors = vec![
            FeatureVector::from(vec![1.0, 1.0]),
            FeatureVector::from(vec![0.0, 0.0]),
        ];

        let dense = dir.path().join("matrix.csv");
        write_feature_matrix(&dense, &vocabulary, &documents, &vectors).unwrap();
        assert_eq!(
            "id,ngram_a,ngram_a_b\nd1,1,1\nd2,0,0\n",
            std::fs::read_to_string(&dense).unwrap()
        );

        let sparse = dir.path().join("matrix.txt");
        write_sparse_features(&sparse, &documents, &vectors).unwrap();
        assert_eq!("d1 1:1 2:1\nd2\n", std::fs::read_to_string(&sparse).unwrap());

        assert!(write_feature_matrix(&dense, &vocabulary, &documents, &vectors[..1]).is_err());
    }
}
