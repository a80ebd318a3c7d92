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

use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::collections::hash_map::Entry;
use std::fs::File;
use std::hash::Hash;
use std::io;
use std::io::{BufRead, BufReader, Read};
use std::sync::{Arc, PoisonError, RwLock};
use camino::{Utf8Path, Utf8PathBuf};
use compact_str::{CompactString, ToCompactString};
use isolang::Language;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configs::StopwordRegistryConfig;


/// A registry for stopwords.
/// May have multiple repositories, the stopword list of a language is the
/// combination of all lists provided by the registered repositories.
#[derive(Debug, Default, Clone)]
pub struct StopWordRegistry {
    cached_stop_words: Arc<RwLock<HashMap<Language, Arc<StopWordList>>>>,
    repositories: Arc<RwLock<Vec<StopWordRepository>>>
}

impl StopWordRegistry {
    pub fn initialize(cfg: &StopwordRegistryConfig) -> Self {
        let new = Self::default();
        new.repositories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(cfg.iter().cloned());
        new
    }

    fn load_stop_words(&self, language: &Language) -> Option<Vec<String>> {
        let read = self.repositories.read().unwrap_or_else(PoisonError::into_inner);
        let mut collection = Vec::new();
        for repo in read.iter() {
            if let Some(found) = repo.load_raw_stop_words(language) {
                collection.extend(found)
            }
        }
        (!collection.is_empty()).then_some(collection)
    }

    pub fn get_or_load(&self, language: &Language) -> Option<Arc<StopWordList>> {
        let lock = self.cached_stop_words.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(found) = lock.get(language).cloned() {
            return Some(found);
        }
        drop(lock);
        let mut lock = self.cached_stop_words.write().unwrap_or_else(PoisonError::into_inner);
        match lock.entry(*language) {
            Entry::Occupied(value) => {
                Some(value.get().clone())
            }
            Entry::Vacant(value) => {
                let list = StopWordList::from_words(self.load_stop_words(language)?);
                log::info!("Loaded {} stopwords for {}.", list.len(), language.to_name());
                Some(value.insert(Arc::new(list)).clone())
            }
        }
    }
}


/// A set of stopwords, compared by their exact text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct StopWordList {
    words: HashSet<CompactString>,
}

impl StopWordList {
    pub fn from_words<I, T>(words: I) -> Self where I: IntoIterator<Item=T>, T: ToCompactString {
        let mut new = Self::default();
        new.extend(words);
        new
    }

    /// Reads a stopword list, one word per line.
    /// Blank lines and lines starting with `#` are ignored.
    pub fn read_from<R: Read>(reader: R) -> io::Result<Self> {
        let lines = BufReader::new(reader)
            .lines()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_words(
            lines
                .iter()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
        ))
    }

    pub fn load(path: impl AsRef<Utf8Path>) -> io::Result<Self> {
        Self::read_from(File::open(path.as_ref())?)
    }

    /// A copy of this list with every word lowercased.
    pub fn to_lowercase(&self) -> Self {
        Self::from_words(self.words.iter().map(|value| value.to_lowercase()))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The words in lexicographic order.
    pub fn sorted_words(&self) -> BTreeSet<&str> {
        self.words.iter().map(CompactString::as_str).collect()
    }

    #[inline]
    pub fn contains_raw<Q: ?Sized>(&self, value: &Q) -> bool
    where
        CompactString: Borrow<Q>,
        Q: Hash + Eq, {
        self.words.contains(value)
    }
}

impl<Q> Extend<Q> for StopWordList where Q: ToCompactString {
    fn extend<T: IntoIterator<Item=Q>>(&mut self, iter: T) {
        self.words.extend(iter.into_iter().map(|value| value.to_compact_string()));
        self.words.shrink_to_fit();
    }
}


#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(try_from = "StopWordRepositoryDev", into = "StopWordRepositoryDev")]
pub enum StopWordRepository {
    /// A directory containing `<iso 639-3>.txt` or `<iso 639-1>.txt` files.
    DirRepo { dir: Utf8PathBuf },
    /// A single file for exactly one language.
    File { language: Language, file: Utf8PathBuf },
}

#[derive(Debug, Error)]
#[error("Was not able to propery convert the definition to a recognized StopWordRepository definition: {0:?}")]
#[repr(transparent)]
pub struct StopWordRepositoryConversionError(StopWordRepositoryDev);

impl TryFrom<StopWordRepositoryDev> for StopWordRepository {
    type Error = StopWordRepositoryConversionError;

    fn try_from(value: StopWordRepositoryDev) -> Result<Self, Self::Error> {
        match value {
            StopWordRepositoryDev { dir: Some(dir), file: None, language: None } => {
                Ok(Self::DirRepo { dir })
            }
            StopWordRepositoryDev { dir: None, file: Some(file), language: Some(language) } => {
                Ok(Self::File { file, language })
            }
            err => Err(StopWordRepositoryConversionError(err))
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
struct StopWordRepositoryDev {
    #[serde(skip_serializing_if = "Option::is_none", alias = "directory")]
    dir: Option<Utf8PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<Utf8PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<Language>,
}

impl From<StopWordRepository> for StopWordRepositoryDev {
    fn from(value: StopWordRepository) -> Self {
        match value {
            StopWordRepository::DirRepo { dir } => {
                StopWordRepositoryDev {
                    dir: Some(dir),
                    ..Default::default()
                }
            }
            StopWordRepository::File { file, language } => {
                StopWordRepositoryDev {
                    file: Some(file),
                    language: Some(language),
                    ..Default::default()
                }
            }
        }
    }
}

/// Provides stop word lists for a specific language
pub trait StopWordListRepository {
    fn load_raw_stop_words(&self, language: &Language) -> Option<Vec<String>>;
}

impl StopWordListRepository for StopWordRepository {
    fn load_raw_stop_words(&self, language: &Language) -> Option<Vec<String>> {
        fn load_file(file: impl AsRef<Utf8Path>) -> Option<Vec<String>> {
            match StopWordList::load(file.as_ref()) {
                Ok(list) => Some(list.sorted_words().into_iter().map(str::to_owned).collect_vec()),
                Err(err) => {
                    log::warn!("Failed to read the stopwords in {}: {err}", file.as_ref());
                    None
                }
            }
        }

        match self {
            StopWordRepository::DirRepo { dir } => {
                if !dir.exists() {
                    log::warn!("The directory {} does not exist!", dir);
                    return None
                }
                let file = dir.join(format!("{}.txt", language.to_639_3()));
                if file.exists() {
                    load_file(file)
                } else if let Some(file) = language.to_639_1().map(|value| dir.join(format!("{}.txt", value))).filter(|p| p.exists()) {
                    load_file(file)
                } else {
                    log::warn!("The file {} does not exist!", file);
                    None
                }
            }
            StopWordRepository::File { file, language: file_lang } => {
                if language != file_lang {
                    None
                } else if file.exists() {
                    load_file(file)
                } else {
                    log::warn!("The file {} does not exist!", file);
                    None
                }
            }
        }
    }
}
