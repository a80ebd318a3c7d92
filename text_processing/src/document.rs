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

use serde::{Deserialize, Serialize};

/// A single sentence, the tokens in their original order.
pub type Sentence = Vec<String>;

/// A document as delivered by the annotation pipeline:
/// an identifier and the token texts grouped by sentence.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    sentences: Vec<Sentence>,
}

impl Document {
    pub fn new(id: impl Into<String>, sentences: Vec<Sentence>) -> Self {
        Self { id: id.into(), sentences }
    }

    /// A document without sentence boundaries, all tokens are treated as one span.
    pub fn from_tokens<I, T>(id: impl Into<String>, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(id, vec![tokens.into_iter().map(Into::into).collect()])
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.token_count() == 0
    }
}

#[cfg(test)]
mod test {
    use crate::document::Document;

    #[test]
    fn counts_tokens_over_all_sentences() {
        let doc = Document::new(
            "doc",
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec![],
                vec!["c".to_string()],
            ],
        );
        assert_eq!(3, doc.token_count());
        assert!(!doc.is_empty());
        assert!(Document::from_tokens("empty", Vec::<String>::new()).is_empty());
    }
}
