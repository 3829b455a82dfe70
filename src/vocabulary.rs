use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Bidirectional token <-> id mapping.
///
/// Ids are dense and assigned in insertion order. Once frozen, lookups of
/// unseen tokens return `None` instead of growing the mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    words: Vec<String>,
    index: HashMap<String, usize>,
    frozen: bool,
}

impl Vocabulary {
    pub fn new() -> Self {
        Vocabulary::default()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Stops growth; later unseen tokens are dropped.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn get(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// Returns the id for `token`, assigning the next id if it is new and the
    /// vocabulary is still growing.
    pub fn get_or_insert(&mut self, token: &str) -> Option<usize> {
        if let Some(id) = self.index.get(token) {
            return Some(*id);
        }
        if self.frozen {
            return None;
        }
        let id = self.words.len();
        self.words.push(token.to_string());
        self.index.insert(token.to_string(), id);
        Some(id)
    }

    pub fn word(&self, id: usize) -> Option<&str> {
        self.words.get(id).map(String::as_str)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

// A vocabulary restored from disk is always frozen.
impl TryFrom<Vec<String>> for Vocabulary {
    type Error = String;

    fn try_from(words: Vec<String>) -> Result<Self, Self::Error> {
        let mut index = HashMap::with_capacity(words.len());
        for (i, word) in words.iter().enumerate() {
            if let Some(first) = index.insert(word.clone(), i) {
                return Err(format!("word {word:?} appears at ids {first} and {i}"));
            }
        }
        Ok(Vocabulary {
            words,
            index,
            frozen: true,
        })
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.words
    }
}
