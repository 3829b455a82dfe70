use std::path::Path;

use counter::Counter;

use crate::error::{ConfigError, Result, TopicError};
use crate::tokenizer::Tokenizer;
use crate::vocabulary::Vocabulary;

/// A filtered, integer-coded document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    tokens: Vec<usize>,
}

impl Document {
    pub fn new(tokens: Vec<usize>) -> Self {
        Document { tokens }
    }

    pub fn tokens(&self) -> &[usize] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Documents sharing one vocabulary.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    vocabulary: Vocabulary,
}

impl Corpus {
    /// Tokenizes every text, growing a fresh vocabulary, then freezes it.
    pub fn from_texts<S: AsRef<str>>(texts: &[S], tokenizer: &Tokenizer) -> Self {
        let mut vocabulary = Vocabulary::new();
        let documents = texts
            .iter()
            .map(|text| Document::new(tokenizer.encode(text.as_ref(), &mut vocabulary)))
            .collect();
        vocabulary.freeze();
        Corpus {
            documents,
            vocabulary,
        }
    }

    /// Builds a corpus from already-encoded documents.
    pub fn from_parts(documents: Vec<Document>, mut vocabulary: Vocabulary) -> Self {
        vocabulary.freeze();
        Corpus {
            documents,
            vocabulary,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn num_tokens(&self) -> usize {
        self.documents.iter().map(Document::len).sum()
    }

    /// Fails unless there is at least one token to sample.
    pub fn check_trainable(&self) -> std::result::Result<(), ConfigError> {
        if self.documents.is_empty() {
            return Err(ConfigError::EmptyCorpus);
        }
        if self.vocabulary.is_empty() {
            return Err(ConfigError::EmptyVocabulary);
        }
        if self.num_tokens() == 0 {
            return Err(ConfigError::NoTokens {
                documents: self.documents.len(),
            });
        }
        let vocab_size = self.vocabulary.len();
        for (document, doc) in self.documents.iter().enumerate() {
            if let Some(&token) = doc.tokens().iter().find(|&&id| id >= vocab_size) {
                return Err(ConfigError::TokenOutOfRange {
                    document,
                    token,
                    vocab_size,
                });
            }
        }
        Ok(())
    }

    /// Corpus-wide occurrence count of each word id.
    pub fn term_frequencies(&self) -> Counter<usize> {
        self.documents
            .iter()
            .flat_map(|doc| doc.tokens().iter().copied())
            .collect()
    }

    /// The `n` most frequent words with their counts, ties by id.
    pub fn most_common_words(&self, n: usize) -> Vec<(String, usize)> {
        self.term_frequencies()
            .most_common_ordered()
            .into_iter()
            .take(n)
            .filter_map(|(id, count)| self.vocabulary.word(id).map(|w| (w.to_string(), count)))
            .collect()
    }
}

/// Reads one document per line. Blank lines become empty documents so that
/// line numbers and document indices agree.
pub fn read_documents(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| TopicError::io(path, e))?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Reads a whole file as a single merged document.
pub fn read_merged(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| TopicError::io(path, e))
}

/// The merged shape of a per-line corpus.
pub fn merge_documents<S: AsRef<str>>(documents: &[S]) -> String {
    documents
        .iter()
        .map(|doc| doc.as_ref().replace('\n', ""))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_corpus() -> Corpus {
        Corpus::from_texts(&["cat dog cat", "dog fish dog", "the"], &Tokenizer::new())
    }

    #[test]
    fn test_build_corpus() {
        let corpus = small_corpus();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.documents()[0].tokens(), &[0, 1, 0]);
        assert_eq!(corpus.documents()[1].tokens(), &[1, 2, 1]);
        assert!(corpus.documents()[2].is_empty());
        assert_eq!(corpus.num_tokens(), 6);
        assert!(corpus.vocabulary().is_frozen());
        assert!(corpus.check_trainable().is_ok());
    }

    #[test]
    fn test_term_frequencies() {
        let corpus = small_corpus();
        let freqs = corpus.term_frequencies();
        assert_eq!(freqs[&1], 3);
        assert_eq!(freqs[&0], 2);
        assert_eq!(
            corpus.most_common_words(2),
            vec![("dog".to_string(), 3), ("cat".to_string(), 2)]
        );
    }

    #[test]
    fn test_untrainable_corpora() {
        let tokenizer = Tokenizer::new();
        let empty: [&str; 0] = [];
        assert_eq!(
            Corpus::from_texts(&empty, &tokenizer).check_trainable(),
            Err(ConfigError::EmptyCorpus)
        );
        assert_eq!(
            Corpus::from_texts(&["the a", "of"], &tokenizer).check_trainable(),
            Err(ConfigError::EmptyVocabulary)
        );

        let mut vocab = Vocabulary::new();
        vocab.get_or_insert("cat");
        let corpus = Corpus::from_parts(vec![Document::default(), Document::default()], vocab);
        assert_eq!(
            corpus.check_trainable(),
            Err(ConfigError::NoTokens { documents: 2 })
        );
    }

    #[test]
    fn test_token_outside_vocabulary() {
        let mut vocab = Vocabulary::new();
        vocab.get_or_insert("cat");
        let corpus = Corpus::from_parts(vec![Document::new(vec![0]), Document::new(vec![0, 5])], vocab);
        assert_eq!(
            corpus.check_trainable(),
            Err(ConfigError::TokenOutOfRange {
                document: 1,
                token: 5,
                vocab_size: 1
            })
        );
    }

    #[test]
    fn test_merge_documents() {
        assert_eq!(merge_documents(&["a b", "c\n", "d"]), "a b c d");
    }
}
