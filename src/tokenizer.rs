//! Raw text to integer token sequences.
//!
//! The pipeline lowercases the input, extracts runs of letters, underscores
//! and hash signs, removes stop words and maps the survivors through a
//! [`Vocabulary`].

use std::collections::HashSet;

use regex::Regex;

use crate::stopwords;
use crate::vocabulary::Vocabulary;

#[derive(Debug, Clone)]
pub struct Tokenizer {
    token_re: Regex,
    stop_words: HashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer::new()
    }
}

impl Tokenizer {
    /// English stop list plus tweet noise terms.
    pub fn new() -> Self {
        let stop_words = stopwords::ENGLISH
            .iter()
            .chain(stopwords::TWEET_NOISE)
            .map(|word| word.to_string())
            .collect();
        Tokenizer::with_stop_words(stop_words)
    }

    pub fn with_stop_words(stop_words: HashSet<String>) -> Self {
        Tokenizer {
            token_re: Regex::new(r"[\p{L}_#]+").expect("token pattern is valid"),
            stop_words,
        }
    }

    pub fn add_stop_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.stop_words.insert(word.as_ref().to_lowercase());
        }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Lowercased, stop-filtered tokens in input order.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.token_re
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .map(str::to_string)
            .collect()
    }

    /// Encodes `text`, growing `vocabulary` unless it is frozen.
    pub fn encode(&self, text: &str, vocabulary: &mut Vocabulary) -> Vec<usize> {
        self.tokens(text)
            .iter()
            .filter_map(|token| vocabulary.get_or_insert(token))
            .collect()
    }

    /// Encodes `text` against a read-only vocabulary, dropping unknown tokens.
    pub fn encode_frozen(&self, text: &str, vocabulary: &Vocabulary) -> Vec<usize> {
        self.tokens(text)
            .iter()
            .filter_map(|token| vocabulary.get(token))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_separators() {
        let tokenizer = Tokenizer::with_stop_words(HashSet::new());
        let tokens = tokenizer.tokens("Hello, WORLD!! snake_case #Rust2024 café");
        assert_eq!(tokens, vec!["hello", "world", "snake_case", "#rust", "café"]);
    }

    #[test]
    fn test_tweet_noise_removed() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokens("RT @obama: jobs report http://bit.ly/abc #jobs");
        assert_eq!(tokens, vec!["obama", "jobs", "report", "abc", "#jobs"]);
    }

    #[test]
    fn test_all_stop_words_yield_empty() {
        let stop: HashSet<String> = ["the".to_string()].into_iter().collect();
        let tokenizer = Tokenizer::with_stop_words(stop);
        let mut vocab = Vocabulary::new();
        assert!(tokenizer.encode("the the the", &mut vocab).is_empty());
        assert!(vocab.is_empty());
    }

    #[test]
    fn test_encode_frozen_drops_unknown() {
        let tokenizer = Tokenizer::new();
        let mut vocab = Vocabulary::new();
        assert_eq!(tokenizer.encode("cat dog cat", &mut vocab), vec![0, 1, 0]);
        assert_eq!(tokenizer.encode_frozen("zebra dog cat", &vocab), vec![1, 0]);
        assert_eq!(vocab.len(), 2);

        vocab.freeze();
        assert_eq!(tokenizer.encode("fish cat", &mut vocab), vec![0]);
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn test_extra_stop_words_are_lowercased() {
        let mut tokenizer = Tokenizer::new();
        tokenizer.add_stop_words(["Obama"]);
        assert!(tokenizer.is_stop_word("obama"));
        assert_eq!(tokenizer.tokens("Obama speaks"), vec!["speaks"]);
    }
}
