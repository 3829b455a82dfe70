use crate::models::{RankedWord, TopicScore};
use crate::vocabulary::Vocabulary;

/// Sorts every topic's words by assigned count. Words with a zero count are
/// left out, so a topic may rank fewer words than the vocabulary holds.
pub fn rank_topic_words(topic_word_counts: &[Vec<usize>], vocabulary: &Vocabulary) -> Vec<Vec<RankedWord>> {
    topic_word_counts
        .iter()
        .map(|counts| {
            let mut pairs: Vec<(usize, usize)> = counts
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, count)| *count > 0)
                .collect();
            pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            pairs
                .into_iter()
                .map(|(id, count)| RankedWord {
                    id,
                    word: vocabulary.word(id).unwrap_or_default().to_string(),
                    count,
                })
                .collect()
        })
        .collect()
}

pub fn top_words(sorted_words: &[Vec<RankedWord>], num_words: usize) -> Vec<&[RankedWord]> {
    sorted_words
        .iter()
        .map(|words| &words[..words.len().min(num_words)])
        .collect()
}

// Descending probability, ties by topic id.
pub fn rank_topics(distribution: &[f64], k: usize) -> Vec<TopicScore> {
    let mut scores: Vec<TopicScore> = distribution
        .iter()
        .enumerate()
        .map(|(topic, &probability)| TopicScore { topic, probability })
        .collect();
    scores.sort_by(|a, b| {
        b.probability
            .total_cmp(&a.probability)
            .then(a.topic.cmp(&b.topic))
    });
    scores.truncate(k);
    scores
}
