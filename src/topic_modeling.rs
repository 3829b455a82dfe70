//! Collapsed Gibbs sampling for Latent Dirichlet Allocation.
//!
//! [`GibbsSampler`] owns the mutable training state and advances it one sweep
//! at a time; [`train`] runs the configured number of sweeps and freezes the
//! result into a [`TrainedModel`].

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{ModelConfig, SamplerMode};
use crate::corpus::{Corpus, Document};
use crate::error::{ConfigError, Result, TopicError};
use crate::export;
use crate::inference::Inferencer;
use crate::models::RankedWord;
use crate::optimize;
use crate::ranking;
use crate::vocabulary::Vocabulary;

/// Count tables, assignments and hyperparameters of an LDA model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    num_topics: usize,
    vocab_size: usize,
    doc_topic_counts: Vec<Vec<usize>>,  // [doc][topic]
    topic_word_counts: Vec<Vec<usize>>, // [topic][word]
    topic_totals: Vec<usize>,           // [topic]
    assignments: Vec<Vec<usize>>,       // [doc][position]
    alpha: Vec<f64>,
    alpha_sum: f64,
    beta: f64,
}

impl ModelState {
    /// Assigns every token a uniformly random topic.
    fn initialize<R: Rng + ?Sized>(
        documents: &[Document],
        num_topics: usize,
        vocab_size: usize,
        alpha_sum: f64,
        beta: f64,
        rng: &mut R,
    ) -> Self {
        let mut doc_topic_counts = vec![vec![0; num_topics]; documents.len()];
        let mut topic_word_counts = vec![vec![0; vocab_size]; num_topics];
        let mut topic_totals = vec![0; num_topics];
        let mut assignments = Vec::with_capacity(documents.len());

        for (doc_id, doc) in documents.iter().enumerate() {
            let mut word_topics = Vec::with_capacity(doc.len());
            for &word_id in doc.tokens() {
                let topic = rng.gen_range(0..num_topics);
                doc_topic_counts[doc_id][topic] += 1;
                topic_word_counts[topic][word_id] += 1;
                topic_totals[topic] += 1;
                word_topics.push(topic);
            }
            assignments.push(word_topics);
        }

        ModelState {
            num_topics,
            vocab_size,
            doc_topic_counts,
            topic_word_counts,
            topic_totals,
            assignments,
            alpha: vec![alpha_sum / num_topics as f64; num_topics],
            alpha_sum,
            beta,
        }
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn doc_topic_counts(&self) -> &[Vec<usize>] {
        &self.doc_topic_counts
    }

    pub fn topic_word_counts(&self) -> &[Vec<usize>] {
        &self.topic_word_counts
    }

    pub fn topic_totals(&self) -> &[usize] {
        &self.topic_totals
    }

    pub fn assignments(&self) -> &[Vec<usize>] {
        &self.assignments
    }

    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    pub fn alpha_sum(&self) -> f64 {
        self.alpha_sum
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn beta_sum(&self) -> f64 {
        self.beta * self.vocab_size as f64
    }

    /// Checks table shapes, topic totals and hyperparameters.
    pub fn check_consistency(&self) -> std::result::Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::InconsistentModel(msg));
        if self.num_topics == 0 {
            return Err(ConfigError::ZeroTopics);
        }
        if self.topic_word_counts.len() != self.num_topics
            || self.topic_totals.len() != self.num_topics
            || self.alpha.len() != self.num_topics
        {
            return fail(format!("tables do not have {} topics", self.num_topics));
        }
        for (topic, row) in self.topic_word_counts.iter().enumerate() {
            if row.len() != self.vocab_size {
                return fail(format!("topic {topic} row has {} words, expected {}", row.len(), self.vocab_size));
            }
            let sum: usize = row.iter().sum();
            if sum != self.topic_totals[topic] {
                return fail(format!("topic {topic} total is {} but its words sum to {sum}", self.topic_totals[topic]));
            }
        }
        if self.doc_topic_counts.len() != self.assignments.len() {
            return fail("document tables disagree on document count".to_string());
        }
        for (doc, (row, z)) in self.doc_topic_counts.iter().zip(&self.assignments).enumerate() {
            if row.len() != self.num_topics || row.iter().sum::<usize>() != z.len() {
                return fail(format!("document {doc} topic counts do not match its {} tokens", z.len()));
            }
        }
        if self.alpha.iter().any(|a| !a.is_finite() || *a <= 0.0) {
            return fail("alpha has a non-positive component".to_string());
        }
        if !(self.beta.is_finite() && self.beta > 0.0) {
            return fail(format!("beta is {}", self.beta));
        }
        Ok(())
    }

    /// Recounts every table from the assignments of `documents`.
    pub fn check_against(&self, documents: &[Document]) -> std::result::Result<(), ConfigError> {
        self.check_consistency()?;
        if documents.len() != self.assignments.len() {
            return Err(ConfigError::InconsistentModel(format!(
                "{} documents but {} assignment rows",
                documents.len(),
                self.assignments.len()
            )));
        }
        let mut doc_topic = vec![vec![0; self.num_topics]; documents.len()];
        let mut topic_word = vec![vec![0; self.vocab_size]; self.num_topics];
        for (d, (doc, z)) in documents.iter().zip(&self.assignments).enumerate() {
            if doc.len() != z.len() {
                return Err(ConfigError::InconsistentModel(format!(
                    "document {d} has {} tokens but {} assignments",
                    doc.len(),
                    z.len()
                )));
            }
            for (&word, &topic) in doc.tokens().iter().zip(z) {
                doc_topic[d][topic] += 1;
                topic_word[topic][word] += 1;
            }
        }
        if doc_topic != self.doc_topic_counts || topic_word != self.topic_word_counts {
            return Err(ConfigError::InconsistentModel(
                "count tables disagree with assignments".to_string(),
            ));
        }
        Ok(())
    }
}

/// Counters collected while training.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub iterations: usize,
    pub degenerate_draws: u64, // Draws that fell back to a uniform topic
    pub optimizations: usize,
}

/// Draws a topic proportionally to `weights`. Falls back to a uniform draw
/// when the weights do not form a usable distribution; the flag reports it.
pub(crate) fn sample_topic<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> (usize, bool) {
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return (rng.gen_range(0..weights.len()), true);
    }
    let mut threshold = rng.gen::<f64>() * total;
    let mut last_positive = 0;
    for (topic, &weight) in weights.iter().enumerate() {
        if weight > 0.0 {
            if threshold < weight {
                return (topic, false);
            }
            threshold -= weight;
            last_positive = topic;
        }
    }
    (last_positive, false)
}

struct Priors<'a> {
    alpha: &'a [f64],
    beta: f64,
    beta_sum: f64,
}

/// Resamples every token of one document against the given word tables.
/// Returns the number of degenerate draws.
#[allow(clippy::too_many_arguments)]
fn resample_document<R: Rng + ?Sized>(
    tokens: &[usize],
    doc_topics: &mut [usize],
    word_topics: &mut [usize],
    topic_word_counts: &mut [Vec<usize>],
    topic_totals: &mut [usize],
    priors: &Priors<'_>,
    weights: &mut [f64],
    rng: &mut R,
) -> u64 {
    let mut degenerate = 0;
    for (position, &word_id) in tokens.iter().enumerate() {
        let old_topic = word_topics[position];

        doc_topics[old_topic] -= 1;
        topic_word_counts[old_topic][word_id] -= 1;
        topic_totals[old_topic] -= 1;

        for (topic, weight) in weights.iter_mut().enumerate() {
            *weight = (doc_topics[topic] as f64 + priors.alpha[topic])
                * (topic_word_counts[topic][word_id] as f64 + priors.beta)
                / (topic_totals[topic] as f64 + priors.beta_sum);
        }
        let (new_topic, fell_back) = sample_topic(weights, rng);
        degenerate += u64::from(fell_back);

        doc_topics[new_topic] += 1;
        topic_word_counts[new_topic][word_id] += 1;
        topic_totals[new_topic] += 1;
        word_topics[position] = new_topic;
    }
    degenerate
}

/// Token moves made by one partition worker during a sweep.
struct WorkerUpdate {
    moves: Vec<(usize, usize, usize)>, // (word, old topic, new topic)
    degenerate: u64,
}

pub struct GibbsSampler<'a> {
    corpus: &'a Corpus,
    config: ModelConfig,
    state: ModelState,
    rng: StdRng,
    worker_rngs: Vec<StdRng>,
    weights: Vec<f64>,
    stats: TrainingStats,
}

impl<'a> GibbsSampler<'a> {
    /// Validates the configuration and corpus, then randomly initializes the
    /// assignments from `config.seed`.
    pub fn new(corpus: &'a Corpus, config: &ModelConfig) -> Result<Self> {
        Self::with_rng(corpus, config, StdRng::seed_from_u64(config.seed))
    }

    pub fn with_rng(corpus: &'a Corpus, config: &ModelConfig, mut rng: StdRng) -> Result<Self> {
        config.validate()?;
        corpus.check_trainable()?;

        let state = ModelState::initialize(
            corpus.documents(),
            config.num_topics,
            corpus.vocabulary().len(),
            config.alpha_sum,
            config.beta,
            &mut rng,
        );
        let worker_rngs = match config.sampler_mode() {
            SamplerMode::Sequential => Vec::new(),
            SamplerMode::Partitioned { workers } => (0..workers)
                .map(|_| StdRng::seed_from_u64(rng.gen()))
                .collect(),
        };

        Ok(GibbsSampler {
            corpus,
            config: config.clone(),
            state,
            rng,
            worker_rngs,
            weights: vec![0.0; config.num_topics],
            stats: TrainingStats::default(),
        })
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn iteration(&self) -> usize {
        self.stats.iterations
    }

    /// One full pass over every token, followed by a hyperparameter update
    /// when the optimize interval is due.
    pub fn sweep(&mut self) {
        let degenerate = match self.config.sampler_mode() {
            SamplerMode::Sequential => self.sweep_sequential(),
            SamplerMode::Partitioned { .. } => self.sweep_partitioned(),
        };
        self.stats.degenerate_draws += degenerate;
        self.stats.iterations += 1;

        let iteration = self.stats.iterations;
        let interval = self.config.optimize_interval;
        if interval > 0 && iteration > self.config.optimize_burn_in && iteration % interval == 0 {
            self.optimize_hyperparameters();
        }
        if self.config.log_interval > 0 && iteration % self.config.log_interval == 0 {
            debug!(
                iteration,
                total = self.config.num_iterations,
                alpha_sum = self.state.alpha_sum,
                beta = self.state.beta,
                "sweep complete"
            );
        }
    }

    fn sweep_sequential(&mut self) -> u64 {
        let beta_sum = self.state.beta_sum();
        let ModelState {
            doc_topic_counts,
            topic_word_counts,
            topic_totals,
            assignments,
            alpha,
            beta,
            ..
        } = &mut self.state;
        let priors = Priors {
            alpha,
            beta: *beta,
            beta_sum,
        };

        let mut degenerate = 0;
        for ((doc, doc_topics), word_topics) in self
            .corpus
            .documents()
            .iter()
            .zip(doc_topic_counts.iter_mut())
            .zip(assignments.iter_mut())
        {
            degenerate += resample_document(
                doc.tokens(),
                doc_topics,
                word_topics,
                topic_word_counts,
                topic_totals,
                &priors,
                &mut self.weights,
                &mut self.rng,
            );
        }
        degenerate
    }

    fn sweep_partitioned(&mut self) -> u64 {
        let beta_sum = self.state.beta_sum();
        let num_topics = self.state.num_topics;
        let documents = self.corpus.documents();
        let chunk = documents.len().div_ceil(self.worker_rngs.len()).max(1);

        let ModelState {
            doc_topic_counts,
            topic_word_counts,
            topic_totals,
            assignments,
            alpha,
            beta,
            ..
        } = &mut self.state;
        let priors = Priors {
            alpha,
            beta: *beta,
            beta_sum,
        };
        let snapshot_words = &*topic_word_counts;
        let snapshot_totals = &*topic_totals;

        let partitions: Vec<_> = documents
            .chunks(chunk)
            .zip(doc_topic_counts.chunks_mut(chunk))
            .zip(assignments.chunks_mut(chunk))
            .zip(self.worker_rngs.iter_mut())
            .collect();

        let updates: Vec<WorkerUpdate> = partitions
            .into_par_iter()
            .map(|(((docs, doc_rows), word_rows), rng)| {
                let mut local_words = snapshot_words.clone();
                let mut local_totals = snapshot_totals.clone();
                let mut weights = vec![0.0; num_topics];
                let mut update = WorkerUpdate {
                    moves: Vec::new(),
                    degenerate: 0,
                };
                for ((doc, doc_topics), word_topics) in docs.iter().zip(doc_rows).zip(word_rows) {
                    let before = word_topics.clone();
                    update.degenerate += resample_document(
                        doc.tokens(),
                        doc_topics,
                        word_topics,
                        &mut local_words,
                        &mut local_totals,
                        &priors,
                        &mut weights,
                        &mut *rng,
                    );
                    for ((&word, &old), &new) in doc.tokens().iter().zip(&before).zip(word_topics.iter()) {
                        if old != new {
                            update.moves.push((word, old, new));
                        }
                    }
                }
                update
            })
            .collect();

        // Barrier: fold every worker's moves into the shared tables.
        let mut degenerate = 0;
        for update in updates {
            degenerate += update.degenerate;
            for (word, old, new) in update.moves {
                topic_word_counts[old][word] -= 1;
                topic_word_counts[new][word] += 1;
                topic_totals[old] -= 1;
                topic_totals[new] += 1;
            }
        }
        degenerate
    }

    fn optimize_hyperparameters(&mut self) {
        let state = &mut self.state;
        match optimize::optimize_alpha(&mut state.alpha, &state.doc_topic_counts) {
            Some(sum) => state.alpha_sum = sum,
            None => debug!(iteration = self.stats.iterations, "alpha update degenerate, keeping previous values"),
        }

        if self.config.optimize_beta {
            let count_hist = optimize::histogram(
                state
                    .topic_word_counts
                    .iter()
                    .flatten()
                    .copied()
                    .filter(|&n| n > 0),
            );
            let size_hist = optimize::histogram(state.topic_totals.iter().copied());
            match optimize::optimize_beta(state.beta, &count_hist, &size_hist, state.vocab_size) {
                Some(beta) => state.beta = beta,
                None => debug!(iteration = self.stats.iterations, "beta update degenerate, keeping previous value"),
            }
        }
        self.stats.optimizations += 1;
        debug!(
            iteration = self.stats.iterations,
            alpha_sum = state.alpha_sum,
            beta = state.beta,
            "hyperparameters optimized"
        );
    }

    /// Freezes the state and ranks every topic's words.
    pub fn finish(self) -> TrainedModel {
        let sorted_words = ranking::rank_topic_words(&self.state.topic_word_counts, self.corpus.vocabulary());
        TrainedModel {
            vocabulary: self.corpus.vocabulary().clone(),
            state: self.state,
            sorted_words,
            stats: self.stats,
        }
    }
}

/// Trains a model with `config.num_iterations` sweeps.
pub fn train(corpus: &Corpus, config: &ModelConfig) -> Result<TrainedModel> {
    let mut sampler = GibbsSampler::new(corpus, config)?;
    info!(
        documents = corpus.len(),
        tokens = corpus.num_tokens(),
        vocabulary = corpus.vocabulary().len(),
        topics = config.num_topics,
        iterations = config.num_iterations,
        mode = ?config.sampler_mode(),
        "training LDA"
    );

    for _ in 0..config.num_iterations {
        sampler.sweep();
    }

    let stats = sampler.stats();
    if stats.degenerate_draws > 0 {
        warn!(
            draws = stats.degenerate_draws,
            "sampling weights degenerated; used uniform draws"
        );
    }
    info!(
        iterations = stats.iterations,
        optimizations = stats.optimizations,
        alpha_sum = sampler.state().alpha_sum(),
        beta = sampler.state().beta(),
        "training complete"
    );
    Ok(sampler.finish())
}

/// Frozen result of training. Safe to share across threads for inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    vocabulary: Vocabulary,
    state: ModelState,
    sorted_words: Vec<Vec<RankedWord>>,
    stats: TrainingStats,
}

impl TrainedModel {
    pub fn num_topics(&self) -> usize {
        self.state.num_topics
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    /// Every topic's words with a positive count, best first.
    pub fn sorted_words(&self) -> &[Vec<RankedWord>] {
        &self.sorted_words
    }

    pub fn top_words(&self, num_words: usize) -> Vec<&[RankedWord]> {
        ranking::top_words(&self.sorted_words, num_words)
    }

    pub fn inferencer(&self) -> Inferencer<'_> {
        Inferencer::new(self)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let model: TrainedModel = serde_json::from_str(json)?;
        model.state.check_consistency()?;
        if model.vocabulary.len() != model.state.vocab_size {
            return Err(ConfigError::InconsistentModel(format!(
                "vocabulary has {} words but the count tables have {}",
                model.vocabulary.len(),
                model.state.vocab_size
            ))
            .into());
        }
        if model.sorted_words != ranking::rank_topic_words(&model.state.topic_word_counts, &model.vocabulary) {
            return Err(ConfigError::InconsistentModel("ranked topic words do not match the count tables".to_string()).into());
        }
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        export::write_atomic(path, &self.to_json()?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| TopicError::io(path, e))?;
        Self::from_json(&json)
    }
}
