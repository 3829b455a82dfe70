//! End-to-end pipeline: documents in, model and reports out.

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::corpus::{merge_documents, Corpus};
use crate::error::Result;
use crate::export::{ReportPaths, Reports};
use crate::inference::InferenceParams;
use crate::models::{Hierarchy, TopicScore};
use crate::ranking;
use crate::tokenizer::Tokenizer;
use crate::topic_modeling::{train, TrainedModel};

/// A trained model together with the composition of the merged document.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub model: TrainedModel,
    pub distribution: Vec<f64>,
    pub ranking: Vec<TopicScore>,
}

pub fn tokenizer_for(config: &ModelConfig) -> Tokenizer {
    let mut tokenizer = Tokenizer::new();
    tokenizer.add_stop_words(&config.extra_stop_words);
    tokenizer
}

/// Trains on `documents` and infers the composition of `merged`, or of all
/// documents joined together when `merged` is `None`.
pub fn run<S: AsRef<str>>(documents: &[S], merged: Option<&str>, config: &ModelConfig) -> Result<Analysis> {
    // Phase 1: tokenize and check the corpus
    config.validate()?;
    let tokenizer = tokenizer_for(config);
    let corpus = Corpus::from_texts(documents, &tokenizer);
    corpus.check_trainable()?;

    info!(
        documents = corpus.len(),
        tokens = corpus.num_tokens(),
        vocabulary = corpus.vocabulary().len(),
        "built corpus"
    );
    debug!(most_common = ?corpus.most_common_words(10), "term frequencies");

    // Phase 2: train, then infer the merged document
    let model = train(&corpus, config)?;

    let merged = match merged {
        Some(text) => text.to_string(),
        None => merge_documents(documents),
    };
    analyze_with(model, &merged, &tokenizer, config)
}

/// Infers the composition of `merged` against an already trained model.
pub fn analyze_with(model: TrainedModel, merged: &str, tokenizer: &Tokenizer, config: &ModelConfig) -> Result<Analysis> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let distribution = model
        .inferencer()
        .infer_text(merged, tokenizer, InferenceParams::from(&config.inference), &mut rng)?;
    let ranking = ranking::rank_topics(&distribution, config.top_topics);
    if let Some(best) = ranking.first() {
        info!(topic = best.topic, probability = best.probability, "dominant topic");
    }
    Ok(Analysis {
        model,
        distribution,
        ranking,
    })
}

impl Analysis {
    pub fn hierarchy(&self, num_words: usize) -> Hierarchy {
        crate::export::ranked_hierarchy(&self.ranking, &self.model.top_words(num_words))
    }

    pub fn reports(&self, num_words: usize, include_top_words: bool) -> Result<Reports> {
        Reports::render(
            &self.model.top_words(num_words),
            &self.distribution,
            &self.ranking,
            include_top_words,
        )
    }

    /// Renders and writes every report under `dir` with the `name` prefix.
    pub fn write_reports(&self, dir: &Path, name: &str, num_words: usize, include_top_words: bool) -> Result<ReportPaths> {
        let paths = ReportPaths::new(dir, name);
        self.reports(num_words, include_top_words)?.write(&paths)?;
        Ok(paths)
    }
}
