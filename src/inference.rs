use rand::Rng;
use tracing::debug;

use crate::config::InferenceConfig;
use crate::error::{ConfigError, Result};
use crate::tokenizer::Tokenizer;
use crate::topic_modeling::{sample_topic, TrainedModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceParams {
    pub iterations: usize,
    pub thinning: usize,
    pub burn_in: usize,
}

impl From<&InferenceConfig> for InferenceParams {
    fn from(config: &InferenceConfig) -> Self {
        InferenceParams {
            iterations: config.iterations,
            thinning: config.thinning,
            burn_in: config.burn_in,
        }
    }
}

impl Default for InferenceParams {
    fn default() -> Self {
        InferenceParams::from(&InferenceConfig::default())
    }
}

// Reads the model only; inferences may run concurrently on one model.
#[derive(Debug, Clone, Copy)]
pub struct Inferencer<'m> {
    model: &'m TrainedModel,
}

impl<'m> Inferencer<'m> {
    pub fn new(model: &'m TrainedModel) -> Self {
        Inferencer { model }
    }

    /// Samples the topic distribution of `tokens`.
    ///
    /// Sweeps after `burn_in`, and every `thinning`-th of them, add the local
    /// topic counts plus `alpha` to an accumulator that is normalized at the
    /// end. If no sweep was accumulated the final counts are used. An empty
    /// document yields the normalized prior.
    pub fn infer<R: Rng + ?Sized>(&self, tokens: &[usize], params: InferenceParams, rng: &mut R) -> Result<Vec<f64>> {
        if params.thinning == 0 {
            return Err(ConfigError::ZeroThinning.into());
        }

        let state = self.model.state();
        let num_topics = state.num_topics();
        let alpha = state.alpha();
        let beta = state.beta();
        let beta_sum = state.beta_sum();
        let topic_word_counts = state.topic_word_counts();
        let topic_totals = state.topic_totals();

        let words: Vec<usize> = tokens
            .iter()
            .copied()
            .filter(|&w| w < state.vocab_size())
            .collect();

        let mut local_counts = vec![0usize; num_topics];
        let mut word_topics: Vec<usize> = words
            .iter()
            .map(|_| {
                let topic = rng.gen_range(0..num_topics);
                local_counts[topic] += 1;
                topic
            })
            .collect();

        let mut accumulated = vec![0.0; num_topics];
        let mut samples = 0usize;
        let mut degenerate = 0u64;
        let mut weights = vec![0.0; num_topics];

        if !words.is_empty() {
            for iteration in 1..=params.iterations {
                for (position, &word_id) in words.iter().enumerate() {
                    let old_topic = word_topics[position];
                    local_counts[old_topic] -= 1;

                    for (topic, weight) in weights.iter_mut().enumerate() {
                        *weight = (local_counts[topic] as f64 + alpha[topic])
                            * (topic_word_counts[topic][word_id] as f64 + beta)
                            / (topic_totals[topic] as f64 + beta_sum);
                    }
                    let (new_topic, fell_back) = sample_topic(&weights, &mut *rng);
                    degenerate += u64::from(fell_back);

                    local_counts[new_topic] += 1;
                    word_topics[position] = new_topic;
                }

                if iteration > params.burn_in && (iteration - params.burn_in) % params.thinning == 0 {
                    for (acc, (&count, &a)) in accumulated.iter_mut().zip(local_counts.iter().zip(alpha)) {
                        *acc += count as f64 + a;
                    }
                    samples += 1;
                }
            }
        }

        if samples == 0 {
            for (acc, (&count, &a)) in accumulated.iter_mut().zip(local_counts.iter().zip(alpha)) {
                *acc = count as f64 + a;
            }
        }
        if degenerate > 0 {
            debug!(draws = degenerate, "inference used uniform fallback draws");
        }

        let total: f64 = accumulated.iter().sum();
        Ok(accumulated.into_iter().map(|value| value / total).collect())
    }

    pub fn infer_text<R: Rng + ?Sized>(
        &self,
        text: &str,
        tokenizer: &Tokenizer,
        params: InferenceParams,
        rng: &mut R,
    ) -> Result<Vec<f64>> {
        let tokens = tokenizer.encode_frozen(text, self.model.vocabulary());
        debug!(tokens = tokens.len(), "inferring document");
        self.infer(&tokens, params, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::corpus::Corpus;
    use crate::topic_modeling::train;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trained() -> (TrainedModel, Tokenizer) {
        let tokenizer = Tokenizer::new();
        let mut texts = Vec::new();
        for _ in 0..8 {
            texts.push("bitcoin trading price bitcoin exchange");
            texts.push("garden flowers soil garden seeds");
        }
        let corpus = Corpus::from_texts(&texts, &tokenizer);
        let config = ModelConfig {
            num_topics: 2,
            num_iterations: 150,
            optimize_interval: 0,
            ..ModelConfig::default()
        };
        (train(&corpus, &config).unwrap(), tokenizer)
    }

    fn params(iterations: usize) -> InferenceParams {
        InferenceParams {
            iterations,
            thinning: 1,
            burn_in: 5,
        }
    }

    #[test]
    fn test_distribution_is_normalized() {
        let (model, tokenizer) = trained();
        let mut rng = StdRng::seed_from_u64(3);
        let dist = model
            .inferencer()
            .infer_text("bitcoin price exchange garden", &tokenizer, params(50), &mut rng)
            .unwrap();
        assert_eq!(dist.len(), 2);
        assert!(dist.iter().all(|p| *p >= 0.0));
        assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_document_returns_prior() {
        let (model, tokenizer) = trained();
        let mut rng = StdRng::seed_from_u64(3);
        let dist = model
            .inferencer()
            .infer_text("unknown zebra words", &tokenizer, params(50), &mut rng)
            .unwrap();
        let alpha = model.state().alpha();
        let alpha_sum: f64 = alpha.iter().sum();
        for (p, a) in dist.iter().zip(alpha) {
            assert!((p - a / alpha_sum).abs() < 1e-12);
        }
    }

    #[test]
    fn test_inference_does_not_touch_model() {
        let (model, _) = trained();
        let before = model.state().clone();
        let mut rng = StdRng::seed_from_u64(11);
        model.inferencer().infer(&[0, 1, 2, 0], params(30), &mut rng).unwrap();
        assert_eq!(model.state(), &before);
    }

    #[test]
    fn test_theme_document_prefers_its_topic() {
        let (model, tokenizer) = trained();
        let bitcoin = model.vocabulary().get("bitcoin").unwrap();
        let counts = model.state().topic_word_counts();
        let bitcoin_topic = if counts[0][bitcoin] > counts[1][bitcoin] { 0 } else { 1 };

        let mut rng = StdRng::seed_from_u64(5);
        let dist = model
            .inferencer()
            .infer_text("bitcoin bitcoin trading exchange price", &tokenizer, params(100), &mut rng)
            .unwrap();
        assert!(dist[bitcoin_topic] > dist[1 - bitcoin_topic]);
    }

    #[test]
    fn test_no_accumulated_samples_uses_final_counts() {
        let (model, _) = trained();
        let mut rng = StdRng::seed_from_u64(5);
        let short = InferenceParams {
            iterations: 3,
            thinning: 1,
            burn_in: 10,
        };
        let dist = model.inferencer().infer(&[0, 1], short, &mut rng).unwrap();
        assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_thinning_is_rejected() {
        let (model, _) = trained();
        let mut rng = StdRng::seed_from_u64(5);
        let bad = InferenceParams {
            iterations: 10,
            thinning: 0,
            burn_in: 0,
        };
        assert!(model.inferencer().infer(&[0], bad, &mut rng).is_err());
    }
}
