//! Run configuration.
//!
//! Everything the trainer and inferencer need is carried in one explicit
//! [`ModelConfig`] value. It can be loaded from YAML and then overridden by
//! command-line flags.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, TopicError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub iterations: usize,
    pub thinning: usize,
    pub burn_in: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            iterations: 2000,
            thinning: 1,
            burn_in: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub num_topics: usize,
    pub num_iterations: usize,
    pub alpha_sum: f64, // Initial sum of the document-topic prior over all topics
    pub beta: f64,      // Topic-word concentration
    pub num_words: usize,
    pub optimize_interval: usize, // 0 disables hyperparameter optimization
    pub optimize_burn_in: usize,
    pub optimize_beta: bool,
    pub seed: u64,
    pub threads: usize, // 1 = strict sequential sampler
    pub top_topics: usize,
    pub log_interval: usize,
    pub inference: InferenceConfig,
    pub extra_stop_words: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            num_topics: 50,
            num_iterations: 2000,
            alpha_sum: 1.0,
            beta: 0.01,
            num_words: 20,
            optimize_interval: 20,
            optimize_burn_in: 0,
            optimize_beta: true,
            seed: 42,
            threads: 1,
            top_topics: 10,
            log_interval: 50,
            inference: InferenceConfig::default(),
            extra_stop_words: Vec::new(),
        }
    }
}

impl ModelConfig {
    pub fn new(num_topics: usize) -> Self {
        ModelConfig {
            num_topics,
            ..Default::default()
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ModelConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| TopicError::io(path, e))?;
        Self::from_yaml_str(&text)
    }

    /// Checks the preconditions that do not depend on the corpus.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.num_topics == 0 {
            return Err(ConfigError::ZeroTopics);
        }
        check_prior("alpha", self.alpha_sum)?;
        check_prior("beta", self.beta)?;
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        if self.inference.thinning == 0 {
            return Err(ConfigError::ZeroThinning);
        }
        Ok(())
    }

    pub fn sampler_mode(&self) -> SamplerMode {
        if self.threads <= 1 {
            SamplerMode::Sequential
        } else {
            SamplerMode::Partitioned {
                workers: self.threads,
            }
        }
    }
}

fn check_prior(name: &'static str, value: f64) -> std::result::Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidPrior { name, value })
    }
}

/// How a training sweep is scheduled.
///
/// `Sequential` visits documents in order and updates the shared counts after
/// every token, so a fixed seed reproduces every assignment bit for bit.
///
/// `Partitioned` splits the documents into `workers` contiguous blocks. Each
/// worker samples its block against a snapshot of the topic-word counts taken
/// at the start of the sweep, and the deltas are merged at the end of the
/// sweep. Results are reproducible for a fixed seed and worker count, but not
/// across different worker counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerMode {
    Sequential,
    Partitioned { workers: usize },
}
