//! LDA topic modeling for short social-media posts.
//!
//! A corpus of one document per line is tokenized against a stop list,
//! trained with collapsed Gibbs sampling, and summarized as per-topic word
//! lists, a composition of the merged corpus, and a topic/word hierarchy.

pub mod analysis;
pub mod config;
pub mod corpus;
pub mod error;
pub mod export;
pub mod inference;
pub mod models;
pub mod optimize;
pub mod ranking;
pub mod stopwords;
pub mod tokenizer;
pub mod topic_modeling;
pub mod vocabulary;

pub use analysis::Analysis;
pub use config::{InferenceConfig, ModelConfig, SamplerMode};
pub use corpus::{Corpus, Document};
pub use error::{ConfigError, Result, TopicError};
pub use inference::{InferenceParams, Inferencer};
pub use models::{Hierarchy, RankedWord, TopicScore};
pub use tokenizer::Tokenizer;
pub use topic_modeling::{train, GibbsSampler, ModelState, TrainedModel, TrainingStats};
pub use vocabulary::Vocabulary;
