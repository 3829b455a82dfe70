use std::path::PathBuf;

/// Preconditions that must hold before any sampling starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("number of topics must be at least 1")]
    ZeroTopics,

    #[error("corpus contains no documents")]
    EmptyCorpus,

    #[error("vocabulary is empty (every token was filtered out)")]
    EmptyVocabulary,

    #[error("corpus contains no tokens: all {documents} documents are empty after filtering")]
    NoTokens { documents: usize },

    #[error("{name} must be positive and finite, got {value}")]
    InvalidPrior { name: &'static str, value: f64 },

    #[error("document {document} has token id {token}, but the vocabulary holds {vocab_size} words")]
    TokenOutOfRange {
        document: usize,
        token: usize,
        vocab_size: usize,
    },

    #[error("sampler needs at least one worker thread")]
    ZeroThreads,

    #[error("inference thinning interval must be at least 1")]
    ZeroThinning,

    #[error("model is inconsistent: {0}")]
    InconsistentModel(String),
}

/// Errors surfaced by the topic modeling engine.
#[derive(Debug, thiserror::Error)]
pub enum TopicError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML config error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TopicError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TopicError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TopicError>;
