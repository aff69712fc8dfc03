use thiserror::Error;

#[derive(Error, Debug)]
pub enum WooError {
    /// Malformed request or filter shape
    #[error("Validation error: {0}")]
    Validation(String),

    /// Embedding service call failed (transport, quota, bad response)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector store call failed
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Streaming generation failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// The caller went away mid-stream
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("{0}")]
    Custom(String),

    #[error("Configuration loading error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("Invalid date: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WooError {
    /// Whether the error came from the caller's input rather than a collaborator
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::DateParse(_))
    }
}

pub type Result<T> = std::result::Result<T, WooError>;
