use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::embeddings::EmbeddingProvider;
use crate::llm::LlmProvider;
use crate::vector_store::VectorStoreProvider;

/// Environment variable prefix for overrides, e.g. `WOO__LLM__MODEL=gpt-4o`
pub const ENV_PREFIX: &str = "WOO";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: PathBuf,
    /// Write a daily rolling log file next to the console output
    pub file_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: PathBuf::from("logs"),
            file_output: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    pub provider: EmbeddingProvider,
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAI,
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub provider: VectorStoreProvider,
    pub endpoint: String,
    pub collection: String,
    /// JSON snapshot loaded by the in-memory store
    pub snapshot_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::Chroma,
            endpoint: "http://localhost:8001".to_string(),
            collection: "document_chunks".to_string(),
            snapshot_path: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4-turbo-preview".to_string(),
            temperature: 0.1,
            max_tokens: 1000,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Candidates fetched for a conversational answer
    pub conversation_limit: usize,
    /// Candidates fetched for the documents endpoint
    pub documents_limit: usize,
    pub min_score: f32,
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            conversation_limit: 5,
            documents_limit: 30,
            min_score: 0.52,
            max_context_chars: 12_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Maximum number of turns kept per session (user + assistant each count as one)
    pub max_turns: usize,
    pub session_timeout_secs: u64,
    pub channel_capacity: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: 8,
            session_timeout_secs: 3600,
            channel_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub embeddings: EmbeddingsConfig,
    pub vector_store: VectorStoreConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub conversation: ConversationConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, with `WOO__SECTION__FIELD` environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::WooError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Config file not found: {}", path.display()),
            )));
        }

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string without environment overrides
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(crate::WooError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// Reject settings the pipeline cannot honour
    pub fn validate(&self) -> crate::Result<()> {
        let turns = self.conversation.max_turns;
        if turns == 0 || turns % 2 != 0 {
            return Err(crate::WooError::ConfigError(format!(
                "conversation.max_turns must be a positive even number, got {turns}"
            )));
        }
        if !(0.0..=1.0).contains(&self.retrieval.min_score) {
            return Err(crate::WooError::ConfigError(format!(
                "retrieval.min_score must be within [0, 1], got {}",
                self.retrieval.min_score
            )));
        }
        if self.retrieval.conversation_limit == 0 || self.retrieval.documents_limit == 0 {
            return Err(crate::WooError::ConfigError(
                "retrieval limits must be greater than zero".to_string(),
            ));
        }
        if self.conversation.channel_capacity == 0 {
            return Err(crate::WooError::ConfigError(
                "conversation.channel_capacity must be greater than zero".to_string(),
            ));
        }
        if self.llm.model.trim().is_empty() || self.embeddings.model.trim().is_empty() {
            return Err(crate::WooError::ConfigError(
                "llm.model and embeddings.model must not be empty".to_string(),
            ));
        }
        for (name, endpoint) in [
            ("embeddings.endpoint", &self.embeddings.endpoint),
            ("vector_store.endpoint", &self.vector_store.endpoint),
            ("llm.endpoint", &self.llm.endpoint),
        ] {
            url::Url::parse(endpoint).map_err(|e| {
                crate::WooError::ConfigError(format!("{name} is not a valid URL ({endpoint}): {e}"))
            })?;
        }
        Ok(())
    }

    /// Get embeddings API key, falling back to `OPENAI_API_KEY`
    pub fn embeddings_api_key(&self) -> Option<String> {
        self.embeddings
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }

    /// Get LLM API key, falling back to `OPENAI_API_KEY`
    pub fn llm_api_key(&self) -> Option<String> {
        self.llm
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }

    /// Get the socket address the API server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
