//! Environment-driven configuration for all three services.
//!
//! Every knob has a default that matches the docker-compose layout the
//! stores are deployed with, so a service can boot with nothing set.

use crate::error::{Error, Result};

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// OpenAI-compatible model endpoint configuration, shared by the
/// embedding and chat clients.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model_embed: String,
    pub model_chat: String,
}

impl ModelConfig {
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("BASE_URL")
            .map_err(|_| Error::Config("BASE_URL is not set".into()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: env_or("OPENAI_API_KEY", "anything"),
            model_embed: env_or("MODEL_EMBED", "ai/mxbai-embed-large"),
            model_chat: env_or("MODEL_CHAT", "ai/qwen3:latest"),
        })
    }
}

/// Chroma vector store configuration.
///
/// The store runs as a sidecar (`chroma run --path $CHROMA_PERSIST_DIR`)
/// and is reached over its HTTP API; `persist_dir` is carried only so
/// health output can name where the collection lives.
#[derive(Debug, Clone)]
pub struct ChromaConfig {
    pub url: String,
    pub collection: String,
    pub persist_dir: String,
}

impl ChromaConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_or("CHROMA_URL", "http://chroma:8000")
                .trim_end_matches('/')
                .to_string(),
            collection: env_or("CHROMA_COLLECTION", "documents"),
            persist_dir: env_or("CHROMA_PERSIST_DIR", "/chroma_data"),
        }
    }
}

/// Where the BM25 search node lives, for services that call it.
#[derive(Debug, Clone)]
pub struct SearchServiceConfig {
    pub url: String,
    /// Per-call deadline in seconds.
    pub timeout_secs: u64,
}

impl SearchServiceConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_or("SEARCH_SERVICE_URL", "http://search-service:8003")
                .trim_end_matches('/')
                .to_string(),
            timeout_secs: env_parse("SEARCH_SERVICE_TIMEOUT_SECS", 5),
        }
    }
}

/// OpenSearch connection settings for the search node itself.
#[derive(Debug, Clone)]
pub struct OpenSearchConfig {
    pub host: String,
    pub port: u16,
    pub scheme: String,
    pub username: String,
    pub password: String,
    pub index: String,
}

impl OpenSearchConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_or("OPENSEARCH_HOST", "opensearch"),
            port: env_parse("OPENSEARCH_PORT", 9200),
            scheme: env_or("OPENSEARCH_SCHEME", "http"),
            username: env_or("OPENSEARCH_USER", "admin"),
            password: env_or("OPENSEARCH_PASSWORD", "Admin123!"),
            index: env_or("OPENSEARCH_INDEX", "docs_bm25"),
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn use_ssl(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("https")
    }
}

/// Read the HTTP port for a service, falling back to its default.
pub fn service_port(default: u16) -> u16 {
    env_parse("PORT", default)
}
