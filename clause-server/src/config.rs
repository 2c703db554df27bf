//! Server configuration read from the environment.

use anyhow::{Context, bail};
use clause_rag::{DecisionPolicy, RagConfig, hashing::DEFAULT_DIMENSION};
use serde::{Deserialize, Serialize};

/// Which embedding backend the server constructs at start-up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Local `all-MiniLM-L6-v2` through `fastembed`; the production backend.
    #[cfg(feature = "fastembed")]
    #[serde(rename = "fastembed")]
    FastEmbed,
    /// Local lexical feature-hashing embedder, for tests and offline runs.
    Hashing {
        /// Output dimensionality.
        dimension: usize,
    },
    /// OpenAI embeddings API; the key comes from `OPENAI_API_KEY`.
    #[cfg(feature = "openai")]
    OpenAi {
        /// Model name, e.g. `text-embedding-3-small`.
        model: String,
        /// Requested output dimensionality.
        dimension: usize,
    },
}

impl Default for EmbeddingBackend {
    #[cfg(feature = "fastembed")]
    fn default() -> Self {
        Self::FastEmbed
    }

    #[cfg(not(feature = "fastembed"))]
    fn default() -> Self {
        Self::Hashing { dimension: DEFAULT_DIMENSION }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rag: RagConfig,
    pub decision: DecisionPolicy,
    pub embedding: EmbeddingBackend,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            rag: RagConfig::default(),
            decision: DecisionPolicy::default(),
            embedding: EmbeddingBackend::default(),
        }
    }
}

fn parse_json_var<T: serde::de::DeserializeOwned>(name: &str) -> anyhow::Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => {
            serde_json::from_str(&raw).map(Some).with_context(|| format!("invalid JSON in {name}"))
        }
        Err(_) => Ok(None),
    }
}

impl ServerConfig {
    /// Read configuration from `CLAUSE_*` environment variables.
    ///
    /// | variable | meaning |
    /// |---|---|
    /// | `CLAUSE_HOST` / `CLAUSE_PORT` | listen address |
    /// | `CLAUSE_RAG_CONFIG` | JSON [`RagConfig`], missing fields defaulted |
    /// | `CLAUSE_DOCUMENT_ROOT` | directory local-file locators may read from |
    /// | `CLAUSE_DECISION_POLICY` | JSON [`DecisionPolicy`] |
    /// | `CLAUSE_EMBEDDING` | JSON [`EmbeddingBackend`] |
    /// | `CLAUSE_EMBEDDING_DIM` | shorthand for a hashing backend's dimension |
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("CLAUSE_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("CLAUSE_PORT") {
            config.port = port.parse().with_context(|| format!("invalid CLAUSE_PORT '{port}'"))?;
        }
        if let Some(rag) = parse_json_var("CLAUSE_RAG_CONFIG")? {
            config.rag = rag;
        }
        if let Ok(root) = std::env::var("CLAUSE_DOCUMENT_ROOT") {
            config.rag.document_root = Some(root.into());
        }
        if let Some(decision) = parse_json_var("CLAUSE_DECISION_POLICY")? {
            config.decision = decision;
        }
        if let Some(embedding) = parse_json_var("CLAUSE_EMBEDDING")? {
            config.embedding = embedding;
        } else if let Ok(dim) = std::env::var("CLAUSE_EMBEDDING_DIM") {
            let dimension =
                dim.parse().with_context(|| format!("invalid CLAUSE_EMBEDDING_DIM '{dim}'"))?;
            config.embedding = EmbeddingBackend::Hashing { dimension };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.rag.validate().context("invalid retrieval configuration")?;
        match &self.embedding {
            EmbeddingBackend::Hashing { dimension: 0 } => {
                bail!("embedding dimension must be greater than zero")
            }
            _ => Ok(()),
        }
    }
}
