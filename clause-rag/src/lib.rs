//! # clause-rag
//!
//! Semantic clause retrieval over a single document.
//!
//! A request loads one document, splits it into chunks, embeds every chunk
//! in one batch, builds an exact L2 index and looks up the nearest chunks
//! for each question. A [`DecisionEngine`] can then turn each
//! [`RetrievalResult`] into a structured [`Answer`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use clause_rag::{
//!     DecisionPolicy, HashingEmbeddingProvider, LocatorLoader, QueryService, RagConfig,
//!     RetrievalPipeline,
//! };
//!
//! let config = RagConfig::default();
//! let pipeline = RetrievalPipeline::builder()
//!     .loader(Arc::new(LocatorLoader::from_config(&config)))
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
//!     .config(config)
//!     .build()?;
//!
//! let service = QueryService::new(Arc::new(pipeline), DecisionPolicy::default().engine());
//! let outcome = service.answer("https://example.com/policy.txt", &["Is dental covered?"]).await?;
//! ```
//!
//! ## Features
//!
//! - `http` (default) — [`HttpDocumentLoader`] over `reqwest`
//! - `fastembed` — [`fastembed::FastEmbedProvider`], local `all-MiniLM-L6-v2`
//!   embeddings; the production backend
//! - `openai` — [`openai::OpenAIEmbeddingProvider`]
//!
//! [`HashingEmbeddingProvider`] is lexical only. It needs no model download
//! and is meant for tests and offline runs.

pub mod chunking;
pub mod config;
pub mod decision;
pub mod document;
pub mod embedding;
pub mod error;
#[cfg(feature = "fastembed")]
pub mod fastembed;
pub mod hashing;
pub mod index;
pub mod loader;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod service;

pub use chunking::{Chunker, ChunkingStrategy, FixedSizeChunker, SentenceChunker, chunk_text};
pub use config::{RagConfig, RagConfigBuilder};
pub use decision::{Answer, Decision, DecisionEngine, DecisionPolicy, ExcerptOnly, KeywordRules};
pub use document::{
    Chunk, ContentOrigin, Document, RetrievalCondition, RetrievalResponse, RetrievalResult,
    ScoredChunk,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use hashing::HashingEmbeddingProvider;
pub use index::{FlatIndex, Neighbor, VectorIndex, squared_l2};
#[cfg(feature = "http")]
pub use loader::HttpDocumentLoader;
pub use loader::{DocumentLoader, FileDocumentLoader, LocatorLoader};
pub use pipeline::{RetrievalPipeline, RetrievalPipelineBuilder};
pub use service::{QueryOutcome, QueryService};
