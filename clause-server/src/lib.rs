//! `clause-server` exposes `clause-rag` question answering over HTTP.
//! A single `POST /api/v1/hackrx/run` call takes a document locator and a
//! list of questions and returns one answer per question.

pub mod config;
pub mod protocol;
pub mod server;

pub use config::{EmbeddingBackend, ServerConfig};
pub use server::{ApiError, AppState, app_router, run_server};
