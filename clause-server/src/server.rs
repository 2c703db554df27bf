use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clause_rag::{
    EmbeddingProvider, HashingEmbeddingProvider, LocatorLoader, QueryService, RagError,
    RetrievalPipeline,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    config::{EmbeddingBackend, ServerConfig},
    protocol::{ErrorResponse, RunRequest, RunResponse},
};

#[derive(Clone)]
pub struct AppState {
    pub service: QueryService,
}

impl AppState {
    /// Construct the embedding provider, loader, pipeline and decision
    /// engine described by `config`.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let provider = build_embedding_provider(&config.embedding)?;
        match &config.rag.document_root {
            Some(root) => info!(root = %root.display(), "local documents enabled"),
            None => info!("local documents disabled, only http(s) locators are fetched"),
        }
        let loader = Arc::new(LocatorLoader::from_config(&config.rag));
        let pipeline = RetrievalPipeline::builder()
            .config(config.rag.clone())
            .embedding_provider(provider)
            .loader(loader)
            .build()
            .context("failed to build retrieval pipeline")?;

        Ok(Self { service: QueryService::new(Arc::new(pipeline), config.decision.engine()) })
    }
}

fn build_embedding_provider(
    backend: &EmbeddingBackend,
) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match backend {
        #[cfg(feature = "fastembed")]
        EmbeddingBackend::FastEmbed => Arc::new(
            clause_rag::fastembed::FastEmbedProvider::new()
                .context("failed to load all-MiniLM-L6-v2")?,
        ),
        EmbeddingBackend::Hashing { dimension } => Arc::new(
            HashingEmbeddingProvider::new(*dimension)
                .context("failed to create hashing embedder")?,
        ),
        #[cfg(feature = "openai")]
        EmbeddingBackend::OpenAi { model, dimension } => Arc::new(
            clause_rag::openai::OpenAIEmbeddingProvider::from_env()
                .context("failed to create OpenAI embedder")?
                .with_model(model.clone())
                .with_dimension(*dimension),
        ),
    };
    info!(provider = provider.name(), dimension = provider.dimension(), "embedding provider ready");
    Ok(provider)
}

/// A [`RagError`] on its way to an HTTP response.
#[derive(Debug)]
pub struct ApiError(RagError);

impl From<RagError> for ApiError {
    fn from(error: RagError) -> Self {
        Self(error)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_invalid_input() => StatusCode::BAD_REQUEST,
            RagError::EmbeddingUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(%status, error = %self.0, "request failed");
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/hackrx/run", post(run_query))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for clause-server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("clause-server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status":"ok","service":"clause-server"}))
}

async fn run_query(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    info!(
        documents = %request.documents,
        question_count = request.questions.len(),
        "run request"
    );

    let outcome = state.service.answer(&request.documents, &request.questions).await?;
    let answers = outcome.rendered()?;

    Ok(Json(RunResponse { answers }))
}
