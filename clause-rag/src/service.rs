//! Question answering: retrieval followed by a decision per question.

use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::decision::{Answer, DecisionEngine};
use crate::document::ContentOrigin;
use crate::error::{RagError, Result};
use crate::pipeline::RetrievalPipeline;

/// Answers for one document, in question order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryOutcome {
    /// Origin of the text the answers were derived from.
    pub origin: ContentOrigin,
    /// One answer per question.
    pub answers: Vec<Answer>,
}

impl QueryOutcome {
    /// Render every answer as a pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DecisionError`] if an answer cannot be serialized.
    pub fn rendered(&self) -> Result<Vec<String>> {
        self.answers
            .iter()
            .map(|answer| {
                serde_json::to_string_pretty(answer).map_err(|e| RagError::DecisionError {
                    engine: "render".to_string(),
                    message: e.to_string(),
                })
            })
            .collect()
    }
}

/// Combines a [`RetrievalPipeline`] with a [`DecisionEngine`].
#[derive(Clone)]
pub struct QueryService {
    pipeline: Arc<RetrievalPipeline>,
    engine: Arc<dyn DecisionEngine>,
}

impl QueryService {
    /// Create a service from its two collaborators.
    pub fn new(pipeline: Arc<RetrievalPipeline>, engine: Arc<dyn DecisionEngine>) -> Self {
        Self { pipeline, engine }
    }

    /// The underlying retrieval pipeline.
    pub fn pipeline(&self) -> &Arc<RetrievalPipeline> {
        &self.pipeline
    }

    /// Answer every question about the document at `locator`.
    ///
    /// # Errors
    ///
    /// Propagates fatal pipeline errors (see
    /// [`RetrievalPipeline::retrieve`]) and decision engine failures.
    pub async fn answer<S: AsRef<str> + Sync>(
        &self,
        locator: &str,
        questions: &[S],
    ) -> Result<QueryOutcome> {
        let response = self.pipeline.run(locator, questions).await?;

        let answers = try_join_all(response.results.iter().map(|result| self.engine.decide(result)))
            .await
            .inspect_err(|e| error!(engine = self.engine.name(), error = %e, "decision failed"))?;

        info!(
            locator,
            engine = self.engine.name(),
            answer_count = answers.len(),
            fallback = response.origin.is_fallback(),
            "questions answered"
        );

        Ok(QueryOutcome { origin: response.origin, answers })
    }
}
