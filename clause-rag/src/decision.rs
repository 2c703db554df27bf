//! Decision engines that turn a retrieval result into a structured answer.
//!
//! A [`DecisionEngine`] receives the typed [`RetrievalResult`] for one
//! question. Which engine runs is chosen by a [`DecisionPolicy`], normally
//! read from configuration:
//!
//! ```json
//! { "policy": "keyword_rules", "reject_terms": ["1-month", "cosmetic"] }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{RetrievalCondition, RetrievalResult};
use crate::error::Result;

/// Number of characters of the matched chunk quoted in [`Answer::source`].
pub const SOURCE_EXCERPT_CHARS: usize = 150;

/// The verdict of a decision engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Decision {
    /// The request is covered.
    Approved,
    /// The request is not covered.
    Rejected,
    /// The engine could not decide from the retrieved text.
    Undetermined,
}

/// A structured answer to one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    /// The verdict.
    pub decision: Decision,
    /// Why the engine reached its verdict.
    pub justification: String,
    /// Payable amount, when one applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Excerpt of the clause the answer is based on.
    pub source: String,
    /// Set when the clause came from fallback text rather than the document.
    pub fallback: bool,
}

/// Quote the nearest chunk of `result`, or nothing if there is none.
pub fn source_excerpt(result: &RetrievalResult) -> String {
    result
        .best()
        .map(|m| {
            let excerpt: String = m.chunk.text.chars().take(SOURCE_EXCERPT_CHARS).collect();
            format!("{excerpt}...")
        })
        .unwrap_or_default()
}

/// Produces an [`Answer`] for a question from its retrieval result.
#[async_trait]
pub trait DecisionEngine: Send + Sync {
    /// Short engine name used in logs and errors.
    fn name(&self) -> &str;

    /// Decide `result.question` from the chunks in `result`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DecisionError`](crate::RagError::DecisionError)
    /// if the engine's backend fails.
    async fn decide(&self, result: &RetrievalResult) -> Result<Answer>;
}

fn no_content_answer(result: &RetrievalResult) -> Answer {
    Answer {
        decision: Decision::Undetermined,
        justification: "The document contained no text to evaluate this question against."
            .to_string(),
        amount: None,
        source: String::new(),
        fallback: result.origin.is_fallback(),
    }
}

/// Rule-based engine: rejects questions mentioning any configured term.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeywordRules {
    /// Case-insensitive terms that make a question rejected.
    pub reject_terms: Vec<String>,
    /// Justification given for approved questions.
    pub approved_justification: String,
    /// Justification given for rejected questions.
    pub rejected_justification: String,
    /// Amount reported for approved questions.
    pub covered_amount: Option<String>,
}

impl Default for KeywordRules {
    fn default() -> Self {
        Self {
            reject_terms: vec!["1-month".to_string(), "cosmetic".to_string()],
            approved_justification: "Clause: This treatment is eligible under the policy terms."
                .to_string(),
            rejected_justification:
                "Clause: Surgery is covered only after 90 days waiting period.".to_string(),
            covered_amount: Some("₹50,000".to_string()),
        }
    }
}

#[async_trait]
impl DecisionEngine for KeywordRules {
    fn name(&self) -> &str {
        "keyword_rules"
    }

    async fn decide(&self, result: &RetrievalResult) -> Result<Answer> {
        if result.condition == RetrievalCondition::NoContent {
            return Ok(no_content_answer(result));
        }

        let question = result.question.to_lowercase();
        let rejected =
            self.reject_terms.iter().any(|term| question.contains(&term.to_lowercase()));

        let (decision, justification, amount) = if rejected {
            (Decision::Rejected, self.rejected_justification.clone(), None)
        } else {
            (Decision::Approved, self.approved_justification.clone(), self.covered_amount.clone())
        };

        Ok(Answer {
            decision,
            justification,
            amount,
            source: source_excerpt(result),
            fallback: result.origin.is_fallback(),
        })
    }
}

/// Engine that makes no verdict and only quotes the nearest clause.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExcerptOnly;

#[async_trait]
impl DecisionEngine for ExcerptOnly {
    fn name(&self) -> &str {
        "excerpt_only"
    }

    async fn decide(&self, result: &RetrievalResult) -> Result<Answer> {
        if result.condition == RetrievalCondition::NoContent {
            return Ok(no_content_answer(result));
        }
        Ok(Answer {
            decision: Decision::Undetermined,
            justification: "See the quoted clause.".to_string(),
            amount: None,
            source: source_excerpt(result),
            fallback: result.origin.is_fallback(),
        })
    }
}

/// Which [`DecisionEngine`] to run, as selected by configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DecisionPolicy {
    /// See [`KeywordRules`].
    KeywordRules(KeywordRules),
    /// See [`ExcerptOnly`].
    ExcerptOnly,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::KeywordRules(KeywordRules::default())
    }
}

impl DecisionPolicy {
    /// Instantiate the engine this policy names.
    pub fn engine(&self) -> Arc<dyn DecisionEngine> {
        match self {
            Self::KeywordRules(rules) => Arc::new(rules.clone()),
            Self::ExcerptOnly => Arc::new(ExcerptOnly),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Chunk, ContentOrigin, ScoredChunk};

    fn matched(question: &str, text: &str, origin: ContentOrigin) -> RetrievalResult {
        RetrievalResult {
            question: question.to_string(),
            matches: vec![ScoredChunk {
                chunk: Chunk { index: 0, offset: 0, text: text.to_string() },
                distance: 0.5,
            }],
            condition: RetrievalCondition::Matched,
            origin,
        }
    }

    #[tokio::test]
    async fn reject_terms_drive_the_verdict() {
        let engine = KeywordRules::default();
        let result = matched(
            "Is cataract surgery covered after 1-month?",
            "Cataract surgery has a 2-year waiting period.",
            ContentOrigin::Fetched,
        );
        let answer = engine.decide(&result).await.unwrap();
        assert_eq!(answer.decision, Decision::Rejected);
        assert_eq!(answer.amount, None);
        assert_eq!(answer.source, "Cataract surgery has a 2-year waiting period....");
        assert!(!answer.fallback);
    }

    #[tokio::test]
    async fn approved_answers_carry_the_amount() {
        let engine = KeywordRules::default();
        let result = matched("Is knee surgery covered?", "Knee surgery is covered.", ContentOrigin::Fetched);
        let answer = engine.decide(&result).await.unwrap();
        assert_eq!(answer.decision, Decision::Approved);
        assert_eq!(answer.amount.as_deref(), Some("₹50,000"));
    }

    #[tokio::test]
    async fn fallback_origin_is_reported() {
        let origin = ContentOrigin::Fallback { reason: "unreachable".to_string() };
        let answer = ExcerptOnly.decide(&matched("q", "text", origin)).await.unwrap();
        assert!(answer.fallback);
        assert_eq!(answer.decision, Decision::Undetermined);
    }

    #[tokio::test]
    async fn no_content_is_undetermined() {
        let result = RetrievalResult::no_content("anything?", ContentOrigin::Fetched);
        let answer = KeywordRules::default().decide(&result).await.unwrap();
        assert_eq!(answer.decision, Decision::Undetermined);
        assert!(answer.source.is_empty());
    }

    #[test]
    fn excerpt_is_capped() {
        let long = "x".repeat(400);
        let excerpt = source_excerpt(&matched("q", &long, ContentOrigin::Fetched));
        assert_eq!(excerpt.chars().count(), SOURCE_EXCERPT_CHARS + 3);
    }

    #[test]
    fn policy_parses_from_tagged_json() {
        let policy: DecisionPolicy =
            serde_json::from_str(r#"{ "policy": "keyword_rules", "reject_terms": ["dental"] }"#)
                .unwrap();
        match policy {
            DecisionPolicy::KeywordRules(rules) => {
                assert_eq!(rules.reject_terms, vec!["dental"]);
                assert_eq!(rules.covered_amount.as_deref(), Some("₹50,000"));
            }
            other => panic!("unexpected policy {other:?}"),
        }

        let policy: DecisionPolicy = serde_json::from_str(r#"{ "policy": "excerpt_only" }"#).unwrap();
        assert_eq!(policy.engine().name(), "excerpt_only");
    }
}
