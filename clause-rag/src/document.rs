//! Data types for documents, chunks, and retrieval results.

use serde::{Deserialize, Serialize};

/// Where a [`Document`]'s text came from.
///
/// Fallback content is never interchangeable with fetched content: every
/// result derived from it carries this tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentOrigin {
    /// The text was loaded from the requested locator.
    Fetched,
    /// The locator could not be loaded and placeholder text was used instead.
    Fallback {
        /// Why the fetch failed.
        reason: String,
    },
}

impl ContentOrigin {
    /// Returns `true` for [`ContentOrigin::Fallback`].
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// A source document: raw text plus the locator it was loaded from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// URL or path the text was requested from.
    pub locator: String,
    /// The text content of the document.
    pub text: String,
    /// Whether the text is genuine or fallback content.
    pub origin: ContentOrigin,
}

impl Document {
    /// A document whose text was fetched from `locator`.
    pub fn fetched(locator: impl Into<String>, text: impl Into<String>) -> Self {
        Self { locator: locator.into(), text: text.into(), origin: ContentOrigin::Fetched }
    }

    /// A placeholder document standing in for `locator`.
    pub fn fallback(
        locator: impl Into<String>,
        text: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            locator: locator.into(),
            text: text.into(),
            origin: ContentOrigin::Fallback { reason: reason.into() },
        }
    }
}

/// A contiguous segment of a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk in document order.
    pub index: usize,
    /// Character offset of the chunk's first character in the source text.
    pub offset: usize,
    /// The text content of the chunk.
    pub text: String,
}

impl Chunk {
    /// Number of characters in the chunk.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A retrieved [`Chunk`] paired with its distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Squared Euclidean distance to the query (lower is closer).
    pub distance: f32,
}

/// Outcome of a single question's retrieval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalCondition {
    /// The index was searched and `matches` holds the nearest chunks.
    Matched,
    /// The document produced no chunks; `matches` is empty.
    NoContent,
}

/// Ranked matches for one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    /// The question as asked.
    pub question: String,
    /// Matches ordered nearest first.
    pub matches: Vec<ScoredChunk>,
    /// Whether the search ran or the document was empty.
    pub condition: RetrievalCondition,
    /// Origin of the document the matches were drawn from.
    pub origin: ContentOrigin,
}

impl RetrievalResult {
    /// An empty result for a document that produced no chunks.
    pub fn no_content(question: impl Into<String>, origin: ContentOrigin) -> Self {
        Self {
            question: question.into(),
            matches: Vec::new(),
            condition: RetrievalCondition::NoContent,
            origin,
        }
    }

    /// The nearest match, if any.
    pub fn best(&self) -> Option<&ScoredChunk> {
        self.matches.first()
    }
}

/// All results of one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResponse {
    /// The locator that was requested.
    pub locator: String,
    /// Origin of the text the results were computed from.
    pub origin: ContentOrigin,
    /// Number of chunks the document was split into.
    pub chunk_count: usize,
    /// One result per question, in question order.
    pub results: Vec<RetrievalResult>,
}
