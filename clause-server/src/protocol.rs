use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/hackrx/run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// Locator of the policy document (URL or path).
    pub documents: String,
    /// Natural-language questions about the document.
    pub questions: Vec<String>,
}

/// One answer per question, in question order. Each answer is the
/// pretty-printed JSON form of a [`clause_rag::Answer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
