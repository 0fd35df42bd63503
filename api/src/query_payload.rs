use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct QueryPayload {
    #[serde(default)]
    pub query: Option<String>,
}

impl QueryPayload {
    /// The query from a raw request body, if present and non-empty.
    pub fn query_from_body(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<QueryPayload>(body)
            .ok()
            .and_then(|payload| payload.query)
            .filter(|query| !query.is_empty())
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub corpus: &'static str,
    pub corpus_length: Option<usize>,
    pub documents: Vec<String>,
}
