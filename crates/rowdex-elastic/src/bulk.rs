//! `_bulk` request rendering and response accounting.

use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use rowdex_core::types::{BulkOutcome, Document};

/// NDJSON body: one `index` action line plus one source line per document,
/// newline-terminated.
pub fn render_bulk_body(index: &str, docs: &[Document]) -> serde_json::Result<String> {
    let action = json!({ "index": { "_index": index } }).to_string();
    let mut body = String::new();
    for doc in docs {
        body.push_str(&action);
        body.push('\n');
        body.push_str(&doc.to_json()?);
        body.push('\n');
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
pub struct BulkItem {
    pub status: u16,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl BulkItem {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) && self.error.is_none() }
}

impl BulkResponse {
    /// Count successes; anything not reported as a 2xx item counts as failed.
    pub fn outcome(&self, submitted: usize) -> BulkOutcome {
        let succeeded = self
            .items
            .iter()
            .flat_map(|item| item.values())
            .filter(|result| result.is_success())
            .count()
            .min(submitted);
        BulkOutcome::new(succeeded, submitted - succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &BulkItem)> {
        self.items
            .iter()
            .enumerate()
            .flat_map(|(i, item)| item.values().map(move |r| (i, r)))
            .filter(|(_, r)| !r.is_success())
    }
}
