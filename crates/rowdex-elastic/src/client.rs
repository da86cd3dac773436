use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::json;
use tracing::debug;

use rowdex_core::config::ElasticSettings;
use rowdex_core::error::{Error, Result};
use rowdex_core::traits::BulkStore;
use rowdex_core::types::{BulkOutcome, Document};

use crate::bulk::{render_bulk_body, BulkResponse};

/// Blocking Elasticsearch client. Every request is bounded by the configured
/// timeout; a timeout or refused connection surfaces as `StoreUnavailable`.
pub struct ElasticStore {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl ElasticStore {
    pub fn new(settings: &ElasticSettings) -> Result<Self> {
        if settings.url.trim().is_empty() {
            return Err(Error::InvalidConfig("store.elastic.url must not be empty".to_string()));
        }
        let mut builder = Client::builder();
        if settings.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(settings.timeout_secs));
        }
        let client = builder.build().map_err(|e| Error::InvalidConfig(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let rb = self.client.request(method, format!("{}/{}", self.base_url, path));
        match &self.username {
            Some(user) => rb.basic_auth(user, self.password.as_ref()),
            None => rb,
        }
    }

    fn send(&self, stage: &'static str, rb: RequestBuilder) -> Result<Response> {
        let response = rb.send().map_err(|e| request_error(stage, &e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Store(format!("{} returned HTTP {}: {}", stage, status.as_u16(), body)));
        }
        Ok(response)
    }
}

impl BulkStore for ElasticStore {
    fn put_geo_template(&self, name: &str, index_pattern: &str, geo_field: &str) -> Result<()> {
        let template = json!({
            "index_patterns": [index_pattern],
            "mappings": { "properties": { geo_field: { "type": "geo_point" } } },
        });
        self.send("put_template", self.request(Method::PUT, &format!("_template/{}", name)).json(&template))?;
        Ok(())
    }

    fn bulk_index(&self, index: &str, docs: &[Document]) -> Result<BulkOutcome> {
        if docs.is_empty() {
            return Ok(BulkOutcome::default());
        }
        let body = render_bulk_body(index, docs).map_err(|e| Error::Store(format!("render bulk body: {}", e)))?;
        let rb = self.request(Method::POST, "_bulk").header(CONTENT_TYPE, "application/x-ndjson").body(body);
        let response: BulkResponse = self
            .send("bulk", rb)?
            .json()
            .map_err(|e| request_error("bulk response", &e))?;
        for (position, item) in response.failures() {
            debug!(index, position, status = item.status, error = ?item.error, "bulk item failed");
        }
        Ok(response.outcome(docs.len()))
    }
}

fn request_error(stage: &str, e: &reqwest::Error) -> Error {
    if e.is_timeout() || e.is_connect() {
        Error::StoreUnavailable(format!("{}: {}", stage, e))
    } else {
        Error::Store(format!("{}: {}", stage, e))
    }
}
