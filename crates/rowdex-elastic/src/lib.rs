//! rowdex-elastic
//!
//! [`rowdex_core::traits::BulkStore`] over the Elasticsearch HTTP API: legacy
//! index templates for geo typing and `_bulk` for writes.

pub mod bulk;
pub mod client;

pub use client::ElasticStore;
