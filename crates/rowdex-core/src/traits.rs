use std::sync::Arc;

use crate::error::Result;
use crate::types::{BulkOutcome, Document};

pub trait BulkStore: Send + Sync {
    /// Declare that every index matching `index_pattern` types `geo_field` as a geo point.
    fn put_geo_template(&self, name: &str, index_pattern: &str, geo_field: &str) -> Result<()>;
    /// Write `docs` into `index` as one bulk request, without explicit ids.
    fn bulk_index(&self, index: &str, docs: &[Document]) -> Result<BulkOutcome>;
}

impl<T: BulkStore + ?Sized> BulkStore for Box<T> {
    fn put_geo_template(&self, name: &str, index_pattern: &str, geo_field: &str) -> Result<()> {
        (**self).put_geo_template(name, index_pattern, geo_field)
    }

    fn bulk_index(&self, index: &str, docs: &[Document]) -> Result<BulkOutcome> {
        (**self).bulk_index(index, docs)
    }
}

impl<T: BulkStore + ?Sized> BulkStore for Arc<T> {
    fn put_geo_template(&self, name: &str, index_pattern: &str, geo_field: &str) -> Result<()> {
        (**self).put_geo_template(name, index_pattern, geo_field)
    }

    fn bulk_index(&self, index: &str, docs: &[Document]) -> Result<BulkOutcome> {
        (**self).bulk_index(index, docs)
    }
}

/// True when `index` matches a template pattern such as `jotundata*`.
pub fn pattern_matches(pattern: &str, index: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => index.starts_with(prefix),
        None => index == pattern,
    }
}
