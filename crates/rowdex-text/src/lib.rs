//! rowdex-text
//!
//! Embedded tantivy-backed [`rowdex_core::traits::BulkStore`]. Each index name
//! maps to an on-disk tantivy index holding documents in a JSON field, with
//! numeric geo columns for indices covered by a geo template.

pub mod tantivy_utils;
pub mod store;

pub use store::TantivyStore;
