//! rowdex-bulk
//!
//! Size-bounded batching and bulk delivery of transformed documents into any
//! [`rowdex_core::traits::BulkStore`], with partial-failure accounting and
//! per-flush throughput reporting.

pub mod indexer;

pub use indexer::{BulkIndexer, FlushReport, IndexerStats};
