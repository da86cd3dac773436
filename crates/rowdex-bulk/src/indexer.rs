use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use rowdex_core::config::IndexerSettings;
use rowdex_core::error::{Error, Result};
use rowdex_core::traits::BulkStore;
use rowdex_core::types::{BulkOutcome, Document};

/// Cumulative counters over the indexer's lifetime. Never reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexerStats {
    pub total_indexed: u64,
    pub total_failed: u64,
    pub flushes: u64,
    pub consecutive_failures: u32,
}

/// What a single flush did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlushReport {
    pub succeeded: usize,
    pub failed: usize,
    pub total_indexed: u64,
    pub docs_per_sec: f64,
    pub elapsed: Duration,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool { self.failed == 0 }
}

/// Accumulates documents and writes them to a [`BulkStore`] in batches of at
/// most `batch_size`.
///
/// Single-producer and synchronous: `add` blocks for the duration of the bulk
/// write whenever it fills the batch. Wrap it in a mutex to share it.
pub struct BulkIndexer<S: BulkStore> {
    store: S,
    settings: IndexerSettings,
    batch: Vec<Document>,
    stats: IndexerStats,
    window_start: Instant,
}

impl<S: BulkStore> BulkIndexer<S> {
    /// Validates the settings and provisions the geo template before any
    /// document can reach the store.
    pub fn new(store: S, settings: IndexerSettings) -> Result<Self> {
        if settings.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".to_string()));
        }
        let pattern = settings.effective_template_pattern();
        store.put_geo_template(&settings.template_name, &pattern, &settings.geo_field)?;
        info!(template = %settings.template_name, pattern = %pattern, geo_field = %settings.geo_field, "geo template provisioned");
        Ok(Self {
            batch: Vec::with_capacity(settings.batch_size),
            store,
            settings,
            stats: IndexerStats::default(),
            window_start: Instant::now(),
        })
    }

    /// Buffer `doc`; flushes synchronously once the batch reaches `batch_size`.
    pub fn add(&mut self, doc: Document) -> Option<FlushReport> {
        debug!(index = %self.settings.index, fields = doc.len(), "appending doc");
        self.batch.push(doc);
        if self.batch.len() >= self.settings.batch_size {
            return self.flush();
        }
        None
    }

    /// Submit the buffered batch as one bulk write. No-op when empty.
    ///
    /// The batch is discarded whatever the outcome; failed documents are not
    /// retried. A store error counts the whole batch as failed.
    pub fn flush(&mut self) -> Option<FlushReport> {
        if self.batch.is_empty() {
            return None;
        }
        let batch = std::mem::replace(&mut self.batch, Vec::with_capacity(self.settings.batch_size));

        let outcome = match self.store.bulk_index(&self.settings.index, &batch) {
            Ok(outcome) if outcome.total() == batch.len() => outcome,
            Ok(outcome) => {
                warn!(reported = outcome.total(), documents = batch.len(), "store reported a mismatched item count");
                let succeeded = outcome.succeeded.min(batch.len());
                BulkOutcome::new(succeeded, batch.len() - succeeded)
            }
            Err(e) => {
                warn!(error = %e, documents = batch.len(), "bulk write failed; counting batch as failed");
                BulkOutcome::all_failed(batch.len())
            }
        };

        let elapsed = self.window_start.elapsed();
        let secs = elapsed.as_secs_f64();
        let docs_per_sec = if secs > 0.0 { outcome.succeeded as f64 / secs } else { 0.0 };

        // Documents that persisted are credited even when others in the batch failed.
        self.stats.total_indexed += outcome.succeeded as u64;
        self.stats.total_failed += outcome.failed as u64;
        self.stats.flushes += 1;

        if outcome.failed == 0 {
            self.stats.consecutive_failures = 0;
            info!(
                succeeded = outcome.succeeded,
                failed = 0,
                total_indexed = self.stats.total_indexed,
                docs_per_sec,
                "Indexed successful {} documents - Total documents indexed {} - {:.2} docs/s",
                outcome.succeeded,
                self.stats.total_indexed,
                docs_per_sec
            );
        } else {
            self.stats.consecutive_failures += 1;
            error!(
                succeeded = outcome.succeeded,
                failed = outcome.failed,
                total_indexed = self.stats.total_indexed,
                docs_per_sec,
                "Indexing error with {} documents, successful indexed {} documents",
                outcome.failed,
                outcome.succeeded
            );
        }

        self.window_start = Instant::now();
        Some(FlushReport {
            succeeded: outcome.succeeded,
            failed: outcome.failed,
            total_indexed: self.stats.total_indexed,
            docs_per_sec,
            elapsed,
        })
    }

    /// Drain the trailing batch and return the final counters.
    pub fn close(mut self) -> IndexerStats {
        self.flush();
        self.stats
    }

    /// True once `max_consecutive_failures` flushes in a row reported failures.
    pub fn should_abort(&self) -> bool {
        let limit = self.settings.max_consecutive_failures;
        limit > 0 && self.stats.consecutive_failures >= limit
    }

    pub fn total_indexed(&self) -> u64 { self.stats.total_indexed }

    pub fn stats(&self) -> IndexerStats { self.stats }

    pub fn buffered(&self) -> usize { self.batch.len() }

    pub fn batch_size(&self) -> usize { self.settings.batch_size }

    pub fn store(&self) -> &S { &self.store }
}

impl<S: BulkStore> Drop for BulkIndexer<S> {
    fn drop(&mut self) {
        if !self.batch.is_empty() {
            warn!(buffered = self.batch.len(), "indexer dropped without close; flushing buffered documents");
            self.flush();
        }
    }
}
