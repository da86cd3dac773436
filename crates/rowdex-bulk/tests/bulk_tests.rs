use std::collections::VecDeque;
use std::sync::Mutex;

use rowdex_bulk::BulkIndexer;
use rowdex_core::config::IndexerSettings;
use rowdex_core::error::{Error, Result};
use rowdex_core::traits::BulkStore;
use rowdex_core::types::{BulkOutcome, Document, FieldValue};

/// Records every call; replays scripted outcomes, then succeeds for everything.
#[derive(Default)]
struct ScriptedStore {
    script: Mutex<VecDeque<Result<BulkOutcome>>>,
    batches: Mutex<Vec<(String, Vec<Document>)>>,
    templates: Mutex<Vec<(String, String, String)>>,
}

impl ScriptedStore {
    fn with_script(script: Vec<Result<BulkOutcome>>) -> Self {
        Self { script: Mutex::new(script.into()), ..Self::default() }
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(|(_, docs)| docs.len()).collect()
    }
}

impl BulkStore for ScriptedStore {
    fn put_geo_template(&self, name: &str, index_pattern: &str, geo_field: &str) -> Result<()> {
        self.templates.lock().unwrap().push((name.to_string(), index_pattern.to_string(), geo_field.to_string()));
        Ok(())
    }

    fn bulk_index(&self, index: &str, docs: &[Document]) -> Result<BulkOutcome> {
        assert!(!self.templates.lock().unwrap().is_empty(), "template must be provisioned before the first flush");
        self.batches.lock().unwrap().push((index.to_string(), docs.to_vec()));
        match self.script.lock().unwrap().pop_front() {
            Some(scripted) => scripted,
            None => Ok(BulkOutcome::new(docs.len(), 0)),
        }
    }
}

fn settings(batch_size: usize) -> IndexerSettings {
    IndexerSettings { batch_size, ..IndexerSettings::default() }
}

fn doc(i: usize) -> Document {
    let mut d = Document::new();
    d.insert("seq", FieldValue::Text(i.to_string()));
    d
}

#[test]
fn capacity_triggers_floor_n_over_b_flushes() {
    for (n, b) in [(0usize, 3usize), (2, 3), (3, 3), (10, 3), (12, 4), (7, 1)] {
        let mut indexer = BulkIndexer::new(ScriptedStore::default(), settings(b)).expect("indexer");
        let mut triggered = 0;
        for i in 0..n {
            if indexer.add(doc(i)).is_some() {
                triggered += 1;
            }
            assert!(indexer.buffered() < b, "buffer never observed at or above capacity");
        }
        assert_eq!(triggered, n / b, "n={} b={}", n, b);
        assert_eq!(indexer.buffered(), n % b);
        assert!(indexer.store().batch_sizes().iter().all(|&len| len == b));
    }
}

#[test]
fn close_drains_trailing_batch_and_conserves_counts() {
    let store = ScriptedStore::with_script(vec![
        Ok(BulkOutcome::new(4, 1)),
        Err(Error::StoreUnavailable("connection refused".to_string())),
    ]);
    let mut indexer = BulkIndexer::new(store, settings(5)).expect("indexer");
    let mut reported_success = 0u64;
    for i in 0..13 {
        if let Some(report) = indexer.add(doc(i)) {
            reported_success += report.succeeded as u64;
        }
    }
    assert_eq!(indexer.buffered(), 3);
    if let Some(report) = indexer.flush() {
        reported_success += report.succeeded as u64;
    }
    assert_eq!(indexer.store().batch_sizes(), vec![5, 5, 3]);
    let stats = indexer.close();
    // 4 from the partial batch, 0 from the unavailable one, 3 from the tail
    assert_eq!(stats.total_indexed, 7);
    assert_eq!(stats.total_indexed, reported_success);
    assert_eq!(stats.total_failed, 6);
    assert_eq!(stats.flushes, 3);
}

#[test]
fn close_flushes_exactly_once_more() {
    let mut indexer = BulkIndexer::new(ScriptedStore::default(), settings(10)).expect("indexer");
    for i in 0..4 {
        indexer.add(doc(i));
    }
    let stats = indexer.close();
    assert_eq!(stats.total_indexed, 4);
    assert_eq!(stats.flushes, 1);
}

#[test]
fn empty_flush_is_a_noop() {
    let mut indexer = BulkIndexer::new(ScriptedStore::default(), settings(10)).expect("indexer");
    assert!(indexer.flush().is_none());
    assert!(indexer.flush().is_none());
    assert_eq!(indexer.total_indexed(), 0);
    assert_eq!(indexer.stats().flushes, 0);
    assert!(indexer.store().batch_sizes().is_empty());
}

#[test]
fn partial_failure_credits_persisted_documents() {
    let store = ScriptedStore::with_script(vec![Ok(BulkOutcome::new(997, 3))]);
    let mut indexer = BulkIndexer::new(store, settings(1000)).expect("indexer");
    let mut report = None;
    for i in 0..1000 {
        report = indexer.add(doc(i));
    }
    let report = report.expect("the 1000th add flushes");
    assert_eq!(report.succeeded, 997);
    assert_eq!(report.failed, 3);
    assert!(!report.is_clean());
    assert_eq!(report.total_indexed, 997);
    assert_eq!(indexer.total_indexed(), 997);
    assert_eq!(indexer.buffered(), 0);
}

#[test]
fn store_error_counts_whole_batch_as_failed() {
    let store = ScriptedStore::with_script(vec![Err(Error::StoreUnavailable("timed out".to_string()))]);
    let mut indexer = BulkIndexer::new(store, settings(2)).expect("indexer");
    indexer.add(doc(0));
    let report = indexer.add(doc(1)).expect("flush");
    assert_eq!((report.succeeded, report.failed), (0, 2));
    assert_eq!(indexer.buffered(), 0);
    // the pipeline keeps going
    indexer.add(doc(2));
    let report = indexer.add(doc(3)).expect("flush");
    assert!(report.is_clean());
    assert_eq!(indexer.total_indexed(), 2);
}

#[test]
fn mismatched_store_counts_are_normalized() {
    let store = ScriptedStore::with_script(vec![Ok(BulkOutcome::new(1, 0))]);
    let mut indexer = BulkIndexer::new(store, settings(3)).expect("indexer");
    indexer.add(doc(0));
    indexer.add(doc(1));
    let report = indexer.add(doc(2)).expect("flush");
    assert_eq!((report.succeeded, report.failed), (1, 2));
}

#[test]
fn consecutive_failures_drive_abort_policy() {
    let store = ScriptedStore::with_script(vec![
        Ok(BulkOutcome::new(0, 1)),
        Ok(BulkOutcome::new(0, 1)),
    ]);
    let mut indexer = BulkIndexer::new(store, IndexerSettings { max_consecutive_failures: 2, ..settings(1) }).expect("indexer");
    indexer.add(doc(0));
    assert!(!indexer.should_abort());
    indexer.add(doc(1));
    assert!(indexer.should_abort());
    indexer.add(doc(2));
    assert!(!indexer.should_abort(), "a clean flush resets the streak");
    assert_eq!(indexer.stats().consecutive_failures, 0);
}

#[test]
fn template_is_provisioned_at_construction() {
    let indexer = BulkIndexer::new(ScriptedStore::default(), settings(10)).expect("indexer");
    let templates = indexer.store().templates.lock().unwrap().clone();
    assert_eq!(templates, vec![("jotundata".to_string(), "jotundata*".to_string(), "location".to_string())]);
}

#[test]
fn documents_go_to_the_configured_index_in_order() {
    let mut indexer = BulkIndexer::new(ScriptedStore::default(), IndexerSettings { index: "alerts-2024".to_string(), ..settings(3) }).expect("indexer");
    for i in 0..3 {
        indexer.add(doc(i));
    }
    let batches = indexer.store().batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].0, "alerts-2024");
    let seqs: Vec<_> = batches[0].1.iter().map(|d| d.get("seq").and_then(FieldValue::as_str).unwrap_or_default().to_string()).collect();
    assert_eq!(seqs, vec!["0", "1", "2"]);
}

#[test]
fn zero_batch_size_is_rejected() {
    assert!(matches!(BulkIndexer::new(ScriptedStore::default(), settings(0)), Err(Error::InvalidConfig(_))));
}

#[test]
fn dropping_without_close_flushes_buffered_documents() {
    let store = std::sync::Arc::new(ScriptedStore::default());
    {
        let mut indexer = BulkIndexer::new(store.clone(), settings(10)).expect("indexer");
        for i in 0..3 {
            assert!(indexer.add(doc(i)).is_none());
        }
        assert_eq!(indexer.buffered(), 3);
    }
    assert_eq!(store.batch_sizes(), vec![3]);
}
