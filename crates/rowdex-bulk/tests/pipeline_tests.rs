use rowdex_bulk::BulkIndexer;
use rowdex_core::config::IndexerSettings;
use rowdex_core::record_source::CsvRecordSource;
use rowdex_core::RecordTransformer;
use rowdex_text::TantivyStore;

const ALERTS: &str = "\
Vessel,Alert Type,ETA,Final Date,Initial Date,Latitude,Longitude
Hull 1,fouling,2017-11-11 17:00:00,,2017-10-01 00:00:00,10.5,-20.3
Hull 2,idle,,2018-01-02 03:04:05,,11.0,21.0
Hull 3,fouling,2017-12-24 08:30:00,,,north,21.0
Hull 4,speed,,,,-45.0,100.25
Hull 5,idle,,,,0,0
";

#[test]
fn csv_to_tantivy_in_small_batches() {
    let tmp = tempfile::tempdir().expect("tmp");
    let store = TantivyStore::open(tmp.path()).expect("store");
    let settings = IndexerSettings { batch_size: 2, ..IndexerSettings::default() };
    let mut indexer = BulkIndexer::new(store, settings).expect("indexer");
    let transformer = RecordTransformer::new();

    let mut flushes = 0;
    for record in CsvRecordSource::from_reader(ALERTS.as_bytes()).expect("source") {
        let doc = transformer.transform(&record.expect("record")).expect("transform");
        if indexer.add(doc).is_some() {
            flushes += 1;
        }
    }
    assert_eq!(flushes, 2);
    assert_eq!(indexer.buffered(), 1);
    assert!(indexer.flush().is_some());

    // Hull 3 has a non-numeric latitude and is rejected by the geo-typed index.
    let stats = indexer.stats();
    assert_eq!(stats.total_indexed, 4);
    assert_eq!(stats.total_failed, 1);
    assert_eq!(indexer.store().doc_count("jotundata").expect("count"), 4);

    let final_stats = indexer.close();
    assert_eq!(final_stats, stats, "close after an explicit flush is a no-op");
}
