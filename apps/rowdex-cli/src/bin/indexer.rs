use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rowdex_bulk::BulkIndexer;
use rowdex_core::config::{expand_path, Config, Settings, StoreKind};
use rowdex_core::record_source::{list_csv_files, CsvRecordSource};
use rowdex_core::traits::BulkStore;
use rowdex_core::{Error, RecordTransformer};
use rowdex_elastic::ElasticStore;
use rowdex_text::TantivyStore;

struct Args {
    path: Option<PathBuf>,
    batch_size: Option<usize>,
    store: Option<StoreKind>,
    skip_malformed: bool,
}

fn usage_exit(msg: &str) -> ! {
    eprintln!("Error: {}", msg);
    eprintln!("Usage: rowdex-indexer [path] [--batch-size N] [--store elastic|tantivy] [--skip-malformed]");
    std::process::exit(1)
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut parsed = Args { path: None, batch_size: None, store: None, skip_malformed: false };
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--batch-size" | "-b" => {
                let n = args.get(i + 1).and_then(|v| v.parse::<usize>().ok()).filter(|n| *n > 0);
                parsed.batch_size = Some(n.unwrap_or_else(|| usage_exit("--batch-size requires a positive number")));
                i += 1;
            }
            "--store" => {
                let kind = args.get(i + 1).and_then(|v| v.parse::<StoreKind>().ok());
                parsed.store = Some(kind.unwrap_or_else(|| usage_exit("--store requires 'elastic' or 'tantivy'")));
                i += 1;
            }
            "--skip-malformed" => parsed.skip_malformed = true,
            other if !other.starts_with('-') => parsed.path = Some(expand_path(other)),
            other => usage_exit(&format!("unknown flag {}", other)),
        }
        i += 1;
    }
    parsed
}

fn open_store(settings: &Settings) -> anyhow::Result<Box<dyn BulkStore>> {
    Ok(match settings.store.kind {
        StoreKind::Elastic => {
            info!(url = %settings.store.elastic.url, "using elasticsearch store");
            Box::new(ElasticStore::new(&settings.store.elastic)?)
        }
        StoreKind::Tantivy => {
            let dir = expand_path(&settings.store.tantivy.index_dir);
            info!(dir = %dir.display(), "using tantivy store");
            Box::new(TantivyStore::open(dir)?.with_writer_memory(settings.store.tantivy.writer_memory_bytes))
        }
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let mut settings = config.settings()?;
    let args = parse_args();
    if let Some(n) = args.batch_size { settings.indexer.batch_size = n; }
    if let Some(kind) = args.store { settings.store.kind = kind; }
    let data_path = args.path.unwrap_or_else(|| expand_path(&settings.source.path));

    let files = list_csv_files(&data_path);
    if files.is_empty() {
        return Err(anyhow!("no .csv files found under {}", data_path.display()));
    }

    let store = open_store(&settings)?;
    let mut indexer = BulkIndexer::new(store, settings.indexer.clone()).context("initializing bulk indexer")?;
    let transformer = RecordTransformer::from_settings(&settings.transform);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} records {msg}")?);

    let mut skipped = 0usize;
    'files: for file in &files {
        info!("Reading file: {}", file.display());
        let source = CsvRecordSource::open(file)?;
        for record in source {
            let record = record.with_context(|| format!("reading {}", file.display()))?;
            pb.inc(1);
            let doc = match transformer.transform(&record) {
                Ok(doc) => doc,
                Err(e @ Error::MalformedDate { .. }) if args.skip_malformed => {
                    warn!(error = %e, "skipping malformed record");
                    skipped += 1;
                    continue;
                }
                Err(e) => {
                    pb.abandon();
                    let stats = indexer.close();
                    error!(total_indexed = stats.total_indexed, "aborting on malformed record");
                    return Err(e).with_context(|| format!("transforming record from {}", file.display()));
                }
            };
            if let Some(report) = pb.suspend(|| indexer.add(doc)) {
                pb.set_message(format!("| {} indexed, {:.2} docs/s", report.total_indexed, report.docs_per_sec));
                if indexer.should_abort() {
                    error!(consecutive_failures = indexer.stats().consecutive_failures, "too many consecutive failed flushes; stopping");
                    break 'files;
                }
            }
        }
    }

    let aborted = indexer.should_abort();
    let stats = pb.suspend(|| indexer.close());
    pb.finish_with_message("done");

    println!("\n✅ Indexing finished");
    println!("📊 Indexed {} documents into '{}' ({} failed, {} flushes)", stats.total_indexed, settings.indexer.index, stats.total_failed, stats.flushes);
    if skipped > 0 { println!("⚠️  Skipped {} malformed records", skipped); }
    if aborted {
        return Err(anyhow!("stopped after {} consecutive failed flushes", stats.consecutive_failures));
    }
    Ok(())
}
