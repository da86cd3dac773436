use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tantivy::schema::Field;
use tantivy::{Index, IndexWriter, TantivyDocument};
use tracing::{debug, info};

use rowdex_core::error::{Error, Result};
use rowdex_core::traits::{pattern_matches, BulkStore};
use rowdex_core::types::{BulkOutcome, Document, FieldValue, GeoPoint};

use crate::tantivy_utils::{build_schema, lat_field_name, lon_field_name, register_tokenizer, DOC_FIELD};

pub const DEFAULT_WRITER_MEMORY: usize = 50_000_000;

#[derive(Debug, Clone)]
struct GeoTemplate {
	name: String,
	pattern: String,
	geo_field: String,
}

#[derive(Clone)]
struct GeoColumns {
	source: String,
	lat: Field,
	lon: Field,
}

#[derive(Clone)]
struct OpenIndex {
	index: Index,
	geo: Option<GeoColumns>,
}

/// Embedded store: one tantivy index per index name under `root`.
///
/// Indices are created on first write. Geo templates only shape indices
/// created after they are registered.
pub struct TantivyStore {
	root: PathBuf,
	writer_memory: usize,
	templates: Mutex<Vec<GeoTemplate>>,
	indices: Mutex<HashMap<String, OpenIndex>>,
}

impl TantivyStore {
	pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
		let root = root.into();
		std::fs::create_dir_all(&root).map_err(store_err)?;
		Ok(Self { root, writer_memory: DEFAULT_WRITER_MEMORY, templates: Mutex::new(Vec::new()), indices: Mutex::new(HashMap::new()) })
	}

	pub fn with_writer_memory(mut self, bytes: usize) -> Self { self.writer_memory = bytes; self }

	/// Number of committed documents in `index`.
	pub fn doc_count(&self, index: &str) -> Result<u64> {
		let open = self.index_for(index)?;
		let reader = open.index.reader().map_err(store_err)?;
		Ok(reader.searcher().num_docs())
	}

	fn geo_field_for(&self, index: &str) -> Result<Option<String>> {
		let templates = self.templates.lock().map_err(|_| Error::Store("template registry lock poisoned".to_string()))?;
		Ok(templates.iter().rev().find(|t| pattern_matches(&t.pattern, index)).map(|t| t.geo_field.clone()))
	}

	fn index_for(&self, name: &str) -> Result<OpenIndex> {
		if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
			return Err(Error::InvalidConfig(format!("invalid index name '{}'", name)));
		}
		let mut indices = self.indices.lock().map_err(|_| Error::Store("index registry lock poisoned".to_string()))?;
		if let Some(open) = indices.get(name) { return Ok(open.clone()); }

		let geo_field = self.geo_field_for(name)?;
		let index_dir = self.root.join(name);
		let index = if index_dir.join("meta.json").exists() {
			Index::open_in_dir(&index_dir).map_err(store_err)?
		} else {
			std::fs::create_dir_all(&index_dir).map_err(store_err)?;
			info!(index = name, dir = %index_dir.display(), geo = ?geo_field, "creating tantivy index");
			Index::create_in_dir(&index_dir, build_schema(geo_field.as_deref())).map_err(store_err)?
		};
		register_tokenizer(&index);

		let schema = index.schema();
		let geo = geo_field.and_then(|g| {
			let lat = schema.get_field(&lat_field_name(&g)).ok()?;
			let lon = schema.get_field(&lon_field_name(&g)).ok()?;
			Some(GeoColumns { source: g, lat, lon })
		});
		let open = OpenIndex { index, geo };
		indices.insert(name.to_string(), open.clone());
		Ok(open)
	}

	fn to_tantivy(open: &OpenIndex, doc: &Document) -> std::result::Result<TantivyDocument, String> {
		let mut wrapper = serde_json::Map::new();
		wrapper.insert(DOC_FIELD.to_string(), serde_json::to_value(doc).map_err(|e| e.to_string())?);
		let json = serde_json::Value::Object(wrapper).to_string();
		let mut tdoc = TantivyDocument::parse_json(&open.index.schema(), &json).map_err(|e| e.to_string())?;
		if let Some(geo) = &open.geo {
			if let Some(FieldValue::Geo(point)) = doc.get(&geo.source) {
				let (lat, lon) = coerce_geo(point)?;
				tdoc.add_f64(geo.lat, lat);
				tdoc.add_f64(geo.lon, lon);
			}
		}
		Ok(tdoc)
	}
}

impl BulkStore for TantivyStore {
	fn put_geo_template(&self, name: &str, index_pattern: &str, geo_field: &str) -> Result<()> {
		let mut templates = self.templates.lock().map_err(|_| Error::Store("template registry lock poisoned".to_string()))?;
		templates.retain(|t| t.name != name);
		templates.push(GeoTemplate { name: name.to_string(), pattern: index_pattern.to_string(), geo_field: geo_field.to_string() });
		Ok(())
	}

	fn bulk_index(&self, index: &str, docs: &[Document]) -> Result<BulkOutcome> {
		let open = self.index_for(index)?;
		let mut index_writer: IndexWriter = open.index.writer(self.writer_memory).map_err(store_err)?;
		let mut outcome = BulkOutcome::default();
		for doc in docs {
			let added = Self::to_tantivy(&open, doc).and_then(|tdoc| index_writer.add_document(tdoc).map_err(|e| e.to_string()));
			match added {
				Ok(_) => outcome.succeeded += 1,
				Err(reason) => { debug!(index, %reason, "document rejected"); outcome.failed += 1; }
			}
		}
		index_writer.commit().map_err(store_err)?;
		Ok(outcome)
	}
}

/// Parse and range-check a verbatim geo point.
pub fn coerce_geo(point: &GeoPoint) -> std::result::Result<(f64, f64), String> {
	let lat: f64 = point.lat.trim().parse().map_err(|_| format!("latitude '{}' is not a number", point.lat))?;
	let lon: f64 = point.lon.trim().parse().map_err(|_| format!("longitude '{}' is not a number", point.lon))?;
	if !(-90.0..=90.0).contains(&lat) { return Err(format!("latitude {} out of range", lat)); }
	if !(-180.0..=180.0).contains(&lon) { return Err(format!("longitude {} out of range", lon)); }
	Ok((lat, lon))
}

fn store_err<E: std::fmt::Display>(e: E) -> Error { Error::Store(e.to_string()) }
