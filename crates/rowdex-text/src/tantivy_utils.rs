use tantivy::schema::{IndexRecordOption, JsonObjectOptions, Schema, TextFieldIndexing, FAST, INDEXED, STORED};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer};
use tantivy::Index;

pub const DOC_FIELD: &str = "doc";
pub const RECORD_TOKENIZER: &str = "record_text";

pub fn lat_field_name(geo_field: &str) -> String { format!("{}_lat", geo_field) }
pub fn lon_field_name(geo_field: &str) -> String { format!("{}_lon", geo_field) }

/// Every document lives in one JSON field. Geo-typed indices also get
/// numeric lat/lon columns for range queries.
pub fn build_schema(geo_field: Option<&str>) -> Schema {
	let mut schema_builder = Schema::builder();
	let indexing = TextFieldIndexing::default().set_tokenizer(RECORD_TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let json_options = JsonObjectOptions::default().set_stored().set_indexing_options(indexing);
	let _doc_field = schema_builder.add_json_field(DOC_FIELD, json_options);
	if let Some(geo) = geo_field {
		let _lat_field = schema_builder.add_f64_field(&lat_field_name(geo), INDEXED | STORED | FAST);
		let _lon_field = schema_builder.add_f64_field(&lon_field_name(geo), INDEXED | STORED | FAST);
	}
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.build();
	index.tokenizers().register(RECORD_TOKENIZER, tokenizer);
}
