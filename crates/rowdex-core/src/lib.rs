#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod record_source;
pub mod traits;
pub mod transform;
pub mod types;

pub use error::{Error, Result};
pub use traits::BulkStore;
pub use transform::RecordTransformer;
pub use types::{BulkOutcome, Document, FieldValue, GeoPoint, RawRecord};
