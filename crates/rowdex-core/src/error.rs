use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed date in field '{field}': '{value}' (record: {record})")]
    MalformedDate {
        field: String,
        value: String,
        record: String,
    },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store operation failed: {0}")]
    Store(String),

    #[error("Record source error: {0}")]
    Source(String),
}

pub type Result<T> = std::result::Result<T, Error>;
