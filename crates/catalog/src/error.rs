use thiserror::Error;

/// Errors produced while validating or loading catalog records.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A required field was empty after sanitization.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field exceeded its configured byte limit.
    #[error("field `{field}` too large: {actual} bytes (limit {limit})")]
    FieldTooLarge {
        field: &'static str,
        limit: usize,
        actual: usize,
    },

    /// A catalog dump line was not valid JSON for a product record.
    #[error("invalid record on line {line}: {source}")]
    InvalidLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Reading the catalog dump failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
