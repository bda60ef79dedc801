use thiserror::Error;

/// Convenience result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type returned by pipeline stages.
///
/// Malformed records and unparseable scalars are *not* errors: they surface as
/// [`crate::ingestion::RecordOutcome::Rejected`] and [`crate::ingestion::Parsed::Unparseable`]
/// and are dropped or nulled. Everything here aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Underlying I/O error (unreadable input, unwritable output).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited text reader error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Arrow conversion or IPC stream error.
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Options file could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stage referenced a column that is absent or has the wrong type.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// Pipeline options are out of range (zero batch size, zero arity, ...).
    #[error("invalid options: {message}")]
    InvalidOptions { message: String },

    /// The table is too long for a 32-bit row index.
    #[error("row count {rows} does not fit in a uint32 index")]
    RowCountOverflow { rows: usize },

    /// A dictionary column has more distinct values than int32 codes can address.
    #[error("dictionary with {values} values does not fit in int32 codes")]
    DictionaryOverflow { values: usize },
}

impl PipelineError {
    pub(crate) fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }
}
