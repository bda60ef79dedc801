use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::artifact::DEFAULT_BATCH_SIZE;
use crate::error::{PipelineError, PipelineResult};
use crate::ingestion::TsvOptions;
use crate::types::{DataType, Field, Schema};

use super::observability::{PipelineObserver, PipelineSeverity};

/// Options controlling a pipeline run.
///
/// Use [`Default`] for the standard conversion: 9-field tab-separated input, a 101-character
/// title limit, ascending `date` order and 10,000-row batches.
///
/// Everything except the observer settings can be loaded from JSON; missing keys keep their
/// defaults.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// How raw lines are filtered and split.
    pub tsv: TsvOptions,
    /// Declared column types. Input columns not listed here are read as text.
    pub input_schema: Schema,
    /// Columns kept in the artifact, in artifact order.
    pub output_columns: Vec<String>,
    /// Text column cut to `max_title_chars` characters.
    pub title_column: String,
    /// Maximum title length, in characters.
    pub max_title_chars: usize,
    /// Sort key; rows where it is null are dropped.
    pub date_column: String,
    /// Column overwritten with each row's output position.
    pub index_column: String,
    /// Maximum rows per record batch.
    pub batch_size: usize,
    /// Optional observer for logging/alerts.
    #[serde(skip)]
    pub observer: Option<Arc<dyn PipelineObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    #[serde(skip)]
    pub alert_at_or_above: PipelineSeverity,
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("tsv", &self.tsv)
            .field("input_schema", &self.input_schema)
            .field("output_columns", &self.output_columns)
            .field("title_column", &self.title_column)
            .field("max_title_chars", &self.max_title_chars)
            .field("date_column", &self.date_column)
            .field("index_column", &self.index_column)
            .field("batch_size", &self.batch_size)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            tsv: TsvOptions::default(),
            input_schema: Schema::new(vec![
                Field::new("ix", DataType::UInt32),
                Field::new("x", DataType::Float32),
                Field::new("y", DataType::Float32),
                Field::new("title", DataType::Utf8),
                Field::new("first_author_name", DataType::Utf8),
                Field::new("date", DataType::UInt32),
                Field::new("language", DataType::Dictionary),
            ]),
            output_columns: ["ix", "x", "y", "title", "first_author_name", "date", "language"]
                .map(String::from)
                .to_vec(),
            title_column: "title".to_string(),
            max_title_chars: 101,
            date_column: "date".to_string(),
            index_column: "ix".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            observer: None,
            alert_at_or_above: PipelineSeverity::Critical,
        }
    }
}

impl PipelineOptions {
    /// Parse options from a JSON document.
    pub fn from_json_str(json: &str) -> PipelineResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Read options from a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check that numeric settings are in range.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.batch_size == 0 {
            return Err(invalid("batch_size must be > 0"));
        }
        if self.tsv.expected_arity == 0 {
            return Err(invalid("expected_arity must be > 0"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> PipelineError {
    PipelineError::InvalidOptions {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_standard_conversion() {
        let o = PipelineOptions::default();
        assert_eq!(o.tsv.delimiter, b'\t');
        assert_eq!(o.tsv.expected_arity, 9);
        assert_eq!(o.tsv.null_markers, vec!["".to_string(), "None".to_string()]);
        assert_eq!(o.max_title_chars, 101);
        assert_eq!(o.batch_size, 10_000);
        assert_eq!(o.output_columns.len(), 7);
        assert_eq!(
            o.input_schema.field("language").map(|f| f.data_type),
            Some(DataType::Dictionary)
        );
    }

    #[test]
    fn json_overrides_only_given_keys() {
        let o = PipelineOptions::from_json_str(
            r#"{ "batch_size": 500, "max_title_chars": 80, "tsv": { "expected_arity": 7 } }"#,
        )
        .unwrap();
        assert_eq!(o.batch_size, 500);
        assert_eq!(o.max_title_chars, 80);
        assert_eq!(o.tsv.expected_arity, 7);
        assert_eq!(o.tsv.delimiter, b'\t');
        assert_eq!(o.date_column, "date");
        assert!(o.observer.is_none());
        assert_eq!(o.alert_at_or_above, PipelineSeverity::Critical);
    }

    #[test]
    fn json_schema_fields_default_to_nullable() {
        let o = PipelineOptions::from_json_str(
            r#"{ "input_schema": { "fields": [ { "name": "year", "data_type": "uint32" } ] } }"#,
        )
        .unwrap();
        assert!(o.input_schema.fields[0].nullable);
        assert_eq!(o.input_schema.fields[0].data_type, DataType::UInt32);
    }

    #[test]
    fn zero_batch_size_is_invalid() {
        let err = PipelineOptions::from_json_str(r#"{ "batch_size": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("invalid options: batch_size must be > 0"));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = PipelineOptions::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, PipelineError::Json(_)));
    }
}
