//! Text truncation for [`crate::types::Table`].
//!
//! The cut point is counted in characters (Unicode scalar values), never bytes, so multi-byte
//! sequences are never split. The display side truncates with the same rule.

use crate::error::{PipelineError, PipelineResult};
use crate::types::{Column, Table};

/// Returns the first `max_chars` characters of `value`, or `value` itself if it is short enough.
pub fn truncate_str(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => &value[..cut],
        None => value,
    }
}

/// Returns a new [`Table`] where every value of the text column `column` longer than `max_chars`
/// characters is cut to its first `max_chars` characters.
///
/// Nulls stay null; other columns are untouched.
pub fn truncate_chars(table: &Table, column: &str, max_chars: usize) -> PipelineResult<Table> {
    let idx = table
        .schema()
        .index_of(column)
        .ok_or_else(|| {
            PipelineError::schema_mismatch(format!("missing required column '{column}'"))
        })?;
    let field = table.schema().fields[idx].clone();

    let values = match &table.columns()[idx] {
        Column::Utf8(values) => values,
        other => {
            return Err(PipelineError::schema_mismatch(format!(
                "cannot truncate column '{column}' of type {:?}",
                other.data_type()
            )));
        }
    };

    let truncated = values
        .iter()
        .map(|v| v.as_deref().map(|s| truncate_str(s, max_chars).to_owned()))
        .collect();
    table.replace_column(field, Column::Utf8(truncated))
}
