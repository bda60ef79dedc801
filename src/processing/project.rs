//! Column projection for [`crate::types::Table`].

use crate::error::PipelineResult;
use crate::types::Table;

/// Returns a new [`Table`] holding exactly `columns`, in that order.
///
/// Naming a column the table does not have is a configuration error.
pub fn project<S: AsRef<str>>(table: &Table, columns: &[S]) -> PipelineResult<Table> {
    table.select(columns)
}

#[cfg(test)]
mod tests {
    use super::project;
    use crate::types::{Column, DataType, Field, Schema, Table, Value};

    fn sample_table() -> Table {
        let schema = Schema::new(vec![
            Field::new("a", DataType::UInt32),
            Field::new("b", DataType::Utf8),
            Field::new("c", DataType::Float32),
        ]);
        Table::try_new(
            schema,
            vec![
                Column::UInt32(vec![Some(1), Some(2)]),
                Column::Utf8(vec![Some("x".into()), None]),
                Column::Float32(vec![Some(0.5), Some(1.5)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn project_reorders_and_drops_columns() {
        let t = sample_table();
        let out = project(&t, &["c", "a"]).unwrap();
        assert_eq!(out.schema().field_names().collect::<Vec<_>>(), vec!["c", "a"]);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.row(1), vec![Value::Float32(1.5), Value::UInt32(2)]);
    }

    #[test]
    fn project_errors_on_unknown_column() {
        let t = sample_table();
        let err = project(&t, &["a", "language"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("schema mismatch"));
        assert!(msg.contains("missing required column 'language'"));
    }
}
