//! Row filtering for [`crate::types::Table`].

use crate::error::{PipelineError, PipelineResult};
use crate::types::Table;

/// Returns a new [`Table`] containing only rows (by position) for which `predicate` returns `true`.
///
/// This is a convenience wrapper around [`Table::filter_rows`].
pub fn filter<F>(table: &Table, predicate: F) -> Table
where
    F: FnMut(usize) -> bool,
{
    table.filter_rows(predicate)
}

/// Returns a new [`Table`] without the rows where `column` is null.
///
/// Relative row order is preserved and the field is marked non-nullable in the output schema.
/// Rows whose key failed to parse (free-text date ranges and the like) are dropped rather than
/// defaulted; the artifact's consumer drops the same rows.
pub fn drop_nulls(table: &Table, column: &str) -> PipelineResult<Table> {
    let col = table
        .column(column)
        .ok_or_else(|| {
            PipelineError::schema_mismatch(format!("missing required column '{column}'"))
        })?;
    let kept = filter(table, |row| !col.is_null(row));

    let (mut schema, columns) = kept.into_parts();
    if let Some(idx) = schema.index_of(column) {
        schema.fields[idx].nullable = false;
    }
    Table::try_new(schema, columns)
}

#[cfg(test)]
mod tests {
    use super::{drop_nulls, filter};
    use crate::types::{Column, DataType, Field, Schema, Table, Value};

    fn sample_table() -> Table {
        let schema = Schema::new(vec![
            Field::new("date", DataType::UInt32),
            Field::new("title", DataType::Utf8),
        ]);
        Table::try_new(
            schema,
            vec![
                Column::UInt32(vec![Some(1999), None, Some(1850), None]),
                Column::Utf8(vec![
                    Some("a".into()),
                    Some("range".into()),
                    Some("c".into()),
                    None,
                ]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn drop_nulls_keeps_order_and_tightens_schema() {
        let t = sample_table();
        let out = drop_nulls(&t, "date").unwrap();
        assert_eq!(
            out.rows(),
            vec![
                vec![Value::UInt32(1999), Value::Utf8("a".into())],
                vec![Value::UInt32(1850), Value::Utf8("c".into())],
            ]
        );
        assert!(!out.schema().field("date").unwrap().nullable);
        assert!(out.schema().field("title").unwrap().nullable);
        // Original unchanged
        assert_eq!(t.row_count(), 4);
    }

    #[test]
    fn drop_nulls_errors_on_missing_column() {
        let err = drop_nulls(&sample_table(), "year").unwrap_err();
        assert!(err.to_string().contains("missing required column 'year'"));
    }

    #[test]
    fn filter_can_return_empty_table() {
        let t = sample_table();
        let out = filter(&t, |_| false);
        assert_eq!(out.schema(), t.schema());
        assert_eq!(out.row_count(), 0);
    }
}
