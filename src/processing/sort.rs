//! Stable sorting and row re-indexing for [`crate::types::Table`].

use std::cmp::Ordering;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{Column, DataType, Field, Table};

/// Returns the stable ascending sort permutation of `column`.
///
/// Equal keys keep their original relative order. Nulls sort last; floats use IEEE total order.
pub fn sort_indices(column: &Column) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..column.len()).collect();
    indices.sort_by(|&a, &b| compare_rows(column, a, b));
    indices
}

fn compare_rows(column: &Column, a: usize, b: usize) -> Ordering {
    match column {
        Column::UInt32(v) => nulls_last(v[a], v[b], u32::cmp),
        Column::Float32(v) => nulls_last(v[a], v[b], f32::total_cmp),
        Column::Utf8(v) => nulls_last(v[a].as_deref(), v[b].as_deref(), Ord::cmp),
        Column::Dictionary(d) => nulls_last(d.decode(a), d.decode(b), Ord::cmp),
    }
}

fn nulls_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stably sorts all rows by `key` (ascending), then overwrites `index_column` with each row's
/// zero-based position in the sorted table.
///
/// The permutation is computed once and applied to every column; the index column becomes a
/// non-null `UInt32` holding exactly `0..N`, whatever it held before.
pub fn sort_and_reindex(table: &Table, key: &str, index_column: &str) -> PipelineResult<Table> {
    let key_col = table
        .column(key)
        .ok_or_else(|| PipelineError::schema_mismatch(format!("missing required column '{key}'")))?;

    let sorted = table.take(&sort_indices(key_col));

    let rows = sorted.row_count();
    let upper = u32::try_from(rows).map_err(|_| PipelineError::RowCountOverflow { rows })?;
    let positions = Column::UInt32((0..upper).map(Some).collect());
    sorted.replace_column(
        Field::new(index_column, DataType::UInt32).with_nullable(false),
        positions,
    )
}
