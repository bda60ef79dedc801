//! Core data model types.
//!
//! Input is parsed into an in-memory, column-oriented [`Table`] described by a [`Schema`] (a list of
//! typed [`Field`]s). Every pipeline stage takes a `&Table` and returns a new one; rows have no
//! identity beyond their position, so reordering a table reorders all columns in lockstep.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 32-bit unsigned integer.
    UInt32,
    /// 32-bit floating point number.
    Float32,
    /// UTF-8 string.
    Utf8,
    /// Dictionary-encoded UTF-8 string (int32 code -> value).
    Dictionary,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
    /// Whether the column may hold nulls.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl Field {
    /// Create a new nullable field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    /// Returns a copy of this field with the given nullability.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// A list of fields describing the shape of a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns a field by name, if present.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single decoded value, as seen through [`Table::row`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 32-bit float.
    Float32(f32),
    /// UTF-8 string (dictionary columns decode to this too).
    Utf8(String),
}

/// A dictionary-encoded text column: one code per row plus a code -> value lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DictionaryColumn {
    /// Per-row codes into [`Self::values`]; `None` is a null row.
    pub keys: Vec<Option<i32>>,
    /// Code -> value lookup.
    pub values: Vec<String>,
}

impl DictionaryColumn {
    /// Create a dictionary column from raw codes and a lookup.
    pub fn new(keys: Vec<Option<i32>>, values: Vec<String>) -> Self {
        Self { keys, values }
    }

    /// Encode values, assigning codes in first-seen order.
    pub fn try_from_values<I, S>(values: I) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut builder = DictionaryBuilder::default();
        for v in values {
            builder.append(v.as_ref().map(|s| s.as_ref()))?;
        }
        Ok(builder.finish())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Decoded value at `row`, or `None` for a null (or dangling) code.
    pub fn decode(&self, row: usize) -> Option<&str> {
        let key = self.keys.get(row).copied().flatten()?;
        let idx = usize::try_from(key).ok()?;
        self.values.get(idx).map(String::as_str)
    }

    /// Iterate decoded values in row order.
    pub fn decoded(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        (0..self.len()).map(|row| self.decode(row))
    }
}

/// Incrementally builds a [`DictionaryColumn`] with a local, first-seen-order lookup.
#[derive(Debug, Default)]
pub struct DictionaryBuilder {
    lookup: HashMap<String, i32>,
    column: DictionaryColumn,
}

impl DictionaryBuilder {
    /// Returns the code for `value`, adding it to the lookup if unseen. No row is appended.
    pub fn intern(&mut self, value: &str) -> PipelineResult<i32> {
        if let Some(&code) = self.lookup.get(value) {
            return Ok(code);
        }
        let len = self.column.values.len();
        let code =
            i32::try_from(len).map_err(|_| PipelineError::DictionaryOverflow { values: len })?;
        self.lookup.insert(value.to_owned(), code);
        self.column.values.push(value.to_owned());
        Ok(code)
    }

    /// Append one value (`None` is null).
    pub fn append(&mut self, value: Option<&str>) -> PipelineResult<()> {
        let key = value.map(|v| self.intern(v)).transpose()?;
        self.column.keys.push(key);
        Ok(())
    }

    /// Append a code previously returned by [`Self::intern`] (`None` is null).
    pub fn append_code(&mut self, code: Option<i32>) {
        self.column.keys.push(code);
    }

    /// Finish building.
    pub fn finish(self) -> DictionaryColumn {
        self.column
    }
}

/// Column storage for a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    UInt32(Vec<Option<u32>>),
    Float32(Vec<Option<f32>>),
    Utf8(Vec<Option<String>>),
    Dictionary(DictionaryColumn),
}

impl Column {
    /// The logical type of this column.
    pub fn data_type(&self) -> DataType {
        match self {
            Column::UInt32(_) => DataType::UInt32,
            Column::Float32(_) => DataType::Float32,
            Column::Utf8(_) => DataType::Utf8,
            Column::Dictionary(_) => DataType::Dictionary,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            Column::UInt32(v) => v.len(),
            Column::Float32(v) => v.len(),
            Column::Utf8(v) => v.len(),
            Column::Dictionary(d) => d.len(),
        }
    }

    /// Returns true if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the value at `row` is null.
    pub fn is_null(&self, row: usize) -> bool {
        match self {
            Column::UInt32(v) => v[row].is_none(),
            Column::Float32(v) => v[row].is_none(),
            Column::Utf8(v) => v[row].is_none(),
            Column::Dictionary(d) => d.keys[row].is_none(),
        }
    }

    /// Number of null values.
    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_null(row)).count()
    }

    /// Decoded value at `row`.
    pub fn value(&self, row: usize) -> Value {
        match self {
            Column::UInt32(v) => v[row].map_or(Value::Null, Value::UInt32),
            Column::Float32(v) => v[row].map_or(Value::Null, Value::Float32),
            Column::Utf8(v) => v[row]
                .as_ref()
                .map_or(Value::Null, |s| Value::Utf8(s.clone())),
            Column::Dictionary(d) => d
                .decode(row)
                .map_or(Value::Null, |s| Value::Utf8(s.to_owned())),
        }
    }

    /// Gather rows by position. Dictionary lookups are shared, not rewritten.
    pub fn take(&self, indices: &[usize]) -> Column {
        match self {
            Column::UInt32(v) => Column::UInt32(take_values(v, indices)),
            Column::Float32(v) => Column::Float32(take_values(v, indices)),
            Column::Utf8(v) => Column::Utf8(take_values(v, indices)),
            Column::Dictionary(d) => Column::Dictionary(DictionaryColumn::new(
                take_values(&d.keys, indices),
                d.values.clone(),
            )),
        }
    }

    /// Keep rows whose mask entry is `true`.
    pub fn filter(&self, mask: &[bool]) -> Column {
        match self {
            Column::UInt32(v) => Column::UInt32(filter_values(v, mask)),
            Column::Float32(v) => Column::Float32(filter_values(v, mask)),
            Column::Utf8(v) => Column::Utf8(filter_values(v, mask)),
            Column::Dictionary(d) => Column::Dictionary(DictionaryColumn::new(
                filter_values(&d.keys, mask),
                d.values.clone(),
            )),
        }
    }
}

fn take_values<T: Clone>(values: &[Option<T>], indices: &[usize]) -> Vec<Option<T>> {
    indices.iter().map(|&i| values[i].clone()).collect()
}

fn filter_values<T: Clone>(values: &[Option<T>], mask: &[bool]) -> Vec<Option<T>> {
    values
        .iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|(v, _)| v.clone())
        .collect()
}

/// In-memory columnar table.
///
/// Invariants (checked by [`Table::try_new`]): one column per schema field, in schema order, each
/// matching its field's type; all columns have the same length; non-nullable fields hold no nulls.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Schema,
    columns: Vec<Column>,
}

impl Table {
    /// Create a table from a schema and matching columns.
    pub fn try_new(schema: Schema, columns: Vec<Column>) -> PipelineResult<Self> {
        if schema.fields.len() != columns.len() {
            return Err(PipelineError::schema_mismatch(format!(
                "schema has {} fields but {} columns were given",
                schema.fields.len(),
                columns.len()
            )));
        }
        let rows = columns.first().map_or(0, Column::len);
        for (field, column) in schema.fields.iter().zip(&columns) {
            if column.data_type() != field.data_type {
                return Err(PipelineError::schema_mismatch(format!(
                    "column '{}' is declared {:?} but holds {:?}",
                    field.name,
                    field.data_type,
                    column.data_type()
                )));
            }
            if column.len() != rows {
                return Err(PipelineError::schema_mismatch(format!(
                    "column '{}' has {} rows, expected {rows}",
                    field.name,
                    column.len()
                )));
            }
            if !field.nullable && column.null_count() > 0 {
                return Err(PipelineError::schema_mismatch(format!(
                    "non-nullable column '{}' contains nulls",
                    field.name
                )));
            }
        }
        Ok(Self { schema, columns })
    }

    /// Schema describing the columns.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Columns in schema order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Consume the table, returning its parts.
    pub fn into_parts(self) -> (Schema, Vec<Column>) {
        (self.schema, self.columns)
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema.index_of(name).map(|i| &self.columns[i])
    }

    /// Decoded values of one row, in schema order.
    pub fn row(&self, row: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.value(row)).collect()
    }

    /// All rows, decoded. Intended for small tables and tests.
    pub fn rows(&self) -> Vec<Vec<Value>> {
        (0..self.row_count()).map(|r| self.row(r)).collect()
    }

    /// Create a new table containing exactly the named columns, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> PipelineResult<Self> {
        let mut fields = Vec::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let idx = self.schema.index_of(name).ok_or_else(|| {
                PipelineError::schema_mismatch(format!(
                    "missing required column '{name}'. columns={:?}",
                    self.schema.field_names().collect::<Vec<_>>()
                ))
            })?;
            fields.push(self.schema.fields[idx].clone());
            columns.push(self.columns[idx].clone());
        }
        Ok(Self {
            schema: Schema::new(fields),
            columns,
        })
    }

    /// Create a new table containing only rows (by position) for which `predicate` returns `true`.
    ///
    /// The returned table preserves the original schema and relative row order.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(usize) -> bool,
    {
        let mask: Vec<bool> = (0..self.row_count()).map(&mut predicate).collect();
        Self {
            schema: self.schema.clone(),
            columns: self.columns.iter().map(|c| c.filter(&mask)).collect(),
        }
    }

    /// Create a new table whose row `i` is this table's row `indices[i]`.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    pub fn take(&self, indices: &[usize]) -> Self {
        Self {
            schema: self.schema.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
        }
    }

    /// Create a new table with the column named `field.name` replaced by `column`.
    pub fn replace_column(&self, field: Field, column: Column) -> PipelineResult<Self> {
        let idx = self.schema.index_of(&field.name).ok_or_else(|| {
            PipelineError::schema_mismatch(format!("missing required column '{}'", field.name))
        })?;
        let mut schema = self.schema.clone();
        let mut columns = self.columns.clone();
        schema.fields[idx] = field;
        columns[idx] = column;
        Self::try_new(schema, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        let schema = Schema::new(vec![
            Field::new("id", DataType::UInt32),
            Field::new("name", DataType::Utf8),
            Field::new("lang", DataType::Dictionary),
        ]);
        Table::try_new(
            schema,
            vec![
                Column::UInt32(vec![Some(1), Some(2), None]),
                Column::Utf8(vec![Some("a".into()), None, Some("c".into())]),
                Column::Dictionary(
                    DictionaryColumn::try_from_values(vec![Some("EN"), Some("FR"), Some("EN")])
                        .unwrap(),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn schema_index_of_works() {
        let t = sample_table();
        assert_eq!(t.schema().index_of("id"), Some(0));
        assert_eq!(t.schema().index_of("lang"), Some(2));
        assert_eq!(t.schema().index_of("missing"), None);
    }

    #[test]
    fn dictionary_builder_assigns_codes_in_first_seen_order() {
        let d = DictionaryColumn::try_from_values(vec![Some("b"), None, Some("a"), Some("b")])
            .unwrap();
        assert_eq!(d.values, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(d.keys, vec![Some(0), None, Some(1), Some(0)]);
        assert_eq!(d.decoded().collect::<Vec<_>>(), vec![Some("b"), None, Some("a"), Some("b")]);
    }

    #[test]
    fn try_new_rejects_ragged_columns() {
        let schema = Schema::new(vec![
            Field::new("a", DataType::UInt32),
            Field::new("b", DataType::Float32),
        ]);
        let err = Table::try_new(
            schema,
            vec![Column::UInt32(vec![Some(1)]), Column::Float32(vec![])],
        )
        .unwrap_err();
        assert!(err.to_string().contains("column 'b' has 0 rows"));
    }

    #[test]
    fn try_new_rejects_nulls_in_non_nullable_field() {
        let schema = Schema::new(vec![Field::new("a", DataType::UInt32).with_nullable(false)]);
        let err = Table::try_new(schema, vec![Column::UInt32(vec![Some(1), None])]).unwrap_err();
        assert!(err.to_string().contains("non-nullable column 'a'"));
    }

    #[test]
    fn take_reorders_all_columns_in_lockstep() {
        let t = sample_table();
        let out = t.take(&[2, 0]);
        assert_eq!(
            out.rows(),
            vec![
                vec![Value::Null, Value::Utf8("c".into()), Value::Utf8("EN".into())],
                vec![Value::UInt32(1), Value::Utf8("a".into()), Value::Utf8("EN".into())],
            ]
        );
        // Original unchanged
        assert_eq!(t.row_count(), 3);
    }

    #[test]
    fn filter_rows_preserves_order_and_schema() {
        let t = sample_table();
        let out = t.filter_rows(|row| row != 1);
        assert_eq!(out.schema(), t.schema());
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.row(1)[0], Value::Null);
    }

    #[test]
    fn select_errors_on_missing_column() {
        let t = sample_table();
        let err = t.select(&["id", "nope"]).unwrap_err();
        assert!(err.to_string().contains("missing required column 'nope'"));
    }
}
