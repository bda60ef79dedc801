//! Conversions between [`Table`] and Arrow record batches.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, DictionaryArray, Float32Array, Int32Array, StringArray, UInt32Array,
};
use arrow::datatypes::{
    DataType as ArrowDataType, Field as ArrowField, Float32Type, Int32Type, Schema as ArrowSchema,
    UInt32Type,
};
use arrow::record_batch::RecordBatch;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{Column, DataType, DictionaryBuilder, Field, Schema, Table};

/// Arrow type used to store a column of the given logical type.
pub fn arrow_data_type(data_type: DataType) -> ArrowDataType {
    match data_type {
        DataType::UInt32 => ArrowDataType::UInt32,
        DataType::Float32 => ArrowDataType::Float32,
        DataType::Utf8 => ArrowDataType::Utf8,
        DataType::Dictionary => {
            ArrowDataType::Dictionary(Box::new(ArrowDataType::Int32), Box::new(ArrowDataType::Utf8))
        }
    }
}

/// Arrow schema for a table schema (names, types and nullability carry over).
pub fn to_arrow_schema(schema: &Schema) -> ArrowSchema {
    ArrowSchema::new(
        schema
            .fields
            .iter()
            .map(|f| ArrowField::new(&f.name, arrow_data_type(f.data_type), f.nullable))
            .collect::<Vec<_>>(),
    )
}

/// Table schema for an Arrow schema. Only the four supported column types are accepted.
pub fn from_arrow_schema(schema: &ArrowSchema) -> PipelineResult<Schema> {
    let mut fields = Vec::with_capacity(schema.fields().len());
    for f in schema.fields() {
        let data_type = match f.data_type() {
            ArrowDataType::UInt32 => DataType::UInt32,
            ArrowDataType::Float32 => DataType::Float32,
            ArrowDataType::Utf8 => DataType::Utf8,
            ArrowDataType::Dictionary(key, value)
                if **key == ArrowDataType::Int32 && **value == ArrowDataType::Utf8 =>
            {
                DataType::Dictionary
            }
            other => {
                return Err(PipelineError::schema_mismatch(format!(
                    "unsupported arrow type {other} for column '{}'",
                    f.name()
                )));
            }
        };
        fields.push(Field::new(f.name().as_str(), data_type).with_nullable(f.is_nullable()));
    }
    Ok(Schema::new(fields))
}

/// Convert a whole table into a single record batch.
///
/// All dictionary columns must share one lookup (see
/// [`crate::processing::unify_dictionaries`]); they are backed by one shared Arrow values array
/// so an IPC writer emits the dictionary once.
pub fn to_record_batch(table: &Table) -> PipelineResult<RecordBatch> {
    let schema = Arc::new(to_arrow_schema(table.schema()));
    let mut shared: Option<(&[String], ArrayRef)> = None;

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns().len());
    for column in table.columns() {
        let array: ArrayRef = match column {
            Column::UInt32(v) => Arc::new(UInt32Array::from(v.clone())),
            Column::Float32(v) => Arc::new(Float32Array::from(v.clone())),
            Column::Utf8(v) => Arc::new(v.iter().map(|s| s.as_deref()).collect::<StringArray>()),
            Column::Dictionary(d) => {
                if let Some((lookup, _)) = &shared {
                    if *lookup != d.values.as_slice() {
                        return Err(PipelineError::schema_mismatch(
                            "dictionary columns must share one lookup; unify them before writing",
                        ));
                    }
                }
                let (_, values) = shared.get_or_insert_with(|| {
                    let values: ArrayRef = Arc::new(StringArray::from_iter_values(&d.values));
                    (d.values.as_slice(), values)
                });
                let keys = Int32Array::from(d.keys.clone());
                Arc::new(DictionaryArray::<Int32Type>::try_new(keys, Arc::clone(values))?)
            }
        };
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// Re-assemble a table from record batches that share `schema`.
///
/// Dictionary columns are merged onto one lookup in first-seen order, so batches that share a
/// dictionary keep their original codes.
pub fn from_record_batches(schema: &ArrowSchema, batches: &[RecordBatch]) -> PipelineResult<Table> {
    let table_schema = from_arrow_schema(schema)?;

    let mut columns = Vec::with_capacity(table_schema.fields.len());
    for (idx, field) in table_schema.fields.iter().enumerate() {
        let arrays = batches.iter().map(|b| b.column(idx));
        let column = match field.data_type {
            DataType::UInt32 => {
                let mut values = Vec::new();
                for array in arrays {
                    let a = array
                        .as_primitive_opt::<UInt32Type>()
                        .ok_or_else(|| unexpected_array(field, array.as_ref()))?;
                    values.extend(a.iter());
                }
                Column::UInt32(values)
            }
            DataType::Float32 => {
                let mut values = Vec::new();
                for array in arrays {
                    let a = array
                        .as_primitive_opt::<Float32Type>()
                        .ok_or_else(|| unexpected_array(field, array.as_ref()))?;
                    values.extend(a.iter());
                }
                Column::Float32(values)
            }
            DataType::Utf8 => {
                let mut values = Vec::new();
                for array in arrays {
                    let a = array
                        .as_string_opt::<i32>()
                        .ok_or_else(|| unexpected_array(field, array.as_ref()))?;
                    values.extend(a.iter().map(|v| v.map(str::to_owned)));
                }
                Column::Utf8(values)
            }
            DataType::Dictionary => {
                let mut builder = DictionaryBuilder::default();
                for array in arrays {
                    let dict = array
                        .as_dictionary_opt::<Int32Type>()
                        .ok_or_else(|| unexpected_array(field, array.as_ref()))?;
                    let dict_values = dict
                        .values()
                        .as_string_opt::<i32>()
                        .ok_or_else(|| unexpected_array(field, dict.values().as_ref()))?;
                    let remap = dict_values
                        .iter()
                        .map(|v| v.map(|s| builder.intern(s)).transpose())
                        .collect::<PipelineResult<Vec<Option<i32>>>>()?;
                    for key in dict.keys().iter() {
                        let code = key
                            .and_then(|k| usize::try_from(k).ok())
                            .and_then(|k| remap.get(k).copied().flatten());
                        builder.append_code(code);
                    }
                }
                Column::Dictionary(builder.finish())
            }
        };
        columns.push(column);
    }

    Table::try_new(table_schema, columns)
}

fn unexpected_array(field: &Field, array: &dyn Array) -> PipelineError {
    PipelineError::schema_mismatch(format!(
        "column '{}' declared {:?} but stored as {}",
        field.name,
        field.data_type,
        array.data_type()
    ))
}
