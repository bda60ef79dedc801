//! Tab-separated ingestion into a typed [`Table`].

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;
use crate::types::{Column, DataType, DictionaryBuilder, Field, Schema, Table};

use super::record_filter::{DelimiterArity, FilteredLines, RecordPredicate};

/// Options controlling how delimited text is split and parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TsvOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Number of fields in a well-formed record.
    pub expected_arity: usize,
    /// Raw field values that mean "null" for every column type.
    pub null_markers: Vec<String>,
}

impl Default for TsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            expected_arity: 9,
            null_markers: vec![String::new(), "None".to_string()],
        }
    }
}

impl TsvOptions {
    /// The record predicate implied by `delimiter` and `expected_arity`.
    pub fn arity_predicate(&self) -> DelimiterArity {
        DelimiterArity::new(self.delimiter, self.expected_arity)
    }
}

/// Outcome of parsing one raw field.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    /// The field held a value of the declared type.
    Present(T),
    /// The field was one of the configured null markers.
    NullMarker,
    /// The field was present but not valid for the declared type.
    Unparseable,
}

impl<T> Parsed<T> {
    /// Collapse to a nullable value; both null outcomes become `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Parsed::Present(v) => Some(v),
            Parsed::NullMarker | Parsed::Unparseable => None,
        }
    }
}

/// Parse a raw scalar field as `T`, honoring null markers.
///
/// Null markers match the raw field exactly; surrounding whitespace is ignored when parsing the
/// value itself, so `" 1900 "` is the number 1900.
pub fn parse_field<T: FromStr>(raw: &str, null_markers: &[String]) -> Parsed<T> {
    if is_null_marker(raw, null_markers) {
        return Parsed::NullMarker;
    }
    match raw.trim().parse::<T>() {
        Ok(v) => Parsed::Present(v),
        Err(_) => Parsed::Unparseable,
    }
}

fn is_null_marker(raw: &str, null_markers: &[String]) -> bool {
    null_markers.iter().any(|m| m == raw)
}

/// Ingest a tab-separated file into a [`Table`].
///
/// See [`ingest_tsv`] for the rules.
pub fn ingest_tsv_from_path(
    path: impl AsRef<Path>,
    schema: &Schema,
    options: &TsvOptions,
) -> PipelineResult<Table> {
    let file = File::open(path)?;
    ingest_tsv(BufReader::new(file), schema, options)
}

/// Ingest delimited text from a line source into a [`Table`].
///
/// Rules:
///
/// - Lines failing the arity check ([`TsvOptions::arity_predicate`]) are dropped.
/// - The first accepted line is the header.
/// - Every header column becomes a table column; columns declared in `schema` take the declared
///   type, all others are kept as [`DataType::Utf8`].
/// - Null markers become null for every type; unparseable numbers become null too.
pub fn ingest_tsv<R: BufRead>(
    input: R,
    schema: &Schema,
    options: &TsvOptions,
) -> PipelineResult<Table> {
    ingest_tsv_with_predicate(input, options.arity_predicate(), schema, options)
}

/// Like [`ingest_tsv`], with a caller-supplied record predicate.
pub fn ingest_tsv_with_predicate<R, P>(
    input: R,
    predicate: P,
    schema: &Schema,
    options: &TsvOptions,
) -> PipelineResult<Table>
where
    R: BufRead,
    P: RecordPredicate,
{
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .from_reader(FilteredLines::new(input, predicate));
    ingest_tsv_from_reader(&mut rdr, schema, &options.null_markers)
}

/// Ingest already-filtered records from an existing CSV reader.
pub fn ingest_tsv_from_reader<R: Read>(
    rdr: &mut csv::Reader<R>,
    schema: &Schema,
    null_markers: &[String],
) -> PipelineResult<Table> {
    let headers = rdr.headers()?.clone();

    let mut fields = Vec::with_capacity(headers.len());
    let mut builders = Vec::with_capacity(headers.len());
    for name in headers.iter() {
        let data_type = schema
            .field(name)
            .map_or(DataType::Utf8, |f| f.data_type);
        fields.push(Field::new(name, data_type));
        builders.push(ColumnBuilder::new(data_type));
    }

    for result in rdr.records() {
        let record = result?;
        for (idx, builder) in builders.iter_mut().enumerate() {
            let raw = record.get(idx).unwrap_or("");
            builder.push(raw, null_markers)?;
        }
    }

    let columns = builders.into_iter().map(ColumnBuilder::finish).collect();
    Table::try_new(Schema::new(fields), columns)
}

enum ColumnBuilder {
    UInt32(Vec<Option<u32>>),
    Float32(Vec<Option<f32>>),
    Utf8(Vec<Option<String>>),
    Dictionary(DictionaryBuilder),
}

impl ColumnBuilder {
    fn new(data_type: DataType) -> Self {
        match data_type {
            DataType::UInt32 => Self::UInt32(Vec::new()),
            DataType::Float32 => Self::Float32(Vec::new()),
            DataType::Utf8 => Self::Utf8(Vec::new()),
            DataType::Dictionary => Self::Dictionary(DictionaryBuilder::default()),
        }
    }

    fn push(&mut self, raw: &str, null_markers: &[String]) -> PipelineResult<()> {
        match self {
            Self::UInt32(v) => v.push(parse_field::<u32>(raw, null_markers).into_option()),
            Self::Float32(v) => v.push(parse_field::<f32>(raw, null_markers).into_option()),
            Self::Utf8(v) => v.push((!is_null_marker(raw, null_markers)).then(|| raw.to_owned())),
            Self::Dictionary(b) => {
                let value = (!is_null_marker(raw, null_markers)).then_some(raw);
                b.append(value)?;
            }
        }
        Ok(())
    }

    fn finish(self) -> Column {
        match self {
            Self::UInt32(v) => Column::UInt32(v),
            Self::Float32(v) => Column::Float32(v),
            Self::Utf8(v) => Column::Utf8(v),
            Self::Dictionary(b) => Column::Dictionary(b.finish()),
        }
    }
}
