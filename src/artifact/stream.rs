//! Arrow IPC stream writing and reading.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use arrow::datatypes::SchemaRef;
use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use tempfile::NamedTempFile;

use crate::error::{PipelineError, PipelineResult};
use crate::types::Table;

use super::convert::{from_record_batches, to_record_batch};

/// Default number of rows per record batch.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// What a stream write produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    /// Rows written.
    pub rows: usize,
    /// Record batches written.
    pub batches: usize,
}

/// Write `table` to `sink` as an Arrow IPC stream.
///
/// The stream is a schema header followed by record batches of at most `batch_size` rows. All
/// batches are slices of one conversion, so the (unified) dictionary is written once and shared.
/// An empty table still gets one empty batch.
pub fn write_stream<W: Write>(
    table: &Table,
    sink: W,
    batch_size: usize,
) -> PipelineResult<StreamStats> {
    let (_, stats) = write_batches(table, sink, batch_size)?;
    Ok(stats)
}

/// Write `table` to `path` as an Arrow IPC stream.
///
/// The stream goes to a temporary file next to `path`, which replaces `path` only once the
/// stream is complete. On failure the temporary file is removed and `path` is left untouched.
pub fn write_stream_to_path(
    table: &Table,
    path: impl AsRef<Path>,
    batch_size: usize,
) -> PipelineResult<StreamStats> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    let (buffered, stats) = write_batches(table, BufWriter::new(tmp.as_file_mut()), batch_size)?;
    buffered.into_inner().map_err(|e| e.into_error())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(stats)
}

fn write_batches<W: Write>(
    table: &Table,
    sink: W,
    batch_size: usize,
) -> PipelineResult<(W, StreamStats)> {
    if batch_size == 0 {
        return Err(PipelineError::InvalidOptions {
            message: "batch_size must be > 0".to_string(),
        });
    }

    let batch = to_record_batch(table)?;
    let rows = batch.num_rows();
    let mut writer = StreamWriter::try_new(sink, &batch.schema())?;

    let mut batches = 0;
    if rows == 0 {
        writer.write(&batch)?;
        batches = 1;
    }
    for offset in (0..rows).step_by(batch_size) {
        let len = batch_size.min(rows - offset);
        writer.write(&batch.slice(offset, len))?;
        batches += 1;
    }

    let sink = writer.into_inner()?;
    Ok((sink, StreamStats { rows, batches }))
}

/// Read every record batch of an Arrow IPC stream.
pub fn read_batches<R: Read>(source: R) -> PipelineResult<(SchemaRef, Vec<RecordBatch>)> {
    let reader = StreamReader::try_new(source, None)?;
    let schema = reader.schema();
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok((schema, batches))
}

/// Decode an Arrow IPC stream back into a [`Table`].
pub fn read_stream<R: Read>(source: R) -> PipelineResult<Table> {
    let (schema, batches) = read_batches(source)?;
    from_record_batches(&schema, &batches)
}

/// Decode the Arrow IPC stream stored at `path`.
pub fn read_stream_from_path(path: impl AsRef<Path>) -> PipelineResult<Table> {
    let file = File::open(path)?;
    read_stream(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::Int32Type;

    use crate::types::{Column, DataType, DictionaryColumn, Field, Schema};

    fn numbered(rows: u32) -> Table {
        let schema = Schema::new(vec![
            Field::new("ix", DataType::UInt32).with_nullable(false),
            Field::new("language", DataType::Dictionary),
        ]);
        let langs = ["DE", "EN", "FR"];
        Table::try_new(
            schema,
            vec![
                Column::UInt32((0..rows).map(Some).collect()),
                Column::Dictionary(
                    DictionaryColumn::try_from_values(
                        (0..rows).map(|i| Some(langs[i as usize % 3])),
                    )
                    .unwrap(),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn batches_are_capped_at_batch_size() {
        let table = numbered(25);
        let mut buf = Vec::new();
        let stats = write_stream(&table, &mut buf, 10).unwrap();
        assert_eq!(stats, StreamStats { rows: 25, batches: 3 });

        let (_, batches) = read_batches(buf.as_slice()).unwrap();
        let sizes: Vec<usize> = batches.iter().map(|b| b.num_rows()).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[test]
    fn every_batch_sees_the_same_dictionary() {
        let table = numbered(7);
        let mut buf = Vec::new();
        write_stream(&table, &mut buf, 3).unwrap();

        let (_, batches) = read_batches(buf.as_slice()).unwrap();
        for batch in &batches {
            let dict = batch.column(1).as_dictionary::<Int32Type>();
            let values = dict.values().as_string::<i32>();
            assert_eq!(values.len(), 3);
            assert_eq!(values.value(1), "EN");
        }
        assert_eq!(read_stream(buf.as_slice()).unwrap(), table);
    }

    #[test]
    fn empty_table_writes_one_empty_batch() {
        let table = numbered(0);
        let mut buf = Vec::new();
        let stats = write_stream(&table, &mut buf, 10).unwrap();
        assert_eq!(stats.batches, 1);
        let back = read_stream(buf.as_slice()).unwrap();
        assert_eq!(back.row_count(), 0);
        assert_eq!(back.schema(), table.schema());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = write_stream(&numbered(1), Vec::new(), 0).unwrap_err();
        assert!(err.to_string().contains("batch_size must be > 0"));
    }

    #[test]
    fn path_writes_replace_the_target_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.arrows");
        std::fs::write(&path, b"stale").unwrap();

        write_stream_to_path(&numbered(4), &path, 10).unwrap();
        assert_eq!(read_stream_from_path(&path).unwrap(), numbered(4));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_path_write_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.arrows");
        assert!(write_stream_to_path(&numbered(4), &path, 0).is_err());
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
