//! The output artifact: an Arrow IPC stream.
//!
//! - [`convert`]: [`crate::types::Table`] <-> Arrow [`arrow::record_batch::RecordBatch`]
//! - [`stream`]: IPC stream writer (fixed-size batches, one shared dictionary) and reader
//!
//! A browser-side consumer reads the stream batch by batch, so every batch must decode on its own
//! given the schema header and the dictionary batch that precedes it.

pub mod convert;
pub mod stream;

pub use convert::{from_arrow_schema, from_record_batches, to_arrow_schema, to_record_batch};
pub use stream::{
    read_batches, read_stream, read_stream_from_path, write_stream, write_stream_to_path,
    StreamStats, DEFAULT_BATCH_SIZE,
};
