//! Ingestion: raw lines in, typed [`crate::types::Table`] out.
//!
//! Two stages live here:
//!
//! - [`record_filter`]: drops lines whose field count is wrong (streaming, line by line)
//! - [`tsv`]: parses the surviving lines under a [`crate::types::Schema`]
//!
//! Most callers should use [`ingest_tsv`] or [`ingest_tsv_from_path`], which chain both.

pub mod record_filter;
pub mod tsv;

pub use record_filter::{DelimiterArity, FilteredLines, RecordOutcome, RecordPredicate};
pub use tsv::{
    ingest_tsv, ingest_tsv_from_path, ingest_tsv_from_reader, ingest_tsv_with_predicate,
    parse_field, Parsed, TsvOptions,
};
