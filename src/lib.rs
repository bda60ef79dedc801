//! `tsv-arrows` turns a large tab-separated table of uncertain quality into a compact Arrow IPC
//! stream: typed, sorted, dictionary-deduplicated and cut into fixed-size record batches, ready
//! for a consumer that renders rows while the stream is still downloading.
//!
//! The primary entrypoints are [`pipeline::run_pipeline`] (any `BufRead` in, any `Write` out)
//! and [`pipeline::convert_path`] (file in, file out, atomic replace).
//!
//! ## What the conversion does
//!
//! 1. Drops lines that do not have exactly 8 tabs (9 fields). No error, no log.
//! 2. Parses the rest under a [`types::Schema`]: `""` and `"None"` are null for every type, and
//!    numbers that fail to parse (e.g. a date of `1850-1853`) become null too.
//! 3. Keeps `ix, x, y, title, first_author_name, date, language`, in that order.
//! 4. Cuts `title` to 101 characters.
//! 5. Gives `language` one sorted dictionary.
//! 6. Drops rows whose `date` is null.
//! 7. Stably sorts by `date` and rewrites `ix` as `0..N`.
//! 8. Writes an Arrow IPC stream in batches of 10,000 rows.
//!
//! All constants live in [`pipeline::PipelineOptions`], which can also be loaded from JSON.
//!
//! ## Quick example
//!
//! ```no_run
//! use tsv_arrows::pipeline::{convert_path, PipelineOptions};
//!
//! # fn main() -> Result<(), tsv_arrows::PipelineError> {
//! let stats = convert_path("data.tsv", "data.arrows", &PipelineOptions::default())?;
//! println!("rows={} batches={}", stats.rows, stats.batches);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: record filter and typed parsing
//! - [`types`]: schema + in-memory columnar table types
//! - [`processing`]: table transformations (project/truncate/unify/filter/sort)
//! - [`artifact`]: Arrow IPC stream writing and reading
//! - [`pipeline`]: options, observers and the end-to-end run
//! - [`error`]: error types shared by every stage

pub mod artifact;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use error::{PipelineError, PipelineResult};
