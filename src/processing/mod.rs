//! In-memory table transformations.
//!
//! Every function here takes a `&Table` and returns a new [`crate::types::Table`]; inputs are never
//! modified.
//!
//! - [`project()`]: keep a fixed, ordered list of columns
//! - [`truncate_chars()`]: cut a text column to a maximum number of characters
//! - [`unify_dictionaries()`]: give every dictionary column one shared, sorted lookup
//! - [`filter()`] / [`drop_nulls()`]: row filtering by predicate / by null key
//! - [`sort_and_reindex()`]: stable sort by a key, then number the rows `0..N`
//!
//! ## Example
//!
//! ```rust
//! use tsv_arrows::processing::{drop_nulls, project, sort_and_reindex, truncate_chars};
//! use tsv_arrows::types::{Column, DataType, Field, Schema, Table, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("ix", DataType::UInt32),
//!     Field::new("title", DataType::Utf8),
//!     Field::new("date", DataType::UInt32),
//!     Field::new("unused", DataType::Utf8),
//! ]);
//! let table = Table::try_new(
//!     schema,
//!     vec![
//!         Column::UInt32(vec![Some(10), Some(11), Some(12)]),
//!         Column::Utf8(vec![Some("Moby-Dick".into()), Some("Emma".into()), None]),
//!         Column::UInt32(vec![Some(1851), Some(1815), None]),
//!         Column::Utf8(vec![None, None, None]),
//!     ],
//! )?;
//!
//! let table = project(&table, &["ix", "title", "date"])?;
//! let table = truncate_chars(&table, "title", 4)?;
//! let table = drop_nulls(&table, "date")?;
//! let table = sort_and_reindex(&table, "date", "ix")?;
//!
//! assert_eq!(
//!     table.rows(),
//!     vec![
//!         vec![Value::UInt32(0), Value::Utf8("Emma".into()), Value::UInt32(1815)],
//!         vec![Value::UInt32(1), Value::Utf8("Moby".into()), Value::UInt32(1851)],
//!     ]
//! );
//! # Ok::<(), tsv_arrows::PipelineError>(())
//! ```

pub mod dictionary;
pub mod filter;
pub mod project;
pub mod sort;
pub mod truncate;

pub use dictionary::unify_dictionaries;
pub use filter::{drop_nulls, filter};
pub use project::project;
pub use sort::{sort_and_reindex, sort_indices};
pub use truncate::{truncate_chars, truncate_str};
