//! End-to-end conversion: delimited text in, Arrow IPC stream out.
//!
//! Most callers should use [`run_pipeline`] (readers/writers) or [`convert_path`] (files). Both run
//! the stages in this order:
//!
//! 1. record filter + typed parse ([`crate::ingestion`])
//! 2. project, truncate, unify dictionaries, drop null keys, sort & reindex ([`transform`])
//! 3. stream write ([`crate::artifact`])
//!
//! If an [`PipelineObserver`] is configured in [`PipelineOptions`], each stage's row count and the
//! run's success/failure/alerts are reported to it.

mod observability;
mod options;

use std::error::Error as StdError;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::artifact::{write_stream, write_stream_to_path, StreamStats};
use crate::error::{PipelineError, PipelineResult};
use crate::ingestion::ingest_tsv;
use crate::processing::{drop_nulls, project, sort_and_reindex, truncate_chars, unify_dictionaries};
use crate::types::{Column, Table};

pub use observability::{
    CompositeObserver, FileObserver, PipelineContext, PipelineObserver, PipelineSeverity,
    PipelineStats, Stage, StageStats, StdErrObserver,
};
pub use options::PipelineOptions;

/// Apply the in-memory stages to a parsed table.
///
/// Projects `output_columns`, truncates `title_column`, unifies dictionaries, drops rows with a
/// null `date_column`, then stably sorts by it and rewrites `index_column` as `0..N`.
pub fn transform(table: &Table, options: &PipelineOptions) -> PipelineResult<Table> {
    transform_reporting(table, options, &mut |_: Stage, _: usize| {})
}

fn transform_reporting(
    table: &Table,
    options: &PipelineOptions,
    report: &mut dyn FnMut(Stage, usize),
) -> PipelineResult<Table> {
    let table = project(table, &options.output_columns)?;
    report(Stage::Project, table.row_count());

    let table = truncate_chars(&table, &options.title_column, options.max_title_chars)?;
    report(Stage::Truncate, table.row_count());

    let table = unify_dictionaries(&table)?;
    report(Stage::UnifyDictionaries, table.row_count());

    let table = drop_nulls(&table, &options.date_column)?;
    report(Stage::DropNullKeys, table.row_count());

    let table = sort_and_reindex(&table, &options.date_column, &options.index_column)?;
    report(Stage::SortAndReindex, table.row_count());

    Ok(table)
}

/// Run the whole conversion from a line source to a byte sink.
///
/// # Examples
///
/// ```rust
/// use tsv_arrows::artifact::read_stream;
/// use tsv_arrows::pipeline::{run_pipeline, PipelineOptions};
/// use tsv_arrows::types::Value;
///
/// # fn main() -> Result<(), tsv_arrows::PipelineError> {
/// let input = "\
/// ix\tx\ty\tdate\ttitle\tfirst_author_name\tlanguage\tpublisher\tsubject
/// 0\t1.5\t2.5\t1851\tMoby-Dick\tMelville\teng\tHarper\tWhales
/// 1\t0.5\t0.1\t1813\tPride and Prejudice\tAusten\teng\tEgerton\tManners
/// 2\t0.0\t0.0\t1850-1853\tUndated\tAnon\tfre\tNone\tNone
/// ";
/// let mut artifact = Vec::new();
/// let stats = run_pipeline(input.as_bytes(), &mut artifact, &PipelineOptions::default())?;
/// assert_eq!(stats.rows, 2);
///
/// let table = read_stream(artifact.as_slice())?;
/// assert_eq!(table.row(0)[0], Value::UInt32(0));
/// assert_eq!(table.row(0)[3], Value::Utf8("Pride and Prejudice".into()));
/// # Ok(())
/// # }
/// ```
pub fn run_pipeline<R: BufRead, W: Write>(
    input: R,
    output: W,
    options: &PipelineOptions,
) -> PipelineResult<PipelineStats> {
    let ctx = PipelineContext::default();
    observe(&ctx, options, |report| {
        let table = ingest_tsv(input, &options.input_schema, &options.tsv)?;
        report(Stage::Parse, table.row_count());
        let table = transform_reporting(&table, options, report)?;
        let written = write_stream(&table, output, options.batch_size)?;
        report(Stage::Write, written.rows);
        Ok(pipeline_stats(&table, written))
    })
}

/// Convert the file at `source` into an artifact at `target`.
///
/// `target` is only replaced once the artifact is complete; a failed run leaves no artifact.
pub fn convert_path(
    source: impl AsRef<Path>,
    target: impl AsRef<Path>,
    options: &PipelineOptions,
) -> PipelineResult<PipelineStats> {
    let (source, target) = (source.as_ref(), target.as_ref());
    let ctx = PipelineContext {
        source: Some(source.to_path_buf()),
        target: Some(target.to_path_buf()),
    };
    observe(&ctx, options, |report| {
        let input = BufReader::new(File::open(source)?);
        let table = ingest_tsv(input, &options.input_schema, &options.tsv)?;
        report(Stage::Parse, table.row_count());
        let table = transform_reporting(&table, options, report)?;
        let written = write_stream_to_path(&table, target, options.batch_size)?;
        report(Stage::Write, written.rows);
        Ok(pipeline_stats(&table, written))
    })
}

fn pipeline_stats(table: &Table, written: StreamStats) -> PipelineStats {
    let dictionary_values = table
        .columns()
        .iter()
        .find_map(|c| match c {
            Column::Dictionary(d) => Some(d.values.len()),
            _ => None,
        })
        .unwrap_or(0);
    PipelineStats {
        rows: written.rows,
        batches: written.batches,
        dictionary_values,
    }
}

fn observe<F>(
    ctx: &PipelineContext,
    options: &PipelineOptions,
    run: F,
) -> PipelineResult<PipelineStats>
where
    F: FnOnce(&mut dyn FnMut(Stage, usize)) -> PipelineResult<PipelineStats>,
{
    let observer = options.observer.as_deref();
    let mut report = |stage: Stage, rows: usize| {
        if let Some(obs) = observer {
            obs.on_stage(ctx, StageStats { stage, rows });
        }
    };

    let result = options.validate().and_then(|()| run(&mut report));

    if let Some(obs) = observer {
        match &result {
            Ok(stats) => obs.on_success(ctx, *stats),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(ctx, sev, e);
                }
            }
        }
    }

    result
}

fn severity_for_error(e: &PipelineError) -> PipelineSeverity {
    match e {
        PipelineError::Io(_) => PipelineSeverity::Critical,
        PipelineError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => PipelineSeverity::Critical,
            _ => PipelineSeverity::Error,
        },
        PipelineError::Arrow(err) => {
            if matches!(err, arrow::error::ArrowError::IoError(..))
                || error_chain_contains_io(err)
            {
                PipelineSeverity::Critical
            } else {
                PipelineSeverity::Error
            }
        }
        PipelineError::Json(_)
        | PipelineError::SchemaMismatch { .. }
        | PipelineError::InvalidOptions { .. }
        | PipelineError::RowCountOverflow { .. }
        | PipelineError::DictionaryOverflow { .. } => PipelineSeverity::Error,
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    const HEADER: &str = "ix\tx\ty\ttitle\tfirst_author_name\tdate\tlanguage\tpublisher\tsubject";

    fn input(rows: &[&str]) -> String {
        let mut s = String::from(HEADER);
        for r in rows {
            s.push('\n');
            s.push_str(r);
        }
        s.push('\n');
        s
    }

    #[test]
    fn transform_runs_all_stages_in_order() {
        let text = input(&[
            "5\t1\t1\tB\tAuthor B\t2001\tEN\tp\ts",
            "6\t2\t2\tA\tAuthor A\t1999\tFR\tp\ts",
            "7\t3\t3\tC\tAuthor C\tNone\tEN\tp\ts",
        ]);
        let options = PipelineOptions::default();
        let parsed = ingest_tsv(text.as_bytes(), &options.input_schema, &options.tsv).unwrap();
        let out = transform(&parsed, &options).unwrap();

        assert_eq!(
            out.schema().field_names().collect::<Vec<_>>(),
            vec!["ix", "x", "y", "title", "first_author_name", "date", "language"]
        );
        assert_eq!(
            out.rows(),
            vec![
                vec![
                    Value::UInt32(0),
                    Value::Float32(2.0),
                    Value::Float32(2.0),
                    Value::Utf8("A".into()),
                    Value::Utf8("Author A".into()),
                    Value::UInt32(1999),
                    Value::Utf8("FR".into()),
                ],
                vec![
                    Value::UInt32(1),
                    Value::Float32(1.0),
                    Value::Float32(1.0),
                    Value::Utf8("B".into()),
                    Value::Utf8("Author B".into()),
                    Value::UInt32(2001),
                    Value::Utf8("EN".into()),
                ],
            ]
        );
    }

    #[test]
    fn severity_is_critical_for_io_only() {
        let io = PipelineError::Io(std::io::Error::other("disk gone"));
        assert_eq!(severity_for_error(&io), PipelineSeverity::Critical);
        let schema = PipelineError::SchemaMismatch {
            message: "x".into(),
        };
        assert_eq!(severity_for_error(&schema), PipelineSeverity::Error);
    }

    #[test]
    fn invalid_options_fail_before_reading() {
        let options = PipelineOptions {
            batch_size: 0,
            ..Default::default()
        };
        let err = run_pipeline(input(&[]).as_bytes(), Vec::new(), &options).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidOptions { .. }));
    }
}
