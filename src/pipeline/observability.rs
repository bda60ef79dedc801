use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::PipelineError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (run failed).
    Error,
    /// Critical error (I/O or other infrastructure failures).
    Critical,
}

/// Pipeline stages that report their output row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Filtered lines parsed into a typed table.
    Parse,
    /// Columns narrowed to the output set.
    Project,
    /// Title column truncated.
    Truncate,
    /// Dictionary columns unified.
    UnifyDictionaries,
    /// Rows with a null sort key dropped.
    DropNullKeys,
    /// Rows sorted and re-indexed.
    SortAndReindex,
    /// Artifact written.
    Write,
}

/// Context about a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    /// Input path, when the run reads from a file.
    pub source: Option<PathBuf>,
    /// Output path, when the run writes to a file.
    pub target: Option<PathBuf>,
}

impl fmt::Display for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |p: &Option<PathBuf>| {
            p.as_ref()
                .map_or_else(|| "<stream>".to_string(), |p| p.display().to_string())
        };
        write!(f, "source={} target={}", show(&self.source), show(&self.target))
    }
}

/// Row count after one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageStats {
    pub stage: Stage,
    pub rows: usize,
}

/// Stats reported on a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    /// Rows in the artifact.
    pub rows: usize,
    /// Record batches in the artifact.
    pub batches: usize,
    /// Entries in the shared dictionary.
    pub dictionary_values: usize,
}

/// Observer interface for pipeline progress and outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts. Lines dropped by the record filter
/// are never reported.
pub trait PipelineObserver: Send + Sync {
    /// Called after each stage completes.
    fn on_stage(&self, _ctx: &PipelineContext, _stats: StageStats) {}

    /// Called when the run succeeds.
    fn on_success(&self, _ctx: &PipelineContext, _stats: PipelineStats) {}

    /// Called when the run fails.
    fn on_failure(
        &self,
        _ctx: &PipelineContext,
        _severity: PipelineSeverity,
        _error: &PipelineError,
    ) {
    }

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_stage(&self, ctx: &PipelineContext, stats: StageStats) {
        for o in &self.observers {
            o.on_stage(ctx, stats);
        }
    }

    fn on_success(&self, ctx: &PipelineContext, stats: PipelineStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs pipeline events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl PipelineObserver for StdErrObserver {
    fn on_stage(&self, ctx: &PipelineContext, stats: StageStats) {
        eprintln!("[convert][{:?}] {ctx} rows={}", stats.stage, stats.rows);
    }

    fn on_success(&self, ctx: &PipelineContext, stats: PipelineStats) {
        eprintln!(
            "[convert][ok] {ctx} rows={} batches={} dictionary_values={}",
            stats.rows, stats.batches, stats.dictionary_values
        );
    }

    fn on_failure(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        eprintln!("[convert][{severity:?}] {ctx} err={error}");
    }

    fn on_alert(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        eprintln!("[ALERT][convert][{severity:?}] {ctx} err={error}");
    }
}

/// Appends pipeline events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl PipelineObserver for FileObserver {
    fn on_stage(&self, ctx: &PipelineContext, stats: StageStats) {
        self.append_line(&format!(
            "{} stage={:?} {ctx} rows={}",
            unix_ts(),
            stats.stage,
            stats.rows
        ));
    }

    fn on_success(&self, ctx: &PipelineContext, stats: PipelineStats) {
        self.append_line(&format!(
            "{} ok {ctx} rows={} batches={}",
            unix_ts(),
            stats.rows,
            stats.batches
        ));
    }

    fn on_failure(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        self.append_line(&format!("{} fail severity={severity:?} {ctx} err={error}", unix_ts()));
    }

    fn on_alert(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        self.append_line(&format!("{} ALERT severity={severity:?} {ctx} err={error}", unix_ts()));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
