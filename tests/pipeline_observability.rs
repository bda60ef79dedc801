use std::sync::{Arc, Mutex};

use tsv_arrows::pipeline::{
    convert_path, run_pipeline, PipelineContext, PipelineObserver, PipelineOptions,
    PipelineSeverity, PipelineStats, Stage, StageStats,
};
use tsv_arrows::PipelineError;

#[derive(Default)]
struct RecordingObserver {
    stages: Mutex<Vec<(Stage, usize)>>,
    successes: Mutex<Vec<PipelineStats>>,
    failures: Mutex<Vec<PipelineSeverity>>,
    alerts: Mutex<Vec<PipelineSeverity>>,
}

impl PipelineObserver for RecordingObserver {
    fn on_stage(&self, _ctx: &PipelineContext, stats: StageStats) {
        self.stages.lock().unwrap().push((stats.stage, stats.rows));
    }

    fn on_success(&self, _ctx: &PipelineContext, stats: PipelineStats) {
        self.successes.lock().unwrap().push(stats);
    }

    fn on_failure(
        &self,
        _ctx: &PipelineContext,
        severity: PipelineSeverity,
        _error: &PipelineError,
    ) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &PipelineContext, severity: PipelineSeverity, _error: &PipelineError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn options_with(obs: &Arc<RecordingObserver>) -> PipelineOptions {
    PipelineOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: PipelineSeverity::Critical,
        ..Default::default()
    }
}

#[test]
fn observer_sees_every_stage_in_order() {
    let obs = Arc::new(RecordingObserver::default());
    let dir = tempfile::tempdir().unwrap();

    let stats = convert_path(
        "tests/fixtures/papers.tsv",
        dir.path().join("out.arrows"),
        &options_with(&obs),
    )
    .unwrap();

    // 11 data lines, 2 with the wrong tab count, 2 without a usable date
    assert_eq!(
        obs.stages.lock().unwrap().clone(),
        vec![
            (Stage::Parse, 9),
            (Stage::Project, 9),
            (Stage::Truncate, 9),
            (Stage::UnifyDictionaries, 9),
            (Stage::DropNullKeys, 7),
            (Stage::SortAndReindex, 7),
            (Stage::Write, 7),
        ]
    );
    assert_eq!(obs.successes.lock().unwrap().clone(), vec![stats]);
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn missing_input_is_critical_and_alerts() {
    let obs = Arc::new(RecordingObserver::default());
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.arrows");

    let err = convert_path("tests/fixtures/does_not_exist.tsv", &target, &options_with(&obs))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![PipelineSeverity::Critical]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![PipelineSeverity::Critical]);
    assert!(!target.exists());
}

#[test]
fn missing_column_fails_without_alert() {
    let obs = Arc::new(RecordingObserver::default());
    let options = PipelineOptions {
        output_columns: vec!["ix".into(), "definitely_missing".into()],
        ..options_with(&obs)
    };

    let input = "ix\tx\ty\tvolume\ttitle\tfirst_author_name\tdate\tlanguage\tsubject\n\
                 0\t1\t1\t1\tT\tA\t2000\tEN\tX\n";
    let _ = run_pipeline(input.as_bytes(), Vec::new(), &options).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![PipelineSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
    assert_eq!(obs.stages.lock().unwrap().clone(), vec![(Stage::Parse, 1)]);
}

#[test]
fn lower_alert_threshold_alerts_on_errors() {
    let obs = Arc::new(RecordingObserver::default());
    let options = PipelineOptions {
        batch_size: 0,
        alert_at_or_above: PipelineSeverity::Error,
        observer: Some(obs.clone()),
        ..Default::default()
    };

    let _ = run_pipeline(&b""[..], Vec::new(), &options).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![PipelineSeverity::Error]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![PipelineSeverity::Error]);
    assert!(obs.stages.lock().unwrap().is_empty());
}
