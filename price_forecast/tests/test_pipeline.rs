use chrono::{Duration, NaiveDate};
use forecast_math::MathError;
use price_forecast::data::{InMemorySource, RawRow};
use price_forecast::error::{ForecastError, Result};
use price_forecast::models::additive::AdditiveBackend;
use price_forecast::models::{
    BackendHandle, FittedModel, ForecastBackend, ForecastPoint, ForecastResult, SeasonalityOptions,
};
use price_forecast::pipeline::{ForecastRequest, PipelineOrchestrator};
use price_forecast::series::{SeriesPreparer, TimeSeries};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Backend whose fitted values equal the observations and whose forecast
/// repeats the last observation
#[derive(Debug, Default)]
struct EchoBackend {
    configured: Arc<AtomicUsize>,
}

#[derive(Debug)]
struct EchoHandle;

#[derive(Debug)]
struct EchoModel {
    series: TimeSeries,
}

impl ForecastBackend for EchoBackend {
    type Handle = EchoHandle;

    fn configure(&self, _options: &SeasonalityOptions) -> Result<EchoHandle> {
        self.configured.fetch_add(1, Ordering::SeqCst);
        Ok(EchoHandle)
    }

    fn name(&self) -> &str {
        "Echo"
    }
}

impl BackendHandle for EchoHandle {
    type Model = EchoModel;

    fn fit(self, series: &TimeSeries) -> Result<EchoModel> {
        Ok(EchoModel {
            series: series.clone(),
        })
    }
}

impl FittedModel for EchoModel {
    fn predict(&self, index: &[NaiveDate]) -> Result<ForecastResult> {
        let last = self.series.last().map(|p| p.value).unwrap_or(0.0);
        Ok(ForecastResult::from_points(
            index
                .iter()
                .map(|&d| ForecastPoint::exact(d, self.series.get(d).map_or(last, |p| p.value)))
                .collect(),
        ))
    }

    fn name(&self) -> &str {
        "Echo"
    }
}

/// Backend that misbehaves in one scripted way
#[derive(Debug, Clone, Copy)]
enum Script {
    FailFit(fn() -> ForecastError),
    InvertedBand,
}

#[derive(Debug, Clone)]
struct ScriptedBackend {
    script: Script,
    predicted: Arc<AtomicUsize>,
}

#[derive(Debug)]
struct ScriptedHandle(ScriptedBackend);

#[derive(Debug)]
struct ScriptedModel(ScriptedBackend);

impl ForecastBackend for ScriptedBackend {
    type Handle = ScriptedHandle;

    fn configure(&self, _options: &SeasonalityOptions) -> Result<ScriptedHandle> {
        Ok(ScriptedHandle(self.clone()))
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

impl BackendHandle for ScriptedHandle {
    type Model = ScriptedModel;

    fn fit(self, _series: &TimeSeries) -> Result<ScriptedModel> {
        match self.0.script {
            Script::FailFit(make_error) => Err(make_error()),
            Script::InvertedBand => Ok(ScriptedModel(self.0)),
        }
    }
}

impl FittedModel for ScriptedModel {
    fn predict(&self, index: &[NaiveDate]) -> Result<ForecastResult> {
        self.0.predicted.fetch_add(1, Ordering::SeqCst);
        Ok(ForecastResult::from_points(
            index
                .iter()
                .map(|&d| ForecastPoint::new(d, 100.0, 101.0, 99.0))
                .collect(),
        ))
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

fn scripted_pipeline(
    script: Script,
) -> (PipelineOrchestrator<InMemorySource, ScriptedBackend>, Arc<AtomicUsize>) {
    let predicted = Arc::new(AtomicUsize::new(0));
    let backend = ScriptedBackend {
        script,
        predicted: predicted.clone(),
    };
    let orchestrator =
        PipelineOrchestrator::new(InMemorySource::new().with_rows("TEST.IS", three_rows()), backend)
            .with_preparer(SeriesPreparer::new(3));
    (orchestrator, predicted)
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn three_rows() -> Vec<RawRow> {
    vec![
        RawRow::close_only(d(2024, 1, 1), 100.0),
        RawRow::close_only(d(2024, 1, 2), 102.0),
        RawRow::close_only(d(2024, 1, 3), 101.0),
    ]
}

fn echo_pipeline(rows: Vec<RawRow>) -> (PipelineOrchestrator<InMemorySource, EchoBackend>, Arc<AtomicUsize>) {
    let backend = EchoBackend::default();
    let configured = backend.configured.clone();
    let orchestrator = PipelineOrchestrator::new(InMemorySource::new().with_rows("TEST.IS", rows), backend)
        .with_preparer(SeriesPreparer::new(3));
    (orchestrator, configured)
}

#[test]
fn test_exact_backend_scenario() {
    let (orchestrator, _) = echo_pipeline(three_rows());
    let result = orchestrator
        .run(&ForecastRequest::new("TEST.IS").with_horizon(1))
        .unwrap();

    assert_eq!(result.cutoff, d(2024, 1, 3));
    assert_eq!(result.historical.len(), 3);
    assert_eq!(result.future.len(), 1);
    assert_eq!(result.future[0].timestamp, d(2024, 1, 4));
    assert_eq!(result.metrics.mse, 0.0);
    assert_eq!(result.metrics.rmse, 0.0);
    assert_eq!(result.metrics.mape, Some(0.0));
    assert_eq!(result.display.len(), 3);
}

#[test]
fn test_invalid_horizon_stops_before_backend() {
    let (orchestrator, configured) = echo_pipeline(three_rows());
    let err = orchestrator
        .run(&ForecastRequest::new("TEST.IS").with_horizon(400))
        .unwrap_err();

    assert!(matches!(err, ForecastError::InvalidHorizon { days: 400, .. }));
    assert_eq!(configured.load(Ordering::SeqCst), 0);

    let err = orchestrator
        .run(&ForecastRequest::new("TEST.IS").with_horizon(0))
        .unwrap_err();
    assert!(matches!(err, ForecastError::InvalidHorizon { days: 0, .. }));
}

#[test]
fn test_empty_rows_stop_before_backend() {
    let (orchestrator, configured) = echo_pipeline(Vec::new());
    let err = orchestrator.run(&ForecastRequest::new("TEST.IS")).unwrap_err();

    assert!(matches!(err, ForecastError::EmptySeries));
    assert_eq!(configured.load(Ordering::SeqCst), 0);
}

#[test]
fn test_short_history_is_rejected() {
    let (orchestrator, configured) = echo_pipeline(three_rows()[..2].to_vec());
    let err = orchestrator.run(&ForecastRequest::new("TEST.IS")).unwrap_err();

    assert!(matches!(
        err,
        ForecastError::InsufficientHistory {
            required: 3,
            available: 2
        }
    ));
    assert_eq!(configured.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unknown_symbol() {
    let (orchestrator, _) = echo_pipeline(three_rows());
    assert!(matches!(
        orchestrator.run(&ForecastRequest::new("OTHER.IS")),
        Err(ForecastError::DataSourceError(_))
    ));
}

#[test]
fn test_conflicting_seasonality_rejected() {
    let (orchestrator, configured) = echo_pipeline(three_rows());
    let seasonality = SeasonalityOptions {
        daily_seasonality: true,
        custom_daily_period: Some(2.0),
        custom_fourier_order: None,
    };
    let err = orchestrator
        .run(&ForecastRequest::new("TEST.IS").with_seasonality(seasonality))
        .unwrap_err();

    assert!(matches!(err, ForecastError::InvalidParameter(_)));
    assert_eq!(configured.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cancelled_run() {
    let (orchestrator, configured) = echo_pipeline(three_rows());
    let flag = Arc::new(AtomicBool::new(true));
    let orchestrator = orchestrator.with_cancel_flag(flag.clone());

    assert!(matches!(
        orchestrator.run(&ForecastRequest::new("TEST.IS")),
        Err(ForecastError::Cancelled)
    ));
    assert_eq!(configured.load(Ordering::SeqCst), 0);

    flag.store(false, Ordering::SeqCst);
    assert!(orchestrator.run(&ForecastRequest::new("TEST.IS")).is_ok());
}

#[test]
fn test_additive_end_to_end() {
    let start = d(2023, 1, 2);
    let rows: Vec<RawRow> = (0..120)
        .map(|i| {
            let t = i as f64;
            RawRow::close_only(
                start + Duration::days(i),
                80.0 + 0.1 * t + 2.0 * (2.0 * std::f64::consts::PI * t / 7.0).sin(),
            )
        })
        .collect();
    let orchestrator = PipelineOrchestrator::new(
        InMemorySource::new().with_rows("THYAO.IS", rows),
        AdditiveBackend::default(),
    );

    let result = orchestrator
        .run(&ForecastRequest::new("THYAO.IS").with_horizon(30))
        .unwrap();

    assert_eq!(result.historical.len(), 120);
    assert_eq!(result.future.len(), 30);
    assert_eq!(result.forecast.len(), 150);
    assert!(result.metrics.rmse < 0.5);
    assert!(result.metrics.mape.unwrap() < 1.0);
    assert!(result
        .forecast
        .points()
        .iter()
        .all(|p| p.lower_bound <= p.point_estimate && p.point_estimate <= p.upper_bound));

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("metrics").is_some());
    assert!(json.get("display").is_none());
    assert_eq!(json["future"].as_array().map(Vec::len), Some(30));
}

#[test]
fn test_math_failure_during_fit_aborts_run() {
    let (orchestrator, predicted) = scripted_pipeline(Script::FailFit(|| {
        ForecastError::from(MathError::Singular {
            column: 1,
            pivot: 0.0,
        })
    }));
    let err = orchestrator.run(&ForecastRequest::new("TEST.IS")).unwrap_err();

    match err {
        ForecastError::ForecastFitError(message) => assert!(message.contains("Singular"), "{}", message),
        other => panic!("expected a fit error, got {:?}", other),
    }
    assert_eq!(predicted.load(Ordering::SeqCst), 0);
}

#[rstest]
#[case(|| ForecastError::InvalidParameter("order".to_string()), "InvalidParameter")]
#[case(|| ForecastError::Cancelled, "Cancelled")]
#[case(|| ForecastError::ForecastFitError("diverged".to_string()), "ForecastFitError")]
#[case(|| ForecastError::EmptySeries, "ForecastFitError")]
fn test_fit_error_kinds_reaching_caller(#[case] make_error: fn() -> ForecastError, #[case] expected: &str) {
    let (orchestrator, predicted) = scripted_pipeline(Script::FailFit(make_error));
    let err = orchestrator.run(&ForecastRequest::new("TEST.IS")).unwrap_err();

    let kind = match err {
        ForecastError::InvalidParameter(_) => "InvalidParameter",
        ForecastError::Cancelled => "Cancelled",
        ForecastError::ForecastFitError(_) => "ForecastFitError",
        _ => "other",
    };
    assert_eq!(kind, expected);
    assert_eq!(predicted.load(Ordering::SeqCst), 0);
}

#[test]
fn test_inverted_band_is_rejected() {
    let (orchestrator, predicted) = scripted_pipeline(Script::InvertedBand);
    let err = orchestrator.run(&ForecastRequest::new("TEST.IS")).unwrap_err();

    assert!(matches!(err, ForecastError::ForecastFitError(_)));
    assert_eq!(predicted.load(Ordering::SeqCst), 1);
}
