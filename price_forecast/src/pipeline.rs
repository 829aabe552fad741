//! End-to-end forecast for one symbol
//!
//! The orchestrator runs the stages in a fixed order and stops at the first
//! error, which is returned unchanged:
//!
//! 1. validate horizon and seasonality options
//! 2. fetch raw rows and keep a display copy
//! 3. prepare the observed series
//! 4. configure, fit and extend the backend
//! 5. split at the cutoff and score the fitted values
//!
//! A shared cancel flag is honoured before data acquisition and before the fit.

use crate::data::{DisplayFrame, Lookback, MarketDataSource};
use crate::error::{ForecastError, Result};
use crate::metrics::{evaluate, AccuracyMetrics};
use crate::models::adapter::ForecastBackendAdapter;
use crate::models::{ForecastBackend, ForecastPoint, ForecastResult, Horizon, SeasonalityOptions};
use crate::series::{SeriesPreparer, TimeSeries};
use crate::split::split;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Everything one forecast run needs from the caller
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub symbol: String,
    pub lookback: Lookback,
    pub horizon_days: i64,
    pub seasonality: SeasonalityOptions,
}

impl ForecastRequest {
    /// Four years of history, 30-day horizon, built-in daily seasonality
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            lookback: Lookback::default(),
            horizon_days: 30,
            seasonality: SeasonalityOptions::default(),
        }
    }

    pub fn with_horizon(mut self, days: i64) -> Self {
        self.horizon_days = days;
        self
    }

    pub fn with_lookback(mut self, lookback: Lookback) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn with_seasonality(mut self, seasonality: SeasonalityOptions) -> Self {
        self.seasonality = seasonality;
        self
    }
}

/// Output of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub symbol: String,
    /// Last observed date; the boundary between fitted and forecast values
    pub cutoff: NaiveDate,
    /// Raw rows with every column, for display only
    #[serde(skip)]
    pub display: DisplayFrame,
    pub series: TimeSeries,
    pub forecast: ForecastResult,
    pub historical: Vec<ForecastPoint>,
    pub future: Vec<ForecastPoint>,
    pub metrics: AccuracyMetrics,
}

/// Drives a data source and a backend through one request at a time
#[derive(Debug)]
pub struct PipelineOrchestrator<S, B> {
    source: S,
    adapter: ForecastBackendAdapter<B>,
    preparer: SeriesPreparer,
    cancel: Option<Arc<AtomicBool>>,
}

impl<S: MarketDataSource, B: ForecastBackend> PipelineOrchestrator<S, B> {
    pub fn new(source: S, backend: B) -> Self {
        Self {
            source,
            adapter: ForecastBackendAdapter::new(backend),
            preparer: SeriesPreparer::default(),
            cancel: None,
        }
    }

    pub fn with_preparer(mut self, preparer: SeriesPreparer) -> Self {
        self.preparer = preparer;
        self
    }

    /// Share a flag that aborts the run with [`ForecastError::Cancelled`] once set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(ForecastError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Run every stage for `request`
    #[instrument(skip(self, request), fields(symbol = %request.symbol))]
    pub fn run(&self, request: &ForecastRequest) -> Result<PipelineResult> {
        let horizon = Horizon::new(request.horizon_days)?;
        request.seasonality.daily()?;
        self.check_cancelled()?;

        let rows = self.source.fetch(&request.symbol, request.lookback)?;
        info!(rows = rows.len(), "acquired raw rows");

        let display = self.preparer.display(&rows)?;
        let series = self.preparer.prepare(&rows)?;
        info!(
            observations = series.len(),
            first = ?series.first().map(|p| p.timestamp),
            last = ?series.cutoff(),
            "prepared series"
        );

        self.check_cancelled()?;

        let handle = self.adapter.configure(&request.seasonality)?;
        let model = self.adapter.fit(handle, &series)?;
        let forecast = self.adapter.extend_and_predict(&model, &series, horizon)?;
        info!(points = forecast.len(), horizon = horizon.days(), "forecast produced");

        let parts = split(&series, &forecast).ok_or(ForecastError::EmptySeries)?;
        debug!(
            historical = parts.historical.len(),
            future = parts.future.len(),
            cutoff = %parts.cutoff,
            "split forecast"
        );

        let metrics = evaluate(&series, &parts.historical)?;
        info!(
            mse = metrics.mse,
            rmse = metrics.rmse,
            mape = ?metrics.mape,
            "evaluated fit"
        );

        Ok(PipelineResult {
            symbol: request.symbol.clone(),
            cutoff: parts.cutoff,
            display,
            series,
            forecast,
            historical: parts.historical,
            future: parts.future,
            metrics,
        })
    }
}
