//! Market data acquisition
//!
//! A [`MarketDataSource`] returns raw daily rows for a symbol over a lookback
//! window. Rows come back in source order and may contain gaps, duplicates or
//! missing prices; cleaning them is the job of
//! [`SeriesPreparer`](crate::series::SeriesPreparer).

use crate::error::{ForecastError, Result};
use crate::utils::{parse_date_or_err, parse_optional_f64};
use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One daily bar as delivered by a data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawRow {
    /// A row carrying only a closing price
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close: Some(close),
            volume: None,
        }
    }

    /// A full OHLCV row
    pub fn ohlcv(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }
}

/// How far back to request history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookback {
    /// Window length in calendar days
    pub days: u32,
    /// Window end; defaults to the latest available row
    pub as_of: Option<NaiveDate>,
}

impl Lookback {
    pub fn days(days: u32) -> Self {
        Self { days, as_of: None }
    }

    /// Whole years, counting one leap day per four years
    pub fn years(years: u32) -> Self {
        Self::days(years * 365 + years / 4)
    }

    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    /// Keep the rows inside `(end - days, end]`, where `end` is `as_of` or
    /// the latest date present.
    pub fn apply(&self, rows: Vec<RawRow>) -> Vec<RawRow> {
        let end = match self.as_of.or_else(|| rows.iter().map(|r| r.date).max()) {
            Some(end) => end,
            None => return rows,
        };
        let start = end - Duration::days(i64::from(self.days));

        rows.into_iter()
            .filter(|r| r.date > start && r.date <= end)
            .collect()
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Self::years(4)
    }
}

/// Source of raw daily market data
pub trait MarketDataSource: Debug {
    /// Fetch rows for `symbol` inside the lookback window.
    fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<Vec<RawRow>>;
}

/// Reads `<dir>/<SYMBOL>.csv` files
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    dir: PathBuf,
}

/// Column positions detected from a CSV header
#[derive(Debug, Clone, Copy)]
struct CsvColumns {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    volume: Option<usize>,
}

impl CsvDataSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Directory the source reads from
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `symbol`
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }

    /// Read every row of a CSV file
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<RawRow>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        let columns = Self::detect_columns(&headers, path)?;

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let context = format!("{} row {}", path.display(), line + 2);

            let date = parse_date_or_err(record.get(columns.date).unwrap_or(""), &context)?;
            let cell = |idx: Option<usize>| -> Result<Option<f64>> {
                match idx.and_then(|i| record.get(i)) {
                    Some(raw) => parse_optional_f64(raw).map_err(|e| {
                        ForecastError::DataSourceError(format!("{}: {}", context, e))
                    }),
                    None => Ok(None),
                }
            };

            rows.push(RawRow {
                date,
                open: cell(columns.open)?,
                high: cell(columns.high)?,
                low: cell(columns.low)?,
                close: cell(Some(columns.close))?,
                volume: cell(columns.volume)?,
            });
        }

        Ok(rows)
    }

    /// Detect column positions by case-insensitive header names
    fn detect_columns(headers: &csv::StringRecord, path: &Path) -> Result<CsvColumns> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |candidates: &[&str]| {
            candidates
                .iter()
                .find_map(|c| names.iter().position(|n| n == c))
        };

        let date = find(&["date", "datetime", "timestamp", "time", "ds"]).ok_or_else(|| {
            ForecastError::DataSourceError(format!("No date column in {}", path.display()))
        })?;
        let close = find(&["close", "adj close", "adj_close", "price", "y"]).ok_or_else(|| {
            ForecastError::DataSourceError(format!("No close column in {}", path.display()))
        })?;

        Ok(CsvColumns {
            date,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            close,
            volume: find(&["volume", "vol"]),
        })
    }
}

impl MarketDataSource for CsvDataSource {
    fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<Vec<RawRow>> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(ForecastError::DataSourceError(format!(
                "Unknown symbol '{}': {} not found",
                symbol,
                path.display()
            )));
        }

        let rows = Self::read_file(&path).map_err(|e| match e {
            ForecastError::DataSourceError(_) => e,
            other => ForecastError::DataSourceError(format!("{}: {}", path.display(), other)),
        })?;
        if rows.is_empty() {
            return Err(ForecastError::DataSourceError(format!(
                "No rows for '{}' in {}",
                symbol,
                path.display()
            )));
        }

        let total = rows.len();
        let rows = lookback.apply(rows);
        info!(symbol, rows = rows.len(), total, "loaded market data");
        Ok(rows)
    }
}

/// Serves rows held in memory, keyed by symbol
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    rows: HashMap<String, Vec<RawRow>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, symbol: &str, rows: Vec<RawRow>) -> Self {
        self.insert(symbol, rows);
        self
    }

    pub fn insert(&mut self, symbol: &str, rows: Vec<RawRow>) {
        self.rows.insert(symbol.to_string(), rows);
    }
}

impl MarketDataSource for InMemorySource {
    fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<Vec<RawRow>> {
        let rows = self.rows.get(symbol).ok_or_else(|| {
            ForecastError::DataSourceError(format!("Unknown symbol '{}'", symbol))
        })?;
        debug!(symbol, rows = rows.len(), "serving in-memory rows");
        Ok(lookback.apply(rows.clone()))
    }
}

/// Display copy of the raw rows with every column, taken before preparation
#[derive(Debug, Clone)]
pub struct DisplayFrame {
    df: DataFrame,
}

impl DisplayFrame {
    /// Build the frame from raw rows, preserving source order
    pub fn from_rows(rows: &[RawRow]) -> Result<Self> {
        let dates: Vec<String> = rows.iter().map(|r| r.date.to_string()).collect();
        let column = |f: fn(&RawRow) -> Option<f64>| rows.iter().map(f).collect::<Vec<_>>();

        let df = DataFrame::new(vec![
            Series::new("Date", dates),
            Series::new("Open", column(|r| r.open)),
            Series::new("High", column(|r| r.high)),
            Series::new("Low", column(|r| r.low)),
            Series::new("Close", column(|r| r.close)),
            Series::new("Volume", column(|r| r.volume)),
        ])?;

        Ok(Self { df })
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Last `n` rows
    pub fn tail(&self, n: usize) -> DataFrame {
        self.df.tail(Some(n))
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }
}
