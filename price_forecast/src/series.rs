//! Canonical observed series and its preparation from raw rows

use crate::data::{DisplayFrame, RawRow};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Default minimum number of observations needed to fit a seasonal model
pub const DEFAULT_MIN_OBSERVATIONS: usize = 30;

/// A single observed closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservedPoint {
    pub timestamp: NaiveDate,
    pub value: f64,
}

impl ObservedPoint {
    pub fn new(timestamp: NaiveDate, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Chronologically ordered observations with unique timestamps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    points: Vec<ObservedPoint>,
}

impl TimeSeries {
    /// Build a series, checking that timestamps strictly increase and values are finite
    pub fn new(points: Vec<ObservedPoint>) -> Result<Self> {
        if let Some(w) = points.windows(2).find(|w| w[0].timestamp >= w[1].timestamp) {
            return Err(ForecastError::InvalidParameter(format!(
                "Timestamps must strictly increase: {} followed by {}",
                w[0].timestamp, w[1].timestamp
            )));
        }
        if let Some(p) = points.iter().find(|p| !p.value.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "Non-finite value at {}",
                p.timestamp
            )));
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[ObservedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ObservedPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ObservedPoint> {
        self.points.last()
    }

    /// Last observed timestamp
    pub fn cutoff(&self) -> Option<NaiveDate> {
        self.last().map(|p| p.timestamp)
    }

    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Look up the observation at `date`
    pub fn get(&self, date: NaiveDate) -> Option<&ObservedPoint> {
        self.points
            .binary_search_by_key(&date, |p| p.timestamp)
            .ok()
            .map(|idx| &self.points[idx])
    }

    /// Calendar days between first and last observation
    pub fn span_days(&self) -> i64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_days(),
            _ => 0,
        }
    }
}

/// Turns raw market rows into a [`TimeSeries`]
#[derive(Debug, Clone, Copy)]
pub struct SeriesPreparer {
    min_observations: usize,
}

impl SeriesPreparer {
    pub fn new(min_observations: usize) -> Self {
        Self { min_observations }
    }

    pub fn min_observations(&self) -> usize {
        self.min_observations
    }

    /// Copy every raw column for display before the rows are stripped
    pub fn display(&self, rows: &[RawRow]) -> Result<DisplayFrame> {
        DisplayFrame::from_rows(rows)
    }

    /// Keep (date, close), drop unusable closes, deduplicate dates (last wins)
    /// and sort ascending.
    pub fn prepare(&self, rows: &[RawRow]) -> Result<TimeSeries> {
        let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut dropped = 0usize;

        for row in rows {
            match row.close {
                Some(close) if close.is_finite() && close > 0.0 => {
                    by_date.insert(row.date, close);
                }
                _ => dropped += 1,
            }
        }

        let duplicates = rows.len() - dropped - by_date.len();
        if dropped > 0 {
            warn!(dropped, "dropped rows with missing or non-positive close");
        }
        debug!(
            kept = by_date.len(),
            dropped, duplicates, "prepared observed series"
        );

        if by_date.is_empty() {
            return Err(ForecastError::EmptySeries);
        }
        if by_date.len() < self.min_observations {
            return Err(ForecastError::InsufficientHistory {
                required: self.min_observations,
                available: by_date.len(),
            });
        }

        TimeSeries::new(
            by_date
                .into_iter()
                .map(|(timestamp, value)| ObservedPoint { timestamp, value })
                .collect(),
        )
    }
}

impl Default for SeriesPreparer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_OBSERVATIONS)
    }
}
