//! Partition a forecast at the last observed date

use crate::models::{ForecastPoint, ForecastResult};
use crate::series::TimeSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Forecast points on either side of the cutoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSplit {
    /// Last observed date
    pub cutoff: NaiveDate,
    /// Points at or before the cutoff (fitted values)
    pub historical: Vec<ForecastPoint>,
    /// Points after the cutoff
    pub future: Vec<ForecastPoint>,
}

impl ForecastSplit {
    pub fn len(&self) -> usize {
        self.historical.len() + self.future.len()
    }

    pub fn is_empty(&self) -> bool {
        self.historical.is_empty() && self.future.is_empty()
    }
}

/// Split `forecast` at the series' last timestamp, preserving order.
///
/// Returns `None` only for an empty series, which has no cutoff.
pub fn split(series: &TimeSeries, forecast: &ForecastResult) -> Option<ForecastSplit> {
    let cutoff = series.cutoff()?;
    let (historical, future): (Vec<ForecastPoint>, Vec<ForecastPoint>) = forecast
        .points()
        .iter()
        .partition(|p| p.timestamp <= cutoff);

    Some(ForecastSplit {
        cutoff,
        historical,
        future,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::ObservedPoint;
    use chrono::Duration;

    #[test]
    fn test_split_at_cutoff() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = TimeSeries::new(
            (0..3)
                .map(|i| ObservedPoint::new(start + Duration::days(i), 1.0))
                .collect(),
        )
        .unwrap();
        let forecast = ForecastResult::from_points(
            (0..5)
                .map(|i| ForecastPoint::exact(start + Duration::days(i), 1.0))
                .collect(),
        );

        let split = split(&series, &forecast).unwrap();
        assert_eq!(split.cutoff, start + Duration::days(2));
        assert_eq!(split.historical.len(), 3);
        assert_eq!(split.future.len(), 2);
        assert_eq!(split.future[0].timestamp, start + Duration::days(3));
    }
}
