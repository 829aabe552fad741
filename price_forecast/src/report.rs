//! Terminal rendering of a [`PipelineResult`]

use crate::data::DisplayFrame;
use crate::error::Result;
use crate::metrics::AccuracyMetrics;
use crate::models::{Component, ForecastPoint};
use crate::pipeline::PipelineResult;
use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_BORDERS_ONLY, Attribute, Cell, CellAlignment,
    Color, ContentArrangement, Table,
};
use polars::prelude::{Float64Chunked, TakeRandom, TakeRandomUtf8};

/// Rows of raw data shown above the forecast
pub const RAW_TAIL_ROWS: usize = 5;

fn base_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    let cell = Cell::new(h).add_attribute(Attribute::Bold);
                    if i == 0 {
                        cell
                    } else {
                        cell.set_alignment(CellAlignment::Right)
                    }
                })
                .collect::<Vec<_>>(),
        );
    table
}

fn number(value: f64) -> Cell {
    Cell::new(format!("{:.2}", value)).set_alignment(CellAlignment::Right)
}

fn optional(value: Option<f64>) -> Cell {
    match value {
        Some(v) => number(v),
        None => Cell::new("-")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
    }
}

/// Last `n` raw rows with every column
pub fn raw_data_table(display: &DisplayFrame, n: usize) -> Result<Table> {
    let tail = display.tail(n);
    let dates = tail.column("Date")?.utf8()?;
    let columns = ["Open", "High", "Low", "Close", "Volume"]
        .iter()
        .map(|name| -> Result<Float64Chunked> { Ok(tail.column(name)?.f64()?.clone()) })
        .collect::<Result<Vec<_>>>()?;

    let mut table = base_table(&["Date", "Open", "High", "Low", "Close", "Volume"]);
    for i in 0..tail.height() {
        let mut row = vec![Cell::new(dates.get(i).unwrap_or("-"))];
        row.extend(columns.iter().map(|c| optional(c.get(i))));
        table.add_row(row);
    }
    Ok(table)
}

/// Future points with their bands
pub fn forecast_table(future: &[ForecastPoint]) -> Table {
    let mut table = base_table(&["Date", "Forecast", "Lower", "Upper"]);
    for p in future {
        table.add_row(vec![
            Cell::new(p.timestamp).fg(Color::Cyan),
            number(p.point_estimate).add_attribute(Attribute::Bold),
            number(p.lower_bound),
            number(p.upper_bound),
        ]);
    }
    table
}

/// Per-component range and its value at the end of the horizon
pub fn component_table(components: &[Component]) -> Table {
    let mut table = base_table(&["Component", "Min", "Max", "Last"]);
    for c in components {
        let min = c.values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = c.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        table.add_row(vec![
            Cell::new(&c.name),
            optional(min.is_finite().then_some(min)),
            optional(max.is_finite().then_some(max)),
            optional(c.values.last().copied()),
        ]);
    }
    table
}

pub fn metrics_table(metrics: &AccuracyMetrics) -> Table {
    let mut table = base_table(&["Metric", "Value"]);
    table.add_row(vec![Cell::new("MSE"), number(metrics.mse)]);
    table.add_row(vec![Cell::new("RMSE"), number(metrics.rmse)]);
    table.add_row(vec![
        Cell::new("MAPE"),
        match metrics.mape {
            Some(mape) => Cell::new(format!("{:.2}%", mape)).set_alignment(CellAlignment::Right),
            None => Cell::new("n/a").set_alignment(CellAlignment::Right),
        },
    ]);
    table.add_row(vec![
        Cell::new("Aligned points"),
        Cell::new(metrics.aligned_pairs).set_alignment(CellAlignment::Right),
    ]);
    table
}

/// Full text report for a finished run
pub fn render(result: &PipelineResult) -> Result<String> {
    let mut out = String::new();

    out.push_str(&format!("Raw data for {}\n", result.symbol));
    out.push_str(&raw_data_table(&result.display, RAW_TAIL_ROWS)?.to_string());
    out.push_str(&format!("\n\nForecast starts {}\n", result.cutoff));
    out.push_str(&forecast_table(&result.future).to_string());
    out.push_str("\n\nComponents\n");
    out.push_str(&component_table(result.forecast.components()).to_string());
    out.push_str("\n\nForecast performance\n");
    out.push_str(&metrics_table(&result.metrics).to_string());
    out.push('\n');

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawRow;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn test_raw_data_table_shows_tail_only() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut rows: Vec<RawRow> = (0..8)
            .map(|i| RawRow::close_only(start + Duration::days(i), 40.0 + i as f64))
            .collect();
        rows[7].volume = Some(1250.0);
        let display = DisplayFrame::from_rows(&rows).unwrap();

        let text = raw_data_table(&display, RAW_TAIL_ROWS).unwrap().to_string();
        assert!(!text.contains("2024-03-03"));
        assert!(text.contains("2024-03-04"));
        assert!(text.contains("2024-03-08"));
        assert!(text.contains("47.00"));
        assert!(text.contains("1250.00"));
        assert_eq!(display.tail(RAW_TAIL_ROWS).height(), RAW_TAIL_ROWS);
    }

    #[test]
    fn test_metrics_table_shows_undefined_mape() {
        let metrics = AccuracyMetrics {
            mse: 0.0,
            rmse: 0.0,
            mape: None,
            aligned_pairs: 3,
            mape_pairs: 0,
        };
        let text = metrics_table(&metrics).to_string();
        assert!(text.contains("n/a"));
        assert!(text.contains("RMSE"));
    }

    #[test]
    fn test_forecast_table_lists_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let text = forecast_table(&[ForecastPoint::new(date, 10.0, 9.0, 11.5)]).to_string();
        assert!(text.contains("2024-05-02"));
        assert!(text.contains("11.50"));
    }
}
