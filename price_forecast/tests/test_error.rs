use chrono::NaiveDate;
use forecast_math::MathError;
use price_forecast::error::ForecastError;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    assert!(matches!(ForecastError::from(io_error), ForecastError::IoError(_)));

    let math_error = MathError::Singular { column: 3, pivot: 0.0 };
    assert!(matches!(
        ForecastError::from(math_error),
        ForecastError::MathError(MathError::Singular { column: 3, .. })
    ));

    let toml_error = toml::from_str::<toml::Table>("= broken").unwrap_err();
    assert!(matches!(ForecastError::from(toml_error), ForecastError::ConfigError(_)));
}

#[test]
fn test_error_display() {
    let error = ForecastError::InsufficientHistory {
        required: 30,
        available: 12,
    };
    let text = error.to_string();
    assert!(text.contains("30"));
    assert!(text.contains("12"));

    let error = ForecastError::InvalidHorizon {
        days: 400,
        min: 1,
        max: 365,
    };
    assert_eq!(error.to_string(), "Invalid horizon: 400 days (expected 1..=365)");

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let text = ForecastError::from(io_error).to_string();
    assert!(text.contains("IO error"));
    assert!(text.contains("permission denied"));
}

#[test]
fn test_error_helpers() {
    let error = ForecastError::invalid_date("31/02/2024", "AKBNK.IS.csv row 4");
    assert_eq!(
        error.to_string(),
        "Invalid date '31/02/2024' in AKBNK.IS.csv row 4"
    );

    let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    let error = ForecastError::fit_at(date, "Non-finite estimate");
    assert!(matches!(&error, ForecastError::ForecastFitError(msg) if msg.contains("2024-06-03")));
}
