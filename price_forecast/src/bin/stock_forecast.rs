use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use price_forecast::data::CsvDataSource;
use price_forecast::models::additive::AdditiveBackend;
use price_forecast::series::SeriesPreparer;
use price_forecast::{report, ForecastConfig, ForecastRequest, PipelineOrchestrator};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(version, about = "Forecast daily closing prices of BIST-50 stocks")]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Fit the model and print the forecast
    Forecast(ForecastCmd),
    /// List the symbol catalog
    Symbols,
}

#[derive(Args)]
struct ForecastCmd {
    #[arg(long)]
    symbol: String,
    /// Days to forecast (1-365)
    #[arg(long)]
    days: Option<i64>,
    /// Period in days of a custom seasonality replacing the built-in daily one
    #[arg(long, value_name = "DAYS")]
    custom_daily_period: Option<f64>,
    /// Turn the built-in daily seasonality off
    #[arg(long)]
    no_daily_seasonality: bool,
    /// Directory with <SYMBOL>.csv files
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Also write the full result as JSON
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> Result<ForecastConfig> {
    match path {
        Some(path) => ForecastConfig::load_path(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ForecastConfig::default()),
    }
}

fn forecast(config: ForecastConfig, cmd: ForecastCmd) -> Result<()> {
    let symbol = config.resolve_symbol(&cmd.symbol)?;

    let mut seasonality = config.seasonality;
    if cmd.no_daily_seasonality {
        seasonality.daily_seasonality = false;
    }
    if let Some(period) = cmd.custom_daily_period {
        seasonality.daily_seasonality = false;
        seasonality.custom_daily_period = Some(period);
    }

    let request = ForecastRequest::new(&symbol)
        .with_lookback(config.lookback())
        .with_horizon(cmd.days.unwrap_or(config.default_horizon))
        .with_seasonality(seasonality);

    let data_dir = cmd.data_dir.unwrap_or_else(|| config.data_dir.clone());
    let backend = AdditiveBackend::new(config.model.clone())?;
    let orchestrator = PipelineOrchestrator::new(CsvDataSource::new(data_dir), backend)
        .with_preparer(SeriesPreparer::new(config.min_observations));

    let result = orchestrator
        .run(&request)
        .with_context(|| format!("forecasting {}", symbol))?;

    // Render before printing so a failed run prints nothing
    let text = report::render(&result)?;
    if let Some(path) = &cmd.json {
        let writer = BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        );
        serde_json::to_writer_pretty(writer, &result)?;
        tracing::info!(path = %path.display(), "wrote JSON result");
    }
    print!("{}", text);

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "price_forecast=info,stock_forecast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.cmd {
        Cmd::Forecast(cmd) => forecast(config, cmd)?,
        Cmd::Symbols => {
            for symbol in &config.symbols {
                println!("{}", symbol);
            }
        }
    }

    Ok(())
}
