//! Additive trend + seasonality model
//!
//! The model decomposes a series as
//!
//! ```text
//! y(t) = g(t) + s_yearly(t) + s_weekly(t) + s_daily(t) + noise
//! ```
//!
//! where `g` is a piecewise-linear trend with automatically placed
//! changepoints and each `s` is a truncated Fourier series. Coefficients are
//! the MAP estimate under Gaussian priors, which amounts to a ridge
//! regression with one penalty per column:
//!
//! - trend offset and slope are unpenalised,
//! - slope changes get `sigma^2 / changepoint_prior_scale^2`,
//! - seasonal coefficients get `sigma^2 / seasonality_prior_scale^2`.
//!
//! `sigma^2` comes from a first pass without changepoints. Uncertainty bands
//! combine observation noise with simulated future slope changes.

use super::{
    BackendHandle, Component, DailySeasonality, FittedModel, ForecastBackend, ForecastPoint,
    ForecastResult, SeasonalityOptions,
};
use crate::error::{ForecastError, Result};
use crate::series::TimeSeries;
use crate::utils::days_between;
use chrono::NaiveDate;
use forecast_math::{fourier, regression, stats, trend, DesignMatrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal as NoiseDistribution};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::ops::Range;
use tracing::{debug, info};

const YEARLY_PERIOD: f64 = 365.25;
const YEARLY_ORDER: usize = 10;
const WEEKLY_PERIOD: f64 = 7.0;
const WEEKLY_ORDER: usize = 3;
const DAILY_PERIOD: f64 = 1.0;
const DAILY_ORDER: usize = 4;

/// Spans needed before yearly and weekly terms switch on by themselves
const YEARLY_MIN_SPAN_DAYS: i64 = 730;
const WEEKLY_MIN_SPAN_DAYS: i64 = 14;

/// Lower bound on every non-zero penalty and on the noise variance (model scale)
const MIN_PENALTY: f64 = 1e-6;
const MIN_SIGMA2: f64 = 1e-6;

/// Tunable parameters of the additive model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdditiveConfig {
    /// Number of potential trend changepoints
    pub n_changepoints: usize,
    /// Fraction of the history in which changepoints are placed
    pub changepoint_range: f64,
    /// Prior scale of the slope changes; larger is a more flexible trend
    pub changepoint_prior_scale: f64,
    /// Prior scale of seasonal coefficients
    pub seasonality_prior_scale: f64,
    /// Coverage of the uncertainty band
    pub interval_width: f64,
    /// Simulated trend paths for future bands; 0 uses observation noise only
    pub uncertainty_samples: usize,
    /// Seed of the trend simulation
    pub seed: u64,
    /// Force the yearly term on or off; auto when unset
    pub yearly_seasonality: Option<bool>,
    /// Force the weekly term on or off; auto when unset
    pub weekly_seasonality: Option<bool>,
}

impl Default for AdditiveConfig {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: 42,
            yearly_seasonality: None,
            weekly_seasonality: None,
        }
    }
}

impl AdditiveConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !(self.changepoint_prior_scale.is_finite() && self.changepoint_prior_scale > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_prior_scale must be positive, got {}",
                self.changepoint_prior_scale
            )));
        }
        if !(self.seasonality_prior_scale.is_finite() && self.seasonality_prior_scale > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonality_prior_scale must be positive, got {}",
                self.seasonality_prior_scale
            )));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        Ok(())
    }
}

/// One periodic term of the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalTerm {
    pub name: String,
    pub period: f64,
    pub fourier_order: usize,
}

impl SeasonalTerm {
    fn new(name: &str, period: f64, fourier_order: usize) -> Self {
        Self {
            name: name.to_string(),
            period,
            fourier_order,
        }
    }
}

/// Backend producing additive models
#[derive(Debug, Clone, Default)]
pub struct AdditiveBackend {
    config: AdditiveConfig,
}

impl AdditiveBackend {
    pub fn new(config: AdditiveConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AdditiveConfig {
        &self.config
    }
}

impl ForecastBackend for AdditiveBackend {
    type Handle = AdditiveHandle;

    fn configure(&self, options: &SeasonalityOptions) -> Result<AdditiveHandle> {
        let daily = options.daily()?;
        debug!(?daily, "configured additive backend");
        Ok(AdditiveHandle {
            config: self.config.clone(),
            daily,
        })
    }

    fn name(&self) -> &str {
        "Additive"
    }
}

/// Additive model configured for one request
#[derive(Debug, Clone)]
pub struct AdditiveHandle {
    config: AdditiveConfig,
    daily: DailySeasonality,
}

impl AdditiveHandle {
    pub fn daily(&self) -> DailySeasonality {
        self.daily
    }

    /// Seasonal terms active for a history spanning `span_days`
    pub fn seasonal_terms(&self, span_days: i64) -> Vec<SeasonalTerm> {
        let mut terms = Vec::new();

        if self
            .config
            .yearly_seasonality
            .unwrap_or(span_days >= YEARLY_MIN_SPAN_DAYS)
        {
            terms.push(SeasonalTerm::new("yearly", YEARLY_PERIOD, YEARLY_ORDER));
        }
        if self
            .config
            .weekly_seasonality
            .unwrap_or(span_days >= WEEKLY_MIN_SPAN_DAYS)
        {
            terms.push(SeasonalTerm::new("weekly", WEEKLY_PERIOD, WEEKLY_ORDER));
        }
        let short_cycle = match self.daily {
            DailySeasonality::BuiltIn => Some(SeasonalTerm::new("daily", DAILY_PERIOD, DAILY_ORDER)),
            DailySeasonality::Custom {
                period_days,
                fourier_order,
            } => Some(SeasonalTerm::new("custom_daily", period_days, fourier_order)),
            DailySeasonality::Disabled => None,
        };
        // Needs two full cycles to be identifiable
        if let Some(term) = short_cycle.filter(|t| span_days as f64 >= 2.0 * t.period) {
            terms.push(term);
        }

        terms
    }
}

impl BackendHandle for AdditiveHandle {
    type Model = FittedAdditiveModel;

    fn fit(self, series: &TimeSeries) -> Result<FittedAdditiveModel> {
        let (first, span_days) = match series.first() {
            Some(first) if series.span_days() > 0 => (first.timestamp, series.span_days()),
            _ => {
                return Err(ForecastError::ForecastFitError(format!(
                    "Need at least two distinct dates to fit, got {}",
                    series.len()
                )))
            }
        };

        let t_scale = span_days as f64;
        let t_days: Vec<f64> = series
            .timestamps()
            .into_iter()
            .map(|d| days_between(first, d))
            .collect();
        let t: Vec<f64> = t_days.iter().map(|d| d / t_scale).collect();

        let values = series.values();
        let y_scale = match stats::max_abs(&values) {
            s if s > 0.0 => s,
            _ => 1.0,
        };
        let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let terms = self.seasonal_terms(span_days);
        let changepoints = trend::changepoint_locations(
            &t,
            self.config.n_changepoints,
            self.config.changepoint_range,
        )?;

        // First pass: noise level without slope changes
        let mut design = DesignMatrix::new(t.len());
        design.push_column(vec![1.0; t.len()])?;
        design.push_column(t.clone())?;
        push_seasonal_blocks(&mut design, &t_days, &terms)?;
        let mut penalties = vec![0.0, 0.0];
        penalties.resize(design.cols(), MIN_PENALTY);
        let first_pass = regression::ridge_solve(&design, &y, &penalties)?;
        let sigma2 = first_pass.residual_variance.max(MIN_SIGMA2);

        // Second pass: full model with prior-scaled penalties
        let mut design = DesignMatrix::new(t.len());
        design.push_column(vec![1.0; t.len()])?;
        design.push_column(t.clone())?;
        let hinge_block = design.push_block(&trend::hinge_features(&t, &changepoints))?;
        let seasonal_blocks = push_seasonal_blocks(&mut design, &t_days, &terms)?;

        let delta_penalty = (sigma2 / self.config.changepoint_prior_scale.powi(2)).max(MIN_PENALTY);
        let beta_penalty = (sigma2 / self.config.seasonality_prior_scale.powi(2)).max(MIN_PENALTY);
        let mut penalties = vec![0.0; design.cols()];
        for p in &mut penalties[hinge_block.clone()] {
            *p = delta_penalty;
        }
        for block in &seasonal_blocks {
            for p in &mut penalties[block.clone()] {
                *p = beta_penalty;
            }
        }

        let solution = regression::ridge_solve(&design, &y, &penalties)?;
        let beta = &solution.coefficients;
        let sigma_obs = solution.residual_variance.max(0.0).sqrt();

        let seasonal = terms
            .into_iter()
            .zip(seasonal_blocks)
            .map(|(term, block)| (term, beta[block].to_vec()))
            .collect();

        let model = FittedAdditiveModel {
            origin: first,
            t_scale,
            y_scale,
            offset: beta[0],
            slope: beta[1],
            changepoints,
            deltas: beta[hinge_block].to_vec(),
            seasonal,
            sigma_obs,
            config: self.config,
        };

        let names: Vec<&str> = model.seasonal_terms().into_iter().map(|t| t.name.as_str()).collect();
        let largest_shift = stats::max_abs(&model.slope_changes());
        info!(
            observations = series.len(),
            span_days,
            changepoints = model.changepoints.len(),
            terms = ?names,
            largest_shift,
            sigma = model.residual_std(),
            "fitted additive model"
        );
        debug!(changepoints = ?model.changepoint_dates(), "changepoint dates");
        Ok(model)
    }
}

fn push_seasonal_blocks(
    design: &mut DesignMatrix,
    t_days: &[f64],
    terms: &[SeasonalTerm],
) -> Result<Vec<Range<usize>>> {
    terms
        .iter()
        .map(|term| {
            let features = fourier::fourier_series(t_days, term.period, term.fourier_order)?;
            Ok(design.push_block(&features)?)
        })
        .collect()
}

/// Fitted additive model; time and values are kept on the model scale
#[derive(Debug, Clone)]
pub struct FittedAdditiveModel {
    origin: NaiveDate,
    t_scale: f64,
    y_scale: f64,
    offset: f64,
    slope: f64,
    changepoints: Vec<f64>,
    deltas: Vec<f64>,
    seasonal: Vec<(SeasonalTerm, Vec<f64>)>,
    sigma_obs: f64,
    config: AdditiveConfig,
}

impl FittedAdditiveModel {
    pub fn seasonal_terms(&self) -> Vec<&SeasonalTerm> {
        self.seasonal.iter().map(|(term, _)| term).collect()
    }

    /// Changepoint dates
    pub fn changepoint_dates(&self) -> Vec<NaiveDate> {
        self.changepoints
            .iter()
            .map(|s| self.origin + chrono::Duration::days((s * self.t_scale).round() as i64))
            .collect()
    }

    /// Slope changes on the original value scale, per day
    pub fn slope_changes(&self) -> Vec<f64> {
        self.deltas
            .iter()
            .map(|d| d * self.y_scale / self.t_scale)
            .collect()
    }

    /// In-sample residual standard deviation on the original value scale
    pub fn residual_std(&self) -> f64 {
        self.sigma_obs * self.y_scale
    }

    /// Simulated trend deviations for future times (`t > 1`), one sample
    /// vector per entry of `future_t`.
    fn simulate_future(&self, future_t: &[f64]) -> Result<Vec<Vec<f64>>> {
        let samples = self.config.uncertainty_samples;
        let mut out = vec![Vec::with_capacity(samples); future_t.len()];
        if samples == 0 || future_t.is_empty() {
            return Ok(out);
        }

        let mut order: Vec<usize> = (0..future_t.len()).collect();
        order.sort_by(|&a, &b| future_t[a].total_cmp(&future_t[b]));

        // Changepoints per unit of model time, observed over the history
        let rate = self.changepoints.len() as f64;
        let laplace_scale = stats::mean_abs(&self.deltas).max(1e-8);
        let magnitude = Exp::new(1.0 / laplace_scale)
            .map_err(|e| ForecastError::ForecastFitError(e.to_string()))?;
        let noise = if self.sigma_obs > 0.0 {
            Some(
                NoiseDistribution::new(0.0, self.sigma_obs)
                    .map_err(|e| ForecastError::ForecastFitError(e.to_string()))?,
            )
        } else {
            None
        };

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        for _ in 0..samples {
            let mut prev_t = 1.0;
            let mut extra_slope = 0.0;
            let mut deviation = 0.0;

            for &idx in &order {
                let ti = future_t[idx];
                let dt = ti - prev_t;
                deviation += extra_slope * dt;

                if rate > 0.0 && rng.gen::<f64>() < (rate * dt).min(1.0) {
                    extra_slope += magnitude.sample(&mut rng) - magnitude.sample(&mut rng);
                }
                prev_t = ti;

                let obs = noise.as_ref().map_or(0.0, |n| n.sample(&mut rng));
                out[idx].push((deviation + obs) * self.y_scale);
            }
        }

        Ok(out)
    }
}

impl FittedModel for FittedAdditiveModel {
    fn predict(&self, index: &[NaiveDate]) -> Result<ForecastResult> {
        let t_days: Vec<f64> = index.iter().map(|&d| days_between(self.origin, d)).collect();
        let t: Vec<f64> = t_days.iter().map(|d| d / self.t_scale).collect();

        let trend_values: Vec<f64> = trend::piecewise_linear(
            &t,
            self.slope,
            self.offset,
            &self.deltas,
            &self.changepoints,
        )?
        .into_iter()
        .map(|v| v * self.y_scale)
        .collect();

        let mut yhat = trend_values.clone();
        let mut components = vec![Component::new("trend", trend_values)];
        for (term, coefficients) in &self.seasonal {
            let values: Vec<f64> = fourier::evaluate(&t_days, term.period, coefficients)?
                .into_iter()
                .map(|v| v * self.y_scale)
                .collect();
            for (y, v) in yhat.iter_mut().zip(&values) {
                *y += v;
            }
            components.push(Component::new(&term.name, values));
        }

        if let Some(pos) = yhat.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::fit_at(index[pos], "Non-finite estimate"));
        }

        let z = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::ForecastFitError(e.to_string()))?
            .inverse_cdf(0.5 + self.config.interval_width / 2.0);
        let margin = z * self.sigma_obs * self.y_scale;

        let future: Vec<usize> = (0..t.len()).filter(|&i| t[i] > 1.0).collect();
        let future_t: Vec<f64> = future.iter().map(|&i| t[i]).collect();
        let mut simulated = self.simulate_future(&future_t)?;

        let lower_q = (1.0 - self.config.interval_width) / 2.0;
        let upper_q = (1.0 + self.config.interval_width) / 2.0;

        let mut points: Vec<ForecastPoint> = index
            .iter()
            .zip(&yhat)
            .map(|(&d, &y)| ForecastPoint::new(d, y, y - margin, y + margin))
            .collect();

        for (&i, samples) in future.iter().zip(simulated.iter_mut()) {
            if samples.is_empty() {
                continue;
            }
            let y = yhat[i];
            let lower = y + stats::quantile(samples, lower_q)?;
            let upper = y + stats::quantile(samples, upper_q)?;
            points[i].lower_bound = lower.min(y);
            points[i].upper_bound = upper.max(y);
        }

        ForecastResult::new(points, components)
    }

    fn name(&self) -> &str {
        "Additive"
    }
}
