//! Demand engine: the entry points callers use.
//!
//! One [`DemandEngine`] is shared by every request. It owns a bounded rayon
//! pool; order selection and the final fit run on that pool, never on the
//! caller's thread when the `spawn_*` variants are used.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use log::{debug, info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::core::{aggregate_daily, DemandForecast, DemandSeries, SalesObservation};
use crate::error::{ForecastError, Result};
use crate::inventory::{
    DemandStatistics, InventoryMetrics, InventoryPolicy, ProductConfig, DEFAULT_SERVICE_LEVEL,
};
use crate::models::arima::{AutoARIMA, AutoARIMAConfig, ModelOrder, OrderSelection, ARIMA};
use crate::models::Forecaster;
use crate::utils::optimization::NelderMeadConfig;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Order search settings.
    pub search: AutoARIMAConfig,
    /// Target probability of not stocking out during lead time.
    pub service_level: f64,
    /// Coverage of forecast intervals.
    pub confidence_level: f64,
    /// Raw observations required before forecasting.
    pub min_forecast_observations: usize,
    /// Raw observations required for non-zero demand statistics.
    pub min_statistics_observations: usize,
    /// Optimizer iteration budget of the final fit.
    pub final_max_iter: usize,
    /// Worker threads; zero uses every available core.
    pub workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search: AutoARIMAConfig::default(),
            service_level: DEFAULT_SERVICE_LEVEL,
            confidence_level: 0.95,
            min_forecast_observations: 10,
            min_statistics_observations: 2,
            final_max_iter: 5000,
            workers: 0,
        }
    }
}

impl EngineConfig {
    /// Set the order search settings.
    pub fn with_search(mut self, search: AutoARIMAConfig) -> Self {
        self.search = search;
        self
    }

    /// Set the inventory service level.
    pub fn with_service_level(mut self, service_level: f64) -> Self {
        self.service_level = service_level;
        self
    }

    /// Set the forecast interval coverage.
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Set the number of worker threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        if !(self.service_level > 0.0 && self.service_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "service_level must be in (0, 1), got {}",
                self.service_level
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if self.min_forecast_observations == 0 {
            return Err(ForecastError::InvalidParameter(
                "min_forecast_observations must be positive".to_string(),
            ));
        }
        if self.final_max_iter == 0 {
            return Err(ForecastError::InvalidParameter(
                "final_max_iter must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Forecast and inventory metrics computed from the same daily series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandReport {
    pub forecast: DemandForecast,
    pub metrics: InventoryMetrics,
}

/// Fit `order` to the full series and forecast `periods` days ahead.
///
/// This fit is authoritative: any error becomes
/// [`ForecastError::ForecastFailure`]. Points and bounds are clamped at zero
/// after fitting.
pub fn forecast_series(
    series: &DemandSeries,
    order: ModelOrder,
    periods: usize,
    config: &EngineConfig,
) -> Result<DemandForecast> {
    let mut model =
        ARIMA::from_order(order).with_optimizer(NelderMeadConfig::with_max_iter(config.final_max_iter));

    model
        .fit(series)
        .map_err(|e| ForecastError::ForecastFailure(format!("ARIMA{order} fit: {e}")))?;
    if !model.converged() {
        warn!(
            "final ARIMA{} fit did not converge within {} iterations",
            order, config.final_max_iter
        );
    }

    let forecast = model
        .predict_with_intervals(periods, config.confidence_level)
        .map_err(|e| ForecastError::ForecastFailure(format!("ARIMA{order} forecast: {e}")))?
        .clamp_min(0.0);

    Ok(DemandForecast {
        order,
        dates: series.forecast_dates(periods),
        values: forecast.values().to_vec(),
        intervals: forecast.intervals(),
    })
}

/// Shared demand forecasting and inventory engine.
///
/// Cheap to clone; clones share the worker pool.
#[derive(Clone)]
pub struct DemandEngine {
    config: Arc<EngineConfig>,
    selector: AutoARIMA,
    policy: InventoryPolicy,
    pool: Arc<ThreadPool>,
}

impl std::fmt::Debug for DemandEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemandEngine")
            .field("config", &self.config)
            .field("workers", &self.pool.current_num_threads())
            .finish()
    }
}

impl DemandEngine {
    /// Engine with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(EngineConfig::default())
    }

    /// Engine with a custom configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("demand-worker-{i}"))
            .build()
            .map_err(|e| ForecastError::ComputationError(format!("worker pool: {e}")))?;
        debug!("demand engine started with {} workers", pool.current_num_threads());

        Ok(Self {
            selector: AutoARIMA::with_config(config.search.clone()),
            policy: InventoryPolicy::new(config.service_level)?,
            config: Arc::new(config),
            pool: Arc::new(pool),
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Select an order for a series on the worker pool.
    pub fn select_order(&self, series: &DemandSeries) -> OrderSelection {
        self.pool.install(|| self.selector.select(series.values()))
    }

    fn forecast_aggregated(&self, series: &DemandSeries, periods: usize) -> Result<DemandForecast> {
        let selection = self.select_order(series);
        let forecast = self
            .pool
            .install(|| forecast_series(series, selection.order, periods, &self.config))?;
        info!(
            "forecast {} days over {} observed days with ARIMA{}",
            periods,
            series.len(),
            forecast.order
        );
        Ok(forecast)
    }

    fn check_periods(periods: usize) -> Result<()> {
        if periods == 0 {
            return Err(ForecastError::InvalidParameter(
                "periods must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Forecast daily demand `periods` days past the last observation.
    ///
    /// Fails with [`ForecastError::InsufficientData`] before any fitting when
    /// there are fewer raw observations than configured.
    pub fn compute_forecast(
        &self,
        observations: &[SalesObservation],
        periods: usize,
    ) -> Result<DemandForecast> {
        Self::check_periods(periods)?;
        let series = aggregate_daily(observations, self.config.min_forecast_observations)?;
        self.forecast_aggregated(&series, periods)
    }

    /// Inventory metrics for a product. Sparse history degrades to zeros.
    pub fn compute_inventory_metrics(
        &self,
        observations: &[SalesObservation],
        product: &ProductConfig,
    ) -> InventoryMetrics {
        let stats =
            DemandStatistics::from_observations(observations, self.config.min_statistics_observations);
        self.policy.evaluate(&stats, product)
    }

    /// Forecast and inventory metrics from one aggregation of the history.
    pub fn compute_report(
        &self,
        observations: &[SalesObservation],
        product: &ProductConfig,
        periods: usize,
    ) -> Result<DemandReport> {
        Self::check_periods(periods)?;
        let series = aggregate_daily(observations, self.config.min_forecast_observations)?;

        let forecast = self.forecast_aggregated(&series, periods)?;
        let metrics = self
            .policy
            .evaluate(&DemandStatistics::from_series(&series), product);

        Ok(DemandReport { forecast, metrics })
    }

    /// Run [`compute_forecast`](Self::compute_forecast) on the worker pool.
    pub fn spawn_forecast(
        &self,
        observations: Vec<SalesObservation>,
        periods: usize,
    ) -> Receiver<Result<DemandForecast>> {
        let (tx, rx) = mpsc::channel();
        let engine = self.clone();
        self.pool.spawn(move || {
            let result = engine.compute_forecast(&observations, periods);
            if tx.send(result).is_err() {
                debug!("forecast receiver dropped before completion");
            }
        });
        rx
    }

    /// Run [`compute_report`](Self::compute_report) on the worker pool.
    pub fn spawn_report(
        &self,
        observations: Vec<SalesObservation>,
        product: ProductConfig,
        periods: usize,
    ) -> Receiver<Result<DemandReport>> {
        let (tx, rx) = mpsc::channel();
        let engine = self.clone();
        self.pool.spawn(move || {
            let result = engine.compute_report(&observations, &product, periods);
            if tx.send(result).is_err() {
                debug!("report receiver dropped before completion");
            }
        });
        rx
    }
}
