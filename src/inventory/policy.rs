//! Inventory policy: EOQ, safety stock and reorder point.
//!
//! All decisions are taken on unrounded values; only the reported
//! [`InventoryMetrics`] fields are rounded to two decimals.

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::inventory::DemandStatistics;
use crate::utils::stats::{quantile_normal, round_to};

/// Days per year used to annualize daily demand.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Default probability of not stocking out during lead time.
pub const DEFAULT_SERVICE_LEVEL: f64 = 0.95;

const REPORT_DECIMALS: i32 = 2;

/// Cost and stock parameters of a single product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductConfig {
    /// Purchase cost per unit.
    pub unit_cost: f64,
    /// Fixed cost of placing one order.
    pub ordering_cost: f64,
    /// Annual holding cost as a fraction of unit cost.
    pub holding_cost_percentage: f64,
    /// Days between placing and receiving an order.
    pub lead_time_days: u32,
    /// Units currently on hand. Negative means backordered.
    pub current_stock: i64,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            unit_cost: 0.0,
            ordering_cost: 500.0,
            holding_cost_percentage: 0.2,
            lead_time_days: 7,
            current_stock: 0,
        }
    }
}

impl ProductConfig {
    /// Product with the given unit cost and default ordering parameters.
    pub fn new(unit_cost: f64) -> Self {
        Self {
            unit_cost,
            ..Self::default()
        }
    }

    /// Set the ordering cost.
    pub fn with_ordering_cost(mut self, ordering_cost: f64) -> Self {
        self.ordering_cost = ordering_cost;
        self
    }

    /// Set the holding cost fraction.
    pub fn with_holding_cost_percentage(mut self, percentage: f64) -> Self {
        self.holding_cost_percentage = percentage;
        self
    }

    /// Set the lead time.
    pub fn with_lead_time_days(mut self, days: u32) -> Self {
        self.lead_time_days = days;
        self
    }

    /// Set the stock on hand.
    pub fn with_current_stock(mut self, stock: i64) -> Self {
        self.current_stock = stock;
        self
    }

    /// Annual holding cost per unit.
    pub fn holding_cost(&self) -> f64 {
        self.unit_cost * self.holding_cost_percentage
    }
}

/// Economic order quantity `sqrt(2·D·S / H)`.
///
/// Zero when there is no demand, no holding cost, or no positive radicand.
pub fn economic_order_quantity(annual_demand: f64, ordering_cost: f64, holding_cost: f64) -> f64 {
    if annual_demand <= 0.0 || holding_cost <= 0.0 {
        return 0.0;
    }
    let radicand = 2.0 * annual_demand * ordering_cost / holding_cost;
    if radicand > 0.0 && radicand.is_finite() {
        radicand.sqrt()
    } else {
        0.0
    }
}

/// Safety stock `z(service_level) · σ · sqrt(lead time)`.
pub fn safety_stock(demand_std: f64, lead_time_days: u32, service_level: f64) -> f64 {
    if lead_time_days == 0 || demand_std <= 0.0 {
        return 0.0;
    }
    quantile_normal(service_level) * demand_std * f64::from(lead_time_days).sqrt()
}

/// Reorder point: expected lead-time demand plus safety stock.
pub fn reorder_point(avg_daily_demand: f64, lead_time_days: u32, safety_stock: f64) -> f64 {
    avg_daily_demand * f64::from(lead_time_days) + safety_stock
}

/// Stock classification of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// Stock is above the reorder point, or nothing has sold yet.
    Healthy,
    /// Stock has reached the reorder point.
    LowStock,
    /// Nothing on hand.
    OutOfStock,
}

impl StockStatus {
    /// Classify from stock on hand and the unrounded reorder decision.
    pub fn classify(current_stock: i64, has_demand: bool, needs_reorder: bool) -> Self {
        if current_stock <= 0 {
            StockStatus::OutOfStock
        } else if has_demand && needs_reorder {
            StockStatus::LowStock
        } else {
            StockStatus::Healthy
        }
    }
}

/// Inventory figures for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryMetrics {
    pub avg_daily_demand: f64,
    pub demand_std: f64,
    pub annual_demand: f64,
    pub holding_cost: f64,
    pub eoq: f64,
    pub safety_stock: f64,
    pub reorder_point: f64,
    pub current_stock: i64,
    pub needs_reorder: bool,
    pub stock_status: StockStatus,
}

/// Whole-unit reorder proposal for a product that needs restocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderSuggestion {
    pub reorder_point: u64,
    pub order_quantity: u64,
}

impl InventoryMetrics {
    /// Proposal to reorder, if demand exists and stock is at or below the
    /// reorder point. Quantities are truncated to whole units.
    pub fn reorder_suggestion(&self) -> Option<ReorderSuggestion> {
        if self.avg_daily_demand > 0.0 && self.needs_reorder {
            Some(ReorderSuggestion {
                reorder_point: self.reorder_point.max(0.0) as u64,
                order_quantity: self.eoq.max(0.0) as u64,
            })
        } else {
            None
        }
    }
}

/// Counts of products per stock status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockHealth {
    pub healthy: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
}

impl StockHealth {
    /// Tally the status of every product.
    pub fn from_metrics<'a, I>(metrics: I) -> Self
    where
        I: IntoIterator<Item = &'a InventoryMetrics>,
    {
        metrics.into_iter().fold(Self::default(), |mut health, m| {
            match m.stock_status {
                StockStatus::Healthy => health.healthy += 1,
                StockStatus::LowStock => health.low_stock += 1,
                StockStatus::OutOfStock => health.out_of_stock += 1,
            }
            health
        })
    }

    /// Number of products counted.
    pub fn total(&self) -> usize {
        self.healthy + self.low_stock + self.out_of_stock
    }
}

/// Continuous-review inventory policy at a fixed service level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InventoryPolicy {
    service_level: f64,
}

impl Default for InventoryPolicy {
    fn default() -> Self {
        Self {
            service_level: DEFAULT_SERVICE_LEVEL,
        }
    }
}

impl InventoryPolicy {
    /// Policy at the given service level, which must lie in (0, 1).
    pub fn new(service_level: f64) -> Result<Self> {
        if !(service_level > 0.0 && service_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "service level must be in (0, 1), got {service_level}"
            )));
        }
        Ok(Self { service_level })
    }

    /// Service level of the policy.
    pub fn service_level(&self) -> f64 {
        self.service_level
    }

    /// Compute the metrics of one product.
    pub fn evaluate(&self, stats: &DemandStatistics, product: &ProductConfig) -> InventoryMetrics {
        let avg = stats.avg_daily_demand;
        let annual_demand = avg * DAYS_PER_YEAR;
        let holding_cost = product.holding_cost();

        let eoq = economic_order_quantity(annual_demand, product.ordering_cost, holding_cost);
        let ss = safety_stock(stats.demand_std, product.lead_time_days, self.service_level);
        let rop = reorder_point(avg, product.lead_time_days, ss);

        let needs_reorder = (product.current_stock as f64) <= rop;
        let stock_status =
            StockStatus::classify(product.current_stock, stats.has_demand(), needs_reorder);

        InventoryMetrics {
            avg_daily_demand: round_to(avg, REPORT_DECIMALS),
            demand_std: round_to(stats.demand_std, REPORT_DECIMALS),
            annual_demand: round_to(annual_demand, REPORT_DECIMALS),
            holding_cost: round_to(holding_cost, REPORT_DECIMALS),
            eoq: round_to(eoq, REPORT_DECIMALS),
            safety_stock: round_to(ss, REPORT_DECIMALS),
            reorder_point: round_to(rop, REPORT_DECIMALS),
            current_stock: product.current_stock,
            needs_reorder,
            stock_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stats(avg: f64, std: f64) -> DemandStatistics {
        DemandStatistics {
            avg_daily_demand: avg,
            demand_std: std,
            days: 30,
        }
    }

    #[test]
    fn eoq_textbook_value() {
        assert_relative_eq!(
            economic_order_quantity(3650.0, 500.0, 20.0),
            182_500f64.sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn eoq_degenerate_inputs() {
        assert_eq!(economic_order_quantity(0.0, 500.0, 20.0), 0.0);
        assert_eq!(economic_order_quantity(-5.0, 500.0, 20.0), 0.0);
        assert_eq!(economic_order_quantity(100.0, 500.0, 0.0), 0.0);
        assert_eq!(economic_order_quantity(100.0, -500.0, 20.0), 0.0);
    }

    #[test]
    fn safety_stock_uses_normal_quantile() {
        // z(0.95) ≈ 1.6449
        assert_relative_eq!(safety_stock(2.0, 4, 0.95), 1.644854 * 2.0 * 2.0, epsilon = 1e-4);
        assert_eq!(safety_stock(0.0, 7, 0.95), 0.0);
        assert_eq!(safety_stock(3.0, 0, 0.95), 0.0);
    }

    #[test]
    fn reorder_point_without_variability() {
        assert_eq!(reorder_point(10.0, 7, 0.0), 70.0);
    }

    #[test]
    fn evaluate_constant_demand_scenario() {
        let product = ProductConfig::new(100.0)
            .with_ordering_cost(500.0)
            .with_holding_cost_percentage(0.2)
            .with_lead_time_days(7)
            .with_current_stock(50);

        let m = InventoryPolicy::default().evaluate(&stats(10.0, 0.0), &product);

        assert_eq!(m.annual_demand, 3650.0);
        assert_eq!(m.holding_cost, 20.0);
        assert_eq!(m.eoq, 427.2);
        assert_eq!(m.safety_stock, 0.0);
        assert_eq!(m.reorder_point, 70.0);
        assert!(m.needs_reorder);
        assert_eq!(m.stock_status, StockStatus::LowStock);
        assert_eq!(
            m.reorder_suggestion(),
            Some(ReorderSuggestion {
                reorder_point: 70,
                order_quantity: 427
            })
        );
    }

    #[test]
    fn needs_reorder_uses_unrounded_reorder_point() {
        // Reorder point 50.004 rounds to 50.0; stock 50 is still at or below it
        let product = ProductConfig::new(10.0)
            .with_lead_time_days(1)
            .with_current_stock(50);
        let m = InventoryPolicy::default().evaluate(&stats(50.004, 0.0), &product);

        assert_eq!(m.reorder_point, 50.0);
        assert!(m.needs_reorder);

        // Reorder point 49.996 rounds to 50.0 but stock 50 is above it
        let m = InventoryPolicy::default().evaluate(&stats(49.996, 0.0), &product);
        assert_eq!(m.reorder_point, 50.0);
        assert!(!m.needs_reorder);
        assert_eq!(m.stock_status, StockStatus::Healthy);
    }

    #[test]
    fn stock_status_classification() {
        assert_eq!(StockStatus::classify(0, true, true), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(-3, false, true), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(5, true, true), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(5, true, false), StockStatus::Healthy);
        // No sales history with stock on hand
        assert_eq!(StockStatus::classify(5, false, true), StockStatus::Healthy);
    }

    #[test]
    fn stock_without_demand_is_healthy() {
        // Spread alone pushes the reorder point above stock on hand
        let product = ProductConfig::new(100.0).with_current_stock(3);
        let m = InventoryPolicy::default().evaluate(&stats(0.0, 5.0), &product);

        assert!(m.needs_reorder);
        assert_eq!(m.stock_status, StockStatus::Healthy);
        assert!(m.reorder_suggestion().is_none());
    }

    #[test]
    fn no_demand_has_no_suggestion() {
        let product = ProductConfig::new(100.0).with_current_stock(0);
        let m = InventoryPolicy::default().evaluate(&DemandStatistics::default(), &product);

        assert_eq!(m.eoq, 0.0);
        assert!(m.needs_reorder);
        assert_eq!(m.stock_status, StockStatus::OutOfStock);
        assert!(m.reorder_suggestion().is_none());
    }

    #[test]
    fn stock_health_counts() {
        let policy = InventoryPolicy::default();
        let metrics = vec![
            policy.evaluate(&stats(10.0, 2.0), &ProductConfig::new(5.0).with_current_stock(1000)),
            policy.evaluate(&stats(10.0, 2.0), &ProductConfig::new(5.0).with_current_stock(10)),
            policy.evaluate(&stats(10.0, 2.0), &ProductConfig::new(5.0).with_current_stock(0)),
            policy.evaluate(&DemandStatistics::default(), &ProductConfig::new(5.0).with_current_stock(4)),
        ];

        let health = StockHealth::from_metrics(&metrics);
        assert_eq!(
            health,
            StockHealth {
                healthy: 2,
                low_stock: 1,
                out_of_stock: 1
            }
        );
        assert_eq!(health.total(), 4);
    }

    #[test]
    fn policy_rejects_invalid_service_level() {
        assert!(InventoryPolicy::new(0.0).is_err());
        assert!(InventoryPolicy::new(1.0).is_err());
        assert_relative_eq!(InventoryPolicy::new(0.99).unwrap().service_level(), 0.99);
    }

    #[test]
    fn product_config_defaults_and_serde() {
        let product: ProductConfig = serde_json::from_str(r#"{"unit_cost": 100.0}"#).unwrap();

        assert_eq!(product, ProductConfig::new(100.0));
        assert_eq!(product.lead_time_days, 7);
        assert_relative_eq!(product.holding_cost(), 20.0);
    }

    #[test]
    fn stock_status_serializes_snake_case() {
        let json = serde_json::to_string(&StockStatus::OutOfStock).unwrap();
        assert_eq!(json, "\"out_of_stock\"");
    }
}
