//! Inventory optimization from observed demand.
//!
//! [`DemandStatistics`] summarizes the zero-filled daily series, and
//! [`InventoryPolicy`] turns those figures and a [`ProductConfig`] into
//! [`InventoryMetrics`].
//!
//! # Example
//! ```
//! use anofox_inventory::inventory::{DemandStatistics, InventoryPolicy, ProductConfig};
//!
//! let stats = DemandStatistics { avg_daily_demand: 10.0, demand_std: 0.0, days: 15 };
//! let product = ProductConfig::new(100.0).with_current_stock(120);
//!
//! let metrics = InventoryPolicy::default().evaluate(&stats, &product);
//! assert_eq!(metrics.reorder_point, 70.0);
//! assert!(!metrics.needs_reorder);
//! ```

mod policy;
mod statistics;

pub use policy::{
    economic_order_quantity, reorder_point, safety_stock, InventoryMetrics, InventoryPolicy,
    ProductConfig, ReorderSuggestion, StockHealth, StockStatus, DAYS_PER_YEAR,
    DEFAULT_SERVICE_LEVEL,
};
pub use statistics::DemandStatistics;
