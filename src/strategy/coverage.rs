// src/strategy/coverage.rs

//! Time-based stock coverage and the CRITICAL / NORMAL / OVERSTOCKED labels
//! every allocation decision starts from.

use crate::model::inventory::Inventory;
use crate::model::orders::PendingArrival;
use crate::model::sku::{Size, Sku};
use crate::simulation::config::{CoverageThresholds, PlannerConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageStatus {
    Critical,
    Normal,
    Overstocked,
}

impl CoverageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Critical => "CRITICAL",
            CoverageStatus::Normal => "NORMAL",
            CoverageStatus::Overstocked => "OVERSTOCKED",
        }
    }
}

/// Per-SKU view at the moment a new container would land.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuMetric {
    pub sku: Sku,
    pub weekly_demand: f64,
    pub monthly_demand: f64,
    pub current_stock: u32,
    /// In-transit units that land no later than the new container.
    pub pending_stock: u32,
    pub projected_stock: f64,
    /// Months of demand the projected stock covers.
    pub projected_coverage: f64,
    pub status: CoverageStatus,
    /// Units that bring the SKU up to the target coverage at arrival.
    pub units_needed: u32,
}

impl SkuMetric {
    pub fn is_sold(&self) -> bool {
        self.monthly_demand > 0.0
    }

    /// May receive new stock: sold and not already overstocked.
    pub fn is_eligible(&self) -> bool {
        self.is_sold() && self.status != CoverageStatus::Overstocked
    }
}

/// When the container is placed and how hard demand runs while it travels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageParams {
    /// Months from now until the order is placed.
    pub order_offset_months: f64,
    /// Multiplier on base demand (seasonality).
    pub demand_factor: f64,
}

impl Default for CoverageParams {
    fn default() -> Self {
        Self {
            order_offset_months: 0.0,
            demand_factor: 1.0,
        }
    }
}

/// Size-level rollup over the firmnesses that can still take stock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeSummary {
    pub size: Size,
    pub current_stock: u32,
    pub projected_stock: f64,
    pub monthly_demand: f64,
    pub coverage_months: f64,
    pub units_needed: u32,
    pub has_critical: bool,
    /// At least one sold firmness is not overstocked.
    pub eligible: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkuMetrics {
    metrics: BTreeMap<Sku, SkuMetric>,
}

impl SkuMetrics {
    pub fn get(&self, sku: Sku) -> Option<&SkuMetric> {
        self.metrics.get(&sku)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkuMetric> {
        self.metrics.values()
    }

    pub fn for_size(&self, size: Size) -> impl Iterator<Item = &SkuMetric> {
        self.metrics.values().filter(move |m| m.sku.size == size)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Sold SKUs currently below the critical threshold.
    pub fn critical_skus(&self) -> Vec<Sku> {
        self.iter()
            .filter(|m| m.is_sold() && m.status == CoverageStatus::Critical)
            .map(|m| m.sku)
            .collect()
    }

    pub fn critical_sizes(&self) -> Vec<Size> {
        let mut sizes: Vec<Size> = self.critical_skus().into_iter().map(|s| s.size).collect();
        sizes.dedup();
        sizes
    }

    pub fn size_summary(&self, size: Size) -> SizeSummary {
        let all: Vec<&SkuMetric> = self.for_size(size).collect();
        let eligible: Vec<&SkuMetric> = all.iter().copied().filter(|m| m.is_eligible()).collect();
        // Fully overstocked sizes are summarised over every firmness instead.
        let basis = if eligible.is_empty() { &all } else { &eligible };

        let projected_stock: f64 = basis.iter().map(|m| m.projected_stock).sum();
        let monthly_demand: f64 = basis.iter().map(|m| m.monthly_demand).sum();

        SizeSummary {
            size,
            current_stock: all.iter().map(|m| m.current_stock).sum(),
            projected_stock,
            monthly_demand,
            coverage_months: coverage_months(projected_stock, monthly_demand),
            units_needed: eligible.iter().map(|m| m.units_needed).sum(),
            has_critical: eligible.iter().any(|m| m.status == CoverageStatus::Critical),
            eligible: !eligible.is_empty(),
        }
    }
}

/// Months of demand `stock` covers. Zero demand covers forever when there is
/// stock and nothing when there is none.
pub fn coverage_months(stock: f64, monthly_demand: f64) -> f64 {
    if monthly_demand > 0.0 {
        stock / monthly_demand
    } else if stock > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

pub fn classify(coverage: f64, thresholds: &CoverageThresholds) -> CoverageStatus {
    if coverage < thresholds.critical_months {
        CoverageStatus::Critical
    } else if coverage > thresholds.overstock_months {
        CoverageStatus::Overstocked
    } else {
        CoverageStatus::Normal
    }
}

/// Computes every configured SKU's metric as of the prospective arrival of
/// a container ordered `order_offset_months` from now.
///
/// Only in-transit stock landing no later than that arrival is credited, so
/// overlapping containers are not counted twice.
pub fn calculate_metrics(
    config: &PlannerConfig,
    inventory: &Inventory,
    pending: &[PendingArrival],
    params: CoverageParams,
) -> SkuMetrics {
    let horizon = params.order_offset_months.max(0.0) + config.lead_time_months();
    let mut metrics = BTreeMap::new();

    for sku in config.skus() {
        let monthly_demand = config.monthly_demand(sku) * params.demand_factor;
        let weekly_demand = config.weekly_demand(sku) * params.demand_factor;
        let current_stock = inventory.spring(sku);
        let pending_stock: u32 = pending
            .iter()
            .filter(|p| p.arrival_index <= horizon)
            .map(|p| p.quantity(sku))
            .sum();

        let projected_stock =
            (current_stock as f64 - monthly_demand * horizon + pending_stock as f64).max(0.0);
        let projected_coverage = coverage_months(projected_stock, monthly_demand);
        let status = classify(projected_coverage, &config.coverage);

        let target_units = monthly_demand * config.coverage.target_months;
        let units_needed = if status == CoverageStatus::Overstocked {
            0
        } else {
            (target_units - projected_stock - 1e-9).ceil().max(0.0) as u32
        };

        metrics.insert(
            sku,
            SkuMetric {
                sku,
                weekly_demand,
                monthly_demand,
                current_stock,
                pending_stock,
                projected_stock,
                projected_coverage,
                status,
                units_needed,
            },
        );
    }

    SkuMetrics { metrics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::inventory::SpringStock;
    use crate::model::sku::Firmness;

    fn thresholds() -> CoverageThresholds {
        CoverageThresholds {
            critical_months: 1.5,
            target_months: 3.0,
            overstock_months: 6.0,
        }
    }

    #[test]
    fn zero_demand_edge_cases() {
        assert_eq!(coverage_months(10.0, 0.0), f64::INFINITY);
        assert_eq!(coverage_months(0.0, 0.0), 0.0);
        assert_eq!(coverage_months(30.0, 10.0), 3.0);
    }

    #[test]
    fn classification_uses_configured_thresholds() {
        let t = thresholds();
        assert_eq!(classify(1.0, &t), CoverageStatus::Critical);
        assert_eq!(classify(1.5, &t), CoverageStatus::Normal);
        assert_eq!(classify(6.0, &t), CoverageStatus::Normal);
        assert_eq!(classify(6.1, &t), CoverageStatus::Overstocked);
        assert_eq!(classify(f64::INFINITY, &t), CoverageStatus::Overstocked);
    }

    #[test]
    fn empty_inventory_is_critical_everywhere() {
        let config = PlannerConfig::default();
        let metrics = calculate_metrics(&config, &Inventory::new(), &[], CoverageParams::default());
        assert_eq!(metrics.len(), 15);
        assert!(metrics.iter().all(|m| m.status == CoverageStatus::Critical));
        assert!(metrics.iter().all(|m| m.projected_stock == 0.0));
        assert_eq!(metrics.critical_sizes().len(), 5);
    }

    #[test]
    fn projected_stock_subtracts_lead_time_demand() {
        let config = PlannerConfig::default();
        let sku = Sku::new(Size::Queen, Firmness::Medium);
        let mut inventory = Inventory::new();
        inventory.set_spring(sku, 200);

        let metrics = calculate_metrics(&config, &inventory, &[], CoverageParams::default());
        let m = metrics.get(sku).unwrap();
        let expected = 200.0 - config.monthly_demand(sku) * config.lead_time_months();
        assert!((m.projected_stock - expected).abs() < 1e-9);
        assert_eq!(m.current_stock, 200);
    }

    #[test]
    fn only_pending_stock_landing_before_the_new_container_counts() {
        let config = PlannerConfig::default();
        let sku = Sku::new(Size::King, Firmness::Firm);
        let mut springs = SpringStock::new();
        springs.entry(Firmness::Firm).or_default().insert(Size::King, 60);

        let early = PendingArrival {
            arrival_index: 1.0,
            springs: springs.clone(),
        };
        let late = PendingArrival {
            arrival_index: config.lead_time_months() + 0.5,
            springs,
        };

        let metrics = calculate_metrics(
            &config,
            &Inventory::new(),
            &[early, late],
            CoverageParams::default(),
        );
        assert_eq!(metrics.get(sku).unwrap().pending_stock, 60);

        // Ordering a month later pulls the second container inside the horizon.
        let deferred = CoverageParams {
            order_offset_months: 1.0,
            demand_factor: 1.0,
        };
        let mut springs = SpringStock::new();
        springs.entry(Firmness::Firm).or_default().insert(Size::King, 60);
        let late = PendingArrival {
            arrival_index: config.lead_time_months() + 0.5,
            springs,
        };
        let metrics = calculate_metrics(&config, &Inventory::new(), &[late], deferred);
        assert_eq!(metrics.get(sku).unwrap().pending_stock, 60);
    }

    #[test]
    fn overstocked_skus_need_nothing() {
        let config = PlannerConfig::default();
        let sku = Sku::new(Size::Single, Firmness::Soft);
        let mut inventory = Inventory::new();
        inventory.set_spring(sku, 500);
        let metrics = calculate_metrics(&config, &inventory, &[], CoverageParams::default());
        let m = metrics.get(sku).unwrap();
        assert_eq!(m.status, CoverageStatus::Overstocked);
        assert_eq!(m.units_needed, 0);
        assert!(!m.is_eligible());
    }

    #[test]
    fn seasonal_factor_scales_demand() {
        let config = PlannerConfig::default();
        let sku = Sku::new(Size::Double, Firmness::Medium);
        let params = CoverageParams {
            order_offset_months: 0.0,
            demand_factor: 1.15,
        };
        let metrics = calculate_metrics(&config, &Inventory::new(), &[], params);
        let m = metrics.get(sku).unwrap();
        assert!((m.monthly_demand - config.monthly_demand(sku) * 1.15).abs() < 1e-9);
    }
}
