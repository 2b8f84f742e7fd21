// src/strategy/order_builder.rs

use crate::model::inventory::Inventory;
use crate::model::orders::{ComponentOrder, OrderMetadata, PendingArrival, SpringOrder};
use crate::model::sku::Size;
use crate::simulation::config::PlannerConfig;
use crate::strategy::components::derive_component_order;
use crate::strategy::coverage::{calculate_metrics, CoverageParams, SkuMetrics};
use crate::strategy::packing::{pack_size, FirmnessLine};
use crate::strategy::traits::AllocationContext;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Everything worked out for one prospective container.
#[derive(Debug, Clone)]
pub struct ContainerPlan {
    pub metrics: SkuMetrics,
    pub allocation: BTreeMap<Size, u32>,
    pub spring_order: SpringOrder,
    pub component_order: ComponentOrder,
}

/// Container size that covers the eligible unmet need, clamped to the
/// allowed pallet range.
pub fn recommended_pallet_count(config: &PlannerConfig, metrics: &SkuMetrics) -> u32 {
    let need: u32 = metrics
        .iter()
        .filter(|m| m.is_eligible())
        .map(|m| m.units_needed)
        .sum();
    let capacity = config.pallet_capacity.max(1);
    let pallets = need.div_ceil(capacity);
    pallets.clamp(config.min_pallets, config.max_pallets.max(config.min_pallets))
}

/// Allocates, packs and aggregates a container of `total_pallets`.
///
/// A pallet count outside the configured range yields an empty order.
#[instrument(skip(config, metrics), fields(product_line = %config.product_line))]
pub fn build_spring_order(config: &PlannerConfig, metrics: &SkuMetrics, total_pallets: u32) -> SpringOrder {
    if total_pallets < config.min_pallets || total_pallets > config.max_pallets {
        warn!(
            total_pallets,
            min = config.min_pallets,
            max = config.max_pallets,
            "pallet count out of range, returning an empty order"
        );
        return SpringOrder::empty(&config.product_line, config.pallet_capacity);
    }

    let strategy = config.allocation.strategy();
    let context = AllocationContext { config, metrics };
    let allocation = strategy.allocate(total_pallets, &context);
    debug!(strategy = strategy.name(), ?allocation, "pallets allocated");

    build_from_allocation(config, metrics, &allocation, strategy.name())
}

/// Packs an explicit size → pallet allocation into a spring order.
pub fn build_from_allocation(
    config: &PlannerConfig,
    metrics: &SkuMetrics,
    allocation: &BTreeMap<Size, u32>,
    strategy_name: &str,
) -> SpringOrder {
    let capacity = config.pallet_capacity;
    let dominant = config.dominant_sizes();
    let mut pallets = Vec::new();

    for size in config.size_list() {
        let count = allocation.get(&size).copied().unwrap_or(0);
        if count == 0 {
            continue;
        }
        let lines: Vec<FirmnessLine> = metrics.for_size(size).map(FirmnessLine::from_metric).collect();
        let critical = !dominant.contains(&size) && metrics.size_summary(size).has_critical;
        pallets.extend(pack_size(size, count, &lines, capacity, critical));
    }
    for (i, pallet) in pallets.iter_mut().enumerate() {
        pallet.id = i as u32 + 1;
    }

    let pallets_by_size: BTreeMap<Size, u32> = allocation
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(size, count)| (*size, *count))
        .collect();
    let metadata = OrderMetadata {
        product_line: config.product_line.clone(),
        strategy: strategy_name.to_string(),
        total_pallets: pallets_by_size.values().sum(),
        pallet_capacity: capacity,
        pallets_by_size,
        critical_skus: metrics.critical_skus(),
    };

    let order = SpringOrder::from_pallets(pallets, metadata);
    debug_assert!(order.verify().is_ok(), "{:?}", order.verify());
    order
}

/// Coverage, allocation, packing and component derivation in one call.
///
/// `total_pallets` of `None` sizes the container with
/// [`recommended_pallet_count`].
#[instrument(skip(config, inventory, pending), fields(product_line = %config.product_line))]
pub fn plan_container(
    config: &PlannerConfig,
    inventory: &Inventory,
    pending: &[PendingArrival],
    params: CoverageParams,
    total_pallets: Option<u32>,
) -> ContainerPlan {
    let metrics = calculate_metrics(config, inventory, pending, params);
    let total = total_pallets.unwrap_or_else(|| recommended_pallet_count(config, &metrics));
    let spring_order = build_spring_order(config, &metrics, total);
    let component_order = derive_component_order(config, &spring_order, inventory);

    ContainerPlan {
        allocation: spring_order.metadata.pallets_by_size.clone(),
        metrics,
        spring_order,
        component_order,
    }
}

/// One row of a human-readable order summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeLine {
    pub size: Size,
    pub pallets: u32,
    pub springs: u32,
}

pub fn summarize(order: &SpringOrder) -> Vec<SizeLine> {
    order
        .metadata
        .pallets_by_size
        .iter()
        .map(|(size, pallets)| SizeLine {
            size: *size,
            pallets: *pallets,
            springs: order.size_total(*size),
        })
        .collect()
}
