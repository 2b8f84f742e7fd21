// src/simulation/engine.rs

use crate::io::demand::calendar_month;
use crate::model::inventory::Inventory;
use crate::model::orders::{ContainerOrder, SpringOrder, Urgency};
use crate::model::queues::PendingContainers;
use crate::model::sku::Size;
use crate::simulation::config::PlannerConfig;
use crate::simulation::trigger::{self, TriggerDecision};
use crate::strategy::components::derive_component_order;
use crate::strategy::coverage::{calculate_metrics, coverage_months, CoverageParams, SkuMetrics};
use crate::strategy::order_builder::plan_container;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// How a triggered container is filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderMode {
    /// Sized and allocated from the coverage at the trigger month.
    Dynamic,
    /// Every container repeats this order (what-if runs).
    Repeat(SpringOrder),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRequest {
    /// Calendar month (0 = January) of projection month 0.
    pub start_calendar_month: u32,
    pub order_mode: OrderMode,
}

impl Default for ProjectionRequest {
    fn default() -> Self {
        Self {
            start_calendar_month: 0,
            order_mode: OrderMode::Dynamic,
        }
    }
}

/// Working inventory captured after arrivals and ordering, before sales.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventorySnapshot {
    pub month: u32,
    pub calendar_month: u32,
    pub inventory: Inventory,
    /// Months of on-hand stock per size at this month's seasonal rate.
    pub coverage: Vec<(Size, f64)>,
    pub critical_sizes: Vec<Size>,
    /// Sold sizes with no springs left.
    pub stockout_sizes: Vec<Size>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockoutEvent {
    pub month: u32,
    pub size: Size,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualProjection {
    pub snapshots: Vec<InventorySnapshot>,
    pub orders: Vec<ContainerOrder>,
    pub stockouts: Vec<StockoutEvent>,
}

impl AnnualProjection {
    pub fn total_pallets(&self) -> u32 {
        self.orders.iter().map(|o| o.pallet_count).sum()
    }

    pub fn orders_for_month(&self, month: u32) -> Vec<&ContainerOrder> {
        self.orders.iter().filter(|o| o.order_month == month).collect()
    }

    pub fn first_stockout(&self) -> Option<StockoutEvent> {
        self.stockouts.first().copied()
    }

    pub fn has_stockout(&self) -> bool {
        !self.stockouts.is_empty()
    }
}

/// Month-by-month replay of sales, arrivals and container triggers over one
/// working copy of the inventory.
pub struct ProjectionSimulation<'a> {
    config: &'a PlannerConfig,
    request: ProjectionRequest,

    // Working state, owned by the loop
    inventory: Inventory,
    pending: PendingContainers,

    pub current_month: u32,
    pub snapshots: Vec<InventorySnapshot>,
    pub orders: Vec<ContainerOrder>,
    pub stockouts: Vec<StockoutEvent>,
}

impl<'a> ProjectionSimulation<'a> {
    pub fn new(config: &'a PlannerConfig, inventory: &Inventory, request: ProjectionRequest) -> Self {
        Self {
            config,
            request,
            inventory: inventory.clone(),
            pending: PendingContainers::new(config.projection.max_open_containers),
            current_month: 0,
            snapshots: Vec::new(),
            orders: Vec::new(),
            stockouts: Vec::new(),
        }
    }

    pub fn run(&mut self) {
        while self.current_month < self.config.projection.months {
            self.step();
        }
        // A size that sells out during the last month shows up only here.
        let end = self.current_month;
        for size in self.config.size_list() {
            if self.config.size_monthly_demand(size) > 0.0 && self.inventory.size_springs(size) == 0 {
                self.stockouts.push(StockoutEvent { month: end, size });
            }
        }
    }

    pub fn into_projection(self) -> AnnualProjection {
        AnnualProjection {
            snapshots: self.snapshots,
            orders: self.orders,
            stockouts: self.stockouts,
        }
    }

    fn step(&mut self) {
        let month = self.current_month;
        let calendar = calendar_month(self.request.start_calendar_month, month);
        let factor = self.config.seasonal_factor(calendar);

        // =================================================================
        // PHASE 1: ARRIVALS
        // Containers unloading this month join the working stock.
        // =================================================================
        for arrived in self.pending.pop_arrivals(month) {
            self.inventory.receive_springs(&arrived.spring_order.springs);
            self.inventory.receive_components(&arrived.component_order);
            debug!(month, ordered_in = arrived.order_month, "container unloaded");
        }

        // =================================================================
        // PHASE 2: COVERAGE at this month's seasonal rate
        // =================================================================
        let in_transit = self.pending.arrivals_from(month);
        let params = CoverageParams {
            order_offset_months: 0.0,
            demand_factor: factor,
        };
        let metrics = calculate_metrics(self.config, &self.inventory, &in_transit, params);

        // =================================================================
        // PHASE 3: TRIGGER & ORDER
        // =================================================================
        if self.pending.has_capacity() {
            if let Some(sku) = self.config.tracked_sku() {
                let decision = trigger::evaluate(
                    self.config,
                    sku,
                    self.inventory.spring(sku),
                    month,
                    self.request.start_calendar_month,
                    &self.pending,
                );
                if let TriggerDecision::Order { urgency, reason, .. } = decision {
                    if let Some(order) = self.place_order(month, &metrics, params, urgency, reason) {
                        info!(
                            month,
                            pallets = order.pallet_count,
                            arrival = order.arrival_month,
                            urgency = order.urgency.as_str(),
                            reason = %order.reason,
                            "container ordered"
                        );
                        self.pending.push_departure(order.clone());
                        self.orders.push(order);
                    }
                }
            }
        }

        // =================================================================
        // PHASE 4: SNAPSHOT, then sell the month
        // =================================================================
        self.record_snapshot(month, calendar, factor, &metrics);
        let shortfall = self.inventory.consume_month(self.config, factor);
        if !shortfall.is_empty() {
            debug!(month, short_skus = shortfall.springs.len(), "demand not fully met");
        }

        self.current_month += 1;
    }

    fn place_order(
        &self,
        month: u32,
        metrics: &SkuMetrics,
        params: CoverageParams,
        urgency: Urgency,
        reason: String,
    ) -> Option<ContainerOrder> {
        let spring_order = match &self.request.order_mode {
            OrderMode::Repeat(template) => template.clone(),
            OrderMode::Dynamic => {
                let in_transit = self.pending.arrivals_from(month);
                plan_container(self.config, &self.inventory, &in_transit, params, None).spring_order
            }
        };
        if spring_order.is_empty() {
            warn!(month, "trigger fired but the container came out empty, skipping");
            return None;
        }
        // Parts already at sea count, so overlapping containers do not double up.
        let component_order = derive_component_order(self.config, &spring_order, &self.position());

        let mut driving_sizes = metrics.critical_sizes();
        if driving_sizes.is_empty() {
            driving_sizes.extend(self.config.tracked_sku().map(|sku| sku.size));
        }

        Some(ContainerOrder {
            order_month: month,
            arrival_month: month as f64 + self.config.lead_time_months(),
            pallet_count: spring_order.total_pallets(),
            spring_order,
            component_order,
            reason,
            urgency,
            driving_sizes,
        })
    }

    /// On-hand stock plus everything still in transit.
    fn position(&self) -> Inventory {
        let mut position = self.inventory.clone();
        for open in self.pending.iter() {
            position.receive_springs(&open.spring_order.springs);
            position.receive_components(&open.component_order);
        }
        position
    }

    fn record_snapshot(&mut self, month: u32, calendar: u32, factor: f64, metrics: &SkuMetrics) {
        let mut coverage = Vec::new();
        let mut stockout_sizes = Vec::new();
        for size in self.config.size_list() {
            let demand = self.config.size_monthly_demand(size) * factor;
            let on_hand = self.inventory.size_springs(size);
            coverage.push((size, coverage_months(on_hand as f64, demand)));
            if demand > 0.0 && on_hand == 0 {
                stockout_sizes.push(size);
                self.stockouts.push(StockoutEvent { month, size });
            }
        }

        self.snapshots.push(InventorySnapshot {
            month,
            calendar_month: calendar,
            inventory: self.inventory.clone(),
            coverage,
            critical_sizes: metrics.critical_sizes(),
            stockout_sizes,
        });
    }
}

/// Projects `inventory` forward over the configured horizon. The caller's
/// inventory is copied, never touched.
#[instrument(skip(config, inventory, request), fields(product_line = %config.product_line))]
pub fn project_year(config: &PlannerConfig, inventory: &Inventory, request: ProjectionRequest) -> AnnualProjection {
    let mut sim = ProjectionSimulation::new(config, inventory, request);
    sim.run();
    let projection = sim.into_projection();
    info!(
        orders = projection.orders.len(),
        pallets = projection.total_pallets(),
        stockouts = projection.stockouts.len(),
        "projection finished"
    );
    projection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sku::{Firmness, Sku};

    fn stocked(config: &PlannerConfig, units: u32) -> Inventory {
        let mut inventory = Inventory::new();
        for sku in config.skus() {
            inventory.set_spring(sku, units);
        }
        inventory
    }

    #[test]
    fn empty_warehouse_orders_in_month_zero() {
        let config = PlannerConfig::default();
        let projection = project_year(&config, &Inventory::new(), ProjectionRequest::default());

        assert_eq!(projection.snapshots.len(), 12);
        let first = &projection.orders[0];
        assert_eq!(first.order_month, 0);
        assert_eq!(first.urgency, Urgency::Emergency);
        assert!(first.pallet_count >= config.min_pallets);
        assert!(projection.has_stockout());
        assert_eq!(projection.first_stockout().map(|s| s.month), Some(0));
    }

    #[test]
    fn never_more_than_two_containers_at_sea() {
        let config = PlannerConfig::default();
        let projection = project_year(&config, &Inventory::new(), ProjectionRequest::default());
        for month in 0..12 {
            let open = projection
                .orders
                .iter()
                .filter(|o| o.order_month <= month && o.arrival_tick() > month)
                .count();
            assert!(open <= config.projection.max_open_containers, "month {}", month);
        }
    }

    #[test]
    fn arrivals_show_up_in_snapshots() {
        let config = PlannerConfig::default();
        let projection = project_year(&config, &Inventory::new(), ProjectionRequest::default());
        let first = &projection.orders[0];
        let landed = &projection.snapshots[first.arrival_tick() as usize];
        assert!(landed.inventory.total_springs() > 0);
    }

    #[test]
    fn deep_stock_needs_nothing() {
        let config = PlannerConfig::default();
        let projection = project_year(&config, &stocked(&config, 5_000), ProjectionRequest::default());
        assert!(projection.orders.is_empty());
        assert!(!projection.has_stockout());
        assert_eq!(projection.total_pallets(), 0);
    }

    #[test]
    fn repeat_mode_reuses_the_template() {
        let config = PlannerConfig::default();
        let template = plan_container(&config, &Inventory::new(), &[], CoverageParams::default(), Some(10))
            .spring_order;
        let request = ProjectionRequest {
            start_calendar_month: 3,
            order_mode: OrderMode::Repeat(template.clone()),
        };
        let projection = project_year(&config, &Inventory::new(), request);
        assert!(!projection.orders.is_empty());
        for order in &projection.orders {
            assert_eq!(order.spring_order, template);
            assert_eq!(order.pallet_count, 10);
        }
        assert_eq!(projection.snapshots[0].calendar_month, 3);
    }

    #[test]
    fn stock_is_sold_between_snapshots() {
        let config = PlannerConfig::default();
        let sku = Sku::new(Size::Queen, Firmness::Medium);
        let projection = project_year(&config, &stocked(&config, 2_000), ProjectionRequest::default());
        let first = projection.snapshots[0].inventory.spring(sku);
        let second = projection.snapshots[1].inventory.spring(sku);
        assert_eq!(first, 2_000);
        assert_eq!(first - second, (config.monthly_demand(sku) * config.seasonal_factor(0)).round() as u32);
    }

    #[test]
    fn zero_trigger_step_still_finishes_the_year() {
        let mut config = PlannerConfig::default();
        config.trigger.resolution_months = 0.0;
        let mut inventory = Inventory::new();
        inventory.set_spring(Sku::new(Size::Queen, Firmness::Medium), 200);

        let projection = project_year(&config, &inventory, ProjectionRequest::default());
        assert_eq!(projection.snapshots.len(), 12);
        // only the emergency floor can still fire
        assert!(projection.orders.iter().all(|o| o.urgency == Urgency::Emergency));
    }

    #[test]
    fn sellout_in_the_last_month_is_flagged() {
        let mut config = PlannerConfig::default();
        config.projection.months = 1;
        let mut inventory = stocked(&config, 1_000);
        for firmness in Firmness::ALL {
            let sku = Sku::new(Size::Queen, firmness);
            let month_of_sales = (config.monthly_demand(sku) * config.seasonal_factor(0)).round();
            inventory.set_spring(sku, month_of_sales as u32);
        }

        let projection = project_year(&config, &inventory, ProjectionRequest::default());
        assert!(projection.snapshots[0].stockout_sizes.is_empty());
        assert_eq!(
            projection.stockouts,
            vec![StockoutEvent {
                month: 1,
                size: Size::Queen
            }]
        );
    }

    #[test]
    fn parts_track_springs_through_the_year() {
        let config = PlannerConfig::default();
        let projection = project_year(&config, &Inventory::new(), ProjectionRequest::default());
        assert!(projection.orders.len() >= 2);

        for snapshot in &projection.snapshots {
            let stock = &snapshot.inventory;
            for spec in &config.components {
                for size in config.size_list() {
                    if config.is_excluded(spec.id, size)
                        || config.consolidation_target(spec.id, size).is_some()
                    {
                        continue;
                    }
                    let served = config.sizes_served_by(spec.id, size);
                    let springs: u32 = served.iter().map(|s| stock.size_springs(*s)).sum();
                    let demand: f64 = served.iter().map(|s| config.size_monthly_demand(*s)).sum();
                    let parts = stock.component(spec.id, size) as f64;

                    let spring_months = coverage_months(springs as f64, demand);
                    let part_months = coverage_months(parts, demand * spec.multiplier);
                    assert!(
                        (spring_months - part_months).abs() <= 0.1,
                        "month {} {} {}: springs {:.2} vs parts {:.2}",
                        snapshot.month,
                        spec.id,
                        size,
                        spring_months,
                        part_months
                    );
                }
            }
        }
    }
}
