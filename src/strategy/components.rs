// src/strategy/components.rs

//! Component orders that keep parts and springs running out together.

use crate::model::inventory::Inventory;
use crate::model::orders::{ComponentOrder, SpringOrder};
use crate::model::sku::{ComponentId, Size};
use crate::simulation::config::PlannerConfig;
use crate::strategy::coverage::coverage_months;
use serde::Serialize;

fn ceil_units(x: f64) -> u32 {
    (x - 1e-9).ceil().max(0.0) as u32
}

/// Derives the component order that accompanies `spring_order`.
///
/// Each component is topped up to `ceil(springs after arrival × multiplier)`
/// per size, so its runway in months matches the springs' runway. Sizes a
/// component is not made for are forced to zero. A consolidated component is
/// pooled: the size it is cut from is topped up against the springs of every
/// size it serves, net of all stock already held for them.
pub fn derive_component_order(
    config: &PlannerConfig,
    spring_order: &SpringOrder,
    inventory: &Inventory,
) -> ComponentOrder {
    let mut order = ComponentOrder::default();
    let sizes = config.size_list();

    for spec in &config.components {
        for size in &sizes {
            if config.is_excluded(spec.id, *size)
                || config.consolidation_target(spec.id, *size).is_some()
            {
                order.set(spec.id, *size, 0);
                continue;
            }
            let served: Vec<Size> = config
                .sizes_served_by(spec.id, *size)
                .into_iter()
                .filter(|s| sizes.contains(s))
                .collect();
            let springs_after: u32 = served
                .iter()
                .map(|s| inventory.size_springs(*s) + spring_order.size_total(*s))
                .sum();
            let held: u32 = served.iter().map(|s| inventory.component(spec.id, *s)).sum();
            let target = ceil_units(springs_after as f64 * spec.multiplier);
            order.set(spec.id, *size, target.saturating_sub(held));
        }
    }

    order
}

/// Months of stock after arrival for springs and for one component held at `size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Runway {
    pub spring_months: f64,
    pub component_months: f64,
}

impl Runway {
    pub fn gap(&self) -> f64 {
        (self.spring_months - self.component_months).abs()
    }
}

/// Runway of springs versus `id` for the stock held at `size`.
///
/// Consolidated stock is compared against the springs of every size it
/// serves. Returns `None` where the component is not stocked at `size`.
pub fn component_runway(
    config: &PlannerConfig,
    inventory: &Inventory,
    spring_order: &SpringOrder,
    component_order: &ComponentOrder,
    id: ComponentId,
    size: Size,
) -> Option<Runway> {
    let spec = config.component(id)?;
    if config.is_excluded(id, size) || config.consolidation_target(id, size).is_some() {
        return None;
    }

    let sizes = config.size_list();
    let served: Vec<Size> = config
        .sizes_served_by(id, size)
        .into_iter()
        .filter(|s| sizes.contains(s))
        .collect();
    let springs_after: f64 = served
        .iter()
        .map(|s| (inventory.size_springs(*s) + spring_order.size_total(*s)) as f64)
        .sum();
    let spring_demand: f64 = served.iter().map(|s| config.size_monthly_demand(*s)).sum();
    let component_after: f64 = served
        .iter()
        .map(|s| inventory.component(id, *s) as f64)
        .sum::<f64>()
        + component_order.quantity(id, size) as f64;

    Some(Runway {
        spring_months: coverage_months(springs_after, spring_demand),
        component_months: coverage_months(component_after, spring_demand * spec.multiplier),
    })
}
