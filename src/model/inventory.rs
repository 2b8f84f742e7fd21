// src/model/inventory.rs

use crate::model::orders::ComponentOrder;
use crate::model::sku::{ComponentId, Firmness, Size, Sku};
use crate::simulation::config::PlannerConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// firmness → size → units
pub type SpringStock = BTreeMap<Firmness, BTreeMap<Size, u32>>;
/// component → size → units
pub type ComponentStock = BTreeMap<ComponentId, BTreeMap<Size, u32>>;

/// On-hand stock of springs and the components built around them.
///
/// Callers own their inventory. The engine only reads it, except for the
/// projection's private working copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub springs: SpringStock,
    #[serde(default)]
    pub components: ComponentStock,
}

/// Units a month's demand wanted but the shelf could not supply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shortfall {
    pub springs: BTreeMap<Sku, u32>,
    pub components: BTreeMap<(ComponentId, Size), u32>,
}

impl Shortfall {
    pub fn is_empty(&self) -> bool {
        self.springs.is_empty() && self.components.is_empty()
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spring(&self, sku: Sku) -> u32 {
        self.springs
            .get(&sku.firmness)
            .and_then(|by_size| by_size.get(&sku.size))
            .copied()
            .unwrap_or(0)
    }

    pub fn set_spring(&mut self, sku: Sku, quantity: u32) {
        self.springs
            .entry(sku.firmness)
            .or_default()
            .insert(sku.size, quantity);
    }

    /// All firmnesses of one size.
    pub fn size_springs(&self, size: Size) -> u32 {
        self.springs
            .values()
            .filter_map(|by_size| by_size.get(&size))
            .sum()
    }

    pub fn total_springs(&self) -> u32 {
        self.springs.values().flat_map(|by_size| by_size.values()).sum()
    }

    pub fn component(&self, id: ComponentId, size: Size) -> u32 {
        self.components
            .get(&id)
            .and_then(|by_size| by_size.get(&size))
            .copied()
            .unwrap_or(0)
    }

    pub fn set_component(&mut self, id: ComponentId, size: Size, quantity: u32) {
        self.components.entry(id).or_default().insert(size, quantity);
    }

    /// Adds an arriving spring shipment on top of current stock.
    pub fn receive_springs(&mut self, springs: &SpringStock) {
        for (firmness, by_size) in springs {
            for (size, qty) in by_size {
                let sku = Sku::new(*size, *firmness);
                self.set_spring(sku, self.spring(sku).saturating_add(*qty));
            }
        }
    }

    pub fn receive_components(&mut self, order: &ComponentOrder) {
        for (id, by_size) in &order.quantities {
            for (size, qty) in by_size {
                self.set_component(*id, *size, self.component(*id, *size).saturating_add(*qty));
            }
        }
    }

    /// Removes up to `quantity` springs. Returns the unmet part.
    pub fn take_spring(&mut self, sku: Sku, quantity: u32) -> u32 {
        let on_hand = self.spring(sku);
        self.set_spring(sku, on_hand.saturating_sub(quantity));
        quantity.saturating_sub(on_hand)
    }

    pub fn take_component(&mut self, id: ComponentId, size: Size, quantity: u32) -> u32 {
        let on_hand = self.component(id, size);
        self.set_component(id, size, on_hand.saturating_sub(quantity));
        quantity.saturating_sub(on_hand)
    }

    /// Depletes one month of sales at `demand_factor` times the base rate.
    ///
    /// Components follow the springs actually sold, times their multiplier,
    /// so a size that runs dry stops using parts too. Consolidated sizes draw
    /// from the consolidation target's stock, the same mapping the ordering
    /// side uses.
    pub fn consume_month(&mut self, config: &PlannerConfig, demand_factor: f64) -> Shortfall {
        let mut shortfall = Shortfall::default();
        let mut sold: BTreeMap<Size, u32> = BTreeMap::new();

        for sku in config.skus() {
            let wanted = (config.monthly_demand(sku) * demand_factor).round() as u32;
            let missing = self.take_spring(sku, wanted);
            if missing > 0 {
                shortfall.springs.insert(sku, missing);
            }
            *sold.entry(sku.size).or_default() += wanted - missing;
        }

        for spec in &config.components {
            for (size, springs) in &sold {
                if *springs == 0 || config.is_excluded(spec.id, *size) {
                    continue;
                }
                let draw_from = config.consolidation_target(spec.id, *size).unwrap_or(*size);
                let wanted = (*springs as f64 * spec.multiplier).round() as u32;
                let missing = self.take_component(spec.id, draw_from, wanted);
                if missing > 0 {
                    *shortfall.components.entry((spec.id, draw_from)).or_default() += missing;
                }
            }
        }

        shortfall
    }
}
