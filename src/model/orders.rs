// src/model/orders.rs

use crate::error::PlannerError;
use crate::model::inventory::{ComponentStock, SpringStock};
use crate::model::sku::{ComponentId, Firmness, Size, Sku};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PalletType {
    /// A single firmness.
    Pure,
    /// Several firmnesses of the same size.
    Mixed,
    /// The lone pallet sent to an urgent low-volume size.
    Critical,
}

/// One fixed-capacity shipping batch of a single size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pallet {
    pub id: u32,
    pub size: Size,
    pub pallet_type: PalletType,
    pub firmness_breakdown: BTreeMap<Firmness, u32>,
    pub total: u32,
}

impl Pallet {
    pub fn units(&self, firmness: Firmness) -> u32 {
        self.firmness_breakdown.get(&firmness).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderMetadata {
    pub product_line: String,
    pub strategy: String,
    pub total_pallets: u32,
    pub pallet_capacity: u32,
    pub pallets_by_size: BTreeMap<Size, u32>,
    pub critical_skus: Vec<Sku>,
}

/// A container's worth of springs: the per-SKU aggregate and the pallets
/// that physically carry it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpringOrder {
    pub springs: SpringStock,
    pub pallets: Vec<Pallet>,
    pub metadata: OrderMetadata,
}

impl SpringOrder {
    /// A structurally valid order with nothing in it.
    pub fn empty(product_line: &str, pallet_capacity: u32) -> Self {
        Self {
            springs: SpringStock::new(),
            pallets: Vec::new(),
            metadata: OrderMetadata {
                product_line: product_line.to_string(),
                pallet_capacity,
                ..OrderMetadata::default()
            },
        }
    }

    /// Builds the aggregate from pallets so the two always agree.
    pub fn from_pallets(pallets: Vec<Pallet>, metadata: OrderMetadata) -> Self {
        let mut springs = SpringStock::new();
        for pallet in &pallets {
            for (firmness, qty) in &pallet.firmness_breakdown {
                if *qty == 0 {
                    continue;
                }
                *springs
                    .entry(*firmness)
                    .or_default()
                    .entry(pallet.size)
                    .or_default() += qty;
            }
        }
        Self {
            springs,
            pallets,
            metadata,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pallets.is_empty()
    }

    pub fn total_pallets(&self) -> u32 {
        self.metadata.total_pallets
    }

    pub fn quantity(&self, sku: Sku) -> u32 {
        self.springs
            .get(&sku.firmness)
            .and_then(|by_size| by_size.get(&sku.size))
            .copied()
            .unwrap_or(0)
    }

    pub fn size_total(&self, size: Size) -> u32 {
        self.springs
            .values()
            .filter_map(|by_size| by_size.get(&size))
            .sum()
    }

    pub fn total_springs(&self) -> u32 {
        self.springs.values().flat_map(|by_size| by_size.values()).sum()
    }

    /// Checks the pallet and aggregate invariants.
    pub fn verify(&self) -> Result<(), PlannerError> {
        let capacity = self.metadata.pallet_capacity;
        if self.pallets.len() as u32 != self.metadata.total_pallets {
            return Err(PlannerError::Inconsistent(format!(
                "{} pallets emitted for a {}-pallet order",
                self.pallets.len(),
                self.metadata.total_pallets
            )));
        }
        for pallet in &self.pallets {
            let sum: u32 = pallet.firmness_breakdown.values().sum();
            if sum != capacity || pallet.total != capacity {
                return Err(PlannerError::Inconsistent(format!(
                    "pallet {} holds {} (total field {}), capacity is {}",
                    pallet.id, sum, pallet.total, capacity
                )));
            }
        }
        let carried: u32 = self.pallets.iter().map(|p| p.total).sum();
        if carried != self.metadata.total_pallets * capacity {
            return Err(PlannerError::Inconsistent(format!(
                "pallets carry {} springs, expected {}",
                carried,
                self.metadata.total_pallets * capacity
            )));
        }
        if carried != self.total_springs() {
            return Err(PlannerError::Inconsistent(format!(
                "aggregate lists {} springs but pallets carry {}",
                self.total_springs(),
                carried
            )));
        }
        Ok(())
    }
}

/// Downstream parts to order alongside a spring container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentOrder {
    pub quantities: ComponentStock,
}

impl ComponentOrder {
    pub fn quantity(&self, id: ComponentId, size: Size) -> u32 {
        self.quantities
            .get(&id)
            .and_then(|by_size| by_size.get(&size))
            .copied()
            .unwrap_or(0)
    }

    pub fn set(&mut self, id: ComponentId, size: Size, quantity: u32) {
        self.quantities.entry(id).or_default().insert(size, quantity);
    }

    pub fn total(&self) -> u32 {
        self.quantities.values().flat_map(|by_size| by_size.values()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    /// Tracked stock under the emergency floor with nothing in transit.
    Emergency,
    /// The ideal order instant has already passed.
    Urgent,
    /// Placed on schedule.
    Planned,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Emergency => "emergency",
            Urgency::Urgent => "urgent",
            Urgency::Planned => "planned",
        }
    }
}

/// An order placed by the annual projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerOrder {
    pub order_month: u32,
    /// `order_month` plus the lead time in months; usually fractional.
    pub arrival_month: f64,
    pub pallet_count: u32,
    pub spring_order: SpringOrder,
    pub component_order: ComponentOrder,
    pub reason: String,
    pub urgency: Urgency,
    pub driving_sizes: Vec<Size>,
}

impl ContainerOrder {
    /// The simulation tick on which this container is unloaded.
    pub fn arrival_tick(&self) -> u32 {
        self.arrival_month.floor().max(0.0) as u32
    }
}

/// Springs known to be in transit, `arrival_index` months from now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingArrival {
    pub arrival_index: f64,
    pub springs: SpringStock,
}

impl PendingArrival {
    pub fn quantity(&self, sku: Sku) -> u32 {
        self.springs
            .get(&sku.firmness)
            .and_then(|by_size| by_size.get(&sku.size))
            .copied()
            .unwrap_or(0)
    }
}
