// src/strategy/traits.rs

use crate::model::sku::Size;
use crate::simulation::config::PlannerConfig;
use crate::strategy::coverage::SkuMetrics;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// What an allocation strategy gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct AllocationContext<'a> {
    pub config: &'a PlannerConfig,
    pub metrics: &'a SkuMetrics,
}

/// Splits a fixed number of pallets across sizes.
///
/// Strategies are stateless and `Send + Sync`, so one instance may serve
/// any number of concurrent planning calls.
pub trait AllocationStrategy: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns size → pallet count. Sizes that receive nothing may be absent.
    ///
    /// # Arguments
    /// * `total_pallets` - Container size in pallets.
    /// * `context` - Config and per-SKU metrics for the prospective arrival.
    fn allocate(&self, total_pallets: u32, context: &AllocationContext) -> BTreeMap<Size, u32>;
}
