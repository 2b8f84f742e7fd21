// src/simulation/config.rs

use crate::error::PlannerError;
use crate::model::sku::{ComponentId, Firmness, Size, Sku};
use crate::strategy::implementations::{CoverageProportional, DominantSku};
use crate::strategy::traits::AllocationStrategy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const WEEKS_PER_YEAR: f64 = 52.0;
const MONTHS_PER_YEAR: f64 = 12.0;

/// Sales rate of one size and how it splits across firmnesses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeDemand {
    pub size: Size,
    /// Mattresses sold per month at a seasonal multiplier of 1.0.
    pub monthly_sales: f64,
    /// Share of the size's sales per firmness; expected to sum to 1.0.
    pub firmness_ratios: BTreeMap<Firmness, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub id: ComponentId,
    /// Units of this component consumed per spring unit.
    pub multiplier: f64,
    /// Supplier lot size. Carried for export layers; the engine never rounds to it.
    pub lot_size: u32,
    /// Sizes this component is not manufactured for. Orders there are always zero.
    #[serde(default)]
    pub excluded_sizes: Vec<Size>,
}

/// Small-size requirements of `component` are cut from `into` stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consolidation {
    pub component: ComponentId,
    pub from: Vec<Size>,
    pub into: Size,
}

/// Coverage thresholds in months of projected stock at arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageThresholds {
    /// Below this an SKU is CRITICAL.
    pub critical_months: f64,
    /// Level an order tops an SKU up to; drives `units_needed`.
    pub target_months: f64,
    /// Above this an SKU is OVERSTOCKED and receives no new stock.
    pub overstock_months: f64,
}

/// Which pallet allocation strategy builds a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum AllocationMode {
    CoverageProportional,
    DominantSku {
        /// Share of the unassigned pallets pushed per force-fill step.
        force_fill_fraction: f64,
        /// Pallets a low-volume size can take per cascade pass.
        cascade_cap: u32,
    },
}

impl AllocationMode {
    pub fn strategy(&self) -> Box<dyn AllocationStrategy> {
        match self {
            AllocationMode::CoverageProportional => Box::new(CoverageProportional::new()),
            AllocationMode::DominantSku {
                force_fill_fraction,
                cascade_cap,
            } => Box::new(DominantSku::new(*force_fill_fraction, *cascade_cap)),
        }
    }
}

impl Default for AllocationMode {
    fn default() -> Self {
        AllocationMode::CoverageProportional
    }
}

/// Tunables of the predictive reorder trigger. Each one is independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Step of the forward depletion walk, in months.
    pub resolution_months: f64,
    /// The tracked SKU "crosses the band" when it holds this many months of base demand.
    pub target_band_months: f64,
    /// An order fires when the ideal order instant is at most this far in the future.
    pub tolerance_months: f64,
    /// A pending container landing this close to the crossing suppresses a new order.
    pub landing_window_months: f64,
    /// Tracked stock below this with nothing in transit forces an order immediately.
    pub emergency_floor_units: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionLimits {
    pub months: u32,
    pub max_open_containers: usize,
}

/// Everything the engine needs to know about one product line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub product_line: String,
    pub sizes: Vec<SizeDemand>,
    /// Demand multiplier per calendar month, index 0 = January.
    pub seasonality: [f64; 12],
    pub lead_time_weeks: f64,
    pub pallet_capacity: u32,
    pub min_pallets: u32,
    pub max_pallets: u32,
    pub components: Vec<ComponentSpec>,
    #[serde(default)]
    pub consolidations: Vec<Consolidation>,
    pub coverage: CoverageThresholds,
    #[serde(default)]
    pub allocation: AllocationMode,
    pub trigger: TriggerConfig,
    pub projection: ProjectionLimits,
}

fn ratios(firm: f64, medium: f64, soft: f64) -> BTreeMap<Firmness, f64> {
    BTreeMap::from([
        (Firmness::Firm, firm),
        (Firmness::Medium, medium),
        (Firmness::Soft, soft),
    ])
}

fn size_demand(size: Size, monthly_sales: f64) -> SizeDemand {
    SizeDemand {
        size,
        monthly_sales,
        firmness_ratios: ratios(0.25, 0.55, 0.20),
    }
}

fn component(id: ComponentId, multiplier: f64, lot_size: u32, excluded: &[Size]) -> ComponentSpec {
    ComponentSpec {
        id,
        multiplier,
        lot_size,
        excluded_sizes: excluded.to_vec(),
    }
}

impl Default for PlannerConfig {
    /// The five-size pocket spring range.
    fn default() -> Self {
        let small = [Size::Double, Size::KingSingle, Size::Single];
        Self {
            product_line: "pocket_spring".to_string(),
            sizes: vec![
                size_demand(Size::King, 30.0),
                size_demand(Size::Queen, 42.0),
                size_demand(Size::Double, 14.0),
                size_demand(Size::KingSingle, 9.0),
                size_demand(Size::Single, 6.0),
            ],
            seasonality: [
                0.90, 0.85, 0.95, 1.00, 1.05, 1.10, 1.15, 1.10, 1.00, 1.00, 1.05, 0.85,
            ],
            lead_time_weeks: 10.0,
            pallet_capacity: 30,
            min_pallets: 4,
            max_pallets: 12,
            components: vec![
                component(ComponentId::MicroCoils, 1.0, 50, &small),
                component(ComponentId::ThinLatex, 1.0, 20, &small),
                component(ComponentId::Felt, 2.0, 20, &[]),
                component(ComponentId::TopPanel, 1.0, 10, &[]),
                component(ComponentId::BottomPanel, 1.0, 10, &[]),
                component(ComponentId::SidePanel, 1.0, 10, &[]),
            ],
            consolidations: vec![Consolidation {
                component: ComponentId::SidePanel,
                from: vec![Size::Single, Size::KingSingle],
                into: Size::Double,
            }],
            coverage: CoverageThresholds {
                critical_months: 1.5,
                target_months: 3.0,
                overstock_months: 6.0,
            },
            allocation: AllocationMode::CoverageProportional,
            trigger: TriggerConfig {
                resolution_months: 0.1,
                target_band_months: 1.0,
                tolerance_months: 0.5,
                landing_window_months: 1.0,
                emergency_floor_units: 20,
            },
            projection: ProjectionLimits {
                months: 12,
                max_open_containers: 2,
            },
        }
    }
}

impl PlannerConfig {
    /// The parallel two-size latex range (King and Queen only).
    pub fn king_queen_range() -> Self {
        Self {
            product_line: "latex".to_string(),
            sizes: vec![size_demand(Size::King, 18.0), size_demand(Size::Queen, 24.0)],
            components: vec![
                component(ComponentId::Felt, 2.0, 20, &[]),
                component(ComponentId::TopPanel, 1.0, 10, &[]),
                component(ComponentId::BottomPanel, 1.0, 10, &[]),
                component(ComponentId::SidePanel, 1.0, 10, &[]),
            ],
            consolidations: Vec::new(),
            ..Self::default()
        }
    }

    pub fn lead_time_months(&self) -> f64 {
        self.lead_time_weeks * MONTHS_PER_YEAR / WEEKS_PER_YEAR
    }

    /// Configured sizes in declaration order.
    pub fn size_list(&self) -> Vec<Size> {
        let mut sizes: Vec<Size> = self.sizes.iter().map(|s| s.size).collect();
        sizes.sort();
        sizes.dedup();
        sizes
    }

    pub fn size_demand(&self, size: Size) -> Option<&SizeDemand> {
        self.sizes.iter().find(|s| s.size == size)
    }

    /// Every configured SKU, sizes then firmnesses in declared order.
    pub fn skus(&self) -> Vec<Sku> {
        self.size_list()
            .into_iter()
            .flat_map(|size| Firmness::ALL.into_iter().map(move |f| Sku::new(size, f)))
            .collect()
    }

    pub fn size_monthly_demand(&self, size: Size) -> f64 {
        self.size_demand(size).map(|s| s.monthly_sales).unwrap_or(0.0)
    }

    pub fn firmness_ratio(&self, sku: Sku) -> f64 {
        self.size_demand(sku.size)
            .and_then(|s| s.firmness_ratios.get(&sku.firmness).copied())
            .unwrap_or(0.0)
    }

    /// Base monthly demand for one SKU (seasonal multiplier 1.0).
    pub fn monthly_demand(&self, sku: Sku) -> f64 {
        self.size_monthly_demand(sku.size) * self.firmness_ratio(sku)
    }

    pub fn weekly_demand(&self, sku: Sku) -> f64 {
        self.monthly_demand(sku) * MONTHS_PER_YEAR / WEEKS_PER_YEAR
    }

    /// Seasonal multiplier for a calendar month (wraps past December).
    pub fn seasonal_factor(&self, calendar_month: u32) -> f64 {
        self.seasonality[(calendar_month % 12) as usize]
    }

    /// Firmness with the largest sales share; ties resolve to declared order.
    pub fn dominant_firmness(&self, size: Size) -> Firmness {
        let mut best = Firmness::Medium;
        let mut best_ratio = f64::NEG_INFINITY;
        for firmness in Firmness::ALL {
            let ratio = self.firmness_ratio(Sku::new(size, firmness));
            if ratio > best_ratio {
                best = firmness;
                best_ratio = ratio;
            }
        }
        best
    }

    /// Selling sizes ordered by descending monthly volume.
    pub fn sizes_by_volume(&self) -> Vec<Size> {
        let mut sizes: Vec<Size> = self
            .size_list()
            .into_iter()
            .filter(|s| self.size_monthly_demand(*s) > 0.0)
            .collect();
        sizes.sort_by(|a, b| {
            self.size_monthly_demand(*b)
                .total_cmp(&self.size_monthly_demand(*a))
                .then(a.cmp(b))
        });
        sizes
    }

    /// The two highest-volume sizes.
    pub fn dominant_sizes(&self) -> Vec<Size> {
        self.sizes_by_volume().into_iter().take(2).collect()
    }

    /// The SKU the predictive trigger follows: dominant firmness of the top-volume size.
    pub fn tracked_sku(&self) -> Option<Sku> {
        self.sizes_by_volume()
            .first()
            .map(|size| Sku::new(*size, self.dominant_firmness(*size)))
    }

    pub fn component(&self, id: ComponentId) -> Option<&ComponentSpec> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn is_excluded(&self, id: ComponentId, size: Size) -> bool {
        self.component(id)
            .map(|c| c.excluded_sizes.contains(&size))
            .unwrap_or(true)
    }

    /// Size whose stock serves `size` for `id`, if it is consolidated away.
    pub fn consolidation_target(&self, id: ComponentId, size: Size) -> Option<Size> {
        self.consolidations
            .iter()
            .find(|c| c.component == id && c.from.contains(&size))
            .map(|c| c.into)
    }

    /// Sizes whose requirements for `id` are drawn from `size` stock, `size` included.
    pub fn sizes_served_by(&self, id: ComponentId, size: Size) -> Vec<Size> {
        let mut served = vec![size];
        for rule in self.consolidations.iter().filter(|c| c.component == id && c.into == size) {
            served.extend(rule.from.iter().copied());
        }
        served
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.sizes.is_empty() {
            return Err(PlannerError::invalid_config("sizes", "at least one size is required"));
        }
        let mut seen = BTreeSet::new();
        for entry in &self.sizes {
            if !seen.insert(entry.size) {
                return Err(PlannerError::invalid_config(
                    "sizes",
                    format!("{} is listed twice", entry.size),
                ));
            }
            if !entry.monthly_sales.is_finite() || entry.monthly_sales < 0.0 {
                return Err(PlannerError::invalid_config(
                    "sizes.monthly_sales",
                    format!("{} has rate {}", entry.size, entry.monthly_sales),
                ));
            }
            if entry
                .firmness_ratios
                .values()
                .any(|r| !r.is_finite() || *r < 0.0)
            {
                return Err(PlannerError::invalid_config(
                    "sizes.firmness_ratios",
                    format!("{} has a negative or non-finite ratio", entry.size),
                ));
            }
        }
        if let Some(m) = self.seasonality.iter().find(|m| !m.is_finite() || **m <= 0.0) {
            return Err(PlannerError::invalid_config(
                "seasonality",
                format!("multiplier {} must be positive", m),
            ));
        }
        if !self.lead_time_weeks.is_finite() || self.lead_time_weeks < 0.0 {
            return Err(PlannerError::invalid_config("lead_time_weeks", "must be non-negative"));
        }
        if self.pallet_capacity == 0 {
            return Err(PlannerError::invalid_config("pallet_capacity", "must be positive"));
        }
        if self.min_pallets == 0 || self.min_pallets > self.max_pallets {
            return Err(PlannerError::invalid_config(
                "min_pallets",
                format!("range {}..={} is empty", self.min_pallets, self.max_pallets),
            ));
        }
        let c = &self.coverage;
        if !(c.critical_months <= c.target_months && c.target_months <= c.overstock_months) {
            return Err(PlannerError::invalid_config(
                "coverage",
                "thresholds must satisfy critical <= target <= overstock",
            ));
        }
        if self.components.iter().any(|c| !c.multiplier.is_finite() || c.multiplier < 0.0) {
            return Err(PlannerError::invalid_config("components.multiplier", "must be non-negative"));
        }
        for rule in &self.consolidations {
            if rule.from.contains(&rule.into) {
                return Err(PlannerError::invalid_config(
                    "consolidations",
                    format!("{} cannot consolidate into itself", rule.into),
                ));
            }
        }
        if let AllocationMode::DominantSku {
            force_fill_fraction, ..
        } = self.allocation
        {
            if !(force_fill_fraction > 0.0 && force_fill_fraction <= 1.0) {
                return Err(PlannerError::invalid_config(
                    "allocation.force_fill_fraction",
                    "must be in (0, 1]",
                ));
            }
        }
        if self.trigger.resolution_months <= 0.0 || !self.trigger.resolution_months.is_finite() {
            return Err(PlannerError::invalid_config("trigger.resolution_months", "must be positive"));
        }
        if self.projection.months == 0 {
            return Err(PlannerError::invalid_config("projection.months", "must be positive"));
        }
        Ok(())
    }
}
