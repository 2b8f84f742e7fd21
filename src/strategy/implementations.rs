// src/strategy/implementations.rs

use crate::model::sku::{Size, Sku};
use crate::strategy::coverage::{coverage_months, SizeSummary};
use crate::strategy::traits::{AllocationContext, AllocationStrategy};
use std::collections::BTreeMap;
use tracing::debug;

const EPSILON: f64 = 1e-9;

fn add(allocation: &mut BTreeMap<Size, u32>, size: Size, pallets: u32) {
    if pallets > 0 {
        *allocation.entry(size).or_default() += pallets;
    }
}

fn allocated(allocation: &BTreeMap<Size, u32>, size: Size) -> u32 {
    allocation.get(&size).copied().unwrap_or(0)
}

/// Size coverage once `pallets` more pallets of it have landed.
fn coverage_after(summary: &SizeSummary, pallets: u32, capacity: f64) -> f64 {
    coverage_months(
        summary.projected_stock + pallets as f64 * capacity,
        summary.monthly_demand,
    )
}

// =========================================================================
// 1. Coverage-Proportional Allocation
// =========================================================================

/// Splits the container across sizes in proportion to their demand.
///
/// A size's weight is the monthly demand of its non-overstocked firmnesses,
/// so the ideal share is `N × size demand / total demand`. Fractional shares are floored
/// and the leftovers handed out by largest remainder, with sizes holding a
/// CRITICAL firmness served first. Anything still unassigned goes to the
/// lowest-coverage size that stays out of OVERSTOCKED; if none qualifies the
/// rest is left unassigned.
#[derive(Debug, Clone, Default)]
pub struct CoverageProportional;

impl CoverageProportional {
    pub fn new() -> Self {
        Self
    }
}

impl AllocationStrategy for CoverageProportional {
    fn name(&self) -> &'static str {
        "coverage_proportional"
    }

    fn allocate(&self, total_pallets: u32, context: &AllocationContext) -> BTreeMap<Size, u32> {
        let config = context.config;
        let capacity = config.pallet_capacity as f64;
        let mut allocation = BTreeMap::new();

        let candidates: Vec<SizeSummary> = config
            .size_list()
            .into_iter()
            .map(|size| context.metrics.size_summary(size))
            .filter(|summary| summary.eligible)
            .collect();
        if total_pallets == 0 || candidates.is_empty() {
            return allocation;
        }

        let weight = |c: &SizeSummary| c.monthly_demand;
        let total_weight: f64 = candidates.iter().map(weight).sum();

        let mut assigned = 0;
        let mut remainders: Vec<(&SizeSummary, f64)> = Vec::new();
        if total_weight > 0.0 {
            for candidate in &candidates {
                let ideal = total_pallets as f64 * weight(candidate) / total_weight;
                let whole = (ideal + EPSILON).floor() as u32;
                add(&mut allocation, candidate.size, whole);
                assigned += whole;
                remainders.push((candidate, (ideal - whole as f64).max(0.0)));
            }
        }
        let mut leftover = total_pallets.saturating_sub(assigned);

        // Largest remainder, CRITICAL sizes ahead of everyone.
        remainders.retain(|(c, r)| *r > EPSILON || (c.has_critical && weight(*c) > 0.0));
        remainders.sort_by(|(a, ra), (b, rb)| {
            b.has_critical
                .cmp(&a.has_critical)
                .then(rb.total_cmp(ra))
                .then(weight(*b).total_cmp(&weight(*a)))
                .then(a.size.cmp(&b.size))
        });
        for (candidate, _) in &remainders {
            if leftover == 0 {
                break;
            }
            add(&mut allocation, candidate.size, 1);
            leftover -= 1;
        }

        while leftover > 0 {
            let pick = candidates
                .iter()
                .filter(|c| c.monthly_demand > 0.0)
                .filter(|c| {
                    let next = coverage_after(c, allocated(&allocation, c.size) + 1, capacity);
                    next <= config.coverage.overstock_months
                })
                .min_by(|a, b| {
                    let ca = coverage_after(a, allocated(&allocation, a.size), capacity);
                    let cb = coverage_after(b, allocated(&allocation, b.size), capacity);
                    ca.total_cmp(&cb).then(a.size.cmp(&b.size))
                })
                .map(|c| c.size);
            match pick {
                Some(size) => {
                    add(&mut allocation, size, 1);
                    leftover -= 1;
                }
                None => {
                    debug!(leftover, "no size can absorb more pallets without overstocking");
                    break;
                }
            }
        }

        allocation
    }
}

// =========================================================================
// 2. Dominant-SKU Allocation
// =========================================================================

/// Sizes the container around the two highest-volume sizes.
///
/// Each dominant size is judged by its dominant firmness: the units that
/// SKU lacks against the target level at arrival, scaled up to the whole
/// size, become a pallet requirement by ceiling division. When the two
/// requirements together fill the container ("crisis") they split it
/// between them. Otherwise the rest cascades to low-volume sizes in order
/// of ascending coverage, at most `cascade_cap` pallets per size per pass,
/// and any capacity still free is pushed onto whichever dominant size has
/// the lower coverage, `force_fill_fraction` of the remainder at a time.
/// The container always leaves full.
#[derive(Debug, Clone)]
pub struct DominantSku {
    force_fill_fraction: f64,
    cascade_cap: u32,
}

impl DominantSku {
    pub fn new(force_fill_fraction: f64, cascade_cap: u32) -> Self {
        Self {
            force_fill_fraction: force_fill_fraction.clamp(EPSILON, 1.0),
            cascade_cap: cascade_cap.max(1),
        }
    }

    /// Pallets a dominant size needs for its dominant firmness to reach target at arrival.
    fn dominant_need_pallets(&self, size: Size, context: &AllocationContext) -> u32 {
        let config = context.config;
        let sku = Sku::new(size, config.dominant_firmness(size));
        let ratio = config.firmness_ratio(sku);
        let metric = match context.metrics.get(sku) {
            Some(m) if m.is_eligible() && ratio > 0.0 => m,
            _ => return 0,
        };

        let target = metric.monthly_demand * config.coverage.target_months;
        let sku_gap = (target - metric.projected_stock).max(0.0);
        let size_gap = sku_gap / ratio;
        (size_gap / config.pallet_capacity as f64 - EPSILON)
            .ceil()
            .max(0.0) as u32
    }
}

impl Default for DominantSku {
    fn default() -> Self {
        Self::new(0.6, 2)
    }
}

impl AllocationStrategy for DominantSku {
    fn name(&self) -> &'static str {
        "dominant_sku"
    }

    fn allocate(&self, total_pallets: u32, context: &AllocationContext) -> BTreeMap<Size, u32> {
        let config = context.config;
        let capacity = config.pallet_capacity as f64;
        let dominant = config.dominant_sizes();
        let mut allocation = BTreeMap::new();
        if total_pallets == 0 || dominant.is_empty() {
            return allocation;
        }

        let needs: Vec<(Size, u32)> = dominant
            .iter()
            .map(|size| (*size, self.dominant_need_pallets(*size, context)))
            .collect();
        let combined: u32 = needs.iter().map(|(_, n)| n).sum();

        if combined >= total_pallets {
            let (lead, lead_need) = needs[0];
            let lead_share = if needs.len() == 1 {
                total_pallets
            } else {
                ((total_pallets as f64 * lead_need as f64 / combined as f64).round() as u32)
                    .min(total_pallets)
            };
            add(&mut allocation, lead, lead_share);
            if let Some((second, _)) = needs.get(1) {
                add(&mut allocation, *second, total_pallets - lead_share);
            }
            debug!(combined, total_pallets, "crisis split between dominant sizes");
            return allocation;
        }

        for (size, need) in &needs {
            add(&mut allocation, *size, *need);
        }
        let mut remaining = total_pallets - combined;

        // Cascade to low-volume sizes, least covered first.
        let mut others: Vec<SizeSummary> = config
            .size_list()
            .into_iter()
            .filter(|size| !dominant.contains(size))
            .map(|size| context.metrics.size_summary(size))
            .filter(|s| s.eligible && s.units_needed > 0)
            .collect();
        others.sort_by(|a, b| {
            a.coverage_months
                .total_cmp(&b.coverage_months)
                .then(a.size.cmp(&b.size))
        });
        let mut outstanding: BTreeMap<Size, u32> = others
            .iter()
            .map(|s| {
                let pallets = (s.units_needed as f64 / capacity - EPSILON).ceil().max(0.0) as u32;
                (s.size, pallets)
            })
            .collect();

        while remaining > 0 {
            let mut progressed = false;
            for summary in &others {
                if remaining == 0 {
                    break;
                }
                let want = outstanding.get(&summary.size).copied().unwrap_or(0);
                let give = want.min(self.cascade_cap).min(remaining);
                if give > 0 {
                    add(&mut allocation, summary.size, give);
                    outstanding.insert(summary.size, want - give);
                    remaining -= give;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        // Force-fill whatever is left onto the lower-coverage dominant size.
        let summaries: Vec<SizeSummary> = dominant
            .iter()
            .map(|size| context.metrics.size_summary(*size))
            .collect();
        let eligible: Vec<&SizeSummary> = summaries.iter().filter(|s| s.eligible).collect();
        let pool: Vec<&SizeSummary> = if eligible.is_empty() {
            summaries.iter().collect()
        } else {
            eligible
        };
        while remaining > 0 {
            let target = pool
                .iter()
                .min_by(|a, b| {
                    let ca = coverage_after(a, allocated(&allocation, a.size), capacity);
                    let cb = coverage_after(b, allocated(&allocation, b.size), capacity);
                    ca.total_cmp(&cb)
                })
                .map(|s| s.size);
            let Some(size) = target else { break };
            let chunk = ((remaining as f64 * self.force_fill_fraction).ceil() as u32).clamp(1, remaining);
            add(&mut allocation, size, chunk);
            remaining -= chunk;
        }

        allocation
    }
}
