// src/strategy/packing.rs

//! Turns one size's per-firmness requirement into fixed-capacity pallets.

use crate::model::orders::{Pallet, PalletType};
use crate::model::sku::{Firmness, Size};
use crate::strategy::coverage::SkuMetric;
use std::collections::BTreeMap;

/// Weight bonus for the best-selling firmness when splitting by demand.
const DOMINANT_BOOST: f64 = 1.10;

/// What the packer needs to know about one firmness of the size being packed.
#[derive(Debug, Clone, PartialEq)]
pub struct FirmnessLine {
    pub firmness: Firmness,
    pub units_needed: u32,
    pub monthly_demand: f64,
    /// Sold and not overstocked.
    pub eligible: bool,
}

impl FirmnessLine {
    pub fn from_metric(metric: &SkuMetric) -> Self {
        Self {
            firmness: metric.sku.firmness,
            units_needed: metric.units_needed,
            monthly_demand: metric.monthly_demand,
            eligible: metric.is_eligible(),
        }
    }
}

/// Relative share of new units per firmness.
///
/// Unmet need drives the split whenever some eligible firmness is under
/// target. Otherwise demand does, with the dominant firmness boosted.
pub fn split_weights(lines: &[FirmnessLine]) -> BTreeMap<Firmness, f64> {
    let needy = lines.iter().any(|l| l.eligible && l.units_needed > 0);
    let mut weights: BTreeMap<Firmness, f64> = lines
        .iter()
        .map(|l| {
            let w = match (l.eligible, needy) {
                (false, _) => 0.0,
                (true, true) => l.units_needed as f64,
                (true, false) => l.monthly_demand,
            };
            (l.firmness, w)
        })
        .collect();

    if !needy {
        let dominant = lines
            .iter()
            .filter(|l| weights.get(&l.firmness).copied().unwrap_or(0.0) > 0.0)
            .fold(None::<&FirmnessLine>, |best, l| match best {
                Some(b) if b.monthly_demand >= l.monthly_demand => Some(b),
                _ => Some(l),
            });
        if let Some(line) = dominant {
            if let Some(w) = weights.get_mut(&line.firmness) {
                *w *= DOMINANT_BOOST;
            }
        }
    }

    if weights.values().sum::<f64>() <= 0.0 {
        for line in lines {
            weights.insert(line.firmness, line.monthly_demand.max(0.0));
        }
    }
    if weights.values().sum::<f64>() <= 0.0 {
        for w in weights.values_mut() {
            *w = 1.0;
        }
    }
    weights
}

/// Largest outstanding need first, then largest demand, then declared order.
fn reconcile_priority(lines: &[FirmnessLine]) -> Vec<Firmness> {
    let mut ordered: Vec<&FirmnessLine> = lines.iter().collect();
    ordered.sort_by(|a, b| {
        b.units_needed
            .cmp(&a.units_needed)
            .then(b.monthly_demand.total_cmp(&a.monthly_demand))
            .then(a.firmness.cmp(&b.firmness))
    });
    ordered.into_iter().map(|l| l.firmness).collect()
}

/// Splits exactly `total` units across firmnesses.
///
/// Shares are rounded, every firmness with a positive weight gets at least
/// one unit when the total allows it, and rounding drift lands on the
/// firmness with the largest outstanding need.
pub fn split_units(total: u32, lines: &[FirmnessLine]) -> BTreeMap<Firmness, u32> {
    let weights = split_weights(lines);
    let weight_sum: f64 = weights.values().sum();
    let mut units: BTreeMap<Firmness, u32> = weights
        .iter()
        .map(|(f, w)| (*f, (total as f64 * w / weight_sum).round() as u32))
        .collect();
    if units.is_empty() {
        return units;
    }

    let positive = weights.values().filter(|w| **w > 0.0).count() as u32;
    if total >= positive {
        for (f, w) in &weights {
            if *w > 0.0 {
                let u = units.entry(*f).or_default();
                if *u == 0 {
                    *u = 1;
                }
            }
        }
    }

    let priority = reconcile_priority(lines);
    let mut current: u32 = units.values().sum();
    if current < total {
        if let Some(first) = priority.first() {
            *units.entry(*first).or_default() += total - current;
        }
    }
    while current > total {
        let before = current;
        for f in &priority {
            let u = units.entry(*f).or_default();
            let take = (*u).min(current - total);
            *u -= take;
            current -= take;
            if current == total {
                break;
            }
        }
        if current == before {
            break;
        }
    }
    units
}

fn pallet_from(size: Size, breakdown: BTreeMap<Firmness, u32>) -> Pallet {
    let kinds = breakdown.values().filter(|q| **q > 0).count();
    Pallet {
        id: 0,
        size,
        pallet_type: if kinds <= 1 {
            PalletType::Pure
        } else {
            PalletType::Mixed
        },
        total: breakdown.values().sum(),
        firmness_breakdown: breakdown,
    }
}

/// Tops up a short pallet to `capacity` following `weights`.
fn pad(breakdown: &mut BTreeMap<Firmness, u32>, capacity: u32, weights: &BTreeMap<Firmness, f64>) {
    let load: u32 = breakdown.values().sum();
    let missing = capacity.saturating_sub(load);
    if missing == 0 {
        return;
    }
    let weight_sum: f64 = weights.values().sum();
    if weight_sum <= 0.0 {
        *breakdown.entry(Firmness::Medium).or_default() += missing;
        return;
    }

    let mut shares: Vec<(Firmness, u32, f64)> = weights
        .iter()
        .map(|(f, w)| {
            let ideal = missing as f64 * w / weight_sum;
            (*f, ideal.floor() as u32, ideal - ideal.floor())
        })
        .collect();
    let mut left = missing - shares.iter().map(|(_, q, _)| q).sum::<u32>();
    shares.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.0.cmp(&b.0)));
    for share in shares.iter_mut() {
        if left == 0 {
            break;
        }
        share.1 += 1;
        left -= 1;
    }
    for (f, q, _) in shares {
        if q > 0 {
            *breakdown.entry(f).or_default() += q;
        }
    }
}

/// Packs a unit vector into pallets of exactly `capacity`.
///
/// Pure pallets come first, firmness by firmness in declared order. What
/// is left is poured into mixed pallets in the same order. A final pallet
/// left short is padded using `weights`.
pub fn pack_units(
    size: Size,
    units: &BTreeMap<Firmness, u32>,
    weights: &BTreeMap<Firmness, f64>,
    capacity: u32,
) -> Vec<Pallet> {
    let mut pallets = Vec::new();
    if capacity == 0 {
        return pallets;
    }
    let mut pools = units.clone();

    for firmness in Firmness::ALL {
        let pool = pools.entry(firmness).or_default();
        while *pool >= capacity {
            pallets.push(pallet_from(size, BTreeMap::from([(firmness, capacity)])));
            *pool -= capacity;
        }
    }

    let mut current: BTreeMap<Firmness, u32> = BTreeMap::new();
    let mut load = 0;
    for firmness in Firmness::ALL {
        let pool = pools.entry(firmness).or_default();
        while *pool > 0 {
            let take = (*pool).min(capacity - load);
            *current.entry(firmness).or_default() += take;
            *pool -= take;
            load += take;
            if load == capacity {
                pallets.push(pallet_from(size, std::mem::take(&mut current)));
                load = 0;
            }
        }
    }
    if load > 0 {
        pad(&mut current, capacity, weights);
        pallets.push(pallet_from(size, current));
    }

    for (i, pallet) in pallets.iter_mut().enumerate() {
        pallet.id = i as u32 + 1;
    }
    pallets
}

/// Packs `pallet_count` pallets for one size.
///
/// `critical` marks the size as urgent and low-volume. A lone pallet for
/// such a size carries each firmness's outstanding need as-is, is padded to
/// capacity, and is labelled [`PalletType::Critical`].
pub fn pack_size(
    size: Size,
    pallet_count: u32,
    lines: &[FirmnessLine],
    capacity: u32,
    critical: bool,
) -> Vec<Pallet> {
    if pallet_count == 0 || capacity == 0 {
        return Vec::new();
    }
    let weights = split_weights(lines);
    let single_critical = critical && pallet_count == 1;

    let units = if single_critical {
        let need: u32 = lines
            .iter()
            .filter(|l| l.eligible)
            .map(|l| l.units_needed)
            .sum();
        if need == 0 || need >= capacity {
            split_units(capacity, lines)
        } else {
            lines
                .iter()
                .filter(|l| l.eligible)
                .map(|l| (l.firmness, l.units_needed))
                .collect()
        }
    } else {
        split_units(pallet_count * capacity, lines)
    };

    let mut pallets = pack_units(size, &units, &weights, capacity);
    if single_critical {
        for pallet in &mut pallets {
            pallet.pallet_type = PalletType::Critical;
        }
    }
    pallets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(firmness: Firmness, units_needed: u32, monthly_demand: f64) -> FirmnessLine {
        FirmnessLine {
            firmness,
            units_needed,
            monthly_demand,
            eligible: true,
        }
    }

    fn king_lines_without_need() -> Vec<FirmnessLine> {
        vec![
            line(Firmness::Firm, 0, 7.5),
            line(Firmness::Medium, 0, 16.5),
            line(Firmness::Soft, 0, 6.0),
        ]
    }

    #[test]
    fn demand_split_boosts_dominant_firmness() {
        let units = split_units(90, &king_lines_without_need());
        assert_eq!(units.values().sum::<u32>(), 90);
        assert_eq!(units[&Firmness::Firm], 21);
        assert_eq!(units[&Firmness::Medium], 52);
        assert_eq!(units[&Firmness::Soft], 17);
    }

    #[test]
    fn need_split_ignores_firmnesses_on_target() {
        let lines = vec![
            line(Firmness::Firm, 0, 7.5),
            line(Firmness::Medium, 40, 16.5),
            line(Firmness::Soft, 0, 6.0),
        ];
        let units = split_units(60, &lines);
        assert_eq!(units[&Firmness::Medium], 60);
        assert_eq!(units[&Firmness::Firm], 0);
    }

    #[test]
    fn drift_lands_on_largest_need() {
        let lines = vec![
            line(Firmness::Firm, 10, 5.0),
            line(Firmness::Medium, 10, 9.0),
            line(Firmness::Soft, 10, 5.0),
        ];
        let units = split_units(100, &lines);
        assert_eq!(units.values().sum::<u32>(), 100);
        // equal need, Medium sells fastest
        assert_eq!(units[&Firmness::Medium], 34);
    }

    #[test]
    fn every_sold_firmness_gets_a_unit() {
        let lines = vec![
            line(Firmness::Firm, 0, 0.1),
            line(Firmness::Medium, 0, 50.0),
            line(Firmness::Soft, 0, 0.1),
        ];
        let units = split_units(30, &lines);
        assert!(units[&Firmness::Firm] >= 1);
        assert!(units[&Firmness::Soft] >= 1);
        assert_eq!(units.values().sum::<u32>(), 30);
    }

    #[test]
    fn pure_pallets_precede_mixed() {
        let pallets = pack_size(Size::King, 3, &king_lines_without_need(), 30, false);
        assert_eq!(pallets.len(), 3);
        assert!(pallets.iter().all(|p| p.total == 30));
        assert_eq!(pallets[0].pallet_type, PalletType::Pure);
        assert_eq!(pallets[0].units(Firmness::Medium), 30);
        assert_eq!(pallets[1].pallet_type, PalletType::Mixed);
        assert_eq!(pallets[1].units(Firmness::Firm), 21);
        assert_eq!(pallets[1].units(Firmness::Medium), 9);
        assert_eq!(pallets[2].units(Firmness::Medium), 13);
        assert_eq!(pallets[2].units(Firmness::Soft), 17);
        let ids: Vec<u32> = pallets.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn lone_critical_pallet_is_padded_by_need_ratio() {
        let lines = vec![
            line(Firmness::Firm, 3, 1.5),
            line(Firmness::Medium, 5, 3.3),
            line(Firmness::Soft, 2, 1.2),
        ];
        let pallets = pack_size(Size::Single, 1, &lines, 30, true);
        assert_eq!(pallets.len(), 1);
        let pallet = &pallets[0];
        assert_eq!(pallet.pallet_type, PalletType::Critical);
        assert_eq!(pallet.total, 30);
        assert_eq!(pallet.units(Firmness::Firm), 9);
        assert_eq!(pallet.units(Firmness::Medium), 15);
        assert_eq!(pallet.units(Firmness::Soft), 6);
    }

    #[test]
    fn short_unit_vector_is_padded() {
        let units = BTreeMap::from([(Firmness::Firm, 40), (Firmness::Soft, 5)]);
        let weights = BTreeMap::from([
            (Firmness::Firm, 1.0),
            (Firmness::Medium, 1.0),
            (Firmness::Soft, 1.0),
        ]);
        let pallets = pack_units(Size::Queen, &units, &weights, 30);
        assert_eq!(pallets.len(), 2);
        assert!(pallets.iter().all(|p| p.total == 30));
        assert_eq!(pallets[1].units(Firmness::Firm), 10 + 5);
    }

    #[test]
    fn overstocked_only_lines_still_fill_the_pallet() {
        let lines: Vec<FirmnessLine> = king_lines_without_need()
            .into_iter()
            .map(|mut l| {
                l.eligible = false;
                l
            })
            .collect();
        let pallets = pack_size(Size::King, 2, &lines, 30, false);
        assert_eq!(pallets.len(), 2);
        assert!(pallets.iter().all(|p| p.total == 30));
    }

    #[test]
    fn zero_pallets_pack_nothing() {
        assert!(pack_size(Size::King, 0, &king_lines_without_need(), 30, false).is_empty());
    }
}
