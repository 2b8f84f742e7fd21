// ==========================================
// Order invariants under randomised stock
// ==========================================
// Seeded StdRng so every failure replays exactly.
// Covers: pallet capacity, overstocked sizes, component exclusions,
// side panel consolidation and pooled surplus, equal runway
// ==========================================

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal, Uniform};
use spring_planner::model::inventory::Inventory;
use spring_planner::strategy::components::{component_runway, derive_component_order};
use spring_planner::strategy::coverage::{calculate_metrics, CoverageParams};
use spring_planner::strategy::order_builder::build_spring_order;
use spring_planner::{AllocationMode, ComponentId, PlannerConfig, Size, Sku};

const ROUNDS: usize = 200;

// ==========================================
// Helpers
// ==========================================

/// Spring stock per SKU in months of demand, log-normally spread so most
/// SKUs sit around a couple of months with a long overstocked tail.
fn random_inventory(config: &PlannerConfig, rng: &mut StdRng) -> Inventory {
    let months = LogNormal::new(0.5, 1.0).expect("valid log-normal");
    let empty = Uniform::new(0.0, 1.0);
    let mut inventory = Inventory::new();
    for sku in config.skus() {
        let units = if empty.sample(rng) < 0.15 {
            0
        } else {
            (config.monthly_demand(sku) * months.sample(rng)).round() as u32
        };
        inventory.set_spring(sku, units);
    }
    inventory
}

/// Springs of every size whose `id` parts are drawn from `size` stock.
fn pooled_springs(config: &PlannerConfig, inventory: &Inventory, id: ComponentId, size: Size) -> u32 {
    config
        .sizes_served_by(id, size)
        .into_iter()
        .map(|s| inventory.size_springs(s))
        .sum()
}

/// Components below the springs they pair with, so every applicable
/// component gets ordered. Consolidated parts are only held at the size
/// they are cut from, as the warehouse holds them.
fn add_thin_components(config: &PlannerConfig, inventory: &mut Inventory, rng: &mut StdRng) {
    for spec in config.components.clone() {
        for size in config.size_list() {
            if config.consolidation_target(spec.id, size).is_some() {
                continue;
            }
            let springs = pooled_springs(config, inventory, spec.id, size) as f64 * spec.multiplier;
            let units = (springs * rng.gen_range(0.0..0.9)).floor() as u32;
            inventory.set_component(spec.id, size, units);
        }
    }
}

/// Components anywhere between empty and well over the springs they pair
/// with, so a size cut from another often holds surplus for its sources.
fn add_mixed_components(config: &PlannerConfig, inventory: &mut Inventory, rng: &mut StdRng) {
    for spec in config.components.clone() {
        for size in config.size_list() {
            if config.consolidation_target(spec.id, size).is_some() {
                continue;
            }
            let springs = pooled_springs(config, inventory, spec.id, size) as f64 * spec.multiplier;
            let units = (springs * rng.gen_range(0.0..1.6)).floor() as u32;
            inventory.set_component(spec.id, size, units);
        }
    }
}

fn configs() -> Vec<PlannerConfig> {
    let mut dominant = PlannerConfig::default();
    dominant.allocation = AllocationMode::DominantSku {
        force_fill_fraction: 0.6,
        cascade_cap: 2,
    };
    vec![PlannerConfig::default(), dominant, PlannerConfig::king_queen_range()]
}

// ==========================================
// Pallets
// ==========================================

#[test]
fn test_every_pallet_is_exactly_full() {
    let mut rng = StdRng::seed_from_u64(7);
    for config in configs() {
        for _ in 0..ROUNDS {
            let inventory = random_inventory(&config, &mut rng);
            let metrics = calculate_metrics(&config, &inventory, &[], CoverageParams::default());
            let pallets = rng.gen_range(config.min_pallets..=config.max_pallets);
            let order = build_spring_order(&config, &metrics, pallets);

            assert!(order.verify().is_ok(), "{:?}", order.verify());
            for pallet in &order.pallets {
                assert_eq!(pallet.firmness_breakdown.values().sum::<u32>(), 30);
                assert_eq!(pallet.total, 30);
            }
            assert_eq!(order.total_springs(), order.total_pallets() * 30);

            let any_eligible = metrics.iter().any(|m| m.is_eligible());
            let dominant = matches!(config.allocation, AllocationMode::DominantSku { .. });
            if dominant || any_eligible {
                assert_eq!(order.total_pallets(), pallets);
            }
        }
    }
}

#[test]
fn test_overstocked_sizes_receive_nothing() {
    let mut rng = StdRng::seed_from_u64(11);
    let config = PlannerConfig::default();
    for _ in 0..ROUNDS {
        let mut inventory = random_inventory(&config, &mut rng);
        let flooded = Size::ALL[rng.gen_range(0..Size::ALL.len())];
        for sku in config.skus().into_iter().filter(|s| s.size == flooded) {
            inventory.set_spring(sku, (config.monthly_demand(sku) * 20.0).ceil() as u32);
        }
        let metrics = calculate_metrics(&config, &inventory, &[], CoverageParams::default());
        let pallets = rng.gen_range(config.min_pallets..=config.max_pallets);
        let order = build_spring_order(&config, &metrics, pallets);

        assert_eq!(order.size_total(flooded), 0, "{} was flooded", flooded);
        assert!(!order.metadata.pallets_by_size.contains_key(&flooded));
    }
}

#[test]
fn test_unsold_firmness_never_shipped() {
    let mut config = PlannerConfig::default();
    for entry in config.sizes.iter_mut() {
        entry.firmness_ratios.insert(spring_planner::Firmness::Soft, 0.0);
        entry.firmness_ratios.insert(spring_planner::Firmness::Medium, 0.75);
    }
    let mut rng = StdRng::seed_from_u64(19);
    for _ in 0..ROUNDS {
        let inventory = random_inventory(&config, &mut rng);
        let metrics = calculate_metrics(&config, &inventory, &[], CoverageParams::default());
        let order = build_spring_order(&config, &metrics, 8);
        for size in Size::ALL {
            assert_eq!(order.quantity(Sku::new(size, spring_planner::Firmness::Soft)), 0);
        }
    }
}

// ==========================================
// Components
// ==========================================

#[test]
fn test_king_queen_parts_are_zero_for_small_sizes() {
    let mut rng = StdRng::seed_from_u64(23);
    let config = PlannerConfig::default();
    for _ in 0..ROUNDS {
        let mut inventory = random_inventory(&config, &mut rng);
        add_thin_components(&config, &mut inventory, &mut rng);
        let metrics = calculate_metrics(&config, &inventory, &[], CoverageParams::default());
        let order = build_spring_order(&config, &metrics, 10);
        let components = derive_component_order(&config, &order, &inventory);

        for id in [ComponentId::MicroCoils, ComponentId::ThinLatex] {
            for size in [Size::Double, Size::KingSingle, Size::Single] {
                assert_eq!(components.quantity(id, size), 0);
            }
        }
    }
}

#[test]
fn test_side_panels_consolidate_into_double() {
    let mut rng = StdRng::seed_from_u64(29);
    let config = PlannerConfig::default();
    for _ in 0..ROUNDS {
        let mut inventory = random_inventory(&config, &mut rng);
        add_thin_components(&config, &mut inventory, &mut rng);
        let metrics = calculate_metrics(&config, &inventory, &[], CoverageParams::default());
        let order = build_spring_order(&config, &metrics, 10);
        let components = derive_component_order(&config, &order, &inventory);

        let served = [Size::Double, Size::KingSingle, Size::Single];
        let springs_after: u32 = served
            .iter()
            .map(|s| inventory.size_springs(*s) + order.size_total(*s))
            .sum();
        let expected =
            springs_after.saturating_sub(inventory.component(ComponentId::SidePanel, Size::Double));
        assert_eq!(components.quantity(ComponentId::SidePanel, Size::Double), expected);
        assert_eq!(components.quantity(ComponentId::SidePanel, Size::KingSingle), 0);
        assert_eq!(components.quantity(ComponentId::SidePanel, Size::Single), 0);
    }
}

#[test]
fn test_components_run_out_with_springs() {
    let mut rng = StdRng::seed_from_u64(31);
    let config = PlannerConfig::default();
    for _ in 0..ROUNDS {
        let mut inventory = random_inventory(&config, &mut rng);
        add_thin_components(&config, &mut inventory, &mut rng);
        let metrics = calculate_metrics(&config, &inventory, &[], CoverageParams::default());
        let order = build_spring_order(&config, &metrics, rng.gen_range(4..=12));
        let components = derive_component_order(&config, &order, &inventory);

        for size in config.size_list() {
            if order.size_total(size) == 0 {
                continue;
            }
            for spec in &config.components {
                let Some(runway) =
                    component_runway(&config, &inventory, &order, &components, spec.id, size)
                else {
                    continue;
                };
                assert!(
                    runway.gap() <= 0.1,
                    "{} {}: springs {:.3} vs component {:.3}",
                    spec.id,
                    size,
                    runway.spring_months,
                    runway.component_months
                );
            }
        }
    }
}

#[test]
fn test_surplus_at_the_cut_size_is_netted() {
    let mut rng = StdRng::seed_from_u64(37);
    let config = PlannerConfig::default();
    for _ in 0..ROUNDS {
        let mut inventory = random_inventory(&config, &mut rng);
        add_mixed_components(&config, &mut inventory, &mut rng);
        let metrics = calculate_metrics(&config, &inventory, &[], CoverageParams::default());
        let order = build_spring_order(&config, &metrics, rng.gen_range(4..=12));
        let components = derive_component_order(&config, &order, &inventory);

        let Some(runway) = component_runway(
            &config,
            &inventory,
            &order,
            &components,
            ComponentId::SidePanel,
            Size::Double,
        ) else {
            continue;
        };
        // Surplus can only lengthen the part's runway; it never falls short.
        assert!(
            runway.component_months + 0.1 >= runway.spring_months,
            "side panels {:.3} vs springs {:.3}",
            runway.component_months,
            runway.spring_months
        );
        if components.quantity(ComponentId::SidePanel, Size::Double) > 0 {
            assert!(runway.gap() <= 0.1, "{:?}", runway);
        }
    }
}
