// src/simulation/trigger.rs

//! Decides, month by month, whether the projection places a container now.

use crate::io::demand::{calendar_month, demand_schedule};
use crate::model::orders::Urgency;
use crate::model::queues::PendingContainers;
use crate::model::sku::Sku;
use crate::simulation::config::PlannerConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerDecision {
    Hold {
        crossing: Option<f64>,
    },
    Order {
        urgency: Urgency,
        crossing: Option<f64>,
        reason: String,
    },
}

impl TriggerDecision {
    pub fn is_order(&self) -> bool {
        matches!(self, TriggerDecision::Order { .. })
    }
}

/// Walks the tracked SKU forward from `now` in fine steps and returns the
/// first instant (months since the projection start) at which it is down to
/// the target band. In-transit units are credited on their unload month.
/// Returns `None` when the band is never reached within the projection plus
/// one lead time, or when the step or horizon is not a finite positive span.
///
/// # Arguments
/// * `stock` - On-hand units of `sku` at `now`.
/// * `arrivals` - `(unload tick, units of sku)` per container in transit.
pub fn find_band_crossing(
    config: &PlannerConfig,
    sku: Sku,
    stock: u32,
    now: u32,
    start_calendar_month: u32,
    arrivals: &[(u32, u32)],
) -> Option<f64> {
    let base = config.monthly_demand(sku);
    if base <= 0.0 {
        return None;
    }
    let resolution = config.trigger.resolution_months;
    let band = base * config.trigger.target_band_months;
    let span = config.projection.months as f64 + config.lead_time_months();
    if !(resolution > 0.0 && resolution.is_finite() && span.is_finite()) {
        return None;
    }
    let horizon = now as f64 + span;
    // Seasonal demand per whole month from `now`, indexed by elapsed months.
    let schedule = demand_schedule(
        config,
        sku,
        calendar_month(start_calendar_month, now),
        span.max(0.0).ceil() as usize + 1,
    );

    let mut level = stock as f64;
    let mut credited = vec![false; arrivals.len()];
    let mut step: u32 = 0;
    loop {
        let t = now as f64 + step as f64 * resolution;
        for (i, (tick, units)) in arrivals.iter().enumerate() {
            if !credited[i] && *tick as f64 <= t + 1e-9 {
                level += *units as f64;
                credited[i] = true;
            }
        }
        if level <= band {
            return Some(t);
        }
        if t >= horizon {
            return None;
        }
        let elapsed = (t.floor() as usize).saturating_sub(now as usize);
        let demand = schedule.get(elapsed).copied().unwrap_or(base);
        level -= demand * resolution;
        step += 1;
    }
}

/// Trigger decision for month `now`.
///
/// An order fires when the tracked SKU is under the emergency floor with
/// nothing in transit, or when the ideal order instant (band crossing minus
/// lead time) falls within the tolerance window and no container already
/// lands near the crossing.
pub fn evaluate(
    config: &PlannerConfig,
    sku: Sku,
    stock: u32,
    now: u32,
    start_calendar_month: u32,
    pending: &PendingContainers,
) -> TriggerDecision {
    let trigger = &config.trigger;
    if stock < trigger.emergency_floor_units && pending.is_empty() {
        return TriggerDecision::Order {
            urgency: Urgency::Emergency,
            crossing: Some(now as f64),
            reason: format!(
                "{} at {} units, under the emergency floor of {} with nothing in transit",
                sku, stock, trigger.emergency_floor_units
            ),
        };
    }

    let arrivals: Vec<(u32, u32)> = pending
        .iter()
        .map(|order| (order.arrival_tick(), order.spring_order.quantity(sku)))
        .collect();
    let Some(crossing) = find_band_crossing(config, sku, stock, now, start_calendar_month, &arrivals)
    else {
        return TriggerDecision::Hold { crossing: None };
    };

    let order_at = crossing - config.lead_time_months();
    if order_at > now as f64 + trigger.tolerance_months {
        return TriggerDecision::Hold {
            crossing: Some(crossing),
        };
    }
    if pending.lands_near(crossing, trigger.landing_window_months) {
        return TriggerDecision::Hold {
            crossing: Some(crossing),
        };
    }

    let urgency = if order_at < now as f64 - trigger.tolerance_months {
        Urgency::Urgent
    } else {
        Urgency::Planned
    };
    TriggerDecision::Order {
        urgency,
        crossing: Some(crossing),
        reason: format!(
            "{} down to {:.1} months of cover at month {:.1}",
            sku, trigger.target_band_months, crossing
        ),
    }
}
