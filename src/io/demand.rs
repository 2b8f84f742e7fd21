// src/io/demand.rs

use crate::model::sku::{Size, Sku};
use crate::simulation::config::PlannerConfig;

/// Calendar month (0 = January) reached `offset` months after `start`.
pub fn calendar_month(start_calendar_month: u32, offset: u32) -> u32 {
    (start_calendar_month + offset) % 12
}

/// Seasonally adjusted demand of one SKU in one calendar month.
pub fn seasonal_monthly_demand(config: &PlannerConfig, sku: Sku, calendar_month: u32) -> f64 {
    config.monthly_demand(sku) * config.seasonal_factor(calendar_month)
}

/// Month-by-month demand of one SKU starting at `start_calendar_month`.
pub fn demand_schedule(config: &PlannerConfig, sku: Sku, start_calendar_month: u32, months: usize) -> Vec<f64> {
    (0..months as u32)
        .map(|m| seasonal_monthly_demand(config, sku, calendar_month(start_calendar_month, m)))
        .collect()
}

/// Twelve months of seasonal demand for a whole size.
pub fn annual_size_demand(config: &PlannerConfig, size: Size) -> f64 {
    config.size_monthly_demand(size) * config.seasonality.iter().sum::<f64>()
}
