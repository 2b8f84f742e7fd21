// src/io/reporting.rs

use crate::error::PlannerError;
use crate::model::sku::{Firmness, Size, Sku};
use crate::simulation::engine::{AnnualProjection, InventorySnapshot};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// One size in one month of the projection.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotRow {
    pub month: u32,
    pub calendar_month: u32,
    pub size: Size,
    pub firm: u32,
    pub medium: u32,
    pub soft: u32,
    pub total: u32,
    /// Months of cover, `inf` for stock nobody buys.
    pub coverage_months: String,
    pub critical: bool,
    pub stockout: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderRow {
    pub order_month: u32,
    pub arrival_month: f64,
    pub urgency: &'static str,
    pub pallet_count: u32,
    pub springs: u32,
    pub component_units: u32,
    /// `size:pallets` pairs separated by `;`.
    pub pallets_by_size: String,
    pub driving_sizes: String,
    pub reason: String,
}

fn format_coverage(months: f64) -> String {
    if months.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.2}", months)
    }
}

pub fn snapshot_rows(snapshot: &InventorySnapshot) -> Vec<SnapshotRow> {
    snapshot
        .coverage
        .iter()
        .map(|(size, coverage)| {
            let units = |firmness| snapshot.inventory.spring(Sku::new(*size, firmness));
            SnapshotRow {
                month: snapshot.month,
                calendar_month: snapshot.calendar_month,
                size: *size,
                firm: units(Firmness::Firm),
                medium: units(Firmness::Medium),
                soft: units(Firmness::Soft),
                total: snapshot.inventory.size_springs(*size),
                coverage_months: format_coverage(*coverage),
                critical: snapshot.critical_sizes.contains(size),
                stockout: snapshot.stockout_sizes.contains(size),
            }
        })
        .collect()
}

pub fn order_rows(projection: &AnnualProjection) -> Vec<OrderRow> {
    projection
        .orders
        .iter()
        .map(|order| OrderRow {
            order_month: order.order_month,
            arrival_month: (order.arrival_month * 100.0).round() / 100.0,
            urgency: order.urgency.as_str(),
            pallet_count: order.pallet_count,
            springs: order.spring_order.total_springs(),
            component_units: order.component_order.total(),
            pallets_by_size: order
                .spring_order
                .metadata
                .pallets_by_size
                .iter()
                .map(|(size, count)| format!("{}:{}", size, count))
                .collect::<Vec<_>>()
                .join(";"),
            driving_sizes: order
                .driving_sizes
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(";"),
            reason: order.reason.clone(),
        })
        .collect()
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), PlannerError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    // Flush so the file is complete before the caller reads it back
    wtr.flush()?;
    Ok(())
}

/// Writes one row per size per projected month.
///
/// # Arguments
/// * `path` - Destination file, e.g. `out/projection_snapshots.csv`.
/// * `projection` - The finished projection.
pub fn write_snapshot_log(path: impl AsRef<Path>, projection: &AnnualProjection) -> Result<(), PlannerError> {
    let path = path.as_ref();
    let rows: Vec<SnapshotRow> = projection.snapshots.iter().flat_map(snapshot_rows).collect();
    write_rows(path, &rows)?;
    info!(rows = rows.len(), path = %path.display(), "snapshot log written");
    Ok(())
}

/// Writes one row per container ordered during the projection.
pub fn write_order_log(path: impl AsRef<Path>, projection: &AnnualProjection) -> Result<(), PlannerError> {
    let path = path.as_ref();
    let rows = order_rows(projection);
    write_rows(path, &rows)?;
    info!(rows = rows.len(), path = %path.display(), "order log written");
    Ok(())
}
