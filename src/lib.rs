//! Container planning for imported mattress springs: coverage per SKU,
//! pallet allocation and packing, matching component orders, and a
//! twelve-month projection that decides when the next container ships.

pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod simulation;
pub mod strategy;

pub use error::PlannerError;
pub use model::inventory::Inventory;
pub use model::orders::{ComponentOrder, ContainerOrder, Pallet, PalletType, SpringOrder, Urgency};
pub use model::sku::{ComponentId, Firmness, Size, Sku};
pub use simulation::config::{AllocationMode, PlannerConfig};
pub use simulation::engine::{project_year, AnnualProjection, OrderMode, ProjectionRequest};
pub use strategy::coverage::{calculate_metrics, CoverageParams, CoverageStatus, SkuMetrics};
pub use strategy::order_builder::{build_spring_order, plan_container, recommended_pallet_count};
