use clap::Parser;
use spring_planner::io::config_file;
use spring_planner::io::demand::annual_size_demand;
use spring_planner::io::reporting;
use spring_planner::logging;
use spring_planner::strategy::order_builder::{plan_container, summarize};
use spring_planner::{
    project_year, CoverageParams, Inventory, PlannerConfig, PlannerError, ProjectionRequest,
};
use std::path::PathBuf;
use tracing::{error, info};

/// Plans the next spring container and projects the year ahead.
#[derive(Parser, Debug)]
#[command(name = "spring-planner")]
#[command(version)]
struct Args {
    /// Planner config JSON; the standard five-size range when omitted
    config: Option<PathBuf>,

    /// On-hand stock JSON; an empty warehouse when omitted
    #[arg(short, long)]
    inventory: Option<PathBuf>,

    /// Container size in pallets; sized from coverage when omitted
    #[arg(short, long)]
    pallets: Option<u32>,

    /// Directory the CSV logs are written to
    #[arg(short, long, default_value = ".")]
    out: PathBuf,
}

fn run() -> Result<(), PlannerError> {
    let args = Args::parse();

    // 1. CONFIGURATION
    let config = match &args.config {
        Some(path) => config_file::load_config(path)?,
        None => PlannerConfig::default(),
    };
    info!(product_line = %config.product_line, sizes = config.sizes.len(), "config ready");
    for size in config.size_list() {
        info!(size = %size, annual = annual_size_demand(&config, size), "seasonal demand");
    }

    // 2. STARTING STOCK
    // Without an inventory file we plan the bootstrap case: an empty warehouse.
    let inventory = match &args.inventory {
        Some(path) => config_file::load_inventory(path)?,
        None => Inventory::new(),
    };

    // 3. COVERAGE & NEXT CONTAINER
    let plan = plan_container(&config, &inventory, &[], CoverageParams::default(), args.pallets);
    println!("\n=== Coverage at arrival ({:.1} months lead time) ===", config.lead_time_months());
    println!("{:<12} {:<8} {:>7} {:>9} {:>8} {:>7}", "Size", "Firmness", "Stock", "Cover(m)", "Status", "Need");
    for metric in plan.metrics.iter() {
        println!(
            "{:<12} {:<8} {:>7} {:>9.2} {:>8} {:>7}",
            metric.sku.size.as_str(),
            metric.sku.firmness.as_str(),
            metric.current_stock,
            metric.projected_coverage,
            metric.status.as_str(),
            metric.units_needed
        );
    }

    println!("\n=== Recommended container: {} pallets ===", plan.spring_order.total_pallets());
    for line in summarize(&plan.spring_order) {
        println!("{:<12} {:>3} pallets {:>5} springs", line.size.as_str(), line.pallets, line.springs);
    }
    println!("Components to order: {} units", plan.component_order.total());

    // 4. PROJECTION
    let projection = project_year(&config, &inventory, ProjectionRequest::default());
    println!("\n=== {}-month projection ===", config.projection.months);
    for order in &projection.orders {
        println!(
            "Month {:>2}: {:>2} pallets, lands {:.1} [{}] {}",
            order.order_month,
            order.pallet_count,
            order.arrival_month,
            order.urgency.as_str(),
            order.reason
        );
    }
    match projection.first_stockout() {
        Some(event) => println!(
            "Stockouts: {} size-months, first {} in month {}",
            projection.stockouts.len(),
            event.size,
            event.month
        ),
        None => println!("Stockouts: none"),
    }

    // 5. EXPORT
    std::fs::create_dir_all(&args.out)?;
    reporting::write_snapshot_log(args.out.join("projection_snapshots.csv"), &projection)?;
    reporting::write_order_log(args.out.join("projection_orders.csv"), &projection)?;

    Ok(())
}

fn main() {
    logging::init();
    if let Err(e) = run() {
        error!(error = %e, "planner failed");
        std::process::exit(1);
    }
}
