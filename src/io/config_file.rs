// src/io/config_file.rs

use crate::error::PlannerError;
use crate::model::inventory::Inventory;
use crate::simulation::config::PlannerConfig;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Reads a JSON config and validates it.
pub fn load_config(path: impl AsRef<Path>) -> Result<PlannerConfig, PlannerError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let config: PlannerConfig = serde_json::from_str(&text)?;
    config.validate()?;
    debug!(path = %path.display(), product_line = %config.product_line, "config loaded");
    Ok(config)
}

pub fn save_config(path: impl AsRef<Path>, config: &PlannerConfig) -> Result<(), PlannerError> {
    let text = serde_json::to_string_pretty(config)?;
    fs::write(path, text)?;
    Ok(())
}

/// Reads on-hand stock from JSON. Missing sections default to empty.
pub fn load_inventory(path: impl AsRef<Path>) -> Result<Inventory, PlannerError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
