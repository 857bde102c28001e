//! Aggregation pipeline for dashboards of German EV charging infrastructure.
//!
//! Raw per-charging-point records are loaded from CSV, filtered by the user's selections and
//! turned into KPIs, chart-ready series and choropleth values.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod charge_point;
pub mod choropleth;
pub mod cli;
pub mod dataset;
pub mod filter;
pub mod id;
pub mod input;
pub mod kpi;
pub mod log;
pub mod output;
pub mod pipeline;
pub mod series;
pub mod session;
pub mod settings;

#[cfg(test)]
mod fixture;

/// Get the directory where program settings are stored.
///
/// Falls back to the current directory if the platform has no config directory.
pub fn get_chargemap_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push("chargemap");

    path
}
