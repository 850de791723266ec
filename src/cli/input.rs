//! Loading waypoint and cost-matrix files for the command line

use anyhow::{Context, Result};
use butterfly_trip::{validate_waypoints, CostMatrix, Waypoint};
use std::fs;
use std::path::Path;

/// Read a JSON array of `[lon, lat]` pairs
pub fn load_waypoints(path: &Path) -> Result<Vec<Waypoint>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read waypoints from {}", path.display()))?;
    let waypoints: Vec<Waypoint> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse waypoints in {}", path.display()))?;
    validate_waypoints(&waypoints)
        .with_context(|| format!("Invalid waypoints in {}", path.display()))?;
    Ok(waypoints)
}

/// Read a JSON array of matrix rows; `null` is accepted on the diagonal
pub fn load_matrix(path: &Path) -> Result<CostMatrix> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read cost matrix from {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse cost matrix in {}", path.display()))
}
