//! Core library modules for butterfly-trip
//!
//! This module contains the internal implementation of round-trip solving
//! and route assembly.

pub mod assemble;
pub mod geo;
pub mod matrix;
pub mod planner;
pub mod provider;
pub mod solver;

// Re-export main types for internal use
pub use assemble::{AssembleOptions, AssembledRoute, LegProgress, SkipReason, SkippedLeg};
pub use geo::{haversine_distance, validate_waypoints, BoundingBox, Waypoint};
pub use matrix::{CostMatrix, MAX_EXACT_WAYPOINTS};
pub use planner::{TripPlan, TripSummary};
pub use provider::{
    leg_fn, CostMatrixProvider, FnLegProvider, HaversineMatrix, LegFetchError,
    LegGeometryProvider, PrecomputedLegs,
};
pub use solver::{tour_cost, TourResult};
