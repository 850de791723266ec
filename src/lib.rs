//! # Butterfly-trip Library
//!
//! Exact round-trip optimization over a small set of waypoints, and assembly
//! of the resulting tour into one continuous route geometry.
//!
//! ## Features
//!
//! - **Exact solving**: Held–Karp dynamic programming, deterministic tie-breaking
//! - **Pluggable providers**: cost matrices and leg geometries come from any
//!   [`CostMatrixProvider`] / [`LegGeometryProvider`]
//! - **Best-effort assembly**: failed legs are skipped and reported, not fatal
//! - **Ordered concurrency**: optional parallel leg fetching, merged in tour order
//! - **Cancellation**: abandon an assembly without partial output
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use butterfly_trip::{CostMatrix, Waypoint};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let matrix = CostMatrix::from_rows(&[
//!         [0.0, 10.0, 15.0],
//!         [10.0, 0.0, 20.0],
//!         [15.0, 20.0, 0.0],
//!     ])?;
//!     let tour = butterfly_trip::solve(&matrix)?;
//!     println!("visit order {:?}, cost {}", tour.tour, tour.cost);
//!
//!     let waypoints = [
//!         Waypoint::new(4.35, 50.85),
//!         Waypoint::new(4.40, 50.86),
//!         Waypoint::new(4.38, 50.80),
//!     ];
//!     let legs = butterfly_trip::leg_fn(|from, to| Ok(vec![from, to]));
//!     let route = butterfly_trip::assemble(&tour.tour, &waypoints, &legs, "driving").await?;
//!     println!("{} points, bbox {:?}", route.coordinates.len(), route.bbox);
//!     Ok(())
//! }
//! ```
//!
//! ## Planning From Waypoints
//!
//! ```rust,no_run
//! use butterfly_trip::{AssembleOptions, HaversineMatrix, PrecomputedLegs, Waypoint};
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let waypoints = vec![Waypoint::new(4.35, 50.85), Waypoint::new(4.40, 50.86)];
//! let legs = PrecomputedLegs::load(Path::new("legs.json"))?;
//! let options = AssembleOptions {
//!     max_in_flight: 4,
//!     ..Default::default()
//! };
//!
//! let plan =
//!     butterfly_trip::plan_trip(&waypoints, "cycling", &HaversineMatrix, &legs, &options).await?;
//! println!("{}", plan.route.to_geojson());
//! # Ok(())
//! # }
//! ```

// Re-export core types that users might need
pub use crate::core::{
    haversine_distance, leg_fn, tour_cost, validate_waypoints, AssembleOptions, AssembledRoute,
    BoundingBox, CostMatrix, CostMatrixProvider, FnLegProvider, HaversineMatrix, LegFetchError,
    LegGeometryProvider, LegProgress, PrecomputedLegs, SkipReason, SkippedLeg, TourResult,
    TripPlan, TripSummary, Waypoint, MAX_EXACT_WAYPOINTS,
};
pub use butterfly_common::{
    parse_profile, suggest_profile, Error, Result, DEFAULT_PROFILE, KNOWN_PROFILES,
};

// Internal modules
mod core;

/// Compute the minimum-cost closed tour through every waypoint of `matrix`
///
/// The tour starts and ends at waypoint 0.
///
/// # Examples
/// ```rust
/// let matrix = butterfly_trip::CostMatrix::from_rows(&[[0.0, 10.0], [20.0, 0.0]]).unwrap();
/// let result = butterfly_trip::solve(&matrix).unwrap();
/// assert_eq!(result.tour, vec![0, 1, 0]);
/// assert_eq!(result.cost, 30.0);
/// ```
pub fn solve(matrix: &CostMatrix) -> Result<TourResult> {
    crate::core::solver::solve(matrix)
}

/// Fetch and merge every leg of `tour`, one request at a time
///
/// # Arguments
/// * `tour` - Waypoint indices in visit order
/// * `waypoints` - Coordinates addressed by the tour
/// * `provider` - Leg geometry source
/// * `profile` - Travel profile passed through to the provider
pub async fn assemble<P>(
    tour: &[usize],
    waypoints: &[Waypoint],
    provider: &P,
    profile: &str,
) -> Result<AssembledRoute>
where
    P: LegGeometryProvider + ?Sized,
{
    crate::core::assemble::assemble(tour, waypoints, provider, profile, &AssembleOptions::default())
        .await
}

/// Fetch and merge every leg of `tour` with custom options
///
/// Provides control over fetch concurrency, progress reporting and cancellation.
///
/// # Examples
/// ```rust,no_run
/// use butterfly_trip::{AssembleOptions, Waypoint};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let waypoints = [Waypoint::new(0.0, 0.0), Waypoint::new(1.0, 1.0)];
/// let provider = butterfly_trip::leg_fn(|from, to| Ok(vec![from, to]));
/// let options = AssembleOptions {
///     max_in_flight: 2,
///     progress: Some(Arc::new(|done: usize, total: usize| {
///         println!("Fetched leg {done} / {total}");
///     })),
///     cancel: None,
/// };
///
/// butterfly_trip::assemble_with_options(&[0, 1, 0], &waypoints, &provider, "walking", &options)
///     .await?;
/// # Ok(())
/// # }
/// ```
pub async fn assemble_with_options<P>(
    tour: &[usize],
    waypoints: &[Waypoint],
    provider: &P,
    profile: &str,
    options: &AssembleOptions,
) -> Result<AssembledRoute>
where
    P: LegGeometryProvider + ?Sized,
{
    crate::core::assemble::assemble(tour, waypoints, provider, profile, options).await
}

/// Plan a round trip end to end
///
/// Validates the waypoints, fetches their cost matrix, solves the visiting
/// order and assembles the route.
pub async fn plan_trip<M, L>(
    waypoints: &[Waypoint],
    profile: &str,
    matrix_provider: &M,
    leg_provider: &L,
    options: &AssembleOptions,
) -> Result<TripPlan>
where
    M: CostMatrixProvider + ?Sized,
    L: LegGeometryProvider + ?Sized,
{
    crate::core::planner::plan_trip(waypoints, profile, matrix_provider, leg_provider, options)
        .await
}
