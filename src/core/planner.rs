//! End-to-end trip planning: matrix, optimal order, merged geometry

use butterfly_common::{Error, Result};
use serde::Serialize;
use tracing::debug;

use super::assemble::{assemble, AssembleOptions, AssembledRoute};
use super::geo::{validate_waypoints, Waypoint};
use super::matrix::MAX_EXACT_WAYPOINTS;
use super::provider::{CostMatrixProvider, LegGeometryProvider};
use super::solver::{solve, TourResult};

/// Optimized visiting order together with its assembled route
#[derive(Debug, Clone)]
pub struct TripPlan {
    pub tour: TourResult,
    pub route: AssembledRoute,
}

/// Summary of a plan for machine-readable output
#[derive(Debug, Serialize)]
pub struct TripSummary<'a> {
    pub tour: &'a [usize],
    pub cost: f64,
    pub points: usize,
    pub length_m: f64,
    pub skipped_legs: usize,
}

impl TripPlan {
    /// Waypoints in visit order, closing back at the start
    pub fn ordered_waypoints(&self, waypoints: &[Waypoint]) -> Vec<Waypoint> {
        self.tour
            .tour
            .iter()
            .filter_map(|&i| waypoints.get(i).copied())
            .collect()
    }

    pub fn summary(&self) -> TripSummary<'_> {
        TripSummary {
            tour: &self.tour.tour,
            cost: self.tour.cost,
            points: self.route.coordinates.len(),
            length_m: self.route.length_m(),
            skipped_legs: self.route.skipped_legs.len(),
        }
    }
}

/// Validate waypoints, fetch their cost matrix, solve the round trip and
/// assemble its geometry.
///
/// The matrix provider must return one row per waypoint; any other
/// dimension is [`Error::InvalidInput`].
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
    validate_waypoints(waypoints)?;
    if waypoints.len() > MAX_EXACT_WAYPOINTS {
        return Err(Error::InvalidInput(format!(
            "{} waypoints exceeds the exact solver limit of {MAX_EXACT_WAYPOINTS}",
            waypoints.len()
        )));
    }

    let matrix = matrix_provider.fetch_matrix(waypoints, profile).await?;
    if matrix.dimension() != waypoints.len() {
        return Err(Error::InvalidInput(format!(
            "cost matrix has {} rows for {} waypoints",
            matrix.dimension(),
            waypoints.len()
        )));
    }

    let tour = solve(&matrix)?;
    debug!(cost = tour.cost, tour = ?tour.tour, profile, "visiting order chosen");

    let route = assemble(&tour.tour, waypoints, leg_provider, profile, options).await?;
    Ok(TripPlan { tour, route })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matrix::CostMatrix;
    use crate::core::provider::{leg_fn, HaversineMatrix, LegFetchError};
    use async_trait::async_trait;

    /// Matrix service that is always over quota
    struct RateLimitedMatrix;

    #[async_trait]
    impl CostMatrixProvider for RateLimitedMatrix {
        async fn fetch_matrix(
            &self,
            _waypoints: &[Waypoint],
            profile: &str,
        ) -> Result<CostMatrix> {
            Err(Error::ProviderError(format!(
                "matrix request for '{profile}' rejected: TooManyRequests"
            )))
        }
    }

    fn straight(from: Waypoint, to: Waypoint) -> std::result::Result<Vec<Waypoint>, LegFetchError> {
        Ok(vec![from, to])
    }

    #[tokio::test]
    async fn test_plan_trip_with_haversine_costs() {
        // Corners of a unit square given out of perimeter order
        let waypoints = [
            Waypoint::new(0.0, 0.0),
            Waypoint::new(1.0, 1.0),
            Waypoint::new(0.0, 1.0),
            Waypoint::new(1.0, 0.0),
        ];
        let plan = plan_trip(
            &waypoints,
            "driving",
            &HaversineMatrix,
            &leg_fn(straight),
            &AssembleOptions::default(),
        )
        .await
        .unwrap();

        // The diagonal 0 -> 1 is never taken by an optimal tour
        assert_eq!(plan.tour.tour.len(), 5);
        assert!(plan
            .tour
            .legs()
            .all(|(a, b)| !matches!((a, b), (0, 1) | (1, 0) | (2, 3) | (3, 2))));
        assert_eq!(plan.route.coordinates.len(), 8);
        assert!(plan.route.is_complete());

        let ordered = plan.ordered_waypoints(&waypoints);
        assert_eq!(ordered.first(), Some(&waypoints[0]));
        assert_eq!(ordered.last(), Some(&waypoints[0]));

        let summary = plan.summary();
        assert_eq!(summary.points, 8);
        assert_eq!(summary.skipped_legs, 0);
        assert!((summary.length_m - plan.tour.cost).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_plan_trip_uses_supplied_matrix() {
        let waypoints = [
            Waypoint::new(0.0, 0.0),
            Waypoint::new(1.0, 0.0),
            Waypoint::new(2.0, 0.0),
        ];
        // Asymmetric costs force 0 -> 2 -> 1 -> 0
        let matrix =
            CostMatrix::from_rows(&[[0.0, 9.0, 1.0], [1.0, 0.0, 9.0], [9.0, 1.0, 0.0]]).unwrap();
        let plan = plan_trip(
            &waypoints,
            "walking",
            &matrix,
            &leg_fn(straight),
            &AssembleOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(plan.tour.tour, vec![0, 2, 1, 0]);
        assert_eq!(plan.tour.cost, 3.0);
    }

    #[tokio::test]
    async fn test_plan_trip_rejects_dimension_mismatch() {
        let waypoints = [Waypoint::new(0.0, 0.0), Waypoint::new(1.0, 0.0)];
        let matrix = CostMatrix::from_rows(&[[0.0; 3]; 3]).unwrap();
        let result = plan_trip(
            &waypoints,
            "driving",
            &matrix,
            &leg_fn(straight),
            &AssembleOptions::default(),
        )
        .await;

        match result {
            Err(Error::InvalidInput(msg)) => {
                assert!(msg.contains("3 rows for 2 waypoints"), "{msg}")
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_plan_trip_rejects_bad_waypoints() {
        let provider = leg_fn(straight);
        let options = AssembleOptions::default();

        let out_of_range = [Waypoint::new(0.0, 0.0), Waypoint::new(200.0, 0.0)];
        assert!(matches!(
            plan_trip(&out_of_range, "driving", &HaversineMatrix, &provider, &options).await,
            Err(Error::InvalidInput(_))
        ));

        let too_many: Vec<Waypoint> = (0..=MAX_EXACT_WAYPOINTS)
            .map(|i| Waypoint::new(i as f64 * 0.01, 0.0))
            .collect();
        assert!(matches!(
            plan_trip(&too_many, "driving", &HaversineMatrix, &provider, &options).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_plan_trip_propagates_leg_failure() {
        let waypoints = [Waypoint::new(0.0, 0.0), Waypoint::new(1.0, 0.0)];
        let provider = leg_fn(|from, to| Err(LegFetchError::NoRoute { from, to }));
        let result = plan_trip(
            &waypoints,
            "cycling",
            &HaversineMatrix,
            &provider,
            &AssembleOptions::default(),
        )
        .await;
        assert!(matches!(result, Err(Error::LegUnavailable(0))));
    }

    #[tokio::test]
    async fn test_plan_trip_propagates_matrix_provider_failure() {
        let waypoints = [Waypoint::new(0.0, 0.0), Waypoint::new(1.0, 0.0)];
        let calls = std::sync::Mutex::new(0usize);
        let legs = leg_fn(|from, to| {
            *calls.lock().unwrap() += 1;
            Ok(vec![from, to])
        });

        let result = plan_trip(
            &waypoints,
            "driving",
            &RateLimitedMatrix,
            &legs,
            &AssembleOptions::default(),
        )
        .await;

        match result {
            Err(err @ Error::ProviderError(_)) => assert_eq!(
                err.to_string(),
                "Provider error: matrix request for 'driving' rejected: TooManyRequests"
            ),
            other => panic!("Expected ProviderError, got {other:?}"),
        }
        // No leg is fetched without a matrix
        assert_eq!(*calls.lock().unwrap(), 0);
    }
}
