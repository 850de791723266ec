//! Collaborator contracts for cost matrices and leg geometry
//!
//! Hosted routing services sit behind these traits; the solver and assembler
//! never perform network I/O themselves. Implementations own their own
//! timeout and retry behavior.

use async_trait::async_trait;
use butterfly_common::{Error, Result};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;

use super::geo::{haversine_distance, Waypoint};
use super::matrix::CostMatrix;

/// Why a leg geometry could not be produced
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LegFetchError {
    /// The provider knows no path between the two coordinates
    #[error("no route from {from} to {to}")]
    NoRoute { from: Waypoint, to: Waypoint },

    /// The provider answered with a non-OK status code
    #[error("provider returned status '{0}'")]
    Status(String),

    /// Transport or decoding failure reported by the provider
    #[error("{0}")]
    Other(String),
}

/// Produces the path geometry for one leg of a tour
#[async_trait]
pub trait LegGeometryProvider: Send + Sync {
    /// Ordered `[lon, lat]` points from `from` to `to` for the given travel profile
    async fn fetch_leg(
        &self,
        from: Waypoint,
        to: Waypoint,
        profile: &str,
    ) -> std::result::Result<Vec<Waypoint>, LegFetchError>;
}

/// Produces the N×N travel-cost matrix for a waypoint list
///
/// Service-side failures (transport, quota, non-OK status) are reported as
/// [`Error::ProviderError`]; a matrix that cannot be represented is
/// [`Error::InvalidInput`].
#[async_trait]
pub trait CostMatrixProvider: Send + Sync {
    async fn fetch_matrix(&self, waypoints: &[Waypoint], profile: &str) -> Result<CostMatrix>;
}

/// A fixed matrix, e.g. one loaded from disk. Waypoints and profile are ignored.
#[async_trait]
impl CostMatrixProvider for CostMatrix {
    async fn fetch_matrix(&self, _waypoints: &[Waypoint], _profile: &str) -> Result<CostMatrix> {
        Ok(self.clone())
    }
}

/// Offline matrix of great-circle distances in meters
///
/// Symmetric and profile-independent; useful when no routing service is
/// available or for estimating a visiting order before fetching real costs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineMatrix;

#[async_trait]
impl CostMatrixProvider for HaversineMatrix {
    async fn fetch_matrix(&self, waypoints: &[Waypoint], _profile: &str) -> Result<CostMatrix> {
        CostMatrix::from_fn(waypoints.len(), |i, j| {
            haversine_distance(waypoints[i], waypoints[j])
        })
    }
}

/// Adapter turning a plain `(from, to) -> geometry` function into a provider
pub struct FnLegProvider<F>(F);

/// Wrap a synchronous leg fetcher
pub fn leg_fn<F>(fetch: F) -> FnLegProvider<F>
where
    F: Fn(Waypoint, Waypoint) -> std::result::Result<Vec<Waypoint>, LegFetchError> + Send + Sync,
{
    FnLegProvider(fetch)
}

#[async_trait]
impl<F> LegGeometryProvider for FnLegProvider<F>
where
    F: Fn(Waypoint, Waypoint) -> std::result::Result<Vec<Waypoint>, LegFetchError> + Send + Sync,
{
    async fn fetch_leg(
        &self,
        from: Waypoint,
        to: Waypoint,
        _profile: &str,
    ) -> std::result::Result<Vec<Waypoint>, LegFetchError> {
        (self.0)(from, to)
    }
}

/// Exact-bit lookup key for a `(from, to)` coordinate pair
type LegKey = [u64; 4];

fn leg_key(from: Waypoint, to: Waypoint) -> LegKey {
    // -0.0 and 0.0 must land on the same key
    let bits = |v: f64| if v == 0.0 { 0u64 } else { v.to_bits() };
    [bits(from.lon), bits(from.lat), bits(to.lon), bits(to.lat)]
}

/// One precomputed leg as stored on disk
#[derive(Debug, Deserialize)]
struct LegRecord {
    from: Waypoint,
    to: Waypoint,
    coordinates: Vec<Waypoint>,
}

/// Leg geometries fetched ahead of time, looked up by exact endpoint coordinates
///
/// The JSON form is an array of
/// `{ "from": [lon, lat], "to": [lon, lat], "coordinates": [[lon, lat], ...] }`.
/// Legs are directional: a `from -> to` record does not serve `to -> from`.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedLegs {
    legs: FxHashMap<LegKey, Vec<Waypoint>>,
}

impl PrecomputedLegs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the geometry for `from -> to`
    pub fn insert(&mut self, from: Waypoint, to: Waypoint, coordinates: Vec<Waypoint>) {
        self.legs.insert(leg_key(from, to), coordinates);
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<LegRecord> = serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("Failed to parse leg file: {e}")))?;

        let mut legs = Self::new();
        for record in records {
            legs.insert(record.from, record.to, record.coordinates);
        }
        Ok(legs)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[async_trait]
impl LegGeometryProvider for PrecomputedLegs {
    async fn fetch_leg(
        &self,
        from: Waypoint,
        to: Waypoint,
        _profile: &str,
    ) -> std::result::Result<Vec<Waypoint>, LegFetchError> {
        self.legs
            .get(&leg_key(from, to))
            .cloned()
            .ok_or(LegFetchError::NoRoute { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_haversine_matrix_is_symmetric_with_zero_diagonal() {
        let waypoints = [
            Waypoint::new(-123.11554, 49.280747),
            Waypoint::new(-123.1207, 49.2827),
            Waypoint::new(-123.1384, 49.3043),
        ];
        let m = HaversineMatrix.fetch_matrix(&waypoints, "walking").await.unwrap();

        assert_eq!(m.dimension(), 3);
        assert!(m.is_symmetric());
        assert!(m.validate().is_ok());
        for i in 0..3 {
            assert_eq!(m.get(i, i), 0.0);
        }
        assert!(m.get(0, 2) > m.get(0, 1));
    }

    #[tokio::test]
    async fn test_haversine_matrix_empty_input() {
        assert!(matches!(
            HaversineMatrix.fetch_matrix(&[], "driving").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_static_matrix_provider() {
        let m = CostMatrix::from_rows(&[[0.0, 2.0], [3.0, 0.0]]).unwrap();
        let fetched = m.fetch_matrix(&[], "driving").await.unwrap();
        assert_eq!(fetched, m);
    }

    #[tokio::test]
    async fn test_precomputed_legs_lookup() {
        let json = r#"[
            {"from": [0, 0], "to": [1, 1], "coordinates": [[0, 0], [0.5, 0.4], [1, 1]]},
            {"from": [1, 1], "to": [0, 0], "coordinates": [[1, 1], [0, 0]]}
        ]"#;
        let legs = PrecomputedLegs::from_json_str(json).unwrap();
        assert_eq!(legs.len(), 2);

        let a = Waypoint::new(0.0, 0.0);
        let b = Waypoint::new(1.0, 1.0);
        let forward = legs.fetch_leg(a, b, "driving").await.unwrap();
        assert_eq!(forward.len(), 3);
        assert_eq!(forward[1], Waypoint::new(0.5, 0.4));

        // Negative zero matches the stored positive zero
        let back = legs.fetch_leg(b, Waypoint::new(-0.0, 0.0), "driving").await.unwrap();
        assert_eq!(back, vec![b, a]);

        let missing = legs.fetch_leg(a, Waypoint::new(2.0, 2.0), "driving").await;
        assert!(matches!(missing, Err(LegFetchError::NoRoute { .. })));
    }

    #[test]
    fn test_precomputed_legs_bad_json() {
        match PrecomputedLegs::from_json_str("{not json") {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("leg file"), "{msg}"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_leg_fn_adapter() {
        let provider = leg_fn(|from, to| Ok(vec![from, to]));
        let a = Waypoint::new(1.0, 2.0);
        let b = Waypoint::new(3.0, 4.0);
        assert_eq!(provider.fetch_leg(a, b, "cycling").await.unwrap(), vec![a, b]);
    }

    #[test]
    fn test_leg_fetch_error_display() {
        let err = LegFetchError::NoRoute {
            from: Waypoint::new(0.0, 0.0),
            to: Waypoint::new(1.5, 2.0),
        };
        assert_eq!(err.to_string(), "no route from [0, 0] to [1.5, 2]");
        assert_eq!(
            LegFetchError::Status("NoSegment".into()).to_string(),
            "provider returned status 'NoSegment'"
        );
    }
}
