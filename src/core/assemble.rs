//! Route assembly: fetch every leg of a tour and stitch the geometries
//!
//! Legs are requested through a [`LegGeometryProvider`] with at most
//! `max_in_flight` requests outstanding, and results are merged strictly in
//! tour order once every leg has resolved. Assembly is best-effort: a leg
//! that fails or returns no points is skipped and reported, and only a route
//! with no usable leg at all is an error.

use butterfly_common::{Error, Result};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::geo::{haversine_distance, BoundingBox, Waypoint};
use super::provider::{LegFetchError, LegGeometryProvider};

/// Progress callback, called as `(legs_done, legs_total)` in tour order
pub type LegProgress = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Options for route assembly
#[derive(Clone)]
pub struct AssembleOptions {
    /// Maximum leg requests outstanding at once (1 = strictly sequential)
    pub max_in_flight: usize,

    /// Optional progress callback
    pub progress: Option<LegProgress>,

    /// Abandons assembly when cancelled; nothing is returned for a cancelled call
    pub cancel: Option<CancellationToken>,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            max_in_flight: 1,
            progress: None,
            cancel: None,
        }
    }
}

/// Why a leg contributed no geometry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The provider answered with an empty geometry
    NoPoints,
    /// The provider failed for this leg
    Unavailable(String),
}

/// A leg left out of the merged route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedLeg {
    /// Position of the leg in the tour (leg `i` joins `tour[i]` and `tour[i + 1]`)
    pub leg: usize,
    /// Waypoint index the leg starts from
    pub from: usize,
    /// Waypoint index the leg ends at
    pub to: usize,
    pub reason: SkipReason,
}

/// Merged geometry of a whole tour
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRoute {
    /// Every leg's points in tour order. Shared endpoints between consecutive
    /// legs are kept, so they appear twice.
    pub coordinates: Vec<Waypoint>,
    /// Bounds of `coordinates`
    pub bbox: BoundingBox,
    /// Number of legs in the tour, including skipped ones
    pub leg_count: usize,
    pub skipped_legs: Vec<SkippedLeg>,
}

impl AssembledRoute {
    /// True when no leg was skipped
    pub fn is_complete(&self) -> bool {
        self.skipped_legs.is_empty()
    }

    /// Great-circle length of the merged polyline in meters
    pub fn length_m(&self) -> f64 {
        self.coordinates
            .windows(2)
            .map(|w| haversine_distance(w[0], w[1]))
            .sum()
    }

    /// Running distance in meters at each point, starting at 0
    ///
    /// Used to draw the line progressively; repeated endpoints add no distance.
    pub fn cumulative_distances(&self) -> Vec<f64> {
        let mut total = 0.0;
        let mut distances = Vec::with_capacity(self.coordinates.len());
        distances.push(0.0);
        for w in self.coordinates.windows(2) {
            total += haversine_distance(w[0], w[1]);
            distances.push(total);
        }
        distances
    }

    /// GeoJSON `Feature` with a `LineString` geometry
    pub fn to_geojson(&self) -> serde_json::Value {
        json!({
            "type": "Feature",
            "bbox": self.bbox.to_array(),
            "geometry": {
                "type": "LineString",
                "coordinates": self.coordinates,
            },
            "properties": {
                "leg_count": self.leg_count,
                "length_m": self.length_m(),
                "skipped_legs": self.skipped_legs,
            },
        })
    }
}

/// One leg to fetch: tour position plus both endpoint indices and coordinates
#[derive(Debug, Clone, Copy)]
struct LegRequest {
    leg: usize,
    from: usize,
    to: usize,
    from_point: Waypoint,
    to_point: Waypoint,
}

/// Map consecutive tour entries onto waypoint coordinates
fn resolve_legs(tour: &[usize], waypoints: &[Waypoint]) -> Result<Vec<LegRequest>> {
    if let Some(&index) = tour.iter().find(|&&i| i >= waypoints.len()) {
        return Err(Error::IndexOutOfRange {
            index,
            len: waypoints.len(),
        });
    }

    Ok(tour
        .windows(2)
        .enumerate()
        .map(|(leg, w)| LegRequest {
            leg,
            from: w[0],
            to: w[1],
            from_point: waypoints[w[0]],
            to_point: waypoints[w[1]],
        })
        .collect())
}

/// Fetch every leg of `tour` and merge the geometries in tour order.
///
/// Fails with [`Error::IndexOutOfRange`] before any request when a tour entry
/// does not address a waypoint, with [`Error::LegUnavailable`] (first failing
/// leg) when no leg produced geometry and at least one failed, with
/// [`Error::EmptyRoute`] when no leg produced geometry otherwise, and with
/// [`Error::Cancelled`] when `options.cancel` fires first.
pub async fn assemble<P>(
    tour: &[usize],
    waypoints: &[Waypoint],
    provider: &P,
    profile: &str,
    options: &AssembleOptions,
) -> Result<AssembledRoute>
where
    P: LegGeometryProvider + ?Sized,
{
    let legs = resolve_legs(tour, waypoints)?;
    let leg_count = legs.len();
    debug!(
        legs = leg_count,
        max_in_flight = options.max_in_flight,
        profile,
        "assembling route"
    );

    let fetch = fetch_legs(&legs, provider, profile, options);
    let results = match &options.cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("route assembly cancelled");
                return Err(Error::Cancelled);
            }
            results = fetch => results,
        },
        None => fetch.await,
    };

    merge_legs(&legs, results)
}

/// Issue leg requests with bounded concurrency, yielding results in tour order
async fn fetch_legs<P>(
    legs: &[LegRequest],
    provider: &P,
    profile: &str,
    options: &AssembleOptions,
) -> Vec<std::result::Result<Vec<Waypoint>, LegFetchError>>
where
    P: LegGeometryProvider + ?Sized,
{
    let total = legs.len();
    let mut done = 0;

    stream::iter(legs.iter().copied())
        .map(|req| async move {
            debug!(leg = req.leg, from = req.from, to = req.to, "fetching leg");
            provider.fetch_leg(req.from_point, req.to_point, profile).await
        })
        .buffered(options.max_in_flight.max(1))
        .inspect(|_| {
            done += 1;
            if let Some(progress) = &options.progress {
                progress(done, total);
            }
        })
        .collect()
        .await
}

fn merge_legs(
    legs: &[LegRequest],
    results: Vec<std::result::Result<Vec<Waypoint>, LegFetchError>>,
) -> Result<AssembledRoute> {
    let mut coordinates = Vec::new();
    let mut skipped_legs = Vec::new();
    let mut first_failure = None;
    let mut merged = 0;

    for (req, result) in legs.iter().zip(results) {
        let reason = match result {
            Ok(points) if !points.is_empty() => {
                debug!(leg = req.leg, points = points.len(), "leg merged");
                coordinates.extend(points);
                merged += 1;
                continue;
            }
            Ok(_) => {
                warn!(
                    leg = req.leg,
                    from = req.from,
                    to = req.to,
                    "leg returned no points, skipping"
                );
                SkipReason::NoPoints
            }
            Err(e) => {
                warn!(
                    leg = req.leg,
                    from = req.from,
                    to = req.to,
                    error = %e,
                    "leg unavailable, skipping"
                );
                first_failure.get_or_insert(req.leg);
                SkipReason::Unavailable(e.to_string())
            }
        };
        skipped_legs.push(SkippedLeg {
            leg: req.leg,
            from: req.from,
            to: req.to,
            reason,
        });
    }

    if merged == 0 {
        return Err(match first_failure {
            Some(leg) => Error::LegUnavailable(leg),
            None => Error::EmptyRoute,
        });
    }

    let bbox = BoundingBox::from_points(&coordinates).ok_or(Error::EmptyRoute)?;
    debug!(
        points = coordinates.len(),
        skipped = skipped_legs.len(),
        "route assembled"
    );

    Ok(AssembledRoute {
        coordinates,
        bbox,
        leg_count: legs.len(),
        skipped_legs,
    })
}
