//! Exact round-trip optimization (Held–Karp)
//!
//! Finds the minimum-cost closed tour that starts at waypoint 0, visits every
//! other waypoint exactly once and returns to 0. The state space is
//! `(visited set, current city)` with the visited set encoded as a bitmask
//! that always contains city 0.
//!
//! Both DP tables are preallocated dense arrays of `2^N × N` entries indexed
//! by `visited * n + city`. Subsets are filled in decreasing numeric order, so
//! every `visited | bit(next)` a state depends on is already final.
//!
//! Time O(N² · 2^N), space O(N · 2^N): callers cap N at
//! [`MAX_EXACT_WAYPOINTS`](super::matrix::MAX_EXACT_WAYPOINTS).

use butterfly_common::{Error, Result};
use serde::Serialize;

use super::matrix::CostMatrix;

/// Successor sentinel for states that have no recorded next city
const NO_SUCCESSOR: u8 = u8::MAX;

/// Result of round-trip optimization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourResult {
    /// Waypoint indices in visit order, starting and ending at 0 (length N+1)
    pub tour: Vec<usize>,
    /// Sum of consecutive leg costs, including the closing leg back to 0
    pub cost: f64,
}

impl TourResult {
    /// Consecutive `(from, to)` pairs of the tour
    pub fn legs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.tour.windows(2).map(|w| (w[0], w[1]))
    }

    /// For each original waypoint, its position in the optimized visit order
    ///
    /// Tour entries that do not address a waypoint are ignored.
    pub fn waypoint_positions(&self) -> Vec<usize> {
        let n = self.tour.len().saturating_sub(1);
        let mut positions = vec![0usize; n];
        for (position, &waypoint) in self.tour.iter().take(n).enumerate() {
            if let Some(slot) = positions.get_mut(waypoint) {
                *slot = position;
            }
        }
        positions
    }
}

/// Solve the round trip exactly.
///
/// Fails with [`Error::InvalidInput`] when any off-diagonal cost is negative
/// or non-finite, or the matrix exceeds the exact solver limit.
///
/// Ties are broken by the lowest-index next city, so equal inputs always give
/// the same tour.
pub fn solve(matrix: &CostMatrix) -> Result<TourResult> {
    matrix.validate()?;

    let n = matrix.dimension();
    if n == 1 {
        return Ok(TourResult {
            tour: vec![0, 0],
            cost: 0.0,
        });
    }

    let full: usize = (1 << n) - 1;
    let states = (full + 1) * n;
    tracing::debug!(waypoints = n, states, "solving round trip");

    // best[visited * n + city]: cheapest completion from `city` having visited `visited`
    let mut best = vec![f64::INFINITY; states];
    let mut successor = vec![NO_SUCCESSOR; states];

    for visited in (1..=full).rev() {
        if visited & 1 == 0 {
            continue;
        }

        for city in 0..n {
            if visited & (1 << city) == 0 {
                continue;
            }
            // City 0 is only ever the start
            if city == 0 && visited != 1 {
                continue;
            }

            let slot = visited * n + city;
            if visited == full {
                best[slot] = matrix.get(city, 0);
                continue;
            }

            let mut best_cost = f64::INFINITY;
            let mut best_next = NO_SUCCESSOR;
            for next in 1..n {
                if visited & (1 << next) != 0 {
                    continue;
                }
                let candidate = matrix.get(city, next) + best[(visited | (1 << next)) * n + next];
                // Keep the first candidate even when its sum overflowed to infinity
                if best_next == NO_SUCCESSOR || candidate < best_cost {
                    best_cost = candidate;
                    best_next = next as u8;
                }
            }

            best[slot] = best_cost;
            successor[slot] = best_next;
        }
    }

    let tour = reconstruct(&successor, n, full)?;
    let cost = tour_cost(matrix, &tour);

    tracing::debug!(cost, optimum = best[n], ?tour, "optimal round trip found");

    Ok(TourResult { tour, cost })
}

/// Follow successor pointers from `(visited = {0}, city = 0)` until every city is visited
fn reconstruct(successor: &[u8], n: usize, full: usize) -> Result<Vec<usize>> {
    let mut tour = Vec::with_capacity(n + 1);
    tour.push(0);

    let mut city = 0usize;
    let mut visited = 1usize;
    while visited != full {
        let next = successor[visited * n + city];
        if next == NO_SUCCESSOR {
            return Err(Error::InvalidInput(format!(
                "no successor recorded for city {city} with visited set {visited:#b}"
            )));
        }
        city = next as usize;
        visited |= 1 << city;
        tour.push(city);
    }

    tour.push(0);
    Ok(tour)
}

/// Total cost of a tour, summing consecutive legs left to right.
///
/// A leg from a waypoint to itself costs nothing, so `[0, 0]` is free even
/// when the diagonal is undefined.
pub fn tour_cost(matrix: &CostMatrix, tour: &[usize]) -> f64 {
    tour.windows(2)
        .filter(|w| w[0] != w[1])
        .map(|w| matrix.get(w[0], w[1]))
        .sum()
}
