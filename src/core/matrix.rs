//! Dense N×N travel-cost matrix
//!
//! Costs are stored flat, row-major: `costs[i * n + j]` is the cost from
//! waypoint `i` to waypoint `j`. Asymmetric matrices are allowed.

use butterfly_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Largest waypoint count accepted by the exact solver.
///
/// The DP tables hold `N × 2^N` entries; at 18 waypoints that is ~4.7M states.
pub const MAX_EXACT_WAYPOINTS: usize = 18;

/// Square matrix of non-negative travel costs (durations or distances)
///
/// Diagonal entries may be undefined (`NaN`); they are never consulted when
/// the matrix has more than one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Option<f64>>>", into = "Vec<Vec<Option<f64>>>")]
pub struct CostMatrix {
    n: usize,
    costs: Vec<f64>,
}

impl CostMatrix {
    /// Build from rows, rejecting empty and non-square input
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(Error::InvalidInput("cost matrix is empty".into()));
        }

        let mut costs = Vec::with_capacity(n * n);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n {
                return Err(Error::InvalidInput(format!(
                    "cost matrix is not square: row {i} has {} entries, expected {n}",
                    row.len()
                )));
            }
            costs.extend_from_slice(row);
        }

        Ok(Self { n, costs })
    }

    /// Build from a flat row-major buffer of `n * n` costs
    pub fn from_flat(n: usize, costs: Vec<f64>) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidInput("cost matrix is empty".into()));
        }
        if costs.len() != n * n {
            return Err(Error::InvalidInput(format!(
                "cost matrix is not square: {} entries for {n} waypoints",
                costs.len()
            )));
        }
        Ok(Self { n, costs })
    }

    /// Build an `n × n` matrix by evaluating `cost(from, to)` for every pair
    pub fn from_fn(n: usize, mut cost: impl FnMut(usize, usize) -> f64) -> Result<Self> {
        let mut costs = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                costs.push(cost(i, j));
            }
        }
        Self::from_flat(n, costs)
    }

    /// Number of waypoints (rows)
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// Cost from waypoint `from` to waypoint `to`
    #[inline]
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.costs[from * self.n + to]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.costs.chunks(self.n)
    }

    /// Check every off-diagonal cost is finite and non-negative, and the
    /// matrix is small enough for the exact solver
    pub fn validate(&self) -> Result<()> {
        if self.n > MAX_EXACT_WAYPOINTS {
            return Err(Error::InvalidInput(format!(
                "{} waypoints exceeds the exact solver limit of {MAX_EXACT_WAYPOINTS}",
                self.n
            )));
        }

        for i in 0..self.n {
            for j in 0..self.n {
                if i == j {
                    continue;
                }
                let c = self.get(i, j);
                if !c.is_finite() {
                    return Err(Error::InvalidInput(format!(
                        "cost from {i} to {j} is not finite ({c})"
                    )));
                }
                if c < 0.0 {
                    return Err(Error::InvalidInput(format!(
                        "cost from {i} to {j} is negative ({c})"
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (i + 1..self.n).all(|j| self.get(i, j) == self.get(j, i)))
    }
}

/// Matrix services report unreachable pairs as `null`. A `null` is only
/// accepted on the diagonal, where it becomes `NaN`.
impl TryFrom<Vec<Vec<Option<f64>>>> for CostMatrix {
    type Error = Error;

    fn try_from(rows: Vec<Vec<Option<f64>>>) -> Result<Self> {
        let mut dense = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            let mut out = Vec::with_capacity(row.len());
            for (j, cell) in row.into_iter().enumerate() {
                match cell {
                    Some(c) => out.push(c),
                    None if i == j => out.push(f64::NAN),
                    None => {
                        return Err(Error::InvalidInput(format!(
                            "no travel cost from {i} to {j} (unreachable pair)"
                        )))
                    }
                }
            }
            dense.push(out);
        }
        Self::from_rows(&dense)
    }
}

impl From<CostMatrix> for Vec<Vec<Option<f64>>> {
    fn from(m: CostMatrix) -> Self {
        m.rows()
            .map(|row| row.iter().map(|c| (!c.is_nan()).then_some(*c)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_flat_layout() {
        let m = CostMatrix::from_rows(&[[0.0, 1.0], [2.0, 0.0]]).unwrap();
        assert_eq!(m.dimension(), 2);
        assert_eq!(m.get(0, 1), 1.0);
        assert_eq!(m.get(1, 0), 2.0);
        assert!(!m.is_symmetric());
    }

    #[test]
    fn test_from_rows_rejects_empty() {
        let rows: Vec<Vec<f64>> = vec![];
        assert!(matches!(
            CostMatrix::from_rows(&rows),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_from_rows_rejects_non_square() {
        let rows = vec![vec![0.0, 1.0, 2.0], vec![1.0, 0.0, 2.0]];
        match CostMatrix::from_rows(&rows) {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("not square"), "{msg}"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }

        let ragged = vec![vec![0.0, 1.0], vec![1.0]];
        assert!(CostMatrix::from_rows(&ragged).is_err());
    }

    #[test]
    fn test_from_flat_length_mismatch() {
        assert!(CostMatrix::from_flat(2, vec![0.0, 1.0, 2.0]).is_err());
        assert!(CostMatrix::from_flat(0, vec![]).is_err());
    }

    #[test]
    fn test_validate_ignores_diagonal() {
        let m = CostMatrix::from_rows(&[[f64::NAN, 1.0], [1.0, -5.0]]).unwrap();
        assert!(m.validate().is_ok());
        assert!(m.is_symmetric());
    }

    #[test]
    fn test_validate_rejects_bad_costs() {
        let negative = CostMatrix::from_rows(&[[0.0, -1.0], [1.0, 0.0]]).unwrap();
        assert!(matches!(negative.validate(), Err(Error::InvalidInput(_))));

        let nan = CostMatrix::from_rows(&[[0.0, 1.0], [f64::NAN, 0.0]]).unwrap();
        assert!(matches!(nan.validate(), Err(Error::InvalidInput(_))));

        let inf = CostMatrix::from_rows(&[[0.0, f64::INFINITY], [1.0, 0.0]]).unwrap();
        assert!(matches!(inf.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_oversized() {
        let n = MAX_EXACT_WAYPOINTS + 1;
        let m = CostMatrix::from_fn(n, |i, j| (i + j) as f64).unwrap();
        match m.validate() {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("exceeds"), "{msg}"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_deserialize_with_null_diagonal() {
        let m: CostMatrix = serde_json::from_str("[[null, 3.5], [4.0, null]]").unwrap();
        assert_eq!(m.get(0, 1), 3.5);
        assert!(m.get(0, 0).is_nan());
        assert!(m.validate().is_ok());

        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "[[null,3.5],[4.0,null]]");
    }

    #[test]
    fn test_deserialize_rejects_off_diagonal_null() {
        let err = serde_json::from_str::<CostMatrix>("[[0, null], [4.0, 0]]").unwrap_err();
        assert!(err.to_string().contains("unreachable"), "{err}");
    }

    #[test]
    fn test_deserialize_rejects_non_square() {
        assert!(serde_json::from_str::<CostMatrix>("[[0, 1, 2], [1, 0, 2]]").is_err());
    }
}
