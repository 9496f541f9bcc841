//! Euclidean projection onto the scaled simplex.
//!
//! Projects onto `{x : Σ x_k = C, x ≥ 0}` over the selected coordinates.
//!
//! # Closed form
//!
//! The KKT conditions give `x_k = max(x0_k − λ, 0)` for one scalar λ, so the
//! support is the top `m` coordinates by input value. With the inputs sorted
//! descending, every `m` has shift `δ_m = (C − S_m)/m` and squared distance
//!
//! ```text
//! m·δ_m² + Σ_{excluded} x0_k²
//! ```
//!
//! A candidate is self-consistent when its smallest included value is
//! non-negative, which makes it a feasible point; the self-consistent
//! candidate of least distance is therefore the projection. `m = 1` is always
//! self-consistent for `C > 0`. Prefix sums make the whole scan O(K log K),
//! dominated by the sort.

use tracing::{debug, warn};

use super::support::{scan_support, suffix_sums};
use super::traits::Projector;
use crate::error::{ProjectionError, ProjectionResult};
use crate::invariants::check_sum_equals;
use crate::problem::{ProjectionSettings, Selection};
use crate::util::numerics::{ensure_finite, ensure_finite_scalar, sorted_desc};

/// Projection onto `{x : Σ x = target, x ≥ 0}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplexProjector {
    /// Required sum of the selected coordinates
    pub target: f64,
}

impl SimplexProjector {
    /// Create a projector for the given target sum.
    pub fn new(target: f64) -> Self {
        Self { target }
    }
}

impl Projector for SimplexProjector {
    fn name(&self) -> &'static str {
        "simplex"
    }

    fn project(
        &self,
        x0: &[f64],
        selection: Selection<'_>,
        settings: &ProjectionSettings,
    ) -> ProjectionResult<Vec<f64>> {
        settings.validate()?;
        ensure_finite("x0", x0)?;
        ensure_finite_scalar("target", self.target)?;

        let idx = selection.resolve(x0.len())?;
        if idx.is_empty() {
            return Err(ProjectionError::InvalidInput(
                "simplex projection needs at least one coordinate".into(),
            ));
        }
        if self.target < 0.0 {
            return Err(ProjectionError::Infeasible {
                lower_sum: 0.0,
                target: self.target,
            });
        }

        let mut x = x0.to_vec();

        if self.target == 0.0 {
            for &k in &idx {
                x[k] = 0.0;
            }
            return Ok(x);
        }

        let values: Vec<f64> = idx.iter().map(|&k| x0[k]).collect();
        let order = sorted_desc(&values);
        let squares: Vec<f64> = values.iter().map(|v| v * v).collect();
        let tail_sq = suffix_sums(&squares, &order);

        // No slack: every accepted candidate is a feasible point.
        let support = scan_support(&values, &order, self.target, 0.0, |m, d| {
            m as f64 * d * d + tail_sq[m]
        })
        .ok_or_else(|| {
            warn!(n = idx.len(), target = self.target, "simplex projection found no support");
            ProjectionError::InvariantViolation(
                "no self-consistent support for simplex projection".into(),
            )
        })?;

        for (rank, &pos) in order.iter().enumerate() {
            let k = idx[pos];
            x[k] = if rank < support.size {
                values[pos] + support.shift
            } else {
                0.0
            };
        }

        check_sum_equals(&x, &idx, self.target, settings.tol).map_err(|e| {
            warn!(error = %e, "simplex projection post-condition failed");
            e
        })?;

        debug!(
            n = idx.len(),
            support = support.size,
            shift = support.shift,
            distance_sq = support.cost,
            "simplex projection"
        );

        Ok(x)
    }
}
