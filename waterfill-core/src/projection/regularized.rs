//! Exact minimizer of a separable linear-plus-quadratic cost on the simplex.
//!
//! ```text
//! minimize    Σ_k a_k x_k + ε x_k²
//! subject to  Σ_k x_k = C,  x_k ≥ xMin_k
//! ```
//!
//! With `u_k = −a_k/(2ε)` (the unconstrained minimizer of coordinate k) and
//! `w_k = u_k − xMin_k`, the optimum lifts the top `m` coordinates by `w`
//! to `xMin_k + w_k + s` for a shared `s = π/(2ε)` and leaves the rest at
//! their floor. An included coordinate contributes `ε(s² − u_k²)` to the
//! objective, so every candidate support is scored from prefix sums.
//!
//! Setting `a = −2ε·x0` and `xMin = 0` recovers the simplex projection up to
//! an additive constant.

use tracing::{debug, warn};

use super::support::{prefix_sums, scan_support, suffix_sums};
use super::traits::Projector;
use crate::error::{ProjectionError, ProjectionResult};
use crate::invariants::{check_lower_bounds, check_sum_equals};
use crate::problem::{LowerBound, ProjectionSettings, Selection};
use crate::util::numerics::{ensure_finite, ensure_finite_scalar, ensure_same_len, sorted_desc};

/// Regularized simplex minimization problem.
///
/// Used as a [`Projector`], the values of the selected coordinates of the
/// input vector are ignored: they are overwritten with the minimizer.
/// Unselected coordinates are copied through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegularizedSimplex<'a> {
    /// Linear cost per coordinate (length K)
    pub costs: &'a [f64],
    /// Per-coordinate floor
    pub lower: LowerBound<'a>,
    /// Required sum of the selected coordinates
    pub target: f64,
    /// Quadratic weight ε > 0
    pub epsilon: f64,
}

impl<'a> RegularizedSimplex<'a> {
    /// Problem with zero floors.
    pub fn new(costs: &'a [f64], target: f64, epsilon: f64) -> Self {
        Self {
            costs,
            lower: LowerBound::default(),
            target,
            epsilon,
        }
    }

    /// Replace the floor.
    pub fn with_lower(mut self, lower: impl Into<LowerBound<'a>>) -> Self {
        self.lower = lower.into();
        self
    }

    /// Objective `Σ a_k x_k + ε x_k²` over the selected coordinates.
    pub fn objective(&self, x: &[f64], selection: Selection<'_>) -> ProjectionResult<f64> {
        ensure_same_len(self.costs.len(), x.len())?;
        let idx = selection.resolve(x.len())?;
        Ok(idx
            .iter()
            .map(|&k| self.costs[k] * x[k] + self.epsilon * x[k] * x[k])
            .sum())
    }

    fn validate(&self, len: usize) -> ProjectionResult<()> {
        ensure_same_len(len, self.costs.len())?;
        ensure_finite("costs", self.costs)?;
        ensure_finite_scalar("target", self.target)?;
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(ProjectionError::InvalidInput(format!(
                "regularization weight must be finite and positive, got {}",
                self.epsilon
            )));
        }
        self.lower.validate(len)
    }
}

impl Projector for RegularizedSimplex<'_> {
    fn name(&self) -> &'static str {
        "regularized"
    }

    fn project(
        &self,
        x0: &[f64],
        selection: Selection<'_>,
        settings: &ProjectionSettings,
    ) -> ProjectionResult<Vec<f64>> {
        settings.validate()?;
        self.validate(x0.len())?;

        let idx = selection.resolve(x0.len())?;
        if idx.is_empty() {
            return Err(ProjectionError::InvalidInput(
                "regularized minimization needs at least one coordinate".into(),
            ));
        }

        let tol = settings.tol;
        let lower_sum = self.lower.sum_over(&idx);
        let pending = self.target - lower_sum;
        if pending < -tol {
            return Err(ProjectionError::Infeasible {
                lower_sum,
                target: self.target,
            });
        }

        let mut x = x0.to_vec();

        if pending.abs() <= tol {
            for &k in &idx {
                x[k] = self.lower.at(k);
            }
            debug!(n = idx.len(), "regularized minimizer: target equals floor sum");
            return Ok(x);
        }

        let eps = self.epsilon;
        let unconstrained: Vec<f64> = idx.iter().map(|&k| -self.costs[k] / (2.0 * eps)).collect();
        let lifts: Vec<f64> = idx
            .iter()
            .zip(&unconstrained)
            .map(|(&k, u)| u - self.lower.at(k))
            .collect();
        let floor_cost: Vec<f64> = idx
            .iter()
            .map(|&k| {
                let lo = self.lower.at(k);
                self.costs[k] * lo + eps * lo * lo
            })
            .collect();
        let u_sq: Vec<f64> = unconstrained.iter().map(|u| u * u).collect();

        let order = sorted_desc(&lifts);
        let head_u_sq = prefix_sums(&u_sq, &order);
        let tail_floor = suffix_sums(&floor_cost, &order);

        let support = scan_support(&lifts, &order, pending, settings.support_tol, |m, s| {
            eps * (m as f64 * s * s - head_u_sq[m]) + tail_floor[m]
        })
        .ok_or_else(|| {
            warn!(n = idx.len(), pending, "regularized minimizer found no finite candidate");
            ProjectionError::InvariantViolation(
                "no feasible finite-cost support for regularized minimization".into(),
            )
        })?;

        for (rank, &pos) in order.iter().enumerate() {
            let k = idx[pos];
            let lo = self.lower.at(k);
            x[k] = if rank < support.size {
                lo + support.shift + lifts[pos]
            } else {
                lo
            };
        }

        check_sum_equals(&x, &idx, self.target, tol)
            .and_then(|_| check_lower_bounds(&x, &idx, self.lower, tol))
            .map_err(|e| {
                warn!(error = %e, "regularized minimizer post-condition failed");
                e
            })?;

        debug!(
            n = idx.len(),
            support = support.size,
            multiplier = support.shift * 2.0 * eps,
            objective = support.cost,
            "regularized simplex minimization"
        );

        Ok(x)
    }
}
