//! Post-condition checks.
//!
//! The operators run these on their own output before committing it; tests
//! and the bench harness reuse them to validate results independently.

use crate::error::{ProjectionError, ProjectionResult};
use crate::problem::LowerBound;
use crate::util::numerics::selected_sum;

/// `|Σ_{k∈idx} x_k − target| ≤ tol`.
pub fn check_sum_equals(x: &[f64], idx: &[usize], target: f64, tol: f64) -> ProjectionResult<()> {
    let sum = selected_sum(x, idx);
    if (sum - target).abs() <= tol {
        Ok(())
    } else {
        Err(ProjectionError::InvariantViolation(format!(
            "selected sum {} differs from target {} by more than {}",
            sum, target, tol
        )))
    }
}

/// `Σ_{k∈idx} x_k ≤ cap + tol`.
pub fn check_sum_at_most(x: &[f64], idx: &[usize], cap: f64, tol: f64) -> ProjectionResult<()> {
    let sum = selected_sum(x, idx);
    if sum <= cap + tol {
        Ok(())
    } else {
        Err(ProjectionError::InvariantViolation(format!(
            "selected sum {} exceeds capacity {} by more than {}",
            sum, cap, tol
        )))
    }
}

/// `x_k ≥ lower_k − tol` for every selected coordinate.
pub fn check_lower_bounds(
    x: &[f64],
    idx: &[usize],
    lower: LowerBound<'_>,
    tol: f64,
) -> ProjectionResult<()> {
    for &k in idx {
        let lo = lower.at(k);
        if x[k] < lo - tol {
            return Err(ProjectionError::InvariantViolation(format!(
                "coordinate {} = {} is below its lower bound {}",
                k, x[k], lo
            )));
        }
    }
    Ok(())
}
