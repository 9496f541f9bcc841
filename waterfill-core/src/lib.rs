//! Waterfill: exact projection kernels for rate-control loops
//!
//! This library provides the inner "projection" / "water-filling" step of
//! projected-gradient algorithms that split a scalar resource (bandwidth,
//! power, rate) across K coordinates. It supports:
//!
//! - **Simplex projection**: closest point with `Σ x = C`, `x ≥ 0`
//! - **Capacity water-filling**: closest point with `Σ x ≤ C`, `x ≥ xMin`
//! - **Regularized simplex minimization**: `min Σ a_k x_k + ε x_k²` with
//!   `Σ x = C`, `x ≥ xMin`
//! - **Box clamps and trust-region step limiting**
//!
//! # Algorithm
//!
//! Every operator is derived from its KKT conditions and solved exactly by a
//! sort plus prefix-sum scan, or by a water-filling loop bounded by K+1
//! passes. No general-purpose solver is involved and results are
//! deterministic.
//!
//! Operators act on a caller-owned vector; a [`Selection`] restricts them to a
//! subset of coordinates, and everything outside it is left untouched.
//!
//! # Example
//!
//! ```
//! use waterfill_core::{project_simplex, ProjectionSettings, Selection};
//!
//! let x = project_simplex(&[5.0, 1.0, 1.0], 3.0, Selection::All, &ProjectionSettings::default())?;
//! assert_eq!(x, vec![3.0, 0.0, 0.0]);
//! # Ok::<(), waterfill_core::ProjectionError>(())
//! ```

#![warn(clippy::all)]

pub mod bounds;
pub mod error;
pub mod invariants;
pub mod problem;
pub mod projection;
pub mod util;

// Re-export main types
pub use bounds::{
    clamp_lower, clamp_selected, clamp_to_box, clamp_upper, max_abs_change,
    scale_down_max_abs_change, scale_down_max_abs_change_in_place, scale_down_scalar_change,
};
pub use error::{ProjectionError, ProjectionResult};
pub use problem::{LowerBound, ProjectionSettings, Selection};
pub use projection::{
    CapacityProjector, Projector, RegularizedSimplex, SimplexProjector, WaterFillInfo,
};

/// Project the selected coordinates of `x0` onto `{Σ x = target, x ≥ 0}`.
pub fn project_simplex(
    x0: &[f64],
    target: f64,
    selection: Selection<'_>,
    settings: &ProjectionSettings,
) -> ProjectionResult<Vec<f64>> {
    SimplexProjector::new(target).project(x0, selection, settings)
}

/// Project the selected coordinates of `x0` onto `{Σ x ≤ capacity, x ≥ lower}`.
///
/// ```
/// use waterfill_core::{project_capacity, ProjectionSettings, Selection};
///
/// let x = project_capacity(&[5.0, 5.0, 5.0], 0.0, 9.0, Selection::All, &ProjectionSettings::default())?;
/// assert_eq!(x, vec![3.0, 3.0, 3.0]);
/// # Ok::<(), waterfill_core::ProjectionError>(())
/// ```
pub fn project_capacity<'a>(
    x0: &[f64],
    lower: impl Into<LowerBound<'a>>,
    capacity: f64,
    selection: Selection<'_>,
    settings: &ProjectionSettings,
) -> ProjectionResult<Vec<f64>> {
    CapacityProjector::new(lower, capacity).project(x0, selection, settings)
}

/// Minimize `Σ costs_k x_k + ε x_k²` over `{Σ x = target, x ≥ lower}` on the
/// selected coordinates. Unselected coordinates are copied from `base`.
pub fn minimize_regularized_simplex<'a>(
    base: &[f64],
    costs: &'a [f64],
    lower: impl Into<LowerBound<'a>>,
    target: f64,
    epsilon: f64,
    selection: Selection<'_>,
    settings: &ProjectionSettings,
) -> ProjectionResult<Vec<f64>> {
    RegularizedSimplex::new(costs, target, epsilon)
        .with_lower(lower)
        .project(base, selection, settings)
}
