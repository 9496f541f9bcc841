//! Water-filling projection onto a capacity constraint.
//!
//! Projects onto `{x : Σ x_k ≤ C, x_k ≥ xMin_k}` over the selected coordinates.
//!
//! # Algorithm
//!
//! 1. Clamp each coordinate into `[xMin_k, cap]`, `cap = capacity_cap_factor·C`.
//! 2. While `Σ x > C + τ`: take the active set (coordinates more than τ above
//!    their floor), and lower all of them by
//!    `min(excess / |active|, smallest distance to floor)`. Coordinates
//!    within τ of their floor, before or after the step, are snapped onto it.
//!
//! A pass either reaches feasibility or pins at least one more coordinate,
//! so at most K reduction passes (K+1 feasibility checks) are needed.

use tracing::{debug, trace, warn};

use super::traits::Projector;
use crate::bounds::clamp_to_box;
use crate::error::{ProjectionError, ProjectionResult};
use crate::invariants::{check_lower_bounds, check_sum_at_most};
use crate::problem::{LowerBound, ProjectionSettings, Selection};
use crate::util::numerics::{ensure_finite, ensure_finite_scalar, selected_sum};

/// Statistics from one water-filling call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaterFillInfo {
    /// Number of reduction passes performed
    pub passes: usize,
    /// Selected coordinates sitting on their floor at return
    pub pinned: usize,
}

/// Projection onto `{x : Σ x ≤ capacity, x ≥ lower}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityProjector<'a> {
    /// Per-coordinate floor
    pub lower: LowerBound<'a>,
    /// Upper limit on the sum of the selected coordinates
    pub capacity: f64,
}

impl<'a> CapacityProjector<'a> {
    /// Create a projector with the given floor and capacity.
    pub fn new(lower: impl Into<LowerBound<'a>>, capacity: f64) -> Self {
        Self {
            lower: lower.into(),
            capacity,
        }
    }

    /// Project and report how much work the water-filling took.
    pub fn project_with_info(
        &self,
        x0: &[f64],
        selection: Selection<'_>,
        settings: &ProjectionSettings,
    ) -> ProjectionResult<(Vec<f64>, WaterFillInfo)> {
        settings.validate()?;
        ensure_finite("x0", x0)?;
        ensure_finite_scalar("capacity", self.capacity)?;
        self.lower.validate(x0.len())?;

        let idx = selection.resolve(x0.len())?;
        let mut x = x0.to_vec();
        if idx.is_empty() {
            return Ok((x, WaterFillInfo::default()));
        }

        let tol = settings.tol;
        let lower_sum = self.lower.sum_over(&idx);
        if lower_sum > self.capacity + tol {
            return Err(ProjectionError::Infeasible {
                lower_sum,
                target: self.capacity,
            });
        }

        let cap = settings.capacity_cap_factor * self.capacity;
        for &k in &idx {
            let lo = self.lower.at(k);
            x[k] = clamp_to_box(x[k], lo, cap.max(lo));
        }

        let mut info = WaterFillInfo::default();
        let mut active: Vec<usize> = Vec::with_capacity(idx.len());

        loop {
            let mut sum = selected_sum(&x, &idx);
            if sum <= self.capacity + tol {
                break;
            }
            if info.passes == idx.len() {
                warn!(n = idx.len(), sum, capacity = self.capacity, "water-filling exceeded pass bound");
                return Err(ProjectionError::InvariantViolation(format!(
                    "water-filling did not converge within {} passes (sum {}, capacity {})",
                    idx.len() + 1,
                    sum,
                    self.capacity
                )));
            }

            active.clear();
            let mut d_min = f64::INFINITY;
            let mut snapped = 0usize;
            for &k in &idx {
                let lo = self.lower.at(k);
                let d = x[k] - lo;
                if d > tol {
                    active.push(k);
                    d_min = d_min.min(d);
                } else if d > 0.0 {
                    // Within τ of the floor counts as pinned.
                    x[k] = lo;
                    snapped += 1;
                }
            }
            if snapped > 0 {
                trace!(snapped, "water-filling snapped near-floor coordinates");
                sum = selected_sum(&x, &idx);
                if sum <= self.capacity + tol {
                    break;
                }
            }
            if active.is_empty() {
                warn!(sum, capacity = self.capacity, "water-filling has no active coordinate");
                return Err(ProjectionError::InvariantViolation(format!(
                    "sum {} exceeds capacity {} with every coordinate at its floor",
                    sum, self.capacity
                )));
            }

            let excess = sum - self.capacity;
            let step = (excess / active.len() as f64).min(d_min);
            trace!(pass = info.passes, sum, excess, active = active.len(), step, "water-filling pass");

            for &k in &active {
                let lo = self.lower.at(k);
                x[k] -= step;
                if x[k] - lo <= tol {
                    x[k] = lo;
                }
            }
            info.passes += 1;
        }

        info.pinned = idx
            .iter()
            .filter(|&&k| x[k] - self.lower.at(k) <= tol)
            .count();

        check_sum_at_most(&x, &idx, self.capacity, tol)
            .and_then(|_| check_lower_bounds(&x, &idx, self.lower, tol))
            .map_err(|e| {
                warn!(error = %e, "water-filling post-condition failed");
                e
            })?;

        debug!(n = idx.len(), passes = info.passes, pinned = info.pinned, "water-filling projection");

        Ok((x, info))
    }
}

impl Projector for CapacityProjector<'_> {
    fn name(&self) -> &'static str {
        "capacity"
    }

    fn project(
        &self,
        x0: &[f64],
        selection: Selection<'_>,
        settings: &ProjectionSettings,
    ) -> ProjectionResult<Vec<f64>> {
        self.project_with_info(x0, selection, settings).map(|(x, _)| x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ProjectionSettings {
        ProjectionSettings::default()
    }

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).abs() < 1e-9, "index {}: {} vs {}", i, x, y);
        }
    }

    #[test]
    fn test_capacity_all_active() {
        let (x, info) = CapacityProjector::new(0.0, 9.0)
            .project_with_info(&[5.0, 5.0, 5.0], Selection::All, &settings())
            .unwrap();
        assert_close(&x, &[3.0, 3.0, 3.0]);
        assert_eq!(info.passes, 1);
        assert_eq!(info.pinned, 0);
    }

    #[test]
    fn test_capacity_staged_pinning() {
        // First pass lowers everything by 1 (the two small coordinates hit
        // zero), second pass takes the remaining excess from the big one.
        let (x, info) = CapacityProjector::new(0.0, 5.0)
            .project_with_info(&[1.0, 1.0, 10.0], Selection::All, &settings())
            .unwrap();
        assert_close(&x, &[0.0, 0.0, 5.0]);
        assert_eq!(info.passes, 2);
        assert_eq!(info.pinned, 2);
    }

    #[test]
    fn test_capacity_feasible_input_unchanged() {
        let x0 = [1.0, 2.0, 3.0];
        let x = CapacityProjector::new(0.0, 10.0)
            .project(&x0, Selection::All, &settings())
            .unwrap();
        assert_eq!(x, x0.to_vec());
    }

    #[test]
    fn test_capacity_raises_to_floor() {
        let lo = [1.0, 0.0, 2.0];
        let x = CapacityProjector::new(&lo[..], 10.0)
            .project(&[0.0, 0.5, -3.0], Selection::All, &settings())
            .unwrap();
        assert_close(&x, &[1.0, 0.5, 2.0]);
    }

    #[test]
    fn test_capacity_per_coordinate_floor() {
        // Floors [1, 0, 0], capacity 4: reduce [3, 3, 3] by min(5/3, 2) = 5/3.
        let lo = [1.0, 0.0, 0.0];
        let x = CapacityProjector::new(&lo[..], 4.0)
            .project(&[3.0, 3.0, 3.0], Selection::All, &settings())
            .unwrap();
        let third = 4.0 / 3.0;
        assert_close(&x, &[third, third, third]);
    }

    #[test]
    fn test_capacity_caps_huge_values() {
        let x = CapacityProjector::new(0.0, 1.0)
            .project(&[1e12, 0.0], Selection::All, &settings())
            .unwrap();
        assert_close(&x, &[1.0, 0.0]);
    }

    #[test]
    fn test_capacity_infeasible_floor() {
        let err = CapacityProjector::new(2.0, 5.0)
            .project(&[3.0, 3.0, 3.0], Selection::All, &settings())
            .unwrap_err();
        assert_eq!(err, ProjectionError::Infeasible { lower_sum: 6.0, target: 5.0 });
    }

    #[test]
    fn test_capacity_empty_selection_is_noop() {
        let x0 = [7.0, 8.0];
        let (x, info) = CapacityProjector::new(0.0, 1.0)
            .project_with_info(&x0, Selection::Subset(&[]), &settings())
            .unwrap();
        assert_eq!(x, x0.to_vec());
        assert_eq!(info, WaterFillInfo::default());
    }

    #[test]
    fn test_capacity_subset() {
        let idx = [0, 2];
        let x = CapacityProjector::new(0.0, 4.0)
            .project(&[4.0, 100.0, 4.0], Selection::Subset(&idx), &settings())
            .unwrap();
        assert_close(&x, &[2.0, 100.0, 2.0]);
    }

    #[test]
    fn test_capacity_many_coordinates_just_above_floor() {
        // No coordinate is more than τ above its floor, yet together they
        // exceed the capacity.
        let x0 = vec![0.0009; 2000];
        let (x, info) = CapacityProjector::new(0.0, 1.0)
            .project_with_info(&x0, Selection::All, &settings())
            .unwrap();
        let idx: Vec<usize> = (0..x0.len()).collect();
        check_sum_at_most(&x, &idx, 1.0, 1e-3).unwrap();
        check_lower_bounds(&x, &idx, LowerBound::Uniform(0.0), 1e-3).unwrap();
        assert_eq!(info.pinned, 2000);
    }

    #[test]
    fn test_capacity_near_floor_mixed_with_active() {
        // Sub-τ coordinates are pinned, the large one absorbs the excess.
        let lo = [1.0, 1.0, 0.0];
        let x = CapacityProjector::new(&lo[..], 4.0)
            .project(&[1.0005, 1.0005, 10.0], Selection::All, &settings())
            .unwrap();
        assert_close(&x, &[1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_capacity_feasible_near_floor_left_alone() {
        let x0 = [0.0005, 0.0005, 1.0];
        let x = CapacityProjector::new(0.0, 2.0)
            .project(&x0, Selection::All, &settings())
            .unwrap();
        assert_eq!(x, x0.to_vec());
    }

    #[test]
    fn test_capacity_pass_bound_reported() {
        // With τ far below the rounding error of 100 − (100 − 0.7), the
        // single pass lands a few ulps above C and the bound trips.
        let s = ProjectionSettings::default().with_tol(1e-300);
        let err = CapacityProjector::new(0.0, 0.7)
            .project(&[100.0], Selection::All, &s)
            .unwrap_err();
        assert!(err.is_invariant_violation(), "{:?}", err);
    }

    #[test]
    fn test_capacity_floor_length_mismatch() {
        let lo = [0.0, 0.0];
        let err = CapacityProjector::new(&lo[..], 4.0)
            .project(&[1.0, 2.0, 3.0], Selection::All, &settings())
            .unwrap_err();
        assert_eq!(err, ProjectionError::DimensionMismatch { expected: 3, actual: 2 });
    }
}
