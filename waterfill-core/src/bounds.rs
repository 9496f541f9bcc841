//! Box clamps and trust-region step limiting.
//!
//! The clamps are total scalar functions. The trust-region scaler shrinks a
//! candidate step `x − x0` uniformly so that no selected coordinate moves by
//! more than `max_step`, keeping the direction of the step.

use tracing::trace;

use crate::error::ProjectionResult;
use crate::problem::Selection;
use crate::util::numerics::{ensure_finite, ensure_same_len};

/// `min(hi, max(lo, x))`.
///
/// Unlike [`f64::clamp`] this never panics; if `lo > hi` the upper bound wins.
#[inline]
pub fn clamp_to_box(x: f64, lo: f64, hi: f64) -> f64 {
    hi.min(lo.max(x))
}

/// `max(lo, x)`.
#[inline]
pub fn clamp_lower(x: f64, lo: f64) -> f64 {
    clamp_to_box(x, lo, f64::INFINITY)
}

/// `min(hi, x)`.
#[inline]
pub fn clamp_upper(x: f64, hi: f64) -> f64 {
    clamp_to_box(x, f64::NEG_INFINITY, hi)
}

/// Clamp every selected coordinate of `x` into `[lo, hi]`.
pub fn clamp_selected(
    x: &mut [f64],
    lo: f64,
    hi: f64,
    selection: Selection<'_>,
) -> ProjectionResult<()> {
    for k in selection.resolve(x.len())? {
        x[k] = clamp_to_box(x[k], lo, hi);
    }
    Ok(())
}

/// Largest `|x_k − x0_k|` over the selection (0 for an empty selection).
pub fn max_abs_change(x0: &[f64], x: &[f64], selection: Selection<'_>) -> ProjectionResult<f64> {
    ensure_same_len(x0.len(), x.len())?;
    let idx = selection.resolve(x.len())?;
    Ok(idx
        .iter()
        .map(|&k| (x[k] - x0[k]).abs())
        .fold(0.0, f64::max))
}

/// Limit the step from `x0` to `x` to at most `max_step` per coordinate.
///
/// `max_step ≤ 0` disables limiting. When the largest change exceeds
/// `max_step`, every selected change is multiplied by
/// `max_step / max_change`; the largest change then equals `max_step`.
pub fn scale_down_max_abs_change(
    x0: &[f64],
    x: &[f64],
    selection: Selection<'_>,
    max_step: f64,
) -> ProjectionResult<Vec<f64>> {
    let mut out = x.to_vec();
    scale_down_max_abs_change_in_place(x0, &mut out, selection, max_step)?;
    Ok(out)
}

/// In-place form of [`scale_down_max_abs_change`].
///
/// Validation happens before any write, so on error `x` is unchanged.
pub fn scale_down_max_abs_change_in_place(
    x0: &[f64],
    x: &mut [f64],
    selection: Selection<'_>,
    max_step: f64,
) -> ProjectionResult<()> {
    ensure_same_len(x0.len(), x.len())?;
    ensure_finite("x0", x0)?;
    ensure_finite("x", x)?;
    let idx = selection.resolve(x.len())?;

    if max_step.is_nan() || max_step <= 0.0 || idx.is_empty() {
        return Ok(());
    }

    let max_change = idx
        .iter()
        .map(|&k| (x[k] - x0[k]).abs())
        .fold(0.0, f64::max);
    if max_change <= max_step {
        return Ok(());
    }

    let factor = max_step / max_change;
    trace!(max_change, max_step, factor, "trust region scaling step");
    for &k in &idx {
        x[k] = x0[k] + (x[k] - x0[k]) * factor;
    }
    Ok(())
}

/// Scalar form of [`scale_down_max_abs_change`].
pub fn scale_down_scalar_change(x0: f64, x: f64, max_step: f64) -> f64 {
    let change = (x - x0).abs();
    if max_step.is_nan() || max_step <= 0.0 || change <= max_step {
        return x;
    }
    x0 + (x - x0) * (max_step / change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjectionError;

    #[test]
    fn test_clamps() {
        assert_eq!(clamp_to_box(5.0, 0.0, 3.0), 3.0);
        assert_eq!(clamp_to_box(-1.0, 0.0, 3.0), 0.0);
        assert_eq!(clamp_to_box(2.0, 0.0, 3.0), 2.0);
        assert_eq!(clamp_lower(-4.0, -1.0), -1.0);
        assert_eq!(clamp_lower(1e300, -1.0), 1e300);
        assert_eq!(clamp_upper(4.0, 1.0), 1.0);
        assert_eq!(clamp_upper(-1e300, 1.0), -1e300);
    }

    #[test]
    fn test_clamp_inverted_box_takes_upper() {
        assert_eq!(clamp_to_box(0.0, 2.0, 1.0), 1.0);
    }

    #[test]
    fn test_clamp_selected() {
        let mut x = [-1.0, 5.0, 10.0];
        clamp_selected(&mut x, 0.0, 4.0, Selection::Subset(&[0, 2])).unwrap();
        assert_eq!(x, [0.0, 5.0, 4.0]);
    }

    #[test]
    fn test_scale_down_halves_step() {
        let x = scale_down_max_abs_change(&[0.0, 0.0], &[4.0, 2.0], Selection::All, 2.0).unwrap();
        assert_eq!(x, vec![2.0, 1.0]);
    }

    #[test]
    fn test_scale_down_within_budget() {
        let x = scale_down_max_abs_change(&[1.0, 1.0], &[2.0, 0.5], Selection::All, 1.0).unwrap();
        assert_eq!(x, vec![2.0, 0.5]);
    }

    #[test]
    fn test_scale_down_disabled() {
        for max_step in [0.0, -3.0] {
            let x = scale_down_max_abs_change(&[0.0], &[100.0], Selection::All, max_step).unwrap();
            assert_eq!(x, vec![100.0]);
        }
    }

    #[test]
    fn test_scale_down_subset_only() {
        // Coordinate 1 is outside the selection: neither measured nor scaled.
        let x = scale_down_max_abs_change(
            &[0.0, 0.0, 0.0],
            &[-4.0, 50.0, 1.0],
            Selection::Subset(&[0, 2]),
            1.0,
        )
        .unwrap();
        assert_eq!(x, vec![-1.0, 50.0, 0.25]);
    }

    #[test]
    fn test_scale_down_length_mismatch() {
        let err = scale_down_max_abs_change(&[0.0], &[1.0, 2.0], Selection::All, 1.0).unwrap_err();
        assert_eq!(err, ProjectionError::DimensionMismatch { expected: 1, actual: 2 });
    }

    #[test]
    fn test_scale_down_scalar() {
        assert_eq!(scale_down_scalar_change(1.0, 5.0, 2.0), 3.0);
        assert!((scale_down_scalar_change(1.0, -5.0, 2.0) + 1.0).abs() < 1e-12);
        assert_eq!(scale_down_scalar_change(1.0, 2.0, 2.0), 2.0);
        assert_eq!(scale_down_scalar_change(1.0, 9.0, 0.0), 9.0);
    }

    #[test]
    fn test_max_abs_change() {
        let c = max_abs_change(&[0.0, 1.0], &[-3.0, 2.0], Selection::All).unwrap();
        assert_eq!(c, 3.0);
        let c = max_abs_change(&[0.0, 1.0], &[-3.0, 2.0], Selection::Subset(&[])).unwrap();
        assert_eq!(c, 0.0);
    }
}
