//! Numerical helpers.

use std::cmp::Ordering;

use crate::error::{ProjectionError, ProjectionResult};

/// Positions `0..keys.len()` ordered by `keys` descending.
///
/// The sort is stable, so equal keys keep their original relative order.
pub fn sorted_desc(keys: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| desc_cmp(keys[a], keys[b]));
    order
}

#[inline]
fn desc_cmp(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Sum of `x` over the given coordinates.
#[inline]
pub fn selected_sum(x: &[f64], idx: &[usize]) -> f64 {
    idx.iter().map(|&k| x[k]).sum()
}

/// Reject NaN / ±∞ entries.
pub fn ensure_finite(what: &str, x: &[f64]) -> ProjectionResult<()> {
    match x.iter().position(|v| !v.is_finite()) {
        Some(k) => Err(ProjectionError::InvalidInput(format!(
            "{} has non-finite entry {} at index {}",
            what, x[k], k
        ))),
        None => Ok(()),
    }
}

/// Reject a non-finite scalar parameter.
pub fn ensure_finite_scalar(what: &str, v: f64) -> ProjectionResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ProjectionError::InvalidInput(format!("{} must be finite, got {}", what, v)))
    }
}

/// Reject two vectors of different lengths.
pub fn ensure_same_len(expected: usize, actual: usize) -> ProjectionResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ProjectionError::DimensionMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_desc_stable() {
        let keys = [1.0, 3.0, 2.0, 3.0];
        assert_eq!(sorted_desc(&keys), vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_sorted_desc_negative() {
        let keys = [-1.0, -0.0, 0.5];
        assert_eq!(sorted_desc(&keys), vec![2, 1, 0]);
    }

    #[test]
    fn test_selected_sum() {
        let x = [1.0, 2.0, 4.0, 8.0];
        assert_eq!(selected_sum(&x, &[0, 3]), 9.0);
        assert_eq!(selected_sum(&x, &[]), 0.0);
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite("x", &[0.0, 1.0]).is_ok());
        assert!(ensure_finite("x", &[0.0, f64::NAN]).is_err());
        assert!(ensure_finite_scalar("c", f64::NEG_INFINITY).is_err());
        assert!(ensure_same_len(2, 3).is_err());
    }
}
