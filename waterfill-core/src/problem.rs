//! Shared input types and settings.
//!
//! Every operator works on a caller-owned vector of length K. Which
//! coordinates take part is described by a [`Selection`]; per-coordinate
//! floors by a [`LowerBound`]; numeric tolerances by [`ProjectionSettings`].

use std::env;

use crate::error::{ProjectionError, ProjectionResult};

/// Default absolute tolerance τ.
///
/// Traffic values handled by the calling rate-control loops are O(1)..O(1e3),
/// so an absolute 1e-3 is well below the precision that matters there.
pub const DEFAULT_TOL: f64 = 1e-3;

/// Default slack for the support self-consistency test.
pub const DEFAULT_SUPPORT_TOL: f64 = 1e-5;

/// Default multiplier for the water-filling upper cap (cap = factor × C).
pub const DEFAULT_CAP_FACTOR: f64 = 1000.0;

/// Which coordinates of a vector an operator reads and writes.
///
/// Coordinates outside the selection are never modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection<'a> {
    /// Every coordinate participates
    #[default]
    All,
    /// Only the listed coordinates participate (distinct, in range)
    Subset(&'a [usize]),
}

impl<'a> Selection<'a> {
    /// Resolve into an explicit index list for a vector of length `len`.
    ///
    /// Out-of-range and duplicate indices are rejected.
    pub fn resolve(&self, len: usize) -> ProjectionResult<Vec<usize>> {
        match *self {
            Selection::All => Ok((0..len).collect()),
            Selection::Subset(idx) => {
                let mut seen = vec![false; len];
                for &k in idx {
                    if k >= len {
                        return Err(ProjectionError::InvalidInput(format!(
                            "selection index {} out of range for length {}",
                            k, len
                        )));
                    }
                    if seen[k] {
                        return Err(ProjectionError::InvalidInput(format!(
                            "selection index {} appears more than once",
                            k
                        )));
                    }
                    seen[k] = true;
                }
                Ok(idx.to_vec())
            }
        }
    }

    /// Number of selected coordinates for a vector of length `len`.
    pub fn count(&self, len: usize) -> usize {
        match self {
            Selection::All => len,
            Selection::Subset(idx) => idx.len(),
        }
    }
}

impl<'a> From<&'a [usize]> for Selection<'a> {
    fn from(idx: &'a [usize]) -> Self {
        Selection::Subset(idx)
    }
}

impl<'a> From<Option<&'a [usize]>> for Selection<'a> {
    fn from(idx: Option<&'a [usize]>) -> Self {
        idx.map_or(Selection::All, Selection::Subset)
    }
}

/// Lower bound specification.
///
/// A per-coordinate slice is indexed by coordinate (length K), not by
/// position in the selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LowerBound<'a> {
    /// Same floor for every selected coordinate
    Uniform(f64),
    /// One floor per coordinate of the full vector
    PerCoordinate(&'a [f64]),
}

impl Default for LowerBound<'_> {
    fn default() -> Self {
        LowerBound::Uniform(0.0)
    }
}

impl<'a> LowerBound<'a> {
    /// Floor for coordinate `k`.
    #[inline]
    pub fn at(&self, k: usize) -> f64 {
        match *self {
            LowerBound::Uniform(v) => v,
            LowerBound::PerCoordinate(v) => v[k],
        }
    }

    /// Check that the bound is usable against a vector of length `len`.
    pub fn validate(&self, len: usize) -> ProjectionResult<()> {
        match *self {
            LowerBound::Uniform(v) => {
                if !v.is_finite() {
                    return Err(ProjectionError::InvalidInput(format!(
                        "lower bound {} is not finite",
                        v
                    )));
                }
            }
            LowerBound::PerCoordinate(v) => {
                if v.len() != len {
                    return Err(ProjectionError::DimensionMismatch {
                        expected: len,
                        actual: v.len(),
                    });
                }
                crate::util::numerics::ensure_finite("lower bound", v)?;
            }
        }
        Ok(())
    }

    /// Sum of the floors over the given coordinates.
    pub fn sum_over(&self, idx: &[usize]) -> f64 {
        idx.iter().map(|&k| self.at(k)).sum()
    }
}

impl<'a> From<f64> for LowerBound<'a> {
    fn from(v: f64) -> Self {
        LowerBound::Uniform(v)
    }
}

impl<'a> From<&'a [f64]> for LowerBound<'a> {
    fn from(v: &'a [f64]) -> Self {
        LowerBound::PerCoordinate(v)
    }
}

/// Numeric settings shared by all operators.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProjectionSettings {
    /// Absolute tolerance τ for at-bound tests, feasibility checks and snapping
    pub tol: f64,

    /// Slack allowed by the regularized minimizer when testing that the
    /// smallest coordinate of a candidate support stays at or above its floor.
    /// The simplex projector always tests with zero slack.
    pub support_tol: f64,

    /// Water-filling clamps coordinates to at most `capacity_cap_factor × C`
    /// before iterating
    pub capacity_cap_factor: f64,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            tol: DEFAULT_TOL,
            support_tol: DEFAULT_SUPPORT_TOL,
            capacity_cap_factor: DEFAULT_CAP_FACTOR,
        }
    }
}

impl ProjectionSettings {
    /// Defaults overlaid with `WATERFILL_TOL`, `WATERFILL_SUPPORT_TOL` and
    /// `WATERFILL_CAP_FACTOR`. Unparseable or non-positive values are ignored.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(v) = positive_env("WATERFILL_TOL") {
            settings.tol = v;
        }
        if let Some(v) = positive_env("WATERFILL_SUPPORT_TOL") {
            settings.support_tol = v;
        }
        if let Some(v) = positive_env("WATERFILL_CAP_FACTOR") {
            settings.capacity_cap_factor = v;
        }
        settings
    }

    /// Builder-style override of τ.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Reject non-finite or non-positive settings.
    pub fn validate(&self) -> ProjectionResult<()> {
        let fields = [
            ("tol", self.tol),
            ("support_tol", self.support_tol),
            ("capacity_cap_factor", self.capacity_cap_factor),
        ];
        for (name, v) in fields {
            if !v.is_finite() || v <= 0.0 {
                return Err(ProjectionError::InvalidInput(format!(
                    "setting {} must be finite and positive, got {}",
                    name, v
                )));
            }
        }
        Ok(())
    }
}

fn positive_env(key: &str) -> Option<f64> {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}
