//! Projection operators.
//!
//! This module provides the exact, sorting- or iteration-based operators that
//! rate-control loops call as their inner projection step:
//!
//! - [`SimplexProjector`]: Euclidean projection onto `{Σ x = C, x ≥ 0}`
//! - [`CapacityProjector`]: water-filling onto `{Σ x ≤ C, x ≥ xMin}`
//! - [`RegularizedSimplex`]: exact minimizer of `Σ a x + ε x²` on `{Σ x = C, x ≥ xMin}`

pub mod capacity;
pub mod regularized;
pub mod simplex;
mod support;
pub mod traits;

pub use capacity::{CapacityProjector, WaterFillInfo};
pub use regularized::RegularizedSimplex;
pub use simplex::SimplexProjector;
pub use traits::Projector;
