//! Projector trait definition.
//!
//! Every operator in this crate maps a full-length vector to a full-length
//! vector, rewriting only the selected coordinates.

use crate::error::ProjectionResult;
use crate::problem::{ProjectionSettings, Selection};

/// Core projection interface.
///
/// # Coordinate Convention
///
/// `x0` is the caller's whole vector (length K). The selection picks which
/// coordinates take part in the constraint; the rest are copied through
/// untouched.
///
/// # Failure atomicity
///
/// `project` never touches caller memory. `project_in_place` works on a
/// scratch copy and writes back only when every post-condition holds, so a
/// failed call leaves the caller's slice exactly as it was.
pub trait Projector {
    /// Short operator name for logs and reports.
    fn name(&self) -> &'static str;

    /// Compute the projection of `x0` and return it as a new vector.
    fn project(
        &self,
        x0: &[f64],
        selection: Selection<'_>,
        settings: &ProjectionSettings,
    ) -> ProjectionResult<Vec<f64>>;

    /// Project `x` and overwrite it on success.
    fn project_in_place(
        &self,
        x: &mut [f64],
        selection: Selection<'_>,
        settings: &ProjectionSettings,
    ) -> ProjectionResult<()> {
        let out = self.project(x, selection, settings)?;
        x.copy_from_slice(&out);
        Ok(())
    }
}
