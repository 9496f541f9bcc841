//! Sorted-prefix support search.
//!
//! Both the simplex projection and the regularized minimizer have optima of
//! the form "the top `m` keys are shifted by a common amount, the rest sit at
//! their floor". Given the keys sorted descending, the shift for support size
//! `m` is `(budget − Σ_{top m} key) / m`, and the candidate is self-consistent
//! when the smallest included key plus the shift stays non-negative.

/// Chosen support.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Support {
    /// Number of coordinates above their floor
    pub size: usize,
    /// Common shift applied to every included key
    pub shift: f64,
    /// Objective value of the candidate
    pub cost: f64,
}

/// Scan every support size `1..=keys.len()` and keep the self-consistent
/// candidate of lowest cost. Ties keep the smaller support.
///
/// `order` lists positions of `keys` sorted descending. `cost(m, shift)`
/// evaluates the objective of the candidate with support size `m`.
pub(crate) fn scan_support<F>(
    keys: &[f64],
    order: &[usize],
    budget: f64,
    support_tol: f64,
    mut cost: F,
) -> Option<Support>
where
    F: FnMut(usize, f64) -> f64,
{
    let mut best: Option<Support> = None;
    let mut head = 0.0;

    for (rank, &pos) in order.iter().enumerate() {
        let m = rank + 1;
        head += keys[pos];
        let shift = (budget - head) / m as f64;

        // Smallest included key must not drop below its floor.
        if keys[pos] + shift < -support_tol {
            continue;
        }

        let c = cost(m, shift);
        if !c.is_finite() {
            continue;
        }
        if best.map_or(true, |b| c < b.cost) {
            best = Some(Support { size: m, shift, cost: c });
        }
    }

    best
}

/// Suffix sums: `out[m] = Σ_{r ≥ m} vals[order[r]]`, with `out[len] = 0`.
pub(crate) fn suffix_sums(vals: &[f64], order: &[usize]) -> Vec<f64> {
    let mut out = vec![0.0; order.len() + 1];
    for r in (0..order.len()).rev() {
        out[r] = out[r + 1] + vals[order[r]];
    }
    out
}

/// Prefix sums: `out[m] = Σ_{r < m} vals[order[r]]`, with `out[0] = 0`.
pub(crate) fn prefix_sums(vals: &[f64], order: &[usize]) -> Vec<f64> {
    let mut out = vec![0.0; order.len() + 1];
    for r in 0..order.len() {
        out[r + 1] = out[r] + vals[order[r]];
    }
    out
}
