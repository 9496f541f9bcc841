//! Deterministic instance generators.

/// Simple LCG random number generator, uniform in [0, 1).
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        ((self.state >> 33) as f64) / ((1u64 << 31) as f64)
    }

    /// Uniform in [lo, hi).
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// Rates on K links after an unconstrained gradient step: mostly positive,
/// some pushed below zero.
pub fn gradient_step_rates(k: usize, rng: &mut Lcg) -> Vec<f64> {
    (0..k).map(|_| rng.range(-10.0, 100.0)).collect()
}

/// Per-link minimum rates.
pub fn min_rates(k: usize, rng: &mut Lcg) -> Vec<f64> {
    (0..k).map(|_| rng.range(0.0, 1.0)).collect()
}

/// Per-link marginal costs for the regularized allocation.
pub fn link_costs(k: usize, rng: &mut Lcg) -> Vec<f64> {
    (0..k).map(|_| rng.range(-5.0, 5.0)).collect()
}
