use std::time::Instant;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use waterfill_core::invariants::{check_lower_bounds, check_sum_at_most, check_sum_equals};
use waterfill_core::{
    max_abs_change, scale_down_max_abs_change, CapacityProjector, LowerBound, ProjectionResult,
    ProjectionSettings, Projector, RegularizedSimplex, Selection, SimplexProjector,
};

use crate::instances::{gradient_step_rates, link_costs, min_rates, Lcg};

/// Trust-region radius used for the step-limiting benchmark.
const MAX_STEP: f64 = 5.0;

/// Quadratic weight used for the regularized benchmark.
const EPSILON: f64 = 0.5;

/// Operator selection on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Simplex,
    Capacity,
    Regularized,
    TrustRegion,
    All,
}

/// A single benchmarked kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kernel {
    Simplex,
    Capacity,
    Regularized,
    TrustRegion,
}

impl Kernel {
    pub fn name(self) -> &'static str {
        match self {
            Kernel::Simplex => "simplex",
            Kernel::Capacity => "capacity",
            Kernel::Regularized => "regularized",
            Kernel::TrustRegion => "trust-region",
        }
    }
}

impl Operator {
    pub fn kernels(self) -> Vec<Kernel> {
        match self {
            Operator::Simplex => vec![Kernel::Simplex],
            Operator::Capacity => vec![Kernel::Capacity],
            Operator::Regularized => vec![Kernel::Regularized],
            Operator::TrustRegion => vec![Kernel::TrustRegion],
            Operator::All => vec![
                Kernel::Simplex,
                Kernel::Capacity,
                Kernel::Regularized,
                Kernel::TrustRegion,
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorReport {
    pub operator: Kernel,
    pub size: usize,
    pub reps: usize,
    pub mean_us: f64,
    pub max_us: f64,
    /// Calls whose output failed an independent invariant check
    pub violations: usize,
    /// Calls that returned an error
    pub errors: usize,
    /// Mean water-filling passes (capacity operator only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_passes: Option<f64>,
}

struct Tally {
    total_us: f64,
    max_us: f64,
    violations: usize,
    errors: usize,
    passes: usize,
}

impl Tally {
    fn new() -> Self {
        Self { total_us: 0.0, max_us: 0.0, violations: 0, errors: 0, passes: 0 }
    }

    fn record_time(&mut self, start: Instant) {
        let us = start.elapsed().as_secs_f64() * 1e6;
        self.total_us += us;
        self.max_us = self.max_us.max(us);
    }

    fn record_check(&mut self, check: ProjectionResult<()>) {
        if let Err(e) = check {
            tracing::warn!(error = %e, "invariant check failed");
            self.violations += 1;
        }
    }

    fn record_error(&mut self, op: Kernel, err: &waterfill_core::ProjectionError) {
        tracing::warn!(?op, error = %err, "operator returned an error");
        self.errors += 1;
    }
}

pub fn run_operator(
    op: Kernel,
    size: usize,
    reps: usize,
    seed: u64,
    settings: &ProjectionSettings,
) -> OperatorReport {
    let mut rng = Lcg::new(seed ^ (size as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    let mut tally = Tally::new();
    let idx: Vec<usize> = (0..size).collect();
    let tol = settings.tol;

    for _ in 0..reps {
        match op {
            Kernel::Simplex => {
                let x0 = gradient_step_rates(size, &mut rng);
                let target = 10.0 * size as f64;
                let start = Instant::now();
                let res = SimplexProjector::new(target).project(&x0, Selection::All, settings);
                tally.record_time(start);
                match res {
                    Ok(x) => tally.record_check(
                        check_sum_equals(&x, &idx, target, tol)
                            .and_then(|_| check_lower_bounds(&x, &idx, LowerBound::Uniform(0.0), tol)),
                    ),
                    Err(e) => tally.record_error(op, &e),
                }
            }
            Kernel::Capacity => {
                let x0 = gradient_step_rates(size, &mut rng);
                let lo = min_rates(size, &mut rng);
                let capacity = lo.iter().sum::<f64>() + 20.0 * size as f64;
                let projector = CapacityProjector::new(&lo[..], capacity);
                let start = Instant::now();
                let res = projector.project_with_info(&x0, Selection::All, settings);
                tally.record_time(start);
                match res {
                    Ok((x, info)) => {
                        tally.passes += info.passes;
                        tally.record_check(check_sum_at_most(&x, &idx, capacity, tol).and_then(
                            |_| check_lower_bounds(&x, &idx, LowerBound::PerCoordinate(&lo), tol),
                        ));
                    }
                    Err(e) => tally.record_error(op, &e),
                }
            }
            Kernel::Regularized => {
                let costs = link_costs(size, &mut rng);
                let lo = min_rates(size, &mut rng);
                let target = lo.iter().sum::<f64>() + 5.0 * size as f64;
                let base = vec![0.0; size];
                let problem = RegularizedSimplex::new(&costs, target, EPSILON).with_lower(&lo[..]);
                let start = Instant::now();
                let res = problem.project(&base, Selection::All, settings);
                tally.record_time(start);
                match res {
                    Ok(x) => tally.record_check(check_sum_equals(&x, &idx, target, tol).and_then(
                        |_| check_lower_bounds(&x, &idx, LowerBound::PerCoordinate(&lo), tol),
                    )),
                    Err(e) => tally.record_error(op, &e),
                }
            }
            Kernel::TrustRegion => {
                let x0 = gradient_step_rates(size, &mut rng);
                let x: Vec<f64> = x0.iter().map(|v| v + rng.range(-20.0, 20.0)).collect();
                let start = Instant::now();
                let res = scale_down_max_abs_change(&x0, &x, Selection::All, MAX_STEP);
                tally.record_time(start);
                match res.and_then(|out| max_abs_change(&x0, &out, Selection::All)) {
                    Ok(change) if change <= MAX_STEP * (1.0 + 1e-12) => {}
                    Ok(change) => {
                        tracing::warn!(change, max_step = MAX_STEP, "trust region exceeded");
                        tally.violations += 1;
                    }
                    Err(e) => tally.record_error(op, &e),
                }
            }
        }
    }

    let denom = reps.max(1) as f64;
    OperatorReport {
        operator: op,
        size,
        reps,
        mean_us: tally.total_us / denom,
        max_us: tally.max_us,
        violations: tally.violations,
        errors: tally.errors,
        mean_passes: (op == Kernel::Capacity).then(|| tally.passes as f64 / denom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_operators_clean_on_small_instances() {
        let settings = ProjectionSettings::default();
        for op in Operator::All.kernels() {
            let report = run_operator(op, 32, 20, 12345, &settings);
            assert_eq!(report.errors, 0, "{:?}", op);
            assert_eq!(report.violations, 0, "{:?}", op);
            assert_eq!(report.reps, 20);
        }
    }

    #[test]
    fn test_report_serializes() {
        let report = run_operator(Kernel::Capacity, 8, 2, 1, &ProjectionSettings::default());
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"operator\":\"capacity\""));
        assert!(json.contains("mean_passes"));
    }

    #[test]
    fn test_operator_selection_expands_to_kernels() {
        assert_eq!(Operator::TrustRegion.kernels(), vec![Kernel::TrustRegion]);
        let all = Operator::All.kernels();
        assert_eq!(all.len(), 4);
        let names: Vec<&str> = all.iter().map(|k| k.name()).collect();
        assert_eq!(names, ["simplex", "capacity", "regularized", "trust-region"]);
    }
}
