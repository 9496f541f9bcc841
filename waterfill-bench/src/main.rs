//! Benchmarking CLI for the waterfill kernels.
//!
//! Runs each operator on generated rate-control instances, checks the
//! returned vectors against the feasibility invariants, and prints timings.

mod instances;
mod runner;

use anyhow::{bail, Context, Result};
use clap::Parser;
use waterfill_core::ProjectionSettings;

use runner::{run_operator, Operator, OperatorReport};

#[derive(Parser, Debug)]
#[command(name = "waterfill-bench", about = "Benchmark and self-check the waterfill kernels")]
struct Args {
    /// Operator to benchmark
    #[arg(long, value_enum, default_value = "all")]
    operator: Operator,

    /// Vector sizes (comma separated)
    #[arg(long, value_delimiter = ',', default_values_t = vec![16usize, 256, 4096])]
    sizes: Vec<usize>,

    /// Calls per operator and size
    #[arg(long, default_value_t = 200)]
    reps: usize,

    /// Seed for the instance generator
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Override the absolute tolerance (defaults to WATERFILL_TOL or 1e-3)
    #[arg(long)]
    tol: Option<f64>,

    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn print_table(reports: &[OperatorReport]) {
    println!(
        "{:<14} {:>7} {:>6} {:>12} {:>12} {:>8} {:>6} {:>8}",
        "operator", "size", "reps", "mean (µs)", "max (µs)", "viol", "err", "passes"
    );
    println!("{}", "-".repeat(80));
    for r in reports {
        let passes = r
            .mean_passes
            .map(|p| format!("{:.2}", p))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<14} {:>7} {:>6} {:>12.3} {:>12.3} {:>8} {:>6} {:>8}",
            r.operator.name(),
            r.size,
            r.reps,
            r.mean_us,
            r.max_us,
            r.violations,
            r.errors,
            passes
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut settings = ProjectionSettings::from_env();
    if let Some(tol) = args.tol {
        settings = settings.with_tol(tol);
    }
    settings.validate().context("invalid projection settings")?;

    if args.sizes.iter().any(|&n| n == 0) {
        bail!("sizes must be positive");
    }

    tracing::info!(?settings, sizes = ?args.sizes, reps = args.reps, "starting benchmark");

    let mut reports = Vec::new();
    for op in args.operator.kernels() {
        for &size in &args.sizes {
            reports.push(run_operator(op, size, args.reps, args.seed, &settings));
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_table(&reports);
    }

    let failures: usize = reports.iter().map(|r| r.violations + r.errors).sum();
    if failures > 0 {
        bail!("{} calls failed an invariant check or returned an error", failures);
    }
    Ok(())
}
