//! FvK Solver Example - Clamped Circular Sector
//!
//! Usage: `fvk-sector [params.json] [solution.json]`

use std::env;

use anyhow::{Context, Result};
use fvk_solver::prelude::*;

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    let params = match args.get(1) {
        Some(path) => ProblemParameters::from_json_file(path)
            .with_context(|| format!("failed to read parameters from {}", path))?,
        None => ProblemParameters::default().with_pressure(1.0),
    };

    println!("=== FvK Solver Example: Clamped Sector ===\n");
    println!(
        "nu = {}, eta = {}, pressure = {}, boundary order = {}",
        params.nu,
        params.eta,
        params.pressure,
        params.boundary_order.order()
    );

    let condition = if params.linear_bending {
        EdgeCondition::clamped()
    } else {
        EdgeCondition::clamped().with_in_plane_pinned()
    };
    let mut problem =
        FvkProblem::circular_sector(params, CircularSector::eighth_disc(), &condition)
            .context("failed to set up the sector problem")?;

    let summary = problem
        .newton_solve(&SolverOptions::default().with_logging())
        .context("Newton solve failed")?;

    println!("\n=== Results ===");
    println!("Nodes:                 {}", summary.n_nodes);
    println!("Elements:              {}", summary.n_elements);
    println!("Unknowns:              {}", summary.n_dof);
    println!(
        "Corner multipliers:    {} active, {} redundant",
        summary.n_active_multipliers, summary.n_redundant_multipliers
    );
    println!("Newton iterations:     {}", summary.newton_iterations);
    println!("Final max residual:    {:.3e}", summary.residual_norm);
    println!("Max |w|:               {:.6e}", summary.max_abs_w);

    if let Some(path) = args.get(2) {
        problem
            .write_solution(path)
            .with_context(|| format!("failed to write solution to {}", path))?;
        println!("\nSolution written to {}", path);
    }
    Ok(())
}
