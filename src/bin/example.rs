//! Truss Opt Example - Cantilevered Warren Truss

use anyhow::Context;
use truss_opt::prelude::*;

/// Build a cantilevered Warren truss with `bays` panels, pinned at the wall
/// and loaded at the free end
fn warren_cantilever(bays: usize, bay_width: f64, depth: f64, tip_load: f64) -> TrussResult<TrussModel> {
    //
    //   wall  1 ---- 3 ---- 5 ...
    //    |    |  \   |  \   |
    //    |    0 ---- 2 ---- 4 ... tip
    //
    let mut xpos = Vec::with_capacity(4 * (bays + 1));
    for i in 0..=bays {
        let x = i as f64 * bay_width;
        xpos.extend_from_slice(&[x, 0.0, x, depth]);
    }

    let mut conn = Vec::new();
    for i in 0..bays {
        let (bl, tl, br, tr) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
        conn.push([bl, br]);
        conn.push([tl, tr]);
        conn.push([br, tr]);
        conn.push([tl, br]);
    }

    let tip = 2 * bays;
    let pinned: &[usize] = &[0, 1];
    let bcs = [(0, pinned), (1, pinned)];

    TrussModel::from_arrays(
        Material::aluminum().with_yield_strength(150e6),
        &xpos,
        &conn,
        &[(tip, [0.0, -tip_load])],
        &bcs,
    )
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("=== Truss Opt Example: Cantilevered Warren Truss ===\n");

    let model = warren_cantilever(4, 1.0, 0.75, 10_000.0).context("failed to build model")?;
    println!(
        "{} nodes, {} bars, {} DOFs\n",
        model.num_nodes(),
        model.num_bars(),
        model.num_dofs()
    );

    // Uniform starting design
    let areas = vec![1e-4; model.num_bars()];
    let analysis = TrussAnalysis::new(&model);
    let state = analysis.solve(&areas).context("analysis failed")?;

    println!("Response:");
    println!("  Compliance: {:.6e} J", state.compliance());
    println!("  Mass:       {:.4} kg", state.mass());

    println!("\nBar Forces:");
    for result in state.bar_results() {
        println!(
            "  Bar {:2}: N={:9.2}kN, σ={:8.2}MPa",
            result.bar,
            result.force / 1000.0,
            result.stress / 1e6
        );
    }

    println!("\nSupport Reactions:");
    for rxn in state.reactions() {
        println!("  Node {}: FX={:.2}kN, FY={:.2}kN", rxn.node, rxn.fx / 1000.0, rxn.fy / 1000.0);
    }

    let gradient = state.compliance_gradient();
    let most_sensitive = gradient
        .iter()
        .enumerate()
        .fold((0, 0.0), |best, (i, g)| if g.abs() > best.1 { (i, g.abs()) } else { best });
    println!(
        "\nMost compliance-sensitive bar: {} (dC/dA = {:.4e})",
        most_sensitive.0, gradient[most_sensitive.0]
    );

    // Fully-stressed resizing
    println!("\n=== Fully-Stressed Redesign ===\n");
    let options = FullyStressedOptions::default()
        .with_a_min(1e-6)
        .with_max_iterations(20)
        .with_tolerance(1e-8);
    let design = analysis
        .fully_stressed(&areas, &options)
        .context("fully-stressed redesign failed")?;
    println!(
        "  {} passes (converged: {}), mass {:.4} kg -> {:.4} kg",
        design.iterations,
        design.converged,
        state.mass(),
        design.mass_history.last().copied().unwrap_or_default()
    );

    // Optimizer view of the same problem: same mass budget as the start
    println!("\n=== Optimizer Callbacks ===\n");
    let settings = ProblemSettings::new(1e-6, 1e-3, state.mass()).with_a_init(1e-4);
    let mut problem = ComplianceProblem::new(model.clone(), settings)?;
    let (x0, _, _) = problem.vars_and_bounds();
    match problem.eval_obj_con(&x0)? {
        Evaluation::Success(obj_con) => println!(
            "  objective = {:.6}, constraint = {:.6}",
            obj_con.objective, obj_con.constraint
        ),
        Evaluation::Failed { reason } => println!("  evaluation failed: {}", reason),
    }
    problem.summary(&x0)?;

    let report = analysis.report(&design.areas)?;
    println!("\nReport snapshot: {} bytes of JSON", report.to_json()?.len());

    println!("\n=== Analysis Complete ===");
    Ok(())
}
