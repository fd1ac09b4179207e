mod common;

use common::synthetic::{flat_normals, height_field, normal_map, Bump, Sinusoid};
use common::{init_logging, peak_to_peak, rms_without_mean, spread};
use normal_to_height::gradient::gradient_field;
use normal_to_height::lsq::{GradientSystem, LeastSquaresCg, LinearSystemParams};
use normal_to_height::relax::RelaxParams;
use normal_to_height::{
    generate_height_map, GenerationParams, HeightGenMethod, HeightSolver, LinearSystemSolver,
    MultigridSolver,
};

const AMPLITUDE: f32 = 0.02;

fn cold(max_iterations: u32, tolerance: f64) -> LinearSystemSolver {
    LinearSystemSolver::new(LinearSystemParams {
        max_iterations,
        tolerance,
        warm_start_iterations: None,
    })
}

#[test]
fn reconstructs_sinusoid_half_a_texel_back() {
    init_logging();
    let surface = Sinusoid {
        amplitude: AMPLITUDE,
    };
    let normals = normal_map(&surface, 32, 32);
    let out = cold(2000, 1e-6).solve(&normals).unwrap();
    assert!(out.converged);
    assert_eq!(out.max_iterations, Some(2000));

    // Forward differences place each solved height half a texel before the
    // slope sample it came from.
    let truth = height_field(&surface, 32, 32, -0.5);
    let rms = rms_without_mean(&out.heights, &truth);
    println!("lsq rms = {rms:.3e} after {} iterations", out.iterations);
    assert!(rms < 0.05 * AMPLITUDE as f64, "rms {rms}");
}

#[test]
fn agrees_with_relaxation_on_smooth_input() {
    let surface = Sinusoid {
        amplitude: AMPLITUDE,
    };
    let normals = normal_map(&surface, 32, 32);
    let lsq = cold(2000, 1e-6).solve(&normals).unwrap();
    let relax = MultigridSolver::new(RelaxParams::with_iterations(1024))
        .solve(&normals)
        .unwrap();
    // Same relief amplitude: both discretizations use the same slope scale.
    let ratio = peak_to_peak(&lsq.heights) / peak_to_peak(&relax.heights);
    assert!((ratio - 1.0).abs() < 0.05, "ratio {ratio}");
}

#[test]
fn warm_start_needs_no_more_iterations_than_cold() {
    init_logging();
    let normals = normal_map(
        &Bump {
            amplitude: 0.05,
            width: 0.7,
        },
        48,
        48,
    );
    let cold_out = cold(4000, 1e-5).solve(&normals).unwrap();
    let warm_out = LinearSystemSolver::new(LinearSystemParams {
        max_iterations: 4000,
        tolerance: 1e-5,
        warm_start_iterations: Some(2048),
    })
    .solve(&normals)
    .unwrap();
    println!(
        "cold {} iterations, warm {} iterations",
        cold_out.iterations, warm_out.iterations
    );
    assert!(cold_out.converged && warm_out.converged);
    assert!(warm_out.iterations <= cold_out.iterations);
    assert!(warm_out.timings.stage_ms("warm_start").is_some());
    assert!(cold_out.timings.stage_ms("warm_start").is_none());
}

#[test]
fn exact_guess_needs_no_iterations() {
    let normals = normal_map(
        &Bump {
            amplitude: 0.05,
            width: 0.35,
        },
        24,
        24,
    );
    let gradient = gradient_field(&normals, 1.0).unwrap();
    let system = GradientSystem::assemble(&gradient).unwrap();
    let cg = LeastSquaresCg::new(2000, 1e-6);
    let first = cg.solve(&system.a, &system.b);
    assert!(first.converged);
    assert!(first.iterations > 0);

    let again = cg.solve_with_guess(&system.a, &system.b, first.x.clone());
    assert_eq!(again.iterations, 0);
    assert!(again.converged);
    assert_eq!(again.x, first.x);
}

#[test]
fn iteration_cap_reports_partial_solution() {
    let normals = normal_map(
        &Bump {
            amplitude: 0.05,
            width: 0.35,
        },
        24,
        24,
    );
    let out = cold(1, 1e-12).solve(&normals).unwrap();
    assert!(!out.converged);
    assert_eq!(out.iterations, 1);
    assert_eq!(out.max_iterations, Some(1));
    assert!(out.solver_error.is_some_and(|e| e > 0.0));
    assert_eq!(out.heights.dims(), (24, 24));
    assert!(spread(&out.heights) > 0.0);
}

#[test]
fn flat_input_solves_to_zero() {
    let out = cold(100, 1e-6).solve(&flat_normals(8, 8)).unwrap();
    assert!(out.converged);
    assert_eq!(out.iterations, 0);
    assert_eq!(out.solver_error, Some(0.0));
    assert!(out.heights.data.iter().all(|&v| v == 0.0));
}

#[test]
fn system_has_two_rows_per_texel() {
    let gradient = gradient_field(&flat_normals(6, 5), 1.0).unwrap();
    let system = GradientSystem::assemble(&gradient).unwrap();
    assert_eq!(system.unknowns(), 30);
    assert_eq!(system.equations(), 60);
    assert_eq!(system.a.nnz(), 120);
}

#[test]
fn generation_reports_solver_statistics() {
    let normals = normal_map(
        &Sinusoid {
            amplitude: AMPLITUDE,
        },
        16,
        16,
    );
    let params = GenerationParams {
        method: HeightGenMethod::LinearSystem,
        ..GenerationParams::default()
    };
    let results = generate_height_map(&normals, &params).unwrap();
    assert_eq!(results.method, HeightGenMethod::LinearSystem);
    assert_eq!(results.max_iterations, Some(params.linear.max_iterations));
    assert!(results.solver_error.is_some());
    assert!(results.converged);
    for stage in ["gradient", "warm_start", "system_setup", "cgls", "normalize"] {
        assert!(results.timings.stage_ms(stage).is_some(), "missing {stage}");
    }
}
