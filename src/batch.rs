//! The batch run behind the `normal_to_height` binary.
//!
//! One call loads the configured normal map, runs the solver once per
//! requested iteration count, saves heights and (optionally) re-estimated
//! normals, assembles the combined sheet in sweep mode, and returns the run
//! report. The linear solver has its own stopping rule, so it runs once even
//! when a sweep is configured and its file is named after the CG iterations
//! it actually used.
use crate::config::height::{HeightToolConfig, COMBINED_VIEW_ITERATIONS};
use crate::diagnostics::{GenerationReport, HeightToolReport, InputDescriptor, NormalScore};
use crate::error::{Error, Result};
use crate::image::io::{
    load_normal_map, save_height_map, save_normal_map, save_rgb_f32, write_json_file,
};
use crate::image::mosaic::{compose_sheet, SHEET_BORDER, SHEET_BORDER_COLOR};
use crate::image::ImageF32;
use crate::metrics::{compare_normal_maps, image_mse};
use crate::normals::{estimate_normal_map, pack_normal_map, NormalMethod};
use crate::solver::{run_solver, GenerationParams, GenerationResults, HeightGenMethod, HeightSolver};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Normals used for the second row of the combined sheet.
pub const SHEET_NORMAL_METHOD: NormalMethod = NormalMethod::Accurate;

/// Builds the solver for one run.
pub type SolverFactory<'a> = dyn Fn(&GenerationParams) -> Box<dyn HeightSolver + Send + Sync> + 'a;

#[derive(Default)]
struct SheetTiles {
    heights: Vec<ImageF32>,
    normals: Vec<ImageF32>,
}

/// Run the height tool with the solvers selected by `config.generation`.
pub fn run_height_tool(config: &HeightToolConfig) -> Result<HeightToolReport> {
    run_height_tool_with(config, &|params: &GenerationParams| params.build_solver())
}

/// Same as [`run_height_tool`] with solver construction supplied by the caller.
pub fn run_height_tool_with(
    config: &HeightToolConfig,
    build: &SolverFactory<'_>,
) -> Result<HeightToolReport> {
    let normal_map = load_normal_map(&config.input, config.flip_y, config.flip_x)?;
    let (w, h) = normal_map.dims();
    info!("Loaded {} ({w}x{h})", config.input.display());

    let out_dir = config.output_dir();
    let stem = config.stem();
    let sweep = config.sweeps();
    if config.iteration_range && !sweep {
        info!(
            "{} stops on its own tolerance; running it once instead of sweeping",
            config.generation.method
        );
    }

    let mut runs = Vec::new();
    let mut tiles = SheetTiles::default();

    for requested in config.iteration_list() {
        let params = config.generation.with_iterations(requested);
        let results = generate_with_fallback(&normal_map, &params, build)?;
        log_results(&results, w, h, requested);

        let tag = results.method.file_tag();
        let count = output_count(&results, requested);
        let mut report = GenerationReport::from_results(requested, &results);

        let height_path = out_dir.join(format!("{stem}_{tag}h_{count}.png"));
        save_height_map(
            &results.height_map,
            &height_path,
            config.output.height_bit_depth,
        )?;
        report.outputs.push(height_path.display().to_string());

        if config.generate_normals {
            for method in NormalMethod::ALL {
                let estimated = estimate_normal_map(&results.height_map, method);
                let cmp = compare_normal_maps(&normal_map, &estimated)?;
                let score = NormalScore::new(method, cmp, image_mse(&normal_map, &estimated)?);
                info!(
                    "\tGenerated normals [{method}] PSNR = {:.3} (per-channel {:.3})",
                    score.psnr, score.channel_psnr
                );
                report.normal_scores.push(score);

                let name = if sweep {
                    format!("{stem}_{tag}n_{method}_{count}.png")
                } else {
                    format!("{stem}_{tag}n_{method}.png")
                };
                let path = out_dir.join(name);
                save_normal_map(&estimated, &path, config.flip_y, config.flip_x)?;
                report.outputs.push(path.display().to_string());

                if sweep && method == SHEET_NORMAL_METHOD && on_sheet(requested) {
                    let mut packed = estimated;
                    pack_normal_map(&mut packed, config.flip_y, config.flip_x);
                    tiles.normals.push(packed);
                }
            }
        }

        if sweep && on_sheet(requested) {
            tiles.heights.push(results.height_map.map.clone());
        }
        runs.push(report);
    }

    let combined_view = if sweep && config.output.combined_view {
        Some(save_combined_view(&out_dir, &stem, tiles)?)
    } else {
        None
    };

    let report = HeightToolReport {
        input: InputDescriptor {
            path: config.input.display().to_string(),
            width: w,
            height: h,
        },
        runs,
        combined_view: combined_view.map(|p| p.display().to_string()),
    };
    if let Some(path) = &config.output.report_json {
        write_json_file(path, &report)?;
        info!("Saved report to {}", path.display());
    }

    info!("Outputs written to {}", out_dir.display());
    Ok(report)
}

/// Iteration count that goes into output file names.
fn output_count(results: &GenerationResults, requested: u32) -> u32 {
    match results.method {
        HeightGenMethod::LinearSystem => results.iterations,
        _ => requested,
    }
}

fn on_sheet(iterations: u32) -> bool {
    COMBINED_VIEW_ITERATIONS.contains(&iterations)
}

/// Run the configured solver, retrying with relaxation if the sparse system
/// could not be set up.
fn generate_with_fallback(
    normal_map: &ImageF32,
    params: &GenerationParams,
    build: &SolverFactory<'_>,
) -> Result<GenerationResults> {
    match run_solver(build(params).as_ref(), normal_map) {
        Err(Error::SolverSetup(msg)) => {
            warn!(
                "{msg}; falling back to relaxation with {} iterations",
                params.iterations
            );
            let relax = params.with_method(HeightGenMethod::Relaxation);
            run_solver(build(&relax).as_ref(), normal_map)
        }
        other => other,
    }
}

fn log_results(results: &GenerationResults, w: usize, h: usize, iterations: u32) {
    info!(
        "Finished {w}x{h} image with {iterations} iterations in {:.2} seconds",
        results.elapsed_ms / 1000.0
    );
    let hm = &results.height_map;
    info!(
        "\tGenerated Height Map: MinH = {:.3}, MaxH = {:.3}, Range = {:.3}",
        hm.min_h,
        hm.max_h,
        hm.range()
    );
    if let (Some(max), Some(err)) = (results.max_iterations, results.solver_error) {
        info!(
            "\tLinear solve: {} / {max} iterations, error {err:.3e}{}",
            results.iterations,
            if results.converged { "" } else { " (not converged)" }
        );
    }
}

fn save_combined_view(out_dir: &Path, stem: &str, tiles: SheetTiles) -> Result<PathBuf> {
    let mut rows = vec![tiles.heights];
    if !tiles.normals.is_empty() {
        rows.push(tiles.normals);
    }
    let sheet = compose_sheet(&rows, SHEET_BORDER, SHEET_BORDER_COLOR)?;
    let path = out_dir.join(format!("{stem}_combinedView.png"));
    save_rgb_f32(&sheet, &path)?;
    info!("Saved combined view to {}", path.display());
    Ok(path)
}
