//! Solver selection and the normal map → packed height map pipeline.
//!
//! Every reconstruction strategy implements [`HeightSolver`], returning raw
//! heights plus iteration statistics. [`generate_height_map`] picks a solver
//! from [`GenerationParams`], runs it, and packs the result into [0, 1].
use crate::diagnostics::{elapsed_ms, TimingBreakdown};
use crate::error::Result;
use crate::height::HeightMap;
use crate::image::ImageF32;
use crate::lsq::{LinearSystemParams, LinearSystemSolver};
use crate::relax::{EdgeAwareParams, EdgeAwareSolver, MultigridSolver, RelaxOutcome, RelaxParams};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightGenMethod {
    #[default]
    Relaxation,
    RelaxationEdgeAware,
    LinearSystem,
}

impl HeightGenMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HeightGenMethod::Relaxation => "relaxation",
            HeightGenMethod::RelaxationEdgeAware => "relaxation_edge_aware",
            HeightGenMethod::LinearSystem => "linear_system",
        }
    }

    /// Short tag used in output file names.
    pub fn file_tag(self) -> &'static str {
        match self {
            HeightGenMethod::LinearSystem => "gl",
            _ => "g",
        }
    }
}

impl fmt::Display for HeightGenMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw output of a single solver run.
#[derive(Clone, Debug)]
pub struct SolveOutput {
    /// Unpacked single-channel heights.
    pub heights: ImageF32,
    /// Finest-level relaxation sweeps or CG iterations.
    pub iterations: u32,
    pub max_iterations: Option<u32>,
    pub solver_error: Option<f32>,
    pub converged: bool,
    pub timings: TimingBreakdown,
}

impl SolveOutput {
    /// Relaxation always runs its full schedule and counts as converged.
    pub fn from_relaxation(outcome: RelaxOutcome, timings: TimingBreakdown) -> Self {
        Self {
            iterations: outcome.finest_iterations(),
            heights: outcome.heights,
            max_iterations: None,
            solver_error: None,
            converged: true,
            timings,
        }
    }
}

/// A strategy that reconstructs heights from a 3-channel unit normal map.
pub trait HeightSolver {
    fn method(&self) -> HeightGenMethod;
    fn solve(&self, normal_map: &ImageF32) -> Result<SolveOutput>;
}

/// Everything needed to pick and configure a solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub method: HeightGenMethod,
    pub iterations: u32,
    pub iteration_multiplier: f32,
    pub slope_scale: f32,
    pub edge_aware: EdgeAwareParams,
    pub linear: LinearSystemParams,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            method: HeightGenMethod::Relaxation,
            iterations: 512,
            iteration_multiplier: 1.0,
            slope_scale: 1.0,
            edge_aware: EdgeAwareParams::default(),
            linear: LinearSystemParams::default(),
        }
    }
}

impl GenerationParams {
    pub fn relax_params(&self) -> RelaxParams {
        RelaxParams {
            iterations: self.iterations,
            iteration_multiplier: self.iteration_multiplier,
            ..RelaxParams::default()
        }
    }

    /// Copy with a different relaxation budget.
    pub fn with_iterations(&self, iterations: u32) -> Self {
        Self {
            iterations,
            ..self.clone()
        }
    }

    /// Copy that uses a different method with the same budget.
    pub fn with_method(&self, method: HeightGenMethod) -> Self {
        Self {
            method,
            ..self.clone()
        }
    }

    pub fn build_solver(&self) -> Box<dyn HeightSolver + Send + Sync> {
        match self.method {
            HeightGenMethod::Relaxation => Box::new(
                MultigridSolver::new(self.relax_params()).with_slope_scale(self.slope_scale),
            ),
            HeightGenMethod::RelaxationEdgeAware => Box::new(
                EdgeAwareSolver::new(self.relax_params(), self.edge_aware)
                    .with_slope_scale(self.slope_scale),
            ),
            HeightGenMethod::LinearSystem => Box::new(
                LinearSystemSolver::new(self.linear).with_slope_scale(self.slope_scale),
            ),
        }
    }
}

/// A packed height map with the statistics of the run that produced it.
#[derive(Clone, Debug)]
pub struct GenerationResults {
    /// Heights packed into [0, 1]; `scale`/`bias` restore raw values.
    pub height_map: HeightMap,
    pub method: HeightGenMethod,
    pub iterations: u32,
    pub max_iterations: Option<u32>,
    pub solver_error: Option<f32>,
    pub converged: bool,
    pub elapsed_ms: f64,
    pub timings: TimingBreakdown,
}

/// Run `solver` on `normal_map` and pack the result.
pub fn run_solver(solver: &dyn HeightSolver, normal_map: &ImageF32) -> Result<GenerationResults> {
    let start = Instant::now();
    let SolveOutput {
        heights,
        iterations,
        max_iterations,
        solver_error,
        converged,
        mut timings,
    } = solver.solve(normal_map)?;

    let height_map = timings.time("normalize", || {
        let mut hm = HeightMap::from_raw(heights);
        hm.pack_0_to_1();
        hm
    });
    let elapsed = elapsed_ms(start);
    timings.total_ms = elapsed;
    debug!(
        "{} finished {}x{} in {:.1} ms, range [{}, {}]",
        solver.method(),
        height_map.width(),
        height_map.height(),
        elapsed,
        height_map.min_h,
        height_map.max_h
    );

    Ok(GenerationResults {
        height_map,
        method: solver.method(),
        iterations,
        max_iterations,
        solver_error,
        converged,
        elapsed_ms: elapsed,
        timings,
    })
}

/// Reconstruct a packed height map with the solver selected by `params`.
pub fn generate_height_map(
    normal_map: &ImageF32,
    params: &GenerationParams,
) -> Result<GenerationResults> {
    let solver = params.build_solver();
    run_solver(solver.as_ref(), normal_map)
}
