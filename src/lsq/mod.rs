//! Global least-squares height reconstruction.
//!
//! Treats the gradient field as an overdetermined sparse system (see
//! `system`) and solves it with preconditioned conjugate gradient on the
//! normal equations (see `cgls`). A short multigrid relaxation can provide
//! the initial guess.
//!
//! Failure modes
//! - Matrix assembly errors are returned as `Error::SolverSetup`; the caller
//!   decides whether to fall back to relaxation.
//! - Hitting the iteration cap is not an error. The partial solution is
//!   returned with `converged == false` and a warning is logged.

pub mod cgls;
pub mod system;

pub use cgls::{CgOutcome, LeastSquaresCg};
pub use system::GradientSystem;

use crate::diagnostics::TimingBreakdown;
use crate::error::Result;
use crate::gradient::gradient_field;
use crate::image::ImageF32;
use crate::relax::{MultigridSolver, RelaxParams};
use crate::solver::{HeightGenMethod, HeightSolver, SolveOutput};
use log::{error, warn};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearSystemParams {
    pub max_iterations: u32,
    /// Target for the relative normal-equation residual.
    pub tolerance: f64,
    /// Relaxation sweeps used to seed CG. `None` starts from zero heights.
    pub warm_start_iterations: Option<u32>,
}

impl Default for LinearSystemParams {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            tolerance: 1e-5,
            warm_start_iterations: Some(512),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinearSystemSolver {
    pub params: LinearSystemParams,
    pub slope_scale: f32,
}

impl LinearSystemSolver {
    pub fn new(params: LinearSystemParams) -> Self {
        Self {
            params,
            slope_scale: 1.0,
        }
    }

    pub fn with_slope_scale(mut self, slope_scale: f32) -> Self {
        self.slope_scale = slope_scale;
        self
    }

    fn cg(&self) -> LeastSquaresCg {
        LeastSquaresCg::new(self.params.max_iterations, self.params.tolerance)
    }

    /// Solve an assembled system, optionally from `guess`.
    pub fn solve_system(&self, system: &GradientSystem, guess: Option<&ImageF32>) -> Result<CgOutcome> {
        let outcome = match guess {
            Some(g) => {
                let x0 = system.heights_to_vector(g)?;
                self.cg().solve_with_guess(&system.a, &system.b, x0)
            }
            None => self.cg().solve(&system.a, &system.b),
        };
        if !outcome.converged {
            warn!(
                "linear solve did not converge: {} iterations, error {:.3e} (target {:.1e})",
                outcome.iterations, outcome.error, self.params.tolerance
            );
        }
        Ok(outcome)
    }
}

impl HeightSolver for LinearSystemSolver {
    fn method(&self) -> HeightGenMethod {
        HeightGenMethod::LinearSystem
    }

    fn solve(&self, normal_map: &ImageF32) -> Result<SolveOutput> {
        let mut timings = TimingBreakdown::default();
        let gradient = timings.time("gradient", || gradient_field(normal_map, self.slope_scale))?;

        let guess = self.params.warm_start_iterations.map(|iterations| {
            timings.time("warm_start", || {
                MultigridSolver::new(RelaxParams::with_iterations(iterations))
                    .integrate(gradient.clone())
                    .heights
            })
        });

        let system = timings
            .time("system_setup", || GradientSystem::assemble(&gradient))
            .inspect_err(|e| error!("linear system setup failed: {e}"))?;

        let outcome = timings.time("cgls", || self.solve_system(&system, guess.as_ref()))?;

        Ok(SolveOutput {
            heights: system.vector_to_heights(&outcome.x),
            iterations: outcome.iterations,
            max_iterations: Some(self.params.max_iterations),
            solver_error: Some(outcome.error as f32),
            converged: outcome.converged,
            timings,
        })
    }
}
