use super::{solve_pyramid, RelaxOutcome, RelaxParams};
use crate::diagnostics::TimingBreakdown;
use crate::error::Result;
use crate::gradient::gradient_field;
use crate::image::ImageF32;
use crate::pyramid::GradientPyramid;
use crate::solver::{HeightGenMethod, HeightSolver, SolveOutput};

/// Plain coarse-to-fine relaxation with uniform neighbour weights.
#[derive(Clone, Debug, PartialEq)]
pub struct MultigridSolver {
    pub params: RelaxParams,
    pub slope_scale: f32,
}

impl Default for MultigridSolver {
    fn default() -> Self {
        Self::new(RelaxParams::default())
    }
}

impl MultigridSolver {
    pub fn new(params: RelaxParams) -> Self {
        Self {
            params,
            slope_scale: 1.0,
        }
    }

    pub fn with_slope_scale(mut self, slope_scale: f32) -> Self {
        self.slope_scale = slope_scale;
        self
    }

    /// Integrate an already extracted 2-channel gradient field.
    pub fn integrate(&self, gradient: ImageF32) -> RelaxOutcome {
        let pyramid = GradientPyramid::build(gradient);
        solve_pyramid(&pyramid, |_| None, &self.params)
    }
}

impl HeightSolver for MultigridSolver {
    fn method(&self) -> HeightGenMethod {
        HeightGenMethod::Relaxation
    }

    fn solve(&self, normal_map: &ImageF32) -> Result<SolveOutput> {
        let mut timings = TimingBreakdown::default();
        let gradient = timings.time("gradient", || gradient_field(normal_map, self.slope_scale))?;
        let pyramid = timings.time("pyramid", || GradientPyramid::build(gradient));
        let outcome = timings.time("relax", || solve_pyramid(&pyramid, |_| None, &self.params));
        Ok(SolveOutput::from_relaxation(outcome, timings))
    }
}
