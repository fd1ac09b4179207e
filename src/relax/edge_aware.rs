//! Relaxation that weights each neighbour by normal similarity.
//!
//! The normal and edge-weight pyramids are built once up front, covering the
//! full mip chain down to 1×1, and indexed by level during the solve. With
//! `EdgeWeighting::Uniform` no weights are consulted and the result is
//! bit-identical to [`MultigridSolver`](super::MultigridSolver).
use super::{solve_pyramid, RelaxOutcome, RelaxParams};
use crate::diagnostics::TimingBreakdown;
use crate::error::Result;
use crate::gradient::{gradient_field, validate_normal_map};
use crate::image::ImageF32;
use crate::pyramid::{EdgePyramid, GradientPyramid, NormalPyramid};
use crate::solver::{HeightGenMethod, HeightSolver, SolveOutput};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// How neighbour predictions are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeWeighting {
    /// Equal weights; same arithmetic as the plain multigrid solver.
    Uniform,
    /// Weight each neighbour by the dot product of the two normals, clamped at 0.
    #[default]
    NormalSimilarity,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeAwareParams {
    pub weighting: EdgeWeighting,
    /// Coarsest level (0 = finest) that still uses edge weights. `None`
    /// weights every level.
    pub max_weighted_level: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeAwareSolver {
    pub params: RelaxParams,
    pub edge: EdgeAwareParams,
    pub slope_scale: f32,
}

impl EdgeAwareSolver {
    pub fn new(params: RelaxParams, edge: EdgeAwareParams) -> Self {
        Self {
            params,
            edge,
            slope_scale: 1.0,
        }
    }

    pub fn with_slope_scale(mut self, slope_scale: f32) -> Self {
        self.slope_scale = slope_scale;
        self
    }

    fn weighted_at(&self, level: usize) -> bool {
        self.edge.weighting == EdgeWeighting::NormalSimilarity
            && self.edge.max_weighted_level.map_or(true, |max| level <= max)
    }

    /// Integrate `gradient` using `edges` for the levels selected by the
    /// weighting mode. Edge levels missing from `edges`, or shaped differently
    /// from the matching gradient level, fall back to uniform weights.
    pub fn integrate(&self, gradient: ImageF32, edges: Option<&EdgePyramid>) -> RelaxOutcome {
        let pyramid = GradientPyramid::build(gradient);
        self.integrate_pyramid(&pyramid, edges)
    }

    fn integrate_pyramid(
        &self,
        gradients: &GradientPyramid,
        edges: Option<&EdgePyramid>,
    ) -> RelaxOutcome {
        solve_pyramid(
            gradients,
            |level| {
                if !self.weighted_at(level) {
                    return None;
                }
                let weights = edges.and_then(|e| e.levels.get(level))?;
                let gradient = &gradients.levels[level];
                if weights.same_dims(gradient) && weights.channels == 4 {
                    Some(weights)
                } else {
                    warn!(
                        "edge weights at level {level} are {:?}, gradient is {:?}; using uniform weights",
                        weights.dims(),
                        gradient.dims()
                    );
                    None
                }
            },
            &self.params,
        )
    }
}

impl HeightSolver for EdgeAwareSolver {
    fn method(&self) -> HeightGenMethod {
        HeightGenMethod::RelaxationEdgeAware
    }

    fn solve(&self, normal_map: &ImageF32) -> Result<SolveOutput> {
        validate_normal_map(normal_map)?;
        let mut timings = TimingBreakdown::default();
        let gradient = timings.time("gradient", || gradient_field(normal_map, self.slope_scale))?;
        let (gradients, edges) = timings.time("pyramid", || {
            let gradients = GradientPyramid::build(gradient);
            let edges = match self.edge.weighting {
                EdgeWeighting::Uniform => None,
                EdgeWeighting::NormalSimilarity => {
                    let normals = NormalPyramid::build(normal_map);
                    Some(EdgePyramid::from_normals(&normals))
                }
            };
            (gradients, edges)
        });
        debug!(
            "edge-aware relax: weighting={:?} gradient levels={} edge levels={}",
            self.edge.weighting,
            gradients.len(),
            edges.as_ref().map_or(0, EdgePyramid::len)
        );
        let outcome = timings.time("relax", || {
            self.integrate_pyramid(&gradients, edges.as_ref())
        });
        Ok(SolveOutput::from_relaxation(outcome, timings))
    }
}
