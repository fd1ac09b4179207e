//! Coarse-to-fine relaxation of a height field against a gradient field.
//!
//! Every level runs Jacobi sweeps of
//!
//! ```text
//! h'(r,c) = Σ_n w_n · (h(n) ± k·g(n)) / Σ_n w_n
//! ```
//!
//! over the four wrapped neighbours `n` (left/right use the x slope, up/down
//! the y slope, sign chosen so each term predicts `h(r,c)` from `h(n)`), with
//! slope weight `k = 0.5`. Unweighted levels use `w_n = 1`.
//!
//! The driver walks a precomputed `GradientPyramid` from the coarsest level
//! (zero heights: one side is 1 texel) to the finest, upsampling each result
//! as the initial guess of the next finer level. Coarser levels receive a
//! doubled iteration multiplier; the multiplier is clamped to 1 before use,
//! so only the finest levels run a reduced budget when the caller passes a
//! multiplier below 1.
//!
//! Two owned buffers alternate per sweep; the buffer being written is never
//! read in the same sweep, which makes rows independent (parallel under the
//! `parallel` feature).

pub mod edge_aware;
pub mod multigrid;

pub use edge_aware::{EdgeAwareParams, EdgeAwareSolver, EdgeWeighting};
pub use multigrid::MultigridSolver;

use crate::image::{resize_box_wrap, wrap_neighbors, ImageF32};
use crate::pyramid::GradientPyramid;
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Default coefficient applied to neighbour slopes.
pub const SLOPE_WEIGHT: f32 = 0.5;
/// Clamped neighbour weights summing below this fall back to uniform.
pub const MIN_WEIGHT_SUM: f32 = 1e-6;

/// Iteration schedule shared by the relaxation solvers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaxParams {
    /// Sweeps requested at full budget.
    pub iterations: u32,
    /// Budget factor at the finest level; doubles per coarser level.
    pub iteration_multiplier: f32,
    /// Coefficient on neighbour slopes.
    pub slope_weight: f32,
}

impl Default for RelaxParams {
    fn default() -> Self {
        Self {
            iterations: 512,
            iteration_multiplier: 1.0,
            slope_weight: SLOPE_WEIGHT,
        }
    }
}

impl RelaxParams {
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }
}

/// Sweeps run at a level with the given multiplier, always odd.
pub fn iterations_for_level(requested: u32, multiplier: f32) -> u32 {
    let budget = (multiplier.clamp(0.0, 1.0) * requested as f32).floor() as u32;
    if budget % 2 == 0 {
        budget + 1
    } else {
        budget
    }
}

/// Result of a pyramid solve.
#[derive(Clone, Debug)]
pub struct RelaxOutcome {
    /// Raw heights at the finest level.
    pub heights: ImageF32,
    /// Sweeps executed per level, finest first (0 for the zero base level).
    pub level_iterations: Vec<u32>,
}

impl RelaxOutcome {
    pub fn finest_iterations(&self) -> u32 {
        self.level_iterations.first().copied().unwrap_or(0)
    }
}

/// Weighted average of the four neighbour predictions.
#[inline]
fn weighted_average(weights: &[f32], predictions: [f32; 4]) -> f32 {
    let wl = weights[0].max(0.0);
    let wr = weights[1].max(0.0);
    let wu = weights[2].max(0.0);
    let wd = weights[3].max(0.0);
    let sum = wl + wr + wu + wd;
    let [l, r, u, d] = predictions;
    if sum <= MIN_WEIGHT_SUM {
        return (l + r + u + d) / 4.0;
    }
    (wl * l + wr * r + wu * u + wd * d) / sum
}

fn relax_row(
    row: usize,
    out: &mut [f32],
    cur: &ImageF32,
    gradient: &ImageF32,
    weights: Option<&ImageF32>,
    k: f32,
) {
    let (w, h) = cur.dims();
    let (up, down) = wrap_neighbors(row, h);
    let h_row = cur.row(row);
    let h_up = cur.row(up);
    let h_down = cur.row(down);
    let g_row = gradient.row(row);
    let g_up = gradient.row(up);
    let g_down = gradient.row(down);

    for (col, dst) in out.iter_mut().enumerate().take(w) {
        let (left, right) = wrap_neighbors(col, w);
        let predictions = [
            h_row[left] + k * g_row[2 * left],
            h_row[right] - k * g_row[2 * right],
            h_up[col] + k * g_up[2 * col + 1],
            h_down[col] - k * g_down[2 * col + 1],
        ];
        *dst = match weights {
            None => {
                let [l, r, u, d] = predictions;
                (l + r + u + d) / 4.0
            }
            Some(wimg) => weighted_average(wimg.pixel(col, row), predictions),
        };
    }
}

/// One Jacobi sweep from `cur` into `next`.
pub fn relax_step(
    cur: &ImageF32,
    next: &mut ImageF32,
    gradient: &ImageF32,
    weights: Option<&ImageF32>,
    slope_weight: f32,
) {
    debug_assert!(cur.same_dims(gradient) && cur.same_dims(next));
    let w = cur.w;
    if w == 0 {
        return;
    }

    #[cfg(feature = "parallel")]
    next.data
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(row, out)| relax_row(row, out, cur, gradient, weights, slope_weight));

    #[cfg(not(feature = "parallel"))]
    next.data
        .chunks_mut(w)
        .enumerate()
        .for_each(|(row, out)| relax_row(row, out, cur, gradient, weights, slope_weight));
}

/// Run `iterations` sweeps starting from `initial` and return the last result.
pub fn relax_level(
    initial: ImageF32,
    gradient: &ImageF32,
    weights: Option<&ImageF32>,
    iterations: u32,
    slope_weight: f32,
) -> ImageF32 {
    let mut cur = initial;
    let mut next = ImageF32::new(cur.w, cur.h, 1);
    for _ in 0..iterations {
        relax_step(&cur, &mut next, gradient, weights, slope_weight);
        std::mem::swap(&mut cur, &mut next);
    }
    cur
}

/// Solve every level of `gradients`, coarsest first.
///
/// `weights_for_level` returns the 4-channel edge weights to use at a level,
/// or `None` for uniform averaging.
pub fn solve_pyramid<'w, F>(
    gradients: &GradientPyramid,
    weights_for_level: F,
    params: &RelaxParams,
) -> RelaxOutcome
where
    F: Fn(usize) -> Option<&'w ImageF32>,
{
    let Some(coarsest) = gradients.levels.last() else {
        return RelaxOutcome {
            heights: ImageF32::new(0, 0, 1),
            level_iterations: Vec::new(),
        };
    };

    let mut level_iterations = vec![0; gradients.len()];
    // Base level: a side of one texel leaves nothing to integrate.
    let mut heights = ImageF32::new(coarsest.w, coarsest.h, 1);
    debug!(
        "relax base level {} {}x{} -> zero",
        gradients.len() - 1,
        coarsest.w,
        coarsest.h
    );

    for level in (0..gradients.len() - 1).rev() {
        let gradient = &gradients.levels[level];
        let initial = resize_box_wrap(&heights, gradient.w, gradient.h);
        let multiplier = params.iteration_multiplier * 2f32.powi(level as i32);
        let iterations = iterations_for_level(params.iterations, multiplier);
        let weights = weights_for_level(level);
        debug!(
            "relax level {} {}x{} iterations={} weighted={}",
            level,
            gradient.w,
            gradient.h,
            iterations,
            weights.is_some()
        );
        heights = relax_level(initial, gradient, weights, iterations, params.slope_weight);
        level_iterations[level] = iterations;
    }

    RelaxOutcome {
        heights,
        level_iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_iterations_are_odd_and_clamped() {
        assert_eq!(iterations_for_level(512, 1.0), 513);
        assert_eq!(iterations_for_level(511, 1.0), 511);
        assert_eq!(iterations_for_level(512, 8.0), 513);
        assert_eq!(iterations_for_level(100, 0.25), 25);
        assert_eq!(iterations_for_level(100, 0.5), 51);
        assert_eq!(iterations_for_level(0, 1.0), 1);
    }

    #[test]
    fn zero_gradient_keeps_constant_field() {
        let grad = ImageF32::new(5, 4, 2);
        let init = ImageF32::filled(5, 4, &[0.7]);
        let out = relax_level(init, &grad, None, 9, SLOPE_WEIGHT);
        assert!(out.data.iter().all(|&v| (v - 0.7).abs() < 1e-6));
    }

    #[test]
    fn unit_weights_match_plain_average() {
        let mut grad = ImageF32::new(4, 4, 2);
        for (i, v) in grad.data.iter_mut().enumerate() {
            *v = ((i * 7) % 5) as f32 * 0.01 - 0.02;
        }
        let mut init = ImageF32::new(4, 4, 1);
        for (i, v) in init.data.iter_mut().enumerate() {
            *v = (i % 3) as f32 * 0.1;
        }
        let ones = ImageF32::filled(4, 4, &[1.0; 4]);
        let plain = relax_level(init.clone(), &grad, None, 7, SLOPE_WEIGHT);
        let weighted = relax_level(init, &grad, Some(&ones), 7, SLOPE_WEIGHT);
        assert_eq!(plain.data, weighted.data);
    }

    #[test]
    fn negative_weights_fall_back_to_uniform() {
        let w = [-1.0, -0.5, -0.2, 0.0];
        assert_eq!(weighted_average(&w, [1.0, 2.0, 3.0, 6.0]), 3.0);
        let w = [1.0, 0.0, -1.0, 0.0];
        assert_eq!(weighted_average(&w, [1.0, 2.0, 3.0, 6.0]), 1.0);
    }

    #[test]
    fn degenerate_input_yields_zero_heights() {
        let grad = ImageF32::filled(1, 6, &[0.3, 0.1]);
        let pyr = GradientPyramid::build(grad);
        let out = solve_pyramid(&pyr, |_| None, &RelaxParams::with_iterations(16));
        assert_eq!(out.heights.dims(), (1, 6));
        assert!(out.heights.data.iter().all(|&v| v == 0.0));
        assert_eq!(out.level_iterations, vec![0]);
    }
}
