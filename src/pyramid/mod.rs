//! Resolution pyramids for the coarse-to-fine solvers.
//!
//! Purpose
//! - Precompute every level the multigrid solve visits so the solve itself is
//!   a plain bottom-up loop instead of recursion over shared buffers.
//!
//! Design
//! - Each level halves both sides with `max(dim / 2, 1)`.
//! - The relaxation chain stops as soon as either side reaches 1 (nothing to
//!   integrate along a degenerate axis). The mip chain used for normals and
//!   edge weights continues down to 1×1.
//! - Downsampling is a toroidal box filter. Gradient levels are rescaled by
//!   the fine/coarse size ratio (see `scaling`); normal levels are
//!   re-normalized.
//!
//! Complexity
//! - Per level O(W·H); memory about 4/3 of the base level per pyramid.

pub mod gradient;
pub mod normals;
pub mod scaling;

pub use gradient::GradientPyramid;
pub use normals::{edge_weights, EdgePyramid, NormalPyramid};
pub use scaling::LevelScaling;

/// Size of the next coarser level.
#[inline]
pub fn half_dims(w: usize, h: usize) -> (usize, usize) {
    ((w / 2).max(1), (h / 2).max(1))
}

/// Ordered level sizes, finest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelPlan {
    pub dims: Vec<(usize, usize)>,
}

impl LevelPlan {
    /// Levels visited by the relaxation solvers: halve until a side is 1.
    pub fn relaxation(w: usize, h: usize) -> Self {
        let mut dims = vec![(w, h)];
        let (mut cw, mut ch) = (w, h);
        while cw > 1 && ch > 1 {
            (cw, ch) = half_dims(cw, ch);
            dims.push((cw, ch));
        }
        Self { dims }
    }

    /// Full mip chain down to 1×1, `floor(log2(max(w, h))) + 1` levels.
    pub fn mip_chain(w: usize, h: usize) -> Self {
        let mut dims = vec![(w, h)];
        let (mut cw, mut ch) = (w, h);
        while cw > 1 || ch > 1 {
            (cw, ch) = half_dims(cw, ch);
            dims.push((cw, ch));
        }
        Self { dims }
    }

    pub fn len(&self) -> usize {
        self.dims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relaxation_plan_stops_at_degenerate_axis() {
        let plan = LevelPlan::relaxation(64, 16);
        assert_eq!(
            plan.dims,
            vec![(64, 16), (32, 8), (16, 4), (8, 2), (4, 1)]
        );
        assert_eq!(LevelPlan::relaxation(1, 9).dims, vec![(1, 9)]);
    }

    #[test]
    fn mip_chain_reaches_single_texel() {
        let plan = LevelPlan::mip_chain(64, 16);
        assert_eq!(plan.len(), 7);
        assert_eq!(plan.dims.last(), Some(&(1, 1)));
        assert_eq!(LevelPlan::mip_chain(5, 3).dims, vec![(5, 3), (2, 1), (1, 1)]);
    }

    #[test]
    fn level_count_is_bounded_for_all_sizes() {
        for w in 1..70usize {
            for h in [1usize, 2, 3, 7, 31, 64, 65] {
                let plan = LevelPlan::relaxation(w, h);
                let bound = (w.max(h) as f64).log2().ceil() as usize + 1;
                assert!(plan.len() <= bound, "{w}x{h}: {} > {bound}", plan.len());
                assert!(plan.dims.iter().all(|&(lw, lh)| lw >= 1 && lh >= 1));
                let &(lw, lh) = plan.dims.last().unwrap();
                assert!(lw == 1 || lh == 1);
            }
        }
    }
}
