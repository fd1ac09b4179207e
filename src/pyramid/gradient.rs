use super::{LevelPlan, LevelScaling};
use crate::image::{resize_box_wrap, ImageF32};

/// Gradient fields for every relaxation level, finest first.
#[derive(Clone, Debug, Default)]
pub struct GradientPyramid {
    pub levels: Vec<ImageF32>,
}

impl GradientPyramid {
    /// Build the relaxation chain for a 2-channel gradient field.
    pub fn build(gradient: ImageF32) -> Self {
        let plan = LevelPlan::relaxation(gradient.w, gradient.h);
        let mut levels = Vec::with_capacity(plan.len());
        levels.push(gradient);
        for &(nw, nh) in plan.dims.iter().skip(1) {
            let next = downsample_gradient(&levels[levels.len() - 1], nw, nh);
            levels.push(next);
        }
        Self { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Box-downsample a gradient field and grow its slopes to the new footprint.
pub fn downsample_gradient(src: &ImageF32, new_w: usize, new_h: usize) -> ImageF32 {
    let scaling = LevelScaling::from_dimensions(src.w, src.h, new_w, new_h);
    let mut out = resize_box_wrap(src, new_w, new_h);
    out.for_each_pixel_mut(|p| {
        p[0] *= scaling.slope_x;
        p[1] *= scaling.slope_y;
    });
    out
}
