//! Normal mip chain and the edge-weight pyramid derived from it.
//!
//! Edge weights store, per texel, the dot product between its normal and the
//! normal of its wrapped left/right/up/down neighbour (channels 0..4). Values
//! near 1 mark smooth surface, low or negative values mark creases.
use super::LevelPlan;
use crate::image::{resize_box_wrap, wrap_neighbors, ImageF32};
use nalgebra::Vector3;

/// Channel order of an edge-weight texel.
pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;
pub const UP: usize = 2;
pub const DOWN: usize = 3;

#[derive(Clone, Debug, Default)]
pub struct NormalPyramid {
    pub levels: Vec<ImageF32>,
}

impl NormalPyramid {
    /// Successive half-resolution, re-normalized copies down to 1×1.
    pub fn build(normal_map: &ImageF32) -> Self {
        let plan = LevelPlan::mip_chain(normal_map.w, normal_map.h);
        let mut levels = Vec::with_capacity(plan.len());
        levels.push(normal_map.clone());
        for &(nw, nh) in plan.dims.iter().skip(1) {
            let mut next = resize_box_wrap(&levels[levels.len() - 1], nw, nh);
            next.for_each_pixel_mut(renormalize);
            levels.push(next);
        }
        Self { levels }
    }
}

fn renormalize(p: &mut [f32]) {
    let n = Vector3::new(p[0], p[1], p[2]);
    let n = n.try_normalize(1e-12).unwrap_or_else(Vector3::z);
    p[0] = n.x;
    p[1] = n.y;
    p[2] = n.z;
}

/// 4-channel neighbour similarity image for one normal level.
pub fn edge_weights(normals: &ImageF32) -> ImageF32 {
    let (w, h) = normals.dims();
    let mut out = ImageF32::new(w, h, 4);
    for y in 0..h {
        let (up, down) = wrap_neighbors(y, h);
        for x in 0..w {
            let (left, right) = wrap_neighbors(x, w);
            let n = normals.get_vec3(x, y);
            let px = out.pixel_mut(x, y);
            px[LEFT] = n.dot(&normals.get_vec3(left, y));
            px[RIGHT] = n.dot(&normals.get_vec3(right, y));
            px[UP] = n.dot(&normals.get_vec3(x, up));
            px[DOWN] = n.dot(&normals.get_vec3(x, down));
        }
    }
    out
}

/// Edge weights for every mip level, finest first.
#[derive(Clone, Debug, Default)]
pub struct EdgePyramid {
    pub levels: Vec<ImageF32>,
}

impl EdgePyramid {
    pub fn from_normals(normals: &NormalPyramid) -> Self {
        Self {
            levels: normals.levels.iter().map(edge_weights).collect(),
        }
    }

    /// All weights 1.0, matching the unweighted relaxation.
    pub fn uniform(w: usize, h: usize) -> Self {
        let plan = LevelPlan::mip_chain(w, h);
        Self {
            levels: plan
                .dims
                .iter()
                .map(|&(lw, lh)| ImageF32::filled(lw, lh, &[1.0; 4]))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
