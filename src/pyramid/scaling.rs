//! Cross-level scaling helpers.
//!
//! Gradients are stored in normalized UV-slope units already divided by the
//! level size. A coarser texel spans more of the surface, so its per-texel
//! height step grows by the ratio of fine to coarse size on each axis.

/// Per-axis factors between a finer and a coarser pyramid level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelScaling {
    pub slope_x: f32,
    pub slope_y: f32,
}

impl LevelScaling {
    pub fn from_dimensions(
        fine_width: usize,
        fine_height: usize,
        coarse_width: usize,
        coarse_height: usize,
    ) -> Self {
        let slope_x = if coarse_width > 0 {
            fine_width as f32 / coarse_width as f32
        } else {
            1.0
        };
        let slope_y = if coarse_height > 0 {
            fine_height as f32 / coarse_height as f32
        } else {
            1.0
        };
        Self { slope_x, slope_y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_sizes_use_exact_ratio() {
        let s = LevelScaling::from_dimensions(5, 8, 2, 4);
        assert_eq!(s.slope_x, 2.5);
        assert_eq!(s.slope_y, 2.0);
    }
}
