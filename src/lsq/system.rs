//! Sparse assembly of the gradient-matching system.
//!
//! Unknown `i = r·W + c` is the height at row `r`, column `c`. Every pixel
//! contributes two rows, with wrapped neighbours:
//!
//! ```text
//! row 2i    : h(r,c) − h(r, c+1) = −dx(r,c)
//! row 2i+1  : h(r,c) − h(r+1, c) = −dy(r,c)
//! ```
//!
//! The `2WH × WH` matrix has rank `WH − 1`: adding a constant to every height
//! leaves all differences unchanged.
use crate::error::{Error, Result};
use crate::image::ImageF32;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Assembled least-squares problem `min |A·h − b|²`.
#[derive(Clone, Debug)]
pub struct GradientSystem {
    pub width: usize,
    pub height: usize,
    pub a: CsrMatrix<f64>,
    pub b: DVector<f64>,
}

impl GradientSystem {
    /// Build `A` and `b` from a 2-channel gradient field.
    pub fn assemble(gradient: &ImageF32) -> Result<Self> {
        let (w, h) = gradient.dims();
        if gradient.is_empty() {
            return Err(Error::InvalidDimensions {
                width: w,
                height: h,
            });
        }
        if gradient.channels != 2 {
            return Err(Error::ChannelMismatch {
                expected: 2,
                found: gradient.channels,
            });
        }

        let unknowns = w * h;
        let equations = 2 * unknowns;
        let mut rows = Vec::with_capacity(2 * equations);
        let mut cols = Vec::with_capacity(2 * equations);
        let mut vals = Vec::with_capacity(2 * equations);
        let mut b = DVector::zeros(equations);

        for r in 0..h {
            let down = (r + 1) % h;
            for c in 0..w {
                let right = (c + 1) % w;
                let i = r * w + c;
                let g = gradient.pixel(c, r);

                rows.extend_from_slice(&[2 * i, 2 * i]);
                cols.extend_from_slice(&[i, r * w + right]);
                vals.extend_from_slice(&[1.0, -1.0]);
                b[2 * i] = -(g[0] as f64);

                rows.extend_from_slice(&[2 * i + 1, 2 * i + 1]);
                cols.extend_from_slice(&[i, down * w + c]);
                vals.extend_from_slice(&[1.0, -1.0]);
                b[2 * i + 1] = -(g[1] as f64);
            }
        }

        let coo = CooMatrix::try_from_triplets(equations, unknowns, rows, cols, vals)
            .map_err(|e| Error::SolverSetup(e.to_string()))?;
        // Duplicate entries (degenerate 1-wide axes) are summed here.
        let a = CsrMatrix::from(&coo);
        Ok(Self {
            width: w,
            height: h,
            a,
            b,
        })
    }

    pub fn unknowns(&self) -> usize {
        self.a.ncols()
    }

    pub fn equations(&self) -> usize {
        self.a.nrows()
    }

    /// Flatten a single-channel height image into an unknown vector.
    pub fn heights_to_vector(&self, heights: &ImageF32) -> Result<DVector<f64>> {
        if heights.w != self.width || heights.h != self.height {
            return Err(Error::DimensionMismatch {
                left_w: self.width,
                left_h: self.height,
                right_w: heights.w,
                right_h: heights.h,
            });
        }
        if heights.channels != 1 {
            return Err(Error::ChannelMismatch {
                expected: 1,
                found: heights.channels,
            });
        }
        Ok(DVector::from_iterator(
            self.unknowns(),
            heights.data.iter().map(|&v| v as f64),
        ))
    }

    /// Reshape an unknown vector into a single-channel height image.
    pub fn vector_to_heights(&self, x: &DVector<f64>) -> ImageF32 {
        let mut out = ImageF32::new(self.width, self.height, 1);
        for (dst, &v) in out.data.iter_mut().zip(x.iter()) {
            *dst = v as f32;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_hold_one_forward_difference_each() {
        let grad = ImageF32::filled(3, 2, &[0.25, -0.5]);
        let sys = GradientSystem::assemble(&grad).unwrap();
        assert_eq!(sys.equations(), 12);
        assert_eq!(sys.unknowns(), 6);
        assert_eq!(sys.a.nnz(), 24);
        assert_eq!(sys.b[0], -0.25);
        assert_eq!(sys.b[1], 0.5);

        // Constant heights lie in the null space.
        let ones = DVector::from_element(6, 1.0);
        let ax = &sys.a * &ones;
        assert!(ax.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn wrapped_neighbours_close_the_torus() {
        let grad = ImageF32::new(3, 2, 2);
        let sys = GradientSystem::assemble(&grad).unwrap();
        // Pixel (r=1, c=2) = unknown 5: right wraps to column 0, down to row 0.
        let x = DVector::from_fn(6, |i, _| i as f64);
        let ax = &sys.a * &x;
        assert_eq!(ax[10], 5.0 - 3.0);
        assert_eq!(ax[11], 5.0 - 2.0);
    }

    #[test]
    fn rejects_height_field_of_wrong_size() {
        let sys = GradientSystem::assemble(&ImageF32::new(4, 4, 2)).unwrap();
        assert!(matches!(
            sys.heights_to_vector(&ImageF32::new(4, 3, 1)),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
