//! Float image fields and the primitives the solvers need from them.
//!
//! - `ImageF32`: owned multi-channel row-major buffer.
//! - `wrap`: toroidal index arithmetic shared by every stencil in the crate.
//! - `resize`: box/bilinear resampling with wrap or clamp edges.
//! - `io`: decoding normal maps and encoding heights, normals and reports.
//! - `mosaic`: side-by-side comparison sheets.

pub mod f32;
pub mod io;
pub mod mosaic;
pub mod resize;

pub use self::f32::ImageF32;
pub use self::resize::{resize, resize_box_wrap, EdgeMode, ResizeFilter};

/// Wrap a possibly negative or overflowing index onto `0..n`.
#[inline]
pub fn wrap(i: isize, n: usize) -> usize {
    i.rem_euclid(n as isize) as usize
}

/// Wrapped neighbour indices `(prev, next)` of `i` on an axis of length `n`.
#[inline]
pub fn wrap_neighbors(i: usize, n: usize) -> (usize, usize) {
    let prev = if i == 0 { n - 1 } else { i - 1 };
    let next = if i + 1 == n { 0 } else { i + 1 };
    (prev, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_handles_both_directions() {
        assert_eq!(wrap(-1, 5), 4);
        assert_eq!(wrap(-7, 5), 3);
        assert_eq!(wrap(5, 5), 0);
        assert_eq!(wrap(6, 5), 1);
        assert_eq!(wrap_neighbors(0, 4), (3, 1));
        assert_eq!(wrap_neighbors(3, 4), (2, 0));
        assert_eq!(wrap_neighbors(0, 1), (0, 0));
    }
}
