//! Normal → slope conversion.
//!
//! Each unit normal `(nx, ny, nz)` (+X right, +Y down, +Z out) becomes the
//! surface slope `(-nx/nz, -ny/nz)`. Near-grazing normals contribute no
//! slope, large slopes are clamped to `MAX_SLOPE`, and the result is scaled
//! into normalized UV units by `(1/width, 1/height)` so it does not depend on
//! the image resolution.
use crate::error::{Error, Result};
use crate::image::ImageF32;
use nalgebra::{Vector2, Vector3};

/// Normals with `|z|` below this value yield a zero slope.
pub const MIN_NORMAL_Z: f32 = 0.001;
/// Upper bound on the slope magnitude derived from a single normal.
pub const MAX_SLOPE: f32 = 16.0;

/// Per-texel slope `(dh/dx, dh/dy)` of a tangent-space normal.
#[inline]
pub fn dxdy_from_normal(normal: &Vector3<f32>) -> Vector2<f32> {
    let mut dxdy = if normal.z.abs() >= MIN_NORMAL_Z {
        Vector2::new(-normal.x / normal.z, -normal.y / normal.z)
    } else {
        Vector2::zeros()
    };
    let slope = dxdy.norm();
    if slope > MAX_SLOPE {
        dxdy *= MAX_SLOPE / slope;
    }
    dxdy
}

/// Check that `normal_map` is a non-empty 3-channel field.
pub fn validate_normal_map(normal_map: &ImageF32) -> Result<()> {
    if normal_map.is_empty() {
        return Err(Error::InvalidDimensions {
            width: normal_map.w,
            height: normal_map.h,
        });
    }
    if normal_map.channels != 3 {
        return Err(Error::ChannelMismatch {
            expected: 3,
            found: normal_map.channels,
        });
    }
    Ok(())
}

/// Build the 2-channel gradient field of `normal_map`.
///
/// `slope_scale` exaggerates (>1) or flattens (<1) the reconstructed relief.
pub fn gradient_field(normal_map: &ImageF32, slope_scale: f32) -> Result<ImageF32> {
    validate_normal_map(normal_map)?;
    let (w, h) = normal_map.dims();
    let inv_size = Vector2::new(1.0 / w as f32, 1.0 / h as f32);
    let mut out = ImageF32::new(w, h, 2);
    for (src, dst) in normal_map
        .data
        .chunks_exact(3)
        .zip(out.data.chunks_exact_mut(2))
    {
        let n = Vector3::new(src[0], src[1], src[2]);
        let dxdy = (dxdy_from_normal(&n) * slope_scale).component_mul(&inv_size);
        dst[0] = dxdy.x;
        dst[1] = dxdy.y;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_normal_has_no_slope() {
        let d = dxdy_from_normal(&Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(d, Vector2::zeros());
    }

    #[test]
    fn tilted_normal_gives_negated_ratio() {
        let n = Vector3::new(-0.6, 0.0, 0.8);
        let d = dxdy_from_normal(&n);
        assert!((d.x - 0.75).abs() < 1e-6);
        assert_eq!(d.y, 0.0);
    }

    #[test]
    fn grazing_normal_contributes_nothing() {
        let d = dxdy_from_normal(&Vector3::new(1.0, 0.0, 0.0005));
        assert_eq!(d, Vector2::zeros());
        // Negative z with enough magnitude still counts.
        let d = dxdy_from_normal(&Vector3::new(0.0, 0.5, -0.5));
        assert!((d.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn steep_slopes_are_clamped() {
        let n = Vector3::new(-0.999, 0.0, 0.01).normalize();
        let d = dxdy_from_normal(&n);
        assert!((d.norm() - MAX_SLOPE).abs() < 1e-3);
        assert!(d.x > 0.0);
    }

    #[test]
    fn field_is_scaled_by_inverse_size() {
        let n = Vector3::new(-0.6f32, 0.0, 0.8);
        let mut img = ImageF32::new(4, 2, 3);
        for y in 0..2 {
            for x in 0..4 {
                img.set_vec3(x, y, n);
            }
        }
        let g = gradient_field(&img, 2.0).unwrap();
        assert_eq!(g.channels, 2);
        let d = g.get_vec2(3, 1);
        assert!((d.x - 0.75 * 2.0 / 4.0).abs() < 1e-6);
        assert_eq!(d.y, 0.0);
    }

    #[test]
    fn rejects_wrong_channel_count() {
        let img = ImageF32::new(4, 4, 2);
        assert!(matches!(
            gradient_field(&img, 1.0),
            Err(Error::ChannelMismatch { expected: 3, found: 2 })
        ));
    }
}
