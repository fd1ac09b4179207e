//! Similarity scores between normal maps and generic float images.
//!
//! Normal maps are compared through the per-pixel dot product. The error
//! `1 − dot` lies in [0, 2], hence the peak value of 2 used for PSNR.
use crate::error::{Error, Result};
use crate::image::ImageF32;
use serde::{Deserialize, Serialize};

/// Peak value of the dot-product error between unit normals.
pub const NORMAL_PSNR_PEAK: f64 = 2.0;

/// Per-pixel encoding of a difference image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    /// `(1 − dot) / 2`, 0 for identical and 1 for opposite normals.
    #[default]
    HalfAngle,
    /// `1 − max(0, dot)`, saturating at 1 for perpendicular or worse.
    Clamped,
}

/// MSE and PSNR of one normal-map comparison.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalComparison {
    pub mse: f64,
    pub psnr: f64,
}

fn check_same_size(a: &ImageF32, b: &ImageF32) -> Result<()> {
    if !a.same_dims(b) {
        return Err(Error::DimensionMismatch {
            left_w: a.w,
            left_h: a.h,
            right_w: b.w,
            right_h: b.h,
        });
    }
    Ok(())
}

fn check_normals(a: &ImageF32, b: &ImageF32) -> Result<()> {
    check_same_size(a, b)?;
    for img in [a, b] {
        if img.channels != 3 {
            return Err(Error::ChannelMismatch {
                expected: 3,
                found: img.channels,
            });
        }
    }
    if a.is_empty() {
        return Err(Error::InvalidDimensions {
            width: a.w,
            height: a.h,
        });
    }
    Ok(())
}

#[inline]
fn dots<'a>(a: &'a ImageF32, b: &'a ImageF32) -> impl Iterator<Item = f32> + 'a {
    a.data
        .chunks_exact(3)
        .zip(b.data.chunks_exact(3))
        .map(|(p, q)| p[0] * q[0] + p[1] * q[1] + p[2] * q[2])
}

/// Mean over pixels of `(1 − dot(n1, n2))²`.
pub fn normal_map_mse(a: &ImageF32, b: &ImageF32) -> Result<f64> {
    check_normals(a, b)?;
    let sum: f64 = dots(a, b)
        .map(|d| {
            let e = 1.0 - d as f64;
            e * e
        })
        .sum();
    Ok(sum / a.pixel_count() as f64)
}

/// `10·log10(peak² / mse)`; `+∞` for a perfect match.
pub fn mse_to_psnr(mse: f64, peak: f64) -> f64 {
    if mse <= 0.0 {
        return f64::INFINITY;
    }
    10.0 * (peak * peak / mse).log10()
}

/// Dot-based MSE and PSNR between two unit normal maps.
pub fn compare_normal_maps(a: &ImageF32, b: &ImageF32) -> Result<NormalComparison> {
    let mse = normal_map_mse(a, b)?;
    Ok(NormalComparison {
        mse,
        psnr: mse_to_psnr(mse, NORMAL_PSNR_PEAK),
    })
}

/// Mean squared difference over every pixel and channel.
pub fn image_mse(a: &ImageF32, b: &ImageF32) -> Result<f64> {
    check_same_size(a, b)?;
    if a.channels != b.channels {
        return Err(Error::ChannelMismatch {
            expected: a.channels,
            found: b.channels,
        });
    }
    if a.data.is_empty() {
        return Err(Error::InvalidDimensions {
            width: a.w,
            height: a.h,
        });
    }
    let sum: f64 = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(&x, &y)| {
            let d = (x - y) as f64;
            d * d
        })
        .sum();
    Ok(sum / a.data.len() as f64)
}

/// 3-channel gray difference image between two normal maps.
pub fn diff_normal_maps(a: &ImageF32, b: &ImageF32, mode: DiffMode) -> Result<ImageF32> {
    check_normals(a, b)?;
    let mut out = ImageF32::new(a.w, a.h, 3);
    for (px, d) in out.data.chunks_exact_mut(3).zip(dots(a, b)) {
        let v = match mode {
            DiffMode::HalfAngle => (1.0 - d) / 2.0,
            DiffMode::Clamped => 1.0 - d.max(0.0),
        };
        px.fill(v);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn uniform(w: usize, h: usize, n: Vector3<f32>) -> ImageF32 {
        ImageF32::filled(w, h, &[n.x, n.y, n.z])
    }

    #[test]
    fn identical_maps_have_zero_mse_and_infinite_psnr() {
        let a = uniform(4, 3, Vector3::new(0.0, 0.6, 0.8));
        let cmp = compare_normal_maps(&a, &a).unwrap();
        assert!(cmp.mse.abs() < 1e-12);
        assert!(cmp.psnr.is_infinite() || cmp.psnr > 100.0);
        assert_eq!(mse_to_psnr(0.0, 2.0), f64::INFINITY);
    }

    #[test]
    fn opposite_normals_hit_the_peak_error() {
        let a = uniform(2, 2, Vector3::z());
        let b = uniform(2, 2, -Vector3::z());
        let mse = normal_map_mse(&a, &b).unwrap();
        assert!((mse - 4.0).abs() < 1e-9);
        assert!(mse_to_psnr(mse, NORMAL_PSNR_PEAK).abs() < 1e-9);
    }

    #[test]
    fn psnr_drops_as_error_grows() {
        assert!(mse_to_psnr(0.01, 2.0) > mse_to_psnr(0.1, 2.0));
        assert!((mse_to_psnr(0.04, 2.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn diff_modes_encode_dot_product() {
        let a = uniform(1, 1, Vector3::z());
        let b = uniform(1, 1, -Vector3::z());
        let half = diff_normal_maps(&a, &b, DiffMode::HalfAngle).unwrap();
        assert_eq!(half.data, vec![1.0; 3]);
        let c = uniform(1, 1, Vector3::x());
        let clamped = diff_normal_maps(&a, &c, DiffMode::Clamped).unwrap();
        assert_eq!(clamped.data, vec![1.0; 3]);
        let half = diff_normal_maps(&a, &c, DiffMode::HalfAngle).unwrap();
        assert_eq!(half.data, vec![0.5; 3]);
    }

    #[test]
    fn image_mse_averages_all_channels() {
        let a = ImageF32::filled(2, 1, &[0.0, 1.0]);
        let b = ImageF32::filled(2, 1, &[1.0, 1.0]);
        assert!((image_mse(&a, &b).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn mismatched_sizes_are_rejected() {
        let a = uniform(4, 4, Vector3::z());
        let b = uniform(4, 5, Vector3::z());
        assert!(matches!(
            compare_normal_maps(&a, &b),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(diff_normal_maps(&a, &b, DiffMode::Clamped).is_err());
        assert!(image_mse(&a, &b).is_err());
    }
}
