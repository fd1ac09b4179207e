//! Separable per-channel image resize used for pyramid down/upsampling.
//!
//! - `Box` computes the exact area average of the source texels covered by
//!   each destination texel. Footprints never leave the source extent, so the
//!   edge mode has no effect on box resizes.
//! - `Bilinear` interpolates between the two nearest texel centres on each
//!   axis; samples outside the image wrap or clamp according to `EdgeMode`.
//!
//! Both filters run a horizontal pass into a temporary buffer followed by a
//! vertical pass, with per-axis contributor tables computed once.
use super::{wrap, ImageF32};
use serde::{Deserialize, Serialize};

/// How samples outside the image are addressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMode {
    /// Toroidal addressing, used for tileable fields.
    #[default]
    Wrap,
    /// Replicate the border texel.
    Clamp,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    #[default]
    Box,
    Bilinear,
}

/// Source taps and weights for one destination index.
type Contributors = Vec<Vec<(usize, f32)>>;

fn box_contributors(src: usize, dst: usize) -> Contributors {
    let ratio = src as f64 / dst as f64;
    (0..dst)
        .map(|i| {
            let start = i as f64 * ratio;
            let end = (i + 1) as f64 * ratio;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src);
            let mut taps = Vec::with_capacity(last.saturating_sub(first));
            for s in first..last {
                let lo = start.max(s as f64);
                let hi = end.min((s + 1) as f64);
                if hi > lo {
                    taps.push((s, ((hi - lo) / ratio) as f32));
                }
            }
            taps
        })
        .collect()
}

fn bilinear_contributors(src: usize, dst: usize, edge: EdgeMode) -> Contributors {
    let ratio = src as f32 / dst as f32;
    (0..dst)
        .map(|i| {
            let center = (i as f32 + 0.5) * ratio - 0.5;
            let base = center.floor();
            let t = center - base;
            let i0 = base as isize;
            let (s0, s1) = match edge {
                EdgeMode::Wrap => (wrap(i0, src), wrap(i0 + 1, src)),
                EdgeMode::Clamp => {
                    let max = src as isize - 1;
                    (i0.clamp(0, max) as usize, (i0 + 1).clamp(0, max) as usize)
                }
            };
            vec![(s0, 1.0 - t), (s1, t)]
        })
        .collect()
}

fn contributors(src: usize, dst: usize, filter: ResizeFilter, edge: EdgeMode) -> Contributors {
    match filter {
        ResizeFilter::Box => box_contributors(src, dst),
        ResizeFilter::Bilinear => bilinear_contributors(src, dst, edge),
    }
}

/// Resize `src` to `new_w × new_h`, filtering every channel independently.
///
/// Returns a clone when the size is unchanged and an empty image when either
/// side of the source or destination is zero.
pub fn resize(
    src: &ImageF32,
    new_w: usize,
    new_h: usize,
    filter: ResizeFilter,
    edge: EdgeMode,
) -> ImageF32 {
    if src.w == new_w && src.h == new_h {
        return src.clone();
    }
    let channels = src.channels;
    if src.is_empty() || new_w == 0 || new_h == 0 {
        return ImageF32::new(new_w, new_h, channels);
    }

    let cols = contributors(src.w, new_w, filter, edge);
    let rows = contributors(src.h, new_h, filter, edge);

    // horizontal
    let mut tmp = ImageF32::new(new_w, src.h, channels);
    for y in 0..src.h {
        let src_row = src.row(y);
        let dst_row = tmp.row_mut(y);
        for (x, taps) in cols.iter().enumerate() {
            let out = &mut dst_row[x * channels..(x + 1) * channels];
            for &(sx, weight) in taps {
                let px = &src_row[sx * channels..(sx + 1) * channels];
                for (o, &v) in out.iter_mut().zip(px) {
                    *o += weight * v;
                }
            }
        }
    }

    // vertical
    let mut out = ImageF32::new(new_w, new_h, channels);
    for (y, taps) in rows.iter().enumerate() {
        let dst_row = out.row_mut(y);
        for &(sy, weight) in taps {
            for (o, &v) in dst_row.iter_mut().zip(tmp.row(sy)) {
                *o += weight * v;
            }
        }
    }
    out
}

/// Box downsample/upsample with toroidal addressing, as used by the solvers.
pub fn resize_box_wrap(src: &ImageF32, new_w: usize, new_h: usize) -> ImageF32 {
    resize(src, new_w, new_h, ResizeFilter::Box, EdgeMode::Wrap)
}
