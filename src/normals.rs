//! Height → normal estimation.
//!
//! All methods read a wrapped neighbourhood of raw heights, scale horizontal
//! differences by the field width and vertical ones by its height (heights
//! live in UV units), and normalize `(-dh/du, -dh/dv, 1)`.
//!
//! - `Cross`, `Forward`, `Sobel`, `Scharr`: 3×3 derivative kernels, each
//!   divided by its total weight so it yields a per-texel difference.
//! - `Improved`: per axis, the neighbour closer in height to the centre forms
//!   a triangle with it; the normal is that triangle's.
//! - `Accurate`: per axis, the side with the smaller second difference
//!   (5-wide taps) supplies a one-sided tangent; the normal is their cross
//!   product.
use crate::height::HeightMap;
use crate::image::{wrap, ImageF32};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

type Kernel3 = [[f32; 3]; 3];

const CROSS_KERNEL_X: Kernel3 = [[0.0, 0.0, 0.0], [-1.0, 0.0, 1.0], [0.0, 0.0, 0.0]];
const CROSS_KERNEL_Y: Kernel3 = [[0.0, -1.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

const FORWARD_KERNEL_X: Kernel3 = [[0.0, 0.0, 0.0], [0.0, -1.0, 1.0], [0.0, 0.0, 0.0]];
const FORWARD_KERNEL_Y: Kernel3 = [[0.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 1.0, 0.0]];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

const SCHARR_KERNEL_X: Kernel3 = [[-3.0, 0.0, 3.0], [-10.0, 0.0, 10.0], [-3.0, 0.0, 3.0]];
const SCHARR_KERNEL_Y: Kernel3 = [[-3.0, -10.0, -3.0], [0.0, 0.0, 0.0], [3.0, 10.0, 3.0]];

/// Finite-difference scheme used to turn heights back into normals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalMethod {
    Cross,
    Forward,
    Sobel,
    Scharr,
    Improved,
    #[default]
    Accurate,
}

impl NormalMethod {
    pub const ALL: [NormalMethod; 6] = [
        NormalMethod::Cross,
        NormalMethod::Forward,
        NormalMethod::Sobel,
        NormalMethod::Scharr,
        NormalMethod::Improved,
        NormalMethod::Accurate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NormalMethod::Cross => "cross",
            NormalMethod::Forward => "forward",
            NormalMethod::Sobel => "sobel",
            NormalMethod::Scharr => "scharr",
            NormalMethod::Improved => "improved",
            NormalMethod::Accurate => "accurate",
        }
    }

    /// Kernel pair and its normalizing weight, for the kernel-based methods.
    fn kernels(self) -> Option<(&'static Kernel3, &'static Kernel3, f32)> {
        match self {
            NormalMethod::Cross => Some((&CROSS_KERNEL_X, &CROSS_KERNEL_Y, 2.0)),
            NormalMethod::Forward => Some((&FORWARD_KERNEL_X, &FORWARD_KERNEL_Y, 1.0)),
            NormalMethod::Sobel => Some((&SOBEL_KERNEL_X, &SOBEL_KERNEL_Y, 8.0)),
            NormalMethod::Scharr => Some((&SCHARR_KERNEL_X, &SCHARR_KERNEL_Y, 32.0)),
            NormalMethod::Improved | NormalMethod::Accurate => None,
        }
    }
}

impl fmt::Display for NormalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw heights with wrapped lookup.
struct Heights<'a> {
    data: &'a [f32],
    w: usize,
    h: usize,
}

impl Heights<'_> {
    #[inline]
    fn at(&self, x: usize, y: usize, dx: isize, dy: isize) -> f32 {
        let xx = wrap(x as isize + dx, self.w);
        let yy = wrap(y as isize + dy, self.h);
        self.data[yy * self.w + xx]
    }

    fn neighborhood(&self, x: usize, y: usize) -> [[f32; 3]; 3] {
        let mut n = [[0.0; 3]; 3];
        for (ky, row) in n.iter_mut().enumerate() {
            for (kx, v) in row.iter_mut().enumerate() {
                *v = self.at(x, y, kx as isize - 1, ky as isize - 1);
            }
        }
        n
    }
}

#[inline]
fn apply_kernel(n: &[[f32; 3]; 3], k: &Kernel3) -> f32 {
    let mut sum = 0.0;
    for (n_row, k_row) in n.iter().zip(k.iter()) {
        sum += n_row[0] * k_row[0] + n_row[1] * k_row[1] + n_row[2] * k_row[2];
    }
    sum
}

fn improved_normal(hs: &Heights, x: usize, y: usize, scale_h: f32, scale_v: f32) -> Vector3<f32> {
    let mm = hs.at(x, y, 0, 0);
    let ml = hs.at(x, y, -1, 0);
    let mr = hs.at(x, y, 1, 0);
    let um = hs.at(x, y, 0, -1);
    let dm = hs.at(x, y, 0, 1);

    let use_right = (mr - mm).abs() < (ml - mm).abs();
    let use_down = (dm - mm).abs() < (um - mm).abs();
    let right = Vector3::new(1.0 / scale_h, 0.0, mr - mm);
    let left = Vector3::new(-1.0 / scale_h, 0.0, ml - mm);
    let up = Vector3::new(0.0, -1.0 / scale_v, um - mm);
    let down = Vector3::new(0.0, 1.0 / scale_v, dm - mm);

    // Edge pairs ordered so every triangle winds towards +Z.
    match (use_right, use_down) {
        (true, false) => up.cross(&right),
        (true, true) => right.cross(&down),
        (false, false) => left.cross(&up),
        (false, true) => down.cross(&left),
    }
}

fn accurate_normal(hs: &Heights, x: usize, y: usize, scale_h: f32, scale_v: f32) -> Vector3<f32> {
    let mm = hs.at(x, y, 0, 0);

    let ml = hs.at(x, y, -1, 0);
    let ml2 = hs.at(x, y, -2, 0);
    let mr = hs.at(x, y, 1, 0);
    let mr2 = hs.at(x, y, 2, 0);
    let d_left = (2.0 * ml - ml2 - mm).abs();
    let d_right = (2.0 * mr - mr2 - mm).abs();
    let dpdx = if d_left < d_right {
        Vector3::new(1.0 / scale_h, 0.0, mm - ml)
    } else {
        Vector3::new(1.0 / scale_h, 0.0, mr - mm)
    };

    let um = hs.at(x, y, 0, -1);
    let um2 = hs.at(x, y, 0, -2);
    let dm = hs.at(x, y, 0, 1);
    let dm2 = hs.at(x, y, 0, 2);
    let d_up = (2.0 * um - um2 - mm).abs();
    let d_down = (2.0 * dm - dm2 - mm).abs();
    let dpdy = if d_up < d_down {
        Vector3::new(0.0, 1.0 / scale_v, mm - um)
    } else {
        Vector3::new(0.0, 1.0 / scale_v, dm - mm)
    };

    dpdx.cross(&dpdy)
}

/// Estimate a 3-channel unit normal map from `height_map` (packed or raw).
pub fn estimate_normal_map(height_map: &HeightMap, method: NormalMethod) -> ImageF32 {
    let raw = height_map.raw_image();
    let (w, h) = raw.dims();
    let mut out = ImageF32::new(w, h, 3);
    if raw.is_empty() {
        return out;
    }
    let hs = Heights {
        data: &raw.data,
        w,
        h,
    };
    let scale_h = w as f32;
    let scale_v = h as f32;

    for y in 0..h {
        for x in 0..w {
            let n = match method.kernels() {
                Some((kx, ky, weight)) => {
                    let nb = hs.neighborhood(x, y);
                    let gx = apply_kernel(&nb, kx) / weight;
                    let gy = apply_kernel(&nb, ky) / weight;
                    Vector3::new(-scale_h * gx, -scale_v * gy, 1.0)
                }
                None if method == NormalMethod::Improved => {
                    improved_normal(&hs, x, y, scale_h, scale_v)
                }
                None => accurate_normal(&hs, x, y, scale_h, scale_v),
            };
            out.set_vec3(x, y, n.try_normalize(0.0).unwrap_or_else(Vector3::z));
        }
    }
    out
}

/// Apply display flips and map unit normals from [-1, 1] to [0, 1].
pub fn pack_normal_map(normals: &mut ImageF32, flip_y: bool, flip_x: bool) {
    normals.for_each_pixel_mut(|p| {
        if flip_y {
            p[1] = -p[1];
        }
        if flip_x {
            p[0] = -p[0];
        }
        for c in p.iter_mut().take(3) {
            *c = 0.5 * (*c + 1.0);
        }
    });
}
