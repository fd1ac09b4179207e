//! Analytic tileable surfaces and their normal maps.
//!
//! Heights are functions of UV coordinates `u = x / w`, `v = y / h`, periodic
//! on the unit square. Normals are `normalize(-dh/du, -dh/dv, 1)`, matching
//! the +X right, +Y down convention the solvers expect.
use nalgebra::Vector3;
use normal_to_height::ImageF32;
use std::f32::consts::TAU;

/// A surface given by its height and UV partial derivatives.
pub trait Surface {
    fn height(&self, u: f32, v: f32) -> f32;
    fn slope(&self, u: f32, v: f32) -> (f32, f32);
}

/// `a · (sin(2πu) + cos(2πv))`.
pub struct Sinusoid {
    pub amplitude: f32,
}

impl Surface for Sinusoid {
    fn height(&self, u: f32, v: f32) -> f32 {
        self.amplitude * ((TAU * u).sin() + (TAU * v).cos())
    }

    fn slope(&self, u: f32, v: f32) -> (f32, f32) {
        (
            self.amplitude * TAU * (TAU * u).cos(),
            -self.amplitude * TAU * (TAU * v).sin(),
        )
    }
}

/// Periodic bump `a · exp((cos 2πu + cos 2πv − 2) / s²)` centred at the origin.
pub struct Bump {
    pub amplitude: f32,
    pub width: f32,
}

impl Surface for Bump {
    fn height(&self, u: f32, v: f32) -> f32 {
        let s2 = self.width * self.width;
        self.amplitude * (((TAU * u).cos() + (TAU * v).cos() - 2.0) / s2).exp()
    }

    fn slope(&self, u: f32, v: f32) -> (f32, f32) {
        let s2 = self.width * self.width;
        let h = self.height(u, v);
        (
            -h * TAU * (TAU * u).sin() / s2,
            -h * TAU * (TAU * v).sin() / s2,
        )
    }
}

/// Ridge along `u = 0.5` with constant slope `±s` on each side.
pub struct Ridge {
    pub slope: f32,
}

impl Surface for Ridge {
    fn height(&self, u: f32, _v: f32) -> f32 {
        self.slope * (0.5 - (u - 0.5).abs())
    }

    fn slope(&self, u: f32, _v: f32) -> (f32, f32) {
        if u < 0.5 {
            (self.slope, 0.0)
        } else {
            (-self.slope, 0.0)
        }
    }
}

/// Unit normals of `surface` sampled at `(x / w, y / h)`.
pub fn normal_map(surface: &impl Surface, w: usize, h: usize) -> ImageF32 {
    let mut out = ImageF32::new(w, h, 3);
    for y in 0..h {
        for x in 0..w {
            let (hu, hv) = surface.slope(x as f32 / w as f32, y as f32 / h as f32);
            out.set_vec3(x, y, Vector3::new(-hu, -hv, 1.0).normalize());
        }
    }
    out
}

/// Heights of `surface` sampled at `(x + offset) / w`, `(y + offset) / h`.
pub fn height_field(surface: &impl Surface, w: usize, h: usize, offset: f32) -> ImageF32 {
    let mut out = ImageF32::new(w, h, 1);
    for y in 0..h {
        for x in 0..w {
            let u = (x as f32 + offset) / w as f32;
            let v = (y as f32 + offset) / h as f32;
            out.set(x, y, surface.height(u, v));
        }
    }
    out
}

pub fn flat_normals(w: usize, h: usize) -> ImageF32 {
    ImageF32::filled(w, h, &[0.0, 0.0, 1.0])
}
