//! Owned multi-channel f32 image in row-major, pixel-interleaved layout.
//!
//! Every field in the pipeline (normals, gradients, heights, edge weights)
//! is an `ImageF32` with a fixed channel count. Rows are contiguous, so a
//! row slice holds `w * channels` values.
use nalgebra::{Vector2, Vector3};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of f32 values per pixel
    pub channels: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h × channels`.
    pub fn new(w: usize, h: usize, channels: usize) -> Self {
        Self {
            w,
            h,
            channels,
            data: vec![0.0; w * h * channels],
        }
    }

    /// Construct a buffer where every pixel equals `pixel`.
    pub fn filled(w: usize, h: usize, pixel: &[f32]) -> Self {
        let channels = pixel.len();
        let mut data = Vec::with_capacity(w * h * channels);
        for _ in 0..w * h {
            data.extend_from_slice(pixel);
        }
        Self {
            w,
            h,
            channels,
            data,
        }
    }

    /// Wrap existing storage. Returns `None` when the length does not match.
    pub fn from_raw(w: usize, h: usize, channels: usize, data: Vec<f32>) -> Option<Self> {
        (data.len() == w * h * channels).then_some(Self {
            w,
            h,
            channels,
            data,
        })
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.w * self.h
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    #[inline]
    /// Convert (x, y) to the linear index of the pixel's first channel.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        (y * self.w + x) * self.channels
    }

    #[inline]
    /// First channel at (x, y).
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    /// Set the first channel at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let i = self.idx(x, y);
        &self.data[i..i + self.channels]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [f32] {
        let i = self.idx(x, y);
        let c = self.channels;
        &mut self.data[i..i + c]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, px: &[f32]) {
        self.pixel_mut(x, y).copy_from_slice(px);
    }

    #[inline]
    pub fn get_vec2(&self, x: usize, y: usize) -> Vector2<f32> {
        let p = self.pixel(x, y);
        Vector2::new(p[0], p[1])
    }

    #[inline]
    pub fn get_vec3(&self, x: usize, y: usize) -> Vector3<f32> {
        let p = self.pixel(x, y);
        Vector3::new(p[0], p[1], p[2])
    }

    #[inline]
    pub fn set_vec3(&mut self, x: usize, y: usize, v: Vector3<f32>) {
        let p = self.pixel_mut(x, y);
        p[0] = v.x;
        p[1] = v.y;
        p[2] = v.z;
    }

    #[inline]
    /// All channels of row `y`.
    pub fn row(&self, y: usize) -> &[f32] {
        let stride = self.w * self.channels;
        let start = y * stride;
        &self.data[start..start + stride]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let stride = self.w * self.channels;
        let start = y * stride;
        &mut self.data[start..start + stride]
    }

    /// Apply `f` to every pixel in place.
    pub fn for_each_pixel_mut<F: FnMut(&mut [f32])>(&mut self, mut f: F) {
        if self.channels == 0 {
            return;
        }
        for px in self.data.chunks_mut(self.channels) {
            f(px);
        }
    }

    pub fn same_dims(&self, other: &ImageF32) -> bool {
        self.w == other.w && self.h == other.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_access_is_interleaved() {
        let mut img = ImageF32::new(3, 2, 2);
        img.set_pixel(2, 1, &[4.0, 5.0]);
        assert_eq!(img.idx(2, 1), 10);
        assert_eq!(img.data[10], 4.0);
        assert_eq!(img.data[11], 5.0);
        assert_eq!(img.get_vec2(2, 1), Vector2::new(4.0, 5.0));
        assert_eq!(img.row(1).len(), 6);
    }

    #[test]
    fn from_raw_rejects_wrong_length() {
        assert!(ImageF32::from_raw(2, 2, 3, vec![0.0; 11]).is_none());
        assert!(ImageF32::from_raw(2, 2, 3, vec![0.0; 12]).is_some());
    }
}
