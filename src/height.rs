//! Height field with a linear scale/bias for lossless [0, 1] packing.
//!
//! `raw = packed * scale + bias`. A constant field packs with `scale = 1`
//! so the inverse never divides by zero; a stored `scale` of zero is read as
//! one for the same reason.
use crate::image::ImageF32;

#[derive(Clone, Debug, PartialEq)]
pub struct HeightMap {
    /// Single-channel heights, raw or packed depending on `scale`/`bias`.
    pub map: ImageF32,
    pub min_h: f32,
    pub max_h: f32,
    pub scale: f32,
    pub bias: f32,
}

impl HeightMap {
    /// Wrap a raw single-channel field and compute its range.
    pub fn from_raw(map: ImageF32) -> Self {
        debug_assert_eq!(map.channels, 1, "height maps are single-channel");
        let mut out = Self {
            map,
            min_h: 0.0,
            max_h: 0.0,
            scale: 1.0,
            bias: 0.0,
        };
        out.calc_min_max();
        out
    }

    pub fn width(&self) -> usize {
        self.map.w
    }

    pub fn height(&self) -> usize {
        self.map.h
    }

    /// Update `min_h`/`max_h` from the stored values.
    pub fn calc_min_max(&mut self) {
        let mut min_h = f32::MAX;
        let mut max_h = f32::MIN;
        for &h in &self.map.data {
            min_h = min_h.min(h);
            max_h = max_h.max(h);
        }
        if self.map.data.is_empty() {
            min_h = 0.0;
            max_h = 0.0;
        }
        self.min_h = min_h;
        self.max_h = max_h;
    }

    /// Extent of the stored values.
    pub fn range(&self) -> f32 {
        self.max_h - self.min_h
    }

    #[inline]
    fn effective_scale(&self) -> f32 {
        if self.scale == 0.0 {
            1.0
        } else {
            self.scale
        }
    }

    /// Rewrite the field into [0, 1] and remember how to undo it.
    ///
    /// Expects raw values (`scale == 1`, `bias == 0`); packing an already
    /// packed map first restores the raw values.
    pub fn pack_0_to_1(&mut self) {
        if self.scale != 1.0 || self.bias != 0.0 {
            self.unpack_0_to_1();
        }
        self.calc_min_max();
        let range = self.range();
        self.scale = if range > 0.0 { range } else { 1.0 };
        self.bias = self.min_h;
        let inv_scale = 1.0 / self.scale;
        let bias = self.bias;
        for h in &mut self.map.data {
            *h = (*h - bias) * inv_scale;
        }
    }

    /// Restore raw values and reset to `scale = 1`, `bias = 0`.
    pub fn unpack_0_to_1(&mut self) {
        let scale = self.effective_scale();
        let bias = self.bias;
        for h in &mut self.map.data {
            *h = *h * scale + bias;
        }
        self.scale = 1.0;
        self.bias = 0.0;
        self.calc_min_max();
    }

    /// Raw height at a linear pixel index, whatever the packing state.
    #[inline]
    pub fn get_h_index(&self, index: usize) -> f32 {
        self.map.data[index] * self.effective_scale() + self.bias
    }

    /// Raw height at (x, y).
    #[inline]
    pub fn get_h(&self, x: usize, y: usize) -> f32 {
        self.get_h_index(y * self.map.w + x)
    }

    /// Copy of the raw heights as a single-channel image.
    pub fn raw_image(&self) -> ImageF32 {
        let mut out = self.map.clone();
        let scale = self.effective_scale();
        for h in &mut out.data {
            *h = *h * scale + self.bias;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HeightMap {
        let data = vec![-2.0, 0.5, 3.0, 1.25, -0.75, 2.0];
        HeightMap::from_raw(ImageF32::from_raw(3, 2, 1, data).unwrap())
    }

    #[test]
    fn pack_maps_into_unit_range() {
        let mut hm = sample();
        hm.pack_0_to_1();
        assert!((hm.scale - 5.0).abs() < 1e-6);
        assert!((hm.bias + 2.0).abs() < 1e-6);
        let min = hm.map.data.iter().cloned().fold(f32::MAX, f32::min);
        let max = hm.map.data.iter().cloned().fold(f32::MIN, f32::max);
        assert!(min.abs() < 1e-6);
        assert!((max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pack_then_unpack_round_trips() {
        let original = sample();
        let mut hm = original.clone();
        hm.pack_0_to_1();
        for i in 0..6 {
            assert!((hm.get_h_index(i) - original.map.data[i]).abs() < 1e-5);
        }
        hm.unpack_0_to_1();
        assert_eq!(hm.scale, 1.0);
        assert_eq!(hm.bias, 0.0);
        for (a, b) in hm.map.data.iter().zip(&original.map.data) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn constant_field_packs_without_dividing_by_zero() {
        let mut hm = HeightMap::from_raw(ImageF32::filled(4, 4, &[0.3]));
        hm.pack_0_to_1();
        assert_eq!(hm.scale, 1.0);
        assert!(hm.map.data.iter().all(|&h| h == 0.0));
        assert!((hm.get_h(2, 2) - 0.3).abs() < 1e-7);
    }

    #[test]
    fn zero_scale_reads_as_unit_scale() {
        let mut hm = HeightMap::from_raw(ImageF32::filled(2, 2, &[0.5]));
        hm.scale = 0.0;
        hm.bias = 1.0;
        assert!((hm.get_h(0, 0) - 1.5).abs() < 1e-7);
    }
}
