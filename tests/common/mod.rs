#![allow(dead_code)]

pub mod synthetic;

use normal_to_height::ImageF32;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn mean(data: &[f32]) -> f64 {
    data.iter().map(|&v| v as f64).sum::<f64>() / data.len().max(1) as f64
}

/// RMS difference of two single-channel fields after removing each mean.
pub fn rms_without_mean(a: &ImageF32, b: &ImageF32) -> f64 {
    assert_eq!(a.dims(), b.dims(), "field sizes differ");
    let (ma, mb) = (mean(&a.data), mean(&b.data));
    let sum: f64 = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(&x, &y)| {
            let d = (x as f64 - ma) - (y as f64 - mb);
            d * d
        })
        .sum();
    (sum / a.data.len() as f64).sqrt()
}

/// Largest absolute deviation from the field's first value.
pub fn spread(field: &ImageF32) -> f32 {
    let first = field.data.first().copied().unwrap_or(0.0);
    field
        .data
        .iter()
        .map(|&v| (v - first).abs())
        .fold(0.0, f32::max)
}

/// `max - min` over every value.
pub fn peak_to_peak(field: &ImageF32) -> f32 {
    let (lo, hi) = field
        .data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    hi - lo
}
