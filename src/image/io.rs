//! File I/O for normal maps, height maps and JSON reports.
//!
//! - `load_normal_map`: decode an 8-bit, 16-bit or float RGB(A) image into
//!   unit normals (+X right, +Y down, +Z out), applying optional flips.
//! - `save_height_map`: write heights packed into [0, 1] as 8- or 16-bit gray.
//! - `save_normal_map`: flip, pack into [0, 1] and write as 8-bit RGB.
//! - `save_rgb_f32`: write a 3-channel [0, 1] image as 8-bit RGB.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::ImageF32;
use crate::error::{Error, Result};
use crate::height::HeightMap;
use crate::normals::pack_normal_map;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, RgbImage};
use log::debug;
use nalgebra::Vector3;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[inline]
fn unpack_u8(v: u8) -> f32 {
    (v as f32 - 128.0) / 127.0
}

#[inline]
fn unpack_u16(v: u16) -> f32 {
    (v as f32 - 32768.0) / 32767.0
}

#[inline]
fn unpack_f32(v: f32) -> f32 {
    2.0 * v - 1.0
}

fn decode_channels<T: Copy>(
    w: usize,
    h: usize,
    raw: &[T],
    stride: usize,
    unpack: impl Fn(T) -> f32,
    flip_y: bool,
    flip_x: bool,
) -> ImageF32 {
    let mut out = ImageF32::new(w, h, 3);
    for (dst, src) in out.data.chunks_exact_mut(3).zip(raw.chunks_exact(stride)) {
        let n = Vector3::new(unpack(src[0]), unpack(src[1]), unpack(src[2]));
        let mut n = n.try_normalize(0.0).unwrap_or_else(Vector3::z);
        if flip_y {
            n.y = -n.y;
        }
        if flip_x {
            n.x = -n.x;
        }
        dst.copy_from_slice(n.as_slice());
    }
    out
}

/// Decode an in-memory image into unit normals.
pub fn decode_normal_map(img: &DynamicImage, flip_y: bool, flip_x: bool) -> Result<ImageF32> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    if w == 0 || h == 0 {
        return Err(Error::InvalidDimensions {
            width: w,
            height: h,
        });
    }
    let out = match img {
        DynamicImage::ImageRgb32F(buf) => {
            decode_channels(w, h, buf.as_raw(), 3, unpack_f32, flip_y, flip_x)
        }
        DynamicImage::ImageRgba32F(buf) => {
            decode_channels(w, h, buf.as_raw(), 4, unpack_f32, flip_y, flip_x)
        }
        DynamicImage::ImageRgb16(buf) => {
            decode_channels(w, h, buf.as_raw(), 3, unpack_u16, flip_y, flip_x)
        }
        DynamicImage::ImageRgba16(buf) => {
            decode_channels(w, h, buf.as_raw(), 4, unpack_u16, flip_y, flip_x)
        }
        DynamicImage::ImageRgb8(buf) => {
            decode_channels(w, h, buf.as_raw(), 3, unpack_u8, flip_y, flip_x)
        }
        DynamicImage::ImageRgba8(buf) => {
            decode_channels(w, h, buf.as_raw(), 4, unpack_u8, flip_y, flip_x)
        }
        DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => {
            let buf = img.to_rgb16();
            decode_channels(w, h, buf.as_raw(), 3, unpack_u16, flip_y, flip_x)
        }
        _ => {
            let buf = img.to_rgb8();
            decode_channels(w, h, buf.as_raw(), 3, unpack_u8, flip_y, flip_x)
        }
    };
    Ok(out)
}

/// Load a normal map from disk.
pub fn load_normal_map(path: &Path, flip_y: bool, flip_x: bool) -> Result<ImageF32> {
    let img = image::open(path)?;
    debug!(
        "loaded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );
    decode_normal_map(&img, flip_y, flip_x)
}

/// Write a height map as grayscale with 8 or 16 bits per texel.
pub fn save_height_map(height_map: &HeightMap, path: &Path, bit_depth: u8) -> Result<()> {
    let mut packed = HeightMap::from_raw(height_map.raw_image());
    packed.pack_0_to_1();
    let (w, h) = (packed.width() as u32, packed.height() as u32);
    let bad_size = || Error::InvalidDimensions {
        width: w as usize,
        height: h as usize,
    };

    ensure_parent_dir(path)?;
    match bit_depth {
        8 => {
            let data = packed
                .map
                .data
                .iter()
                .map(|&v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
                .collect();
            let out: ImageBuffer<Luma<u8>, Vec<u8>> =
                ImageBuffer::from_raw(w, h, data).ok_or_else(bad_size)?;
            out.save(path)?;
        }
        16 => {
            let data = packed
                .map
                .data
                .iter()
                .map(|&v| (v * 65535.0).round().clamp(0.0, 65535.0) as u16)
                .collect();
            let out: ImageBuffer<Luma<u16>, Vec<u16>> =
                ImageBuffer::from_raw(w, h, data).ok_or_else(bad_size)?;
            out.save(path)?;
        }
        other => {
            return Err(Error::Config(format!(
                "unsupported height bit depth {other} (expected 8 or 16)"
            )))
        }
    }
    Ok(())
}

/// Save a 3-channel float image in [0, 1] as 8-bit RGB.
pub fn save_rgb_f32(image: &ImageF32, path: &Path) -> Result<()> {
    if image.channels != 3 {
        return Err(Error::ChannelMismatch {
            expected: 3,
            found: image.channels,
        });
    }
    ensure_parent_dir(path)?;
    let mut out = RgbImage::new(image.w as u32, image.h as u32);
    for (dst, src) in out.pixels_mut().zip(image.data.chunks_exact(3)) {
        let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        *dst = Rgb([to_u8(src[0]), to_u8(src[1]), to_u8(src[2])]);
    }
    out.save(path)?;
    Ok(())
}

/// Pack unit normals for display and save them as 8-bit RGB.
pub fn save_normal_map(normals: &ImageF32, path: &Path, flip_y: bool, flip_x: bool) -> Result<()> {
    let mut packed = normals.clone();
    pack_normal_map(&mut packed, flip_y, flip_x);
    save_rgb_f32(&packed, path)
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
