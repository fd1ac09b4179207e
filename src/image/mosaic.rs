//! Side-by-side comparison sheets.
//!
//! Tiles are laid out row by row and separated (not surrounded) by a solid
//! border. Every tile must have the same size; single-channel tiles are
//! expanded to gray RGB.
use super::ImageF32;
use crate::error::{Error, Result};

pub const SHEET_BORDER: usize = 4;
pub const SHEET_BORDER_COLOR: [f32; 3] = [0.0, 0.0, 1.0];

/// Expand a 1-channel image to 3 channels, or clone a 3-channel one.
pub fn to_rgb(image: &ImageF32) -> Result<ImageF32> {
    match image.channels {
        3 => Ok(image.clone()),
        1 => {
            let mut out = ImageF32::new(image.w, image.h, 3);
            for (dst, &v) in out.data.chunks_exact_mut(3).zip(&image.data) {
                dst.fill(v);
            }
            Ok(out)
        }
        found => Err(Error::ChannelMismatch {
            expected: 3,
            found,
        }),
    }
}

/// Compose `rows` of equally sized tiles into one RGB sheet.
///
/// Rows with fewer tiles than the widest row leave the remaining cells in
/// the border colour.
pub fn compose_sheet(rows: &[Vec<ImageF32>], border: usize, color: [f32; 3]) -> Result<ImageF32> {
    let Some(first) = rows.iter().flatten().next() else {
        return Err(Error::InvalidDimensions {
            width: 0,
            height: 0,
        });
    };
    let (tw, th) = first.dims();
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    let n_rows = rows.len();
    let width = cols * tw + cols.saturating_sub(1) * border;
    let height = n_rows * th + n_rows.saturating_sub(1) * border;

    let mut sheet = ImageF32::filled(width, height, &color);
    for (r, row) in rows.iter().enumerate() {
        for (c, tile) in row.iter().enumerate() {
            if tile.dims() != (tw, th) {
                return Err(Error::DimensionMismatch {
                    left_w: tw,
                    left_h: th,
                    right_w: tile.w,
                    right_h: tile.h,
                });
            }
            let rgb = to_rgb(tile)?;
            let x0 = c * (tw + border);
            let y0 = r * (th + border);
            for y in 0..th {
                let src = rgb.row(y);
                let start = sheet.idx(x0, y0 + y);
                sheet.data[start..start + 3 * tw].copy_from_slice(src);
            }
        }
    }
    Ok(sheet)
}
