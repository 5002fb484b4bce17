//! Fisheye projection for dual-lens 360° cameras.
//!
//! [`forward_fisheye`] bends a flat image drawn inside the lens disc into the
//! radially compressed geometry of a fisheye lens. [`inverse_to_landscape`]
//! unwraps a square fisheye image into a polar landscape strip, which is half
//! of an equirectangular photo.

use std::f64::consts::PI;

use crate::bitmap::FisheyeBuffer;
use crate::error::{Error, Result};
use crate::pixel::{PixelBuffer, PixelFormat};
use crate::rows;

const BPP: usize = 4;

fn ensure_square(src: &FisheyeBuffer) -> Result<u32> {
    if src.format() != PixelFormat::Rgba32 {
        return Err(Error::PixelFormat {
            expected: PixelFormat::Rgba32,
            actual: src.format(),
        });
    }
    if !src.is_square() {
        return Err(Error::NotSquare {
            width: src.width(),
            height: src.height(),
        });
    }
    Ok(src.width())
}

/// Apply the fisheye lens distortion to a square RGBA buffer.
///
/// The output starts as a copy of `src`, so pixels outside the lens disc keep
/// their original value. Inside the disc each pixel is sampled from the
/// source at the compressed radius; samples wrap around the edges.
///
/// # Errors
///
/// Returns [`Error::NotSquare`] if `src` is not square.
#[tracing::instrument(skip(src), fields(side = src.width()))]
pub fn forward_fisheye(src: &FisheyeBuffer) -> Result<FisheyeBuffer> {
    let side = ensure_square(src)?;
    let mut dst = src.clone();
    let source = src.view();
    let stride = dst.stride();

    dst.with_lock(|view| {
        rows::for_each_row(view.as_bytes_mut(), stride, |row, line| {
            for (col, px) in (0..side).zip(line.chunks_exact_mut(BPP)) {
                if let Some((x, y)) = forward_source(col, row, side) {
                    px.copy_from_slice(source.pixel_bytes(x, y)?);
                }
            }
            Ok(())
        })
    })?;

    tracing::debug!("fisheye distortion applied");
    Ok(dst)
}

/// Source coordinate for destination `(col, row)` of a `side`-wide lens, or
/// `None` when the pixel is left untouched.
fn forward_source(col: u32, row: u32, side: u32) -> Option<(u32, u32)> {
    let size = f64::from(side);
    let ny = 2.0 * f64::from(row) / size - 1.0;
    let nx = 2.0 * f64::from(col) / size - 1.0;

    let r = (nx * nx + ny * ny).sqrt();
    if r > 1.0 {
        return None;
    }

    let nr = (r + (1.0 - (1.0 - r * r).sqrt())) / 2.0;
    if nr > 1.0 {
        return None;
    }

    let (sin, cos) = ny.atan2(nx).sin_cos();
    let x = wrap((((nr * cos + 1.0) * size) / 2.0).floor(), side);
    let y = wrap((((nr * sin + 1.0) * size) / 2.0).floor(), side);
    Some((x, y))
}

/// Reduce a floored, non-negative coordinate modulo `side`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn wrap(coord: f64, side: u32) -> u32 {
    (coord as i64).rem_euclid(i64::from(side)) as u32
}

/// Unwrap a square fisheye image into a landscape strip.
///
/// For a fisheye of side `S` the strip is `(S / 2) * 4` wide and `S / 2`
/// tall. Row 0 samples the rim of the disc and the last row its center;
/// columns sweep the angle clockwise from the positive x axis. Samples that
/// land outside the fisheye are skipped and stay transparent.
///
/// # Errors
///
/// Returns [`Error::NotSquare`] if `src` is not square and
/// [`Error::InvalidDimensions`] if it is too small to unwrap.
#[tracing::instrument(skip(src), fields(side = src.width()))]
pub fn inverse_to_landscape(src: &FisheyeBuffer) -> Result<PixelBuffer> {
    let side = ensure_square(src)?;
    let half = side / 2;
    let mut dst = PixelBuffer::allocate(half * 4, half, PixelFormat::Rgba32)?;
    let source = src.view();
    let stride = dst.stride();

    dst.with_lock(|view| {
        rows::for_each_row(view.as_bytes_mut(), stride, |row, line| {
            for (col, px) in (0..half * 4).zip(line.chunks_exact_mut(BPP)) {
                if let Some((x, y)) = landscape_source(col, row, half, side) {
                    px.copy_from_slice(source.pixel_bytes(x, y)?);
                }
            }
            Ok(())
        })
    })?;

    tracing::debug!(width = dst.width(), height = dst.height(), "fisheye unwrapped");
    Ok(dst)
}

/// Fisheye coordinate sampled by landscape pixel `(col, row)`, or `None` when
/// it falls outside the `side`-wide source.
fn landscape_source(col: u32, row: u32, half: u32, side: u32) -> Option<(u32, u32)> {
    let radius = f64::from(half) - f64::from(row);
    let theta = 2.0 * PI * -f64::from(col) / (4.0 * f64::from(half));
    let (sin, cos) = theta.sin_cos();

    #[allow(clippy::cast_possible_truncation)]
    let (fx, fy) = (
        (radius * cos).round_ties_even() as i64,
        (radius * sin).round_ties_even() as i64,
    );
    let x = fx + i64::from(half);
    let y = i64::from(half) - fy;

    let range = 0..i64::from(side);
    if range.contains(&x) && range.contains(&y) {
        Some((u32::try_from(x).ok()?, u32::try_from(y).ok()?))
    } else {
        None
    }
}
