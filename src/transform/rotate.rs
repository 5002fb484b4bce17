//! Clockwise rotation about the image center, on a canvas of the same size.

use crate::error::Result;
use crate::pixel::PixelBuffer;
use crate::rows;

/// Rotate clockwise by `degrees` about the image center, keeping the canvas size.
///
/// Corners that rotate out of the canvas are lost and uncovered pixels are
/// left zeroed (transparent for RGBA). Sampling is nearest-neighbour at pixel
/// centers, so quarter turns move pixels exactly.
///
/// # Errors
///
/// Only fails if the output cannot be allocated.
pub fn rotate(image: &PixelBuffer, degrees: f64) -> Result<PixelBuffer> {
    let degrees = degrees.rem_euclid(360.0);
    if degrees.abs() < f64::EPSILON {
        return Ok(image.clone());
    }

    let (width, height) = image.dimensions();
    let mut out = PixelBuffer::allocate(width, height, image.format())?;
    let (sin, cos) = sin_cos_degrees(degrees);
    let (w, h) = (f64::from(width), f64::from(height));
    let (cx, cy) = (w / 2.0, h / 2.0);
    let src = image.view();
    let bpp = image.format().bytes_per_pixel();
    let stride = out.stride();

    out.with_lock(|view| {
        rows::for_each_row(view.as_bytes_mut(), stride, |row, line| {
            let dy = f64::from(row) + 0.5 - cy;
            for (col, px) in (0..width).zip(line.chunks_exact_mut(bpp)) {
                let dx = f64::from(col) + 0.5 - cx;
                let sx = (cx + dx * cos + dy * sin).floor();
                let sy = (cy - dx * sin + dy * cos).floor();
                if (0.0..w).contains(&sx) && (0.0..h).contains(&sy) {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    px.copy_from_slice(src.pixel_bytes(sx as u32, sy as u32)?);
                }
            }
            Ok(())
        })
    })?;
    Ok(out)
}

/// `(sin, cos)` of an angle in `[0, 360)`, exact for quarter turns.
fn sin_cos_degrees(degrees: f64) -> (f64, f64) {
    const QUARTERS: [(f64, f64, f64); 3] = [(90.0, 1.0, 0.0), (180.0, 0.0, -1.0), (270.0, -1.0, 0.0)];
    QUARTERS
        .iter()
        .find(|(angle, _, _)| (degrees - angle).abs() < 1e-9)
        .map_or_else(|| degrees.to_radians().sin_cos(), |&(_, sin, cos)| (sin, cos))
}
