//! Mirroring across both axes.

use crate::error::Result;
use crate::pixel::PixelBuffer;
use crate::rows;

/// Flip across both axes, equivalent to a half turn.
///
/// # Errors
///
/// Only fails if the output cannot be allocated.
pub fn flip_xy(image: &PixelBuffer) -> Result<PixelBuffer> {
    let (width, height) = image.dimensions();
    let mut out = PixelBuffer::allocate(width, height, image.format())?;
    let src = image.view();
    let bpp = image.format().bytes_per_pixel();
    let stride = out.stride();

    out.with_lock(|view| {
        rows::for_each_row(view.as_bytes_mut(), stride, |row, line| {
            let mirrored = src.row(height - 1 - row)?;
            for (dst, px) in line
                .chunks_exact_mut(bpp)
                .zip(mirrored.chunks_exact(bpp).rev())
            {
                dst.copy_from_slice(px);
            }
            Ok(())
        })
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{Color, PixelFormat};

    #[test]
    fn flip_xy_mirrors_both_axes() {
        let mut image = PixelBuffer::allocate(3, 2, PixelFormat::Rgba32).unwrap();
        image.set_pixel(0, 0, Color::rgba(1, 2, 3, 4)).unwrap();
        image.set_pixel(1, 1, Color::WHITE).unwrap();

        let out = flip_xy(&image).unwrap();
        assert_eq!(out.get_pixel(2, 1).unwrap(), Color::rgba(1, 2, 3, 4));
        assert_eq!(out.get_pixel(1, 0).unwrap(), Color::WHITE);
        assert_eq!(out.get_pixel(0, 0).unwrap(), Color::TRANSPARENT);
    }

    #[test]
    fn flip_xy_twice_is_identity() {
        let mut image = PixelBuffer::allocate(4, 5, PixelFormat::Rgb24).unwrap();
        image.set_pixel(3, 1, Color::rgb(50, 60, 70)).unwrap();
        let twice = flip_xy(&flip_xy(&image).unwrap()).unwrap();
        assert_eq!(twice, image);
    }
}
