//! Rectangular sub-region extraction.

use crate::error::{Error, Result};
use crate::pixel::PixelBuffer;
use crate::rows;

/// Copy the `width`x`height` rectangle at `(x, y)` into a new buffer.
///
/// # Errors
///
/// Returns [`Error::RegionOutOfBounds`] if the rectangle leaves the image and
/// [`Error::InvalidDimensions`] if it is empty.
pub fn crop(image: &PixelBuffer, x: u32, y: u32, width: u32, height: u32) -> Result<PixelBuffer> {
    let fits = u64::from(x) + u64::from(width) <= u64::from(image.width())
        && u64::from(y) + u64::from(height) <= u64::from(image.height());
    if !fits {
        return Err(Error::RegionOutOfBounds {
            x: i64::from(x),
            y: i64::from(y),
            region_width: width,
            region_height: height,
            width: image.width(),
            height: image.height(),
        });
    }

    let mut out = PixelBuffer::allocate(width, height, image.format())?;
    let src = image.view();
    let bpp = image.format().bytes_per_pixel();
    let span = x as usize * bpp..(x + width) as usize * bpp;
    let stride = out.stride();

    out.with_lock(|view| {
        rows::for_each_row(view.as_bytes_mut(), stride, |row, line| {
            line.copy_from_slice(&src.row(y + row)?[span.clone()]);
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
    fn crop_extracts_rectangle() {
        let mut image = PixelBuffer::allocate(5, 4, PixelFormat::Rgb24).unwrap();
        image.set_pixel(2, 1, Color::rgb(9, 8, 7)).unwrap();
        image.set_pixel(4, 3, Color::rgb(1, 2, 3)).unwrap();

        let out = crop(&image, 2, 1, 3, 3).unwrap();
        assert_eq!(out.dimensions(), (3, 3));
        assert_eq!(out.format(), PixelFormat::Rgb24);
        assert_eq!(out.get_pixel(0, 0).unwrap(), Color::rgb(9, 8, 7));
        assert_eq!(out.get_pixel(2, 2).unwrap(), Color::rgb(1, 2, 3));
    }

    #[test]
    fn crop_rejects_rectangles_past_the_edge() {
        let image = PixelBuffer::allocate(5, 4, PixelFormat::Rgba32).unwrap();
        assert!(matches!(
            crop(&image, 3, 0, 3, 1),
            Err(Error::RegionOutOfBounds { .. })
        ));
        assert!(crop(&image, 0, 4, 1, 1).is_err());
        assert!(matches!(
            crop(&image, 0, 0, 0, 1),
            Err(Error::InvalidDimensions { .. })
        ));
    }
}
