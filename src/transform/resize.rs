//! Bilinear resampling.

use image::imageops::FilterType;

use crate::error::{Error, Result};
use crate::pixel::PixelBuffer;

/// Resample to exactly `width`x`height` with bilinear filtering.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if either target dimension is zero.
pub fn resize(image: &PixelBuffer, width: u32, height: u32) -> Result<PixelBuffer> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }
    let resized = image
        .to_dynamic()?
        .resize_exact(width, height, FilterType::Triangle);
    PixelBuffer::from_dynamic(resized)
}

/// Resample to `width`, keeping the aspect ratio.
///
/// The height never drops below one pixel, so very wide images still scale
/// down to a single row.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if `width` is zero.
pub fn resize_to_width(image: &PixelBuffer, width: u32) -> Result<PixelBuffer> {
    resize(image, width, proportional_height(image.dimensions(), width).max(1))
}

/// Height that keeps `(width, height)` proportional at `target_width`,
/// truncated toward zero.
#[must_use]
pub fn proportional_height((width, height): (u32, u32), target_width: u32) -> u32 {
    if width == 0 {
        return 0;
    }
    let scaled = u64::from(target_width) * u64::from(height) / u64::from(width);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{Color, PixelFormat};

    #[test]
    fn resize_changes_dimensions_and_keeps_format() {
        let image = PixelBuffer::allocate(8, 4, PixelFormat::Rgba32).unwrap();
        let out = resize(&image, 3, 5).unwrap();
        assert_eq!(out.dimensions(), (3, 5));
        assert_eq!(out.format(), PixelFormat::Rgba32);

        let image = PixelBuffer::allocate(8, 4, PixelFormat::Rgb24).unwrap();
        assert_eq!(resize(&image, 16, 8).unwrap().format(), PixelFormat::Rgb24);
    }

    #[test]
    fn resize_of_uniform_image_stays_uniform() {
        let mut image = PixelBuffer::allocate(6, 6, PixelFormat::Rgba32).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                image.set_pixel(x, y, Color::rgba(40, 80, 120, 255)).unwrap();
            }
        }
        let out = resize(&image, 12, 3).unwrap();
        assert_eq!(out.get_pixel(7, 1).unwrap(), Color::rgba(40, 80, 120, 255));
    }

    #[test]
    fn resize_to_width_preserves_aspect() {
        let image = PixelBuffer::allocate(200, 100, PixelFormat::Rgba32).unwrap();
        let out = resize_to_width(&image, 50).unwrap();
        assert_eq!(out.dimensions(), (50, 25));
    }

    #[test]
    fn proportional_height_truncates() {
        assert_eq!(proportional_height((3, 2), 10), 6);
        assert_eq!(proportional_height((600, 100), 5), 0);
        assert_eq!(proportional_height((0, 10), 5), 0);
    }

    #[test]
    fn resize_rejects_zero_target() {
        let image = PixelBuffer::allocate(600, 100, PixelFormat::Rgba32).unwrap();
        assert!(matches!(
            resize_to_width(&image, 0),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            resize(&image, 4, 0),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn resize_to_width_keeps_at_least_one_row() {
        let image = PixelBuffer::allocate(600, 100, PixelFormat::Rgba32).unwrap();
        assert_eq!(resize_to_width(&image, 5).unwrap().dimensions(), (5, 1));
    }
}
