//! Compositing an overlay onto a photo.
//!
//! The overlay acts as a binary mask: only pixels whose alpha is exactly 255
//! take part, and those are mixed with the photo by a fixed factor:
//! `out = photo * (1 - f) + overlay * f`, truncated toward zero.

use crate::bitmap::{Equirect360Buffer, WatermarkBuffer};
use crate::error::{Error, Result};
use crate::pixel::PixelFormat;
use crate::rows;

/// A compositing strategy used by the
/// [`WatermarkCompositor`](crate::compositor::WatermarkCompositor).
pub trait BlendAlgorithm: Send + Sync {
    /// Composite `overlay` onto `photo` at the origin.
    ///
    /// # Errors
    ///
    /// See [`insert_watermark_at`](Self::insert_watermark_at).
    fn insert_watermark(
        &self,
        photo: &Equirect360Buffer,
        overlay: &WatermarkBuffer,
    ) -> Result<Equirect360Buffer> {
        self.insert_watermark_at(photo, overlay, 0, 0)
    }

    /// Composite `overlay` onto `photo` with its top-left corner at `(x, y)`.
    ///
    /// Returns a new photo; `photo` is left untouched.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error::SizeMismatch`] or
    /// [`Error::PixelFormat`] when the inputs cannot be combined.
    fn insert_watermark_at(
        &self,
        photo: &Equirect360Buffer,
        overlay: &WatermarkBuffer,
        x: i64,
        y: i64,
    ) -> Result<Equirect360Buffer>;
}

/// Fixed-factor blend over a binary opacity mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorBlend {
    factor: f64,
}

impl FactorBlend {
    /// Factor used by [`Default`].
    pub const DEFAULT_FACTOR: f64 = 0.5;

    /// Create a blend with `factor` clamped to `[0, 1]`.
    ///
    /// NaN falls back to [`DEFAULT_FACTOR`](Self::DEFAULT_FACTOR).
    #[must_use]
    pub fn new(factor: f64) -> Self {
        Self {
            factor: clamp_factor(factor),
        }
    }

    /// Weight of the overlay, always within `[0, 1]`.
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Replace the factor, clamping it to `[0, 1]`.
    pub fn set_factor(&mut self, factor: f64) {
        self.factor = clamp_factor(factor);
    }
}

impl Default for FactorBlend {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FACTOR)
    }
}

fn clamp_factor(factor: f64) -> f64 {
    if factor.is_nan() {
        FactorBlend::DEFAULT_FACTOR
    } else {
        factor.clamp(0.0, 1.0)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend_channel(photo: u8, overlay: u8, factor: f64) -> u8 {
    (f64::from(photo) * (1.0 - factor) + f64::from(overlay) * factor) as u8
}

impl BlendAlgorithm for FactorBlend {
    /// Blend at the origin.
    ///
    /// `x` and `y` are accepted for translated insertion but are not used:
    /// the overlay always covers the photo from `(0, 0)`.
    #[tracing::instrument(skip_all, fields(factor = self.factor))]
    fn insert_watermark_at(
        &self,
        photo: &Equirect360Buffer,
        overlay: &WatermarkBuffer,
        _x: i64,
        _y: i64,
    ) -> Result<Equirect360Buffer> {
        if photo.dimensions() != overlay.dimensions() {
            return Err(Error::SizeMismatch {
                expected_width: photo.width(),
                expected_height: photo.height(),
                width: overlay.width(),
                height: overlay.height(),
            });
        }
        if overlay.format() != PixelFormat::Rgba32 {
            return Err(Error::PixelFormat {
                expected: PixelFormat::Rgba32,
                actual: overlay.format(),
            });
        }

        let mask = overlay.view();
        let factor = self.factor;
        let mut out = photo.clone();
        let stride = out.stride();

        out.with_lock(|view| {
            rows::for_each_row(view.as_bytes_mut(), stride, |row, line| {
                let over = mask.row(row)?;
                for (px, ov) in line.chunks_exact_mut(3).zip(over.chunks_exact(4)) {
                    if ov[3] != u8::MAX {
                        continue;
                    }
                    for (p, &o) in px.iter_mut().zip(&ov[..3]) {
                        *p = blend_channel(*p, o, factor);
                    }
                }
                Ok(())
            })
        })?;

        tracing::debug!("overlay blended");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{Color, PixelBuffer};

    fn photo(width: u32, height: u32, color: Color) -> Equirect360Buffer {
        let mut buf = PixelBuffer::allocate(width, height, PixelFormat::Rgb24).unwrap();
        for y in 0..height {
            for x in 0..width {
                buf.set_pixel(x, y, color).unwrap();
            }
        }
        Equirect360Buffer::new(buf).unwrap()
    }

    fn overlay(width: u32, height: u32, color: Color) -> WatermarkBuffer {
        let mut buf = WatermarkBuffer::allocate(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                buf.set_pixel(x, y, color).unwrap();
            }
        }
        buf
    }

    #[test]
    fn half_factor_truncates_toward_zero() {
        let out = FactorBlend::default()
            .insert_watermark(&photo(16, 8, Color::BLACK), &overlay(16, 8, Color::WHITE))
            .unwrap();
        for y in 0..8 {
            for x in 0..16 {
                assert_eq!(out.get_pixel(x, y).unwrap(), Color::rgb(127, 127, 127));
            }
        }
    }

    #[test]
    fn partial_alpha_leaves_photo_unchanged() {
        let src = photo(16, 8, Color::BLACK);
        let out = FactorBlend::default()
            .insert_watermark(&src, &overlay(16, 8, Color::rgba(255, 255, 255, 254)))
            .unwrap();
        assert_eq!(out, src);

        let out = FactorBlend::default()
            .insert_watermark(&src, &overlay(16, 8, Color::TRANSPARENT))
            .unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn channels_blend_independently() {
        let out = FactorBlend::new(0.25)
            .insert_watermark(
                &photo(4, 2, Color::rgb(200, 100, 0)),
                &overlay(4, 2, Color::rgba(0, 200, 100, 255)),
            )
            .unwrap();
        // 200*0.75 = 150, 100*0.75 + 200*0.25 = 125, 100*0.25 = 25
        assert_eq!(out.get_pixel(3, 1).unwrap(), Color::rgb(150, 125, 25));
    }

    #[test]
    fn offset_is_ignored() {
        let src = photo(4, 2, Color::BLACK);
        let ov = overlay(4, 2, Color::WHITE);
        let blend = FactorBlend::default();
        assert_eq!(
            blend.insert_watermark_at(&src, &ov, 3, -7).unwrap(),
            blend.insert_watermark(&src, &ov).unwrap()
        );
    }

    #[test]
    fn factor_is_clamped() {
        assert!((FactorBlend::new(1.7).factor() - 1.0).abs() < f64::EPSILON);
        assert!(FactorBlend::new(-0.3).factor().abs() < f64::EPSILON);
        assert!((FactorBlend::new(f64::NAN).factor() - 0.5).abs() < f64::EPSILON);

        let mut blend = FactorBlend::default();
        blend.set_factor(3.0);
        assert!((blend.factor() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn full_factor_copies_opaque_overlay() {
        let out = FactorBlend::new(1.0)
            .insert_watermark(&photo(4, 2, Color::BLACK), &overlay(4, 2, Color::rgb(9, 8, 7)))
            .unwrap();
        assert_eq!(out.get_pixel(0, 0).unwrap(), Color::rgb(9, 8, 7));
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let err = FactorBlend::default()
            .insert_watermark(&photo(8, 4, Color::BLACK), &overlay(4, 4, Color::WHITE))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected_width: 8,
                expected_height: 4,
                width: 4,
                height: 4
            }
        ));
    }
}
