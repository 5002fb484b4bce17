//! Building the projected overlay and compositing it onto the photo.
//!
//! [`WatermarkCompositor::prepare`] draws the watermark at every peripheral
//! descriptor into two fisheye working buffers, bends them through the lens
//! model, unwraps them into landscape strips and stacks the strips into an
//! overlay the size of the photo. Equatorial descriptors are pasted straight
//! into the overlay. [`WatermarkCompositor::apply`] hands photo and overlay to
//! the configured [`BlendAlgorithm`].

use crate::bitmap::{Equirect360Buffer, FisheyeBuffer, WatermarkBuffer};
use crate::blending::BlendAlgorithm;
use crate::error::{Error, Result};
use crate::fisheye::{forward_fisheye, inverse_to_landscape};
use crate::indicatrix::{IndicatrixCatalog, IndicatrixDescriptor, Position};
use crate::pixel::PixelBuffer;
use crate::rows;
use crate::transform::{crop, flip_xy, resize_to_width, rotate};

/// Projects a watermark onto one photo.
///
/// Borrow the inputs, call [`prepare`](Self::prepare) once, then
/// [`apply`](Self::apply) to get the composited photo.
pub struct WatermarkCompositor<'a> {
    photo: &'a Equirect360Buffer,
    watermark: &'a WatermarkBuffer,
    algorithm: &'a dyn BlendAlgorithm,
    catalog: IndicatrixCatalog,
    overlay: Option<WatermarkBuffer>,
}

impl<'a> WatermarkCompositor<'a> {
    /// Set up a compositor.
    ///
    /// The catalog is rescaled to the photo resolution if it was calibrated
    /// for a different one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingArgument`] if `catalog` holds no descriptors.
    pub fn new(
        photo: &'a Equirect360Buffer,
        watermark: &'a WatermarkBuffer,
        algorithm: &'a dyn BlendAlgorithm,
        catalog: &IndicatrixCatalog,
    ) -> Result<Self> {
        if catalog.is_empty() {
            return Err(Error::MissingArgument("indicatrix catalog"));
        }
        let (width, height) = photo.dimensions();
        if catalog.reference_resolution() != (width, height) {
            tracing::debug!(
                from = ?catalog.reference_resolution(),
                to = ?(width, height),
                "rescaling indicatrix catalog"
            );
        }
        Ok(Self {
            photo,
            watermark,
            algorithm,
            catalog: catalog.fitted_to(width, height),
            overlay: None,
        })
    }

    /// Descriptors in use, fitted to the photo.
    #[must_use]
    pub fn catalog(&self) -> &IndicatrixCatalog {
        &self.catalog
    }

    /// The overlay built by the last [`prepare`](Self::prepare), if any.
    #[must_use]
    pub fn overlay(&self) -> Option<&WatermarkBuffer> {
        self.overlay.as_ref()
    }

    /// Build the overlay: transparent everywhere except the projected
    /// watermarks, same size as the photo.
    ///
    /// Every call recomputes the overlay from scratch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegionOutOfBounds`] if a scaled watermark does not
    /// fit at its anchor, or [`Error::InvalidDimensions`] if a descriptor
    /// scales the watermark to nothing. The previous overlay is kept on error.
    #[tracing::instrument(skip(self), fields(
        width = self.photo.width(),
        height = self.photo.height(),
        descriptors = self.catalog.len()
    ))]
    pub fn prepare(&mut self) -> Result<&WatermarkBuffer> {
        let (peripheral, equatorial) = self.catalog.partition();

        let (top, bottom) = self.draw_hemispheres(&peripheral)?;
        tracing::debug!(count = peripheral.len(), "peripheral watermarks drawn");

        let (top, bottom) = rows::join(|| forward_fisheye(&top), || forward_fisheye(&bottom));
        let (top, bottom) = (top?, bottom?);

        let (top, bottom) = rows::join(
            || inverse_to_landscape(&top),
            || inverse_to_landscape(&bottom),
        );
        let width = self.photo.width();
        let top = fit_width(flip_xy(&top?)?, width)?;
        let bottom = fit_width(bottom?, width)?;

        let mut overlay = WatermarkBuffer::allocate(width, self.photo.height())?;
        overlay.insert_region(&top, 0, 0)?;
        overlay.insert_region(&bottom, 0, i64::from(top.height()))?;
        tracing::debug!(strip_height = top.height(), "landscape strips stacked");

        for descriptor in &equatorial {
            let placed = resize_to_width(self.watermark, descriptor.max_width)?;
            let (x, y) = descriptor.insertion_origin(placed.width(), placed.height());
            overlay.insert_region(&placed, x, y)?;
        }
        tracing::debug!(count = equatorial.len(), "equatorial watermarks drawn");

        Ok(&*self.overlay.insert(overlay))
    }

    /// Blend the prepared overlay onto the photo and return the result.
    ///
    /// The borrowed photo is not modified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingArgument`] if [`prepare`](Self::prepare) has
    /// not succeeded yet, otherwise whatever the blend algorithm reports.
    pub fn apply(&self) -> Result<Equirect360Buffer> {
        let overlay = self
            .overlay
            .as_ref()
            .ok_or(Error::MissingArgument("overlay, call prepare first"))?;
        let out = self.algorithm.insert_watermark(self.photo, overlay)?;
        tracing::info!(width = out.width(), height = out.height(), "photo watermarked");
        Ok(out)
    }

    /// Undistorted top and bottom fisheye buffers with every peripheral
    /// watermark scaled, rotated and anchored. Bottom watermarks are flipped
    /// across both axes first to match the lower lens orientation.
    fn draw_hemispheres(
        &self,
        peripheral: &[IndicatrixDescriptor],
    ) -> Result<(FisheyeBuffer, FisheyeBuffer)> {
        let mut top = FisheyeBuffer::for_photo(self.photo)?;
        let mut bottom = FisheyeBuffer::for_photo(self.photo)?;
        for descriptor in peripheral {
            let scaled = resize_to_width(self.watermark, descriptor.max_width)?;
            let mut placed = rotate(&scaled, f64::from(descriptor.rotation_degrees))?;
            let target = if descriptor.position == Position::Bottom {
                placed = flip_xy(&placed)?;
                &mut bottom
            } else {
                &mut top
            };
            let (x, y) = descriptor.insertion_origin(placed.width(), placed.height());
            target.insert_region(&placed, x, y)?;
        }
        Ok((top, bottom))
    }
}

/// Drop columns past `width` so a strip fits the overlay.
fn fit_width(strip: PixelBuffer, width: u32) -> Result<PixelBuffer> {
    if strip.width() > width {
        crop(&strip, 0, 0, width, strip.height())
    } else {
        Ok(strip)
    }
}

/// Prepare and apply in one call.
///
/// # Errors
///
/// See [`WatermarkCompositor::new`], [`WatermarkCompositor::prepare`] and
/// [`WatermarkCompositor::apply`].
pub fn watermark_photo(
    photo: &Equirect360Buffer,
    watermark: &WatermarkBuffer,
    algorithm: &dyn BlendAlgorithm,
    catalog: &IndicatrixCatalog,
) -> Result<Equirect360Buffer> {
    let mut compositor = WatermarkCompositor::new(photo, watermark, algorithm, catalog)?;
    compositor.prepare()?;
    compositor.apply()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blending::FactorBlend;
    use crate::error::ErrorKind;
    use crate::pixel::{Color, PixelFormat};

    fn photo(width: u32, height: u32) -> Equirect360Buffer {
        Equirect360Buffer::new(PixelBuffer::allocate(width, height, PixelFormat::Rgb24).unwrap())
            .unwrap()
    }

    fn white_watermark(width: u32, height: u32) -> WatermarkBuffer {
        let mut wm = WatermarkBuffer::allocate(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                wm.set_pixel(x, y, Color::WHITE).unwrap();
            }
        }
        wm
    }

    const RED: Color = Color::rgba(255, 0, 0, 255);

    fn marked_watermark(width: u32, height: u32) -> WatermarkBuffer {
        let mut wm = white_watermark(width, height);
        wm.set_pixel(0, 0, RED).unwrap();
        wm
    }

    fn descriptor(position: Position, rotation_degrees: i32) -> IndicatrixDescriptor {
        IndicatrixDescriptor {
            x: 100,
            y: 100,
            max_width: 40,
            max_height: 40,
            position,
            rotation_degrees,
        }
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let photo = photo(40, 20);
        let wm = white_watermark(4, 4);
        let blend = FactorBlend::default();
        let empty = IndicatrixCatalog::new(40, 20, Vec::new()).unwrap();
        let err = WatermarkCompositor::new(&photo, &wm, &blend, &empty)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn apply_requires_prepare() {
        let photo = photo(40, 20);
        let wm = white_watermark(4, 4);
        let blend = FactorBlend::default();
        let compositor =
            WatermarkCompositor::new(&photo, &wm, &blend, &IndicatrixCatalog::standard()).unwrap();
        assert!(compositor.overlay().is_none());
        assert!(matches!(
            compositor.apply(),
            Err(Error::MissingArgument(_))
        ));
    }

    #[test]
    fn catalog_is_fitted_to_photo() {
        let photo = photo(400, 200);
        let wm = white_watermark(20, 10);
        let blend = FactorBlend::default();
        let compositor =
            WatermarkCompositor::new(&photo, &wm, &blend, &IndicatrixCatalog::standard()).unwrap();
        assert_eq!(compositor.catalog().reference_resolution(), (400, 200));
        let equator = compositor.catalog().descriptors()[8];
        assert_eq!((equator.x, equator.y, equator.max_width), (50, 100, 51));
    }

    #[test]
    fn equatorial_watermark_lands_on_anchor() {
        let photo = photo(400, 200);
        let wm = white_watermark(20, 10);
        let blend = FactorBlend::default();
        let catalog = IndicatrixCatalog::standard().select(&[8]).unwrap();
        let mut compositor = WatermarkCompositor::new(&photo, &wm, &blend, &catalog).unwrap();

        let overlay = compositor.prepare().unwrap();
        assert_eq!(overlay.dimensions(), (400, 200));
        assert_eq!(overlay.format(), PixelFormat::Rgba32);
        assert!(overlay.get_pixel(50, 100).unwrap().a > 0);
        assert_eq!(overlay.get_pixel(200, 100).unwrap(), Color::TRANSPARENT);
        assert_eq!(overlay.get_pixel(0, 0).unwrap(), Color::TRANSPARENT);
    }

    #[test]
    fn peripheral_watermarks_reach_the_strips() {
        let photo = photo(400, 200);
        let wm = white_watermark(20, 10);
        let blend = FactorBlend::default();
        let catalog = IndicatrixCatalog::standard().select(&[0, 4]).unwrap();
        let mut compositor = WatermarkCompositor::new(&photo, &wm, &blend, &catalog).unwrap();

        let overlay = compositor.prepare().unwrap();
        let count_opaque = |rows: std::ops::Range<u32>| {
            rows.flat_map(|y| (0..400).map(move |x| (x, y)))
                .filter(|&(x, y)| overlay.get_pixel(x, y).unwrap().a > 0)
                .count()
        };
        assert!(count_opaque(0..100) > 0, "top strip is empty");
        assert!(count_opaque(100..200) > 0, "bottom strip is empty");
    }

    #[test]
    fn full_pipeline_keeps_photo_shape() {
        let photo = photo(400, 200);
        let wm = white_watermark(20, 10);
        let blend = FactorBlend::default();

        let out = watermark_photo(&photo, &wm, &blend, &IndicatrixCatalog::standard()).unwrap();
        assert_eq!(out.dimensions(), photo.dimensions());
        assert_eq!(out.format(), PixelFormat::Rgb24);
        assert_ne!(out, photo);
        assert!(photo.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn wider_strips_are_cropped_to_photo() {
        // 3999 / 2000 is within tolerance; strips come out 4000 wide.
        let strip = PixelBuffer::allocate(4000, 10, PixelFormat::Rgba32).unwrap();
        assert_eq!(fit_width(strip, 3999).unwrap().dimensions(), (3999, 10));

        let strip = PixelBuffer::allocate(30, 10, PixelFormat::Rgba32).unwrap();
        assert_eq!(fit_width(strip, 40).unwrap().dimensions(), (30, 10));
    }

    #[test]
    fn equatorial_rotation_is_ignored() {
        let photo = photo(400, 200);
        let wm = marked_watermark(40, 20);
        let blend = FactorBlend::default();
        let catalog =
            IndicatrixCatalog::new(400, 200, vec![descriptor(Position::Center, 180)]).unwrap();
        let mut compositor = WatermarkCompositor::new(&photo, &wm, &blend, &catalog).unwrap();

        let overlay = compositor.prepare().unwrap();
        assert_eq!(overlay.get_pixel(80, 90).unwrap(), RED);
        assert_eq!(overlay.get_pixel(119, 109).unwrap(), Color::WHITE);
    }

    #[test]
    fn bottom_watermarks_are_flipped_before_projection() {
        let photo = photo(400, 200);
        let wm = marked_watermark(40, 20);
        let blend = FactorBlend::default();
        let compositor =
            WatermarkCompositor::new(&photo, &wm, &blend, &IndicatrixCatalog::standard()).unwrap();

        let (top, bottom) = compositor
            .draw_hemispheres(&[descriptor(Position::Bottom, 0)])
            .unwrap();
        assert_eq!(bottom.get_pixel(119, 109).unwrap(), RED);
        assert_eq!(bottom.get_pixel(80, 90).unwrap(), Color::WHITE);
        assert_eq!(top.get_pixel(80, 90).unwrap(), Color::TRANSPARENT);

        let (top, bottom) = compositor
            .draw_hemispheres(&[descriptor(Position::Top, 0)])
            .unwrap();
        assert_eq!(top.get_pixel(80, 90).unwrap(), RED);
        assert_eq!(top.get_pixel(119, 109).unwrap(), Color::WHITE);
        assert_eq!(bottom.get_pixel(80, 90).unwrap(), Color::TRANSPARENT);
    }

    #[test]
    fn tiny_photos_scale_watermarks_down_to_a_pixel() {
        let photo = photo(16, 8);
        let wm = white_watermark(40, 10);
        let blend = FactorBlend::default();

        let out = watermark_photo(&photo, &wm, &blend, &IndicatrixCatalog::standard()).unwrap();
        assert_eq!(out.dimensions(), (16, 8));
    }
}
