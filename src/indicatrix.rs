//! Calibrated watermark placements.
//!
//! An [`IndicatrixDescriptor`] says where an undistorted watermark is drawn
//! before projection so it ends up in the right place of the final photo.
//! Top and Bottom descriptors are in the coordinates of the square fisheye
//! working buffers (side = photo height); Center descriptors are in photo
//! coordinates.
//!
//! The built-in values were calibrated on 7776x3888 photos.
//! [`IndicatrixCatalog::fitted_to`] rescales them for other resolutions.

use crate::error::{Error, Result};

/// Which part of the sphere a descriptor targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Upper fisheye (north pole hemisphere).
    Top,
    /// Equatorial band, placed directly on the photo.
    Center,
    /// Lower fisheye (south pole hemisphere).
    Bottom,
}

impl Position {
    /// Whether the placement goes through a fisheye working buffer.
    #[must_use]
    pub fn is_peripheral(self) -> bool {
        !matches!(self, Self::Center)
    }
}

/// One calibrated placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndicatrixDescriptor {
    /// Horizontal center of the watermark.
    pub x: u32,
    /// Vertical center of the watermark.
    pub y: u32,
    /// Width the watermark is scaled to.
    pub max_width: u32,
    /// Largest height the placement was calibrated for.
    pub max_height: u32,
    /// Target hemisphere or band.
    pub position: Position,
    /// Clockwise rotation applied before insertion.
    pub rotation_degrees: i32,
}

impl IndicatrixDescriptor {
    const fn new(
        x: u32,
        y: u32,
        max_size: u32,
        position: Position,
        rotation_degrees: i32,
    ) -> Self {
        Self {
            x,
            y,
            max_width: max_size,
            max_height: max_size,
            position,
            rotation_degrees,
        }
    }

    /// Top-left corner that centers a `width`x`height` image on the anchor.
    #[must_use]
    pub fn insertion_origin(&self, width: u32, height: u32) -> (i64, i64) {
        (
            i64::from(self.x) - i64::from(width / 2),
            i64::from(self.y) - i64::from(height / 2),
        )
    }

    /// Rescale by the photo scale factors `sx` (horizontal) and `sy` (vertical).
    ///
    /// Peripheral descriptors live in a square buffer whose side follows the
    /// photo height, so they scale uniformly by `sy`.
    #[must_use]
    pub fn rescaled(&self, sx: f64, sy: f64) -> Self {
        let sx = if self.position.is_peripheral() { sy } else { sx };
        Self {
            x: scale(self.x, sx),
            y: scale(self.y, sy),
            max_width: scale(self.max_width, sx).max(1),
            max_height: scale(self.max_height, sy).max(1),
            ..*self
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(value: u32, factor: f64) -> u32 {
    (f64::from(value) * factor).round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Width of the photos the built-in descriptors were calibrated on.
pub const REFERENCE_WIDTH: u32 = 7776;
/// Height of the photos the built-in descriptors were calibrated on.
pub const REFERENCE_HEIGHT: u32 = 3888;

/// Center of the top fisheye.
pub const TOP_CENTER: IndicatrixDescriptor =
    IndicatrixDescriptor::new(1944, 1944, 400, Position::Top, 0);
/// Center of the bottom fisheye.
pub const BOTTOM_CENTER: IndicatrixDescriptor =
    IndicatrixDescriptor::new(1944, 1944, 400, Position::Bottom, 0);

/// Top fisheye, upper-right quadrant.
pub const TOP_NE: IndicatrixDescriptor =
    IndicatrixDescriptor::new(2325, 1560, 600, Position::Top, 225);
/// Top fisheye, upper-left quadrant.
pub const TOP_NW: IndicatrixDescriptor =
    IndicatrixDescriptor::new(1560, 1560, 600, Position::Top, 135);
/// Top fisheye, lower-left quadrant.
pub const TOP_SW: IndicatrixDescriptor =
    IndicatrixDescriptor::new(1560, 2325, 600, Position::Top, 45);
/// Top fisheye, lower-right quadrant.
pub const TOP_SE: IndicatrixDescriptor =
    IndicatrixDescriptor::new(2325, 2325, 600, Position::Top, 315);

/// Bottom fisheye, upper-right quadrant.
pub const BOTTOM_NE: IndicatrixDescriptor =
    IndicatrixDescriptor::new(2325, 1560, 600, Position::Bottom, 225);
/// Bottom fisheye, upper-left quadrant.
pub const BOTTOM_NW: IndicatrixDescriptor =
    IndicatrixDescriptor::new(1560, 1560, 600, Position::Bottom, 135);
/// Bottom fisheye, lower-left quadrant.
pub const BOTTOM_SW: IndicatrixDescriptor =
    IndicatrixDescriptor::new(1560, 2325, 600, Position::Bottom, 45);
/// Bottom fisheye, lower-right quadrant.
pub const BOTTOM_SE: IndicatrixDescriptor =
    IndicatrixDescriptor::new(2325, 2325, 600, Position::Bottom, 315);

/// Equator at 45° longitude.
pub const EQUATOR_45: IndicatrixDescriptor =
    IndicatrixDescriptor::new(972, 1944, 1000, Position::Center, 0);
/// Equator at 135° longitude.
pub const EQUATOR_135: IndicatrixDescriptor =
    IndicatrixDescriptor::new(2916, 1944, 1000, Position::Center, 0);
/// Equator at 225° longitude.
pub const EQUATOR_225: IndicatrixDescriptor =
    IndicatrixDescriptor::new(4860, 1944, 1000, Position::Center, 0);
/// Equator at 315° longitude.
pub const EQUATOR_315: IndicatrixDescriptor =
    IndicatrixDescriptor::new(6804, 1944, 1000, Position::Center, 0);

/// The twelve standard placements: four per fisheye and four on the equator.
pub const STANDARD: [IndicatrixDescriptor; 12] = [
    TOP_NE,
    TOP_NW,
    TOP_SW,
    TOP_SE,
    BOTTOM_NE,
    BOTTOM_NW,
    BOTTOM_SW,
    BOTTOM_SE,
    EQUATOR_45,
    EQUATOR_135,
    EQUATOR_225,
    EQUATOR_315,
];

/// An ordered set of descriptors together with the resolution they fit.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatrixCatalog {
    reference: (u32, u32),
    descriptors: Vec<IndicatrixDescriptor>,
}

impl IndicatrixCatalog {
    /// Build a catalog calibrated for `width`x`height` photos.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] for a zero reference size.
    pub fn new(width: u32, height: u32, descriptors: Vec<IndicatrixDescriptor>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self {
            reference: (width, height),
            descriptors,
        })
    }

    /// The twelve [`STANDARD`] descriptors.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            reference: (REFERENCE_WIDTH, REFERENCE_HEIGHT),
            descriptors: STANDARD.to_vec(),
        }
    }

    /// [`TOP_CENTER`] and [`BOTTOM_CENTER`] followed by the twelve standard descriptors.
    #[must_use]
    pub fn with_poles() -> Self {
        let mut catalog = Self::standard();
        catalog.descriptors.splice(0..0, [TOP_CENTER, BOTTOM_CENTER]);
        catalog
    }

    /// Photo resolution the coordinates are expressed in.
    #[must_use]
    pub fn reference_resolution(&self) -> (u32, u32) {
        self.reference
    }

    /// Descriptors in application order.
    #[must_use]
    pub fn descriptors(&self) -> &[IndicatrixDescriptor] {
        &self.descriptors
    }

    /// Number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the catalog holds no descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Keep only the descriptors at `indices`, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDescriptor`] for an index past the end.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let descriptors = indices
            .iter()
            .map(|&index| {
                self.descriptors
                    .get(index)
                    .copied()
                    .ok_or(Error::UnknownDescriptor {
                        index,
                        len: self.descriptors.len(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            reference: self.reference,
            descriptors,
        })
    }

    /// Rescale every descriptor proportionally for `width`x`height` photos.
    #[must_use]
    pub fn fitted_to(&self, width: u32, height: u32) -> Self {
        if (width, height) == self.reference {
            return self.clone();
        }
        let sx = f64::from(width) / f64::from(self.reference.0);
        let sy = f64::from(height) / f64::from(self.reference.1);
        Self {
            reference: (width, height),
            descriptors: self
                .descriptors
                .iter()
                .map(|d| d.rescaled(sx, sy))
                .collect(),
        }
    }

    /// Split into peripheral (Top/Bottom) and equatorial (Center) descriptors,
    /// each keeping catalog order.
    #[must_use]
    pub fn partition(&self) -> (Vec<IndicatrixDescriptor>, Vec<IndicatrixDescriptor>) {
        self.descriptors
            .iter()
            .copied()
            .partition(|d| d.position.is_peripheral())
    }
}

impl Default for IndicatrixCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
