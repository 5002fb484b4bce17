//! Buffers that pin a [`PixelBuffer`] to one layout.
//!
//! Each wrapper validates its invariant once at construction and then derefs
//! to the underlying [`PixelBuffer`] for pixel access.

use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::error::{Error, Result};
use crate::pixel::{PixelBuffer, PixelFormat};

/// Allowed deviation of `width / height` from 2 for equirectangular photos.
pub const ASPECT_TOLERANCE: f64 = 0.001;

macro_rules! buffer_wrapper {
    ($name:ident) => {
        impl Deref for $name {
            type Target = PixelBuffer;

            fn deref(&self) -> &PixelBuffer {
                &self.0
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut PixelBuffer {
                &mut self.0
            }
        }

        impl AsRef<PixelBuffer> for $name {
            fn as_ref(&self) -> &PixelBuffer {
                &self.0
            }
        }

        impl From<$name> for PixelBuffer {
            fn from(buffer: $name) -> PixelBuffer {
                buffer.0
            }
        }

        impl $name {
            /// Unwrap into the underlying [`PixelBuffer`].
            #[must_use]
            pub fn into_inner(self) -> PixelBuffer {
                self.0
            }
        }
    };
}

fn expect_format(buffer: &PixelBuffer, expected: PixelFormat) -> Result<()> {
    if buffer.format() == expected {
        Ok(())
    } else {
        Err(Error::PixelFormat {
            expected,
            actual: buffer.format(),
        })
    }
}

/// A 360° equirectangular photo: 24-bit RGB with a 2:1 aspect ratio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equirect360Buffer(PixelBuffer);

buffer_wrapper!(Equirect360Buffer);

impl Equirect360Buffer {
    /// Validate and wrap a decoded photo.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixelFormat`] unless the buffer is 24-bit RGB, and
    /// [`Error::AspectRatio`] unless `width / height` is within
    /// [`ASPECT_TOLERANCE`] of 2.
    pub fn new(buffer: PixelBuffer) -> Result<Self> {
        expect_format(&buffer, PixelFormat::Rgb24)?;
        let (width, height) = buffer.dimensions();
        let ratio = f64::from(width) / f64::from(height);
        if (ratio - 2.0).abs() > ASPECT_TOLERANCE {
            return Err(Error::AspectRatio { width, height });
        }
        if u64::from(width) != u64::from(height) * 2 {
            tracing::warn!(width, height, "photo is not exactly 2:1, accepted within tolerance");
        }
        Ok(Self(buffer))
    }

    /// Decode and validate a photo.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] for undecodable bytes, otherwise see [`new`](Self::new).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::new(PixelBuffer::decode(bytes)?)
    }

    /// Load and validate a photo from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if the file cannot be read or decoded,
    /// otherwise see [`new`](Self::new).
    pub fn open(path: &Path) -> Result<Self> {
        Self::new(crate::codec::open(path)?)
    }

    /// Side length of the square fisheye working buffers for this photo.
    ///
    /// Equal to `width / 2` for exact 2:1 photos.
    #[must_use]
    pub fn fisheye_side(&self) -> u32 {
        self.height()
    }
}

/// A fisheye working buffer: 32-bit RGBA.
///
/// Squareness is not required here; the projector checks it on entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FisheyeBuffer(PixelBuffer);

buffer_wrapper!(FisheyeBuffer);

impl FisheyeBuffer {
    /// Validate and wrap an RGBA buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixelFormat`] unless the buffer is 32-bit RGBA.
    pub fn new(buffer: PixelBuffer) -> Result<Self> {
        expect_format(&buffer, PixelFormat::Rgba32)?;
        Ok(Self(buffer))
    }

    /// Allocate a fully transparent buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] for zero dimensions.
    pub fn allocate(width: u32, height: u32) -> Result<Self> {
        PixelBuffer::allocate(width, height, PixelFormat::Rgba32).map(Self)
    }

    /// Allocate a square, transparent working buffer sized for `photo`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if the photo is degenerate.
    pub fn for_photo(photo: &Equirect360Buffer) -> Result<Self> {
        let side = photo.fisheye_side();
        Self::allocate(side, side)
    }

    /// Whether width equals height.
    #[must_use]
    pub fn is_square(&self) -> bool {
        self.width() == self.height()
    }
}

/// A watermark or overlay image: 32-bit RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkBuffer(PixelBuffer);

buffer_wrapper!(WatermarkBuffer);

impl WatermarkBuffer {
    /// Validate and wrap an RGBA buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixelFormat`] unless the buffer is 32-bit RGBA.
    pub fn new(buffer: PixelBuffer) -> Result<Self> {
        expect_format(&buffer, PixelFormat::Rgba32)?;
        Ok(Self(buffer))
    }

    /// Allocate a fully transparent buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] for zero dimensions.
    pub fn allocate(width: u32, height: u32) -> Result<Self> {
        PixelBuffer::allocate(width, height, PixelFormat::Rgba32).map(Self)
    }

    /// Decode and validate a watermark.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] for undecodable bytes, otherwise see [`new`](Self::new).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::new(PixelBuffer::decode(bytes)?)
    }

    /// Load and validate a watermark from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if the file cannot be read or decoded,
    /// otherwise see [`new`](Self::new).
    pub fn open(path: &Path) -> Result<Self> {
        Self::new(crate::codec::open(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn rgb(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::allocate(width, height, PixelFormat::Rgb24).unwrap()
    }

    #[test]
    fn equirect_accepts_exact_two_to_one() {
        let photo = Equirect360Buffer::new(rgb(400, 200)).unwrap();
        assert_eq!(photo.dimensions(), (400, 200));
        assert_eq!(photo.fisheye_side(), 200);
    }

    #[test]
    fn equirect_accepts_ratio_within_tolerance() {
        // 3999 / 2000 = 1.9995
        assert!(Equirect360Buffer::new(rgb(3999, 2000)).is_ok());
    }

    #[test]
    fn equirect_rejects_ratio_outside_tolerance() {
        // 380 / 200 = 1.9
        let err = Equirect360Buffer::new(rgb(380, 200)).unwrap_err();
        assert!(matches!(
            err,
            Error::AspectRatio {
                width: 380,
                height: 200
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn equirect_rejects_rgba() {
        let buf = PixelBuffer::allocate(40, 20, PixelFormat::Rgba32).unwrap();
        let err = Equirect360Buffer::new(buf).unwrap_err();
        assert!(matches!(
            err,
            Error::PixelFormat {
                expected: PixelFormat::Rgb24,
                actual: PixelFormat::Rgba32
            }
        ));
    }

    #[test]
    fn fisheye_and_watermark_require_rgba() {
        assert!(FisheyeBuffer::new(rgb(4, 4)).is_err());
        assert!(WatermarkBuffer::new(rgb(4, 4)).is_err());

        let rect = FisheyeBuffer::allocate(6, 4).unwrap();
        assert!(!rect.is_square());
        assert_eq!(rect.format(), PixelFormat::Rgba32);
    }

    #[test]
    fn fisheye_for_photo_is_square_half_width() {
        let photo = Equirect360Buffer::new(rgb(64, 32)).unwrap();
        let fisheye = FisheyeBuffer::for_photo(&photo).unwrap();
        assert_eq!(fisheye.dimensions(), (32, 32));
        assert!(fisheye.is_square());
    }

    #[test]
    fn wrappers_deref_to_pixel_access() {
        let mut wm = WatermarkBuffer::allocate(2, 2).unwrap();
        wm.set_pixel(1, 1, crate::pixel::Color::WHITE).unwrap();
        let inner = wm.into_inner();
        assert_eq!(inner.get_pixel(1, 1).unwrap(), crate::pixel::Color::WHITE);
    }
}
