//! Owned pixel storage with scoped, bounds-checked access.
//!
//! A [`PixelBuffer`] stores pixels packed and row-major. Channels are laid out
//! low byte to high byte as `B, G, R` for [`PixelFormat::Rgb24`] and
//! `B, G, R, A` for [`PixelFormat::Rgba32`].
//!
//! Raw memory is only reachable through two borrowed views:
//!
//! - [`LockedView`], obtained with [`PixelBuffer::lock`], grants exclusive
//!   read/write access.
//! - [`PixelView`], obtained with [`PixelBuffer::view`], grants shared
//!   read-only access and is what parallel stages read their sources through.
//!
//! Both carry an explicit stride and reject coordinates with `x >= width` or
//! `y >= height`.

use std::fmt;
use std::ops::Range;

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

use crate::error::{Error, Result};
use crate::rows;

/// Pixel layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 24 bits per pixel, stored `B, G, R`.
    Rgb24,
    /// 32 bits per pixel, stored `B, G, R, A`.
    Rgba32,
}

impl PixelFormat {
    /// Number of bytes one pixel occupies.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb24 => 3,
            Self::Rgba32 => 4,
        }
    }

    /// Whether the layout carries an alpha channel.
    #[must_use]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba32)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb24 => f.write_str("24-bit RGB"),
            Self::Rgba32 => f.write_str("32-bit RGBA"),
        }
    }
}

/// A color independent of storage layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel, 255 is fully opaque.
    pub a: u8,
}

impl Color {
    /// Fully transparent black, the value of freshly allocated RGBA pixels.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque color from red, green and blue.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color with an explicit alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Read a stored pixel. 24-bit pixels read as opaque.
    pub(crate) fn from_bytes(bytes: &[u8], format: PixelFormat) -> Self {
        match format {
            PixelFormat::Rgb24 => Self::rgb(bytes[2], bytes[1], bytes[0]),
            PixelFormat::Rgba32 => Self::rgba(bytes[2], bytes[1], bytes[0], bytes[3]),
        }
    }

    /// Store this color. Alpha is dropped for 24-bit pixels.
    pub(crate) fn write_bytes(self, bytes: &mut [u8], format: PixelFormat) {
        bytes[0] = self.b;
        bytes[1] = self.g;
        bytes[2] = self.r;
        if format.has_alpha() {
            bytes[3] = self.a;
        }
    }
}

/// Geometry shared by a buffer and its views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl Layout {
    fn new(width: u32, height: u32, format: PixelFormat) -> Result<(Self, usize)> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(format.bytes_per_pixel()))
            .ok_or(Error::InvalidDimensions { width, height })?;
        Ok((
            Self {
                width,
                height,
                format,
            },
            len,
        ))
    }

    fn stride(self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    fn offset(self, x: u32, y: u32) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(Error::PixelOutOfBounds {
                x: i64::from(x),
                y: i64::from(y),
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.stride() + x as usize * self.format.bytes_per_pixel())
    }

    fn pixel_range(self, x: u32, y: u32) -> Result<Range<usize>> {
        let start = self.offset(x, y)?;
        Ok(start..start + self.format.bytes_per_pixel())
    }

    fn row_range(self, y: u32) -> Result<Range<usize>> {
        let start = self.offset(0, y)?;
        Ok(start..start + self.stride())
    }

    /// Validate that a `width`x`height` rectangle at `(x, y)` lies inside.
    fn region_origin(self, x: i64, y: i64, width: u32, height: u32) -> Result<(u32, u32)> {
        let fits = x >= 0
            && y >= 0
            && x.saturating_add(i64::from(width)) <= i64::from(self.width)
            && y.saturating_add(i64::from(height)) <= i64::from(self.height);
        match (u32::try_from(x), u32::try_from(y)) {
            (Ok(x), Ok(y)) if fits => Ok((x, y)),
            _ => Err(Error::RegionOutOfBounds {
                x,
                y,
                region_width: width,
                region_height: height,
                width: self.width,
                height: self.height,
            }),
        }
    }
}

/// Owned, decoded pixel store.
///
/// The store always holds exactly `width * height * bytes_per_pixel` bytes.
/// Cloning deep-copies the store; the clone starts unlocked.
#[derive(Debug)]
pub struct PixelBuffer {
    layout: Layout,
    store: Vec<u8>,
    locked: bool,
}

impl PixelBuffer {
    /// Allocate a zero-filled buffer.
    ///
    /// Zeroed RGBA pixels are fully transparent; zeroed RGB pixels are black.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either dimension is zero or the
    /// store size overflows.
    pub fn allocate(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let (layout, len) = Layout::new(width, height, format)?;
        Ok(Self {
            layout,
            store: vec![0; len],
            locked: false,
        })
    }

    /// Wrap an existing packed store laid out as described in the module docs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLength`] if `store` has the wrong length, or
    /// [`Error::InvalidDimensions`] for zero dimensions.
    pub fn from_raw(width: u32, height: u32, format: PixelFormat, store: Vec<u8>) -> Result<Self> {
        let (layout, len) = Layout::new(width, height, format)?;
        if store.len() != len {
            return Err(Error::BufferLength {
                expected: len,
                actual: store.len(),
            });
        }
        Ok(Self {
            layout,
            store,
            locked: false,
        })
    }

    /// Decode an encoded image (JPEG, PNG, BMP, ...).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] on corrupt or unsupported input.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        crate::codec::decode(bytes)
    }

    /// Convert a decoded image. Images with an alpha channel become
    /// [`PixelFormat::Rgba32`], all others [`PixelFormat::Rgb24`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] for empty images.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        let (width, height) = (image.width(), image.height());
        if image.color().has_alpha() {
            let mut store = image.into_rgba8().into_raw();
            swap_red_blue(&mut store, PixelFormat::Rgba32);
            Self::from_raw(width, height, PixelFormat::Rgba32, store)
        } else {
            let mut store = image.into_rgb8().into_raw();
            swap_red_blue(&mut store, PixelFormat::Rgb24);
            Self::from_raw(width, height, PixelFormat::Rgb24, store)
        }
    }

    /// Copy into an [`image::DynamicImage`] (`Rgb8` or `Rgba8`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLength`] if the store no longer matches its
    /// dimensions (never the case for buffers built through this API).
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let mut raw = self.store.clone();
        swap_red_blue(&mut raw, self.format());
        let len = raw.len();
        let (width, height) = self.dimensions();
        let image = match self.format() {
            PixelFormat::Rgb24 => RgbImage::from_raw(width, height, raw).map(DynamicImage::ImageRgb8),
            PixelFormat::Rgba32 => {
                RgbaImage::from_raw(width, height, raw).map(DynamicImage::ImageRgba8)
            }
        };
        image.ok_or(Error::BufferLength {
            expected: self.layout.stride() * height as usize,
            actual: len,
        })
    }

    /// Encode into the given container format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] or [`Error::Image`] on failure.
    pub fn encode(&self, format: ImageFormat) -> Result<Vec<u8>> {
        crate::codec::encode(self, format)
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.layout.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.layout.height
    }

    /// `(width, height)` in pixels.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.layout.width, self.layout.height)
    }

    /// Pixel layout.
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.layout.format
    }

    /// Bytes between the starts of consecutive rows.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    /// The packed store.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.store
    }

    /// Whether a lock is currently held.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Acquire exclusive access to the raw pixels.
    ///
    /// Locking an already locked buffer is a no-op that hands out a view over
    /// the same memory. The lock stays held after the view is dropped until
    /// [`unlock`](Self::unlock) is called.
    pub fn lock(&mut self) -> LockedView<'_> {
        self.locked = true;
        LockedView {
            layout: self.layout,
            data: &mut self.store,
        }
    }

    /// Release the lock. Calling this on an unlocked buffer does nothing.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Run `f` with the buffer locked, restoring the previous lock state on
    /// every exit path, including unwinding.
    pub fn with_lock<R>(&mut self, f: impl FnOnce(&mut LockedView<'_>) -> R) -> R {
        let restore = self.locked;
        self.locked = true;
        let _release = LockRelease {
            flag: &mut self.locked,
            restore,
        };
        let mut view = LockedView {
            layout: self.layout,
            data: &mut self.store,
        };
        f(&mut view)
    }

    /// Shared read-only access to the raw pixels.
    #[must_use]
    pub fn view(&self) -> PixelView<'_> {
        PixelView {
            layout: self.layout,
            data: &self.store,
        }
    }

    /// Read the pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixelOutOfBounds`] if `x >= width` or `y >= height`.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<Color> {
        if self.locked {
            let range = self.layout.pixel_range(x, y)?;
            Ok(Color::from_bytes(&self.store[range], self.layout.format))
        } else {
            self.view().pixel(x, y)
        }
    }

    /// Write the pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixelOutOfBounds`] if `x >= width` or `y >= height`.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) -> Result<()> {
        if self.locked {
            let range = self.layout.pixel_range(x, y)?;
            color.write_bytes(&mut self.store[range], self.layout.format);
            Ok(())
        } else {
            self.with_lock(|view| view.set_pixel(x, y, color))
        }
    }

    /// Copy all of `source` into this buffer with its top-left corner at `(x, y)`.
    ///
    /// # Errors
    ///
    /// See [`insert_region_sized`](Self::insert_region_sized).
    pub fn insert_region(&mut self, source: &PixelBuffer, x: i64, y: i64) -> Result<()> {
        self.insert_region_sized(source, x, y, source.width(), source.height())
    }

    /// Copy the top-left `width`x`height` rectangle of `source` into this
    /// buffer at `(x, y)`.
    ///
    /// Nothing is clipped. Pixels are converted when the formats differ
    /// (alpha is dropped into RGB, RGB becomes opaque RGBA).
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegionOutOfBounds`] before copying anything if the
    /// rectangle does not fit in `source` or in this buffer.
    pub fn insert_region_sized(
        &mut self,
        source: &PixelBuffer,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    ) -> Result<()> {
        source.layout.region_origin(0, 0, width, height)?;
        let (dst_x, dst_y) = self.layout.region_origin(x, y, width, height)?;
        if width == 0 || height == 0 {
            return Ok(());
        }

        let src = source.view();
        let src_format = source.format();
        let dst_format = self.format();
        let src_bpp = src_format.bytes_per_pixel();
        let dst_bpp = dst_format.bytes_per_pixel();
        let stride = self.stride();
        let span = dst_x as usize * dst_bpp..(dst_x + width) as usize * dst_bpp;
        let rows = dst_y as usize * stride..(dst_y + height) as usize * stride;
        let src_len = width as usize * src_bpp;

        self.with_lock(|view| {
            rows::for_each_row(&mut view.as_bytes_mut()[rows], stride, |row, line| {
                let src_row = &src.row(row)?[..src_len];
                let dst_row = &mut line[span.clone()];
                if src_format == dst_format {
                    dst_row.copy_from_slice(src_row);
                } else {
                    for (d, s) in dst_row
                        .chunks_exact_mut(dst_bpp)
                        .zip(src_row.chunks_exact(src_bpp))
                    {
                        Color::from_bytes(s, src_format).write_bytes(d, dst_format);
                    }
                }
                Ok(())
            })
        })
    }
}

impl Clone for PixelBuffer {
    fn clone(&self) -> Self {
        Self {
            layout: self.layout,
            store: self.store.clone(),
            locked: false,
        }
    }
}

impl PartialEq for PixelBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.layout == other.layout && self.store == other.store
    }
}

impl Eq for PixelBuffer {}

/// Restores a buffer's lock flag when dropped.
struct LockRelease<'a> {
    flag: &'a mut bool,
    restore: bool,
}

impl Drop for LockRelease<'_> {
    fn drop(&mut self) {
        *self.flag = self.restore;
    }
}

fn swap_red_blue(bytes: &mut [u8], format: PixelFormat) {
    for px in bytes.chunks_exact_mut(format.bytes_per_pixel()) {
        px.swap(0, 2);
    }
}

/// Shared read-only view over a buffer's pixels.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    layout: Layout,
    data: &'a [u8],
}

impl<'a> PixelView<'a> {
    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.layout.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.layout.height
    }

    /// Pixel layout.
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.layout.format
    }

    /// Bytes between the starts of consecutive rows.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    /// Read the pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixelOutOfBounds`] outside the view.
    pub fn pixel(&self, x: u32, y: u32) -> Result<Color> {
        Ok(Color::from_bytes(self.pixel_bytes(x, y)?, self.layout.format))
    }

    /// Raw stored bytes of the pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixelOutOfBounds`] outside the view.
    pub fn pixel_bytes(&self, x: u32, y: u32) -> Result<&'a [u8]> {
        let range = self.layout.pixel_range(x, y)?;
        Ok(&self.data[range])
    }

    /// Raw bytes of row `y`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixelOutOfBounds`] if `y >= height`.
    pub fn row(&self, y: u32) -> Result<&'a [u8]> {
        let range = self.layout.row_range(y)?;
        Ok(&self.data[range])
    }
}

/// Exclusive read/write view over a locked buffer's pixels.
#[derive(Debug)]
pub struct LockedView<'a> {
    layout: Layout,
    data: &'a mut [u8],
}

impl LockedView<'_> {
    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.layout.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.layout.height
    }

    /// Pixel layout.
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.layout.format
    }

    /// Bytes between the starts of consecutive rows.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    /// Read the pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixelOutOfBounds`] outside the view.
    pub fn pixel(&self, x: u32, y: u32) -> Result<Color> {
        self.as_view().pixel(x, y)
    }

    /// Write the pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixelOutOfBounds`] outside the view.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) -> Result<()> {
        let range = self.layout.pixel_range(x, y)?;
        color.write_bytes(&mut self.data[range], self.layout.format);
        Ok(())
    }

    /// Mutable raw bytes of row `y`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixelOutOfBounds`] if `y >= height`.
    pub fn row_mut(&mut self, y: u32) -> Result<&mut [u8]> {
        let range = self.layout.row_range(y)?;
        Ok(&mut self.data[range])
    }

    /// The whole store, for row-parallel writers.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    /// Reborrow as a read-only view.
    #[must_use]
    pub fn as_view(&self) -> PixelView<'_> {
        PixelView {
            layout: self.layout,
            data: &*self.data,
        }
    }
}
