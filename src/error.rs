//! Error types for the sphere-watermark crate.

use crate::pixel::PixelFormat;

/// Broad category of an [`Error`].
///
/// Lets callers branch on the class of failure without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong pixel format, aspect ratio or shape.
    Format,
    /// Pixel or region access outside buffer extents.
    Bounds,
    /// A required input was missing or empty.
    Argument,
    /// Decode, encode or file system failure.
    Io,
}

/// Errors that can occur while building buffers or running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A buffer has a different pixel layout than the operation requires.
    #[error("pixel format mismatch: expected {expected}, found {actual}")]
    PixelFormat {
        /// Layout the operation requires.
        expected: PixelFormat,
        /// Layout the buffer actually has.
        actual: PixelFormat,
    },

    /// An equirectangular photo is not 2:1.
    #[error("aspect ratio of {width}x{height} is not 2:1")]
    AspectRatio {
        /// Photo width in pixels.
        width: u32,
        /// Photo height in pixels.
        height: u32,
    },

    /// A fisheye buffer handed to the projector is not square.
    #[error("fisheye buffer must be square, got {width}x{height}")]
    NotSquare {
        /// Buffer width in pixels.
        width: u32,
        /// Buffer height in pixels.
        height: u32,
    },

    /// Width or height is zero.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A raw pixel store does not match `width * height * bytes_per_pixel`.
    #[error("pixel store holds {actual} bytes, expected {expected}")]
    BufferLength {
        /// Length implied by the dimensions and format.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// A single pixel coordinate lies outside the buffer.
    #[error("pixel ({x}, {y}) out of bounds for {width}x{height} buffer")]
    PixelOutOfBounds {
        /// Requested column.
        x: i64,
        /// Requested row.
        y: i64,
        /// Buffer width.
        width: u32,
        /// Buffer height.
        height: u32,
    },

    /// A rectangle does not fit inside the buffer it is copied into or out of.
    #[error(
        "region {region_width}x{region_height} at ({x}, {y}) exceeds {width}x{height} buffer"
    )]
    RegionOutOfBounds {
        /// Left edge of the rectangle.
        x: i64,
        /// Top edge of the rectangle.
        y: i64,
        /// Rectangle width.
        region_width: u32,
        /// Rectangle height.
        region_height: u32,
        /// Width of the buffer being addressed.
        width: u32,
        /// Height of the buffer being addressed.
        height: u32,
    },

    /// Two buffers that must match in size do not.
    #[error("size mismatch: expected {expected_width}x{expected_height}, found {width}x{height}")]
    SizeMismatch {
        /// Required width.
        expected_width: u32,
        /// Required height.
        expected_height: u32,
        /// Actual width.
        width: u32,
        /// Actual height.
        height: u32,
    },

    /// A required input is missing or empty.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// A descriptor index does not exist in the catalog.
    #[error("no indicatrix descriptor at index {index} (catalog holds {len})")]
    UnknownDescriptor {
        /// Requested index.
        index: usize,
        /// Number of descriptors in the catalog.
        len: usize,
    },

    /// The codec failed to decode or encode an image.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested container format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /// Classify this error into its [`ErrorKind`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PixelFormat { .. }
            | Self::AspectRatio { .. }
            | Self::NotSquare { .. }
            | Self::InvalidDimensions { .. }
            | Self::BufferLength { .. } => ErrorKind::Format,
            Self::PixelOutOfBounds { .. }
            | Self::RegionOutOfBounds { .. }
            | Self::SizeMismatch { .. } => ErrorKind::Bounds,
            Self::MissingArgument(_) | Self::UnknownDescriptor { .. } => ErrorKind::Argument,
            Self::Image(_) | Self::Io(_) | Self::UnsupportedFormat(_) => ErrorKind::Io,
        }
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
