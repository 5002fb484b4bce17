//! Project flat watermarks onto 360° equirectangular photos.
//!
//! Dual-fisheye cameras stitch two hemispheres into a 2:1 equirectangular
//! image. A logo pasted onto that image directly looks stretched near the
//! poles. This crate draws the logo where the lenses would have seen it,
//! bends it through the fisheye lens model, unwraps the result into the
//! equirectangular layout and blends it onto the photo.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use sphere_watermark::{ProcessOptions, Watermarker};
//!
//! let opts = ProcessOptions::default();
//! let engine = Watermarker::from_path(Path::new("logo.png"), &opts)?;
//! let result = engine.process_file(Path::new("pano.jpg"), Path::new("pano_marked.jpg"), &opts);
//! println!("{}", result.message);
//! # Ok::<(), sphere_watermark::Error>(())
//! ```
//!
//! # Step by step
//!
//! ```no_run
//! use std::path::Path;
//! use sphere_watermark::{
//!     Equirect360Buffer, FactorBlend, IndicatrixCatalog, WatermarkBuffer, WatermarkCompositor,
//! };
//!
//! let photo = Equirect360Buffer::open(Path::new("pano.jpg"))?;
//! let logo = WatermarkBuffer::open(Path::new("logo.png"))?;
//! let blend = FactorBlend::new(0.6);
//!
//! let mut compositor =
//!     WatermarkCompositor::new(&photo, &logo, &blend, &IndicatrixCatalog::with_poles())?;
//! compositor.prepare()?;
//! let out = compositor.apply()?;
//! sphere_watermark::codec::save(&out, Path::new("pano_marked.jpg"), 95)?;
//! # Ok::<(), sphere_watermark::Error>(())
//! ```

#![deny(missing_docs)]

pub mod bitmap;
pub mod blending;
pub mod codec;
pub mod compositor;
mod engine;
pub mod error;
pub mod fisheye;
pub mod indicatrix;
pub mod pixel;
mod rows;
pub mod transform;

pub use bitmap::{Equirect360Buffer, FisheyeBuffer, WatermarkBuffer};
pub use blending::{BlendAlgorithm, FactorBlend};
pub use codec::{default_output_path, is_supported_image};
pub use compositor::{watermark_photo, WatermarkCompositor};
pub use engine::{CatalogChoice, ProcessOptions, ProcessResult, Watermarker};
pub use error::{Error, ErrorKind, Result};
pub use indicatrix::{IndicatrixCatalog, IndicatrixDescriptor, Position};
pub use pixel::{Color, PixelBuffer, PixelFormat};
