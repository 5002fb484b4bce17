//! Reading and writing encoded images.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};
use crate::pixel::PixelBuffer;

/// JPEG quality used when the caller does not pick one.
pub const DEFAULT_JPEG_QUALITY: u8 = 100;

/// Decode an in-memory image.
///
/// # Errors
///
/// Returns [`Error::Image`] if the bytes cannot be decoded.
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer> {
    PixelBuffer::from_dynamic(image::load_from_memory(bytes)?)
}

/// Decode an image file, guessing the format from its contents and extension.
///
/// # Errors
///
/// Returns [`Error::Image`] if the file cannot be read or decoded.
pub fn open(path: &Path) -> Result<PixelBuffer> {
    PixelBuffer::from_dynamic(image::open(path)?)
}

/// Encode with [`DEFAULT_JPEG_QUALITY`].
///
/// # Errors
///
/// See [`write_to`].
pub fn encode(buffer: &PixelBuffer, format: ImageFormat) -> Result<Vec<u8>> {
    encode_with_quality(buffer, format, DEFAULT_JPEG_QUALITY)
}

/// Encode into memory. `quality` only affects JPEG.
///
/// # Errors
///
/// See [`write_to`].
pub fn encode_with_quality(buffer: &PixelBuffer, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    write_to(buffer, &mut bytes, format, quality)?;
    Ok(bytes)
}

/// Encode into any writer.
///
/// JPEG, PNG and BMP are supported. JPEG drops the alpha channel; `quality`
/// is clamped to `1..=100` and ignored by the other formats.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for other formats and
/// [`Error::Image`] if encoding or writing fails.
pub fn write_to<W: Write>(
    buffer: &PixelBuffer,
    writer: &mut W,
    format: ImageFormat,
    quality: u8,
) -> Result<()> {
    let image = buffer.to_dynamic()?;
    match format {
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(image.into_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(writer, quality.clamp(1, 100)))?;
        }
        ImageFormat::Png => image.write_with_encoder(PngEncoder::new(writer))?,
        ImageFormat::Bmp => image.write_with_encoder(BmpEncoder::new(writer))?,
        other => return Err(Error::UnsupportedFormat(format!("{other:?}"))),
    }
    Ok(())
}

/// Save to `path`, choosing the container from the extension.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for unknown extensions,
/// [`Error::Io`] if the file cannot be created, otherwise see [`write_to`].
pub fn save(buffer: &PixelBuffer, path: &Path, quality: u8) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
    let mut writer = BufWriter::new(File::create(path)?);
    write_to(buffer, &mut writer, format, quality)?;
    writer.flush()?;
    Ok(())
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png" | "bmp"),
        None => false,
    }
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_watermarked.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_watermarked.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pixel::{Color, PixelFormat};

    fn sample(format: PixelFormat) -> PixelBuffer {
        let mut buf = PixelBuffer::allocate(6, 3, format).unwrap();
        buf.set_pixel(0, 0, Color::rgba(255, 0, 0, 255)).unwrap();
        buf.set_pixel(5, 2, Color::rgba(0, 0, 255, 128)).unwrap();
        buf.set_pixel(2, 1, Color::rgba(10, 200, 30, 255)).unwrap();
        buf
    }

    #[test]
    fn png_keeps_alpha_and_channel_order() {
        let src = sample(PixelFormat::Rgba32);
        let back = decode(&encode(&src, ImageFormat::Png).unwrap()).unwrap();
        assert_eq!(back.format(), PixelFormat::Rgba32);
        assert_eq!(back, src);
    }

    #[test]
    fn bmp_keeps_rgb_pixels() {
        let src = sample(PixelFormat::Rgb24);
        let back = decode(&encode(&src, ImageFormat::Bmp).unwrap()).unwrap();
        assert_eq!(back.format(), PixelFormat::Rgb24);
        assert_eq!(back.get_pixel(2, 1).unwrap(), Color::rgb(10, 200, 30));
    }

    #[test]
    fn jpeg_output_is_opaque_rgb() {
        let bytes = encode(&sample(PixelFormat::Rgba32), ImageFormat::Jpeg).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let back = decode(&bytes).unwrap();
        assert_eq!(back.format(), PixelFormat::Rgb24);
        assert_eq!(back.dimensions(), (6, 3));
    }

    #[test]
    fn lower_quality_jpeg_is_smaller() {
        let mut buf = PixelBuffer::allocate(64, 32, PixelFormat::Rgb24).unwrap();
        for y in 0..32u8 {
            for x in 0..64u8 {
                let c = Color::rgb(x.wrapping_mul(37), y.wrapping_mul(91), x ^ y);
                buf.set_pixel(u32::from(x), u32::from(y), c).unwrap();
            }
        }
        let best = encode_with_quality(&buf, ImageFormat::Jpeg, 100).unwrap();
        let worst = encode_with_quality(&buf, ImageFormat::Jpeg, 10).unwrap();
        assert!(worst.len() < best.len());
    }

    #[test]
    fn unsupported_container_is_rejected() {
        let err = encode(&sample(PixelFormat::Rgb24), ImageFormat::Gif).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn corrupt_bytes_fail_to_decode() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Image(_)));
    }

    #[test]
    fn save_picks_format_from_extension() {
        let dir = std::env::temp_dir().join(format!("sphere-watermark-codec-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sample.png");

        let src = sample(PixelFormat::Rgba32);
        save(&src, &path, DEFAULT_JPEG_QUALITY).unwrap();
        assert_eq!(open(&path).unwrap(), src);

        assert!(save(&src, &dir.join("sample.xyz"), DEFAULT_JPEG_QUALITY).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn default_output_path_appends_watermarked_suffix() {
        let p = default_output_path(Path::new("/tmp/pano.jpg"));
        assert_eq!(p, PathBuf::from("/tmp/pano_watermarked.jpg"));

        let p = default_output_path(Path::new("pano.png"));
        assert_eq!(
            p.file_name().unwrap().to_str().unwrap(),
            "pano_watermarked.png"
        );
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("pano.jpg")));
        assert!(is_supported_image(Path::new("pano.JPEG")));
        assert!(is_supported_image(Path::new("pano.png")));
        assert!(is_supported_image(Path::new("pano.bmp")));
        assert!(!is_supported_image(Path::new("pano.gif")));
        assert!(!is_supported_image(Path::new("pano.webp")));
        assert!(!is_supported_image(Path::new("pano")));
    }
}
