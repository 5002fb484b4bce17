//! Batch watermarking engine.

use std::path::{Path, PathBuf};

use crate::bitmap::{Equirect360Buffer, WatermarkBuffer};
use crate::blending::{BlendAlgorithm, FactorBlend};
use crate::codec::{self, is_supported_image, DEFAULT_JPEG_QUALITY};
use crate::compositor;
use crate::error::{Error, ErrorKind, Result};
use crate::indicatrix::IndicatrixCatalog;

/// Which built-in descriptor set to start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogChoice {
    /// The twelve standard placements.
    #[default]
    Standard,
    /// The standard placements plus one at each pole.
    WithPoles,
}

impl CatalogChoice {
    /// Build the catalog.
    #[must_use]
    pub fn catalog(self) -> IndicatrixCatalog {
        match self {
            Self::Standard => IndicatrixCatalog::standard(),
            Self::WithPoles => IndicatrixCatalog::with_poles(),
        }
    }
}

/// Options controlling watermark processing behavior.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Overlay weight for [`FactorBlend`], clamped to `[0, 1]`.
    pub factor: f64,
    /// Built-in descriptor set.
    pub catalog: CatalogChoice,
    /// Catalog indices to apply, in order. `None` applies all of them.
    pub descriptors: Option<Vec<usize>>,
    /// JPEG output quality (1-100).
    pub jpeg_quality: u8,
    /// Replace output files that already exist.
    pub overwrite: bool,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            factor: FactorBlend::DEFAULT_FACTOR,
            catalog: CatalogChoice::Standard,
            descriptors: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            overwrite: false,
            verbose: false,
            quiet: false,
        }
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Where the watermarked photo was (or would have been) written.
    pub output: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (not a 360° photo, or output exists).
    pub skipped: bool,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(input: &Path, output: &Path) -> Self {
        Self {
            path: input.to_path_buf(),
            output: output.to_path_buf(),
            success: false,
            skipped: false,
            message: String::new(),
        }
    }

    fn skip(mut self, message: String) -> Self {
        self.success = true;
        self.skipped = true;
        self.message = message;
        self
    }

    fn fail(mut self, message: String) -> Self {
        self.message = message;
        self
    }
}

/// Applies one watermark to many photos.
///
/// Create once with [`Watermarker::new`] and reuse for multiple photos. The
/// catalog is fitted to each photo's resolution as it is processed.
pub struct Watermarker {
    watermark: WatermarkBuffer,
    catalog: IndicatrixCatalog,
    algorithm: Box<dyn BlendAlgorithm>,
}

impl Watermarker {
    /// Create an engine for `watermark` configured from `opts`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDescriptor`] if `opts.descriptors` names a
    /// missing index and [`Error::MissingArgument`] if it selects nothing.
    pub fn new(watermark: WatermarkBuffer, opts: &ProcessOptions) -> Result<Self> {
        let mut catalog = opts.catalog.catalog();
        if let Some(indices) = &opts.descriptors {
            catalog = catalog.select(indices)?;
        }
        if catalog.is_empty() {
            return Err(Error::MissingArgument("indicatrix descriptors"));
        }
        Ok(Self {
            watermark,
            catalog,
            algorithm: Box::new(FactorBlend::new(opts.factor)),
        })
    }

    /// Load the watermark from disk, then see [`new`](Self::new).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if the file cannot be decoded and
    /// [`Error::PixelFormat`] unless it has an alpha channel.
    pub fn from_path(watermark: &Path, opts: &ProcessOptions) -> Result<Self> {
        Self::new(WatermarkBuffer::open(watermark)?, opts)
    }

    /// Replace the blend algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Box<dyn BlendAlgorithm>) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Descriptors applied to every photo, at their reference resolution.
    #[must_use]
    pub fn catalog(&self) -> &IndicatrixCatalog {
        &self.catalog
    }

    /// The undistorted watermark.
    #[must_use]
    pub fn watermark_image(&self) -> &WatermarkBuffer {
        &self.watermark
    }

    /// Composite the watermark onto `photo`, returning a new photo.
    ///
    /// # Errors
    ///
    /// See [`compositor::watermark_photo`].
    pub fn watermark(&self, photo: &Equirect360Buffer) -> Result<Equirect360Buffer> {
        compositor::watermark_photo(photo, &self.watermark, self.algorithm.as_ref(), &self.catalog)
    }

    /// Process a single image file: load, validate, watermark, save.
    ///
    /// Images that are not 24-bit 2:1 photos are skipped with the reason.
    #[must_use]
    #[tracing::instrument(skip(self, opts), fields(input = %input.display()))]
    pub fn process_file(&self, input: &Path, output: &Path, opts: &ProcessOptions) -> ProcessResult {
        let result = ProcessResult::new(input, output);

        if output.exists() && !opts.overwrite {
            tracing::warn!(output = %output.display(), "output exists, skipping");
            return result.skip(format!("Output exists: {}", output.display()));
        }

        let photo = match codec::open(input).and_then(Equirect360Buffer::new) {
            Ok(photo) => photo,
            Err(e) if e.kind() == ErrorKind::Format => {
                tracing::warn!(error = %e, "not a 360° photo, skipping");
                return result.skip(format!("Not a 360° photo: {e}"));
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load");
                return result.fail(format!("Failed to load: {e}"));
            }
        };

        let watermarked = match self.watermark(&photo) {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(error = %e, "failed to watermark");
                return result.fail(format!("Failed to watermark: {e}"));
            }
        };

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return result.fail(format!("Failed to create output directory: {e}"));
                }
            }
        }

        match codec::save(&watermarked, output, opts.jpeg_quality) {
            Ok(()) => {
                tracing::info!(output = %output.display(), "saved");
                ProcessResult {
                    success: true,
                    message: format!("Watermarked ({}x{})", photo.width(), photo.height()),
                    ..result
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to save");
                result.fail(format!("Failed to save: {e}"))
            }
        }
    }

    /// Process all supported images in a directory.
    ///
    /// Files are processed in parallel when the `parallel` feature is enabled.
    /// Returns a [`ProcessResult`] for each image found.
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                return vec![ProcessResult::new(input_dir, output_dir)
                    .fail(format!("Failed to read directory: {e}"))];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult::new(input_dir, output_dir)
                    .fail(format!("Failed to create output directory: {e}"))];
            }
        }
        tracing::debug!(files = entries.len(), dir = %input_dir.display(), "processing directory");

        let run = |input_path: &PathBuf| match input_path.file_name() {
            Some(filename) => self.process_file(input_path, &output_dir.join(filename), opts),
            None => ProcessResult::new(input_path, output_dir).fail("No file name".to_string()),
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            entries.par_iter().map(run).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            entries.iter().map(run).collect()
        }
    }
}
