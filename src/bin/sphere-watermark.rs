use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use sphere_watermark::{
    default_output_path, CatalogChoice, FactorBlend, ProcessOptions, ProcessResult, Watermarker,
};

#[derive(Clone, Copy, ValueEnum)]
enum Catalog {
    /// Twelve placements: four per hemisphere, four on the equator
    Standard,
    /// Standard placements plus one at each pole
    Poles,
}

impl From<Catalog> for CatalogChoice {
    fn from(catalog: Catalog) -> Self {
        match catalog {
            Catalog::Standard => Self::Standard,
            Catalog::Poles => Self::WithPoles,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "sphere-watermark",
    about = "Project a watermark onto 360° equirectangular photos through the dual-fisheye lens model",
    version,
    after_help = "Simple usage: sphere-watermark pano.jpg -w logo.png  (writes pano_watermarked.jpg)\n\n\
                  NOTE: Photos must be 2:1 equirectangular images; the watermark must have an alpha channel."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input photo or directory
    input: String,

    /// Watermark image with alpha channel (PNG recommended)
    #[arg(short, long)]
    watermark: PathBuf,

    /// Output file or directory (default: {name}_watermarked.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// Watermark weight (0.0-1.0, values outside are clamped)
    #[arg(short, long, default_value = "0.5", allow_negative_numbers = true)]
    factor: f64,

    /// Placement set
    #[arg(short, long, value_enum, default_value = "standard")]
    catalog: Catalog,

    /// Only apply these catalog indices, in order (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    descriptors: Option<Vec<usize>>,

    /// JPEG quality (1-100)
    #[arg(long, default_value = "100")]
    quality: u8,

    /// Replace existing output files
    #[arg(long)]
    overwrite: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let factor = FactorBlend::new(cli.factor).factor();
    if factor.to_bits() != cli.factor.to_bits() {
        tracing::warn!(requested = cli.factor, factor, "factor clamped to [0, 1]");
    }

    if !(1..=100).contains(&cli.quality) {
        eprintln!("Error: Quality must be between 1 and 100");
        process::exit(1);
    }

    let opts = ProcessOptions {
        factor,
        catalog: cli.catalog.into(),
        descriptors: cli.descriptors,
        jpeg_quality: cli.quality,
        overwrite: cli.overwrite,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let engine = match Watermarker::from_path(&cli.watermark, &opts) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Fatal: Failed to load watermark {}: {e}", cli.watermark.display());
            process::exit(1);
        }
    };

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if !opts.quiet {
        eprintln!(
            "Applying {} placements (factor: {:.0}%)",
            engine.catalog().len(),
            opts.factor * 100.0
        );
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: sphere-watermark <input_dir> -w <watermark> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![engine.process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` shows debug and `--quiet` only errors.
fn init_tracing(verbose: bool, quiet: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "sphere_watermark=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            eprintln!("[OK] {filename} -> {}", result.output.display());
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
