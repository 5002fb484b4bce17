//! Watermark a single 360° photo.
//!
//! Usage:
//! ```sh
//! cargo run --example watermark_photo -- pano.jpg logo.png pano_marked.jpg
//! ```

use std::env;
use std::path::Path;
use std::process;

use sphere_watermark::{ProcessOptions, Watermarker};

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <photo> <watermark> <output>", args[0]);
        process::exit(1);
    }

    let opts = ProcessOptions {
        overwrite: true,
        ..ProcessOptions::default()
    };
    let engine = match Watermarker::from_path(Path::new(&args[2]), &opts) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    let result = engine.process_file(args[1].as_ref(), args[3].as_ref(), &opts);

    if result.skipped {
        println!("Skipped: {}", result.message);
    } else if result.success {
        println!("Done: {}", result.message);
    } else {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
}
