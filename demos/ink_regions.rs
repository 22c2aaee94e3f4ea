//! Ink Regions Example
//!
//! This example runs the ink pipeline on an image and prints the highlighted regions in
//! reading order. No OCR engine ships with the crate, so the example plugs in a
//! recognizer that describes each block (size and mean color); replace it with a real
//! [`TextRecognizer`] to read text.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example ink_regions -- [OPTIONS] <INPUT>
//! ```
//!
//! # Arguments
//!
//! * `<INPUT>` - Image file, or a text file holding a base64 payload / data URL with `--data-url`
//! * `-c, --config` - JSON or TOML pipeline configuration
//! * `--row-threshold` - Override the row clustering threshold
//! * `--hue-low`, `--hue-high` - Override the hue band (0..=179)
//! * `--right-to-left` - Use the legacy x-descending seed order
//! * `-o, --output-dir` - Write mask, diagnostic and overlay PNGs here
//! * `--json` - Print the result as JSON instead of block lines
//!
//! # Example
//!
//! ```bash
//! RUST_LOG=debug cargo run --example ink_regions -- -o out --row-threshold 25 page.jpg
//! ```

use clap::Parser;
use image::RgbImage;
use inkread::core::{Detection, RecognitionError, TextRecognizer};
use inkread::pipeline::{InkPipelineBuilder, PipelineConfig};
use inkread::processors::ScanDirection;
use inkread::utils::init_tracing;
use inkread::utils::{decode_data_url, load_image};
use std::path::PathBuf;
use tracing::{error, info};

/// Command-line arguments for the ink regions example
#[derive(Parser)]
#[command(name = "ink_regions")]
#[command(about = "Ink Regions Example - lists highlighted regions in reading order")]
struct Args {
    /// Image file (or base64 payload file with --data-url)
    input: PathBuf,

    /// Treat the input file as a base64 payload or data URL
    #[arg(long)]
    data_url: bool,

    /// Pipeline configuration file (.json or .toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vertical distance in pixels under which regions share a row
    #[arg(long)]
    row_threshold: Option<u32>,

    /// Lower bound of the hue band
    #[arg(long, requires = "hue_high")]
    hue_low: Option<u8>,

    /// Upper bound of the hue band
    #[arg(long, requires = "hue_low")]
    hue_high: Option<u8>,

    /// Seed regions by descending x instead of top to bottom
    #[arg(long)]
    right_to_left: bool,

    /// Directory for the mask, diagnostic and overlay images
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

/// Describes a block instead of reading it.
struct BlockDescriber;

impl TextRecognizer for BlockDescriber {
    fn recognize(&self, block: &RgbImage) -> Result<Vec<Detection>, RecognitionError> {
        let count = (block.width() as u64 * block.height() as u64).max(1);
        let mut sums = [0u64; 3];
        for pixel in block.pixels() {
            for (sum, channel) in sums.iter_mut().zip(pixel.0) {
                *sum += channel as u64;
            }
        }
        let text = format!(
            "{}x{} mean rgb({}, {}, {})",
            block.width(),
            block.height(),
            sums[0] / count,
            sums[1] / count,
            sums[2] / count
        );
        Ok(vec![Detection::new(text, 1.0)])
    }

    fn name(&self) -> &str {
        "block-describer"
    }
}

fn build_config(args: &Args) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(threshold) = args.row_threshold {
        config.clustering.row_threshold = threshold;
    }
    if let (Some(low), Some(high)) = (args.hue_low, args.hue_high) {
        config.color_mask.hue_range = (low, high);
    }
    if args.right_to_left {
        config.clustering.scan_direction = ScanDirection::RightToLeft;
    }
    if args.output_dir.is_some() {
        config.keep_mask = true;
        config.diagnostic.enabled = true;
    }
    Ok(config)
}

fn load_input(args: &Args) -> Result<RgbImage, Box<dyn std::error::Error>> {
    if args.data_url {
        let payload = std::fs::read_to_string(&args.input)?;
        Ok(decode_data_url(&payload)?)
    } else {
        Ok(load_image(&args.input)?)
    }
}

#[cfg(feature = "visualization")]
fn save_overlay(
    image: &RgbImage,
    pipeline: &inkread::pipeline::InkPipeline,
    dir: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    use inkread::utils::visualization::{OverlayConfig, draw_region_overlay};

    let sequence = pipeline.visiting_sequence(image)?.bounds();
    let overlay = draw_region_overlay(image, &sequence, &OverlayConfig::default());
    let path = dir.join("overlay.png");
    overlay.save(&path)?;
    info!("Saved overlay to {}", path.display());
    Ok(())
}

/// Main function for the ink regions example
fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let config = build_config(&args)?;
    let image = load_input(&args)?;
    info!(
        "Loaded {} ({}x{})",
        args.input.display(),
        image.width(),
        image.height()
    );

    let pipeline = InkPipelineBuilder::new(BlockDescriber)
        .config(config)
        .build()?;

    let result = match pipeline.process(&image) {
        Ok(result) => result,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            return Err(e.into());
        }
    };

    if args.json {
        println!("{}", result.to_json()?);
    } else {
        print!("{}", result);
    }

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)?;
        if let Some(mask) = &result.mask {
            let path = dir.join("mask.png");
            mask.as_gray().save(&path)?;
            info!("Saved mask to {}", path.display());
        }
        if let Some(diagnostic) = &result.diagnostic {
            let path = dir.join("diagnostic.png");
            diagnostic.save(&path)?;
            info!("Saved diagnostic image to {}", path.display());
        }
        #[cfg(feature = "visualization")]
        save_overlay(&image, &pipeline, dir)?;
    }

    Ok(())
}
