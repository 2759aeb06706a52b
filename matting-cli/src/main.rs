//! Thin command-line front end over `matting-core`.
//!
//! Accepts either a color image plus a separate grayscale prior mask,
//! or a single RGBA image whose alpha channel carries the prior mask
//! (`spec.md` §4.F's canonical single-buffer input convention). Runs
//! the matting pipeline and writes the result as a straight RGBA PNG
//! (foreground color in RGB, solved alpha in the alpha channel).

mod config;
mod error;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::ConfigOverrides;
use error::CliError;
use matting_core::{encode_rgba8, Image, Mask, MattingPipeline, PipelineRequest, TrimapInput};

#[derive(Parser)]
#[command(about = "Closed-form alpha matting from an image and a prior mask")]
struct Cli {
    /// Input color image (any format `image` can decode).
    #[arg(short, long, value_name = "FILE", required_unless_present = "rgba")]
    input: Option<PathBuf>,

    /// Grayscale prior mask: white is foreground-like, black is
    /// background-like. Read from the luma channel.
    #[arg(short, long, value_name = "FILE", required_unless_present = "rgba")]
    mask: Option<PathBuf>,

    /// Single RGBA image: RGB is the color image, alpha is the prior
    /// mask (0 = background-like, 255 = foreground-like). Mutually
    /// exclusive with `--input`/`--mask`.
    #[arg(long, value_name = "FILE", conflicts_with_all = ["input", "mask"])]
    rgba: Option<PathBuf>,

    /// Output RGBA PNG.
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Optional JSON file overriding any subset of the default parameters.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use entropy-band trimap construction instead of threshold erosion.
    #[arg(long, default_value_t = false)]
    entropy: bool,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(cli)?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let (image, mask) = if let Some(rgba_path) = &cli.rgba {
        // spec.md §4.F step 1: a single H*W*4 RGBA buffer, RGB as the
        // image and the alpha byte as the trimap probability.
        let rgba_dyn = image::open(rgba_path).map_err(|source| CliError::ReadImage {
            path: rgba_path.clone(),
            source,
        })?;
        let height = rgba_dyn.height() as usize;
        let width = rgba_dyn.width() as usize;
        let raw = rgba_dyn.to_rgba8();
        let buf = raw.as_raw();
        let image = Image::from_rgba8(buf, height, width)?;
        let mask = Mask::from_rgba8_alpha(buf, height, width)?;
        (image, mask)
    } else {
        let input_path = cli.input.as_ref().expect("clap enforces --input when --rgba is absent");
        let mask_path = cli.mask.as_ref().expect("clap enforces --mask when --rgba is absent");

        let image_dyn = image::open(input_path).map_err(|source| CliError::ReadImage {
            path: input_path.clone(),
            source,
        })?;
        let mask_dyn = image::open(mask_path).map_err(|source| CliError::ReadImage {
            path: mask_path.clone(),
            source,
        })?;

        if image_dyn.width() != mask_dyn.width() || image_dyn.height() != mask_dyn.height() {
            return Err(CliError::DimensionMismatch {
                image_w: image_dyn.width(),
                image_h: image_dyn.height(),
                mask_w: mask_dyn.width(),
                mask_h: mask_dyn.height(),
            });
        }

        let height = image_dyn.height() as usize;
        let width = image_dyn.width() as usize;

        let rgb = image_dyn.to_rgb8();
        let image_data: Vec<f64> = rgb.as_raw().iter().map(|&b| b as f64 / 255.0).collect();
        let image = Image::from_vec(image_data, height, width)?;

        let luma = mask_dyn.to_luma8();
        let mask_data: Vec<f64> = luma.as_raw().iter().map(|&b| b as f64 / 255.0).collect();
        let mask = Mask::from_vec(mask_data, height, width)?;
        (image, mask)
    };
    let (height, width) = (image.height(), image.width());

    let mut params = matting_core::Parameters {
        use_entropy: cli.entropy,
        ..matting_core::Parameters::default()
    };
    if let Some(config_path) = &cli.config {
        let overrides = ConfigOverrides::load(config_path)?;
        params = overrides.apply(params);
    }

    let pipeline = MattingPipeline::new().with_parameters(params);
    let request = PipelineRequest::new(image, TrimapInput::Mask(mask));

    let response = pipeline.run_with_progress(&request, |pct| {
        tracing::info!(percent = pct, "matting progress");
    })?;

    if response.status == matting_core::PipelineStatus::Degraded {
        tracing::warn!("solver did not converge; output uses the clamped prior trimap");
    }

    let rgba = encode_rgba8(&response.foreground, &response.alpha);
    let out_image =
        image::RgbaImage::from_raw(width as u32, height as u32, rgba).expect("buffer length matches dimensions");
    out_image
        .save(&cli.output)
        .map_err(|source| CliError::WriteImage {
            path: cli.output.clone(),
            source,
        })?;

    Ok(())
}
