use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use pixelgrid::{Image, PipelineParams, SampleMode};

fn print_usage() {
    eprintln!("Usage: pixelgrid-demo <input.png|jpg> [output.png] [--pixel-size N] [--mode direct|center|average|weighted]");
}

fn default_out_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    let stem = out.file_stem().unwrap_or_default().to_string_lossy().into_owned();
    out.set_file_name(format!("{stem}.pixelart.png"));
    out
}

fn parse_mode(tag: &str) -> Result<SampleMode> {
    match tag {
        "direct" => Ok(SampleMode::Direct),
        "center" => Ok(SampleMode::Center),
        "average" => Ok(SampleMode::Average),
        "weighted" => Ok(SampleMode::Weighted),
        other => Err(anyhow!("unknown sample mode: {other}")),
    }
}

struct Args {
    input: PathBuf,
    output: PathBuf,
    pixel_size: u32,
    mode: SampleMode,
}

fn parse_args(raw: &[String]) -> Result<Args> {
    if raw.is_empty() {
        return Err(anyhow!("missing input path"));
    }

    let input = PathBuf::from(&raw[0]);
    let mut output = default_out_path(&input);
    let mut pixel_size = 0u32;
    let mut mode = SampleMode::Average;

    let mut i = 1;
    if i < raw.len() && !raw[i].starts_with("--") {
        output = PathBuf::from(&raw[i]);
        i += 1;
    }
    while i < raw.len() {
        match raw[i].as_str() {
            "--pixel-size" => {
                i += 1;
                let value = raw.get(i).ok_or_else(|| anyhow!("--pixel-size requires a value"))?;
                pixel_size = value.parse().context("invalid --pixel-size value")?;
            }
            "--mode" => {
                i += 1;
                let value = raw.get(i).ok_or_else(|| anyhow!("--mode requires a value"))?;
                mode = parse_mode(value)?;
            }
            other => return Err(anyhow!("unknown argument: {other}")),
        }
        i += 1;
    }

    Ok(Args { input, output, pixel_size, mode })
}

fn run() -> Result<()> {
    let raw_args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&raw_args) {
        Ok(args) => args,
        Err(e) => {
            print_usage();
            return Err(e);
        }
    };

    let decoded = image::open(&args.input)
        .with_context(|| format!("reading input image {}", args.input.display()))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    let image = Image::new(width, height, decoded.into_raw())?;

    let params = PipelineParams::default()
        .with_pixel_size(args.pixel_size)
        .with_sampling(args.mode, 1.0, if args.pixel_size > 0 { 0 } else { 1 });

    let result = pixelgrid::run_pipeline(&image, &params, None)?;
    let art = result.pixel_art.ok_or_else(|| anyhow!("sampling was not requested"))?;

    let buffer = image::RgbaImage::from_raw(art.width, art.height, art.rgba)
        .ok_or_else(|| anyhow!("assembled pixel art buffer has the wrong length"))?;
    buffer
        .save(&args.output)
        .with_context(|| format!("writing output image {}", args.output.display()))?;

    println!(
        "OK: {} ({}x{}, detected pixel size {})",
        args.output.display(),
        art.width,
        art.height,
        result.detected_pixel_size
    );
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(2);
    }
}
