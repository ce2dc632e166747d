use std::time::Instant;

use log::{debug, trace};

use crate::config::{PipelineParams, SampleMode};
use crate::error::Result;
use crate::image::Image;
use crate::observer::{NullObserver, PipelineObserver};
use crate::processing::energy::{enhance_energy_directional, grad_energy, DirectionalSignal};
use crate::processing::grayscale::rgba_to_gray01;
use crate::processing::grid_lines::{complete_edges, detect_grid_lines, interpolate_lines};
use crate::processing::heatmap::{heatmap_bounds, to_heatmap_u8};
use crate::processing::pixel_size::detect_pixel_size;
use crate::processing::sampler::{sample_pixel_art, sample_pixel_art_direct, PixelArt};

/// Everything `run_pipeline` produces (§6 Outputs).
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub width: u32,
    pub height: u32,
    pub detected_pixel_size: u32,
    pub energy_u8: Vec<u8>,
    pub x_lines: Vec<u32>,
    pub y_lines: Vec<u32>,
    pub all_x_lines: Vec<u32>,
    pub all_y_lines: Vec<u32>,
    pub pixel_art: Option<PixelArt>,
}

fn timed<T>(observer: &dyn PipelineObserver, stage: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    debug!("stage {stage} finished in {elapsed:?}");
    observer.on_stage(stage, elapsed);
    result
}

/// Runs the full recovery-and-resample pipeline (§2) on one image, a pure
/// function of `(image, params)`. `observer` is invoked between stages only;
/// pass `None` to use a no-op observer.
pub fn run_pipeline(
    image: &Image,
    params: &PipelineParams,
    observer: Option<&dyn PipelineObserver>,
) -> Result<PipelineResult> {
    params.validate()?;

    let null_observer = NullObserver;
    let observer: &dyn PipelineObserver = observer.unwrap_or(&null_observer);

    let width = image.width();
    let height = image.height();
    trace!("run_pipeline: {width}x{height} image, sample_mode={:?}", params.sample_mode);

    if params.sample_mode == SampleMode::Direct {
        return run_direct_mode(image, params, observer);
    }

    // §4.7's `min_s <= max_s <= min(W,H)/2` bound only governs autodetection;
    // check it eagerly, before any stage allocates a buffer, rather than
    // discovering it deep inside `detect_pixel_size` after grayscale, energy,
    // enhancement and the heatmap have already been computed.
    params.validate_detection_range(width, height)?;

    let gray = timed(observer, "grayscale", || {
        rgba_to_gray01(image.rgba(), width, height)
    })?;
    debug!("grayscale: {width}x{height} -> {} luminance samples", gray.len());

    let energy = timed(observer, "energy", || grad_energy(&gray, width, height, params.sigma));

    let energy = if params.enhance_energy {
        let (h_factor, v_factor) = if params.enhance_directional {
            (params.enhance_horizontal, params.enhance_vertical)
        } else {
            (1.5, 1.5)
        };
        timed(observer, "enhance", || {
            enhance_energy_directional(
                &energy,
                width,
                height,
                h_factor,
                v_factor,
                DirectionalSignal::default(),
            )
        })
    } else {
        energy
    };

    let (heatmap_lo, heatmap_hi) = heatmap_bounds(&energy);
    debug!("heatmap: quantile bounds lo={heatmap_lo:.6} hi={heatmap_hi:.6}");
    let energy_u8 = timed(observer, "heatmap", || to_heatmap_u8(&energy));

    let detected_pixel_size = if params.pixel_size > 0 {
        trace!("pixel_size: forced to {}, skipping autodetection", params.pixel_size);
        params.pixel_size
    } else {
        let detected = timed(observer, "pixel_size", || {
            detect_pixel_size(&energy_u8, width, height, params.min_s, params.max_s)
        })?;
        debug!("pixel_size: detected {detected} (search range {}..={})", params.min_s, params.max_s);
        detected
    };

    let grid = timed(observer, "grid_lines", || {
        detect_grid_lines(
            &energy_u8,
            width,
            height,
            detected_pixel_size,
            params.gap_tolerance,
            params.min_energy,
            params.smooth,
            params.window_size,
        )
    });
    debug!(
        "grid_lines: {} x-line(s), {} y-line(s)",
        grid.x_lines.len(),
        grid.y_lines.len()
    );

    let fallback_gap = detected_pixel_size as f32;
    let interpolated_x = timed(observer, "interpolate_x", || {
        interpolate_lines(&grid.x_lines, width, fallback_gap)
    });
    let interpolated_y = timed(observer, "interpolate_y", || {
        interpolate_lines(&grid.y_lines, height, fallback_gap)
    });

    let all_x_lines = timed(observer, "complete_edges_x", || {
        complete_edges(&interpolated_x, width, fallback_gap, params.gap_tolerance)
    });
    let all_y_lines = timed(observer, "complete_edges_y", || {
        complete_edges(&interpolated_y, height, fallback_gap, params.gap_tolerance)
    });
    debug!(
        "complete_edges: {} x-line(s), {} y-line(s) after interpolation+completion",
        all_x_lines.len(),
        all_y_lines.len()
    );

    let pixel_art = if params.sample {
        let upscale_factor = if params.upscale > 0 {
            params.upscale
        } else {
            detected_pixel_size
        };
        Some(timed(observer, "sample", || {
            sample_pixel_art(
                image.rgba(),
                width,
                height,
                &all_x_lines,
                &all_y_lines,
                params.sample_mode,
                params.sample_weight_ratio,
                upscale_factor,
                params.native_res,
            )
        })?)
    } else {
        None
    };
    if let Some(art) = &pixel_art {
        debug!(
            "sample: {}x{} cells, upscale_factor={}",
            art.width / art.upscale_factor.max(1),
            art.height / art.upscale_factor.max(1),
            art.upscale_factor
        );
    }

    Ok(PipelineResult {
        width,
        height,
        detected_pixel_size,
        energy_u8,
        x_lines: grid.x_lines,
        y_lines: grid.y_lines,
        all_x_lines,
        all_y_lines,
        pixel_art,
    })
}

/// Direct-mode contract (§6): stages 1-4, 7, 8 are skipped entirely.
fn run_direct_mode(
    image: &Image,
    params: &PipelineParams,
    observer: &dyn PipelineObserver,
) -> Result<PipelineResult> {
    let width = image.width();
    let height = image.height();
    let pixel_size = params.effective_pixel_size();

    let target_w = (width / pixel_size).max(1);
    let target_h = (height / pixel_size).max(1);

    let upscale_factor = if params.upscale > 0 { params.upscale } else { pixel_size };
    debug!(
        "direct mode: {width}x{height} image, pixel_size={pixel_size} -> {target_w}x{target_h} cells, upscale_factor={upscale_factor}"
    );

    let pixel_art = if params.sample {
        Some(timed(observer, "sample_direct", || {
            sample_pixel_art_direct(
                image.rgba(),
                width,
                height,
                target_w,
                target_h,
                params.sample_weight_ratio,
                upscale_factor,
                params.native_res,
            )
        })?)
    } else {
        None
    };

    Ok(PipelineResult {
        width,
        height,
        detected_pixel_size: pixel_size,
        energy_u8: vec![0u8; width as usize * height as usize],
        x_lines: Vec::new(),
        y_lines: Vec::new(),
        all_x_lines: Vec::new(),
        all_y_lines: Vec::new(),
        pixel_art,
    })
}
