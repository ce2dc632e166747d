use rayon::prelude::*;

use crate::config::SampleMode;
use crate::error::{PipelineError, Result};

/// Output of the cell sampler (§4.12): packed RGB and RGBA buffers at
/// `width x height`, already tiled by `upscale_factor` if greater than one.
#[derive(Debug, Clone)]
pub struct PixelArt {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    pub rgba: Vec<u8>,
    pub upscale_factor: u32,
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    x0: u32,
    x1: u32,
    y0: u32,
    y1: u32,
}

fn cells_from_lines(lines: &[u32]) -> Vec<(u32, u32)> {
    lines
        .windows(2)
        .map(|w| {
            let (a, b) = (w[0], w[1]);
            if a == b {
                (a, a + 1)
            } else {
                (a, b)
            }
        })
        .collect()
}

fn sample_cell_center(rgba: &[u8], width: u32, cell: Cell) -> [u8; 4] {
    let cx = (cell.x0 + cell.x1) / 2;
    let cy = (cell.y0 + cell.y1) / 2;
    let idx = (cy as usize * width as usize + cx as usize) * 4;
    [rgba[idx], rgba[idx + 1], rgba[idx + 2], rgba[idx + 3]]
}

fn sample_cell_average(rgba: &[u8], width: u32, cell: Cell) -> [u8; 4] {
    let mut sum = [0.0f64; 4];
    let mut count = 0u64;
    for y in cell.y0..cell.y1 {
        for x in cell.x0..cell.x1 {
            let idx = (y as usize * width as usize + x as usize) * 4;
            for c in 0..4 {
                sum[c] += rgba[idx + c] as f64;
            }
            count += 1;
        }
    }
    let count = count.max(1) as f64;
    [
        (sum[0] / count).round() as u8,
        (sum[1] / count).round() as u8,
        (sum[2] / count).round() as u8,
        (sum[3] / count).round() as u8,
    ]
}

fn sample_cell_weighted(rgba: &[u8], width: u32, cell: Cell, weight_ratio: f32) -> [u8; 4] {
    let mut samples = Vec::new();
    for y in cell.y0..cell.y1 {
        for x in cell.x0..cell.x1 {
            let idx = (y as usize * width as usize + x as usize) * 4;
            samples.push([
                rgba[idx] as f32,
                rgba[idx + 1] as f32,
                rgba[idx + 2] as f32,
                rgba[idx + 3] as f32,
            ]);
        }
    }
    if samples.is_empty() {
        return [0, 0, 0, 255];
    }

    let n = samples.len() as f32;
    let mean_rgb = [
        samples.iter().map(|s| s[0]).sum::<f32>() / n,
        samples.iter().map(|s| s[1]).sum::<f32>() / n,
        samples.iter().map(|s| s[2]).sum::<f32>() / n,
    ];
    let mean_a = samples.iter().map(|s| s[3]).sum::<f32>() / n;

    let diagonal = (3.0f32 * 255.0 * 255.0).sqrt().max(1e-6);

    let mut weighted_rgb = [0.0f32; 3];
    let mut weight_sum = 0.0f32;
    for s in &samples {
        let dr = s[0] - mean_rgb[0];
        let dg = s[1] - mean_rgb[1];
        let db = s[2] - mean_rgb[2];
        let distance = (dr * dr + dg * dg + db * db).sqrt() / diagonal;
        let weight = 1.0 + (weight_ratio - 1.0) * (1.0 - distance).clamp(0.0, 1.0);
        for c in 0..3 {
            weighted_rgb[c] += s[c] * weight;
        }
        weight_sum += weight;
    }
    let weight_sum = weight_sum.max(1e-6);

    [
        (weighted_rgb[0] / weight_sum).round().clamp(0.0, 255.0) as u8,
        (weighted_rgb[1] / weight_sum).round().clamp(0.0, 255.0) as u8,
        (weighted_rgb[2] / weight_sum).round().clamp(0.0, 255.0) as u8,
        mean_a.round().clamp(0.0, 255.0) as u8,
    ]
}

fn sample_cell(rgba: &[u8], width: u32, cell: Cell, mode: SampleMode, weight_ratio: f32) -> [u8; 4] {
    match mode {
        SampleMode::Center => sample_cell_center(rgba, width, cell),
        SampleMode::Average | SampleMode::Direct => sample_cell_average(rgba, width, cell),
        SampleMode::Weighted => sample_cell_weighted(rgba, width, cell, weight_ratio),
    }
}

/// Upper bound on the combined size of the `rgb` + `rgba` output buffers
/// (§5's peak-memory budget includes `O(outW·outH·4·upscaleFactor²)`; this is
/// the implementation limit §7's `AllocationFailure` is measured against).
const MAX_PIXEL_ART_BYTES: u64 = 256 * 1024 * 1024;

/// Rejects an `(out_w, out_h, upscale_factor)` combination whose tiled output
/// would exceed [`MAX_PIXEL_ART_BYTES`], before anything is allocated.
///
/// Checked entirely in u64: `out_w * factor` can itself overflow a u32, and in
/// the `release` profile (`overflow-checks = false`) that would silently wrap
/// into an undersized allocation instead of tripping this check.
fn check_output_size(out_w: u32, out_h: u32, factor: u32) -> Result<()> {
    let final_w = out_w as u64 * factor as u64;
    let final_h = out_h as u64 * factor as u64;
    let requested = final_w * final_h * 3 + final_w * final_h * 4;
    if requested > MAX_PIXEL_ART_BYTES {
        return Err(PipelineError::AllocationFailure {
            requested: requested as usize,
            limit: MAX_PIXEL_ART_BYTES as usize,
        });
    }
    Ok(())
}

fn tile_and_pack(
    cell_colors: &[[u8; 4]],
    out_w: u32,
    out_h: u32,
    upscale_factor: u32,
    native_res: bool,
) -> Result<PixelArt> {
    let factor = if native_res { 1 } else { upscale_factor.max(1) };
    check_output_size(out_w, out_h, factor)?;

    let final_w = out_w * factor;
    let final_h = out_h * factor;

    let mut rgb = vec![0u8; final_w as usize * final_h as usize * 3];
    let mut rgba = vec![0u8; final_w as usize * final_h as usize * 4];

    rgb.par_chunks_mut(final_w as usize * 3)
        .zip(rgba.par_chunks_mut(final_w as usize * 4))
        .enumerate()
        .for_each(|(row, (rgb_row, rgba_row))| {
            let cell_y = row / factor as usize;
            for col in 0..final_w as usize {
                let cell_x = col / factor as usize;
                let color = cell_colors[cell_y * out_w as usize + cell_x];
                rgb_row[col * 3] = color[0];
                rgb_row[col * 3 + 1] = color[1];
                rgb_row[col * 3 + 2] = color[2];
                rgba_row[col * 4] = color[0];
                rgba_row[col * 4 + 1] = color[1];
                rgba_row[col * 4 + 2] = color[2];
                rgba_row[col * 4 + 3] = color[3];
            }
        });

    Ok(PixelArt {
        width: final_w,
        height: final_h,
        rgb,
        rgba,
        upscale_factor: factor,
    })
}

/// Collapses the source image into pixel-art cells bounded by `all_x`/`all_y`
/// grid lines (§4.12).
pub fn sample_pixel_art(
    rgba: &[u8],
    width: u32,
    height: u32,
    all_x: &[u32],
    all_y: &[u32],
    mode: SampleMode,
    weight_ratio: f32,
    upscale_factor: u32,
    native_res: bool,
) -> Result<PixelArt> {
    if all_x.len() < 2 || all_y.len() < 2 {
        return Err(PipelineError::EmptyDetection {
            axis: if all_x.len() < 2 {
                crate::error::Axis::X
            } else {
                crate::error::Axis::Y
            },
            found: all_x.len().min(all_y.len()),
        });
    }

    let x_cells = cells_from_lines(all_x);
    let y_cells = cells_from_lines(all_y);
    let out_w = x_cells.len() as u32;
    let out_h = y_cells.len() as u32;
    let factor = if native_res { 1 } else { upscale_factor.max(1) };
    check_output_size(out_w, out_h, factor)?;

    let mut cell_colors = vec![[0u8; 4]; (out_w * out_h) as usize];
    cell_colors
        .par_iter_mut()
        .enumerate()
        .for_each(|(idx, color)| {
            let cx = idx % out_w as usize;
            let cy = idx / out_w as usize;
            let (x0, x1) = x_cells[cx];
            let (y0, y1) = y_cells[cy];
            let cell = Cell {
                x0,
                x1: x1.min(width),
                y0,
                y1: y1.min(height),
            };
            *color = sample_cell(rgba, width, cell, mode, weight_ratio);
        });

    tile_and_pack(&cell_colors, out_w, out_h, upscale_factor, native_res)
}

/// Direct-mode sampler: divides the image into a regular `target_w x target_h`
/// grid without detection (§4.12, §6 direct-mode contract).
pub fn sample_pixel_art_direct(
    rgba: &[u8],
    width: u32,
    height: u32,
    target_w: u32,
    target_h: u32,
    weight_ratio: f32,
    upscale_factor: u32,
    native_res: bool,
) -> Result<PixelArt> {
    if target_w == 0 || target_h == 0 {
        return Err(PipelineError::InvalidDimensions(format!(
            "direct-mode target size must be > 0, got {target_w}x{target_h}"
        )));
    }
    let factor = if native_res { 1 } else { upscale_factor.max(1) };
    check_output_size(target_w, target_h, factor)?;

    let mut cell_colors = vec![[0u8; 4]; (target_w * target_h) as usize];
    cell_colors
        .par_iter_mut()
        .enumerate()
        .for_each(|(idx, color)| {
            let cx = (idx as u32) % target_w;
            let cy = (idx as u32) / target_w;
            let x0 = cx * width / target_w;
            let x1 = ((cx + 1) * width / target_w).max(x0 + 1).min(width);
            let y0 = cy * height / target_h;
            let y1 = ((cy + 1) * height / target_h).max(y0 + 1).min(height);
            let cell = Cell { x0, x1, y0, y1 };
            *color = sample_cell_average(rgba, width, cell);
        });
    let _ = weight_ratio;

    tile_and_pack(&cell_colors, target_w, target_h, upscale_factor, native_res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32, cell: u32) -> Vec<u8> {
        let mut rgba = vec![0u8; (width * height * 4) as usize];
        for y in 0..height {
            for x in 0..width {
                let on = ((x / cell) + (y / cell)) % 2 == 0;
                let v = if on { 255 } else { 0 };
                let idx = ((y * width + x) * 4) as usize;
                rgba[idx] = v;
                rgba[idx + 1] = v;
                rgba[idx + 2] = v;
                rgba[idx + 3] = 255;
            }
        }
        rgba
    }

    #[test]
    fn rejects_fewer_than_two_lines_per_axis() {
        let rgba = vec![0u8; 16 * 16 * 4];
        let result = sample_pixel_art(&rgba, 16, 16, &[0], &[0, 8, 16], SampleMode::Average, 1.0, 1, false);
        assert!(result.is_err());
    }

    #[test]
    fn direct_mode_rejects_zero_target() {
        let rgba = vec![0u8; 16 * 16 * 4];
        assert!(sample_pixel_art_direct(&rgba, 16, 16, 0, 4, 1.0, 1, false).is_err());
    }

    #[test]
    fn oversized_upscale_is_an_allocation_failure_not_a_panic_or_wrap() {
        let rgba = vec![0u8; 16 * 16 * 4];
        // out_w = out_h = 4 cells, upscale_factor huge enough that the tiled
        // output would exceed MAX_PIXEL_ART_BYTES (and would overflow a u32
        // product well before that).
        let result = sample_pixel_art(
            &rgba,
            16,
            16,
            &[0, 4, 8, 12, 16],
            &[0, 4, 8, 12, 16],
            SampleMode::Average,
            1.0,
            1_000_000,
            false,
        );
        assert!(matches!(result, Err(PipelineError::AllocationFailure { .. })));
    }

    #[test]
    fn direct_mode_oversized_target_is_an_allocation_failure() {
        let rgba = vec![0u8; 4 * 4 * 4];
        let result = sample_pixel_art_direct(&rgba, 4, 4, 100_000, 100_000, 1.0, 1, false);
        assert!(matches!(result, Err(PipelineError::AllocationFailure { .. })));
    }

    #[test]
    fn constant_image_averages_to_constant_cells() {
        let rgba = vec![128u8; 16 * 16 * 4];
        let art = sample_pixel_art(
            &rgba,
            16,
            16,
            &[0, 4, 8, 12, 16],
            &[0, 4, 8, 12, 16],
            SampleMode::Average,
            1.0,
            1,
            false,
        )
        .unwrap();
        assert_eq!(art.width, 4);
        assert_eq!(art.height, 4);
        assert!(art.rgb.iter().all(|&v| v == 128));
    }

    #[test]
    fn checkerboard_direct_mode_reproduces_cells() {
        let rgba = checkerboard(30, 30, 10);
        let art = sample_pixel_art_direct(&rgba, 30, 30, 3, 3, 1.0, 1, false).unwrap();
        assert_eq!(art.width, 3);
        assert_eq!(art.height, 3);
        let expected = checkerboard(3, 3, 1);
        for (got, want) in art.rgb.chunks(3).zip(expected.chunks(4)) {
            assert_eq!(got[0], want[0]);
        }
    }

    #[test]
    fn upscale_tiles_are_constant_blocks() {
        let rgba = checkerboard(16, 16, 8);
        let art = sample_pixel_art(
            &rgba,
            16,
            16,
            &[0, 8, 16],
            &[0, 8, 16],
            SampleMode::Center,
            1.0,
            4,
            false,
        )
        .unwrap();
        assert_eq!(art.width, 8);
        assert_eq!(art.height, 8);
        for cy in 0..2usize {
            for cx in 0..2usize {
                let base_idx = (cy * 4 * art.width as usize + cx * 4) * 3;
                let base = &art.rgb[base_idx..base_idx + 3];
                for dy in 0..4usize {
                    for dx in 0..4usize {
                        let idx = ((cy * 4 + dy) * art.width as usize + (cx * 4 + dx)) * 3;
                        assert_eq!(&art.rgb[idx..idx + 3], base);
                    }
                }
            }
        }
    }

    #[test]
    fn weighted_mode_pulls_outlier_pixels_toward_majority() {
        let mut rgba = vec![200u8; 8 * 8 * 4];
        for i in 0..4 {
            let idx = i * 4;
            rgba[idx] = 255;
            rgba[idx + 1] = 0;
            rgba[idx + 2] = 0;
        }
        for px in rgba.chunks_mut(4) {
            px[3] = 255;
        }

        let weighted = sample_pixel_art(
            &rgba, 8, 8, &[0, 8], &[0, 8], SampleMode::Weighted, 4.0, 1, false,
        )
        .unwrap();
        let averaged = sample_pixel_art(
            &rgba, 8, 8, &[0, 8], &[0, 8], SampleMode::Average, 1.0, 1, false,
        )
        .unwrap();

        let gray_target = 200i32;
        let weighted_dist = (weighted.rgb[0] as i32 - gray_target).abs();
        let averaged_dist = (averaged.rgb[0] as i32 - gray_target).abs();
        assert!(weighted_dist <= averaged_dist);
    }
}
