use crate::error::{PipelineError, Result};

/// Column/row sums of the 8-bit heatmap (§4.7 step 1).
fn column_profile(u8_map: &[u8], width: u32, height: u32) -> Vec<f32> {
    let (w, h) = (width as usize, height as usize);
    let mut profile = vec![0.0f32; w];
    for y in 0..h {
        let row = &u8_map[y * w..y * w + w];
        for (x, &v) in row.iter().enumerate() {
            profile[x] += v as f32;
        }
    }
    profile
}

fn row_profile(u8_map: &[u8], width: u32, height: u32) -> Vec<f32> {
    let (w, h) = (width as usize, height as usize);
    let mut profile = vec![0.0f32; h];
    for y in 0..h {
        let row = &u8_map[y * w..y * w + w];
        profile[y] = row.iter().map(|&v| v as f32).sum();
    }
    profile
}

fn zero_mean(profile: &mut [f32]) {
    if profile.is_empty() {
        return;
    }
    let mean: f32 = profile.iter().sum::<f32>() / profile.len() as f32;
    for v in profile.iter_mut() {
        *v -= mean;
    }
}

/// Unbiased autocorrelation of `signal` at `lag`.
fn autocorrelation(signal: &[f32], lag: usize) -> f32 {
    if lag >= signal.len() {
        return 0.0;
    }
    let n = signal.len() - lag;
    if n == 0 {
        return 0.0;
    }
    let sum: f32 = (0..n).map(|i| signal[i] * signal[i + lag]).sum();
    sum / n as f32
}

/// Estimates the hidden grid period by autocorrelation of marginal energy
/// profiles (§4.7). Falls back to `min_s` for a degenerate (constant) image.
pub fn detect_pixel_size(
    u8_map: &[u8],
    width: u32,
    height: u32,
    min_s: u32,
    max_s: u32,
) -> Result<u32> {
    let limit = (width.min(height) / 2).max(1);
    if min_s < 1 || min_s > max_s || max_s > limit {
        return Err(PipelineError::InvalidDimensions(format!(
            "require 1 <= min_s ({min_s}) <= max_s ({max_s}) <= min(W,H)/2 ({limit})"
        )));
    }

    let mut px = column_profile(u8_map, width, height);
    let mut py = row_profile(u8_map, width, height);
    zero_mean(&mut px);
    zero_mean(&mut py);

    if px.iter().all(|&v| v == 0.0) && py.iter().all(|&v| v == 0.0) {
        return Ok(min_s);
    }

    let mut best_s = min_s;
    let mut best_score = f32::NEG_INFINITY;
    for s in min_s..=max_s {
        let score = autocorrelation(&px, s as usize) + autocorrelation(&py, s as usize);
        if score > best_score {
            best_score = score;
            best_s = s;
        }
    }
    Ok(best_s)
}
