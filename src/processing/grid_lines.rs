use super::peaks::detect_peaks_1d;

/// Sum of the 8-bit heatmap along each axis, smoothed by a `smooth`-wide box
/// filter before peak detection, per the profiles feeding §4.9.
fn smoothed_column_profile(u8_map: &[u8], width: u32, height: u32, smooth: u32) -> Vec<f32> {
    let (w, h) = (width as usize, height as usize);
    let mut profile = vec![0.0f32; w];
    for y in 0..h {
        let row = &u8_map[y * w..y * w + w];
        for (x, &v) in row.iter().enumerate() {
            profile[x] += v as f32;
        }
    }
    box_smooth(&profile, smooth)
}

fn smoothed_row_profile(u8_map: &[u8], width: u32, height: u32, smooth: u32) -> Vec<f32> {
    let (w, h) = (width as usize, height as usize);
    let mut profile = vec![0.0f32; h];
    for y in 0..h {
        let row = &u8_map[y * w..y * w + w];
        profile[y] = row.iter().map(|&v| v as f32).sum();
    }
    box_smooth(&profile, smooth)
}

fn box_smooth(profile: &[f32], window: u32) -> Vec<f32> {
    if window <= 1 {
        return profile.to_vec();
    }
    let radius = (window / 2) as i64;
    let len = profile.len() as i64;
    (0..len)
        .map(|i| {
            let lo = (i - radius).max(0);
            let hi = (i + radius).min(len - 1);
            let count = (hi - lo + 1) as f32;
            let sum: f32 = profile[lo as usize..=hi as usize].iter().sum();
            sum / count
        })
        .collect()
}

/// Detected grid line positions on both axes (§4.9).
#[derive(Debug, Clone, Default)]
pub struct GridLines {
    pub x_lines: Vec<u32>,
    pub y_lines: Vec<u32>,
}

/// Runs peak detection independently on the column and row profiles of the
/// 8-bit heatmap (§4.9).
pub fn detect_grid_lines(
    u8_map: &[u8],
    width: u32,
    height: u32,
    s: u32,
    gap_tolerance: u32,
    min_energy: f32,
    smooth: u32,
    window_size: u32,
) -> GridLines {
    let px = smoothed_column_profile(u8_map, width, height, smooth);
    let py = smoothed_row_profile(u8_map, width, height, smooth);

    GridLines {
        x_lines: detect_peaks_1d(&px, s, gap_tolerance, min_energy, window_size),
        y_lines: detect_peaks_1d(&py, s, gap_tolerance, min_energy, window_size),
    }
}

fn median_gap(lines: &[u32]) -> f32 {
    if lines.len() < 2 {
        return f32::NAN;
    }
    let mut gaps: Vec<f32> = lines.windows(2).map(|w| (w[1] - w[0]) as f32).collect();
    gaps.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = gaps.len() / 2;
    if gaps.len() % 2 == 0 {
        (gaps[mid - 1] + gaps[mid]) / 2.0
    } else {
        gaps[mid]
    }
}

fn dedup_sorted_clamped(mut lines: Vec<u32>, limit: u32) -> Vec<u32> {
    lines.retain(|&v| v <= limit);
    lines.sort_unstable();
    lines.dedup();
    lines
}

/// Inserts missing interior lines where a gap is a multiple of the typical
/// gap (§4.10). `fallback_gap` is used only when the computed median gap is
/// zero or non-finite — the reading the spec's Open Questions section adopts
/// as the more robust of the two documented source behaviors.
pub fn interpolate_lines(lines: &[u32], limit: u32, fallback_gap: f32) -> Vec<u32> {
    if lines.len() < 2 {
        return lines.to_vec();
    }
    let mut g = median_gap(lines);
    if !(g.is_finite()) || g == 0.0 {
        g = fallback_gap;
    }
    if !(g > 0.0) {
        return dedup_sorted_clamped(lines.to_vec(), limit);
    }

    let mut out = Vec::with_capacity(lines.len());
    out.push(lines[0]);
    for w in lines.windows(2) {
        let (a, b) = (w[0], w[1]);
        let gap = (b - a) as f32;
        if gap > 1.5 * g {
            let n_interior = ((gap / g).round() as i64 - 1).max(0);
            for k in 1..=n_interior {
                let pos = a as f32 + k as f32 * (gap / (n_interior as f32 + 1.0));
                out.push(pos.round().clamp(0.0, limit as f32) as u32);
            }
        }
        out.push(b);
    }
    dedup_sorted_clamped(out, limit)
}

/// Extends a line sequence to the image borders, always including `0` and
/// `limit` (§4.11).
pub fn complete_edges(lines: &[u32], limit: u32, typical_gap: f32, gap_tolerance: u32) -> Vec<u32> {
    let mut out = lines.to_vec();
    if !(typical_gap > 0.0) {
        out.push(0);
        out.push(limit);
        return dedup_sorted_clamped(out, limit);
    }

    let tolerance = gap_tolerance as f32;

    if let Some(&first) = out.first() {
        if first as f32 > typical_gap - tolerance {
            let mut cursor = first as f32 - typical_gap;
            while cursor >= 0.0 {
                out.push(cursor.round() as u32);
                cursor -= typical_gap;
            }
        }
    } else {
        out.push(0);
    }

    if let Some(&last) = out.iter().max() {
        if (limit as f32 - last as f32) > typical_gap - tolerance {
            let mut cursor = last as f32 + typical_gap;
            while cursor <= limit as f32 {
                out.push(cursor.round() as u32);
                cursor += typical_gap;
            }
        }
    }

    out.push(0);
    out.push(limit);
    dedup_sorted_clamped(out, limit)
}
