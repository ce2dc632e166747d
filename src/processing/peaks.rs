/// Box-filter smoothing with an odd `window`. `window <= 1` is a no-op copy.
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

fn is_local_max(profile: &[f32], i: usize, half_gap: i64) -> bool {
    let len = profile.len() as i64;
    let lo = (i as i64 - half_gap).max(0);
    let hi = (i as i64 + half_gap).min(len - 1);
    let value = profile[i];
    profile[lo as usize..=hi as usize].iter().all(|&v| v <= value)
}

/// Detects 1-D peaks on a profile (§4.8): smooths by `window_size`, thresholds
/// at `min_threshold_ratio * max`, requires local-maximality over
/// `[-gap_size/2, gap_size/2]`, then greedily spaces accepted candidates.
pub fn detect_peaks_1d(
    profile: &[f32],
    gap_size: u32,
    gap_tolerance: u32,
    min_threshold_ratio: f32,
    window_size: u32,
) -> Vec<u32> {
    if profile.is_empty() {
        return Vec::new();
    }
    let smoothed = box_smooth(profile, window_size);
    let max = smoothed.iter().cloned().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return Vec::new();
    }
    let threshold = min_threshold_ratio * max;
    let half_gap = (gap_size / 2) as i64;

    let mut candidates: Vec<(usize, f32)> = Vec::new();
    for (i, &v) in smoothed.iter().enumerate() {
        if v >= threshold && is_local_max(&smoothed, i, half_gap) {
            candidates.push((i, v));
        }
    }
    if candidates.is_empty() {
        return Vec::new();
    }

    let gap = gap_size as i64;
    let tolerance = gap_tolerance as i64;
    let lo_bound = gap - tolerance;
    let hi_bound = gap + tolerance;

    let mut accepted: Vec<u32> = vec![candidates[0].0 as u32];
    let mut prev = candidates[0].0 as i64;
    let mut cursor = 1usize;

    while cursor < candidates.len() {
        let mut chosen: Option<usize> = None;
        for (idx, &(pos, _)) in candidates.iter().enumerate().skip(cursor) {
            let distance = pos as i64 - prev;
            if distance >= lo_bound && distance <= hi_bound {
                chosen = Some(idx);
                break;
            }
        }
        if let Some(idx) = chosen {
            accepted.push(candidates[idx].0 as u32);
            prev = candidates[idx].0 as i64;
            cursor = idx + 1;
            continue;
        }

        let min_distance = prev + lo_bound;
        let strongest = candidates[cursor..]
            .iter()
            .enumerate()
            .filter(|(_, &(pos, _))| pos as i64 > min_distance)
            .max_by(|a, b| a.1 .1.partial_cmp(&b.1 .1).unwrap());
        match strongest {
            Some((rel_idx, &(pos, _))) => {
                accepted.push(pos as u32);
                prev = pos as i64;
                cursor += rel_idx + 1;
            }
            None => break,
        }
    }

    accepted
}
