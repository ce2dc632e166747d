const HISTOGRAM_BINS: usize = 1024;

/// Approximates the `q`-quantile (`q` in `[0, 1]`) of `values` using a 1024-bin
/// histogram over the observed `[min, max]` range, linearly interpolating
/// within the bin that straddles the target rank. O(N).
///
/// Grounded on the chunked-histogram-then-merge idiom used for percentile
/// lookups in this codebase's tone-mapping utilities, adapted from a
/// floating-point luminance histogram to this crate's energy values.
pub fn quantile_approx(values: &[f32], q: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let q = q.clamp(0.0, 1.0);

    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !(max > min) {
        return min;
    }

    let mut histogram = [0u32; HISTOGRAM_BINS];
    let scale = HISTOGRAM_BINS as f32 / (max - min);
    for &v in values {
        let bin = (((v - min) * scale) as usize).min(HISTOGRAM_BINS - 1);
        histogram[bin] += 1;
    }

    let target_rank = q * (values.len() - 1) as f32;
    let mut cumulative = 0u32;
    for (bin, &count) in histogram.iter().enumerate() {
        let next_cumulative = cumulative + count;
        if (next_cumulative as f32) > target_rank || bin == HISTOGRAM_BINS - 1 {
            let bin_lo = min + bin as f32 / scale;
            let bin_hi = bin_lo + 1.0 / scale;
            if count == 0 {
                return bin_lo;
            }
            let within = ((target_rank - cumulative as f32) / count as f32).clamp(0.0, 1.0);
            return bin_lo + within * (bin_hi - bin_lo);
        }
        cumulative = next_cumulative;
    }
    max
}

/// The `[2%, 98%]` quantile bounds §4.6 normalizes energy against, exposed
/// separately so callers (e.g. `run_pipeline`'s stage logging) can report the
/// chosen bounds without recomputing the histogram.
pub fn heatmap_bounds(energy: &[f32]) -> (f32, f32) {
    (quantile_approx(energy, 0.02), quantile_approx(energy, 0.98))
}

/// Robust quantile-based normalization of energy to 8-bit (§4.6). Returns an
/// all-zero buffer when the [2%, 98%] range collapses (constant or near-constant
/// input).
pub fn to_heatmap_u8(energy: &[f32]) -> Vec<u8> {
    let (lo, hi) = heatmap_bounds(energy);
    if hi <= lo {
        return vec![0u8; energy.len()];
    }
    let span = hi - lo;
    energy
        .iter()
        .map(|&e| {
            let normalized = ((e - lo) / span).clamp(0.0, 1.0);
            (normalized * 255.0).round() as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_of_constant_values_is_that_value() {
        let values = vec![4.0f32; 100];
        assert_eq!(quantile_approx(&values, 0.5), 4.0);
    }

    #[test]
    fn heatmap_bounds_matches_the_quantiles_to_heatmap_u8_uses() {
        let values: Vec<f32> = (0..=1000).map(|i| i as f32).collect();
        let (lo, hi) = heatmap_bounds(&values);
        assert_eq!(lo, quantile_approx(&values, 0.02));
        assert_eq!(hi, quantile_approx(&values, 0.98));
        assert!(lo < hi);
    }

    #[test]
    fn quantile_matches_known_percentiles_on_uniform_ramp() {
        let values: Vec<f32> = (0..=1000).map(|i| i as f32).collect();
        let median = quantile_approx(&values, 0.5);
        assert!((median - 500.0).abs() < 5.0, "median={median}");
    }

    #[test]
    fn constant_energy_produces_all_zero_heatmap() {
        let energy = vec![0.7f32; 64];
        let heatmap = to_heatmap_u8(&energy);
        assert!(heatmap.iter().all(|&v| v == 0));
    }

    #[test]
    fn high_variance_energy_spans_full_range() {
        let mut energy = vec![0.0f32; 10_000];
        for (i, v) in energy.iter_mut().enumerate() {
            *v = (i % 100) as f32 / 10.0;
        }
        let heatmap = to_heatmap_u8(&energy);
        assert!(heatmap.iter().any(|&v| v == 0));
        assert!(heatmap.iter().any(|&v| v == 255));
    }

    #[test]
    fn heatmap_never_exceeds_byte_range() {
        let energy: Vec<f32> = (0..500).map(|i| (i as f32).sin().abs() * 10.0).collect();
        let heatmap = to_heatmap_u8(&energy);
        assert_eq!(heatmap.len(), energy.len());
    }
}
