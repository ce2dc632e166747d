use rayon::prelude::*;

/// Builds a normalized 1-D Gaussian kernel (§4.2).
///
/// Radius is `max(1, ceil(3*sigma))`, length `2*radius+1`. `sigma <= 0` collapses
/// to the identity kernel `[1]` (handled by `convolve_separable` as a straight copy).
pub fn gaussian_kernel_1d(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (3.0 * sigma).ceil().max(1.0) as i32;
    let len = (2 * radius + 1) as usize;
    let mut kernel = Vec::with_capacity(len);
    let two_sigma_sq = 2.0 * sigma * sigma;
    for i in -radius..=radius {
        let v = (-((i * i) as f32) / two_sigma_sq).exp();
        kernel.push(v);
    }
    let sum: f32 = kernel.iter().sum();
    if sum > 0.0 {
        for v in &mut kernel {
            *v /= sum;
        }
    }
    kernel
}

#[inline]
fn clamp_index(i: i64, len: i64) -> usize {
    i.clamp(0, len - 1) as usize
}

fn convolve_horizontal(src: &[f32], width: usize, height: usize, kernel: &[f32]) -> Vec<f32> {
    let radius = (kernel.len() / 2) as i64;
    let mut dst = vec![0.0f32; width * height];
    dst.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let src_row = &src[y * width..y * width + width];
        for (x, out) in row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &weight) in kernel.iter().enumerate() {
                let sx = x as i64 + (k as i64 - radius);
                acc += weight * src_row[clamp_index(sx, width as i64)];
            }
            *out = acc;
        }
    });
    dst
}

fn convolve_vertical(src: &[f32], width: usize, height: usize, kernel: &[f32]) -> Vec<f32> {
    let radius = (kernel.len() / 2) as i64;
    let mut dst = vec![0.0f32; width * height];
    dst.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &weight) in kernel.iter().enumerate() {
                let sy = y as i64 + (k as i64 - radius);
                acc += weight * src[clamp_index(sy, height as i64) * width + x];
            }
            *out = acc;
        }
    });
    dst
}

/// Separable convolution with clamp-to-edge boundary handling (§4.2): applies
/// `kernel` along x, then along y. A single-element kernel is a no-op copy.
pub fn convolve_separable(src: &[f32], width: u32, height: u32, kernel: &[f32]) -> Vec<f32> {
    let (w, h) = (width as usize, height as usize);
    if kernel.len() == 1 {
        return src.to_vec();
    }
    let horizontal = convolve_horizontal(src, w, h, kernel);
    convolve_vertical(&horizontal, w, h, kernel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_kernel_for_non_positive_sigma() {
        assert_eq!(gaussian_kernel_1d(0.0), vec![1.0]);
        assert_eq!(gaussian_kernel_1d(-2.0), vec![1.0]);
    }

    #[test]
    fn gaussian_kernel_sums_to_one() {
        for tenths in (1..=160).step_by(7) {
            let sigma = tenths as f32 / 10.0;
            let kernel = gaussian_kernel_1d(sigma);
            let sum: f32 = kernel.iter().sum();
            assert!((sum - 1.0).abs() < 1e-6, "sigma={sigma} sum={sum}");
        }
    }

    #[test]
    fn convolution_with_identity_kernel_is_exact() {
        let src: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let dst = convolve_separable(&src, 4, 4, &[1.0]);
        assert_eq!(src, dst);
    }

    #[test]
    fn convolution_preserves_constant_image() {
        let src = vec![0.5f32; 10 * 10];
        let kernel = gaussian_kernel_1d(2.0);
        let dst = convolve_separable(&src, 10, 10, &kernel);
        for v in dst {
            assert!((v - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn convolution_of_mirrored_image_is_mirror_of_convolution() {
        let width = 9u32;
        let height = 5u32;
        let src: Vec<f32> = (0..width * height).map(|i| (i % 7) as f32).collect();
        let kernel = gaussian_kernel_1d(1.5);

        let dst = convolve_separable(&src, width, height, &kernel);

        // mirror horizontally
        let mut mirrored_src = src.clone();
        for y in 0..height as usize {
            let row = &mut mirrored_src[y * width as usize..(y + 1) * width as usize];
            row.reverse();
        }
        let mirrored_dst = convolve_separable(&mirrored_src, width, height, &kernel);

        let mut expected = dst.clone();
        for y in 0..height as usize {
            let row = &mut expected[y * width as usize..(y + 1) * width as usize];
            row.reverse();
        }

        for (a, b) in mirrored_dst.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }
}
