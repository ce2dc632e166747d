use rayon::prelude::*;

/// Standard 3x3 Sobel kernels, row-major, left to right / top to bottom.
const GX: [i32; 9] = [-1, 0, 1, -2, 0, 2, -1, 0, 1];
const GY: [i32; 9] = [-1, -2, -1, 0, 0, 0, 1, 2, 1];

#[inline]
fn clamp_index(i: i64, len: i64) -> usize {
    i.clamp(0, len - 1) as usize
}

/// Applies the Sobel operator to `gray`, returning `(gx, gy)` (§4.3). Border
/// pixels reuse clamped neighbors; both outputs are the same size as the input.
pub fn sobel(gray: &[f32], width: u32, height: u32) -> (Vec<f32>, Vec<f32>) {
    let (w, h) = (width as usize, height as usize);
    let mut gx = vec![0.0f32; w * h];
    let mut gy = vec![0.0f32; w * h];

    gx.par_chunks_mut(w)
        .zip(gy.par_chunks_mut(w))
        .enumerate()
        .for_each(|(y, (gx_row, gy_row))| {
            for x in 0..w {
                let mut sx = 0.0f32;
                let mut sy = 0.0f32;
                for (ky, dy) in (-1i64..=1).enumerate() {
                    let sample_y = clamp_index(y as i64 + dy, h as i64);
                    for (kx, dx) in (-1i64..=1).enumerate() {
                        let sample_x = clamp_index(x as i64 + dx, w as i64);
                        let value = gray[sample_y * w + sample_x];
                        let idx = ky * 3 + kx;
                        sx += GX[idx] as f32 * value;
                        sy += GY[idx] as f32 * value;
                    }
                }
                gx_row[x] = sx;
                gy_row[x] = sy;
            }
        });

    (gx, gy)
}
