use rayon::prelude::*;

use crate::error::{PipelineError, Result};

/// BT.601 luma weights used by §4.1. Alpha is ignored.
const WR: f32 = 0.299;
const WG: f32 = 0.587;
const WB: f32 = 0.114;

/// Converts a straight-alpha RGBA buffer to luminance in `[0, 1]` (§4.1).
pub fn rgba_to_gray01(rgba: &[u8], width: u32, height: u32) -> Result<Vec<f32>> {
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(PipelineError::InvalidDimensions(format!(
            "rgba length {} does not match {}x{}x4 = {}",
            rgba.len(),
            width,
            height,
            expected
        )));
    }

    let mut out = vec![0.0f32; width as usize * height as usize];
    out.par_iter_mut().zip(rgba.par_chunks_exact(4)).for_each(|(gray, px)| {
        let r = px[0] as f32;
        let g = px[1] as f32;
        let b = px[2] as f32;
        *gray = (WR * r + WG * g + WB * b) / 255.0;
    });
    Ok(out)
}
