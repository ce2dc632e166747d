use crate::error::{PipelineError, Result};

/// Owned RGBA raster, straight alpha, row-major, tightly packed.
///
/// This is the crate's entity corresponding to `RgbaImage` in the data model
/// (§3): a single owned buffer rather than three loose parameters passed around
/// every stage function.
#[derive(Debug, Clone)]
pub struct Image {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Image {
    /// Build an `Image`, validating that `rgba.len() == width * height * 4` and
    /// that both dimensions are non-zero.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidDimensions(format!(
                "width and height must be > 0, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(PipelineError::InvalidDimensions(format!(
                "rgba buffer length {} does not match width*height*4 = {}",
                rgba.len(),
                expected
            )));
        }
        Ok(Self { width, height, rgba })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.rgba
    }
}
