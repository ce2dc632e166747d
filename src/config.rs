use crate::error::{PipelineError, Result};

/// Cell-sampling rule used by the final stage (§4.12).
///
/// Exposed at the external boundary as a `u8` (`SampleMode::as_u8`/`from_u8`) for
/// ABI stability, per the REDESIGN FLAGS note replacing a dynamic mode tag with a
/// validated, fixed tagged variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    Direct,
    Center,
    Average,
    Weighted,
}

impl SampleMode {
    pub fn as_u8(self) -> u8 {
        match self {
            SampleMode::Direct => 0,
            SampleMode::Center => 1,
            SampleMode::Average => 2,
            SampleMode::Weighted => 3,
        }
    }

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(SampleMode::Direct),
            1 => Some(SampleMode::Center),
            2 => Some(SampleMode::Average),
            3 => Some(SampleMode::Weighted),
            _ => None,
        }
    }
}

/// Full configuration for one `run_pipeline` invocation (§6).
///
/// Validated once, eagerly, at the start of `run_pipeline` via [`PipelineParams::validate`];
/// every field here is otherwise a plain immutable value, constructed either directly
/// or through the builder methods below.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    pub sigma: f32,
    pub enhance_energy: bool,
    pub enhance_directional: bool,
    pub enhance_horizontal: f32,
    pub enhance_vertical: f32,
    pub pixel_size: u32,
    pub min_s: u32,
    pub max_s: u32,
    pub gap_tolerance: u32,
    pub min_energy: f32,
    pub smooth: u32,
    pub window_size: u32,
    pub sample: bool,
    pub sample_mode: SampleMode,
    pub sample_weight_ratio: f32,
    pub upscale: u32,
    pub native_res: bool,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            enhance_energy: false,
            enhance_directional: true,
            enhance_horizontal: 1.0,
            enhance_vertical: 1.0,
            pixel_size: 0,
            min_s: 2,
            max_s: 32,
            gap_tolerance: 2,
            min_energy: 0.2,
            smooth: 3,
            window_size: 5,
            sample: true,
            sample_mode: SampleMode::Average,
            sample_weight_ratio: 1.0,
            upscale: 0,
            native_res: false,
        }
    }
}

impl PipelineParams {
    /// Set the Gaussian pre-blur sigma (§4.4).
    pub fn with_sigma(mut self, sigma: f32) -> Self {
        self.sigma = sigma;
        self
    }

    /// Enable directional energy enhancement (§4.5). When `directional` is false,
    /// both factors collapse to 1.5 per §6.
    pub fn with_enhancement(mut self, horizontal: f32, vertical: f32, directional: bool) -> Self {
        self.enhance_energy = true;
        self.enhance_directional = directional;
        self.enhance_horizontal = horizontal;
        self.enhance_vertical = vertical;
        self
    }

    /// Force a known pixel size, skipping autodetection (§4.7).
    pub fn with_pixel_size(mut self, pixel_size: u32) -> Self {
        self.pixel_size = pixel_size;
        self
    }

    /// Set the autodetection search range (§4.7).
    pub fn with_detection_range(mut self, min_s: u32, max_s: u32) -> Self {
        self.min_s = min_s;
        self.max_s = max_s;
        self
    }

    /// Configure the sampler (§4.12).
    pub fn with_sampling(mut self, mode: SampleMode, weight_ratio: f32, upscale: u32) -> Self {
        self.sample = true;
        self.sample_mode = mode;
        self.sample_weight_ratio = weight_ratio;
        self.upscale = upscale;
        self
    }

    pub fn with_native_res(mut self, native_res: bool) -> Self {
        self.native_res = native_res;
        self
    }

    /// Effective pixel size used where the spec allows a zero sentinel to mean
    /// "not specified": `pixel_size` if set, else 8 (direct-mode default, §6).
    pub fn effective_pixel_size(&self) -> u32 {
        if self.pixel_size > 0 {
            self.pixel_size
        } else {
            8
        }
    }

    /// Validate the parameter-level invariants of §7 that don't depend on image
    /// dimensions. Dimension-dependent checks (e.g. `max_s <= min(W,H)/2`) are
    /// performed eagerly by [`PipelineParams::validate_detection_range`] once
    /// `run_pipeline` knows the image size, before any stage allocates a buffer.
    pub fn validate(&self) -> Result<()> {
        if !(self.sigma > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "sigma must be > 0, got {}",
                self.sigma
            )));
        }
        if !(0.0..=1.0).contains(&self.min_energy) {
            return Err(PipelineError::InvalidParameter(format!(
                "min_energy must be in [0, 1], got {}",
                self.min_energy
            )));
        }
        if self.sample_weight_ratio < 1.0 {
            return Err(PipelineError::InvalidParameter(format!(
                "sample_weight_ratio must be >= 1, got {}",
                self.sample_weight_ratio
            )));
        }
        if self.smooth == 0 || self.smooth % 2 == 0 {
            return Err(PipelineError::InvalidParameter(format!(
                "smooth must be an odd number >= 1, got {}",
                self.smooth
            )));
        }
        if self.window_size == 0 || self.window_size % 2 == 0 {
            return Err(PipelineError::InvalidParameter(format!(
                "window_size must be an odd number >= 1, got {}",
                self.window_size
            )));
        }
        if self.min_s < 1 {
            return Err(PipelineError::InvalidDimensions(format!(
                "min_s must be >= 1, got {}",
                self.min_s
            )));
        }
        if self.min_s > self.max_s {
            return Err(PipelineError::InvalidDimensions(format!(
                "min_s ({}) must be <= max_s ({})",
                self.min_s, self.max_s
            )));
        }
        Ok(())
    }

    /// Dimension-dependent half of §4.7's search-range constraint:
    /// `max_s <= min(width, height)/2`. Only meaningful when autodetection
    /// will actually run (`pixel_size == 0`); a forced `pixel_size` skips
    /// §4.7 entirely per §6, so the range is left unconstrained by the image
    /// in that case. Call this once `width`/`height` are known, in addition
    /// to (not instead of) [`PipelineParams::validate`].
    pub fn validate_detection_range(&self, width: u32, height: u32) -> Result<()> {
        self.validate()?;
        if self.pixel_size == 0 {
            let limit = (width.min(height) / 2).max(1);
            if self.max_s > limit {
                return Err(PipelineError::InvalidDimensions(format!(
                    "max_s ({}) must be <= min(width, height)/2 ({limit}) for {width}x{height}",
                    self.max_s
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_validate() {
        assert!(PipelineParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_sigma() {
        let params = PipelineParams::default().with_sigma(0.0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_min_energy() {
        let mut params = PipelineParams::default();
        params.min_energy = 1.5;
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_even_smooth_and_window() {
        let mut params = PipelineParams::default();
        params.smooth = 4;
        assert!(params.validate().is_err());

        let mut params = PipelineParams::default();
        params.window_size = 4;
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_weight_ratio_below_one() {
        let mut params = PipelineParams::default();
        params.sample_weight_ratio = 0.5;
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_min_s_greater_than_max_s() {
        let params = PipelineParams::default().with_detection_range(10, 5);
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_min_s_below_one() {
        let params = PipelineParams::default().with_detection_range(0, 5);
        assert!(params.validate().is_err());
    }

    #[test]
    fn validate_detection_range_rejects_max_s_beyond_half_dimension() {
        let params = PipelineParams::default().with_detection_range(2, 32);
        assert!(params.validate_detection_range(16, 16).is_err());
        assert!(params.validate_detection_range(64, 64).is_ok());
    }

    #[test]
    fn validate_detection_range_ignores_image_size_when_pixel_size_is_forced() {
        let params = PipelineParams::default().with_detection_range(2, 32).with_pixel_size(4);
        assert!(params.validate_detection_range(16, 16).is_ok());
    }

    #[test]
    fn sample_mode_round_trips_through_u8() {
        for mode in [SampleMode::Direct, SampleMode::Center, SampleMode::Average, SampleMode::Weighted] {
            assert_eq!(SampleMode::from_u8(mode.as_u8()), Some(mode));
        }
        assert_eq!(SampleMode::from_u8(99), None);
    }

    #[test]
    fn effective_pixel_size_defaults_to_eight() {
        assert_eq!(PipelineParams::default().effective_pixel_size(), 8);
        assert_eq!(PipelineParams::default().with_pixel_size(12).effective_pixel_size(), 12);
    }
}
