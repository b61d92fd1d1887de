//! FXAA controls and their GPU parameter block.

/// Flag bits shared with `fxaa.wgsl`.
const FLAG_ENABLED: u32 = 1;
const FLAG_SHOW_EDGES: u32 = 2;

pub(crate) const MAX_MUL_REDUCE_RECIPROCAL: f32 = 256.0;
pub(crate) const MAX_MIN_REDUCE_RECIPROCAL: f32 = 512.0;
pub(crate) const MAX_SPAN: f32 = 16.0;

/// Tunable FXAA parameters.
///
/// The reduce factors are kept in reciprocal form (the way the controls are
/// usually published); [`to_uniform`](FxaaSettings::to_uniform) inverts them
/// for the shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FxaaSettings {
    pub enabled: bool,
    /// Tint filtered pixels red instead of blending, to visualize coverage.
    pub show_edges: bool,
    /// Minimum relative luma contrast for a pixel to count as an edge.
    pub luma_threshold: f32,
    /// Reciprocal of the directional reduce multiplier.
    pub mul_reduce_reciprocal: f32,
    /// Reciprocal of the directional reduce floor.
    pub min_reduce_reciprocal: f32,
    /// Edge sampling span cap, in texels.
    pub max_span: f32,
}

impl Default for FxaaSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            show_edges: false,
            luma_threshold: 0.5,
            mul_reduce_reciprocal: 8.0,
            min_reduce_reciprocal: 128.0,
            max_span: 8.0,
        }
    }
}

impl FxaaSettings {
    /// Adjust the luma threshold, keeping it in [0, 1].
    pub fn nudge_luma_threshold(&mut self, delta: f32) {
        self.luma_threshold = (self.luma_threshold + delta).clamp(0.0, 1.0);
    }

    /// Clamp every control to its valid range. Called once per frame after
    /// UI edits so out-of-range values never reach the shader.
    pub fn clamp_ranges(&mut self) {
        self.luma_threshold = self.luma_threshold.clamp(0.0, 1.0);
        self.mul_reduce_reciprocal = self
            .mul_reduce_reciprocal
            .clamp(1.0, MAX_MUL_REDUCE_RECIPROCAL);
        self.min_reduce_reciprocal = self
            .min_reduce_reciprocal
            .clamp(1.0, MAX_MIN_REDUCE_RECIPROCAL);
        self.max_span = self.max_span.clamp(1.0, MAX_SPAN);
    }

    /// Pack into the shader parameter block for a target of the given size.
    pub fn to_uniform(&self, width: u32, height: u32) -> FxaaUniform {
        let mut flags = 0;
        if self.enabled {
            flags |= FLAG_ENABLED;
        }
        if self.show_edges {
            flags |= FLAG_SHOW_EDGES;
        }

        FxaaUniform {
            texel_step: [1.0 / width as f32, 1.0 / height as f32],
            luma_threshold: self.luma_threshold,
            mul_reduce: 1.0 / self.mul_reduce_reciprocal,
            min_reduce: 1.0 / self.min_reduce_reciprocal,
            max_span: self.max_span,
            flags,
            _pad: 0,
        }
    }
}

/// GPU-side FXAA parameter block. Matches the `FxaaUniforms` struct in
/// `fxaa.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FxaaUniform {
    pub texel_step: [f32; 2],
    pub luma_threshold: f32,
    pub mul_reduce: f32,
    pub min_reduce: f32,
    pub max_span: f32,
    pub flags: u32,
    pub _pad: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = FxaaSettings::default();
        assert!(settings.enabled);
        assert!(!settings.show_edges);
        assert_eq!(settings.luma_threshold, 0.5);
        assert_eq!(settings.mul_reduce_reciprocal, 8.0);
        assert_eq!(settings.min_reduce_reciprocal, 128.0);
        assert_eq!(settings.max_span, 8.0);
    }

    #[test]
    fn test_nudge_clamps_threshold() {
        let mut settings = FxaaSettings::default();

        for _ in 0..30 {
            settings.nudge_luma_threshold(0.05);
        }
        assert_eq!(settings.luma_threshold, 1.0);

        for _ in 0..30 {
            settings.nudge_luma_threshold(-0.05);
        }
        assert_eq!(settings.luma_threshold, 0.0);
    }

    #[test]
    fn test_clamp_ranges() {
        let mut settings = FxaaSettings {
            luma_threshold: 2.0,
            mul_reduce_reciprocal: 1024.0,
            min_reduce_reciprocal: 0.25,
            max_span: 100.0,
            ..Default::default()
        };
        settings.clamp_ranges();

        assert_eq!(settings.luma_threshold, 1.0);
        assert_eq!(settings.mul_reduce_reciprocal, MAX_MUL_REDUCE_RECIPROCAL);
        assert_eq!(settings.min_reduce_reciprocal, 1.0);
        assert_eq!(settings.max_span, MAX_SPAN);
    }

    #[test]
    fn test_uniform_inverts_reciprocals() {
        let uniform = FxaaSettings::default().to_uniform(800, 600);

        assert!((uniform.mul_reduce - 1.0 / 8.0).abs() < 1e-6);
        assert!((uniform.min_reduce - 1.0 / 128.0).abs() < 1e-6);
        assert!((uniform.texel_step[0] - 1.0 / 800.0).abs() < 1e-9);
        assert!((uniform.texel_step[1] - 1.0 / 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_uniform_flags() {
        let mut settings = FxaaSettings::default();
        assert_eq!(settings.to_uniform(1, 1).flags, FLAG_ENABLED);

        settings.show_edges = true;
        assert_eq!(
            settings.to_uniform(1, 1).flags,
            FLAG_ENABLED | FLAG_SHOW_EDGES
        );

        settings.enabled = false;
        assert_eq!(settings.to_uniform(1, 1).flags, FLAG_SHOW_EDGES);
    }

    #[test]
    fn test_uniform_layout() {
        // Must match the WGSL uniform block size
        assert_eq!(std::mem::size_of::<FxaaUniform>(), 32);
    }
}
