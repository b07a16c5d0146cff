//! Bloom post-processing for deferred rendering.
//!
//! Implements a multi-pass bloom effect:
//! 1. Extract bright pixels from the HDR chain input
//! 2. Downsample through a mip chain (blur)
//! 3. Upsample back up, blending mip levels
//! 4. Composite bloom onto original image

use bevy::prelude::*;

use super::gbuffer::create_color_target;
use super::labels::PassKind;
use super::params::ParameterGroup;
use super::pass::{CreatePass, PassBindings, PassContext, RenderPass};
use crate::backend::{RenderBackend, TargetId, TextureRef};

/// Number of bloom mip levels (downsampling passes).
/// 6 levels: full -> 1/2 -> 1/4 -> 1/8 -> 1/16 -> 1/32 -> 1/64
pub const BLOOM_MIP_LEVELS: usize = 6;

const MIP_LABELS: [&str; BLOOM_MIP_LEVELS] = [
    "bloom_mip_0",
    "bloom_mip_1",
    "bloom_mip_2",
    "bloom_mip_3",
    "bloom_mip_4",
    "bloom_mip_5",
];

/// Bloom configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct BloomConfig {
    /// Minimum brightness for bloom (0.0-1.0)
    pub threshold: f32,
    /// Bloom intensity multiplier
    pub intensity: f32,
    /// Blend factor for upsample passes
    pub blend_factor: f32,
    /// Exposure for tone mapping
    pub exposure: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            intensity: 1.5,
            blend_factor: 0.6,
            exposure: 1.2,
        }
    }
}

pub struct BloomPass {
    enabled: bool,
    config: BloomConfig,
    mips: Vec<TargetId>,
}

impl BloomPass {
    pub fn config(&self) -> &BloomConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut BloomConfig {
        &mut self.config
    }

    /// Mip targets, largest first.
    pub fn mips(&self) -> &[TargetId] {
        &self.mips
    }
}

impl CreatePass for BloomPass {
    fn create(size: UVec2, backend: &mut dyn RenderBackend) -> Self {
        let mut mip_size = size;
        let mips = MIP_LABELS
            .iter()
            .map(|&label| {
                // Each mip is half the size
                mip_size = (mip_size / 2).max(UVec2::ONE);
                create_color_target(&mut *backend, label, mip_size)
            })
            .collect();
        Self {
            enabled: true,
            config: BloomConfig::default(),
            mips,
        }
    }
}

impl RenderPass for BloomPass {
    fn kind(&self) -> PassKind {
        PassKind::Bloom
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn parameters(&self) -> ParameterGroup {
        let mut group = ParameterGroup::new(self.name());
        group
            .add_bool("enabled", self.enabled)
            .add_float("threshold", self.config.threshold, 0.0, 1.0)
            .add_float("intensity", self.config.intensity, 0.0, 5.0)
            .add_float("blendFactor", self.config.blend_factor, 0.0, 1.0)
            .add_float("exposure", self.config.exposure, 0.1, 4.0);
        group
    }

    fn apply_parameters(&mut self, group: &ParameterGroup) {
        if let Some(v) = group.get_bool("enabled") {
            self.enabled = v;
        }
        if let Some(v) = group.get_float("threshold") {
            self.config.threshold = v;
        }
        if let Some(v) = group.get_float("intensity") {
            self.config.intensity = v;
        }
        if let Some(v) = group.get_float("blendFactor") {
            self.config.blend_factor = v;
        }
        if let Some(v) = group.get_float("exposure") {
            self.config.exposure = v;
        }
    }

    fn process(&mut self, backend: &mut dyn RenderBackend, ctx: &PassContext<'_>) {
        let params = self.parameters();
        backend.run_pass(&ctx.invocation(self.kind(), &params, PassBindings::Targets(&self.mips)));
    }

    /// Mips side by side, each tile half the width of the previous one.
    fn debug_draw(&self, backend: &mut dyn RenderBackend, position: Vec2, size: Vec2) {
        let mut x = position.x;
        let mut tile = size;
        for target in &self.mips {
            backend.draw_texture(TextureRef::color(*target, 0), Vec2::new(x, position.y), tile);
            x += tile.x;
            tile *= 0.5;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;

    #[test]
    fn test_mip_chain_halves() {
        let mut backend = RecordingBackend::default();
        let bloom = BloomPass::create(UVec2::new(1280, 720), &mut backend);
        assert_eq!(bloom.mips().len(), BLOOM_MIP_LEVELS);

        let sizes: Vec<_> = bloom.mips().iter().map(|m| backend.target(*m).unwrap().size).collect();
        assert_eq!(sizes[0], UVec2::new(640, 360));
        assert_eq!(sizes[5], UVec2::new(20, 11));
    }

    #[test]
    fn test_tiny_framebuffer_keeps_one_pixel_mips() {
        let mut backend = RecordingBackend::default();
        let bloom = BloomPass::create(UVec2::new(4, 4), &mut backend);
        let last = *bloom.mips().last().unwrap();
        assert_eq!(backend.target(last).unwrap().size, UVec2::ONE);
    }

    #[test]
    fn test_parameters_update_config() {
        let mut backend = RecordingBackend::default();
        let mut bloom = BloomPass::create(UVec2::new(64, 64), &mut backend);
        let mut group = bloom.parameters();
        group.add_float("threshold", 0.25, 0.0, 1.0);
        bloom.apply_parameters(&group);
        assert_eq!(bloom.config().threshold, 0.25);
        assert_eq!(bloom.config().exposure, BloomConfig::default().exposure);
    }
}
