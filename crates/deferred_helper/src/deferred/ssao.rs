//! SSAO (Screen-Space Ambient Occlusion) pass.
//!
//! This module handles:
//! - SSAO kernel generation (hemisphere sampling points)
//! - Darkening the chain input by the occlusion factor

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;

use super::labels::PassKind;
use super::params::ParameterGroup;
use super::pass::{CreatePass, PassBindings, PassContext, RenderPass};
use crate::backend::RenderBackend;

/// Seed for kernel generation, fixed so frames are reproducible.
const KERNEL_SEED: u64 = 0x55A0;

pub const MIN_KERNEL_SIZE: i32 = 4;
pub const MAX_KERNEL_SIZE: i32 = 64;

/// SSAO kernel containing hemisphere sample directions.
/// These points are distributed in a hemisphere and used to sample
/// the depth buffer around each fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct SsaoKernel {
    /// Sample directions in tangent space, packed as vec4 for GPU alignment
    /// xyz = direction, w = unused (padding)
    pub samples: Vec<[f32; 4]>,
}

impl Default for SsaoKernel {
    fn default() -> Self {
        Self::new(MAX_KERNEL_SIZE as u32)
    }
}

impl SsaoKernel {
    /// Generate a new SSAO kernel with the specified number of samples.
    ///
    /// The samples are distributed in a hemisphere with:
    /// - Random directions in tangent space (Z+ is the normal direction)
    /// - Scaled to cluster samples closer to the origin (more local occlusion)
    pub fn new(size: u32) -> Self {
        let mut rng = StdRng::seed_from_u64(KERNEL_SEED);
        let mut samples = Vec::with_capacity(size as usize);

        for i in 0..size {
            let xi1: f32 = rng.gen();
            let xi2: f32 = rng.gen();

            // Cosine-weighted hemisphere sampling
            let phi = 2.0 * std::f32::consts::PI * xi1;
            let cos_theta = (1.0 - xi2).sqrt();
            let sin_theta = xi2.sqrt();

            let mut sample = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);

            // lerp(0.1, 1.0, scale^2): more samples near the surface
            let scale = (i as f32 + 1.0) / size as f32;
            sample *= 0.1 + 0.9 * scale * scale;

            samples.push([sample.x, sample.y, sample.z, 0.0]);
        }

        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

pub struct SsaoPass {
    enabled: bool,
    /// World-space radius for occlusion sampling
    radius: f32,
    /// How dark fully occluded areas get
    darkness: f32,
    kernel: SsaoKernel,
}

impl SsaoPass {
    pub fn kernel(&self) -> &SsaoKernel {
        &self.kernel
    }

    pub fn set_kernel_size(&mut self, size: i32) {
        let size = size.clamp(MIN_KERNEL_SIZE, MAX_KERNEL_SIZE) as u32;
        if size as usize != self.kernel.len() {
            self.kernel = SsaoKernel::new(size);
        }
    }
}

impl CreatePass for SsaoPass {
    fn create(_size: UVec2, _backend: &mut dyn RenderBackend) -> Self {
        Self {
            enabled: true,
            radius: 0.5,
            darkness: 0.8,
            kernel: SsaoKernel::default(),
        }
    }
}

impl RenderPass for SsaoPass {
    fn kind(&self) -> PassKind {
        PassKind::Ssao
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
            .add_float("radius", self.radius, 0.01, 10.0)
            .add_float("darkness", self.darkness, 0.0, 1.0)
            .add_int("kernelSize", self.kernel.len() as i32, MIN_KERNEL_SIZE, MAX_KERNEL_SIZE);
        group
    }

    fn apply_parameters(&mut self, group: &ParameterGroup) {
        if let Some(v) = group.get_bool("enabled") {
            self.enabled = v;
        }
        if let Some(v) = group.get_float("radius") {
            self.radius = v;
        }
        if let Some(v) = group.get_float("darkness") {
            self.darkness = v;
        }
        if let Some(v) = group.get_int("kernelSize") {
            self.set_kernel_size(v);
        }
    }

    fn process(&mut self, backend: &mut dyn RenderBackend, ctx: &PassContext<'_>) {
        let params = self.parameters();
        backend.run_pass(&ctx.invocation(
            self.kind(),
            &params,
            PassBindings::SsaoKernel(&self.kernel.samples),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;

    #[test]
    fn test_kernel_is_hemisphere_and_deterministic() {
        let kernel = SsaoKernel::new(16);
        assert_eq!(kernel.len(), 16);
        for s in &kernel.samples {
            assert!(s[2] >= 0.0);
            assert!(Vec3::new(s[0], s[1], s[2]).length() <= 1.0 + 1e-5);
        }
        assert_eq!(kernel, SsaoKernel::new(16));
    }

    #[test]
    fn test_kernel_size_parameter_regenerates() {
        let mut backend = RecordingBackend::default();
        let mut ssao = SsaoPass::create(UVec2::ONE, &mut backend);
        let mut group = ssao.parameters();
        group.add_int("kernelSize", 8, MIN_KERNEL_SIZE, MAX_KERNEL_SIZE);
        ssao.apply_parameters(&group);
        assert_eq!(ssao.kernel().len(), 8);
    }
}
