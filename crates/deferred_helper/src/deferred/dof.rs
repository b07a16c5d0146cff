//! Depth of field: blur by distance from the focal plane.
//!
//! The chain input is blurred into two half-resolution buffers (horizontal,
//! then vertical) and mixed back by circle-of-confusion size.

use bevy::prelude::*;

use super::gbuffer::create_color_target;
use super::labels::PassKind;
use super::params::ParameterGroup;
use super::pass::{CreatePass, PassBindings, PassContext, RenderPass};
use crate::backend::{RenderBackend, TargetId, TextureRef};

pub struct DofPass {
    enabled: bool,
    /// Focal plane in linear depth (0 = near, 1 = far).
    focus: f32,
    aperture: f32,
    max_blur: f32,
    blur: [TargetId; 2],
}

impl DofPass {
    pub fn set_focus(&mut self, focus: f32) {
        self.focus = focus.clamp(0.0, 1.0);
    }

    pub fn focus(&self) -> f32 {
        self.focus
    }

    pub fn blur_targets(&self) -> &[TargetId; 2] {
        &self.blur
    }
}

impl CreatePass for DofPass {
    fn create(size: UVec2, backend: &mut dyn RenderBackend) -> Self {
        let half = (size / 2).max(UVec2::ONE);
        Self {
            enabled: true,
            focus: 0.9,
            aperture: 0.2,
            max_blur: 0.6,
            blur: [
                create_color_target(backend, "dof_blur_h", half),
                create_color_target(backend, "dof_blur_v", half),
            ],
        }
    }
}

impl RenderPass for DofPass {
    fn kind(&self) -> PassKind {
        PassKind::DepthOfField
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
            .add_float("focus", self.focus, 0.0, 1.0)
            .add_float("aperture", self.aperture, 0.0, 1.0)
            .add_float("maxBlur", self.max_blur, 0.0, 1.0);
        group
    }

    fn apply_parameters(&mut self, group: &ParameterGroup) {
        if let Some(v) = group.get_bool("enabled") {
            self.enabled = v;
        }
        if let Some(v) = group.get_float("focus") {
            self.set_focus(v);
        }
        if let Some(v) = group.get_float("aperture") {
            self.aperture = v;
        }
        if let Some(v) = group.get_float("maxBlur") {
            self.max_blur = v;
        }
    }

    fn process(&mut self, backend: &mut dyn RenderBackend, ctx: &PassContext<'_>) {
        let params = self.parameters();
        backend.run_pass(&ctx.invocation(self.kind(), &params, PassBindings::Targets(&self.blur)));
    }

    fn debug_draw(&self, backend: &mut dyn RenderBackend, position: Vec2, size: Vec2) {
        for (i, target) in self.blur.iter().enumerate() {
            let offset = Vec2::new(size.x * i as f32, 0.0);
            backend.draw_texture(TextureRef::color(*target, 0), position + offset, size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCommand, RecordingBackend};

    #[test]
    fn test_blur_targets_are_half_resolution() {
        let mut backend = RecordingBackend::default();
        let dof = DofPass::create(UVec2::new(640, 360), &mut backend);
        for target in dof.blur_targets() {
            assert_eq!(backend.target(*target).unwrap().size, UVec2::new(320, 180));
        }
    }

    #[test]
    fn test_debug_draw_tiles_both_buffers() {
        let mut backend = RecordingBackend::default();
        let dof = DofPass::create(UVec2::new(64, 64), &mut backend);
        dof.debug_draw(&mut backend, Vec2::ZERO, Vec2::splat(16.0));
        assert_eq!(backend.count(|c| matches!(c, BackendCommand::DrawTexture { .. })), 2);
    }
}
