//! Background pass: shows a backdrop image wherever nothing was drawn.

use bevy::prelude::*;

use super::gbuffer::create_color_target;
use super::labels::PassKind;
use super::params::ParameterGroup;
use super::pass::{CreatePass, PassBindings, PassContext, RenderPass};
use super::scope::TargetScope;
use crate::backend::{RenderBackend, TargetId, TextureRef};

pub struct BgPass {
    enabled: bool,
    image: TargetId,
    color: LinearRgba,
    /// The image must be refilled with `color` before the next process.
    dirty: bool,
}

impl BgPass {
    /// The backdrop target, drawable between `begin` and `end`.
    pub fn image(&self) -> TextureRef {
        TextureRef::color(self.image, 0)
    }

    pub fn color(&self) -> LinearRgba {
        self.color
    }

    /// Clear the backdrop to a flat color.
    pub fn fill(&mut self, backend: &mut dyn RenderBackend, color: LinearRgba) {
        self.color = color;
        self.dirty = false;
        TargetScope::new(backend, self.image, None, Some(color)).close();
    }
}

impl CreatePass for BgPass {
    fn create(size: UVec2, backend: &mut dyn RenderBackend) -> Self {
        Self {
            enabled: true,
            image: create_color_target(backend, "background_image", size),
            color: LinearRgba::BLACK,
            dirty: true,
        }
    }
}

impl RenderPass for BgPass {
    fn kind(&self) -> PassKind {
        PassKind::Background
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn parameters(&self) -> ParameterGroup {
        let mut group = ParameterGroup::new(self.name());
        group.add_bool("enabled", self.enabled).add_color("color", self.color);
        group
    }

    fn apply_parameters(&mut self, group: &ParameterGroup) {
        if let Some(enabled) = group.get_bool("enabled") {
            self.enabled = enabled;
        }
        if let Some(color) = group.get_color("color") {
            if color != self.color {
                self.color = color;
                self.dirty = true;
            }
        }
    }

    fn begin(&mut self, backend: &mut dyn RenderBackend) {
        backend.bind_target(self.image, None, None);
    }

    fn end(&mut self, backend: &mut dyn RenderBackend) {
        self.dirty = false;
        backend.unbind_target(self.image);
    }

    fn process(&mut self, backend: &mut dyn RenderBackend, ctx: &PassContext<'_>) {
        if self.dirty {
            let color = self.color;
            self.fill(backend, color);
        }
        let params = self.parameters();
        let image = self.image();
        backend.run_pass(&ctx.invocation(self.kind(), &params, PassBindings::Background { image }));
    }
}
