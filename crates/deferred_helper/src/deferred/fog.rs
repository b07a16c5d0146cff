//! Distance fog blended over the chain input using G-buffer linear depth.

use bevy::prelude::*;

use super::labels::PassKind;
use super::params::ParameterGroup;
use super::pass::{CreatePass, PassBindings, PassContext, RenderPass};
use crate::backend::RenderBackend;

pub struct FogPass {
    enabled: bool,
    color: LinearRgba,
    /// Distance where fog starts.
    start: f32,
    /// Distance of full fog. Kept above `start`.
    end: f32,
    density: f32,
}

impl FogPass {
    pub fn set_range(&mut self, start: f32, end: f32) {
        self.start = start.max(0.0);
        self.end = end.max(self.start + f32::EPSILON);
    }

    pub fn range(&self) -> (f32, f32) {
        (self.start, self.end)
    }

    pub fn color(&self) -> LinearRgba {
        self.color
    }
}

impl CreatePass for FogPass {
    fn create(_size: UVec2, _backend: &mut dyn RenderBackend) -> Self {
        Self {
            enabled: true,
            color: Color::srgb(0.102, 0.039, 0.180).to_linear(),
            start: 10.0,
            end: 100.0,
            density: 0.5,
        }
    }
}

impl RenderPass for FogPass {
    fn kind(&self) -> PassKind {
        PassKind::Fog
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
            .add_color("color", self.color)
            .add_float("start", self.start, 0.0, 5000.0)
            .add_float("end", self.end, 0.0, 5000.0)
            .add_float("density", self.density, 0.0, 1.0);
        group
    }

    fn apply_parameters(&mut self, group: &ParameterGroup) {
        if let Some(v) = group.get_bool("enabled") {
            self.enabled = v;
        }
        if let Some(v) = group.get_color("color") {
            self.color = v;
        }
        if let Some(v) = group.get_float("density") {
            self.density = v;
        }
        let start = group.get_float("start").unwrap_or(self.start);
        let end = group.get_float("end").unwrap_or(self.end);
        self.set_range(start, end);
    }

    fn process(&mut self, backend: &mut dyn RenderBackend, ctx: &PassContext<'_>) {
        let params = self.parameters();
        backend.run_pass(&ctx.invocation(self.kind(), &params, PassBindings::None));
    }
}
