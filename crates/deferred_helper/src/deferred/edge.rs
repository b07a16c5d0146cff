//! Edge detection on G-buffer normals and depth.

use bevy::prelude::*;

use super::labels::PassKind;
use super::params::ParameterGroup;
use super::pass::{CreatePass, PassBindings, PassContext, RenderPass};
use crate::backend::RenderBackend;

pub struct EdgePass {
    enabled: bool,
    edge_color: LinearRgba,
    /// Draw edges over the chain input instead of a flat background.
    use_read_color: bool,
    normal_strength: f32,
    depth_strength: f32,
}

impl EdgePass {
    pub fn set_edge_color(&mut self, color: LinearRgba) {
        self.edge_color = color;
    }

    pub fn edge_color(&self) -> LinearRgba {
        self.edge_color
    }

    pub fn set_use_read_color(&mut self, use_read_color: bool) {
        self.use_read_color = use_read_color;
    }

    pub fn use_read_color(&self) -> bool {
        self.use_read_color
    }
}

impl CreatePass for EdgePass {
    fn create(_size: UVec2, _backend: &mut dyn RenderBackend) -> Self {
        Self {
            enabled: true,
            edge_color: LinearRgba::WHITE,
            use_read_color: false,
            normal_strength: 0.5,
            depth_strength: 0.5,
        }
    }
}

impl RenderPass for EdgePass {
    fn kind(&self) -> PassKind {
        PassKind::EdgeDetection
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
            .add_color("edgeColor", self.edge_color)
            .add_bool("useReadColor", self.use_read_color)
            .add_float("normalEdgeStrength", self.normal_strength, 0.0, 1.0)
            .add_float("depthEdgeStrength", self.depth_strength, 0.0, 1.0);
        group
    }

    fn apply_parameters(&mut self, group: &ParameterGroup) {
        if let Some(v) = group.get_bool("enabled") {
            self.enabled = v;
        }
        if let Some(v) = group.get_color("edgeColor") {
            self.edge_color = v;
        }
        if let Some(v) = group.get_bool("useReadColor") {
            self.use_read_color = v;
        }
        if let Some(v) = group.get_float("normalEdgeStrength") {
            self.normal_strength = v;
        }
        if let Some(v) = group.get_float("depthEdgeStrength") {
            self.depth_strength = v;
        }
    }

    fn process(&mut self, backend: &mut dyn RenderBackend, ctx: &PassContext<'_>) {
        let params = self.parameters();
        backend.run_pass(&ctx.invocation(self.kind(), &params, PassBindings::None));
    }
}
