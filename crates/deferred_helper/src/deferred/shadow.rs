//! Directional shadow-mapped lighting.
//!
//! The pass owns an orthographic light camera and a depth-only shadow map.
//! The scene is drawn into the map from the light in a separate phase
//! ([`ShadowLightPass::begin_shadow_map`]); the processing step then shades
//! the chain input with ambient + diffuse light, darkening shadowed pixels.

use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;

use super::labels::PassKind;
use super::params::ParameterGroup;
use super::pass::{CreatePass, PassBindings, PassContext, RenderPass};
use super::scope::TargetScope;
use crate::backend::{RenderBackend, TargetDescriptor, TargetId, TextureRef, ViewUniforms};
use crate::camera::linear_depth_scalar;
use crate::error::ConfigError;

/// Shadow map resolution.
pub const SHADOW_MAP_SIZE: u32 = 2048;

/// Shadow map texture format.
pub const SHADOW_DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Range of the light position widgets.
const POSITION_RANGE: f32 = 2000.0;

/// Depth the shadow map is cleared to.
const SHADOW_CLEAR: LinearRgba = LinearRgba::WHITE;

/// Shadow map target and light view, copied out of the pass so the pass
/// stays free while the scene is drawn into the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMapBinding {
    pub target: TargetId,
    pub view: ViewUniforms,
}

impl ShadowMapBinding {
    /// Bind and clear the shadow map with the light's view.
    pub fn begin<'a, B: RenderBackend + ?Sized>(&self, backend: &'a mut B) -> TargetScope<'a, B> {
        TargetScope::new(backend, self.target, Some(&self.view), Some(SHADOW_CLEAR))
    }
}

pub struct ShadowLightPass {
    enabled: bool,
    position: Vec3,
    target: Vec3,
    near: f32,
    far: f32,
    /// Half-extent of the orthographic light frustum.
    viewport_size: f32,
    ambient_color: LinearRgba,
    diffuse_color: LinearRgba,
    darkness: f32,
    bias: f32,
    shadow_map: TargetId,
}

impl ShadowLightPass {
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Aim the light at `target`.
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Set both clip planes. Rejects `far <= near` and leaves the current
    /// planes untouched.
    pub fn set_clip_planes(&mut self, near: f32, far: f32) -> Result<(), ConfigError> {
        linear_depth_scalar(near, far)?;
        self.near = near;
        self.far = far;
        Ok(())
    }

    pub fn set_near(&mut self, near: f32) -> Result<(), ConfigError> {
        self.set_clip_planes(near, self.far)
    }

    pub fn set_far(&mut self, far: f32) -> Result<(), ConfigError> {
        self.set_clip_planes(self.near, far)
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn set_viewport_size(&mut self, size: f32) {
        self.viewport_size = size.max(f32::EPSILON);
    }

    pub fn viewport_size(&self) -> f32 {
        self.viewport_size
    }

    /// `1 / (far - near)` of the light camera. Clip planes are validated
    /// on every change, so this is always finite.
    pub fn linear_scalar(&self) -> f32 {
        1.0 / (self.far - self.near)
    }

    /// Light-space view matrix.
    pub fn light_view_matrix(&self) -> Mat4 {
        let forward = (self.target - self.position).normalize_or_zero();
        let up = if forward.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.position, self.target, up)
    }

    /// Light-space orthographic projection matrix.
    pub fn light_projection_matrix(&self) -> Mat4 {
        let s = self.viewport_size;
        Mat4::orthographic_rh(-s, s, -s, s, self.near, self.far)
    }

    pub fn light_view_projection(&self) -> Mat4 {
        self.light_projection_matrix() * self.light_view_matrix()
    }

    pub fn view_uniforms(&self) -> ViewUniforms {
        ViewUniforms {
            view: self.light_view_matrix(),
            projection: self.light_projection_matrix(),
        }
    }

    pub fn shadow_map(&self) -> TextureRef {
        TextureRef::depth(self.shadow_map)
    }

    /// Bind and clear the shadow map with the light's view. Scene geometry
    /// drawn through the returned scope lands in the map.
    pub fn begin_shadow_map<'a, B: RenderBackend + ?Sized>(&self, backend: &'a mut B) -> TargetScope<'a, B> {
        self.binding().begin(backend)
    }

    pub fn binding(&self) -> ShadowMapBinding {
        ShadowMapBinding {
            target: self.shadow_map,
            view: self.view_uniforms(),
        }
    }
}

impl CreatePass for ShadowLightPass {
    fn create(_size: UVec2, backend: &mut dyn RenderBackend) -> Self {
        let shadow_map = backend.create_target(&TargetDescriptor {
            label: "shadow_map",
            size: UVec2::splat(SHADOW_MAP_SIZE),
            color_formats: Vec::new(),
            depth_format: Some(SHADOW_DEPTH_FORMAT),
        });
        Self {
            enabled: true,
            position: Vec3::new(0.0, 100.0, 0.0),
            target: Vec3::ZERO,
            near: 1.0,
            far: 1000.0,
            viewport_size: 100.0,
            ambient_color: LinearRgba::rgb(0.1, 0.1, 0.1),
            diffuse_color: LinearRgba::rgb(0.8, 0.8, 0.8),
            darkness: 0.6,
            bias: 0.001,
            shadow_map,
        }
    }
}

impl RenderPass for ShadowLightPass {
    fn kind(&self) -> PassKind {
        PassKind::ShadowLight
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
            .add_color("ambientColor", self.ambient_color)
            .add_color("diffuseColor", self.diffuse_color)
            .add_float("darkness", self.darkness, 0.0, 1.0)
            .add_float("bias", self.bias, 0.0, 0.01)
            .add_vec3("position", self.position, -POSITION_RANGE, POSITION_RANGE)
            .add_float("near", self.near, 0.1, 5000.0)
            .add_float("far", self.far, 0.1, 5000.0);
        group
    }

    fn apply_parameters(&mut self, group: &ParameterGroup) {
        if let Some(v) = group.get_bool("enabled") {
            self.enabled = v;
        }
        if let Some(v) = group.get_color("ambientColor") {
            self.ambient_color = v;
        }
        if let Some(v) = group.get_color("diffuseColor") {
            self.diffuse_color = v;
        }
        if let Some(v) = group.get_float("darkness") {
            self.darkness = v;
        }
        if let Some(v) = group.get_float("bias") {
            self.bias = v;
        }
        if let Some(v) = group.get_vec3("position") {
            self.position = v;
        }
        let near = group.get_float("near").unwrap_or(self.near);
        let far = group.get_float("far").unwrap_or(self.far);
        if let Err(e) = self.set_clip_planes(near, far) {
            warn!("{}: {}, keeping near={} far={}", self.name(), e, self.near, self.far);
        }
    }

    fn process(&mut self, backend: &mut dyn RenderBackend, ctx: &PassContext<'_>) {
        let params = self.parameters();
        backend.run_pass(&ctx.invocation(
            self.kind(),
            &params,
            PassBindings::Shadow {
                shadow_map: self.shadow_map(),
                light_view_projection: self.light_view_projection(),
                linear_depth_scalar: self.linear_scalar(),
            },
        ));
    }

    fn debug_draw(&self, backend: &mut dyn RenderBackend, position: Vec2, size: Vec2) {
        backend.draw_texture(self.shadow_map(), position, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCommand, RecordingBackend};

    fn pass() -> (RecordingBackend, ShadowLightPass) {
        let mut backend = RecordingBackend::default();
        let pass = ShadowLightPass::create(UVec2::new(64, 64), &mut backend);
        (backend, pass)
    }

    #[test]
    fn test_linear_scalar_from_clip_planes() {
        let (_, mut shadow) = pass();
        shadow.set_far(800.0).unwrap();
        shadow.set_near(50.0).unwrap();
        assert!((shadow.linear_scalar() - 1.0 / 750.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_clip_planes_are_rejected() {
        let (_, mut shadow) = pass();
        shadow.set_clip_planes(50.0, 800.0).unwrap();
        assert!(shadow.set_near(800.0).is_err());
        assert_eq!((shadow.near(), shadow.far()), (50.0, 800.0));
    }

    #[test]
    fn test_loaded_inverted_planes_keep_previous() {
        let (_, mut shadow) = pass();
        let mut group = shadow.parameters();
        group.add_float("near", 900.0, 0.1, 5000.0);
        group.add_float("far", 100.0, 0.1, 5000.0);
        shadow.apply_parameters(&group);
        assert_eq!((shadow.near(), shadow.far()), (1.0, 1000.0));
    }

    #[test]
    fn test_light_view_looks_at_target() {
        let (_, mut shadow) = pass();
        shadow.set_position(Vec3::new(100.0, 200.0, 100.0));
        shadow.look_at(Vec3::ZERO);
        let origin_in_light = shadow.light_view_matrix().transform_point3(Vec3::ZERO);
        assert!(origin_in_light.x.abs() < 1e-3);
        assert!(origin_in_light.y.abs() < 1e-3);
        assert!(origin_in_light.z < 0.0);
    }

    #[test]
    fn test_straight_down_light_has_valid_view() {
        let (_, mut shadow) = pass();
        shadow.set_position(Vec3::new(0.0, 100.0, 0.0));
        shadow.look_at(Vec3::ZERO);
        assert!(shadow.light_view_matrix().is_finite());
    }

    #[test]
    fn test_shadow_map_scope_binds_and_clears() {
        let (mut backend, shadow) = pass();
        backend.take_commands();
        {
            let mut scope = shadow.begin_shadow_map(&mut backend);
            scope.backend().record_draw("caster");
        }
        let map = shadow.shadow_map().target;
        assert_eq!(
            backend.commands(),
            &[
                BackendCommand::Bind { target: map, clear: true },
                BackendCommand::DrawScene { label: "caster".into(), target: Some(map) },
                BackendCommand::Unbind { target: map },
            ]
        );
    }
}
