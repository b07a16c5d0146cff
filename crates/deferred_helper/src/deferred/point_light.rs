//! Point light support for deferred rendering.
//!
//! Lights are shared with scene code through [`SharedPointLight`], so a
//! light can be animated by whoever created it while the pass keeps it in
//! its list. Only the first `max_lights` enabled lights are uploaded.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let light = Rc::new(RefCell::new(PointLight::new(
//!     Vec3::new(0.0, 50.0, 0.0),
//!     LinearRgba::rgb(1.0, 0.5, 0.2),
//!     2.0,
//!     150.0,
//! )));
//! helper.add_light(light.clone());
//! light.borrow_mut().position.y += 1.0;
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use bevy::prelude::*;
use bevy::render::render_resource::ShaderType;

use super::labels::PassKind;
use super::params::ParameterGroup;
use super::pass::{CreatePass, PassBindings, PassContext, RenderPass};
use crate::backend::RenderBackend;
use crate::render_info::RenderInfo;

/// Default number of point lights uploaded per frame.
pub const DEFAULT_MAX_POINT_LIGHTS: usize = 6;

/// Range of the light position widgets.
const POSITION_RANGE: f32 = 2000.0;

/// Distance of default lights from the origin.
const DEFAULT_RING_RADIUS: f32 = 200.0;

/// A point light shared between the scene and the pass.
pub type SharedPointLight = Rc<RefCell<PointLight>>;

/// Point light for deferred rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    /// Light color (linear RGB, alpha ignored).
    pub color: LinearRgba,
    /// Light intensity multiplier.
    pub intensity: f32,
    /// Maximum radius of effect. Light falls off to zero at this distance.
    pub radius: f32,
    pub enabled: bool,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: LinearRgba::WHITE,
            intensity: 1.0,
            radius: 150.0,
            enabled: true,
        }
    }
}

impl PointLight {
    pub fn new(position: Vec3, color: LinearRgba, intensity: f32, radius: f32) -> Self {
        Self {
            position,
            color,
            intensity,
            radius,
            enabled: true,
        }
    }

    /// Light `index` of `count` default lights: positions and hues spread
    /// evenly on a ring around the origin.
    pub fn ring(index: usize, count: usize) -> Self {
        let step = 1.0 / count.max(1) as f32;
        let angle = index as f32 * step * std::f32::consts::TAU;
        let hue = (index as f32 * step * 360.0) % 360.0;
        Self {
            position: Vec3::new(
                angle.cos() * DEFAULT_RING_RADIUS,
                50.0,
                angle.sin() * DEFAULT_RING_RADIUS,
            ),
            color: Color::hsl(hue, 0.8, 0.6).to_linear(),
            ..default()
        }
    }

    pub fn to_gpu(&self) -> GpuPointLight {
        GpuPointLight {
            position: [self.position.x, self.position.y, self.position.z, 1.0],
            color_intensity: [self.color.red, self.color.green, self.color.blue, self.intensity],
            radius_padding: [self.radius, 0.0, 0.0, 0.0],
        }
    }

    fn parameters(&self, name: String) -> ParameterGroup {
        let mut group = ParameterGroup::new(name);
        group
            .add_bool("enabled", self.enabled)
            .add_vec3("position", self.position, -POSITION_RANGE, POSITION_RANGE)
            .add_color("color", self.color)
            .add_float("intensity", self.intensity, 0.0, 10.0)
            .add_float("radius", self.radius, 1.0, POSITION_RANGE);
        group
    }

    fn apply_parameters(&mut self, group: &ParameterGroup) {
        if let Some(v) = group.get_bool("enabled") {
            self.enabled = v;
        }
        if let Some(v) = group.get_vec3("position") {
            self.position = v;
        }
        if let Some(v) = group.get_color("color") {
            self.color = v;
        }
        if let Some(v) = group.get_float("intensity") {
            self.intensity = v;
        }
        if let Some(v) = group.get_float("radius") {
            self.radius = v;
        }
    }
}

/// GPU-side point light data.
/// Must match the light struct of the backend's lighting shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable, ShaderType)]
pub struct GpuPointLight {
    /// World position of the light (xyz), w unused (padding)
    pub position: [f32; 4],
    /// Light color (rgb), w = intensity
    pub color_intensity: [f32; 4],
    /// x = radius, yzw = padding
    pub radius_padding: [f32; 4],
}

pub struct PointLightPass {
    enabled: bool,
    lights: Vec<SharedPointLight>,
    max_lights: usize,
}

impl PointLightPass {
    /// Append a shared light.
    pub fn add_light(&mut self, light: SharedPointLight) {
        self.lights.push(light);
        if self.lights.len() > self.max_lights {
            warn_once!(
                "Too many point lights ({} > {}), extras ignored",
                self.lights.len(),
                self.max_lights
            );
        }
    }

    /// Append `count` default lights spread around one ring.
    pub fn add_default_lights(&mut self, count: usize) {
        for i in 0..count {
            self.add_light(Rc::new(RefCell::new(PointLight::ring(i, count))));
        }
    }

    pub fn lights(&self) -> &[SharedPointLight] {
        &self.lights
    }

    pub fn set_max_lights(&mut self, max_lights: usize) {
        self.max_lights = max_lights;
    }

    pub fn max_lights(&self) -> usize {
        self.max_lights
    }

    /// Enabled lights in upload order, capped at `max_lights`.
    pub fn gpu_lights(&self) -> Vec<GpuPointLight> {
        self.lights
            .iter()
            .map(|l| l.borrow())
            .filter(|l| l.enabled)
            .take(self.max_lights)
            .map(|l| l.to_gpu())
            .collect()
    }

    /// Draw light volumes into the currently bound target.
    pub fn draw_lights(&self, backend: &mut dyn RenderBackend, info: &RenderInfo) {
        let lights = self.gpu_lights();
        if lights.is_empty() {
            return;
        }
        backend.draw_point_lights(&lights, info);
    }
}

impl CreatePass for PointLightPass {
    fn create(_size: UVec2, _backend: &mut dyn RenderBackend) -> Self {
        Self {
            enabled: true,
            lights: Vec::new(),
            max_lights: DEFAULT_MAX_POINT_LIGHTS,
        }
    }
}

impl RenderPass for PointLightPass {
    fn kind(&self) -> PassKind {
        PassKind::PointLight
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn parameters(&self) -> ParameterGroup {
        let mut group = ParameterGroup::new(self.name());
        group.add_bool("enabled", self.enabled);
        for (i, light) in self.lights.iter().enumerate() {
            group.add_group(light.borrow().parameters(format!("light_{}", i)));
        }
        group
    }

    fn apply_parameters(&mut self, group: &ParameterGroup) {
        if let Some(v) = group.get_bool("enabled") {
            self.enabled = v;
        }
        for (i, light) in self.lights.iter().enumerate() {
            if let Some(light_group) = group.group(&format!("light_{}", i)) {
                light.borrow_mut().apply_parameters(light_group);
            }
        }
    }

    fn process(&mut self, backend: &mut dyn RenderBackend, ctx: &PassContext<'_>) {
        let params = self.parameters();
        let lights = self.gpu_lights();
        backend.run_pass(&ctx.invocation(self.kind(), &params, PassBindings::PointLights(&lights)));
    }
}
