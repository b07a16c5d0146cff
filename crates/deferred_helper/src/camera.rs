//! Camera snapshots used to drive the deferred pipeline.
//!
//! A [`CameraView`] is validated on construction so the depth scalar derived
//! from its clip planes is always finite.

use bevy::prelude::*;

use crate::error::ConfigError;

/// Marker component for cameras rendered through the deferred helper.
#[derive(Component, Default, Clone, Copy, Debug)]
pub struct DeferredCamera;

/// Compute `1 / (far - near)`.
///
/// Rejects planes that are non-finite, inverted or equal, since those would
/// produce `inf` or `NaN` in every depth comparison downstream.
pub fn linear_depth_scalar(near: f32, far: f32) -> Result<f32, ConfigError> {
    if !near.is_finite() || !far.is_finite() || far <= near {
        return Err(ConfigError::DegenerateClipPlanes { near, far });
    }
    let scalar = 1.0 / (far - near);
    if !scalar.is_finite() {
        return Err(ConfigError::DegenerateClipPlanes { near, far });
    }
    Ok(scalar)
}

/// View and projection of a camera, with validated clip planes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    near: f32,
    far: f32,
    /// view_from_world
    view: Mat4,
    /// clip_from_view
    projection: Mat4,
}

impl CameraView {
    pub fn new(near: f32, far: f32, view: Mat4, projection: Mat4) -> Result<Self, ConfigError> {
        linear_depth_scalar(near, far)?;
        Ok(Self {
            near,
            far,
            view,
            projection,
        })
    }

    /// Perspective camera at `eye` looking at `target` (Y up).
    pub fn perspective(
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
        eye: Vec3,
        target: Vec3,
    ) -> Result<Self, ConfigError> {
        linear_depth_scalar(near, far)?;
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let projection = Mat4::perspective_rh(fov_y, aspect, near, far);
        Self::new(near, far, view, projection)
    }

    /// Build a view from a Bevy camera's projection and transform.
    pub fn from_bevy(projection: &Projection, transform: &GlobalTransform) -> Result<Self, ConfigError> {
        let world_from_view = Mat4::from(transform.affine());
        let view = world_from_view.inverse();

        match projection {
            Projection::Perspective(p) => {
                linear_depth_scalar(p.near, p.far)?;
                let clip = Mat4::perspective_rh(p.fov, p.aspect_ratio, p.near, p.far);
                Self::new(p.near, p.far, view, clip)
            }
            Projection::Orthographic(o) => {
                linear_depth_scalar(o.near, o.far)?;
                let area = o.area;
                let clip = Mat4::orthographic_rh(
                    area.min.x, area.max.x, area.min.y, area.max.y, o.near, o.far,
                );
                Self::new(o.near, o.far, view, clip)
            }
            #[allow(unreachable_patterns)]
            _ => Err(ConfigError::UnsupportedProjection),
        }
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// world_from_view
    pub fn inverse_view(&self) -> Mat4 {
        self.view.inverse()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// `1 / (far - near)`; always finite for a constructed view.
    pub fn linear_depth_scalar(&self) -> f32 {
        1.0 / (self.far - self.near)
    }
}
