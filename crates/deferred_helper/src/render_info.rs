//! Per-phase information handed to the scene draw callback.

use bevy::prelude::*;

/// Describes the phase the scene is being drawn for.
///
/// The helper calls the scene draw callback once for the shadow map (when a
/// shadow light is enabled) and once for the main G-buffer pass. Scene code
/// uses this to pick a depth-only shader for the shadow phase and a full
/// G-buffer shader for the main phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderInfo {
    /// `1 / (far - near)` of the active camera or shadow light.
    pub linear_depth_scalar: f32,
    /// `true` while rendering the shadow map.
    pub is_shadow_pass: bool,
    /// User clip plane (`ax + by + cz + d`), zero when unused.
    pub clip_plane: Vec4,
    /// World-from-view matrix of the active camera or shadow light.
    pub inverse_view_matrix: Mat4,
}

impl RenderInfo {
    /// Info for the shadow-map phase.
    pub fn shadow(linear_depth_scalar: f32, inverse_view_matrix: Mat4, clip_plane: Vec4) -> Self {
        Self {
            linear_depth_scalar,
            is_shadow_pass: true,
            clip_plane,
            inverse_view_matrix,
        }
    }

    /// Info for the main G-buffer phase.
    pub fn main(linear_depth_scalar: f32, inverse_view_matrix: Mat4, clip_plane: Vec4) -> Self {
        Self {
            linear_depth_scalar,
            is_shadow_pass: false,
            clip_plane,
            inverse_view_matrix,
        }
    }

    /// `(linear_depth_scalar, is_shadow_pass)`, for callbacks that need
    /// nothing else.
    pub fn as_pair(&self) -> (f32, bool) {
        (self.linear_depth_scalar, self.is_shadow_pass)
    }
}
