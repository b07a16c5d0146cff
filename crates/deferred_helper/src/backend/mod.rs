//! GPU backend seam.
//!
//! The deferred helper only orchestrates: it decides which targets are bound,
//! in which order passes run and what parameters they see. Everything that
//! touches the GPU goes through [`RenderBackend`], so the orchestration can
//! run on top of any renderer (or headless, see [`RecordingBackend`]).

mod recording;

pub use recording::*;

use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;

use crate::deferred::{GpuPointLight, PassInvocation};
use crate::render_info::RenderInfo;

/// Handle to a render target owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

/// One attachment of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    Color(u8),
    Depth,
}

/// A texture that can be sampled or drawn: a target plus an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureRef {
    pub target: TargetId,
    pub attachment: Attachment,
}

impl TextureRef {
    pub fn color(target: TargetId, index: u8) -> Self {
        Self {
            target,
            attachment: Attachment::Color(index),
        }
    }

    pub fn depth(target: TargetId) -> Self {
        Self {
            target,
            attachment: Attachment::Depth,
        }
    }
}

/// Description of a render target to allocate.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDescriptor {
    pub label: &'static str,
    pub size: UVec2,
    pub color_formats: Vec<TextureFormat>,
    pub depth_format: Option<TextureFormat>,
}

/// View matrices applied while a target is bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewUniforms {
    /// view_from_world
    pub view: Mat4,
    /// clip_from_view
    pub projection: Mat4,
}

impl ViewUniforms {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn inverse_view(&self) -> Mat4 {
        self.view.inverse()
    }
}

/// GPU operations the deferred pipeline needs.
///
/// Binding is strictly nested: every `bind_target` is matched by an
/// `unbind_target` of the same target, issued by a scope guard.
pub trait RenderBackend {
    /// Allocate a render target.
    fn create_target(&mut self, desc: &TargetDescriptor) -> TargetId;

    /// Make `target` the current render target, optionally applying view
    /// matrices and clearing it.
    fn bind_target(&mut self, target: TargetId, view: Option<&ViewUniforms>, clear: Option<LinearRgba>);

    /// Restore the target that was bound before `target`.
    fn unbind_target(&mut self, target: TargetId);

    /// Run one screen-space pass.
    fn run_pass(&mut self, invocation: &PassInvocation<'_>);

    /// Draw point-light volumes into the currently bound target.
    fn draw_point_lights(&mut self, lights: &[GpuPointLight], info: &RenderInfo);

    /// Draw a texture as a screen-space quad (diagnostics).
    fn draw_texture(&mut self, texture: TextureRef, position: Vec2, size: Vec2);

    /// Draw `source` over the whole currently bound output.
    fn composite(&mut self, source: TextureRef);

    /// Size of the current viewport in pixels.
    fn viewport_size(&self) -> Vec2;
}
