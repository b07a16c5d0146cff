//! The render pass contract.
//!
//! A pass is a unit of screen-space work in the post-G-buffer chain. The
//! [`Processor`](super::Processor) owns every pass as a type-erased
//! `Rc<RefCell<dyn RenderPass>>` and runs them in creation order; the code
//! that created a pass keeps the typed [`PassHandle`] for anything specific
//! to that pass (shadow map rendering, light lists, debug buffers).

use std::cell::RefCell;
use std::rc::Rc;

use bevy::prelude::*;

use super::gbuffer::GBuffer;
use super::labels::PassKind;
use super::params::ParameterGroup;
use super::point_light::GpuPointLight;
use crate::backend::{RenderBackend, TargetId, TextureRef, ViewUniforms};

/// Shared handle to a pass created by the processor.
pub type PassHandle<P> = Rc<RefCell<P>>;

/// Type-erased pass as stored by the processor.
pub type DynPass = Rc<RefCell<dyn RenderPass>>;

/// Where a pass reads from and writes to during the processing chain.
#[derive(Clone, Copy, Debug)]
pub struct PassContext<'a> {
    pub gbuffer: &'a GBuffer,
    pub view: &'a ViewUniforms,
    pub linear_depth_scalar: f32,
    /// Output of the previous enabled pass (G-buffer albedo for the first).
    pub read: TextureRef,
    pub write: TargetId,
}

impl<'a> PassContext<'a> {
    /// Build the backend invocation for a pass.
    pub fn invocation(
        &self,
        kind: PassKind,
        params: &'a ParameterGroup,
        bindings: PassBindings<'a>,
    ) -> PassInvocation<'a> {
        PassInvocation {
            kind,
            read: self.read,
            write: self.write,
            gbuffer: self.gbuffer,
            view: self.view,
            linear_depth_scalar: self.linear_depth_scalar,
            params,
            bindings,
        }
    }
}

/// Extra resources a pass hands to the backend.
#[derive(Clone, Copy, Debug)]
pub enum PassBindings<'a> {
    None,
    /// Background image to show where nothing was drawn.
    Background { image: TextureRef },
    /// Hemisphere sample kernel (xyz, w unused).
    SsaoKernel(&'a [[f32; 4]]),
    /// Shadow map and the light transform it was rendered with.
    Shadow {
        shadow_map: TextureRef,
        light_view_projection: Mat4,
        linear_depth_scalar: f32,
    },
    /// Lights to accumulate.
    PointLights(&'a [GpuPointLight]),
    /// Intermediate targets owned by the pass (bloom mips, blur buffers).
    Targets(&'a [TargetId]),
}

/// Everything the backend needs to run one pass.
#[derive(Clone, Copy, Debug)]
pub struct PassInvocation<'a> {
    pub kind: PassKind,
    pub read: TextureRef,
    pub write: TargetId,
    pub gbuffer: &'a GBuffer,
    pub view: &'a ViewUniforms,
    pub linear_depth_scalar: f32,
    pub params: &'a ParameterGroup,
    pub bindings: PassBindings<'a>,
}

/// Common capability of every pass.
pub trait RenderPass {
    fn kind(&self) -> PassKind;

    /// Display and persistence name, derived from [`kind`](Self::kind).
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Snapshot of the current parameters, named after the pass.
    fn parameters(&self) -> ParameterGroup;

    /// Apply an edited or loaded parameter group. Entries that are missing
    /// or of the wrong type are ignored.
    fn apply_parameters(&mut self, group: &ParameterGroup);

    /// Open the pass's own drawing scope, if it has one.
    fn begin(&mut self, _backend: &mut dyn RenderBackend) {}

    /// Close the scope opened by [`begin`](Self::begin).
    fn end(&mut self, _backend: &mut dyn RenderBackend) {}

    /// Run the pass as part of the processing chain.
    fn process(&mut self, backend: &mut dyn RenderBackend, ctx: &PassContext<'_>);

    /// Visualize intermediate buffers.
    fn debug_draw(&self, _backend: &mut dyn RenderBackend, _position: Vec2, _size: Vec2) {}
}

/// A pass the processor knows how to construct.
pub trait CreatePass: RenderPass + Sized + 'static {
    /// Create the pass for a pipeline of the given size, allocating any
    /// targets it owns.
    fn create(size: UVec2, backend: &mut dyn RenderBackend) -> Self;
}
