//! The deferred processor: G-buffer plus an ordered chain of passes.
//!
//! ```text
//! begin ──► G-buffer bound ──► scene draws ──► end
//!                                               │
//!        ┌──────────────────────────────────────┘
//!        ▼
//!   albedo ─► pass 0 ─► ping ─► pass 1 ─► pong ─► ... ─► output ─► composite
//! ```
//!
//! Disabled passes are skipped without touching the chain.

use std::cell::RefCell;
use std::ops::Index;
use std::rc::Rc;

use bevy::prelude::*;

use super::gbuffer::{create_color_target, GBuffer};
use super::pass::{CreatePass, DynPass, PassContext, PassHandle};
use crate::backend::{RenderBackend, TargetId, TextureRef, ViewUniforms};
use crate::camera::CameraView;
use crate::error::ConfigError;

/// Background color the G-buffer is cleared to at `begin`.
const GBUFFER_CLEAR: LinearRgba = LinearRgba::NONE;

#[derive(Debug, Clone, Copy)]
struct ProcessorTargets {
    gbuffer: GBuffer,
    ping_pong: [TargetId; 2],
}

/// Owns the G-buffer and the ordered pass sequence.
#[derive(Default)]
pub struct Processor {
    targets: Option<ProcessorTargets>,
    passes: Vec<DynPass>,
    output: Option<TextureRef>,
}

impl Processor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the G-buffer and the ping-pong targets.
    ///
    /// Passes size their own targets at creation, so a processor is
    /// initialized once. Build a new one for another resolution.
    pub fn init(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<(), ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        if self.targets.is_some() {
            return Err(ConfigError::AlreadyInitialized);
        }

        let size = UVec2::new(width, height);
        let gbuffer = GBuffer::new(backend, size);
        let ping_pong = [
            create_color_target(backend, "deferred_ping", size),
            create_color_target(backend, "deferred_pong", size),
        ];
        self.targets = Some(ProcessorTargets { gbuffer, ping_pong });
        self.output = None;

        info!("Deferred processor initialized at {}x{}", width, height);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.targets.is_some()
    }

    /// Construct a pass, append it to the chain and return its typed handle.
    pub fn create_pass<P: CreatePass>(&mut self, backend: &mut dyn RenderBackend) -> Result<PassHandle<P>, ConfigError> {
        let targets = self.targets.ok_or(ConfigError::NotInitialized)?;
        let pass = Rc::new(RefCell::new(P::create(targets.gbuffer.size(), backend)));
        debug!("Created pass {} at index {}", pass.borrow().name(), self.passes.len());
        self.passes.push(pass.clone());
        Ok(pass)
    }

    /// Bind the G-buffer for scene drawing with the camera's view.
    ///
    /// The returned guard runs the pass chain when it is finished or dropped.
    pub fn begin<'a, B: RenderBackend>(
        &'a mut self,
        backend: &'a mut B,
        camera: &CameraView,
        clear: bool,
    ) -> Result<ProcessorScope<'a, B>, ConfigError> {
        let targets = self.targets.ok_or(ConfigError::NotInitialized)?;
        let view = ViewUniforms {
            view: camera.view(),
            projection: camera.projection(),
        };
        let gbuffer = targets.gbuffer.target();
        backend.bind_target(gbuffer, Some(&view), clear.then_some(GBUFFER_CLEAR));

        Ok(ProcessorScope {
            processor: self,
            backend,
            gbuffer,
            view,
            linear_depth_scalar: camera.linear_depth_scalar(),
            open: true,
        })
    }

    fn run_chain(&mut self, backend: &mut dyn RenderBackend, view: &ViewUniforms, linear_depth_scalar: f32) -> Option<TextureRef> {
        let targets = self.targets?;
        let gbuffer = targets.gbuffer;
        let mut read = gbuffer.albedo();
        let mut slot = 0;

        for pass in &self.passes {
            let Ok(mut pass) = pass.try_borrow_mut() else {
                warn!("Pass is borrowed elsewhere during processing, skipping it");
                continue;
            };
            if !pass.is_enabled() {
                continue;
            }
            let write = targets.ping_pong[slot];
            let ctx = PassContext {
                gbuffer: &gbuffer,
                view,
                linear_depth_scalar,
                read,
                write,
            };
            pass.process(backend, &ctx);
            read = TextureRef::color(write, 0);
            slot ^= 1;
        }

        self.output = Some(read);
        Some(read)
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DynPass> {
        self.passes.get(index)
    }

    /// Passes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &DynPass> {
        self.passes.iter()
    }

    /// Framebuffer size, once initialized.
    pub fn size(&self) -> Option<UVec2> {
        self.targets.map(|t| t.gbuffer.size())
    }

    pub fn gbuffer(&self) -> Option<&GBuffer> {
        self.targets.as_ref().map(|t| &t.gbuffer)
    }

    /// Result of the most recent frame: the last enabled pass's target, or
    /// the G-buffer albedo when every pass is disabled.
    pub fn output(&self) -> Option<TextureRef> {
        self.output
            .or_else(|| self.targets.map(|t| t.gbuffer.albedo()))
    }

    /// Draw every G-buffer attachment as a row of tiles along the bottom of
    /// the viewport.
    pub fn debug_draw(&self, backend: &mut dyn RenderBackend) {
        let Some(gbuffer) = self.gbuffer() else {
            return;
        };
        let viewport = backend.viewport_size();
        let size = viewport * 0.25;
        for (i, texture) in gbuffer.channels().into_iter().enumerate() {
            let position = Vec2::new(size.x * i as f32, viewport.y - size.y);
            backend.draw_texture(texture, position, size);
        }
    }
}

impl Index<usize> for Processor {
    type Output = DynPass;

    fn index(&self, index: usize) -> &DynPass {
        &self.passes[index]
    }
}

/// Open processor scope: the G-buffer is bound until this closes.
pub struct ProcessorScope<'a, B: RenderBackend> {
    processor: &'a mut Processor,
    backend: &'a mut B,
    gbuffer: TargetId,
    view: ViewUniforms,
    linear_depth_scalar: f32,
    open: bool,
}

impl<B: RenderBackend> ProcessorScope<'_, B> {
    /// Backend to draw scene geometry into the G-buffer.
    pub fn backend(&mut self) -> &mut B {
        &mut *self.backend
    }

    pub fn linear_depth_scalar(&self) -> f32 {
        self.linear_depth_scalar
    }

    /// Close the scope, run the pass chain and composite the result to the
    /// bound output when `auto_draw` is set. Returns the chain output.
    pub fn finish(mut self, auto_draw: bool) -> Option<TextureRef> {
        self.close(auto_draw)
    }

    fn close(&mut self, auto_draw: bool) -> Option<TextureRef> {
        if !self.open {
            return None;
        }
        self.open = false;
        self.backend.unbind_target(self.gbuffer);

        let output = self
            .processor
            .run_chain(&mut *self.backend, &self.view, self.linear_depth_scalar);
        if auto_draw {
            if let Some(output) = output {
                self.backend.composite(output);
            }
        }
        output
    }
}

impl<B: RenderBackend> Drop for ProcessorScope<'_, B> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        if std::thread::panicking() {
            self.open = false;
            self.backend.unbind_target(self.gbuffer);
        } else {
            self.close(false);
        }
    }
}
