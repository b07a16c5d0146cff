//! Headless backend that records every command it receives.
//!
//! Used by the test suite and by the demo app to trace a frame without a GPU.

use std::collections::HashMap;

use bevy::prelude::*;

use super::{RenderBackend, TargetDescriptor, TargetId, TextureRef, ViewUniforms};
use crate::deferred::{GpuPointLight, PassInvocation, PassKind};
use crate::render_info::RenderInfo;

/// A command received by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    CreateTarget { id: TargetId, label: &'static str, size: UVec2 },
    Bind { target: TargetId, clear: bool },
    Unbind { target: TargetId },
    RunPass { kind: PassKind, read: TextureRef, write: TargetId },
    DrawPointLights { count: usize, bytes: usize, is_shadow_pass: bool },
    DrawTexture { texture: TextureRef },
    Composite { source: TextureRef },
    /// Scene geometry submitted by a draw callback.
    DrawScene { label: String, target: Option<TargetId> },
}

/// Render backend that only records.
#[derive(Debug)]
pub struct RecordingBackend {
    viewport: Vec2,
    next_target: u32,
    targets: HashMap<TargetId, TargetDescriptor>,
    bound: Vec<TargetId>,
    commands: Vec<BackendCommand>,
    mismatched_unbinds: usize,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(Vec2::new(1280.0, 720.0))
    }
}

impl RecordingBackend {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            next_target: 0,
            targets: HashMap::new(),
            bound: Vec::new(),
            commands: Vec::new(),
            mismatched_unbinds: 0,
        }
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    /// Return and forget the recorded commands. Targets stay allocated.
    pub fn take_commands(&mut self) -> Vec<BackendCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Currently bound target, if any.
    pub fn bound_target(&self) -> Option<TargetId> {
        self.bound.last().copied()
    }

    /// Depth of the bind stack. Zero between frames.
    pub fn bind_depth(&self) -> usize {
        self.bound.len()
    }

    /// Number of `unbind_target` calls that did not match the top of the
    /// bind stack.
    pub fn mismatched_unbinds(&self) -> usize {
        self.mismatched_unbinds
    }

    pub fn target(&self, id: TargetId) -> Option<&TargetDescriptor> {
        self.targets.get(&id)
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Record a scene draw into the bound target.
    pub fn record_draw(&mut self, label: impl Into<String>) {
        let target = self.bound_target();
        self.commands.push(BackendCommand::DrawScene {
            label: label.into(),
            target,
        });
    }

    /// Count recorded commands matching `pred`.
    pub fn count(&self, pred: impl Fn(&BackendCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl RenderBackend for RecordingBackend {
    fn create_target(&mut self, desc: &TargetDescriptor) -> TargetId {
        let id = TargetId(self.next_target);
        self.next_target += 1;
        self.targets.insert(id, desc.clone());
        self.commands.push(BackendCommand::CreateTarget {
            id,
            label: desc.label,
            size: desc.size,
        });
        id
    }

    fn bind_target(&mut self, target: TargetId, _view: Option<&ViewUniforms>, clear: Option<LinearRgba>) {
        self.bound.push(target);
        self.commands.push(BackendCommand::Bind {
            target,
            clear: clear.is_some(),
        });
    }

    fn unbind_target(&mut self, target: TargetId) {
        if self.bound.last() == Some(&target) {
            self.bound.pop();
        } else {
            warn!("Unbalanced unbind of {:?} (bound: {:?})", target, self.bound);
            self.mismatched_unbinds += 1;
            if let Some(index) = self.bound.iter().rposition(|t| *t == target) {
                self.bound.remove(index);
            }
        }
        self.commands.push(BackendCommand::Unbind { target });
    }

    fn run_pass(&mut self, invocation: &PassInvocation<'_>) {
        self.commands.push(BackendCommand::RunPass {
            kind: invocation.kind,
            read: invocation.read,
            write: invocation.write,
        });
    }

    fn draw_point_lights(&mut self, lights: &[GpuPointLight], info: &RenderInfo) {
        self.commands.push(BackendCommand::DrawPointLights {
            count: lights.len(),
            bytes: bytemuck::cast_slice::<GpuPointLight, u8>(lights).len(),
            is_shadow_pass: info.is_shadow_pass,
        });
    }

    fn draw_texture(&mut self, texture: TextureRef, _position: Vec2, _size: Vec2) {
        self.commands.push(BackendCommand::DrawTexture { texture });
    }

    fn composite(&mut self, source: TextureRef) {
        self.commands.push(BackendCommand::Composite { source });
    }

    fn viewport_size(&self) -> Vec2 {
        self.viewport
    }
}
