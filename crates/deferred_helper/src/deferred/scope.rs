//! Scope guards for render target binding.
//!
//! Binding a target and forgetting to unbind it corrupts every later frame,
//! so targets are only bound through guards that unbind on drop.

use bevy::prelude::*;

use super::pass::RenderPass;
use crate::backend::{RenderBackend, TargetId, ViewUniforms};

/// Keeps `target` bound until dropped or [`close`](TargetScope::close)d.
pub struct TargetScope<'a, B: RenderBackend + ?Sized> {
    backend: &'a mut B,
    target: TargetId,
    open: bool,
}

impl<'a, B: RenderBackend + ?Sized> TargetScope<'a, B> {
    /// Bind `target`, applying `view` and clearing to `clear` when given.
    pub fn new(
        backend: &'a mut B,
        target: TargetId,
        view: Option<&ViewUniforms>,
        clear: Option<LinearRgba>,
    ) -> Self {
        backend.bind_target(target, view, clear);
        Self {
            backend,
            target,
            open: true,
        }
    }

    /// Backend to issue draws into the bound target.
    pub fn backend(&mut self) -> &mut B {
        &mut *self.backend
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Unbind now instead of at drop.
    pub fn close(mut self) {
        self.unbind();
    }

    fn unbind(&mut self) {
        if self.open {
            self.open = false;
            self.backend.unbind_target(self.target);
        }
    }
}

impl<B: RenderBackend + ?Sized> Drop for TargetScope<'_, B> {
    fn drop(&mut self) {
        self.unbind();
    }
}

/// Calls [`RenderPass::begin`] on creation and [`RenderPass::end`] on drop.
pub struct PassScope<'a, P: RenderPass + ?Sized, B: RenderBackend> {
    pass: &'a mut P,
    backend: &'a mut B,
}

impl<'a, P: RenderPass + ?Sized, B: RenderBackend> PassScope<'a, P, B> {
    pub fn new(pass: &'a mut P, backend: &'a mut B) -> Self {
        pass.begin(&mut *backend);
        Self { pass, backend }
    }

    pub fn backend(&mut self) -> &mut B {
        &mut *self.backend
    }
}

impl<P: RenderPass + ?Sized, B: RenderBackend> Drop for PassScope<'_, P, B> {
    fn drop(&mut self) {
        self.pass.end(&mut *self.backend);
    }
}
