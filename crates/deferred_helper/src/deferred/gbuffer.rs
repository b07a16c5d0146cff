//! G-Buffer layout for deferred rendering.
//!
//! The G-Buffer stores geometry information in multiple render targets:
//! - gColor (RGBA16F): RGB = albedo, A = emission intensity
//! - gNormal (RGBA16F): RGB = world-space normal (normalized)
//! - gPosition (RGBA32F): XYZ = world position, W = linear depth
//!
//! Linear depth is `(view_depth - near) * linear_depth_scalar`, the same
//! scalar handed to draw callbacks through `RenderInfo`.

use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;

use crate::backend::{RenderBackend, TargetDescriptor, TargetId, TextureRef};

/// Depth texture format for G-buffer pass
pub const GBUFFER_DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// G-Buffer texture formats
pub const GBUFFER_COLOR_FORMAT: TextureFormat = TextureFormat::Rgba16Float;
pub const GBUFFER_NORMAL_FORMAT: TextureFormat = TextureFormat::Rgba16Float;
pub const GBUFFER_POSITION_FORMAT: TextureFormat = TextureFormat::Rgba32Float;

/// Format of the ping-pong targets passes render into.
pub const PASS_TARGET_FORMAT: TextureFormat = TextureFormat::Rgba16Float;

/// The shared G-buffer of a processor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GBuffer {
    target: TargetId,
    size: UVec2,
}

impl GBuffer {
    pub const ALBEDO: u8 = 0;
    pub const NORMAL: u8 = 1;
    pub const POSITION: u8 = 2;

    /// Allocate the G-buffer target.
    pub fn new(backend: &mut dyn RenderBackend, size: UVec2) -> Self {
        let target = backend.create_target(&TargetDescriptor {
            label: "gbuffer",
            size,
            color_formats: vec![
                GBUFFER_COLOR_FORMAT,
                GBUFFER_NORMAL_FORMAT,
                GBUFFER_POSITION_FORMAT,
            ],
            depth_format: Some(GBUFFER_DEPTH_FORMAT),
        });
        Self { target, size }
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn albedo(&self) -> TextureRef {
        TextureRef::color(self.target, Self::ALBEDO)
    }

    pub fn normal(&self) -> TextureRef {
        TextureRef::color(self.target, Self::NORMAL)
    }

    pub fn position(&self) -> TextureRef {
        TextureRef::color(self.target, Self::POSITION)
    }

    pub fn depth(&self) -> TextureRef {
        TextureRef::depth(self.target)
    }

    /// Every attachment in debug-draw order.
    pub fn channels(&self) -> [TextureRef; 4] {
        [self.albedo(), self.normal(), self.position(), self.depth()]
    }
}

/// Allocate a single-color target used as pass input/output.
pub(crate) fn create_color_target(
    backend: &mut dyn RenderBackend,
    label: &'static str,
    size: UVec2,
) -> TargetId {
    backend.create_target(&TargetDescriptor {
        label,
        size,
        color_formats: vec![PASS_TARGET_FORMAT],
        depth_format: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;

    #[test]
    fn test_gbuffer_allocates_all_attachments() {
        let mut backend = RecordingBackend::default();
        let gbuffer = GBuffer::new(&mut backend, UVec2::new(640, 480));

        let desc = backend.target(gbuffer.target()).expect("gbuffer target");
        assert_eq!(desc.size, UVec2::new(640, 480));
        assert_eq!(desc.color_formats.len(), 3);
        assert_eq!(desc.color_formats[GBuffer::POSITION as usize], TextureFormat::Rgba32Float);
        assert_eq!(desc.depth_format, Some(GBUFFER_DEPTH_FORMAT));
        assert_eq!(gbuffer.channels()[3], TextureRef::depth(gbuffer.target()));
    }
}
