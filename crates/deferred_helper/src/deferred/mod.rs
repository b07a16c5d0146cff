//! Deferred shading pipeline.
//!
//! Scene geometry is drawn once into a G-buffer; a chain of screen-space
//! passes then shades and post-processes it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ┌─────────────────┐
//! │   Shadow Map    │  ← Scene drawn from the shadow light (optional)
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │   G-Buffer      │  ← Scene drawn from the camera (MRT)
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │   Pass Chain    │  ← Background, Edge, SSAO, Shadow, Point lights,
//! │                 │    Fog, DoF, Bloom (enabled ones, in order)
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │   Final Output  │  ← Composited to the bound output when auto-drawing
//! └─────────────────┘
//! ```
//!
//! ## G-Buffer Layout
//!
//! - **gColor** (RGBA16F): RGB = albedo, A = emission intensity
//! - **gNormal** (RGBA16F): RGB = world-space normal (normalized)
//! - **gPosition** (RGBA32F): XYZ = world position, W = linear depth
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut processor = Processor::new();
//! processor.init(&mut backend, 1280, 720)?;
//! let ssao = processor.create_pass::<SsaoPass>(&mut backend)?;
//!
//! let mut scope = processor.begin(&mut backend, &camera, true)?;
//! draw_scene(scope.backend());
//! scope.finish(true);
//! ```

mod background;
mod bloom;
mod dof;
mod edge;
mod fog;
mod gbuffer;
mod labels;
mod params;
mod pass;
mod point_light;
mod processor;
mod scope;
mod shadow;
mod ssao;

pub use background::*;
pub use bloom::*;
pub use dof::*;
pub use edge::*;
pub use fog::*;
pub use gbuffer::*;
pub use labels::*;
pub use params::*;
pub use pass::*;
pub use point_light::*;
pub use processor::*;
pub use scope::*;
pub use shadow::*;
pub use ssao::*;
