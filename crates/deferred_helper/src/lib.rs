//! Deferred shading pipeline helper.
//!
//! This crate provides:
//! - A deferred processor: G-buffer plus an ordered chain of screen-space passes
//! - The stock passes (background, edge, SSAO, shadow light, point lights,
//!   fog, depth of field, bloom)
//! - [`DeferredHelper`], which drives the shadow and main phases around a
//!   scene draw callback each frame
//! - An ImGui parameter editor with JSON persistence
//! - A Bevy plugin to host the helper in an app
//!
//! GPU work goes through the [`RenderBackend`] trait; [`RecordingBackend`]
//! runs the pipeline headless.

pub mod backend;
pub mod camera;
pub mod config;
pub mod deferred;
pub mod error;
pub mod gui;
pub mod helper;
pub mod params_io;
pub mod plugin;
pub mod render_info;

pub use backend::{BackendCommand, RecordingBackend, RenderBackend, TargetId, TextureRef};
pub use camera::{CameraView, DeferredCamera};
pub use config::{GuiLayoutConfig, HelperConfig, ParamsLayout};
pub use deferred::{
    BgPass, BloomPass, DofPass, EdgePass, FogPass, ParameterGroup, PassHandle, PassKind,
    PointLight, PointLightPass, Processor, RenderPass, SharedPointLight, ShadowLightPass, SsaoPass,
};
pub use error::{ConfigError, HelperError};
pub use helper::{DebugView, DeferredHelper, LoadStatus};
pub use plugin::DeferredHelperPlugin;
pub use render_info::RenderInfo;
