//! Bevy plugin wiring the helper into an app.
//!
//! The helper holds `Rc` pass handles, so it lives as a non-send resource
//! on the main thread, next to the backend `B` (also non-send) and the
//! ImGui context.
//!
//! ## Usage
//!
//! ```rust,ignore
//! App::new()
//!     .add_plugins(DefaultPlugins)
//!     .add_plugins(bevy_mod_imgui::ImguiPlugin::default())
//!     .insert_non_send_resource(RecordingBackend::default())
//!     .add_plugins(DeferredHelperPlugin::<RecordingBackend>::new("scene"))
//!     .run();
//! ```

use std::marker::PhantomData;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_mod_imgui::prelude::ImguiContext;

use crate::backend::RenderBackend;
use crate::config::HelperConfig;
use crate::helper::DeferredHelper;

/// Inserts a [`DeferredHelper`], initializes it at startup from the primary
/// window size and draws its GUI every frame.
pub struct DeferredHelperPlugin<B> {
    name: String,
    config: HelperConfig,
    _backend: PhantomData<fn() -> B>,
}

impl<B> DeferredHelperPlugin<B> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: HelperConfig::default(),
            _backend: PhantomData,
        }
    }

    pub fn with_config(mut self, config: HelperConfig) -> Self {
        self.config = config;
        self
    }
}

impl<B: RenderBackend + 'static> Plugin for DeferredHelperPlugin<B> {
    fn build(&self, app: &mut App) {
        let helper = DeferredHelper::new(self.name.clone()).with_config(self.config.clone());
        app.insert_non_send_resource(helper)
            .add_systems(Startup, init_deferred_helper::<B>)
            .add_systems(Update, draw_deferred_helper_gui);
    }
}

/// Size the pipeline to the primary window.
fn init_deferred_helper<B: RenderBackend + 'static>(
    mut helper: NonSendMut<DeferredHelper>,
    backend: Option<NonSendMut<B>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let Some(mut backend) = backend else {
        warn!("No render backend resource, deferred helper '{}' stays uninitialized", helper.name());
        return;
    };
    let Ok(window) = windows.single() else {
        warn!("No primary window, deferred helper '{}' stays uninitialized", helper.name());
        return;
    };
    if let Err(e) = helper.init(&mut *backend, window.physical_width(), window.physical_height()) {
        error!("Deferred helper '{}' failed to initialize: {}", helper.name(), e);
    }
}

fn draw_deferred_helper_gui(mut helper: NonSendMut<DeferredHelper>, mut context: NonSendMut<ImguiContext>) {
    if !helper.is_initialized() {
        return;
    }
    let ui = context.ui();
    helper.draw_gui(ui);
}
