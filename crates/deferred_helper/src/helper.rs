//! One-call deferred pipeline: passes, two-phase render, GUI and persistence.
//!
//! [`DeferredHelper`] builds the stock pass chain on a [`Processor`], drives
//! the shadow and main phases around a scene draw callback each frame, and
//! keeps pass parameters in a JSON document under the config root.

use std::path::PathBuf;

use bevy::prelude::*;
use serde_json::{Map, Value};

use crate::backend::{RenderBackend, TargetId, TextureRef};
use crate::camera::{linear_depth_scalar, CameraView};
use crate::config::HelperConfig;
use crate::deferred::{
    BgPass, BloomPass, DofPass, DynPass, EdgePass, FogPass, PassHandle, PassKind,
    PointLightPass, Processor, RenderPass, SharedPointLight, ShadowLightPass, SsaoPass,
};
use crate::error::{ConfigError, HelperError};
use crate::gui::{group_height, pack_columns, HelperAction, HelperGui};
use crate::params_io::{self, DEFERRED_KEY};
use crate::render_info::RenderInfo;

/// Highest valid debug view mode.
pub const MAX_DEBUG_VIEW_MODE: i32 = 4;

/// What [`DeferredHelper::debug_draw`] shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugView {
    None,
    GBuffer,
    ShadowMap,
    DepthOfField,
    Bloom,
}

impl DebugView {
    pub fn from_mode(mode: i32) -> Self {
        match mode {
            1 => DebugView::GBuffer,
            2 => DebugView::ShadowMap,
            3 => DebugView::DepthOfField,
            4 => DebugView::Bloom,
            _ => DebugView::None,
        }
    }
}

/// Outcome of applying a parameter document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    /// Document applied; counts of passes touched and values assigned.
    Loaded { passes: usize, parameters: usize },
    /// No document, or no `"deferred"` section in it. Nothing changed.
    NoSavedParameters,
}

/// Deferred pipeline with the stock pass chain.
pub struct DeferredHelper {
    name: String,
    config: HelperConfig,
    processor: Processor,
    background: Option<PassHandle<BgPass>>,
    edge: Option<PassHandle<EdgePass>>,
    ssao: Option<PassHandle<SsaoPass>>,
    shadow: Option<PassHandle<ShadowLightPass>>,
    point_light: Option<PassHandle<PointLightPass>>,
    fog: Option<PassHandle<FogPass>>,
    dof: Option<PassHandle<DofPass>>,
    bloom: Option<PassHandle<BloomPass>>,
    gui: Option<HelperGui>,
    debug_view_mode: i32,
}

impl DeferredHelper {
    /// A helper named `name`. The name picks the parameter document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: HelperConfig::default(),
            processor: Processor::new(),
            background: None,
            edge: None,
            ssao: None,
            shadow: None,
            point_light: None,
            fog: None,
            dof: None,
            bloom: None,
            gui: None,
            debug_view_mode: 0,
        }
    }

    pub fn with_config(mut self, config: HelperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.processor.is_initialized()
    }

    /// Allocate the pipeline at `width` x `height`, create the passes and
    /// the GUI, and load saved parameters if the config root already exists.
    pub fn init(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<(), HelperError> {
        self.processor.init(backend, width, height)?;
        self.create_all_passes(backend)?;
        let viewport = backend.viewport_size();
        self.create_gui(viewport.y);
        info!(
            "Deferred helper '{}' ready: {} passes at {}x{}",
            self.name,
            self.processor.len(),
            width,
            height
        );
        Ok(())
    }

    /// Create the configured passes in order, with their stock settings.
    pub fn create_all_passes(&mut self, backend: &mut dyn RenderBackend) -> Result<(), ConfigError> {
        let passes = self.config.passes.clone();
        for kind in passes {
            if self.find_pass(kind).is_some() {
                warn!("Pass {} listed twice, keeping the first", kind);
                continue;
            }
            match kind {
                PassKind::Background => {
                    let bg = self.processor.create_pass::<BgPass>(backend)?;
                    bg.borrow_mut().fill(backend, self.config.background_color());
                    self.background = Some(bg);
                }
                PassKind::EdgeDetection => {
                    let edge = self.processor.create_pass::<EdgePass>(backend)?;
                    {
                        let mut edge = edge.borrow_mut();
                        edge.set_use_read_color(true);
                        edge.set_edge_color(LinearRgba::BLACK);
                    }
                    self.edge = Some(edge);
                }
                PassKind::Ssao => self.ssao = Some(self.processor.create_pass(backend)?),
                PassKind::ShadowLight => {
                    let shadow = self.processor.create_pass::<ShadowLightPass>(backend)?;
                    {
                        let mut shadow = shadow.borrow_mut();
                        shadow.set_position(Vec3::new(100.0, 200.0, 100.0));
                        shadow.look_at(Vec3::ZERO);
                        shadow.set_clip_planes(50.0, 800.0)?;
                        shadow.set_viewport_size(256.0);
                    }
                    self.shadow = Some(shadow);
                }
                PassKind::PointLight => {
                    let point_light = self.processor.create_pass::<PointLightPass>(backend)?;
                    {
                        let mut point_light = point_light.borrow_mut();
                        point_light.set_max_lights(self.config.max_point_lights);
                        point_light.add_default_lights(self.config.default_point_lights);
                    }
                    self.point_light = Some(point_light);
                }
                PassKind::Fog => self.fog = Some(self.processor.create_pass(backend)?),
                PassKind::DepthOfField => self.dof = Some(self.processor.create_pass(backend)?),
                PassKind::Bloom => self.bloom = Some(self.processor.create_pass(backend)?),
            }
        }
        Ok(())
    }

    /// Render one frame.
    ///
    /// With an enabled shadow light, `draw` is called first for the shadow
    /// map and then for the G-buffer; otherwise only for the G-buffer. The
    /// pass chain runs after the main phase and is composited to the bound
    /// output when `auto_draw` is set.
    pub fn render<B, F>(&mut self, backend: &mut B, mut draw: F, camera: &CameraView, auto_draw: bool) -> Result<(), HelperError>
    where
        B: RenderBackend,
        F: FnMut(&mut B, &RenderInfo),
    {
        if !self.processor.is_initialized() {
            return Err(ConfigError::NotInitialized.into());
        }
        let lds = linear_depth_scalar(camera.near(), camera.far())?;
        let clip_plane = self.config.clip_plane();

        // The pass borrow ends here; the draw callback may edit the light.
        let mut shadow_phase = None;
        if let Some(shadow) = &self.shadow {
            let shadow = shadow.borrow();
            if shadow.is_enabled() {
                let info = RenderInfo::shadow(
                    shadow.linear_scalar(),
                    shadow.light_view_matrix().inverse(),
                    clip_plane,
                );
                shadow_phase = Some((info, shadow.binding()));
            }
        }
        if let Some((info, binding)) = shadow_phase {
            let mut scope = binding.begin(backend);
            draw(scope.backend(), &info);
            if self.config.shadow_phase_lights {
                draw_lights_with(self.point_light.as_ref(), scope.backend(), &info);
            }
        }

        let info = RenderInfo::main(lds, camera.inverse_view(), clip_plane);
        let mut scope = self.processor.begin(backend, camera, true)?;
        draw(scope.backend(), &info);
        draw_lights_with(self.point_light.as_ref(), scope.backend(), &info);
        scope.finish(auto_draw);
        Ok(())
    }

    /// Draw point-light volumes into the bound target, if the point-light
    /// pass exists and is enabled.
    pub fn draw_lights(&self, backend: &mut dyn RenderBackend, info: &RenderInfo) {
        draw_lights_with(self.point_light.as_ref(), backend, info);
    }

    /// Hand a scene light to the point-light pass.
    pub fn add_light(&self, light: SharedPointLight) {
        match &self.point_light {
            Some(pass) => pass.borrow_mut().add_light(light),
            None => warn!("Helper '{}' has no point-light pass, light dropped", self.name),
        }
    }

    /// Target holding the last rendered frame.
    pub fn rendered_image(&self) -> Option<TargetId> {
        self.texture().map(|t| t.target)
    }

    /// Color attachment of [`rendered_image`](Self::rendered_image).
    pub fn texture(&self) -> Option<TextureRef> {
        self.processor.output()
    }

    pub fn debug_view_mode(&self) -> i32 {
        self.debug_view_mode
    }

    pub fn set_debug_view_mode(&mut self, mode: i32) {
        self.debug_view_mode = mode.clamp(0, MAX_DEBUG_VIEW_MODE);
    }

    /// Draw the intermediate buffers picked by the debug view mode.
    pub fn debug_draw(&self, backend: &mut dyn RenderBackend) {
        let viewport = backend.viewport_size();
        let size = viewport * 0.25;
        let position = Vec2::new(0.0, viewport.y - size.y);

        match DebugView::from_mode(self.debug_view_mode) {
            DebugView::None => {}
            DebugView::GBuffer => self.processor.debug_draw(backend),
            DebugView::ShadowMap => debug_draw_pass(self.shadow.as_ref(), backend, position, size),
            DebugView::DepthOfField => debug_draw_pass(self.dof.as_ref(), backend, position, size),
            DebugView::Bloom => debug_draw_pass(self.bloom.as_ref(), backend, position, size),
        }
    }

    /// Lay out the parameter windows for a viewport of the given height, add
    /// the helper window and bootstrap the config root: create it if
    /// missing, otherwise load the saved parameters.
    pub fn create_gui(&mut self, viewport_height: f32) {
        let heights: Vec<_> = self
            .processor
            .iter()
            .map(|pass| {
                let pass = pass.borrow();
                (pass.kind(), group_height(&pass.parameters(), &self.config.gui))
            })
            .collect();
        let layout = pack_columns(&heights, viewport_height, &self.config.gui);
        self.gui = Some(HelperGui::new(layout));
        self.create_helper_gui();

        match params_io::ensure_dir(&self.config.config_root) {
            Ok(true) => {
                self.load();
            }
            Ok(false) => info!("Created parameter directory {}", self.config.config_root.display()),
            Err(e) => warn!(
                "Could not create parameter directory {}: {}",
                self.config.config_root.display(),
                e
            ),
        }
    }

    /// Add the window with the debug view selector and the save/load
    /// buttons after the last pass column.
    pub fn create_helper_gui(&mut self) {
        match self.gui.as_mut() {
            Some(gui) => gui.enable_helper(),
            None => warn!("Helper '{}': create_gui must run before create_helper_gui", self.name),
        }
    }

    pub fn gui(&self) -> Option<&HelperGui> {
        self.gui.as_ref()
    }

    /// Draw every pass window and the helper window, applying edits and
    /// running save/load when their buttons are pressed.
    pub fn draw_gui(&mut self, ui: &imgui::Ui) {
        let action = {
            let Some(gui) = self.gui.as_ref() else {
                return;
            };
            for pass in self.processor.iter() {
                let Ok(mut pass) = pass.try_borrow_mut() else {
                    continue;
                };
                if let Some(placement) = gui.layout().placement(pass.kind()) {
                    gui.draw_pass(ui, placement, &mut *pass);
                }
            }
            gui.draw_helper(ui, &mut self.debug_view_mode)
        };
        self.set_debug_view_mode(self.debug_view_mode);

        match action {
            Some(HelperAction::Save) => {
                if let Err(e) = self.save_params() {
                    error!("Saving deferred parameters failed: {}", e);
                }
            }
            Some(HelperAction::Load) => {
                self.load();
            }
            None => {}
        }
    }

    /// Path of this helper's parameter document.
    pub fn params_path(&self) -> PathBuf {
        self.config.params_path(&self.name)
    }

    /// Every pass's parameters, keyed by pass name.
    pub fn parameters_json(&self) -> Value {
        let mut map = Map::new();
        for pass in self.processor.iter() {
            let pass = pass.borrow();
            map.insert(pass.name().to_string(), pass.parameters().to_json());
        }
        Value::Object(map)
    }

    /// Write the `"deferred"` section of the parameter document, keeping
    /// every other top-level key of an existing document.
    pub fn save_params(&self) -> Result<PathBuf, HelperError> {
        let path = self.params_path();
        let mut doc = match params_io::read_document(&path) {
            Ok(Some(doc)) => doc,
            Ok(None) => params_io::empty_document(),
            Err(e) => {
                warn!("Replacing unreadable parameter document {}: {}", path.display(), e);
                params_io::empty_document()
            }
        };
        params_io::merge_section(&mut doc, DEFERRED_KEY, self.parameters_json());
        params_io::write_document_pretty(&path, &doc)?;
        info!("Saved deferred parameters to {}", path.display());
        Ok(path)
    }

    /// Apply a parameter document. Passes missing from it keep their values.
    pub fn load_params(&mut self, doc: Option<&Value>) -> LoadStatus {
        let Some(doc) = doc else {
            warn!("Helper '{}': no saved parameters", self.name);
            return LoadStatus::NoSavedParameters;
        };
        let Some(section) = doc.get(DEFERRED_KEY).and_then(Value::as_object) else {
            warn!("Helper '{}': no saved parameters in document", self.name);
            return LoadStatus::NoSavedParameters;
        };

        let mut passes = 0;
        let mut parameters = 0;
        for (key, value) in section {
            let Some(pass) = PassKind::from_name(key).and_then(|kind| self.find_pass(kind)) else {
                debug!("Ignoring saved parameters for unknown pass '{}'", key);
                continue;
            };
            let mut pass = pass.borrow_mut();
            let mut group = pass.parameters();
            parameters += group.load_json(value);
            pass.apply_parameters(&group);
            passes += 1;
        }
        LoadStatus::Loaded { passes, parameters }
    }

    /// Load the parameter document at [`params_path`](Self::params_path).
    pub fn load(&mut self) -> LoadStatus {
        let path = self.params_path();
        match params_io::read_document(&path) {
            Ok(Some(doc)) => {
                let status = self.load_params(Some(&doc));
                info!("Loaded deferred parameters from {}: {:?}", path.display(), status);
                status
            }
            Ok(None) => {
                warn!("No parameter document at {}", path.display());
                LoadStatus::NoSavedParameters
            }
            Err(e) => {
                warn!("Could not read parameter document {}: {}", path.display(), e);
                LoadStatus::NoSavedParameters
            }
        }
    }

    fn find_pass(&self, kind: PassKind) -> Option<DynPass> {
        self.processor
            .iter()
            .find(|pass| pass.try_borrow().map(|p| p.kind() == kind).unwrap_or(false))
            .cloned()
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    pub fn background(&self) -> Option<&PassHandle<BgPass>> {
        self.background.as_ref()
    }

    pub fn edge(&self) -> Option<&PassHandle<EdgePass>> {
        self.edge.as_ref()
    }

    pub fn ssao(&self) -> Option<&PassHandle<SsaoPass>> {
        self.ssao.as_ref()
    }

    pub fn shadow(&self) -> Option<&PassHandle<ShadowLightPass>> {
        self.shadow.as_ref()
    }

    pub fn point_light(&self) -> Option<&PassHandle<PointLightPass>> {
        self.point_light.as_ref()
    }

    pub fn fog(&self) -> Option<&PassHandle<FogPass>> {
        self.fog.as_ref()
    }

    pub fn dof(&self) -> Option<&PassHandle<DofPass>> {
        self.dof.as_ref()
    }

    pub fn bloom(&self) -> Option<&PassHandle<BloomPass>> {
        self.bloom.as_ref()
    }
}

fn draw_lights_with(point_light: Option<&PassHandle<PointLightPass>>, backend: &mut dyn RenderBackend, info: &RenderInfo) {
    if let Some(pass) = point_light {
        let pass = pass.borrow();
        if pass.is_enabled() {
            pass.draw_lights(backend, info);
        }
    }
}

fn debug_draw_pass<P: RenderPass>(pass: Option<&PassHandle<P>>, backend: &mut dyn RenderBackend, position: Vec2, size: Vec2) {
    if let Some(pass) = pass {
        pass.borrow().debug_draw(backend, position, size);
    }
}
