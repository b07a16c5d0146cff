//! ImGui front end for pass parameters.
//!
//! One window per pass, placed by [`pack_columns`], plus a "helper" window
//! with the debug view selector and the save/load buttons. Widgets edit a
//! snapshot of the pass's [`ParameterGroup`]; changes are applied back to
//! the pass the same frame.

mod layout;

pub use layout::*;

use bevy::prelude::*;
use imgui::{Condition, StyleColor, Ui};

use crate::deferred::{ParamValue, ParameterGroup, RenderPass};
use crate::helper::MAX_DEBUG_VIEW_MODE;

/// Button pressed in the helper window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelperAction {
    Save,
    Load,
}

/// Window colors (RGBA).
#[derive(Clone, Debug, PartialEq)]
pub struct GuiStyle {
    pub background: [f32; 4],
    pub pass_header: [f32; 4],
    pub helper_header: [f32; 4],
    pub fill: [f32; 4],
    pub border: [f32; 4],
}

impl Default for GuiStyle {
    fn default() -> Self {
        Self {
            background: [0.0, 0.0, 0.0, 0.5],
            pass_header: [0.6, 0.3, 0.8, 0.5],
            helper_header: [0.94, 0.1, 0.2, 0.5],
            fill: [0.3, 0.3, 0.6, 0.5],
            border: [0.1, 0.1, 0.1, 0.5],
        }
    }
}

/// Laid-out parameter GUI.
pub struct HelperGui {
    layout: GuiLayout,
    style: GuiStyle,
    /// Whether the helper window is drawn.
    helper: bool,
}

impl HelperGui {
    pub fn new(layout: GuiLayout) -> Self {
        Self {
            layout,
            style: GuiStyle::default(),
            helper: false,
        }
    }

    pub fn with_style(mut self, style: GuiStyle) -> Self {
        self.style = style;
        self
    }

    pub fn layout(&self) -> &GuiLayout {
        &self.layout
    }

    /// Add the helper window at the position reserved by the layout.
    pub fn enable_helper(&mut self) {
        self.helper = true;
    }

    pub fn has_helper(&self) -> bool {
        self.helper
    }

    /// Draw the window of one pass. Returns `true` when a value changed.
    pub fn draw_pass(&self, ui: &Ui, placement: &GroupPlacement, pass: &mut dyn RenderPass) -> bool {
        let mut group = pass.parameters();
        let mut changed = false;
        {
            let _colors = self.push_colors(ui, self.style.pass_header);
            ui.window(pass.name())
                .position(placement.position.to_array(), Condition::FirstUseEver)
                .size(placement.size.to_array(), Condition::FirstUseEver)
                .collapsed(placement.minimized, Condition::FirstUseEver)
                .build(|| {
                    changed = draw_group(ui, &mut group);
                });
        }
        if changed {
            pass.apply_parameters(&group);
        }
        changed
    }

    /// Draw the helper window, if enabled.
    pub fn draw_helper(&self, ui: &Ui, debug_view_mode: &mut i32) -> Option<HelperAction> {
        if !self.helper {
            return None;
        }
        let mut action = None;
        let _colors = self.push_colors(ui, self.style.helper_header);
        ui.window("helper")
            .position(self.layout.helper_position.to_array(), Condition::FirstUseEver)
            .size([240.0, 100.0], Condition::FirstUseEver)
            .build(|| {
                ui.slider("debugViewMode", 0, MAX_DEBUG_VIEW_MODE, debug_view_mode);
                if ui.button("save") {
                    action = Some(HelperAction::Save);
                }
                ui.same_line();
                if ui.button("load") {
                    action = Some(HelperAction::Load);
                }
            });
        action
    }

    fn push_colors<'ui>(&self, ui: &'ui Ui, header: [f32; 4]) -> [imgui::ColorStackToken<'ui>; 5] {
        [
            ui.push_style_color(StyleColor::WindowBg, self.style.background),
            ui.push_style_color(StyleColor::TitleBg, header),
            ui.push_style_color(StyleColor::TitleBgActive, header),
            ui.push_style_color(StyleColor::FrameBg, self.style.fill),
            ui.push_style_color(StyleColor::Border, self.style.border),
        ]
    }
}

/// Widgets for every parameter of `group`, nested groups as tree nodes.
fn draw_group(ui: &Ui, group: &mut ParameterGroup) -> bool {
    let mut changed = false;
    for param in group.iter_mut() {
        let label = param.name.as_str();
        changed |= match &mut param.value {
            ParamValue::Bool(value) => ui.checkbox(label, value),
            ParamValue::Int { value, min, max } => ui.slider(label, *min, *max, value),
            ParamValue::Float { value, min, max } => ui.slider(label, *min, *max, value),
            ParamValue::Color(color) => {
                let mut rgba = [color.red, color.green, color.blue, color.alpha];
                let edited = ui.color_edit4(label, &mut rgba);
                if edited {
                    *color = LinearRgba::new(rgba[0], rgba[1], rgba[2], rgba[3]);
                }
                edited
            }
            ParamValue::Vec3 { value, min, max } => {
                let mut xyz = value.to_array();
                let edited = ui.slider_config(label, *min, *max).build_array(&mut xyz);
                if edited {
                    *value = Vec3::from_array(xyz);
                }
                edited
            }
            ParamValue::Group(nested) => match ui.tree_node(label) {
                Some(_node) => draw_group(ui, nested),
                None => false,
            },
        };
    }
    changed
}
