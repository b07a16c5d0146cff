//! Column packing for the parameter windows.
//!
//! Groups are stacked top to bottom; when the next group would run past the
//! bottom of the viewport a new column starts. Groups with color widgets
//! reserve extra room below themselves for the color picker popup.

use bevy::prelude::*;

use crate::config::GuiLayoutConfig;
use crate::deferred::{ParameterGroup, PassKind};

/// Where one pass group goes on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupPlacement {
    pub kind: PassKind,
    pub position: Vec2,
    pub size: Vec2,
    /// Start collapsed.
    pub minimized: bool,
}

/// Placement of every pass group plus the helper group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GuiLayout {
    pub groups: Vec<GroupPlacement>,
    pub helper_position: Vec2,
}

impl GuiLayout {
    pub fn placement(&self, kind: PassKind) -> Option<&GroupPlacement> {
        self.groups.iter().find(|g| g.kind == kind)
    }
}

/// Estimated on-screen height of a parameter group.
pub fn group_height(group: &ParameterGroup, config: &GuiLayoutConfig) -> f32 {
    config.header_height + group.row_count() as f32 * config.row_height
}

/// Lay out groups of the given heights, in order, for a viewport of height
/// `viewport_height`.
pub fn pack_columns(groups: &[(PassKind, f32)], viewport_height: f32, config: &GuiLayoutConfig) -> GuiLayout {
    let mut height_sum = config.margin;
    let mut width_sum = config.margin;
    let mut placed = Vec::with_capacity(groups.len());

    for &(kind, height) in groups {
        let pad = if kind.has_color_widgets() {
            config.color_offset
        } else {
            config.pass_padding
        };

        let position = if height_sum + height + pad > viewport_height {
            width_sum += config.column_width + config.column_gap;
            height_sum = height + config.margin;
            Vec2::new(width_sum, config.margin)
        } else {
            let position = Vec2::new(width_sum, height_sum);
            height_sum += height;
            position
        };
        height_sum += pad;

        placed.push(GroupPlacement {
            kind,
            position,
            size: Vec2::new(config.column_width, height),
            minimized: kind == PassKind::PointLight,
        });
    }

    GuiLayout {
        groups: placed,
        helper_position: Vec2::new(width_sum, height_sum),
    }
}
