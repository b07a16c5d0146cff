//! Stable identities for the passes of the deferred pipeline.

use serde::{Deserialize, Serialize};

/// Kind of render pass.
///
/// The tag is the identity of a pass. Its [`name`](PassKind::name) is used as
/// both the GUI group title and the key in the persisted parameter document,
/// so it must never change between releases. Serde uses the same name.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum PassKind {
    /// Fills pixels not covered by geometry with a background image
    Background,
    /// Screen-space edge detection from depth and normals
    EdgeDetection,
    /// Screen-space ambient occlusion
    #[serde(rename = "SSAO", alias = "Ssao")]
    Ssao,
    /// Directional shadow-mapped light
    ShadowLight,
    /// Accumulated point lights
    PointLight,
    /// Depth-based fog
    Fog,
    /// Depth of field blur
    DepthOfField,
    /// Bright-pass bloom
    Bloom,
}

impl PassKind {
    /// Every pass kind, in the default pipeline order.
    ///
    /// Fog runs before depth of field and bloom rather than last, so the
    /// blur and glow act on the fogged image.
    pub const ALL: [PassKind; 8] = [
        PassKind::Background,
        PassKind::EdgeDetection,
        PassKind::Ssao,
        PassKind::ShadowLight,
        PassKind::PointLight,
        PassKind::Fog,
        PassKind::DepthOfField,
        PassKind::Bloom,
    ];

    /// Display and persistence name.
    pub const fn name(self) -> &'static str {
        match self {
            PassKind::Background => "Background",
            PassKind::EdgeDetection => "EdgeDetection",
            PassKind::Ssao => "SSAO",
            PassKind::ShadowLight => "ShadowLight",
            PassKind::PointLight => "PointLight",
            PassKind::Fog => "Fog",
            PassKind::DepthOfField => "DepthOfField",
            PassKind::Bloom => "Bloom",
        }
    }

    /// Look up a pass kind by its persistence name.
    pub fn from_name(name: &str) -> Option<PassKind> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Whether the GUI group embeds color widgets and needs extra room.
    pub fn has_color_widgets(self) -> bool {
        matches!(
            self,
            PassKind::Background
                | PassKind::EdgeDetection
                | PassKind::PointLight
                | PassKind::ShadowLight
        )
    }
}

impl std::fmt::Display for PassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = PassKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), PassKind::ALL.len());
    }

    #[test]
    fn test_from_name_round_trips() {
        for kind in PassKind::ALL {
            assert_eq!(PassKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PassKind::from_name("NotAPass"), None);
    }

    #[test]
    fn test_serde_uses_display_name() {
        for kind in PassKind::ALL {
            let value = serde_json::to_value(kind).unwrap();
            assert_eq!(value, serde_json::Value::from(kind.name()));
            assert_eq!(serde_json::from_value::<PassKind>(value).unwrap(), kind);
        }
    }
}
