//! Named, typed, range-bounded parameter groups.
//!
//! Every pass exposes its tweakable settings as a [`ParameterGroup`]. The
//! same group feeds the GUI and the JSON document, keyed by pass name.
//!
//! JSON encoding:
//! - bool -> `true` / `false`
//! - int -> integer
//! - float -> number
//! - color -> `[r, g, b, a]` (linear)
//! - vec3 -> `[x, y, z]`
//! - group -> nested object

use bevy::prelude::*;
use serde_json::{Map, Value};

/// Value of a single parameter, including its editing range.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int { value: i32, min: i32, max: i32 },
    Float { value: f32, min: f32, max: f32 },
    Color(LinearRgba),
    Vec3 { value: Vec3, min: f32, max: f32 },
    Group(ParameterGroup),
}

/// A named parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: ParamValue,
}

/// Ordered set of named parameters.
///
/// Insertion order is display order. Names are unique within a group;
/// adding a parameter with an existing name replaces it in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterGroup {
    name: String,
    params: Vec<Parameter>,
}

impl ParameterGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.params.iter_mut()
    }

    /// Add or replace a parameter.
    pub fn add(&mut self, name: impl Into<String>, value: ParamValue) -> &mut Self {
        let name = name.into();
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.params.push(Parameter { name, value }),
        }
        self
    }

    pub fn add_bool(&mut self, name: impl Into<String>, value: bool) -> &mut Self {
        self.add(name, ParamValue::Bool(value))
    }

    pub fn add_int(&mut self, name: impl Into<String>, value: i32, min: i32, max: i32) -> &mut Self {
        self.add(name, ParamValue::Int { value: value.clamp(min, max), min, max })
    }

    pub fn add_float(&mut self, name: impl Into<String>, value: f32, min: f32, max: f32) -> &mut Self {
        self.add(name, ParamValue::Float { value: value.clamp(min, max), min, max })
    }

    pub fn add_color(&mut self, name: impl Into<String>, value: LinearRgba) -> &mut Self {
        self.add(name, ParamValue::Color(value))
    }

    pub fn add_vec3(&mut self, name: impl Into<String>, value: Vec3, min: f32, max: f32) -> &mut Self {
        let value = value.clamp(Vec3::splat(min), Vec3::splat(max));
        self.add(name, ParamValue::Vec3 { value, min, max })
    }

    /// Add a nested group under its own name.
    pub fn add_group(&mut self, group: ParameterGroup) -> &mut Self {
        let name = group.name.clone();
        self.add(name, ParamValue::Group(group))
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ParamValue> {
        self.params
            .iter_mut()
            .find(|p| p.name == name)
            .map(|p| &mut p.value)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            ParamValue::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            ParamValue::Float { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn get_color(&self, name: &str) -> Option<LinearRgba> {
        match self.get(name)? {
            ParamValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn get_vec3(&self, name: &str) -> Option<Vec3> {
        match self.get(name)? {
            ParamValue::Vec3 { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn group(&self, name: &str) -> Option<&ParameterGroup> {
        match self.get(name)? {
            ParamValue::Group(g) => Some(g),
            _ => None,
        }
    }

    /// Number of widget rows needed to show this group, nested groups
    /// included (each nested group adds a header row).
    pub fn row_count(&self) -> usize {
        self.params
            .iter()
            .map(|p| match &p.value {
                ParamValue::Group(g) => 1 + g.row_count(),
                _ => 1,
            })
            .sum()
    }

    /// Serialize the parameter values (not their ranges) to a JSON object.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for param in &self.params {
            map.insert(param.name.clone(), param.value.to_json());
        }
        Value::Object(map)
    }

    /// Load values from a JSON object.
    ///
    /// Keys missing from `json` keep their current values. Unknown keys are
    /// ignored. Values of the wrong type are skipped with a warning;
    /// numeric values are clamped to the parameter range. Returns the number
    /// of parameters that were assigned.
    pub fn load_json(&mut self, json: &Value) -> usize {
        let Some(map) = json.as_object() else {
            warn!("Parameter group '{}': expected a JSON object", self.name);
            return 0;
        };

        let mut loaded = 0;
        for param in &mut self.params {
            let Some(value) = map.get(&param.name) else {
                continue;
            };
            if param.value.load_json(value, &mut loaded) {
                if !matches!(param.value, ParamValue::Group(_)) {
                    loaded += 1;
                }
            } else {
                warn!(
                    "Parameter '{}/{}': unexpected value {}, keeping {:?}",
                    self.name, param.name, value, param.value
                );
            }
        }
        loaded
    }
}

impl ParamValue {
    fn to_json(&self) -> Value {
        match self {
            ParamValue::Bool(v) => Value::Bool(*v),
            ParamValue::Int { value, .. } => Value::from(*value),
            ParamValue::Float { value, .. } => Value::from(*value),
            ParamValue::Color(c) => Value::from(vec![c.red, c.green, c.blue, c.alpha]),
            ParamValue::Vec3 { value, .. } => Value::from(value.to_array().to_vec()),
            ParamValue::Group(g) => g.to_json(),
        }
    }

    /// Assign from JSON. Returns `false` when the JSON type does not fit.
    fn load_json(&mut self, json: &Value, loaded: &mut usize) -> bool {
        match self {
            ParamValue::Bool(v) => match json.as_bool() {
                Some(b) => {
                    *v = b;
                    true
                }
                None => false,
            },
            ParamValue::Int { value, min, max } => match json.as_i64() {
                Some(i) => {
                    *value = i.clamp(*min as i64, *max as i64) as i32;
                    true
                }
                None => false,
            },
            ParamValue::Float { value, min, max } => match json.as_f64() {
                Some(f) if f.is_finite() => {
                    *value = (f as f32).clamp(*min, *max);
                    true
                }
                _ => false,
            },
            ParamValue::Color(c) => match float_array::<4>(json) {
                Some([r, g, b, a]) => {
                    *c = LinearRgba::new(r, g, b, a);
                    true
                }
                None => false,
            },
            ParamValue::Vec3 { value, min, max } => match float_array::<3>(json) {
                Some(xyz) => {
                    *value = Vec3::from_array(xyz).clamp(Vec3::splat(*min), Vec3::splat(*max));
                    true
                }
                None => false,
            },
            ParamValue::Group(g) => {
                if !json.is_object() {
                    return false;
                }
                *loaded += g.load_json(json);
                true
            }
        }
    }
}

fn float_array<const N: usize>(json: &Value) -> Option<[f32; N]> {
    let items = json.as_array()?;
    if items.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        let f = item.as_f64()?;
        if !f.is_finite() {
            return None;
        }
        *slot = f as f32;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_group() -> ParameterGroup {
        let mut light = ParameterGroup::new("light_0");
        light.add_bool("enabled", true).add_float("radius", 50.0, 1.0, 500.0);

        let mut group = ParameterGroup::new("Sample");
        group
            .add_bool("enabled", true)
            .add_int("samples", 16, 1, 64)
            .add_float("radius", 0.5, 0.0, 10.0)
            .add_color("tint", LinearRgba::new(0.1, 0.2, 0.3, 1.0))
            .add_vec3("position", Vec3::new(1.0, 2.0, 3.0), -100.0, 100.0)
            .add_group(light);
        group
    }

    #[test]
    fn test_json_round_trip() {
        let original = sample_group();
        let json = original.to_json();

        let mut restored = ParameterGroup::new("Sample");
        restored
            .add_bool("enabled", false)
            .add_int("samples", 1, 1, 64)
            .add_float("radius", 0.0, 0.0, 10.0)
            .add_color("tint", LinearRgba::BLACK)
            .add_vec3("position", Vec3::ZERO, -100.0, 100.0)
            .add_group({
                let mut light = ParameterGroup::new("light_0");
                light.add_bool("enabled", false).add_float("radius", 1.0, 1.0, 500.0);
                light
            });

        let loaded = restored.load_json(&json);
        assert_eq!(loaded, 7);
        assert_eq!(restored, original);
    }

    #[test]
    fn test_missing_and_unknown_keys() {
        let mut group = sample_group();
        let loaded = group.load_json(&json!({ "samples": 8, "nonexistent": 3 }));

        assert_eq!(loaded, 1);
        assert_eq!(group.get_int("samples"), Some(8));
        assert_eq!(group.get_float("radius"), Some(0.5));
    }

    #[test]
    fn test_values_are_clamped() {
        let mut group = sample_group();
        group.load_json(&json!({ "samples": 1000, "radius": -4.0 }));

        assert_eq!(group.get_int("samples"), Some(64));
        assert_eq!(group.get_float("radius"), Some(0.0));
    }

    #[test]
    fn test_wrong_type_keeps_value() {
        let mut group = sample_group();
        let loaded = group.load_json(&json!({ "enabled": "yes", "tint": [1.0, 0.0] }));

        assert_eq!(loaded, 0);
        assert_eq!(group.get_bool("enabled"), Some(true));
        assert_eq!(group.get_color("tint"), Some(LinearRgba::new(0.1, 0.2, 0.3, 1.0)));
    }

    #[test]
    fn test_add_replaces_existing() {
        let mut group = ParameterGroup::new("G");
        group.add_bool("enabled", true).add_bool("enabled", false);
        assert_eq!(group.len(), 1);
        assert_eq!(group.get_bool("enabled"), Some(false));
    }

    #[test]
    fn test_row_count_includes_nested() {
        // 5 flat params + nested header + 2 nested rows
        assert_eq!(sample_group().row_count(), 8);
    }
}
