use bevy::prelude::LinearRgba;
use deferred_helper::deferred::ParamValue;
use deferred_helper::params_io::{read_document, write_document_pretty};
use deferred_helper::{
    DeferredHelper, HelperConfig, LoadStatus, ParameterGroup, ParamsLayout, RecordingBackend, RenderPass,
};
use serde_json::{json, Value};
use std::path::Path;

fn helper_at(root: &Path) -> DeferredHelper {
    let mut backend = RecordingBackend::default();
    let mut helper = DeferredHelper::new("scene").with_config(HelperConfig::default().with_config_root(root));
    helper.init(&mut backend, 640, 480).unwrap();
    helper
}

#[test]
fn test_first_init_creates_config_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("json");
    let helper = helper_at(&root);

    assert!(root.is_dir());
    assert!(!helper.params_path().exists());
    assert_eq!(helper.params_path(), root.join("scene.json"));
}

#[test]
fn test_saved_parameters_load_on_next_init() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("json");

    let first = helper_at(&root);
    first.fog().unwrap().borrow_mut().set_range(25.0, 400.0);
    first.bloom().unwrap().borrow_mut().set_enabled(false);
    first.point_light().unwrap().borrow().lights()[2].borrow_mut().intensity = 4.0;
    let path = first.save_params().unwrap();
    assert_eq!(path, first.params_path());

    let second = helper_at(&root);
    assert_eq!(second.fog().unwrap().borrow().range(), (25.0, 400.0));
    assert!(!second.bloom().unwrap().borrow().is_enabled());
    assert_eq!(second.point_light().unwrap().borrow().lights()[2].borrow().intensity, 4.0);
    assert_eq!(second.parameters_json(), first.parameters_json());
}

/// Every value moved off its current setting, staying inside its range.
fn shifted(group: &ParameterGroup) -> ParameterGroup {
    let toward = |value: f32, min: f32, max: f32| (value + if value < max { max } else { min }) * 0.5;
    let mut group = group.clone();
    for param in group.iter_mut() {
        param.value = match &param.value {
            ParamValue::Bool(v) => ParamValue::Bool(!v),
            &ParamValue::Int { value, min, max } => ParamValue::Int {
                value: if value < max { max } else { min },
                min,
                max,
            },
            &ParamValue::Float { value, min, max } => ParamValue::Float {
                value: toward(value, min, max),
                min,
                max,
            },
            ParamValue::Color(c) => ParamValue::Color(LinearRgba::new(
                (c.red + 0.9) * 0.5,
                (c.green + 0.3) * 0.5,
                (c.blue + 0.6) * 0.5,
                c.alpha * 0.5,
            )),
            &ParamValue::Vec3 { value, min, max } => ParamValue::Vec3 {
                value: value.map(|x| toward(x, min, max)),
                min,
                max,
            },
            ParamValue::Group(g) => ParamValue::Group(shifted(g)),
        };
    }
    group
}

fn assert_every_leaf_differs(changed: &Value, defaults: &Value, path: &str) {
    match (changed, defaults) {
        (Value::Object(changed), Value::Object(defaults)) => {
            assert_eq!(changed.len(), defaults.len(), "{}", path);
            for (key, value) in changed {
                assert_every_leaf_differs(value, &defaults[key], &format!("{}/{}", path, key));
            }
        }
        _ => assert_ne!(changed, defaults, "{} kept its default", path),
    }
}

#[test]
fn test_every_parameter_survives_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("json");

    let first = helper_at(&root);
    let defaults = first.parameters_json();
    for pass in first.processor().iter() {
        let mut pass = pass.borrow_mut();
        let group = shifted(&pass.parameters());
        pass.apply_parameters(&group);
    }
    let changed = first.parameters_json();
    assert_every_leaf_differs(&changed, &defaults, "deferred");
    first.save_params().unwrap();

    let second = helper_at(&root);
    assert_eq!(second.parameters_json(), changed);
    let (near, far) = {
        let shadow = second.shadow().unwrap().borrow();
        (shadow.near(), shadow.far())
    };
    assert!(near < far);
}

#[test]
fn test_load_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut helper = helper_at(&dir.path().join("json"));
    helper.fog().unwrap().borrow_mut().set_range(5.0, 50.0);
    helper.save_params().unwrap();

    let first = helper.load();
    let after_first = helper.parameters_json();
    let second = helper.load();

    assert_eq!(first, second);
    assert!(matches!(first, LoadStatus::Loaded { passes: 8, .. }));
    assert_eq!(helper.parameters_json(), after_first);
}

#[test]
fn test_missing_document_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut helper = helper_at(&dir.path().join("json"));
    let before = helper.parameters_json();

    assert_eq!(helper.load(), LoadStatus::NoSavedParameters);
    assert_eq!(helper.load_params(None), LoadStatus::NoSavedParameters);
    assert_eq!(helper.load_params(Some(&json!({ "other": 1 }))), LoadStatus::NoSavedParameters);
    assert_eq!(helper.parameters_json(), before);
}

#[test]
fn test_partial_document_keeps_other_passes() {
    let dir = tempfile::tempdir().unwrap();
    let mut helper = helper_at(&dir.path().join("json"));
    let bloom_before = helper.bloom().unwrap().borrow().parameters().to_json();

    let doc = json!({
        "deferred": {
            "Fog": { "start": 20.0 },
            "Wireframe": { "enabled": true }
        }
    });
    let status = helper.load_params(Some(&doc));

    assert_eq!(status, LoadStatus::Loaded { passes: 1, parameters: 1 });
    assert_eq!(helper.fog().unwrap().borrow().range(), (20.0, 100.0));
    assert_eq!(helper.bloom().unwrap().borrow().parameters().to_json(), bloom_before);
}

#[test]
fn test_wrong_typed_values_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut helper = helper_at(&dir.path().join("json"));

    let doc = json!({ "deferred": { "SSAO": { "enabled": "yes", "radius": 2.0 } } });
    let status = helper.load_params(Some(&doc));

    assert_eq!(status, LoadStatus::Loaded { passes: 1, parameters: 1 });
    assert!(helper.ssao().unwrap().borrow().is_enabled());
}

#[test]
fn test_save_preserves_unrelated_keys() {
    let dir = tempfile::tempdir().unwrap();
    let helper = helper_at(&dir.path().join("json"));
    let path = helper.params_path();
    write_document_pretty(&path, &json!({ "camera": { "fov": 60 }, "deferred": { "stale": true } })).unwrap();

    helper.save_params().unwrap();

    let doc = read_document(&path).unwrap().unwrap();
    assert_eq!(doc["camera"], json!({ "fov": 60 }));
    assert!(doc["deferred"].get("stale").is_none());
    assert_eq!(doc["deferred"]["Fog"]["start"], json!(10.0));
    assert!(doc["deferred"]["PointLight"]["light_0"].is_object());
}

#[test]
fn test_renderers_layout_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = HelperConfig::default()
        .with_config_root(dir.path())
        .with_layout(ParamsLayout::Renderers);
    let helper = DeferredHelper::new("main").with_config(config);
    assert_eq!(helper.params_path(), dir.path().join("renderers").join("main.json"));
}

#[test]
fn test_helper_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("helper.json");
    write_document_pretty(
        &path,
        &json!({ "passes": ["SSAO", "Bloom"], "shadow_phase_lights": true, "layout": "renderers" }),
    )
    .unwrap();

    let config = HelperConfig::from_json_file(&path).unwrap();
    assert_eq!(config.passes.len(), 2);
    assert!(config.shadow_phase_lights);
    assert_eq!(config.layout, ParamsLayout::Renderers);
    assert_eq!(config.max_point_lights, 6);
}
