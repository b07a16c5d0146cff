use bevy::prelude::*;
use deferred_helper::{
    BackendCommand, CameraView, ConfigError, DeferredHelper, HelperConfig, HelperError, PassKind,
    RecordingBackend, RenderInfo, RenderPass,
};

fn camera() -> CameraView {
    CameraView::perspective(1.0, 16.0 / 9.0, 1.0, 1000.0, Vec3::new(0.0, 100.0, 300.0), Vec3::ZERO).unwrap()
}

fn setup(dir: &std::path::Path, config: HelperConfig) -> (RecordingBackend, DeferredHelper) {
    let mut backend = RecordingBackend::default();
    let mut helper = DeferredHelper::new("scene").with_config(config.with_config_root(dir.join("json")));
    helper.init(&mut backend, 1280, 720).unwrap();
    backend.take_commands();
    (backend, helper)
}

fn draw_scene(backend: &mut RecordingBackend, info: &RenderInfo) {
    backend.record_draw(if info.is_shadow_pass { "shadow" } else { "main" });
}

fn scene_draws(backend: &RecordingBackend) -> Vec<(String, Option<deferred_helper::TargetId>)> {
    backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            BackendCommand::DrawScene { label, target } => Some((label.clone(), *target)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_shadow_phase_runs_before_main_phase() {
    let dir = tempfile::tempdir().unwrap();
    let (mut backend, mut helper) = setup(dir.path(), HelperConfig::default());

    helper.render(&mut backend, draw_scene, &camera(), true).unwrap();

    let shadow_map = helper.shadow().unwrap().borrow().shadow_map().target;
    let gbuffer = helper.processor().gbuffer().unwrap().target();
    assert_eq!(
        scene_draws(&backend),
        vec![("shadow".to_string(), Some(shadow_map)), ("main".to_string(), Some(gbuffer))]
    );
    assert_eq!(backend.bind_depth(), 0);
    assert_eq!(backend.mismatched_unbinds(), 0);
}

#[test]
fn test_disabled_shadow_light_skips_shadow_phase() {
    let dir = tempfile::tempdir().unwrap();
    let (mut backend, mut helper) = setup(dir.path(), HelperConfig::default());
    helper.shadow().unwrap().borrow_mut().set_enabled(false);

    let mut calls = Vec::new();
    helper
        .render(
            &mut backend,
            |b: &mut RecordingBackend, info: &RenderInfo| {
                calls.push(info.is_shadow_pass);
                b.record_draw("main");
            },
            &camera(),
            true,
        )
        .unwrap();

    assert_eq!(calls, vec![false]);
    assert!(!backend
        .commands()
        .iter()
        .any(|c| matches!(c, BackendCommand::RunPass { kind: PassKind::ShadowLight, .. })));
}

#[test]
fn test_helper_without_shadow_pass_draws_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = HelperConfig::default().with_passes(vec![PassKind::Ssao, PassKind::Bloom]);
    let (mut backend, mut helper) = setup(dir.path(), config);

    helper.render(&mut backend, draw_scene, &camera(), true).unwrap();
    assert_eq!(scene_draws(&backend).len(), 1);
}

#[test]
fn test_main_phase_info_carries_camera_depth_scalar() {
    let dir = tempfile::tempdir().unwrap();
    let config = HelperConfig::default().with_clip_plane(Vec4::new(0.0, 1.0, 0.0, -5.0));
    let (mut backend, mut helper) = setup(dir.path(), config);
    let camera = camera();

    let mut infos = Vec::new();
    helper
        .render(&mut backend, |_: &mut RecordingBackend, info: &RenderInfo| infos.push(*info), &camera, false)
        .unwrap();

    let (shadow, main) = (infos[0], infos[1]);
    assert!(shadow.is_shadow_pass);
    assert!(!main.is_shadow_pass);
    assert_eq!(main.linear_depth_scalar, camera.linear_depth_scalar());
    assert_eq!(main.inverse_view_matrix, camera.inverse_view());
    assert_eq!(main.clip_plane, Vec4::new(0.0, 1.0, 0.0, -5.0));
    assert_eq!(shadow.linear_depth_scalar, 1.0 / 750.0);
}

#[test]
fn test_chain_runs_in_order_and_composites_last() {
    let dir = tempfile::tempdir().unwrap();
    let (mut backend, mut helper) = setup(dir.path(), HelperConfig::default());

    helper.render(&mut backend, draw_scene, &camera(), true).unwrap();

    let kinds: Vec<_> = backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            BackendCommand::RunPass { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, PassKind::ALL.to_vec());

    let last = backend.commands().last().cloned();
    assert_eq!(last, Some(BackendCommand::Composite { source: helper.texture().unwrap() }));
    assert_eq!(helper.rendered_image(), helper.texture().map(|t| t.target));
}

#[test]
fn test_no_composite_without_auto_draw() {
    let dir = tempfile::tempdir().unwrap();
    let (mut backend, mut helper) = setup(dir.path(), HelperConfig::default());

    helper.render(&mut backend, draw_scene, &camera(), false).unwrap();

    assert_eq!(backend.count(|c| matches!(c, BackendCommand::Composite { .. })), 0);
    assert!(helper.texture().is_some());
}

#[test]
fn test_point_lights_follow_pass_enable() {
    let dir = tempfile::tempdir().unwrap();
    let (mut backend, mut helper) = setup(dir.path(), HelperConfig::default());
    let light_draws = |backend: &RecordingBackend| {
        backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                BackendCommand::DrawPointLights { count, is_shadow_pass, .. } => Some((*count, *is_shadow_pass)),
                _ => None,
            })
            .collect::<Vec<_>>()
    };

    helper.render(&mut backend, draw_scene, &camera(), true).unwrap();
    assert_eq!(light_draws(&backend), vec![(6, false)]);

    backend.take_commands();
    helper.point_light().unwrap().borrow_mut().set_enabled(false);
    helper.render(&mut backend, draw_scene, &camera(), true).unwrap();
    assert!(light_draws(&backend).is_empty());
}

#[test]
fn test_shadow_phase_lights_flag() {
    let dir = tempfile::tempdir().unwrap();
    let config = HelperConfig::default().with_shadow_phase_lights(true);
    let (mut backend, mut helper) = setup(dir.path(), config);

    helper.render(&mut backend, draw_scene, &camera(), true).unwrap();

    let shadow_lights = backend.count(|c| {
        matches!(c, BackendCommand::DrawPointLights { is_shadow_pass: true, .. })
    });
    assert_eq!(shadow_lights, 1);
}

#[test]
fn test_zero_size_is_rejected() {
    let mut backend = RecordingBackend::default();
    let mut helper = DeferredHelper::new("zero");
    let result = helper.init(&mut backend, 0, 720);
    assert!(matches!(
        result,
        Err(HelperError::Config(ConfigError::InvalidDimensions { width: 0, height: 720 }))
    ));
    assert!(!helper.is_initialized());
}

#[test]
fn test_degenerate_camera_is_rejected() {
    let result = CameraView::new(10.0, 10.0, Mat4::IDENTITY, Mat4::IDENTITY);
    assert_eq!(result, Err(ConfigError::DegenerateClipPlanes { near: 10.0, far: 10.0 }));
}

#[test]
fn test_panicking_draw_leaves_nothing_bound() {
    let dir = tempfile::tempdir().unwrap();
    let (mut backend, mut helper) = setup(dir.path(), HelperConfig::default());

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = helper.render(
            &mut backend,
            |_: &mut RecordingBackend, info: &RenderInfo| {
                if !info.is_shadow_pass {
                    panic!("scene draw failed");
                }
            },
            &camera(),
            true,
        );
    }));

    assert!(result.is_err());
    assert_eq!(backend.bind_depth(), 0);
    assert_eq!(backend.count(|c| matches!(c, BackendCommand::Composite { .. })), 0);
}

#[test]
fn test_draw_callback_can_move_shadow_light() {
    let dir = tempfile::tempdir().unwrap();
    let (mut backend, mut helper) = setup(dir.path(), HelperConfig::default());
    let shadow = helper.shadow().unwrap().clone();

    helper
        .render(
            &mut backend,
            |b: &mut RecordingBackend, info: &RenderInfo| {
                shadow.borrow_mut().set_position(Vec3::new(0.0, 300.0, 50.0));
                draw_scene(b, info);
            },
            &camera(),
            true,
        )
        .unwrap();

    assert_eq!(shadow.borrow().position(), Vec3::new(0.0, 300.0, 50.0));
    assert_eq!(scene_draws(&backend).len(), 2);
    assert_eq!(backend.bind_depth(), 0);
}

#[test]
fn test_second_init_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (mut backend, mut helper) = setup(dir.path(), HelperConfig::default());
    let passes = helper.processor().len();

    let result = helper.init(&mut backend, 1920, 1080);

    assert!(matches!(result, Err(HelperError::Config(ConfigError::AlreadyInitialized))));
    assert_eq!(helper.processor().len(), passes);
    assert_eq!(helper.processor().size(), Some(UVec2::new(1280, 720)));
}
