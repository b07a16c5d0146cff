use bevy::prelude::*;
use deferred_helper::{
    CameraView, DeferredCamera, DeferredHelper, DeferredHelperPlugin, PointLight, RecordingBackend,
    RenderInfo,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Scene objects submitted to the deferred pipeline each frame.
#[derive(Component)]
struct SceneObject;

/// Light orbiting the scene, owned by the demo and shared with the helper.
struct OrbitingLight(Rc<RefCell<PointLight>>);

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                resolution: (1280, 720).into(),
                title: "Deferred Studio".to_string(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(bevy_mod_imgui::ImguiPlugin::default())
        .insert_non_send_resource(RecordingBackend::default())
        .add_plugins(DeferredHelperPlugin::<RecordingBackend>::new("main"))
        .add_systems(Startup, setup)
        .add_systems(PostStartup, add_orbiting_light)
        .add_systems(Update, (orbit_camera, animate_light, render_frame).chain())
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        DeferredCamera,
        Transform::from_xyz(0.0, 150.0, 400.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    for i in 0..5 {
        let x = (i as f32 - 2.0) * 80.0;
        commands.spawn((
            SceneObject,
            Name::new(format!("box_{}", i)),
            Transform::from_xyz(x, 20.0, 0.0),
        ));
    }
    commands.spawn((SceneObject, Name::new("floor"), Transform::default()));
}

/// Runs after startup, once the helper has created its point-light pass.
fn add_orbiting_light(world: &mut World) {
    let light = Rc::new(RefCell::new(PointLight::new(
        Vec3::new(0.0, 60.0, 150.0),
        LinearRgba::rgb(1.0, 0.6, 0.3),
        2.0,
        250.0,
    )));
    if let Some(helper) = world.get_non_send_resource::<DeferredHelper>() {
        helper.add_light(light.clone());
    }
    world.insert_non_send_resource(OrbitingLight(light));
}

fn orbit_camera(time: Res<Time>, mut cameras: Query<&mut Transform, With<DeferredCamera>>) {
    let angle = time.elapsed_secs() * 0.2;
    for mut transform in &mut cameras {
        *transform = Transform::from_xyz(angle.sin() * 400.0, 150.0, angle.cos() * 400.0)
            .looking_at(Vec3::ZERO, Vec3::Y);
    }
}

fn animate_light(time: Res<Time>, light: Option<NonSend<OrbitingLight>>) {
    let Some(light) = light else {
        return;
    };
    let angle = time.elapsed_secs();
    light.0.borrow_mut().position = Vec3::new(angle.cos() * 150.0, 60.0, angle.sin() * 150.0);
}

fn render_frame(
    mut helper: NonSendMut<DeferredHelper>,
    mut backend: NonSendMut<RecordingBackend>,
    cameras: Query<(&Projection, &GlobalTransform), With<DeferredCamera>>,
    objects: Query<&Name, With<SceneObject>>,
) {
    let Ok((projection, transform)) = cameras.single() else {
        return;
    };
    let camera = match CameraView::from_bevy(projection, transform) {
        Ok(camera) => camera,
        Err(e) => {
            warn_once!("Camera cannot drive the deferred pipeline: {}", e);
            return;
        }
    };
    let names: Vec<String> = objects.iter().map(|name| name.as_str().to_string()).collect();

    let result = helper.render(
        &mut *backend,
        |b: &mut RecordingBackend, info: &RenderInfo| {
            let phase = if info.is_shadow_pass { "shadow" } else { "main" };
            for name in &names {
                b.record_draw(format!("{}/{}", phase, name));
            }
        },
        &camera,
        true,
    );
    if let Err(e) = result {
        warn_once!("Deferred render skipped: {}", e);
        return;
    }
    helper.debug_draw(&mut *backend);

    let commands = backend.take_commands();
    debug!("Frame recorded {} backend commands", commands.len());
}
