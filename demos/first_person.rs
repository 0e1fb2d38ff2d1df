//! First Person Example
//!
//! A small playground for the first-person controller:
//! - Flat floor with a ramp and a few steps
//! - Loose crates that can be pushed around
//! - A ledge to walk off (the HUD shows the falling state)
//!
//! ## Controls
//! - **WASD/Arrow Keys** or **left stick**: Move
//! - **Mouse** or **right stick**: Look
//! - **Space** or **South button**: Jump
//! - **Escape**: Release / grab the cursor
//! - **R**: Respawn

use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};
use bevy_rapier3d::prelude::*;
use msg_first_person_controller::prelude::*;

const SPAWN_POINT: Vec3 = Vec3::new(0.0, 2.0, 8.0);
const EYE_HEIGHT: f32 = 0.8;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "First Person - Character Controller".into(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        // Physics in the fixed schedule, right after the controller's moves
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
        .add_plugins(RapierDebugRenderPlugin {
            enabled: false,
            ..default()
        })
        .add_plugins(FirstPersonControllerPlugin::<Rapier3dBackend>::default())
        .add_plugins(PlayerInputPlugin)
        .add_systems(Startup, (setup_world, setup_player, setup_hud, grab_cursor))
        .add_systems(Update, (toggle_cursor, respawn, update_hud))
        .run();
}

#[derive(Component)]
struct Player;

#[derive(Component)]
struct HudText;

fn setup_world(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 10.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let ground_material = materials.add(Color::srgb(0.35, 0.4, 0.35));
    let block_material = materials.add(Color::srgb(0.55, 0.55, 0.6));
    let crate_material = materials.add(Color::srgb(0.7, 0.5, 0.25));

    // Floor, top at y = 0
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(40.0, 1.0, 40.0))),
        MeshMaterial3d(ground_material),
        Transform::from_xyz(0.0, -0.5, 0.0),
        RigidBody::Fixed,
        Collider::cuboid(20.0, 0.5, 20.0),
    ));

    // Ramp (25 degrees)
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(4.0, 0.4, 10.0))),
        MeshMaterial3d(block_material.clone()),
        Transform::from_xyz(-8.0, 1.5, -4.0)
            .with_rotation(Quat::from_rotation_x(25.0_f32.to_radians())),
        RigidBody::Fixed,
        Collider::cuboid(2.0, 0.2, 5.0),
    ));

    // Steps, each low enough to autostep
    for i in 0..5 {
        let height = 0.25 * (i + 1) as f32;
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::new(3.0, height, 1.0))),
            MeshMaterial3d(block_material.clone()),
            Transform::from_xyz(6.0, height * 0.5, -2.0 - i as f32),
            RigidBody::Fixed,
            Collider::cuboid(1.5, height * 0.5, 0.5),
        ));
    }

    // Ledge to walk off
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(6.0, 4.0, 6.0))),
        MeshMaterial3d(block_material),
        Transform::from_xyz(0.0, 2.0, -14.0),
        RigidBody::Fixed,
        Collider::cuboid(3.0, 2.0, 3.0),
    ));

    // Pushable crates
    let crate_mesh = meshes.add(Cuboid::new(1.0, 1.0, 1.0));
    for (i, x) in [-3.0, -1.5, 0.0, 1.5, 3.0].into_iter().enumerate() {
        commands.spawn((
            Mesh3d(crate_mesh.clone()),
            MeshMaterial3d(crate_material.clone()),
            Transform::from_xyz(x, 0.5 + i as f32 * 0.01, 2.0),
            RigidBody::Dynamic,
            Collider::cuboid(0.5, 0.5, 0.5),
            ColliderMassProperties::Density(0.5),
        ));
    }
}

fn setup_player(mut commands: Commands) {
    let camera = commands
        .spawn((
            Camera3d::default(),
            CharacterCamera::default(),
            Transform::from_xyz(0.0, EYE_HEIGHT, 0.0),
        ))
        .id();

    commands
        .spawn((
            Player,
            Transform::from_translation(SPAWN_POINT),
            Visibility::default(),
            CharacterController::with_camera(camera),
            ControllerConfig::player(),
            MoveIntent::default(),
            LookIntent::default(),
            PlayerInput::default(),
            Rapier3dCharacterBundle::new(),
        ))
        .add_child(camera);
}

fn setup_hud(mut commands: Commands) {
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        HudText,
    ));
}

fn grab_cursor(mut q_window: Query<&mut Window, With<PrimaryWindow>>) {
    if let Ok(mut window) = q_window.single_mut() {
        set_cursor_grab(&mut window, true);
    }
}

fn toggle_cursor(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut q_window: Query<&mut Window, With<PrimaryWindow>>,
) {
    let Ok(mut window) = q_window.single_mut() else {
        return;
    };
    if keyboard.just_pressed(KeyCode::Escape) {
        let grabbed = window.cursor_options.grab_mode != CursorGrabMode::None;
        set_cursor_grab(&mut window, !grabbed);
    } else if mouse.just_pressed(MouseButton::Left) {
        set_cursor_grab(&mut window, true);
    }
}

fn set_cursor_grab(window: &mut Window, grab: bool) {
    window.cursor_options.grab_mode = if grab {
        CursorGrabMode::Locked
    } else {
        CursorGrabMode::None
    };
    window.cursor_options.visible = !grab;
}

/// Put the player back at the spawn point with a fresh controller state.
fn respawn(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut q_player: Query<(&mut Transform, &mut CharacterController, &mut MoveIntent), With<Player>>,
) {
    if !keyboard.just_pressed(KeyCode::KeyR) {
        return;
    }
    let Ok((mut transform, mut controller, mut intent)) = q_player.single_mut() else {
        return;
    };

    transform.translation = SPAWN_POINT;
    transform.rotation = Quat::IDENTITY;

    // Keep camera and gravity
    let camera = controller.camera;
    let gravity = controller.gravity;
    *controller = CharacterController::new().with_gravity(gravity);
    controller.camera = camera;

    intent.clear();
    intent.clear_jump_request();
}

fn update_hud(
    q_player: Query<(&Transform, &CharacterController, Has<Falling>), With<Player>>,
    mut q_text: Query<&mut Text, With<HudText>>,
) {
    let (Ok((transform, controller, falling)), Ok(mut text)) =
        (q_player.single(), q_text.single_mut())
    else {
        return;
    };

    let ground = match controller.ground {
        Some(ground) => format!("{:.2} (normal {:.2})", ground.distance, ground.normal),
        None => "none".to_string(),
    };
    text.0 = format!(
        "position: {:.2}\nspeed: {:.2}\ngrounded: {}  falling: {}  jumped: {}\nground: {}\ncontacts: {:?}",
        transform.translation,
        controller.horizontal_speed(),
        controller.is_grounded,
        falling,
        controller.has_jumped,
        ground,
        controller.collision_flags,
    );
}
