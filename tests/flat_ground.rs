//! Controller tests against a minimal deterministic backend.
//!
//! The backend below moves characters directly over an infinite plane, so
//! every number the controller produces can be checked exactly without a
//! physics engine.

use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use msg_first_person_controller::backend::NoOpBackendPlugin;
use msg_first_person_controller::prelude::*;

const TIMESTEP: f64 = 1.0 / 60.0;
const DT: f32 = TIMESTEP as f32;

/// Rest height of a character centre above the plane.
const REST_HEIGHT: f32 = 1.0;

/// The plane characters walk on.
#[derive(Resource, Clone, Copy)]
struct FlatGround {
    /// Surface normal reported by the ground cast (the plane itself stays at y = 0).
    normal: Vec3,
}

impl Default for FlatGround {
    fn default() -> Self {
        Self { normal: Vec3::Y }
    }
}

/// Moves characters over [`FlatGround`] and reports ground contact.
struct FlatGroundBackend;

impl CharacterPhysicsBackend for FlatGroundBackend {
    fn plugin() -> impl Plugin {
        NoOpBackendPlugin
    }

    fn move_character(world: &mut World, entity: Entity, translation: Vec3) {
        let ground = world.get_resource::<FlatGround>().copied().unwrap_or_default();
        let Some(start) = world.get::<Transform>(entity).map(|t| t.translation) else {
            return;
        };

        let mut end = start + translation;
        let grounded = end.y <= REST_HEIGHT;
        if grounded {
            end.y = REST_HEIGHT;
        }

        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation = end;
        }
        if let Some(mut controller) = world.get_mut::<CharacterController>(entity) {
            controller.is_grounded = grounded;
            controller.collision_flags = if grounded {
                CollisionFlags::BELOW
            } else {
                CollisionFlags::empty()
            };
            controller.velocity = (end - start) / DT;
            controller.ground = (end.y - REST_HEIGHT < controller.ground_cast_distance()).then(|| {
                CollisionData::new(
                    end.y - REST_HEIGHT,
                    ground.normal,
                    Vec3::new(end.x, 0.0, end.z),
                    None,
                )
            });
        }
    }
}

fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(FirstPersonControllerPlugin::<FlatGroundBackend>::default());
    app.init_resource::<FlatGround>();
    app.insert_resource(Time::<Fixed>::from_seconds(TIMESTEP));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
        TIMESTEP,
    )));
    app.finish();
    app.cleanup();
    // Let the clocks start so every following update is one fixed step
    app.update();
    app
}

fn spawn_character(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_translation(position),
            CharacterController::new(),
            ControllerConfig::default(),
            MoveIntent::default(),
            LookIntent::default(),
        ))
        .id()
}

/// Run `steps` fixed steps; each update advances exactly one.
fn step(app: &mut App, steps: usize) {
    for _ in 0..steps {
        app.update();
    }
}

fn walk(app: &mut App, entity: Entity, axis: Vec2, steps: usize) {
    if let Some(mut intent) = app.world_mut().get_mut::<MoveIntent>(entity) {
        intent.set_axis(axis);
    }
    step(app, steps);
}

fn position(app: &App, entity: Entity) -> Vec3 {
    app.world().get::<Transform>(entity).unwrap().translation
}

fn controller(app: &App, entity: Entity) -> &CharacterController {
    app.world().get::<CharacterController>(entity).unwrap()
}

/// Spawn a character on the plane and let it register ground contact.
fn grounded_character(app: &mut App) -> Entity {
    let character = spawn_character(app, Vec3::new(0.0, REST_HEIGHT, 0.0));
    step(app, 2);
    assert!(controller(app, character).is_grounded);
    character
}

// ==================== Grounded Tests ====================

mod grounded {
    use super::*;

    #[test]
    fn stick_to_ground_force_holds_character_down() {
        let mut app = create_test_app();
        let character = grounded_character(&mut app);

        let state = controller(&app, character);
        assert_eq!(state.move_dir.y, -9.807);
        assert!(!state.has_jumped);
        assert!(!state.is_falling);
        assert_eq!(position(&app, character).y, REST_HEIGHT);
        assert!(app.world().get::<Grounded>(character).is_some());
    }

    #[test]
    fn idle_character_has_no_horizontal_motion() {
        let mut app = create_test_app();
        let character = grounded_character(&mut app);

        step(&mut app, 10);

        let state = controller(&app, character);
        assert_eq!(state.move_dir.x, 0.0);
        assert_eq!(state.move_dir.z, 0.0);
        assert_eq!(position(&app, character).x, 0.0);
        assert_eq!(position(&app, character).z, 0.0);
    }
}

// ==================== Walking Tests ====================

mod walking {
    use super::*;

    #[test]
    fn forward_walks_at_movement_speed() {
        let mut app = create_test_app();
        let character = grounded_character(&mut app);

        walk(&mut app, character, Vec2::Y, 60);

        let pos = position(&app, character);
        // One second at 10 u/s along -Z
        assert!((pos.z + 10.0).abs() < 0.01, "z={}", pos.z);
        assert!(pos.x.abs() < 1e-4);
        assert!((controller(&app, character).horizontal_speed() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn strafe_right_moves_positive_x() {
        let mut app = create_test_app();
        let character = grounded_character(&mut app);

        walk(&mut app, character, Vec2::X, 30);

        let pos = position(&app, character);
        assert!((pos.x - 5.0).abs() < 0.01, "x={}", pos.x);
        assert!(pos.z.abs() < 1e-4);
    }

    #[test]
    fn diagonal_input_is_normalized() {
        let mut app = create_test_app();
        let character = grounded_character(&mut app);

        walk(&mut app, character, Vec2::ONE, 10);

        let state = controller(&app, character);
        let horizontal = Vec2::new(state.move_dir.x, state.move_dir.z).length();
        assert!((horizontal - 10.0).abs() < 1e-3, "speed={horizontal}");
    }

    #[test]
    fn slope_normal_reduces_horizontal_speed() {
        let mut app = create_test_app();
        // Ground tilted 30 degrees around X, facing the walking direction
        let normal = Quat::from_rotation_x(-30.0_f32.to_radians()) * Vec3::Y;
        app.insert_resource(FlatGround { normal });
        let character = grounded_character(&mut app);

        walk(&mut app, character, Vec2::Y, 5);

        let state = controller(&app, character);
        let horizontal = Vec2::new(state.move_dir.x, state.move_dir.z).length();
        // cos(30) of movement_speed stays horizontal
        assert!(
            (horizontal - 10.0 * 30.0_f32.to_radians().cos()).abs() < 1e-2,
            "speed={horizontal}"
        );
        assert!(state.move_dir.z < 0.0);
    }

    #[test]
    fn turning_changes_walk_direction() {
        let mut app = create_test_app();
        let character = grounded_character(&mut app);

        if let Some(mut look) = app.world_mut().get_mut::<LookIntent>(character) {
            look.accumulate(Vec2::new(90.0, 0.0));
        }
        walk(&mut app, character, Vec2::Y, 30);

        let forward = app.world().get::<Transform>(character).unwrap().forward();
        assert!((*forward - Vec3::X).length() < 1e-4);
        let pos = position(&app, character);
        assert!(pos.x > 4.9, "x={}", pos.x);
        assert!(pos.z.abs() < 0.01);
    }

    #[test]
    fn body_rotation_sets_walk_direction() {
        let mut app = create_test_app();
        let character = grounded_character(&mut app);
        if let Some(mut transform) = app.world_mut().get_mut::<Transform>(character) {
            transform.rotation = Quat::from_rotation_y(FRAC_PI_2);
        }

        walk(&mut app, character, Vec2::Y, 30);

        // Turned left: forward is -X
        assert!(position(&app, character).x < -4.9);
    }
}

// ==================== Jumping Tests ====================

mod jumping {
    use super::*;

    #[test]
    fn jump_launches_at_jump_speed() {
        let mut app = create_test_app();
        let character = grounded_character(&mut app);

        if let Some(mut intent) = app.world_mut().get_mut::<MoveIntent>(character) {
            intent.request_jump(0.0);
        }
        step(&mut app, 1);

        let state = controller(&app, character);
        assert_eq!(state.move_dir.y, 20.0);
        assert!(state.has_jumped);
        assert!(!state.is_grounded);
        assert!(!state.is_falling);
        assert!(position(&app, character).y > REST_HEIGHT);
    }

    #[test]
    fn gravity_slows_the_jump() {
        let mut app = create_test_app();
        let character = grounded_character(&mut app);

        if let Some(mut intent) = app.world_mut().get_mut::<MoveIntent>(character) {
            intent.request_jump(0.0);
        }
        step(&mut app, 11);

        // Ten airborne steps of 9.81 * 5 / 60
        let expected = 20.0 - 10.0 * 9.81 * 5.0 * DT;
        let state = controller(&app, character);
        assert!(
            (state.move_dir.y - expected).abs() < 1e-3,
            "vy={}, expected {expected}",
            state.move_dir.y
        );
    }

    #[test]
    fn jump_lands_and_resets() {
        let mut app = create_test_app();
        let character = grounded_character(&mut app);

        if let Some(mut intent) = app.world_mut().get_mut::<MoveIntent>(character) {
            intent.request_jump(0.0);
        }
        // Airtime is 2 * 20 / 49.05 ~= 0.82s
        step(&mut app, 70);

        let state = controller(&app, character);
        assert!(state.is_grounded);
        assert!(!state.has_jumped);
        assert_eq!(state.move_dir.y, -9.807);
        assert_eq!(position(&app, character).y, REST_HEIGHT);
    }

    #[test]
    fn buffered_jump_fires_on_landing() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app, Vec3::new(0.0, REST_HEIGHT + 0.05, 0.0));
        if let Some(mut config) = app.world_mut().get_mut::<ControllerConfig>(character) {
            config.jump_buffer_time = 0.2;
        }

        let buffer = app.world().get::<ControllerConfig>(character).unwrap().jump_buffer_time;
        if let Some(mut intent) = app.world_mut().get_mut::<MoveIntent>(character) {
            intent.request_jump(buffer);
        }
        step(&mut app, 6);

        let state = controller(&app, character);
        assert!(state.has_jumped, "Buffered jump should fire after landing");
    }
}

// ==================== Falling Tests ====================

mod falling {
    use super::*;

    #[test]
    fn airborne_without_jump_is_falling() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app, Vec3::new(0.0, 10.0, 0.0));

        step(&mut app, 3);

        let state = controller(&app, character);
        assert!(state.is_falling);
        assert!(!state.has_jumped);
        assert!(state.move_dir.y < 0.0);
        assert!(app.world().get::<Falling>(character).is_some());
        assert!(app.world().get::<Airborne>(character).is_some());
    }

    #[test]
    fn landing_clears_falling() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app, Vec3::new(0.0, 2.0, 0.0));

        step(&mut app, 30);

        let state = controller(&app, character);
        assert!(state.is_grounded);
        assert!(!state.is_falling);
        assert!(app.world().get::<Falling>(character).is_none());
        assert!(app.world().get::<Grounded>(character).is_some());
    }

    #[test]
    fn custom_gravity_direction_is_respected() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app, Vec3::new(0.0, 10.0, 0.0));
        if let Some(mut controller) = app.world_mut().get_mut::<CharacterController>(character) {
            controller.set_gravity(Vec3::new(0.0, -2.0, 0.0));
        }

        step(&mut app, 6);

        let state = controller(&app, character);
        let expected = -6.0 * 2.0 * 5.0 * DT;
        assert!((state.move_dir.y - expected).abs() < 1e-3, "vy={}", state.move_dir.y);
    }
}
