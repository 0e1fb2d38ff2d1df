//! Core controller systems.
//!
//! These systems implement the first-person controller behavior. They are
//! generic over the physics backend so that different physics engines can be
//! used for the actual move.

use std::time::Duration;

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::config::{CharacterCamera, ControllerConfig};
use crate::intent::{LookIntent, MoveIntent};
use crate::motion::{clamp_pitch, desired_move, ground_move, is_falling, step_vertical};
use crate::state::{Airborne, CharacterController, Falling, Grounded};

/// Apply pending look input: yaw turns the body, pitch tilts the camera.
///
/// Pitch is clamped to `±max_pitch`. A controller without a camera only yaws.
pub fn apply_look(
    mut q_controllers: Query<
        (
            Entity,
            &mut Transform,
            &ControllerConfig,
            &CharacterController,
            &mut LookIntent,
        ),
        Without<CharacterCamera>,
    >,
    mut q_cameras: Query<(&mut Transform, &mut CharacterCamera)>,
) {
    for (entity, mut transform, config, controller, mut look) in &mut q_controllers {
        if !look.has_delta() {
            continue;
        }
        let delta = look.take_delta();

        // Positive yaw turns right, i.e. clockwise seen from above
        transform.rotate_local_y(-delta.x.to_radians());

        let Some(camera_entity) = controller.camera else {
            continue;
        };
        let Ok((mut camera_transform, mut camera)) = q_cameras.get_mut(camera_entity) else {
            warn_once!(
                "Controller {entity} points at camera {camera_entity}, which has no CharacterCamera; pitch is ignored"
            );
            continue;
        };

        camera.pitch = clamp_pitch(camera.pitch, delta.y, config.max_pitch);
        camera_transform.rotation = camera.local_rotation();
    }
}

/// Integrate character motion and hand the displacement to the backend.
///
/// Horizontal velocity comes from the movement intent relative to the body's
/// facing, following the ground normal from the last ground cast. Vertical velocity
/// comes from gravity, the jump impulse, or the stick-to-ground force.
pub fn integrate_motion<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<(Entity, ControllerConfig, Quat, CharacterController, Vec2, bool)> = world
        .query::<(
            Entity,
            &ControllerConfig,
            &Transform,
            &CharacterController,
            &mut MoveIntent,
        )>()
        .iter_mut(world)
        .map(|(e, config, transform, controller, mut intent)| {
            let jump = resolve_jump_request(&mut intent, controller.is_grounded, dt);
            (
                e,
                *config,
                transform.rotation,
                controller.clone(),
                intent.axis,
                jump,
            )
        })
        .collect();

    for (entity, config, facing, controller, axis, jump) in entities {
        let desired = desired_move(axis, facing);
        let direction = ground_move(desired, controller.ground_normal());

        let mut move_dir = controller.move_dir;
        move_dir.x = direction.x * config.movement_speed;
        move_dir.z = direction.z * config.movement_speed;

        let step = step_vertical(
            move_dir,
            controller.has_jumped,
            controller.is_grounded,
            jump,
            controller.gravity,
            &config,
            dt,
        );
        let falling = is_falling(controller.is_grounded, step.has_jumped);

        if step.jumped {
            debug!("{entity} jumped at {} u/s", config.jump_speed);
        }
        if falling && !controller.is_falling {
            debug!("{entity} started falling");
        }

        if let Some(mut controller) = world.get_mut::<CharacterController>(entity) {
            controller.move_dir = step.move_dir;
            controller.has_jumped = step.has_jumped;
            controller.is_falling = falling;
        }

        B::move_character(world, entity, step.move_dir * dt);
    }
}

/// Decide whether a pending jump request fires on this step.
///
/// Grounded characters consume a valid request. Airborne characters keep it
/// until its buffer runs out.
pub(crate) fn resolve_jump_request(intent: &mut MoveIntent, grounded: bool, dt: f32) -> bool {
    let Some(request) = intent.jump_request.as_mut() else {
        return false;
    };

    if grounded && request.is_valid() {
        intent.jump_request = None;
        return true;
    }

    request.tick(Duration::from_secs_f32(dt));
    if !request.is_valid() {
        intent.jump_request = None;
    }
    false
}

/// Sync state marker components based on CharacterController state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &CharacterController,
        Has<Grounded>,
        Has<Airborne>,
        Has<Falling>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne, has_falling) in &q_controllers {
        if controller.is_grounded && !has_grounded {
            debug!("{entity} landed");
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !controller.is_grounded && (has_grounded || !has_airborne) {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }

        if controller.is_falling && !has_falling {
            commands.entity(entity).insert(Falling);
        } else if !controller.is_falling && has_falling {
            commands.entity(entity).remove::<Falling>();
        }
    }
}

/// Report invalid configurations as they are added or edited.
pub fn validate_new_configs(q_configs: Query<(Entity, &ControllerConfig), Changed<ControllerConfig>>) {
    for (entity, config) in &q_configs {
        if let Err(err) = config.validate() {
            error!("Invalid ControllerConfig on {entity}: {err}");
        }
    }
}
