//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::{CharacterPhysicsBackend, FALLBACK_TIMESTEP};
use crate::collision::{classify_move, CollisionData};
use crate::config::ControllerConfig;
use crate::impact::{push_impulse, should_push, BodyKind};
use crate::state::CharacterController;
use crate::FirstPersonSet;

/// Rapier3D physics backend for the first-person controller.
///
/// Moves are delegated to Rapier's [`KinematicCharacterController`], which
/// handles sliding, autostepping and slope limits. Ground probing and the
/// readback of move results are handled by dedicated Rapier systems that
/// receive `RapierContext` as a system parameter.
pub struct Rapier3dBackend;

impl CharacterPhysicsBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn move_character(world: &mut World, entity: Entity, translation: Vec3) {
        if let Some(mut character) = world.get_mut::<KinematicCharacterController>(entity) {
            character.translation = Some(translation);
        }
    }
}

/// Plugin that sets up Rapier3D-specific systems for the controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        // Move results must be read before pushing (flags, velocity) and
        // collider dimensions before probing (radius, height).
        app.add_systems(
            FixedUpdate,
            (
                rapier_sync_collider_dimensions,
                rapier_read_move_output,
                rapier_push_bodies,
                rapier_ground_cast,
            )
                .chain()
                .in_set(FirstPersonSet::Sensors),
        );
    }
}

/// Radius and total height of a collider, for the shapes a character
/// typically uses.
pub fn collider_dimensions(collider: &Collider) -> Option<(f32, f32)> {
    if let Some(capsule) = collider.as_capsule() {
        let segment = capsule.segment();
        let radius = capsule.radius();
        Some((radius, (segment.a() - segment.b()).length() + radius * 2.0))
    } else if let Some(ball) = collider.as_ball() {
        Some((ball.radius(), ball.radius() * 2.0))
    } else if let Some(cylinder) = collider.as_cylinder() {
        Some((cylinder.radius(), cylinder.half_height() * 2.0))
    } else if let Some(cuboid) = collider.as_cuboid() {
        let half = cuboid.half_extents();
        Some((half.x.max(half.z), half.y * 2.0))
    } else {
        None
    }
}

/// Keep the controller's ground cast dimensions in sync with its collider.
fn rapier_sync_collider_dimensions(
    mut q_controllers: Query<
        (Entity, &Collider, &mut CharacterController),
        Or<(Changed<Collider>, Added<CharacterController>)>,
    >,
) {
    for (entity, collider, mut controller) in &mut q_controllers {
        match collider_dimensions(collider) {
            Some((radius, height)) => {
                controller.radius = radius;
                controller.height = height;
            }
            None => warn!(
                "{entity} uses an unsupported collider shape; keeping cast radius {} and height {}",
                controller.radius, controller.height
            ),
        }
    }
}

/// Read the result of the last physics step's move.
///
/// Only fresh outputs are read, so running several fixed steps between two
/// physics steps does not count the same move twice.
fn rapier_read_move_output(
    time: Option<Res<Time<Fixed>>>,
    mut q_controllers: Query<(
        &mut CharacterController,
        Ref<KinematicCharacterControllerOutput>,
    )>,
) {
    let dt = time
        .map(|t| t.delta_secs())
        .filter(|&d| d > 0.0)
        .unwrap_or(FALLBACK_TIMESTEP);

    for (mut controller, output) in &mut q_controllers {
        if !output.is_changed() {
            continue;
        }

        let up = controller.up();
        let normals = output
            .collisions
            .iter()
            .filter_map(|c| c.hit.details.as_ref().map(|d| d.normal1));

        controller.collision_flags = classify_move(
            output.grounded,
            output.desired_translation,
            output.effective_translation,
            normals,
            up,
        );
        controller.is_grounded = output.grounded;
        controller.velocity = output.effective_translation / dt;
    }
}

/// Shove loose rigid bodies the last move ran into.
///
/// Skipped while the character stands on the body. Each body is pushed at
/// most once per move.
fn rapier_push_bodies(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &CharacterController,
        &ControllerConfig,
        Ref<KinematicCharacterControllerOutput>,
    )>,
    q_bodies: Query<(&RigidBody, &GlobalTransform)>,
    q_parents: Query<&ChildOf>,
    mut q_impulses: Query<&mut ExternalImpulse>,
) {
    for (entity, controller, config, output) in &q_controllers {
        if !output.is_changed() || output.collisions.is_empty() {
            continue;
        }

        let mut pushed: Vec<Entity> = Vec::new();
        for collision in &output.collisions {
            // Colliders may hang off a child entity of their rigid body
            let body_entity = if q_bodies.contains(collision.entity) {
                Some(collision.entity)
            } else {
                q_parents
                    .get(collision.entity)
                    .ok()
                    .map(ChildOf::parent)
                    .filter(|parent| q_bodies.contains(*parent))
            };

            let body = body_entity.and_then(|e| q_bodies.get(e).ok().map(|b| (e, b)));
            let kind = body.map(|(_, (rigid_body, _))| body_kind(rigid_body));
            if !should_push(controller.collision_flags, kind) {
                continue;
            }
            let Some((body_entity, (_, body_transform))) = body else {
                continue;
            };
            if pushed.contains(&body_entity) {
                continue;
            }
            pushed.push(body_entity);

            let impulse = push_impulse(controller.velocity, config.push_power);
            if impulse == Vec3::ZERO {
                continue;
            }

            // Contact point estimated on the capsule surface facing the body
            let center = body_transform.translation();
            let toward_body = (center - collision.character_translation)
                .reject_from_normalized(controller.up())
                .normalize_or_zero();
            let point = collision.character_translation + toward_body * controller.radius;
            let torque_impulse = (point - center).cross(impulse);

            trace!("{entity} pushes {body_entity} with impulse {impulse}");

            if let Ok(mut external) = q_impulses.get_mut(body_entity) {
                external.impulse += impulse;
                external.torque_impulse += torque_impulse;
            } else {
                commands.entity(body_entity).insert(ExternalImpulse {
                    impulse,
                    torque_impulse,
                });
            }
        }
    }
}

fn body_kind(body: &RigidBody) -> BodyKind {
    match body {
        RigidBody::Dynamic => BodyKind::Dynamic,
        RigidBody::Fixed => BodyKind::Fixed,
        RigidBody::KinematicPositionBased | RigidBody::KinematicVelocityBased => {
            BodyKind::Kinematic
        }
    }
}

/// Look for ground with a sphere cast straight down.
///
/// The sphere has the collider's radius and travels half the collider
/// height from its centre. Sensors and the character itself are ignored.
fn rapier_ground_cast(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        &GlobalTransform,
        &mut CharacterController,
        Option<&CollisionGroups>,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, mut controller, collision_groups) in &mut q_controllers {
        let origin = transform.translation();
        let down = -controller.up();

        let mut filter = QueryFilter::default()
            .exclude_rigid_body(entity)
            .exclude_collider(entity)
            .exclude_sensors();
        if let Some(groups) = collision_groups {
            filter = filter.groups(*groups);
        }

        let radius = controller.radius;
        let shape = Collider::ball(radius);

        controller.ground = context
            .cast_shape(
                origin,
                Quat::IDENTITY,
                down,
                &shape,
                ShapeCastOptions {
                    max_time_of_impact: controller.ground_cast_distance(),
                    stop_at_penetration: false,
                    ..default()
                },
                filter,
            )
            .map(|(hit_entity, hit)| {
                // Surface normal, facing back toward the cast origin
                let normal = hit.details.as_ref().map(|d| d.normal1).unwrap_or(-down);
                let normal = if normal.dot(down) > 0.0 { -normal } else { normal };
                let point = origin + down * (hit.time_of_impact + radius);
                CollisionData::new(hit.time_of_impact, normal, point, Some(hit_entity))
            });
    }
}

/// Bundle for creating a first-person character with Rapier3D physics.
///
/// Provides a kinematic position-based body, Rapier's character mover and a
/// capsule collider. The defaults match a typical human-sized player: 2 units
/// tall, 0.5 radius, 45 degree slope limit and 0.3 step height.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use msg_first_person_controller::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     let camera = commands
///         .spawn((Camera3d::default(), CharacterCamera::default(), Transform::from_xyz(0.0, 0.8, 0.0)))
///         .id();
///     commands
///         .spawn((
///             Transform::from_xyz(0.0, 2.0, 0.0),
///             CharacterController::with_camera(camera),
///             ControllerConfig::player(),
///             MoveIntent::default(),
///             LookIntent::default(),
///             PlayerInput::default(),
///             Rapier3dCharacterBundle::new(),
///         ))
///         .add_child(camera);
/// }
/// ```
#[derive(Bundle, Clone)]
pub struct Rapier3dCharacterBundle {
    /// Kinematic body; moved only through the character controller.
    pub rigid_body: RigidBody,
    /// Rapier's character mover. The controller writes its `translation`.
    pub character_controller: KinematicCharacterController,
    /// Collider shape, a Y-aligned capsule by default.
    pub collider: Collider,
}

impl Default for Rapier3dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier3dCharacterBundle {
    /// Default collider radius.
    pub const DEFAULT_RADIUS: f32 = 0.5;
    /// Default collider height.
    pub const DEFAULT_HEIGHT: f32 = 2.0;

    /// Create a character bundle with default dimensions.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::KinematicPositionBased,
            character_controller: KinematicCharacterController {
                up: Vec3::Y,
                offset: CharacterLength::Absolute(0.01),
                slide: true,
                autostep: Some(CharacterAutostep {
                    max_height: CharacterLength::Absolute(0.3),
                    min_width: CharacterLength::Absolute(0.2),
                    include_dynamic_bodies: false,
                }),
                max_slope_climb_angle: 45.0_f32.to_radians(),
                min_slope_slide_angle: 45.0_f32.to_radians(),
                // Pushing is done by the controller itself
                apply_impulse_to_dynamic_bodies: false,
                // The stick-to-ground force keeps the character down
                snap_to_ground: None,
                ..default()
            },
            collider: capsule(Self::DEFAULT_RADIUS, Self::DEFAULT_HEIGHT),
        }
    }

    /// Use a capsule of the given radius and total height.
    pub fn with_capsule(mut self, radius: f32, height: f32) -> Self {
        self.collider = capsule(radius, height);
        self
    }

    /// Set the highest step the character climbs without jumping.
    pub fn with_step_height(mut self, height: f32) -> Self {
        self.character_controller.autostep = if height > 0.0 {
            Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(height),
                min_width: CharacterLength::Absolute(0.2),
                include_dynamic_bodies: false,
            })
        } else {
            None
        };
        self
    }

    /// Set the steepest walkable slope (degrees).
    pub fn with_slope_limit(mut self, degrees: f32) -> Self {
        self.character_controller.max_slope_climb_angle = degrees.to_radians();
        self.character_controller.min_slope_slide_angle = degrees.to_radians();
        self
    }
}

fn capsule(radius: f32, height: f32) -> Collider {
    let half_segment = (height * 0.5 - radius).max(0.0);
    Collider::capsule_y(half_segment, radius)
}
