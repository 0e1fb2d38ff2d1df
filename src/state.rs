//! Controller state.
//!
//! [`CharacterController`] is the central hub for the runtime state of a
//! first-person character. The marker components below mirror the most
//! commonly queried parts of it so gameplay code can filter with `With<_>`.

use bevy::prelude::*;

use crate::collision::{CollisionData, CollisionFlags};

/// Default gravity (world units per second squared).
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Core first-person controller component.
///
/// Sensor data (`ground`, `is_grounded`, `collision_flags`, `velocity`) is
/// written by the physics backend. Motion state (`move_dir`, `has_jumped`,
/// `is_falling`) is written by the motion integrator.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct CharacterController {
    /// Camera entity that receives pitch. `None` disables pitch.
    pub camera: Option<Entity>,

    // === Motion ===
    /// Velocity the integrator feeds into the next move.
    pub move_dir: Vec3,
    /// Gravity acting on this character.
    pub gravity: Vec3,
    /// Whether the current airborne phase started with a jump.
    pub has_jumped: bool,
    /// Airborne without having jumped (walked off a ledge, knocked off).
    pub is_falling: bool,

    // === Sensors (written by the backend) ===
    /// Result of the downward ground cast. `None` when nothing was hit.
    #[reflect(ignore)]
    pub ground: Option<CollisionData>,
    /// Whether the last move ended touching the ground.
    pub is_grounded: bool,
    /// Which sides collided during the last move.
    #[reflect(ignore)]
    pub collision_flags: CollisionFlags,
    /// Actual velocity of the last move (displacement / timestep).
    pub velocity: Vec3,

    // === Collider dimensions (refreshed by the backend) ===
    /// Collider radius, used as the ground cast radius.
    pub radius: f32,
    /// Total collider height; the ground cast reaches half of it.
    pub height: f32,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self {
            camera: None,
            move_dir: Vec3::ZERO,
            gravity: DEFAULT_GRAVITY,
            has_jumped: false,
            is_falling: false,
            ground: None,
            is_grounded: false,
            collision_flags: CollisionFlags::empty(),
            velocity: Vec3::ZERO,
            radius: 0.5,
            height: 2.0,
        }
    }
}

impl CharacterController {
    /// Create a new controller without a camera.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller that pitches the given camera entity.
    pub fn with_camera(camera: Entity) -> Self {
        Self {
            camera: Some(camera),
            ..default()
        }
    }

    /// Builder: set gravity.
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the gravity vector.
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    /// The "up" direction implied by gravity (world Y when gravity is zero).
    pub fn up(&self) -> Vec3 {
        let up = -self.gravity.normalize_or_zero();
        if up == Vec3::ZERO {
            Vec3::Y
        } else {
            up
        }
    }

    /// Ground normal from the last ground cast, if it hit anything.
    pub fn ground_normal(&self) -> Option<Vec3> {
        self.ground.as_ref().map(|g| g.normal)
    }

    /// Entity under the character, if the ground cast hit one.
    pub fn ground_entity(&self) -> Option<Entity> {
        self.ground.as_ref().and_then(|g| g.entity)
    }

    /// Check if the ground cast found anything.
    pub fn ground_detected(&self) -> bool {
        self.ground.is_some()
    }

    /// Horizontal speed of the last move.
    pub fn horizontal_speed(&self) -> f32 {
        let up = self.up();
        (self.velocity - up * self.velocity.dot(up)).length()
    }

    /// Half the collider height; reach of the ground cast.
    #[inline]
    pub fn ground_cast_distance(&self) -> f32 {
        self.height * 0.5
    }
}

/// Marker component indicating the character is grounded.
///
/// Mutually exclusive with [`Airborne`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the character is airborne without having
/// jumped, e.g. after walking off a ledge.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Falling;
