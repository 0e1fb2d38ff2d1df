//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the controller. The controller only decides *where* the
//! character wants to go; the backend moves it there, resolves collisions and
//! reports back through [`CharacterController`](crate::state::CharacterController).

use bevy::prelude::*;

/// Fallback timestep when no fixed clock is running (e.g. in tests).
pub const FALLBACK_TIMESTEP: f32 = 1.0 / 60.0;

/// Trait for physics backend implementations.
///
/// Besides the methods below, a backend is responsible for keeping the
/// sensor fields of `CharacterController` current. Its plugin should add
/// systems to [`FirstPersonSet::Sensors`](crate::FirstPersonSet::Sensors)
/// that:
///
/// - read the result of the previous move into `is_grounded`,
///   `collision_flags` and `velocity`;
/// - push loose rigid bodies the previous move ran into, using
///   [`impact::should_push`](crate::impact::should_push);
/// - cast downward for ground and store it in `ground`;
/// - refresh `radius` and `height` from the collider.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Queue a displacement for the character.
    ///
    /// The backend resolves collisions (sliding along walls, climbing
    /// steps) and applies the result during its physics step. Calling this
    /// more than once before a physics step replaces the queued translation.
    fn move_character(world: &mut World, entity: Entity, translation: Vec3);

    /// Get the current position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<GlobalTransform>(entity)
            .map(|t| t.translation())
            .unwrap_or(Vec3::ZERO)
    }

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(FALLBACK_TIMESTEP)
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
