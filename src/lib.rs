//! # `msg_first_person_controller`
//!
//! A first-person kinematic character controller with physics backend abstraction.
//!
//! This crate provides a small, predictable FPS-style controller that:
//! - Samples keyboard/mouse or gamepad input into movement and look intents
//! - Yaws the body and applies clamped pitch to a child camera
//! - Moves along the ground normal found by a downward sphere cast
//! - Handles gravity, jumping and sticking to the ground on slopes
//! - Gives loose rigid bodies a shove when walking into them
//! - Abstracts the physics backend (Rapier3D included)
//!
//! ## Architecture
//!
//! The controller is **kinematic**: it computes a velocity every fixed step
//! and hands `velocity * dt` to the backend's character mover, which resolves
//! collisions (sliding, stepping, slope limits). Each step runs:
//! 1. **Sensors**: read the result of the previous move, push bodies, cast for ground
//! 2. **Look**: yaw the body, pitch the camera
//! 3. **Movement**: integrate velocity and queue the next move
//! 4. **Markers**: sync `Grounded`/`Airborne`/`Falling`
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use msg_first_person_controller::prelude::*;
//!
//! // Components for a player-controlled character
//! let controller = CharacterController::new();
//! let config = ControllerConfig::player();
//! let intent = MoveIntent::default();
//!
//! // These can be spawned together with a backend bundle
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod error;
pub mod impact;
pub mod input;
pub mod intent;
pub mod motion;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::CharacterPhysicsBackend;
    pub use crate::collision::{CollisionData, CollisionFlags};
    pub use crate::config::{CharacterCamera, ControllerConfig};
    pub use crate::error::ConfigError;
    pub use crate::input::{InputBindings, PlayerInput, PlayerInputPlugin};
    pub use crate::intent::{JumpRequest, LookIntent, MoveIntent};
    pub use crate::state::{Airborne, CharacterController, Falling, Grounded};
    pub use crate::{FirstPersonControllerPlugin, FirstPersonSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// System sets of the controller, in execution order.
///
/// `Input` runs in `Update`, everything else in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FirstPersonSet {
    /// Input sampling (per frame).
    Input,
    /// Backend sensors: move results, impacts, ground cast.
    Sensors,
    /// Yaw and pitch.
    Look,
    /// Motion integration and the backend move.
    Movement,
    /// State marker sync.
    Markers,
}

/// Main plugin for the first-person controller.
///
/// This plugin is generic over a physics backend `B` which performs the
/// actual move and the ground cast. The physics step should run in the
/// fixed schedule too, so every move is resolved before the next one is
/// integrated.
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_first_person_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
///     .add_plugins(FirstPersonControllerPlugin::<Rapier3dBackend>::default())
///     .add_plugins(PlayerInputPlugin)
///     .run();
/// ```
pub struct FirstPersonControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for FirstPersonControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for FirstPersonControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::ControllerConfig>();
        app.register_type::<config::CharacterCamera>();
        app.register_type::<intent::MoveIntent>();
        app.register_type::<intent::LookIntent>();
        app.register_type::<state::CharacterController>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::Falling>();

        app.configure_sets(
            FixedUpdate,
            (
                FirstPersonSet::Sensors,
                FirstPersonSet::Look,
                FirstPersonSet::Movement,
                FirstPersonSet::Markers,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                systems::apply_look.in_set(FirstPersonSet::Look),
                systems::integrate_motion::<B>.in_set(FirstPersonSet::Movement),
                systems::sync_state_markers.in_set(FirstPersonSet::Markers),
            ),
        );

        app.add_systems(Update, systems::validate_new_configs);
    }
}
