//! Controller configuration components.
//!
//! This module defines the tuning parameters for first-person controllers
//! and the camera component that receives pitch.

use bevy::prelude::*;

use crate::error::ConfigError;

/// Configuration parameters for the first-person controller.
///
/// Speeds are in world units per second, look sensitivities in degrees per
/// axis unit per second.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct ControllerConfig {
    // === Movement Settings ===
    /// How quickly the character moves along the ground.
    pub movement_speed: f32,

    /// Upward speed given to the character when jumping.
    pub jump_speed: f32,

    /// Downward speed applied while grounded so the character follows
    /// slopes and steps down instead of skipping off them.
    pub stick_to_ground_force: f32,

    /// How strongly gravity affects the character while airborne.
    pub gravity_multiplier: f32,

    // === Look Settings ===
    /// Mouse look speed.
    pub sensitivity: f32,

    /// Gamepad right stick look speed.
    pub joystick_sensitivity: f32,

    /// Camera pitch limit in degrees, applied symmetrically up and down.
    pub max_pitch: f32,

    // === Interaction Settings ===
    /// Impulse given to pushed rigid bodies, as a fraction of the
    /// character's velocity.
    pub push_power: f32,

    // === Jump Settings ===
    /// How long a jump press stays queued while airborne (seconds).
    /// Zero means the press only counts on the next physics step.
    pub jump_buffer_time: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            movement_speed: 10.0,
            jump_speed: 20.0,
            stick_to_ground_force: 9.807,
            gravity_multiplier: 5.0,
            sensitivity: 20.0,
            joystick_sensitivity: 20.0,
            max_pitch: 90.0,
            push_power: 0.1,
            jump_buffer_time: 0.0,
        }
    }
}

impl ControllerConfig {
    /// Create a config for responsive player control.
    ///
    /// Slightly forgiving jump input and higher mouse sensitivity.
    pub fn player() -> Self {
        Self {
            sensitivity: 30.0,
            jump_buffer_time: 0.1,
            ..default()
        }
    }

    /// Create a config for a slow, heavy character.
    pub fn heavy() -> Self {
        Self {
            movement_speed: 6.0,
            jump_speed: 12.0,
            gravity_multiplier: 6.0,
            push_power: 0.25,
            ..default()
        }
    }

    /// Builder: set movement speed.
    pub fn with_movement_speed(mut self, speed: f32) -> Self {
        self.movement_speed = speed;
        self
    }

    /// Builder: set jump speed.
    pub fn with_jump_speed(mut self, speed: f32) -> Self {
        self.jump_speed = speed;
        self
    }

    /// Builder: set mouse and joystick sensitivity.
    pub fn with_sensitivity(mut self, mouse: f32, joystick: f32) -> Self {
        self.sensitivity = mouse;
        self.joystick_sensitivity = joystick;
        self
    }

    /// Builder: set gravity multiplier.
    pub fn with_gravity_multiplier(mut self, multiplier: f32) -> Self {
        self.gravity_multiplier = multiplier;
        self
    }

    /// Builder: set stick-to-ground force.
    pub fn with_stick_to_ground_force(mut self, force: f32) -> Self {
        self.stick_to_ground_force = force;
        self
    }

    /// Builder: set pitch limit (degrees).
    pub fn with_max_pitch(mut self, degrees: f32) -> Self {
        self.max_pitch = degrees;
        self
    }

    /// Builder: set push power.
    pub fn with_push_power(mut self, power: f32) -> Self {
        self.push_power = power;
        self
    }

    /// Builder: set jump buffer time.
    pub fn with_jump_buffer_time(mut self, seconds: f32) -> Self {
        self.jump_buffer_time = seconds;
        self
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("movement_speed", self.movement_speed),
            ("jump_speed", self.jump_speed),
            ("stick_to_ground_force", self.stick_to_ground_force),
            ("gravity_multiplier", self.gravity_multiplier),
            ("sensitivity", self.sensitivity),
            ("joystick_sensitivity", self.joystick_sensitivity),
            ("max_pitch", self.max_pitch),
            ("push_power", self.push_power),
            ("jump_buffer_time", self.jump_buffer_time),
        ];

        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
        }

        // Sensitivities may be negative to invert an axis
        for (field, value) in [
            ("movement_speed", self.movement_speed),
            ("jump_speed", self.jump_speed),
            ("stick_to_ground_force", self.stick_to_ground_force),
            ("gravity_multiplier", self.gravity_multiplier),
            ("push_power", self.push_power),
            ("jump_buffer_time", self.jump_buffer_time),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.max_pitch <= 0.0 || self.max_pitch > 90.0 {
            return Err(ConfigError::PitchOutOfRange(self.max_pitch));
        }

        Ok(())
    }
}

/// The camera that looks out of the character's eyes.
///
/// Spawn it as a child of the character body and point
/// [`CharacterController::camera`](crate::state::CharacterController::camera)
/// at it. Yaw lives on the body, pitch lives here.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct CharacterCamera {
    /// Current pitch in degrees (positive looks up).
    pub pitch: f32,
}

impl CharacterCamera {
    /// Local rotation that realises the current pitch.
    pub fn local_rotation(&self) -> Quat {
        Quat::from_rotation_x(self.pitch.to_radians())
    }
}
