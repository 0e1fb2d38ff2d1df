//! Movement and look intent components.
//!
//! Intents represent the desired movement and view rotation from player input
//! or AI. The input sampler writes them once per frame, the controller systems
//! consume them on the fixed physics step.

use std::time::Duration;

use bevy::prelude::*;

/// Threshold below which an axis counts as idle.
const AXIS_EPSILON: f32 = 0.001;

/// Desired movement of a first-person character.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_first_person_controller::prelude::*;
///
/// let mut intent = MoveIntent::new();
/// intent.set_axis(Vec2::new(0.0, 1.0));
/// assert!(intent.is_moving());
///
/// intent.clear();
/// assert!(!intent.is_moving());
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct MoveIntent {
    /// Movement axes: x strafes right, y walks forward. Each in [-1, 1].
    pub axis: Vec2,
    /// Whether any movement source was active when the intent was sampled.
    pub moving: bool,
    /// Pending jump request, if any.
    pub jump_request: Option<JumpRequest>,
}

impl MoveIntent {
    /// Create a new empty movement intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the movement axes. Each component is clamped to [-1, 1].
    pub fn set_axis(&mut self, axis: Vec2) {
        self.axis = axis.clamp(Vec2::NEG_ONE, Vec2::ONE);
        self.moving = self.axis.length_squared() > AXIS_EPSILON * AXIS_EPSILON;
    }

    /// Clear movement (the jump request is kept).
    pub fn clear(&mut self) {
        self.axis = Vec2::ZERO;
        self.moving = false;
    }

    /// Check if there is active movement input.
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Request a jump that stays queued for `buffer_time` seconds.
    ///
    /// A new request always replaces the pending one.
    pub fn request_jump(&mut self, buffer_time: f32) {
        self.jump_request = Some(JumpRequest::new(buffer_time));
    }

    /// Take and consume the pending jump request, if any.
    pub fn take_jump_request(&mut self) -> Option<JumpRequest> {
        self.jump_request.take()
    }

    /// Check if there's a pending jump request.
    pub fn has_jump_request(&self) -> bool {
        self.jump_request.is_some()
    }

    /// Drop the pending jump request without jumping.
    pub fn clear_jump_request(&mut self) {
        self.jump_request = None;
    }
}

/// Desired view rotation of a first-person character.
///
/// Deltas accumulate until the orientation updater takes them, so look input
/// sampled over several frames is applied exactly once on the next physics
/// step.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct LookIntent {
    /// Pending rotation in degrees: x yaws right, y pitches up.
    pub delta: Vec2,
    /// Whether any look source was active when the intent was last sampled.
    pub looking: bool,
}

impl LookIntent {
    /// Create a new empty look intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rotation (degrees) to the pending delta and mark as looking.
    pub fn accumulate(&mut self, delta: Vec2) {
        self.delta += delta;
        self.looking = true;
    }

    /// Take the pending delta, leaving zero behind.
    pub fn take_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.delta)
    }

    /// Drop any pending delta.
    pub fn clear(&mut self) {
        self.delta = Vec2::ZERO;
        self.looking = false;
    }

    /// Check if there is pending rotation to apply.
    pub fn has_delta(&self) -> bool {
        self.delta != Vec2::ZERO
    }
}

/// Jump request stored in [`MoveIntent`].
///
/// The timer counts up to the buffer duration; once finished the request is
/// dropped if the character could not jump in time.
#[derive(Reflect, Debug, Clone, Default)]
pub struct JumpRequest {
    /// Timer for jump buffering. When finished, the request expires.
    #[reflect(ignore)]
    pub buffer_timer: Timer,
}

impl JumpRequest {
    /// Create a new jump request with the given buffer duration.
    ///
    /// Negative or NaN buffers count as zero, as do buffers too long for a
    /// `Duration`.
    pub fn new(buffer_time: f32) -> Self {
        let buffer = Duration::try_from_secs_f32(buffer_time.max(0.0)).unwrap_or(Duration::ZERO);
        Self {
            buffer_timer: Timer::new(buffer, TimerMode::Once),
        }
    }

    /// Tick the buffer timer.
    pub fn tick(&mut self, delta: Duration) {
        self.buffer_timer.tick(delta);
    }

    /// Check if the request is still valid (timer hasn't finished).
    pub fn is_valid(&self) -> bool {
        !self.buffer_timer.finished()
    }
}
