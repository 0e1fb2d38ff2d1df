//! Input sampling.
//!
//! Polls keyboard, mouse and gamepads once per frame and writes
//! [`MoveIntent`] and [`LookIntent`] for every entity carrying
//! [`PlayerInput`]. Keyboard/mouse wins over the gamepad whenever it is
//! active, so the two can be used interchangeably without fighting.
//!
//! Leave [`PlayerInputPlugin`] out to drive the intents from AI or the
//! network instead.

use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;

use crate::config::ControllerConfig;
use crate::intent::{LookIntent, MoveIntent};
use crate::FirstPersonSet;

/// Plugin that samples player input into intents.
pub struct PlayerInputPlugin;

impl Plugin for PlayerInputPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<InputBindings>();
        app.register_type::<PlayerInput>();
        app.init_resource::<InputBindings>();
        app.add_systems(Update, sample_player_input.in_set(FirstPersonSet::Input));
    }
}

/// Key and button bindings plus axis tuning.
#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct InputBindings {
    /// Keys that walk forward.
    pub forward: Vec<KeyCode>,
    /// Keys that walk backward.
    pub back: Vec<KeyCode>,
    /// Keys that strafe left.
    pub left: Vec<KeyCode>,
    /// Keys that strafe right.
    pub right: Vec<KeyCode>,
    /// Keyboard jump key.
    pub jump: KeyCode,
    /// Gamepad jump button.
    pub gamepad_jump: GamepadButton,
    /// Mouse motion (pixels) to look axis units.
    pub mouse_axis_scale: f32,
    /// Invert vertical look for mouse and right stick.
    pub invert_y: bool,
    /// Stick magnitudes below this are treated as zero.
    pub stick_dead_zone: f32,
    /// How fast keyboard axes ramp toward a held key (units/s).
    pub axis_sensitivity: f32,
    /// How fast keyboard axes fall back to zero on release (units/s).
    pub axis_gravity: f32,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            forward: vec![KeyCode::KeyW, KeyCode::ArrowUp],
            back: vec![KeyCode::KeyS, KeyCode::ArrowDown],
            left: vec![KeyCode::KeyA, KeyCode::ArrowLeft],
            right: vec![KeyCode::KeyD, KeyCode::ArrowRight],
            jump: KeyCode::Space,
            gamepad_jump: GamepadButton::South,
            mouse_axis_scale: 0.1,
            invert_y: false,
            stick_dead_zone: 0.1,
            axis_sensitivity: 3.0,
            axis_gravity: 3.0,
        }
    }
}

/// Marks an entity as driven by local input and stores keyboard smoothing.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct PlayerInput {
    /// Smoothed keyboard strafe axis.
    pub strafe: SmoothedAxis,
    /// Smoothed keyboard forward axis.
    pub forward: SmoothedAxis,
}

/// A digital axis smoothed into an analog value.
///
/// Ramps toward the held direction at `sensitivity`, falls back to zero at
/// `gravity`, and snaps through zero when the direction reverses.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothedAxis {
    /// Current smoothed value in [-1, 1].
    pub value: f32,
}

impl SmoothedAxis {
    /// Advance toward `target` and return the new value.
    pub fn update(&mut self, target: f32, dt: f32, sensitivity: f32, gravity: f32) -> f32 {
        let target = target.clamp(-1.0, 1.0);
        if target == 0.0 {
            self.value = move_towards(self.value, 0.0, gravity * dt);
        } else {
            if self.value != 0.0 && self.value.signum() != target.signum() {
                self.value = 0.0;
            }
            self.value = move_towards(self.value, target, sensitivity * dt);
        }
        self.value
    }
}

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Which of two input sources should drive an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSource {
    /// The preferred source (keyboard/mouse) is active.
    Primary,
    /// Only the fallback source (gamepad) is active.
    Secondary,
    /// Neither source is active.
    Idle,
}

/// Pick the input source: primary whenever it has any non-zero raw value.
pub fn select_source(primary_raw: Vec2, secondary_raw: Vec2) -> AxisSource {
    if primary_raw != Vec2::ZERO {
        AxisSource::Primary
    } else if secondary_raw != Vec2::ZERO {
        AxisSource::Secondary
    } else {
        AxisSource::Idle
    }
}

/// Zero a stick reading inside the dead zone.
pub fn apply_dead_zone(stick: Vec2, dead_zone: f32) -> Vec2 {
    if stick.length() < dead_zone {
        Vec2::ZERO
    } else {
        stick
    }
}

fn key_axis(keyboard: &ButtonInput<KeyCode>, negative: &[KeyCode], positive: &[KeyCode]) -> f32 {
    let mut axis = 0.0;
    if keyboard.any_pressed(negative.iter().copied()) {
        axis -= 1.0;
    }
    if keyboard.any_pressed(positive.iter().copied()) {
        axis += 1.0;
    }
    axis
}

/// Sample input for every [`PlayerInput`] entity.
///
/// Missing input resources (headless apps) count as no input.
pub fn sample_player_input(
    time: Res<Time>,
    bindings: Res<InputBindings>,
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mouse_motion: Option<Res<AccumulatedMouseMotion>>,
    gamepads: Query<&Gamepad>,
    mut q_players: Query<(
        &ControllerConfig,
        &mut PlayerInput,
        &mut MoveIntent,
        &mut LookIntent,
    )>,
) {
    let dt = time.delta_secs();
    let y_sign = if bindings.invert_y { -1.0 } else { 1.0 };

    let raw_keys = keyboard
        .as_deref()
        .map(|kb| {
            Vec2::new(
                key_axis(kb, &bindings.left, &bindings.right),
                key_axis(kb, &bindings.back, &bindings.forward),
            )
        })
        .unwrap_or(Vec2::ZERO);

    let left_stick = gamepads
        .iter()
        .map(|g| apply_dead_zone(g.left_stick(), bindings.stick_dead_zone))
        .find(|v| *v != Vec2::ZERO)
        .unwrap_or(Vec2::ZERO);

    let right_stick = gamepads
        .iter()
        .map(|g| apply_dead_zone(g.right_stick(), bindings.stick_dead_zone))
        .find(|v| *v != Vec2::ZERO)
        .unwrap_or(Vec2::ZERO);

    // Screen-space mouse Y grows downward; look axes grow upward
    let mouse_axis = mouse_motion
        .as_deref()
        .map(|m| Vec2::new(m.delta.x, -m.delta.y) * bindings.mouse_axis_scale)
        .unwrap_or(Vec2::ZERO);

    let jump_pressed = keyboard
        .as_deref()
        .is_some_and(|kb| kb.just_pressed(bindings.jump))
        || gamepads.iter().any(|g| g.just_pressed(bindings.gamepad_jump));

    for (config, mut player, mut movement, mut look) in &mut q_players {
        let strafe = player.strafe.update(
            raw_keys.x,
            dt,
            bindings.axis_sensitivity,
            bindings.axis_gravity,
        );
        let forward = player.forward.update(
            raw_keys.y,
            dt,
            bindings.axis_sensitivity,
            bindings.axis_gravity,
        );

        match select_source(raw_keys, left_stick) {
            AxisSource::Primary => {
                movement.set_axis(Vec2::new(strafe, forward));
                movement.moving = true;
            }
            AxisSource::Secondary => {
                movement.set_axis(left_stick);
                movement.moving = true;
            }
            // The smoothed axes keep falling back; that only shapes the next press
            AxisSource::Idle => movement.clear(),
        }

        match select_source(mouse_axis, right_stick) {
            AxisSource::Primary => {
                let axis = Vec2::new(mouse_axis.x, mouse_axis.y * y_sign);
                look.accumulate(axis * config.sensitivity * dt);
            }
            AxisSource::Secondary => {
                let axis = Vec2::new(right_stick.x, right_stick.y * y_sign);
                look.accumulate(axis * config.joystick_sensitivity * dt);
            }
            AxisSource::Idle => look.looking = false,
        }

        if jump_pressed {
            movement.request_jump(config.jump_buffer_time);
        }
    }
}
