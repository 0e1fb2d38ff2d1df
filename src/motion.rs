//! Motion math.
//!
//! Pure functions behind the orientation updater and the motion integrator.
//! The systems in [`crate::systems`] gather ECS data and call into these.

use bevy::prelude::*;

use crate::config::ControllerConfig;

/// Normals shorter than this are treated as "no surface".
const NORMAL_EPSILON_SQ: f32 = 1e-12;

/// Highest pitch limit the camera supports (degrees).
const PITCH_LIMIT: f32 = 90.0;

/// Add `delta` to `pitch` and clamp to `[-max, max]` (degrees).
///
/// Never panics: a negative `max` counts by magnitude, a NaN or oversized
/// `max` falls back to 90 degrees, and a NaN result keeps the old pitch.
pub fn clamp_pitch(pitch: f32, delta: f32, max: f32) -> f32 {
    let max = if max.is_nan() {
        PITCH_LIMIT
    } else {
        max.abs().min(PITCH_LIMIT)
    };
    let next = pitch + delta;
    let next = if next.is_nan() {
        if pitch.is_nan() {
            0.0
        } else {
            pitch
        }
    } else {
        next
    };
    next.max(-max).min(max)
}

/// Project `v` onto the plane with normal `n`.
///
/// A degenerate normal leaves `v` untouched, so a missed ground cast
/// (zero normal) behaves like flat ground.
pub fn project_on_plane(v: Vec3, n: Vec3) -> Vec3 {
    let len_sq = n.length_squared();
    if len_sq < NORMAL_EPSILON_SQ {
        return v;
    }
    v - n * (v.dot(n) / len_sq)
}

/// Turn movement axes into a horizontal world direction.
///
/// `axis.x` strafes right and `axis.y` walks forward relative to `facing`.
/// The vertical component is dropped so looking up or down never slows the
/// character; the result is not normalized.
pub fn desired_move(axis: Vec2, facing: Quat) -> Vec3 {
    let mut world = facing * Vec3::new(axis.x, 0.0, -axis.y);
    world.y = 0.0;
    world
}

/// Follow the ground: project onto the ground plane and normalize.
///
/// Zero input stays zero.
pub fn ground_move(desired: Vec3, ground_normal: Option<Vec3>) -> Vec3 {
    project_on_plane(desired, ground_normal.unwrap_or(Vec3::ZERO)).normalize_or_zero()
}

/// Outcome of one vertical integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalStep {
    /// Updated move velocity.
    pub move_dir: Vec3,
    /// Whether the current airborne phase started with a jump.
    pub has_jumped: bool,
    /// Whether a jump was started on this step.
    pub jumped: bool,
}

/// Integrate the vertical part of `move_dir`.
///
/// Grounded: hold the character against the ground with
/// `stick_to_ground_force`, or launch it at `jump_speed` when `jump` is set.
/// Airborne: accelerate by `gravity * gravity_multiplier`.
pub fn step_vertical(
    mut move_dir: Vec3,
    has_jumped: bool,
    grounded: bool,
    jump: bool,
    gravity: Vec3,
    config: &ControllerConfig,
    dt: f32,
) -> VerticalStep {
    if grounded {
        if jump {
            move_dir.y = config.jump_speed;
        } else {
            move_dir.y = -config.stick_to_ground_force;
        }
        VerticalStep {
            move_dir,
            has_jumped: jump,
            jumped: jump,
        }
    } else {
        move_dir += gravity * config.gravity_multiplier * dt;
        VerticalStep {
            move_dir,
            has_jumped,
            jumped: false,
        }
    }
}

/// Airborne without a jump.
#[inline]
pub fn is_falling(grounded: bool, has_jumped: bool) -> bool {
    !grounded && !has_jumped
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    // ==================== Pitch ====================

    #[test]
    fn pitch_accumulates_within_limit() {
        assert_eq!(clamp_pitch(10.0, 5.0, 90.0), 15.0);
        assert_eq!(clamp_pitch(-10.0, -5.0, 90.0), -15.0);
    }

    #[test]
    fn pitch_clamps_at_limit() {
        assert_eq!(clamp_pitch(85.0, 20.0, 90.0), 90.0);
        assert_eq!(clamp_pitch(-85.0, -20.0, 90.0), -90.0);
        // Already at the limit, pushing further does nothing
        assert_eq!(clamp_pitch(90.0, 1.0, 90.0), 90.0);
    }

    #[test]
    fn pitch_limit_out_of_range_does_not_panic() {
        // Negative limit counts by magnitude
        assert_eq!(clamp_pitch(0.0, 5.0, -10.0), 5.0);
        assert_eq!(clamp_pitch(0.0, 50.0, -10.0), 10.0);
        // NaN and oversized limits fall back to 90 degrees
        assert_eq!(clamp_pitch(0.0, 120.0, f32::NAN), 90.0);
        assert_eq!(clamp_pitch(0.0, -120.0, f32::INFINITY), -90.0);
        assert_eq!(clamp_pitch(0.0, 120.0, 400.0), 90.0);
        // Zero limit pins the camera level
        assert_eq!(clamp_pitch(30.0, 5.0, 0.0), 0.0);
    }

    #[test]
    fn nan_look_delta_keeps_pitch() {
        assert_eq!(clamp_pitch(20.0, f32::NAN, 90.0), 20.0);
        assert_eq!(clamp_pitch(f32::NAN, f32::NAN, 90.0), 0.0);
    }

    // ==================== Plane projection ====================

    #[test]
    fn project_on_flat_ground_drops_vertical() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!(approx(project_on_plane(v, Vec3::Y), Vec3::new(1.0, 0.0, 3.0)));
    }

    #[test]
    fn project_with_unnormalized_normal() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!(approx(
            project_on_plane(v, Vec3::Y * 4.0),
            Vec3::new(1.0, 0.0, 3.0)
        ));
    }

    #[test]
    fn project_on_zero_normal_is_identity() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(project_on_plane(v, Vec3::ZERO), v);
    }

    #[test]
    fn project_onto_slope_follows_surface() {
        // 45 degree ramp rising towards -Z
        let normal = Vec3::new(0.0, 1.0, 1.0).normalize();
        let projected = project_on_plane(Vec3::NEG_Z, normal);
        assert!(projected.dot(normal).abs() < 1e-5);
        assert!(projected.y > 0.0, "walking uphill should climb");
    }

    // ==================== Desired move ====================

    #[test]
    fn forward_axis_moves_along_neg_z() {
        assert!(approx(desired_move(Vec2::Y, Quat::IDENTITY), Vec3::NEG_Z));
    }

    #[test]
    fn strafe_axis_moves_along_x() {
        assert!(approx(desired_move(Vec2::X, Quat::IDENTITY), Vec3::X));
        assert!(approx(desired_move(Vec2::NEG_X, Quat::IDENTITY), Vec3::NEG_X));
    }

    #[test]
    fn desired_move_follows_yaw() {
        // Quarter turn to the left: forward becomes -X
        let facing = Quat::from_rotation_y(FRAC_PI_2);
        assert!(approx(desired_move(Vec2::Y, facing), Vec3::NEG_X));
    }

    #[test]
    fn desired_move_drops_vertical_from_pitch() {
        let facing = Quat::from_rotation_x(0.5);
        let desired = desired_move(Vec2::Y, facing);
        assert_eq!(desired.y, 0.0);
        assert!(desired.z < 0.0);
    }

    // ==================== Ground move ====================

    #[test]
    fn ground_move_normalizes_partial_input() {
        let desired = Vec3::new(0.3, 0.0, 0.0);
        assert!(approx(ground_move(desired, Some(Vec3::Y)), Vec3::X));
    }

    #[test]
    fn ground_move_without_ground_uses_raw_direction() {
        let desired = Vec3::new(0.0, 0.0, -0.5);
        assert!(approx(ground_move(desired, None), Vec3::NEG_Z));
    }

    #[test]
    fn ground_move_zero_stays_zero() {
        assert_eq!(ground_move(Vec3::ZERO, Some(Vec3::Y)), Vec3::ZERO);
    }

    // ==================== Vertical step ====================

    #[test]
    fn grounded_sticks_to_ground() {
        let config = ControllerConfig::default();
        let step = step_vertical(Vec3::new(1.0, 3.0, 0.0), true, true, false, Vec3::NEG_Y * 9.81, &config, DT);
        assert_eq!(step.move_dir.y, -config.stick_to_ground_force);
        assert_eq!(step.move_dir.x, 1.0);
        assert!(!step.has_jumped, "landing resets the jump flag");
        assert!(!step.jumped);
    }

    #[test]
    fn grounded_jump_launches() {
        let config = ControllerConfig::default();
        let step = step_vertical(Vec3::ZERO, false, true, true, Vec3::NEG_Y * 9.81, &config, DT);
        assert_eq!(step.move_dir.y, config.jump_speed);
        assert!(step.has_jumped);
        assert!(step.jumped);
    }

    #[test]
    fn airborne_accelerates_with_scaled_gravity() {
        let config = ControllerConfig::default();
        let gravity = Vec3::new(0.0, -9.81, 0.0);
        let step = step_vertical(Vec3::new(0.0, 2.0, 0.0), true, false, false, gravity, &config, DT);

        let expected = 2.0 - 9.81 * config.gravity_multiplier * DT;
        assert!((step.move_dir.y - expected).abs() < 1e-5);
        assert!(step.has_jumped, "airborne keeps the jump flag");
    }

    #[test]
    fn airborne_ignores_jump() {
        let config = ControllerConfig::default();
        let step = step_vertical(Vec3::ZERO, false, false, true, Vec3::NEG_Y, &config, DT);
        assert!(!step.jumped);
        assert!(!step.has_jumped);
        assert!(step.move_dir.y < 0.0);
    }

    #[test]
    fn falling_only_without_jump() {
        assert!(is_falling(false, false));
        assert!(!is_falling(false, true));
        assert!(!is_falling(true, false));
        assert!(!is_falling(true, true));
    }
}
