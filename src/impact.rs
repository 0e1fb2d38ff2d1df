//! Impact reaction.
//!
//! When the character walks into a loose rigid body it gives the body a
//! small shove along its own velocity. Backends call these helpers from their
//! collision handling.

use bevy::prelude::*;

use crate::collision::CollisionFlags;

/// How a body that the character ran into is simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Fully simulated; can be pushed.
    Dynamic,
    /// Moved by code; ignores impulses.
    Kinematic,
    /// Never moves.
    Fixed,
}

/// Decide whether a collision should push the other body.
///
/// `flags` are the collision flags of the move that produced the collision. When the
/// only contact was underneath, the character is standing on the body and
/// must not shove it away from under its own feet.
pub fn should_push(flags: CollisionFlags, body: Option<BodyKind>) -> bool {
    if flags.only_below() {
        return false;
    }
    matches!(body, Some(BodyKind::Dynamic))
}

/// Impulse handed to a pushed body.
#[inline]
pub fn push_impulse(velocity: Vec3, push_power: f32) -> Vec3 {
    velocity * push_power
}
