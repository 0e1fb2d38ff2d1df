//! Contact result structures.
//!
//! These structures hold the results of physics queries (shape casts) and
//! the classification of contacts reported by the last character move.

use bevy::prelude::*;
use bitflags::bitflags;

/// Contacts whose normal points more than this far along `up` count as floor.
pub const FLOOR_NORMAL_THRESHOLD: f32 = 0.5;

/// Information about a raycast/shapecast collision.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance travelled by the cast before the hit.
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}

bitflags! {
    /// Which sides of the character collided during the last move.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct CollisionFlags: u8 {
        /// Touched something on the sides (walls, crates).
        const SIDES = 1 << 0;
        /// Touched something above (ceilings).
        const ABOVE = 1 << 1;
        /// Touched something below (floor, top of a crate).
        const BELOW = 1 << 2;
    }
}

impl CollisionFlags {
    /// True when the only contact of the last move was underneath the character.
    pub fn only_below(self) -> bool {
        self == CollisionFlags::BELOW
    }
}

/// Movement along `up` smaller than this is treated as none.
const MOVE_EPSILON: f32 = 1.0e-4;

/// Classify the contacts of one character move.
///
/// `BELOW` comes from the mover's grounded result. `ABOVE` is set when an
/// upward move was cut short. `SIDES` is set for any contact whose normal is
/// closer to horizontal than to vertical. Contact normals may point either
/// way, only their alignment with `up` matters.
pub fn classify_move(
    grounded: bool,
    desired: Vec3,
    effective: Vec3,
    normals: impl IntoIterator<Item = Vec3>,
    up: Vec3,
) -> CollisionFlags {
    let mut flags = CollisionFlags::empty();
    if grounded {
        flags |= CollisionFlags::BELOW;
    }

    let desired_up = desired.dot(up);
    if desired_up > MOVE_EPSILON && effective.dot(up) < desired_up - MOVE_EPSILON {
        flags |= CollisionFlags::ABOVE;
    }

    let hit_side = normals.into_iter().any(|normal| {
        let normal = normal.normalize_or_zero();
        normal != Vec3::ZERO && normal.dot(up).abs() <= FLOOR_NORMAL_THRESHOLD
    });
    if hit_side {
        flags |= CollisionFlags::SIDES;
    }

    flags
}
