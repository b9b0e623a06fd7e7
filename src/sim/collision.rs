//! Circle tests, eat rules and boundary contacts
//!
//! Every body in the game is a circle. The player's effective radius shrinks
//! with its vertical squash so ducking really does make it harder to catch
//! things overhead.

use glam::Vec2;

use crate::math::dist;
use crate::tuning::Eat;

/// Whether a body of radius `a` may eat one of radius `b`.
///
/// Strict ratio rule: `a >= b * (1 + margin)`. With `margin >= 0` at most
/// one of `can_eat(a, b)` and `can_eat(b, a)` holds.
#[inline]
pub fn can_eat(a: f32, b: f32, margin: f32) -> bool {
    a >= b * (1.0 + margin)
}

/// Player radius as seen by captures, adjusted by squash
#[inline]
pub fn effective_radius(r: f32, squash_y: f32) -> f32 {
    r * 0.5 * (1.0 + squash_y)
}

/// Distance at which a capture triggers
#[inline]
pub fn capture_distance(player_r: f32, squash_y: f32, entity_r: f32, eat: &Eat) -> f32 {
    effective_radius(player_r, squash_y) + entity_r + eat.capture_pad
}

/// Capture test: close enough and not already behind the player
pub fn can_capture(
    player_pos: Vec2,
    player_r: f32,
    squash_y: f32,
    entity_pos: Vec2,
    entity_r: f32,
    eat: &Eat,
) -> bool {
    let d = dist(player_pos, entity_pos);
    d <= capture_distance(player_r, squash_y, entity_r, eat)
        && entity_pos.x >= player_pos.x - eat.behind_tolerance
}

/// Circle overlap with extra padding
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32, pad: f32) -> bool {
    let rr = ra + rb + pad;
    a.distance_squared(b) < rr * rr
}

/// Reflect velocity off a surface with given normal
#[inline]
pub fn reflect_velocity(vel: Vec2, normal: Vec2) -> Vec2 {
    vel - 2.0 * vel.dot(normal) * normal
}

/// Which screen boundary a body touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Ground,
    Top,
    Left,
    Right,
}

impl Boundary {
    /// Normal pointing back into the play area
    pub fn normal(&self) -> Vec2 {
        match self {
            Boundary::Ground => Vec2::NEG_Y,
            Boundary::Top => Vec2::Y,
            Boundary::Left => Vec2::X,
            Boundary::Right => Vec2::NEG_X,
        }
    }
}

/// Result of a boundary check
#[derive(Debug, Clone)]
pub struct Contact {
    pub boundary: Boundary,
    /// Position pushed back inside the bounds
    pub clamped: Vec2,
}

/// First boundary a circle crosses moving with `vel`, if any.
///
/// Only surfaces the body is moving into count, so a body resting against
/// a wall after a bounce is not hit again.
pub fn boundary_contact(pos: Vec2, r: f32, vel: Vec2, width: f32, ground_y: f32) -> Option<Contact> {
    let (boundary, clamped) = if pos.y + r >= ground_y && vel.y > 0.0 {
        (Boundary::Ground, Vec2::new(pos.x, ground_y - r))
    } else if pos.y - r <= 0.0 && vel.y < 0.0 {
        (Boundary::Top, Vec2::new(pos.x, r))
    } else if pos.x + r >= width && vel.x > 0.0 {
        (Boundary::Right, Vec2::new(width - r, pos.y))
    } else if pos.x - r <= 0.0 && vel.x < 0.0 {
        (Boundary::Left, Vec2::new(r, pos.y))
    } else {
        return None;
    };
    Some(Contact { boundary, clamped })
}
