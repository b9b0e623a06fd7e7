//! Small numeric helpers shared by the simulation
//!
//! All helpers tolerate non-finite input: a NaN or infinity degrades to a
//! safe fallback instead of leaking into positions and timers.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;

/// Clamp `v` into `[lo, hi]`. Non-finite `v` falls back to `lo`.
#[inline]
pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    if v.is_nan() {
        return lo;
    }
    v.max(lo).min(hi)
}

/// Linear interpolation. Non-finite `t` returns `a`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    if !t.is_finite() {
        return a;
    }
    a + (b - a) * t
}

/// Smoothstep ease (`t² (3 - 2t)`) on an already clamped `t`.
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let t = clamp(t, 0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Interpolate angle `a` toward `b` along the shortest arc.
pub fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    if !a.is_finite() {
        return if b.is_finite() { b } else { 0.0 };
    }
    if !b.is_finite() || !t.is_finite() {
        return a;
    }
    let mut d = (b - a) % TAU;
    if d > PI {
        d -= TAU;
    } else if d < -PI {
        d += TAU;
    }
    a + d * t
}

/// Euclidean distance between two points (0 when either is non-finite).
#[inline]
pub fn dist(a: Vec2, b: Vec2) -> f32 {
    let d = a.distance(b);
    if d.is_finite() { d } else { 0.0 }
}

/// Frame-rate independent smoothing factor: `1 - base^dt`.
///
/// `base` is the fraction of the gap left after one second.
#[inline]
pub fn damp(base: f32, dt: f32) -> f32 {
    clamp(1.0 - base.powf(dt), 0.0, 1.0)
}

/// Uniform sample in `[a, b)`; tolerates `a == b` and inverted bounds.
#[inline]
pub fn rand_between<R: Rng + ?Sized>(rng: &mut R, a: f32, b: f32) -> f32 {
    a + (b - a) * rng.random::<f32>()
}

/// Angle from `from` toward `to`.
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp_nan_falls_back() {
        assert_eq!(clamp(f32::NAN, 2.0, 5.0), 2.0);
        assert_eq!(clamp(f32::INFINITY, 2.0, 5.0), 5.0);
        assert_eq!(clamp(3.0, 2.0, 5.0), 3.0);
    }

    #[test]
    fn test_lerp_angle_takes_short_way() {
        let a = 3.0;
        let b = -3.0;
        let mid = lerp_angle(a, b, 0.5);
        // Crossing ±π instead of sweeping through zero
        assert!(mid.abs() > 3.0);
    }

    #[test]
    fn test_ease_in_out_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_dist_non_finite() {
        assert_eq!(dist(Vec2::new(f32::NAN, 0.0), Vec2::ZERO), 0.0);
        assert!((dist(Vec2::ZERO, Vec2::new(3.0, 4.0)) - 5.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_clamp_stays_in_range(v in proptest::num::f32::ANY, lo in -100.0f32..0.0, hi in 0.0f32..100.0) {
            let c = clamp(v, lo, hi);
            prop_assert!(c >= lo && c <= hi);
        }

        #[test]
        fn prop_lerp_never_nan_for_finite_ends(a in -1e3f32..1e3, b in -1e3f32..1e3, t in proptest::num::f32::ANY) {
            prop_assert!(!lerp(a, b, t).is_nan());
        }
    }
}
