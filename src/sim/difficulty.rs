//! Difficulty pacing: score ramp, relief waves and miss stress
//!
//! Difficulty is a scalar in `[0, 1]` taken from the score, or pinned during
//! the boss fight. World speed, spawn spacing and trail odds all derive from
//! it, softened by a scheduled relief window and by accumulated stress.

use serde::{Deserialize, Serialize};

use crate::math::{clamp, lerp};
use crate::tuning::{Dda, Tuning};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Difficulty {
    /// Seconds into the relief-wave cycle
    pub wave_t: f32,
    pub relief: bool,
    /// Miss pressure in `[0, 1]`
    pub stress: f32,
    pub stress_ease: f32,
    /// Pinned difficulty while the boss fight runs
    pub boss_override: Option<f32>,
    /// Cached result of the last `level` call
    pub level: f32,
    /// World scroll speed (px/s)
    pub speed: f32,
}

/// Linear remap of stress above `threshold` into `[0, 1]`
pub fn stress_ease(stress: f32, dda: &Dda) -> f32 {
    let span = (1.0 - dda.threshold).max(1e-3);
    clamp((stress - dda.threshold) / span, 0.0, 1.0)
}

impl Difficulty {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            speed: tuning.world.base_speed,
            ..Default::default()
        }
    }

    /// Back to a calm start (new run or respawn)
    pub fn reset(&mut self, tuning: &Tuning) {
        let boss_override = self.boss_override;
        *self = Self::new(tuning);
        self.boss_override = boss_override;
    }

    /// Normalized difficulty for the given score
    pub fn level_for(&self, score: u64, dda: &Dda) -> f32 {
        if let Some(pinned) = self.boss_override {
            return clamp(pinned, 0.0, 1.0);
        }
        clamp(score as f32 / dda.score_full.max(1.0), 0.0, 1.0)
    }

    /// Advance the wave and stress clocks
    pub fn advance(&mut self, dt: f32, tuning: &Tuning) {
        let wave = &tuning.wave;
        self.wave_t += dt;
        if wave.period > 0.0 {
            self.wave_t %= wave.period;
        }
        self.relief = self.wave_t > wave.period - wave.relief;

        self.stress = clamp(self.stress - dt * tuning.dda.decay, 0.0, 1.0);
        self.stress_ease = stress_ease(self.stress, &tuning.dda);
    }

    pub fn bump_stress(&mut self, dda: &Dda) {
        self.stress = clamp(self.stress + dda.bump_on_miss, 0.0, 1.0);
        self.stress_ease = stress_ease(self.stress, dda);
    }

    /// Recompute level and world speed from the score
    pub fn update(&mut self, score: u64, tuning: &Tuning) {
        self.level = self.level_for(score, &tuning.dda);
        self.speed = self.world_speed(tuning);
    }

    /// Gentle-then-aggressive ramp between base and max speed
    pub fn world_speed(&self, tuning: &Tuning) -> f32 {
        let d = self.level;
        let smooth = d * d * (3.0 - 2.0 * d);
        let s = smooth.powf(0.65);
        let base = lerp(tuning.world.base_speed, tuning.world.max_speed, s);
        let wave_scale = if self.relief { tuning.wave.speed_scale } else { 1.0 };
        let dda_scale = lerp(1.0, tuning.dda.speed_scale, self.stress_ease);
        base * wave_scale * dda_scale
    }

    /// Minimum world-x spacing between consecutive spawns
    pub fn min_gap_px(&self, tuning: &Tuning) -> f32 {
        let gap = &tuning.gap;
        let gap_time = lerp(gap.time_easy, gap.time_hard, self.level);
        let base = clamp(gap_time * self.speed, gap.min_px, gap.max_px);
        let scaled = base * lerp(1.0, tuning.dda.gap_scale, self.stress_ease);
        clamp(scaled, gap.min_px, gap.max_px * tuning.dda.gap_scale)
    }

    /// Chance that an NPC spawn opens a trail instead
    pub fn trail_prob(&self, tuning: &Tuning) -> f32 {
        let tier = tuning.encounters.tier(self.level);
        let boost = if self.relief { tuning.wave.trail_boost } else { 0.0 };
        clamp(tuning.trail.prob(tier) + boost, 0.0, 0.95)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_speed_endpoints() {
        let t = Tuning::default();
        let mut d = Difficulty::new(&t);
        d.update(0, &t);
        assert_eq!(d.speed, 320.0);

        d.update(120, &t);
        assert!((d.speed - 520.0).abs() < 1e-3);
        d.update(5000, &t);
        assert!((d.speed - 520.0).abs() < 1e-3);
    }

    #[test]
    fn test_boss_override_pins_level() {
        let t = Tuning::default();
        let mut d = Difficulty::new(&t);
        d.boss_override = Some(1.0);
        d.update(0, &t);
        assert_eq!(d.level, 1.0);
    }

    #[test]
    fn test_relief_window_slows_world() {
        let t = Tuning::default();
        let mut d = Difficulty::new(&t);
        d.advance(13.5, &t);
        assert!(d.relief);
        d.update(60, &t);
        let relieved = d.speed;

        d.advance(3.0, &t);
        assert!(!d.relief);
        d.update(60, &t);
        assert!(relieved < d.speed);
    }

    #[test]
    fn test_stress_widens_gap() {
        let t = Tuning::default();
        let mut d = Difficulty::new(&t);
        d.update(60, &t);
        let calm = d.min_gap_px(&t);

        d.bump_stress(&t.dda);
        d.bump_stress(&t.dda);
        d.update(60, &t);
        assert!(d.stress_ease > 0.0);
        assert!(d.min_gap_px(&t) > calm);
        assert!(d.min_gap_px(&t) <= t.gap.max_px * t.dda.gap_scale);
    }

    #[test]
    fn test_stress_decays() {
        let t = Tuning::default();
        let mut d = Difficulty::new(&t);
        d.bump_stress(&t.dda);
        d.advance(1.0, &t);
        assert!((d.stress - 0.10).abs() < 1e-5);
        d.advance(1.0, &t);
        assert_eq!(d.stress, 0.0);
    }

    #[test]
    fn test_trail_prob_boosted_in_relief() {
        let t = Tuning::default();
        let mut d = Difficulty::new(&t);
        assert!((d.trail_prob(&t) - 0.14).abs() < 1e-6);
        d.relief = true;
        assert!((d.trail_prob(&t) - 0.19).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_stress_ease_hysteresis(s in 0.0f32..=1.0) {
            let dda = Dda::default();
            let e = stress_ease(s, &dda);
            if s <= dda.threshold {
                prop_assert_eq!(e, 0.0);
            } else {
                let expected = (s - dda.threshold) / (1.0 - dda.threshold);
                prop_assert!((e - expected).abs() < 1e-5);
            }
            prop_assert!((0.0..=1.0).contains(&e));
        }
    }

    #[test]
    fn test_stress_ease_full_at_one() {
        assert_eq!(stress_ease(1.0, &Dda::default()), 1.0);
    }
}
