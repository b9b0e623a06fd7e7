//! The boss: a creature at the right edge that dodges batted bombs
//!
//! It mirrors the player's size, predicts where incoming deflected bombs
//! will cross its column, and jumps over low ones or ducks under high ones
//! after a short reaction delay.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::hazard::{Hazard, HazardState};
use crate::math::{clamp, damp, lerp, rand_between};
use crate::tuning::{self, Phys};

/// Boss squash eases with the same base as the player's
const SQUASH_DAMP: f32 = 0.001;
/// Boss counts as grounded below this vertical speed
const GROUNDED_VY: f32 = 60.0;
/// Gap kept between the boss and the right edge, at minimum
const EDGE_GAP: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossIntent {
    Jump,
    Duck,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub pos: Vec2,
    pub vy: f32,
    pub r: f32,
    pub hp: u32,
    pub hp_max: u32,
    pub intent: Option<BossIntent>,
    pub react_t: f32,
    pub action_cd: f32,
    pub duck_t: f32,
    pub squash_y: f32,
    pub wing_t: f32,
    /// Mouth opening while talking
    pub mouth: f32,
}

impl Boss {
    pub fn new(cfg: &tuning::Boss, r: f32) -> Self {
        Self {
            pos: Vec2::ZERO,
            vy: 0.0,
            r,
            hp: cfg.hp_max,
            hp_max: cfg.hp_max,
            intent: None,
            react_t: 0.0,
            action_cd: 0.0,
            duck_t: 0.0,
            squash_y: 1.0,
            wing_t: 0.0,
            mouth: 0.0,
        }
    }

    /// Clear motion and pending reactions
    pub fn reset_motion(&mut self) {
        self.vy = 0.0;
        self.duck_t = 0.0;
        self.squash_y = 1.0;
        self.intent = None;
        self.react_t = 0.0;
        self.action_cd = 0.0;
        self.wing_t = 0.0;
    }

    /// Horizontal home position against the right edge
    pub fn home_x(&self, width: f32) -> f32 {
        width - EDGE_GAP.max(self.r * 1.2)
    }

    pub fn floor(&self, ground_y: f32) -> f32 {
        ground_y - self.r * self.squash_y
    }

    /// Register a bomb hit; returns true on the killing blow.
    ///
    /// Hits at zero hp are ignored, so the kill fires exactly once.
    pub fn take_hit(&mut self) -> bool {
        if self.hp == 0 {
            return false;
        }
        self.hp -= 1;
        self.hp == 0
    }

    /// Idle pose: standing on the ground, flapping slowly
    pub fn idle(&mut self, dt: f32, ground_y: f32) {
        self.vy = 0.0;
        self.duck_t = 0.0;
        self.squash_y = lerp(self.squash_y, 1.0, damp(SQUASH_DAMP, dt));
        self.pos.y = self.floor(ground_y);
        self.wing_t = (self.wing_t + dt * 4.6) % 1.0;
    }

    /// One fight tick: pick a threat, react, and integrate physics.
    ///
    /// `scroll_speed` converts the bombs' world velocity to screen motion.
    pub fn fight<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        ground_y: f32,
        hazards: &[Hazard],
        scroll_speed: f32,
        tuning: &tuning::Tuning,
        rng: &mut R,
    ) {
        let cfg = &tuning.boss;
        self.action_cd = (self.action_cd - dt).max(0.0);
        self.react_t = (self.react_t - dt).max(0.0);

        if self.intent.is_none() && self.action_cd <= 0.0 {
            self.intent = pick_threat(self, hazards, scroll_speed, cfg, tuning.hazard.gravity);
            if self.intent.is_some() {
                self.react_t = rand_between(rng, cfg.react_min, cfg.react_max);
            }
        }

        if let Some(intent) = self.intent.filter(|_| self.react_t <= 0.0) {
            match intent {
                BossIntent::Jump => {
                    let grounded = (self.pos.y - self.floor(ground_y)).abs() < 0.5 && self.vy.abs() < GROUNDED_VY;
                    if grounded {
                        self.vy = tuning.phys.flap_vy * cfg.jump_scale;
                    }
                }
                BossIntent::Duck => self.duck_t = cfg.duck_secs,
            }
            self.intent = None;
            self.action_cd = rand_between(rng, cfg.cooldown_min, cfg.cooldown_max);
        }

        self.duck_t = (self.duck_t - dt).max(0.0);
        let squash_target = if self.duck_t > 0.0 { cfg.duck_squash } else { 1.0 };
        self.squash_y = lerp(self.squash_y, squash_target, damp(SQUASH_DAMP, dt));
        self.integrate(dt, ground_y, &tuning.phys);
    }

    fn integrate(&mut self, dt: f32, ground_y: f32, phys: &Phys) {
        self.vy = clamp(self.vy + phys.gravity * dt, -phys.max_rise, phys.max_fall);
        self.pos.y += self.vy * dt;

        let floor = self.floor(ground_y);
        if self.pos.y > floor {
            self.pos.y = floor;
            self.vy *= phys.ground_bounce;
            if self.vy.abs() < phys.rest_speed {
                self.vy = 0.0;
            }
        }
        let grounded = (self.pos.y - floor).abs() < 0.5 && self.vy.abs() < 1.0;
        let wing_speed = if grounded { 4.6 } else { 6.2 };
        self.wing_t = (self.wing_t + dt * wing_speed) % 1.0;
    }
}

/// Earliest batted bomb that will cross the boss's body within the
/// lookahead window, and how to dodge it.
///
/// Arrival is predicted ballistically: time to close the horizontal gap at
/// the bomb's screen speed, then height under gravity at that time. Bombs
/// crossing below the upper body are jumped, the rest ducked.
pub fn pick_threat(
    boss: &Boss,
    hazards: &[Hazard],
    scroll_speed: f32,
    cfg: &tuning::Boss,
    gravity: f32,
) -> Option<BossIntent> {
    let mut best: Option<(f32, f32)> = None;

    for h in hazards {
        let HazardState::Deflect { vel, .. } = h.state else {
            continue;
        };
        let vx = vel.x - scroll_speed;
        if vx <= cfg.threat_min_speed {
            continue;
        }
        let dx = boss.pos.x - h.pos.x;
        if dx <= 0.0 {
            continue;
        }
        let t = dx / vx;
        if t < cfg.lookahead_min || t > cfg.lookahead_max {
            continue;
        }
        let y = h.pos.y + vel.y * t + 0.5 * gravity * t * t;
        let top = boss.pos.y - boss.r * boss.squash_y;
        let bottom = boss.pos.y + boss.r * boss.squash_y;
        let pad = h.r + boss.r * 0.25;
        if y >= top - pad && y <= bottom + pad && best.is_none_or(|(bt, _)| t < bt) {
            best = Some((t, y));
        }
    }

    let (_, y) = best?;
    let mid = boss.pos.y - boss.r * 0.45;
    Some(if y > mid { BossIntent::Jump } else { BossIntent::Duck })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const GROUND: f32 = 460.0;

    fn boss_on_ground(t: &Tuning) -> Boss {
        let mut b = Boss::new(&t.boss, 30.0);
        b.pos = Vec2::new(b.home_x(960.0), GROUND - 30.0);
        b
    }

    fn incoming(x: f32, y: f32, vy: f32) -> Hazard {
        let mut h = Hazard::new(1, Vec2::new(x, y), 12.0);
        h.state = HazardState::Deflect {
            vel: Vec2::new(620.0, vy),
            bounces: 0,
        };
        h
    }

    #[test]
    fn test_hp_hits_fire_kill_once() {
        let t = Tuning::default();
        let mut b = Boss::new(&t.boss, 18.0);
        assert!(!b.take_hit());
        assert!(!b.take_hit());
        assert!(!b.take_hit());
        assert!(b.take_hit());
        assert_eq!(b.hp, 0);
        assert!(!b.take_hit());
        assert_eq!(b.hp, 0);
    }

    #[test]
    fn test_low_threat_means_jump() {
        let t = Tuning::default();
        let b = boss_on_ground(&t);
        let h = incoming(b.pos.x - 200.0, b.pos.y + 10.0, -150.0);
        assert_eq!(pick_threat(&b, &[h], 0.0, &t.boss, t.hazard.gravity), Some(BossIntent::Jump));
    }

    #[test]
    fn test_high_threat_means_duck() {
        let t = Tuning::default();
        let b = boss_on_ground(&t);
        let h = incoming(b.pos.x - 200.0, b.pos.y - 40.0, -150.0);
        assert_eq!(pick_threat(&b, &[h], 0.0, &t.boss, t.hazard.gravity), Some(BossIntent::Duck));
    }

    #[test]
    fn test_ignores_slow_or_passed_threats() {
        let t = Tuning::default();
        let b = boss_on_ground(&t);
        // Screen speed below the threshold once the scroll is removed
        let slow = incoming(b.pos.x - 200.0, b.pos.y, 0.0);
        assert_eq!(pick_threat(&b, &[slow], 600.0, &t.boss, t.hazard.gravity), None);
        let behind = incoming(b.pos.x + 10.0, b.pos.y, 0.0);
        assert_eq!(pick_threat(&b, &[behind], 0.0, &t.boss, t.hazard.gravity), None);
        let far = incoming(b.pos.x - 900.0, b.pos.y, 0.0);
        assert_eq!(pick_threat(&b, &[far], 0.0, &t.boss, t.hazard.gravity), None);
    }

    #[test]
    fn test_fight_jumps_after_reaction_delay() {
        let t = Tuning::default();
        let mut b = boss_on_ground(&t);
        let mut rng = Pcg32::seed_from_u64(3);
        let h = incoming(b.pos.x - 300.0, b.pos.y + 10.0, -150.0);

        b.fight(1.0 / 60.0, GROUND, std::slice::from_ref(&h), 0.0, &t, &mut rng);
        assert_eq!(b.intent, Some(BossIntent::Jump));
        assert_eq!(b.vy, 0.0);

        for _ in 0..12 {
            b.fight(1.0 / 60.0, GROUND, &[], 0.0, &t, &mut rng);
        }
        assert!(b.pos.y < GROUND - 30.0);
        assert!(b.intent.is_none());
    }

    #[test]
    fn test_duck_squashes() {
        let t = Tuning::default();
        let mut b = boss_on_ground(&t);
        let mut rng = Pcg32::seed_from_u64(3);
        b.intent = Some(BossIntent::Duck);
        for _ in 0..10 {
            b.fight(1.0 / 60.0, GROUND, &[], 0.0, &t, &mut rng);
        }
        assert!(b.squash_y < 0.9);
        assert!(b.duck_t > 0.0);
    }
}
