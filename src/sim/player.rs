//! Player physics and the press/release input machine
//!
//! One button drives everything: a short tap flaps, holding past the tap
//! threshold ducks (squashes), and releasing a duck stands up with a small
//! hop that opens the attack window used to bat bombs away.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::mouth::{AIM_DAMP, BITE_AIM_DAMP, Mouth};
use crate::math::{angle_to, clamp, damp, ease_in_out, lerp};
use crate::tuning::{Grow, Phys, Squash};

/// Facial expression; cosmetic only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Emotion {
    #[default]
    Neutral,
    Fear,
    Hungry,
}

/// Squash eases toward its target with this base
const SQUASH_DAMP: f32 = 0.001;

/// An input hold in progress
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Hold {
    /// Seconds held so far
    pub held: f32,
    /// Held past the tap threshold at some point
    pub ducked: bool,
}

/// What a release turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Ignored,
    Flap,
    /// Stood up out of a duck, attack window open
    Stand,
}

/// Player being swallowed by a bigger creature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeingEaten {
    /// Entity id of the eater
    pub eater: u32,
    pub t: f32,
    pub from: Vec2,
    pub r0: f32,
    /// Last known mouth position of the eater
    pub target: Vec2,
}

/// Directional bite override for the mouth aim
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bite {
    pub dir: f32,
    pub t: f32,
}

/// Outcome of one physics step
#[derive(Debug, Clone, Copy, Default)]
pub struct Step {
    /// Touched down this step
    pub landed: bool,
    /// Fully above the top of the screen
    pub off_top: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vy: f32,
    pub r: f32,
    pub base_r: f32,
    pub max_r: f32,
    pub alive: bool,
    pub emotion: Emotion,
    pub mouth: Mouth,
    pub being_eaten: Option<BeingEaten>,
    /// Vertical scale (1 = round, lower = ducked)
    pub squash_y: f32,
    pub squash_target: f32,
    pub hold: Option<Hold>,
    /// Remaining attack window (seconds)
    pub attack_t: f32,
    pub bite: Option<Bite>,
    /// Wing flap phase in [0, 1)
    pub wing_t: f32,
    pub grounded: bool,
}

impl Player {
    pub fn new(x: f32, ground_y: f32, grow: &Grow) -> Self {
        let mut player = Self {
            pos: Vec2::new(x, 0.0),
            vy: 0.0,
            r: grow.base_r,
            base_r: grow.base_r,
            max_r: grow.max_r,
            alive: true,
            emotion: Emotion::Neutral,
            mouth: Mouth::default(),
            being_eaten: None,
            squash_y: 1.0,
            squash_target: 1.0,
            hold: None,
            attack_t: 0.0,
            bite: None,
            wing_t: 0.0,
            grounded: false,
        };
        player.reset(x, ground_y, grow.base_r);
        player
    }

    /// Respawn standing on the ground with radius `r`
    pub fn reset(&mut self, x: f32, ground_y: f32, r: f32) {
        self.r = clamp(r, self.base_r, self.max_r);
        self.alive = true;
        self.vy = 0.0;
        self.squash_y = 1.0;
        self.squash_target = 1.0;
        self.pos = Vec2::new(x, ground_y - self.r);
        self.emotion = Emotion::Neutral;
        self.mouth = Mouth::default();
        self.being_eaten = None;
        self.hold = None;
        self.attack_t = 0.0;
        self.bite = None;
        self.wing_t = 0.0;
        self.grounded = false;
    }

    /// Lowest y the center may reach
    pub fn floor(&self, ground_y: f32) -> f32 {
        ground_y - self.r * self.squash_y
    }

    pub fn clamp_to_floor(&mut self, ground_y: f32) {
        let floor = self.floor(ground_y);
        if self.pos.y > floor {
            self.pos.y = floor;
        }
    }

    /// Not dead and not already in something's mouth
    pub fn is_catchable(&self) -> bool {
        self.alive && self.being_eaten.is_none()
    }

    pub fn attack_active(&self) -> bool {
        self.attack_t > 0.0
    }

    /// Grow after a meal, clamped to `[base_r, max_r]`
    pub fn grow(&mut self, amount: f32, ground_y: f32) {
        self.r = clamp(self.r + amount, self.base_r, self.max_r);
        self.clamp_to_floor(ground_y);
    }

    /// Shrink back to base size; returns true if the radius changed
    pub fn shrink_to_base(&mut self, ground_y: f32) -> bool {
        let before = self.r;
        self.r = self.base_r;
        self.clamp_to_floor(ground_y);
        let top = self.r * self.squash_y;
        if self.pos.y + top < 0.0 {
            self.pos.y = top;
            self.vy = self.vy.max(0.0);
        }
        before != self.r
    }

    /// Begin a hold; returns false if one is already running
    pub fn press(&mut self) -> bool {
        if self.hold.is_some() {
            return false;
        }
        self.hold = Some(Hold::default());
        true
    }

    /// End the current hold and apply its action
    pub fn release(&mut self, phys: &Phys, squash: &Squash) -> Release {
        let Some(hold) = self.hold.take() else {
            return Release::Ignored;
        };
        self.squash_target = 1.0;

        if hold.held <= squash.tap_secs && !hold.ducked {
            self.vy = phys.flap_vy;
            Release::Flap
        } else if hold.ducked {
            self.vy = self.vy.min(squash.stand_vy);
            self.attack_t = squash.attack_secs;
            Release::Stand
        } else {
            Release::Ignored
        }
    }

    /// Drop any hold without acting on it
    pub fn cancel_hold(&mut self) {
        self.hold = None;
        self.squash_target = 1.0;
    }

    /// Advance the hold timer; long holds become ducks
    pub fn update_hold(&mut self, dt: f32, squash: &Squash) {
        if let Some(hold) = &mut self.hold {
            hold.held += dt;
            if hold.held > squash.tap_secs {
                hold.ducked = true;
                self.squash_target = squash.duck_y;
            } else {
                self.squash_target = 1.0;
            }
        }
    }

    /// Gravity, ground bounce and the off-the-top check
    pub fn step(&mut self, dt: f32, ground_y: f32, phys: &Phys) -> Step {
        let was_grounded = self.grounded;

        self.squash_y = lerp(self.squash_y, self.squash_target, damp(SQUASH_DAMP, dt));
        self.vy += phys.gravity * dt;
        self.vy = clamp(self.vy, -phys.max_rise, phys.max_fall);
        self.pos.y += self.vy * dt;

        let floor = self.floor(ground_y);
        if self.pos.y > floor {
            self.pos.y = floor;
            self.vy *= phys.ground_bounce;
            if self.vy.abs() < phys.rest_speed {
                self.vy = 0.0;
            }
        }

        self.grounded = (self.pos.y - floor).abs() < 0.5 && self.vy.abs() < 1.0;
        let wing_speed = if self.grounded { 4.6 } else { 6.2 };
        self.wing_t = (self.wing_t + dt * wing_speed) % 1.0;

        Step {
            landed: self.grounded && !was_grounded,
            off_top: self.pos.y + self.r * self.squash_y < 0.0,
        }
    }

    /// Point the mouth at a fresh bite for a moment
    pub fn note_bite(&mut self, at: Vec2, secs: f32) {
        let dir = angle_to(self.pos, at);
        self.bite = Some(Bite { dir, t: secs });
        self.mouth.dir = dir;
    }

    /// Track the nearest prey, or hold the bite direction right after a bite
    pub fn update_aim(&mut self, dt: f32, target: Option<Vec2>) {
        if let Some(bite) = &mut self.bite {
            bite.t = (bite.t - dt).max(0.0);
            let dir = bite.dir;
            if bite.t <= 0.0 {
                self.bite = None;
            }
            self.mouth.aim(dir, dt, BITE_AIM_DAMP);
            return;
        }
        let angle = target.map(|t| angle_to(self.pos, t)).unwrap_or(0.0);
        self.mouth.aim(angle, dt, AIM_DAMP);
    }

    pub fn start_being_eaten(&mut self, eater: u32, target: Vec2) {
        self.cancel_hold();
        self.being_eaten = Some(BeingEaten {
            eater,
            t: 0.0,
            from: self.pos,
            r0: self.r,
            target,
        });
    }

    /// Advance the swallow; returns true once fully swallowed.
    ///
    /// `eater_mouth` follows the eater while it still exists.
    pub fn update_being_eaten(&mut self, dt: f32, eater_mouth: Option<Vec2>, swallow_secs: f32) -> bool {
        let Some(be) = &mut self.being_eaten else {
            return false;
        };
        if let Some(target) = eater_mouth {
            be.target = target;
        }
        be.t = clamp(be.t + dt / swallow_secs, 0.0, 1.0);
        let tt = ease_in_out(be.t);
        self.pos = be.from.lerp(be.target, tt);
        self.r = lerp(be.r0, 0.0, tt);

        if be.t >= 1.0 {
            self.being_eaten = None;
            self.alive = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    const GROUND: f32 = 460.0;

    fn player() -> (Player, Tuning) {
        let t = Tuning::default();
        (Player::new(160.0, GROUND, &t.grow), t)
    }

    #[test]
    fn test_spawns_on_ground() {
        let (p, _) = player();
        assert_eq!(p.pos.y, GROUND - 18.0);
        assert!(p.is_catchable());
    }

    #[test]
    fn test_tap_flaps() {
        let (mut p, t) = player();
        assert!(p.press());
        assert!(!p.press());
        p.update_hold(SIM_DT, &t.squash);
        assert_eq!(p.release(&t.phys, &t.squash), Release::Flap);
        assert_eq!(p.vy, t.phys.flap_vy);
        assert!(!p.attack_active());
    }

    #[test]
    fn test_hold_ducks_then_stands_with_attack() {
        let (mut p, t) = player();
        p.press();
        for _ in 0..12 {
            p.update_hold(SIM_DT, &t.squash);
        }
        assert_eq!(p.squash_target, t.squash.duck_y);
        assert_eq!(p.release(&t.phys, &t.squash), Release::Stand);
        assert_eq!(p.vy, t.squash.stand_vy);
        assert!(p.attack_active());
        assert_eq!(p.squash_target, 1.0);
    }

    #[test]
    fn test_release_without_press() {
        let (mut p, t) = player();
        assert_eq!(p.release(&t.phys, &t.squash), Release::Ignored);
    }

    #[test]
    fn test_ground_bounce_settles() {
        let (mut p, t) = player();
        p.pos.y = 200.0;
        let mut landed = 0;
        for _ in 0..240 {
            if p.step(SIM_DT, GROUND, &t.phys).landed {
                landed += 1;
            }
        }
        assert_eq!(landed, 1);
        assert!(p.grounded);
        assert_eq!(p.vy, 0.0);
        assert!((p.pos.y - (GROUND - p.r)).abs() < 0.01);
    }

    #[test]
    fn test_fall_speed_capped() {
        let (mut p, t) = player();
        p.pos.y = -5000.0;
        for _ in 0..120 {
            p.step(SIM_DT, 1e6, &t.phys);
        }
        assert!(p.vy <= t.phys.max_fall);
    }

    #[test]
    fn test_flying_off_top() {
        let (mut p, t) = player();
        p.pos.y = 0.0;
        p.vy = -1500.0;
        let step = p.step(SIM_DT, GROUND, &t.phys);
        assert!(step.off_top);
    }

    #[test]
    fn test_grow_and_shrink_bounds() {
        let (mut p, _) = player();
        p.grow(1000.0, GROUND);
        assert_eq!(p.r, p.max_r);
        assert!(p.pos.y <= GROUND - p.r);
        assert!(p.shrink_to_base(GROUND));
        assert_eq!(p.r, p.base_r);
        assert!(!p.shrink_to_base(GROUND));
    }

    #[test]
    fn test_being_eaten_kills() {
        let (mut p, t) = player();
        p.start_being_eaten(7, Vec2::new(300.0, 300.0));
        assert!(!p.is_catchable());
        let mut done = false;
        for _ in 0..20 {
            if p.update_being_eaten(SIM_DT, None, t.eat.swallow_secs) {
                done = true;
                break;
            }
        }
        assert!(done);
        assert!(!p.alive);
        assert!(p.being_eaten.is_none());
        assert!(p.r.abs() < 1e-4);
    }

    #[test]
    fn test_bite_override_expires() {
        let (mut p, _) = player();
        p.note_bite(p.pos + Vec2::new(0.0, -50.0), 0.12);
        for _ in 0..10 {
            p.update_aim(SIM_DT, Some(p.pos + Vec2::new(50.0, 0.0)));
        }
        assert!(p.bite.is_none());
    }

    proptest! {
        #[test]
        fn prop_growth_stays_in_bounds(meals in proptest::collection::vec(0.0f32..40.0, 0..200)) {
            let (mut p, _) = player();
            for amount in meals {
                p.grow(amount, GROUND);
                prop_assert!(p.r >= p.base_r && p.r <= p.max_r);
            }
            p.shrink_to_base(GROUND);
            prop_assert_eq!(p.r, p.base_r);
        }
    }
}
