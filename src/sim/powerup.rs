//! Stars: swallowing one shrinks the player back to base size

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::can_capture;
use super::hazard::ITEM_DESPAWN_X;
use super::player::Player;
use super::state::Frame;
use crate::audio::SoundEffect;
use crate::hud::Sinks;
use crate::math::{clamp, ease_in_out, lerp};

/// Orbiting speck rotation speed (rad/s)
const SPIN_SPEED: f32 = 2.4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PowerUpState {
    Fly,
    Eaten { t: f32, from: Vec2, r0: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub pos: Vec2,
    pub r: f32,
    pub state: PowerUpState,
    /// Phase of the decorative specks
    pub spin: f32,
}

impl PowerUp {
    pub fn new(id: u32, pos: Vec2, r: f32) -> Self {
        Self {
            id,
            pos,
            r,
            state: PowerUpState::Fly,
            spin: 0.0,
        }
    }
}

pub fn update_powerups(powerups: &mut Vec<PowerUp>, player: &mut Player, frame: &Frame, sinks: &mut Sinks) {
    let t = frame.tuning;
    let dt = frame.dt;

    for i in (0..powerups.len()).rev() {
        let s = &mut powerups[i];
        let mut remove = false;
        s.spin = (s.spin + dt * SPIN_SPEED) % std::f32::consts::TAU;

        match s.state {
            PowerUpState::Fly => {
                s.pos.x -= frame.scroll;
                if s.pos.x < ITEM_DESPAWN_X {
                    remove = true;
                } else if player.is_catchable()
                    && can_capture(player.pos, player.r, player.squash_y, s.pos, s.r, &t.eat)
                {
                    s.state = PowerUpState::Eaten {
                        t: 0.0,
                        from: s.pos,
                        r0: s.r,
                    };
                    player.mouth.trigger_chomp(&t.mouth);
                    player.note_bite(s.pos, t.mouth.bite_aim_secs);
                }
            }
            PowerUpState::Eaten {
                t: ref mut swallow_t,
                from,
                r0,
            } => {
                *swallow_t = clamp(*swallow_t + dt / t.eat.swallow_secs, 0.0, 1.0);
                let tt = ease_in_out(*swallow_t);
                s.pos = from.lerp(player.pos, tt);
                s.r = lerp(r0, 0.0, tt);

                if *swallow_t >= 1.0 {
                    remove = true;
                    if player.shrink_to_base(frame.ground_y) {
                        let at = Vec2::new(player.pos.x, player.pos.y - player.r - 12.0);
                        sinks.hud.pop_text("SMALL!", at);
                    }
                    sinks.effects.sparkles(player.pos, player.r, 12);
                    sinks.sfx(SoundEffect::EatStar);
                }
            }
        }

        if remove {
            powerups.remove(i);
        }
    }
}

pub fn drift_powerups(powerups: &mut Vec<PowerUp>, scroll: f32) {
    powerups.retain_mut(|s| {
        s.pos.x -= scroll;
        s.pos.x >= ITEM_DESPAWN_X
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::hud::ScoreSink;
    use crate::tuning::Tuning;
    use std::cell::RefCell;
    use std::rc::Rc;

    const GROUND: f32 = 460.0;

    struct Pops(Rc<RefCell<Vec<String>>>);

    impl ScoreSink for Pops {
        fn pop_text(&mut self, text: &str, _pos: Vec2) {
            self.0.borrow_mut().push(text.to_string());
        }
    }

    fn swallow_star(p: &mut Player, t: &Tuning) -> Vec<String> {
        let f = Frame {
            tuning: t,
            dt: SIM_DT,
            scroll: 0.0,
            ground_y: GROUND,
            width: 960.0,
            invulnerable: false,
        };
        let pops = Rc::new(RefCell::new(Vec::new()));
        let mut sinks = Sinks::new(
            Box::new(crate::effects::NullEffects),
            Box::new(crate::audio::NullAudio),
            Box::new(Pops(pops.clone())),
        );
        let mut stars = vec![PowerUp::new(1, p.pos + Vec2::new(20.0, 0.0), 14.0)];
        for _ in 0..15 {
            update_powerups(&mut stars, p, &f, &mut sinks);
        }
        assert!(stars.is_empty());
        let out = pops.borrow().clone();
        out
    }

    #[test]
    fn test_star_shrinks_to_base() {
        let t = Tuning::default();
        let mut p = Player::new(160.0, GROUND, &t.grow);
        p.grow(20.0, GROUND);
        assert_eq!(p.r, 38.0);

        let pops = swallow_star(&mut p, &t);
        assert_eq!(p.r, t.grow.base_r);
        assert_eq!(pops, vec!["SMALL!".to_string()]);
    }

    #[test]
    fn test_star_at_base_size_is_quiet() {
        let t = Tuning::default();
        let mut p = Player::new(160.0, GROUND, &t.grow);
        let pops = swallow_star(&mut p, &t);
        assert_eq!(p.r, t.grow.base_r);
        assert!(pops.is_empty());
    }
}
