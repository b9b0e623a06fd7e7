//! Bombs
//!
//! A bomb drifts with the scroll like everything else. Touching it normally
//! means swallowing it, which is always fatal, but hitting it during the
//! attack window (or from below while rising) bats it away instead. A batted
//! bomb flies ballistically, bounces once, and blows up on its next contact
//! with a creature, the boss, or the screen bounds.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Boundary, boundary_contact, can_capture, circles_overlap, reflect_velocity};
use super::npc::Npc;
use super::player::Player;
use super::state::Frame;
use crate::audio::SoundEffect;
use crate::effects::Palette;
use crate::hud::Sinks;
use crate::math::{clamp, ease_in_out, lerp};
use crate::tuning;

/// Bombs and stars are dropped this far past the left edge
pub const ITEM_DESPAWN_X: f32 = -140.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HazardState {
    Fly,
    /// Batted away; `vel` is in world space (screen motion adds the scroll)
    Deflect { vel: Vec2, bounces: u8 },
    Eaten { t: f32, from: Vec2, r0: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub id: u32,
    pub pos: Vec2,
    pub r: f32,
    pub state: HazardState,
}

impl Hazard {
    pub fn new(id: u32, pos: Vec2, r: f32) -> Self {
        Self {
            id,
            pos,
            r,
            state: HazardState::Fly,
        }
    }

    pub fn deflect_velocity(&self) -> Option<Vec2> {
        match self.state {
            HazardState::Deflect { vel, .. } => Some(vel),
            _ => None,
        }
    }
}

/// Outbound velocity for a bomb batted from `player_pos`.
///
/// Points away from the player, with the horizontal component floored so a
/// bat never sends a bomb almost straight up or down.
pub fn deflect_velocity(player_pos: Vec2, hazard_pos: Vec2, cfg: &tuning::Hazard) -> Vec2 {
    let dir = (hazard_pos - player_pos).try_normalize().unwrap_or(Vec2::X);
    let mut vel = dir * cfg.deflect_speed;
    let min_vx = cfg.deflect_speed * cfg.min_horizontal_ratio;
    if vel.x < min_vx {
        vel.x = min_vx;
    }
    vel
}

/// A deflected bomb reaching the boss
#[derive(Debug, Clone, Copy)]
pub struct BossHit {
    pub pos: Vec2,
    pub r: f32,
}

#[derive(Debug, Clone, Default)]
pub struct HazardReport {
    pub boss_hits: Vec<BossHit>,
    /// A swallowed bomb finished going down
    pub player_killed: bool,
}

/// Advance every bomb; removals happen in reverse order in place.
///
/// `boss` is the boss body (center, radius) while the fight is on.
pub fn update_hazards(
    hazards: &mut Vec<Hazard>,
    npcs: &mut Vec<Npc>,
    player: &mut Player,
    boss: Option<(Vec2, f32)>,
    kills: &mut u32,
    frame: &Frame,
    sinks: &mut Sinks,
) -> HazardReport {
    let t = frame.tuning;
    let dt = frame.dt;
    let scroll_speed = if dt > 0.0 { frame.scroll / dt } else { 0.0 };
    let mut report = HazardReport::default();

    for i in (0..hazards.len()).rev() {
        let h = &mut hazards[i];
        let mut remove = false;

        match h.state {
            HazardState::Fly => {
                h.pos.x -= frame.scroll;
                if h.pos.x < ITEM_DESPAWN_X {
                    remove = true;
                } else if player.is_catchable()
                    && can_capture(player.pos, player.r, player.squash_y, h.pos, h.r, &t.eat)
                {
                    let from_below = h.pos.y > player.pos.y && player.vy < 0.0;
                    if player.attack_active() || from_below {
                        bat(h, player, t, sinks);
                    } else if !frame.invulnerable {
                        h.state = HazardState::Eaten {
                            t: 0.0,
                            from: h.pos,
                            r0: h.r,
                        };
                        player.mouth.trigger_chomp(&t.mouth);
                        player.note_bite(h.pos, t.mouth.bite_aim_secs);
                    }
                }
            }
            HazardState::Deflect { vel, bounces } => {
                let mut vel = vel;
                vel.y += t.hazard.gravity * dt;
                h.pos.x += vel.x * dt - frame.scroll;
                h.pos.y += vel.y * dt;

                if let Some(hit) = npcs
                    .iter()
                    .rposition(|n| n.is_flying() && circles_overlap(h.pos, h.r, n.pos, n.r, 0.0))
                {
                    let n = npcs.remove(hit);
                    *kills += 1;
                    sinks.effects.burst(h.pos, 0.45);
                    sinks.effects.shatter(n.pos, n.r, Palette::Npc);
                    sinks.sfx(SoundEffect::HitBomb);
                    log::debug!("bomb {} took out creature {}", h.id, n.id);
                    remove = true;
                } else if boss.is_some_and(|(boss_pos, boss_r)| h.pos.distance(boss_pos) <= h.r + boss_r) {
                    report.boss_hits.push(BossHit { pos: h.pos, r: h.r });
                    remove = true;
                } else {
                    let screen_vel = Vec2::new(vel.x - scroll_speed, vel.y);
                    match boundary_contact(h.pos, h.r, screen_vel, frame.width, frame.ground_y) {
                        Some(contact) if bounces == 0 => {
                            let bounced = reflect_velocity(screen_vel, contact.boundary.normal())
                                * t.hazard.bounce_restitution;
                            vel = Vec2::new(bounced.x + scroll_speed, bounced.y);
                            h.pos = contact.clamped;
                            h.state = HazardState::Deflect { vel, bounces: 1 };
                            if contact.boundary == Boundary::Ground {
                                sinks.effects.dust_puff(Vec2::new(h.pos.x, frame.ground_y), h.r * 1.4);
                                sinks.sfx(SoundEffect::BombHitsGround);
                            }
                        }
                        Some(contact) => {
                            sinks.effects.burst(contact.clamped, 0.45);
                            sinks.effects.line_burst(contact.clamped, (h.r / 18.0).max(0.7), 0.16);
                            sinks.sfx(match contact.boundary {
                                Boundary::Ground => SoundEffect::BombHitsGround,
                                _ => SoundEffect::BombLeaves,
                            });
                            remove = true;
                        }
                        None => {
                            h.state = HazardState::Deflect { vel, bounces };
                        }
                    }
                }
            }
            HazardState::Eaten { .. } if player.attack_active() => {
                bat(h, player, t, sinks);
            }
            HazardState::Eaten { .. } if frame.invulnerable => {
                // Spat out harmlessly under the white flash
                remove = true;
                sinks.effects.burst(h.pos, 0.45);
                sinks.effects.line_burst(h.pos, (h.r / 18.0).max(0.7), 0.16);
                log::debug!("bomb {} fizzled in an invulnerable window", h.id);
            }
            HazardState::Eaten {
                t: ref mut swallow_t,
                from,
                r0,
            } => {
                *swallow_t = clamp(*swallow_t + dt / t.eat.swallow_secs, 0.0, 1.0);
                let tt = ease_in_out(*swallow_t);
                h.pos = from.lerp(player.pos, tt);
                h.r = lerp(r0, 0.0, tt);

                if *swallow_t >= 1.0 {
                    remove = true;
                    player.alive = false;
                    player.cancel_hold();
                    sinks.effects.burst(player.pos, 0.55);
                    sinks.effects.shatter(player.pos, player.r.max(r0), Palette::Player);
                    sinks.sfx(SoundEffect::EatBomb);
                    report.player_killed = true;
                    log::debug!("player swallowed bomb {}", h.id);
                }
            }
        }

        if remove {
            hazards.remove(i);
        }
    }

    report
}

/// Switch a bomb into its batted flight from wherever it is now
fn bat(h: &mut Hazard, player: &mut Player, t: &tuning::Tuning, sinks: &mut Sinks) {
    let vel = deflect_velocity(player.pos, h.pos, &t.hazard);
    h.state = HazardState::Deflect { vel, bounces: 0 };
    player.mouth.trigger_chomp(&t.mouth);
    sinks.effects.line_burst(h.pos, 0.8, 0.16);
    sinks.sfx(SoundEffect::HitBomb);
}

/// Slide bombs with the scroll without any interaction
pub fn drift_hazards(hazards: &mut Vec<Hazard>, scroll: f32) {
    hazards.retain_mut(|h| {
        h.pos.x -= scroll;
        h.pos.x >= ITEM_DESPAWN_X
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::tuning::Tuning;

    const GROUND: f32 = 460.0;

    fn frame(t: &Tuning) -> Frame<'_> {
        Frame {
            tuning: t,
            dt: SIM_DT,
            scroll: 0.0,
            ground_y: GROUND,
            width: 960.0,
            invulnerable: false,
        }
    }

    fn run(hazards: &mut Vec<Hazard>, p: &mut Player, boss: Option<(Vec2, f32)>, f: &Frame) -> HazardReport {
        let mut sinks = Sinks::default();
        let mut npcs = Vec::new();
        let mut kills = 0;
        update_hazards(hazards, &mut npcs, p, boss, &mut kills, f, &mut sinks)
    }

    #[test]
    fn test_plain_touch_swallows_and_kills() {
        let t = Tuning::default();
        let f = frame(&t);
        let mut p = Player::new(160.0, GROUND, &t.grow);
        let mut hazards = vec![Hazard::new(1, p.pos + Vec2::new(25.0, 0.0), 15.0)];

        run(&mut hazards, &mut p, None, &f);
        assert!(matches!(hazards[0].state, HazardState::Eaten { .. }));

        let mut killed = false;
        for _ in 0..20 {
            killed |= run(&mut hazards, &mut p, None, &f).player_killed;
        }
        assert!(killed);
        assert!(!p.alive);
        assert!(hazards.is_empty());
    }

    #[test]
    fn test_attack_window_deflects() {
        let t = Tuning::default();
        let f = frame(&t);
        let mut p = Player::new(160.0, GROUND, &t.grow);
        p.attack_t = 0.1;
        let mut hazards = vec![Hazard::new(1, p.pos + Vec2::new(25.0, -5.0), 15.0)];

        run(&mut hazards, &mut p, None, &f);
        let vel = hazards[0].deflect_velocity().unwrap();
        assert!(vel.x >= t.hazard.deflect_speed * t.hazard.min_horizontal_ratio);
        assert!(p.alive);
    }

    #[test]
    fn test_from_below_while_rising_deflects() {
        let t = Tuning::default();
        let f = frame(&t);
        let mut p = Player::new(160.0, GROUND, &t.grow);
        p.pos.y = 200.0;
        p.vy = -300.0;
        let mut hazards = vec![Hazard::new(1, p.pos + Vec2::new(5.0, 25.0), 15.0)];

        run(&mut hazards, &mut p, None, &f);
        assert!(matches!(hazards[0].state, HazardState::Deflect { bounces: 0, .. }));
    }

    #[test]
    fn test_attack_mid_swallow_redirects() {
        let t = Tuning::default();
        let f = frame(&t);
        let mut p = Player::new(160.0, GROUND, &t.grow);
        let mut hazards = vec![Hazard::new(1, p.pos + Vec2::new(25.0, 0.0), 15.0)];

        run(&mut hazards, &mut p, None, &f);
        run(&mut hazards, &mut p, None, &f);
        let shrunk = hazards[0].r;
        assert!(shrunk < 15.0);

        p.attack_t = 0.1;
        run(&mut hazards, &mut p, None, &f);
        assert!(matches!(hazards[0].state, HazardState::Deflect { .. }));
        assert_eq!(hazards[0].r, shrunk);
    }

    #[test]
    fn test_half_swallowed_bomb_fizzles_when_invulnerable() {
        let t = Tuning::default();
        let mut f = frame(&t);
        f.invulnerable = true;
        let mut p = Player::new(160.0, GROUND, &t.grow);
        let mut hazards = vec![Hazard::new(1, p.pos + Vec2::new(10.0, 0.0), 6.0)];
        hazards[0].state = HazardState::Eaten {
            t: 0.5,
            from: p.pos + Vec2::new(25.0, 0.0),
            r0: 12.0,
        };

        let report = run(&mut hazards, &mut p, None, &f);
        assert!(hazards.is_empty());
        assert!(!report.player_killed);
        assert!(p.alive);
    }

    #[test]
    fn test_bounce_once_then_explode() {
        let t = Tuning::default();
        let f = frame(&t);
        let mut p = Player::new(160.0, GROUND, &t.grow);
        let mut hazards = vec![Hazard::new(1, Vec2::new(500.0, GROUND - 11.0), 10.0)];
        hazards[0].state = HazardState::Deflect {
            vel: Vec2::new(0.0, 200.0),
            bounces: 0,
        };

        run(&mut hazards, &mut p, None, &f);
        match hazards[0].state {
            HazardState::Deflect { vel, bounces } => {
                assert_eq!(bounces, 1);
                assert!(vel.y < 0.0);
            }
            _ => panic!("expected a bounce"),
        }

        // Send it straight back into the ground
        hazards[0].pos.y = GROUND - 11.0;
        hazards[0].state = HazardState::Deflect {
            vel: Vec2::new(0.0, 200.0),
            bounces: 1,
        };
        run(&mut hazards, &mut p, None, &f);
        assert!(hazards.is_empty());
    }

    #[test]
    fn test_deflected_bomb_hits_boss() {
        let t = Tuning::default();
        let f = frame(&t);
        let mut p = Player::new(160.0, GROUND, &t.grow);
        let boss = (Vec2::new(800.0, 300.0), 30.0);
        let mut hazards = vec![Hazard::new(1, Vec2::new(760.0, 300.0), 12.0)];
        hazards[0].state = HazardState::Deflect {
            vel: Vec2::new(600.0, 0.0),
            bounces: 0,
        };

        let report = run(&mut hazards, &mut p, Some(boss), &f);
        assert_eq!(report.boss_hits.len(), 1);
        assert!(hazards.is_empty());
    }

    #[test]
    fn test_deflected_bomb_takes_out_creature() {
        let t = Tuning::default();
        let f = frame(&t);
        let mut p = Player::new(160.0, GROUND, &t.grow);
        let mut npcs = vec![Npc::new(
            7,
            Vec2::new(520.0, 200.0),
            20.0,
            3,
            true,
            &mut rand_pcg::Pcg32::new(1, 1),
        )];
        let mut hazards = vec![Hazard::new(1, Vec2::new(500.0, 200.0), 12.0)];
        hazards[0].state = HazardState::Deflect {
            vel: Vec2::new(600.0, 0.0),
            bounces: 0,
        };
        let mut kills = 0;
        let mut sinks = Sinks::default();

        update_hazards(&mut hazards, &mut npcs, &mut p, None, &mut kills, &f, &mut sinks);
        assert!(hazards.is_empty());
        assert!(npcs.is_empty());
        assert_eq!(kills, 1);
    }

    #[test]
    fn test_deflect_never_near_vertical() {
        let cfg = tuning::Hazard::default();
        let v = deflect_velocity(Vec2::new(100.0, 100.0), Vec2::new(100.0, 60.0), &cfg);
        assert!(v.x >= cfg.deflect_speed * cfg.min_horizontal_ratio);
    }
}
