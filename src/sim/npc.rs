//! Creatures: edible, neutral and dangerous
//!
//! Each creature is a small state machine: it flies with the scroll until the
//! player captures it, and then either gets swallowed or swallows the
//! player, depending on which of the two is big enough.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{can_capture, can_eat, capture_distance};
use super::mouth::{AIM_DAMP, Mouth};
use super::player::{Emotion, Player};
use super::state::{Frame, Scoring};
use super::difficulty::Difficulty;
use crate::audio::SoundEffect;
use crate::hud::Sinks;
use crate::math::{angle_to, clamp, dist, ease_in_out, lerp, rand_between};

/// Creatures eating the player are dropped this far past the left edge
const EATER_DESPAWN_X: f32 = -220.0;
/// Vertical bob speed range (px/s)
const BOB_SPEED: f32 = 12.0;
/// Misses are reported at this screen x
const MISS_TEXT_X: f32 = 40.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NpcState {
    Fly,
    /// Being swallowed by the player
    BeingEaten { t: f32, from: Vec2, r0: f32 },
    /// Swallowing the player
    EatingPlayer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub id: u32,
    pub pos: Vec2,
    pub r: f32,
    pub points: u32,
    /// Letting it escape costs points
    pub worth: bool,
    pub vy: f32,
    pub emotion: Emotion,
    pub mouth: Mouth,
    pub state: NpcState,
}

impl Npc {
    pub fn new<R: Rng + ?Sized>(id: u32, pos: Vec2, r: f32, points: u32, worth: bool, rng: &mut R) -> Self {
        Self {
            id,
            pos,
            r,
            points,
            worth,
            vy: rand_between(rng, -BOB_SPEED, BOB_SPEED),
            emotion: Emotion::Neutral,
            mouth: Mouth::default(),
            state: NpcState::Fly,
        }
    }

    pub fn is_flying(&self) -> bool {
        matches!(self.state, NpcState::Fly)
    }

    /// Where a swallowed player ends up
    pub fn mouth_point(&self) -> Vec2 {
        self.pos + Vec2::from_angle(self.mouth.dir) * self.r * 0.35
    }
}

/// Summary of one creature pass
#[derive(Debug, Clone, Copy)]
pub struct NpcReport {
    /// Distance to the closest creature able to eat the player
    pub nearest_danger: f32,
}

/// Advance every creature; removals happen in reverse order in place
pub fn update_npcs(
    npcs: &mut Vec<Npc>,
    player: &mut Player,
    scoring: &mut Scoring,
    difficulty: &mut Difficulty,
    frame: &Frame,
    sinks: &mut Sinks,
) -> NpcReport {
    let t = frame.tuning;
    let dt = frame.dt;
    let y_min = t.spawn.y_top;
    let y_max = frame.ground_y - t.spawn.y_ground_margin;
    let mut nearest_danger = f32::INFINITY;

    for i in (0..npcs.len()).rev() {
        let n = &mut npcs[i];
        let mut remove = false;

        n.mouth.aim(angle_to(n.pos, player.pos), dt, AIM_DAMP);
        n.mouth.update(dt, &t.mouth);

        match n.state {
            NpcState::Fly => {
                n.pos.x -= frame.scroll;
                n.pos.y += n.vy * dt;
                if n.pos.y < y_min || n.pos.y > y_max {
                    n.vy = -n.vy;
                }

                if n.pos.x + n.r < 0.0 {
                    if n.worth {
                        let at = Vec2::new(MISS_TEXT_X, clamp(n.pos.y, 40.0, y_max));
                        if scoring.deduct(n.points, at, sinks) {
                            difficulty.bump_stress(&t.dda);
                        }
                    }
                    remove = true;
                } else if player.is_catchable() {
                    interact(n, player, frame, &mut nearest_danger);
                }
            }
            NpcState::BeingEaten {
                t: ref mut swallow_t,
                from,
                r0,
            } => {
                *swallow_t = clamp(*swallow_t + dt / t.eat.swallow_secs, 0.0, 1.0);
                let tt = ease_in_out(*swallow_t);
                n.pos = from.lerp(player.pos, tt);
                n.r = lerp(r0, 0.0, tt);

                if *swallow_t >= 1.0 {
                    remove = true;
                    scoring.kills += 1;
                    let at = Vec2::new(player.pos.x, player.pos.y - player.r - 10.0);
                    scoring.add(n.points, at, sinks);
                    player.grow(t.grow.step_for_radius(r0), frame.ground_y);
                    sinks.sfx(SoundEffect::EatNpc);
                }
            }
            NpcState::EatingPlayer => {
                n.pos.x -= frame.scroll;
                if n.pos.x < EATER_DESPAWN_X {
                    remove = true;
                }
            }
        }

        if remove {
            npcs.remove(i);
        }
    }

    if player.is_catchable() {
        player.emotion = if nearest_danger < t.eat.fear_dist {
            Emotion::Fear
        } else {
            Emotion::Neutral
        };
    }

    NpcReport { nearest_danger }
}

/// Emotions and captures for a flying creature near a catchable player
fn interact(n: &mut Npc, player: &mut Player, frame: &Frame, nearest_danger: &mut f32) {
    let t = frame.tuning;
    let d = dist(player.pos, n.pos);
    let capture = capture_distance(player.r, player.squash_y, n.r, &t.eat);
    let player_can_eat = can_eat(player.r, n.r, t.eat.margin);
    let npc_can_eat = can_eat(n.r, player.r, t.eat.margin);

    if npc_can_eat {
        *nearest_danger = nearest_danger.min(d);
    }
    n.emotion = if player_can_eat && d < capture + t.eat.intent_dist {
        Emotion::Fear
    } else if npc_can_eat && d < capture + t.eat.intent_dist {
        Emotion::Hungry
    } else {
        Emotion::Neutral
    };

    if !can_capture(player.pos, player.r, player.squash_y, n.pos, n.r, &t.eat) {
        return;
    }
    if player_can_eat {
        n.state = NpcState::BeingEaten {
            t: 0.0,
            from: n.pos,
            r0: n.r,
        };
        n.emotion = Emotion::Fear;
        player.mouth.trigger_chomp(&t.mouth);
        player.note_bite(n.pos, t.mouth.bite_aim_secs);
    } else if npc_can_eat && !frame.invulnerable {
        n.state = NpcState::EatingPlayer;
        n.emotion = Emotion::Hungry;
        n.mouth.trigger_chomp(&t.mouth);
        player.start_being_eaten(n.id, n.mouth_point());
        log::debug!("creature {} (r={:.1}) caught the player", n.id, n.r);
    }
}

/// Slide creatures with the scroll without any interaction
pub fn drift_npcs(npcs: &mut Vec<Npc>, scroll: f32) {
    for i in (0..npcs.len()).rev() {
        npcs[i].pos.x -= scroll;
        if npcs[i].pos.x < EATER_DESPAWN_X {
            npcs.remove(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

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

    fn setup() -> (Tuning, Player, Scoring, Difficulty, Sinks, Pcg32) {
        let t = Tuning::default();
        let p = Player::new(160.0, GROUND, &t.grow);
        (t, p, Scoring::default(), Difficulty::default(), Sinks::default(), Pcg32::seed_from_u64(1))
    }

    #[test]
    fn test_small_creature_gets_eaten_and_scores() {
        let (t, mut p, mut scoring, mut diff, mut sinks, mut rng) = setup();
        let f = frame(&t);
        let mut npcs = vec![Npc::new(1, p.pos + Vec2::new(20.0, 0.0), 10.0, 2, true, &mut rng)];
        npcs[0].vy = 0.0;

        update_npcs(&mut npcs, &mut p, &mut scoring, &mut diff, &f, &mut sinks);
        assert!(matches!(npcs[0].state, NpcState::BeingEaten { .. }));
        assert!(p.mouth.is_pulsing());

        for _ in 0..12 {
            update_npcs(&mut npcs, &mut p, &mut scoring, &mut diff, &f, &mut sinks);
        }
        assert!(npcs.is_empty());
        assert_eq!(scoring.score, 2);
        assert_eq!(scoring.kills, 1);
        // 3 + round(10 / 7)
        assert_eq!(p.r, 18.0 + 4.0);
    }

    #[test]
    fn test_big_creature_eats_player() {
        let (t, mut p, mut scoring, mut diff, mut sinks, mut rng) = setup();
        let f = frame(&t);
        let mut npcs = vec![Npc::new(9, p.pos + Vec2::new(30.0, 0.0), 30.0, 0, false, &mut rng)];

        update_npcs(&mut npcs, &mut p, &mut scoring, &mut diff, &f, &mut sinks);
        assert!(matches!(npcs[0].state, NpcState::EatingPlayer));
        assert_eq!(p.being_eaten.as_ref().map(|b| b.eater), Some(9));
    }

    #[test]
    fn test_invulnerable_player_is_not_eaten() {
        let (t, mut p, mut scoring, mut diff, mut sinks, mut rng) = setup();
        let mut f = frame(&t);
        f.invulnerable = true;
        let mut npcs = vec![Npc::new(9, p.pos + Vec2::new(30.0, 0.0), 30.0, 0, false, &mut rng)];

        update_npcs(&mut npcs, &mut p, &mut scoring, &mut diff, &f, &mut sinks);
        assert!(npcs[0].is_flying());
        assert!(p.being_eaten.is_none());
    }

    #[test]
    fn test_escaped_creature_costs_points_and_stress() {
        let (t, mut p, mut scoring, mut diff, mut sinks, mut rng) = setup();
        scoring.score = 10;
        let mut f = frame(&t);
        f.scroll = 30.0;
        let mut npcs = vec![Npc::new(1, Vec2::new(12.0, 200.0), 10.0, 3, true, &mut rng)];

        update_npcs(&mut npcs, &mut p, &mut scoring, &mut diff, &f, &mut sinks);
        assert!(npcs.is_empty());
        assert_eq!(scoring.score, 7);
        assert_eq!(scoring.misses, 1);
        assert!((diff.stress - t.dda.bump_on_miss).abs() < 1e-6);
    }

    #[test]
    fn test_escape_while_locked_is_free() {
        let (t, mut p, mut scoring, mut diff, mut sinks, mut rng) = setup();
        scoring.score = 10;
        scoring.locked = true;
        let mut f = frame(&t);
        f.scroll = 30.0;
        let mut npcs = vec![Npc::new(1, Vec2::new(12.0, 200.0), 10.0, 3, true, &mut rng)];

        update_npcs(&mut npcs, &mut p, &mut scoring, &mut diff, &f, &mut sinks);
        assert_eq!(scoring.score, 10);
        assert_eq!(diff.stress, 0.0);
    }

    #[test]
    fn test_eating_while_locked_scores_nothing() {
        let (t, mut p, mut scoring, mut diff, mut sinks, mut rng) = setup();
        scoring.locked = true;
        let f = frame(&t);
        let mut npcs = vec![Npc::new(1, p.pos + Vec2::new(20.0, 0.0), 8.0, 5, true, &mut rng)];
        npcs[0].vy = 0.0;

        for _ in 0..30 {
            update_npcs(&mut npcs, &mut p, &mut scoring, &mut diff, &f, &mut sinks);
        }
        assert!(npcs.is_empty());
        assert_eq!(scoring.score, 0);
        assert_eq!(scoring.kills, 1);
        assert!(p.r > p.base_r);
    }

    #[test]
    fn test_player_fears_nearby_danger() {
        let (t, mut p, mut scoring, mut diff, mut sinks, mut rng) = setup();
        let f = frame(&t);
        let mut npcs = vec![Npc::new(1, p.pos + Vec2::new(150.0, 0.0), 40.0, 0, false, &mut rng)];

        let report = update_npcs(&mut npcs, &mut p, &mut scoring, &mut diff, &f, &mut sinks);
        assert!(report.nearest_danger < t.eat.fear_dist);
        assert_eq!(p.emotion, Emotion::Fear);
        assert_eq!(npcs[0].emotion, Emotion::Hungry);
    }
}
