//! Spawn director
//!
//! Decides what enters from the right edge, when, and where. All three
//! streams (creatures, bombs, stars) share one [`SpawnGate`], so spacing is a
//! single fairness budget rather than three independent ones.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{can_eat, circles_overlap};
use super::hazard::Hazard;
use super::npc::Npc;
use super::powerup::PowerUp;
use super::state::GameState;
use crate::math::{clamp, rand_between};
use crate::tuning::{Bucket, Tuning};

/// Cursor start value: far enough back that the first spawn always passes
const GATE_FAR_BACK: f32 = -1.0e9;
/// Step used when nudging a spawn right to clear an overlap
const NUDGE_STEP: f32 = 4.0;
const NUDGE_TRIES: u32 = 60;
/// Spawn timer value that never runs out
pub const TIMER_HALTED: f32 = 999.0;

/// World-x of the last spawn of any kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpawnGate {
    last_x: f32,
}

impl Default for SpawnGate {
    fn default() -> Self {
        Self { last_x: GATE_FAR_BACK }
    }
}

impl SpawnGate {
    pub fn last_x(&self) -> f32 {
        self.last_x
    }

    /// Enough distance has scrolled by since the last spawn
    pub fn can_spawn(&self, at_x: f32, min_gap: f32) -> bool {
        at_x - self.last_x >= min_gap
    }

    /// Record a spawn that passed [`can_spawn`](Self::can_spawn)
    pub fn claim(&mut self, at_x: f32) {
        self.last_x = at_x;
    }

    /// Move the cursor forward without a spacing check (trail beads)
    pub fn advance_to(&mut self, at_x: f32) {
        self.last_x = self.last_x.max(at_x);
    }

    pub fn reset(&mut self) {
        self.last_x = GATE_FAR_BACK;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrailKind {
    Plain,
    /// One bead in the middle is a bomb
    Risky,
}

/// A bead chain in progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trail {
    pub kind: TrailKind,
    pub remaining: u32,
    pub spawned: u32,
    /// Countdown to the next bead
    pub timer: f32,
    pub bead_dt: f32,
    /// Screen x of the first bead
    pub base_x: f32,
    pub y: f32,
    pub hazard_index: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    pub gate: SpawnGate,
    pub npc_t: f32,
    pub hazard_t: f32,
    pub powerup_t: f32,
    pub trail: Option<Trail>,
    pub queue: VecDeque<Bucket>,
    pub force_edible_next: bool,
    pub spawns_since_edible: u32,
}

impl Default for Spawner {
    fn default() -> Self {
        Self {
            gate: SpawnGate::default(),
            npc_t: 0.0,
            hazard_t: 0.0,
            powerup_t: 0.0,
            trail: None,
            queue: VecDeque::new(),
            force_edible_next: false,
            spawns_since_edible: 0,
        }
    }
}

impl Spawner {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Stop every stream until timers are primed again
    pub fn halt(&mut self) {
        self.npc_t = TIMER_HALTED;
        self.hazard_t = TIMER_HALTED;
        self.powerup_t = TIMER_HALTED;
        self.trail = None;
    }

    /// Near-immediate spawns (boss fight start)
    pub fn prime(&mut self, tuning: &Tuning) {
        self.npc_t = tuning.spawn.npc_retry;
        self.hazard_t = tuning.spawn.hazard_retry;
        self.powerup_t = tuning.spawn.powerup_retry;
    }
}

impl GameState {
    /// World x the gate measures spawns at
    fn gate_x(&self, tuning: &Tuning) -> f32 {
        self.scroll_x + self.viewport.width + tuning.spawn.gate_lead
    }

    pub fn can_spawn_now(&self, tuning: &Tuning) -> bool {
        self.spawner
            .gate
            .can_spawn(self.gate_x(tuning), self.difficulty.min_gap_px(tuning))
    }

    fn mark_spawn(&mut self, tuning: &Tuning) {
        let x = self.gate_x(tuning);
        self.spawner.gate.claim(x);
    }

    fn overlaps_existing(&self, pos: Vec2, r: f32, pad: f32) -> bool {
        let near = |p: Vec2, pr: f32| (pos.x - p.x).abs() <= r + pr + pad && circles_overlap(pos, r, p, pr, pad);
        self.npcs.iter().any(|n| near(n.pos, n.r))
            || self.hazards.iter().any(|h| near(h.pos, h.r))
            || self.powerups.iter().any(|s| near(s.pos, s.r))
    }

    /// Random height that avoids existing bodies, best effort
    fn pick_spawn_y(&mut self, x: f32, r: f32, tuning: &Tuning) -> f32 {
        let sp = &tuning.spawn;
        let y_min = sp.y_top;
        let y_max = self.ground_y(tuning) - sp.y_ground_margin;
        let mut y = rand_between(&mut self.rng, y_min, y_max);
        for _ in 0..sp.placement_tries {
            let cand = rand_between(&mut self.rng, y_min, y_max);
            if !self.overlaps_existing(Vec2::new(x, cand), r, sp.overlap_pad) {
                return cand;
            }
            y = cand;
        }
        y
    }

    /// Nudge `x` right until the body no longer overlaps anything
    fn resolve_spawn_x(&self, x: f32, y: f32, r: f32, tuning: &Tuning) -> f32 {
        let mut xx = x;
        for _ in 0..NUDGE_TRIES {
            if !self.overlaps_existing(Vec2::new(xx, y), r, tuning.spawn.overlap_pad) {
                return xx;
            }
            xx += NUDGE_STEP;
        }
        xx
    }

    /// Flying creatures that could eat the player right now
    fn danger_on_screen(&self, tuning: &Tuning) -> usize {
        self.npcs
            .iter()
            .filter(|n| n.is_flying() && can_eat(n.r, self.player.r, tuning.eat.margin))
            .count()
    }

    fn refill_encounters(&mut self, tuning: &Tuning) {
        let tier = tuning.encounters.tier(self.difficulty.level);
        let pool = tuning.encounters.pool(tier);
        if pool.is_empty() {
            let b = &tuning.balance;
            let roll: f32 = self.rng.random();
            let bucket = if roll < b.edible_prob {
                Bucket::Edible
            } else if roll < b.edible_prob + b.danger_prob {
                Bucket::Danger
            } else {
                Bucket::Neutral
            };
            self.spawner.queue.push_back(bucket);
            return;
        }
        let pattern = &pool[self.rng.random_range(0..pool.len())];
        self.spawner.queue.extend(pattern.iter().copied());
    }

    /// Next bucket from the encounter queue, after the anti-frustration rules
    pub fn next_npc_bucket(&mut self, tuning: &Tuning) -> Bucket {
        if self.spawner.force_edible_next {
            self.spawner.force_edible_next = false;
            self.spawner.trail = None;
            return Bucket::Edible;
        }

        if self.spawner.queue.is_empty() {
            self.refill_encounters(tuning);
        }
        let mut bucket = self.spawner.queue.pop_front().unwrap_or(Bucket::Edible);

        if bucket == Bucket::Danger
            && self.difficulty.level < tuning.encounters.easy_below
            && self.danger_on_screen(tuning) >= 1
        {
            bucket = Bucket::Edible;
        }
        if bucket == Bucket::Danger {
            self.spawner.force_edible_next = true;
        }
        bucket
    }

    /// Radius for a bucket, sized off the current player radius.
    ///
    /// Returns the bucket actually used: a long non-edible streak forces
    /// edible regardless of the request.
    pub fn choose_npc_radius(&mut self, bucket: Bucket, tuning: &Tuning) -> (Bucket, f32) {
        let pr = self.player.r;
        let m = tuning.eat.margin;
        let sp = &tuning.spawn;

        let bucket = if self.spawner.spawns_since_edible >= tuning.balance.edible_guarantee_after {
            Bucket::Edible
        } else {
            bucket
        };

        let eatable_max = pr / (1.0 + m) * 0.96;
        let eatable_min = sp.npc_r_min.max(pr * 0.40);
        let danger_min = pr * (1.0 + m) * 1.06;
        let danger_max = sp.npc_r_max.min(pr * 1.85);
        let neutral_min = pr / (1.0 + m) * 0.98;
        let neutral_max = pr * (1.0 + m) * 1.02;

        // Falls back to a loose band when the preferred one collapses
        let rng = &mut self.rng;
        let mut pick_in = |a: f32, b: f32, fa: f32, fb: f32| {
            if b <= a + 0.5 {
                rand_between(rng, fa, fb)
            } else {
                rand_between(rng, a, b)
            }
        };

        let r = match bucket {
            Bucket::Edible => {
                self.spawner.spawns_since_edible = 0;
                pick_in(eatable_min, eatable_max.min(62.0), sp.npc_r_min, pr.min(24.0))
            }
            Bucket::Danger => {
                self.spawner.spawns_since_edible += 1;
                pick_in(danger_min.max(14.0), danger_max, (pr * 1.15).max(22.0), (pr * 1.55).max(30.0))
            }
            Bucket::Neutral => {
                self.spawner.spawns_since_edible += 1;
                pick_in(neutral_min.max(12.0), neutral_max.min(62.0), (pr * 0.8).max(14.0), (pr * 1.05).max(18.0))
            }
        };
        (bucket, clamp(r, sp.npc_r_min, sp.npc_r_max))
    }

    pub fn spawn_npc(&mut self, tuning: &Tuning) {
        let requested = self.next_npc_bucket(tuning);
        let (bucket, r) = self.choose_npc_radius(requested, tuning);
        let sp = &tuning.spawn;

        let lead = match bucket {
            Bucket::Danger => sp.danger_lead,
            Bucket::Neutral => sp.neutral_lead,
            Bucket::Edible => 0.0,
        };
        let x = self.viewport.width + sp.npc_lead + lead;
        let y = self.pick_spawn_y(x, r, tuning);

        let worth = bucket != Bucket::Danger;
        let points = if worth { tuning.score.points_for_radius(r) } else { 0 };
        let id = self.next_entity_id();
        let npc = Npc::new(id, Vec2::new(x, y), r, points, worth, &mut self.rng);
        log::debug!("spawn {:?} creature {} r={:.1} at y={:.0}", bucket, id, r, y);
        self.npcs.push(npc);
        self.mark_spawn(tuning);
    }

    pub fn spawn_hazard(&mut self, tuning: &Tuning) {
        let sp = &tuning.spawn;
        let r = rand_between(&mut self.rng, sp.hazard_r_min, sp.hazard_r_max);
        let x = self.viewport.width + sp.item_lead;
        let y = self.pick_spawn_y(x, r, tuning);
        let id = self.next_entity_id();
        self.hazards.push(Hazard::new(id, Vec2::new(x, y), r));
        self.mark_spawn(tuning);
    }

    pub fn spawn_powerup(&mut self, tuning: &Tuning) {
        let sp = &tuning.spawn;
        let r = rand_between(&mut self.rng, sp.powerup_r_min, sp.powerup_r_max);
        let x = self.viewport.width + sp.item_lead;
        let y = self.pick_spawn_y(x, r, tuning);
        let id = self.next_entity_id();
        self.powerups.push(PowerUp::new(id, Vec2::new(x, y), r));
        self.mark_spawn(tuning);
    }

    /// Roll for a bead chain; returns true if one started
    pub fn maybe_start_trail(&mut self, tuning: &Tuning) -> bool {
        if self.spawner.trail.is_some() {
            return false;
        }
        let tr = &tuning.trail;
        let tier = tuning.encounters.tier(self.difficulty.level);
        let p_trail = self.difficulty.trail_prob(tuning);
        let p_risky = tr.risky_prob(tier);

        let roll: f32 = self.rng.random();
        if roll >= p_trail {
            return false;
        }
        let risky_roll: f32 = self.rng.random();
        let kind = if risky_roll < p_risky / p_trail.max(0.001) {
            TrailKind::Risky
        } else {
            TrailKind::Plain
        };
        let len = self.rng.random_range(tr.len_min..=tr.len_max.max(tr.len_min));
        let bead_dt = rand_between(&mut self.rng, tr.bead_dt_min, tr.bead_dt_max);
        let base_x = self.viewport.width + tr.lead;
        let y = self.pick_spawn_y(base_x, tr.probe_r, tuning);

        log::debug!("trail {:?} x{} starting at y={:.0}", kind, len, y);
        self.spawner.trail = Some(Trail {
            kind,
            remaining: len,
            spawned: 0,
            timer: 0.0,
            bead_dt,
            base_x,
            y,
            hazard_index: (kind == TrailKind::Risky).then_some(len / 2),
        });
        true
    }

    fn spawn_trail_bead(&mut self, tuning: &Tuning) {
        let Some(trail) = self.spawner.trail.clone() else {
            return;
        };
        if trail.remaining == 0 {
            return;
        }
        let tr = &tuning.trail;
        let sp = &tuning.spawn;
        let pr = self.player.r;
        let safe_max = pr / (1.0 + tuning.eat.margin) * 0.96;
        let r = clamp(
            rand_between(&mut self.rng, tr.scale_min * pr, tr.scale_max * pr),
            sp.npc_r_min,
            sp.npc_r_max.min(safe_max),
        );

        let step = self.difficulty.speed * trail.bead_dt * tr.spacing;
        let bead_x = self.resolve_spawn_x(trail.base_x + trail.spawned as f32 * step, trail.y, r, tuning);

        let id = self.next_entity_id();
        if trail.hazard_index == Some(trail.spawned) {
            let hr = rand_between(&mut self.rng, tr.hazard_r_min, tr.hazard_r_max);
            let hx = self.resolve_spawn_x(bead_x, trail.y, hr, tuning);
            self.hazards.push(Hazard::new(id, Vec2::new(hx, trail.y), hr));
        } else {
            let points = tuning.score.points_for_radius(r);
            let npc = Npc::new(id, Vec2::new(bead_x, trail.y), r, points, true, &mut self.rng);
            self.npcs.push(npc);
        }

        if let Some(active) = self.spawner.trail.as_mut() {
            active.spawned += 1;
            active.remaining -= 1;
        }
        let x = self.gate_x(tuning);
        self.spawner.gate.advance_to(x);
    }

    /// Emit any beads that are due
    pub fn update_trail(&mut self, dt: f32, tuning: &Tuning) {
        let Some(trail) = self.spawner.trail.as_mut() else {
            return;
        };
        trail.timer -= dt;

        while self.spawner.trail.as_ref().is_some_and(|t| t.timer <= 0.0) {
            self.spawn_trail_bead(tuning);
            let Some(trail) = self.spawner.trail.as_mut() else {
                break;
            };
            if trail.remaining == 0 {
                self.spawner.trail = None;
                break;
            }
            trail.timer += trail.bead_dt;
        }
    }

    /// Count the three spawn timers down and fire whatever is due.
    ///
    /// Timers only run while `running`; a due timer that finds the gate
    /// closed retries shortly instead of spawning late.
    pub fn update_spawn_timers(&mut self, dt: f32, running: bool, tuning: &Tuning) {
        let sp = &tuning.spawn;

        if running {
            self.spawner.npc_t -= dt;
        }
        if self.spawner.npc_t <= 0.0 {
            if self.can_spawn_now(tuning) {
                if !self.maybe_start_trail(tuning) {
                    self.spawn_npc(tuning);
                }
                self.spawner.npc_t = rand_between(&mut self.rng, sp.npc_min, sp.npc_max);
            } else {
                self.spawner.npc_t = sp.npc_retry;
            }
        }

        if running {
            self.spawner.hazard_t -= dt;
        }
        if self.spawner.hazard_t <= 0.0 {
            if self.can_spawn_now(tuning) {
                self.spawn_hazard(tuning);
                self.spawner.hazard_t = rand_between(&mut self.rng, sp.hazard_min, sp.hazard_max);
            } else {
                self.spawner.hazard_t = sp.hazard_retry;
            }
        }

        if running {
            self.spawner.powerup_t -= dt;
        }
        if self.spawner.powerup_t <= 0.0 {
            if self.can_spawn_now(tuning) {
                self.spawn_powerup(tuning);
                self.spawner.powerup_t = rand_between(&mut self.rng, sp.powerup_min, sp.powerup_max);
            } else {
                self.spawner.powerup_t = sp.powerup_retry;
            }
        }
    }
}
