//! Data-driven game balance
//!
//! Every tunable lives here, grouped the way designers think about them.
//! Overrides load from JSON (any subset of fields), and every value is
//! checked once at startup: anything non-finite, negative, inverted or out
//! of range is replaced with its shipped default and reported.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::clamp;

/// A problem found while validating tunables. Always repaired, never fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuningIssue {
    #[error("{field} is not finite ({value}), using default")]
    NotFinite { field: &'static str, value: f32 },
    #[error("{field} must not be negative ({value}), using default")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must be positive ({value}), using default")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} range is inverted ({min} > {max}), using defaults")]
    Inverted {
        field: &'static str,
        min: f32,
        max: f32,
    },
    #[error("{field} probability {value} is outside [0, 1], using default")]
    Probability { field: &'static str, value: f32 },
    #[error("{group} probabilities sum to {sum}, expected 1, using defaults")]
    Distribution { group: &'static str, sum: f32 },
    #[error("{pool} contains an empty encounter pattern, dropped")]
    EmptyPattern { pool: &'static str },
    #[error("{field} must be at least {min} ({value}), using default")]
    TooSmall {
        field: &'static str,
        value: u32,
        min: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Phys {
    pub gravity: f32,
    pub flap_vy: f32,
    pub max_fall: f32,
    /// Fastest upward speed allowed
    pub max_rise: f32,
    /// Velocity multiplier when landing
    pub ground_bounce: f32,
    /// Landing speeds below this come to rest
    pub rest_speed: f32,
}

impl Default for Phys {
    fn default() -> Self {
        Self {
            gravity: 1650.0,
            flap_vy: -560.0,
            max_fall: 900.0,
            max_rise: 2000.0,
            ground_bounce: -0.18,
            rest_speed: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Squash {
    /// Vertical squash while ducking
    pub duck_y: f32,
    /// Holds longer than this are ducks, shorter ones are taps
    pub tap_secs: f32,
    /// Upward kick when standing up out of a duck
    pub stand_vy: f32,
    /// Attack window opened by releasing a duck
    pub attack_secs: f32,
}

impl Default for Squash {
    fn default() -> Self {
        Self {
            duck_y: 0.50,
            tap_secs: 0.170,
            stand_vy: -180.0,
            attack_secs: 0.18,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct World {
    pub base_speed: f32,
    pub max_speed: f32,
    pub ground_h: f32,
    /// Fixed screen x of the player
    pub player_x: f32,
}

impl Default for World {
    fn default() -> Self {
        Self {
            base_speed: 320.0,
            max_speed: 520.0,
            ground_h: 80.0,
            player_x: 160.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Eat {
    /// Eater radius must be at least `(1 + margin)` times the prey radius
    pub margin: f32,
    pub capture_pad: f32,
    pub swallow_secs: f32,
    /// Lookahead beyond the capture radius for expressions
    pub intent_dist: f32,
    /// How far behind the player's x an entity may still be caught
    pub behind_tolerance: f32,
    /// Player looks scared when a danger is this close
    pub fear_dist: f32,
}

impl Default for Eat {
    fn default() -> Self {
        Self {
            margin: 0.10,
            capture_pad: 10.0,
            swallow_secs: 0.16,
            intent_dist: 180.0,
            behind_tolerance: 10.0,
            fear_dist: 220.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Score {
    pub min: u32,
    pub max: u32,
    /// Points per pixel of radius divisor
    pub radius_div: f32,
}

impl Default for Score {
    fn default() -> Self {
        Self {
            min: 1,
            max: 25,
            radius_div: 6.0,
        }
    }
}

impl Score {
    pub fn points_for_radius(&self, r: f32) -> u32 {
        let pts = (r / self.radius_div).round();
        clamp(pts, self.min as f32, self.max as f32) as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Grow {
    pub base_step: f32,
    pub radius_div: f32,
    pub step_min: f32,
    pub step_max: f32,
    pub base_r: f32,
    pub max_r: f32,
}

impl Default for Grow {
    fn default() -> Self {
        Self {
            base_step: 3.0,
            radius_div: 7.0,
            step_min: 1.0,
            step_max: 10.0,
            base_r: 18.0,
            max_r: 72.0,
        }
    }
}

impl Grow {
    /// Growth gained by swallowing prey of radius `r`
    pub fn step_for_radius(&self, r: f32) -> f32 {
        self.base_step + clamp((r / self.radius_div).round(), self.step_min, self.step_max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Spawn {
    pub npc_min: f32,
    pub npc_max: f32,
    pub hazard_min: f32,
    pub hazard_max: f32,
    pub powerup_min: f32,
    pub powerup_max: f32,
    pub npc_retry: f32,
    pub hazard_retry: f32,
    pub powerup_retry: f32,
    /// Vertical band for placement, measured from top / from ground
    pub y_top: f32,
    pub y_ground_margin: f32,
    pub placement_tries: u32,
    pub overlap_pad: f32,
    pub npc_r_min: f32,
    pub npc_r_max: f32,
    pub hazard_r_min: f32,
    pub hazard_r_max: f32,
    pub powerup_r_min: f32,
    pub powerup_r_max: f32,
    /// Offsets past the right screen edge
    pub npc_lead: f32,
    pub danger_lead: f32,
    pub neutral_lead: f32,
    pub item_lead: f32,
    pub gate_lead: f32,
}

impl Default for Spawn {
    fn default() -> Self {
        Self {
            npc_min: 0.85,
            npc_max: 1.45,
            hazard_min: 1.40,
            hazard_max: 2.35,
            powerup_min: 3.10,
            powerup_max: 5.20,
            npc_retry: 0.05,
            hazard_retry: 0.08,
            powerup_retry: 0.10,
            y_top: 60.0,
            y_ground_margin: 40.0,
            placement_tries: 30,
            overlap_pad: 6.0,
            npc_r_min: 10.0,
            npc_r_max: 68.0,
            hazard_r_min: 12.0,
            hazard_r_max: 22.0,
            powerup_r_min: 14.0,
            powerup_r_max: 26.0,
            npc_lead: 70.0,
            danger_lead: 160.0,
            neutral_lead: 80.0,
            item_lead: 120.0,
            gate_lead: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Gap {
    pub time_easy: f32,
    pub time_hard: f32,
    pub min_px: f32,
    pub max_px: f32,
}

impl Default for Gap {
    fn default() -> Self {
        Self {
            time_easy: 0.78,
            time_hard: 0.56,
            min_px: 220.0,
            max_px: 280.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Mouth {
    pub pulse_secs: f32,
    pub min_cooldown: f32,
    /// How long a bite overrides target tracking
    pub bite_aim_secs: f32,
}

impl Default for Mouth {
    fn default() -> Self {
        Self {
            pulse_secs: 0.12,
            min_cooldown: 0.07,
            bite_aim_secs: 0.12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    pub edible_prob: f32,
    pub danger_prob: f32,
    pub neutral_prob: f32,
    /// Force an edible spawn after this many non-edible ones
    pub edible_guarantee_after: u32,
}

impl Default for Balance {
    fn default() -> Self {
        Self {
            edible_prob: 0.68,
            danger_prob: 0.26,
            neutral_prob: 0.06,
            edible_guarantee_after: 3,
        }
    }
}

/// NPC bucket: what an upcoming NPC is sized to be relative to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Edible,
    Neutral,
    Danger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Encounters {
    /// Difficulty below which the easy pool is used
    pub easy_below: f32,
    /// Difficulty below which the medium pool is used
    pub medium_below: f32,
    pub easy: Vec<Vec<Bucket>>,
    pub medium: Vec<Vec<Bucket>>,
    pub hard: Vec<Vec<Bucket>>,
}

impl Default for Encounters {
    fn default() -> Self {
        use Bucket::*;
        Self {
            easy_below: 0.35,
            medium_below: 0.75,
            easy: vec![
                vec![Edible, Edible, Danger],
                vec![Edible, Edible, Edible, Danger],
                vec![Edible, Neutral, Edible, Danger],
                vec![Edible, Edible, Neutral],
            ],
            medium: vec![
                vec![Edible, Danger, Edible],
                vec![Edible, Neutral, Danger, Edible],
                vec![Edible, Edible, Danger, Neutral],
                vec![Edible, Danger, Edible, Neutral],
            ],
            hard: vec![
                vec![Edible, Danger, Edible, Danger],
                vec![Edible, Neutral, Danger, Edible, Danger],
                vec![Edible, Danger, Neutral, Edible, Danger],
            ],
        }
    }
}

/// Difficulty tier used by tiered tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Easy,
    Medium,
    Hard,
}

impl Encounters {
    pub fn tier(&self, difficulty: f32) -> Tier {
        if difficulty < self.easy_below {
            Tier::Easy
        } else if difficulty < self.medium_below {
            Tier::Medium
        } else {
            Tier::Hard
        }
    }

    pub fn pool(&self, tier: Tier) -> &[Vec<Bucket>] {
        match tier {
            Tier::Easy => &self.easy,
            Tier::Medium => &self.medium,
            Tier::Hard => &self.hard,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Trail {
    pub prob_easy: f32,
    pub prob_mid: f32,
    pub prob_hard: f32,
    pub prob_risky_easy: f32,
    pub prob_risky_mid: f32,
    pub prob_risky_hard: f32,
    pub len_min: u32,
    pub len_max: u32,
    pub bead_dt_min: f32,
    pub bead_dt_max: f32,
    pub scale_min: f32,
    pub scale_max: f32,
    /// Anchor offset past the right screen edge
    pub lead: f32,
    /// Fraction of a bead interval's travel used as bead spacing
    pub spacing: f32,
    pub hazard_r_min: f32,
    pub hazard_r_max: f32,
    /// Radius used when picking the trail row
    pub probe_r: f32,
}

impl Default for Trail {
    fn default() -> Self {
        Self {
            prob_easy: 0.14,
            prob_mid: 0.18,
            prob_hard: 0.14,
            prob_risky_easy: 0.04,
            prob_risky_mid: 0.06,
            prob_risky_hard: 0.08,
            len_min: 4,
            len_max: 7,
            bead_dt_min: 0.18,
            bead_dt_max: 0.26,
            scale_min: 0.55,
            scale_max: 0.90,
            lead: 180.0,
            spacing: 0.92,
            hazard_r_min: 12.0,
            hazard_r_max: 20.0,
            probe_r: 56.0,
        }
    }
}

impl Trail {
    pub fn prob(&self, tier: Tier) -> f32 {
        match tier {
            Tier::Easy => self.prob_easy,
            Tier::Medium => self.prob_mid,
            Tier::Hard => self.prob_hard,
        }
    }

    pub fn risky_prob(&self, tier: Tier) -> f32 {
        match tier {
            Tier::Easy => self.prob_risky_easy,
            Tier::Medium => self.prob_risky_mid,
            Tier::Hard => self.prob_risky_hard,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Wave {
    pub period: f32,
    pub relief: f32,
    pub speed_scale: f32,
    pub trail_boost: f32,
}

impl Default for Wave {
    fn default() -> Self {
        Self {
            period: 16.0,
            relief: 3.0,
            speed_scale: 0.94,
            trail_boost: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Dda {
    pub decay: f32,
    pub bump_on_miss: f32,
    pub threshold: f32,
    pub speed_scale: f32,
    pub gap_scale: f32,
    /// Score at which score-driven difficulty saturates
    pub score_full: f32,
}

impl Default for Dda {
    fn default() -> Self {
        Self {
            decay: 0.25,
            bump_on_miss: 0.35,
            threshold: 0.3,
            speed_scale: 0.92,
            gap_scale: 1.12,
            score_full: 120.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Hazard {
    pub deflect_speed: f32,
    /// Horizontal speed floor as a fraction of `deflect_speed`
    pub min_horizontal_ratio: f32,
    pub gravity: f32,
    pub bounce_restitution: f32,
}

impl Default for Hazard {
    fn default() -> Self {
        Self {
            deflect_speed: 620.0,
            min_horizontal_ratio: 0.6,
            gravity: 900.0,
            bounce_restitution: 0.55,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Boss {
    pub hp_max: u32,
    pub jump_scale: f32,
    pub duck_secs: f32,
    pub duck_squash: f32,
    pub react_min: f32,
    pub react_max: f32,
    pub cooldown_min: f32,
    pub cooldown_max: f32,
    pub lookahead_min: f32,
    pub lookahead_max: f32,
    /// Minimum closing speed for a hazard to count as a threat
    pub threat_min_speed: f32,
    pub white_in: f32,
    pub white_hold: f32,
    pub white_out: f32,
    pub boom: f32,
    pub boom_puff_min: f32,
    pub boom_puff_max: f32,
    pub boom_sfx_min: f32,
    pub boom_sfx_max: f32,
    pub explode: f32,
    pub bonus_hold: f32,
    pub bonus_pop: f32,
    pub fade_out: f32,
    /// `(max elapsed seconds, bonus)` pairs, fastest first
    pub bonus_tiers: Vec<(f32, u64)>,
}

impl Default for Boss {
    fn default() -> Self {
        Self {
            hp_max: 4,
            jump_scale: 0.9,
            duck_secs: 0.36,
            duck_squash: 0.65,
            react_min: 0.06,
            react_max: 0.14,
            cooldown_min: 0.18,
            cooldown_max: 0.32,
            lookahead_min: 0.05,
            lookahead_max: 1.1,
            threat_min_speed: 60.0,
            white_in: 0.35,
            white_hold: 2.0,
            white_out: 0.4,
            boom: 2.1,
            boom_puff_min: 0.08,
            boom_puff_max: 0.16,
            boom_sfx_min: 0.12,
            boom_sfx_max: 0.22,
            explode: 0.7,
            bonus_hold: 1.5,
            bonus_pop: 0.9,
            fade_out: 0.9,
            bonus_tiers: vec![(120.0, 1000), (240.0, 500), (360.0, 250)],
        }
    }
}

impl Boss {
    /// Bonus for beating the boss in `elapsed` seconds
    pub fn bonus_for_time(&self, elapsed: f32) -> u64 {
        self.bonus_tiers
            .iter()
            .find(|(limit, _)| elapsed <= *limit)
            .map(|(_, bonus)| *bonus)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Level {
    pub length: f32,
    /// Checkpoint positions as fractions of `length`, ascending
    pub checkpoints: Vec<f32>,
    /// How far past the finish stop the player runs before the screen ends
    pub finish_margin: f32,
    pub finish_fade_secs: f32,
}

impl Default for Level {
    fn default() -> Self {
        Self {
            length: 20000.0,
            checkpoints: vec![0.0, 0.25, 0.5, 0.75, 1.0],
            finish_margin: 120.0,
            finish_fade_secs: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Lives {
    /// Lives counted in half hearts
    pub max_half: u32,
    pub respawn_delay: f32,
    pub continues: u32,
    pub resume_delay: f32,
    pub checkpoint_toast: f32,
}

impl Default for Lives {
    fn default() -> Self {
        Self {
            max_half: 8,
            respawn_delay: 0.45,
            continues: 5,
            resume_delay: 1.5,
            checkpoint_toast: 2.0,
        }
    }
}

/// All tunables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub phys: Phys,
    pub squash: Squash,
    pub world: World,
    pub eat: Eat,
    pub score: Score,
    pub grow: Grow,
    pub spawn: Spawn,
    pub gap: Gap,
    pub mouth: Mouth,
    pub balance: Balance,
    pub encounters: Encounters,
    pub trail: Trail,
    pub wave: Wave,
    pub dda: Dda,
    pub hazard: Hazard,
    pub boss: Boss,
    pub level: Level,
    pub lives: Lives,
}

/// Collects issues while repairing fields in place
struct Checker {
    issues: Vec<TuningIssue>,
}

impl Checker {
    fn finite(&mut self, field: &'static str, v: &mut f32, default: f32) -> bool {
        if v.is_finite() {
            return true;
        }
        self.issues.push(TuningIssue::NotFinite { field, value: *v });
        *v = default;
        false
    }

    fn non_negative(&mut self, field: &'static str, v: &mut f32, default: f32) {
        if self.finite(field, v, default) && *v < 0.0 {
            self.issues.push(TuningIssue::Negative { field, value: *v });
            *v = default;
        }
    }

    fn positive(&mut self, field: &'static str, v: &mut f32, default: f32) {
        if self.finite(field, v, default) && *v <= 0.0 {
            self.issues.push(TuningIssue::NotPositive { field, value: *v });
            *v = default;
        }
    }

    fn probability(&mut self, field: &'static str, v: &mut f32, default: f32) {
        if self.finite(field, v, default) && !(0.0..=1.0).contains(v) {
            self.issues.push(TuningIssue::Probability { field, value: *v });
            *v = default;
        }
    }

    /// Both ends non-negative and `min <= max`
    fn range(
        &mut self,
        field: &'static str,
        min: &mut f32,
        max: &mut f32,
        default_min: f32,
        default_max: f32,
    ) {
        self.non_negative(field, min, default_min);
        self.non_negative(field, max, default_max);
        if *min > *max {
            self.issues.push(TuningIssue::Inverted {
                field,
                min: *min,
                max: *max,
            });
            *min = default_min;
            *max = default_max;
        }
    }

    fn at_least(&mut self, field: &'static str, v: &mut u32, min: u32, default: u32) {
        if *v < min {
            self.issues.push(TuningIssue::TooSmall {
                field,
                value: *v,
                min,
            });
            *v = default;
        }
    }

    fn patterns(&mut self, pool: &'static str, patterns: &mut Vec<Vec<Bucket>>) {
        let before = patterns.len();
        patterns.retain(|p| !p.is_empty());
        if patterns.len() != before {
            self.issues.push(TuningIssue::EmptyPattern { pool });
        }
    }
}

impl Tuning {
    /// Parse a JSON override (missing fields keep defaults) and sanitize it
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.sanitized_logged())
    }

    /// Repair invalid values and log each issue
    pub fn sanitized_logged(self) -> Self {
        let (tuning, issues) = self.sanitized();
        for issue in &issues {
            log::warn!("tuning: {}", issue);
        }
        tuning
    }

    /// Return a repaired copy plus every issue that was fixed
    pub fn sanitized(mut self) -> (Self, Vec<TuningIssue>) {
        let d = Tuning::default();
        let mut c = Checker { issues: Vec::new() };

        // Physics
        c.positive("phys.gravity", &mut self.phys.gravity, d.phys.gravity);
        c.finite("phys.flap_vy", &mut self.phys.flap_vy, d.phys.flap_vy);
        if self.phys.flap_vy >= 0.0 {
            c.issues.push(TuningIssue::Negative {
                field: "phys.flap_vy (must point up)",
                value: self.phys.flap_vy,
            });
            self.phys.flap_vy = d.phys.flap_vy;
        }
        c.positive("phys.max_fall", &mut self.phys.max_fall, d.phys.max_fall);
        c.positive("phys.max_rise", &mut self.phys.max_rise, d.phys.max_rise);
        c.finite(
            "phys.ground_bounce",
            &mut self.phys.ground_bounce,
            d.phys.ground_bounce,
        );
        c.non_negative("phys.rest_speed", &mut self.phys.rest_speed, d.phys.rest_speed);

        c.probability("squash.duck_y", &mut self.squash.duck_y, d.squash.duck_y);
        c.positive("squash.tap_secs", &mut self.squash.tap_secs, d.squash.tap_secs);
        c.finite("squash.stand_vy", &mut self.squash.stand_vy, d.squash.stand_vy);
        c.positive(
            "squash.attack_secs",
            &mut self.squash.attack_secs,
            d.squash.attack_secs,
        );

        // World
        c.range(
            "world.speed",
            &mut self.world.base_speed,
            &mut self.world.max_speed,
            d.world.base_speed,
            d.world.max_speed,
        );
        c.non_negative("world.ground_h", &mut self.world.ground_h, d.world.ground_h);
        c.non_negative("world.player_x", &mut self.world.player_x, d.world.player_x);

        // Eating
        c.non_negative("eat.margin", &mut self.eat.margin, d.eat.margin);
        c.non_negative("eat.capture_pad", &mut self.eat.capture_pad, d.eat.capture_pad);
        c.positive("eat.swallow_secs", &mut self.eat.swallow_secs, d.eat.swallow_secs);
        c.non_negative("eat.intent_dist", &mut self.eat.intent_dist, d.eat.intent_dist);
        c.non_negative(
            "eat.behind_tolerance",
            &mut self.eat.behind_tolerance,
            d.eat.behind_tolerance,
        );
        c.non_negative("eat.fear_dist", &mut self.eat.fear_dist, d.eat.fear_dist);

        c.positive("score.radius_div", &mut self.score.radius_div, d.score.radius_div);
        if self.score.min > self.score.max {
            c.issues.push(TuningIssue::Inverted {
                field: "score",
                min: self.score.min as f32,
                max: self.score.max as f32,
            });
            self.score.min = d.score.min;
            self.score.max = d.score.max;
        }

        c.non_negative("grow.base_step", &mut self.grow.base_step, d.grow.base_step);
        c.positive("grow.radius_div", &mut self.grow.radius_div, d.grow.radius_div);
        c.range(
            "grow.step",
            &mut self.grow.step_min,
            &mut self.grow.step_max,
            d.grow.step_min,
            d.grow.step_max,
        );
        c.positive("grow.base_r", &mut self.grow.base_r, d.grow.base_r);
        c.positive("grow.max_r", &mut self.grow.max_r, d.grow.max_r);
        if self.grow.base_r > self.grow.max_r {
            c.issues.push(TuningIssue::Inverted {
                field: "grow.radius",
                min: self.grow.base_r,
                max: self.grow.max_r,
            });
            self.grow.base_r = d.grow.base_r;
            self.grow.max_r = d.grow.max_r;
        }

        // Spawning
        let s = &mut self.spawn;
        c.range("spawn.npc", &mut s.npc_min, &mut s.npc_max, d.spawn.npc_min, d.spawn.npc_max);
        c.range(
            "spawn.hazard",
            &mut s.hazard_min,
            &mut s.hazard_max,
            d.spawn.hazard_min,
            d.spawn.hazard_max,
        );
        c.range(
            "spawn.powerup",
            &mut s.powerup_min,
            &mut s.powerup_max,
            d.spawn.powerup_min,
            d.spawn.powerup_max,
        );
        c.positive("spawn.npc_retry", &mut s.npc_retry, d.spawn.npc_retry);
        c.positive("spawn.hazard_retry", &mut s.hazard_retry, d.spawn.hazard_retry);
        c.positive("spawn.powerup_retry", &mut s.powerup_retry, d.spawn.powerup_retry);
        c.non_negative("spawn.y_top", &mut s.y_top, d.spawn.y_top);
        c.non_negative(
            "spawn.y_ground_margin",
            &mut s.y_ground_margin,
            d.spawn.y_ground_margin,
        );
        c.at_least(
            "spawn.placement_tries",
            &mut s.placement_tries,
            1,
            d.spawn.placement_tries,
        );
        c.non_negative("spawn.overlap_pad", &mut s.overlap_pad, d.spawn.overlap_pad);
        c.range(
            "spawn.npc_r",
            &mut s.npc_r_min,
            &mut s.npc_r_max,
            d.spawn.npc_r_min,
            d.spawn.npc_r_max,
        );
        c.range(
            "spawn.hazard_r",
            &mut s.hazard_r_min,
            &mut s.hazard_r_max,
            d.spawn.hazard_r_min,
            d.spawn.hazard_r_max,
        );
        c.range(
            "spawn.powerup_r",
            &mut s.powerup_r_min,
            &mut s.powerup_r_max,
            d.spawn.powerup_r_min,
            d.spawn.powerup_r_max,
        );
        c.non_negative("spawn.npc_lead", &mut s.npc_lead, d.spawn.npc_lead);
        c.non_negative("spawn.danger_lead", &mut s.danger_lead, d.spawn.danger_lead);
        c.non_negative("spawn.neutral_lead", &mut s.neutral_lead, d.spawn.neutral_lead);
        c.non_negative("spawn.item_lead", &mut s.item_lead, d.spawn.item_lead);
        c.non_negative("spawn.gate_lead", &mut s.gate_lead, d.spawn.gate_lead);

        let g = &mut self.gap;
        c.positive("gap.time_easy", &mut g.time_easy, d.gap.time_easy);
        c.positive("gap.time_hard", &mut g.time_hard, d.gap.time_hard);
        c.range("gap.px", &mut g.min_px, &mut g.max_px, d.gap.min_px, d.gap.max_px);

        c.positive("mouth.pulse_secs", &mut self.mouth.pulse_secs, d.mouth.pulse_secs);
        c.non_negative(
            "mouth.min_cooldown",
            &mut self.mouth.min_cooldown,
            d.mouth.min_cooldown,
        );
        c.non_negative(
            "mouth.bite_aim_secs",
            &mut self.mouth.bite_aim_secs,
            d.mouth.bite_aim_secs,
        );

        // Balance distribution must sum to one
        let b = &mut self.balance;
        c.probability("balance.edible_prob", &mut b.edible_prob, d.balance.edible_prob);
        c.probability("balance.danger_prob", &mut b.danger_prob, d.balance.danger_prob);
        c.probability("balance.neutral_prob", &mut b.neutral_prob, d.balance.neutral_prob);
        let sum = b.edible_prob + b.danger_prob + b.neutral_prob;
        if (sum - 1.0).abs() > 0.01 {
            c.issues.push(TuningIssue::Distribution {
                group: "balance",
                sum,
            });
            b.edible_prob = d.balance.edible_prob;
            b.danger_prob = d.balance.danger_prob;
            b.neutral_prob = d.balance.neutral_prob;
        }

        let e = &mut self.encounters;
        c.probability("encounters.easy_below", &mut e.easy_below, d.encounters.easy_below);
        c.probability(
            "encounters.medium_below",
            &mut e.medium_below,
            d.encounters.medium_below,
        );
        if e.easy_below > e.medium_below {
            c.issues.push(TuningIssue::Inverted {
                field: "encounters.tiers",
                min: e.easy_below,
                max: e.medium_below,
            });
            e.easy_below = d.encounters.easy_below;
            e.medium_below = d.encounters.medium_below;
        }
        c.patterns("encounters.easy", &mut e.easy);
        c.patterns("encounters.medium", &mut e.medium);
        c.patterns("encounters.hard", &mut e.hard);

        let t = &mut self.trail;
        c.probability("trail.prob_easy", &mut t.prob_easy, d.trail.prob_easy);
        c.probability("trail.prob_mid", &mut t.prob_mid, d.trail.prob_mid);
        c.probability("trail.prob_hard", &mut t.prob_hard, d.trail.prob_hard);
        c.probability(
            "trail.prob_risky_easy",
            &mut t.prob_risky_easy,
            d.trail.prob_risky_easy,
        );
        c.probability(
            "trail.prob_risky_mid",
            &mut t.prob_risky_mid,
            d.trail.prob_risky_mid,
        );
        c.probability(
            "trail.prob_risky_hard",
            &mut t.prob_risky_hard,
            d.trail.prob_risky_hard,
        );
        c.at_least("trail.len_min", &mut t.len_min, 1, d.trail.len_min);
        if t.len_min > t.len_max {
            c.issues.push(TuningIssue::Inverted {
                field: "trail.len",
                min: t.len_min as f32,
                max: t.len_max as f32,
            });
            t.len_min = d.trail.len_min;
            t.len_max = d.trail.len_max;
        }
        c.range(
            "trail.bead_dt",
            &mut t.bead_dt_min,
            &mut t.bead_dt_max,
            d.trail.bead_dt_min,
            d.trail.bead_dt_max,
        );
        c.range(
            "trail.scale",
            &mut t.scale_min,
            &mut t.scale_max,
            d.trail.scale_min,
            d.trail.scale_max,
        );
        c.non_negative("trail.lead", &mut t.lead, d.trail.lead);
        c.positive("trail.spacing", &mut t.spacing, d.trail.spacing);
        c.range(
            "trail.hazard_r",
            &mut t.hazard_r_min,
            &mut t.hazard_r_max,
            d.trail.hazard_r_min,
            d.trail.hazard_r_max,
        );
        c.positive("trail.probe_r", &mut t.probe_r, d.trail.probe_r);

        let w = &mut self.wave;
        c.positive("wave.period", &mut w.period, d.wave.period);
        c.non_negative("wave.relief", &mut w.relief, d.wave.relief);
        if w.relief > w.period {
            c.issues.push(TuningIssue::Inverted {
                field: "wave.relief/period",
                min: w.relief,
                max: w.period,
            });
            w.period = d.wave.period;
            w.relief = d.wave.relief;
        }
        c.positive("wave.speed_scale", &mut w.speed_scale, d.wave.speed_scale);
        c.probability("wave.trail_boost", &mut w.trail_boost, d.wave.trail_boost);

        let a = &mut self.dda;
        c.non_negative("dda.decay", &mut a.decay, d.dda.decay);
        c.probability("dda.bump_on_miss", &mut a.bump_on_miss, d.dda.bump_on_miss);
        c.probability("dda.threshold", &mut a.threshold, d.dda.threshold);
        if a.threshold >= 1.0 {
            c.issues.push(TuningIssue::Probability {
                field: "dda.threshold (must be below 1)",
                value: a.threshold,
            });
            a.threshold = d.dda.threshold;
        }
        c.positive("dda.speed_scale", &mut a.speed_scale, d.dda.speed_scale);
        c.positive("dda.gap_scale", &mut a.gap_scale, d.dda.gap_scale);
        c.positive("dda.score_full", &mut a.score_full, d.dda.score_full);

        let h = &mut self.hazard;
        c.positive("hazard.deflect_speed", &mut h.deflect_speed, d.hazard.deflect_speed);
        c.probability(
            "hazard.min_horizontal_ratio",
            &mut h.min_horizontal_ratio,
            d.hazard.min_horizontal_ratio,
        );
        c.non_negative("hazard.gravity", &mut h.gravity, d.hazard.gravity);
        c.probability(
            "hazard.bounce_restitution",
            &mut h.bounce_restitution,
            d.hazard.bounce_restitution,
        );

        let bo = &mut self.boss;
        c.at_least("boss.hp_max", &mut bo.hp_max, 1, d.boss.hp_max);
        c.positive("boss.jump_scale", &mut bo.jump_scale, d.boss.jump_scale);
        c.non_negative("boss.duck_secs", &mut bo.duck_secs, d.boss.duck_secs);
        c.probability("boss.duck_squash", &mut bo.duck_squash, d.boss.duck_squash);
        c.range(
            "boss.react",
            &mut bo.react_min,
            &mut bo.react_max,
            d.boss.react_min,
            d.boss.react_max,
        );
        c.range(
            "boss.cooldown",
            &mut bo.cooldown_min,
            &mut bo.cooldown_max,
            d.boss.cooldown_min,
            d.boss.cooldown_max,
        );
        c.range(
            "boss.lookahead",
            &mut bo.lookahead_min,
            &mut bo.lookahead_max,
            d.boss.lookahead_min,
            d.boss.lookahead_max,
        );
        c.non_negative(
            "boss.threat_min_speed",
            &mut bo.threat_min_speed,
            d.boss.threat_min_speed,
        );
        for (field, v, dv) in [
            ("boss.white_in", &mut bo.white_in, d.boss.white_in),
            ("boss.white_hold", &mut bo.white_hold, d.boss.white_hold),
            ("boss.white_out", &mut bo.white_out, d.boss.white_out),
            ("boss.boom", &mut bo.boom, d.boss.boom),
            ("boss.explode", &mut bo.explode, d.boss.explode),
            ("boss.bonus_hold", &mut bo.bonus_hold, d.boss.bonus_hold),
            ("boss.bonus_pop", &mut bo.bonus_pop, d.boss.bonus_pop),
            ("boss.fade_out", &mut bo.fade_out, d.boss.fade_out),
        ] {
            c.non_negative(field, v, dv);
        }
        c.range(
            "boss.boom_puff",
            &mut bo.boom_puff_min,
            &mut bo.boom_puff_max,
            d.boss.boom_puff_min,
            d.boss.boom_puff_max,
        );
        c.range(
            "boss.boom_sfx",
            &mut bo.boom_sfx_min,
            &mut bo.boom_sfx_max,
            d.boss.boom_sfx_min,
            d.boss.boom_sfx_max,
        );
        // Puff/sfx timers of zero would loop forever within one tick
        if bo.boom_puff_min <= 0.0 {
            c.issues.push(TuningIssue::NotPositive {
                field: "boss.boom_puff_min",
                value: bo.boom_puff_min,
            });
            bo.boom_puff_min = d.boss.boom_puff_min;
            bo.boom_puff_max = bo.boom_puff_max.max(bo.boom_puff_min);
        }
        if bo.boom_sfx_min <= 0.0 {
            c.issues.push(TuningIssue::NotPositive {
                field: "boss.boom_sfx_min",
                value: bo.boom_sfx_min,
            });
            bo.boom_sfx_min = d.boss.boom_sfx_min;
            bo.boom_sfx_max = bo.boom_sfx_max.max(bo.boom_sfx_min);
        }
        let tiers_sorted = bo
            .bonus_tiers
            .windows(2)
            .all(|w| w[0].0 <= w[1].0 && w[0].1 >= w[1].1);
        let tiers_finite = bo.bonus_tiers.iter().all(|(t, _)| t.is_finite() && *t >= 0.0);
        if !tiers_sorted || !tiers_finite {
            c.issues.push(TuningIssue::Inverted {
                field: "boss.bonus_tiers",
                min: bo.bonus_tiers.first().map(|t| t.0).unwrap_or(0.0),
                max: bo.bonus_tiers.last().map(|t| t.0).unwrap_or(0.0),
            });
            bo.bonus_tiers = d.boss.bonus_tiers.clone();
        }

        let l = &mut self.level;
        c.positive("level.length", &mut l.length, d.level.length);
        let cps_ok = !l.checkpoints.is_empty()
            && l.checkpoints.iter().all(|f| f.is_finite() && (0.0..=1.0).contains(f))
            && l.checkpoints.windows(2).all(|w| w[0] <= w[1]);
        if !cps_ok {
            c.issues.push(TuningIssue::Inverted {
                field: "level.checkpoints",
                min: l.checkpoints.first().copied().unwrap_or(0.0),
                max: l.checkpoints.last().copied().unwrap_or(0.0),
            });
            l.checkpoints = d.level.checkpoints.clone();
        }
        c.non_negative("level.finish_margin", &mut l.finish_margin, d.level.finish_margin);
        c.positive(
            "level.finish_fade_secs",
            &mut l.finish_fade_secs,
            d.level.finish_fade_secs,
        );

        let lv = &mut self.lives;
        c.at_least("lives.max_half", &mut lv.max_half, 1, d.lives.max_half);
        c.non_negative("lives.respawn_delay", &mut lv.respawn_delay, d.lives.respawn_delay);
        c.non_negative("lives.resume_delay", &mut lv.resume_delay, d.lives.resume_delay);
        c.non_negative(
            "lives.checkpoint_toast",
            &mut lv.checkpoint_toast,
            d.lives.checkpoint_toast,
        );

        (self, c.issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_clean() {
        let (_, issues) = Tuning::default().sanitized();
        assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
    }

    #[test]
    fn test_nan_is_repaired() {
        let mut t = Tuning::default();
        t.phys.gravity = f32::NAN;
        let (t, issues) = t.sanitized();
        assert_eq!(t.phys.gravity, 1650.0);
        assert!(matches!(issues[0], TuningIssue::NotFinite { field: "phys.gravity", .. }));
    }

    #[test]
    fn test_inverted_range_is_repaired() {
        let mut t = Tuning::default();
        t.world.base_speed = 600.0;
        t.world.max_speed = 300.0;
        let (t, issues) = t.sanitized();
        assert_eq!(t.world.base_speed, 320.0);
        assert_eq!(t.world.max_speed, 520.0);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_balance_distribution_checked() {
        let mut t = Tuning::default();
        t.balance.edible_prob = 0.9;
        let (t, issues) = t.sanitized();
        assert!((t.balance.edible_prob - 0.68).abs() < 1e-6);
        assert!(issues
            .iter()
            .any(|i| matches!(i, TuningIssue::Distribution { group: "balance", .. })));
    }

    #[test]
    fn test_negative_is_repaired() {
        let mut t = Tuning::default();
        t.eat.margin = -0.5;
        let (t, issues) = t.sanitized();
        assert!((t.eat.margin - 0.10).abs() < 1e-6);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_partial_json_override() {
        let t = Tuning::from_json(r#"{ "world": { "base_speed": 300.0 } }"#).unwrap();
        assert_eq!(t.world.base_speed, 300.0);
        assert_eq!(t.world.max_speed, 520.0);
        assert_eq!(t.eat.capture_pad, 10.0);
    }

    #[test]
    fn test_empty_pattern_dropped() {
        let mut t = Tuning::default();
        t.encounters.easy.push(Vec::new());
        let (t, issues) = t.sanitized();
        assert_eq!(t.encounters.easy.len(), 4);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_points_and_growth() {
        let t = Tuning::default();
        assert_eq!(t.score.points_for_radius(2.0), 1);
        assert_eq!(t.score.points_for_radius(30.0), 5);
        assert_eq!(t.score.points_for_radius(600.0), 25);
        // 3 + round(14/7)
        assert_eq!(t.grow.step_for_radius(14.0), 5.0);
        assert_eq!(t.grow.step_for_radius(200.0), 13.0);
    }

    #[test]
    fn test_bonus_tiers() {
        let b = Boss::default();
        assert_eq!(b.bonus_for_time(60.0), 1000);
        assert_eq!(b.bonus_for_time(120.0), 1000);
        assert_eq!(b.bonus_for_time(200.0), 500);
        assert_eq!(b.bonus_for_time(300.0), 250);
        assert_eq!(b.bonus_for_time(361.0), 0);
    }
}
