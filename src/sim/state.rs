//! Game state and core simulation types
//!
//! Everything a run needs to continue or replay deterministically lives in
//! [`GameState`], including the RNG.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::Boss;
use super::checkpoint::Checkpoints;
use super::dialogue::Dialogue;
use super::difficulty::Difficulty;
use super::hazard::Hazard;
use super::npc::Npc;
use super::outro::Outro;
use super::player::Player;
use super::powerup::PowerUp;
use super::spawn::Spawner;
use crate::hud::Sinks;
use crate::settings::GameMode;
use crate::tuning::Tuning;

/// Current phase of the game flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for a press
    Start,
    Playing,
    Paused,
    /// Death animation before respawn or game over
    Dying,
    GameOver,
    /// Story finale: intro dialogue, boss fight and outro
    Cutscene,
    StageClear,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Start => "start",
            GamePhase::Playing => "playing",
            GamePhase::Paused => "paused",
            GamePhase::Dying => "dying",
            GamePhase::GameOver => "gameover",
            GamePhase::Cutscene => "cutscene",
            GamePhase::StageClear => "stageclear",
        }
    }
}

/// Screen size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Screen y of the ground line
    pub fn ground_y(&self, ground_h: f32) -> f32 {
        self.height - ground_h
    }
}

/// Read-only per-tick context handed to the entity updates
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub tuning: &'a Tuning,
    pub dt: f32,
    /// World distance scrolled this tick
    pub scroll: f32,
    pub ground_y: f32,
    pub width: f32,
    /// Outro window: nothing may hurt the player
    pub invulnerable: bool,
}

/// Score, kills and the miss ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scoring {
    pub score: u64,
    /// Boss fight: eating and escapes leave the score alone
    pub locked: bool,
    pub kills: u32,
    pub misses: u32,
    pub missed_points: u64,
    pub deaths: u32,
}

impl Scoring {
    pub fn set(&mut self, score: u64, sinks: &mut Sinks) {
        self.score = score;
        sinks.hud.score_changed(score);
    }

    /// Award points with a "+N" popup at `at`.
    ///
    /// Does nothing while locked; the boss time bonus goes through
    /// [`set`](Self::set) instead.
    pub fn add(&mut self, points: u32, at: Vec2, sinks: &mut Sinks) {
        if points == 0 || self.locked {
            return;
        }
        self.set(self.score + u64::from(points), sinks);
        sinks.hud.pop_text(&format!("+{}", points), at);
    }

    /// Take points away for an escaped creature.
    ///
    /// Returns false when nothing was deducted (zero points or locked);
    /// the score saturates at zero.
    pub fn deduct(&mut self, points: u32, at: Vec2, sinks: &mut Sinks) -> bool {
        if points == 0 || self.locked {
            return false;
        }
        self.misses += 1;
        self.missed_points += u64::from(points);
        self.set(self.score.saturating_sub(u64::from(points)), sinks);
        sinks.hud.pop_text(&format!("-{}", points), at);
        true
    }
}

/// Hearts and continues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lives {
    pub half: u32,
    pub coins: u32,
    /// Countdown in `Dying`
    pub death_delay: f32,
    /// Countdown after a continue is spent
    pub resume_t: Option<f32>,
    /// Out of coins; the next advance refills them
    pub insert_mode: bool,
}

impl Lives {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            half: tuning.lives.max_half,
            coins: tuning.lives.continues,
            death_delay: 0.0,
            resume_t: None,
            insert_mode: false,
        }
    }
}

/// Boss fight bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossFight {
    pub boss: Boss,
    /// Health bar visible, i.e. the fight is on
    pub active: bool,
    /// Seconds spent fighting, for the time bonus
    pub timer: f32,
    pub timer_running: bool,
    pub bonus_awarded: bool,
    /// Last death happened during the fight
    pub died_in: bool,
}

impl BossFight {
    pub fn new(tuning: &Tuning, r: f32) -> Self {
        Self {
            boss: Boss::new(&tuning.boss, r),
            active: false,
            timer: 0.0,
            timer_running: false,
            bonus_awarded: false,
            died_in: false,
        }
    }
}

/// Story finish: auto-run to the right edge while the world fades
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FinishExit {
    pub fade_t: f32,
    /// Entities were cleared at the end of the fade
    pub cleared: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub seed: u64,
    pub mode: GameMode,
    pub viewport: Viewport,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Phase to return to when unpausing
    pub paused_from: Option<GamePhase>,
    pub time_ticks: u64,

    /// World distance scrolled this run
    pub scroll_x: f32,
    pub player: Player,
    pub npcs: Vec<Npc>,
    pub hazards: Vec<Hazard>,
    pub powerups: Vec<PowerUp>,
    pub spawner: Spawner,
    pub difficulty: Difficulty,
    pub scoring: Scoring,
    pub lives: Lives,
    pub checkpoints: Checkpoints,
    pub fight: BossFight,
    pub outro: Option<Outro>,
    pub dialogue: Option<Dialogue>,
    pub finish: Option<FinishExit>,
    /// Remaining time on the "checkpoint" toast
    pub toast_t: f32,

    next_id: u32,
}

impl GameState {
    /// Fresh state on the title screen
    pub fn new(seed: u64, mode: GameMode, viewport: Viewport, tuning: &Tuning) -> Self {
        let ground_y = viewport.ground_y(tuning.world.ground_h);
        let player = Player::new(tuning.world.player_x, ground_y, &tuning.grow);
        let checkpoints = Checkpoints::new(&tuning.level, viewport.width, player.base_r);
        Self {
            seed,
            mode,
            viewport,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Start,
            paused_from: None,
            time_ticks: 0,
            scroll_x: 0.0,
            fight: BossFight::new(tuning, player.base_r),
            player,
            npcs: Vec::new(),
            hazards: Vec::new(),
            powerups: Vec::new(),
            spawner: Spawner::default(),
            difficulty: Difficulty::new(tuning),
            scoring: Scoring::default(),
            lives: Lives::new(tuning),
            checkpoints,
            outro: None,
            dialogue: None,
            finish: None,
            toast_t: 0.0,
            next_id: 1,
        }
    }

    /// Get next entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn ground_y(&self, tuning: &Tuning) -> f32 {
        self.viewport.ground_y(tuning.world.ground_h)
    }

    pub fn is_arcade(&self) -> bool {
        self.mode == GameMode::Arcade
    }

    /// Drop every creature, bomb and star plus any trail in progress
    pub fn clear_entities(&mut self) {
        self.npcs.clear();
        self.hazards.clear();
        self.powerups.clear();
        self.spawner.trail = None;
    }

    /// Difficulty reset shared by new runs and respawns
    pub fn calm_down(&mut self, tuning: &Tuning) {
        self.difficulty.reset(tuning);
        self.spawner.gate.reset();
        self.scoring.misses = 0;
        self.scoring.missed_points = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sinks() -> Sinks {
        Sinks::default()
    }

    #[test]
    fn test_new_state_is_idle() {
        let t = Tuning::default();
        let s = GameState::new(1, GameMode::Story, Viewport::new(960.0, 540.0), &t);
        assert_eq!(s.phase, GamePhase::Start);
        assert_eq!(s.ground_y(&t), 460.0);
        assert_eq!(s.player.pos.y, 460.0 - 18.0);
        assert_eq!(s.lives.half, 8);
        assert_eq!(s.fight.boss.hp, 4);
        assert!(s.npcs.is_empty());
    }

    #[test]
    fn test_entity_ids_increase() {
        let t = Tuning::default();
        let mut s = GameState::new(1, GameMode::Story, Viewport::new(960.0, 540.0), &t);
        let a = s.next_entity_id();
        let b = s.next_entity_id();
        assert!(b > a);
    }

    #[test]
    fn test_deduct_saturates_and_counts() {
        let mut sc = Scoring::default();
        let mut sk = sinks();
        sc.add(3, Vec2::ZERO, &mut sk);
        assert!(sc.deduct(5, Vec2::ZERO, &mut sk));
        assert_eq!(sc.score, 0);
        assert_eq!(sc.misses, 1);
        assert_eq!(sc.missed_points, 5);
        assert!(!sc.deduct(0, Vec2::ZERO, &mut sk));
        assert_eq!(sc.misses, 1);
    }

    #[test]
    fn test_locked_score_does_not_move() {
        let mut sc = Scoring {
            score: 40,
            locked: true,
            ..Default::default()
        };
        let mut sk = sinks();
        assert!(!sc.deduct(7, Vec2::ZERO, &mut sk));
        assert_eq!(sc.score, 40);
        sc.add(2, Vec2::ZERO, &mut sk);
        assert_eq!(sc.score, 40);
        assert_eq!(sc.misses, 0);

        // Only a direct set gets through
        sc.set(1040, &mut sk);
        assert_eq!(sc.score, 1040);
    }
}
