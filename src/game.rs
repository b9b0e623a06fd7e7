//! Frame driver
//!
//! Owns the simulation state, its tuning and collaborators, and turns
//! variable frame deltas into fixed simulation ticks.

use crate::consts::{MAX_FRAME_DT, SIM_DT};
use crate::highscores::BestScores;
use crate::hud::Sinks;
use crate::settings::Settings;
use crate::sim::{GamePhase, GameState, TickInput, tick};
use crate::tuning::Tuning;

/// Upper bound on ticks per frame
const MAX_SUBSTEPS: u32 = 4;

pub struct Game {
    pub state: GameState,
    pub tuning: Tuning,
    pub sinks: Sinks,
    pub best: BestScores,
    /// Pending input, consumed by the next tick
    pub input: TickInput,
    accumulator: f32,
    last_phase: GamePhase,
}

impl Game {
    pub fn new(settings: &Settings, tuning: Tuning, mut sinks: Sinks, best: BestScores) -> Self {
        sinks.muted = settings.mute_sfx;
        let state = GameState::new(settings.seed, settings.mode, settings.viewport, &tuning);
        let last_phase = state.phase;
        Self {
            state,
            tuning,
            sinks,
            best,
            input: TickInput::default(),
            accumulator: 0.0,
            last_phase,
        }
    }

    pub fn press(&mut self) {
        self.input.press = true;
    }

    pub fn release(&mut self) {
        self.input.release = true;
    }

    pub fn advance(&mut self) {
        self.input.advance = true;
    }

    pub fn toggle_pause(&mut self) {
        self.input.pause = true;
    }

    /// Run as many fixed ticks as `dt` covers; returns how many ran
    pub fn update(&mut self, dt: f32) -> u32 {
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    /// Exactly one fixed tick
    pub fn step(&mut self) {
        let input = self.input.clone();
        tick(&mut self.state, &input, SIM_DT, &self.tuning, &mut self.sinks);

        // Clear one-shot inputs after processing
        self.input.press = false;
        self.input.release = false;
        self.input.advance = false;
        self.input.pause = false;
        self.input.skip_boss = false;
        self.input.warp_to_finish = false;

        self.record_best();

        let phase = self.state.phase;
        if phase != self.last_phase {
            log::debug!("phase {} -> {}", self.last_phase.as_str(), phase.as_str());
            self.last_phase = phase;
        }
    }

    fn record_best(&mut self) {
        if !self.best.record(self.state.mode, self.state.scoring.score) {
            return;
        }
        if let Err(e) = self.best.save() {
            log::warn!("could not save best score: {}", e);
        }
    }

    pub fn best_score(&self) -> u64 {
        self.best.get(self.state.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> Game {
        Game::new(
            &Settings::default(),
            Tuning::default(),
            Sinks::default(),
            BestScores::new(),
        )
    }

    #[test]
    fn test_frame_delta_is_clamped() {
        let mut g = game();
        // A long hitch runs at most two ticks' worth of time
        assert_eq!(g.update(1.0), 1);
        assert_eq!(g.update(f32::NAN), 0);
        assert!(g.update(MAX_FRAME_DT) <= 2);
    }

    #[test]
    fn test_one_shot_inputs_clear() {
        let mut g = game();
        g.press();
        g.step();
        assert_eq!(g.state.phase, GamePhase::Playing);
        assert!(!g.input.press);
    }

    #[test]
    fn test_best_score_tracks_session() {
        let mut g = game();
        g.press();
        g.step();
        g.state.scoring.score = 25;
        g.step();
        assert_eq!(g.best_score(), 25);
        g.state.scoring.score = 10;
        g.step();
        assert_eq!(g.best_score(), 25);
    }
}
