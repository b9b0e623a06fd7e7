//! Boss outro sequence
//!
//! A timed chain of phases after the killing blow: flash to white, freeze
//! the scene into a fixed pose, a barrage of explosions, the outro dialogue,
//! the boss bursting, the time bonus and a fade to the stage-clear screen.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::audio::SoundEffect;
use crate::math::{clamp, rand_between};
use crate::tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutroPhase {
    WhiteIn,
    WhiteHold,
    WhiteOut,
    Boom,
    /// Waits for the outro dialogue to finish
    Dialogue,
    Explode,
    BonusHold,
    BonusPop,
    FadeOut,
}

impl OutroPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutroPhase::WhiteIn => "white_in",
            OutroPhase::WhiteHold => "white_hold",
            OutroPhase::WhiteOut => "white_out",
            OutroPhase::Boom => "boom",
            OutroPhase::Dialogue => "dialogue",
            OutroPhase::Explode => "explode",
            OutroPhase::BonusHold => "bonus_hold",
            OutroPhase::BonusPop => "bonus_pop",
            OutroPhase::FadeOut => "fade_out",
        }
    }

    /// Timed length; `None` for phases ended by something else
    fn duration(&self, cfg: &tuning::Boss) -> Option<f32> {
        match self {
            OutroPhase::WhiteIn => Some(cfg.white_in),
            OutroPhase::WhiteHold => Some(cfg.white_hold),
            OutroPhase::WhiteOut => Some(cfg.white_out),
            OutroPhase::Boom => Some(cfg.boom),
            OutroPhase::Dialogue => None,
            OutroPhase::Explode => Some(cfg.explode),
            OutroPhase::BonusHold => Some(cfg.bonus_hold),
            OutroPhase::BonusPop => Some(cfg.bonus_pop),
            OutroPhase::FadeOut => Some(cfg.fade_out),
        }
    }
}

/// Frozen scene layout used from the end of the white hold onward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchors {
    pub player: Vec2,
    pub boss: Vec2,
    pub scroll_x: f32,
}

/// Things the game flow must do in response to a phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutroCue {
    /// Behind the white: pin player and boss into their pose
    LockScene,
    /// Behind the white: empty the world
    ClearWorld,
    StartDialogue,
    AwardBonus,
    Finished,
}

/// Output of one outro tick
#[derive(Debug, Clone, Copy, Default)]
pub struct OutroStep {
    pub cue: Option<OutroCue>,
    /// Spawn a boom puff somewhere near the boss
    pub puff: bool,
    pub sfx: Option<SoundEffect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outro {
    pub phase: OutroPhase,
    /// Seconds into the current phase
    pub t: f32,
    pub puff_t: f32,
    pub sfx_t: f32,
    pub anchors: Option<Anchors>,
    /// Boss is gone (after the explode phase starts)
    pub boss_gone: bool,
}

impl Default for Outro {
    fn default() -> Self {
        Self {
            phase: OutroPhase::WhiteIn,
            t: 0.0,
            puff_t: 0.0,
            sfx_t: 0.0,
            anchors: None,
            boss_gone: false,
        }
    }
}

impl Outro {
    pub fn new() -> Self {
        Self::default()
    }

    fn enter(&mut self, phase: OutroPhase) {
        log::debug!("outro {} -> {}", self.phase.as_str(), phase.as_str());
        self.phase = phase;
        self.t = 0.0;
    }

    /// Covered by white: the world freezes and nothing may hurt the player
    pub fn is_invulnerable(&self) -> bool {
        matches!(
            self.phase,
            OutroPhase::WhiteIn | OutroPhase::WhiteHold | OutroPhase::WhiteOut
        )
    }

    /// Past the flash: gameplay is over for good
    pub fn is_locked(&self) -> bool {
        !self.is_invulnerable()
    }

    /// White overlay opacity
    pub fn white_alpha(&self, cfg: &tuning::Boss) -> f32 {
        match self.phase {
            OutroPhase::WhiteIn => clamp(self.t / cfg.white_in.max(1e-3), 0.0, 1.0),
            OutroPhase::WhiteHold => 1.0,
            OutroPhase::WhiteOut => 1.0 - clamp(self.t / cfg.white_out.max(1e-3), 0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Black overlay opacity
    pub fn black_alpha(&self, cfg: &tuning::Boss) -> f32 {
        match self.phase {
            OutroPhase::FadeOut => clamp(self.t / cfg.fade_out.max(1e-3), 0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Dialogue over: the boss bursts
    pub fn start_finale(&mut self) {
        self.enter(OutroPhase::Explode);
        self.boss_gone = true;
    }

    pub fn advance<R: Rng + ?Sized>(&mut self, dt: f32, cfg: &tuning::Boss, rng: &mut R) -> OutroStep {
        let mut step = OutroStep::default();
        self.t += dt;

        if self.phase == OutroPhase::Boom {
            self.puff_t -= dt;
            if self.puff_t <= 0.0 {
                self.puff_t = rand_between(rng, cfg.boom_puff_min, cfg.boom_puff_max);
                step.puff = true;
            }
            self.sfx_t -= dt;
            if self.sfx_t <= 0.0 {
                self.sfx_t = rand_between(rng, cfg.boom_sfx_min, cfg.boom_sfx_max);
                step.sfx = Some(if rng.random_bool(0.5) {
                    SoundEffect::BossExplosion
                } else {
                    SoundEffect::BossPop
                });
            }
        }

        let Some(duration) = self.phase.duration(cfg) else {
            return step;
        };
        if self.t < duration {
            return step;
        }

        let (next, cue) = match self.phase {
            OutroPhase::WhiteIn => (OutroPhase::WhiteHold, None),
            OutroPhase::WhiteHold => (OutroPhase::WhiteOut, Some(OutroCue::LockScene)),
            OutroPhase::WhiteOut => (OutroPhase::Boom, Some(OutroCue::ClearWorld)),
            OutroPhase::Boom => (OutroPhase::Dialogue, Some(OutroCue::StartDialogue)),
            OutroPhase::Explode => (OutroPhase::BonusHold, None),
            OutroPhase::BonusHold => (OutroPhase::BonusPop, Some(OutroCue::AwardBonus)),
            OutroPhase::BonusPop => (OutroPhase::FadeOut, None),
            OutroPhase::FadeOut => return OutroStep {
                cue: Some(OutroCue::Finished),
                ..step
            },
            OutroPhase::Dialogue => return step,
        };
        if next == OutroPhase::Boom {
            self.puff_t = 0.0;
            self.sfx_t = 0.0;
        }
        self.enter(next);
        step.cue = cue;
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_phase_order_and_cues() {
        let cfg = tuning::Boss::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut o = Outro::new();
        let mut phases = vec![o.phase];
        let mut cues = Vec::new();

        for _ in 0..2000 {
            let step = o.advance(1.0 / 60.0, &cfg, &mut rng);
            if let Some(cue) = step.cue {
                cues.push(cue);
                if cue == OutroCue::StartDialogue {
                    o.start_finale();
                }
                if cue == OutroCue::Finished {
                    break;
                }
            }
            if phases.last() != Some(&o.phase) {
                phases.push(o.phase);
            }
        }

        assert_eq!(
            phases,
            vec![
                OutroPhase::WhiteIn,
                OutroPhase::WhiteHold,
                OutroPhase::WhiteOut,
                OutroPhase::Boom,
                OutroPhase::Explode,
                OutroPhase::BonusHold,
                OutroPhase::BonusPop,
                OutroPhase::FadeOut,
            ]
        );
        assert_eq!(
            cues,
            vec![
                OutroCue::LockScene,
                OutroCue::ClearWorld,
                OutroCue::StartDialogue,
                OutroCue::AwardBonus,
                OutroCue::Finished,
            ]
        );
    }

    #[test]
    fn test_dialogue_phase_waits() {
        let cfg = tuning::Boss::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut o = Outro {
            phase: OutroPhase::Dialogue,
            ..Default::default()
        };
        for _ in 0..600 {
            assert!(o.advance(1.0 / 60.0, &cfg, &mut rng).cue.is_none());
        }
        assert_eq!(o.phase, OutroPhase::Dialogue);
    }

    #[test]
    fn test_boom_fires_puffs_and_sfx() {
        let cfg = tuning::Boss::default();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut o = Outro {
            phase: OutroPhase::Boom,
            ..Default::default()
        };
        let (mut puffs, mut sounds) = (0, 0);
        for _ in 0..60 {
            let step = o.advance(1.0 / 60.0, &cfg, &mut rng);
            puffs += step.puff as u32;
            sounds += step.sfx.is_some() as u32;
        }
        assert!((6..=13).contains(&puffs), "puffs={puffs}");
        assert!((4..=9).contains(&sounds), "sounds={sounds}");
    }

    #[test]
    fn test_flash_windows() {
        let cfg = tuning::Boss::default();
        let mut o = Outro::new();
        assert!(o.is_invulnerable());
        assert_eq!(o.white_alpha(&cfg), 0.0);
        o.t = cfg.white_in;
        assert_eq!(o.white_alpha(&cfg), 1.0);
        o.phase = OutroPhase::Boom;
        assert!(o.is_locked());
        assert_eq!(o.white_alpha(&cfg), 0.0);
    }
}
