//! Score, popup text and HUD visibility
//!
//! Plus [`Sinks`], the bundle of collaborators the simulation is handed once
//! at construction.

use glam::Vec2;

use crate::audio::{AudioSink, NullAudio, SoundEffect};
use crate::effects::{EffectsSink, NullEffects};

pub trait ScoreSink {
    /// Floating text such as "+5" or "SMALL!"
    fn pop_text(&mut self, _text: &str, _pos: Vec2) {}
    fn score_changed(&mut self, _score: u64) {}
    fn show_score(&mut self, _visible: bool) {}
    /// Boss health bar; `None` hides it
    fn health_bar(&mut self, _hp: Option<(u32, u32)>) {}
    /// Remaining lives in half hearts
    fn lives(&mut self, _half_hearts: u32) {}
    fn checkpoint_toast(&mut self) {}
}

#[derive(Debug, Default)]
pub struct NullScore;

impl ScoreSink for NullScore {}

/// Logs HUD changes
#[derive(Debug, Default)]
pub struct LogScore;

impl ScoreSink for LogScore {
    fn pop_text(&mut self, text: &str, pos: Vec2) {
        log::debug!("pop '{}' at ({:.0}, {:.0})", text, pos.x, pos.y);
    }

    fn score_changed(&mut self, score: u64) {
        log::trace!("score {}", score);
    }

    fn show_score(&mut self, visible: bool) {
        log::trace!("score visible: {}", visible);
    }

    fn health_bar(&mut self, hp: Option<(u32, u32)>) {
        match hp {
            Some((hp, max)) => log::debug!("boss health {}/{}", hp, max),
            None => log::trace!("boss health hidden"),
        }
    }

    fn lives(&mut self, half_hearts: u32) {
        log::debug!("lives {:.1}", half_hearts as f32 / 2.0);
    }

    fn checkpoint_toast(&mut self) {
        log::debug!("checkpoint toast");
    }
}

/// Every collaborator the simulation talks to
pub struct Sinks {
    pub effects: Box<dyn EffectsSink>,
    pub audio: Box<dyn AudioSink>,
    pub hud: Box<dyn ScoreSink>,
    /// Set by the simulation for windows where sfx must stay silent
    pub(crate) sfx_gate_closed: bool,
    /// User preference
    pub muted: bool,
}

impl Default for Sinks {
    fn default() -> Self {
        Self::new(
            Box::new(NullEffects),
            Box::new(NullAudio),
            Box::new(NullScore),
        )
    }
}

impl Sinks {
    pub fn new(
        effects: Box<dyn EffectsSink>,
        audio: Box<dyn AudioSink>,
        hud: Box<dyn ScoreSink>,
    ) -> Self {
        Self {
            effects,
            audio,
            hud,
            sfx_gate_closed: false,
            muted: false,
        }
    }

    /// Logging collaborators for headless runs
    pub fn logging() -> Self {
        Self::new(
            Box::new(crate::effects::LogEffects),
            Box::new(crate::audio::LogAudio::default()),
            Box::new(LogScore),
        )
    }

    /// Play a gameplay sfx unless muted or the gate is closed
    pub fn sfx(&mut self, sfx: SoundEffect) {
        if self.muted || self.sfx_gate_closed {
            return;
        }
        self.audio.play(sfx);
    }

    /// Play a cue that ignores the gameplay gate (cinematic cues)
    pub fn cue(&mut self, sfx: SoundEffect) {
        if self.muted {
            return;
        }
        self.audio.play(sfx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Count(Rc<RefCell<u32>>);

    impl AudioSink for Count {
        fn play(&mut self, _sfx: SoundEffect) {
            *self.0.borrow_mut() += 1;
        }
    }

    #[test]
    fn test_sfx_gate() {
        let played = Rc::new(RefCell::new(0));
        let mut sinks = Sinks::new(
            Box::new(NullEffects),
            Box::new(Count(played.clone())),
            Box::new(NullScore),
        );

        sinks.sfx(SoundEffect::Jump);
        sinks.sfx_gate_closed = true;
        sinks.sfx(SoundEffect::EatNpc);
        sinks.cue(SoundEffect::BossPop);
        assert_eq!(*played.borrow(), 2);

        sinks.muted = true;
        sinks.cue(SoundEffect::BossPop);
        assert_eq!(*played.borrow(), 2);
    }
}
