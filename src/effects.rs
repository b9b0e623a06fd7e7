//! Visual effect triggers
//!
//! The simulation never owns particles. It fires these fire-and-forget
//! triggers at state transitions and a renderer (or the log) decides what
//! to draw.

use glam::Vec2;

/// Color scheme for shatter effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Player,
    Npc,
    Boss,
}

pub trait EffectsSink {
    /// Radial particle burst (spawns, deaths, bomb detonations)
    fn burst(&mut self, _pos: Vec2, _duration: f32) {}
    /// Short streak burst (bomb hits, boss hits)
    fn line_burst(&mut self, _pos: Vec2, _scale: f32, _duration: f32) {}
    /// Body breaking into pieces
    fn shatter(&mut self, _pos: Vec2, _radius: f32, _palette: Palette) {}
    /// Star-shrink sparkle ring
    fn sparkles(&mut self, _pos: Vec2, _radius: f32, _count: u32) {}
    /// Dust kicked up on landing
    fn dust_puff(&mut self, _pos: Vec2, _radius: f32) {}
}

/// Drops every trigger
#[derive(Debug, Default)]
pub struct NullEffects;

impl EffectsSink for NullEffects {}

/// Logs triggers at trace level
#[derive(Debug, Default)]
pub struct LogEffects;

impl EffectsSink for LogEffects {
    fn burst(&mut self, pos: Vec2, duration: f32) {
        log::trace!("fx burst at ({:.0}, {:.0}) for {:.2}s", pos.x, pos.y, duration);
    }

    fn line_burst(&mut self, pos: Vec2, scale: f32, duration: f32) {
        log::trace!(
            "fx line burst at ({:.0}, {:.0}) x{:.2} for {:.2}s",
            pos.x,
            pos.y,
            scale,
            duration
        );
    }

    fn shatter(&mut self, pos: Vec2, radius: f32, palette: Palette) {
        log::trace!("fx shatter {:?} r={:.1} at ({:.0}, {:.0})", palette, radius, pos.x, pos.y);
    }

    fn sparkles(&mut self, pos: Vec2, radius: f32, count: u32) {
        log::trace!("fx {} sparkles r={:.1} at ({:.0}, {:.0})", count, radius, pos.x, pos.y);
    }

    fn dust_puff(&mut self, pos: Vec2, radius: f32) {
        log::trace!("fx dust r={:.1} at ({:.0}, {:.0})", radius, pos.x, pos.y);
    }
}
