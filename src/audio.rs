//! Sound effect triggers
//!
//! Playback is best-effort and lives outside the simulation. A missing or
//! muted sink simply drops the trigger.

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Input pressed (start of a flap or duck)
    Jump,
    /// Player swallowed a creature
    EatNpc,
    /// Player swallowed a bomb
    EatBomb,
    /// Player batted a bomb away
    HitBomb,
    /// Deflected bomb touched the ground
    BombHitsGround,
    /// Deflected bomb left the screen
    BombLeaves,
    /// Player swallowed a star
    EatStar,
    /// A bigger creature swallowed the player
    NpcEatsPlayer,
    /// Player flew off the top of the screen
    PlayerOutside,
    /// Player (re)spawned
    PlayerSpawns,
    /// Story run reached the finish and switched to auto-run
    EnterAutoMode,
    /// Dialogue typewriter tick / advance
    TextTap,
    /// Boss hit pop and outro barrage
    BossPop,
    BossExplosion,
    BossBonus,
    StageCleared,
}

impl SoundEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundEffect::Jump => "jump",
            SoundEffect::EatNpc => "eat-npc",
            SoundEffect::EatBomb => "eat-bomb",
            SoundEffect::HitBomb => "hit-bomb",
            SoundEffect::BombHitsGround => "bomb-hits-ground",
            SoundEffect::BombLeaves => "bomb-leaves",
            SoundEffect::EatStar => "eat-star",
            SoundEffect::NpcEatsPlayer => "npc-eats-player",
            SoundEffect::PlayerOutside => "player-outside",
            SoundEffect::PlayerSpawns => "player-spawns",
            SoundEffect::EnterAutoMode => "enter-auto-mode",
            SoundEffect::TextTap => "text-tap",
            SoundEffect::BossPop => "boss-pop",
            SoundEffect::BossExplosion => "boss-explosion",
            SoundEffect::BossBonus => "boss-bonus",
            SoundEffect::StageCleared => "stage-cleared",
        }
    }
}

pub trait AudioSink {
    fn play(&mut self, _sfx: SoundEffect) {}
}

/// Silent sink
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {}

/// Logs each trigger at debug level
#[derive(Debug, Default)]
pub struct LogAudio {
    pub played: u64,
}

impl AudioSink for LogAudio {
    fn play(&mut self, sfx: SoundEffect) {
        self.played += 1;
        log::debug!("sfx {}", sfx.as_str());
    }
}
