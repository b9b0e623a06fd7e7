//! Gobbler - an eat-or-be-eaten side-scrolling arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, spawning, difficulty, boss)
//! - `tuning`: Data-driven game balance
//! - `effects` / `audio` / `hud`: Collaborator interfaces the simulation calls out to
//! - `highscores`: Best score per game mode
//! - `game`: Frame driver tying the simulation to its collaborators

pub mod audio;
pub mod effects;
pub mod game;
pub mod highscores;
pub mod hud;
pub mod math;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use game::Game;
pub use highscores::{BestScores, PersistError};
pub use hud::Sinks;
pub use settings::{GameMode, Settings};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest frame delta fed to the simulation; longer hitches are truncated
    pub const MAX_FRAME_DT: f32 = 0.033;

    /// Default viewport
    pub const VIEW_WIDTH: f32 = 960.0;
    pub const VIEW_HEIGHT: f32 = 540.0;

    /// Typewriter speed for dialogue (characters per second)
    pub const DIALOGUE_CPS: f32 = 38.0;
}
