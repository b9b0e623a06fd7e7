//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Reverse-order in-place removal while iterating entity lists
//! - No rendering or platform dependencies; effects, sound and HUD go out
//!   through [`crate::hud::Sinks`]

pub mod boss;
pub mod checkpoint;
pub mod collision;
pub mod dialogue;
pub mod difficulty;
pub mod hazard;
pub mod mouth;
pub mod npc;
pub mod outro;
pub mod player;
pub mod powerup;
pub mod spawn;
pub mod state;
pub mod tick;

pub use boss::{Boss, BossIntent};
pub use checkpoint::{BossSnapshot, Checkpoints, Snapshot};
pub use collision::{can_capture, can_eat};
pub use dialogue::{Dialogue, DialogueStep, Script, Speaker};
pub use difficulty::Difficulty;
pub use hazard::{Hazard, HazardState};
pub use npc::{Npc, NpcState};
pub use outro::{Outro, OutroPhase};
pub use player::Player;
pub use powerup::{PowerUp, PowerUpState};
pub use spawn::{SpawnGate, Spawner};
pub use state::{GamePhase, GameState, Scoring, Viewport};
pub use tick::{TickInput, tick};
