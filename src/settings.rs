//! Run settings
//!
//! Chosen once per run: game mode, RNG seed, sfx mute, viewport and the
//! optional files the native runner reads.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{VIEW_HEIGHT, VIEW_WIDTH};
use crate::sim::Viewport;

/// Game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// Finite level with checkpoints and a boss
    #[default]
    Story,
    /// Endless run, a death restarts from scratch
    Arcade,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Story => "Story",
            GameMode::Arcade => "Arcade",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "story" | "level" => Some(GameMode::Story),
            "arcade" | "endless" => Some(GameMode::Arcade),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("unknown game mode '{0}' (expected story or arcade)")]
    UnknownMode(String),
    #[error("{flag} expects a value")]
    MissingValue { flag: String },
    #[error("{flag}: '{value}' is not a valid number")]
    BadNumber { flag: String, value: String },
    #[error("unknown argument '{0}'")]
    UnknownArg(String),
}

/// Run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub mode: GameMode,
    /// RNG seed; identical seeds and inputs replay identically
    pub seed: u64,
    /// Drop every sound trigger
    pub mute_sfx: bool,
    pub viewport: Viewport,
    /// Frames the headless runner simulates
    pub frames: u32,
    /// Tuning override file (JSON, any subset of fields)
    pub tuning_path: Option<PathBuf>,
    /// Best-score file
    pub scores_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: GameMode::Story,
            seed: 0x60BB,
            mute_sfx: false,
            viewport: Viewport::new(VIEW_WIDTH, VIEW_HEIGHT),
            frames: 60 * 60,
            tuning_path: None,
            scores_path: None,
        }
    }
}

impl Settings {
    /// Parse command-line style arguments (without the program name)
    pub fn from_args<I>(args: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut settings = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next().ok_or_else(|| SettingsError::MissingValue {
                    flag: flag.to_string(),
                })
            };
            match arg.as_str() {
                "--mode" => {
                    let v = value("--mode")?;
                    settings.mode =
                        GameMode::from_str(&v).ok_or(SettingsError::UnknownMode(v))?;
                }
                "--seed" => settings.seed = parse_num("--seed", value("--seed")?)?,
                "--frames" => settings.frames = parse_num("--frames", value("--frames")?)?,
                "--width" => settings.viewport.width = parse_num("--width", value("--width")?)?,
                "--height" => {
                    settings.viewport.height = parse_num("--height", value("--height")?)?
                }
                "--tuning" => settings.tuning_path = Some(PathBuf::from(value("--tuning")?)),
                "--scores" => settings.scores_path = Some(PathBuf::from(value("--scores")?)),
                "--mute" => settings.mute_sfx = true,
                _ => return Err(SettingsError::UnknownArg(arg)),
            }
        }

        Ok(settings)
    }
}

fn parse_num<T: std::str::FromStr>(flag: &str, value: String) -> Result<T, SettingsError> {
    value.parse().map_err(|_| SettingsError::BadNumber {
        flag: flag.to_string(),
        value,
    })
}
