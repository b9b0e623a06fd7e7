//! Best score per game mode
//!
//! Persisted to LocalStorage in the browser and to a small JSON file on
//! native. Persistence is best-effort: failures are logged, never fatal.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::GameMode;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("best-score file i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("best-score file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable")]
    Unavailable,
}

/// Best score for each mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestScores {
    #[serde(default)]
    pub arcade: u64,
    #[serde(default)]
    pub story: u64,
    /// Backing file (native only)
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl BestScores {
    /// LocalStorage keys (used only in wasm32)
    #[allow(dead_code)]
    const ARCADE_KEY: &'static str = "gobblerHighScoreArcade";
    #[allow(dead_code)]
    const STORY_KEY: &'static str = "gobblerHighScoreStory";
    /// Single-mode key from before story mode existed; counts as arcade
    #[allow(dead_code)]
    const LEGACY_KEY: &'static str = "gobblerHighScore";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mode: GameMode) -> u64 {
        match mode {
            GameMode::Arcade => self.arcade,
            GameMode::Story => self.story,
        }
    }

    /// Record a session score; returns true if it beat the stored best
    pub fn record(&mut self, mode: GameMode, score: u64) -> bool {
        let best = match mode {
            GameMode::Arcade => &mut self.arcade,
            GameMode::Story => &mut self.story,
        };
        if score > *best {
            *best = score;
            true
        } else {
            false
        }
    }

    /// Reset one mode's best (debug)
    pub fn clear(&mut self, mode: GameMode) {
        match mode {
            GameMode::Arcade => self.arcade = 0,
            GameMode::Story => self.story = 0,
        }
    }

    /// Load from a JSON file; a missing file yields zeroes
    pub fn load_from(path: &Path) -> Result<Self, PersistError> {
        let mut scores = match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str::<BestScores>(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::new(),
            Err(e) => return Err(e.into()),
        };
        scores.path = Some(path.to_path_buf());
        log::info!(
            "Loaded best scores (arcade {}, story {})",
            scores.arcade,
            scores.story
        );
        Ok(scores)
    }

    /// Load, falling back to zeroes with a warning
    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            log::warn!("{}; starting with empty best scores", e);
            let mut scores = Self::new();
            scores.path = Some(path.to_path_buf());
            scores
        })
    }

    /// Write to the backing file, if any
    pub fn save_to_file(&self) -> Result<(), PersistError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load best scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        let Some(storage) = storage else {
            log::info!("No storage, best scores start at zero");
            return Self::new();
        };

        let read = |key: &str| -> Option<u64> {
            storage
                .get_item(key)
                .ok()
                .flatten()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map(|v| v.max(0.0).round() as u64)
        };

        let mut scores = Self {
            arcade: read(Self::ARCADE_KEY).unwrap_or(0),
            story: read(Self::STORY_KEY).unwrap_or(0),
            path: None,
        };
        if let Some(legacy) = read(Self::LEGACY_KEY) {
            if legacy > scores.arcade {
                scores.arcade = legacy;
                let _ = storage.set_item(Self::ARCADE_KEY, &legacy.to_string());
            }
            let _ = storage.remove_item(Self::LEGACY_KEY);
            log::info!("Migrated legacy best score {}", legacy);
        }
        scores
    }

    /// Save best scores to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), PersistError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(PersistError::Unavailable)?;
        storage
            .set_item(Self::ARCADE_KEY, &self.arcade.to_string())
            .map_err(|_| PersistError::Unavailable)?;
        storage
            .set_item(Self::STORY_KEY, &self.story.to_string())
            .map_err(|_| PersistError::Unavailable)?;
        Ok(())
    }

    /// Native: the JSON file given at load time
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> Result<(), PersistError> {
        self.save_to_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_only_improves() {
        let mut best = BestScores::new();
        assert!(best.record(GameMode::Arcade, 40));
        assert!(!best.record(GameMode::Arcade, 30));
        assert!(best.record(GameMode::Story, 10));
        assert_eq!(best.get(GameMode::Arcade), 40);
        assert_eq!(best.get(GameMode::Story), 10);

        best.clear(GameMode::Arcade);
        assert_eq!(best.get(GameMode::Arcade), 0);
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("gobbler-best-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut best = BestScores::load_from(&path).unwrap();
        assert_eq!(best.arcade, 0);
        best.record(GameMode::Story, 1234);
        best.save().unwrap();

        let again = BestScores::load_from(&path).unwrap();
        assert_eq!(again.story, 1234);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let path = std::env::temp_dir().join(format!("gobbler-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(BestScores::load_from(&path), Err(PersistError::Json(_))));
        let best = BestScores::load_or_default(&path);
        assert_eq!((best.arcade, best.story), (0, 0));
        let _ = std::fs::remove_file(&path);
    }
}
