//! Story-mode checkpoints and the boss-fight snapshot
//!
//! Checkpoints sit at fixed fractions of the level length. Reaching one
//! records the score and size to respawn with. The boss fight keeps its own
//! snapshot, refreshed on every boss hit.

use serde::{Deserialize, Serialize};

use crate::tuning::Level;

/// Extra scroll past the finish stop where the boss arena sits
const ARENA_OFFSET: f32 = 40.0;

/// What a respawn restores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub score: u64,
    pub r: f32,
}

/// Respawn point inside the boss fight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossSnapshot {
    pub scroll_x: f32,
    pub score: u64,
    pub r: f32,
    pub hp: u32,
    /// Fight clock when taken; kept for the record, the clock itself runs on
    pub timer: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoints {
    /// World x of each checkpoint, ascending
    pub xs: Vec<f32>,
    pub index: usize,
    snapshots: Vec<Option<Snapshot>>,
    /// Scroll stops here in story mode
    pub finish_stop_x: f32,
    pub boss: Option<BossSnapshot>,
}

impl Checkpoints {
    pub fn new(level: &Level, width: f32, base_r: f32) -> Self {
        let mut xs: Vec<f32> = level
            .checkpoints
            .iter()
            .map(|f| f.clamp(0.0, 1.0) * level.length)
            .collect();
        if xs.first().is_none_or(|x| *x > 0.0) {
            xs.insert(0, 0.0);
        }

        let mut cp = Self {
            snapshots: vec![None; xs.len()],
            xs,
            index: 0,
            finish_stop_x: (level.length - width + level.finish_margin).max(0.0),
            boss: None,
        };
        cp.reset(0, base_r);
        cp
    }

    /// Back to the first checkpoint with the given start values
    pub fn reset(&mut self, score: u64, r: f32) {
        self.index = 0;
        self.snapshots.iter_mut().for_each(|s| *s = None);
        self.snapshots[0] = Some(Snapshot { score, r });
        self.boss = None;
    }

    pub fn current_x(&self) -> f32 {
        self.xs.get(self.index).copied().unwrap_or(0.0)
    }

    /// Snapshot to respawn with; falls back to the live values
    pub fn current(&self, score: u64, r: f32) -> Snapshot {
        self.snapshots
            .get(self.index)
            .copied()
            .flatten()
            .unwrap_or(Snapshot { score, r })
    }

    /// Check whether the next checkpoint was passed.
    ///
    /// Returns the newly reached index. At most one checkpoint advances per
    /// call.
    pub fn progress(&mut self, scroll_x: f32, score: u64, r: f32) -> Option<usize> {
        let next = self.index + 1;
        if next >= self.xs.len() || scroll_x < self.xs[next] {
            return None;
        }
        self.index = next;
        self.snapshots[next] = Some(Snapshot { score, r });
        Some(next)
    }

    /// Jump the index to the last checkpoint behind `scroll_x` (warps).
    ///
    /// The final checkpoint is skipped when `skip_last` is set, and missing
    /// snapshots are filled from the live values.
    pub fn sync_to_scroll(&mut self, scroll_x: f32, skip_last: bool, score: u64, r: f32) {
        let last = self.xs.len().saturating_sub(1);
        let mut idx = 0;
        for (i, x) in self.xs.iter().enumerate().skip(1) {
            if skip_last && i == last {
                continue;
            }
            if scroll_x >= *x {
                idx = i;
            } else {
                break;
            }
        }
        self.index = idx;
        if self.snapshots[idx].is_none() {
            self.snapshots[idx] = Some(Snapshot { score, r });
        }
    }

    /// Scroll position of the boss arena
    pub fn arena_x(&self, width: f32) -> f32 {
        self.finish_stop_x + width + ARENA_OFFSET
    }
}
