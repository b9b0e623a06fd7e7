//! Chomp animation shared by the player, creatures and the boss

use serde::{Deserialize, Serialize};

use crate::math::{clamp, damp, lerp_angle};
use crate::tuning;

/// Fraction of the aim gap left after one second of tracking
pub const AIM_DAMP: f32 = 0.001;
/// Much snappier tracking right after a bite
pub const BITE_AIM_DAMP: f32 = 0.000_001;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mouth {
    /// 0 = closed, 1 = wide open
    pub open: f32,
    /// Aim direction (radians)
    pub dir: f32,
    /// Elapsed fraction of the current pulse; 1 when idle
    pub pulse_t: f32,
    pub cooldown: f32,
}

impl Default for Mouth {
    fn default() -> Self {
        Self {
            open: 0.0,
            dir: 0.0,
            pulse_t: 1.0,
            cooldown: 0.0,
        }
    }
}

impl Mouth {
    /// Start a chomp pulse unless one fired within the cooldown
    pub fn trigger_chomp(&mut self, cfg: &tuning::Mouth) -> bool {
        if self.cooldown > 0.0 {
            return false;
        }
        self.pulse_t = 0.0;
        self.cooldown = cfg.min_cooldown;
        true
    }

    pub fn update(&mut self, dt: f32, cfg: &tuning::Mouth) {
        if self.cooldown > 0.0 {
            self.cooldown -= dt;
        }
        if self.pulse_t < 1.0 {
            self.pulse_t = clamp(self.pulse_t + dt / cfg.pulse_secs, 0.0, 1.0);
            self.open = (std::f32::consts::PI * self.pulse_t).sin();
        } else {
            self.open = 0.0;
        }
    }

    /// Ease the aim toward `angle`
    pub fn aim(&mut self, angle: f32, dt: f32, base: f32) {
        self.dir = lerp_angle(self.dir, angle, damp(base, dt));
    }

    pub fn is_pulsing(&self) -> bool {
        self.pulse_t < 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chomp_respects_cooldown() {
        let cfg = tuning::Mouth::default();
        let mut m = Mouth::default();
        assert!(m.trigger_chomp(&cfg));
        assert!(!m.trigger_chomp(&cfg));

        m.update(0.08, &cfg);
        assert!(m.cooldown <= 0.0);
        assert!(m.trigger_chomp(&cfg));
    }

    #[test]
    fn test_pulse_opens_then_closes() {
        let cfg = tuning::Mouth::default();
        let mut m = Mouth::default();
        m.trigger_chomp(&cfg);

        m.update(cfg.pulse_secs * 0.5, &cfg);
        assert!(m.open > 0.99);

        m.update(cfg.pulse_secs, &cfg);
        assert!(m.open.abs() < 1e-5);
        assert!(!m.is_pulsing());

        m.update(0.016, &cfg);
        assert_eq!(m.open, 0.0);
    }
}
