//! Stage clock

use serde::{Deserialize, Serialize};

use crate::consts::{FINAL_COUNTDOWN_SECS, STAGE_DURATION_MS};

/// Tracks elapsed time in the current stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageClock {
    /// 1-based stage counter
    pub stage: u32,
    pub elapsed_ms: f32,
    /// Set while burst mode runs; time does not accrue
    pub paused: bool,
}

impl Default for StageClock {
    fn default() -> Self {
        Self {
            stage: 1,
            elapsed_ms: 0.0,
            paused: false,
        }
    }
}

impl StageClock {
    /// Advance the clock. Returns true when the stage just incremented.
    pub fn advance(&mut self, delta_ms: f32) -> bool {
        if self.paused {
            return false;
        }
        self.elapsed_ms += delta_ms.max(0.0);
        if self.elapsed_ms >= STAGE_DURATION_MS {
            self.elapsed_ms -= STAGE_DURATION_MS;
            self.stage += 1;
            return true;
        }
        false
    }

    pub fn remaining_seconds(&self) -> u32 {
        ((STAGE_DURATION_MS - self.elapsed_ms) / 1000.0).ceil().max(0.0) as u32
    }

    pub fn is_final_countdown(&self) -> bool {
        self.remaining_seconds() <= FINAL_COUNTDOWN_SECS
    }

    /// Remaining time as MM:SS
    pub fn format_time(&self) -> String {
        let total = self.remaining_seconds();
        format!("{:02}:{:02}", total / 60, total % 60)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_fires_once_per_boundary() {
        let mut clock = StageClock::default();
        assert!(!clock.advance(59_000.0));
        assert!(clock.advance(1_500.0));
        assert_eq!(clock.stage, 2);
        assert!((clock.elapsed_ms - 500.0).abs() < 0.001);
        assert!(!clock.advance(100.0));
    }

    #[test]
    fn test_paused_does_not_accrue() {
        let mut clock = StageClock::default();
        clock.paused = true;
        for _ in 0..1000 {
            assert!(!clock.advance(1_000.0));
        }
        assert_eq!(clock.elapsed_ms, 0.0);
        assert_eq!(clock.stage, 1);
    }

    #[test]
    fn test_countdown_and_format() {
        let mut clock = StageClock::default();
        assert_eq!(clock.format_time(), "01:00");
        assert!(!clock.is_final_countdown());

        clock.advance(50_500.0);
        assert_eq!(clock.remaining_seconds(), 10);
        assert!(clock.is_final_countdown());
        assert_eq!(clock.format_time(), "00:10");
    }
}
