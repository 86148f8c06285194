//! Timed special modes
//!
//! - [`BurstMode`]: triggered by a full combo meter. Hazard collisions are
//!   suspended, loot is magnetized, and the stage clock holds still.
//! - [`InvincibilityMode`]: bought with diamonds. Queues one or two back-to-back
//!   shield periods during which every meteor contact is absorbed.

use serde::{Deserialize, Serialize};

use crate::consts::{
    COMBO_MAX, INFINITE_SHIELD_DURATION_MS, SS_DIAMOND_LV1, SS_DIAMOND_LV2, ULTIMATE_DURATION_MS,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BurstMode {
    pub active: bool,
    pub remaining_ms: f32,
}

impl BurstMode {
    /// Start when the combo meter is full. Returns true if burst just began.
    pub fn maybe_trigger(&mut self, combo: u32) -> bool {
        if self.active || combo < COMBO_MAX {
            return false;
        }
        self.active = true;
        self.remaining_ms = ULTIMATE_DURATION_MS;
        log::info!("Burst mode started");
        true
    }

    /// Count down. Returns true on the tick burst ends.
    pub fn update(&mut self, dt_ms: f32) -> bool {
        if !self.active {
            return false;
        }
        self.remaining_ms -= dt_ms;
        if self.remaining_ms <= 0.0 {
            self.remaining_ms = 0.0;
            self.active = false;
            log::info!("Burst mode ended");
            return true;
        }
        false
    }

    /// Elapsed fraction 0..=1 for the HUD bar; 0 when inactive
    pub fn progress(&self) -> f32 {
        if !self.active {
            return 0.0;
        }
        1.0 - self.remaining_ms / ULTIMATE_DURATION_MS
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvincibilityMode {
    /// Queued periods, not counting the running one
    pub charges: u32,
    pub shield_active: bool,
    pub remaining_ms: f32,
}

impl InvincibilityMode {
    /// Every hazard contact is absorbed while true
    pub fn active(&self) -> bool {
        self.shield_active
    }

    /// A period is running or queued; activation is refused while true
    pub fn running(&self) -> bool {
        self.shield_active || self.charges > 0
    }

    /// Queued periods plus the running one
    pub fn total_charges(&self) -> u32 {
        self.charges + u32::from(self.shield_active)
    }

    /// Unlock level (0, 1 or 2) from diamonds held
    pub fn unlocked_level(diamonds: u32) -> u32 {
        if diamonds >= SS_DIAMOND_LV2 {
            2
        } else if diamonds >= SS_DIAMOND_LV1 {
            1
        } else {
            0
        }
    }

    /// Start the first period and queue `level - 1` more.
    /// Returns false if already running or not unlocked.
    pub fn activate(&mut self, diamonds: u32) -> bool {
        if self.running() {
            return false;
        }
        let level = Self::unlocked_level(diamonds);
        if level == 0 {
            return false;
        }
        self.charges = level - 1;
        self.start_period();
        log::info!("Invincibility activated at level {level}");
        true
    }

    /// Count down. Returns true on the tick a period ends; a queued charge
    /// starts the next period in the same tick.
    pub fn update(&mut self, dt_ms: f32) -> bool {
        if !self.shield_active {
            return false;
        }
        self.remaining_ms -= dt_ms;
        if self.remaining_ms > 0.0 {
            return false;
        }

        self.shield_active = false;
        self.remaining_ms = 0.0;
        if self.charges > 0 {
            self.charges -= 1;
            self.start_period();
        }
        true
    }

    fn start_period(&mut self) {
        self.shield_active = true;
        self.remaining_ms = INFINITE_SHIELD_DURATION_MS;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_triggers_only_on_full_combo() {
        let mut burst = BurstMode::default();
        assert!(!burst.maybe_trigger(99));
        assert!(burst.maybe_trigger(100));
        assert!(!burst.maybe_trigger(100), "already running");
        assert_eq!(burst.progress(), 0.0);

        assert!(!burst.update(ULTIMATE_DURATION_MS / 2.0));
        assert!((burst.progress() - 0.5).abs() < 1e-6);

        assert!(burst.update(ULTIMATE_DURATION_MS / 2.0));
        assert!(!burst.active);
        assert_eq!(burst.progress(), 0.0);
        assert!(!burst.update(16.0));
    }

    #[test]
    fn test_unlock_levels() {
        assert_eq!(InvincibilityMode::unlocked_level(4), 0);
        assert_eq!(InvincibilityMode::unlocked_level(5), 1);
        assert_eq!(InvincibilityMode::unlocked_level(9), 1);
        assert_eq!(InvincibilityMode::unlocked_level(10), 2);
        assert_eq!(InvincibilityMode::unlocked_level(250), 2);
    }

    #[test]
    fn test_level_two_chains_without_gap() {
        let mut mode = InvincibilityMode::default();
        assert!(mode.activate(10));
        assert_eq!(mode.total_charges(), 2);
        assert!(mode.active());

        assert!(mode.update(INFINITE_SHIELD_DURATION_MS));
        assert!(mode.active(), "second period starts in the same tick");
        assert_eq!(mode.total_charges(), 1);
        assert_eq!(mode.remaining_ms, INFINITE_SHIELD_DURATION_MS);

        assert!(mode.update(INFINITE_SHIELD_DURATION_MS));
        assert!(!mode.active());
        assert!(!mode.running());
        assert_eq!(mode.total_charges(), 0);
    }

    #[test]
    fn test_cannot_reactivate_while_running() {
        let mut mode = InvincibilityMode::default();
        assert!(!mode.activate(3));
        assert!(mode.activate(5));
        assert_eq!(mode.total_charges(), 1);
        assert!(!mode.activate(20));
        assert_eq!(mode.total_charges(), 1);

        mode.update(INFINITE_SHIELD_DURATION_MS + 1.0);
        assert!(!mode.running());
        assert!(mode.activate(20));
    }
}
