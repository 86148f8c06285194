//! Per-stage difficulty selection
//!
//! Each stage rolls one of seven tiers. Early stages favour the gentle tiers,
//! and the weights slide toward the harsh ones over
//! [`DIFFICULTY_PROGRESS_STAGES`]. God is rationed: it can't repeat within
//! [`GOD_MIN_GAP`] stages and is capped near [`GOD_CHANCE`] otherwise.

use serde::{Deserialize, Serialize};

use super::rng::RandomSource;
use crate::consts::{DIFFICULTY_PROGRESS_STAGES, GOD_CHANCE, GOD_MIN_GAP};
use crate::lerp;
use crate::settings::Settings;

/// Difficulty tiers, gentlest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DifficultyTier {
    Lame,
    Ok,
    Fun,
    Woah,
    Crazy,
    Pro,
    God,
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 7] = [
        DifficultyTier::Lame,
        DifficultyTier::Ok,
        DifficultyTier::Fun,
        DifficultyTier::Woah,
        DifficultyTier::Crazy,
        DifficultyTier::Pro,
        DifficultyTier::God,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyTier::Lame => "Lame",
            DifficultyTier::Ok => "Ok",
            DifficultyTier::Fun => "Fun",
            DifficultyTier::Woah => "Woah",
            DifficultyTier::Crazy => "Crazy",
            DifficultyTier::Pro => "Pro",
            DifficultyTier::God => "God",
        }
    }

    /// Base (meteor intensity, trail speed), each 1-10
    pub fn preset(&self) -> (u8, u8) {
        match self {
            DifficultyTier::Lame => (2, 2),
            DifficultyTier::Ok => (3, 3),
            DifficultyTier::Fun => (4, 4),
            DifficultyTier::Woah => (5, 5),
            DifficultyTier::Crazy => (6, 6),
            DifficultyTier::Pro => (8, 8),
            DifficultyTier::God => (10, 10),
        }
    }

    /// (early, late) roulette weights
    pub fn weights(&self) -> (f32, f32) {
        match self {
            DifficultyTier::Lame => (0.30, 0.05),
            DifficultyTier::Ok => (0.25, 0.10),
            DifficultyTier::Fun => (0.20, 0.15),
            DifficultyTier::Woah => (0.12, 0.20),
            DifficultyTier::Crazy => (0.08, 0.25),
            DifficultyTier::Pro => (0.05, 0.23),
            DifficultyTier::God => (0.02, 0.02),
        }
    }
}

/// Where intensity and speed come from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DifficultyMode {
    /// Weighted random tier per stage
    Preset,
    /// Fixed values from the player's settings
    Manual { intensity: u8, speed: u8 },
}

impl DifficultyMode {
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.use_stage_presets {
            DifficultyMode::Preset
        } else {
            DifficultyMode::Manual {
                intensity: settings.effective_intensity(),
                speed: settings.effective_speed(),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultySelector {
    pub mode: DifficultyMode,
    pub tier: DifficultyTier,
    /// Meteor spawn pressure (1-10)
    pub intensity: u8,
    /// Meteor fall speed (1-10)
    pub speed: u8,
    stages_since_god: u32,
}

impl DifficultySelector {
    pub fn new(mode: DifficultyMode) -> Self {
        Self {
            mode,
            tier: DifficultyTier::Lame,
            intensity: 2,
            speed: 2,
            // God may be rolled from the very first stage
            stages_since_god: GOD_MIN_GAP,
        }
    }

    /// HUD label; manual mode reads "Custom"
    pub fn label(&self) -> &'static str {
        match self.mode {
            DifficultyMode::Preset => self.tier.as_str(),
            DifficultyMode::Manual { .. } => "Custom",
        }
    }

    pub fn stages_since_god(&self) -> u32 {
        self.stages_since_god
    }

    /// Normalized roulette weights for a stage, in [`DifficultyTier::ALL`] order
    pub fn weights(&self, stage_index: u32) -> [f32; 7] {
        let progress = (stage_index as f32 / DIFFICULTY_PROGRESS_STAGES).clamp(0.0, 1.0);

        let mut weights = [0.0f32; 7];
        for (slot, tier) in weights.iter_mut().zip(DifficultyTier::ALL) {
            let (early, late) = tier.weights();
            let mut w = lerp(early, late, progress);
            if tier == DifficultyTier::God {
                w = if self.stages_since_god < GOD_MIN_GAP {
                    0.0
                } else {
                    w.min(GOD_CHANCE + 0.01)
                };
            }
            *slot = w;
        }

        let total: f32 = weights.iter().sum();
        if total > 0.0 {
            for w in &mut weights {
                *w /= total;
            }
        }
        weights
    }

    /// Roll the difficulty for a stage
    pub fn pick_for_stage(&mut self, stage_index: u32, rng: &mut impl RandomSource) {
        if let DifficultyMode::Manual { intensity, speed } = self.mode {
            self.tier = DifficultyTier::Fun;
            self.intensity = intensity.clamp(1, 10);
            self.speed = speed.clamp(1, 10);
            return;
        }

        let weights = self.weights(stage_index);
        self.tier = roulette(&weights, rng.next_unit());

        if self.tier == DifficultyTier::God {
            self.stages_since_god = 0;
        } else {
            self.stages_since_god += 1;
        }

        let (base_intensity, base_speed) = self.tier.preset();
        self.intensity = jitter(base_intensity, rng);
        self.speed = jitter(base_speed, rng);

        log::info!(
            "Stage {}: difficulty {} (intensity {}, speed {})",
            stage_index,
            self.tier.as_str(),
            self.intensity,
            self.speed
        );
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.mode);
    }
}

/// Cumulative-weight pick. A roll left over past the cumulative sum picks Lame.
fn roulette(weights: &[f32; 7], roll: f32) -> DifficultyTier {
    let mut remaining = roll;
    for (i, w) in weights.iter().enumerate() {
        if *w <= 0.0 {
            continue;
        }
        remaining -= w;
        if remaining <= 0.0 {
            return DifficultyTier::ALL[i];
        }
    }
    DifficultyTier::Lame
}

fn jitter(base: u8, rng: &mut impl RandomSource) -> u8 {
    (base as i32 + rng.int_between(-1, 1)).clamp(1, 10) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::{ScriptedRandom, SeededRandom};
    use proptest::prelude::*;

    #[test]
    fn test_god_gated_during_cooldown() {
        let mut selector = DifficultySelector::new(DifficultyMode::Preset);
        let mut rng = ScriptedRandom::constant(0.9999);

        // Roll God at stage 0 with a max roll
        selector.pick_for_stage(0, &mut rng);
        assert_eq!(selector.tier, DifficultyTier::God);
        assert_eq!(selector.stages_since_god(), 0);

        for _ in 0..GOD_MIN_GAP {
            assert_eq!(selector.weights(0)[6], 0.0);
            selector.pick_for_stage(0, &mut rng);
            assert_ne!(selector.tier, DifficultyTier::God);
        }
        assert!(selector.weights(0)[6] > 0.0);
    }

    #[test]
    fn test_god_capped() {
        let selector = DifficultySelector::new(DifficultyMode::Preset);
        let raw_total: f32 = DifficultyTier::ALL.iter().map(|t| t.weights().0).sum();
        let god = selector.weights(0)[6];
        assert!(god <= (GOD_CHANCE + 0.01) / (raw_total - 0.02 + GOD_CHANCE) + 1e-4);
    }

    #[test]
    fn test_low_roll_picks_lame_early() {
        let mut selector = DifficultySelector::new(DifficultyMode::Preset);
        let mut rng = ScriptedRandom::new(vec![0.01, 0.5, 0.5]);
        selector.pick_for_stage(1, &mut rng);
        assert_eq!(selector.tier, DifficultyTier::Lame);
        assert_eq!((selector.intensity, selector.speed), (2, 2));
    }

    #[test]
    fn test_jitter_clamped() {
        let mut selector = DifficultySelector::new(DifficultyMode::Preset);
        // God roll, then +1 jitter on both axes stays at 10
        let mut rng = ScriptedRandom::new(vec![0.9999, 0.9999, 0.9999]);
        selector.pick_for_stage(0, &mut rng);
        assert_eq!((selector.intensity, selector.speed), (10, 10));
    }

    #[test]
    fn test_roll_past_cumulative_sum_picks_lame() {
        // Sums to 0.98, as if rounding shaved the total
        let weights = [0.0, 0.0, 0.0, 0.0, 0.5, 0.48, 0.0];
        assert_eq!(roulette(&weights, 0.99), DifficultyTier::Lame);
        assert_eq!(roulette(&weights, 0.9), DifficultyTier::ALL[5]);
        assert_eq!(roulette(&[0.0; 7], 0.5), DifficultyTier::Lame);
    }

    #[test]
    fn test_manual_mode_bypasses_roulette() {
        let mut selector = DifficultySelector::new(DifficultyMode::Manual {
            intensity: 7,
            speed: 3,
        });
        let mut rng = ScriptedRandom::constant(0.5);
        selector.pick_for_stage(42, &mut rng);
        assert_eq!((selector.intensity, selector.speed), (7, 3));
        assert_eq!(selector.label(), "Custom");
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_frequencies_converge_to_weights() {
        let selector = DifficultySelector::new(DifficultyMode::Preset);
        let expected = selector.weights(40);
        let mut rng = SeededRandom::new(2024);
        let mut counts = [0u32; 7];
        let trials = 40_000;
        for _ in 0..trials {
            let tier = roulette(&expected, rng.next_unit());
            let idx = DifficultyTier::ALL.iter().position(|t| *t == tier).unwrap_or(0);
            counts[idx] += 1;
        }
        for (count, weight) in counts.iter().zip(expected) {
            let observed = *count as f32 / trials as f32;
            assert!((observed - weight).abs() < 0.015, "{observed} vs {weight}");
        }
    }

    proptest! {
        #[test]
        fn prop_weights_normalized(stage in 0u32..200) {
            let selector = DifficultySelector::new(DifficultyMode::Preset);
            let sum: f32 = selector.weights(stage).iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-4);
        }

        #[test]
        fn prop_pick_stays_in_range(stage in 0u32..200, seed in any::<u64>()) {
            let mut selector = DifficultySelector::new(DifficultyMode::Preset);
            let mut rng = SeededRandom::new(seed);
            selector.pick_for_stage(stage, &mut rng);
            prop_assert!((1..=10).contains(&selector.intensity));
            prop_assert!((1..=10).contains(&selector.speed));
        }
    }
}
