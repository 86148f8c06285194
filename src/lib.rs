//! Space Punch - an arcade survival game simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (stages, spawners, collisions, weapons, special modes)
//! - `settings`: Player preferences consumed read-only by the simulation
//!
//! Rendering, audio, HUD and input capture live outside this crate. They poll
//! [`sim::GameState::snapshot`] and drain [`sim::GameEvent`]s each frame.

pub mod settings;
pub mod sim;

pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 6;

    /// Arena dimensions (pixels, origin top-left, +y down)
    pub const GAME_WIDTH: f32 = 800.0;
    pub const GAME_HEIGHT: f32 = 600.0;

    /// Stage length
    pub const STAGE_DURATION_MS: f32 = 60_000.0;
    /// Remaining seconds at which the stage timer starts blinking
    pub const FINAL_COUNTDOWN_SECS: u32 = 10;
    /// Meteor spawning is suspended while the stage banner plays
    pub const STAGE_TRANSITION_MS: f32 = 1_100.0;

    // === Car ===
    pub const CAR_DIAMETER: f32 = 40.0;
    pub const CAR_HIT_RADIUS: f32 = 15.0; // generous hitbox (~30px circle)
    pub const CAR_SPEED: f32 = 280.0; // px/s
    pub const CAR_START_Y_OFFSET: f32 = 60.0; // from the bottom edge

    pub const DAMAGE_MAX: f32 = 100.0;
    pub const SHIELD_MAX_LEVEL: u8 = 10;
    /// impact = ceil(diameter / 12)
    pub const SHIELD_IMPACT_DIVISOR: f32 = 12.0;

    /// Invincibility frames
    pub const IFRAME_SMALL_MS: f32 = 350.0;
    pub const IFRAME_BIG_MS: f32 = 600.0;

    /// Knockback on shield hit
    pub const KNOCK_DISTANCE: f32 = 45.0;
    pub const KNOCK_DURATION_MS: f32 = 130.0;

    // === Meteors ===
    pub const METEOR_DIAMETER_MIN: i32 = 10;
    pub const METEOR_DIAMETER_MAX: i32 = 60;
    /// hitRadius = (diameter / 2) * 0.85
    pub const METEOR_HIT_RATIO: f32 = 0.425;
    /// Diameter at which a meteor counts as "big" (instakill without shield)
    pub const BIG_METEOR_DIAMETER: f32 = 40.0;
    /// Hit points per 20px of diameter (rounded up)
    pub const METEOR_HP_PER_DIAMETER: f32 = 20.0;

    pub const METEOR_BASE_SPEED: f32 = 60.0; // px/s at trail speed 1
    pub const METEOR_SPEED_PER_LEVEL: f32 = 30.0;
    pub const METEOR_SPEED_JITTER: f32 = 0.15;

    pub const SPAWN_BASE_INTERVAL_MS: f32 = 1_200.0; // at intensity 1
    pub const SPAWN_MIN_INTERVAL_MS: f32 = 100.0;
    pub const SPAWN_INTERVAL_REDUCTION: f32 = 100.0; // per intensity level
    pub const MAX_METEORS_BASE: usize = 6;
    pub const MAX_METEORS_PER_LEVEL: usize = 3;

    /// Horizontal clearance kept around the car column when spawning
    pub const SAFE_SPAWN_PADDING: f32 = 40.0;
    pub const SPAWN_PLACEMENT_ATTEMPTS: u32 = 8;
    /// Clearance from a big meteor's column before a spawn is skipped
    pub const BIG_METEOR_SPAWN_CLEARANCE: f32 = 20.0;
    /// Crowding check only kicks in above this many live meteors
    pub const CROWDING_THRESHOLD: usize = 3;

    /// Meteor drift (pseudo-bounce)
    pub const DRIFT_CHANGE_INTERVAL_MS: f32 = 800.0;
    pub const DRIFT_CHANGE_JITTER_MS: f32 = 200.0;
    pub const DRIFT_MAX_VX: f32 = 40.0;
    pub const DRIFT_LERP_SPEED: f32 = 3.0; // lerp factor per second

    // === Difficulty ===
    /// Stages needed to reach full late-game weights
    pub const DIFFICULTY_PROGRESS_STAGES: f32 = 80.0;
    pub const GOD_CHANCE: f32 = 0.02;
    /// Stages between two God picks
    pub const GOD_MIN_GAP: u32 = 10;

    // === Powerups (shield repair) ===
    pub const POWERUP_RENDER_SIZE: f32 = 24.0;
    pub const POWERUP_HIT_RADIUS: f32 = 14.0;
    pub const POWERUP_SPEED: f32 = 50.0;
    pub const POWERUP_SPAWN_INTERVAL_MS: f32 = 8_000.0;
    pub const POWERUP_SPAWN_JITTER_MS: f32 = 4_000.0;
    pub const POWERUP_SHIELD_REPAIR: u8 = 1;

    // === Loot ===
    pub const LOOT_RENDER_SIZE: f32 = 24.0;
    pub const LOOT_HIT_RADIUS: f32 = 12.0;
    pub const LOOT_SPEED: f32 = 45.0;
    pub const LOOT_SPAWN_MIN_MS: f32 = 2_500.0;
    pub const LOOT_SPAWN_MAX_MS: f32 = 5_000.0;
    pub const LOOT_SAFE_DISTANCE: f32 = 60.0;
    /// Only big meteors still near the top edge block a loot spawn
    pub const LOOT_SAFE_BAND_Y: f32 = 100.0;
    pub const LOOT_CAR_CLEARANCE: f32 = 20.0;
    pub const LOOT_PLACEMENT_ATTEMPTS: u32 = 6;
    /// Weighted spawn distribution: gold, diamond, ruby
    pub const LOOT_WEIGHTS: [f32; 3] = [0.70, 0.20, 0.10];

    /// Ruby drops from weapon-destroyed big meteors
    pub const RUBY_DROP_CHANCE: f32 = 0.25;
    pub const RUBY_DROP_MIN_DIAMETER: f32 = 40.0;
    pub const RUBY_DROP_LIFETIME_MS: f32 = 6_000.0;
    pub const RUBY_DROP_FADE_MS: f32 = 1_500.0;
    pub const RUBY_DRIFT_VY: f32 = 20.0;
    pub const RUBY_WOBBLE_SPEED: f32 = 30.0;

    // === Near-miss combo ===
    /// (gap threshold px, combo points), loosest first
    pub const NEAR_MISS_TIERS: [(f32, u32); 3] = [(20.0, 1), (15.0, 3), (10.0, 5)];
    pub const COMBO_MAX: u32 = 100;

    // === Burst ("ultimate") mode ===
    pub const ULTIMATE_DURATION_MS: f32 = 10_000.0;
    pub const ULTIMATE_MAGNET_SPEED: f32 = 350.0; // px/s base attraction
    pub const ULTIMATE_MAGNET_ACCEL: f32 = 600.0; // extra px/s as loot closes in
    pub const ULTIMATE_MAGNET_FALLOFF: f32 = 300.0;

    // === Invincibility ("super saiyan") mode ===
    pub const INFINITE_SHIELD_DURATION_MS: f32 = 5_000.0;
    pub const SS_DIAMOND_LV1: u32 = 5;
    pub const SS_DIAMOND_LV2: u32 = 10;
    pub const SS_DIAMOND_COST: u32 = 5;

    // === Weapons ===
    pub const PROJECTILE_SPEED: f32 = 520.0;
    pub const PROJECTILE_RADIUS: f32 = 3.0;
    pub const PROJECTILE_CULL_MARGIN: f32 = 20.0;
    pub const MAX_PROJECTILES: usize = 96;
    pub const MUZZLE_OFFSET_X: f32 = 10.0;
    pub const MUZZLE_OFFSET_Y: f32 = -20.0;

    pub const AMMO_MAX_LEVEL: u8 = 3;
    pub const AMMO_GOLD_COST: u32 = 10;
    /// Fire interval per ammo level (index 0 unused)
    pub const AMMO_FIRE_INTERVALS_MS: [f32; 4] = [0.0, 500.0, 100.0, 100.0];
    /// Damage per hit per ammo level (index 0 unused)
    pub const AMMO_DAMAGE: [f32; 4] = [0.0, 1.0, 1.0, 0.5];

    pub const OMNI_MAX_LEVEL: u8 = 3;
    pub const OMNI_RUBY_COST: u32 = 2;
    pub const OMNI_FIRE_INTERVAL_MS: f32 = 1_000.0;
    pub const OMNI_MUZZLE_DIST: f32 = 24.0;
    pub const OMNI_LV1_DAMAGE: f32 = 1.0;
    pub const OMNI_LV2_DAMAGE: f32 = 1.5;

    /// Plasma pulse (omni level 3)
    pub const SHOCKWAVE_INTERVAL_MS: f32 = 3_000.0;
    pub const SHOCKWAVE_EXPAND_MS: f32 = 600.0;
    pub const SHOCKWAVE_MAX_RADIUS: f32 = 220.0;

    // === Run ===
    /// Freeze before the run is formally over
    pub const GAME_OVER_FREEZE_MS: f32 = 200.0;
}

/// Point scoring weights for the cumulative run score
pub mod score_weights {
    pub const NEAR_MISS_WEIGHT: u64 = 10; // per combo point
    pub const METEOR_BLAST_SMALL: u64 = 40;
    pub const METEOR_BLAST_BIG: u64 = 70;
    pub const GOLD_PICKUP: u64 = 15;
    pub const DIAMOND_PICKUP: u64 = 50;
    pub const RUBY_PICKUP: u64 = 80;
    pub const SHIELD_PICKUP: u64 = 25;
}

/// Clamp a position so a body of the given radius stays inside the arena
#[inline]
pub fn clamp_to_arena(pos: Vec2, radius: f32) -> Vec2 {
    Vec2::new(
        pos.x.clamp(radius, consts::GAME_WIDTH - radius),
        pos.y.clamp(radius, consts::GAME_HEIGHT - radius),
    )
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Circle-vs-circle overlap (touching edges do not count)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_arena() {
        let p = clamp_to_arena(Vec2::new(-50.0, 900.0), 20.0);
        assert_eq!(p, Vec2::new(20.0, consts::GAME_HEIGHT - 20.0));

        let inside = Vec2::new(400.0, 300.0);
        assert_eq!(clamp_to_arena(inside, 20.0), inside);
    }

    #[test]
    fn test_circles_overlap_is_strict() {
        assert!(circles_overlap(Vec2::ZERO, 10.0, Vec2::new(19.0, 0.0), 10.0));
        assert!(!circles_overlap(Vec2::ZERO, 10.0, Vec2::new(20.0, 0.0), 10.0));
    }
}
