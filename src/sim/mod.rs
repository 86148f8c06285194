//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Every random draw goes through a [`RandomSource`]
//! - Stable iteration order (entity lists are kept in spawn order)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod difficulty;
pub mod meteors;
pub mod modes;
pub mod pickups;
pub mod rng;
pub mod score;
pub mod shockwave;
pub mod stage;
pub mod state;
pub mod tick;
pub mod weapons;

pub use collision::{CollisionResult, DeathCause, ImpactOutcome};
pub use difficulty::{DifficultyMode, DifficultySelector, DifficultyTier};
pub use meteors::MeteorSpawner;
pub use modes::{BurstMode, InvincibilityMode};
pub use pickups::{LootSpawner, MagnetPickup, PowerupSpawner};
pub use rng::{RandomSource, ScriptedRandom, SeededRandom};
pub use score::{NearMiss, ScoreTracker};
pub use shockwave::PulseWeapon;
pub use stage::StageClock;
pub use state::{
    Car, GameEvent, GamePhase, Loot, LootKind, LootMotion, Meteor, Powerup, Projectile, WeaponKind,
};
pub use tick::{GameState, RunSnapshot, TickInput, tick};
pub use weapons::{ProjectileWeapons, WeaponHit};
