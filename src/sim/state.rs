//! Entity records and simulation events
//!
//! Plain data only. Sprites, tweens and particles belong to the presentation
//! layer, which keys its handles off the entity `id`s and reacts to
//! [`GameEvent`]s.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rng::RandomSource;
use crate::consts::*;
use crate::{clamp_to_arena, lerp};

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Car destroyed, terminal freeze frame before the run is over
    Dying { freeze_ms: f32 },
    /// Run ended, waiting for restart
    GameOver,
}

/// The player's vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    pub pos: Vec2,
    pub hit_radius: f32,
    pub speed: f32,
    /// Accumulated hull damage (0-100, terminal at 100)
    pub damage: f32,
    /// 0 = broken, 10 = full
    pub shield_level: u8,
    /// Remaining invincibility frames
    pub invincible_ms: f32,
    /// Remaining knockback slide (steering locked)
    pub knockback_ms: f32,
    pub input_disabled: bool,
}

impl Default for Car {
    fn default() -> Self {
        Self {
            pos: Self::start_position(),
            hit_radius: CAR_HIT_RADIUS,
            speed: CAR_SPEED,
            damage: 0.0,
            shield_level: SHIELD_MAX_LEVEL,
            invincible_ms: 0.0,
            knockback_ms: 0.0,
            input_disabled: false,
        }
    }
}

impl Car {
    pub fn start_position() -> Vec2 {
        Vec2::new(GAME_WIDTH / 2.0, GAME_HEIGHT - CAR_START_Y_OFFSET)
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_ms > 0.0
    }

    pub fn shield_active(&self) -> bool {
        self.shield_level > 0
    }

    /// Steer by a normalized direction and count down timers
    pub fn update(&mut self, direction: Vec2, dt: f32) {
        let dt_ms = dt * 1000.0;
        self.invincible_ms = (self.invincible_ms - dt_ms).max(0.0);

        if self.knockback_ms > 0.0 {
            self.knockback_ms = (self.knockback_ms - dt_ms).max(0.0);
            return;
        }
        if self.input_disabled {
            return;
        }

        let direction = direction.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
        self.pos = clamp_to_arena(self.pos + direction * self.speed * dt, CAR_DIAMETER / 2.0);
    }

    /// Start invincibility frames (restarts the window, never shortens it)
    pub fn start_iframes(&mut self, duration_ms: f32) {
        self.invincible_ms = self.invincible_ms.max(duration_ms);
    }

    /// Absorb a meteor with the shield. Returns the remaining shield level.
    pub fn apply_shield_hit(&mut self, meteor_diameter: f32, meteor_pos: Vec2) -> u8 {
        let impact = (meteor_diameter / SHIELD_IMPACT_DIVISOR).ceil().max(0.0) as u8;
        self.shield_level = self.shield_level.saturating_sub(impact);
        self.apply_knockback(meteor_pos);
        self.start_iframes(IFRAME_BIG_MS);
        self.shield_level
    }

    /// Take hull damage from a small meteor. Returns true if the hull is gone.
    pub fn apply_small_damage(&mut self, meteor_diameter: f32) -> bool {
        self.damage = (self.damage + meteor_diameter).min(DAMAGE_MAX);
        self.start_iframes(IFRAME_SMALL_MS);
        self.damage >= DAMAGE_MAX
    }

    /// Repair shield by amount, capped at max
    pub fn repair_shield(&mut self, amount: u8) {
        self.shield_level = self.shield_level.saturating_add(amount).min(SHIELD_MAX_LEVEL);
    }

    fn apply_knockback(&mut self, from: Vec2) {
        let away = (self.pos - from).try_normalize().unwrap_or(Vec2::Y);
        self.pos = clamp_to_arena(self.pos + away * KNOCK_DISTANCE, CAR_DIAMETER / 2.0);
        self.knockback_ms = KNOCK_DURATION_MS;
    }
}

/// A falling meteor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meteor {
    pub id: u32,
    pub pos: Vec2,
    pub diameter: f32,
    pub hit_radius: f32,
    /// Downward speed (px/s)
    pub vy: f32,
    /// Current horizontal drift (px/s)
    pub vx: f32,
    pub target_vx: f32,
    pub drift_timer_ms: f32,
    pub max_hp: f32,
    pub hp: f32,
    /// Collision with the car already resolved
    pub has_collided: bool,
    /// Highest near-miss tier points already awarded (0 = none)
    pub near_miss_awarded: u32,
}

impl Meteor {
    pub fn new(
        id: u32,
        pos: Vec2,
        diameter: f32,
        vy: f32,
        rng: &mut impl RandomSource,
    ) -> Self {
        let max_hp = (diameter / METEOR_HP_PER_DIAMETER).ceil().max(1.0);
        Self {
            id,
            pos,
            diameter,
            hit_radius: diameter * METEOR_HIT_RATIO,
            vy,
            vx: 0.0,
            target_vx: rng.float_between(-DRIFT_MAX_VX, DRIFT_MAX_VX),
            drift_timer_ms: DRIFT_CHANGE_INTERVAL_MS,
            max_hp,
            hp: max_hp,
            has_collided: false,
            near_miss_awarded: 0,
        }
    }

    pub fn is_big(&self) -> bool {
        self.diameter >= BIG_METEOR_DIAMETER
    }

    pub fn is_destroyed(&self) -> bool {
        self.hp <= 0.0
    }

    /// Collided with the car or shot down; due for removal
    pub fn is_spent(&self) -> bool {
        self.has_collided || self.is_destroyed()
    }

    pub fn is_off_screen(&self) -> bool {
        self.pos.y > GAME_HEIGHT + self.diameter
    }

    /// Fall, drift toward the current target, and occasionally pick a new one
    pub fn update(&mut self, dt: f32, rng: &mut impl RandomSource) {
        self.pos.y += self.vy * dt;

        let t = (DRIFT_LERP_SPEED * dt).min(1.0);
        self.vx = lerp(self.vx, self.target_vx, t);
        self.pos.x += self.vx * dt;

        self.drift_timer_ms -= dt * 1000.0;
        if self.drift_timer_ms <= 0.0 {
            self.drift_timer_ms = DRIFT_CHANGE_INTERVAL_MS
                + rng.float_between(-DRIFT_CHANGE_JITTER_MS, DRIFT_CHANGE_JITTER_MS);
            self.target_vx = rng.float_between(-DRIFT_MAX_VX, DRIFT_MAX_VX);
        }
    }

    /// Apply weapon damage. Returns true if this hit destroyed the meteor.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.is_destroyed() {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        self.is_destroyed()
    }
}

/// A falling shield-repair pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Powerup {
    pub id: u32,
    pub pos: Vec2,
    pub hit_radius: f32,
    pub collected: bool,
}

impl Powerup {
    pub fn new(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            hit_radius: POWERUP_HIT_RADIUS,
            collected: false,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.pos.y += POWERUP_SPEED * dt;
    }

    pub fn is_off_screen(&self) -> bool {
        self.pos.y > GAME_HEIGHT + POWERUP_RENDER_SIZE
    }
}

/// Collectible currency tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LootKind {
    Gold,
    Diamond,
    Ruby,
}

impl LootKind {
    pub const ALL: [LootKind; 3] = [LootKind::Gold, LootKind::Diamond, LootKind::Ruby];

    pub fn as_str(&self) -> &'static str {
        match self {
            LootKind::Gold => "Gold",
            LootKind::Diamond => "Diamond",
            LootKind::Ruby => "Ruby",
        }
    }

    /// Run score for collecting one
    pub fn score(&self) -> u64 {
        use crate::score_weights::*;
        match self {
            LootKind::Gold => GOLD_PICKUP,
            LootKind::Diamond => DIAMOND_PICKUP,
            LootKind::Ruby => RUBY_PICKUP,
        }
    }
}

/// How a loot item moves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LootMotion {
    /// Ambient spawn, straight fall
    Falling,
    /// Bonus drop from a destroyed meteor: slow drift, wobble, finite life
    Drop {
        lifetime_ms: f32,
        elapsed: f32,
        wobble_phase: f32,
    },
}

/// A collectible currency item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loot {
    pub id: u32,
    pub kind: LootKind,
    pub pos: Vec2,
    pub hit_radius: f32,
    pub motion: LootMotion,
    pub collected: bool,
    pub expired: bool,
}

impl Loot {
    pub fn new(id: u32, kind: LootKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            hit_radius: LOOT_HIT_RADIUS,
            motion: LootMotion::Falling,
            collected: false,
            expired: false,
        }
    }

    /// Bonus drop with a lifetime and a random wobble phase
    pub fn new_drop(
        id: u32,
        kind: LootKind,
        pos: Vec2,
        lifetime_ms: f32,
        rng: &mut impl RandomSource,
    ) -> Self {
        Self {
            motion: LootMotion::Drop {
                lifetime_ms,
                elapsed: 0.0,
                wobble_phase: rng.float_between(0.0, std::f32::consts::TAU),
            },
            ..Self::new(id, kind, pos)
        }
    }

    pub fn is_drop(&self) -> bool {
        matches!(self.motion, LootMotion::Drop { .. })
    }

    pub fn update(&mut self, dt: f32) {
        match &mut self.motion {
            LootMotion::Falling => {
                self.pos.y += LOOT_SPEED * dt;
            }
            LootMotion::Drop {
                lifetime_ms,
                elapsed,
                wobble_phase,
            } => {
                *elapsed += dt;
                *lifetime_ms -= dt * 1000.0;
                if *lifetime_ms <= 0.0 {
                    self.expired = true;
                    return;
                }
                self.pos.y += RUBY_DRIFT_VY * dt;
                self.pos.x += (*elapsed * 3.0 + *wobble_phase).sin() * RUBY_WOBBLE_SPEED * dt;
            }
        }
    }

    /// Presentation alpha: drops fade out over their last moments
    pub fn opacity(&self) -> f32 {
        match self.motion {
            LootMotion::Drop { lifetime_ms, .. } if lifetime_ms < RUBY_DROP_FADE_MS => {
                (lifetime_ms / RUBY_DROP_FADE_MS).max(0.0)
            }
            _ => 1.0,
        }
    }

    pub fn is_off_screen(&self) -> bool {
        self.pos.y > GAME_HEIGHT + LOOT_RENDER_SIZE
    }
}

/// Which weapon fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Forward twin guns
    Ammo,
    /// Multi-directional guns
    Omni,
    /// Expanding plasma ring
    Pulse,
}

/// A live projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub source: WeaponKind,
}

impl Projectile {
    pub fn is_out_of_arena(&self) -> bool {
        self.pos.x < -PROJECTILE_CULL_MARGIN
            || self.pos.x > GAME_WIDTH + PROJECTILE_CULL_MARGIN
            || self.pos.y < -PROJECTILE_CULL_MARGIN
            || self.pos.y > GAME_HEIGHT + PROJECTILE_CULL_MARGIN
    }
}

/// Everything the presentation layer may want to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    StageChanged { stage: u32 },
    DifficultyPicked { label: String, intensity: u8, speed: u8 },
    ShieldHit { pos: Vec2, shield_level: u8, meteor_diameter: f32 },
    ShieldBroken { pos: Vec2 },
    DamageHit { pos: Vec2, damage: f32 },
    /// Invincibility mode swallowed a collision
    ShieldAbsorbed { pos: Vec2, meteor_id: u32 },
    PowerupCollected { pos: Vec2, shield_level: u8 },
    LootCollected { pos: Vec2, kind: LootKind, magnet: bool },
    NearMiss { pos: Vec2, delta: u32, combo: u32 },
    WeaponHit { pos: Vec2, meteor_id: u32, source: WeaponKind, destroyed: bool },
    MeteorDestroyed { pos: Vec2, meteor_id: u32, big: bool },
    LootDropped { pos: Vec2, kind: LootKind },
    BurstStarted,
    BurstEnded,
    InvincibilityStarted { charges: u32 },
    InvincibilityPeriodEnded { charges_left: u32 },
    InvincibilityEnded,
    WeaponEquipped { weapon: WeaponKind, level: u8 },
    CarDestroyed { pos: Vec2 },
    GameOver { score: u64, stage: u32 },
    Restarted,
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::StageChanged { .. } => "stage_changed",
            GameEvent::DifficultyPicked { .. } => "difficulty_picked",
            GameEvent::ShieldHit { .. } => "shield_hit",
            GameEvent::ShieldBroken { .. } => "shield_broken",
            GameEvent::DamageHit { .. } => "damage_hit",
            GameEvent::ShieldAbsorbed { .. } => "shield_absorbed",
            GameEvent::PowerupCollected { .. } => "powerup_collected",
            GameEvent::LootCollected { .. } => "loot_collected",
            GameEvent::NearMiss { .. } => "near_miss",
            GameEvent::WeaponHit { .. } => "weapon_hit",
            GameEvent::MeteorDestroyed { .. } => "meteor_destroyed",
            GameEvent::LootDropped { .. } => "loot_dropped",
            GameEvent::BurstStarted => "burst_started",
            GameEvent::BurstEnded => "burst_ended",
            GameEvent::InvincibilityStarted { .. } => "invincibility_started",
            GameEvent::InvincibilityPeriodEnded { .. } => "invincibility_period_ended",
            GameEvent::InvincibilityEnded => "invincibility_ended",
            GameEvent::WeaponEquipped { .. } => "weapon_equipped",
            GameEvent::CarDestroyed { .. } => "car_destroyed",
            GameEvent::GameOver { .. } => "game_over",
            GameEvent::Restarted => "restarted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::ScriptedRandom;

    #[test]
    fn test_car_shield_hit_scenario() {
        let mut car = Car {
            shield_level: 5,
            ..Default::default()
        };
        let level = car.apply_shield_hit(20.0, car.pos + Vec2::new(0.0, -10.0));
        assert_eq!(level, 3);
        assert!(car.is_invincible());
        assert!(car.knockback_ms > 0.0);
    }

    #[test]
    fn test_knockback_pushes_away_and_clamps() {
        let mut car = Car::default();
        car.pos = Vec2::new(GAME_WIDTH - 25.0, 300.0);
        car.apply_shield_hit(12.0, Vec2::new(GAME_WIDTH - 60.0, 300.0));
        // Pushed right, but clamped at the wall
        assert_eq!(car.pos.x, GAME_WIDTH - CAR_DIAMETER / 2.0);
    }

    #[test]
    fn test_car_steering_locked_during_knockback() {
        let mut car = Car::default();
        car.knockback_ms = KNOCK_DURATION_MS;
        let before = car.pos;
        car.update(Vec2::X, 0.05);
        assert_eq!(car.pos, before);

        // Knockback expires after its duration
        car.update(Vec2::X, 0.1);
        car.update(Vec2::X, 0.05);
        assert!(car.pos.x > before.x);
    }

    #[test]
    fn test_small_damage_caps_at_max() {
        let mut car = Car::default();
        car.damage = 90.0;
        assert!(car.apply_small_damage(25.0));
        assert_eq!(car.damage, DAMAGE_MAX);
    }

    #[test]
    fn test_repair_shield_caps() {
        let mut car = Car::default();
        car.shield_level = SHIELD_MAX_LEVEL;
        car.repair_shield(1);
        assert_eq!(car.shield_level, SHIELD_MAX_LEVEL);
        car.shield_level = 0;
        car.repair_shield(1);
        assert_eq!(car.shield_level, 1);
    }

    #[test]
    fn test_meteor_hp_from_diameter() {
        let mut rng = ScriptedRandom::constant(0.5);
        let small = Meteor::new(1, Vec2::ZERO, 15.0, 60.0, &mut rng);
        let big = Meteor::new(2, Vec2::ZERO, 55.0, 60.0, &mut rng);
        assert_eq!(small.max_hp, 1.0);
        assert_eq!(big.max_hp, 3.0);
        assert!(big.is_big());
        assert!(!small.is_big());
    }

    #[test]
    fn test_meteor_drift_retargets() {
        let mut rng = ScriptedRandom::constant(1.0);
        let mut meteor = Meteor::new(1, Vec2::new(400.0, 0.0), 30.0, 100.0, &mut rng);
        let first_target = meteor.target_vx;
        meteor.drift_timer_ms = 1.0;

        let mut rng = ScriptedRandom::constant(0.0);
        meteor.update(0.016, &mut rng);
        assert!(meteor.target_vx < 0.0);
        assert!(first_target > 0.0);
        assert!(meteor.drift_timer_ms > 0.0);
        assert!(meteor.vx > 0.0, "vx eases toward target, not snapped");
    }

    #[test]
    fn test_drop_loot_fades_and_expires() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut loot = Loot::new_drop(1, LootKind::Ruby, Vec2::new(100.0, 100.0), 2_000.0, &mut rng);
        assert_eq!(loot.opacity(), 1.0);

        loot.update(1.0);
        assert!(loot.opacity() < 1.0 && loot.opacity() > 0.0);
        assert!(!loot.expired);

        loot.update(1.1);
        assert!(loot.expired);
    }
}
