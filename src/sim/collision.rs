//! Car collision resolution
//!
//! Layered defense against meteors: the shield soaks impacts first, then hull
//! damage for small rocks, and an unshielded big rock is fatal. Every check is
//! one car against one entity; the caller owns iteration order and must stop
//! at the first game over.

use glam::Vec2;

use super::state::{Car, Loot, LootKind, Meteor, Powerup};
use crate::circles_overlap;
use crate::consts::POWERUP_SHIELD_REPAIR;

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// Unshielded contact with a big meteor
    BigImpact,
    /// Hull damage reached the cap
    HullBreached,
}

/// The single outcome of a car-meteor contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImpactOutcome {
    ShieldHit { shield_level: u8, broken: bool },
    DamageHit { damage: f32 },
    GameOver { cause: DeathCause },
}

/// Result of a car-meteor contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    pub outcome: ImpactOutcome,
    pub meteor_id: u32,
    pub meteor_pos: Vec2,
    pub meteor_diameter: f32,
}

impl CollisionResult {
    pub fn is_game_over(&self) -> bool {
        matches!(self.outcome, ImpactOutcome::GameOver { .. })
    }

    pub fn is_shield_hit(&self) -> bool {
        matches!(self.outcome, ImpactOutcome::ShieldHit { .. })
    }

    pub fn is_damage_hit(&self) -> bool {
        matches!(self.outcome, ImpactOutcome::DamageHit { .. })
    }

    pub fn shield_broken(&self) -> bool {
        matches!(self.outcome, ImpactOutcome::ShieldHit { broken: true, .. })
    }
}

/// Check the car against a single meteor and apply the defense rules.
///
/// Skipped while the car has invincibility frames or if this meteor was
/// already resolved. A contact flags the meteor so it never resolves twice.
pub fn check_meteor(car: &mut Car, meteor: &mut Meteor) -> Option<CollisionResult> {
    if car.is_invincible() || meteor.has_collided {
        return None;
    }
    if !circles_overlap(car.pos, car.hit_radius, meteor.pos, meteor.hit_radius) {
        return None;
    }

    meteor.has_collided = true;

    let outcome = if car.shield_active() {
        let before = car.shield_level;
        let level = car.apply_shield_hit(meteor.diameter, meteor.pos);
        ImpactOutcome::ShieldHit {
            shield_level: level,
            broken: before > 0 && level == 0,
        }
    } else if meteor.is_big() {
        ImpactOutcome::GameOver {
            cause: DeathCause::BigImpact,
        }
    } else if car.apply_small_damage(meteor.diameter) {
        ImpactOutcome::GameOver {
            cause: DeathCause::HullBreached,
        }
    } else {
        ImpactOutcome::DamageHit { damage: car.damage }
    };

    Some(CollisionResult {
        outcome,
        meteor_id: meteor.id,
        meteor_pos: meteor.pos,
        meteor_diameter: meteor.diameter,
    })
}

/// Invincibility-mode contact: the meteor is consumed, the car is untouched.
/// Returns true if the meteor was absorbed.
pub fn absorb_meteor(car: &Car, meteor: &mut Meteor) -> bool {
    if meteor.has_collided {
        return false;
    }
    if !circles_overlap(car.pos, car.hit_radius, meteor.pos, meteor.hit_radius) {
        return false;
    }
    meteor.has_collided = true;
    true
}

/// Check the car against a powerup. Collectable even during i-frames.
pub fn check_powerup(car: &mut Car, powerup: &mut Powerup) -> bool {
    if powerup.collected {
        return false;
    }
    if !circles_overlap(car.pos, car.hit_radius, powerup.pos, powerup.hit_radius) {
        return false;
    }
    powerup.collected = true;
    car.repair_shield(POWERUP_SHIELD_REPAIR);
    true
}

/// Check the car against loot. Collectable even during i-frames.
pub fn check_loot(car: &Car, loot: &mut Loot) -> Option<LootKind> {
    if loot.collected || loot.expired {
        return None;
    }
    if !circles_overlap(car.pos, car.hit_radius, loot.pos, loot.hit_radius) {
        return None;
    }
    loot.collected = true;
    Some(loot.kind)
}
