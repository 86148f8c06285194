//! Auto-fire projectile weapons
//!
//! Two independently equipped guns share one projectile pool:
//! - Ammo: twin forward barrels. Level 1 is slow, level 2 fires fast and
//!   level 3 trades half damage per hit for the same rate.
//! - Omni: fires along preset compass directions, two diagonals at level 1
//!   and all eight directions from level 2.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Meteor, Projectile, WeaponKind};
use crate::circles_overlap;
use crate::consts::*;

const S2: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Screen space: -y is up
const OMNI_LV1_DIRS: [Vec2; 2] = [Vec2::new(-S2, -S2), Vec2::new(S2, -S2)];
const OMNI_LV2_DIRS: [Vec2; 8] = [
    Vec2::new(0.0, -1.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(S2, -S2),
    Vec2::new(-S2, -S2),
    Vec2::new(S2, S2),
    Vec2::new(-S2, S2),
];

/// A projectile or pulse landing on a meteor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponHit {
    pub meteor_id: u32,
    pub pos: Vec2,
    pub diameter: f32,
    pub source: WeaponKind,
    pub destroyed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectileWeapons {
    /// 0 = not equipped, 1-3
    pub ammo_level: u8,
    /// 0 = not equipped, 1-3 (3 also arms the plasma pulse)
    pub omni_level: u8,
    pub projectiles: Vec<Projectile>,
    ammo_timer_ms: f32,
    omni_timer_ms: f32,
}

impl ProjectileWeapons {
    pub fn is_active(&self) -> bool {
        self.ammo_level > 0 || self.omni_level > 0
    }

    pub fn ammo_fire_interval_ms(&self) -> f32 {
        AMMO_FIRE_INTERVALS_MS[self.ammo_level.min(AMMO_MAX_LEVEL) as usize]
    }

    pub fn ammo_damage(&self) -> f32 {
        AMMO_DAMAGE[self.ammo_level.min(AMMO_MAX_LEVEL) as usize]
    }

    pub fn omni_damage(&self) -> f32 {
        if self.omni_level >= 2 {
            OMNI_LV2_DAMAGE
        } else {
            OMNI_LV1_DAMAGE
        }
    }

    /// Fire on schedule, move projectiles, and resolve hits against meteors
    pub fn update(&mut self, dt: f32, car_pos: Vec2, meteors: &mut [Meteor]) -> Vec<WeaponHit> {
        if !self.is_active() && self.projectiles.is_empty() {
            return Vec::new();
        }
        let dt_ms = dt * 1000.0;

        if self.ammo_level > 0 {
            self.ammo_timer_ms -= dt_ms;
            if self.ammo_timer_ms <= 0.0 {
                self.fire_ammo(car_pos);
                self.ammo_timer_ms = self.ammo_fire_interval_ms();
            }
        }

        if self.omni_level > 0 {
            self.omni_timer_ms -= dt_ms;
            if self.omni_timer_ms <= 0.0 {
                self.fire_omni(car_pos);
                self.omni_timer_ms = OMNI_FIRE_INTERVAL_MS;
            }
        }

        let mut hits = Vec::new();
        self.projectiles.retain_mut(|p| {
            p.pos += p.vel * dt;
            if p.is_out_of_arena() {
                return false;
            }

            let target = meteors.iter_mut().find(|m| {
                !m.has_collided
                    && !m.is_destroyed()
                    && circles_overlap(p.pos, PROJECTILE_RADIUS, m.pos, m.hit_radius)
            });
            match target {
                Some(m) => {
                    let destroyed = m.take_damage(p.damage);
                    hits.push(WeaponHit {
                        meteor_id: m.id,
                        pos: m.pos,
                        diameter: m.diameter,
                        source: p.source,
                        destroyed,
                    });
                    false
                }
                None => true,
            }
        });
        hits
    }

    fn fire_ammo(&mut self, car_pos: Vec2) {
        let y = car_pos.y + MUZZLE_OFFSET_Y;
        let vel = Vec2::new(0.0, -PROJECTILE_SPEED);
        let damage = self.ammo_damage();
        for x in [car_pos.x - MUZZLE_OFFSET_X, car_pos.x + MUZZLE_OFFSET_X] {
            self.spawn(Vec2::new(x, y), vel, damage, WeaponKind::Ammo);
        }
    }

    fn fire_omni(&mut self, car_pos: Vec2) {
        let dirs: &[Vec2] = if self.omni_level >= 2 {
            &OMNI_LV2_DIRS
        } else {
            &OMNI_LV1_DIRS
        };
        let damage = self.omni_damage();
        for dir in dirs {
            self.spawn(
                car_pos + *dir * OMNI_MUZZLE_DIST,
                *dir * PROJECTILE_SPEED,
                damage,
                WeaponKind::Omni,
            );
        }
    }

    /// Excess fire beyond the pool cap is dropped
    fn spawn(&mut self, pos: Vec2, vel: Vec2, damage: f32, source: WeaponKind) {
        if self.projectiles.len() >= MAX_PROJECTILES {
            return;
        }
        self.projectiles.push(Projectile {
            pos,
            vel,
            damage,
            source,
        });
    }

    /// Remove projectiles and re-arm timers; equip levels are kept
    pub fn clear_all(&mut self) {
        self.projectiles.clear();
        self.ammo_timer_ms = 0.0;
        self.omni_timer_ms = 0.0;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
