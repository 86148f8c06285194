//! Powerup and loot populations

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rng::RandomSource;
use super::state::{Loot, LootKind, Meteor, Powerup};
use crate::consts::*;

/// Shield-repair pickups on a jittered timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerupSpawner {
    pub powerups: Vec<Powerup>,
    /// Seconds until the next spawn
    spawn_timer: f32,
    next_id: u32,
}

impl PowerupSpawner {
    pub fn new(rng: &mut impl RandomSource) -> Self {
        Self {
            powerups: Vec::new(),
            spawn_timer: Self::next_interval(rng),
            next_id: 1,
        }
    }

    fn next_interval(rng: &mut impl RandomSource) -> f32 {
        let jitter = rng.float_between(-POWERUP_SPAWN_JITTER_MS, POWERUP_SPAWN_JITTER_MS);
        (POWERUP_SPAWN_INTERVAL_MS + jitter) / 1000.0
    }

    pub fn update(&mut self, dt: f32, rng: &mut impl RandomSource) {
        self.spawn_timer -= dt;
        if self.spawn_timer <= 0.0 {
            self.spawn(rng);
            self.spawn_timer = Self::next_interval(rng);
        }

        for p in &mut self.powerups {
            p.update(dt);
        }
        self.powerups.retain(|p| !p.is_off_screen() && !p.collected);
    }

    fn spawn(&mut self, rng: &mut impl RandomSource) {
        let r = POWERUP_RENDER_SIZE / 2.0;
        let x = rng.float_between(r, GAME_WIDTH - r);
        let id = self.next_id;
        self.next_id += 1;
        self.powerups.push(Powerup::new(id, Vec2::new(x, -r)));
        log::debug!("Powerup {id} spawned at x={x:.0}");
    }

    pub fn clear_all(&mut self, rng: &mut impl RandomSource) {
        self.powerups.clear();
        self.spawn_timer = Self::next_interval(rng);
    }
}

/// A loot item pulled in by the burst-mode magnet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnetPickup {
    pub kind: LootKind,
    pub pos: Vec2,
}

/// Ambient currency spawns plus bonus drops
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootSpawner {
    pub loots: Vec<Loot>,
    /// Seconds until the next ambient spawn
    spawn_timer: f32,
    next_id: u32,
}

impl LootSpawner {
    pub fn new(rng: &mut impl RandomSource) -> Self {
        Self {
            loots: Vec::new(),
            spawn_timer: Self::next_interval(rng),
            next_id: 1,
        }
    }

    fn next_interval(rng: &mut impl RandomSource) -> f32 {
        rng.float_between(LOOT_SPAWN_MIN_MS, LOOT_SPAWN_MAX_MS) / 1000.0
    }

    pub fn update(&mut self, dt: f32, meteors: &[Meteor], car_x: f32, rng: &mut impl RandomSource) {
        self.spawn_timer -= dt;
        if self.spawn_timer <= 0.0 {
            self.spawn(meteors, car_x, rng);
            self.spawn_timer = Self::next_interval(rng);
        }

        for l in &mut self.loots {
            l.update(dt);
        }
        self.loots
            .retain(|l| !l.is_off_screen() && !l.collected && !l.expired);
    }

    /// Weighted draw over [`LOOT_WEIGHTS`]
    pub fn pick_kind(rng: &mut impl RandomSource) -> LootKind {
        let roll = rng.next_unit();
        let mut cumulative = 0.0;
        for (kind, weight) in LootKind::ALL.iter().zip(LOOT_WEIGHTS) {
            cumulative += weight;
            if roll < cumulative {
                return *kind;
            }
        }
        LootKind::Gold
    }

    fn spawn(&mut self, meteors: &[Meteor], car_x: f32, rng: &mut impl RandomSource) {
        let kind = Self::pick_kind(rng);
        let r = LOOT_RENDER_SIZE / 2.0;

        let safe_from_car = CAR_DIAMETER / 2.0 + r + LOOT_CAR_CLEARANCE;
        let mut x = rng.float_between(r, GAME_WIDTH - r);
        let mut attempts = 0;
        while (x - car_x).abs() < safe_from_car && attempts < LOOT_PLACEMENT_ATTEMPTS {
            x = rng.float_between(r, GAME_WIDTH - r);
            attempts += 1;
        }

        let near_big = meteors.iter().any(|m| {
            m.is_big() && (m.pos.x - x).abs() < LOOT_SAFE_DISTANCE && m.pos.y < LOOT_SAFE_BAND_Y
        });
        if near_big {
            // Flip to the other half of the arena
            x = if x < GAME_WIDTH / 2.0 {
                rng.float_between(GAME_WIDTH / 2.0, GAME_WIDTH - r)
            } else {
                rng.float_between(r, GAME_WIDTH / 2.0)
            };
        }

        let id = self.next_id;
        self.next_id += 1;
        self.loots.push(Loot::new(id, kind, Vec2::new(x, -r)));
        log::debug!("Loot {id} ({}) spawned at x={x:.0}", kind.as_str());
    }

    /// Inject a bonus drop at a position, bypassing the ambient timer
    pub fn spawn_drop(&mut self, pos: Vec2, kind: LootKind, rng: &mut impl RandomSource) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.loots
            .push(Loot::new_drop(id, kind, pos, RUBY_DROP_LIFETIME_MS, rng));
        log::debug!("Loot {id} ({}) dropped at {pos}", kind.as_str());
        id
    }

    /// Pull all loot toward the car, faster as it closes in.
    /// Items that arrive are flagged collected and returned.
    pub fn magnet_update(&mut self, dt: f32, car_pos: Vec2) -> Vec<MagnetPickup> {
        let pickup_dist = LOOT_HIT_RADIUS + 10.0;
        let mut collected = Vec::new();

        for l in &mut self.loots {
            if l.collected || l.expired {
                continue;
            }
            let to_car = car_pos - l.pos;
            let dist = to_car.length();

            if dist <= pickup_dist {
                l.collected = true;
                collected.push(MagnetPickup {
                    kind: l.kind,
                    pos: l.pos,
                });
                continue;
            }

            let boost = (1.0 - dist / ULTIMATE_MAGNET_FALLOFF).max(0.0);
            let speed = ULTIMATE_MAGNET_SPEED + ULTIMATE_MAGNET_ACCEL * boost;
            let step = (speed * dt).min(dist);
            l.pos += to_car / dist * step;
        }
        collected
    }

    pub fn clear_all(&mut self, rng: &mut impl RandomSource) {
        self.loots.clear();
        self.spawn_timer = Self::next_interval(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::{ScriptedRandom, SeededRandom};

    #[test]
    fn test_powerup_interval_jitter_bounds() {
        let mut rng = SeededRandom::new(5);
        for _ in 0..500 {
            let secs = PowerupSpawner::next_interval(&mut rng);
            assert!((4.0..12.0).contains(&secs));
        }
    }

    #[test]
    fn test_powerups_fall_and_despawn() {
        let mut rng = ScriptedRandom::constant(0.0);
        let mut spawner = PowerupSpawner::new(&mut rng);
        // Minimum interval is 4s
        spawner.update(4.01, &mut rng);
        assert_eq!(spawner.powerups.len(), 1);

        spawner.powerups[0].collected = true;
        spawner.update(0.01, &mut rng);
        assert!(spawner.powerups.is_empty());
    }

    #[test]
    fn test_loot_weights() {
        assert_eq!(LootSpawner::pick_kind(&mut ScriptedRandom::constant(0.1)), LootKind::Gold);
        assert_eq!(LootSpawner::pick_kind(&mut ScriptedRandom::constant(0.75)), LootKind::Diamond);
        assert_eq!(LootSpawner::pick_kind(&mut ScriptedRandom::constant(0.95)), LootKind::Ruby);
    }

    #[test]
    fn test_loot_flips_away_from_big_meteor() {
        let mut rng = ScriptedRandom::constant(0.25);
        let big = Meteor::new(1, Vec2::new(206.0, 40.0), 50.0, 80.0, &mut rng);

        let mut spawner = LootSpawner::new(&mut rng);
        // kind, x=206 (left half, next to the big meteor), flipped draw
        let mut rng = ScriptedRandom::new(vec![0.1, 0.25, 0.5]);
        spawner.spawn(&[big], GAME_WIDTH - 20.0, &mut rng);
        let loot = &spawner.loots[0];
        assert!(loot.pos.x >= GAME_WIDTH / 2.0);
    }

    #[test]
    fn test_loot_spawn_avoids_car_column() {
        let mut spawner = LootSpawner::new(&mut ScriptedRandom::constant(0.5));
        let car_x = GAME_WIDTH / 2.0;
        let clearance = CAR_DIAMETER / 2.0 + LOOT_RENDER_SIZE / 2.0 + LOOT_CAR_CLEARANCE;

        // kind, x on the car twice, then a clear column
        let mut rng = ScriptedRandom::new(vec![0.1, 0.5, 0.5, 0.1]);
        spawner.spawn(&[], car_x, &mut rng);
        assert_eq!(rng.draws(), 4);
        assert!((spawner.loots[0].pos.x - car_x).abs() >= clearance);
    }

    #[test]
    fn test_loot_spawn_gives_up_after_bounded_retries() {
        let mut spawner = LootSpawner::new(&mut ScriptedRandom::constant(0.5));
        let car_x = GAME_WIDTH / 2.0;
        let mut rng = ScriptedRandom::constant(0.5);
        spawner.spawn(&[], car_x, &mut rng);
        assert_eq!(rng.draws(), 2 + LOOT_PLACEMENT_ATTEMPTS as usize);
        assert_eq!(spawner.loots.len(), 1);
        assert_eq!(spawner.loots[0].pos.x, car_x);
    }

    #[test]
    fn test_drop_expires() {
        let mut rng = ScriptedRandom::constant(0.5);
        let mut spawner = LootSpawner::new(&mut rng);
        spawner.spawn_drop(Vec2::new(300.0, 200.0), LootKind::Ruby, &mut rng);
        assert!(spawner.loots[0].is_drop());

        let steps = (RUBY_DROP_LIFETIME_MS / 100.0) as usize + 2;
        for _ in 0..steps {
            spawner.spawn_timer = 100.0;
            spawner.update(0.1, &[], 0.0, &mut rng);
        }
        assert!(spawner.loots.is_empty());
    }

    #[test]
    fn test_magnet_pulls_and_collects() {
        let mut rng = ScriptedRandom::constant(0.5);
        let mut spawner = LootSpawner::new(&mut rng);
        spawner.loots.push(Loot::new(1, LootKind::Gold, Vec2::new(100.0, 100.0)));
        let car = Vec2::new(400.0, 500.0);

        let start_dist = spawner.loots[0].pos.distance(car);
        assert!(spawner.magnet_update(0.1, car).is_empty());
        assert!(spawner.loots[0].pos.distance(car) < start_dist);

        let mut got = Vec::new();
        for _ in 0..100 {
            got.extend(spawner.magnet_update(0.05, car));
        }
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].kind, LootKind::Gold);
        assert!(spawner.loots[0].collected);
    }
}
