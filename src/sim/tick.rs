//! Run controller and the fixed timestep tick
//!
//! [`GameState`] owns every subsystem plus the run counters. [`tick`] advances
//! them in a fixed order: stage and difficulty, motion, hazard collision,
//! pickup collision, weapons, near-miss scoring, special-mode transitions.

use std::cmp::Ordering;

use glam::Vec2;
use serde::Serialize;

use super::collision::{self, ImpactOutcome};
use super::difficulty::{DifficultyMode, DifficultySelector};
use super::meteors::MeteorSpawner;
use super::modes::{BurstMode, InvincibilityMode};
use super::pickups::{LootSpawner, PowerupSpawner};
use super::rng::{RandomSource, SeededRandom};
use super::score::ScoreTracker;
use super::shockwave::PulseWeapon;
use super::stage::StageClock;
use super::state::{Car, GameEvent, GamePhase, LootKind, WeaponKind};
use super::weapons::{ProjectileWeapons, WeaponHit};
use crate::consts::*;
use crate::score_weights;
use crate::settings::Settings;

/// Autopilot: extra lane width around a meteor that counts as "in the way"
const AUTOPILOT_LANE_MARGIN: f32 = 12.0;
/// Autopilot: how far above the car a meteor is worth dodging
const AUTOPILOT_LOOKAHEAD: f32 = 220.0;
/// Autopilot: never chase pickups above this line
const AUTOPILOT_CHASE_MIN_Y: f32 = GAME_HEIGHT * 0.5;
/// Autopilot: pops invincibility once the shield is this low
const AUTOPILOT_PANIC_SHIELD: u8 = 3;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Steering intent, each axis in [-1, 1]
    pub direction: Vec2,
    /// Buy the next projectile weapon level
    pub buy_weapon: bool,
    /// Buy the next omni weapon level
    pub buy_omni: bool,
    pub activate_invincibility: bool,
    /// Start a new run (ignored until the current one is over)
    pub restart: bool,
    /// Idle/demo mode - autopilot plays the game
    pub idle_mode: bool,
}

/// HUD-facing view of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSnapshot {
    pub phase: GamePhase,
    pub stage: u32,
    /// Stage time left as MM:SS
    pub timer: String,
    pub final_countdown: bool,
    pub difficulty: String,
    pub intensity: u8,
    pub speed: u8,
    pub score: u64,
    pub combo: u32,
    pub gold: u32,
    pub diamonds: u32,
    pub rubies: u32,
    pub car_pos: Vec2,
    pub shield_level: u8,
    pub damage: f32,
    pub ammo_level: u8,
    pub omni_level: u8,
    pub burst_active: bool,
    pub burst_progress: f32,
    pub invincible: bool,
    pub invincibility_remaining_ms: f32,
    pub invincibility_charges: u32,
    pub meteors: usize,
    pub powerups: usize,
    pub loot: usize,
    pub projectiles: usize,
    pub ticks: u64,
}

/// Complete run state
#[derive(Debug, Clone)]
pub struct GameState<R: RandomSource = SeededRandom> {
    pub rng: R,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub car: Car,
    pub stage: StageClock,
    pub difficulty: DifficultySelector,
    pub meteors: MeteorSpawner,
    pub powerups: PowerupSpawner,
    pub loot: LootSpawner,
    pub score_tracker: ScoreTracker,
    pub weapons: ProjectileWeapons,
    pub pulse: PulseWeapon,
    pub burst: BurstMode,
    pub invincibility: InvincibilityMode,
    pub gold: u32,
    pub diamonds: u32,
    pub rubies: u32,
    pub score: u64,
    /// Stage banner time left; meteors are frozen and not spawned meanwhile
    pub stage_transition_ms: f32,
    /// Raised since the last [`GameState::drain_events`]
    pub events: Vec<GameEvent>,
}

impl GameState<SeededRandom> {
    pub fn new(seed: u64, settings: &Settings) -> Self {
        Self::with_rng(SeededRandom::new(seed), settings)
    }
}

impl<R: RandomSource> GameState<R> {
    pub fn with_rng(mut rng: R, settings: &Settings) -> Self {
        let powerups = PowerupSpawner::new(&mut rng);
        let loot = LootSpawner::new(&mut rng);
        let mut difficulty = DifficultySelector::new(DifficultyMode::from_settings(settings));
        difficulty.pick_for_stage(1, &mut rng);

        let mut state = Self {
            rng,
            phase: GamePhase::Playing,
            time_ticks: 0,
            car: Car::default(),
            stage: StageClock::default(),
            difficulty,
            meteors: MeteorSpawner::default(),
            powerups,
            loot,
            score_tracker: ScoreTracker::default(),
            weapons: ProjectileWeapons::default(),
            pulse: PulseWeapon::default(),
            burst: BurstMode::default(),
            invincibility: InvincibilityMode::default(),
            gold: 0,
            diamonds: 0,
            rubies: 0,
            score: 0,
            stage_transition_ms: 0.0,
            events: Vec::new(),
        };
        state.push_difficulty_event();
        state
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Buy the next projectile weapon level with gold
    pub fn equip_weapon(&mut self) -> bool {
        if !self.is_playing()
            || self.weapons.ammo_level >= AMMO_MAX_LEVEL
            || self.gold < AMMO_GOLD_COST
        {
            return false;
        }
        self.gold -= AMMO_GOLD_COST;
        self.weapons.ammo_level += 1;
        self.events.push(GameEvent::WeaponEquipped {
            weapon: WeaponKind::Ammo,
            level: self.weapons.ammo_level,
        });
        log::info!("Weapon equipped: level {}", self.weapons.ammo_level);
        true
    }

    /// Buy the next omni weapon level with rubies. The top level arms the pulse.
    pub fn upgrade_omni(&mut self) -> bool {
        if !self.is_playing()
            || self.weapons.omni_level >= OMNI_MAX_LEVEL
            || self.rubies < OMNI_RUBY_COST
        {
            return false;
        }
        self.rubies -= OMNI_RUBY_COST;
        self.weapons.omni_level += 1;
        self.events.push(GameEvent::WeaponEquipped {
            weapon: WeaponKind::Omni,
            level: self.weapons.omni_level,
        });
        if self.weapons.omni_level >= OMNI_MAX_LEVEL {
            self.events.push(GameEvent::WeaponEquipped {
                weapon: WeaponKind::Pulse,
                level: 1,
            });
        }
        log::info!("Omni weapon upgraded: level {}", self.weapons.omni_level);
        true
    }

    /// Spend diamonds on invincibility. The charge count comes from the
    /// diamonds held before paying.
    pub fn activate_invincibility(&mut self) -> bool {
        if !self.is_playing() || self.diamonds < SS_DIAMOND_COST {
            return false;
        }
        if !self.invincibility.activate(self.diamonds) {
            return false;
        }
        self.diamonds -= SS_DIAMOND_COST;
        self.events.push(GameEvent::InvincibilityStarted {
            charges: self.invincibility.total_charges(),
        });
        true
    }

    /// Reset every subsystem for a new run. Only honored once the current run
    /// is over; returns false otherwise, so repeated calls are no-ops.
    pub fn restart(&mut self) -> bool {
        if self.is_playing() {
            return false;
        }

        self.car = Car::default();
        self.meteors = MeteorSpawner::default();
        self.powerups.clear_all(&mut self.rng);
        self.loot.clear_all(&mut self.rng);
        self.difficulty.reset();
        self.difficulty.pick_for_stage(1, &mut self.rng);
        self.score_tracker.reset();
        self.stage.reset();
        self.weapons.reset();
        self.pulse.clear_all();
        self.burst.reset();
        self.invincibility.reset();
        self.gold = 0;
        self.diamonds = 0;
        self.rubies = 0;
        self.score = 0;
        self.stage_transition_ms = 0.0;
        self.time_ticks = 0;
        self.phase = GamePhase::Playing;

        self.events.push(GameEvent::Restarted);
        self.push_difficulty_event();
        log::info!("Run restarted");
        true
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            phase: self.phase,
            stage: self.stage.stage,
            timer: self.stage.format_time(),
            final_countdown: self.stage.is_final_countdown(),
            difficulty: self.difficulty.label().to_string(),
            intensity: self.difficulty.intensity,
            speed: self.difficulty.speed,
            score: self.score,
            combo: self.score_tracker.combo,
            gold: self.gold,
            diamonds: self.diamonds,
            rubies: self.rubies,
            car_pos: self.car.pos,
            shield_level: self.car.shield_level,
            damage: self.car.damage,
            ammo_level: self.weapons.ammo_level,
            omni_level: self.weapons.omni_level,
            burst_active: self.burst.active,
            burst_progress: self.burst.progress(),
            invincible: self.invincibility.active(),
            invincibility_remaining_ms: self.invincibility.remaining_ms,
            invincibility_charges: self.invincibility.total_charges(),
            meteors: self.meteors.meteors.len(),
            powerups: self.powerups.powerups.len(),
            loot: self.loot.loots.len(),
            projectiles: self.weapons.projectiles.len(),
            ticks: self.time_ticks,
        }
    }

    fn push_difficulty_event(&mut self) {
        self.events.push(GameEvent::DifficultyPicked {
            label: self.difficulty.label().to_string(),
            intensity: self.difficulty.intensity,
            speed: self.difficulty.speed,
        });
    }

    fn collect_loot(&mut self, kind: LootKind, pos: Vec2, magnet: bool) {
        match kind {
            LootKind::Gold => self.gold += 1,
            LootKind::Diamond => self.diamonds += 1,
            LootKind::Ruby => self.rubies += 1,
        }
        self.score += kind.score();
        self.events
            .push(GameEvent::LootCollected { pos, kind, magnet });
    }

    fn apply_weapon_hit(&mut self, hit: WeaponHit) {
        self.events.push(GameEvent::WeaponHit {
            pos: hit.pos,
            meteor_id: hit.meteor_id,
            source: hit.source,
            destroyed: hit.destroyed,
        });
        if !hit.destroyed {
            return;
        }

        let big = hit.diameter >= BIG_METEOR_DIAMETER;
        self.score += if big {
            score_weights::METEOR_BLAST_BIG
        } else {
            score_weights::METEOR_BLAST_SMALL
        };
        self.events.push(GameEvent::MeteorDestroyed {
            pos: hit.pos,
            meteor_id: hit.meteor_id,
            big,
        });
        log::debug!("Meteor {} destroyed by {:?}", hit.meteor_id, hit.source);

        if big && hit.diameter >= RUBY_DROP_MIN_DIAMETER && self.rng.chance(RUBY_DROP_CHANCE) {
            self.loot.spawn_drop(hit.pos, LootKind::Ruby, &mut self.rng);
            self.events.push(GameEvent::LootDropped {
                pos: hit.pos,
                kind: LootKind::Ruby,
            });
        }
    }
}

/// Advance the run by one fixed timestep
pub fn tick<R: RandomSource>(state: &mut GameState<R>, input: &TickInput, dt: f32) {
    if input.restart {
        state.restart();
    }

    match state.phase {
        GamePhase::GameOver => return,
        GamePhase::Dying { freeze_ms } => {
            let freeze_ms = freeze_ms - dt * 1000.0;
            if freeze_ms > 0.0 {
                state.phase = GamePhase::Dying { freeze_ms };
            } else {
                state.phase = GamePhase::GameOver;
                state.events.push(GameEvent::GameOver {
                    score: state.score,
                    stage: state.stage.stage,
                });
                log::info!(
                    "Game over at stage {} with score {}",
                    state.stage.stage,
                    state.score
                );
            }
            return;
        }
        GamePhase::Playing => {}
    }

    state.time_ticks += 1;
    let dt_ms = dt * 1000.0;

    let mut input = input.clone();
    if input.idle_mode {
        input.direction = autopilot_direction(state);
        autopilot_spend(state);
    }
    if input.buy_weapon {
        state.equip_weapon();
    }
    if input.buy_omni {
        state.upgrade_omni();
    }
    if input.activate_invincibility {
        state.activate_invincibility();
    }

    // Stage and difficulty
    if state.stage.advance(dt_ms) {
        let stage = state.stage.stage;
        state.difficulty.pick_for_stage(stage, &mut state.rng);
        state.meteors.clear_all();
        state.stage_transition_ms = STAGE_TRANSITION_MS;
        state.events.push(GameEvent::StageChanged { stage });
        state.push_difficulty_event();
        log::info!("Stage {stage} begins");
    }

    // Motion
    state.car.update(input.direction, dt);
    if state.stage_transition_ms > 0.0 {
        state.stage_transition_ms = (state.stage_transition_ms - dt_ms).max(0.0);
    } else {
        state.meteors.update(
            dt,
            state.difficulty.intensity,
            state.difficulty.speed,
            state.car.pos.x,
            &mut state.rng,
        );
    }
    state.powerups.update(dt, &mut state.rng);
    state
        .loot
        .update(dt, &state.meteors.meteors, state.car.pos.x, &mut state.rng);

    // Hazards
    if !state.burst.active && resolve_hazards(state) {
        return;
    }

    // Pickups
    resolve_pickups(state, dt);

    // Weapons
    let mut hits = state
        .weapons
        .update(dt, state.car.pos, &mut state.meteors.meteors);
    if state.weapons.omni_level >= OMNI_MAX_LEVEL {
        hits.extend(
            state
                .pulse
                .update(dt, state.car.pos, &mut state.meteors.meteors),
        );
    }
    for hit in hits {
        state.apply_weapon_hit(hit);
    }

    // Near-miss scoring
    let near_misses = state
        .score_tracker
        .update(&state.car, &mut state.meteors.meteors);
    for nm in near_misses {
        state.score += u64::from(nm.delta) * score_weights::NEAR_MISS_WEIGHT;
        state.events.push(GameEvent::NearMiss {
            pos: nm.pos,
            delta: nm.delta,
            combo: state.score_tracker.combo,
        });
    }

    // Special modes
    if state.burst.maybe_trigger(state.score_tracker.combo) {
        state.stage.paused = true;
        state.events.push(GameEvent::BurstStarted);
    }
    if state.burst.update(dt_ms) {
        state.stage.paused = false;
        state.score_tracker.reset();
        state.events.push(GameEvent::BurstEnded);
    }
    if state.invincibility.update(dt_ms) {
        if state.invincibility.active() {
            state.events.push(GameEvent::InvincibilityPeriodEnded {
                charges_left: state.invincibility.total_charges(),
            });
        } else {
            state.events.push(GameEvent::InvincibilityEnded);
            log::info!("Invincibility ended");
        }
    }
}

/// Resolve car-meteor contacts in list order (oldest spawn first).
/// Stops at the first fatal contact and returns true.
fn resolve_hazards<R: RandomSource>(state: &mut GameState<R>) -> bool {
    let absorbing = state.invincibility.active();

    for meteor in state.meteors.meteors.iter_mut() {
        if absorbing {
            if collision::absorb_meteor(&state.car, meteor) {
                state.events.push(GameEvent::ShieldAbsorbed {
                    pos: meteor.pos,
                    meteor_id: meteor.id,
                });
            }
            continue;
        }

        let Some(hit) = collision::check_meteor(&mut state.car, meteor) else {
            continue;
        };
        let pos = state.car.pos;
        match hit.outcome {
            ImpactOutcome::ShieldHit {
                shield_level,
                broken,
            } => {
                state.events.push(GameEvent::ShieldHit {
                    pos,
                    shield_level,
                    meteor_diameter: hit.meteor_diameter,
                });
                if broken {
                    state.events.push(GameEvent::ShieldBroken { pos });
                    log::info!("Shield broken");
                }
            }
            ImpactOutcome::DamageHit { damage } => {
                state.events.push(GameEvent::DamageHit { pos, damage });
            }
            ImpactOutcome::GameOver { cause } => {
                state.phase = GamePhase::Dying {
                    freeze_ms: GAME_OVER_FREEZE_MS,
                };
                state.car.input_disabled = true;
                state.events.push(GameEvent::CarDestroyed { pos });
                log::info!("Car destroyed by meteor {} ({cause:?})", hit.meteor_id);
                return true;
            }
        }
    }
    false
}

fn resolve_pickups<R: RandomSource>(state: &mut GameState<R>, dt: f32) {
    for powerup in state.powerups.powerups.iter_mut() {
        if collision::check_powerup(&mut state.car, powerup) {
            state.score += score_weights::SHIELD_PICKUP;
            state.events.push(GameEvent::PowerupCollected {
                pos: powerup.pos,
                shield_level: state.car.shield_level,
            });
        }
    }

    let mut collected: Vec<(LootKind, Vec2, bool)> = state
        .loot
        .loots
        .iter_mut()
        .filter_map(|l| collision::check_loot(&state.car, l).map(|kind| (kind, l.pos, false)))
        .collect();
    if state.burst.active {
        collected.extend(
            state
                .loot
                .magnet_update(dt, state.car.pos)
                .into_iter()
                .map(|p| (p.kind, p.pos, true)),
        );
    }
    for (kind, pos, magnet) in collected {
        state.collect_loot(kind, pos, magnet);
    }
}

/// Idle-mode steering: sidestep the closest meteor bearing down on the car,
/// otherwise chase the nearest pickup, otherwise drift back home
fn autopilot_direction<R: RandomSource>(state: &GameState<R>) -> Vec2 {
    let car = &state.car;

    let threat = state
        .meteors
        .meteors
        .iter()
        .filter(|m| !m.is_spent() && m.pos.y < car.pos.y + car.hit_radius)
        .filter(|m| {
            let lane = car.hit_radius + m.hit_radius + AUTOPILOT_LANE_MARGIN;
            (m.pos.x - car.pos.x).abs() < lane && car.pos.y - m.pos.y < AUTOPILOT_LOOKAHEAD
        })
        .max_by(|a, b| a.pos.y.partial_cmp(&b.pos.y).unwrap_or(Ordering::Equal));

    if let Some(m) = threat {
        let away = car.pos.x - m.pos.x;
        let mut dx = if away.abs() < 1.0 {
            if car.pos.x < GAME_WIDTH / 2.0 { 1.0 } else { -1.0 }
        } else {
            away.signum()
        };
        // Pinned against a wall: go around the other side
        let edge = CAR_DIAMETER / 2.0 + 1.0;
        if (dx < 0.0 && car.pos.x <= edge) || (dx > 0.0 && car.pos.x >= GAME_WIDTH - edge) {
            dx = -dx;
        }
        return Vec2::new(dx, 0.0);
    }

    let loot = state
        .loot
        .loots
        .iter()
        .filter(|l| !l.collected && !l.expired)
        .map(|l| l.pos);
    let powerups = state
        .powerups
        .powerups
        .iter()
        .filter(|p| !p.collected)
        .map(|p| p.pos);
    let target = loot
        .chain(powerups)
        .map(|p| Vec2::new(p.x, p.y.max(AUTOPILOT_CHASE_MIN_Y)))
        .min_by(|a, b| {
            a.distance_squared(car.pos)
                .partial_cmp(&b.distance_squared(car.pos))
                .unwrap_or(Ordering::Equal)
        })
        .unwrap_or_else(Car::start_position);

    let to_target = target - car.pos;
    if to_target.length() < 4.0 {
        Vec2::ZERO
    } else {
        to_target.normalize_or_zero()
    }
}

/// Idle-mode shopping: buy upgrades whenever affordable
fn autopilot_spend<R: RandomSource>(state: &mut GameState<R>) {
    state.equip_weapon();
    state.upgrade_omni();
    if state.car.shield_level <= AUTOPILOT_PANIC_SHIELD {
        state.activate_invincibility();
    }
}
