//! Plasma pulse: an expanding ring fired from the car on a fixed cadence

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Meteor, WeaponKind};
use super::weapons::WeaponHit;
use crate::consts::{SHOCKWAVE_EXPAND_MS, SHOCKWAVE_INTERVAL_MS, SHOCKWAVE_MAX_RADIUS};

/// A ring in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActivePulse {
    origin: Vec2,
    elapsed_ms: f32,
    /// Meteors this ring already struck
    processed: HashSet<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseWeapon {
    timer_ms: f32,
    pulse: Option<ActivePulse>,
}

impl PulseWeapon {
    pub fn is_pulsing(&self) -> bool {
        self.pulse.is_some()
    }

    /// Current ring radius, if a pulse is in flight
    pub fn radius(&self) -> Option<f32> {
        self.pulse
            .as_ref()
            .map(|p| (p.elapsed_ms / SHOCKWAVE_EXPAND_MS).min(1.0) * SHOCKWAVE_MAX_RADIUS)
    }

    pub fn origin(&self) -> Option<Vec2> {
        self.pulse.as_ref().map(|p| p.origin)
    }

    /// Fire on schedule and expand the ring. Small meteors caught by the ring
    /// are destroyed outright; big ones lose half their remaining hit points.
    pub fn update(&mut self, dt: f32, car_pos: Vec2, meteors: &mut [Meteor]) -> Vec<WeaponHit> {
        let dt_ms = dt * 1000.0;

        self.timer_ms -= dt_ms;
        if self.timer_ms <= 0.0 {
            self.pulse = Some(ActivePulse {
                origin: car_pos,
                elapsed_ms: 0.0,
                processed: HashSet::new(),
            });
            self.timer_ms = SHOCKWAVE_INTERVAL_MS;
            log::debug!("Plasma pulse fired at {car_pos}");
        }

        let Some(pulse) = self.pulse.as_mut() else {
            return Vec::new();
        };

        pulse.elapsed_ms += dt_ms;
        let t = pulse.elapsed_ms / SHOCKWAVE_EXPAND_MS;
        if t >= 1.0 {
            self.pulse = None;
            return Vec::new();
        }
        let radius = t * SHOCKWAVE_MAX_RADIUS;

        let mut hits = Vec::new();
        for m in meteors.iter_mut() {
            if m.has_collided || m.is_destroyed() || pulse.processed.contains(&m.id) {
                continue;
            }
            if pulse.origin.distance(m.pos) > radius + m.hit_radius {
                continue;
            }
            pulse.processed.insert(m.id);

            m.hp = if m.is_big() { (m.hp / 2.0).floor() } else { 0.0 };
            hits.push(WeaponHit {
                meteor_id: m.id,
                pos: m.pos,
                diameter: m.diameter,
                source: WeaponKind::Pulse,
                destroyed: m.is_destroyed(),
            });
        }
        hits
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }
}
