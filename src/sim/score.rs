//! Near-miss detection and the combo meter

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Car, Meteor};
use crate::consts::{COMBO_MAX, NEAR_MISS_TIERS};

/// A near-miss award
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearMiss {
    pub meteor_id: u32,
    pub pos: Vec2,
    /// Combo points added (new tier minus previously awarded tier)
    pub delta: u32,
}

/// Combo meter fed by close passes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreTracker {
    /// 0-100, only reset explicitly
    pub combo: u32,
}

impl ScoreTracker {
    /// Award near-miss tiers for every live meteor. Returns the awards.
    pub fn update(&mut self, car: &Car, meteors: &mut [Meteor]) -> Vec<NearMiss> {
        let mut awards = Vec::new();

        for m in meteors.iter_mut() {
            if m.has_collided || m.is_destroyed() {
                continue;
            }
            let gap = car.pos.distance(m.pos) - car.hit_radius - m.hit_radius;
            if gap < 0.0 {
                continue;
            }

            // Tightest tier first
            for &(distance, points) in NEAR_MISS_TIERS.iter().rev() {
                if gap < distance && points > m.near_miss_awarded {
                    let delta = points - m.near_miss_awarded;
                    self.add_combo(delta);
                    m.near_miss_awarded = points;
                    awards.push(NearMiss {
                        meteor_id: m.id,
                        pos: m.pos,
                        delta,
                    });
                    break;
                }
            }
        }
        awards
    }

    pub fn add_combo(&mut self, points: u32) {
        self.combo = self.combo.saturating_add(points).min(COMBO_MAX);
    }

    pub fn is_full(&self) -> bool {
        self.combo >= COMBO_MAX
    }

    pub fn reset(&mut self) {
        self.combo = 0;
    }
}
