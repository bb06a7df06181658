//! Collision and target resolution: sphere-vs-box contact tests against the
//! static obstacles with side classification, plus target collection within
//! the pickup radius. Collision events are transient and auto-expire from
//! the telemetry list; duplicates within the cooldown window are suppressed.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::motion::Vehicle;
use crate::scene::{Classification, Obstacle, ObstacleKind, Target};

/// Distance at which a target is collected
pub const COLLECTION_RADIUS: f64 = 2.0;
/// Vehicle bounding-sphere radius for obstacle contact
pub const VEHICLE_RADIUS: f64 = 0.8;
/// Ticks during which repeat contacts with one obstacle are suppressed
const CONTACT_COOLDOWN_TICKS: u64 = 30;
/// Ticks a collision event stays in the telemetry list
const EVENT_EXPIRY_TICKS: u64 = 120;

/// Which side of the vehicle made contact
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactSide {
    /// Contact ahead of the vehicle
    Front,
    /// Contact behind the vehicle
    Back,
    /// Contact on the port side
    Left,
    /// Contact on the starboard side
    Right,
}

/// A time-stamped obstacle contact
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Identifier of the contacted obstacle
    pub obstacle_id: u32,
    /// Kind of the contacted obstacle
    pub kind: ObstacleKind,
    /// Side of the vehicle that made contact
    pub side: ContactSide,
    /// Tick the contact was registered
    pub tick: u64,
}

/// A transient target-collection event
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionEvent {
    /// Identifier of the collected target
    pub target_id: u32,
    /// Classification of the collected target
    pub classification: Classification,
    /// Tick the collection happened
    pub tick: u64,
}

/// Detects obstacle contact and tracks recent collision events
pub struct CollisionResolver {
    recent: Vec<CollisionEvent>,
    last_contact: HashMap<u32, u64>,
}

impl CollisionResolver {
    /// Creates a resolver with no event history
    pub fn new() -> Self {
        CollisionResolver {
            recent: Vec::new(),
            last_contact: HashMap::new(),
        }
    }

    /// Tests the vehicle against every obstacle, recording deduplicated
    /// contact events; also expires stale events. Returns the number of new
    /// contacts this tick.
    pub fn resolve(&mut self, vehicle: &Vehicle, obstacles: &[Obstacle], tick: u64) -> usize {
        self.recent
            .retain(|e| tick.saturating_sub(e.tick) < EVENT_EXPIRY_TICKS);

        let mut new_contacts = 0;
        for obstacle in obstacles {
            let closest = obstacle.closest_point(vehicle.position);
            let offset = closest - vehicle.position;
            if offset.norm() >= VEHICLE_RADIUS {
                continue;
            }

            if let Some(&last) = self.last_contact.get(&obstacle.id) {
                if tick.saturating_sub(last) < CONTACT_COOLDOWN_TICKS {
                    continue;
                }
            }
            self.last_contact.insert(obstacle.id, tick);

            let side = classify_side(vehicle, offset.x, offset.z);
            debug!(
                "Contact with obstacle {} ({:?}) on {:?} at tick {}",
                obstacle.id, obstacle.kind, side, tick
            );
            self.recent.push(CollisionEvent {
                obstacle_id: obstacle.id,
                kind: obstacle.kind,
                side,
                tick,
            });
            new_contacts += 1;
        }
        new_contacts
    }

    /// Recent, unexpired collision events for the UI
    pub fn recent(&self) -> &[CollisionEvent] {
        &self.recent
    }
}

impl Default for CollisionResolver {
    fn default() -> Self {
        CollisionResolver::new()
    }
}

/// Classifies the contact direction by projecting the horizontal contact
/// offset onto the vehicle's forward and right axes
fn classify_side(vehicle: &Vehicle, dx: f64, dz: f64) -> ContactSide {
    let forward = vehicle.forward();
    let right = vehicle.right();
    let along = forward.x * dx + forward.z * dz;
    let across = right.x * dx + right.z * dz;
    if along.abs() >= across.abs() {
        if along >= 0.0 {
            ContactSide::Front
        } else {
            ContactSide::Back
        }
    } else if across >= 0.0 {
        ContactSide::Right
    } else {
        ContactSide::Left
    }
}

/// Collects every active target within [`COLLECTION_RADIUS`] of the vehicle.
///
/// Collected targets transition at most once and are removed from the active
/// set; one event is emitted per collected target.
pub fn collect_targets(
    vehicle: &Vehicle,
    targets: &mut Vec<Target>,
    tick: u64,
) -> Vec<CollectionEvent> {
    let mut events = Vec::new();
    for target in targets.iter_mut() {
        let distance = (target.position - vehicle.position).norm();
        if distance < COLLECTION_RADIUS && target.mark_collected() {
            info!(
                "Collected {} (id {}) at tick {}",
                target.classification.name(),
                target.id,
                tick
            );
            events.push(CollectionEvent {
                target_id: target.id,
                classification: target.classification,
                tick,
            });
        }
    }
    targets.retain(|t| !t.collected);
    events
}
