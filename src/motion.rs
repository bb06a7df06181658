//! Motion integrator: advances the vehicle pose one tick under turn-rate and
//! speed caps, environmental drift, boundary bounce-back and ballast-driven
//! depth. The vehicle never leaves `[-bound, bound]` on x/z, ballast stays in
//! `[0, 1]` and depth stays in `[-max_dive_depth, 0]`.

use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::navigation::{Drive, NavIntent, normalize_angle};

/// Maximum heading change per tick, radians
pub const MAX_TURN_RATE: f64 = 0.08;
/// Low-pass rate pulling ballast toward its target per tick
pub const BALLAST_RATE: f64 = 0.12;
/// Distance at which approach speed starts scaling down
const SLOWDOWN_RADIUS: f64 = 5.0;
/// How far inside the boundary the vehicle is reflected on contact
const BOUNCE_BACK: f64 = 0.2;
/// Perpendicular jitter applied on a bounce to avoid sticking to the wall
const BOUNCE_JITTER: f64 = 0.15;

/// The simulated rescue vehicle pose; exclusively owned by the core
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vehicle {
    /// World position; `y` is the (non-positive) depth
    pub position: Vector3<f64>,
    /// Heading (yaw) in radians; 0 points along +x
    pub heading: f64,
    /// Normalized ballast level in `[0, 1]` driving buoyancy
    pub ballast: f64,
}

impl Vehicle {
    /// A vehicle at the pool center, on the surface, heading +x
    pub fn new() -> Self {
        Vehicle {
            position: Vector3::zeros(),
            heading: 0.0,
            ballast: 0.0,
        }
    }

    /// Unit forward vector in the horizontal plane
    pub fn forward(&self) -> Vector3<f64> {
        Vector3::new(self.heading.cos(), 0.0, self.heading.sin())
    }

    /// Unit starboard vector in the horizontal plane; increasing heading
    /// (a right turn) swings the bow toward this direction
    pub fn right(&self) -> Vector3<f64> {
        Vector3::new(-self.heading.sin(), 0.0, self.heading.cos())
    }

    /// Current depth (non-positive)
    pub fn depth(&self) -> f64 {
        self.position.y
    }
}

impl Default for Vehicle {
    fn default() -> Self {
        Vehicle::new()
    }
}

/// Environmental constraints the integrator applies every tick
#[derive(Clone, Debug)]
pub struct Environment {
    /// Constant drift added to the position each tick
    pub drift: Vector3<f64>,
    /// Horizontal safety boundary on x/z
    pub bound: f64,
    /// Dive depth limit (positive units)
    pub max_dive_depth: f64,
}

/// Advances the vehicle one tick under the navigation intent
pub fn integrate(
    vehicle: &mut Vehicle,
    intent: &NavIntent,
    env: &Environment,
    rng: &mut impl Rng,
) {
    match &intent.drive {
        Drive::Hold => {}
        Drive::Seek { target, speed } => {
            let dx = target.x - vehicle.position.x;
            let dz = target.z - vehicle.position.z;
            let distance = (dx * dx + dz * dz).sqrt();
            if distance > 1e-6 {
                let desired = dz.atan2(dx);
                let delta = normalize_angle(desired - vehicle.heading)
                    .clamp(-MAX_TURN_RATE, MAX_TURN_RATE);
                vehicle.heading = normalize_angle(vehicle.heading + delta);
                // Approach speed scales down near the target to avoid overshoot
                let v = speed * (distance / SLOWDOWN_RADIUS).min(1.0);
                vehicle.position += vehicle.forward() * v;
            }
        }
        Drive::Direct { thrust, turn } => {
            vehicle.heading = normalize_angle(vehicle.heading + turn * MAX_TURN_RATE);
            let forward = vehicle.forward();
            vehicle.position += forward * *thrust;
        }
    }

    vehicle.position += env.drift;

    // Boundary bounce-back: reflect slightly inward with perpendicular jitter
    for axis in [0usize, 2] {
        let perpendicular = if axis == 0 { 2 } else { 0 };
        if vehicle.position[axis] > env.bound {
            vehicle.position[axis] = env.bound - BOUNCE_BACK;
            vehicle.position[perpendicular] += rng.gen_range(-BOUNCE_JITTER..BOUNCE_JITTER);
        } else if vehicle.position[axis] < -env.bound {
            vehicle.position[axis] = -env.bound + BOUNCE_BACK;
            vehicle.position[perpendicular] += rng.gen_range(-BOUNCE_JITTER..BOUNCE_JITTER);
        }
    }
    // Jitter must not itself breach the boundary
    vehicle.position.x = vehicle.position.x.clamp(-env.bound, env.bound);
    vehicle.position.z = vehicle.position.z.clamp(-env.bound, env.bound);

    // Ballast low-pass, then depth as a clamped function of ballast
    let target = intent.ballast_target.clamp(0.0, 1.0);
    vehicle.ballast += (target - vehicle.ballast) * BALLAST_RATE;
    vehicle.ballast = vehicle.ballast.clamp(0.0, 1.0);
    vehicle.position.y =
        (-vehicle.ballast * env.max_dive_depth).clamp(-env.max_dive_depth, 0.0);
}
