//! Navigation for the rescue vehicle
//!
//! This module holds the mode machinery and the per-tick decision loop that
//! turns sensor and waypoint data into a movement intent. The three
//! autonomous modes share one algorithm and differ only in their speed,
//! thermal radius and dive depth parameters.

pub mod controller;

pub use controller::NavController;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::SimConfig;

/// Battery percentage below which Emergency-Surface overrides every mode
pub const LOW_BATTERY_PCT: f64 = 20.0;

/// Navigation operating modes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavMode {
    /// Direct operator control; sensors are not consulted
    Manual,
    /// Balanced autonomous search at moderate depth
    AutoSearch,
    /// Fast, wide-sensor approach runs for located victims
    RescueMode,
    /// Slow full-depth search of the lower water column
    DeepSearch,
}

impl NavMode {
    /// Next mode in the explicit cyclic toggle order
    pub fn next(&self) -> NavMode {
        match self {
            NavMode::Manual => NavMode::AutoSearch,
            NavMode::AutoSearch => NavMode::RescueMode,
            NavMode::RescueMode => NavMode::DeepSearch,
            NavMode::DeepSearch => NavMode::Manual,
        }
    }

    /// Short display name used in status strings
    pub fn name(&self) -> &'static str {
        match self {
            NavMode::Manual => "manual",
            NavMode::AutoSearch => "auto search",
            NavMode::RescueMode => "rescue",
            NavMode::DeepSearch => "deep search",
        }
    }
}

/// Per-mode navigation parameters derived from the base configuration
#[derive(Clone, Copy, Debug)]
pub struct ModeProfile {
    /// Commanded cruise speed, units per tick
    pub speed: f64,
    /// Thermal detection radius for this mode
    pub thermal_radius: f64,
    /// Deepest dive permitted in this mode (positive units)
    pub max_dive_depth: f64,
}

impl ModeProfile {
    /// Builds the parameter set for `mode` from the base configuration
    pub fn for_mode(mode: NavMode, config: &SimConfig) -> Self {
        let (speed_scale, thermal_scale, dive_scale) = match mode {
            NavMode::Manual => (1.0, 1.0, 1.0),
            NavMode::AutoSearch => (1.0, 1.0, 0.75),
            NavMode::RescueMode => (1.4, 1.5, 1.0),
            NavMode::DeepSearch => (0.7, 0.8, 1.0),
        };
        ModeProfile {
            speed: config.vehicle_speed * speed_scale,
            thermal_radius: config.thermal_radius * thermal_scale,
            max_dive_depth: config.max_dive_depth * dive_scale,
        }
    }
}

/// Discrete operator input flags for manual mode
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ManualInput {
    /// Thrust forward
    pub forward: bool,
    /// Thrust backward
    pub backward: bool,
    /// Rotate left
    pub turn_left: bool,
    /// Rotate right
    pub turn_right: bool,
    /// Increase ballast (descend)
    pub dive: bool,
    /// Decrease ballast (ascend)
    pub surface: bool,
}

/// How the motion integrator should drive the vehicle this tick
#[derive(Clone, Debug)]
pub enum Drive {
    /// Hold position; only drift and ballast act
    Hold,
    /// Steer toward a world-space target at up to `speed` units per tick
    Seek {
        /// Target position
        target: Vector3<f64>,
        /// Speed cap for this leg
        speed: f64,
    },
    /// Direct thrust/turn from manual input
    Direct {
        /// Signed thrust in units per tick
        thrust: f64,
        /// Turn command in `[-1, 1]`, scaled by the max turn rate
        turn: f64,
    },
}

/// The navigation decision for one tick
#[derive(Clone, Debug)]
pub struct NavIntent {
    /// Drive command for the motion integrator
    pub drive: Drive,
    /// Ballast level the integrator should filter toward
    pub ballast_target: f64,
    /// Human-readable mission status for the UI
    pub status: String,
}

/// Ballast level that settles at `depth` given the mode's dive limit
pub fn ballast_for_depth(depth: f64, max_dive_depth: f64) -> f64 {
    if max_dive_depth <= 0.0 {
        0.0
    } else {
        (-depth / max_dive_depth).clamp(0.0, 1.0)
    }
}

/// Normalizes an angle to `[-pi, pi]`
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % std::f64::consts::TAU;
    if a > std::f64::consts::PI {
        a -= std::f64::consts::TAU;
    } else if a < -std::f64::consts::PI {
        a += std::f64::consts::TAU;
    }
    a
}
