//! Simulated sensing against the static scene: thermal detection of targets
//! and sonar ranging of obstacles. Shared detection types live here; the
//! scan implementations are in [`thermal`] and [`sonar`].

pub mod sonar;
pub mod thermal;

pub use sonar::sonar_scan;
pub use thermal::ThermalScanner;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::scene::Classification;

/// A simulated thermal detection of a body or warm object
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeatSource {
    /// World position of the detected entity
    pub position: Vector3<f64>,
    /// Emitted temperature in degrees Celsius
    pub temperature: f64,
    /// Classification of the detected entity
    pub classification: Classification,
    /// Distance from the vehicle at scan time
    pub distance: f64,
    /// Detection confidence in `[0, 1]`
    pub confidence: f64,
}

/// One sonar ray that intersected an obstacle
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SonarHit {
    /// Absolute ray angle in radians
    pub angle: f64,
    /// Distance to the nearest intersection
    pub distance: f64,
    /// World-space intersection point
    pub point: Vector3<f64>,
    /// Identifier of the intersected object
    pub object_id: u32,
}

/// One sonar ray that reached max range without hitting anything
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ClearDirection {
    /// Absolute ray angle in radians
    pub angle: f64,
    /// The max range the ray traveled unobstructed
    pub distance: f64,
}

/// Result of one full sonar sweep; stateless across ticks
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SonarSweep {
    /// Rays that hit an obstacle, in ray order
    pub hits: Vec<SonarHit>,
    /// Rays that ran clear to max range, in ray order
    pub clear: Vec<ClearDirection>,
}

impl SonarSweep {
    /// The clear direction with the greatest unobstructed range
    pub fn best_clear(&self) -> Option<&ClearDirection> {
        self.clear
            .iter()
            .max_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// The nearest obstacle hit of the sweep
    pub fn nearest_hit(&self) -> Option<&SonarHit> {
        self.hits
            .iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
