//! Naiad - autonomous underwater search-and-rescue simulation core
//!
//! This library provides the navigation and sensor-simulation core for an
//! underwater search-and-rescue vehicle simulator: mission planning over five
//! search patterns, simulated thermal and sonar sensing, a mode-driven
//! navigation decision loop, motion integration under drift and boundary
//! constraints, and collision/target resolution. Rendering, UI and the
//! scene-graph engine are external collaborators that consume this core
//! through read-only accessors and the [`scene::SpatialQuery`] interface.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod collision;
pub mod context;
pub mod events;
pub mod mission;
pub mod motion;
pub mod navigation;
pub mod scene;
pub mod sensors;

// Re-export commonly used items for easier access
pub use context::{Counters, SimulationContext, VehiclePose};
pub use mission::{MissionPlan, SearchPattern, Waypoint};
pub use motion::Vehicle;
pub use navigation::{ManualInput, NavMode};
pub use scene::{Classification, SpatialQuery, StaticScene, Target};
pub use sensors::{HeatSource, SonarSweep};

/// Safety margin kept between the vehicle (and every planned waypoint) and
/// the pool wall, in world units. Horizontal travel is confined to
/// `[-pool_size/2 + SAFETY_MARGIN, pool_size/2 - SAFETY_MARGIN]` on x and z.
pub const SAFETY_MARGIN: f64 = 6.0;

/// Main configuration structure for a simulation run
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimConfig {
    /// Side length of the square pool, in world units
    pub pool_size: f64,
    /// Water depth of the pool (positive number of units)
    pub water_depth: f64,
    /// Search pattern the mission planner starts with
    pub pattern: SearchPattern,
    /// Navigation mode the controller starts in
    pub mode: NavMode,
    /// Number of evenly spaced horizontal sonar rays per sweep
    pub sonar_rays: usize,
    /// Maximum sonar range, in world units
    pub sonar_range: f64,
    /// Base thermal detection radius, in world units
    pub thermal_radius: f64,
    /// Base vehicle speed, in units per tick
    pub vehicle_speed: f64,
    /// Maximum dive depth (positive number of units below the surface)
    pub max_dive_depth: f64,
    /// Number of victim targets placed in the scene
    pub victim_count: usize,
    /// Number of collectible debris targets placed in the scene
    pub debris_count: usize,
    /// Water turbidity in `[0, 1]`; reduces thermal sensing range
    pub turbidity: f64,
    /// Seed for the simulation RNG; `None` draws a fresh seed
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            pool_size: 50.0,
            water_depth: 10.0,
            pattern: SearchPattern::SurfaceSweep,
            mode: NavMode::AutoSearch,
            sonar_rays: 60,
            sonar_range: 15.0,
            thermal_radius: 12.0,
            vehicle_speed: 0.25,
            max_dive_depth: 8.0,
            victim_count: 4,
            debris_count: 6,
            turbidity: 0.2,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Loads a configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, SimError> {
        let file = std::fs::File::open(path).map_err(|e| SimError::Io(e.to_string()))?;
        let config: SimConfig =
            serde_yaml::from_reader(file).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration, returning a [`SimError::Config`] on bad values
    pub fn validate(&self) -> Result<(), SimError> {
        if self.pool_size <= 2.0 * SAFETY_MARGIN {
            return Err(SimError::Config(format!(
                "pool_size {} leaves no room inside the safety margin",
                self.pool_size
            )));
        }
        if self.water_depth <= 0.0 {
            return Err(SimError::Config("water_depth must be positive".to_string()));
        }
        if self.sonar_rays == 0 {
            return Err(SimError::Config("sonar_rays must be at least 1".to_string()));
        }
        if self.sonar_range <= 0.0 || self.thermal_radius <= 0.0 {
            return Err(SimError::Config(
                "sensor ranges must be positive".to_string(),
            ));
        }
        if self.vehicle_speed <= 0.0 {
            return Err(SimError::Config("vehicle_speed must be positive".to_string()));
        }
        if self.max_dive_depth <= 0.0 || self.max_dive_depth > self.water_depth {
            return Err(SimError::Config(format!(
                "max_dive_depth {} must lie in (0, water_depth]",
                self.max_dive_depth
            )));
        }
        if !(0.0..=1.0).contains(&self.turbidity) {
            return Err(SimError::Config("turbidity must lie in [0, 1]".to_string()));
        }
        Ok(())
    }

    /// Half pool size minus the safety margin; the horizontal travel bound
    pub fn bound(&self) -> f64 {
        self.pool_size / 2.0 - SAFETY_MARGIN
    }
}

/// Naiad error types
#[derive(Debug)]
pub enum SimError {
    /// Configuration value rejected during validation
    Config(String),
    /// Failure reading a configuration file
    Io(String),
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SimError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SimError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for SimError {}
