//! Static scene the sensors and resolver query: pool walls and wreckage as
//! axis-aligned boxes, plus the collectible victim/debris targets. The sonar
//! reaches the scene only through the [`SpatialQuery`] trait so any geometry
//! backend (including the external 3D engine) can stand in.

use log::info;
use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::SimConfig;

/// Result of a spatial ray query
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RayHit {
    /// Distance from the ray origin to the intersection point
    pub distance: f64,
    /// World-space intersection point
    pub point: Vector3<f64>,
    /// Identifier of the intersected object
    pub object_id: u32,
}

/// Spatial query capability consumed from the scene-graph collaborator.
///
/// The simulation core never walks scene geometry directly; sonar sensing
/// and obstacle enumeration go through this interface.
#[cfg_attr(test, mockall::automock)]
pub trait SpatialQuery {
    /// Casts a ray and returns the nearest intersection within `max_distance`
    fn cast_ray(
        &self,
        origin: Vector3<f64>,
        direction: Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit>;

    /// Enumerates the static obstacles in the scene
    fn obstacles(&self) -> Vec<Obstacle>;
}

/// What kind of solid an obstacle is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// A pool boundary wall
    Wall,
    /// Sunken wreckage resting in the pool
    Wreckage,
}

/// Axis-aligned box obstacle
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Obstacle {
    /// Stable object identifier, reported in ray hits and collision events
    pub id: u32,
    /// Obstacle kind
    pub kind: ObstacleKind,
    /// Minimum corner of the box
    pub min: Vector3<f64>,
    /// Maximum corner of the box
    pub max: Vector3<f64>,
}

impl Obstacle {
    /// Builds an obstacle from a center point and half extents
    pub fn from_center(id: u32, kind: ObstacleKind, center: Vector3<f64>, half: Vector3<f64>) -> Self {
        Obstacle {
            id,
            kind,
            min: center - half,
            max: center + half,
        }
    }

    /// Point on or inside the box closest to `p`
    pub fn closest_point(&self, p: Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
            p.z.clamp(self.min.z, self.max.z),
        )
    }
}

/// Slab-method ray/AABB intersection. Returns the entry distance along the
/// ray, or `None` when the ray misses the box. A ray starting inside the
/// box intersects at distance 0.
pub fn ray_aabb(
    origin: Vector3<f64>,
    direction: Vector3<f64>,
    min: Vector3<f64>,
    max: Vector3<f64>,
) -> Option<f64> {
    let mut t_min: f64 = 0.0;
    let mut t_max = f64::INFINITY;

    for axis in 0..3 {
        if direction[axis].abs() < 1e-12 {
            // Ray parallel to this slab; must already lie within it
            if origin[axis] < min[axis] || origin[axis] > max[axis] {
                return None;
            }
        } else {
            let inv = 1.0 / direction[axis];
            let mut t0 = (min[axis] - origin[axis]) * inv;
            let mut t1 = (max[axis] - origin[axis]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
    }

    Some(t_min)
}

/// In-process scene backend: a fixed set of axis-aligned box obstacles
pub struct StaticScene {
    obstacles: Vec<Obstacle>,
}

impl StaticScene {
    /// Builds a scene from an explicit obstacle list (tests, custom layouts)
    pub fn with_obstacles(obstacles: Vec<Obstacle>) -> Self {
        StaticScene { obstacles }
    }

    /// Generates the pool scene: four boundary walls plus scattered wreckage
    pub fn generate(config: &SimConfig, rng: &mut impl Rng) -> Self {
        let half = config.pool_size / 2.0;
        let top = 1.0;
        let bottom = -config.water_depth;
        let mut obstacles = vec![
            Obstacle {
                id: 1,
                kind: ObstacleKind::Wall,
                min: Vector3::new(half, bottom, -half - 1.0),
                max: Vector3::new(half + 1.0, top, half + 1.0),
            },
            Obstacle {
                id: 2,
                kind: ObstacleKind::Wall,
                min: Vector3::new(-half - 1.0, bottom, -half - 1.0),
                max: Vector3::new(-half, top, half + 1.0),
            },
            Obstacle {
                id: 3,
                kind: ObstacleKind::Wall,
                min: Vector3::new(-half - 1.0, bottom, half),
                max: Vector3::new(half + 1.0, top, half + 1.0),
            },
            Obstacle {
                id: 4,
                kind: ObstacleKind::Wall,
                min: Vector3::new(-half - 1.0, bottom, -half - 1.0),
                max: Vector3::new(half + 1.0, top, -half),
            },
        ];

        // Wreckage boxes are kept clear of the spawn point at the center
        let wreck_count = config.debris_count / 2 + 2;
        let spread = (config.bound() * 0.9).max(0.1);
        let mut id = 5;
        let mut attempts = 0;
        while obstacles.len() < 4 + wreck_count && attempts < 200 {
            attempts += 1;
            let x = rng.gen_range(-spread..spread);
            let z = rng.gen_range(-spread..spread);
            if (x * x + z * z).sqrt() < 5.0 && spread > 6.0 {
                continue;
            }
            let depth = -config.water_depth * rng.gen_range(0.5..0.95);
            let half_extent = Vector3::new(
                rng.gen_range(0.6..1.6),
                rng.gen_range(0.5..1.2),
                rng.gen_range(0.6..1.6),
            );
            obstacles.push(Obstacle::from_center(
                id,
                ObstacleKind::Wreckage,
                Vector3::new(x, depth, z),
                half_extent,
            ));
            id += 1;
        }

        info!(
            "Generated scene: {} obstacles ({} wreckage)",
            obstacles.len(),
            wreck_count
        );
        StaticScene { obstacles }
    }

    /// Borrowed view of the obstacle list, used by the collision resolver
    pub fn obstacles_ref(&self) -> &[Obstacle] {
        &self.obstacles
    }
}

impl SpatialQuery for StaticScene {
    fn cast_ray(
        &self,
        origin: Vector3<f64>,
        direction: Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit> {
        let mut nearest: Option<RayHit> = None;
        for obstacle in &self.obstacles {
            if let Some(t) = ray_aabb(origin, direction, obstacle.min, obstacle.max) {
                if t <= max_distance && nearest.as_ref().map_or(true, |h| t < h.distance) {
                    nearest = Some(RayHit {
                        distance: t,
                        point: origin + direction * t,
                        object_id: obstacle.id,
                    });
                }
            }
        }
        nearest
    }

    fn obstacles(&self) -> Vec<Obstacle> {
        self.obstacles.clone()
    }
}

/// Classification of a heat/debris entity, with its fixed attributes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// A responsive person in the water
    Survivor,
    /// An injured, weakly moving person
    Injured,
    /// A body showing no thermal activity above ambient
    Deceased,
    /// A marine animal producing a confusable signature
    Animal,
    /// A sunken vehicle with residual engine heat
    SubmergedVehicle,
    /// Cold floating or sunken debris
    Debris,
}

/// Fixed attribute set carried by each classification
#[derive(Clone, Copy, Debug)]
pub struct ClassAttributes {
    /// Emitted temperature in degrees Celsius
    pub temperature: f64,
    /// Rescue priority, 1 (highest) to 4 (lowest)
    pub priority: u8,
    /// Characteristic size in world units
    pub size: f64,
}

impl Classification {
    /// Attribute table for this classification
    pub fn attributes(&self) -> ClassAttributes {
        match self {
            Classification::Survivor => ClassAttributes {
                temperature: 36.5,
                priority: 1,
                size: 1.7,
            },
            Classification::Injured => ClassAttributes {
                temperature: 35.0,
                priority: 1,
                size: 1.7,
            },
            Classification::Deceased => ClassAttributes {
                temperature: 24.0,
                priority: 2,
                size: 1.7,
            },
            Classification::Animal => ClassAttributes {
                temperature: 33.0,
                priority: 3,
                size: 1.2,
            },
            Classification::SubmergedVehicle => ClassAttributes {
                temperature: 28.0,
                priority: 2,
                size: 4.0,
            },
            Classification::Debris => ClassAttributes {
                temperature: 14.0,
                priority: 4,
                size: 2.0,
            },
        }
    }

    /// Short display name used in status strings and overlays
    pub fn name(&self) -> &'static str {
        match self {
            Classification::Survivor => "survivor",
            Classification::Injured => "injured swimmer",
            Classification::Deceased => "deceased",
            Classification::Animal => "marine animal",
            Classification::SubmergedVehicle => "submerged vehicle",
            Classification::Debris => "debris",
        }
    }

    /// Whether this classification counts toward the found-victims counter
    pub fn is_priority(&self) -> bool {
        self.attributes().priority <= 2
    }
}

/// A collectible search target (victim or debris)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Target {
    /// Stable target identifier
    pub id: u32,
    /// World position
    pub position: Vector3<f64>,
    /// Entity classification
    pub classification: Classification,
    /// Monotonic flag: set once on first thermal detection
    pub detected: bool,
    /// Monotonic flag: set once on collection, then removed from the set
    pub collected: bool,
}

impl Target {
    /// Creates an undetected, uncollected target
    pub fn new(id: u32, position: Vector3<f64>, classification: Classification) -> Self {
        Target {
            id,
            position,
            classification,
            detected: false,
            collected: false,
        }
    }

    /// Marks the target detected; returns `true` only on the first call
    pub fn mark_detected(&mut self) -> bool {
        if self.detected {
            false
        } else {
            self.detected = true;
            true
        }
    }

    /// Marks the target collected; returns `true` only on the first call
    pub fn mark_collected(&mut self) -> bool {
        if self.collected {
            false
        } else {
            self.collected = true;
            true
        }
    }
}

/// Places victim and debris targets in the pool from the seeded RNG
pub fn populate_targets(config: &SimConfig, rng: &mut impl Rng) -> Vec<Target> {
    let spread = config.bound() * 0.9;
    let mut targets = Vec::with_capacity(config.victim_count + config.debris_count);
    let mut id = 100;

    for _ in 0..config.victim_count {
        let classification = match rng.gen_range(0..10) {
            0..=4 => Classification::Survivor,
            5..=7 => Classification::Injured,
            8 => Classification::Animal,
            _ => Classification::Deceased,
        };
        let position = Vector3::new(
            rng.gen_range(-spread..spread),
            -config.max_dive_depth * rng.gen_range(0.0..0.9),
            rng.gen_range(-spread..spread),
        );
        targets.push(Target::new(id, position, classification));
        id += 1;
    }

    for i in 0..config.debris_count {
        let classification = if i % 3 == 2 {
            Classification::SubmergedVehicle
        } else {
            Classification::Debris
        };
        let position = Vector3::new(
            rng.gen_range(-spread..spread),
            -config.max_dive_depth * rng.gen_range(0.6..1.0),
            rng.gen_range(-spread..spread),
        );
        targets.push(Target::new(id, position, classification));
        id += 1;
    }

    targets
}
