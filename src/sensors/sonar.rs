//! Sonar sweep: evenly spaced horizontal rays cast through the
//! [`SpatialQuery`] interface. Each ray records its nearest obstacle
//! intersection or, absent a hit, registers max range as a clear direction.
//! No cross-tick memory.

use nalgebra::Vector3;
use std::f64::consts::TAU;

use super::{ClearDirection, SonarHit, SonarSweep};
use crate::scene::SpatialQuery;

/// Casts `num_rays` horizontal rays from `origin` at angles `i/num_rays * 2pi`
pub fn sonar_scan(
    query: &dyn SpatialQuery,
    origin: Vector3<f64>,
    num_rays: usize,
    max_range: f64,
) -> SonarSweep {
    let mut sweep = SonarSweep::default();
    for i in 0..num_rays {
        let angle = i as f64 / num_rays as f64 * TAU;
        let direction = Vector3::new(angle.cos(), 0.0, angle.sin());
        match query.cast_ray(origin, direction, max_range) {
            Some(hit) => sweep.hits.push(SonarHit {
                angle,
                distance: hit.distance,
                point: hit.point,
                object_id: hit.object_id,
            }),
            None => sweep.clear.push(ClearDirection {
                angle,
                distance: max_range,
            }),
        }
    }
    sweep
}
