//! Mission planner: turns a search pattern into an ordered waypoint list over
//! the pool volume. Plans are regenerated wholesale on any pattern/mode/pool
//! change; the waypoint index always wraps so a finished sweep starts over.

use log::{info, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::SAFETY_MARGIN;
use crate::sensors::HeatSource;

/// Grid spacing for sweep-style patterns, in world units
const GRID_STEP: f64 = 6.0;
/// Number of points along the dive spiral
const SPIRAL_POINTS: usize = 36;
/// Fixed depth bands visited by the depth-layers pattern
const DEPTH_BANDS: [f64; 4] = [-1.0, -2.0, -4.0, -6.0];
/// Ring radius around a tracked heat source
const THERMAL_RING_RADIUS: f64 = 3.0;

/// The five supported search patterns
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchPattern {
    /// Grid sweep at the surface
    SurfaceSweep,
    /// Descending spiral from the surface to max dive depth
    SpiralDive,
    /// Full grid sweep repeated at fixed depth bands
    DepthLayers,
    /// Single mid-depth ring for debris survey
    DebrisNavigation,
    /// Rings around known heat sources; falls back to the surface sweep
    ThermalTracking,
}

impl SearchPattern {
    /// Short display name used in mission status strings
    pub fn name(&self) -> &'static str {
        match self {
            SearchPattern::SurfaceSweep => "surface sweep",
            SearchPattern::SpiralDive => "spiral dive",
            SearchPattern::DepthLayers => "depth layers",
            SearchPattern::DebrisNavigation => "debris survey",
            SearchPattern::ThermalTracking => "thermal tracking",
        }
    }
}

/// Which planning phase produced a waypoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchKind {
    /// Part of a surface or layered grid sweep
    Sweep,
    /// Part of the dive spiral
    Spiral,
    /// Inside a depth band
    Layer,
    /// Explicit transition into a new depth band
    LayerTransition,
    /// Part of the mid-depth debris ring
    Ring,
    /// Ring point around a tracked heat source
    Thermal,
    /// Fallback center waypoint for an otherwise empty plan
    Fallback,
}

/// A target position + depth the navigation controller steers toward
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Waypoint {
    /// World position; `y` is the (non-positive) depth
    pub position: Vector3<f64>,
    /// Planning phase tag
    pub kind: SearchKind,
    /// Index into the known-heat-source list this waypoint orbits, if any
    pub heat_ref: Option<usize>,
}

impl Waypoint {
    fn at(x: f64, depth: f64, z: f64, kind: SearchKind) -> Self {
        Waypoint {
            position: Vector3::new(x, depth, z),
            kind,
            heat_ref: None,
        }
    }
}

/// Ordered waypoint list implementing one search pattern
#[derive(Clone, Debug)]
pub struct MissionPlan {
    waypoints: Vec<Waypoint>,
    current: usize,
    visited: usize,
    pattern: SearchPattern,
}

impl MissionPlan {
    /// Generates a fresh plan for `pattern`; index starts at 0
    pub fn new(
        pattern: SearchPattern,
        pool_size: f64,
        max_dive_depth: f64,
        known_sources: &[HeatSource],
    ) -> Self {
        let waypoints = generate(pattern, pool_size, max_dive_depth, known_sources);
        info!(
            "Mission plan generated: {} ({} waypoints)",
            pattern.name(),
            waypoints.len()
        );
        MissionPlan {
            waypoints,
            current: 0,
            visited: 0,
            pattern,
        }
    }

    /// Discards all prior state and regenerates the plan from scratch
    pub fn regenerate(
        &mut self,
        pattern: SearchPattern,
        pool_size: f64,
        max_dive_depth: f64,
        known_sources: &[HeatSource],
    ) {
        *self = MissionPlan::new(pattern, pool_size, max_dive_depth, known_sources);
    }

    /// The waypoint the vehicle is currently steering toward
    pub fn current_waypoint(&self) -> &Waypoint {
        &self.waypoints[self.current % self.waypoints.len()]
    }

    /// Advances to the next waypoint, wrapping at the end of the list
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.waypoints.len();
        self.visited = (self.visited + 1).min(self.waypoints.len());
    }

    /// Zero-based index of the current waypoint
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Number of waypoints in the plan
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// A plan always carries at least the fallback waypoint
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Pattern this plan was generated for
    pub fn pattern(&self) -> SearchPattern {
        self.pattern
    }

    /// Fraction of the plan visited so far, in `[0, 1]`
    pub fn area_searched(&self) -> f64 {
        if self.waypoints.is_empty() {
            0.0
        } else {
            self.visited as f64 / self.waypoints.len() as f64
        }
    }

    /// All waypoints, for overlay rendering
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
}

/// Generates the ordered waypoint list for `pattern`.
///
/// Every waypoint is kept inside `[-bound, bound]` on x and z, with
/// `bound = pool_size/2 - SAFETY_MARGIN`; out-of-bounds candidates are
/// rejected. An empty result falls back to a single center waypoint.
pub fn generate(
    pattern: SearchPattern,
    pool_size: f64,
    max_dive_depth: f64,
    known_sources: &[HeatSource],
) -> Vec<Waypoint> {
    let bound = pool_size / 2.0 - SAFETY_MARGIN;
    let mut waypoints = match pattern {
        SearchPattern::SurfaceSweep => grid_at_depth(bound, 0.0, SearchKind::Sweep),
        SearchPattern::SpiralDive => spiral_dive(bound, max_dive_depth),
        SearchPattern::DepthLayers => depth_layers(bound, max_dive_depth),
        SearchPattern::DebrisNavigation => debris_ring(pool_size, bound, max_dive_depth),
        SearchPattern::ThermalTracking => {
            if known_sources.is_empty() {
                grid_at_depth(bound, 0.0, SearchKind::Sweep)
            } else {
                thermal_rings(bound, known_sources)
            }
        }
    };

    let before = waypoints.len();
    waypoints.retain(|w| w.position.x.abs() <= bound && w.position.z.abs() <= bound);
    if waypoints.len() < before {
        warn!(
            "Rejected {} out-of-bounds waypoints for {}",
            before - waypoints.len(),
            pattern.name()
        );
    }

    if waypoints.is_empty() {
        warn!("{} produced an empty plan, falling back to center", pattern.name());
        waypoints.push(Waypoint::at(0.0, 0.0, 0.0, SearchKind::Fallback));
    }

    waypoints
}

/// Serpentine grid over `[-bound, bound]^2` at a fixed depth
fn grid_at_depth(bound: f64, depth: f64, kind: SearchKind) -> Vec<Waypoint> {
    let mut xs = Vec::new();
    let mut x = -bound;
    while x <= bound + 1e-9 {
        xs.push(x);
        x += GRID_STEP;
    }

    let mut waypoints = Vec::with_capacity(xs.len() * xs.len());
    for (row, &gx) in xs.iter().enumerate() {
        if row % 2 == 0 {
            for &gz in &xs {
                waypoints.push(Waypoint::at(gx, depth, gz, kind));
            }
        } else {
            for &gz in xs.iter().rev() {
                waypoints.push(Waypoint::at(gx, depth, gz, kind));
            }
        }
    }
    waypoints
}

/// Spiral from the surface down to max dive depth, bracketed by surface points
fn spiral_dive(bound: f64, max_dive_depth: f64) -> Vec<Waypoint> {
    let mut waypoints = vec![Waypoint::at(0.0, 0.0, 0.0, SearchKind::Spiral)];
    for i in 0..SPIRAL_POINTS {
        let f = i as f64 / SPIRAL_POINTS as f64;
        let angle = f * 4.0 * PI;
        let radius = f * bound;
        let depth = -f * max_dive_depth;
        waypoints.push(Waypoint::at(
            radius * angle.cos(),
            depth,
            radius * angle.sin(),
            SearchKind::Spiral,
        ));
    }
    waypoints.push(Waypoint::at(0.0, 0.0, 0.0, SearchKind::Spiral));
    waypoints
}

/// Full grid sweep per depth band, each band preceded by a transition waypoint
fn depth_layers(bound: f64, max_dive_depth: f64) -> Vec<Waypoint> {
    let mut waypoints = Vec::new();
    for &band in DEPTH_BANDS.iter() {
        if -band > max_dive_depth {
            continue;
        }
        waypoints.push(Waypoint::at(0.0, band, 0.0, SearchKind::LayerTransition));
        waypoints.extend(grid_at_depth(bound, band, SearchKind::Layer));
    }
    waypoints
}

/// One ring of waypoints at mid-depth for debris survey
fn debris_ring(pool_size: f64, bound: f64, max_dive_depth: f64) -> Vec<Waypoint> {
    let radius = (0.3 * pool_size).min(bound);
    let depth = -max_dive_depth / 2.0;
    let count = 12;
    (0..count)
        .map(|i| {
            let angle = i as f64 / count as f64 * 2.0 * PI;
            Waypoint::at(
                radius * angle.cos(),
                depth,
                radius * angle.sin(),
                SearchKind::Ring,
            )
        })
        .collect()
}

/// Up to 8 ring waypoints around each known heat source, at its depth
fn thermal_rings(bound: f64, known_sources: &[HeatSource]) -> Vec<Waypoint> {
    let mut waypoints = Vec::new();
    for (idx, source) in known_sources.iter().enumerate() {
        for i in 0..8 {
            let angle = i as f64 * PI / 4.0;
            let x = source.position.x + THERMAL_RING_RADIUS * angle.cos();
            let z = source.position.z + THERMAL_RING_RADIUS * angle.sin();
            if x.abs() > bound || z.abs() > bound {
                continue;
            }
            waypoints.push(Waypoint {
                position: Vector3::new(x, source.position.y, z),
                kind: SearchKind::Thermal,
                heat_ref: Some(idx),
            });
        }
    }
    waypoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Classification;
    use rstest::rstest;

    fn source_at(x: f64, depth: f64, z: f64) -> HeatSource {
        HeatSource {
            position: Vector3::new(x, depth, z),
            temperature: 36.5,
            classification: Classification::Survivor,
            distance: 5.0,
            confidence: 0.9,
        }
    }

    #[rstest]
    #[case(SearchPattern::SurfaceSweep)]
    #[case(SearchPattern::SpiralDive)]
    #[case(SearchPattern::DepthLayers)]
    #[case(SearchPattern::DebrisNavigation)]
    #[case(SearchPattern::ThermalTracking)]
    fn all_patterns_stay_in_bounds(#[case] pattern: SearchPattern) {
        let waypoints = generate(pattern, 50.0, 8.0, &[source_at(10.0, -3.0, 4.0)]);
        assert!(!waypoints.is_empty());
        for w in &waypoints {
            assert!(w.position.x.abs() <= 19.0, "x out of bounds: {:?}", w);
            assert!(w.position.z.abs() <= 19.0, "z out of bounds: {:?}", w);
        }
    }

    // A 50-unit pool with the 6-unit margin gives a grid in [-19, 19]
    #[test]
    fn surface_sweep_grid_at_surface() {
        let waypoints = generate(SearchPattern::SurfaceSweep, 50.0, 8.0, &[]);
        assert!(!waypoints.is_empty());
        for w in &waypoints {
            assert_eq!(w.position.y, 0.0);
            assert!(w.position.x >= -19.0 && w.position.x <= 19.0);
            assert!(w.position.z >= -19.0 && w.position.z <= 19.0);
        }
    }

    #[test]
    fn plan_generation_is_deterministic() {
        let a = generate(SearchPattern::DepthLayers, 50.0, 8.0, &[]);
        let b = generate(SearchPattern::DepthLayers, 50.0, 8.0, &[]);
        assert_eq!(a.len(), b.len());
        for (wa, wb) in a.iter().zip(b.iter()) {
            assert_eq!(wa.position, wb.position);
            assert_eq!(wa.kind, wb.kind);
        }
    }

    #[test]
    fn spiral_is_bracketed_by_surface_points() {
        let waypoints = generate(SearchPattern::SpiralDive, 50.0, 8.0, &[]);
        assert_eq!(waypoints.first().unwrap().position.y, 0.0);
        assert_eq!(waypoints.last().unwrap().position.y, 0.0);
        let deepest = waypoints
            .iter()
            .map(|w| w.position.y)
            .fold(f64::INFINITY, f64::min);
        assert!(deepest < -7.0 && deepest >= -8.0);
    }

    #[test]
    fn depth_layers_have_transitions() {
        let waypoints = generate(SearchPattern::DepthLayers, 50.0, 8.0, &[]);
        let transitions: Vec<_> = waypoints
            .iter()
            .filter(|w| w.kind == SearchKind::LayerTransition)
            .collect();
        assert_eq!(transitions.len(), 4);
        // Each transition arrives before its band's sweep waypoints
        assert_eq!(waypoints[0].kind, SearchKind::LayerTransition);
    }

    #[test]
    fn depth_layers_skips_bands_below_max_dive() {
        let waypoints = generate(SearchPattern::DepthLayers, 50.0, 3.0, &[]);
        for w in &waypoints {
            assert!(w.position.y >= -3.0);
        }
    }

    #[test]
    fn thermal_tracking_falls_back_to_sweep() {
        let tracked = generate(SearchPattern::ThermalTracking, 50.0, 8.0, &[]);
        let sweep = generate(SearchPattern::SurfaceSweep, 50.0, 8.0, &[]);
        assert_eq!(tracked.len(), sweep.len());
    }

    #[test]
    fn thermal_ring_orbits_source_at_depth() {
        let waypoints = generate(
            SearchPattern::ThermalTracking,
            50.0,
            8.0,
            &[source_at(5.0, -4.0, -3.0)],
        );
        assert_eq!(waypoints.len(), 8);
        for w in &waypoints {
            assert_eq!(w.position.y, -4.0);
            assert_eq!(w.heat_ref, Some(0));
            let dx = w.position.x - 5.0;
            let dz = w.position.z + 3.0;
            assert!(((dx * dx + dz * dz).sqrt() - THERMAL_RING_RADIUS).abs() < 1e-9);
        }
    }

    #[test]
    fn ring_near_wall_drops_outside_points() {
        // Source close to the boundary: part of its ring falls outside
        let waypoints = generate(
            SearchPattern::ThermalTracking,
            50.0,
            8.0,
            &[source_at(18.0, -2.0, 0.0)],
        );
        assert!(!waypoints.is_empty());
        assert!(waypoints.len() < 8);
    }

    #[test]
    fn empty_plan_falls_back_to_center() {
        // All ring points around a far-out source are rejected
        let waypoints = generate(
            SearchPattern::ThermalTracking,
            50.0,
            8.0,
            &[source_at(40.0, -2.0, 40.0)],
        );
        assert_eq!(waypoints.len(), 1);
        assert_eq!(waypoints[0].kind, SearchKind::Fallback);
        assert_eq!(waypoints[0].position, Vector3::zeros());
    }

    #[test]
    fn waypoint_index_wraps() {
        let mut plan = MissionPlan::new(SearchPattern::DebrisNavigation, 50.0, 8.0, &[]);
        let len = plan.len();
        for _ in 0..len {
            plan.advance();
        }
        assert_eq!(plan.current_index(), 0);
        assert!((plan.area_searched() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn regenerate_resets_index() {
        let mut plan = MissionPlan::new(SearchPattern::SurfaceSweep, 50.0, 8.0, &[]);
        plan.advance();
        plan.advance();
        plan.regenerate(SearchPattern::SpiralDive, 50.0, 8.0, &[]);
        assert_eq!(plan.current_index(), 0);
        assert_eq!(plan.pattern(), SearchPattern::SpiralDive);
        assert_eq!(plan.area_searched(), 0.0);
    }
}
