//! Thermal scanner: per-target range test with an effective range shrunk by
//! water turbidity and by depth separation. The scan runs on a fixed-tick
//! cooldown to bound per-frame cost; cached detections are served between
//! scans. First entry into range latches the target's detected flag.

use log::{debug, info};
use nalgebra::Vector3;

use super::HeatSource;
use crate::scene::Target;

/// Ticks between full thermal scans
const SCAN_COOLDOWN_TICKS: u64 = 5;
/// Floor for reported detection confidence
const MIN_CONFIDENCE: f64 = 0.1;

/// Effective thermal range for a target at `depth_delta` vertical separation.
///
/// Turbidity attenuates the base radius linearly; large depth separation
/// attenuates it hyperbolically.
pub fn effective_range(thermal_radius: f64, turbidity: f64, depth_delta: f64) -> f64 {
    let turbidity_factor = 1.0 - 0.5 * turbidity.clamp(0.0, 1.0);
    let depth_factor = 1.0 / (1.0 + 0.08 * depth_delta.abs());
    thermal_radius * turbidity_factor * depth_factor
}

/// Stateful thermal scanner with a fixed-tick cooldown
pub struct ThermalScanner {
    last_scan: Option<u64>,
    detections: Vec<HeatSource>,
}

impl ThermalScanner {
    /// Creates a scanner with an empty detection cache
    pub fn new() -> Self {
        ThermalScanner {
            last_scan: None,
            detections: Vec::new(),
        }
    }

    /// Runs a thermal scan if the cooldown has elapsed, refreshing the
    /// detection cache and latching detected flags on newly found targets.
    ///
    /// Returns the number of newly detected priority targets (the found
    /// counter increment).
    pub fn scan(
        &mut self,
        tick: u64,
        position: Vector3<f64>,
        targets: &mut [Target],
        thermal_radius: f64,
        turbidity: f64,
    ) -> usize {
        if let Some(last) = self.last_scan {
            if tick.saturating_sub(last) < SCAN_COOLDOWN_TICKS {
                return 0;
            }
        }
        self.last_scan = Some(tick);
        self.detections.clear();

        let mut newly_found = 0;
        for target in targets.iter_mut() {
            let depth_delta = target.position.y - position.y;
            let range = effective_range(thermal_radius, turbidity, depth_delta);
            let distance = (target.position - position).norm();
            if distance > range {
                continue;
            }

            let confidence = (1.0 - distance / range).max(MIN_CONFIDENCE);
            if target.mark_detected() {
                info!(
                    "Thermal contact: {} at {:.1}u (confidence {:.2})",
                    target.classification.name(),
                    distance,
                    confidence
                );
                if target.classification.is_priority() {
                    newly_found += 1;
                }
            }

            self.detections.push(HeatSource {
                position: target.position,
                temperature: target.classification.attributes().temperature,
                classification: target.classification,
                distance,
                confidence,
            });
        }

        debug!(
            "Thermal scan at tick {}: {} detections",
            tick,
            self.detections.len()
        );
        newly_found
    }

    /// Detections from the most recent scan
    pub fn detections(&self) -> &[HeatSource] {
        &self.detections
    }

    /// Drops any entries for targets no longer in the active set
    pub fn forget_collected(&mut self, targets: &[Target]) {
        self.detections
            .retain(|d| targets.iter().any(|t| t.position == d.position));
    }
}

impl Default for ThermalScanner {
    fn default() -> Self {
        ThermalScanner::new()
    }
}
