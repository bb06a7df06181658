//! Per-tick navigation decision loop. Priority order: emergency surface,
//! manual input, out-of-bounds recovery, heat-source approach, local sonar
//! avoidance, waypoint following. Out-of-bounds and repeated invalid
//! waypoints are recoverable faults handled by requesting a replan; nothing
//! here returns an error.

use log::{debug, info, warn};
use nalgebra::Vector3;

use super::{
    Drive, LOW_BATTERY_PCT, ManualInput, ModeProfile, NavIntent, NavMode, ballast_for_depth,
    normalize_angle,
};
use crate::mission::MissionPlan;
use crate::motion::Vehicle;
use crate::sensors::{HeatSource, SonarSweep};

/// Distance below which a waypoint counts as reached
pub const ARRIVAL_RADIUS: f64 = 2.0;
/// Sonar hits closer than this and roughly ahead trigger avoidance
const AVOID_DISTANCE: f64 = 6.0;
/// Half-angle of the "ahead" cone for avoidance checks, radians
const AHEAD_CONE: f64 = 0.5;
/// How far along the clear direction the avoidance target is placed
const AVOID_STEP: f64 = 8.0;
/// Consecutive invalid waypoints before a full plan regeneration
const MAX_WAYPOINT_STRIKES: u32 = 3;
/// Ballast step per tick under manual dive/surface input
const MANUAL_BALLAST_STEP: f64 = 0.05;

/// Mode-driven navigation controller
pub struct NavController {
    mode: NavMode,
    waypoint_strikes: u32,
    replan_requested: bool,
}

impl NavController {
    /// Creates a controller starting in `mode`
    pub fn new(mode: NavMode) -> Self {
        NavController {
            mode,
            waypoint_strikes: 0,
            replan_requested: false,
        }
    }

    /// Current navigation mode
    pub fn mode(&self) -> NavMode {
        self.mode
    }

    /// Switches mode; resets fault tracking, the owner replans
    pub fn set_mode(&mut self, mode: NavMode) {
        if mode != self.mode {
            info!("Navigation mode: {} -> {}", self.mode.name(), mode.name());
            self.mode = mode;
            self.waypoint_strikes = 0;
        }
    }

    /// Takes and clears the pending replan request
    pub fn take_replan_request(&mut self) -> bool {
        std::mem::take(&mut self.replan_requested)
    }

    /// Runs the per-tick decision and returns the movement intent.
    ///
    /// The battery check is level-triggered: it is re-evaluated every tick
    /// and overrides every mode, including manual.
    pub fn decide(
        &mut self,
        vehicle: &Vehicle,
        plan: &mut MissionPlan,
        detections: &[HeatSource],
        sweep: Option<&SonarSweep>,
        battery_pct: f64,
        bound: f64,
        profile: &ModeProfile,
        input: &ManualInput,
    ) -> NavIntent {
        if battery_pct < LOW_BATTERY_PCT {
            warn!("Battery at {:.0}%, forcing emergency surface", battery_pct);
            return NavIntent {
                drive: Drive::Hold,
                ballast_target: 0.0,
                status: "EMERGENCY SURFACE".to_string(),
            };
        }

        if self.mode == NavMode::Manual {
            return self.manual_intent(vehicle, profile, input);
        }

        // Recoverable fault: drift has carried the vehicle out of bounds
        if vehicle.position.x.abs() > bound || vehicle.position.z.abs() > bound {
            warn!(
                "Vehicle out of bounds at ({:.1}, {:.1}), requesting replan",
                vehicle.position.x, vehicle.position.z
            );
            self.replan_requested = true;
            return NavIntent {
                drive: Drive::Seek {
                    target: Vector3::new(0.0, vehicle.position.y, 0.0),
                    speed: profile.speed,
                },
                ballast_target: vehicle.ballast,
                status: "out of bounds - replanning".to_string(),
            };
        }

        // A detected heat source preempts the mission plan
        if let Some(source) = select_heat_target(detections) {
            return NavIntent {
                drive: Drive::Seek {
                    target: source.position,
                    speed: profile.speed,
                },
                ballast_target: ballast_for_depth(source.position.y, profile.max_dive_depth),
                status: format!("approaching {}", source.classification.name()),
            };
        }

        // Local avoidance: only when no heat-source target is active
        if let Some(sweep) = sweep {
            if let Some(intent) = self.avoidance_intent(vehicle, sweep, profile) {
                return intent;
            }
        }

        self.waypoint_intent(vehicle, plan, bound, profile)
    }

    fn manual_intent(
        &self,
        vehicle: &Vehicle,
        profile: &ModeProfile,
        input: &ManualInput,
    ) -> NavIntent {
        let thrust =
            (input.forward as i8 - input.backward as i8) as f64 * profile.speed;
        let turn = (input.turn_right as i8 - input.turn_left as i8) as f64;
        let ballast_delta =
            (input.dive as i8 - input.surface as i8) as f64 * MANUAL_BALLAST_STEP;
        NavIntent {
            drive: Drive::Direct { thrust, turn },
            ballast_target: (vehicle.ballast + ballast_delta).clamp(0.0, 1.0),
            status: "manual control".to_string(),
        }
    }

    fn avoidance_intent(
        &self,
        vehicle: &Vehicle,
        sweep: &SonarSweep,
        profile: &ModeProfile,
    ) -> Option<NavIntent> {
        let blocked = sweep.hits.iter().any(|h| {
            normalize_angle(h.angle - vehicle.heading).abs() < AHEAD_CONE
                && h.distance < AVOID_DISTANCE
        });
        if !blocked {
            return None;
        }

        let clear = sweep.best_clear()?;
        let target = vehicle.position
            + Vector3::new(clear.angle.cos(), 0.0, clear.angle.sin()) * AVOID_STEP;
        debug!(
            "Obstacle ahead, biasing toward clear direction {:.2} rad",
            clear.angle
        );
        Some(NavIntent {
            drive: Drive::Seek {
                target,
                speed: profile.speed,
            },
            ballast_target: vehicle.ballast,
            status: "avoiding obstacle".to_string(),
        })
    }

    fn waypoint_intent(
        &mut self,
        vehicle: &Vehicle,
        plan: &mut MissionPlan,
        bound: f64,
        profile: &ModeProfile,
    ) -> NavIntent {
        let waypoint = plan.current_waypoint().clone();

        // Repeated invalid waypoints escalate to a full regeneration
        if waypoint.position.x.abs() > bound || waypoint.position.z.abs() > bound {
            self.waypoint_strikes += 1;
            warn!(
                "Invalid waypoint {:?} (strike {})",
                waypoint.position, self.waypoint_strikes
            );
            plan.advance();
            if self.waypoint_strikes >= MAX_WAYPOINT_STRIKES {
                self.waypoint_strikes = 0;
                self.replan_requested = true;
            }
            return NavIntent {
                drive: Drive::Hold,
                ballast_target: vehicle.ballast,
                status: "skipping invalid waypoint".to_string(),
            };
        }
        self.waypoint_strikes = 0;

        let dx = waypoint.position.x - vehicle.position.x;
        let dz = waypoint.position.z - vehicle.position.z;
        if (dx * dx + dz * dz).sqrt() < ARRIVAL_RADIUS {
            debug!("Waypoint {} reached", plan.current_index());
            plan.advance();
        }

        let waypoint = plan.current_waypoint().clone();
        NavIntent {
            drive: Drive::Seek {
                target: waypoint.position,
                speed: profile.speed,
            },
            ballast_target: ballast_for_depth(waypoint.position.y, profile.max_dive_depth),
            status: format!(
                "{} search: waypoint {}/{}",
                plan.pattern().name(),
                plan.current_index() + 1,
                plan.len()
            ),
        }
    }
}

/// Picks the heat source to approach: priority classifications first,
/// nearest within the chosen class
fn select_heat_target(detections: &[HeatSource]) -> Option<&HeatSource> {
    let priority = detections
        .iter()
        .filter(|d| d.classification.is_priority())
        .min_by(|a, b| a.distance.total_cmp(&b.distance));
    priority.or_else(|| {
        detections
            .iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimConfig;
    use crate::mission::SearchPattern;
    use crate::scene::Classification;
    use crate::sensors::{ClearDirection, SonarHit};

    fn setup() -> (Vehicle, MissionPlan, ModeProfile) {
        let config = SimConfig::default();
        (
            Vehicle::new(),
            MissionPlan::new(SearchPattern::SurfaceSweep, 50.0, 8.0, &[]),
            ModeProfile::for_mode(NavMode::AutoSearch, &config),
        )
    }

    fn detection(classification: Classification, distance: f64) -> HeatSource {
        HeatSource {
            position: Vector3::new(distance, -2.0, 0.0),
            temperature: classification.attributes().temperature,
            classification,
            distance,
            confidence: 0.8,
        }
    }

    #[test]
    fn low_battery_forces_emergency_surface() {
        let (vehicle, mut plan, profile) = setup();
        let mut controller = NavController::new(NavMode::AutoSearch);
        let intent = controller.decide(
            &vehicle,
            &mut plan,
            &[],
            None,
            15.0,
            19.0,
            &profile,
            &ManualInput::default(),
        );
        assert_eq!(intent.status, "EMERGENCY SURFACE");
        assert_eq!(intent.ballast_target, 0.0);
        assert!(matches!(intent.drive, Drive::Hold));
    }

    #[test]
    fn emergency_overrides_manual_mode() {
        let (vehicle, mut plan, profile) = setup();
        let mut controller = NavController::new(NavMode::Manual);
        let input = ManualInput {
            dive: true,
            ..ManualInput::default()
        };
        let intent = controller.decide(
            &vehicle, &mut plan, &[], None, 5.0, 19.0, &profile, &input,
        );
        assert_eq!(intent.status, "EMERGENCY SURFACE");
    }

    #[test]
    fn priority_detection_preempts_waypoints() {
        let (vehicle, mut plan, profile) = setup();
        let mut controller = NavController::new(NavMode::RescueMode);
        let detections = vec![
            detection(Classification::Debris, 3.0),
            detection(Classification::Survivor, 9.0),
        ];
        let intent = controller.decide(
            &vehicle,
            &mut plan,
            &detections,
            None,
            80.0,
            19.0,
            &profile,
            &ManualInput::default(),
        );
        assert_eq!(intent.status, "approaching survivor");
        match intent.drive {
            Drive::Seek { target, .. } => assert_eq!(target.x, 9.0),
            other => panic!("expected Seek, got {:?}", other),
        }
    }

    #[test]
    fn nearest_wins_without_priority_detections() {
        let detections = vec![
            detection(Classification::Debris, 7.0),
            detection(Classification::Animal, 4.0),
        ];
        let chosen = select_heat_target(&detections).unwrap();
        assert_eq!(chosen.classification, Classification::Animal);
    }

    #[test]
    fn blocked_bow_steers_toward_best_clear_direction() {
        let (vehicle, mut plan, profile) = setup();
        let mut controller = NavController::new(NavMode::AutoSearch);
        let sweep = SonarSweep {
            hits: vec![SonarHit {
                angle: 0.0,
                distance: 3.0,
                point: Vector3::new(3.0, 0.0, 0.0),
                object_id: 1,
            }],
            clear: vec![
                ClearDirection {
                    angle: std::f64::consts::PI,
                    distance: 15.0,
                },
                ClearDirection {
                    angle: 1.0,
                    distance: 10.0,
                },
            ],
        };
        let intent = controller.decide(
            &vehicle,
            &mut plan,
            &[],
            Some(&sweep),
            80.0,
            19.0,
            &profile,
            &ManualInput::default(),
        );
        assert_eq!(intent.status, "avoiding obstacle");
        match intent.drive {
            Drive::Seek { target, .. } => assert!(target.x < 0.0),
            other => panic!("expected Seek, got {:?}", other),
        }
    }

    #[test]
    fn heat_target_suppresses_avoidance() {
        let (vehicle, mut plan, profile) = setup();
        let mut controller = NavController::new(NavMode::AutoSearch);
        let sweep = SonarSweep {
            hits: vec![SonarHit {
                angle: 0.0,
                distance: 3.0,
                point: Vector3::new(3.0, 0.0, 0.0),
                object_id: 1,
            }],
            clear: vec![ClearDirection {
                angle: std::f64::consts::PI,
                distance: 15.0,
            }],
        };
        let detections = vec![detection(Classification::Survivor, 8.0)];
        let intent = controller.decide(
            &vehicle,
            &mut plan,
            &detections,
            Some(&sweep),
            80.0,
            19.0,
            &profile,
            &ManualInput::default(),
        );
        assert_eq!(intent.status, "approaching survivor");
    }

    #[test]
    fn out_of_bounds_requests_replan() {
        let (mut vehicle, mut plan, profile) = setup();
        vehicle.position.x = 24.0;
        let mut controller = NavController::new(NavMode::AutoSearch);
        let intent = controller.decide(
            &vehicle,
            &mut plan,
            &[],
            None,
            80.0,
            19.0,
            &profile,
            &ManualInput::default(),
        );
        assert_eq!(intent.status, "out of bounds - replanning");
        assert!(controller.take_replan_request());
        assert!(!controller.take_replan_request());
    }

    #[test]
    fn arrival_advances_waypoint_index() {
        let (mut vehicle, mut plan, profile) = setup();
        let first = plan.current_waypoint().position;
        vehicle.position = first;
        let mut controller = NavController::new(NavMode::AutoSearch);
        controller.decide(
            &vehicle,
            &mut plan,
            &[],
            None,
            80.0,
            19.0,
            &profile,
            &ManualInput::default(),
        );
        assert_eq!(plan.current_index(), 1);
    }

    #[test]
    fn manual_input_maps_to_direct_drive() {
        let (vehicle, mut plan, profile) = setup();
        let mut controller = NavController::new(NavMode::Manual);
        let input = ManualInput {
            forward: true,
            turn_left: true,
            dive: true,
            ..ManualInput::default()
        };
        let intent = controller.decide(
            &vehicle, &mut plan, &[], None, 80.0, 19.0, &profile, &input,
        );
        match intent.drive {
            Drive::Direct { thrust, turn } => {
                assert!(thrust > 0.0);
                assert_eq!(turn, -1.0);
            }
            other => panic!("expected Direct, got {:?}", other),
        }
        assert!(intent.ballast_target > vehicle.ballast);
        assert_eq!(intent.status, "manual control");
    }
}
