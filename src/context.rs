//! [`SimulationContext`]: the explicit, caller-owned root of all mutable
//! simulation state. One `step()` per external render frame runs the strict
//! phase order (events, scans, decision, integration, collision/collection).
//! Mode and pattern switches are queued and applied only at the next tick
//! boundary, so the renderer never observes partial-tick state.

use log::{debug, info};
use nalgebra::Vector3;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::collision::{CollectionEvent, CollisionEvent, CollisionResolver, collect_targets};
use crate::events::{ActiveEvent, EnvState, EventDescriptor, EventTable};
use crate::mission::{MissionPlan, SearchPattern};
use crate::motion::{self, Vehicle};
use crate::navigation::{ManualInput, ModeProfile, NavController, NavIntent, NavMode};
use crate::scene::{StaticScene, Target, populate_targets};
use crate::sensors::{HeatSource, ThermalScanner, sonar_scan};
use crate::{SimConfig, SimError};

/// Battery drain per tick while holding position
const IDLE_DRAIN_PCT: f64 = 0.008;
/// Battery drain per tick while driving
const DRIVE_DRAIN_PCT: f64 = 0.035;
/// Battery recharge per tick while surfaced with empty ballast
const SURFACE_RECHARGE_PCT: f64 = 0.06;

/// Read-only vehicle pose snapshot for the renderer
#[derive(Clone, Debug)]
pub struct VehiclePose {
    /// World position
    pub position: Vector3<f64>,
    /// Heading (yaw) in radians
    pub yaw: f64,
    /// Ballast level in `[0, 1]`
    pub ballast: f64,
    /// Depth in `[-max_dive_depth, 0]`
    pub depth: f64,
}

/// Read-only mission counters for the UI
#[derive(Clone, Copy, Debug)]
pub struct Counters {
    /// Priority targets found by thermal detection
    pub found: u32,
    /// Priority targets placed in the scene
    pub total: u32,
    /// All targets placed in the scene, collectible debris included
    pub total_targets: u32,
    /// Targets collected so far
    pub collected: u32,
    /// Percentage of the current plan visited
    pub area_pct: f64,
    /// Remaining battery percentage
    pub battery_pct: f64,
}

/// The caller-owned simulation root; created at start, torn down at reset
pub struct SimulationContext {
    config: SimConfig,
    vehicle: Vehicle,
    plan: MissionPlan,
    scene: StaticScene,
    targets: Vec<Target>,
    thermal: ThermalScanner,
    controller: NavController,
    resolver: CollisionResolver,
    event_table: EventTable,
    active_event: Option<ActiveEvent>,
    env: EnvState,
    battery: f64,
    tick: u64,
    found: u32,
    total_priority: u32,
    total_targets: u32,
    collected: u32,
    collections: Vec<CollectionEvent>,
    status: String,
    pending_mode: Option<NavMode>,
    pending_pattern: Option<SearchPattern>,
    rng: StdRng,
}

impl SimulationContext {
    /// Builds a simulation from a validated configuration
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let scene = StaticScene::generate(&config, &mut rng);
        let targets = populate_targets(&config, &mut rng);
        let total_targets = targets.len() as u32;
        let total_priority = targets
            .iter()
            .filter(|t| t.classification.is_priority())
            .count() as u32;

        let profile = ModeProfile::for_mode(config.mode, &config);
        let plan = MissionPlan::new(config.pattern, config.pool_size, profile.max_dive_depth, &[]);
        let env = EnvState {
            drift: Vector3::new(0.012, 0.0, 0.006),
            turbidity: config.turbidity,
            sonar_range: config.sonar_range,
        };

        info!(
            "Simulation started: {} pool, {} targets, seed {}",
            config.pool_size,
            targets.len(),
            seed
        );
        Ok(SimulationContext {
            controller: NavController::new(config.mode),
            config,
            vehicle: Vehicle::new(),
            plan,
            scene,
            targets,
            thermal: ThermalScanner::new(),
            resolver: CollisionResolver::new(),
            event_table: EventTable::new(),
            active_event: None,
            env,
            battery: 100.0,
            tick: 0,
            found: 0,
            total_priority,
            total_targets,
            collected: 0,
            collections: Vec::new(),
            status: "idle".to_string(),
            pending_mode: None,
            pending_pattern: None,
            rng,
        })
    }

    /// Advances the simulation one tick.
    ///
    /// Phase order is fixed: pending switches, events, scans, navigation
    /// decision, motion integration, collision and collection. Phases never
    /// reorder or interleave across ticks.
    pub fn step(&mut self, input: &ManualInput) {
        self.tick += 1;
        let tick = self.tick;

        // Queued mode/pattern switches apply atomically at the tick boundary
        if let Some(mode) = self.pending_mode.take() {
            self.controller.set_mode(mode);
            self.replan();
        }
        if let Some(pattern) = self.pending_pattern.take() {
            self.config.pattern = pattern;
            self.replan();
        }

        // Phase 1: environmental events
        if self
            .active_event
            .as_ref()
            .is_some_and(|e| tick >= e.expires_at)
        {
            if let Some(event) = self.active_event.take() {
                event.revert(&mut self.env);
                self.event_table.note_end(tick);
            }
        }
        if self.active_event.is_none() {
            if let Some((kind, magnitude, duration)) =
                self.event_table.maybe_draw(tick, &mut self.rng)
            {
                self.active_event = Some(ActiveEvent::apply(
                    kind,
                    magnitude,
                    tick + duration,
                    &mut self.env,
                ));
            }
        }

        // Phase 2: sensor scans (autonomous modes only)
        let profile = ModeProfile::for_mode(self.controller.mode(), &self.config);
        let sweep = if self.controller.mode() == NavMode::Manual {
            None
        } else {
            let newly_found = self.thermal.scan(
                tick,
                self.vehicle.position,
                &mut self.targets,
                profile.thermal_radius,
                self.env.turbidity,
            );
            self.found += newly_found as u32;
            Some(sonar_scan(
                &self.scene,
                self.vehicle.position,
                self.config.sonar_rays,
                self.env.sonar_range,
            ))
        };

        // Phase 3: navigation decision
        let intent = self.controller.decide(
            &self.vehicle,
            &mut self.plan,
            self.thermal.detections(),
            sweep.as_ref(),
            self.battery,
            self.config.bound(),
            &profile,
            input,
        );
        if self.controller.take_replan_request() {
            self.replan();
        }
        self.status = intent.status.clone();

        // Phase 4: motion integration
        let environment = motion::Environment {
            drift: self.env.drift,
            bound: self.config.bound(),
            max_dive_depth: profile.max_dive_depth,
        };
        motion::integrate(&mut self.vehicle, &intent, &environment, &mut self.rng);

        // Phase 5: collision and target resolution
        self.resolver
            .resolve(&self.vehicle, self.scene.obstacles_ref(), tick);
        let collected = collect_targets(&self.vehicle, &mut self.targets, tick);
        if !collected.is_empty() {
            self.collected += collected.len() as u32;
            self.thermal.forget_collected(&self.targets);
            self.collections.extend(collected);
        }

        self.drain_battery(&intent);
        debug!("Tick {} complete: {}", tick, self.status);
    }

    /// Queues a cyclic mode toggle; applied at the next tick boundary
    pub fn cycle_mode(&mut self) {
        let current = self.pending_mode.unwrap_or(self.controller.mode());
        self.pending_mode = Some(current.next());
    }

    /// Queues a search-pattern switch; applied at the next tick boundary
    pub fn set_pattern(&mut self, pattern: SearchPattern) {
        self.pending_pattern = Some(pattern);
    }

    /// Tears the simulation down and rebuilds it from the same configuration
    pub fn reset(&mut self) -> Result<(), SimError> {
        info!("Simulation reset");
        *self = SimulationContext::new(self.config.clone())?;
        Ok(())
    }

    /// Overrides the battery percentage (scenario and test hook)
    pub fn set_battery(&mut self, pct: f64) {
        self.battery = pct.clamp(0.0, 100.0);
    }

    /// Read-only vehicle pose
    pub fn pose(&self) -> VehiclePose {
        VehiclePose {
            position: self.vehicle.position,
            yaw: self.vehicle.heading,
            ballast: self.vehicle.ballast,
            depth: self.vehicle.depth(),
        }
    }

    /// Current mission status string
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Mission counters for the UI
    pub fn counters(&self) -> Counters {
        Counters {
            found: self.found,
            total: self.total_priority,
            total_targets: self.total_targets,
            collected: self.collected,
            area_pct: self.plan.area_searched() * 100.0,
            battery_pct: self.battery,
        }
    }

    /// Active heat-source detections for overlay rendering
    pub fn detections(&self) -> &[HeatSource] {
        self.thermal.detections()
    }

    /// Recent, unexpired collision events
    pub fn collision_events(&self) -> &[CollisionEvent] {
        self.resolver.recent()
    }

    /// All collection events so far this run
    pub fn collection_events(&self) -> &[CollectionEvent] {
        &self.collections
    }

    /// Descriptor of the active random event, when present
    pub fn active_event(&self) -> Option<EventDescriptor> {
        self.active_event.as_ref().map(|e| e.descriptor(self.tick))
    }

    /// Current navigation mode
    pub fn mode(&self) -> NavMode {
        self.controller.mode()
    }

    /// Current search pattern
    pub fn pattern(&self) -> SearchPattern {
        self.config.pattern
    }

    /// Current mission plan, for overlay rendering
    pub fn plan(&self) -> &MissionPlan {
        &self.plan
    }

    /// Remaining active (uncollected) targets
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Ticks elapsed since simulation start
    pub fn tick(&self) -> u64 {
        self.tick
    }

    fn replan(&mut self) {
        let profile = ModeProfile::for_mode(self.controller.mode(), &self.config);
        let known: Vec<HeatSource> = self.thermal.detections().to_vec();
        self.plan.regenerate(
            self.config.pattern,
            self.config.pool_size,
            profile.max_dive_depth,
            &known,
        );
    }

    fn drain_battery(&mut self, intent: &NavIntent) {
        use crate::navigation::Drive;
        let holding = match intent.drive {
            Drive::Hold => true,
            Drive::Direct { thrust, turn } => thrust == 0.0 && turn == 0.0,
            Drive::Seek { .. } => false,
        };
        let drain = if holding { IDLE_DRAIN_PCT } else { DRIVE_DRAIN_PCT };
        self.battery = (self.battery - drain).max(0.0);
        // Station-keeping on the surface with empty ballast trickle-charges,
        // which is what makes the emergency-surface transition recoverable
        if holding && self.vehicle.depth() > -0.2 && self.vehicle.ballast < 0.05 {
            self.battery = (self.battery + SURFACE_RECHARGE_PCT).min(100.0);
        }
    }
}
