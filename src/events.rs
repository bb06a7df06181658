//! Weighted random environmental events. At most one event is active at a
//! time; draws respect a cooldown window after the previous event ends.
//! Applying an event mutates the shared environment state and remembers the
//! original values, so reverting restores them exactly.

use log::info;
use nalgebra::Vector3;
use rand::Rng;

/// Mutable environment values the events act on
#[derive(Clone, Debug)]
pub struct EnvState {
    /// Constant drift vector added to the vehicle each tick
    pub drift: Vector3<f64>,
    /// Current water turbidity in `[0, 1]`
    pub turbidity: f64,
    /// Current sonar max range
    pub sonar_range: f64,
}

/// The kinds of random environmental events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// A strong current pushes the vehicle off course
    CurrentSurge,
    /// Stirred-up silt reduces thermal visibility
    TurbiditySpike,
    /// Acoustic noise shortens the usable sonar range
    SonarInterference,
}

impl EventKind {
    /// Display name for the UI descriptor
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::CurrentSurge => "current surge",
            EventKind::TurbiditySpike => "turbidity spike",
            EventKind::SonarInterference => "sonar interference",
        }
    }

    /// One-line description for the UI descriptor
    pub fn description(&self) -> &'static str {
        match self {
            EventKind::CurrentSurge => "a strong current is pushing the vehicle off course",
            EventKind::TurbiditySpike => "stirred-up silt is reducing thermal visibility",
            EventKind::SonarInterference => "acoustic noise is shortening sonar range",
        }
    }
}

/// UI-facing descriptor of the active event
#[derive(Clone, Debug)]
pub struct EventDescriptor {
    /// Event display name
    pub name: &'static str,
    /// Event description
    pub description: &'static str,
    /// Ticks until the event reverts
    pub ticks_remaining: u64,
}

/// An applied event holding the saved environment for exact revert
#[derive(Clone, Debug)]
pub struct ActiveEvent {
    /// Which event is active
    pub kind: EventKind,
    /// Drawn magnitude in `[0.5, 1]`
    pub magnitude: f64,
    /// Tick at which the event expires
    pub expires_at: u64,
    saved: EnvState,
}

impl ActiveEvent {
    /// Applies `kind` to the environment and returns the active record
    pub fn apply(kind: EventKind, magnitude: f64, expires_at: u64, env: &mut EnvState) -> Self {
        let saved = env.clone();
        match kind {
            EventKind::CurrentSurge => {
                env.drift += Vector3::new(0.05 * magnitude, 0.0, 0.03 * magnitude);
            }
            EventKind::TurbiditySpike => {
                env.turbidity = (env.turbidity + 0.3 * magnitude).min(1.0);
            }
            EventKind::SonarInterference => {
                env.sonar_range = (env.sonar_range * (1.0 - 0.5 * magnitude)).max(3.0);
            }
        }
        info!("Event started: {} (magnitude {:.2})", kind.name(), magnitude);
        ActiveEvent {
            kind,
            magnitude,
            expires_at,
            saved,
        }
    }

    /// Restores the environment to its pre-event values
    pub fn revert(self, env: &mut EnvState) {
        info!("Event ended: {}", self.kind.name());
        *env = self.saved;
    }

    /// UI descriptor for this event at `tick`
    pub fn descriptor(&self, tick: u64) -> EventDescriptor {
        EventDescriptor {
            name: self.kind.name(),
            description: self.kind.description(),
            ticks_remaining: self.expires_at.saturating_sub(tick),
        }
    }
}

/// Per-tick draw chance once the cooldown has elapsed
const DRAW_CHANCE: f64 = 0.008;
/// Ticks after an event ends before the next draw is possible
const COOLDOWN_TICKS: u64 = 300;
/// Weighted entries: kind and relative weight
const WEIGHTS: [(EventKind, u32); 3] = [
    (EventKind::CurrentSurge, 3),
    (EventKind::TurbiditySpike, 2),
    (EventKind::SonarInterference, 2),
];

/// Finite weighted event table with an explicit cooldown window
pub struct EventTable {
    next_eligible: u64,
}

impl EventTable {
    /// Creates a table eligible to draw immediately
    pub fn new() -> Self {
        EventTable { next_eligible: 0 }
    }

    /// Notes that an event ended at `tick`, opening the cooldown window
    pub fn note_end(&mut self, tick: u64) {
        self.next_eligible = tick + COOLDOWN_TICKS;
    }

    /// Rolls for a new event; returns the drawn kind, magnitude and duration
    pub fn maybe_draw(&mut self, tick: u64, rng: &mut impl Rng) -> Option<(EventKind, f64, u64)> {
        if tick < self.next_eligible || !rng.gen_bool(DRAW_CHANCE) {
            return None;
        }
        let total: u32 = WEIGHTS.iter().map(|(_, w)| w).sum();
        let mut roll = rng.gen_range(0..total);
        let kind = WEIGHTS
            .iter()
            .find(|(_, w)| {
                if roll < *w {
                    true
                } else {
                    roll -= w;
                    false
                }
            })
            .map(|(k, _)| *k)
            .unwrap_or(EventKind::CurrentSurge);
        let magnitude = rng.gen_range(0.5..1.0);
        let duration = rng.gen_range(200..600);
        Some((kind, magnitude, duration))
    }
}

impl Default for EventTable {
    fn default() -> Self {
        EventTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn base_env() -> EnvState {
        EnvState {
            drift: Vector3::new(0.01, 0.0, 0.005),
            turbidity: 0.2,
            sonar_range: 15.0,
        }
    }

    #[test]
    fn apply_then_revert_restores_environment() {
        let mut env = base_env();
        let before = env.clone();
        let event = ActiveEvent::apply(EventKind::CurrentSurge, 1.0, 100, &mut env);
        assert!(env.drift.x > before.drift.x);
        event.revert(&mut env);
        assert_eq!(env.drift, before.drift);
        assert_eq!(env.turbidity, before.turbidity);
        assert_eq!(env.sonar_range, before.sonar_range);
    }

    #[test]
    fn turbidity_spike_saturates_at_one() {
        let mut env = base_env();
        env.turbidity = 0.9;
        let _event = ActiveEvent::apply(EventKind::TurbiditySpike, 1.0, 100, &mut env);
        assert!(env.turbidity <= 1.0);
    }

    #[test]
    fn sonar_interference_keeps_minimum_range() {
        let mut env = base_env();
        env.sonar_range = 4.0;
        let _event = ActiveEvent::apply(EventKind::SonarInterference, 1.0, 100, &mut env);
        assert!(env.sonar_range >= 3.0);
    }

    #[test]
    fn cooldown_blocks_draws() {
        let mut table = EventTable::new();
        table.note_end(1000);
        let mut rng = StdRng::seed_from_u64(1);
        for tick in 1000..1300 {
            assert!(table.maybe_draw(tick, &mut rng).is_none());
        }
    }

    #[test]
    fn draws_eventually_produce_each_field() {
        let mut table = EventTable::new();
        let mut rng = StdRng::seed_from_u64(2);
        let mut drawn = None;
        for tick in 0..10_000 {
            if let Some(d) = table.maybe_draw(tick, &mut rng) {
                drawn = Some(d);
                break;
            }
        }
        let (_, magnitude, duration) = drawn.expect("a draw within 10k ticks");
        assert!((0.5..1.0).contains(&magnitude));
        assert!((200..600).contains(&duration));
    }

    #[test]
    fn descriptor_counts_down() {
        let mut env = base_env();
        let event = ActiveEvent::apply(EventKind::TurbiditySpike, 0.7, 250, &mut env);
        let descriptor = event.descriptor(200);
        assert_eq!(descriptor.name, "turbidity spike");
        assert_eq!(descriptor.ticks_remaining, 50);
    }
}
