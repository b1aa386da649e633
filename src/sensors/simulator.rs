// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Simulated binary sensor for demo/testing

use rand::{Rng, RngCore};
use tracing::debug;

use super::{Sensor, SensorReading, SensorState};
use crate::config::SensorDefinition;
use crate::core::{ArmedState, CandidateEvent};
use crate::error::SensorError;

/// Chance that an open sensor falls back to its resting state when triggered.
pub const DEFAULT_RESET_PROBABILITY: f64 = 0.95;

/// Randomly flipping two-state sensor
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    name: String,
    closed_label: String,
    open_label: String,
    state: SensorState,
    trigger_probability: f64,
    reset_probability: f64,
    critical: bool,
}

impl SimulatedSensor {
    /// Closed, non-critical sensor
    pub fn new(name: &str, closed_label: &str, open_label: &str, trigger_probability: f64) -> Self {
        Self {
            name: name.to_string(),
            closed_label: closed_label.to_string(),
            open_label: open_label.to_string(),
            state: SensorState::Closed,
            trigger_probability,
            reset_probability: DEFAULT_RESET_PROBABILITY,
            critical: false,
        }
    }

    /// Sensor described by a configuration entry
    pub fn from_definition(def: &SensorDefinition, reset_probability: f64) -> Self {
        Self {
            name: def.name.clone(),
            closed_label: def.closed_label().to_string(),
            open_label: def.open_state_label.clone(),
            state: if def.starts_open() {
                SensorState::Open
            } else {
                SensorState::Closed
            },
            trigger_probability: def.trigger_probability,
            reset_probability,
            critical: def.critical,
        }
    }

    /// Mark transitions as critical alerts
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    /// Chance per poll of an open sensor closing again
    pub fn with_reset_probability(mut self, reset_probability: f64) -> Self {
        self.reset_probability = reset_probability;
        self
    }

    /// Start in the given state
    pub fn with_state(mut self, state: SensorState) -> Self {
        self.state = state;
        self
    }

    fn label(&self, state: SensorState) -> &str {
        match state {
            SensorState::Closed => &self.closed_label,
            SensorState::Open => &self.open_label,
        }
    }

    fn transition_candidate(&self, from: SensorState, to: SensorState) -> Option<CandidateEvent> {
        match (from, to) {
            (SensorState::Closed, SensorState::Open) if self.critical => {
                Some(CandidateEvent::critical(format!("{}: {}", self.name, self.open_label)))
            }
            (SensorState::Closed, SensorState::Open) => {
                Some(CandidateEvent::sensor(format!("{} is {}", self.name, self.open_label)))
            }
            (SensorState::Open, SensorState::Closed) => {
                Some(CandidateEvent::sensor(format!("{} is {}", self.name, self.closed_label)))
            }
            _ => None,
        }
    }
}

impl Sensor for SimulatedSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn state(&self) -> SensorState {
        self.state
    }

    fn state_label(&self) -> &str {
        self.label(self.state)
    }

    fn trigger(
        &mut self,
        rng: &mut dyn RngCore,
        armed: ArmedState,
    ) -> Result<SensorReading, SensorError> {
        let previous = self.state;

        if rng.gen::<f64>() < self.trigger_probability {
            self.state = match self.state {
                SensorState::Closed => SensorState::Open,
                // Mostly reset so a triggered sensor does not stay open forever.
                SensorState::Open if rng.gen::<f64>() < self.reset_probability => {
                    SensorState::Closed
                }
                SensorState::Open => SensorState::Open,
            };
        }

        let candidate = self.transition_candidate(previous, self.state);
        if candidate.is_some() {
            debug!(
                "[{}] {}: {} -> {}",
                armed,
                self.name,
                self.label(previous),
                self.label(self.state)
            );
        }

        Ok(SensorReading {
            state: self.state,
            label: self.state_label().to_string(),
            candidate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EventCategory;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_zero_probability_never_changes() {
        let mut sensor = SimulatedSensor::new("Front Door", "closed", "open", 0.0);
        let mut rng = rng();
        for _ in 0..100 {
            let reading = sensor.trigger(&mut rng, ArmedState::Armed).unwrap();
            assert_eq!(reading.label, "closed");
            assert!(reading.candidate.is_none());
        }
    }

    #[test]
    fn test_open_transition_emits_sensor_candidate() {
        let mut sensor = SimulatedSensor::new("Front Door", "closed", "open", 1.0);
        let reading = sensor.trigger(&mut rng(), ArmedState::Disarmed).unwrap();

        assert_eq!(reading.state, SensorState::Open);
        assert_eq!(reading.label, "open");
        let candidate = reading.candidate.unwrap();
        assert_eq!(candidate.category, EventCategory::Sensor);
        assert_eq!(candidate.description, "Front Door is open");
    }

    #[test]
    fn test_critical_sensor_uses_critical_lane() {
        let mut sensor =
            SimulatedSensor::new("Smoke Detector", "clear", "smoke detected", 1.0).critical();
        let reading = sensor.trigger(&mut rng(), ArmedState::Armed).unwrap();

        let candidate = reading.candidate.unwrap();
        assert_eq!(candidate.category, EventCategory::Critical);
        assert_eq!(candidate.description, "Smoke Detector: smoke detected");
    }

    #[test]
    fn test_stuck_open_does_not_repeat_events() {
        let mut sensor =
            SimulatedSensor::new("Back Door", "closed", "open", 1.0).with_reset_probability(0.0);
        let mut rng = rng();

        assert!(sensor.trigger(&mut rng, ArmedState::Armed).unwrap().candidate.is_some());
        for _ in 0..20 {
            let reading = sensor.trigger(&mut rng, ArmedState::Armed).unwrap();
            assert_eq!(reading.state, SensorState::Open);
            assert!(reading.candidate.is_none());
        }
    }

    #[test]
    fn test_every_state_change_and_only_changes_emit() {
        let mut sensor = SimulatedSensor::new("Window", "closed", "open", 0.5);
        let mut rng = rng();
        let mut previous = sensor.state();

        for _ in 0..500 {
            let reading = sensor.trigger(&mut rng, ArmedState::Disarmed).unwrap();
            assert_eq!(reading.candidate.is_some(), reading.state != previous);
            previous = reading.state;
        }
    }

    #[test]
    fn test_reset_emits_closing_candidate() {
        let mut sensor = SimulatedSensor::new("Garage", "closed", "open", 1.0)
            .with_reset_probability(1.0)
            .with_state(SensorState::Open);
        let reading = sensor.trigger(&mut rng(), ArmedState::Armed).unwrap();

        assert_eq!(reading.state, SensorState::Closed);
        assert_eq!(reading.candidate.unwrap().description, "Garage is closed");
    }

    #[test]
    fn test_from_definition() {
        let def =
            SensorDefinition::new("Smoke Detector", 0.01, "clear", "smoke detected").critical();
        let sensor = SimulatedSensor::from_definition(&def, 0.95);
        assert!(sensor.is_critical());
        assert_eq!(sensor.state_label(), "clear");
        assert_eq!(sensor.name(), "Smoke Detector");
    }
}
