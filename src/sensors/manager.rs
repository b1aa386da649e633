// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor set - evaluates every sensor once per poll

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use tracing::{info, warn};

use super::{Sensor, SensorSnapshot, SimulatedSensor};
use crate::config::{validate_sensors, SensorDefinition};
use crate::core::{ArmedState, CandidateEvent};
use crate::error::{ConfigError, SensorError};

/// Everything one poll produced
#[derive(Debug, Default)]
pub struct PollOutcome {
    /// States of every sensor after this poll
    pub snapshot: SensorSnapshot,
    /// Transitions, in sensor order
    pub candidates: Vec<CandidateEvent>,
    /// Sensors that failed this poll
    pub faults: Vec<SensorError>,
}

/// Owns the sensors; private to the poll loop
pub struct SensorSet {
    sensors: Vec<Box<dyn Sensor>>,
    rng: ChaCha8Rng,
}

impl SensorSet {
    /// Set over the given sensors; names must be unique
    pub fn new(sensors: Vec<Box<dyn Sensor>>, seed: Option<u64>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for sensor in &sensors {
            if !seen.insert(sensor.name().to_string()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate sensor name `{}`",
                    sensor.name()
                )));
            }
        }

        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self { sensors, rng })
    }

    /// Simulated sensors for every definition, in definition order
    pub fn from_definitions(
        definitions: &[SensorDefinition],
        reset_probability: f64,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        validate_sensors(definitions)?;

        let sensors = definitions
            .iter()
            .map(|def| {
                info!(
                    "Added sensor: {} (p={}, critical={})",
                    def.name, def.trigger_probability, def.critical
                );
                let sensor = SimulatedSensor::from_definition(def, reset_probability);
                Box::new(sensor) as Box<dyn Sensor>
            })
            .collect();
        Self::new(sensors, seed)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Sensor names in poll order
    pub fn names(&self) -> Vec<String> {
        self.sensors.iter().map(|s| s.name().to_string()).collect()
    }

    /// Current states without evaluating anything
    pub fn snapshot(&self) -> SensorSnapshot {
        let mut snapshot = SensorSnapshot::new();
        for sensor in &self.sensors {
            snapshot.insert(sensor.name(), sensor.state_label());
        }
        snapshot
    }

    /// Evaluate every sensor in order.
    ///
    /// A failing sensor keeps its last known state in the snapshot and is
    /// reported in `faults`; the rest of the poll still completes.
    pub fn check_all(&mut self, armed: ArmedState) -> PollOutcome {
        let mut outcome = PollOutcome::default();

        for sensor in self.sensors.iter_mut() {
            match sensor.trigger(&mut self.rng, armed) {
                Ok(reading) => {
                    outcome.snapshot.insert(sensor.name(), &reading.label);
                    outcome.candidates.extend(reading.candidate);
                }
                Err(e) => {
                    warn!("Read error for {}: {}", sensor.name(), e);
                    outcome.snapshot.insert(sensor.name(), sensor.state_label());
                    outcome.faults.push(e);
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_sensors;
    use crate::sensors::{SensorReading, SensorState};
    use rand::RngCore;

    struct BrokenSensor;

    impl Sensor for BrokenSensor {
        fn name(&self) -> &str {
            "Broken"
        }
        fn is_critical(&self) -> bool {
            false
        }
        fn state(&self) -> SensorState {
            SensorState::Closed
        }
        fn state_label(&self) -> &str {
            "closed"
        }
        fn trigger(
            &mut self,
            _rng: &mut dyn RngCore,
            _armed: ArmedState,
        ) -> Result<SensorReading, SensorError> {
            Err(SensorError::NoResponse("Broken".to_string()))
        }
    }

    #[test]
    fn test_default_definitions_build() {
        let set = SensorSet::from_definitions(&default_sensors(), 0.95, Some(1)).unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(set.names()[0], "Front Door");
        assert_eq!(set.snapshot()["Smoke Detector"], "clear");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let sensors: Vec<Box<dyn Sensor>> = vec![
            Box::new(SimulatedSensor::new("Door", "closed", "open", 0.1)),
            Box::new(SimulatedSensor::new("Door", "closed", "open", 0.1)),
        ];
        assert!(SensorSet::new(sensors, None).is_err());
    }

    #[test]
    fn test_check_all_covers_every_sensor() {
        let sensors: Vec<Box<dyn Sensor>> = vec![
            Box::new(SimulatedSensor::new("Front Door", "closed", "open", 1.0)),
            Box::new(SimulatedSensor::new("Back Door", "closed", "open", 0.0)),
            Box::new(
                SimulatedSensor::new("Smoke Detector", "clear", "smoke detected", 1.0).critical(),
            ),
        ];
        let mut set = SensorSet::new(sensors, Some(3)).unwrap();

        let outcome = set.check_all(ArmedState::Disarmed);
        assert_eq!(outcome.snapshot.len(), 3);
        assert_eq!(outcome.snapshot["Front Door"], "open");
        assert_eq!(outcome.snapshot["Back Door"], "closed");
        assert_eq!(outcome.snapshot["Smoke Detector"], "smoke detected");
        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(outcome.candidates[0].description, "Front Door is open");
        assert!(outcome.faults.is_empty());
    }

    #[test]
    fn test_fault_keeps_last_state_and_finishes_poll() {
        let sensors: Vec<Box<dyn Sensor>> = vec![
            Box::new(BrokenSensor),
            Box::new(SimulatedSensor::new("Front Door", "closed", "open", 1.0)),
        ];
        let mut set = SensorSet::new(sensors, Some(3)).unwrap();

        let outcome = set.check_all(ArmedState::Armed);
        assert_eq!(outcome.faults.len(), 1);
        assert_eq!(outcome.snapshot["Broken"], "closed");
        assert_eq!(outcome.snapshot["Front Door"], "open");
        assert_eq!(outcome.candidates.len(), 1);
    }
}
