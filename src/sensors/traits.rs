// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor traits and common types

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::core::{ArmedState, CandidateEvent};
use crate::error::SensorError;

/// Which of its two labels a sensor currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorState {
    /// Resting state ("closed", "clear")
    Closed,
    /// Triggered state ("open", "smoke detected")
    Open,
}

/// Result of evaluating one sensor
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    /// State after this evaluation
    pub state: SensorState,
    /// Label of that state
    pub label: String,
    /// Present only when the state changed during this evaluation
    pub candidate: Option<CandidateEvent>,
}

/// Trait for all binary sensors
pub trait Sensor: Send {
    /// Unique name within the sensor set
    fn name(&self) -> &str;

    /// Critical sensors are logged even while disarmed
    fn is_critical(&self) -> bool;

    /// Current state
    fn state(&self) -> SensorState;

    /// Label of the current state
    fn state_label(&self) -> &str;

    /// Evaluate the sensor once, updating its state in place
    fn trigger(
        &mut self,
        rng: &mut dyn RngCore,
        armed: ArmedState,
    ) -> Result<SensorReading, SensorError>;
}
