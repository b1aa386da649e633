// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Core engine module - shared state, alert policy and the monitoring loops

mod armed;
mod dispatcher;
mod engine;
mod event_bus;
mod loops;
mod scheduler;

pub use armed::ArmedStateController;
pub use dispatcher::{AlertDispatcher, CandidateEvent, DispatchStats, EventCategory, Verdict};
pub use engine::{Monitor, MonitorState};
pub use event_bus::{FrameBus, FrameStream};
pub use loops::{DetectionLoop, PollReport, SensorLoop, StepOutcome};
pub use scheduler::{FrameBudget, LoopState};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Security posture of the whole system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ArmedState {
    /// Sensor and motion events are logged
    Armed,
    /// Only critical and system events are logged
    #[default]
    Disarmed,
}

impl ArmedState {
    /// Whether sensor and motion events are logged
    pub fn is_armed(self) -> bool {
        self == ArmedState::Armed
    }

    /// The opposite posture
    pub fn toggled(self) -> Self {
        match self {
            ArmedState::Armed => ArmedState::Disarmed,
            ArmedState::Disarmed => ArmedState::Armed,
        }
    }

    /// Upper-case name used in logs and events
    pub fn label(self) -> &'static str {
        match self {
            ArmedState::Armed => "ARMED",
            ArmedState::Disarmed => "DISARMED",
        }
    }
}

impl fmt::Display for ArmedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Dashboard-facing summary of the running system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    /// Current posture
    pub armed: ArmedState,
    /// Sensors in the latest snapshot
    pub sensors_active: usize,
    /// Completed sensor polls
    pub poll_cycles: u64,
    /// Sensor reads that failed
    pub sensor_faults: u64,
    /// Frames run through the detector
    pub frames_processed: u64,
    /// Whether the latest frame contained a person
    pub human_detected: bool,
    /// Time of the most recent positive frame
    pub last_detection: Option<DateTime<Utc>>,
    /// Description of the frame source in use
    pub active_source: Option<String>,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self {
            armed: ArmedState::Disarmed,
            sensors_active: 0,
            poll_cycles: 0,
            sensor_faults: 0,
            frames_processed: 0,
            human_detected: false,
            last_detection: None,
            active_source: None,
        }
    }
}
