//! Sensor module - binary sensors and the set the poll loop drives

mod manager;
mod simulator;
mod snapshot;
mod traits;

pub use manager::{PollOutcome, SensorSet};
pub use simulator::{SimulatedSensor, DEFAULT_RESET_PROBABILITY};
pub use snapshot::SensorSnapshot;
pub use traits::{Sensor, SensorReading, SensorState};
