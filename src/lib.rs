// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! HomeWatch - concurrent home-monitoring and alerting engine
//!
//! Two periodic tasks share one armed/disarmed posture:
//! - a sensor loop polling door, window, motion and smoke sensors
//! - a detection loop running a pluggable person detector over frames
//!
//! Both feed candidate events through an alert dispatcher that decides,
//! from the posture and the event's criticality, what reaches the durable
//! event log.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │ Sensor loop  │   │ Detection    │──→ FrameBus ──→ subscribers
//! │ (SensorSet)  │   │ loop         │
//! └──────┬───────┘   └──────┬───────┘
//!        │ candidates       │ candidates
//!        ↓                  ↓
//! ┌─────────────────────────────────┐   ┌─────────────────┐
//! │        Alert dispatcher         │←──│ Armed-state     │
//! └───────────────┬─────────────────┘   │ controller      │
//!                 ↓                     └─────────────────┘
//! ┌─────────────────────────────────┐
//! │     Event store (SQLite)        │
//! └─────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod core;
pub mod db;
pub mod detection;
pub mod error;
pub mod sensors;
pub mod video;

// Re-exports for convenience
pub use config::Config;
pub use crate::core::{ArmedState, Monitor, MonitorState, SystemStatus};
pub use db::{Event, EventStore};
pub use detection::{Detector, DetectorKind};
pub use sensors::{SensorSet, SensorSnapshot};

/// HomeWatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// HomeWatch name
pub const NAME: &str = "HomeWatch";
