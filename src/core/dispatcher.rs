// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Alert policy: decides which candidate events reach the durable log

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{ArmedState, ArmedStateController};
use crate::db::{Event, EventStore};

/// Lane a candidate event travels in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Camera detection
    Motion,
    /// Non-critical sensor transition
    Sensor,
    /// Critical sensor transition, never suppressed
    Critical,
    /// Arm/disarm and other housekeeping
    System,
}

impl EventCategory {
    /// Stored `event_type` string
    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::Motion => "Motion",
            EventCategory::Sensor => "Sensor",
            EventCategory::Critical => "CRITICAL ALERT",
            EventCategory::System => "System",
        }
    }
}

/// A trigger that has not yet been filtered by alert policy
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateEvent {
    /// Policy bucket
    pub category: EventCategory,
    /// Human-readable text stored with the event
    pub description: String,
}

impl CandidateEvent {
    /// Candidate of any category
    pub fn new(category: EventCategory, description: impl Into<String>) -> Self {
        Self {
            category,
            description: description.into(),
        }
    }

    /// Person detected on camera
    pub fn motion(description: impl Into<String>) -> Self {
        Self::new(EventCategory::Motion, description)
    }

    /// Ordinary sensor transition
    pub fn sensor(description: impl Into<String>) -> Self {
        Self::new(EventCategory::Sensor, description)
    }

    /// Critical sensor transition
    pub fn critical(description: impl Into<String>) -> Self {
        Self::new(EventCategory::Critical, description)
    }

    /// Housekeeping event
    pub fn system(description: impl Into<String>) -> Self {
        Self::new(EventCategory::System, description)
    }
}

/// Outcome of the policy table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Write to the event store
    Persist,
    /// Log to the console only
    Suppress,
}

impl Verdict {
    /// Armed state x category policy.
    ///
    /// | category          | armed    | verdict  |
    /// |-------------------|----------|----------|
    /// | Critical          | any      | Persist  |
    /// | Motion / Sensor   | Armed    | Persist  |
    /// | Motion / Sensor   | Disarmed | Suppress |
    /// | System            | any      | Persist  |
    pub fn decide(category: EventCategory, armed: ArmedState) -> Self {
        match (category, armed) {
            (EventCategory::Critical, _) | (EventCategory::System, _) => Verdict::Persist,
            (EventCategory::Motion | EventCategory::Sensor, ArmedState::Armed) => Verdict::Persist,
            (EventCategory::Motion | EventCategory::Sensor, ArmedState::Disarmed) => {
                Verdict::Suppress
            }
        }
    }
}

/// Counters kept by the dispatcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    /// Events written to the store
    pub persisted: u64,
    /// Candidates dropped by policy
    pub suppressed: u64,
    /// Accepted events the store failed to write
    pub lost: u64,
}

/// Applies alert policy and writes accepted events to the store
pub struct AlertDispatcher {
    armed: Arc<ArmedStateController>,
    store: Arc<EventStore>,
    persisted: AtomicU64,
    suppressed: AtomicU64,
    lost: AtomicU64,
}

impl AlertDispatcher {
    /// Dispatcher with zeroed counters
    pub fn new(armed: Arc<ArmedStateController>, store: Arc<EventStore>) -> Self {
        Self {
            armed,
            store,
            persisted: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            lost: AtomicU64::new(0),
        }
    }

    /// Filter a candidate through policy and persist it if accepted.
    ///
    /// The armed state is read at dispatch time. Returns the stored event, or
    /// `None` when the candidate was suppressed or could not be written.
    pub fn dispatch(&self, candidate: CandidateEvent) -> Option<Event> {
        let armed = self.armed.read();

        match Verdict::decide(candidate.category, armed) {
            Verdict::Suppress => {
                self.suppressed.fetch_add(1, Ordering::Relaxed);
                debug!("[{}] {} (not logged)", armed, candidate.description);
                None
            }
            Verdict::Persist => match persist(&self.store, &candidate) {
                Some(event) => {
                    self.persisted.fetch_add(1, Ordering::Relaxed);
                    Some(event)
                }
                None => {
                    self.lost.fetch_add(1, Ordering::Relaxed);
                    None
                }
            },
        }
    }

    /// Counters since startup
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            persisted: self.persisted.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
        }
    }
}

/// Write an accepted candidate and announce it. Failures are logged and the event is dropped.
pub(crate) fn persist(store: &EventStore, candidate: &CandidateEvent) -> Option<Event> {
    match store.append(candidate.category.as_str(), &candidate.description) {
        Ok(event) => {
            announce(candidate.category, &event);
            Some(event)
        }
        Err(e) => {
            warn!(
                "Event lost: could not persist [{}] {}: {}",
                candidate.category.as_str(),
                candidate.description,
                e
            );
            None
        }
    }
}

fn announce(category: EventCategory, event: &Event) {
    match category {
        EventCategory::Critical => error!("[{}] {}", event.event_type, event.description),
        EventCategory::Motion | EventCategory::Sensor => {
            warn!("[{}] {}", event.event_type, event.description)
        }
        EventCategory::System => info!("[{}] {}", event.event_type, event.description),
    }
}
