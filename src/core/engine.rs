// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Monitor - shared state, loop lifecycle and the external interface

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{
    AlertDispatcher, ArmedState, ArmedStateController, DetectionLoop, FrameBus, FrameStream,
    SensorLoop, SystemStatus,
};
use crate::config::Config;
use crate::db::{Event, EventStore};
use crate::detection::{build_detector, Detector};
use crate::sensors::{SensorSet, SensorSnapshot};
use crate::video::{ConfiguredSources, Frame, SourceProvider};

/// Handles to everything the loops and external readers share.
///
/// Cloning is cheap; every clone refers to the same state.
#[derive(Clone)]
pub struct MonitorState {
    store: Arc<EventStore>,
    armed: Arc<ArmedStateController>,
    dispatcher: Arc<AlertDispatcher>,
    snapshot: Arc<RwLock<SensorSnapshot>>,
    status: Arc<RwLock<SystemStatus>>,
    frames: FrameBus,
}

impl MonitorState {
    /// Disarmed state with an empty snapshot
    pub fn new(store: Arc<EventStore>, frame_capacity: usize) -> Self {
        let armed = Arc::new(ArmedStateController::new(Arc::clone(&store)));
        let dispatcher = Arc::new(AlertDispatcher::new(Arc::clone(&armed), Arc::clone(&store)));

        Self {
            store,
            armed,
            dispatcher,
            snapshot: Arc::new(RwLock::new(SensorSnapshot::new())),
            status: Arc::new(RwLock::new(SystemStatus::default())),
            frames: FrameBus::new(frame_capacity),
        }
    }

    /// Current posture
    pub fn get_armed_state(&self) -> ArmedState {
        self.armed.read()
    }

    /// The only external mutator of the armed state
    pub fn toggle_armed_state(&self) -> ArmedState {
        self.armed.toggle()
    }

    /// Copy of the states published by the latest poll
    pub fn get_current_sensor_snapshot(&self) -> SensorSnapshot {
        self.snapshot.read().clone()
    }

    /// Stream of annotated frames, starting with the next one
    pub fn subscribe_to_frames(&self) -> FrameStream {
        self.frames.subscribe()
    }

    /// Newest events first; an unreadable store yields an empty list
    pub fn query_events(&self, limit: usize) -> Vec<Event> {
        match self.store.query_events(limit) {
            Ok(events) => events,
            Err(e) => {
                warn!("Failed to query events: {}", e);
                Vec::new()
            }
        }
    }

    /// Summary for the dashboard
    pub fn status(&self) -> SystemStatus {
        let mut status = self.status.read().clone();
        status.armed = self.get_armed_state();
        status
    }

    /// Policy filter shared by both loops
    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    /// Backing event store
    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub(crate) fn publish_snapshot(&self, snapshot: SensorSnapshot) {
        let sensors = snapshot.len();
        *self.snapshot.write() = snapshot;
        self.status.write().sensors_active = sensors;
    }

    pub(crate) fn publish_frame(&self, frame: Frame) {
        self.frames.publish(frame);
    }

    pub(crate) fn record_poll(&self, faults: usize) {
        let mut status = self.status.write();
        status.poll_cycles += 1;
        status.sensor_faults += faults as u64;
    }

    pub(crate) fn record_frame(&self, detected: bool) {
        let mut status = self.status.write();
        status.frames_processed += 1;
        status.human_detected = detected;
        if detected {
            status.last_detection = Some(Utc::now());
        }
    }

    pub(crate) fn record_source(&self, source: Option<String>) {
        self.status.write().active_source = source;
    }
}

/// Owns the configuration, the shared state and both monitoring tasks
pub struct Monitor {
    config: Arc<Config>,
    state: MonitorState,
    sensor_loop: Option<SensorLoop>,
    detection_loop: Option<DetectionLoop>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
    start_time: Option<Instant>,
}

impl Monitor {
    /// Build everything the configuration describes
    pub fn new(config: Config) -> Result<Self> {
        let store = EventStore::open(&config.database)
            .with_context(|| format!("failed to open event store at {:?}", config.database.path))?;
        if let Err(e) = store.cleanup(config.database.retention_days) {
            warn!("Event retention cleanup failed: {}", e);
        }

        let seed = config.monitor.rng_seed;
        let sensors = SensorSet::from_definitions(
            &config.sensors,
            config.monitor.reset_probability,
            seed,
        )?;
        let detector = build_detector(&config.detector, seed);
        let sources: Arc<dyn SourceProvider> =
            Arc::new(ConfiguredSources::new(config.source.clone(), seed));

        Ok(Self::from_parts(config, Arc::new(store), sensors, detector, sources))
    }

    /// Assemble a monitor from prepared components
    pub fn from_parts(
        config: Config,
        store: Arc<EventStore>,
        sensors: SensorSet,
        detector: Box<dyn Detector>,
        sources: Arc<dyn SourceProvider>,
    ) -> Self {
        let monitor = &config.monitor;
        let state = MonitorState::new(store, monitor.frame_channel_capacity);
        state.publish_snapshot(sensors.snapshot());

        let sensor_loop = SensorLoop::new(
            sensors,
            state.clone(),
            monitor.sensor_interval(),
            monitor.sensor_backoff(),
        );
        let detection_loop = DetectionLoop::new(
            detector,
            sources,
            state.clone(),
            monitor.frame_budget(),
            monitor.static_frame_delay(),
            monitor.source_retry(),
        );
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config: Arc::new(config),
            state,
            sensor_loop: Some(sensor_loop),
            detection_loop: Some(detection_loop),
            shutdown_tx,
            tasks: Vec::new(),
            start_time: None,
        }
    }

    /// Configuration the monitor was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared state handle for external readers
    pub fn state(&self) -> MonitorState {
        self.state.clone()
    }

    /// Spawn both loops on the current tokio runtime
    pub fn start(&mut self) -> Result<()> {
        let sensor_loop = self.sensor_loop.take().context("monitor already started")?;
        let detection_loop = self.detection_loop.take().context("monitor already started")?;

        info!("Starting {} monitor...", self.config.app_name);
        self.tasks.push(tokio::spawn(sensor_loop.run(self.shutdown_tx.subscribe())));
        self.tasks.push(tokio::spawn(detection_loop.run(self.shutdown_tx.subscribe())));
        self.start_time = Some(Instant::now());

        info!("Monitor started ({})", self.state.get_armed_state());
        Ok(())
    }

    /// Signal both loops and wait for them to finish their current iteration
    pub async fn stop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }

        info!("Stopping monitor...");
        let _ = self.shutdown_tx.send(());

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!("Monitoring task ended abnormally: {}", e);
            }
        }

        let stats = self.state.dispatcher().stats();
        info!(
            "Monitor stopped ({} persisted, {} suppressed, {} lost)",
            stats.persisted, stats.suppressed, stats.lost
        );
    }

    /// Whether the loops have been started and not yet stopped
    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Seconds since `start`, zero before it
    pub fn uptime(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    /// Current posture
    pub fn get_armed_state(&self) -> ArmedState {
        self.state.get_armed_state()
    }

    /// See [`MonitorState::toggle_armed_state`]
    pub fn toggle_armed_state(&self) -> ArmedState {
        self.state.toggle_armed_state()
    }

    /// States published by the latest poll
    pub fn get_current_sensor_snapshot(&self) -> SensorSnapshot {
        self.state.get_current_sensor_snapshot()
    }

    /// Stream of annotated frames, starting with the next one
    pub fn subscribe_to_frames(&self) -> FrameStream {
        self.state.subscribe_to_frames()
    }

    /// Newest events first
    pub fn query_events(&self, limit: usize) -> Vec<Event> {
        self.state.query_events(limit)
    }

    /// Summary for the dashboard
    pub fn status(&self) -> SystemStatus {
        self.state.status()
    }
}
