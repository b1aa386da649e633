// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! End-to-end behaviour of the monitoring engine

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use homewatch::config::{Config, SensorDefinition};
use homewatch::core::{DetectionLoop, SensorLoop, StepOutcome};
use homewatch::detection::{DetectorConfig, DetectorKind, SimulatedDetector};
use homewatch::error::SourceError;
use homewatch::sensors::{Sensor, SimulatedSensor};
use homewatch::video::{
    ClipSource, ConfiguredSources, Frame, FrameSource, SourceConfig, SourceProvider,
};
use homewatch::{ArmedState, EventStore, Monitor, MonitorState, SensorSet};

fn shared_state() -> MonitorState {
    MonitorState::new(Arc::new(EventStore::open_in_memory().unwrap()), 8)
}

/// A sensor that opens on its first poll and then stays open
fn opens_immediately(name: &str, open_label: &str) -> SimulatedSensor {
    let closed_label = if open_label == "open" { "closed" } else { "clear" };
    SimulatedSensor::new(name, closed_label, open_label, 1.0).with_reset_probability(0.0)
}

fn sensor_loop(state: &MonitorState, sensors: Vec<Box<dyn Sensor>>) -> SensorLoop {
    SensorLoop::new(
        SensorSet::new(sensors, Some(42)).unwrap(),
        state.clone(),
        Duration::from_millis(10),
        Duration::from_millis(10),
    )
}

struct Clip(usize);

impl SourceProvider for Clip {
    fn open_primary(&self) -> Result<Box<dyn FrameSource>, SourceError> {
        let frames = (0..self.0).map(|_| Frame::blank(4, 4)).collect();
        Ok(Box::new(ClipSource::from_frames(frames, "test clip")?))
    }

    fn open_fallback(&self) -> Result<Box<dyn FrameSource>, SourceError> {
        Err(SourceError::Unavailable("no camera".to_string()))
    }
}

#[test]
fn disarmed_door_opening_is_visible_but_not_logged() {
    let state = shared_state();
    let mut poll = sensor_loop(&state, vec![Box::new(opens_immediately("Front Door", "open"))]);

    let report = poll.poll_once();

    assert_eq!(report.candidates, 1);
    assert!(report.persisted.is_empty());
    assert!(state.query_events(10).is_empty());
    assert_eq!(state.get_current_sensor_snapshot()["Front Door"], "open");
}

#[test]
fn single_toggle_arms_and_logs_one_system_event() {
    let state = shared_state();

    assert_eq!(state.toggle_armed_state(), ArmedState::Armed);
    assert_eq!(state.get_armed_state(), ArmedState::Armed);

    let events = state.query_events(10);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "System");
}

#[test]
fn armed_smoke_detector_raises_one_critical_alert() {
    let state = shared_state();
    state.toggle_armed_state();
    let mut poll = sensor_loop(
        &state,
        vec![Box::new(opens_immediately("Smoke Detector", "smoke detected").critical())],
    );

    poll.poll_once();
    // Staying in alarm must not repeat the alert.
    poll.poll_once();

    let critical = state.store().query_events_by_type("CRITICAL ALERT", 10).unwrap();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].description, "Smoke Detector: smoke detected");
}

#[test]
fn critical_alert_persisted_even_when_disarmed() {
    let state = shared_state();
    let mut poll = sensor_loop(
        &state,
        vec![
            Box::new(opens_immediately("Back Door", "open")),
            Box::new(opens_immediately("Smoke Detector", "smoke detected").critical()),
        ],
    );

    let report = poll.poll_once();

    assert_eq!(report.candidates, 2);
    assert_eq!(report.persisted.len(), 1);
    assert_eq!(report.persisted[0].event_type, "CRITICAL ALERT");
}

#[tokio::test]
async fn ten_frame_clip_restarts_at_first_frame() {
    let state = shared_state();
    let mut detection = DetectionLoop::new(
        Box::new(SimulatedDetector::new(0.0, Some(1))),
        Arc::new(Clip(10)),
        state,
        Duration::from_millis(100),
        Duration::from_secs(1),
        Duration::from_secs(2),
    );

    let mut indices = Vec::new();
    for _ in 0..11 {
        if let StepOutcome::Processed { index, .. } = detection.step().await {
            indices.push(index);
        }
    }

    assert_eq!(indices.len(), 11);
    assert_eq!(indices[9], 9);
    assert_eq!(indices[10], 0);
}

#[test]
fn concurrent_toggles_keep_parity() {
    let state = shared_state();
    let handles: Vec<_> = (0..7)
        .map(|_| {
            let state = state.clone();
            std::thread::spawn(move || {
                for _ in 0..31 {
                    state.toggle_armed_state();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 217 toggles from Disarmed
    assert_eq!(state.get_armed_state(), ArmedState::Armed);
    assert_eq!(state.store().count().unwrap(), 217);
}

#[test]
fn event_queries_are_ordered_and_repeatable() {
    let state = shared_state();
    for _ in 0..6 {
        state.toggle_armed_state();
    }

    let first = state.query_events(4);
    let second = state.query_events(4);

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
    assert!(first.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert_eq!(first[0].description, "System DISARMED");
}

#[tokio::test]
async fn missing_image_falls_back_to_synthetic_camera() {
    let dir = tempfile::tempdir().unwrap();
    let sources = ConfiguredSources::new(
        SourceConfig {
            path: Some(dir.path().join("missing.ppm")),
            camera_width: 32,
            camera_height: 24,
            ..SourceConfig::default()
        },
        Some(3),
    );
    let state = shared_state();
    let mut detection = DetectionLoop::new(
        Box::new(SimulatedDetector::new(0.0, Some(1))),
        Arc::new(sources),
        state.clone(),
        Duration::from_millis(100),
        Duration::from_secs(1),
        Duration::from_secs(2),
    );

    assert!(matches!(
        detection.step().await,
        StepOutcome::Processed { is_static: false, .. }
    ));
    assert_eq!(state.status().active_source.as_deref(), Some("synthetic camera 32x24"));
}

#[tokio::test]
async fn corrupt_image_header_falls_back_instead_of_killing_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("placeholder.ppm");
    std::fs::write(&path, b"P6 4294967296 4294967296 255\n").unwrap();

    let sources = ConfiguredSources::new(
        SourceConfig {
            path: Some(path),
            camera_width: 16,
            camera_height: 16,
            ..SourceConfig::default()
        },
        Some(4),
    );
    let state = shared_state();
    let mut detection = DetectionLoop::new(
        Box::new(SimulatedDetector::new(0.0, Some(1))),
        Arc::new(sources),
        state.clone(),
        Duration::from_millis(100),
        Duration::from_secs(1),
        Duration::from_secs(2),
    );

    for _ in 0..3 {
        assert!(matches!(
            detection.step().await,
            StepOutcome::Processed { is_static: false, .. }
        ));
    }
    assert_eq!(state.status().active_source.as_deref(), Some("synthetic camera 16x16"));
}

#[tokio::test]
async fn running_monitor_streams_frames_and_stops_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.database.path = dir.path().join("events.db");
    config.sensors = vec![SensorDefinition::new("Front Door", 0.5, "closed", "open")];
    config.detector = DetectorConfig {
        kind: DetectorKind::Differencing,
        ..DetectorConfig::default()
    };
    config.source.path = None;
    config.source.camera_width = 64;
    config.source.camera_height = 48;
    config.monitor.sensor_interval_ms = 10;
    config.monitor.frame_budget_ms = 5;
    config.monitor.rng_seed = Some(11);

    let mut monitor = Monitor::new(config).unwrap();
    let mut frames = monitor.subscribe_to_frames();
    monitor.start().unwrap();

    for _ in 0..3 {
        let frame = tokio::time::timeout(Duration::from_secs(2), frames.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!((frame.width, frame.height), (64, 48));
    }

    monitor.toggle_armed_state();
    tokio::time::timeout(Duration::from_secs(2), monitor.stop()).await.unwrap();

    assert!(monitor.status().frames_processed >= 3);
    assert_eq!(monitor.get_current_sensor_snapshot().len(), 1);
    assert!(monitor
        .query_events(50)
        .iter()
        .any(|e| e.event_type == "System" && e.description == "System ARMED"));
}
