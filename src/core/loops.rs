// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! The two periodic monitoring tasks

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::engine::MonitorState;
use super::{CandidateEvent, FrameBudget, LoopState};
use crate::db::Event;
use crate::detection::Detector;
use crate::error::SourceError;
use crate::sensors::SensorSet;
use crate::video::{Frame, FrameSource, SourceProvider};

/// What one sensor poll did
#[derive(Debug, Default)]
pub struct PollReport {
    /// Events that made it into the store, in dispatch order
    pub persisted: Vec<Event>,
    /// Transitions seen, persisted or not
    pub candidates: usize,
    /// Sensors that failed to respond
    pub faults: usize,
}

/// Polls every sensor on a fixed interval
pub struct SensorLoop {
    sensors: SensorSet,
    state: MonitorState,
    interval: Duration,
    backoff: Duration,
    loop_state: LoopState,
}

impl SensorLoop {
    /// Loop waiting `interval` between polls and `backoff` after a faulted one
    pub fn new(
        sensors: SensorSet,
        state: MonitorState,
        interval: Duration,
        backoff: Duration,
    ) -> Self {
        Self {
            sensors,
            state,
            interval,
            backoff,
            loop_state: LoopState::Running,
        }
    }

    /// State after the latest poll
    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// One iteration: read posture, evaluate sensors, publish, dispatch
    pub fn poll_once(&mut self) -> PollReport {
        let armed = self.state.get_armed_state();
        let outcome = self.sensors.check_all(armed);

        // Publish before dispatching so readers see the new states even when
        // the store is slow.
        self.state.publish_snapshot(outcome.snapshot);

        let candidates = outcome.candidates.len();
        let dispatcher = self.state.dispatcher();
        let persisted: Vec<Event> = outcome
            .candidates
            .into_iter()
            .filter_map(|candidate| dispatcher.dispatch(candidate))
            .collect();

        let faults = outcome.faults.len();
        self.state.record_poll(faults);
        self.loop_state = if faults == 0 {
            LoopState::Running
        } else {
            LoopState::FaultedRetry
        };

        PollReport {
            persisted,
            candidates,
            faults,
        }
    }

    /// Poll until shutdown is signalled
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!("Sensor loop started ({} sensors)", self.sensors.len());

        loop {
            let delay = self.loop_state.next_delay(self.interval, self.backoff);
            if self.loop_state == LoopState::FaultedRetry {
                warn!("Sensor fault, backing off for {:?}", delay);
            }

            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            let report = self.poll_once();
            debug!(
                "Sensor poll: {} transitions, {} persisted, {} faults",
                report.candidates,
                report.persisted.len(),
                report.faults
            );
        }

        info!("Sensor loop stopped");
    }
}

/// Result of one detection iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A frame was analysed and published
    Processed {
        /// Position of the frame within its source
        index: u64,
        /// Whether the detector found a person
        detected: bool,
        /// Whether the frame came from a static image
        is_static: bool,
    },
    /// No source could deliver a frame
    SourceUnavailable,
}

/// Pulls frames, runs the detector and publishes annotated frames
pub struct DetectionLoop {
    detector: Box<dyn Detector>,
    sources: Arc<dyn SourceProvider>,
    source: Option<Box<dyn FrameSource>>,
    prefer_fallback: bool,
    state: MonitorState,
    budget: FrameBudget,
    static_delay: Duration,
    retry_delay: Duration,
    last_detected: bool,
}

impl DetectionLoop {
    /// Loop with no source opened yet
    pub fn new(
        detector: Box<dyn Detector>,
        sources: Arc<dyn SourceProvider>,
        state: MonitorState,
        frame_budget: Duration,
        static_delay: Duration,
        retry_delay: Duration,
    ) -> Self {
        Self {
            detector,
            sources,
            source: None,
            prefer_fallback: false,
            state,
            budget: FrameBudget::new(frame_budget),
            static_delay,
            retry_delay,
            last_detected: false,
        }
    }

    /// Deadline bookkeeping for processed frames
    pub fn budget(&self) -> &FrameBudget {
        &self.budget
    }

    /// Description of the source currently in use
    pub fn active_source(&self) -> Option<String> {
        self.source.as_ref().map(|s| s.describe())
    }

    fn ensure_source(&mut self) -> bool {
        if self.source.is_some() {
            return true;
        }

        let opened = if self.prefer_fallback {
            self.sources.open_fallback()
        } else {
            self.sources.open_primary().or_else(|e| {
                warn!("Primary video source unavailable: {}. Trying fallback camera.", e);
                self.sources.open_fallback()
            })
        };

        match opened {
            Ok(source) => {
                let label = source.describe();
                info!("Video source: {}", label);
                self.state.record_source(Some(label));
                self.detector.reset();
                self.last_detected = false;
                self.source = Some(source);
                true
            }
            Err(e) => {
                warn!("No video source available: {}. Retrying in {:?}", e, self.retry_delay);
                self.state.record_source(None);
                // Give the primary another chance on the next attempt.
                self.prefer_fallback = false;
                false
            }
        }
    }

    /// Pull, analyse, dispatch and publish one frame
    pub async fn step(&mut self) -> StepOutcome {
        if !self.ensure_source() {
            return StepOutcome::SourceUnavailable;
        }
        let Some(source) = self.source.as_mut() else {
            return StepOutcome::SourceUnavailable;
        };

        let is_static = source.is_static();
        let pulled = pull_frame(source.as_mut()).await;
        let frame = match pulled {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Video source error: {}. Re-initializing...", e);
                self.source = None;
                self.prefer_fallback = true;
                self.state.record_source(None);
                return StepOutcome::SourceUnavailable;
            }
        };

        let index = frame.index;
        let armed = self.state.get_armed_state();
        let result = self.detector.analyze(frame, armed);

        // One event per appearance, not one per frame.
        if result.detected && !self.last_detected {
            self.state
                .dispatcher()
                .dispatch(CandidateEvent::motion("Human detected in video feed"));
        }
        self.last_detected = result.detected;

        self.state.record_frame(result.detected);
        self.state.publish_frame(result.annotated_frame);

        StepOutcome::Processed {
            index,
            detected: result.detected,
            is_static,
        }
    }

    /// Run until shutdown is signalled
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!("Detection loop started (detector: {})", self.detector.name());

        loop {
            let started = Instant::now();
            let delay = match self.step().await {
                StepOutcome::Processed { is_static: true, .. } => self.static_delay,
                StepOutcome::Processed { .. } => self.budget.finish(started),
                StepOutcome::SourceUnavailable => self.retry_delay,
            };

            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(
            "Detection loop stopped ({} frames, {} over budget)",
            self.budget.total_frames(),
            self.budget.deadline_misses()
        );
    }
}

/// Next frame, rewinding a finished source once
async fn pull_frame(source: &mut dyn FrameSource) -> Result<Frame, SourceError> {
    if let Some(frame) = source.next_frame().await? {
        return Ok(frame);
    }

    debug!("{} exhausted, rewinding", source.describe());
    source.rewind()?;
    source
        .next_frame()
        .await?
        .ok_or_else(|| SourceError::Unavailable(format!("{} has no frames", source.describe())))
}
