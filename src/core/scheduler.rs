// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Loop pacing for the monitoring tasks

use std::time::{Duration, Instant};

/// Two-state machine each monitoring loop runs through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Last iteration succeeded
    Running,
    /// Last iteration faulted; the next wait is the longer backoff
    FaultedRetry,
}

impl LoopState {
    /// Delay before the next iteration
    pub fn next_delay(self, interval: Duration, backoff: Duration) -> Duration {
        match self {
            LoopState::Running => interval,
            LoopState::FaultedRetry => backoff,
        }
    }
}

/// Frame-rate ceiling with deadline bookkeeping
#[derive(Debug, Clone)]
pub struct FrameBudget {
    budget: Duration,
    deadline_misses: u64,
    worst_case: Duration,
    total_frames: u64,
}

impl FrameBudget {
    /// Budget of `budget` per iteration
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            deadline_misses: 0,
            worst_case: Duration::ZERO,
            total_frames: 0,
        }
    }

    /// Budget for a frame-rate ceiling
    pub fn from_fps(fps: u32) -> Self {
        Self::new(Duration::from_millis(1000 / u64::from(fps.max(1))))
    }

    /// Minimum time per iteration
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Record a finished iteration and return how long to sleep to stay under the ceiling
    pub fn finish(&mut self, started: Instant) -> Duration {
        let elapsed = started.elapsed();

        self.total_frames += 1;
        if elapsed > self.worst_case {
            self.worst_case = elapsed;
        }
        if elapsed > self.budget {
            self.deadline_misses += 1;
        }

        self.budget.saturating_sub(elapsed)
    }

    /// Iterations that overran the budget
    pub fn deadline_misses(&self) -> u64 {
        self.deadline_misses
    }

    /// Longest iteration seen
    pub fn worst_case(&self) -> Duration {
        self.worst_case
    }

    /// Iterations recorded
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}
