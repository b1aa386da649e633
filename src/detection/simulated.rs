// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Random stand-in for a real detector

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use super::{DetectionResult, Detector};
use crate::core::ArmedState;
use crate::video::Frame;

/// Reports a detection with a fixed, independent probability per frame
pub struct SimulatedDetector {
    probability: f64,
    rng: ChaCha8Rng,
}

impl SimulatedDetector {
    /// Detector firing with `probability` per frame; seeded runs repeat
    pub fn new(probability: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { probability, rng }
    }
}

impl Detector for SimulatedDetector {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn analyze(&mut self, frame: Frame, _armed: ArmedState) -> DetectionResult {
        DetectionResult {
            detected: self.rng.gen::<f64>() < self.probability,
            annotated_frame: frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extreme_probabilities() {
        let mut never = SimulatedDetector::new(0.0, Some(1));
        let mut always = SimulatedDetector::new(1.0, Some(1));
        for _ in 0..50 {
            assert!(!never.analyze(Frame::blank(2, 2), ArmedState::Armed).detected);
            assert!(always.analyze(Frame::blank(2, 2), ArmedState::Armed).detected);
        }
    }

    #[test]
    fn test_rate_is_roughly_probability() {
        let mut detector = SimulatedDetector::new(0.1, Some(9));
        let hits = (0..10_000)
            .filter(|_| detector.analyze(Frame::blank(1, 1), ArmedState::Disarmed).detected)
            .count();
        assert!((700..1300).contains(&hits), "hits = {}", hits);
    }

    #[test]
    fn test_frame_passes_through() {
        let mut frame = Frame::blank(3, 3);
        frame.set_pixel(1, 1, [1, 2, 3]);
        let result = SimulatedDetector::new(0.5, Some(2)).analyze(frame.clone(), ArmedState::Armed);
        assert_eq!(result.annotated_frame, frame);
    }
}
