// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Region classifier for person detection
//!
//! The frame is cut into square cells. Each cell is reduced to three
//! features (mean brightness, contrast, horizontal edge energy) and scored
//! with a logistic model whose weights are loaded from JSON.

use ndarray::{s, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::{box_color, DetectionResult, Detector};
use crate::core::ArmedState;
use crate::error::ModelError;
use crate::video::{Frame, Rect};

/// Logistic weights over per-cell features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionModel {
    /// Edge length of a scoring cell, in pixels
    pub cell_size: usize,
    /// Weights for [mean, contrast, edge energy], each feature in 0..=1
    pub weights: [f64; 3],
    /// Logit offset
    pub bias: f64,
}

/// A cell and its person confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRegion {
    /// Cell bounds
    pub rect: Rect,
    /// Logistic score in 0..=1
    pub confidence: f64,
}

impl RegionModel {
    /// Load weights from a JSON file
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    /// Reject cell sizes and weights the scorer cannot use
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.cell_size < 2 {
            return Err(ModelError::Invalid(format!(
                "cell_size must be at least 2, got {}",
                self.cell_size
            )));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(ModelError::Invalid("weights must be finite".to_string()));
        }
        Ok(())
    }

    /// Score every full cell of a luminance image
    pub fn score_regions(&self, luma: &Array2<u8>) -> Vec<ScoredRegion> {
        let (height, width) = luma.dim();
        let cell = self.cell_size;
        let mut regions = Vec::with_capacity((height / cell) * (width / cell));

        for row in 0..height / cell {
            for col in 0..width / cell {
                let (x, y) = (col * cell, row * cell);
                let view = luma.slice(s![y..y + cell, x..x + cell]);
                regions.push(ScoredRegion {
                    rect: Rect::new(x, y, cell, cell),
                    confidence: self.score(&cell_features(view)),
                });
            }
        }

        regions
    }

    fn score(&self, features: &[f64; 3]) -> f64 {
        let z = self
            .weights
            .iter()
            .zip(features.iter())
            .map(|(w, f)| w * f)
            .sum::<f64>()
            + self.bias;
        1.0 / (1.0 + (-z).exp())
    }
}

fn cell_features(cell: ArrayView2<'_, u8>) -> [f64; 3] {
    let n = cell.len().max(1) as f64;
    let mean = cell.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    let variance = cell
        .iter()
        .map(|&v| (f64::from(v) - mean).powi(2))
        .sum::<f64>()
        / n;

    let mut gradient = 0.0;
    let mut pairs = 0usize;
    for row in cell.rows() {
        for (a, b) in row.iter().zip(row.iter().skip(1)) {
            gradient += f64::from(a.abs_diff(*b));
            pairs += 1;
        }
    }
    let edge = if pairs > 0 { gradient / pairs as f64 } else { 0.0 };

    [mean / 255.0, variance.sqrt() / 128.0, edge / 255.0]
}

/// Draws a box around every cell scoring above the threshold
pub struct ClassifierDetector {
    model: RegionModel,
    threshold: f64,
}

impl ClassifierDetector {
    /// Detector flagging cells scoring at least `threshold`
    pub fn new(model: RegionModel, threshold: f64) -> Self {
        Self { model, threshold }
    }

    /// Weights in use
    pub fn model(&self) -> &RegionModel {
        &self.model
    }
}

impl Detector for ClassifierDetector {
    fn name(&self) -> &'static str {
        "classifier"
    }

    fn analyze(&mut self, frame: Frame, armed: ArmedState) -> DetectionResult {
        let hits: Vec<ScoredRegion> = self
            .model
            .score_regions(&frame.luma())
            .into_iter()
            .filter(|region| region.confidence > self.threshold)
            .collect();

        let mut annotated = frame;
        let color = box_color(armed);
        for region in &hits {
            debug!("Person candidate at {:?} ({:.2})", region.rect, region.confidence);
            annotated.draw_rect(region.rect, color, 2);
        }

        DetectionResult {
            detected: !hits.is_empty(),
            annotated_frame: annotated,
        }
    }
}
