// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Frame-differencing motion detector

use ndarray::{Array2, Zip};
use std::collections::VecDeque;
use tracing::debug;

use super::{box_color, DetectionResult, Detector};
use crate::core::ArmedState;
use crate::video::{Frame, Rect};

/// A 4-connected blob of changed pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedRegion {
    /// Bounding box of the blob
    pub bounds: Rect,
    /// Number of changed pixels in the blob
    pub area: usize,
}

/// Compares each frame against the previous one
pub struct DifferencingDetector {
    previous: Option<Array2<u8>>,
    pixel_threshold: u8,
    min_area: usize,
}

impl DifferencingDetector {
    /// Detector with no reference frame yet
    pub fn new(pixel_threshold: u8, min_area: usize) -> Self {
        Self {
            previous: None,
            pixel_threshold,
            min_area,
        }
    }

    /// Whether a previous frame is held for comparison
    pub fn has_reference(&self) -> bool {
        self.previous.is_some()
    }
}

impl Detector for DifferencingDetector {
    fn name(&self) -> &'static str {
        "differencing"
    }

    fn analyze(&mut self, frame: Frame, armed: ArmedState) -> DetectionResult {
        let current = frame.luma();

        let regions = match self.previous.take() {
            Some(previous) if previous.dim() == current.dim() => {
                let threshold = self.pixel_threshold;
                let mask = Zip::from(&previous)
                    .and(&current)
                    .map_collect(|&a, &b| a.abs_diff(b) > threshold);
                changed_regions(&mask)
            }
            _ => {
                // Nothing to diff against yet.
                debug!("Seeding differencing reference frame");
                self.previous = Some(current);
                return DetectionResult {
                    detected: false,
                    annotated_frame: frame,
                };
            }
        };
        self.previous = Some(current);

        let mut annotated = frame;
        let mut detected = false;
        let color = box_color(armed);
        for region in regions.iter().filter(|r| r.area > self.min_area) {
            annotated.draw_rect(region.bounds, color, 2);
            detected = true;
        }

        DetectionResult {
            detected,
            annotated_frame: annotated,
        }
    }

    fn reset(&mut self) {
        self.previous = None;
    }
}

/// Label the 4-connected components of a change mask
pub fn changed_regions(mask: &Array2<bool>) -> Vec<ChangedRegion> {
    let (rows, cols) = mask.dim();
    let mut visited = Array2::from_elem((rows, cols), false);
    let mut regions = Vec::new();
    let mut queue = VecDeque::new();

    for y in 0..rows {
        for x in 0..cols {
            if !mask[[y, x]] || visited[[y, x]] {
                continue;
            }

            visited[[y, x]] = true;
            queue.push_back((y, x));
            let (mut min_x, mut max_x, mut min_y, mut max_y) = (x, x, y, y);
            let mut area = 0;

            while let Some((cy, cx)) = queue.pop_front() {
                area += 1;
                min_x = min_x.min(cx);
                max_x = max_x.max(cx);
                min_y = min_y.min(cy);
                max_y = max_y.max(cy);

                let neighbours = [
                    (cy.wrapping_sub(1), cx),
                    (cy + 1, cx),
                    (cy, cx.wrapping_sub(1)),
                    (cy, cx + 1),
                ];
                for (ny, nx) in neighbours {
                    if ny < rows && nx < cols && mask[[ny, nx]] && !visited[[ny, nx]] {
                        visited[[ny, nx]] = true;
                        queue.push_back((ny, nx));
                    }
                }
            }

            regions.push(ChangedRegion {
                bounds: Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1),
                area,
            });
        }
    }

    regions
}
