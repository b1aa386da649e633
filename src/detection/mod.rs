//! Detection module - pluggable "human present" detectors

mod classification;
mod differencing;
mod simulated;

pub use classification::{ClassifierDetector, RegionModel, ScoredRegion};
pub use differencing::{changed_regions, ChangedRegion, DifferencingDetector};
pub use simulated::SimulatedDetector;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{error, info};

use crate::core::ArmedState;
use crate::video::Frame;

/// Box colour while armed (red)
pub const ARMED_BOX_COLOR: [u8; 3] = [255, 0, 0];
/// Box colour while disarmed (grey)
pub const DISARMED_BOX_COLOR: [u8; 3] = [100, 100, 100];

/// Annotation colour for the given posture; cosmetic only
pub fn box_color(armed: ArmedState) -> [u8; 3] {
    match armed {
        ArmedState::Armed => ARMED_BOX_COLOR,
        ArmedState::Disarmed => DISARMED_BOX_COLOR,
    }
}

/// Output of one detector pass
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Whether a person was found
    pub detected: bool,
    /// Input frame with boxes drawn around findings
    pub annotated_frame: Frame,
}

/// A frame analyser the detection loop can drive without knowing its kind
pub trait Detector: Send {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Analyse one frame. `armed` may change how the frame is annotated but
    /// never the `detected` flag.
    fn analyze(&mut self, frame: Frame, armed: ArmedState) -> DetectionResult;

    /// Drop any state carried between frames
    fn reset(&mut self) {}
}

/// Detector variant, chosen once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// Logistic region scorer over loaded weights
    Classifier,
    /// Random detections at a fixed probability
    Simulated,
    /// Frame-to-frame change detection
    Differencing,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectorKind::Classifier => "classifier",
            DetectorKind::Simulated => "simulated",
            DetectorKind::Differencing => "differencing",
        };
        f.write_str(name)
    }
}

impl FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classifier" => Ok(DetectorKind::Classifier),
            "simulated" => Ok(DetectorKind::Simulated),
            "differencing" => Ok(DetectorKind::Differencing),
            other => Err(format!(
                "unknown detector `{}` (expected classifier, simulated or differencing)",
                other
            )),
        }
    }
}

/// Detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Which detector to build
    pub kind: DetectorKind,

    /// Classifier weights (JSON)
    pub model_path: PathBuf,

    /// Minimum classifier confidence for a region to count
    pub confidence_threshold: f64,

    /// Per-frame detection chance of the simulated detector
    pub simulated_probability: f64,

    /// Per-pixel luminance change that counts as "changed"
    pub diff_pixel_threshold: u8,

    /// A contiguous changed area must exceed this many pixels to count as motion
    pub diff_min_area: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            kind: DetectorKind::Classifier,
            model_path: PathBuf::from("models/person_detector.json"),
            confidence_threshold: 0.5,
            simulated_probability: 0.1,
            diff_pixel_threshold: 25,
            diff_min_area: 500,
        }
    }
}

/// Construct the configured detector.
///
/// A classifier whose weights cannot be loaded is replaced by the simulated
/// detector here, once, rather than on every frame.
pub fn build_detector(config: &DetectorConfig, seed: Option<u64>) -> Box<dyn Detector> {
    match config.kind {
        DetectorKind::Classifier => match RegionModel::load(&config.model_path) {
            Ok(model) => {
                info!("Classifier detection enabled ({:?})", config.model_path);
                Box::new(ClassifierDetector::new(model, config.confidence_threshold))
            }
            Err(e) => {
                error!(
                    "Failed to load classifier model {:?}: {}. Falling back to simulation.",
                    config.model_path, e
                );
                Box::new(SimulatedDetector::new(config.simulated_probability, seed))
            }
        },
        DetectorKind::Simulated => {
            info!("Simulated detection enabled (p={})", config.simulated_probability);
            Box::new(SimulatedDetector::new(config.simulated_probability, seed))
        }
        DetectorKind::Differencing => {
            info!(
                "Frame-differencing detection enabled (threshold={}, min_area={})",
                config.diff_pixel_threshold, config.diff_min_area
            );
            Box::new(DifferencingDetector::new(config.diff_pixel_threshold, config.diff_min_area))
        }
    }
}
