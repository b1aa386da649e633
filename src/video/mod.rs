// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Video module - frames and the sources that produce them

mod decode;
mod frame;
mod source;

pub use frame::{Frame, Rect};
pub use decode::{decode_image, is_image_path, load_image, IMAGE_EXTENSIONS, MAX_IMAGE_DIMENSION};
pub use source::{ClipSource, FrameSource, StaticImageSource, SyntheticCamera};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::SourceError;

/// Frame source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Static image file or directory of clip frames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Substitute the synthetic camera when the primary source is unusable
    pub fallback_camera: bool,

    /// Synthetic camera frame width
    pub camera_width: usize,
    /// Synthetic camera frame height
    pub camera_height: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("static/placeholder.jpg")),
            fallback_camera: true,
            camera_width: 320,
            camera_height: 240,
        }
    }
}

/// Opens frame sources on demand for the detection loop
pub trait SourceProvider: Send + Sync {
    /// Preferred source
    fn open_primary(&self) -> Result<Box<dyn FrameSource>, SourceError>;

    /// Alternate source used after the primary fails
    fn open_fallback(&self) -> Result<Box<dyn FrameSource>, SourceError>;
}

/// Sources described by [`SourceConfig`]
pub struct ConfiguredSources {
    config: SourceConfig,
    seed: Option<u64>,
}

impl ConfiguredSources {
    /// Provider over the configured path and camera
    pub fn new(config: SourceConfig, seed: Option<u64>) -> Self {
        Self { config, seed }
    }
}

impl SourceProvider for ConfiguredSources {
    fn open_primary(&self) -> Result<Box<dyn FrameSource>, SourceError> {
        match &self.config.path {
            None => Err(SourceError::Unavailable("no source path configured".to_string())),
            Some(path) if path.is_dir() => Ok(Box::new(ClipSource::open_dir(path)?)),
            Some(path) => Ok(Box::new(StaticImageSource::open(path)?)),
        }
    }

    fn open_fallback(&self) -> Result<Box<dyn FrameSource>, SourceError> {
        if !self.config.fallback_camera {
            return Err(SourceError::Unavailable("fallback camera disabled".to_string()));
        }
        Ok(Box::new(SyntheticCamera::new(
            self.config.camera_width,
            self.config.camera_height,
            self.seed,
        )))
    }
}
