// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Frame sources: static images, finite clips and the synthetic live camera

use async_trait::async_trait;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{is_image_path, load_image, Frame, Rect};
use crate::error::SourceError;

/// Anything the detection loop can pull frames from
#[async_trait]
pub trait FrameSource: Send {
    /// Human-readable description for logs and the dashboard
    fn describe(&self) -> String;

    /// Next frame, or `Ok(None)` when a finite source has run out
    async fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Seek back to the first frame
    fn rewind(&mut self) -> Result<(), SourceError>;

    /// Whether every frame is the same image
    fn is_static(&self) -> bool {
        false
    }
}

/// A single image served repeatedly
pub struct StaticImageSource {
    frame: Frame,
    label: String,
    served: u64,
}

impl StaticImageSource {
    /// Decode an image file
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let frame = load_image(path)?;
        Ok(Self::from_frame(frame, &path.display().to_string()))
    }

    /// Serve an already decoded frame
    pub fn from_frame(frame: Frame, label: &str) -> Self {
        Self {
            frame,
            label: label.to_string(),
            served: 0,
        }
    }
}

#[async_trait]
impl FrameSource for StaticImageSource {
    fn describe(&self) -> String {
        format!("static image {}", self.label)
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let mut frame = self.frame.clone();
        frame.index = self.served;
        self.served += 1;
        Ok(Some(frame))
    }

    fn rewind(&mut self) -> Result<(), SourceError> {
        self.served = 0;
        Ok(())
    }

    fn is_static(&self) -> bool {
        true
    }
}

/// Finite sequence of frames that reports exhaustion at the end
pub struct ClipSource {
    frames: Vec<Frame>,
    position: usize,
    label: String,
}

impl ClipSource {
    /// Looping clip; an empty clip is rejected
    pub fn from_frames(frames: Vec<Frame>, label: &str) -> Result<Self, SourceError> {
        if frames.is_empty() {
            return Err(SourceError::Unavailable(format!("clip {} has no frames", label)));
        }
        Ok(Self {
            frames,
            position: 0,
            label: label.to_string(),
        })
    }

    /// Every image file in a directory, in file-name order
    pub fn open_dir(dir: &Path) -> Result<Self, SourceError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_image_path(path))
            .collect();
        paths.sort();

        let frames = paths
            .iter()
            .map(|path| load_image(path))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Loaded {} clip frames from {:?}", frames.len(), dir);

        Self::from_frames(frames, &dir.display().to_string())
    }

    /// Index of the frame the next pull will return
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[async_trait]
impl FrameSource for ClipSource {
    fn describe(&self) -> String {
        format!("clip {} ({} frames)", self.label, self.frames.len())
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let Some(frame) = self.frames.get(self.position) else {
            return Ok(None);
        };
        let mut frame = frame.clone();
        frame.index = self.position as u64;
        self.position += 1;
        Ok(Some(frame))
    }

    fn rewind(&mut self) -> Result<(), SourceError> {
        self.position = 0;
        Ok(())
    }
}

const BACKGROUND_LEVEL: f64 = 40.0;
const NOISE_SIGMA: f64 = 6.0;
const INTRUDER_PROBABILITY: f64 = 0.02;
const INTRUDER_LEVEL: u8 = 200;

/// Noise-only "live camera" used when no real source is available.
///
/// Occasionally a bright figure walks across the scene so detectors have
/// something to find.
pub struct SyntheticCamera {
    width: usize,
    height: usize,
    rng: ChaCha8Rng,
    intruder_x: Option<usize>,
    produced: u64,
}

impl SyntheticCamera {
    /// Camera of the given size; seeded runs repeat
    pub fn new(width: usize, height: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            width: width.max(1),
            height: height.max(1),
            rng,
            intruder_x: None,
            produced: 0,
        }
    }

    fn intruder_rect(&self, x: usize) -> Rect {
        let width = (self.width / 8).max(1);
        let height = (self.height / 2).max(1);
        Rect::new(x, self.height - height, width, height)
    }
}

#[async_trait]
impl FrameSource for SyntheticCamera {
    fn describe(&self) -> String {
        format!("synthetic camera {}x{}", self.width, self.height)
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let mut gray = Vec::with_capacity(self.width * self.height);
        for _ in 0..self.width * self.height {
            let noise: f64 = self.rng.sample(StandardNormal);
            gray.push((BACKGROUND_LEVEL + noise * NOISE_SIGMA).clamp(0.0, 255.0) as u8);
        }
        let mut frame = Frame::from_gray(self.width, self.height, &gray)
            .ok_or_else(|| SourceError::Unavailable("synthetic frame size mismatch".to_string()))?;

        self.intruder_x = match self.intruder_x {
            None if self.rng.gen::<f64>() < INTRUDER_PROBABILITY => Some(0),
            Some(x) if x + self.width / 16 + 1 < self.width => Some(x + self.width / 16 + 1),
            Some(_) => None,
            None => None,
        };
        if let Some(x) = self.intruder_x {
            let rect = self.intruder_rect(x);
            frame.fill_rect(rect, [INTRUDER_LEVEL; 3]);
        }

        frame.index = self.produced;
        self.produced += 1;
        Ok(Some(frame))
    }

    fn rewind(&mut self) -> Result<(), SourceError> {
        self.produced = 0;
        self.intruder_x = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(len: usize) -> ClipSource {
        let frames = (0..len).map(|_| Frame::blank(4, 4)).collect();
        ClipSource::from_frames(frames, "test").unwrap()
    }

    #[tokio::test]
    async fn test_clip_reports_exhaustion_then_rewinds() {
        let mut source = clip(3);
        for expected in 0..3 {
            let frame = source.next_frame().await.unwrap().unwrap();
            assert_eq!(frame.index, expected);
        }
        assert!(source.next_frame().await.unwrap().is_none());

        source.rewind().unwrap();
        assert_eq!(source.position(), 0);
        assert_eq!(source.next_frame().await.unwrap().unwrap().index, 0);
    }

    #[test]
    fn test_empty_clip_is_unavailable() {
        let err = ClipSource::from_frames(Vec::new(), "empty").err().unwrap();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_static_source_never_ends() {
        let mut source = StaticImageSource::from_frame(Frame::blank(2, 2), "blank");
        assert!(source.is_static());
        for expected in 0..5 {
            assert_eq!(source.next_frame().await.unwrap().unwrap().index, expected);
        }
    }

    #[tokio::test]
    async fn test_clip_dir_loads_sorted_images() {
        let dir = tempfile::tempdir().unwrap();
        for (name, level) in [("b.pgm", 20u8), ("a.pgm", 10u8), ("notes.txt", 0u8)] {
            let mut bytes = b"P5 1 1 255\n".to_vec();
            bytes.push(level);
            std::fs::write(dir.path().join(name), bytes).unwrap();
        }
        image::RgbImage::from_pixel(1, 1, image::Rgb([30, 30, 30]))
            .save(dir.path().join("c.png"))
            .unwrap();

        let mut source = ClipSource::open_dir(dir.path()).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(source.next_frame().await.unwrap().unwrap().pixel(0, 0), Some([10, 10, 10]));
        assert_eq!(source.next_frame().await.unwrap().unwrap().pixel(0, 0), Some([20, 20, 20]));
        assert_eq!(source.next_frame().await.unwrap().unwrap().pixel(0, 0), Some([30, 30, 30]));
    }

    #[tokio::test]
    async fn test_synthetic_camera_is_deterministic_with_seed() {
        let mut a = SyntheticCamera::new(16, 12, Some(7));
        let mut b = SyntheticCamera::new(16, 12, Some(7));
        for _ in 0..3 {
            let fa = a.next_frame().await.unwrap().unwrap();
            let fb = b.next_frame().await.unwrap().unwrap();
            assert_eq!((fa.width, fa.height), (16, 12));
            assert_eq!(fa, fb);
        }
    }
}
