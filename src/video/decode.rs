// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Still-image loading (JPEG, PNG, BMP, PPM/PGM)

use image::{DynamicImage, ImageReader, Limits};
use std::io::Cursor;
use std::path::Path;

use super::Frame;
use crate::error::SourceError;

/// Largest accepted edge, in pixels
pub const MAX_IMAGE_DIMENSION: u32 = 8192;

/// File extensions `ClipSource::open_dir` picks up
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "ppm", "pgm"];

/// Whether a path looks like a loadable image
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

/// Read and decode an image file
pub fn load_image(path: &Path) -> Result<Frame, SourceError> {
    let bytes = std::fs::read(path)?;
    decode_image(&bytes).map_err(|e| match e {
        SourceError::Decode(e) => SourceError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
        other => other,
    })
}

/// Decode an in-memory image, guessing the format from its signature
pub fn decode_image(bytes: &[u8]) -> Result<Frame, SourceError> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);

    let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    reader.limits(limits);
    frame_from_image(reader.decode()?)
}

fn frame_from_image(image: DynamicImage) -> Result<Frame, SourceError> {
    let rgb = image.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    Frame::from_rgb(width, height, rgb.into_raw()).ok_or_else(|| {
        SourceError::Unavailable(format!("decoded image has no pixels ({}x{})", width, height))
    })
}
