// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! In-memory RGB frames

use ndarray::Array2;

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge
    pub x: usize,
    /// Top edge
    pub y: usize,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

impl Rect {
    /// Rectangle with its top-left corner at (x, y)
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    /// Pixels covered
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// Packed RGB8 image, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Position of the frame within its source
    pub index: u64,
    data: Vec<u8>,
}

impl Frame {
    /// Black frame
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            index: 0,
            data: vec![0; width * height * 3],
        }
    }

    /// Wrap an RGB buffer; `None` if the length does not match the dimensions
    pub fn from_rgb(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        if pixel_count(width, height)?.checked_mul(3)? != data.len() {
            return None;
        }
        Some(Self {
            width,
            height,
            index: 0,
            data,
        })
    }

    /// Expand a single-channel buffer to RGB
    pub fn from_gray(width: usize, height: usize, gray: &[u8]) -> Option<Self> {
        if pixel_count(width, height)? != gray.len() {
            return None;
        }
        let data = gray.iter().flat_map(|&v| [v, v, v]).collect();
        Some(Self {
            width,
            height,
            index: 0,
            data,
        })
    }

    /// RGB at (x, y), `None` outside the frame
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 3;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Writes outside the frame are ignored
    pub fn set_pixel(&mut self, x: usize, y: usize, color: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y * self.width + x) * 3;
        self.data[i..i + 3].copy_from_slice(&color);
    }

    /// Paint a solid rectangle, clipped to the frame
    pub fn fill_rect(&mut self, rect: Rect, color: [u8; 3]) {
        let x_end = (rect.x + rect.width).min(self.width);
        let y_end = (rect.y + rect.height).min(self.height);
        for y in rect.y..y_end {
            for x in rect.x..x_end {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Outline a rectangle `thickness` pixels wide, clipped to the frame
    pub fn draw_rect(&mut self, rect: Rect, color: [u8; 3], thickness: usize) {
        if rect.width == 0 || rect.height == 0 {
            return;
        }
        let x_last = rect.x + rect.width - 1;
        let y_last = rect.y + rect.height - 1;

        for t in 0..thickness.min(rect.width).min(rect.height) {
            for x in rect.x..=x_last {
                self.set_pixel(x, rect.y + t, color);
                self.set_pixel(x, y_last - t, color);
            }
            for y in rect.y..=y_last {
                self.set_pixel(rect.x + t, y, color);
                self.set_pixel(x_last - t, y, color);
            }
        }
    }

    /// Luminance plane (rows x columns)
    pub fn luma(&self) -> Array2<u8> {
        Array2::from_shape_fn((self.height, self.width), |(y, x)| {
            let i = (y * self.width + x) * 3;
            let r = u32::from(self.data[i]);
            let g = u32::from(self.data[i + 1]);
            let b = u32::from(self.data[i + 2]);
            ((77 * r + 150 * g + 29 * b) >> 8) as u8
        })
    }

    /// Packed RGB8 data
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take the packed RGB8 data
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

fn pixel_count(width: usize, height: usize) -> Option<usize> {
    width.checked_mul(height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_length_is_checked() {
        assert!(Frame::from_rgb(2, 2, vec![0; 12]).is_some());
        assert!(Frame::from_rgb(2, 2, vec![0; 11]).is_none());
        assert!(Frame::from_gray(3, 1, &[1, 2, 3]).is_some());
        assert!(Frame::from_gray(3, 1, &[1, 2]).is_none());
    }

    #[test]
    fn test_overflowing_dimensions_are_rejected() {
        let side = 1usize << (usize::BITS / 2);
        assert!(Frame::from_rgb(side, side, Vec::new()).is_none());
        assert!(Frame::from_gray(side, side, &[]).is_none());
        assert!(Frame::from_rgb(usize::MAX, 2, Vec::new()).is_none());
    }

    #[test]
    fn test_luma_of_gray_is_identity() {
        let frame = Frame::from_gray(2, 1, &[0, 200]).unwrap();
        let luma = frame.luma();
        assert_eq!(luma.dim(), (1, 2));
        assert_eq!(luma[[0, 0]], 0);
        assert!((i32::from(luma[[0, 1]]) - 200).abs() <= 1);
    }

    #[test]
    fn test_draw_rect_outline_only() {
        let mut frame = Frame::blank(10, 10);
        frame.draw_rect(Rect::new(2, 2, 6, 6), [255, 0, 0], 1);

        assert_eq!(frame.pixel(2, 2), Some([255, 0, 0]));
        assert_eq!(frame.pixel(7, 7), Some([255, 0, 0]));
        assert_eq!(frame.pixel(4, 4), Some([0, 0, 0]));
        assert_eq!(frame.pixel(1, 1), Some([0, 0, 0]));
    }

    #[test]
    fn test_shapes_are_clipped() {
        let mut frame = Frame::blank(4, 4);
        frame.fill_rect(Rect::new(2, 2, 10, 10), [9, 9, 9]);
        frame.draw_rect(Rect::new(3, 3, 10, 10), [1, 2, 3], 2);

        assert_eq!(frame.pixel(2, 2), Some([9, 9, 9]));
        assert_eq!(frame.pixel(3, 3), Some([1, 2, 3]));
        assert_eq!(frame.pixel(10, 10), None);
    }
}
