//! Template source rectangles.

use crate::image::ImageView;
use crate::util::{AdSkipError, AdSkipResult};

/// Pixel rectangle `{x, y, width, height}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Where a template was cut from, together with the size of the frame it was
/// cut from.
///
/// Captures of a different size are mapped through the ratio between the two
/// frame sizes, so a region keeps pointing at the same part of the picture
/// when the display scale changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub rect: Rect,
    pub frame_width: usize,
    pub frame_height: usize,
}

impl Region {
    /// Validates `rect` against a `frame_width x frame_height` frame.
    pub fn new(rect: Rect, frame_width: usize, frame_height: usize) -> AdSkipResult<Self> {
        if rect.width == 0 || rect.height == 0 {
            return Err(AdSkipError::InvalidDimensions {
                width: rect.width,
                height: rect.height,
            });
        }
        let fits = rect
            .x
            .checked_add(rect.width)
            .is_some_and(|end| end <= frame_width)
            && rect
                .y
                .checked_add(rect.height)
                .is_some_and(|end| end <= frame_height);
        if !fits {
            return Err(AdSkipError::RegionOutOfBounds {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                img_width: frame_width,
                img_height: frame_height,
            });
        }
        Ok(Self {
            rect,
            frame_width,
            frame_height,
        })
    }

    /// Square of side `size` centred in the frame, shrunk to fit.
    pub fn centered(frame_width: usize, frame_height: usize, size: usize) -> AdSkipResult<Self> {
        let width = size.min(frame_width);
        let height = size.min(frame_height);
        let rect = Rect::new(
            (frame_width - width) / 2,
            (frame_height - height) / 2,
            width,
            height,
        );
        Self::new(rect, frame_width, frame_height)
    }

    /// Maps the rectangle into a `width x height` capture.
    pub fn resolve(&self, width: usize, height: usize) -> AdSkipResult<Rect> {
        if width == self.frame_width && height == self.frame_height {
            return Ok(self.rect);
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(AdSkipError::InvalidDimensions {
                width: self.frame_width,
                height: self.frame_height,
            });
        }

        let x = scale(self.rect.x, width, self.frame_width);
        let y = scale(self.rect.y, height, self.frame_height);
        if x >= width || y >= height {
            return Err(AdSkipError::RegionOutOfBounds {
                x,
                y,
                width: 1,
                height: 1,
                img_width: width,
                img_height: height,
            });
        }
        let w = scale(self.rect.width, width, self.frame_width)
            .max(1)
            .min(width - x);
        let h = scale(self.rect.height, height, self.frame_height)
            .max(1)
            .min(height - y);
        Ok(Rect::new(x, y, w, h))
    }

    /// Crops a live capture to this region.
    pub fn apply<'a>(&self, frame: ImageView<'a, u8>) -> AdSkipResult<ImageView<'a, u8>> {
        let rect = self.resolve(frame.width(), frame.height())?;
        frame.crop(rect.x, rect.y, rect.width, rect.height)
    }
}

fn scale(value: usize, to: usize, from: usize) -> usize {
    (value * to + from / 2) / from
}
