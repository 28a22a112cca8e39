//! Grayscale image buffers and views.
//!
//! `GrayImage` is the owned, contiguous luminance buffer produced from a
//! capture. `ImageView` is a borrowed 2D view into a 1D buffer with an explicit
//! stride; region crops are zero-copy views that keep the parent stride.

use crate::util::{AdSkipError, AdSkipResult};

pub mod gray;
#[cfg(feature = "image-io")]
pub mod io;
pub mod resample;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> AdSkipResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> AdSkipResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(AdSkipError::BufferLength {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Iterates over rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        (0..self.height).filter_map(move |y| self.row(y))
    }

    /// Returns a zero-copy crop into the same backing buffer.
    pub fn crop(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> AdSkipResult<ImageView<'a, T>> {
        if width == 0 || height == 0 {
            return Err(AdSkipError::InvalidDimensions { width, height });
        }

        let out_of_bounds = AdSkipError::RegionOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| out_of_bounds.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| out_of_bounds.clone())?;
        if end_x > self.width || end_y > self.height {
            return Err(out_of_bounds);
        }

        let start = y * self.stride + x;
        ImageView::new(&self.data[start..], width, height, self.stride)
    }
}

impl<T: Copy> ImageView<'_, T> {
    /// Copies the view into a contiguous row-major vector.
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.width * self.height);
        for row in self.rows() {
            out.extend_from_slice(row);
        }
        out
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> AdSkipResult<usize> {
    if width == 0 || height == 0 {
        return Err(AdSkipError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(AdSkipError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(AdSkipError::InvalidDimensions { width, height })
}

/// Owned contiguous grayscale buffer (`pixels.len() == width * height`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
}

impl GrayImage {
    /// Wraps a row-major luminance buffer, rejecting length mismatches.
    pub fn new(pixels: Vec<u8>, width: usize, height: usize) -> AdSkipResult<Self> {
        if width == 0 || height == 0 {
            return Err(AdSkipError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(AdSkipError::InvalidDimensions { width, height })?;
        if pixels.len() != needed {
            return Err(AdSkipError::BufferLength {
                needed,
                got: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Creates an image filled with a single luminance value.
    pub fn filled(width: usize, height: usize, value: u8) -> AdSkipResult<Self> {
        let len = width
            .checked_mul(height)
            .ok_or(AdSkipError::InvalidDimensions { width, height })?;
        Self::new(vec![value; len], width, height)
    }

    /// Copies a (possibly strided) view into an owned image.
    pub fn from_view(view: ImageView<'_, u8>) -> AdSkipResult<Self> {
        Self::new(view.to_vec(), view.width(), view.height())
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.pixels,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major pixel buffer.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consumes the image and returns its pixel buffer.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::{GrayImage, ImageView};
    use crate::util::AdSkipError;

    #[test]
    fn crop_keeps_parent_stride() {
        let data: Vec<u8> = (0u8..16).collect();
        let view = ImageView::from_slice(&data, 4, 4).unwrap();

        let crop = view.crop(1, 1, 2, 2).unwrap();
        assert_eq!(crop.stride(), 4);
        assert_eq!(crop.row(0).unwrap(), &[5u8, 6u8]);
        assert_eq!(crop.row(1).unwrap(), &[9u8, 10u8]);
        assert_eq!(crop.to_vec(), vec![5, 6, 9, 10]);
        assert!(crop.get(2, 0).is_none());
    }

    #[test]
    fn crop_rejects_out_of_bounds() {
        let data = [0u8; 16];
        let view = ImageView::from_slice(&data, 4, 4).unwrap();
        let err = view.crop(3, 3, 2, 2).err().unwrap();
        assert_eq!(
            err,
            AdSkipError::RegionOutOfBounds {
                x: 3,
                y: 3,
                width: 2,
                height: 2,
                img_width: 4,
                img_height: 4,
            }
        );
    }

    #[test]
    fn gray_image_rejects_length_mismatch() {
        let err = GrayImage::new(vec![0; 5], 2, 2).err().unwrap();
        assert_eq!(err, AdSkipError::BufferLength { needed: 4, got: 5 });

        let err = GrayImage::new(Vec::new(), 0, 3).err().unwrap();
        assert_eq!(
            err,
            AdSkipError::InvalidDimensions {
                width: 0,
                height: 3
            }
        );
    }
}
