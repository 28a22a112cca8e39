//! 64-bit average-hash fingerprints and Hamming similarity.
//!
//! A fingerprint is built by box-resampling the image to 8x8, taking the mean
//! of the 64 cells, and setting bit `63 - i` when cell `i` (row-major) is
//! strictly brighter than the mean. Zero-variance images therefore hash to
//! `0` regardless of their brightness.

use crate::image::resample::resample_box;
use crate::image::ImageView;
use crate::util::AdSkipResult;

/// Side length of the downsampled hash grid.
pub const HASH_SIDE: usize = 8;

/// Number of bits in a fingerprint.
pub const HASH_BITS: u32 = 64;

/// Version of the resample filter and bit layout. Cached fingerprints carrying
/// another version are recomputed from pixels.
pub const FINGERPRINT_VERSION: u32 = 1;

/// Perceptual fingerprint of a grayscale image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Computes the fingerprint of an arbitrary-size grayscale view.
    pub fn from_view(image: ImageView<'_, u8>) -> AdSkipResult<Self> {
        let grid = resample_box(image, HASH_SIDE, HASH_SIDE)?;
        Ok(Self::from_cells(grid.pixels()))
    }

    fn from_cells(cells: &[u8]) -> Self {
        let sum: u32 = cells.iter().map(|&v| v as u32).sum();
        let avg = sum as f64 / cells.len() as f64;
        let mut bits = 0u64;
        for (i, &value) in cells.iter().enumerate() {
            if value as f64 > avg {
                bits |= 1u64 << (63 - i);
            }
        }
        Self(bits)
    }

    /// Returns the raw hash bits.
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Number of differing bits (0..=64).
    pub fn hamming_distance(self, other: Self) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Similarity in `[0, 1]`; `1` for identical fingerprints.
    pub fn similarity(self, other: Self) -> f32 {
        similarity(self, other)
    }
}

/// Normalized Hamming similarity: `1 - popcount(a ^ b) / 64`.
pub fn similarity(a: Fingerprint, b: Fingerprint) -> f32 {
    1.0 - a.hamming_distance(b) as f32 / HASH_BITS as f32
}
