//! Normalized cross-correlation kernels.
//!
//! The score at a placement is `Σ(T·S) / sqrt(ΣT² · ΣS²)` over the template
//! footprint, or `-1` when either energy is zero. Kernels return the first
//! maximum in row-major order.

use crate::image::ImageView;
use crate::template::TemplatePlan;

/// Top-left placement of the template inside the search image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

/// Best placement found by a correlation scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correlation {
    /// `None` when no placement was evaluated (search smaller than template).
    pub position: Option<Position>,
    /// `(max_correlation + 1) / 2`, or `0` without a placement.
    pub confidence: f32,
}

impl Correlation {
    /// Result reported when the search image cannot hold the template.
    pub const NONE: Self = Self {
        position: None,
        confidence: 0.0,
    };

    pub(crate) fn from_peak(peak: Option<(f64, Position)>) -> Self {
        match peak {
            Some((score, position)) => Self {
                position: Some(position),
                confidence: ((score + 1.0) / 2.0) as f32,
            },
            None => Self::NONE,
        }
    }
}

/// Kernel trait for scoring and scan operations.
pub trait Kernel {
    /// Computes the raw correlation at a single placement.
    fn score_at(search: ImageView<'_, u8>, plan: &TemplatePlan, x: usize, y: usize) -> f64 {
        scalar::score_at(search, plan, x, y)
    }

    /// Scans every valid placement and returns the best one.
    fn scan_full(search: ImageView<'_, u8>, plan: &TemplatePlan) -> Correlation;
}

pub mod scalar;

#[cfg(feature = "rayon")]
pub mod rayon;
