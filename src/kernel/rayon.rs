//! Rayon-parallel correlation scan (feature-gated).
//!
//! Rows of placements are scored in parallel; the per-row winners are then
//! merged in row order, so the reported position is identical to the scalar
//! kernel's.

use crate::image::ImageView;
use crate::kernel::scalar::{best_in_row, placement_range};
use crate::kernel::{Correlation, Kernel, Position};
use crate::template::TemplatePlan;
use rayon::prelude::*;

/// Row-parallel exhaustive scan.
pub struct NccRayon;

impl Kernel for NccRayon {
    fn scan_full(search: ImageView<'_, u8>, plan: &TemplatePlan) -> Correlation {
        let Some((max_x, max_y)) = placement_range(search, plan) else {
            return Correlation::NONE;
        };

        let rows: Vec<Option<(f64, usize)>> = (0..=max_y)
            .into_par_iter()
            .map(|y| best_in_row(search, plan, y, max_x))
            .collect();

        let mut peak: Option<(f64, Position)> = None;
        for (y, row) in rows.into_iter().enumerate() {
            if let Some((score, x)) = row {
                if peak.is_none_or(|(b, _)| score > b) {
                    peak = Some((score, Position { x, y }));
                }
            }
        }
        Correlation::from_peak(peak)
    }
}
