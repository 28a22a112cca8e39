//! Scalar reference kernel.

use crate::image::ImageView;
use crate::kernel::{Correlation, Kernel, Position};
use crate::template::TemplatePlan;

/// Single-threaded exhaustive scan.
pub struct NccScalar;

pub(crate) fn score_at(search: ImageView<'_, u8>, plan: &TemplatePlan, x: usize, y: usize) -> f64 {
    let tpl_width = plan.width();
    let tpl = plan.data();
    let mut dot = 0.0f64;
    let mut search_energy = 0.0f64;
    for ty in 0..plan.height() {
        let Some(row) = search.row(y + ty) else {
            return -1.0;
        };
        let Some(window) = row.get(x..x + tpl_width) else {
            return -1.0;
        };
        let base = ty * tpl_width;
        for (tx, &value) in window.iter().enumerate() {
            let s = value as f64;
            dot += tpl[base + tx] * s;
            search_energy += s * s;
        }
    }

    let denom = (plan.energy() * search_energy).sqrt();
    if denom > 0.0 {
        dot / denom
    } else {
        -1.0
    }
}

/// Returns the best `(score, x)` on row `y`, keeping the leftmost on ties.
pub(crate) fn best_in_row(
    search: ImageView<'_, u8>,
    plan: &TemplatePlan,
    y: usize,
    max_x: usize,
) -> Option<(f64, usize)> {
    let mut best: Option<(f64, usize)> = None;
    for x in 0..=max_x {
        let score = score_at(search, plan, x, y);
        if best.is_none_or(|(b, _)| score > b) {
            best = Some((score, x));
        }
    }
    best
}

/// Valid placement range, or `None` if the template does not fit.
pub(crate) fn placement_range(
    search: ImageView<'_, u8>,
    plan: &TemplatePlan,
) -> Option<(usize, usize)> {
    let max_x = search.width().checked_sub(plan.width())?;
    let max_y = search.height().checked_sub(plan.height())?;
    Some((max_x, max_y))
}

impl Kernel for NccScalar {
    fn scan_full(search: ImageView<'_, u8>, plan: &TemplatePlan) -> Correlation {
        let Some((max_x, max_y)) = placement_range(search, plan) else {
            return Correlation::NONE;
        };

        let mut peak: Option<(f64, Position)> = None;
        for y in 0..=max_y {
            if let Some((score, x)) = best_in_row(search, plan, y, max_x) {
                if peak.is_none_or(|(b, _)| score > b) {
                    peak = Some((score, Position { x, y }));
                }
            }
        }
        Correlation::from_peak(peak)
    }
}

#[cfg(test)]
mod tests {
    use super::{score_at, NccScalar};
    use crate::image::ImageView;
    use crate::kernel::{Kernel, Position};
    use crate::template::TemplatePlan;

    #[test]
    fn exact_patch_scores_one() {
        let data: Vec<u8> = (0..36).map(|v| (v * 7 % 251) as u8 + 1).collect();
        let search = ImageView::from_slice(&data, 6, 6).unwrap();
        let patch = search.crop(2, 3, 3, 2).unwrap();
        let plan = TemplatePlan::from_view(patch).unwrap();
        assert!((score_at(search, &plan, 2, 3) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_energy_scores_minus_one() {
        let black = [0u8; 4];
        let plan = TemplatePlan::from_view(ImageView::from_slice(&black, 2, 2).unwrap()).unwrap();
        let search = [9u8; 16];
        let view = ImageView::from_slice(&search, 4, 4).unwrap();
        assert_eq!(score_at(view, &plan, 0, 0), -1.0);

        let result = NccScalar::scan_full(view, &plan);
        assert_eq!(result.position, Some(Position { x: 0, y: 0 }));
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn ties_keep_first_row_major_position() {
        let search = [50u8; 25];
        let view = ImageView::from_slice(&search, 5, 5).unwrap();
        let tpl = [50u8; 4];
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, 2, 2).unwrap()).unwrap();
        let result = NccScalar::scan_full(view, &plan);
        assert_eq!(result.position, Some(Position { x: 0, y: 0 }));
        assert!((result.confidence - 1.0).abs() < 1e-6);
    }
}
