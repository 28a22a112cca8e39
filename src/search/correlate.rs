//! Legacy correlation matcher.

use crate::image::resample::resample_box;
use crate::image::ImageView;
use crate::kernel::scalar::NccScalar;
use crate::kernel::{Correlation, Kernel};
use crate::search::{CorrelationConfig, Matcher};
use crate::template::{AdTemplate, Region, TemplatePlan};
use crate::trace::trace_span;
use crate::util::{AdSkipError, AdSkipResult};

/// Finds the best placement of `template` inside `search`.
///
/// Returns [`Correlation::NONE`] when `search` is smaller than `template` in
/// either dimension.
pub fn correlate(template: ImageView<'_, u8>, search: ImageView<'_, u8>) -> Correlation {
    correlate_with(template, search, false)
}

/// Like [`correlate`], optionally scanning rows in parallel.
///
/// `parallel` is ignored unless the `rayon` feature is enabled.
pub fn correlate_with(
    template: ImageView<'_, u8>,
    search: ImageView<'_, u8>,
    parallel: bool,
) -> Correlation {
    if search.width() < template.width() || search.height() < template.height() {
        return Correlation::NONE;
    }
    let _span = trace_span!(
        "correlate",
        template = template.width() * template.height(),
        search = search.width() * search.height()
    )
    .entered();
    match TemplatePlan::from_view(template) {
        Ok(plan) => scan(search, &plan, parallel),
        Err(_) => Correlation::NONE,
    }
}

#[cfg(feature = "rayon")]
fn scan(search: ImageView<'_, u8>, plan: &TemplatePlan, parallel: bool) -> Correlation {
    if parallel {
        crate::kernel::rayon::NccRayon::scan_full(search, plan)
    } else {
        NccScalar::scan_full(search, plan)
    }
}

#[cfg(not(feature = "rayon"))]
fn scan(search: ImageView<'_, u8>, plan: &TemplatePlan, _parallel: bool) -> Correlation {
    NccScalar::scan_full(search, plan)
}

/// Exhaustive normalized cross-correlation against the stored pixels.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelationMatcher {
    config: CorrelationConfig,
}

impl CorrelationMatcher {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    /// Window of the frame the template is slid over when it has no region.
    fn search_window<'a>(&self, frame: ImageView<'a, u8>) -> AdSkipResult<ImageView<'a, u8>> {
        match self.config.search_window {
            Some(size) => Region::centered(frame.width(), frame.height(), size)?.apply(frame),
            None => Ok(frame),
        }
    }
}

fn score_area(
    tpl: ImageView<'_, u8>,
    search: ImageView<'_, u8>,
    parallel: bool,
) -> AdSkipResult<f32> {
    if search.width() < tpl.width() || search.height() < tpl.height() {
        return Err(AdSkipError::SearchTooSmall {
            template_width: tpl.width(),
            template_height: tpl.height(),
            search_width: search.width(),
            search_height: search.height(),
        });
    }
    Ok(correlate_with(tpl, search, parallel).confidence)
}

impl Matcher for CorrelationMatcher {
    /// A region captured at another frame size is cropped from the live frame
    /// and resampled back to the registered pixel size before correlating.
    /// Templates without a region carry no frame size and are searched as is.
    fn score(&self, template: &AdTemplate, frame: ImageView<'_, u8>) -> AdSkipResult<f32> {
        let tpl = template.view()?;
        let parallel = self.config.parallel;
        match &template.region {
            Some(region)
                if (frame.width(), frame.height()) != (region.frame_width, region.frame_height) =>
            {
                let area = region.apply(frame)?;
                let rescaled = resample_box(area, region.rect.width, region.rect.height)?;
                score_area(tpl, rescaled.view(), parallel)
            }
            Some(region) => score_area(tpl, region.apply(frame)?, parallel),
            None => score_area(tpl, self.search_window(frame)?, parallel),
        }
    }

    fn name(&self) -> &'static str {
        "correlation"
    }
}
