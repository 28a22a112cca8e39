//! Fingerprint matcher.

use crate::fingerprint::{similarity, Fingerprint};
use crate::image::ImageView;
use crate::search::Matcher;
use crate::template::AdTemplate;
use crate::util::AdSkipResult;

/// Compares average-hash fingerprints of the template and the matching part of
/// the capture.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerceptualHashMatcher;

impl Matcher for PerceptualHashMatcher {
    fn score(&self, template: &AdTemplate, frame: ImageView<'_, u8>) -> AdSkipResult<f32> {
        let capture = match &template.region {
            Some(region) => region.apply(frame)?,
            None => frame,
        };
        let expected = template.fingerprint()?;
        let actual = Fingerprint::from_view(capture)?;
        Ok(similarity(expected, actual))
    }

    fn name(&self) -> &'static str {
        "perceptual_hash"
    }
}
