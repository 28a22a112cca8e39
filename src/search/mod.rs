//! Matching strategies and the match engine.
//!
//! A [`Matcher`] scores one stored template against one live capture. The
//! perceptual hash matcher is the default; the correlation matcher is kept for
//! templates registered with the older exhaustive search and is far slower.

use crate::image::ImageView;
use crate::template::AdTemplate;
use crate::util::{AdSkipError, AdSkipResult};

pub(crate) mod correlate;
pub(crate) mod engine;
pub(crate) mod hash;

pub use correlate::{correlate, correlate_with, CorrelationMatcher};
pub use engine::{MatchEngine, MatchResult};
pub use hash::PerceptualHashMatcher;

/// Default similarity threshold for fingerprint matching.
pub const HASH_THRESHOLD: f32 = 0.95;

/// Default confidence threshold for correlation matching.
pub const CORRELATION_THRESHOLD: f32 = 0.8;

/// Side of the centred search window used by the legacy correlation flow.
pub const LEGACY_SEARCH_WINDOW: usize = 100;

/// Scores a stored template against a captured frame.
pub trait Matcher: Send + Sync {
    /// Returns a score in `[0, 1]`; higher means more alike.
    fn score(&self, template: &AdTemplate, frame: ImageView<'_, u8>) -> AdSkipResult<f32>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Which matcher the engine uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchStrategy {
    /// 64-bit average hash compared by Hamming similarity.
    #[default]
    PerceptualHash,
    /// Exhaustive normalized cross-correlation.
    Correlation,
}

impl MatchStrategy {
    /// Threshold applied when the configuration does not set one.
    pub fn default_threshold(self) -> f32 {
        match self {
            Self::PerceptualHash => HASH_THRESHOLD,
            Self::Correlation => CORRELATION_THRESHOLD,
        }
    }
}

/// Options for the correlation matcher.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrelationConfig {
    /// Centred square the frame is cut down to when a template has no region.
    /// `None` searches the whole frame.
    pub search_window: Option<usize>,
    /// Scan rows in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            search_window: Some(LEGACY_SEARCH_WINDOW),
            parallel: false,
        }
    }
}

/// Engine configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MatchConfig {
    pub strategy: MatchStrategy,
    /// Scores must be strictly above this; `None` uses the strategy default.
    pub threshold: Option<f32>,
    pub correlation: CorrelationConfig,
}

impl MatchConfig {
    /// Returns the effective threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
            .unwrap_or_else(|| self.strategy.default_threshold())
    }

    /// Rejects thresholds outside `[0, 1]` and empty search windows.
    pub fn validate(&self) -> AdSkipResult<()> {
        let threshold = self.threshold();
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AdSkipError::InvalidInput("threshold must be within [0, 1]"));
        }
        if self.correlation.search_window == Some(0) {
            return Err(AdSkipError::InvalidInput("search window must be non-zero"));
        }
        Ok(())
    }

    pub(crate) fn build_matcher(&self) -> Box<dyn Matcher> {
        match self.strategy {
            MatchStrategy::PerceptualHash => Box::new(PerceptualHashMatcher),
            MatchStrategy::Correlation => Box::new(CorrelationMatcher::new(self.correlation)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MatchConfig, MatchStrategy};
    use crate::util::AdSkipError;

    #[test]
    fn thresholds_follow_strategy() {
        assert_eq!(MatchConfig::default().threshold(), 0.95);
        let cfg = MatchConfig {
            strategy: MatchStrategy::Correlation,
            ..MatchConfig::default()
        };
        assert_eq!(cfg.threshold(), 0.8);
        let cfg = MatchConfig {
            threshold: Some(0.5),
            ..cfg
        };
        assert_eq!(cfg.threshold(), 0.5);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let cfg = MatchConfig {
            threshold: Some(1.5),
            ..MatchConfig::default()
        };
        assert_eq!(
            cfg.validate().err().unwrap(),
            AdSkipError::InvalidInput("threshold must be within [0, 1]")
        );
    }
}
