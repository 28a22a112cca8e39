//! Candidate loop: first template over threshold wins.

use crate::image::ImageView;
use crate::search::{MatchConfig, Matcher};
use crate::store::TemplateStore;
use crate::template::{AdTemplate, TemplateId};
use crate::trace::{trace_event, trace_span};
use crate::util::{AdSkipError, AdSkipResult};

/// Outcome of matching one capture against a host's templates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    pub matched: bool,
    pub template_id: Option<TemplateId>,
    /// Milliseconds to skip, copied from the matched template.
    pub duration_ms: Option<u64>,
    pub score: Option<f32>,
}

impl MatchResult {
    /// No candidate exceeded the threshold.
    pub const NO_MATCH: Self = Self {
        matched: false,
        template_id: None,
        duration_ms: None,
        score: None,
    };

    fn hit(template: &AdTemplate, score: f32) -> Self {
        Self {
            matched: true,
            template_id: Some(template.id),
            duration_ms: Some(template.duration_ms),
            score: Some(score),
        }
    }
}

/// Stateless matcher front end; holds only its configuration.
pub struct MatchEngine {
    matcher: Box<dyn Matcher>,
    threshold: f32,
}

impl MatchEngine {
    /// Builds the engine for the configured strategy.
    pub fn new(config: MatchConfig) -> AdSkipResult<Self> {
        config.validate()?;
        Ok(Self {
            matcher: config.build_matcher(),
            threshold: config.threshold(),
        })
    }

    /// Uses a caller-supplied matcher.
    pub fn with_matcher(matcher: Box<dyn Matcher>, threshold: f32) -> AdSkipResult<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AdSkipError::InvalidInput("threshold must be within [0, 1]"));
        }
        Ok(Self { matcher, threshold })
    }

    /// Returns the effective threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Scores `templates` in order and returns the first whose score is
    /// strictly above the threshold.
    ///
    /// Templates registered for another host are ignored. A template that
    /// cannot be scored (corrupt pixels, region outside the frame, search
    /// window smaller than the template) counts as not matching.
    pub fn match_candidates(
        &self,
        frame: ImageView<'_, u8>,
        host: &str,
        templates: &[AdTemplate],
    ) -> MatchResult {
        let _span = trace_span!(
            "match_candidates",
            matcher = self.matcher.name(),
            candidates = templates.len()
        )
        .entered();

        for template in templates {
            if template.host != host {
                trace_event!(
                    warn,
                    "foreign_host",
                    id = template.id.0,
                    host = template.host.as_str()
                );
                continue;
            }
            match self.matcher.score(template, frame) {
                Ok(score) => {
                    trace_event!(debug, "candidate_scored", id = template.id.0, score = score);
                    if score > self.threshold {
                        trace_event!(
                            debug,
                            "matched",
                            id = template.id.0,
                            duration_ms = template.duration_ms
                        );
                        return MatchResult::hit(template, score);
                    }
                }
                Err(err) => {
                    trace_event!(
                        warn,
                        "candidate_failed",
                        id = template.id.0,
                        reason = err.to_string().as_str()
                    );
                }
            }
        }
        MatchResult::NO_MATCH
    }

    /// Loads the host's templates from `store` and matches against them.
    ///
    /// Storage failures abort the match and are returned to the caller.
    pub fn match_host<S>(
        &self,
        store: &S,
        frame: ImageView<'_, u8>,
        host: &str,
    ) -> AdSkipResult<MatchResult>
    where
        S: TemplateStore + ?Sized,
    {
        if host.is_empty() {
            return Err(AdSkipError::InvalidInput("host must not be empty"));
        }
        let _span = trace_span!("match_host", host = host).entered();
        let templates = store.query_by_host(host)?;
        Ok(self.match_candidates(frame, host, &templates))
    }
}

#[cfg(test)]
mod tests {
    use super::{MatchEngine, MatchResult};
    use crate::image::{GrayImage, ImageView};
    use crate::search::{MatchConfig, Matcher};
    use crate::template::{AdTemplate, TemplateDraft, TemplateId};
    use crate::util::{AdSkipError, AdSkipResult};

    struct Fixed(f32);

    impl Matcher for Fixed {
        fn score(&self, template: &AdTemplate, _frame: ImageView<'_, u8>) -> AdSkipResult<f32> {
            if template.id.0 == 13 {
                return Err(AdSkipError::InvalidInput("unlucky"));
            }
            Ok(self.0)
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn templates(ids: &[i64]) -> Vec<AdTemplate> {
        ids.iter()
            .map(|&id| {
                TemplateDraft::new("a.test", GrayImage::filled(2, 2, 0).unwrap(), None, id)
                    .unwrap()
                    .into_template(TemplateId(id))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn threshold_is_strict() {
        let frame = GrayImage::filled(2, 2, 0).unwrap();
        let engine = MatchEngine::with_matcher(Box::new(Fixed(0.95)), 0.95).unwrap();
        let result = engine.match_candidates(frame.view(), "a.test", &templates(&[1]));
        assert_eq!(result, MatchResult::NO_MATCH);
    }

    #[test]
    fn failing_candidate_does_not_block_the_rest() {
        let frame = GrayImage::filled(2, 2, 0).unwrap();
        let engine = MatchEngine::with_matcher(Box::new(Fixed(1.0)), 0.95).unwrap();
        let result = engine.match_candidates(frame.view(), "a.test", &templates(&[13, 20]));
        assert!(result.matched);
        assert_eq!(result.template_id, Some(TemplateId(20)));
        assert_eq!(result.duration_ms, Some(20));
    }

    #[test]
    fn first_candidate_over_threshold_wins() {
        let frame = GrayImage::filled(2, 2, 0).unwrap();
        let engine = MatchEngine::new(MatchConfig::default()).unwrap();
        let result = engine.match_candidates(frame.view(), "a.test", &templates(&[5, 6]));
        assert_eq!(result.template_id, Some(TemplateId(5)));
    }

    #[test]
    fn other_hosts_are_skipped() {
        let frame = GrayImage::filled(2, 2, 0).unwrap();
        let engine = MatchEngine::new(MatchConfig::default()).unwrap();
        let result = engine.match_candidates(frame.view(), "b.test", &templates(&[5]));
        assert_eq!(result, MatchResult::NO_MATCH);
    }
}
