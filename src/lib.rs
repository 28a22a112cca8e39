//! adskip detects recurring ad overlays in video captures.
//!
//! Users register grayscale *templates* of an ad overlay for a site host; live
//! captures from the same host are then compared against those templates with
//! a 64-bit perceptual hash (default) or an exhaustive normalized
//! cross-correlation, and the first template over threshold reports how long
//! to skip.

pub mod fingerprint;
pub mod host;
pub mod image;
pub mod kernel;
pub mod lowlevel;
pub mod search;
pub mod store;
pub mod template;
mod trace;
pub mod util;

pub use fingerprint::{similarity, Fingerprint, FINGERPRINT_VERSION};
pub use host::host_from_url;
pub use image::gray::{capture_to_grayscale, grayscale_to_rgba};
pub use image::{GrayImage, ImageView};
pub use kernel::{Correlation, Position};
pub use search::{
    correlate, correlate_with, CorrelationConfig, CorrelationMatcher, MatchConfig, MatchEngine,
    MatchResult, MatchStrategy, Matcher, PerceptualHashMatcher, CORRELATION_THRESHOLD,
    HASH_THRESHOLD, LEGACY_SEARCH_WINDOW,
};
pub use store::{MemoryTemplateStore, TemplateStore};
#[cfg(feature = "sqlite")]
pub use store::SqliteTemplateStore;
pub use template::{
    validate_duration, AdTemplate, Rect, Region, TemplateDraft, TemplateId, DEFAULT_DURATION_MS,
};
pub use util::{AdSkipError, AdSkipResult, ErrorKind};

#[cfg(feature = "image-io")]
pub use image::io;
